//! Request fields and body encoding.
//!
//! A call is an ordered list of [`Field`]s. If any field carries a stream the
//! whole body becomes `multipart/form-data`, produced by a background task
//! into a bounded channel; otherwise it is a plain
//! `application/x-www-form-urlencoded` string. Field order is preserved in
//! both encodings.

use std::fmt;
use std::io;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::form_urlencoded::byte_serialize;

use crate::config::ClientConfig;

/// Content type of plain bodies.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Boxed byte source used by stream-bearing fields.
pub type BoxReader = Box<dyn AsyncRead + Send + Unpin>;

/// Value of a request field.
pub enum FieldValue {
    /// Any stringifiable value.
    Scalar(String),
    /// Raw blob. Does not force multipart on its own.
    Bytes(Bytes),
    /// Live byte stream without a file name.
    Stream(BoxReader),
    /// File attachment.
    Attachment {
        file_name: String,
        reader: BoxReader,
    },
}

impl FieldValue {
    /// Wrap a reader as a nameless stream.
    pub fn stream(reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        FieldValue::Stream(Box::new(reader))
    }

    /// Wrap a reader as a file attachment.
    pub fn attachment(
        file_name: impl Into<String>,
        reader: impl AsyncRead + Send + Unpin + 'static,
    ) -> Self {
        FieldValue::Attachment {
            file_name: file_name.into(),
            reader: Box::new(reader),
        }
    }

    /// Returns true if this value forces a multipart body.
    pub fn is_streaming(&self) -> bool {
        match self {
            FieldValue::Scalar(_) | FieldValue::Bytes(_) => false,
            FieldValue::Stream(_) | FieldValue::Attachment { .. } => true,
        }
    }

    fn as_form_bytes(&self) -> Option<&[u8]> {
        match self {
            FieldValue::Scalar(s) => Some(s.as_bytes()),
            FieldValue::Bytes(b) => Some(&b[..]),
            FieldValue::Stream(_) | FieldValue::Attachment { .. } => None,
        }
    }
}

impl fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Scalar(s) => f.debug_tuple("Scalar").field(s).finish(),
            FieldValue::Bytes(b) => f.debug_tuple("Bytes").field(&b.len()).finish(),
            FieldValue::Stream(_) => f.write_str("Stream(..)"),
            FieldValue::Attachment { file_name, .. } => f
                .debug_struct("Attachment")
                .field("file_name", file_name)
                .finish_non_exhaustive(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Scalar(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Scalar(value)
    }
}

impl From<&String> for FieldValue {
    fn from(value: &String) -> Self {
        FieldValue::Scalar(value.clone())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Scalar(value.to_string())
    }
}

macro_rules! scalar_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for FieldValue {
                fn from(value: $t) -> Self {
                    FieldValue::Scalar(value.to_string())
                }
            }
        )*
    };
}

scalar_from_int!(i32, i64, u32, u64, usize);

impl From<Bytes> for FieldValue {
    fn from(value: Bytes) -> Self {
        FieldValue::Bytes(value)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(value: Vec<u8>) -> Self {
        FieldValue::Bytes(Bytes::from(value))
    }
}

/// Named request field.
#[derive(Debug)]
pub struct Field {
    pub name: String,
    pub value: FieldValue,
}

impl Field {
    /// Create a field from anything convertible into a [`FieldValue`].
    pub fn new(name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Create a file attachment field.
    pub fn attachment(
        name: impl Into<String>,
        file_name: impl Into<String>,
        reader: impl AsyncRead + Send + Unpin + 'static,
    ) -> Self {
        Self::new(name, FieldValue::attachment(file_name, reader))
    }

    /// Create a nameless stream field.
    pub fn stream(name: impl Into<String>, reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self::new(name, FieldValue::stream(reader))
    }
}

/// Returns true if any field forces a multipart body.
pub fn needs_streaming(fields: &[Field]) -> bool {
    fields.iter().any(|f| f.value.is_streaming())
}

/// Encoded request body.
#[derive(Debug)]
pub enum RequestBody {
    /// Complete form-encoded body.
    Form(String),
    /// Multipart chunks as they are produced. The last item is an error if
    /// the producer failed or was cancelled.
    Multipart(ReceiverStream<io::Result<Bytes>>),
}

/// Body plus the content type that describes it.
#[derive(Debug)]
pub struct EncodedBody {
    content_type: String,
    body: RequestBody,
}

impl EncodedBody {
    /// The `Content-Type` header value.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Returns true for multipart bodies.
    pub fn is_multipart(&self) -> bool {
        matches!(self.body, RequestBody::Multipart(_))
    }

    /// Split into content type and body.
    pub fn into_parts(self) -> (String, RequestBody) {
        (self.content_type, self.body)
    }

    /// Convert into a reqwest body. Multipart bodies stay streamed.
    pub(crate) fn into_reqwest(self) -> (String, reqwest::Body) {
        let body = match self.body {
            RequestBody::Form(data) => reqwest::Body::from(data),
            RequestBody::Multipart(stream) => reqwest::Body::wrap_stream(stream),
        };
        (self.content_type, body)
    }

    /// Drain the whole body into memory.
    pub async fn collect(self) -> io::Result<Bytes> {
        match self.body {
            RequestBody::Form(data) => Ok(Bytes::from(data)),
            RequestBody::Multipart(mut stream) => {
                let mut out = BytesMut::new();
                while let Some(chunk) = stream.next().await {
                    out.extend_from_slice(&chunk?);
                }
                Ok(out.freeze())
            }
        }
    }
}

/// Encode fields into a request body.
///
/// Multipart bodies are produced by a spawned task, so this must be called
/// from within a tokio runtime. Cancelling `cancel` stops the producer and
/// terminates the stream with an [`io::ErrorKind::Interrupted`] error.
pub fn encode(fields: Vec<Field>, config: &ClientConfig, cancel: &CancellationToken) -> EncodedBody {
    if needs_streaming(&fields) {
        encode_multipart(fields, config, cancel)
    } else {
        encode_form(&fields)
    }
}

/// Raw bytes are percent-encoded as they are, so non-UTF-8 blobs survive.
fn encode_form(fields: &[Field]) -> EncodedBody {
    let mut data = String::new();
    for (name, value) in fields
        .iter()
        .filter_map(|f| f.value.as_form_bytes().map(|v| (f.name.as_bytes(), v)))
    {
        if !data.is_empty() {
            data.push('&');
        }
        data.extend(byte_serialize(name));
        data.push('=');
        data.extend(byte_serialize(value));
    }

    EncodedBody {
        content_type: FORM_CONTENT_TYPE.to_string(),
        body: RequestBody::Form(data),
    }
}

fn encode_multipart(
    fields: Vec<Field>,
    config: &ClientConfig,
    cancel: &CancellationToken,
) -> EncodedBody {
    let boundary = generate_boundary();
    let content_type = format!("multipart/form-data; boundary={boundary}");
    let (tx, rx) = mpsc::channel(config.stream_buffer_chunks.max(1));
    let chunk_size = config.stream_chunk_size.max(1);
    let token = cancel.child_token();

    // A blocked reader never reaches `send`, so a dropped body is watched
    // for separately.
    tokio::spawn(async move {
        let result = tokio::select! {
            _ = token.cancelled() => Err(io::Error::new(
                io::ErrorKind::Interrupted,
                "multipart upload cancelled",
            )),
            _ = tx.closed() => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "request body consumer dropped",
            )),
            result = produce_multipart(fields, &boundary, chunk_size, &tx) => result,
        };

        if let Err(err) = result {
            debug!(error = %err, "multipart producer stopped");
            // Fails only when the body consumer is already gone.
            let _ = tx.send(Err(err)).await;
        }
    });

    EncodedBody {
        content_type,
        body: RequestBody::Multipart(ReceiverStream::new(rx)),
    }
}

async fn produce_multipart(
    fields: Vec<Field>,
    boundary: &str,
    chunk_size: usize,
    tx: &mpsc::Sender<io::Result<Bytes>>,
) -> io::Result<()> {
    for field in fields {
        send(tx, Bytes::from(part_header(boundary, &field))).await?;

        match field.value {
            FieldValue::Scalar(s) => send(tx, Bytes::from(s)).await?,
            FieldValue::Bytes(b) => send(tx, b).await?,
            FieldValue::Stream(reader) | FieldValue::Attachment { reader, .. } => {
                copy_reader(reader, chunk_size, tx).await.map_err(|e| {
                    io::Error::new(e.kind(), format!("copy content for part {}: {e}", field.name))
                })?
            }
        }

        send(tx, Bytes::from_static(b"\r\n")).await?;
    }

    send(tx, Bytes::from(format!("--{boundary}--\r\n"))).await
}

async fn copy_reader(
    mut reader: BoxReader,
    chunk_size: usize,
    tx: &mpsc::Sender<io::Result<Bytes>>,
) -> io::Result<()> {
    let mut buf = vec![0u8; chunk_size];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        send(tx, Bytes::copy_from_slice(&buf[..n])).await?;
    }
}

async fn send(tx: &mpsc::Sender<io::Result<Bytes>>, chunk: Bytes) -> io::Result<()> {
    tx.send(Ok(chunk))
        .await
        .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "request body consumer dropped"))
}

fn part_header(boundary: &str, field: &Field) -> String {
    let name = escape_quotes(&field.name);
    match &field.value {
        FieldValue::Scalar(_) => format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\nContent-Type: text/plain\r\n\r\n"
        ),
        FieldValue::Bytes(_) | FieldValue::Stream(_) => format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        ),
        FieldValue::Attachment { file_name, .. } => format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
            escape_quotes(file_name)
        ),
    }
}

fn escape_quotes(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn generate_boundary() -> String {
    use rand::Rng;
    use std::fmt::Write;

    let mut raw = [0u8; 30];
    rand::rng().fill(&mut raw[..]);
    raw.iter().fold(String::with_capacity(60), |mut acc, b| {
        let _ = write!(acc, "{b:02x}");
        acc
    })
}
