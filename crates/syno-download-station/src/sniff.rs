//! Content-based detection of uploaded task files.
//!
//! Best effort only: looks at a short prefix of the payload and never parses
//! the format.

use std::fmt;
use std::str::FromStr;

/// Bytes inspected by [`detect`]. Enough for an XML header.
pub const PEEK_SIZE: usize = 512;

const LINK_PREFIXES: &[&[u8]] = &[
    b"http://",
    b"https://",
    b"ftp://",
    b"thunder://",
    b"flashget://",
    b"qqdl://",
    b"magnet:",
];

/// File types accepted by Download Station uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    /// BitTorrent metainfo.
    Torrent,
    /// Usenet NZB index.
    Nzb,
    /// Plain text list of links.
    Txt,
}

impl FileType {
    /// Wire name, also used as the upload part name and file extension.
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Torrent => "torrent",
            FileType::Nzb => "nzb",
            FileType::Txt => "txt",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = UnknownFileType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "torrent" => Ok(FileType::Torrent),
            "nzb" => Ok(FileType::Nzb),
            "txt" => Ok(FileType::Txt),
            _ => Err(UnknownFileType),
        }
    }
}

/// The payload matched no known file type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown file type")]
pub struct UnknownFileType;

/// Classify a payload by its first bytes.
///
/// Only the first [`PEEK_SIZE`] bytes of `peek` are considered.
pub fn detect(peek: &[u8]) -> Result<FileType, UnknownFileType> {
    let peek = &peek[..peek.len().min(PEEK_SIZE)];

    if peek.starts_with(b"d8:announce") {
        Ok(FileType::Torrent)
    } else if contains(peek, b"<nzb") || contains(peek, b":nzb") {
        Ok(FileType::Nzb)
    } else if LINK_PREFIXES.iter().any(|p| peek.starts_with(p)) {
        Ok(FileType::Txt)
    } else {
        Err(UnknownFileType)
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
