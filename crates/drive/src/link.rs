//! Share-link parsing.

use regex::Regex;
use speak_core::{Error, Result};
use std::sync::LazyLock;

/// `https://drive.google.com/file/d/<id>/view`
static FILE_PATH_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://drive\.google\.com/(?:u/\d+/)?file/d/([A-Za-z0-9_-]+)").unwrap()
});

/// `https://drive.google.com/open?id=<id>` and `.../uc?export=download&id=<id>`
static FILE_QUERY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://drive\.google\.com/(?:open|uc)\?(?:[^#]*&)?id=([A-Za-z0-9_-]+)").unwrap()
});

/// `https://docs.google.com/document/d/<id>/edit`
static DOCUMENT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://docs\.google\.com/document/(?:u/\d+/)?d/([A-Za-z0-9_-]+)").unwrap()
});

/// What a share link points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// A file stored in Drive (PDF, DOCX, ...).
    File,
    /// A native Google Docs document, exported as DOCX.
    Document,
}

/// A parsed Google Drive or Google Docs share link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveLink {
    /// Kind of target.
    pub kind: LinkKind,
    /// Drive file id.
    pub id: String,
}

impl DriveLink {
    /// Parse a share link as copied from the browser.
    pub fn parse(url: &str) -> Result<Self> {
        let url = url.trim();

        let patterns = [
            (&*FILE_PATH_REGEX, LinkKind::File),
            (&*FILE_QUERY_REGEX, LinkKind::File),
            (&*DOCUMENT_REGEX, LinkKind::Document),
        ];

        patterns
            .iter()
            .find_map(|(regex, kind)| {
                regex.captures(url).map(|caps| Self {
                    kind: *kind,
                    id: caps[1].to_string(),
                })
            })
            .ok_or_else(|| Error::InvalidLink(url.to_string()))
    }

    /// Direct download URL for the link target.
    pub fn download_url(&self) -> String {
        match self.kind {
            LinkKind::File => format!("https://drive.google.com/uc?export=download&id={}", self.id),
            LinkKind::Document => format!(
                "https://docs.google.com/document/d/{}/export?format=docx",
                self.id
            ),
        }
    }

    /// File name to use when the server does not suggest one.
    pub fn fallback_filename(&self) -> String {
        match self.kind {
            LinkKind::File => format!("drive-{}", self.id),
            LinkKind::Document => format!("drive-{}.docx", self.id),
        }
    }
}
