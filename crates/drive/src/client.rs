//! Blocking downloads of publicly shared documents.

use crate::DriveLink;
use regex::Regex;
use reqwest::blocking::Client;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use speak_core::{Error, Result, TextSource};
use std::sync::LazyLock;
use std::time::Duration;

static DISPOSITION_FILENAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"filename\s*=\s*(?:"([^"]+)"|([^;\s"]+))"#).unwrap());

/// Timeout for a whole download.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// A document downloaded from Drive.
#[derive(Debug, Clone)]
pub struct RemoteDocument {
    /// Name suggested by the server, or derived from the link.
    pub filename: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

impl From<RemoteDocument> for TextSource {
    fn from(document: RemoteDocument) -> Self {
        TextSource::document(document.filename, document.bytes)
    }
}

/// Client for fetching shared Drive files.
pub struct DriveClient {
    http: Client,
}

impl DriveClient {
    /// Create a client with default timeouts.
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .map_err(|e| Error::Http(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { http })
    }

    /// Parse `url` and download the file it points at.
    pub fn fetch_url(&self, url: &str) -> Result<RemoteDocument> {
        let link = DriveLink::parse(url)?;
        self.fetch(&link)
    }

    /// Download a shared file.
    pub fn fetch(&self, link: &DriveLink) -> Result<RemoteDocument> {
        let url = link.download_url();
        log::debug!("Downloading {}", url);

        let response = self
            .http
            .get(&url)
            .send()
            .map_err(|e| Error::Http(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http(format!("{} returned {}", url, status)));
        }

        let headers = response.headers();
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        // Drive answers with a sign-in or virus-scan page instead of the file
        if content_type.starts_with("text/html") {
            return Err(Error::NotShared(format!(
                "Drive returned a web page for {}; make sure the file is shared with anyone who has the link",
                link.id
            )));
        }

        let filename = headers
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_disposition)
            .unwrap_or_else(|| link.fallback_filename());

        let bytes = response
            .bytes()
            .map_err(|e| Error::Http(format!("Failed to read body of {}: {}", url, e)))?
            .to_vec();

        log::info!("Downloaded {} ({} bytes)", filename, bytes.len());

        Ok(RemoteDocument { filename, bytes })
    }
}

/// Pull the file name out of a `Content-Disposition` header value.
fn filename_from_disposition(value: &str) -> Option<String> {
    let caps = DISPOSITION_FILENAME_REGEX.captures(value)?;
    let name = caps.get(1).or_else(|| caps.get(2))?.as_str();

    // Strip any directory part a server might send
    let name = name.rsplit(['/', '\\']).next().unwrap_or(name).trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_filename() {
        assert_eq!(
            filename_from_disposition(r#"attachment; filename="Quarterly report.pdf"; filename*=UTF-8''Quarterly%20report.pdf"#),
            Some("Quarterly report.pdf".to_string())
        );
    }

    #[test]
    fn test_bare_filename() {
        assert_eq!(
            filename_from_disposition("attachment; filename=notes.docx"),
            Some("notes.docx".to_string())
        );
    }

    #[test]
    fn test_path_stripped() {
        assert_eq!(
            filename_from_disposition(r#"attachment; filename="../../etc/passwd""#),
            Some("passwd".to_string())
        );
    }

    #[test]
    fn test_no_filename() {
        assert_eq!(filename_from_disposition("inline"), None);
        assert_eq!(filename_from_disposition(r#"attachment; filename="""#), None);
    }

    #[test]
    fn test_remote_document_into_source() {
        let source: TextSource = RemoteDocument {
            filename: "a.txt".to_string(),
            bytes: b"hi".to_vec(),
        }
        .into();
        assert!(matches!(source, TextSource::Document { ref filename, .. } if filename == "a.txt"));
    }

    #[test]
    fn test_fetch_url_rejects_bad_links_before_network() {
        let client = DriveClient::new().unwrap();
        assert!(matches!(
            client.fetch_url("https://example.com/doc.pdf"),
            Err(Error::InvalidLink(_))
        ));
    }
}
