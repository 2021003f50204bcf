//! Google Drive and Google Docs share-link downloads.
//!
//! Only publicly shared files can be fetched; no credentials are used.

pub mod client;
pub mod link;

pub use client::{DriveClient, RemoteDocument};
pub use link::{DriveLink, LinkKind};
