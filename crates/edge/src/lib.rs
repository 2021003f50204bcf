//! Client for the Microsoft Edge "read aloud" text-to-speech service.
//!
//! Voices are listed over HTTPS; audio is streamed back over a websocket,
//! one connection per text chunk, and concatenated into a single MP3.

pub mod client;
pub mod protocol;
pub mod ssml;
pub mod token;
pub mod voices;

pub use client::EdgeClient;
