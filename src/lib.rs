//! Relay for Gemini-style multimodal image generation gateways
//!
//! Accepts a prompt plus optional reference images, forwards them to a remote
//! `generateContent` endpoint, and turns the multi-candidate response into an
//! ordered list of text and image results.

pub mod app;
pub mod error;
pub mod gemini;
pub mod history;
pub mod mime;
pub mod models;
pub mod settings;
pub mod storage;

pub use error::{Error, Result};
