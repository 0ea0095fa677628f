//! Blocking Gemini API client for deck inconsistency analysis.

pub mod client;

pub use client::{GeminiClient, DEFAULT_ENDPOINT, DEFAULT_MODEL};
