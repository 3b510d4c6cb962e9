//! Clients for generative services.
//!
//! This crate provides:
//! - An OpenAI-compatible chat completions client (`TextGenerator`)
//! - Narration script generation with a fixed fallback
//! - Publish metadata generation with a fixed fallback
//! - A chunked text-to-speech client (`SpeechSynthesizer`)
//!
//! Script and metadata generation never fail: any call or parse error
//! degrades to the fallback values defined in `reel-models`.

pub mod client;
pub mod error;
pub mod metadata;
pub mod script;
pub mod speech;
pub mod types;

pub use client::{ChatClient, ChatClientConfig, TextGenerator};
pub use error::{GenAiError, GenAiResult};
pub use metadata::{generate_metadata, parse_metadata};
pub use script::{generate_script, parse_script};
pub use speech::{GoogleTts, SpeechSynthesizer, TtsConfig};
pub use types::{ChatMessage, ChatRequest};
