//! Publish metadata generation (title, description, tags).

use std::sync::OnceLock;

use regex::Regex;
use tracing::{info, warn};

use reel_models::PublishMetadata;

use crate::client::TextGenerator;
use crate::script::{clean_section, EMPTY_CAPTION_FALLBACK};
use crate::types::{ChatMessage, ChatRequest};

const METADATA_MAX_TOKENS: u32 = 300;
const METADATA_TEMPERATURE: f32 = 0.9;

const FORMAT_INSTRUCTION: &str = "Return ONLY in this format:\nTitle: ...\nDescription: ...\nTags: ...";

struct Patterns {
    title: Regex,
    description: Regex,
    tags: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        title: Regex::new(r"(?is)Title:(.*?)Description:").unwrap(),
        description: Regex::new(r"(?is)Description:(.*?)Tags:").unwrap(),
        tags: Regex::new(r"(?is)Tags:(.*)").unwrap(),
    })
}

fn section<'t>(pattern: &Regex, text: &'t str) -> Option<&'t str> {
    let value = clean_section(pattern.captures(text)?.get(1)?.as_str());
    (!value.is_empty()).then_some(value)
}

/// Build the metadata prompt for a caption.
pub fn metadata_request(caption: &str) -> ChatRequest {
    let caption = if caption.trim().is_empty() {
        EMPTY_CAPTION_FALLBACK
    } else {
        caption.trim()
    };

    let prompt = format!(
        "Create YouTube Shorts metadata.\n\n\
         Instagram caption:\n\"{caption}\"\n\n\
         Rules:\n\
         - Title < 60 characters and include #shorts\n\
         - Description: detailed description with trending and latest viral hashtags\n\
         - Tags: comma separated, max 10\n\
         - No emojis"
    );

    ChatRequest {
        messages: vec![ChatMessage::system(FORMAT_INSTRUCTION), ChatMessage::user(prompt)],
        max_tokens: METADATA_MAX_TOKENS,
        temperature: METADATA_TEMPERATURE,
    }
}

/// Parse generator output into metadata.
///
/// All three labels must be present and non-empty; tags are split on
/// commas with a leading `#` dropped.
pub fn parse_metadata(text: &str) -> Option<PublishMetadata> {
    let p = patterns();
    let title = section(&p.title, text)?;
    let description = section(&p.description, text)?;
    let tags_raw = section(&p.tags, text)?;

    let tags: Vec<&str> = tags_raw
        .split(',')
        .map(|t| t.trim().trim_start_matches('#').trim())
        .filter(|t| !t.is_empty())
        .collect();
    if tags.is_empty() {
        return None;
    }

    Some(PublishMetadata::new(title, description, tags))
}

/// Generate metadata for a caption. Never fails.
pub async fn generate_metadata(generator: &dyn TextGenerator, caption: &str) -> PublishMetadata {
    let request = metadata_request(caption);

    match generator.complete(&request).await {
        Ok(text) => match parse_metadata(&text) {
            Some(metadata) => {
                info!(title = %metadata.title, tags = metadata.tags.len(), "Generated publish metadata");
                metadata
            }
            None => {
                warn!(response = %text, "Metadata response incomplete, using defaults");
                PublishMetadata::fallback()
            }
        },
        Err(e) => {
            warn!(error = %e, "Metadata generation failed, using defaults");
            PublishMetadata::fallback()
        }
    }
}
