//! Pipeline configuration.
//!
//! Built once at startup from environment variables and passed by reference
//! into each component constructor.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use reel_genai::ChatClientConfig;
use reel_genai::TtsConfig;
use reel_ledger::LedgerConfig;
use reel_media::RenderConfig;
use reel_models::{PrivacyStatus, SelectionPolicy};
use reel_publish::{read_inline_or_file, OAuthCredentials, YouTubeConfig};
use reel_source::{FeedConfig, PopularityMetric};

use crate::error::{PipelineError, PipelineResult};

/// Default staging directory.
pub const DEFAULT_STAGING_DIR: &str = "/tmp/reelcast";

/// Full pipeline configuration.
#[derive(Clone)]
pub struct PipelineConfig {
    pub ledger: LedgerConfig,
    pub source: FeedConfig,
    /// Channels to pick from, one per run
    pub channels: Vec<String>,
    pub policy: SelectionPolicy,
    pub generator: ChatClientConfig,
    pub tts: TtsConfig,
    /// Narration language code
    pub tts_language: String,
    pub render: RenderConfig,
    pub youtube: YouTubeConfig,
    pub credentials: OAuthCredentials,
    /// Scratch directory, cleared at the start of every run
    pub staging_dir: PathBuf,
    /// Skip publish and commit
    pub dry_run: bool,
}

// Secrets (tokens, API keys, OAuth material) are deliberately left out.
impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("ledger_url", &self.ledger.url)
            .field("ledger_set_key", &self.ledger.set_key)
            .field("source_url", &self.source.base_url)
            .field("channels", &self.channels)
            .field("pool_size", &self.source.pool_size)
            .field("metric", &self.source.metric)
            .field("min_popularity", &self.policy.min_popularity)
            .field("generator_model", &self.generator.model)
            .field("tts_language", &self.tts_language)
            .field("overlay_hook", &self.render.overlay_hook)
            .field("privacy", &self.youtube.privacy)
            .field("staging_dir", &self.staging_dir)
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}

/// Reads configuration values through a lookup function.
struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Value if set and non-blank.
    fn get(&self, var: &str) -> Option<String> {
        (self.lookup)(var)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, var: &str) -> PipelineResult<String> {
        self.get(var)
            .ok_or_else(|| PipelineError::ConfigMissing(var.to_string()))
    }

    fn parse_or<T>(&self, var: &str, default: T) -> PipelineResult<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.get(var) {
            Some(raw) => raw
                .parse()
                .map_err(|e: T::Err| PipelineError::config_invalid(var, e.to_string())),
            None => Ok(default),
        }
    }

    fn flag(&self, var: &str, default: bool) -> PipelineResult<bool> {
        match self.get(var).map(|v| v.to_lowercase()) {
            None => Ok(default),
            Some(v) => match v.as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                other => Err(PipelineError::config_invalid(
                    var,
                    format!("expected a boolean, got {:?}", other),
                )),
            },
        }
    }

    fn secs_or(&self, var: &str, default: u64) -> PipelineResult<Duration> {
        self.parse_or(var, default).map(Duration::from_secs)
    }
}

impl PipelineConfig {
    /// Create config from process environment variables.
    pub fn from_env() -> PipelineResult<Self> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Create config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> PipelineResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        // Ledger
        let mut ledger = LedgerConfig::new(env.required("LEDGER_URL")?)
            .with_timeout(env.secs_or("LEDGER_TIMEOUT_SECS", 10)?);
        if let Some(key) = env.get("LEDGER_SET_KEY") {
            ledger = ledger.with_set_key(key);
        }
        if ledger.is_native_redis() {
            if let Some(token) = env.get("LEDGER_TOKEN") {
                ledger = ledger.with_token(token);
            }
        } else {
            ledger = ledger.with_token(env.required("LEDGER_TOKEN")?);
        }

        // Source
        let mut source = FeedConfig::new(env.required("SOURCE_API_URL")?, env.required("SOURCE_API_TOKEN")?);
        source.pool_size = env.parse_or("SOURCE_POOL_SIZE", source.pool_size)?;
        if source.pool_size == 0 {
            return Err(PipelineError::config_invalid("SOURCE_POOL_SIZE", "must be at least 1"));
        }
        source.metric = env.parse_or("SOURCE_POPULARITY_METRIC", PopularityMetric::default())?;

        let channels: Vec<String> = env
            .required("SOURCE_CHANNELS")?
            .split(',')
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        if channels.is_empty() {
            return Err(PipelineError::ConfigMissing("SOURCE_CHANNELS".to_string()));
        }

        let policy = SelectionPolicy::new(env.parse_or("MIN_POPULARITY", 0u64)?);

        // Generative services
        let mut generator = ChatClientConfig::new(env.required("GENERATOR_API_KEY")?);
        if let Some(url) = env.get("GENERATOR_URL") {
            generator.url = url;
        }
        if let Some(model) = env.get("GENERATOR_MODEL") {
            generator.model = model;
        }
        generator.timeout = env.secs_or("GENERATOR_TIMEOUT_SECS", 60)?;

        let mut tts = TtsConfig::default();
        if let Some(url) = env.get("TTS_URL") {
            tts.url = url;
        }
        let tts_language = env.get("TTS_LANGUAGE").unwrap_or_else(|| "en".to_string());

        // Rendering
        let mut render = RenderConfig::default();
        render.original_volume = env.parse_or("ORIGINAL_VOLUME", render.original_volume)?;
        render.narration_volume = env.parse_or("NARRATION_VOLUME", render.narration_volume)?;
        for (var, value) in [
            ("ORIGINAL_VOLUME", render.original_volume),
            ("NARRATION_VOLUME", render.narration_volume),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(PipelineError::config_invalid(var, "must be a non-negative number"));
            }
        }
        // An explicitly empty WATERMARK_TEXT disables the watermark.
        match (env.lookup)("WATERMARK_TEXT") {
            Some(text) if text.trim().is_empty() => render.watermark_text = None,
            Some(text) => render.watermark_text = Some(text.trim().to_string()),
            None => {}
        }
        if let Some(font) = env.get("WATERMARK_FONT") {
            render.watermark_font = Some(font);
        }
        render.overlay_hook = env.flag("OVERLAY_HOOK", false)?;
        render.timeout = env.secs_or("RENDER_TIMEOUT_SECS", 600)?;

        // Publishing
        let client_secret = read_inline_or_file(&env.required("YT_CLIENT_SECRET")?)
            .map_err(|e| PipelineError::config_invalid("YT_CLIENT_SECRET", e.to_string()))?;
        let token = read_inline_or_file(&env.required("YT_TOKEN")?)
            .map_err(|e| PipelineError::config_invalid("YT_TOKEN", e.to_string()))?;
        let credentials = OAuthCredentials::from_json(&client_secret, &token)
            .map_err(|e| PipelineError::config_invalid("YT_CLIENT_SECRET/YT_TOKEN", e.to_string()))?;

        let mut youtube = YouTubeConfig::default();
        youtube.privacy = env.parse_or("PUBLISH_PRIVACY", PrivacyStatus::default())?;
        if let Some(category) = env.get("PUBLISH_CATEGORY_ID") {
            youtube.category_id = category;
        }
        youtube.timeout = env.secs_or("PUBLISH_TIMEOUT_SECS", 600)?;

        Ok(Self {
            ledger,
            source,
            channels,
            policy,
            generator,
            tts,
            tts_language,
            render,
            youtube,
            credentials,
            staging_dir: PathBuf::from(
                env.get("STAGING_DIR")
                    .unwrap_or_else(|| DEFAULT_STAGING_DIR.to_string()),
            ),
            dry_run: env.flag("DRY_RUN", false)?,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;

    pub(crate) fn base_vars() -> HashMap<&'static str, String> {
        HashMap::from([
            ("LEDGER_URL", "https://eu1-fine-cat.upstash.io".to_string()),
            ("LEDGER_TOKEN", "ledger-token".to_string()),
            ("SOURCE_API_URL", "https://feed.example".to_string()),
            ("SOURCE_API_TOKEN", "feed-token".to_string()),
            ("SOURCE_CHANNELS", "our.littlejoys, cats.daily ,".to_string()),
            ("GENERATOR_API_KEY", "hf_key".to_string()),
            (
                "YT_CLIENT_SECRET",
                r#"{"installed":{"client_id":"cid","client_secret":"cs"}}"#.to_string(),
            ),
            ("YT_TOKEN", r#"{"refresh_token":"rt"}"#.to_string()),
        ])
    }

    fn load(vars: &HashMap<&'static str, String>) -> PipelineResult<PipelineConfig> {
        PipelineConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&base_vars()).unwrap();
        assert_eq!(config.channels, vec!["our.littlejoys", "cats.daily"]);
        assert_eq!(config.ledger.set_key, "uploaded_reels");
        assert_eq!(config.ledger.timeout, Duration::from_secs(10));
        assert_eq!(config.source.pool_size, 15);
        assert_eq!(config.source.metric, PopularityMetric::Views);
        assert_eq!(config.policy.min_popularity, 0);
        assert_eq!(config.generator.model, "mistralai/Mistral-7B-Instruct-v0.2");
        assert_eq!(config.tts_language, "en");
        assert!((config.render.original_volume - 0.3).abs() < f64::EPSILON);
        assert!((config.render.narration_volume - 2.0).abs() < f64::EPSILON);
        assert!(!config.render.overlay_hook);
        assert_eq!(config.youtube.privacy, PrivacyStatus::Public);
        assert_eq!(config.youtube.category_id, "22");
        assert_eq!(config.staging_dir, PathBuf::from("/tmp/reelcast"));
        assert!(!config.dry_run);
    }

    #[test]
    fn test_missing_required_names_variable() {
        for var in [
            "LEDGER_URL",
            "LEDGER_TOKEN",
            "SOURCE_API_URL",
            "SOURCE_API_TOKEN",
            "SOURCE_CHANNELS",
            "GENERATOR_API_KEY",
            "YT_CLIENT_SECRET",
            "YT_TOKEN",
        ] {
            let mut vars = base_vars();
            vars.remove(var);
            match load(&vars) {
                Err(PipelineError::ConfigMissing(name)) => assert_eq!(name, var),
                other => panic!("{var}: expected ConfigMissing, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_blank_value_counts_as_missing() {
        let mut vars = base_vars();
        vars.insert("GENERATOR_API_KEY", "   ".into());
        assert!(matches!(load(&vars), Err(PipelineError::ConfigMissing(v)) if v == "GENERATOR_API_KEY"));

        let mut vars = base_vars();
        vars.insert("SOURCE_CHANNELS", " , ".into());
        assert!(matches!(load(&vars), Err(PipelineError::ConfigMissing(_))));
    }

    #[test]
    fn test_redis_url_needs_no_token() {
        let mut vars = base_vars();
        vars.insert("LEDGER_URL", "redis://localhost:6379".into());
        vars.remove("LEDGER_TOKEN");
        let config = load(&vars).unwrap();
        assert!(config.ledger.is_native_redis());
        assert!(config.ledger.token.is_none());
    }

    #[test]
    fn test_overrides() {
        let mut vars = base_vars();
        vars.insert("MIN_POPULARITY", "25000".into());
        vars.insert("SOURCE_POPULARITY_METRIC", "likes".into());
        vars.insert("PUBLISH_PRIVACY", "unlisted".into());
        vars.insert("OVERLAY_HOOK", "true".into());
        vars.insert("DRY_RUN", "1".into());
        vars.insert("WATERMARK_TEXT", "".into());
        vars.insert("STAGING_DIR", "/var/tmp/rc".into());

        let config = load(&vars).unwrap();
        assert_eq!(config.policy.min_popularity, 25000);
        assert_eq!(config.source.metric, PopularityMetric::Likes);
        assert_eq!(config.youtube.privacy, PrivacyStatus::Unlisted);
        assert!(config.render.overlay_hook);
        assert!(config.dry_run);
        assert!(config.render.watermark_text.is_none());
        assert_eq!(config.staging_dir, PathBuf::from("/var/tmp/rc"));
    }

    #[test]
    fn test_unparsable_optional_is_invalid() {
        for (var, value) in [
            ("MIN_POPULARITY", "lots"),
            ("PUBLISH_PRIVACY", "secret"),
            ("DRY_RUN", "maybe"),
            ("ORIGINAL_VOLUME", "-1"),
            ("SOURCE_POOL_SIZE", "0"),
        ] {
            let mut vars = base_vars();
            vars.insert(var, value.into());
            match load(&vars) {
                Err(PipelineError::ConfigInvalid { var: name, .. }) => assert_eq!(name, var),
                other => panic!("{var}: expected ConfigInvalid, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_bad_credentials_are_invalid() {
        let mut vars = base_vars();
        vars.insert("YT_TOKEN", r#"{"token":"no-refresh"}"#.into());
        assert!(matches!(load(&vars), Err(PipelineError::ConfigInvalid { .. })));
    }

    #[test]
    fn test_debug_omits_secrets() {
        let shown = format!("{:?}", load(&base_vars()).unwrap());
        assert!(!shown.contains("ledger-token"));
        assert!(!shown.contains("hf_key"));
        assert!(!shown.contains("feed-token"));
    }
}
