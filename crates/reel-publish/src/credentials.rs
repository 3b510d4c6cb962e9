//! OAuth client secret and authorized-user token documents.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{PublishError, PublishResult};

/// Google's OAuth token endpoint.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Client secret document as downloaded from the cloud console.
///
/// The client block sits under `installed` (desktop apps) or `web`.
#[derive(Debug, Deserialize)]
struct ClientSecretDocument {
    installed: Option<ClientBlock>,
    web: Option<ClientBlock>,
}

#[derive(Debug, Deserialize)]
struct ClientBlock {
    client_id: String,
    client_secret: String,
    #[serde(default)]
    token_uri: Option<String>,
}

/// Authorized-user token document, as written by the usual OAuth helper libraries.
#[derive(Debug, Deserialize)]
struct TokenDocument {
    #[serde(alias = "access_token")]
    token: Option<String>,
    refresh_token: Option<String>,
    #[serde(default)]
    token_uri: Option<String>,
    #[serde(default)]
    client_id: Option<String>,
    #[serde(default)]
    client_secret: Option<String>,
    #[serde(default)]
    expiry: Option<String>,
}

/// Everything needed to mint access tokens for the upload API.
#[derive(Clone)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub token_uri: String,
    /// Access token carried over from the token document, if any
    pub access_token: Option<String>,
    pub expiry: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("client_id", &self.client_id)
            .field("token_uri", &self.token_uri)
            .field("expiry", &self.expiry)
            .finish_non_exhaustive()
    }
}

impl OAuthCredentials {
    /// Combine a client secret document and a token document.
    ///
    /// Client id/secret from the client secret document take precedence.
    pub fn from_json(client_secret_json: &str, token_json: &str) -> PublishResult<Self> {
        let secret: ClientSecretDocument = serde_json::from_str(client_secret_json)
            .map_err(|e| PublishError::invalid_credentials(format!("client secret: {}", e)))?;
        let token: TokenDocument = serde_json::from_str(token_json)
            .map_err(|e| PublishError::invalid_credentials(format!("token: {}", e)))?;

        let block = secret.installed.or(secret.web);

        let client_id = block
            .as_ref()
            .map(|b| b.client_id.clone())
            .or(token.client_id)
            .ok_or_else(|| PublishError::invalid_credentials("missing client_id"))?;
        let client_secret = block
            .as_ref()
            .map(|b| b.client_secret.clone())
            .or(token.client_secret)
            .ok_or_else(|| PublishError::invalid_credentials("missing client_secret"))?;
        let refresh_token = token
            .refresh_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| PublishError::invalid_credentials("token has no refresh_token"))?;

        let token_uri = token
            .token_uri
            .or_else(|| block.and_then(|b| b.token_uri))
            .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string());

        let expiry = token.expiry.as_deref().and_then(parse_expiry);

        Ok(Self {
            client_id,
            client_secret,
            refresh_token,
            token_uri,
            access_token: token.token.filter(|t| !t.is_empty()),
            expiry,
        })
    }
}

/// Token documents write `expiry` with or without a zone suffix; both are UTC.
fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Resolve a credential value that is either inline JSON or a path to a JSON file.
pub fn read_inline_or_file(value: &str) -> PublishResult<String> {
    let trimmed = value.trim();
    if trimmed.starts_with('{') {
        return Ok(trimmed.to_string());
    }
    let path = Path::new(trimmed);
    std::fs::read_to_string(path).map_err(|e| {
        PublishError::invalid_credentials(format!("cannot read {}: {}", path.display(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SECRET: &str = r#"{"installed":{"client_id":"cid.apps.googleusercontent.com","client_secret":"shh","token_uri":"https://oauth2.googleapis.com/token"}}"#;
    const TOKEN: &str = r#"{"token":"ya29.old","refresh_token":"1//rt","scopes":["https://www.googleapis.com/auth/youtube.upload"],"expiry":"2024-05-01T10:00:00.123456Z"}"#;

    #[test]
    fn test_parse_installed_client() {
        let creds = OAuthCredentials::from_json(SECRET, TOKEN).unwrap();
        assert_eq!(creds.client_id, "cid.apps.googleusercontent.com");
        assert_eq!(creds.client_secret, "shh");
        assert_eq!(creds.refresh_token, "1//rt");
        assert_eq!(creds.access_token.as_deref(), Some("ya29.old"));
        assert!(creds.expiry.is_some());
    }

    #[test]
    fn test_parse_web_client_and_naive_expiry() {
        let secret = r#"{"web":{"client_id":"w","client_secret":"s"}}"#;
        let token = r#"{"access_token":"a","refresh_token":"r","expiry":"2024-05-01T10:00:00"}"#;
        let creds = OAuthCredentials::from_json(secret, token).unwrap();
        assert_eq!(creds.client_id, "w");
        assert_eq!(creds.token_uri, DEFAULT_TOKEN_URI);
        assert_eq!(creds.expiry.unwrap().to_rfc3339(), "2024-05-01T10:00:00+00:00");
    }

    #[test]
    fn test_missing_refresh_token() {
        let err = OAuthCredentials::from_json(SECRET, r#"{"token":"a"}"#).unwrap_err();
        assert!(matches!(err, PublishError::InvalidCredentials(_)));
    }

    #[test]
    fn test_malformed_json() {
        assert!(OAuthCredentials::from_json("not json", TOKEN).is_err());
    }

    #[test]
    fn test_debug_hides_secrets() {
        let creds = OAuthCredentials::from_json(SECRET, TOKEN).unwrap();
        let shown = format!("{:?}", creds);
        assert!(!shown.contains("shh"));
        assert!(!shown.contains("1//rt"));
    }

    #[test]
    fn test_read_inline_or_file() {
        assert_eq!(read_inline_or_file("  {\"a\":1} ").unwrap(), "{\"a\":1}");

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", TOKEN).unwrap();
        let read = read_inline_or_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(read, TOKEN);

        assert!(read_inline_or_file("/nonexistent/token.json").is_err());
    }
}
