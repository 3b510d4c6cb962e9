//! Redis REST API backend (Upstash-style).
//!
//! Commands are issued as path segments:
//! - `GET  {url}/sismember/{set}/{id}` -> `{"result": 0|1}`
//! - `POST {url}/sadd/{set}/{id}`      -> `{"result": 0|1}`
//! - `GET  {url}/smembers/{set}`       -> `{"result": ["id", ...]}`
//!
//! Errors come back as `{"error": "..."}`, usually with a 4xx status.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use reel_models::ContentId;

use crate::config::LedgerConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::{members_to_ids, PublicationLedger};
use crate::metrics::record_request;

const BACKEND: &str = "rest";

/// REST command response envelope.
#[derive(Debug, Deserialize)]
struct CommandResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Ledger client for a Redis REST endpoint.
pub struct RestLedger {
    http: Client,
    base_url: String,
    token: String,
    set_key: String,
    timeout_secs: u64,
}

impl RestLedger {
    /// Create a new REST ledger client.
    pub fn new(config: &LedgerConfig) -> LedgerResult<Self> {
        let token = config
            .token
            .clone()
            .ok_or_else(|| LedgerError::config("REST ledger requires a bearer token"))?;

        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("reel-ledger/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(LedgerError::Network)?;

        Ok(Self {
            http,
            base_url: config.url.trim().trim_end_matches('/').to_string(),
            token,
            set_key: config.set_key.clone(),
            timeout_secs: config.timeout.as_secs(),
        })
    }

    fn command_url(&self, command: &str, id: Option<&ContentId>) -> String {
        let set = urlencoding::encode(&self.set_key);
        match id {
            Some(id) => format!(
                "{}/{}/{}/{}",
                self.base_url,
                command,
                set,
                urlencoding::encode(id.as_str())
            ),
            None => format!("{}/{}/{}", self.base_url, command, set),
        }
    }

    /// Execute one command and return its `result` value.
    async fn execute(
        &self,
        operation: &'static str,
        method: Method,
        url: String,
    ) -> LedgerResult<Value> {
        let started = Instant::now();
        let result = self.send(method, &url).await;
        record_request(
            BACKEND,
            operation,
            result.is_ok(),
            started.elapsed().as_secs_f64() * 1000.0,
        );

        if let Err(ref e) = result {
            warn!(operation, error = %e, "Ledger request failed");
        }
        result
    }

    async fn send(&self, method: Method, url: &str) -> LedgerResult<Value> {
        let response = self
            .http
            .request(method, url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LedgerError::Timeout(self.timeout_secs)
                } else {
                    LedgerError::Network(e)
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(LedgerError::Network)?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(LedgerError::Store {
                status: status.as_u16(),
                message: "ledger credential rejected".to_string(),
            });
        }

        let parsed: CommandResponse = serde_json::from_str(&body).map_err(|e| {
            if status.is_success() {
                LedgerError::invalid_response(format!("{}: {}", e, body))
            } else {
                LedgerError::Store {
                    status: status.as_u16(),
                    message: body.clone(),
                }
            }
        })?;

        if let Some(error) = parsed.error {
            return Err(LedgerError::Store {
                status: status.as_u16(),
                message: error,
            });
        }

        if !status.is_success() {
            return Err(LedgerError::Store {
                status: status.as_u16(),
                message: body,
            });
        }

        parsed
            .result
            .ok_or_else(|| LedgerError::invalid_response("missing result field"))
    }
}

/// Interpret a `result` holding an integer flag (`0`/`1`, possibly as a string).
fn result_as_flag(value: &Value) -> LedgerResult<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| LedgerError::invalid_response(format!("unexpected number {}", n))),
        Value::String(s) => s
            .parse()
            .map_err(|_| LedgerError::invalid_response(format!("unexpected result {:?}", s))),
        other => Err(LedgerError::invalid_response(format!(
            "unexpected result {}",
            other
        ))),
    }
}

#[async_trait]
impl PublicationLedger for RestLedger {
    async fn contains(&self, id: &ContentId) -> LedgerResult<bool> {
        let url = self.command_url("sismember", Some(id));
        let value = self.execute("contains", Method::GET, url).await?;
        let present = result_as_flag(&value)? == 1;
        debug!(content_id = %id, present, "Ledger membership check");
        Ok(present)
    }

    async fn add(&self, id: &ContentId) -> LedgerResult<()> {
        let url = self.command_url("sadd", Some(id));
        let value = self.execute("add", Method::POST, url).await?;
        // 0 means the id was already present, which is fine.
        let added = result_as_flag(&value)?;
        debug!(content_id = %id, newly_added = added == 1, "Ledger insert");
        Ok(())
    }

    async fn members(&self) -> LedgerResult<Vec<ContentId>> {
        let url = self.command_url("smembers", None);
        let value = self.execute("members", Method::GET, url).await?;
        let raw: Vec<String> = serde_json::from_value(value)?;
        Ok(members_to_ids(raw))
    }

    fn backend(&self) -> &'static str {
        BACKEND
    }
}
