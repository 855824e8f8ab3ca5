//! HttpStatusSource - reqwest による StatusSource 実装
//!
//! # エンドポイント
//! - `GET {base}/ehf-status/{id}` → `{ "ehf": <flag> }`
//! - `POST {base}{bulk_path}` (body: `{ "orgnumre": [...] }`) → `{ "<id>": <flag>, ... }`
//!
//! フラグはブラウザ側の実装に合わせて JavaScript の truthiness で解釈します。

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::domain::EntityId;
use crate::ports::{SourceError, StatusSource};

pub const STATUS_PATH: &str = "ehf-status";
pub const DEFAULT_BULK_PATH: &str = "/ehf-status-bulk";

#[derive(Serialize)]
struct BulkRequest<'a> {
    orgnumre: &'a [EntityId],
}

pub struct HttpStatusSource {
    client: Client,
    base_url: Url,
    bulk_url: Url,
}

impl HttpStatusSource {
    /// `bulk_path` is appended to the base url verbatim (e.g. `/ehf-status/bulk`).
    pub fn new(base_url: Url, bulk_path: &str, timeout: Duration) -> Result<Self, SourceError> {
        let bulk_url = join_path(&base_url, bulk_path)?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::Transport {
                url: base_url.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url,
            bulk_url,
        })
    }

    pub fn status_url(&self, id: &EntityId) -> Result<Url, SourceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SourceError::Transport {
                url: self.base_url.to_string(),
                message: "base url cannot carry a path".to_string(),
            })?
            .pop_if_empty()
            .extend([STATUS_PATH, id.as_str()]);
        Ok(url)
    }

    pub fn bulk_url(&self) -> &Url {
        &self.bulk_url
    }

    async fn read_json(response: reqwest::Response, url: &Url) -> Result<Value, SourceError> {
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let bytes = response.bytes().await.map_err(|e| transport_error(e, url))?;
        serde_json::from_slice(&bytes).map_err(|e| SourceError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl StatusSource for HttpStatusSource {
    async fn fetch_status(&self, id: &EntityId) -> Result<bool, SourceError> {
        let url = self.status_url(id)?;
        debug!(%url, "fetching status");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| transport_error(e, &url))?;
        let body = Self::read_json(response, &url).await?;
        decode_single(&body).map_err(|message| SourceError::Decode {
            url: url.to_string(),
            message,
        })
    }

    async fn fetch_bulk(&self, ids: &[EntityId]) -> Result<HashMap<EntityId, bool>, SourceError> {
        let url = self.bulk_url.clone();
        debug!(%url, count = ids.len(), "fetching bulk status");

        let response = self
            .client
            .post(url.clone())
            .json(&BulkRequest { orgnumre: ids })
            .send()
            .await
            .map_err(|e| transport_error(e, &url))?;
        let body = Self::read_json(response, &url).await?;
        decode_bulk(&body).map_err(|message| SourceError::Decode {
            url: url.to_string(),
            message,
        })
    }
}

fn join_path(base: &Url, path: &str) -> Result<Url, SourceError> {
    let joined = format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&joined).map_err(|e| SourceError::Transport {
        url: joined.clone(),
        message: e.to_string(),
    })
}

fn transport_error(err: reqwest::Error, url: &Url) -> SourceError {
    if err.is_timeout() {
        SourceError::Timeout {
            url: url.to_string(),
        }
    } else {
        SourceError::Transport {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

/// JavaScript truthiness of a JSON value.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// `{ "ehf": <flag> }`; a missing flag reads as false.
pub fn decode_single(body: &Value) -> Result<bool, String> {
    let object = body
        .as_object()
        .ok_or_else(|| format!("expected a JSON object, got {body}"))?;
    Ok(object.get("ehf").is_some_and(is_truthy))
}

/// `{ "<id>": <flag>, ... }`; blank keys are skipped.
pub fn decode_bulk(body: &Value) -> Result<HashMap<EntityId, bool>, String> {
    let object = body
        .as_object()
        .ok_or_else(|| format!("expected a JSON object, got {body}"))?;
    Ok(object
        .iter()
        .filter_map(|(key, flag)| EntityId::new(key.as_str()).ok().map(|id| (id, is_truthy(flag))))
        .collect())
}
