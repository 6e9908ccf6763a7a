//! Client for the cninfo shareholder-change API.

use crate::domain::constants::{self, API_OK_CODE};
use crate::domain::models::{Category, FetchSettings, Record, Table};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ORIGIN, REFERER, USER_AGENT};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{info, warn};

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("api returned code {code}: {msg}")]
    ApiStatus { code: String, msg: String },
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Result of one fetch. A failure still lets the run go on with an empty
/// table, but stays distinguishable from a fetch that returned no rows.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Fetched(Table),
    Failed { reason: String },
}

impl FetchOutcome {
    pub fn into_table(self) -> Table {
        match self {
            FetchOutcome::Fetched(t) => t,
            FetchOutcome::Failed { .. } => Table::new(),
        }
    }
}

pub trait Fetcher {
    fn fetch(&self, category: Category) -> FetchOutcome;
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    code: Value,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    data: Option<ApiData>,
}

#[derive(Debug, Deserialize, Default)]
struct ApiData {
    #[serde(default)]
    records: Option<Vec<Map<String, Value>>>,
    #[serde(default)]
    list: Option<Vec<Map<String, Value>>>,
}

fn code_is_ok(code: &Value) -> bool {
    match code {
        Value::Number(n) => n.as_i64() == Some(API_OK_CODE),
        Value::String(s) => s.trim().parse::<i64>().ok() == Some(API_OK_CODE),
        _ => false,
    }
}

/// Text form of a JSON value as stored in snapshots and compared in keys.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

pub fn record_from_object(object: &Map<String, Value>) -> Record {
    object.iter().map(|(k, v)| (k.clone(), value_text(v))).collect()
}

/// Decode an API body. Rows come from `data.records`, falling back to
/// `data.list` when `records` is absent or empty.
pub fn parse_response(body: &str) -> Result<Table, FetchError> {
    let resp: ApiResponse = serde_json::from_str(body)?;
    if !code_is_ok(&resp.code) {
        return Err(FetchError::ApiStatus {
            code: value_text(&resp.code),
            msg: resp.msg.unwrap_or_default(),
        });
    }
    let data = resp.data.unwrap_or_default();
    let rows = match (data.records, data.list) {
        (Some(records), _) if !records.is_empty() => records,
        (_, Some(list)) => list,
        _ => Vec::new(),
    };
    Ok(rows.iter().map(record_from_object).collect())
}

pub struct CninfoClient {
    client: reqwest::blocking::Client,
    base_url: String,
    time_mark: String,
}

impl CninfoClient {
    pub fn new(settings: &FetchSettings) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(constants::USER_AGENT));
        headers.insert(REFERER, HeaderValue::from_static(constants::REFERER));
        headers.insert(ORIGIN, HeaderValue::from_static(constants::ORIGIN));
        headers.insert(ACCEPT, HeaderValue::from_static(constants::ACCEPT));
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .default_headers(headers)
            .build()?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            time_mark: settings.time_mark.clone(),
        })
    }

    pub fn endpoint_url(&self, category: Category) -> String {
        format!("{}/{}", self.base_url, category.endpoint())
    }

    fn fetch_table(&self, category: Category) -> Result<Table, FetchError> {
        let body = self
            .client
            .post(self.endpoint_url(category))
            .query(&[
                ("type", category.api_type()),
                ("timeMark", self.time_mark.as_str()),
            ])
            .send()?
            .error_for_status()?
            .text()?;
        parse_response(&body)
    }
}

impl Fetcher for CninfoClient {
    fn fetch(&self, category: Category) -> FetchOutcome {
        match self.fetch_table(category) {
            Ok(table) => {
                info!(%category, rows = table.len(), "fetched");
                FetchOutcome::Fetched(table)
            }
            Err(e) => {
                warn!(%category, error = %e, "fetch failed");
                FetchOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}
