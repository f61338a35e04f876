//! HTTP Account Lookup
//!
//! Client for the scraper service answering `GET /check?account=<digits>`
//! with `{"result": [..]}`.

use crate::domain::entities::AccountInfo;
use crate::domain::repository::AccountLookup;
use crate::domain::value_objects::AccountNumber;
use crate::error::{GateError, GateResult};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Semaphore;

const FOUND_MARKER: &str = "✅";
const FAILED_MARKER: &str = "❌";

#[derive(Debug, Deserialize)]
struct LookupPayload {
    #[serde(default)]
    result: Vec<String>,
}

/// Scraper-backed account lookup
///
/// The scraper drives a single browser, so in-flight requests are capped.
pub struct HttpAccountLookup {
    client: reqwest::Client,
    base_url: String,
    permits: Semaphore,
}

impl HttpAccountLookup {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        max_concurrent: usize,
    ) -> GateResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GateError::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            permits: Semaphore::new(max_concurrent.max(1)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl AccountLookup for HttpAccountLookup {
    async fn lookup(&self, account: &AccountNumber) -> GateResult<Option<AccountInfo>> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| GateError::Internal(e.to_string()))?;

        let url = format!("{}/check", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("account", account.as_str())])
            .send()
            .await
            .map_err(|e| GateError::Lookup(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GateError::Lookup(format!("Lookup service returned {status}")));
        }

        let payload: LookupPayload = response
            .json()
            .await
            .map_err(|e| GateError::Lookup(e.to_string()))?;

        tracing::debug!(account = %account, lines = payload.result.len(), "Lookup service replied");

        parse_lookup_payload(payload.result).map_err(GateError::Lookup)
    }
}

/// Interpret the scraper's result lines
///
/// The first line carries the holder name after a success marker or an error
/// message with a failure marker. Remaining non-blank lines are banks.
pub fn parse_lookup_payload(lines: Vec<String>) -> Result<Option<AccountInfo>, String> {
    let mut lines = lines.into_iter();
    let Some(first) = lines.next() else {
        return Ok(None);
    };

    if first.contains(FAILED_MARKER) {
        return Err(first.trim().to_owned());
    }

    let Some(name) = first.trim().strip_prefix(FOUND_MARKER) else {
        return Ok(None);
    };
    let name = name.trim();
    if name.is_empty() {
        return Ok(None);
    }

    let banks = lines
        .map(|line| line.trim().to_owned())
        .filter(|line| !line.is_empty())
        .collect();

    Ok(Some(AccountInfo {
        name: name.to_owned(),
        banks,
    }))
}
