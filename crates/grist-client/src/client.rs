//! REST client for one Grist document.

use crate::config::{resolve_api_key, GristConfig};
use json_types::{records_from_columns, to_wire, TableData};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde_json::{json, Value};
use sync_core::{Error, Record, Result, RowId};
use table_store::{Filters, RemoteTableStore};
use tracing::{debug, info, warn};

/// Client for the REST API of one document.
#[derive(Debug, Clone)]
pub struct GristClient {
    http: Client,
    config: GristConfig,
    api_key: String,
}

impl GristClient {
    /// Create a client. Fails if no API key can be found.
    pub fn new(config: GristConfig) -> Result<Self> {
        let api_key = resolve_api_key(config.api_key.as_deref())?;
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Configuration(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            config,
            api_key,
        })
    }

    pub fn config(&self) -> &GristConfig {
        &self.config
    }

    /// Make one REST call against a document endpoint.
    ///
    /// `path` is relative to `<server>/api/docs/<doc_id>/` and may carry an
    /// already-encoded query string. Returns `None` when the request was
    /// skipped in dry-run mode, and `Some(Value::Null)` for an empty body.
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Option<Value>> {
        let url = self.config.doc_url(path);
        if self.config.dry_run && method != Method::GET {
            info!("DRYRUN NOT sending {} request to {}", method, url);
            return Ok(None);
        }

        let mut retries = 0;
        loop {
            debug!("sending {} request to {}", method, url);
            match self.send(&method, &url, body).await {
                Err(e) if e.is_transient() && retries < self.config.retry.max_retries => {
                    retries += 1;
                    warn!(
                        "Retrying after error ({}/{}): {}",
                        retries, self.config.retry.max_retries, e
                    );
                    tokio::time::sleep(self.config.retry.delay).await;
                }
                result => return result.map(Some),
            }
        }
    }

    async fn send(&self, method: &Method, url: &str, body: Option<&Value>) -> Result<Value> {
        let mut request = self
            .http
            .request(method.clone(), url)
            .bearer_auth(&self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Network(format!("{method} {url}: {e}")))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Network(format!("Failed to read response from {url}: {e}")))?;

        if !status.is_success() {
            let message = error_message(&text).unwrap_or_else(|| {
                status.canonical_reason().unwrap_or("Unknown error").to_string()
            });
            return Err(Error::RemoteRequest {
                status: status.as_u16(),
                message,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// The `error` string of a `{"error": "..."}` body, if there is one.
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value.get("error")?.as_str().map(str::to_string)
}

fn table_data_path(table_id: &str) -> String {
    format!("tables/{}/data", urlencoding::encode(table_id))
}

/// `filter` query value: each column mapped to a one-element list of its
/// wire value, keys sorted.
fn filter_query(filters: &Filters) -> String {
    let filter: serde_json::Map<String, Value> = filters
        .iter()
        .map(|(col_id, value)| (col_id.clone(), json!([to_wire(value)])))
        .collect();
    Value::Object(filter).to_string()
}

#[async_trait::async_trait]
impl RemoteTableStore for GristClient {
    async fn fetch(&self, table_id: &str, filters: Option<&Filters>) -> Result<Vec<Record>> {
        let mut path = table_data_path(table_id);
        if let Some(filters) = filters.filter(|f| !f.is_empty()) {
            path.push_str("?filter=");
            path.push_str(&urlencoding::encode(&filter_query(filters)));
        }

        let columns = self
            .call(Method::GET, &path, None)
            .await?
            .unwrap_or(Value::Null);
        records_from_columns(columns)
    }

    async fn bulk_add(&self, table_id: &str, data: &TableData) -> Result<Vec<RowId>> {
        let body = serde_json::to_value(data)?;
        match self
            .call(Method::POST, &table_data_path(table_id), Some(&body))
            .await?
        {
            Some(ids) => serde_json::from_value(ids).map_err(|e| {
                Error::UnexpectedResponse(format!("expected a list of row ids: {e}"))
            }),
            None => Ok(Vec::new()),
        }
    }

    async fn bulk_update(&self, table_id: &str, data: &TableData) -> Result<()> {
        let body = serde_json::to_value(data)?;
        self.call(Method::PATCH, &table_data_path(table_id), Some(&body))
            .await?;
        Ok(())
    }

    async fn bulk_delete(&self, table_id: &str, row_ids: &[RowId]) -> Result<()> {
        let body = json!([["BulkRemoveRecord", table_id, row_ids]]);
        self.call(Method::POST, "apply", Some(&body)).await?;
        Ok(())
    }
}
