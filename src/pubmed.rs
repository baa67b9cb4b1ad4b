//! Minimal NCBI E-utilities client for the two lookups the generator needs.
//!
//! We only call `esearch.fcgi` (term -> ordered id list) and `esummary.fcgi` (id -> title).
//! Both are best-effort: every failure is logged and reported to the caller as "not found".
//!
//! NOTE: We never log the API key.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use reqwest::header::{ACCEPT, USER_AGENT};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::config::PubMedSettings;
use crate::util::trunc_for_log;

/// Read-only literature search collaborator.
///
/// Implementations must absorb their own failures: an empty id list or `None`
/// is the only way to say "nothing usable came back".
pub trait LiteratureSearch: Send + Sync + 'static {
  /// Ordered result identifiers for `term`, at most `retmax` of them.
  fn search_ids(&self, term: &str, retmax: u32) -> impl Future<Output = Vec<String>> + Send;

  /// Display title of one result.
  fn summary_title(&self, id: &str) -> impl Future<Output = Option<String>> + Send;
}

#[derive(Debug, thiserror::Error)]
enum PubMedError {
  #[error("request failed: {0}")]
  Request(#[from] reqwest::Error),
  #[error("PubMed HTTP {status}: {message}")]
  Status { status: reqwest::StatusCode, message: String },
}

#[derive(Clone)]
pub struct PubMedClient {
  client: reqwest::Client,
  pub base_url: String,
  api_key: Option<String>,
}

impl PubMedClient {
  pub fn new(settings: &PubMedSettings) -> Result<Self, reqwest::Error> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(settings.request_timeout_secs))
      .build()?;
    Ok(Self {
      client,
      base_url: settings.base_url.trim_end_matches('/').to_string(),
      api_key: settings.api_key.clone(),
    })
  }

  pub fn has_api_key(&self) -> bool {
    self.api_key.is_some()
  }

  async fn get_json<T: for<'a> Deserialize<'a>>(
    &self,
    endpoint: &str,
    params: &[(&str, &str)],
  ) -> Result<T, PubMedError> {
    let url = format!("{}/{}", self.base_url, endpoint);
    let mut query: Vec<(&str, &str)> = vec![("db", "pubmed"), ("retmode", "json")];
    query.extend_from_slice(params);
    if let Some(key) = &self.api_key {
      query.push(("api_key", key.as_str()));
    }

    let res = self
      .client
      .get(&url)
      .header(USER_AGENT, "medsky-backend/0.1")
      .header(ACCEPT, "application/json")
      .query(&query)
      .send()
      .await?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let message = extract_eutils_error(&body).unwrap_or_else(|| trunc_for_log(&body, 200));
      return Err(PubMedError::Status { status, message });
    }

    Ok(res.json::<T>().await?)
  }
}

impl LiteratureSearch for PubMedClient {
  #[instrument(level = "debug", skip(self), fields(%term, retmax))]
  async fn search_ids(&self, term: &str, retmax: u32) -> Vec<String> {
    let retmax = retmax.to_string();
    match self
      .get_json::<SearchResponse>("esearch.fcgi", &[("term", term), ("retmax", retmax.as_str())])
      .await
    {
      Ok(body) => {
        let ids = body.esearchresult.map(|r| r.idlist).unwrap_or_default();
        debug!(target: "case_study", %term, hits = ids.len(), "PubMed search finished");
        ids
      }
      Err(e) => {
        warn!(target: "case_study", %term, error = %e, "PubMed search failed");
        Vec::new()
      }
    }
  }

  #[instrument(level = "debug", skip(self), fields(%id))]
  async fn summary_title(&self, id: &str) -> Option<String> {
    match self.get_json::<SummaryResponse>("esummary.fcgi", &[("id", id)]).await {
      Ok(body) => {
        let title = body.title_for(id);
        if title.is_none() {
          warn!(target: "case_study", %id, "PubMed summary has no title");
        }
        title
      }
      Err(e) => {
        warn!(target: "case_study", %id, error = %e, "PubMed summary failed");
        None
      }
    }
  }
}

// --- E-utilities DTOs ---

#[derive(Deserialize)]
struct SearchResponse {
  #[serde(default)]
  esearchresult: Option<SearchResult>,
}
#[derive(Deserialize)]
struct SearchResult {
  #[serde(default)]
  idlist: Vec<String>,
}

/// `result` maps each uid to its document summary, plus a `uids` array we ignore.
#[derive(Deserialize)]
struct SummaryResponse {
  #[serde(default)]
  result: HashMap<String, serde_json::Value>,
}

impl SummaryResponse {
  fn title_for(&self, id: &str) -> Option<String> {
    self
      .result
      .get(id)
      .and_then(|doc| doc.get("title"))
      .and_then(|t| t.as_str())
      .map(|t| t.trim().to_string())
      .filter(|t| !t.is_empty())
  }
}

/// E-utilities reports failures as `{"error": "..."}`.
fn extract_eutils_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: String }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error)
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::{extract::Query, routing::get, Json, Router};
  use axum::http::StatusCode;
  use serde_json::json;

  async fn esearch(Query(q): Query<HashMap<String, String>>) -> Json<serde_json::Value> {
    assert_eq!(q.get("db").map(String::as_str), Some("pubmed"));
    assert_eq!(q.get("retmode").map(String::as_str), Some("json"));
    let ids = match q.get("term").map(String::as_str) {
      Some("cardiology diagnosis") => json!(["111", "222"]),
      _ => json!([]),
    };
    Json(json!({ "header": {}, "esearchresult": { "count": "2", "idlist": ids } }))
  }

  async fn esummary(Query(q): Query<HashMap<String, String>>) -> Json<serde_json::Value> {
    let id = q.get("id").cloned().unwrap_or_default();
    let doc = if id == "111" { json!({ "uid": "111", "title": "Troponin kinetics in MI." }) } else { json!({ "uid": id }) };
    let mut result = serde_json::Map::new();
    result.insert("uids".into(), json!([id.clone()]));
    result.insert(id, doc);
    Json(json!({ "result": result }))
  }

  async fn spawn_mock(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
  }

  fn client_for(base_url: String) -> PubMedClient {
    PubMedClient::new(&PubMedSettings { base_url, api_key: None, request_timeout_secs: 5 }).unwrap()
  }

  #[tokio::test]
  async fn reads_ids_and_titles_from_eutils_json() {
    let base = spawn_mock(
      Router::new()
        .route("/esearch.fcgi", get(esearch))
        .route("/esummary.fcgi", get(esummary)),
    )
    .await;
    let client = client_for(base);

    assert_eq!(client.search_ids("cardiology diagnosis", 5).await, vec!["111", "222"]);
    assert!(client.search_ids("nothing here", 5).await.is_empty());
    assert_eq!(client.summary_title("111").await.as_deref(), Some("Troponin kinetics in MI."));
    assert_eq!(client.summary_title("222").await, None);
  }

  #[tokio::test]
  async fn http_errors_read_as_not_found() {
    let base = spawn_mock(
      Router::new()
        .route("/esearch.fcgi", get(|| async { (StatusCode::TOO_MANY_REQUESTS, Json(json!({ "error": "API rate limit exceeded" }))) }))
        .route("/esummary.fcgi", get(|| async { "not json" })),
    )
    .await;
    let client = client_for(base);

    assert!(client.search_ids("cardiology diagnosis", 5).await.is_empty());
    assert_eq!(client.summary_title("111").await, None);
  }

  #[tokio::test]
  async fn unreachable_service_reads_as_not_found() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = client_for(format!("http://{addr}"));

    assert!(client.search_ids("cardiology diagnosis", 5).await.is_empty());
    assert_eq!(client.summary_title("1").await, None);
  }

  #[test]
  fn extracts_error_message() {
    assert_eq!(extract_eutils_error(r#"{"error":"bad key"}"#).as_deref(), Some("bad key"));
    assert_eq!(extract_eutils_error("<html>"), None);
  }
}
