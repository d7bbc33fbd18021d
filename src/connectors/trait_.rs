//! HTTP stream trait definition
//!
//! Defines the hooks every HTTP-backed stream supplies (path, headers,
//! response parsing, paging) and the shared request loop built on them.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use crate::connectors::metadata::ResourceDefinition;
use crate::error::StreamError;
use crate::models::Record;

/// Opaque token naming the next page of a stream.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
#[serde(transparent)]
pub struct PageToken(pub Value);

#[async_trait]
pub trait HttpStream: Send + Sync {
    /// Static description of the resource this stream reads.
    fn definition(&self) -> &'static ResourceDefinition;

    fn http_client(&self) -> &reqwest::Client;

    fn url_base(&self) -> &Url;

    fn name(&self) -> &'static str {
        self.definition().name
    }

    /// Path of the request for the given page, relative to [`Self::url_base`].
    fn path(&self, next_page_token: Option<&PageToken>) -> String;

    fn request_headers(&self, next_page_token: Option<&PageToken>) -> Result<HeaderMap, StreamError>;

    fn request_params(&self, _next_page_token: Option<&PageToken>) -> Vec<(String, String)> {
        Vec::new()
    }

    /// Turn one decoded response body into records.
    fn parse_response(&self, body: Value) -> Result<Vec<Record>, StreamError>;

    /// Token for the page after `body`, or `None` when the stream is complete.
    fn next_page_token(&self, body: &Value) -> Option<PageToken>;

    /// Fetch and normalize every page of the stream.
    ///
    /// Records are returned only once every page has been parsed; any failure
    /// discards what was collected so far.
    async fn read_records(&self) -> Result<Vec<Record>, StreamError> {
        let mut records = Vec::new();
        let mut next_page_token: Option<PageToken> = None;
        let mut pages = 0usize;

        loop {
            let url = self.url_base().join(&self.path(next_page_token.as_ref()))?;
            let headers = self.request_headers(next_page_token.as_ref())?;
            let params = self.request_params(next_page_token.as_ref());

            debug!(stream = %self.name(), url = %url, page = pages, "Requesting stream page");

            let mut request = self.http_client().get(url.clone()).headers(headers);
            if !params.is_empty() {
                request = request.query(&params);
            }

            let response = request.send().await.map_err(|source| StreamError::Transport {
                url: url.to_string(),
                source,
            })?;

            let status = response.status();
            if !status.is_success() {
                let headers = response
                    .headers()
                    .iter()
                    .filter_map(|(name, value)| {
                        value
                            .to_str()
                            .ok()
                            .map(|v| (name.to_string(), v.to_string()))
                    })
                    .collect();
                let body = response.text().await.ok().filter(|b| !b.is_empty());
                return Err(StreamError::Http {
                    url: url.to_string(),
                    status: status.as_u16(),
                    body,
                    headers,
                });
            }

            let bytes = response.bytes().await.map_err(|source| StreamError::Transport {
                url: url.to_string(),
                source,
            })?;
            let body: Value =
                serde_json::from_slice(&bytes).map_err(|err| StreamError::MalformedResponse {
                    url: url.to_string(),
                    details: err.to_string(),
                })?;

            next_page_token = self.next_page_token(&body);
            records.extend(self.parse_response(body)?);
            pages += 1;

            if next_page_token.is_none() {
                break;
            }
        }

        info!(
            stream = %self.name(),
            pages = pages,
            records = records.len(),
            "Stream read completed"
        );

        Ok(records)
    }
}
