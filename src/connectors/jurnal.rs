//! Jurnal connector implementation
//!
//! Every Jurnal resource is read the same way: one GET against the API base
//! with the `apikey` header, envelope unwrapped, fields pruned. Streams differ
//! only in their [`ResourceDefinition`].

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{ApiKey, AppConfig, ConfigError, ConnectorConfig};
use crate::connectors::metadata::ResourceDefinition;
use crate::connectors::registry::{Registry, RegistryError};
use crate::connectors::resources::ACTIVE_COMPANY;
use crate::connectors::trait_::{HttpStream, PageToken};
use crate::error::StreamError;
use crate::models::Record;
use crate::normalization;
use crate::protocol::{ConnectionStatus, Status};

/// Header carrying the API key on every request
pub const API_KEY_HEADER: &str = "apikey";

/// One Jurnal resource bound to a client and credential
#[derive(Debug, Clone)]
pub struct JurnalStream {
    definition: &'static ResourceDefinition,
    client: reqwest::Client,
    url_base: Url,
    apikey: ApiKey,
}

impl JurnalStream {
    pub fn new(
        definition: &'static ResourceDefinition,
        client: reqwest::Client,
        url_base: Url,
        apikey: ApiKey,
    ) -> Self {
        Self {
            definition,
            client,
            url_base,
            apikey,
        }
    }
}

#[async_trait]
impl HttpStream for JurnalStream {
    fn definition(&self) -> &'static ResourceDefinition {
        self.definition
    }

    fn http_client(&self) -> &reqwest::Client {
        &self.client
    }

    fn url_base(&self) -> &Url {
        &self.url_base
    }

    fn path(&self, _next_page_token: Option<&PageToken>) -> String {
        self.definition.path.to_string()
    }

    fn request_headers(&self, _next_page_token: Option<&PageToken>) -> Result<HeaderMap, StreamError> {
        let mut value = HeaderValue::from_str(self.apikey.expose()).map_err(|_| {
            StreamError::InvalidHeader {
                name: API_KEY_HEADER.to_string(),
            }
        })?;
        value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static(API_KEY_HEADER), value);
        Ok(headers)
    }

    fn parse_response(&self, body: Value) -> Result<Vec<Record>, StreamError> {
        normalization::normalize_response(self.definition, body)
    }

    // TODO: Jurnal list endpoints accept `page`/`per_page`; wire them in once the
    // response's paging metadata is confirmed. Until then each stream is one request.
    fn next_page_token(&self, _body: &Value) -> Option<PageToken> {
        None
    }
}

/// Why a connection check failed
#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    Stream(#[from] StreamError),
    #[error("Unable to get current active company")]
    NoActiveCompany,
}

/// Result of the pre-flight connection check
#[derive(Debug)]
pub struct ConnectionCheck {
    pub succeeded: bool,
    pub error: Option<CheckError>,
}

impl ConnectionCheck {
    pub fn succeeded() -> Self {
        Self {
            succeeded: true,
            error: None,
        }
    }

    pub fn failed(error: CheckError) -> Self {
        Self {
            succeeded: false,
            error: Some(error),
        }
    }
}

impl From<ConnectionCheck> for ConnectionStatus {
    fn from(check: ConnectionCheck) -> Self {
        match check.error {
            None if check.succeeded => ConnectionStatus {
                status: Status::Succeeded,
                message: None,
            },
            error => ConnectionStatus {
                status: Status::Failed,
                message: error.map(|err| err.to_string()),
            },
        }
    }
}

/// Errors building a source from configuration
#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// The Jurnal source: connection check plus the streams it exposes
#[derive(Debug, Clone)]
pub struct JurnalSource {
    config: ConnectorConfig,
    client: reqwest::Client,
    url_base: Url,
    registry: &'static Registry,
}

impl JurnalSource {
    /// Create a source from runtime settings and connector parameters.
    pub fn new(app_config: &AppConfig, config: ConnectorConfig) -> Result<Self, SourceError> {
        config.validate()?;
        let url_base = app_config.api_base_url()?;
        let registry = Registry::global()?;
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(SourceError::HttpClient)?;

        Ok(Self {
            config,
            client,
            url_base,
            registry,
        })
    }

    pub fn registry(&self) -> &'static Registry {
        self.registry
    }

    /// Build the stream for one resource definition.
    pub fn stream(&self, definition: &'static ResourceDefinition) -> JurnalStream {
        JurnalStream::new(
            definition,
            self.client.clone(),
            self.url_base.clone(),
            self.config.apikey.clone(),
        )
    }

    /// Every stream this source exposes, in declaration order.
    pub fn streams(&self) -> Vec<JurnalStream> {
        self.registry
            .definitions()
            .map(|definition| self.stream(definition))
            .collect()
    }

    /// Read the active company and require a non-empty identifier.
    pub async fn check_connection(&self) -> Result<ConnectionCheck, SourceError> {
        let definition = self.registry.get(ACTIVE_COMPANY)?;
        let stream = self.stream(definition);

        info!(url_base = %self.url_base, "Checking Jurnal connection");

        let records = match stream.read_records().await {
            Ok(records) => records,
            Err(err) => {
                warn!(error = %err, "Connection check failed");
                return Ok(ConnectionCheck::failed(err.into()));
            }
        };

        let has_id = records
            .first()
            .and_then(|company| company.get("id"))
            .is_some_and(|id| id.is_truthy());

        if has_id {
            debug!("Connection check succeeded");
            Ok(ConnectionCheck::succeeded())
        } else {
            warn!("Connection check returned no active company id");
            Ok(ConnectionCheck::failed(CheckError::NoActiveCompany))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectors::metadata::{FieldKind, FieldSpec};
    use crate::models::FieldValue;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    static ID_NAME: &[FieldSpec] = &[
        FieldSpec::new("id", FieldKind::Id),
        FieldSpec::new("name", FieldKind::String),
    ];

    static TEST_ACCOUNTS: ResourceDefinition = ResourceDefinition {
        name: "accounts",
        path: "accounts",
        records_key: Some("accounts"),
        primary_key: Some("id"),
        fields: ID_NAME,
    };

    fn app_config(server: &MockServer) -> AppConfig {
        AppConfig {
            api_base: format!("{}/core/api/v1/", server.uri()),
            ..AppConfig::default()
        }
    }

    fn source(server: &MockServer) -> JurnalSource {
        JurnalSource::new(&app_config(server), ConnectorConfig::new("test-key").unwrap()).unwrap()
    }

    #[test]
    fn test_request_headers_carry_api_key() {
        let stream = JurnalStream::new(
            &TEST_ACCOUNTS,
            reqwest::Client::new(),
            Url::parse("https://api.jurnal.id/core/api/v1/").unwrap(),
            ApiKey::new("abc123"),
        );

        let headers = stream.request_headers(None).unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("apikey").unwrap(), "abc123");
        assert!(headers.get("apikey").unwrap().is_sensitive());
        assert!(stream.request_params(None).is_empty());
        assert_eq!(stream.path(None), "accounts");
    }

    #[test]
    fn test_next_page_token_is_always_none() {
        let stream = JurnalStream::new(
            &TEST_ACCOUNTS,
            reqwest::Client::new(),
            Url::parse("https://api.jurnal.id/core/api/v1/").unwrap(),
            ApiKey::new("abc123"),
        );

        assert_eq!(stream.next_page_token(&json!({"accounts": []})), None);
        assert_eq!(
            stream.next_page_token(&json!({
                "accounts": [{"id": 1}],
                "links": {"next": "https://api.jurnal.id/core/api/v1/accounts?page=2"},
                "current_page": 1,
                "total_pages": 5
            })),
            None
        );
    }

    #[tokio::test]
    async fn test_read_records_prunes_to_declared_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/core/api/v1/accounts"))
            .and(header("apikey", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "accounts": [{"id": "1", "name": "Cash", "extra_field": "x"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let source = source(&server);
        let stream = source.stream(&TEST_ACCOUNTS);

        let records = stream.read_records().await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].to_json().unwrap(), json!({"id": "1", "name": "Cash"}));
    }

    #[tokio::test]
    async fn test_read_records_surfaces_forbidden() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/core/api/v1/accounts"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .expect(1)
            .mount(&server)
            .await;

        let stream = source(&server).stream(&TEST_ACCOUNTS);

        let err = stream.read_records().await.unwrap_err();
        match err {
            StreamError::Http { status, body, .. } => {
                assert_eq!(status, 403);
                assert_eq!(body.as_deref(), Some("forbidden"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_check_connection_succeeds_with_company_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/core/api/v1/companies/active"))
            .and(header("apikey", "test-key"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"company": {"id": "42"}})),
            )
            .mount(&server)
            .await;

        let check = source(&server).check_connection().await.unwrap();

        assert!(check.succeeded);
        assert!(check.error.is_none());
    }

    #[tokio::test]
    async fn test_check_connection_fails_without_company_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/core/api/v1/companies/active"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"company": {}})))
            .mount(&server)
            .await;

        let check = source(&server).check_connection().await.unwrap();

        assert!(!check.succeeded);
        assert!(matches!(
            check.error,
            Some(CheckError::Stream(StreamError::MissingField { .. }))
        ));
    }

    #[tokio::test]
    async fn test_check_connection_fails_with_empty_company_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/core/api/v1/companies/active"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"company": {"id": ""}})))
            .mount(&server)
            .await;

        let check = source(&server).check_connection().await.unwrap();

        assert!(!check.succeeded);
        let error = check.error.unwrap();
        assert!(matches!(error, CheckError::NoActiveCompany));
        assert_eq!(error.to_string(), "Unable to get current active company");

        let status = ConnectionStatus::from(ConnectionCheck::failed(error));
        assert_eq!(status.status, Status::Failed);
        assert_eq!(
            status.message.as_deref(),
            Some("Unable to get current active company")
        );
    }

    /// Base URL of a local port nothing listens on.
    fn closed_base() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        format!("http://127.0.0.1:{port}/core/api/v1/")
    }

    #[tokio::test]
    async fn test_unreachable_api_is_a_transport_error() {
        let app_config = AppConfig {
            api_base: closed_base(),
            ..AppConfig::default()
        };
        let source = JurnalSource::new(&app_config, ConnectorConfig::new("test-key").unwrap()).unwrap();

        let err = source.stream(&TEST_ACCOUNTS).read_records().await.unwrap_err();
        match &err {
            StreamError::Transport { url, .. } => assert!(url.ends_with("/core/api/v1/accounts")),
            other => panic!("expected transport error, got {other}"),
        }
        assert_eq!(err.status(), None);

        let check = source.check_connection().await.unwrap();
        assert!(!check.succeeded);
        assert!(matches!(
            check.error,
            Some(CheckError::Stream(StreamError::Transport { .. }))
        ));
    }

    #[tokio::test]
    async fn test_check_connection_reports_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/core/api/v1/companies/active"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "invalid apikey"})))
            .mount(&server)
            .await;

        let check = source(&server).check_connection().await.unwrap();

        assert!(!check.succeeded);
        match check.error {
            Some(CheckError::Stream(err)) => assert_eq!(err.status(), Some(401)),
            other => panic!("unexpected check result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_check_connection_accepts_numeric_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/core/api/v1/companies/active"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "company": {"id": 42, "name": "PT Contoh"}
            })))
            .mount(&server)
            .await;

        let source = source(&server);
        let check = source.check_connection().await.unwrap();
        assert!(check.succeeded);

        let company = source.registry().get(ACTIVE_COMPANY).unwrap();
        let records = source.stream(company).read_records().await.unwrap();
        assert_eq!(records[0].get("id"), Some(&FieldValue::Integer(42)));
        assert_eq!(records[0].len(), 1);
    }

    #[test]
    fn test_streams_follow_declaration_order() {
        let source = JurnalSource::new(
            &AppConfig::default(),
            ConnectorConfig::new("test-key").unwrap(),
        )
        .unwrap();

        let names: Vec<_> = source.streams().iter().map(|s| s.name()).collect();
        assert_eq!(names, source.registry().names());
        assert_eq!(names.first(), Some(&ACTIVE_COMPANY));
    }
}
