use crate::{
    decode, encode, expect_status, operations, server_message, GatewayClient, NotFound, PluginScope,
};
use anyhow::{bail, Context};
use async_trait::async_trait;
use gwsync_core::{
    Consumer, ConsumerRecord, Credential, CredentialRecord, Declaration, Page, Plugin, PluginRecord,
    Route, RouteRecord, Service, ServiceRecord,
};
use gwsync_errors::{EntityKind, GatewayError, Operation, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const JSON_UTF8: &str = "application/json; charset=utf-8";
pub const USER_AGENT: &str = concat!("gwsync/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

// Guards against a gateway that keeps handing out the same `next` link.
const MAX_PAGES: usize = 10_000;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Admin API base, e.g. `http://localhost:8001`.
    pub base_url: String,
    /// Per-request timeout; expiry is a transport error.
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn from_declaration(decl: &Declaration) -> Self {
        Self::new(decl.admin_url())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Admin API client over HTTP with JSON payloads.
#[derive(Debug, Clone)]
pub struct AdminClient {
    client: Client,
    base: Url,
}

impl AdminClient {
    pub fn new(config: ClientConfig) -> anyhow::Result<Self> {
        let base = Url::parse(&config.base_url)
            .with_context(|| format!("invalid admin URL {}", config.base_url))?;
        if base.cannot_be_a_base() {
            bail!("admin URL {} cannot carry a path", config.base_url);
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Base URL plus percent-encoded path segments.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn execute(
        &self,
        operation: &Operation,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
    ) -> Result<(StatusCode, Vec<u8>)> {
        debug!(%method, %url, "admin request");
        let mut request = self.client.request(method, url).header(CONTENT_TYPE, JSON_UTF8);
        if let Some(body) = body {
            request = request.body(body);
        }
        let response =
            request.send().await.map_err(|e| GatewayError::transport(operation, e))?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| GatewayError::transport(operation, e))?;
        debug!(status = status.as_u16(), bytes = bytes.len(), "admin response");
        Ok((status, bytes.to_vec()))
    }

    async fn call<P, R>(
        &self,
        operation: &Operation,
        method: Method,
        segments: &[&str],
        payload: Option<&P>,
        expected: StatusCode,
        not_found: NotFound,
    ) -> Result<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let body = payload.map(|p| encode(operation, p)).transpose()?;
        let (status, bytes) = self.execute(operation, method, self.url(segments), body).await?;
        expect_status(operation, expected, status, &not_found, server_message(&bytes).as_deref())?;
        decode(operation, status, &bytes)
    }

    async fn delete(&self, operation: &Operation, segments: &[&str]) -> Result<()> {
        let (status, bytes) =
            self.execute(operation, Method::DELETE, self.url(segments), None).await?;
        expect_status(
            operation,
            StatusCode::NO_CONTENT,
            status,
            &NotFound::Unexpected,
            server_message(&bytes).as_deref(),
        )
    }

    /// Resolve a `next` link against the base URL. The admin API answers with
    /// paths relative to its own root, so a base path prefix is put back in
    /// front unless the link already carries it.
    fn next_page(&self, operation: &Operation, status: StatusCode, next: &str) -> Result<Url> {
        let link = Url::parse(next).or_else(|_| self.base.join(next)).map_err(|e| {
            GatewayError::Protocol {
                operation: operation.clone(),
                expected: StatusCode::OK,
                observed: status,
                reason: format!("invalid `next` link {next:?}: {e}"),
            }
        })?;

        let prefix = self.base.path().trim_end_matches('/');
        let path = link.path();
        let mut url = self.base.clone();
        if prefix.is_empty() || path == prefix || path.starts_with(&format!("{prefix}/")) {
            url.set_path(path);
        } else {
            url.set_path(&format!("{prefix}{path}"));
        }
        url.set_query(link.query());
        Ok(url)
    }

    /// GET a list endpoint and follow `next` links until exhausted.
    async fn list_all<T: DeserializeOwned>(&self, kind: EntityKind) -> Result<Vec<T>> {
        let operation = Operation::list(kind);
        let mut url = self.url(&[kind.plural()]);
        let mut items = Vec::new();

        for _ in 0..MAX_PAGES {
            let (status, bytes) = self.execute(&operation, Method::GET, url.clone(), None).await?;
            expect_status(
                &operation,
                StatusCode::OK,
                status,
                &NotFound::Unexpected,
                server_message(&bytes).as_deref(),
            )?;
            let page: Page<T> = decode(&operation, status, &bytes)?;
            items.extend(page.data);

            match page.next.as_deref().filter(|n| !n.is_empty()) {
                Some(next) => url = self.next_page(&operation, status, next)?,
                None => return Ok(items),
            }
        }

        Err(GatewayError::Protocol {
            operation,
            expected: StatusCode::OK,
            observed: StatusCode::OK,
            reason: format!("pagination did not end after {MAX_PAGES} pages"),
        })
    }
}

#[async_trait]
impl GatewayClient for AdminClient {
    async fn list_services(&self) -> Result<Vec<ServiceRecord>> {
        self.list_all(EntityKind::Service).await
    }

    async fn upsert_service(&self, service: &Service) -> Result<ServiceRecord> {
        let op = Operation::upsert(EntityKind::Service, &service.name);
        self.call(
            &op,
            Method::PUT,
            &["services", service.name.as_str()],
            Some(service),
            StatusCode::OK,
            NotFound::Unexpected,
        )
        .await
    }

    async fn delete_service(&self, key: &str) -> Result<()> {
        self.delete(&Operation::delete(EntityKind::Service, key), &["services", key]).await
    }

    async fn list_routes(&self) -> Result<Vec<RouteRecord>> {
        self.list_all(EntityKind::Route).await
    }

    async fn create_route(&self, service: &str, route: &Route) -> Result<RouteRecord> {
        let op = operations::create_route(service, route);
        self.call(
            &op,
            Method::POST,
            &["services", service, "routes"],
            Some(route),
            StatusCode::CREATED,
            NotFound::Dependency(format!("service \"{service}\"")),
        )
        .await
    }

    async fn delete_route(&self, id: &str) -> Result<()> {
        self.delete(&Operation::delete(EntityKind::Route, id), &["routes", id]).await
    }

    async fn list_plugins(&self) -> Result<Vec<PluginRecord>> {
        self.list_all(EntityKind::Plugin).await
    }

    async fn create_plugin(&self, scope: &PluginScope, plugin: &Plugin) -> Result<PluginRecord> {
        let op = operations::create_plugin(scope, plugin);
        match scope {
            PluginScope::Global => {
                self.call(
                    &op,
                    Method::POST,
                    &["plugins"],
                    Some(plugin),
                    StatusCode::CREATED,
                    NotFound::Reason("plugin already exists"),
                )
                .await
            }
            PluginScope::Service(service) => {
                self.call(
                    &op,
                    Method::POST,
                    &["services", service.as_str(), "plugins"],
                    Some(plugin),
                    StatusCode::CREATED,
                    NotFound::Dependency(format!("service \"{service}\"")),
                )
                .await
            }
            PluginScope::Route { name, id } => {
                self.call(
                    &op,
                    Method::POST,
                    &["routes", id.as_str(), "plugins"],
                    Some(plugin),
                    StatusCode::CREATED,
                    NotFound::Dependency(format!("route \"{name}\" ({id})")),
                )
                .await
            }
        }
    }

    async fn delete_plugin(&self, id: &str) -> Result<()> {
        self.delete(&Operation::delete(EntityKind::Plugin, id), &["plugins", id]).await
    }

    async fn list_consumers(&self) -> Result<Vec<ConsumerRecord>> {
        self.list_all(EntityKind::Consumer).await
    }

    async fn create_consumer(&self, consumer: &Consumer) -> Result<ConsumerRecord> {
        let op = Operation::create(EntityKind::Consumer, &consumer.username);
        self.call(
            &op,
            Method::POST,
            &["consumers"],
            Some(consumer),
            StatusCode::CREATED,
            NotFound::Unexpected,
        )
        .await
    }

    async fn delete_consumer(&self, key: &str) -> Result<()> {
        self.delete(&Operation::delete(EntityKind::Consumer, key), &["consumers", key]).await
    }

    async fn create_credential(&self, credential: &Credential) -> Result<CredentialRecord> {
        let op = operations::create_credential(credential);
        self.call(
            &op,
            Method::POST,
            &["consumers", credential.target.as_str(), credential.name.as_str()],
            Some(&credential.config),
            StatusCode::CREATED,
            NotFound::Dependency(format!("consumer \"{}\"", credential.target)),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_encodes_segments_and_keeps_prefix() {
        let client = AdminClient::new(ClientConfig::new("http://kong:8001/admin/")).unwrap();
        assert_eq!(
            client.url(&["services", "a b", "routes"]).as_str(),
            "http://kong:8001/admin/services/a%20b/routes"
        );
    }

    #[test]
    fn next_link_keeps_base_prefix() {
        let client = AdminClient::new(ClientConfig::new("http://kong:8001/admin/")).unwrap();
        let op = Operation::list(EntityKind::Service);
        let cases = [
            ("/services?offset=abc", "http://kong:8001/admin/services?offset=abc"),
            ("/admin/services?offset=abc", "http://kong:8001/admin/services?offset=abc"),
            ("http://kong:8001/services?offset=abc", "http://kong:8001/admin/services?offset=abc"),
        ];
        for (next, expected) in cases {
            let url = client.next_page(&op, StatusCode::OK, next).unwrap();
            assert_eq!(url.as_str(), expected, "{next}");
        }
    }

    #[test]
    fn next_link_without_prefix_is_used_as_is() {
        let client = AdminClient::new(ClientConfig::new("http://kong:8001")).unwrap();
        let op = Operation::list(EntityKind::Route);
        let url = client.next_page(&op, StatusCode::OK, "/routes?offset=x").unwrap();
        assert_eq!(url.as_str(), "http://kong:8001/routes?offset=x");
    }

    #[test]
    fn unparseable_next_link_is_a_protocol_error() {
        let client = AdminClient::new(ClientConfig::new("http://kong:8001")).unwrap();
        let op = Operation::list(EntityKind::Plugin);
        let err = client.next_page(&op, StatusCode::OK, "http://[::1").unwrap_err();
        assert!(matches!(err, GatewayError::Protocol { .. }), "{err}");
    }

    #[test]
    fn rejects_unusable_base() {
        assert!(AdminClient::new(ClientConfig::new("not a url")).is_err());
        assert!(AdminClient::new(ClientConfig::new("mailto:ops@example.com")).is_err());
    }
}
