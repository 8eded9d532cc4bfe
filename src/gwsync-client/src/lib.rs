mod admin;
mod dry_run;
mod expect;
mod operations;

pub use admin::*;
pub use dry_run::*;
pub use expect::*;

use async_trait::async_trait;
use gwsync_core::{
    Consumer, ConsumerRecord, Credential, CredentialRecord, Plugin, PluginRecord, Route,
    RouteRecord, Service, ServiceRecord,
};
use gwsync_errors::Result;

/// Where a plugin create call is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginScope {
    Global,
    Service(String),
    /// Declared route name (for messages) and its server-assigned id.
    Route { name: String, id: String },
}

/// The operations the reconciliation engine needs from a gateway admin API.
///
/// Every call completes (or fails) before the caller issues the next one;
/// implementations must not reorder or batch.
#[async_trait]
pub trait GatewayClient: Send + Sync {
    async fn list_services(&self) -> Result<Vec<ServiceRecord>>;
    /// Create-or-replace by name.
    async fn upsert_service(&self, service: &Service) -> Result<ServiceRecord>;
    async fn delete_service(&self, key: &str) -> Result<()>;

    async fn list_routes(&self) -> Result<Vec<RouteRecord>>;
    async fn create_route(&self, service: &str, route: &Route) -> Result<RouteRecord>;
    async fn delete_route(&self, id: &str) -> Result<()>;

    async fn list_plugins(&self) -> Result<Vec<PluginRecord>>;
    async fn create_plugin(&self, scope: &PluginScope, plugin: &Plugin) -> Result<PluginRecord>;
    async fn delete_plugin(&self, id: &str) -> Result<()>;

    async fn list_consumers(&self) -> Result<Vec<ConsumerRecord>>;
    async fn create_consumer(&self, consumer: &Consumer) -> Result<ConsumerRecord>;
    async fn delete_consumer(&self, key: &str) -> Result<()>;

    async fn create_credential(&self, credential: &Credential) -> Result<CredentialRecord>;
}

#[async_trait]
impl<C: GatewayClient + ?Sized> GatewayClient for Box<C> {
    async fn list_services(&self) -> Result<Vec<ServiceRecord>> {
        (**self).list_services().await
    }
    async fn upsert_service(&self, service: &Service) -> Result<ServiceRecord> {
        (**self).upsert_service(service).await
    }
    async fn delete_service(&self, key: &str) -> Result<()> {
        (**self).delete_service(key).await
    }
    async fn list_routes(&self) -> Result<Vec<RouteRecord>> {
        (**self).list_routes().await
    }
    async fn create_route(&self, service: &str, route: &Route) -> Result<RouteRecord> {
        (**self).create_route(service, route).await
    }
    async fn delete_route(&self, id: &str) -> Result<()> {
        (**self).delete_route(id).await
    }
    async fn list_plugins(&self) -> Result<Vec<PluginRecord>> {
        (**self).list_plugins().await
    }
    async fn create_plugin(&self, scope: &PluginScope, plugin: &Plugin) -> Result<PluginRecord> {
        (**self).create_plugin(scope, plugin).await
    }
    async fn delete_plugin(&self, id: &str) -> Result<()> {
        (**self).delete_plugin(id).await
    }
    async fn list_consumers(&self) -> Result<Vec<ConsumerRecord>> {
        (**self).list_consumers().await
    }
    async fn create_consumer(&self, consumer: &Consumer) -> Result<ConsumerRecord> {
        (**self).create_consumer(consumer).await
    }
    async fn delete_consumer(&self, key: &str) -> Result<()> {
        (**self).delete_consumer(key).await
    }
    async fn create_credential(&self, credential: &Credential) -> Result<CredentialRecord> {
        (**self).create_credential(credential).await
    }
}
