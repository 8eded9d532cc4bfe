use crate::{encode, operations, GatewayClient, PluginScope};
use async_trait::async_trait;
use gwsync_core::{
    Consumer, ConsumerRecord, Credential, CredentialRecord, Plugin, PluginRecord, Route,
    RouteRecord, Service, ServiceRecord,
};
use gwsync_errors::{EntityKind, Operation, Result};
use tracing::info;
use uuid::Uuid;

fn synthetic_id() -> String {
    format!("dry-run-{}", Uuid::new_v4())
}

/// Reads through to the wrapped client and only logs writes.
///
/// Payloads are still serialized so marshalling problems show up, and
/// created routes get synthetic ids so route-scoped plugins resolve.
pub struct DryRunClient<C> {
    inner: C,
}

impl<C: GatewayClient> DryRunClient<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> C {
        self.inner
    }
}

#[async_trait]
impl<C: GatewayClient> GatewayClient for DryRunClient<C> {
    async fn list_services(&self) -> Result<Vec<ServiceRecord>> {
        self.inner.list_services().await
    }

    async fn upsert_service(&self, service: &Service) -> Result<ServiceRecord> {
        encode(&Operation::upsert(EntityKind::Service, &service.name), service)?;
        info!(service = %service.name, "[dry-run] would PUT /services/{}", service.name);
        Ok(ServiceRecord {
            id: synthetic_id(),
            name: Some(service.name.clone()),
        })
    }

    async fn delete_service(&self, key: &str) -> Result<()> {
        info!(service = %key, "[dry-run] would DELETE /services/{}", key);
        Ok(())
    }

    async fn list_routes(&self) -> Result<Vec<RouteRecord>> {
        self.inner.list_routes().await
    }

    async fn create_route(&self, service: &str, route: &Route) -> Result<RouteRecord> {
        encode(&operations::create_route(service, route), route)?;
        info!(route = %route.name, "[dry-run] would POST /services/{}/routes", service);
        Ok(RouteRecord {
            id: synthetic_id(),
            name: Some(route.name.clone()),
        })
    }

    async fn delete_route(&self, id: &str) -> Result<()> {
        info!(route = %id, "[dry-run] would DELETE /routes/{}", id);
        Ok(())
    }

    async fn list_plugins(&self) -> Result<Vec<PluginRecord>> {
        self.inner.list_plugins().await
    }

    async fn create_plugin(&self, scope: &PluginScope, plugin: &Plugin) -> Result<PluginRecord> {
        encode(&operations::create_plugin(scope, plugin), plugin)?;
        let path = match scope {
            PluginScope::Global => "/plugins".to_string(),
            PluginScope::Service(service) => format!("/services/{service}/plugins"),
            PluginScope::Route { id, .. } => format!("/routes/{id}/plugins"),
        };
        info!(plugin = %plugin.name, "[dry-run] would POST {}", path);
        Ok(PluginRecord {
            id: synthetic_id(),
            name: plugin.name.clone(),
        })
    }

    async fn delete_plugin(&self, id: &str) -> Result<()> {
        info!(plugin = %id, "[dry-run] would DELETE /plugins/{}", id);
        Ok(())
    }

    async fn list_consumers(&self) -> Result<Vec<ConsumerRecord>> {
        self.inner.list_consumers().await
    }

    async fn create_consumer(&self, consumer: &Consumer) -> Result<ConsumerRecord> {
        encode(&Operation::create(EntityKind::Consumer, &consumer.username), consumer)?;
        info!(consumer = %consumer.username, "[dry-run] would POST /consumers");
        Ok(ConsumerRecord {
            id: synthetic_id(),
            username: Some(consumer.username.clone()),
            custom_id: consumer.custom_id.clone(),
        })
    }

    async fn delete_consumer(&self, key: &str) -> Result<()> {
        info!(consumer = %key, "[dry-run] would DELETE /consumers/{}", key);
        Ok(())
    }

    async fn create_credential(&self, credential: &Credential) -> Result<CredentialRecord> {
        encode(&operations::create_credential(credential), &credential.config)?;
        info!(
            consumer = %credential.target,
            "[dry-run] would POST /consumers/{}/{}", credential.target, credential.name
        );
        Ok(CredentialRecord {
            id: synthetic_id(),
            key: None,
            secret: None,
        })
    }
}
