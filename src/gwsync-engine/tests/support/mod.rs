//! In-memory gateway that records every admin call in order.

#![allow(dead_code)]

use async_trait::async_trait;
use gwsync_client::{expect_status, GatewayClient, NotFound, PluginScope};
use gwsync_core::{
    Consumer, ConsumerRecord, Credential, CredentialRecord, Plugin, PluginRecord, Route,
    RouteRecord, Service, ServiceRecord,
};
use gwsync_errors::{EntityKind, Operation, Result};
use reqwest::StatusCode;
use std::sync::Mutex;

#[derive(Debug, Default, Clone)]
pub struct State {
    pub services: Vec<ServiceRecord>,
    /// (record, service name)
    pub routes: Vec<(RouteRecord, String)>,
    /// (record, call path it was created on)
    pub plugins: Vec<(PluginRecord, String)>,
    pub consumers: Vec<ConsumerRecord>,
    /// (consumer username, credential type)
    pub credentials: Vec<(String, String)>,
    next_id: usize,
}

impl State {
    fn id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    pub fn seed_service(&mut self, name: &str) -> String {
        let id = self.id("svc");
        self.services.push(ServiceRecord {
            id: id.clone(),
            name: Some(name.into()),
        });
        id
    }

    pub fn seed_route(&mut self, service: &str) -> String {
        let id = self.id("route");
        let record = RouteRecord {
            id: id.clone(),
            name: None,
        };
        self.routes.push((record, service.into()));
        id
    }

    pub fn seed_plugin(&mut self, name: &str) -> String {
        let id = self.id("plugin");
        let record = PluginRecord {
            id: id.clone(),
            name: name.into(),
        };
        self.plugins.push((record, "/plugins".into()));
        id
    }

    pub fn seed_consumer(&mut self, username: &str) {
        let id = self.id("consumer");
        self.consumers.push(ConsumerRecord {
            id,
            username: Some(username.into()),
            custom_id: None,
        });
    }

    /// Names of everything on the gateway, ids stripped, sorted.
    pub fn snapshot(&self) -> Vec<String> {
        let mut out = Vec::new();
        out.extend(self.services.iter().map(|s| format!("service {}", s.key())));
        out.extend(self.routes.iter().map(|(r, svc)| {
            format!("route {} on {}", r.name.as_deref().unwrap_or("-"), svc)
        }));
        out.extend(self.plugins.iter().map(|(p, at)| {
            // route ids change between runs; keep the collection kind only
            let at = if at.starts_with("/routes/") { "/routes/*/plugins" } else { at.as_str() };
            format!("plugin {} at {}", p.name, at)
        }));
        out.extend(self.consumers.iter().map(|c| format!("consumer {}", c.key())));
        out.extend(self.credentials.iter().map(|(c, t)| format!("credential {t} for {c}")));
        out.sort();
        out
    }
}

#[derive(Debug, Default)]
pub struct FakeGateway {
    state: Mutex<State>,
    calls: Mutex<Vec<String>>,
    fail: Mutex<Option<(String, StatusCode)>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: State) -> Self {
        Self {
            state: Mutex::new(state),
            ..Default::default()
        }
    }

    /// Answer `call` (e.g. `PUT /services/users`) with `status` instead.
    pub fn fail_on(&self, call: &str, status: StatusCode) {
        *self.fail.lock().unwrap() = Some((call.to_string(), status));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn state(&self) -> State {
        self.state.lock().unwrap().clone()
    }

    fn record(
        &self,
        call: String,
        op: &Operation,
        expected: StatusCode,
        not_found: &NotFound,
    ) -> Result<()> {
        self.calls.lock().unwrap().push(call.clone());
        if let Some((failing, status)) = self.fail.lock().unwrap().as_ref() {
            if *failing == call {
                return expect_status(op, expected, *status, not_found, None);
            }
        }
        Ok(())
    }

    fn list_call(&self, collection: &str, kind: EntityKind) -> Result<()> {
        let op = Operation::list(kind);
        self.record(format!("GET {collection}"), &op, StatusCode::OK, &NotFound::Unexpected)
    }

    fn delete_call(&self, call: String, op: &Operation) -> Result<()> {
        self.record(call, op, StatusCode::NO_CONTENT, &NotFound::Unexpected)
    }
}

/// Fail `op` the way the admin API would answer `observed` to a create.
fn reject<T>(op: &Operation, observed: StatusCode, not_found: &NotFound) -> Result<T> {
    expect_status(op, StatusCode::CREATED, observed, not_found, None).map(|_| unreachable!())
}

#[async_trait]
impl GatewayClient for FakeGateway {
    async fn list_services(&self) -> Result<Vec<ServiceRecord>> {
        self.list_call("/services", EntityKind::Service)?;
        Ok(self.state().services)
    }

    async fn upsert_service(&self, service: &Service) -> Result<ServiceRecord> {
        let op = Operation::upsert(EntityKind::Service, &service.name);
        let call = format!("PUT /services/{}", service.name);
        self.record(call, &op, StatusCode::OK, &NotFound::Unexpected)?;
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state.services.iter().find(|s| s.key() == service.name) {
            return Ok(existing.clone());
        }
        let id = state.id("svc");
        let record = ServiceRecord {
            id,
            name: Some(service.name.clone()),
        };
        state.services.push(record.clone());
        Ok(record)
    }

    async fn delete_service(&self, key: &str) -> Result<()> {
        let op = Operation::delete(EntityKind::Service, key);
        self.delete_call(format!("DELETE /services/{key}"), &op)?;
        self.state.lock().unwrap().services.retain(|s| s.key() != key);
        Ok(())
    }

    async fn list_routes(&self) -> Result<Vec<RouteRecord>> {
        self.list_call("/routes", EntityKind::Route)?;
        Ok(self.state().routes.into_iter().map(|(r, _)| r).collect())
    }

    async fn create_route(&self, service: &str, route: &Route) -> Result<RouteRecord> {
        let op = Operation::create(EntityKind::Route, &route.name).on(EntityKind::Service, service);
        let not_found = NotFound::Dependency(format!("service \"{service}\""));
        let call = format!("POST /services/{service}/routes");
        self.record(call, &op, StatusCode::CREATED, &not_found)?;
        let mut state = self.state.lock().unwrap();
        if !state.services.iter().any(|s| s.key() == service) {
            return reject(&op, StatusCode::NOT_FOUND, &not_found);
        }
        let id = state.id("route");
        let record = RouteRecord {
            id,
            name: Some(route.name.clone()),
        };
        state.routes.push((record.clone(), service.to_string()));
        Ok(record)
    }

    async fn delete_route(&self, id: &str) -> Result<()> {
        let op = Operation::delete(EntityKind::Route, id);
        self.delete_call(format!("DELETE /routes/{id}"), &op)?;
        self.state.lock().unwrap().routes.retain(|(r, _)| r.id != id);
        Ok(())
    }

    async fn list_plugins(&self) -> Result<Vec<PluginRecord>> {
        self.list_call("/plugins", EntityKind::Plugin)?;
        Ok(self.state().plugins.into_iter().map(|(p, _)| p).collect())
    }

    async fn create_plugin(&self, scope: &PluginScope, plugin: &Plugin) -> Result<PluginRecord> {
        let op = Operation::create(EntityKind::Plugin, &plugin.name);
        let (path, not_found) = match scope {
            PluginScope::Global => {
                ("/plugins".to_string(), NotFound::Reason("plugin already exists"))
            }
            PluginScope::Service(s) => {
                (format!("/services/{s}/plugins"), NotFound::Dependency(format!("service \"{s}\"")))
            }
            PluginScope::Route { name, id } => {
                (format!("/routes/{id}/plugins"), NotFound::Dependency(format!("route \"{name}\"")))
            }
        };
        self.record(format!("POST {path}"), &op, StatusCode::CREATED, &not_found)?;
        let mut state = self.state.lock().unwrap();
        let parent_exists = match scope {
            PluginScope::Global => true,
            PluginScope::Service(s) => state.services.iter().any(|svc| svc.key() == s),
            PluginScope::Route { id, .. } => state.routes.iter().any(|(r, _)| &r.id == id),
        };
        if !parent_exists {
            return reject(&op, StatusCode::NOT_FOUND, &not_found);
        }
        if state.plugins.iter().any(|(p, at)| p.name == plugin.name && *at == path) {
            return reject(&op, StatusCode::CONFLICT, &not_found);
        }
        let id = state.id("plugin");
        let record = PluginRecord {
            id,
            name: plugin.name.clone(),
        };
        state.plugins.push((record.clone(), path));
        Ok(record)
    }

    async fn delete_plugin(&self, id: &str) -> Result<()> {
        let op = Operation::delete(EntityKind::Plugin, id);
        self.delete_call(format!("DELETE /plugins/{id}"), &op)?;
        self.state.lock().unwrap().plugins.retain(|(p, _)| p.id != id);
        Ok(())
    }

    async fn list_consumers(&self) -> Result<Vec<ConsumerRecord>> {
        self.list_call("/consumers", EntityKind::Consumer)?;
        Ok(self.state().consumers)
    }

    async fn create_consumer(&self, consumer: &Consumer) -> Result<ConsumerRecord> {
        let op = Operation::create(EntityKind::Consumer, &consumer.username);
        self.record("POST /consumers".into(), &op, StatusCode::CREATED, &NotFound::Unexpected)?;
        let mut state = self.state.lock().unwrap();
        if state.consumers.iter().any(|c| c.key() == consumer.username) {
            return reject(&op, StatusCode::CONFLICT, &NotFound::Unexpected);
        }
        let id = state.id("consumer");
        let record = ConsumerRecord {
            id,
            username: Some(consumer.username.clone()),
            custom_id: consumer.custom_id.clone(),
        };
        state.consumers.push(record.clone());
        Ok(record)
    }

    async fn delete_consumer(&self, key: &str) -> Result<()> {
        let op = Operation::delete(EntityKind::Consumer, key);
        self.delete_call(format!("DELETE /consumers/{key}"), &op)?;
        let mut state = self.state.lock().unwrap();
        state.consumers.retain(|c| c.key() != key);
        // credentials go with their consumer
        state.credentials.retain(|(c, _)| c != key);
        Ok(())
    }

    async fn create_credential(&self, credential: &Credential) -> Result<CredentialRecord> {
        let op = Operation::create(EntityKind::Credential, &credential.name)
            .on(EntityKind::Consumer, &credential.target);
        let not_found = NotFound::Dependency(format!("consumer \"{}\"", credential.target));
        self.record(
            format!("POST /consumers/{}/{}", credential.target, credential.name),
            &op,
            StatusCode::CREATED,
            &not_found,
        )?;
        let mut state = self.state.lock().unwrap();
        if !state.consumers.iter().any(|c| c.key() == credential.target) {
            return reject(&op, StatusCode::NOT_FOUND, &not_found);
        }
        let id = state.id("cred");
        state.credentials.push((credential.target.clone(), credential.name.clone()));
        Ok(CredentialRecord {
            id,
            key: None,
            secret: None,
        })
    }
}
