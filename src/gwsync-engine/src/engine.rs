use crate::RouteRegistry;
use gwsync_client::{GatewayClient, PluginScope};
use gwsync_core::{Declaration, Plugin, PluginTarget};
use gwsync_errors::{GatewayError, Result};
use std::collections::HashSet;
use tracing::{info, info_span, warn, Instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Teardown,
    Rebuild,
    Done,
}

/// Per-class entity counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub services: usize,
    pub routes: usize,
    pub plugins: usize,
    pub consumers: usize,
    pub credentials: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub deleted: Tally,
    pub created: Tally,
    /// Routes created by the run and their ids.
    pub routes: RouteRegistry,
    /// Set when the declaration was empty and nothing was touched.
    pub skipped: bool,
}

/// Replaces the gateway's configuration with a declaration: tear down every
/// existing entity of the affected classes, then create the declared ones in
/// dependency order. The first failure aborts the apply; nothing is rolled
/// back.
pub struct Reconciler<C> {
    client: C,
}

impl<C: GatewayClient> Reconciler<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn into_client(self) -> C {
        self.client
    }

    pub async fn apply(&self, declaration: &Declaration) -> Result<ApplyReport> {
        let mut run = ApplyRun::new(&self.client, declaration);
        run.drive().await?;
        Ok(run.report)
    }
}

struct ApplyRun<'a, C> {
    client: &'a C,
    decl: &'a Declaration,
    phase: Phase,
    consumers: HashSet<&'a str>,
    report: ApplyReport,
}

impl<'a, C: GatewayClient> ApplyRun<'a, C> {
    fn new(client: &'a C, decl: &'a Declaration) -> Self {
        Self {
            client,
            decl,
            phase: Phase::Teardown,
            consumers: HashSet::new(),
            report: ApplyReport::default(),
        }
    }

    async fn drive(&mut self) -> Result<()> {
        if self.decl.is_empty() {
            warn!("declaration is empty, leaving the gateway untouched");
            self.report.skipped = true;
            self.phase = Phase::Done;
        }

        loop {
            self.phase = match self.phase {
                Phase::Teardown => {
                    self.teardown().instrument(info_span!("teardown")).await?;
                    Phase::Rebuild
                }
                Phase::Rebuild => {
                    self.rebuild().instrument(info_span!("rebuild")).await?;
                    Phase::Done
                }
                Phase::Done => return Ok(()),
            };
        }
    }

    // Consumers are wiped when credentials are declared, since deleting a
    // consumer removes its credentials on the gateway. Declared consumers
    // alone trigger it too, or a second apply would collide on usernames.
    fn replaces_consumers(&self) -> bool {
        !self.decl.credentials.is_empty() || !self.decl.consumers.is_empty()
    }

    async fn teardown(&mut self) -> Result<()> {
        if self.replaces_consumers() {
            for consumer in self.client.list_consumers().await? {
                self.client.delete_consumer(consumer.key()).await?;
                info!(consumer = %consumer.key(), "consumer deleted");
                self.report.deleted.consumers += 1;
            }
        }

        for plugin in self.client.list_plugins().await? {
            self.client.delete_plugin(&plugin.id).await?;
            info!(plugin = %plugin.name, id = %plugin.id, "plugin deleted");
            self.report.deleted.plugins += 1;
        }

        for route in self.client.list_routes().await? {
            self.client.delete_route(&route.id).await?;
            info!(id = %route.id, "route deleted");
            self.report.deleted.routes += 1;
        }

        for service in self.client.list_services().await? {
            self.client.delete_service(service.key()).await?;
            info!(service = %service.key(), "service deleted");
            self.report.deleted.services += 1;
        }

        Ok(())
    }

    async fn rebuild(&mut self) -> Result<()> {
        let decl = self.decl;

        for service in &decl.services {
            self.client.upsert_service(service).await?;
            info!(service = %service.name, "service created/updated");
            self.report.created.services += 1;
        }

        for route in &decl.routes {
            let created = self.client.create_route(&route.service, route).await?;
            self.report.routes.register(&route.name, &created.id)?;
            info!(route = %route.name, service = %route.service, id = %created.id, "route created");
            self.report.created.routes += 1;
        }

        for plugin in &decl.plugins {
            self.attach_plugin(plugin).await?;
        }

        for consumer in &decl.consumers {
            self.client.create_consumer(consumer).await?;
            self.consumers.insert(consumer.username.as_str());
            info!(consumer = %consumer.username, "consumer created");
            self.report.created.consumers += 1;
        }

        for credential in &decl.credentials {
            if !self.consumers.contains(credential.target.as_str()) {
                return Err(GatewayError::UnresolvedConsumer {
                    credential: credential.name.clone(),
                    consumer: credential.target.clone(),
                });
            }
            self.client.create_credential(credential).await?;
            info!(consumer = %credential.target, kind = %credential.name, "credential created");
            self.report.created.credentials += 1;
        }

        Ok(())
    }

    async fn attach_plugin(&mut self, plugin: &Plugin) -> Result<()> {
        match &plugin.target {
            PluginTarget::Global => {
                self.client.create_plugin(&PluginScope::Global, plugin).await?;
                info!(plugin = %plugin.name, "global plugin created");
                self.report.created.plugins += 1;
            }
            PluginTarget::Scoped { services, routes } => {
                for service in services {
                    let scope = PluginScope::Service(service.clone());
                    self.client.create_plugin(&scope, plugin).await?;
                    info!(plugin = %plugin.name, service = %service, "plugin created for service");
                    self.report.created.plugins += 1;
                }
                for route in routes {
                    let id = self.report.routes.resolve(&plugin.name, route)?.to_string();
                    let scope = PluginScope::Route {
                        name: route.clone(),
                        id,
                    };
                    self.client.create_plugin(&scope, plugin).await?;
                    info!(plugin = %plugin.name, route = %route, "plugin created for route");
                    self.report.created.plugins += 1;
                }
            }
        }
        Ok(())
    }
}
