// Operation identities for scoped creates, shared by every client so errors
// name the parent the same way whether or not the call is sent.

use crate::PluginScope;
use gwsync_core::{Credential, Plugin, Route};
use gwsync_errors::{EntityKind, Operation};

pub(crate) fn create_route(service: &str, route: &Route) -> Operation {
    Operation::create(EntityKind::Route, &route.name).on(EntityKind::Service, service)
}

pub(crate) fn create_plugin(scope: &PluginScope, plugin: &Plugin) -> Operation {
    let op = Operation::create(EntityKind::Plugin, &plugin.name);
    match scope {
        PluginScope::Global => op,
        PluginScope::Service(service) => op.on(EntityKind::Service, service),
        PluginScope::Route { name, .. } => op.on(EntityKind::Route, name),
    }
}

pub(crate) fn create_credential(credential: &Credential) -> Operation {
    Operation::create(EntityKind::Credential, &credential.name)
        .on(EntityKind::Consumer, &credential.target)
}
