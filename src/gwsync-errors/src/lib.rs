use http::StatusCode;
use std::fmt;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = GatewayError> = std::result::Result<T, E>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Service,
    Route,
    Plugin,
    Consumer,
    Credential,
}

impl EntityKind {
    pub fn singular(self) -> &'static str {
        match self {
            EntityKind::Service => "service",
            EntityKind::Route => "route",
            EntityKind::Plugin => "plugin",
            EntityKind::Consumer => "consumer",
            EntityKind::Credential => "credential",
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            EntityKind::Service => "services",
            EntityKind::Route => "routes",
            EntityKind::Plugin => "plugins",
            EntityKind::Consumer => "consumers",
            EntityKind::Credential => "credentials",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.singular())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    List,
    Upsert,
    Create,
    Delete,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::List => "list",
            Action::Upsert => "upsert",
            Action::Create => "create",
            Action::Delete => "delete",
        })
    }
}

/// Identifies one admin API call: what is done, to which entity, and under
/// which parent. Every error carries one so messages name the aborted step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub action: Action,
    pub kind: EntityKind,
    pub key: Option<String>,
    pub scope: Option<(EntityKind, String)>,
}

impl Operation {
    pub fn list(kind: EntityKind) -> Self {
        Self {
            action: Action::List,
            kind,
            key: None,
            scope: None,
        }
    }

    pub fn upsert(kind: EntityKind, key: impl Into<String>) -> Self {
        Self {
            action: Action::Upsert,
            kind,
            key: Some(key.into()),
            scope: None,
        }
    }

    pub fn create(kind: EntityKind, key: impl Into<String>) -> Self {
        Self {
            action: Action::Create,
            kind,
            key: Some(key.into()),
            scope: None,
        }
    }

    pub fn delete(kind: EntityKind, key: impl Into<String>) -> Self {
        Self {
            action: Action::Delete,
            kind,
            key: Some(key.into()),
            scope: None,
        }
    }

    /// Scope the operation under a parent entity, e.g. a route on a service.
    pub fn on(mut self, kind: EntityKind, key: impl Into<String>) -> Self {
        self.scope = Some((kind, key.into()));
        self
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some(key) => write!(f, "{} {} \"{}\"", self.action, self.kind, key)?,
            None => write!(f, "{} {}", self.action, self.kind.plural())?,
        }
        if let Some((kind, key)) = &self.scope {
            write!(f, " on {} \"{}\"", kind, key)?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{operation}: transport failure: {source}")]
    Transport {
        operation: Operation,
        #[source]
        source: BoxError,
    },

    #[error(
        "[HTTP {}] {operation}: {reason} (expected HTTP {})",
        .observed.as_u16(),
        .expected.as_u16()
    )]
    Protocol {
        operation: Operation,
        expected: StatusCode,
        observed: StatusCode,
        reason: String,
    },

    #[error(
        "[HTTP {}] {operation}: response body could not be decoded: {source}",
        .observed.as_u16()
    )]
    MalformedResponse {
        operation: Operation,
        observed: StatusCode,
        #[source]
        source: serde_json::Error,
    },

    #[error("[HTTP 404] {operation}: {dependency} not found")]
    DependencyNotFound {
        operation: Operation,
        dependency: String,
    },

    #[error("plugin \"{plugin}\": route \"{route}\" not found, it was not created in this run")]
    UnresolvedRoute { plugin: String, route: String },

    #[error(
        "credential \"{credential}\": consumer \"{consumer}\" not found, \
         it was not created in this run"
    )]
    UnresolvedConsumer {
        credential: String,
        consumer: String,
    },

    #[error("route \"{route}\" is already registered in this run")]
    DuplicateRoute { route: String },

    #[error("{operation}: payload could not be serialized: {source}")]
    Marshal {
        operation: Operation,
        #[source]
        source: serde_json::Error,
    },
}

impl GatewayError {
    pub fn transport(operation: &Operation, source: impl Into<BoxError>) -> Self {
        GatewayError::Transport {
            operation: operation.clone(),
            source: source.into(),
        }
    }

    /// Status code observed on the wire, when the failure came from a response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            GatewayError::Protocol { observed, .. } => Some(*observed),
            GatewayError::MalformedResponse { observed, .. } => Some(*observed),
            GatewayError::DependencyNotFound { .. } => Some(StatusCode::NOT_FOUND),
            _ => None,
        }
    }

    pub fn operation(&self) -> Option<&Operation> {
        match self {
            GatewayError::Transport { operation, .. }
            | GatewayError::Protocol { operation, .. }
            | GatewayError::MalformedResponse { operation, .. }
            | GatewayError::DependencyNotFound { operation, .. }
            | GatewayError::Marshal { operation, .. } => Some(operation),
            _ => None,
        }
    }
}
