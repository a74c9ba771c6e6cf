use crate::config::DiscordConfig;
use crate::domain::ScopeId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DenialReason {
    ScopeNotAllowed { scope_id: ScopeId },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthorizationDecision {
    Allowed,
    Denied { reason: DenialReason },
}

impl AuthorizationDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Decides whether an invocation may run, from its originating scope alone.
///
/// Direct messages are always allowed. Server invocations must come from the
/// single configured server; the default of `ScopeId(0)` admits none in practice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthorizationGate {
    allowed_scope_id: ScopeId,
}

impl AuthorizationGate {
    pub fn new(allowed_scope_id: ScopeId) -> Self {
        Self { allowed_scope_id }
    }

    pub fn from_config(config: &DiscordConfig) -> Self {
        Self::new(config.allowed_server_id)
    }

    pub fn allowed_scope_id(&self) -> ScopeId {
        self.allowed_scope_id
    }

    pub fn authorize(&self, scope: Option<ScopeId>) -> AuthorizationDecision {
        match scope {
            None => AuthorizationDecision::Allowed,
            Some(scope_id) if scope_id == self.allowed_scope_id => AuthorizationDecision::Allowed,
            Some(scope_id) => {
                AuthorizationDecision::Denied { reason: DenialReason::ScopeNotAllowed { scope_id } }
            }
        }
    }
}
