use std::fmt;

use serde::{Deserialize, Serialize};

/// Server (guild) a command was issued from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One `/ai` invocation. Built once per command and owned by the task that handles it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvocationContext {
    pub correlation_id: String,
    pub invoking_user_id: UserId,
    /// `None` for direct messages.
    pub originating_scope_id: Option<ScopeId>,
    pub query_text: String,
}

impl InvocationContext {
    pub fn is_direct_message(&self) -> bool {
        self.originating_scope_id.is_none()
    }

    pub fn scope_label(&self) -> String {
        match self.originating_scope_id {
            Some(scope_id) => scope_id.to_string(),
            None => "dm".to_owned(),
        }
    }
}
