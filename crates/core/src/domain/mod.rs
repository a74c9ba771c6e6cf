pub mod invocation;

pub use invocation::{InvocationContext, ScopeId, UserId};
