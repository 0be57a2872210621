//! Per-request context passed explicitly from the HTTP layer down to the
//! point where a database transaction begins.

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

/// Identity of whoever is performing a write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Actor(String);

impl Actor {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Request-scoped data that storage code needs but handlers should not have
/// to thread through every call by hand.
///
/// Built by the JWT middleware for protected routes (see
/// [`crate::middleware::auth`]) and by the login handler once credentials
/// check out. Work that runs outside a request (CLI, migrations, test
/// fixtures) simply has no context and passes `None` to
/// [`crate::database::Database::begin`].
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: Uuid,
    actor: Option<Actor>,
}

impl RequestContext {
    pub fn new(actor: Option<Actor>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            actor,
        }
    }

    /// Context for a request with no resolved caller
    pub fn anonymous() -> Self {
        Self::new(None)
    }

    pub fn for_actor(actor: Actor) -> Self {
        Self::new(Some(actor))
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn actor(&self) -> Option<&Actor> {
        self.actor.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_context_has_no_actor() {
        let ctx = RequestContext::anonymous();
        assert!(ctx.actor().is_none());
    }

    #[test]
    fn each_context_gets_its_own_request_id() {
        let a = RequestContext::for_actor(Actor::new("alice"));
        let b = RequestContext::for_actor(Actor::new("alice"));
        assert_ne!(a.request_id(), b.request_id());
        assert_eq!(a.actor().map(Actor::as_str), Some("alice"));
    }
}
