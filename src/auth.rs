//! User identity.
//!
//! Authentication and session management live outside this crate. Callers
//! resolve an [`Identity`] through whatever provider they have and pass it
//! explicitly into every lifecycle operation; there is no process-wide
//! current user.

use serde::Serialize;

use crate::models::UserId;
use crate::{Error, Result};

/// An authenticated user, as resolved by the external identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    /// The user's identity reference, as stored on topics and posts.
    pub id: UserId,
    /// The user's display name.
    pub name: String,
}

impl Identity {
    pub fn new<S>(id: UserId, name: S) -> Identity
    where
        S: Into<String>,
    {
        Identity {
            id,
            name: name.into(),
        }
    }
}

/// The identity-provider contract the lifecycle operations rely on.
pub trait IdentityProvider {
    /// The identity attached to the current request, if any.
    fn current_identity(&self) -> Option<Identity>;

    /// The identity attached to the current request, which must exist.
    ///
    /// Operations that require a logged-in user (replying, editing) go
    /// through this.
    fn require_authenticated(&self) -> Result<Identity> {
        self.current_identity().ok_or(Error::NotAuthenticated)
    }
}

/// A provider with a fixed identity. Used by the control binary, where the
/// acting user is given on the command line, and by tests.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    identity: Option<Identity>,
}

impl StaticProvider {
    pub fn new(identity: Identity) -> StaticProvider {
        StaticProvider {
            identity: Some(identity),
        }
    }

    /// A provider with nobody logged in.
    pub fn anonymous() -> StaticProvider {
        StaticProvider::default()
    }
}

impl IdentityProvider for StaticProvider {
    fn current_identity(&self) -> Option<Identity> {
        self.identity.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_provider_refuses_authentication() {
        let provider = StaticProvider::anonymous();

        assert!(provider.current_identity().is_none());
        assert!(matches!(
            provider.require_authenticated(),
            Err(Error::NotAuthenticated)
        ));
    }

    #[test]
    fn static_provider_yields_its_identity() {
        let provider = StaticProvider::new(Identity::new(3, "ada"));

        let identity = provider.require_authenticated().unwrap();
        assert_eq!(identity.id, 3);
        assert_eq!(identity.name, "ada");
    }
}
