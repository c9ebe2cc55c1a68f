//! Authentication collaborator seam.
//!
//! The broker never performs authentication itself. A CONNECT frame is
//! handed to the configured [`Authenticator`], which either produces an
//! opaque [`Principal`] attached to the session or fails; SEND/SUBSCRIBE
//! are refused until a principal is attached.

use crate::error::Result;
use crate::protocol::Frame;

/// Opaque identity attached to a session after authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    name: String,
}

impl Principal {
    /// Create a principal with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The principal's name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Turns a CONNECT frame into a [`Principal`].
pub trait Authenticator: Send + Sync {
    /// Authenticate a CONNECT frame.
    ///
    /// # Errors
    ///
    /// Any error refuses the connection attempt; the session stays
    /// unauthenticated and may retry.
    fn authenticate(&self, frame: &Frame) -> Result<Principal>;
}

/// Accepts every connection, naming the principal after the `login`
/// header when present.
#[derive(Debug, Default)]
pub struct AnonymousAuthenticator;

impl Authenticator for AnonymousAuthenticator {
    fn authenticate(&self, frame: &Frame) -> Result<Principal> {
        let name = frame.header("login").unwrap_or("anonymous");
        Ok(Principal::new(name))
    }
}
