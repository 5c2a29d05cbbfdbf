//! Request authentication
//!
//! Bearer JWT verification yielding the calling principal. Token issuance and
//! login live outside this service.

pub mod jwt;

pub use jwt::{extract_token_from_header, Claims, JwtValidator};

/// Identity of the principal making a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: String,
    /// Super user: may administer permission sets
    pub is_privileged: bool,
}

impl Caller {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_privileged: false,
        }
    }

    pub fn privileged(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_privileged: true,
        }
    }
}
