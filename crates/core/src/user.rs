//! Authenticated user identity
//!
//! Produced by the listen endpoint's token verifier and carried by each
//! listener for policy evaluation and metric labels.

/// Identity of an authenticated listener.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserInfo {
    /// Full username as reported by the verifier, e.g.
    /// `system:serviceaccount:ns:name`.
    pub username: String,
    /// Group memberships. Not consulted by the access policy today.
    pub groups: Vec<String>,
}

impl UserInfo {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            groups: Vec::new(),
        }
    }

    pub fn with_groups(mut self, groups: Vec<String>) -> Self {
        self.groups = groups;
        self
    }
}
