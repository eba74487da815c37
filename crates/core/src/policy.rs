//! Per-record access policy
//!
//! Access rules travel in the record payload itself rather than in a
//! central policy store: any pod label whose key starts with `rbac/`
//! defines one rule. The rule name is the key suffix and the value must
//! be `allow` or `deny`.
//!
//! Evaluation is a pure function of `(labels, username)`:
//!
//! 1. a rule named after the user's policy key wins,
//! 2. otherwise the `policy` rule applies,
//! 3. otherwise the record is denied.
//!
//! The policy key is the username with its first two `:`-separated
//! segments stripped and remaining `:` replaced by `_`, so
//! `system:serviceaccount:ns:sa` becomes `ns_sa`.

use std::collections::HashMap;
use std::str::FromStr;

use thiserror::Error;

/// Label key prefix marking an access rule.
pub const RULE_PREFIX: &str = "rbac/";

/// Rule name consulted when no user-specific rule exists.
pub const DEFAULT_RULE: &str = "policy";

/// Verdict carried by a single rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    Allow,
    Deny,
}

impl FromStr for Policy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "allow" => Ok(Policy::Allow),
            "deny" => Ok(Policy::Deny),
            _ => Err(()),
        }
    }
}

/// The set of rules extracted from one record's labels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RbacRules(HashMap<String, Policy>);

impl RbacRules {
    /// Decide whether `username` may see the record these rules came from.
    pub fn can_view(&self, username: &str) -> bool {
        if let Some(policy) = self.0.get(&policy_key(username)) {
            return *policy == Policy::Allow;
        }
        if let Some(policy) = self.0.get(DEFAULT_RULE) {
            return *policy == Policy::Allow;
        }
        false
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    fn get(&self, rule: &str) -> Option<Policy> {
        self.0.get(rule).copied()
    }
}

/// Extract the access rules from a record's label map.
///
/// Labels with an unparseable rule value are reported back rather than
/// aborting evaluation; the remaining rules still apply.
pub fn load_rules(labels: &HashMap<String, String>) -> (RbacRules, Vec<InvalidRule>) {
    let mut rules = HashMap::new();
    let mut invalid = Vec::new();
    for (key, value) in labels {
        let Some(rule_name) = key.strip_prefix(RULE_PREFIX) else {
            continue;
        };
        match value.parse::<Policy>() {
            Ok(policy) => {
                rules.insert(rule_name.to_string(), policy);
            }
            Err(()) => invalid.push(InvalidRule {
                key: key.clone(),
                value: value.clone(),
            }),
        }
    }
    (RbacRules(rules), invalid)
}

/// Derive the rule name a username is matched against.
///
/// Strips up to two leading `:`-separated segments (a segment without a
/// separator is left alone) and maps remaining `:` to `_`, since label
/// values cannot contain `:`.
pub fn policy_key(username: &str) -> String {
    let mut key = username;
    for _ in 0..2 {
        if let Some(idx) = key.find(':') {
            key = &key[idx + 1..];
        }
    }
    key.replace(':', "_")
}

/// A label under [`RULE_PREFIX`] whose value is neither `allow` nor `deny`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid RBAC rule {key:?}: {value:?}")]
pub struct InvalidRule {
    pub key: String,
    pub value: String,
}

#[cfg(test)]
#[path = "policy_test.rs"]
mod tests;
