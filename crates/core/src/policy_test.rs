//! Tests for the access policy

use std::collections::HashMap;

use super::*;

fn labels(entries: &[(&str, &str)]) -> HashMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// ============================================================================
// Policy key derivation
// ============================================================================

#[test]
fn test_policy_key_strips_two_segments() {
    assert_eq!(policy_key("system:user:alice"), "alice");
}

#[test]
fn test_policy_key_maps_remaining_separators() {
    assert_eq!(policy_key("system:serviceaccount:ns:sa"), "ns_sa");
}

#[test]
fn test_policy_key_short_usernames_do_not_panic() {
    assert_eq!(policy_key("alice"), "alice");
    assert_eq!(policy_key("system:alice"), "alice");
    assert_eq!(policy_key(""), "");
}

// ============================================================================
// Rule loading
// ============================================================================

#[test]
fn test_load_rules_collects_prefixed_labels() {
    let (rules, invalid) = load_rules(&labels(&[
        ("rbac/alice", "allow"),
        ("rbac/policy", "deny"),
        ("app", "web"),
    ]));
    assert!(invalid.is_empty());
    assert_eq!(rules.get("alice"), Some(Policy::Allow));
    assert_eq!(rules.get("policy"), Some(Policy::Deny));
    assert_eq!(rules.get("app"), None);
}

#[test]
fn test_load_rules_reports_invalid_values_and_continues() {
    let (rules, invalid) = load_rules(&labels(&[
        ("rbac/alice", "maybe"),
        ("rbac/bob", "allow"),
    ]));
    assert_eq!(invalid.len(), 1);
    assert_eq!(invalid[0].key, "rbac/alice");
    assert_eq!(invalid[0].value, "maybe");
    assert_eq!(rules.get("bob"), Some(Policy::Allow));
    assert_eq!(rules.get("alice"), None);
}

#[test]
fn test_load_rules_empty_labels() {
    let (rules, invalid) = load_rules(&HashMap::new());
    assert!(rules.is_empty());
    assert!(invalid.is_empty());
}

// ============================================================================
// Decision order
// ============================================================================

#[test]
fn test_user_rule_wins_over_default() {
    let (rules, _) = load_rules(&labels(&[
        ("rbac/alice", "allow"),
        ("rbac/policy", "deny"),
    ]));
    assert!(rules.can_view("system:user:alice"));

    let (rules, _) = load_rules(&labels(&[
        ("rbac/alice", "deny"),
        ("rbac/policy", "allow"),
    ]));
    assert!(!rules.can_view("system:user:alice"));
}

#[test]
fn test_default_rule_applies_without_user_rule() {
    let (rules, _) = load_rules(&labels(&[("rbac/policy", "allow")]));
    assert!(rules.can_view("system:user:bob"));

    let (rules, _) = load_rules(&labels(&[("rbac/policy", "deny")]));
    assert!(!rules.can_view("system:user:bob"));
}

#[test]
fn test_no_rules_means_deny() {
    let (rules, _) = load_rules(&HashMap::new());
    assert!(!rules.can_view("system:user:alice"));
}

#[test]
fn test_decision_is_deterministic() {
    let lbls = labels(&[("rbac/ns_sa", "allow"), ("rbac/policy", "deny")]);
    for _ in 0..10 {
        let (rules, _) = load_rules(&lbls);
        assert!(rules.can_view("system:serviceaccount:ns:sa"));
        assert!(!rules.can_view("system:serviceaccount:other:sa"));
    }
}
