//! Firewall rule catalog types

use serde::{Deserialize, Serialize};

/// An allow rule as listed by the firewall API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirewallRule {
    pub rule_id: String,
    pub ip: String,
    pub notes: String,
}

impl FirewallRule {
    pub fn new(
        rule_id: impl Into<String>,
        ip: impl Into<String>,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            ip: ip.into(),
            notes: notes.into(),
        }
    }
}

/// A rule this tool owns (its notes carry the ownership marker)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedRule {
    pub rule_id: String,
    pub ip: String,
}

impl ManagedRule {
    pub fn new(rule_id: impl Into<String>, ip: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.into(),
            ip: ip.into(),
        }
    }
}

/// Whether a rule's notes mark it as owned by this tool
pub fn is_managed(notes: &str, marker: &str) -> bool {
    !marker.is_empty() && notes.contains(marker)
}

/// Snapshot of the allow list: every listed IP plus the managed subset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Every allow-listed IP, any owner, in listing order (may repeat)
    pub all_ips: Vec<String>,

    /// Rules carrying the marker, in listing order
    pub managed: Vec<ManagedRule>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rules<'a>(rules: impl IntoIterator<Item = &'a FirewallRule>, marker: &str) -> Self {
        let mut catalog = Self::new();
        for rule in rules {
            catalog.record(&rule.rule_id, &rule.ip, &rule.notes, marker);
        }
        catalog
    }

    /// Add one listed rule. Rules without a value are skipped; rules without
    /// an id still occupy their IP but cannot be managed.
    pub fn record(&mut self, rule_id: &str, ip: &str, notes: &str, marker: &str) {
        if ip.is_empty() {
            return;
        }
        self.all_ips.push(ip.to_string());
        if !rule_id.is_empty() && is_managed(notes, marker) {
            self.managed.push(ManagedRule::new(rule_id, ip));
        }
    }
}

/// First managed rule id for `ip` in list order
pub fn rule_id_for<'a>(managed: &'a [ManagedRule], ip: &str) -> Option<&'a str> {
    managed
        .iter()
        .find(|r| r.ip == ip)
        .map(|r| r.rule_id.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKER: &str = "Managed by QUIC.cloud Sync Script";

    #[test]
    fn test_marker_containment() {
        assert!(is_managed(
            "Managed by QUIC.cloud Sync Script | Added on 2024-01-01",
            MARKER
        ));
        assert!(is_managed("prefix Managed by QUIC.cloud Sync Script", MARKER));
        assert!(!is_managed("added by hand", MARKER));
        assert!(!is_managed("", MARKER));
        assert!(!is_managed("anything", ""));
    }

    #[test]
    fn test_from_rules_splits_managed_subset() {
        let rules = vec![
            FirewallRule::new("r1", "1.1.1.1", "office"),
            FirewallRule::new("r2", "2.2.2.2", format!("{MARKER} | Added on 2024-05-01")),
            FirewallRule::new("r3", "", MARKER),
            FirewallRule::new("r4", "2.2.2.2", MARKER),
        ];
        let catalog = Catalog::from_rules(&rules, MARKER);

        assert_eq!(catalog.all_ips, vec!["1.1.1.1", "2.2.2.2", "2.2.2.2"]);
        assert_eq!(
            catalog.managed,
            vec![
                ManagedRule::new("r2", "2.2.2.2"),
                ManagedRule::new("r4", "2.2.2.2")
            ]
        );
    }

    #[test]
    fn test_rule_without_id_is_not_managed() {
        let rules = vec![
            FirewallRule::new("", "5.5.5.5", MARKER),
            FirewallRule::new("r6", "6.6.6.6", MARKER),
        ];
        let catalog = Catalog::from_rules(&rules, MARKER);

        assert_eq!(catalog.all_ips, vec!["5.5.5.5", "6.6.6.6"]);
        assert_eq!(catalog.managed, vec![ManagedRule::new("r6", "6.6.6.6")]);
    }

    #[test]
    fn test_rule_id_for_returns_first_match() {
        let managed = vec![
            ManagedRule::new("r2", "2.2.2.2"),
            ManagedRule::new("r4", "2.2.2.2"),
        ];
        assert_eq!(rule_id_for(&managed, "2.2.2.2"), Some("r2"));
        assert_eq!(rule_id_for(&managed, "9.9.9.9"), None);
    }
}
