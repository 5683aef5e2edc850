//! Suppression rule tree and matcher.
//!
//! The tree mirrors the operator's quiet-rule file: cluster groups at the top,
//! then per-cluster rules that may nest namespace groups, namespace rules, pod
//! groups and pod rules. Each level carries an optional [`TimeWindow`].
//!
//! A window with neither bound set is **inactive**. A rule only mutes alerts
//! while an explicitly configured window covers `now`.
//!
//! ```rust
//! use chrono::{Duration, Utc};
//! use sms_alerts::rules::{ClusterGroup, SuppressionRuleTree, TimeWindow};
//!
//! let now = Utc::now();
//! let tree = SuppressionRuleTree {
//!     cluster_groups: vec![ClusterGroup {
//!         name: "staging".to_string(),
//!         clusters: vec!["stg-*".to_string(), "stg-eu".to_string()],
//!         time: TimeWindow::new(Some(now - Duration::hours(1)), None),
//!     }],
//!     rules: Vec::new(),
//! };
//!
//! assert!(tree.check("STG-EU", "default", "api-0", now).suppressed);
//! assert!(!tree.check("prod-eu", "default", "api-0", now).suppressed);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, Result};

/// The wildcard pattern token, matching any value at its level.
pub const WILDCARD: &str = "*";

/// Matches `value` against a rule pattern.
///
/// The pattern is either exactly [`WILDCARD`] or compared case-insensitively
/// for equality. Partial globs such as `stg-*` are literal text.
#[must_use]
pub fn pattern_matches(pattern: &str, value: &str) -> bool {
    pattern == WILDCARD || pattern.to_lowercase() == value.to_lowercase()
}

/// An optional `[start, end]` activity window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Start of the window, inclusive. Open-ended when absent.
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    /// End of the window, inclusive. Open-ended when absent.
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
}

impl TimeWindow {
    /// Creates a window from optional bounds.
    #[must_use]
    pub const fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    /// Returns true if at least one bound is configured.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    /// Returns true if `now` lies inside the window.
    ///
    /// An unconfigured window is never active.
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        if !self.is_configured() {
            return false;
        }
        if self.start.is_some_and(|start| now < start) {
            return false;
        }
        if self.end.is_some_and(|end| now > end) {
            return false;
        }
        true
    }

    fn validate(&self, scope: &str) -> Result<()> {
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if end < start {
                return Err(GatewayError::InvalidRule {
                    reason: format!("{scope}: window end {end} is before start {start}"),
                });
            }
        }
        Ok(())
    }
}

/// A named set of pod patterns sharing one window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodGroup {
    /// Group name, reported in the verdict.
    pub name: String,
    /// Pod patterns.
    #[serde(default)]
    pub pods: Vec<String>,
    /// Activity window.
    #[serde(default)]
    pub time: TimeWindow,
}

/// A single pod pattern with its own window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodRule {
    /// Pod pattern.
    pub name: String,
    /// Activity window.
    #[serde(default)]
    pub time: TimeWindow,
}

/// A single namespace pattern, optionally narrowed to pods.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceRule {
    /// Namespace pattern.
    pub name: String,
    /// Window for muting the whole namespace.
    #[serde(default)]
    pub time: TimeWindow,
    /// Pod groups inside this namespace.
    #[serde(default)]
    pub pod_groups: Vec<PodGroup>,
    /// Pod rules inside this namespace.
    #[serde(default)]
    pub pods: Vec<PodRule>,
}

impl NamespaceRule {
    fn has_pod_children(&self) -> bool {
        !self.pods.is_empty() || !self.pod_groups.is_empty()
    }
}

/// A named set of namespace patterns sharing one window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceGroup {
    /// Group name, reported in the verdict.
    pub name: String,
    /// Namespace patterns.
    #[serde(default)]
    pub namespaces: Vec<String>,
    /// Activity window.
    #[serde(default)]
    pub time: TimeWindow,
}

/// A single cluster pattern, optionally narrowed to namespaces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRule {
    /// Cluster pattern.
    pub cluster: String,
    /// Window for muting the whole cluster.
    #[serde(default)]
    pub time: TimeWindow,
    /// Namespace groups inside this cluster.
    #[serde(default)]
    pub namespace_groups: Vec<NamespaceGroup>,
    /// Namespace rules inside this cluster.
    #[serde(default)]
    pub namespaces: Vec<NamespaceRule>,
}

impl ClusterRule {
    fn has_namespace_children(&self) -> bool {
        !self.namespaces.is_empty() || !self.namespace_groups.is_empty()
    }
}

/// A named set of cluster patterns sharing one window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterGroup {
    /// Group name, reported in the verdict.
    pub name: String,
    /// Cluster patterns.
    #[serde(default)]
    pub clusters: Vec<String>,
    /// Activity window.
    #[serde(default)]
    pub time: TimeWindow,
}

/// The level of the tree that muted an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressionLevel {
    /// A top-level cluster group.
    ClusterGroup,
    /// A whole-cluster rule.
    Cluster,
    /// A namespace group inside a cluster rule.
    NamespaceGroup,
    /// A whole-namespace rule.
    Namespace,
    /// A pod group inside a namespace rule.
    PodGroup,
    /// A single pod rule.
    Pod,
}

/// Outcome of a suppression check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuppressionVerdict {
    /// Whether the alert is muted.
    pub suppressed: bool,
    /// Which rule matched, with the matched identifiers. Empty when not muted.
    pub reason: String,
    /// The level that matched, if any.
    pub level: Option<SuppressionLevel>,
}

impl SuppressionVerdict {
    /// A verdict for an alert that is not muted.
    #[must_use]
    pub fn pass() -> Self {
        Self::default()
    }

    fn muted(level: SuppressionLevel, reason: String) -> Self {
        Self {
            suppressed: true,
            reason,
            level: Some(level),
        }
    }
}

/// The whole quiet-rule configuration.
///
/// Loaded once and shared read-only; evaluation takes `&self` and never
/// mutates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuppressionRuleTree {
    /// Top-level cluster groups, checked first.
    #[serde(default)]
    pub cluster_groups: Vec<ClusterGroup>,
    /// Per-cluster rules.
    #[serde(default, rename = "ignore")]
    pub rules: Vec<ClusterRule>,
}

impl SuppressionRuleTree {
    /// Creates an empty tree that suppresses nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a tree from its JSON representation and validates it.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Serialization` for malformed JSON and
    /// `GatewayError::InvalidRule` for a structurally invalid rule.
    pub fn from_json(content: &str) -> Result<Self> {
        let tree: Self = serde_json::from_str(content)?;
        tree.validate()?;
        Ok(tree)
    }

    /// Returns true if the tree holds no rules at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cluster_groups.is_empty() && self.rules.is_empty()
    }

    /// Total number of rules and groups at every level.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        let nested: usize = self
            .rules
            .iter()
            .map(|c| {
                1 + c.namespace_groups.len()
                    + c.namespaces
                        .iter()
                        .map(|n| 1 + n.pod_groups.len() + n.pods.len())
                        .sum::<usize>()
            })
            .sum();
        self.cluster_groups.len() + nested
    }

    /// Checks that every pattern and group name is non-empty and that every
    /// window with both bounds has `start <= end`.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::InvalidRule` naming the first offending rule.
    pub fn validate(&self) -> Result<()> {
        for group in &self.cluster_groups {
            let scope = format!("clusterGroup '{}'", group.name);
            require_name(&group.name, "clusterGroup")?;
            require_patterns(&group.clusters, &scope)?;
            group.time.validate(&scope)?;
        }

        for rule in &self.rules {
            let scope = format!("cluster '{}'", rule.cluster);
            require_name(&rule.cluster, "cluster rule pattern")?;
            rule.time.validate(&scope)?;

            for group in &rule.namespace_groups {
                let scope = format!("{scope} namespaceGroup '{}'", group.name);
                require_name(&group.name, "namespaceGroup")?;
                require_patterns(&group.namespaces, &scope)?;
                group.time.validate(&scope)?;
            }

            for ns in &rule.namespaces {
                let scope = format!("{scope} namespace '{}'", ns.name);
                require_name(&ns.name, "namespace rule pattern")?;
                ns.time.validate(&scope)?;

                for group in &ns.pod_groups {
                    let scope = format!("{scope} podGroup '{}'", group.name);
                    require_name(&group.name, "podGroup")?;
                    require_patterns(&group.pods, &scope)?;
                    group.time.validate(&scope)?;
                }

                for pod in &ns.pods {
                    let scope = format!("{scope} pod '{}'", pod.name);
                    require_name(&pod.name, "pod rule pattern")?;
                    pod.time.validate(&scope)?;
                }
            }
        }

        Ok(())
    }

    /// Decides whether an alert for `(cluster, namespace, pod)` is muted at `now`.
    ///
    /// Levels are checked in order and the first match wins: cluster groups,
    /// then for each matching cluster rule the whole-cluster window, its
    /// namespace groups, and its namespace rules (whole-namespace window, pod
    /// groups, pod rules).
    #[must_use]
    pub fn check(
        &self,
        cluster: &str,
        namespace: &str,
        pod: &str,
        now: DateTime<Utc>,
    ) -> SuppressionVerdict {
        for group in &self.cluster_groups {
            if group.time.is_active(now) && any_matches(&group.clusters, cluster) {
                return SuppressionVerdict::muted(
                    SuppressionLevel::ClusterGroup,
                    format!("ignored by clusterGroup {} (cluster {cluster})", group.name),
                );
            }
        }

        for rule in self.rules.iter().filter(|r| pattern_matches(&r.cluster, cluster)) {
            if rule.time.is_active(now) && !rule.has_namespace_children() {
                return SuppressionVerdict::muted(
                    SuppressionLevel::Cluster,
                    format!("ignored all alerts in cluster '{cluster}'"),
                );
            }

            for group in &rule.namespace_groups {
                if group.time.is_active(now) && any_matches(&group.namespaces, namespace) {
                    return SuppressionVerdict::muted(
                        SuppressionLevel::NamespaceGroup,
                        format!(
                            "ignored by namespaceGroup {} in cluster {cluster} (namespace {namespace})",
                            group.name
                        ),
                    );
                }
            }

            for ns in rule.namespaces.iter().filter(|n| pattern_matches(&n.name, namespace)) {
                if let Some(verdict) = check_namespace(ns, cluster, namespace, pod, now) {
                    return verdict;
                }
            }
        }

        SuppressionVerdict::pass()
    }
}

fn check_namespace(
    ns: &NamespaceRule,
    cluster: &str,
    namespace: &str,
    pod: &str,
    now: DateTime<Utc>,
) -> Option<SuppressionVerdict> {
    if ns.time.is_active(now) && !ns.has_pod_children() {
        return Some(SuppressionVerdict::muted(
            SuppressionLevel::Namespace,
            format!("ignored all alerts in namespace '{namespace}' with location '{cluster}'"),
        ));
    }

    for group in &ns.pod_groups {
        if group.time.is_active(now) && any_matches(&group.pods, pod) {
            return Some(SuppressionVerdict::muted(
                SuppressionLevel::PodGroup,
                format!(
                    "ignored by podGroup {} in {cluster}/{namespace} (pod {pod})",
                    group.name
                ),
            ));
        }
    }

    ns.pods
        .iter()
        .find(|p| p.time.is_active(now) && pattern_matches(&p.name, pod))
        .map(|_| {
            SuppressionVerdict::muted(
                SuppressionLevel::Pod,
                format!("ignored pod '{pod}' with location '{cluster}/{namespace}'"),
            )
        })
}

fn any_matches(patterns: &[String], value: &str) -> bool {
    patterns.iter().any(|p| pattern_matches(p, value))
}

fn require_name(name: &str, what: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(GatewayError::InvalidRule {
            reason: format!("{what} name cannot be empty"),
        });
    }
    Ok(())
}

fn require_patterns(patterns: &[String], scope: &str) -> Result<()> {
    if patterns.iter().any(|p| p.trim().is_empty()) {
        return Err(GatewayError::InvalidRule {
            reason: format!("{scope}: patterns cannot be empty"),
        });
    }
    Ok(())
}
