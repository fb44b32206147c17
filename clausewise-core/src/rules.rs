//! Compliance rule catalogue.
//!
//! Rules are loaded once from a JSON object mapping rule id to record and are
//! never mutated afterwards, so a [`RuleRegistry`] can be shared freely behind
//! an `Arc`. Input order is preserved throughout: `all()`, filtering, and the
//! catalogue injected into prompts all follow the order of the source file.

use crate::error::RuleError;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// Severity of a compliance rule. Ordering is `High > Medium > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// All severities, highest first.
    pub const ALL: [Severity; 3] = [Severity::High, Severity::Medium, Severity::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
        }
    }

    /// Colour marker used when listing rules in a terminal.
    pub fn marker(&self) -> &'static str {
        match self {
            Severity::High => "🔴",
            Severity::Medium => "🟡",
            Severity::Low => "🟢",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Severity::ALL
            .into_iter()
            .find(|sev| sev.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| format!("unknown severity '{}' (expected HIGH, MEDIUM or LOW)", s))
    }
}

/// One codified compliance requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
    pub id: String,
    pub name: String,
    pub description: String,
    pub severity: Severity,
    /// Human-readable criterion; not machine-executable.
    pub check: String,
    pub remediation: String,
    /// Dataset fields the rule pertains to.
    pub related_columns: Vec<String>,
}

/// Wire shape of a single record in the rule source (the id is the map key).
#[derive(Debug, Deserialize)]
struct RuleRecord {
    name: String,
    description: String,
    severity: String,
    check: String,
    remediation: String,
    #[serde(default)]
    related_columns: Vec<String>,
}

impl RuleRecord {
    fn into_rule(self, id: String) -> Result<Rule, RuleError> {
        let severity = self
            .severity
            .parse::<Severity>()
            .map_err(|reason| RuleError::InvalidRule {
                id: id.clone(),
                reason,
            })?;
        Ok(Rule {
            id,
            name: self.name,
            description: self.description,
            severity,
            check: self.check,
            remediation: self.remediation,
            related_columns: self.related_columns,
        })
    }
}

/// Borrowed view of a rule without its id, serialized as the map value in the
/// rule catalogue.
#[derive(Serialize)]
struct RuleBody<'a> {
    name: &'a str,
    description: &'a str,
    severity: Severity,
    check: &'a str,
    remediation: &'a str,
    related_columns: &'a [String],
}

impl<'a> From<&'a Rule> for RuleBody<'a> {
    fn from(rule: &'a Rule) -> Self {
        Self {
            name: &rule.name,
            description: &rule.description,
            severity: rule.severity,
            check: &rule.check,
            remediation: &rule.remediation,
            related_columns: &rule.related_columns,
        }
    }
}

/// Top-level map entries in source order. `serde_json::Map` would sort keys.
struct OrderedEntries(Vec<(String, serde_json::Value)>);

impl<'de> Deserialize<'de> for OrderedEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = OrderedEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of rule id to rule record")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, serde_json::Value>()? {
                    entries.push(entry);
                }
                Ok(OrderedEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

/// Immutable, insertion-ordered catalogue of compliance rules.
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    rules: Vec<Rule>,
    by_id: HashMap<String, usize>,
}

impl RuleRegistry {
    /// Build a registry from already-constructed rules, rejecting duplicate ids.
    pub fn from_rules(rules: Vec<Rule>) -> Result<Self, RuleError> {
        let mut by_id = HashMap::with_capacity(rules.len());
        for (pos, rule) in rules.iter().enumerate() {
            if by_id.insert(rule.id.clone(), pos).is_some() {
                return Err(RuleError::InvalidRule {
                    id: rule.id.clone(),
                    reason: "duplicate rule id".to_string(),
                });
            }
        }
        Ok(Self { rules, by_id })
    }

    /// Parse a rule source from a JSON string.
    pub fn from_json_str(source: &str) -> Result<Self, RuleError> {
        let entries: OrderedEntries =
            serde_json::from_str(source).map_err(|e| RuleError::Malformed {
                message: e.to_string(),
            })?;
        Self::from_entries(entries)
    }

    /// Parse a rule source from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, RuleError> {
        let entries: OrderedEntries =
            serde_json::from_reader(reader).map_err(|e| RuleError::Malformed {
                message: e.to_string(),
            })?;
        Self::from_entries(entries)
    }

    /// Load a rule source file from disk.
    pub fn from_path(path: &Path) -> Result<Self, RuleError> {
        let raw = std::fs::read_to_string(path).map_err(|e| RuleError::Unreadable {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let registry = Self::from_json_str(&raw)?;
        tracing::debug!(
            path = %path.display(),
            rules = registry.len(),
            "Loaded compliance rules"
        );
        Ok(registry)
    }

    fn from_entries(entries: OrderedEntries) -> Result<Self, RuleError> {
        let rules = entries
            .0
            .into_iter()
            .map(|(id, value)| {
                let record: RuleRecord =
                    serde_json::from_value(value).map_err(|e| RuleError::InvalidRule {
                        id: id.clone(),
                        reason: e.to_string(),
                    })?;
                record.into_rule(id)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_rules(rules)
    }

    /// Look up a rule by id.
    pub fn get(&self, id: &str) -> Result<&Rule, RuleError> {
        self.by_id
            .get(id)
            .map(|&pos| &self.rules[pos])
            .ok_or_else(|| RuleError::NotFound { id: id.to_string() })
    }

    /// Every rule, in source order.
    pub fn all(&self) -> &[Rule] {
        &self.rules
    }

    /// Rules whose severity is in `severities`, in source order.
    pub fn filter_by_severity(&self, severities: &[Severity]) -> Vec<&Rule> {
        self.rules
            .iter()
            .filter(|r| severities.contains(&r.severity))
            .collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<'a> IntoIterator for &'a RuleRegistry {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

/// Serializes a sequence of rules as an id → record map, matching the rule
/// source format.
pub struct Catalogue<'a>(pub &'a [Rule]);

impl Serialize for Catalogue<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for rule in self.0 {
            map.serialize_entry(&rule.id, &RuleBody::from(rule))?;
        }
        map.end()
    }
}

impl Serialize for RuleRegistry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Catalogue(&self.rules).serialize(serializer)
    }
}

/// Render rules as 2-space indented JSON in the rule source format.
pub fn catalogue_json(rules: &[Rule]) -> String {
    // String-keyed maps of plain structs cannot fail to serialize.
    serde_json::to_string_pretty(&Catalogue(rules)).unwrap_or_default()
}
