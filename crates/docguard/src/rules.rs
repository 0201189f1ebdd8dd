//! Rule tags and normalized rule sets.
//!
//! A unit or member declares its policy with one tag per line:
//!
//! ```text
//! @auth-groups admin, reg-user
//! @auth-ban-groups blocked
//! @auth-mode and
//! ```
//!
//! [`parse_tags`] finds the tags in a documentation blob and
//! [`RuleSet::from_tags`] normalizes them.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Reserved key holding the combination mode.
pub const MODE_KEY: &str = "mode";

/// Key prefix marking an exclusion rule.
pub const BAN_PREFIX: &str = "ban-";

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@auth-([\w-]+)[ \t]+([^\r\n]+)").expect("tag pattern is valid"));

// ============================================================================
// RuleTag
// ============================================================================

/// One `@auth-<key> <values>` line, as captured from source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTag {
    /// The key exactly as written after `@auth-`.
    pub key: String,
    /// Everything after the separating whitespace, up to end of line.
    pub raw_values: String,
}

/// Captures every rule tag in `doc`, in source order.
pub fn parse_tags(doc: &str) -> Vec<RuleTag> {
    TAG_PATTERN
        .captures_iter(doc)
        .map(|caps| RuleTag {
            key: caps[1].to_string(),
            raw_values: caps[2].to_string(),
        })
        .collect()
}

// ============================================================================
// Rule
// ============================================================================

/// A single rule group: a key and the values it requires or forbids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Normalized key (lowercase, trimmed).
    pub key: String,
    /// Values in declaration order.
    pub values: Vec<String>,
}

impl Rule {
    pub fn new<K, I, V>(key: K, values: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Self {
            key: key.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// For a `ban-<group>` rule, the attribute group it guards.
    pub fn ban_group(&self) -> Option<&str> {
        self.key.strip_prefix(BAN_PREFIX)
    }

    pub fn is_ban(&self) -> bool {
        self.ban_group().is_some()
    }
}

// ============================================================================
// RuleSet
// ============================================================================

/// The normalized policy of one unit or member.
///
/// Keys are unique. A repeated key replaces the earlier values but keeps the
/// earlier position. The `mode` tag is held apart from the rules and is not
/// validated here; an unknown token surfaces only when the set is evaluated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mode: Option<String>,
    #[serde(default)]
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and normalizes the tags found in a documentation blob.
    pub fn from_doc(doc: &str) -> Self {
        Self::from_tags(parse_tags(doc))
    }

    /// Normalizes captured tags.
    ///
    /// Keys are lowercased and trimmed. The `mode` value is lowercased and
    /// kept as a scalar. Any other value is split on commas and each piece is
    /// trimmed of surrounding commas and whitespace.
    pub fn from_tags<I>(tags: I) -> Self
    where
        I: IntoIterator<Item = RuleTag>,
    {
        let mut set = Self::new();
        for tag in tags {
            let key = tag.key.trim().to_lowercase();
            if key == MODE_KEY {
                set.mode = Some(tag.raw_values.trim().to_lowercase());
            } else {
                set.insert(Rule {
                    key,
                    values: split_values(&tag.raw_values),
                });
            }
        }
        set
    }

    /// Adds a rule (builder pattern).
    pub fn with_rule<K, I, V>(mut self, key: K, values: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.insert(Rule::new(key, values));
        self
    }

    /// Sets the mode token (builder pattern).
    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    fn insert(&mut self, rule: Rule) {
        match self.rules.iter_mut().find(|r| r.key == rule.key) {
            Some(existing) => existing.values = rule.values,
            None => self.rules.push(rule),
        }
    }

    /// The declared mode token, if any.
    pub fn mode(&self) -> Option<&str> {
        self.mode.as_deref()
    }

    /// All rules, bans included, in declaration order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.rules
            .iter()
            .find(|r| r.key == key)
            .map(|r| r.values.as_slice())
    }

    /// The `ban-*` rules.
    pub fn bans(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|r| r.is_ban())
    }

    /// The rules that take part in mode evaluation.
    pub fn requirements(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|r| !r.is_ban())
    }

    /// True when the set declares neither rules nor a mode.
    pub fn is_empty(&self) -> bool {
        self.mode.is_none() && self.rules.is_empty()
    }

    /// Number of rules, not counting the mode.
    pub fn len(&self) -> usize {
        self.rules.len()
    }
}

fn split_values(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|piece| {
            piece
                .trim_matches(|c: char| c == ',' || c.is_whitespace())
                .to_string()
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
