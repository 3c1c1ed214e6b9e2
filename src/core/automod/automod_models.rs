// AutoMod domain models - data structures for keyword rule management.
//
// These are pure domain types with no Discord dependencies.
// The infra layer converts Discord's AutoMod payloads into these.

use serde::{Deserialize, Serialize};

/// A snapshot of a guild's AutoMod rule.
///
/// The rule is owned by the remote store; this is a transient copy fetched
/// per operation and may be stale by the time an edit is submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoModRule {
    pub id: u64,
    pub guild_id: u64,
    /// Display name. Not guaranteed unique within a guild.
    pub name: String,
    pub trigger: RuleTrigger,
}

/// The trigger condition of a rule.
///
/// Only the keyword kind is editable here; every other kind exists so that
/// keyword operations can fail closed on it instead of guessing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RuleTrigger {
    Keyword(KeywordFilter),
    Spam,
    MentionSpam,
    KeywordPreset,
    Unknown,
}

impl RuleTrigger {
    /// Whether this trigger carries an editable keyword filter.
    pub fn is_keyword(&self) -> bool {
        matches!(self, RuleTrigger::Keyword(_))
    }
}

/// The keyword filter of a keyword-typed rule.
///
/// Both lists keep insertion order: edits append or remove in place, never
/// reorder. Neither list may contain duplicates (exact-string,
/// case-sensitive).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct KeywordFilter {
    /// Literal keywords matched as substrings by the platform.
    pub keywords: Vec<String>,
    /// Regex patterns. Never scanned by keyword search.
    pub regex_patterns: Vec<String>,
    /// Exemptions. Carried verbatim through every edit, never modified here.
    pub allow_list: Vec<String>,
}

/// Which list of a keyword filter an edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Keyword,
    Regex,
}

impl EntryKind {
    pub fn from_regex_flag(is_regex: bool) -> Self {
        if is_regex {
            EntryKind::Regex
        } else {
            EntryKind::Keyword
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryKind::Keyword => write!(f, "keyword"),
            EntryKind::Regex => write!(f, "regex expression"),
        }
    }
}

/// Returned on a successful add/remove so the caller can render it.
#[derive(Debug, Clone, PartialEq)]
pub struct EditConfirmation {
    pub rule_name: String,
    pub entry: String,
    pub kind: EntryKind,
}

/// All matches of one rule for a search query, in keyword order.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleMatches {
    pub rule_name: String,
    /// Human-readable lines of the form "<keyword> contains <query>".
    pub descriptions: Vec<String>,
}

/// Result of scanning a guild's rules for a keyword query.
///
/// Recomputed per request, never stored. Rules without matches are omitted.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordSearchReport {
    pub total: usize,
    pub matches: Vec<RuleMatches>,
}

impl KeywordSearchReport {
    /// Render the report as the text attached to the staff reply.
    pub fn to_text(&self) -> String {
        let mut blocks = Vec::with_capacity(self.matches.len());
        for rule in &self.matches {
            blocks.push(format!(
                "Rule {}:\n  {}",
                rule.rule_name,
                rule.descriptions.join("  \n")
            ));
        }
        blocks.join("\n")
    }
}

/// An autocomplete suggestion for a rule parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSuggestion {
    pub name: String,
    pub id: u64,
}

/// A fired AutoMod action, as seen by the reactor.
///
/// `member_id` is optional because the gateway payload does not always
/// resolve to a member; an unresolvable member is dropped silently.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoModEvent {
    pub guild_id: u64,
    pub rule_id: u64,
    pub member_id: Option<u64>,
}
