// AutoMod rule service - core business logic for keyword filter management.
//
// This service handles:
// - Duplicate-checked add/remove of keywords and regex patterns
// - Substring search across a guild's keyword filters
// - Rule suggestions for autocomplete
//
// NO Discord dependencies here - just pure domain logic.

use super::automod_models::{
    AutoModRule, EditConfirmation, EntryKind, KeywordSearchReport, RuleMatches, RuleSuggestion,
    RuleTrigger,
};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

/// Discord caps autocomplete responses at 25 choices.
pub const MAX_SUGGESTIONS: usize = 25;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum AutoModError {
    /// Keyword operation attempted on a rule without a keyword filter.
    #[error("This AutoMod rule doesn't have a keyword filter")]
    WrongTriggerType,

    #[error("{0} is already in the filter")]
    DuplicateEntry(String),

    #[error("{0} is not in the filter")]
    EntryNotFound(String),

    /// The remote store refused the replace (malformed regex, size limit, ...).
    /// Carries the remote's message verbatim.
    #[error("{0}")]
    RemoteRejected(String),

    #[error("AutoMod rule {0} not found")]
    RuleNotFound(u64),

    #[error("Kick failed: {0}")]
    ActuatorError(String),

    #[error("Store error: {0}")]
    StoreError(String),
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

/// Access to the remote AutoMod rule store.
///
/// Following the same pattern as the other service ports: the Discord
/// implementation lives in infra, tests use an in-memory mock.
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Fetch all rules of a guild.
    async fn fetch_rules(&self, guild_id: u64) -> Result<Vec<AutoModRule>, AutoModError>;

    /// Fetch one rule by id. Fails with `RuleNotFound` if it no longer exists.
    async fn fetch_rule(&self, guild_id: u64, rule_id: u64) -> Result<AutoModRule, AutoModError>;

    /// Replace a rule's whole trigger. There is no partial-field update;
    /// the store refusing the write surfaces as `RemoteRejected`.
    async fn replace_trigger(
        &self,
        guild_id: u64,
        rule_id: u64,
        trigger: RuleTrigger,
    ) -> Result<(), AutoModError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// Keyword filter editor over a [`RuleStore`].
///
/// Edits are read-modify-write replaces without remote versioning, so two
/// processes can still race. Within this process, edits to the same rule id
/// are serialized through a per-rule mutex.
pub struct AutoModService<S: RuleStore> {
    store: S,
    edit_locks: DashMap<u64, Arc<Mutex<()>>>,
}

impl<S: RuleStore> AutoModService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            edit_locks: DashMap::new(),
        }
    }

    /// Fetch all rules of a guild.
    pub async fn rules(&self, guild_id: u64) -> Result<Vec<AutoModRule>, AutoModError> {
        self.store.fetch_rules(guild_id).await
    }

    /// Fetch one rule by id.
    pub async fn rule(&self, guild_id: u64, rule_id: u64) -> Result<AutoModRule, AutoModError> {
        self.store.fetch_rule(guild_id, rule_id).await
    }

    /// Add a keyword or regex pattern to a rule's filter.
    ///
    /// Validation failures (`WrongTriggerType`, `DuplicateEntry`) make zero
    /// store calls. On a remote rejection the locally edited copy is dropped,
    /// so no partial state leaks to the caller.
    pub async fn add_entry(
        &self,
        rule: &AutoModRule,
        text: &str,
        is_regex: bool,
    ) -> Result<EditConfirmation, AutoModError> {
        let kind = EntryKind::from_regex_flag(is_regex);
        let lock = self.edit_lock(rule.id);
        let _guard = lock.lock().await;

        let filter = match &rule.trigger {
            RuleTrigger::Keyword(filter) => filter,
            _ => return Err(AutoModError::WrongTriggerType),
        };

        let list = match kind {
            EntryKind::Keyword => &filter.keywords,
            EntryKind::Regex => &filter.regex_patterns,
        };
        // Exact-string comparison: case-sensitive, untrimmed.
        if list.iter().any(|entry| entry == text) {
            return Err(AutoModError::DuplicateEntry(text.to_string()));
        }

        let mut updated = filter.clone();
        match kind {
            EntryKind::Keyword => updated.keywords.push(text.to_string()),
            EntryKind::Regex => updated.regex_patterns.push(text.to_string()),
        }

        self.store
            .replace_trigger(rule.guild_id, rule.id, RuleTrigger::Keyword(updated))
            .await?;

        Ok(EditConfirmation {
            rule_name: rule.name.clone(),
            entry: text.to_string(),
            kind,
        })
    }

    /// Remove a keyword or regex pattern from a rule's filter.
    ///
    /// Mirror of [`add_entry`](Self::add_entry): fails with `EntryNotFound`
    /// if the entry is absent, removes the exact match in place otherwise.
    pub async fn remove_entry(
        &self,
        rule: &AutoModRule,
        text: &str,
        is_regex: bool,
    ) -> Result<EditConfirmation, AutoModError> {
        let kind = EntryKind::from_regex_flag(is_regex);
        let lock = self.edit_lock(rule.id);
        let _guard = lock.lock().await;

        let filter = match &rule.trigger {
            RuleTrigger::Keyword(filter) => filter,
            _ => return Err(AutoModError::WrongTriggerType),
        };

        let mut updated = filter.clone();
        let list = match kind {
            EntryKind::Keyword => &mut updated.keywords,
            EntryKind::Regex => &mut updated.regex_patterns,
        };
        let position = match list.iter().position(|entry| entry == text) {
            Some(position) => position,
            None => return Err(AutoModError::EntryNotFound(text.to_string())),
        };
        list.remove(position);

        self.store
            .replace_trigger(rule.guild_id, rule.id, RuleTrigger::Keyword(updated))
            .await?;

        Ok(EditConfirmation {
            rule_name: rule.name.clone(),
            entry: text.to_string(),
            kind,
        })
    }

    fn edit_lock(&self, rule_id: u64) -> Arc<Mutex<()>> {
        // Clone the Arc out so the DashMap shard guard is not held across .await.
        self.edit_locks.entry(rule_id).or_default().clone()
    }
}

// ============================================================================
// SEARCH & SUGGESTIONS (pure reads, no store access)
// ============================================================================

/// Scan a rules snapshot for literal keywords containing `query`.
///
/// Only keyword-typed rules participate and only their literal keyword lists
/// are scanned; regex patterns never contribute. The empty query matches
/// every keyword. Returns `None` when nothing matched so the caller can
/// render a distinct message. Every matching rule is reported, not just the
/// last one encountered.
pub fn search_keyword(rules: &[AutoModRule], query: &str) -> Option<KeywordSearchReport> {
    let mut total = 0;
    let mut matches = Vec::new();

    for rule in rules {
        let filter = match &rule.trigger {
            RuleTrigger::Keyword(filter) => filter,
            _ => continue,
        };
        let descriptions: Vec<String> = filter
            .keywords
            .iter()
            .filter(|keyword| keyword.contains(query))
            .map(|keyword| format!("{keyword} contains {query}"))
            .collect();
        if descriptions.is_empty() {
            continue;
        }
        total += descriptions.len();
        matches.push(RuleMatches {
            rule_name: rule.name.clone(),
            descriptions,
        });
    }

    if total == 0 {
        None
    } else {
        Some(KeywordSearchReport { total, matches })
    }
}

/// Filter a rules snapshot into autocomplete suggestions.
///
/// Keyword-typed rules only. An empty partial returns all of them in store
/// order; otherwise the name must contain the partial as a case-sensitive
/// substring. Truncated to the platform's choice limit.
pub fn suggest_rules(rules: &[AutoModRule], partial: &str) -> Vec<RuleSuggestion> {
    rules
        .iter()
        .filter(|rule| rule.trigger.is_keyword())
        .filter(|rule| partial.is_empty() || rule.name.contains(partial))
        .take(MAX_SUGGESTIONS)
        .map(|rule| RuleSuggestion {
            name: rule.name.clone(),
            id: rule.id,
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::automod::automod_models::KeywordFilter;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory store for testing. Records every submitted trigger so tests
    /// can assert on exactly what the remote would have received.
    struct MockRuleStore {
        rules: DashMap<u64, AutoModRule>,
        replace_calls: AtomicUsize,
        submitted: std::sync::Mutex<Vec<RuleTrigger>>,
        reject_with: Option<String>,
    }

    impl MockRuleStore {
        fn new(rules: Vec<AutoModRule>) -> Self {
            let map = DashMap::new();
            for rule in rules {
                map.insert(rule.id, rule);
            }
            Self {
                rules: map,
                replace_calls: AtomicUsize::new(0),
                submitted: std::sync::Mutex::new(Vec::new()),
                reject_with: None,
            }
        }

        fn rejecting(rules: Vec<AutoModRule>, message: &str) -> Self {
            let mut store = Self::new(rules);
            store.reject_with = Some(message.to_string());
            store
        }

        fn replace_count(&self) -> usize {
            self.replace_calls.load(Ordering::SeqCst)
        }

        fn last_submitted(&self) -> RuleTrigger {
            self.submitted.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl RuleStore for MockRuleStore {
        async fn fetch_rules(&self, _guild_id: u64) -> Result<Vec<AutoModRule>, AutoModError> {
            let mut rules: Vec<AutoModRule> =
                self.rules.iter().map(|r| r.value().clone()).collect();
            rules.sort_by_key(|r| r.id);
            Ok(rules)
        }

        async fn fetch_rule(
            &self,
            _guild_id: u64,
            rule_id: u64,
        ) -> Result<AutoModRule, AutoModError> {
            self.rules
                .get(&rule_id)
                .map(|r| r.clone())
                .ok_or(AutoModError::RuleNotFound(rule_id))
        }

        async fn replace_trigger(
            &self,
            _guild_id: u64,
            rule_id: u64,
            trigger: RuleTrigger,
        ) -> Result<(), AutoModError> {
            self.replace_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(message) = &self.reject_with {
                return Err(AutoModError::RemoteRejected(message.clone()));
            }
            self.submitted.lock().unwrap().push(trigger.clone());
            match self.rules.get_mut(&rule_id) {
                Some(mut rule) => {
                    rule.trigger = trigger;
                    Ok(())
                }
                None => Err(AutoModError::RuleNotFound(rule_id)),
            }
        }
    }

    fn keyword_rule(id: u64, name: &str, keywords: &[&str]) -> AutoModRule {
        AutoModRule {
            id,
            guild_id: 99,
            name: name.to_string(),
            trigger: RuleTrigger::Keyword(KeywordFilter {
                keywords: keywords.iter().map(|k| k.to_string()).collect(),
                regex_patterns: Vec::new(),
                allow_list: Vec::new(),
            }),
        }
    }

    fn spam_rule(id: u64, name: &str) -> AutoModRule {
        AutoModRule {
            id,
            guild_id: 99,
            name: name.to_string(),
            trigger: RuleTrigger::Spam,
        }
    }

    #[tokio::test]
    async fn test_add_appends_and_submits_whole_trigger() {
        let rule = keyword_rule(1, "Scams", &["free", "money"]);
        let store = MockRuleStore::new(vec![rule.clone()]);
        let service = AutoModService::new(store);

        let confirmation = service.add_entry(&rule, "prize", false).await.unwrap();
        assert_eq!(confirmation.rule_name, "Scams");
        assert_eq!(confirmation.entry, "prize");
        assert_eq!(confirmation.kind, EntryKind::Keyword);

        match service.store.last_submitted() {
            RuleTrigger::Keyword(filter) => {
                assert_eq!(filter.keywords, vec!["free", "money", "prize"]);
            }
            other => panic!("expected keyword trigger, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_add_then_remove_restores_original_list() {
        let rule = keyword_rule(1, "Scams", &["free", "money"]);
        let store = MockRuleStore::new(vec![rule.clone()]);
        let service = AutoModService::new(store);

        service.add_entry(&rule, "prize", false).await.unwrap();
        let updated = service.rule(99, 1).await.unwrap();
        service.remove_entry(&updated, "prize", false).await.unwrap();

        let restored = service.rule(99, 1).await.unwrap();
        assert_eq!(restored.trigger, rule.trigger);
    }

    #[tokio::test]
    async fn test_remove_deletes_in_place_preserving_order() {
        let rule = keyword_rule(1, "Scams", &["free", "money", "prize"]);
        let store = MockRuleStore::new(vec![rule.clone()]);
        let service = AutoModService::new(store);

        service.remove_entry(&rule, "money", false).await.unwrap();
        match service.store.last_submitted() {
            RuleTrigger::Keyword(filter) => {
                assert_eq!(filter.keywords, vec!["free", "prize"]);
            }
            other => panic!("expected keyword trigger, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_duplicate_add_never_calls_store() {
        let rule = keyword_rule(1, "Scams", &["free"]);
        let store = MockRuleStore::new(vec![rule.clone()]);
        let service = AutoModService::new(store);

        let err = service.add_entry(&rule, "free", false).await.unwrap_err();
        assert!(matches!(err, AutoModError::DuplicateEntry(_)));
        assert_eq!(service.store.replace_count(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_check_is_case_sensitive() {
        let rule = keyword_rule(1, "Scams", &["free"]);
        let store = MockRuleStore::new(vec![rule.clone()]);
        let service = AutoModService::new(store);

        // "Free" != "free", so this is a legitimate add.
        service.add_entry(&rule, "Free", false).await.unwrap();
        assert_eq!(service.store.replace_count(), 1);
    }

    #[tokio::test]
    async fn test_regex_flag_targets_regex_list() {
        let rule = keyword_rule(1, "Scams", &["free"]);
        let store = MockRuleStore::new(vec![rule.clone()]);
        let service = AutoModService::new(store);

        // "free" exists as a literal keyword, not as a pattern.
        service.add_entry(&rule, "free", true).await.unwrap();
        match service.store.last_submitted() {
            RuleTrigger::Keyword(filter) => {
                assert_eq!(filter.keywords, vec!["free"]);
                assert_eq!(filter.regex_patterns, vec!["free"]);
            }
            other => panic!("expected keyword trigger, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_remove_absent_entry_fails_without_store_call() {
        let rule = keyword_rule(1, "Scams", &["free"]);
        let store = MockRuleStore::new(vec![rule.clone()]);
        let service = AutoModService::new(store);

        let err = service.remove_entry(&rule, "money", false).await.unwrap_err();
        assert!(matches!(err, AutoModError::EntryNotFound(_)));
        assert_eq!(service.store.replace_count(), 0);
    }

    #[tokio::test]
    async fn test_non_keyword_rule_rejected_for_any_edit() {
        let rule = spam_rule(2, "Spam");
        let store = MockRuleStore::new(vec![rule.clone()]);
        let service = AutoModService::new(store);

        for is_regex in [false, true] {
            let err = service.add_entry(&rule, "x", is_regex).await.unwrap_err();
            assert!(matches!(err, AutoModError::WrongTriggerType));
            let err = service.remove_entry(&rule, "x", is_regex).await.unwrap_err();
            assert!(matches!(err, AutoModError::WrongTriggerType));
        }
        assert_eq!(service.store.replace_count(), 0);
    }

    #[tokio::test]
    async fn test_remote_rejection_leaves_rule_untouched() {
        let rule = keyword_rule(1, "Scams", &["free"]);
        let store = MockRuleStore::rejecting(vec![rule.clone()], "invalid regex");
        let service = AutoModService::new(store);

        let err = service.add_entry(&rule, "prize", false).await.unwrap_err();
        match err {
            AutoModError::RemoteRejected(message) => assert_eq!(message, "invalid regex"),
            other => panic!("expected RemoteRejected, got {:?}", other),
        }
        assert_eq!(service.rule(99, 1).await.unwrap(), rule);
    }

    #[tokio::test]
    async fn test_allow_list_survives_edits_unchanged() {
        let mut rule = keyword_rule(1, "Scams", &["free"]);
        if let RuleTrigger::Keyword(filter) = &mut rule.trigger {
            filter.allow_list = vec!["free speech".to_string()];
        }
        let store = MockRuleStore::new(vec![rule.clone()]);
        let service = AutoModService::new(store);

        service.add_entry(&rule, "prize", false).await.unwrap();
        match service.store.last_submitted() {
            RuleTrigger::Keyword(filter) => {
                assert_eq!(filter.allow_list, vec!["free speech"]);
            }
            other => panic!("expected keyword trigger, got {:?}", other),
        }
    }

    #[test]
    fn test_search_counts_literal_keywords_only() {
        let mut scams = keyword_rule(1, "Scams", &["win", "prize"]);
        if let RuleTrigger::Keyword(filter) = &mut scams.trigger {
            // A pattern containing "i" which must not be counted.
            filter.regex_patterns = vec!["fr[e3]e\\s+gift".to_string()];
        }
        let spam = keyword_rule(2, "Spam", &["buy"]);
        let rules = vec![scams, spam];

        let report = search_keyword(&rules, "i").unwrap();
        assert_eq!(report.total, 2);
        assert_eq!(report.matches.len(), 1);
        assert_eq!(report.matches[0].rule_name, "Scams");
        assert_eq!(
            report.matches[0].descriptions,
            vec!["win contains i", "prize contains i"]
        );
    }

    #[test]
    fn test_search_empty_query_matches_every_keyword() {
        let rules = vec![
            keyword_rule(1, "Scams", &["win", "prize"]),
            keyword_rule(2, "Spam", &["buy"]),
            spam_rule(3, "Raids"),
        ];

        let report = search_keyword(&rules, "").unwrap();
        assert_eq!(report.total, 3);
        assert_eq!(report.matches.len(), 2);
    }

    #[test]
    fn test_search_reports_all_matching_rules() {
        let rules = vec![
            keyword_rule(1, "Scams", &["buyout"]),
            keyword_rule(2, "Spam", &["buy"]),
        ];

        let report = search_keyword(&rules, "buy").unwrap();
        assert_eq!(report.total, 2);
        let names: Vec<&str> = report
            .matches
            .iter()
            .map(|m| m.rule_name.as_str())
            .collect();
        assert_eq!(names, vec!["Scams", "Spam"]);
        assert!(report.to_text().contains("Rule Scams:"));
        assert!(report.to_text().contains("Rule Spam:"));
    }

    #[test]
    fn test_search_without_matches_is_distinguished() {
        let rules = vec![keyword_rule(1, "Scams", &["win"])];
        assert!(search_keyword(&rules, "zzz").is_none());
    }

    #[test]
    fn test_search_skips_non_keyword_rules() {
        let rules = vec![spam_rule(1, "Raids")];
        assert!(search_keyword(&rules, "").is_none());
    }

    #[test]
    fn test_suggestions_contain_partial_and_keep_store_order() {
        let rules = vec![
            keyword_rule(1, "Scams", &[]),
            spam_rule(2, "Scary raids"),
            keyword_rule(3, "Spam links", &[]),
            keyword_rule(4, "Slurs", &[]),
        ];

        let suggestions = suggest_rules(&rules, "S");
        let names: Vec<&str> = suggestions.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Scams", "Spam links", "Slurs"]);
        assert!(suggestions.iter().all(|s| s.name.contains('S')));

        // Case-sensitive: lowercase partial matches none of these names.
        assert!(suggest_rules(&rules, "sc").is_empty());
    }

    #[test]
    fn test_suggestions_empty_partial_returns_all_keyword_rules() {
        let rules = vec![
            keyword_rule(1, "Scams", &[]),
            spam_rule(2, "Raids"),
            keyword_rule(3, "Spam links", &[]),
        ];

        let suggestions = suggest_rules(&rules, "");
        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[0].id, 1);
        assert_eq!(suggestions[1].id, 3);
    }

    #[test]
    fn test_suggestions_truncated_to_platform_limit() {
        let rules: Vec<AutoModRule> = (0..40)
            .map(|i| keyword_rule(i, &format!("Rule {i}"), &[]))
            .collect();
        assert_eq!(suggest_rules(&rules, "").len(), MAX_SUGGESTIONS);
    }
}
