// Reactor for fired AutoMod actions.
//
// Stateless per event: resolve the firing rule, and if it is the one
// designated rule, tag the process-wide action log and kick the member.
// Everything else is dropped silently.

use super::automod_models::AutoModEvent;
use super::automod_service::{AutoModError, RuleStore};
use async_trait::async_trait;

/// Audit reason attached to every reactor-initiated kick.
pub const KICK_REASON: &str = "Suspicious behavior";

/// Default rule name the reactor kicks on, overridable via config.
pub const DEFAULT_WATCHED_RULE: &str = "Scams";

// ============================================================================
// PORTS
// ============================================================================

/// Ability to remove a member from a guild.
#[async_trait]
pub trait ModerationActuator: Send + Sync {
    async fn kick(&self, guild_id: u64, member_id: u64, reason: &str)
        -> Result<(), AutoModError>;
}

/// Process-wide append-only log of moderation actions.
///
/// Appends must be safe under concurrent events; the format of a tag is
/// opaque to consumers (the reactor writes `"wk:<memberId>"`).
pub trait ActionLog: Send + Sync {
    fn append(&self, tag: String);
}

impl<L: ActionLog> ActionLog for std::sync::Arc<L> {
    fn append(&self, tag: String) {
        (**self).append(tag)
    }
}

// ============================================================================
// REACTOR
// ============================================================================

/// Reacts to AutoMod action executions.
///
/// Constructed once at startup with its dependencies injected; holds no
/// mutable state of its own, so events can be handled concurrently.
pub struct ActionReactor<S: RuleStore, A: ModerationActuator, L: ActionLog> {
    store: S,
    actuator: A,
    log: L,
    watched_rule: String,
}

impl<S: RuleStore, A: ModerationActuator, L: ActionLog> ActionReactor<S, A, L> {
    pub fn new(store: S, actuator: A, log: L, watched_rule: String) -> Self {
        Self {
            store,
            actuator,
            log,
            watched_rule,
        }
    }

    /// Handle one fired action.
    ///
    /// An unresolvable member or rule is a silent drop, as is any rule other
    /// than the watched one. A matching rule appends a `wk:` tag to the
    /// action log and then kicks; an actuator failure is surfaced to the
    /// event boundary for logging and is not retried.
    pub async fn on_action(&self, event: AutoModEvent) -> Result<(), AutoModError> {
        let member_id = match event.member_id {
            Some(id) => id,
            None => return Ok(()),
        };

        let rule = match self.store.fetch_rule(event.guild_id, event.rule_id).await {
            Ok(rule) => rule,
            Err(AutoModError::RuleNotFound(_)) => return Ok(()),
            Err(e) => return Err(e),
        };

        if rule.name != self.watched_rule {
            return Ok(());
        }

        tracing::info!(
            guild_id = event.guild_id,
            member_id,
            rule = %rule.name,
            "Watched AutoMod rule fired, kicking member"
        );
        self.log.append(format!("wk:{member_id}"));
        self.actuator.kick(event.guild_id, member_id, KICK_REASON).await
    }
}

// ============================================================================
// TESTS
// ============================================================================
