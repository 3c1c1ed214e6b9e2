// Discord-backed implementations of the automod ports.
//
// Translates between the core's rule snapshot types and serenity's AutoMod
// payloads. All remote calls go through the shared `Http` client; there is
// no retry, a failed call surfaces immediately.

use crate::core::automod::{
    AutoModError, AutoModRule, KeywordFilter, ModerationActuator, RuleStore, RuleTrigger,
};
use async_trait::async_trait;
use serenity::builder::EditAutoModRule;
use serenity::http::{Http, HttpError};
use serenity::model::guild::automod::{Rule, Trigger};
use serenity::model::id::{GuildId, RuleId, UserId};
use std::sync::Arc;

/// [`RuleStore`] over the guild AutoMod HTTP endpoints.
#[derive(Clone)]
pub struct DiscordRuleStore {
    http: Arc<Http>,
}

impl DiscordRuleStore {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl RuleStore for DiscordRuleStore {
    async fn fetch_rules(&self, guild_id: u64) -> Result<Vec<AutoModRule>, AutoModError> {
        let rules = GuildId::new(guild_id)
            .automod_rules(&self.http)
            .await
            .map_err(|e| AutoModError::StoreError(e.to_string()))?;
        Ok(rules.into_iter().map(map_rule).collect())
    }

    async fn fetch_rule(&self, guild_id: u64, rule_id: u64) -> Result<AutoModRule, AutoModError> {
        GuildId::new(guild_id)
            .automod_rule(&self.http, RuleId::new(rule_id))
            .await
            .map(map_rule)
            .map_err(|e| map_api_error(rule_id, e))
    }

    async fn replace_trigger(
        &self,
        guild_id: u64,
        rule_id: u64,
        trigger: RuleTrigger,
    ) -> Result<(), AutoModError> {
        // Only keyword triggers are ever submitted from the core.
        let trigger = match trigger {
            RuleTrigger::Keyword(filter) => Trigger::Keyword {
                strings: filter.keywords,
                regex_patterns: filter.regex_patterns,
                allow_list: filter.allow_list,
            },
            _ => return Err(AutoModError::WrongTriggerType),
        };

        GuildId::new(guild_id)
            .edit_automod_rule(
                &self.http,
                RuleId::new(rule_id),
                EditAutoModRule::new().trigger(trigger),
            )
            .await
            .map(|_| ())
            .map_err(|e| map_api_error(rule_id, e))
    }
}

/// [`ModerationActuator`] that removes members over the guild HTTP endpoint.
#[derive(Clone)]
pub struct DiscordModerationActuator {
    http: Arc<Http>,
}

impl DiscordModerationActuator {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ModerationActuator for DiscordModerationActuator {
    async fn kick(
        &self,
        guild_id: u64,
        member_id: u64,
        reason: &str,
    ) -> Result<(), AutoModError> {
        GuildId::new(guild_id)
            .kick_with_reason(&self.http, UserId::new(member_id), reason)
            .await
            .map_err(|e| AutoModError::ActuatorError(e.to_string()))
    }
}

fn map_rule(rule: Rule) -> AutoModRule {
    AutoModRule {
        id: rule.id.get(),
        guild_id: rule.guild_id.get(),
        name: rule.name,
        trigger: map_trigger(rule.trigger),
    }
}

fn map_trigger(trigger: Trigger) -> RuleTrigger {
    match trigger {
        Trigger::Keyword {
            strings,
            regex_patterns,
            allow_list,
        } => RuleTrigger::Keyword(KeywordFilter {
            keywords: strings,
            regex_patterns,
            allow_list,
        }),
        Trigger::Spam => RuleTrigger::Spam,
        Trigger::MentionSpam { .. } => RuleTrigger::MentionSpam,
        Trigger::KeywordPreset { .. } => RuleTrigger::KeywordPreset,
        _ => RuleTrigger::Unknown,
    }
}

/// A 404 means the referenced rule is gone; everything else unsuccessful is
/// the store refusing the request, reported with Discord's message verbatim.
fn map_api_error(rule_id: u64, err: serenity::Error) -> AutoModError {
    match &err {
        serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) => {
            if response.status_code.as_u16() == 404 {
                AutoModError::RuleNotFound(rule_id)
            } else {
                AutoModError::RemoteRejected(response.error.message.clone())
            }
        }
        _ => AutoModError::StoreError(err.to_string()),
    }
}
