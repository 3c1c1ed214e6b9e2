// Discord commands for AutoMod keyword management.
//
// **Notice the pattern:**
// 1. Extract primitive data from Discord types
// 2. Call core service
// 3. Format the response based on the result
//
// This layer is THIN - no business logic, just translation.

use crate::core::automod::{
    self, ActionReactor, AutoModError, AutoModRule, AutoModService, EntryKind,
};
use crate::infra::automod::{DiscordModerationActuator, DiscordRuleStore, InMemoryActionLog};
use poise::serenity_prelude as serenity;
use std::sync::Arc;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Data that's shared across all commands.
/// This is where we store our services and configuration.
pub struct Data {
    pub automod: Arc<AutoModService<DiscordRuleStore>>,
    pub reactor:
        Arc<ActionReactor<DiscordRuleStore, DiscordModerationActuator, Arc<InMemoryActionLog>>>,
}

/// Commands to manage AutoMod.
#[poise::command(
    slash_command,
    subcommands("search_keyword", "add_keyword", "delete_keyword"),
    default_member_permissions = "BAN_MEMBERS",
    guild_only
)]
pub async fn automod(_ctx: Context<'_>) -> Result<(), Error> {
    // Parent command - subcommands only
    Ok(())
}

/// Search for a word in the AutoMod rules.
#[poise::command(slash_command, guild_only)]
pub async fn search_keyword(
    ctx: Context<'_>,
    #[description = "Word to search for in the keyword filters"] word: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    let rules = ctx
        .data()
        .automod
        .rules(guild_id.get())
        .await
        .map_err(|e| Error::from(e.to_string()))?;

    match automod::search_keyword(&rules, &word) {
        None => {
            ctx.say("No match found.").await?;
        }
        Some(report) => {
            // The full match list goes into an attachment so long filters
            // don't blow the message length limit.
            let attachment =
                serenity::CreateAttachment::bytes(report.to_text().into_bytes(), "matches.txt");
            ctx.send(
                poise::CreateReply::default()
                    .content(format!("{} matches found.", report.total))
                    .attachment(attachment),
            )
            .await?;
        }
    }
    Ok(())
}

/// Add a keyword to an AutoMod rule.
#[poise::command(slash_command, guild_only)]
pub async fn add_keyword(
    ctx: Context<'_>,
    #[description = "AutoMod rule to add the keyword to, use autocomplete for this"]
    #[autocomplete = "autocomplete_rule"]
    rule: String,
    #[description = "Keyword to add to the AutoMod rule"] keyword: String,
    #[description = "If the keyword is a regex expression"] regex: Option<bool>,
) -> Result<(), Error> {
    let is_regex = regex.unwrap_or(false);

    let rule = match resolve_rule(ctx, &rule).await? {
        Some(rule) => rule,
        None => return Ok(()),
    };

    match ctx.data().automod.add_entry(&rule, &keyword, is_regex).await {
        Ok(confirmation) => {
            reply_ephemeral(
                ctx,
                format!(
                    "Added {} {} to {} AutoMod rule successfully.",
                    confirmation.kind, confirmation.entry, confirmation.rule_name
                ),
            )
            .await
        }
        Err(err) => reply_ephemeral(ctx, edit_failure_message("add", is_regex, &err)).await,
    }
}

/// Delete a keyword from an AutoMod rule.
#[poise::command(slash_command, guild_only)]
pub async fn delete_keyword(
    ctx: Context<'_>,
    #[description = "AutoMod rule to remove the keyword from, use autocomplete for this"]
    #[autocomplete = "autocomplete_rule"]
    rule: String,
    #[description = "Keyword to remove from the AutoMod rule"] keyword: String,
    #[description = "If the keyword is a regex expression"] regex: Option<bool>,
) -> Result<(), Error> {
    let is_regex = regex.unwrap_or(false);

    let rule = match resolve_rule(ctx, &rule).await? {
        Some(rule) => rule,
        None => return Ok(()),
    };

    match ctx
        .data()
        .automod
        .remove_entry(&rule, &keyword, is_regex)
        .await
    {
        Ok(confirmation) => {
            reply_ephemeral(
                ctx,
                format!(
                    "Deleted {} {} from {} AutoMod rule successfully.",
                    confirmation.kind, confirmation.entry, confirmation.rule_name
                ),
            )
            .await
        }
        Err(err) => reply_ephemeral(ctx, edit_failure_message("delete", is_regex, &err)).await,
    }
}

/// Autocomplete provider for rule parameters.
///
/// Suggests keyword-typed rules by name; the choice value is the rule id.
async fn autocomplete_rule<'a>(
    ctx: Context<'_>,
    partial: &'a str,
) -> impl Iterator<Item = serenity::AutocompleteChoice> + 'a {
    let rules = match ctx.guild_id() {
        Some(guild_id) => ctx
            .data()
            .automod
            .rules(guild_id.get())
            .await
            .unwrap_or_default(),
        None => Vec::new(),
    };

    automod::suggest_rules(&rules, partial)
        .into_iter()
        .map(|suggestion| {
            serenity::AutocompleteChoice::new(suggestion.name, suggestion.id.to_string())
        })
        .collect::<Vec<_>>()
        .into_iter()
}

/// Turn an autocomplete value back into a rule snapshot.
///
/// A stale id, an unparsable value, or a deleted rule all report the same
/// lookup failure to the caller. Returns `Ok(None)` after replying.
async fn resolve_rule(ctx: Context<'_>, value: &str) -> Result<Option<AutoModRule>, Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;

    let rule_id = match value.parse::<u64>() {
        Ok(id) => id,
        Err(_) => {
            reply_ephemeral(ctx, "AutoMod rule not found.".to_string()).await?;
            return Ok(None);
        }
    };

    match ctx.data().automod.rule(guild_id.get(), rule_id).await {
        Ok(rule) => Ok(Some(rule)),
        Err(AutoModError::RuleNotFound(_)) => {
            reply_ephemeral(ctx, "AutoMod rule not found.".to_string()).await?;
            Ok(None)
        }
        Err(err) => Err(Error::from(err.to_string())),
    }
}

fn edit_failure_message(action: &str, is_regex: bool, err: &AutoModError) -> String {
    let kind = EntryKind::from_regex_flag(is_regex);
    match err {
        AutoModError::WrongTriggerType => {
            "This AutoMod rule doesn't have a keyword filter.".to_string()
        }
        AutoModError::DuplicateEntry(_) => format!("This {kind} is already in the filter."),
        AutoModError::EntryNotFound(_) => format!("This {kind} is not in the filter."),
        other => format!("Failed to {action} keyword: {other}."),
    }
}

async fn reply_ephemeral(ctx: Context<'_>, content: String) -> Result<(), Error> {
    ctx.send(
        poise::CreateReply::default()
            .content(content)
            .ephemeral(true),
    )
    .await?;
    Ok(())
}
