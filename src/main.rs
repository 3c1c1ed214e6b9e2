// This is the entry point of the AutoMod manager bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (Discord HTTP, action log)
// - `discord/` = Discord-specific adapters (commands, events)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Register commands and event handlers

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::core::automod::{ActionReactor, AutoModService, DEFAULT_WATCHED_RULE};
use crate::discord::{events, Data, Error};
use crate::infra::automod::{DiscordModerationActuator, DiscordRuleStore, InMemoryActionLog};
use poise::serenity_prelude as serenity;
use std::sync::Arc;

/// Event handler for non-command Discord events.
/// This is where fired AutoMod actions reach the reactor.
async fn event_handler(
    _ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    if let serenity::FullEvent::AutoModActionExecution { execution } = event {
        // Errors stop at this boundary: log and keep consuming events.
        if let Err(e) = events::handle_automod_action(data, execution).await {
            tracing::error!("Error handling automod action: {}", e);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // Get Discord bot token from environment
    let token = std::env::var("DISCORD_TOKEN").expect(
        "Missing DISCORD_TOKEN environment variable! Create a .env file with your bot token.",
    );

    // The rule name whose fired actions get the offender kicked.
    let watched_rule = std::env::var("AUTOMOD_KICK_RULE_NAME")
        .unwrap_or_else(|_| DEFAULT_WATCHED_RULE.to_string());

    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::AUTO_MODERATION_CONFIGURATION
        | serenity::GatewayIntents::AUTO_MODERATION_EXECUTION;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            // Register all our commands here
            commands: vec![discord::commands::automod::automod()],
            // Event handler for AutoMod executions
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;

                // ============================================================
                // DEPENDENCY INJECTION
                // ============================================================
                // This is the "composition root" where we wire everything
                // together. Services share the gateway's HTTP client.

                let http = ctx.http.clone();
                let rule_store = DiscordRuleStore::new(http.clone());
                let actuator = DiscordModerationActuator::new(http);
                let action_log = Arc::new(InMemoryActionLog::new());

                let automod_service = Arc::new(AutoModService::new(rule_store.clone()));
                let reactor = Arc::new(ActionReactor::new(
                    rule_store,
                    actuator,
                    Arc::clone(&action_log),
                    watched_rule,
                ));

                tracing::info!("Commands registered, bot is ready");

                Ok(Data {
                    automod: automod_service,
                    reactor,
                })
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .expect("Error creating client");

    client.start().await.expect("Error running bot");
}
