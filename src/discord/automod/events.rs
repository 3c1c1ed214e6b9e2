// Gateway adapter for AutoMod action executions.
//
// Translates the serenity payload into the core event type and hands it to
// the reactor. Reactor errors are resolved here, at the event boundary.

use crate::core::automod::AutoModEvent;
use crate::discord::{Data, Error};
use serenity::model::guild::automod::ActionExecution;

pub async fn handle_automod_action(data: &Data, execution: &ActionExecution) -> Result<(), Error> {
    let event = AutoModEvent {
        guild_id: execution.guild_id.get(),
        rule_id: execution.rule_id.get(),
        member_id: Some(execution.user_id.get()),
    };

    data.reactor
        .on_action(event)
        .await
        .map_err(|e| Error::from(e.to_string()))
}
