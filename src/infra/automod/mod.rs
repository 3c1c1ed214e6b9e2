// Infra automod module - Discord-backed implementations of the core ports.

pub mod action_log;
pub mod discord_rule_store;

pub use action_log::*;
pub use discord_rule_store::*;
