// Core automod module - keyword rule management business logic.

pub mod action_reactor;
pub mod automod_models;
pub mod automod_service;

pub use action_reactor::*;
pub use automod_models::*;
pub use automod_service::*;
