pub mod actions;
pub mod aggregate;
pub mod canonical;
pub mod common;
pub mod custom_actions;
pub mod duplicates;
pub mod favicons;
pub mod filter;
pub mod hosts;
pub mod keys;
pub mod launcher;
pub mod logging;
pub mod selection;
pub mod settings;
pub mod snapshot;
pub mod sources;
pub mod store;
