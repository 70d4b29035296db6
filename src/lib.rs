pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::{CliConfig, Command};

pub use adapters::{GeminiClient, LocalStorage};
pub use config::{Settings, SettingsOverrides};
pub use core::{
    chat::ChatSession,
    chat_store::ChatStore,
    flow::{FlowEngine, FlowOutcome},
    parser::IntentSpecParser,
    pipeline::{IntentPipeline, NarrativeSource},
};
pub use utils::error::{IntentError, Result};
