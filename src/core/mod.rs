pub mod chat;
pub mod chat_store;
pub mod flow;
pub mod market_structure;
pub mod parser;
pub mod pipeline;
pub mod prompts;
pub mod spec;
pub mod translator;

pub use crate::domain::model::{JgtmlSpec, MarketStructure, ParsedSpecOutput, SpecBundle};
pub use crate::domain::ports::{ConfigProvider, LlmClient, Pipeline, Storage};
pub use crate::utils::error::Result;
