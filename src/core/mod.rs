//! 核心编排层：错误类型、状态投影、主控循环

pub mod error;
pub mod orchestrator;
pub mod state;

pub use error::{ChatError, LookupError, TriggerError};
pub use orchestrator::{build_conversation, build_registry, create_chat, Command};
pub use state::ChatView;
