//! 对话层：消息模型（message）、消息日志（log）、反应式对话循环（conversation）

pub mod conversation;
pub mod log;
pub mod message;

pub use conversation::Conversation;
pub use log::{LogEvent, MessageLog};
pub use message::{Message, Reply, Sender};
