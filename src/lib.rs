//! Hibiki - Rust 规则式对话引擎
//!
//! 模块划分：
//! - **chat**: 消息模型、只追加的消息日志、反应式对话循环
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型、状态投影、编排器（命令通道 + 状态通道）
//! - **lookup**: 外部数据源适配器（天气 / 百科 / 狗 / 猫）与注册表
//! - **observability**: tracing 日志初始化
//! - **reply**: 触发表、分派器、格式化器、延迟提交调度器
//! - **ui**: Ratatui TUI 界面

pub mod chat;
pub mod config;
pub mod core;
pub mod lookup;
pub mod observability;
pub mod reply;
pub mod ui;

pub use chat::{Conversation, Message, MessageLog, Reply, Sender};
pub use reply::{DispatchOutcome, Dispatcher, ReplyScheduler, ResetPolicy, TriggerTable};
