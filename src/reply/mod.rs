//! 回复引擎：触发表（trigger）、分派（dispatcher）、格式化（formatter）、延迟提交（scheduler）

pub mod dispatcher;
pub mod formatter;
pub mod scheduler;
pub mod trigger;

pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use formatter::{ForecastDay, Formatter};
pub use scheduler::{ReplyScheduler, ReplyTicket, ResetPolicy};
pub use trigger::{ReplyStrategy, TriggerTable, TriggerTableBuilder};
