//! 状态投影：UI 只持有轻量的 ChatView（消息快照、在途回复数、最近一次提示）

use serde::Serialize;

use crate::chat::Message;

/// UI 看到的「投影」状态
#[derive(Clone, Debug, Default, Serialize)]
pub struct ChatView {
    pub title: String,
    /// 日志代数，每次 clear() 加一
    pub generation: u64,
    pub messages: Vec<Message>,
    pub pending_replies: usize,
    pub error_message: Option<String>,
}

impl ChatView {
    pub fn is_waiting(&self) -> bool {
        self.pending_replies > 0
    }
}
