//! 消息日志：只追加、有序，会话内唯一的可变共享状态
//!
//! id 分配与追加在同一临界区内完成，调用方不会基于旧快照计算 id。
//! 每次变更（追加 / 清空）都会按发生顺序通知所有订阅者。
//! clear() 使「重置代数」加一并取消上一代的 CancellationToken，供调度器丢弃过期回复。

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::message::{Message, Reply, Sender};

/// 日志变更事件
#[derive(Clone, Debug)]
pub enum LogEvent {
    Appended { message: Message, generation: u64 },
    Cleared { generation: u64 },
}

struct LogInner {
    messages: Vec<Message>,
    generation: u64,
    reset_token: CancellationToken,
    listeners: Vec<mpsc::UnboundedSender<LogEvent>>,
}

impl LogInner {
    fn notify(&mut self, event: LogEvent) {
        self.listeners.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn push(&mut self, sender: Sender, reply: Reply) -> Message {
        let message = Message::new(self.messages.len() as u64 + 1, sender, reply);
        self.messages.push(message.clone());
        let generation = self.generation;
        self.notify(LogEvent::Appended {
            message: message.clone(),
            generation,
        });
        message
    }
}

/// 消息日志句柄（可克隆，共享同一份数据）
#[derive(Clone)]
pub struct MessageLog {
    inner: Arc<Mutex<LogInner>>,
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageLog {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(LogInner {
                messages: Vec::new(),
                generation: 0,
                reset_token: CancellationToken::new(),
                listeners: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LogInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// 订阅变更事件；接收端丢弃后自动注销
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<LogEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().listeners.push(tx);
        rx
    }

    /// 追加一条消息，返回带 id 与时间戳的副本
    pub fn append(&self, sender: Sender, reply: Reply) -> Message {
        self.lock().push(sender, reply)
    }

    /// 仅当当前代数仍为 generation 时追加；期间发生过 clear() 则返回 None
    pub fn append_in_generation(
        &self,
        generation: u64,
        sender: Sender,
        reply: Reply,
    ) -> Option<Message> {
        let mut inner = self.lock();
        if inner.generation != generation {
            return None;
        }
        Some(inner.push(sender, reply))
    }

    /// 清空日志并开始新的一代，返回新代数
    pub fn clear(&self) -> u64 {
        let mut inner = self.lock();
        inner.messages.clear();
        inner.generation += 1;
        let old = std::mem::replace(&mut inner.reset_token, CancellationToken::new());
        old.cancel();
        let generation = inner.generation;
        inner.notify(LogEvent::Cleared { generation });
        generation
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// 当前代数及其取消令牌（下一次 clear() 时被取消）
    pub fn reset_token(&self) -> (u64, CancellationToken) {
        let inner = self.lock();
        (inner.generation, inner.reset_token.clone())
    }

    /// 指定代数的取消令牌；该代已被 clear() 结束时返回 None
    pub fn token_for(&self, generation: u64) -> Option<CancellationToken> {
        let inner = self.lock();
        (inner.generation == generation).then(|| inner.reset_token.clone())
    }

    pub fn snapshot(&self) -> Vec<Message> {
        self.lock().messages.clone()
    }

    pub fn last(&self) -> Option<Message> {
        self.lock().messages.last().cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().messages.is_empty()
    }
}
