//! 对话循环
//!
//! 无显式状态，纯反应式：订阅日志，每次有新消息追加就对这条新尾部重新跑一次分派。
//! 系统回复追加后同样会触发检查，但「尾部发送方为 User」这一条件保证不会无限连锁。
//! 每次分派在独立任务中进行，查询与延迟互不阻塞；完成顺序不保证等于分派顺序。

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::chat::{LogEvent, Message, MessageLog, Reply, Sender};
use crate::core::ChatError;
use crate::reply::{DispatchOutcome, Dispatcher, ReplyScheduler, ReplyTicket, ResetPolicy};

pub struct Conversation {
    log: MessageLog,
    dispatcher: Arc<Dispatcher>,
    scheduler: ReplyScheduler,
    /// 查询失败时的提示文本；None 表示静默丢弃
    failure_reply: Option<String>,
    pending: Arc<AtomicUsize>,
    /// 对话循环已停止
    closed: Arc<AtomicBool>,
}

impl Conversation {
    pub fn new(log: MessageLog, dispatcher: Dispatcher, scheduler: ReplyScheduler) -> Self {
        Self {
            log,
            dispatcher: Arc::new(dispatcher),
            scheduler,
            failure_reply: None,
            pending: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_failure_reply(mut self, text: Option<String>) -> Self {
        self.failure_reply = text;
        self
    }

    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// 用户提交：空白输入被拒绝，不产生消息；其余原样追加（不裁剪，触发词精确匹配）
    pub fn submit(&self, text: &str) -> Result<Message, ChatError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ChatError::Closed);
        }
        if text.trim().is_empty() {
            return Err(ChatError::EmptyInput);
        }
        Ok(self.log.append(Sender::User, Reply::text(text)))
    }

    /// 清空日志；在途回复按重置策略处理
    pub fn clear(&self) -> u64 {
        let generation = self.log.clear();
        tracing::info!(generation, "conversation cleared");
        generation
    }

    /// 已分派、尚未提交或丢弃的回复数
    pub fn pending_replies(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// 启动对话循环；订阅在返回前完成，之后的每次追加都会被看到
    pub fn spawn(self: &Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        let mut events = self.log.subscribe();
        tracing::info!(
            triggers = self.dispatcher.table().len(),
            delay_ms = self.scheduler.delay().as_millis() as u64,
            policy = ?self.scheduler.policy(),
            "conversation loop started"
        );
        let conversation = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    event = events.recv() => match event {
                        Some(LogEvent::Appended { message, generation }) => {
                            conversation.on_append(message, generation);
                        }
                        Some(LogEvent::Cleared { generation }) => {
                            tracing::debug!(generation, "log cleared");
                        }
                        None => break,
                    },
                }
            }
            conversation.closed.store(true, Ordering::SeqCst);
            tracing::debug!("conversation loop stopped");
        })
    }

    fn on_append(&self, tail: Message, generation: u64) {
        if self.dispatcher.strategy_for(&tail).is_none() {
            if tail.is_user() {
                tracing::debug!(id = tail.id, "no trigger for user message");
            }
            return;
        }

        let ticket = match ReplyTicket::for_generation(&self.log, generation) {
            Some(ticket) => ticket,
            None if self.scheduler.policy() == ResetPolicy::Deliver => ReplyTicket::issue(&self.log),
            None => {
                tracing::debug!(id = tail.id, generation, "message cleared before dispatch");
                return;
            }
        };

        let dispatcher = Arc::clone(&self.dispatcher);
        let scheduler = self.scheduler.clone();
        let failure_reply = self.failure_reply.clone();
        let pending = Arc::clone(&self.pending);
        pending.fetch_add(1, Ordering::SeqCst);

        tokio::spawn(async move {
            // Cancel 策略下 clear() 同时中止进行中的查询
            let outcome = match scheduler.policy() {
                ResetPolicy::Cancel => tokio::select! {
                    outcome = dispatcher.dispatch(&tail) => Some(outcome),
                    _ = ticket.token.cancelled() => None,
                },
                ResetPolicy::Deliver => Some(dispatcher.dispatch(&tail).await),
            };
            let Some(outcome) = outcome else {
                tracing::debug!(id = tail.id, generation = ticket.generation, "dispatch abandoned after reset");
                pending.fetch_sub(1, Ordering::SeqCst);
                return;
            };
            let reply = match outcome {
                DispatchOutcome::Reply(reply) => Some(reply),
                DispatchOutcome::LookupFailed { .. } => failure_reply.map(Reply::text),
                DispatchOutcome::NoMatch => None,
            };
            if let Some(reply) = reply {
                match scheduler.schedule(reply, ticket).await {
                    Ok(Some(message)) => {
                        tracing::info!(id = message.id, reply_to = tail.id, "reply committed");
                    }
                    Ok(None) => {}
                    Err(e) => tracing::warn!(error = %e, "reply task failed"),
                }
            }
            pending.fetch_sub(1, Ordering::SeqCst);
        });
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::lookup::AdapterRegistry;
    use crate::reply::trigger::GOOD_NIGHT_REPLY;
    use crate::reply::TriggerTable;

    fn conversation(policy: ResetPolicy) -> Arc<Conversation> {
        let log = MessageLog::new();
        let dispatcher = Dispatcher::new(
            TriggerTable::defaults(130010).build().unwrap(),
            AdapterRegistry::default(),
        )
        .with_rng(StdRng::seed_from_u64(1));
        let scheduler = ReplyScheduler::new(log.clone(), Duration::from_secs(1), policy);
        Arc::new(Conversation::new(log, dispatcher, scheduler))
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_input_rejected() {
        let chat = conversation(ResetPolicy::Cancel);
        assert_eq!(chat.submit("").unwrap_err(), ChatError::EmptyInput);
        assert_eq!(chat.submit(" \t　\n").unwrap_err(), ChatError::EmptyInput);
        assert!(chat.log().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reply_arrives_after_delay() {
        let chat = conversation(ResetPolicy::Cancel);
        let _loop = chat.spawn(CancellationToken::new());

        let user = chat.submit("おやすみ").unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(chat.log().len(), 1);
        assert_eq!(chat.pending_replies(), 1);

        tokio::time::sleep(Duration::from_millis(600)).await;
        let messages = chat.log().snapshot();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].sender, Sender::System);
        assert_eq!(messages[1].primary_text, GOOD_NIGHT_REPLY);
        assert!(messages[1].captured_at >= user.captured_at + Duration::from_secs(1));
        assert_eq!(chat.pending_replies(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_on_shutdown() {
        let chat = conversation(ResetPolicy::Cancel);
        let shutdown = CancellationToken::new();
        let handle = chat.spawn(shutdown.clone());
        shutdown.cancel();
        handle.await.unwrap();

        assert_eq!(chat.submit("おやすみ").unwrap_err(), ChatError::Closed);
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(chat.log().is_empty());
    }
}
