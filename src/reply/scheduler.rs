//! 回复调度器：把「决定回复」与「回复可见」解耦
//!
//! 每条待发送回复独立计时，延迟从交给调度器的时刻起算，到期后以 System 身份追加到日志。
//! 多条回复并发时各自到期各自提交，不保证与分派顺序一致。
//! 重置策略：Cancel 时回复绑定分派时的日志代数，clear() 之后到期的旧回复被丢弃；
//! Deliver 时照常追加（清空后的日志会出现一条 id 为 1 的孤立回复）。

use std::time::Duration;

use serde::Deserialize;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use crate::chat::{Message, MessageLog, Reply, Sender};

/// clear() 对在途回复的处理方式
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetPolicy {
    /// 丢弃 clear() 之前分派的回复
    #[default]
    Cancel,
    /// 照常提交
    Deliver,
}

/// 某条回复所属的日志代数及其取消令牌
#[derive(Clone, Debug)]
pub struct ReplyTicket {
    pub generation: u64,
    pub token: CancellationToken,
}

impl ReplyTicket {
    /// 以日志当前代数开票（分派开始时调用）
    pub fn issue(log: &MessageLog) -> Self {
        let (generation, token) = log.reset_token();
        Self { generation, token }
    }

    /// 为指定代数开票；该代已结束时返回 None
    pub fn for_generation(log: &MessageLog, generation: u64) -> Option<Self> {
        log.token_for(generation)
            .map(|token| Self { generation, token })
    }
}

#[derive(Clone)]
pub struct ReplyScheduler {
    log: MessageLog,
    delay: Duration,
    policy: ResetPolicy,
}

impl ReplyScheduler {
    pub fn new(log: MessageLog, delay: Duration, policy: ResetPolicy) -> Self {
        Self { log, delay, policy }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn policy(&self) -> ResetPolicy {
        self.policy
    }

    /// 延迟到期后提交；返回的任务结果为实际追加的消息（被丢弃时为 None）
    pub fn schedule(&self, reply: Reply, ticket: ReplyTicket) -> JoinHandle<Option<Message>> {
        let scheduler = self.clone();
        let deadline = Instant::now() + self.delay;
        tokio::spawn(async move { scheduler.commit_at(deadline, reply, ticket).await })
    }

    async fn commit_at(&self, deadline: Instant, reply: Reply, ticket: ReplyTicket) -> Option<Message> {
        match self.policy {
            ResetPolicy::Cancel => {
                tokio::select! {
                    _ = sleep_until(deadline) => {}
                    _ = ticket.token.cancelled() => {
                        tracing::debug!(generation = ticket.generation, "pending reply dropped after reset");
                        return None;
                    }
                }
                let committed = self
                    .log
                    .append_in_generation(ticket.generation, Sender::System, reply);
                if committed.is_none() {
                    tracing::debug!(generation = ticket.generation, "pending reply dropped after reset");
                }
                committed
            }
            ResetPolicy::Deliver => {
                sleep_until(deadline).await;
                Some(self.log.append(Sender::System, reply))
            }
        }
    }
}
