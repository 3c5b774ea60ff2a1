//! 回复分派器
//!
//! 只看日志最后一条：发送方为 User 时才用其主文本精确查表。
//! 未匹配 → NoMatch（静默，不算错误）；StaticText / RandomText 立即得到回复；
//! Lookup 先调用适配器，再交给绑定的格式化器，任一步失败都归为 LookupFailed。

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};

use crate::chat::{Message, Reply};
use crate::core::LookupError;
use crate::lookup::{AdapterId, AdapterRegistry};
use crate::reply::trigger::{ReplyStrategy, TriggerTable};

/// 一次分派的结果
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    NoMatch,
    Reply(Reply),
    LookupFailed { adapter: AdapterId, error: LookupError },
}

pub struct Dispatcher {
    table: TriggerTable,
    adapters: AdapterRegistry,
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl Dispatcher {
    pub fn new(table: TriggerTable, adapters: AdapterRegistry) -> Self {
        Self {
            table,
            adapters,
            rng: Mutex::new(Box::new(StdRng::from_entropy())),
        }
    }

    /// 替换随机源（测试中用固定种子）
    pub fn with_rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        self.rng = Mutex::new(Box::new(rng));
        self
    }

    pub fn table(&self) -> &TriggerTable {
        &self.table
    }

    /// 纯匹配：tail 不是用户消息或未命中时返回 None
    pub fn strategy_for(&self, tail: &Message) -> Option<&ReplyStrategy> {
        if !tail.is_user() {
            return None;
        }
        self.table.get(&tail.primary_text)
    }

    pub async fn dispatch(&self, tail: &Message) -> DispatchOutcome {
        let Some(strategy) = self.strategy_for(tail) else {
            tracing::debug!(id = tail.id, sender = %tail.sender, "no trigger matched");
            return DispatchOutcome::NoMatch;
        };
        tracing::info!(id = tail.id, phrase = %tail.primary_text, "trigger matched");

        match strategy {
            ReplyStrategy::StaticText(text) => DispatchOutcome::Reply(Reply::text(text.clone())),
            ReplyStrategy::RandomText(candidates) => match self.choose(candidates) {
                Some(text) => DispatchOutcome::Reply(Reply::text(text)),
                None => DispatchOutcome::NoMatch,
            },
            ReplyStrategy::Lookup { request, formatter } => {
                let adapter = request.adapter();
                let result = self
                    .adapters
                    .fetch(request)
                    .await
                    .and_then(|response| formatter.apply(&response));
                match result {
                    Ok(reply) => DispatchOutcome::Reply(reply),
                    Err(error) => {
                        tracing::warn!(adapter = %adapter, error = %error, "lookup failed");
                        DispatchOutcome::LookupFailed { adapter, error }
                    }
                }
            }
        }
    }

    fn choose(&self, candidates: &[String]) -> Option<String> {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        candidates.choose(&mut **rng).cloned()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::chat::{MessageLog, Sender};
    use crate::lookup::{CatImage, LookupRequest, LookupResponse, StaticAdapter};
    use crate::reply::formatter::{Formatter, CAT_REPLY};
    use crate::reply::trigger::{GOOD_MORNING_REPLY, TODAY_FORTUNES};

    fn user(log: &MessageLog, text: &str) -> Message {
        log.append(Sender::User, Reply::text(text))
    }

    fn dispatcher(adapters: AdapterRegistry) -> Dispatcher {
        Dispatcher::new(TriggerTable::defaults(130010).build().unwrap(), adapters)
            .with_rng(StdRng::seed_from_u64(7))
    }

    #[tokio::test]
    async fn test_static_reply() {
        let log = MessageLog::new();
        let d = dispatcher(AdapterRegistry::default());
        let tail = user(&log, "おはよう");
        assert_eq!(
            d.dispatch(&tail).await,
            DispatchOutcome::Reply(Reply::text(GOOD_MORNING_REPLY))
        );
    }

    #[tokio::test]
    async fn test_unmatched_and_system_tail_are_ignored() {
        let log = MessageLog::new();
        let d = dispatcher(AdapterRegistry::default());

        let tail = user(&log, "こんにちは");
        assert_eq!(d.dispatch(&tail).await, DispatchOutcome::NoMatch);

        // 系统消息即使文本与触发词相同也不分派
        let tail = log.append(Sender::System, Reply::text("おはよう"));
        assert_eq!(d.dispatch(&tail).await, DispatchOutcome::NoMatch);
    }

    #[tokio::test]
    async fn test_random_covers_all_candidates() {
        let log = MessageLog::new();
        let d = dispatcher(AdapterRegistry::default());
        let tail = user(&log, "天気占い");

        let mut seen = HashSet::new();
        for _ in 0..1000 {
            match d.dispatch(&tail).await {
                DispatchOutcome::Reply(reply) => {
                    assert!(TODAY_FORTUNES.contains(&reply.primary_text.as_str()));
                    seen.insert(reply.primary_text);
                }
                other => panic!("unexpected outcome: {other:?}"),
            }
        }
        assert_eq!(seen.len(), TODAY_FORTUNES.len());
    }

    #[tokio::test]
    async fn test_random_is_reproducible_with_seed() {
        let log = MessageLog::new();
        let tail = user(&log, "明日の天気占い");
        let a = dispatcher(AdapterRegistry::default());
        let b = dispatcher(AdapterRegistry::default());
        for _ in 0..20 {
            assert_eq!(a.dispatch(&tail).await, b.dispatch(&tail).await);
        }
    }

    #[tokio::test]
    async fn test_lookup_is_deterministic() {
        let mut adapters = AdapterRegistry::default();
        adapters.register(StaticAdapter::ok(
            AdapterId::Cat,
            LookupResponse::Cat(vec![CatImage {
                url: "http://x/cat.png".into(),
            }]),
        ));
        let d = dispatcher(adapters);
        let log = MessageLog::new();
        let tail = user(&log, "猫");

        let first = d.dispatch(&tail).await;
        assert_eq!(
            first,
            DispatchOutcome::Reply(Reply::text(CAT_REPLY).with_image("http://x/cat.png"))
        );
        assert_eq!(d.dispatch(&tail).await, first);
    }

    #[tokio::test]
    async fn test_lookup_failure_and_malformed() {
        let mut adapters = AdapterRegistry::default();
        adapters.register(StaticAdapter::failing(AdapterId::Dog, LookupError::Http(503)));
        adapters.register(StaticAdapter::ok(AdapterId::Cat, LookupResponse::Cat(vec![])));
        let d = dispatcher(adapters);
        let log = MessageLog::new();

        let tail = user(&log, "犬");
        assert_eq!(
            d.dispatch(&tail).await,
            DispatchOutcome::LookupFailed {
                adapter: AdapterId::Dog,
                error: LookupError::Http(503)
            }
        );

        let tail = user(&log, "猫");
        assert!(matches!(
            d.dispatch(&tail).await,
            DispatchOutcome::LookupFailed {
                adapter: AdapterId::Cat,
                error: LookupError::Malformed(_)
            }
        ));
    }

    #[tokio::test]
    async fn test_weather_request_carries_location() {
        let adapter = StaticAdapter::failing(AdapterId::Weather, LookupError::Network("down".into()));
        let last = adapter.last_request_handle();
        let mut adapters = AdapterRegistry::default();
        adapters.register(adapter);

        let table = TriggerTable::builder()
            .add(
                "大阪の天気",
                ReplyStrategy::lookup(
                    LookupRequest::Weather { location: 270000 },
                    Formatter::Weather(crate::reply::ForecastDay::Today),
                ),
            )
            .build()
            .unwrap();
        let d = Dispatcher::new(table, adapters);
        let log = MessageLog::new();
        d.dispatch(&user(&log, "大阪の天気")).await;

        assert_eq!(
            *last.lock().unwrap(),
            Some(LookupRequest::Weather { location: 270000 })
        );
    }
}
