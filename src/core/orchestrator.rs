//! 编排器：主控循环
//!
//! 负责：加载配置、注册外部数据源适配器、构建触发表 / 分派器 / 调度器 / 对话循环，建立 cmd/state 两通道，
//! 并在后台任务中消费用户命令（Submit/Clear/Quit），每次日志变更后把 ChatView 投影推给 UI。

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::chat::{Conversation, MessageLog};
use crate::config::{load_config, AppConfig};
use crate::core::{ChatView, TriggerError};
use crate::lookup::{AdapterRegistry, ArticleAdapter, CatAdapter, DogAdapter, WeatherAdapter};
use crate::reply::{Dispatcher, ReplyScheduler, TriggerTable};

/// 在途回复数的刷新间隔
const VIEW_REFRESH: Duration = Duration::from_millis(200);

/// 从 UI 发往编排器的用户命令
#[derive(Debug, Clone)]
pub enum Command {
    /// 提交用户输入
    Submit(String),
    /// 清空对话
    Clear,
    /// 退出应用
    Quit,
}

/// 按配置注册真实 HTTP 适配器
pub fn build_registry(cfg: &AppConfig) -> AdapterRegistry {
    let lookup = &cfg.lookup;
    let mut adapters = AdapterRegistry::new(lookup.timeout_secs);
    adapters.register(WeatherAdapter::new(
        lookup.weather_base_url.clone(),
        lookup.timeout_secs,
    ));
    adapters.register(ArticleAdapter::new(lookup.article_url.clone(), lookup.timeout_secs));
    adapters.register(DogAdapter::new(lookup.dog_url.clone(), lookup.timeout_secs));
    adapters.register(CatAdapter::new(
        lookup.cat_url.clone(),
        lookup.cat_api_key.clone(),
        lookup.timeout_secs,
    ));
    adapters
}

/// 组装对话：默认触发表 + 给定适配器 + 配置中的延迟与重置策略
pub fn build_conversation(
    cfg: &AppConfig,
    adapters: AdapterRegistry,
) -> Result<Conversation, TriggerError> {
    let mut table = TriggerTable::defaults(cfg.lookup.weather_location);
    if let Some(text) = cfg.app.failure_reply() {
        table = table.reserve_reply(text);
    }
    let table = table.build()?;
    tracing::info!(triggers = table.len(), "trigger table loaded");

    let log = MessageLog::new();
    let dispatcher = Dispatcher::new(table, adapters);
    let scheduler = ReplyScheduler::new(
        log.clone(),
        Duration::from_millis(cfg.app.reply_delay_ms),
        cfg.app.reset_policy,
    );
    Ok(Conversation::new(log, dispatcher, scheduler).with_failure_reply(cfg.app.failure_reply()))
}

/// 创建对话运行时：返回命令发送端与状态接收端；后台任务消费命令并更新 state。
pub async fn create_chat(
    config_path: Option<PathBuf>,
) -> anyhow::Result<(mpsc::UnboundedSender<Command>, watch::Receiver<ChatView>)> {
    let cfg = load_config(config_path).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });

    let conversation = Arc::new(build_conversation(&cfg, build_registry(&cfg))?);
    Ok(run_chat(conversation, cfg.app.name.clone()))
}

/// 在已组装好的对话上启动主控循环（测试可注入 Mock 适配器）
pub fn run_chat(
    conversation: Arc<Conversation>,
    title: String,
) -> (mpsc::UnboundedSender<Command>, watch::Receiver<ChatView>) {
    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel::<Command>();
    let (state_tx, state_rx) = watch::channel(ChatView {
        title: title.clone(),
        ..ChatView::default()
    });

    let shutdown = CancellationToken::new();
    let mut log_events = conversation.log().subscribe();
    conversation.spawn(shutdown.clone());

    tokio::spawn(async move {
        let mut refresh = tokio::time::interval(VIEW_REFRESH);
        let mut error_message: Option<String> = None;
        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(Command::Submit(input)) => {
                            error_message = conversation.submit(&input).err().map(|e| e.to_string());
                        }
                        Some(Command::Clear) => {
                            conversation.clear();
                            error_message = None;
                        }
                        Some(Command::Quit) | None => break,
                    }
                }
                Some(_event) = log_events.recv() => {}
                _ = refresh.tick() => {}
            }

            let view = ChatView {
                title: title.clone(),
                generation: conversation.log().generation(),
                messages: conversation.log().snapshot(),
                pending_replies: conversation.pending_replies(),
                error_message: error_message.clone(),
            };
            state_tx.send_if_modified(|current| {
                let changed = view_changed(current, &view);
                if changed {
                    *current = view;
                }
                changed
            });
        }
        shutdown.cancel();
        tracing::info!("chat orchestrator stopped");
    });

    (cmd_tx, state_rx)
}

/// 日志只追加，同一代内长度与末尾 id 相同即内容相同
fn view_changed(current: &ChatView, next: &ChatView) -> bool {
    current.generation != next.generation
        || current.messages.len() != next.messages.len()
        || current.messages.last().map(|m| m.id) != next.messages.last().map(|m| m.id)
        || current.pending_replies != next.pending_replies
        || current.error_message != next.error_message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{Reply, Sender};
    use crate::lookup::{AdapterId, CatImage, LookupResponse, StaticAdapter};

    fn test_config() -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.app.reply_delay_ms = 1000;
        cfg
    }

    #[test]
    fn test_build_registry_has_all_adapters() {
        let registry = build_registry(&AppConfig::default());
        let mut ids = registry.ids();
        ids.sort_by_key(|id| id.as_str());
        assert_eq!(
            ids,
            vec![AdapterId::Article, AdapterId::Cat, AdapterId::Dog, AdapterId::Weather]
        );
    }

    #[test]
    fn test_build_conversation_uses_default_table() {
        let conversation = build_conversation(&test_config(), AdapterRegistry::default()).unwrap();
        let phrases = conversation.dispatcher().table().phrases();
        assert_eq!(phrases.len(), 9);
        assert!(phrases.contains(&"今日の天気"));
        assert!(phrases.contains(&"明日の天気占い"));
    }

    #[test]
    fn test_failure_text_may_not_be_a_trigger() {
        let mut cfg = AppConfig::default();
        cfg.app.lookup_failure_text = "犬".into();
        let err = build_conversation(&cfg, AdapterRegistry::default()).err();
        assert_eq!(err, Some(TriggerError::CollidesWithReply("犬".into())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_commands_drive_view() {
        let mut adapters = AdapterRegistry::default();
        adapters.register(StaticAdapter::ok(
            AdapterId::Cat,
            LookupResponse::Cat(vec![CatImage {
                url: "http://x/cat.png".into(),
            }]),
        ));
        let conversation = Arc::new(build_conversation(&test_config(), adapters).unwrap());
        let (cmd_tx, mut state_rx) = run_chat(conversation, "Test".into());

        cmd_tx.send(Command::Submit("   ".into())).unwrap();
        state_rx.changed().await.unwrap();
        assert!(state_rx.borrow().error_message.is_some());
        assert!(state_rx.borrow().messages.is_empty());

        cmd_tx.send(Command::Submit("猫".into())).unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        {
            let view = state_rx.borrow_and_update();
            assert_eq!(view.messages.len(), 2);
            assert_eq!(view.messages[1].image_ref.as_deref(), Some("http://x/cat.png"));
            assert_eq!(view.pending_replies, 0);
            assert!(view.error_message.is_none());
        }

        cmd_tx.send(Command::Clear).unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(state_rx.borrow().messages.is_empty());

        cmd_tx.send(Command::Quit).unwrap();
    }

    #[tokio::test]
    async fn test_view_changed_detects_new_generation() {
        let log = MessageLog::new();
        let before = ChatView {
            messages: vec![log.append(Sender::User, Reply::text("こんにちは"))],
            ..ChatView::default()
        };
        let generation = log.clear();
        let after = ChatView {
            generation,
            messages: vec![log.append(Sender::User, Reply::text("さようなら"))],
            ..ChatView::default()
        };

        assert!(view_changed(&before, &after));
        assert!(!view_changed(&after, &after.clone()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_view_republished_after_clear_with_same_shape() {
        let conversation =
            Arc::new(build_conversation(&test_config(), AdapterRegistry::default()).unwrap());
        let (cmd_tx, mut state_rx) = run_chat(conversation, "Test".into());

        cmd_tx.send(Command::Submit("こんにちは".into())).unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(state_rx.borrow_and_update().messages[0].primary_text, "こんにちは");

        // 清空后再提交一条未匹配消息：长度、末尾 id、在途数都与清空前相同
        cmd_tx.send(Command::Clear).unwrap();
        cmd_tx.send(Command::Submit("さようなら".into())).unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        {
            let view = state_rx.borrow_and_update();
            assert_eq!(view.generation, 1);
            assert_eq!(view.messages.len(), 1);
            assert_eq!(view.messages[0].id, 1);
            assert_eq!(view.messages[0].primary_text, "さようなら");
        }

        cmd_tx.send(Command::Quit).unwrap();
    }
}
