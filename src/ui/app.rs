//! TUI 应用主循环
//!
//! 进入全屏/原始模式，同时等待 state_rx 变更与异步键盘事件流，将用户输入与快捷键转为 Command 发送给编排器，
//! 每帧用 draw 渲染 ChatView 与输入缓冲。

use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::event::{EventStream, KeyCode, KeyEvent};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;

use crate::core::{ChatView, Command};
use crate::ui::event::{AppEvent, EventHandler};
use crate::ui::render::draw;

/// 无事件时的重绘间隔
const FRAME_INTERVAL: Duration = Duration::from_millis(250);

/// 运行 TUI：启用原始模式与全屏，循环渲染 + 等待事件，退出时恢复终端
pub async fn run_app(
    state_rx: watch::Receiver<ChatView>,
    cmd_tx: mpsc::UnboundedSender<Command>,
) -> anyhow::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, state_rx, cmd_tx).await;
    restore_terminal(&mut terminal)?;
    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    mut state_rx: watch::Receiver<ChatView>,
    cmd_tx: mpsc::UnboundedSender<Command>,
) -> anyhow::Result<()> {
    let event_handler = EventHandler::new(cmd_tx);
    let mut events = EventStream::new();
    let mut frame = tokio::time::interval(FRAME_INTERVAL);
    frame.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut input_buffer = String::new();
    let mut conversation_scroll = usize::MAX;
    let mut last_message_count = 0usize;

    loop {
        let view = state_rx.borrow_and_update().clone();
        if view.messages.len() != last_message_count {
            last_message_count = view.messages.len();
            conversation_scroll = usize::MAX;
        }

        let mut scroll_info = (0usize, 0usize);
        terminal.draw(|f| {
            draw(f, &view, &input_buffer, conversation_scroll, &mut scroll_info);
        })?;
        let (total_lines, viewport_height) = scroll_info;
        conversation_scroll = conversation_scroll.min(total_lines.saturating_sub(viewport_height));

        // 终端事件、状态变更、帧定时三者任一就绪即重绘；等待期间回复计时器与查询照常推进
        tokio::select! {
            maybe_event = events.next() => match maybe_event {
                Some(Ok(event)) => match event_handler.handle_event(event) {
                    Some(AppEvent::Command(Command::Quit)) => break,
                    Some(AppEvent::Key(key)) => {
                        apply_key(key, &event_handler, &mut input_buffer, &mut conversation_scroll);
                    }
                    Some(AppEvent::Command(_)) | Some(AppEvent::Resize) | None => {}
                },
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
            changed = state_rx.changed() => {
                if changed.is_err() {
                    tracing::info!("chat orchestrator gone, leaving UI");
                    break;
                }
            }
            _ = frame.tick() => {}
        }
    }
    Ok(())
}

/// 编辑输入缓冲与滚动位置
fn apply_key(
    key: KeyEvent,
    event_handler: &EventHandler,
    input_buffer: &mut String,
    conversation_scroll: &mut usize,
) {
    match key.code {
        KeyCode::Enter => {
            // 原样提交（触发词区分空白），空白输入由对话层拒绝
            event_handler.send_submit(std::mem::take(input_buffer));
        }
        KeyCode::Backspace => {
            input_buffer.pop();
        }
        KeyCode::Char(c) => input_buffer.push(c),
        KeyCode::Up => *conversation_scroll = conversation_scroll.saturating_sub(1),
        KeyCode::Down => *conversation_scroll = conversation_scroll.saturating_add(1),
        KeyCode::PageUp => *conversation_scroll = conversation_scroll.saturating_sub(10),
        KeyCode::PageDown => *conversation_scroll = conversation_scroll.saturating_add(10),
        KeyCode::Home => *conversation_scroll = 0,
        KeyCode::End => *conversation_scroll = usize::MAX,
        _ => {}
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
