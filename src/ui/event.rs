//! 事件处理
//!
//! 把 crossterm 终端事件映射为应用事件：Ctrl+L / Ctrl+Q / Esc 转为 Command（Clear/Quit）并发给编排器，
//! 其余按键交给 run_app 拼 input_buffer，Enter 时 send_submit。
//! 终端事件由 run_app 通过异步 EventStream 读取，不阻塞运行时线程。

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc;

use crate::core::Command;

/// 应用事件：来自快捷键的 Command、原始 KeyEvent 或终端尺寸变化
#[derive(Debug, Clone)]
pub enum AppEvent {
    Command(Command),
    Key(KeyEvent),
    Resize,
}

/// 事件处理器：持有 cmd_tx，把终端事件转为 AppEvent
pub struct EventHandler {
    cmd_tx: mpsc::UnboundedSender<Command>,
}

impl EventHandler {
    pub fn new(cmd_tx: mpsc::UnboundedSender<Command>) -> Self {
        Self { cmd_tx }
    }

    /// 只处理按下事件；鼠标、焦点、释放等返回 None
    pub fn handle_event(&self, event: Event) -> Option<AppEvent> {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => Some(self.handle_key(key)),
            Event::Resize(_, _) => Some(AppEvent::Resize),
            _ => None,
        }
    }

    fn handle_key(&self, key: KeyEvent) -> AppEvent {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('l') if ctrl => {
                let _ = self.cmd_tx.send(Command::Clear);
                AppEvent::Command(Command::Clear)
            }
            KeyCode::Char('q') | KeyCode::Char('c') if ctrl => self.quit(),
            KeyCode::Esc => self.quit(),
            _ => AppEvent::Key(key),
        }
    }

    fn quit(&self) -> AppEvent {
        let _ = self.cmd_tx.send(Command::Quit);
        AppEvent::Command(Command::Quit)
    }

    pub fn send_submit(&self, input: String) {
        let _ = self.cmd_tx.send(Command::Submit(input));
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyEventState;

    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent::new(code, modifiers))
    }

    #[test]
    fn test_shortcuts_become_commands() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handler = EventHandler::new(tx);

        let ev = handler.handle_event(press(KeyCode::Char('l'), KeyModifiers::CONTROL));
        assert!(matches!(ev, Some(AppEvent::Command(Command::Clear))));
        assert!(matches!(rx.try_recv(), Ok(Command::Clear)));

        let ev = handler.handle_event(press(KeyCode::Esc, KeyModifiers::NONE));
        assert!(matches!(ev, Some(AppEvent::Command(Command::Quit))));
        assert!(matches!(rx.try_recv(), Ok(Command::Quit)));
    }

    #[test]
    fn test_plain_keys_pass_through() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handler = EventHandler::new(tx);

        let ev = handler.handle_event(press(KeyCode::Char('l'), KeyModifiers::NONE));
        assert!(matches!(ev, Some(AppEvent::Key(k)) if k.code == KeyCode::Char('l')));
        assert!(rx.try_recv().is_err());

        let release = Event::Key(KeyEvent {
            code: KeyCode::Enter,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        });
        assert!(handler.handle_event(release).is_none());
        assert!(matches!(handler.handle_event(Event::Resize(80, 24)), Some(AppEvent::Resize)));
    }

    #[test]
    fn test_submit_sends_raw_input() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handler = EventHandler::new(tx);
        handler.send_submit("おはよう ".into());
        assert!(matches!(rx.try_recv(), Ok(Command::Submit(s)) if s == "おはよう "));
    }
}
