//! 界面渲染
//!
//! 根据 ChatView 与 input_buffer 绘制：标题栏显示名称与等待状态，
//! 主体为对话历史（用户靠右、系统靠左，附时间戳、详情、图标/图片/链接），底部为输入框与快捷键提示。

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
    Frame,
};

use unicode_width::UnicodeWidthChar;

use crate::chat::{Message, Sender};
use crate::core::ChatView;

/// 气泡最大宽度占对话区的比例（百分比）
const BUBBLE_WIDTH_PERCENT: usize = 70;

/// 将内容按显示宽度换行：全角字符占两列，不在字符中间截断
fn wrap_text(s: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![s.to_string()];
    }
    let mut lines = Vec::new();
    for para in s.split('\n') {
        let mut line = String::new();
        let mut line_width = 0usize;
        for ch in para.chars() {
            let w = ch.width().unwrap_or(0);
            if line_width + w > width && !line.is_empty() {
                lines.push(std::mem::take(&mut line));
                line_width = 0;
            }
            line.push(ch);
            line_width += w;
        }
        lines.push(line);
    }
    lines
}

/// 单条消息的显示行
fn message_lines(m: &Message, width: usize) -> Vec<Line<'static>> {
    let (alignment, color) = match m.sender {
        Sender::User => (Alignment::Right, Color::Magenta),
        Sender::System => (Alignment::Left, Color::Green),
    };
    let bubble_width = (width * BUBBLE_WIDTH_PERCENT / 100).max(20);
    let text_style = Style::default().fg(color);
    let mut lines = Vec::new();

    for line in wrap_text(&m.primary_text, bubble_width) {
        lines.push(Line::from(Span::styled(line, text_style.add_modifier(Modifier::BOLD))).alignment(alignment));
    }
    if let Some(secondary) = &m.secondary_text {
        for line in wrap_text(secondary, bubble_width) {
            lines.push(Line::from(Span::styled(line, text_style)).alignment(alignment));
        }
    }

    let refs = [("☀ ", &m.icon_ref), ("🖼 ", &m.image_ref), ("🔗 ", &m.link_ref)];
    for (mark, value) in refs {
        if let Some(url) = value {
            lines.push(
                Line::from(vec![
                    Span::raw(mark),
                    Span::styled(
                        url.clone(),
                        Style::default().fg(Color::Blue).add_modifier(Modifier::UNDERLINED),
                    ),
                ])
                .alignment(alignment),
            );
        }
    }

    lines.push(
        Line::from(Span::styled(m.timestamp.clone(), Style::default().fg(Color::DarkGray)))
            .alignment(alignment),
    );
    lines
}

/// 绘制一帧：上方对话区（标题 + 历史 + 滚动条），下方输入区；将 (总行数, 可视高度) 写入 out 供外部 clamp 滚动
pub fn draw(
    f: &mut Frame,
    view: &ChatView,
    input_buffer: &str,
    conversation_scroll: usize,
    out: &mut (usize, usize),
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(3)])
        .split(f.area());

    let conv_area = chunks[0];
    let content_width = conv_area.width.saturating_sub(3) as usize; // 边框 + 滚动条

    let status = if view.is_waiting() { "入力中…" } else { "オンライン" };
    let block = Block::default()
        .title(format!(" {} │ {} ", view.title, status))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta));

    let mut text_lines: Vec<Line> = Vec::new();
    for (idx, m) in view.messages.iter().enumerate() {
        if idx > 0 {
            text_lines.push(Line::from(""));
        }
        text_lines.extend(message_lines(m, content_width));
    }

    let content_height = conv_area.height.saturating_sub(2) as usize;
    let total_lines = text_lines.len();
    let scroll_offset = conversation_scroll.min(total_lines.saturating_sub(content_height));

    let inner = block.inner(conv_area);
    let paragraph = Paragraph::new(Text::from(text_lines))
        .block(block)
        .scroll((scroll_offset.min(u16::MAX as usize) as u16, 0));
    f.render_widget(paragraph, conv_area);

    if total_lines > content_height {
        let mut scrollbar_state = ScrollbarState::new(total_lines)
            .position(scroll_offset)
            .viewport_content_length(content_height);
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .thumb_symbol("█")
            .track_symbol(Some("░"));
        f.render_stateful_widget(scrollbar, inner, &mut scrollbar_state);
    }

    let (input_title, border_color) = match &view.error_message {
        Some(err) => (format!(" {} ", err), Color::Red),
        None => (" メッセージ ".to_string(), Color::Blue),
    };
    let hint = " Enter 送信 │ Ctrl+L クリア │ ↑↓ PgUp/PgDn スクロール │ Esc 終了 ";
    let input_block = Block::default()
        .title(input_title)
        .title_bottom(Line::from(Span::styled(hint, Style::default().fg(Color::DarkGray))))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    f.render_widget(Paragraph::new(input_buffer).block(input_block), chunks[1]);

    out.0 = total_lines;
    out.1 = content_height;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{MessageLog, Reply};

    #[test]
    fn test_wrap_text_keeps_blank_lines() {
        assert_eq!(wrap_text("abcdef", 4), vec!["abcd", "ef"]);
        assert_eq!(wrap_text("a\n\nb", 4), vec!["a", "", "b"]);
    }

    #[test]
    fn test_wrap_text_counts_wide_chars_as_two_columns() {
        assert_eq!(wrap_text("あいうえお", 4), vec!["あい", "うえ", "お"]);
        assert_eq!(wrap_text("犬dog", 4), vec!["犬do", "g"]);
        // 宽度不足一个全角字符时仍逐字输出，不产生空行
        assert_eq!(wrap_text("猫猫", 1), vec!["猫", "猫"]);
        for line in wrap_text("今日の天気は晴れです", 7) {
            assert!(line.chars().map(|c| c.width().unwrap_or(0)).sum::<usize>() <= 7);
        }
    }

    #[tokio::test]
    async fn test_message_lines_alignment_and_refs() {
        let log = MessageLog::new();
        let user = log.append(Sender::User, Reply::text("猫"));
        let reply = log.append(
            Sender::System,
            Reply::text("今日の猫です🐈").with_image("http://x/cat.png"),
        );

        let lines = message_lines(&user, 80);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].alignment, Some(Alignment::Right));

        let lines = message_lines(&reply, 80);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].alignment, Some(Alignment::Left));
        assert!(lines[1].spans.iter().any(|s| s.content == "http://x/cat.png"));
    }
}
