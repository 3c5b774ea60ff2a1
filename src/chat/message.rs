//! 消息与待发送回复
//!
//! Message 一经创建不可变，由 MessageLog 在追加时分配 id 与时间戳；
//! Reply 是格式化完成、尚未进入日志的回复内容。

use serde::Serialize;
use tokio::time::Instant;

/// 发送方
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    System,
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::System => write!(f, "system"),
        }
    }
}

/// 回复内容：主文本必填，其余可选
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub primary_text: String,
    pub secondary_text: Option<String>,
    pub icon_ref: Option<String>,
    pub image_ref: Option<String>,
    pub link_ref: Option<String>,
}

impl Reply {
    pub fn text(primary_text: impl Into<String>) -> Self {
        Self {
            primary_text: primary_text.into(),
            ..Self::default()
        }
    }

    pub fn with_secondary(mut self, text: impl Into<String>) -> Self {
        self.secondary_text = Some(text.into());
        self
    }

    pub fn with_icon(mut self, url: impl Into<String>) -> Self {
        self.icon_ref = Some(url.into());
        self
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_ref = Some(url.into());
        self
    }

    pub fn with_link(mut self, url: impl Into<String>) -> Self {
        self.link_ref = Some(url.into());
        self
    }
}

/// 日志中的一条消息
#[derive(Clone, Debug, Serialize)]
pub struct Message {
    /// 会话内从 1 开始严格递增
    pub id: u64,
    pub sender: Sender,
    pub primary_text: String,
    pub secondary_text: Option<String>,
    pub icon_ref: Option<String>,
    pub image_ref: Option<String>,
    pub link_ref: Option<String>,
    /// 追加时的本地时间（展示用）
    pub timestamp: String,
    /// 追加时的单调时钟，用于延迟与排序断言
    #[serde(skip)]
    pub captured_at: Instant,
}

impl Message {
    pub(crate) fn new(id: u64, sender: Sender, reply: Reply) -> Self {
        Self {
            id,
            sender,
            primary_text: reply.primary_text,
            secondary_text: reply.secondary_text,
            icon_ref: reply.icon_ref,
            image_ref: reply.image_ref,
            link_ref: reply.link_ref,
            timestamp: chrono::Local::now().format("%Y/%m/%d %H:%M:%S").to_string(),
            captured_at: Instant::now(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }

    /// 去掉 id 与时间戳后的内容，便于比较两次回复是否一致
    pub fn content(&self) -> Reply {
        Reply {
            primary_text: self.primary_text.clone(),
            secondary_text: self.secondary_text.clone(),
            icon_ref: self.icon_ref.clone(),
            image_ref: self.image_ref.clone(),
            link_ref: self.link_ref.clone(),
        }
    }
}
