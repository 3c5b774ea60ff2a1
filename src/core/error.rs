//! 错误类型
//!
//! 三类错误：外部查询失败（LookupError）、提交被拒（ChatError）、触发表配置错误（TriggerError）。
//! 「未匹配」不是错误，由 DispatchOutcome::NoMatch 表达。

use thiserror::Error;

/// 外部查询失败：网络、HTTP 状态、超时、响应格式不符
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {0}")]
    Http(u16),

    #[error("Lookup timeout after {0}s")]
    Timeout(u64),

    /// 缺少预期字段、数组越界等
    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Unknown adapter: {0}")]
    UnknownAdapter(String),

    /// 适配器返回的数据形状与格式化器不对应
    #[error("Response does not match formatter: expected {expected}, got {actual}")]
    ResponseMismatch {
        expected: &'static str,
        actual: &'static str,
    },
}

impl From<reqwest::Error> for LookupError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            return LookupError::Malformed(e.to_string());
        }
        if let Some(status) = e.status() {
            return LookupError::Http(status.as_u16());
        }
        LookupError::Network(e.to_string())
    }
}

impl From<serde_json::Error> for LookupError {
    fn from(e: serde_json::Error) -> Self {
        LookupError::Malformed(e.to_string())
    }
}

/// 用户提交被拒绝
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// 空白或仅含空白字符的输入不会进入消息日志
    #[error("Input cannot be empty")]
    EmptyInput,

    #[error("Conversation closed")]
    Closed,
}

/// 触发表构建错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TriggerError {
    #[error("Random reply for '{0}' has no candidates")]
    EmptyCandidates(String),

    /// 触发词与某条固定回复相同，会导致回复再次触发自身
    #[error("Trigger phrase '{0}' equals a canned reply")]
    CollidesWithReply(String),

    #[error("Duplicate trigger phrase: {0}")]
    Duplicate(String),
}
