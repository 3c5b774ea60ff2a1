//! 共享 HTTP 客户端：超时、User-Agent、JSON 解码
//!
//! 非 2xx 状态转为 LookupError::Http；响应体先取文本再解析，解析失败视为格式错误。

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::core::LookupError;

const USER_AGENT: &str = concat!("hibiki/", env!("CARGO_PKG_VERSION"));

/// 构建带超时的客户端；构建失败时退回默认客户端
pub fn build_client(timeout_secs: u64) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(USER_AGENT)
        .build()
        .unwrap_or_default()
}

/// GET 并解析 JSON
pub async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    query: &[(&str, &str)],
) -> Result<T, LookupError> {
    let resp = client.get(url).query(query).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(LookupError::Http(status.as_u16()));
    }
    let body = resp.text().await?;
    parse_json(&body)
}

/// 解析 JSON 响应体（去除 BOM）
pub fn parse_json<T: DeserializeOwned>(body: &str) -> Result<T, LookupError> {
    let body = body.strip_prefix('\u{FEFF}').unwrap_or(body);
    Ok(serde_json::from_str(body)?)
}
