//! 百科适配器：随机取一篇条目（标题与规范 URL）

use async_trait::async_trait;
use reqwest::Client;

use crate::core::LookupError;
use crate::lookup::http::{build_client, get_json};
use crate::lookup::{AdapterId, ArticleResponse, LookupAdapter, LookupRequest, LookupResponse};

/// 随机条目查询参数：主名字空间、附带 URL、按 id 列出
const RANDOM_PAGE_QUERY: &[(&str, &str)] = &[
    ("origin", "*"),
    ("format", "json"),
    ("action", "query"),
    ("generator", "random"),
    ("grnnamespace", "0"),
    ("prop", "info"),
    ("inprop", "url"),
    ("indexpageids", "1"),
];

pub struct ArticleAdapter {
    client: Client,
    api_url: String,
}

impl ArticleAdapter {
    pub fn new(api_url: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            client: build_client(timeout_secs),
            api_url: api_url.into(),
        }
    }
}

#[async_trait]
impl LookupAdapter for ArticleAdapter {
    fn id(&self) -> AdapterId {
        AdapterId::Article
    }

    async fn fetch(&self, _request: &LookupRequest) -> Result<LookupResponse, LookupError> {
        let data: ArticleResponse = get_json(&self.client, &self.api_url, RANDOM_PAGE_QUERY).await?;
        Ok(LookupResponse::Article(data))
    }
}
