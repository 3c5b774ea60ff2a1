//! 动物图片适配器：随机狗图（单对象）与随机猫图（数组）

use async_trait::async_trait;
use reqwest::Client;

use crate::core::LookupError;
use crate::lookup::http::{build_client, get_json};
use crate::lookup::{AdapterId, CatImage, DogResponse, LookupAdapter, LookupRequest, LookupResponse};

pub struct DogAdapter {
    client: Client,
    url: String,
}

impl DogAdapter {
    pub fn new(url: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            client: build_client(timeout_secs),
            url: url.into(),
        }
    }
}

#[async_trait]
impl LookupAdapter for DogAdapter {
    fn id(&self) -> AdapterId {
        AdapterId::Dog
    }

    async fn fetch(&self, _request: &LookupRequest) -> Result<LookupResponse, LookupError> {
        let data: DogResponse = get_json(&self.client, &self.url, &[]).await?;
        Ok(LookupResponse::Dog(data))
    }
}

/// 猫图服务可选 api_key（来自配置，不内置）
pub struct CatAdapter {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl CatAdapter {
    pub fn new(url: impl Into<String>, api_key: Option<String>, timeout_secs: u64) -> Self {
        Self {
            client: build_client(timeout_secs),
            url: url.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }
}

#[async_trait]
impl LookupAdapter for CatAdapter {
    fn id(&self) -> AdapterId {
        AdapterId::Cat
    }

    async fn fetch(&self, _request: &LookupRequest) -> Result<LookupResponse, LookupError> {
        let query: Vec<(&str, &str)> = match &self.api_key {
            Some(key) => vec![("api_key", key.as_str())],
            None => vec![],
        };
        let data: Vec<CatImage> = get_json(&self.client, &self.url, &query).await?;
        Ok(LookupResponse::Cat(data))
    }
}
