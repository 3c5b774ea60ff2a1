//! 天气适配器：按地区代码获取多日预报（forecasts[0] = 今天，[1] = 明天）

use async_trait::async_trait;
use reqwest::Client;

use crate::core::LookupError;
use crate::lookup::http::{build_client, get_json};
use crate::lookup::{AdapterId, LookupAdapter, LookupRequest, LookupResponse, WeatherResponse};

pub struct WeatherAdapter {
    client: Client,
    base_url: String,
}

impl WeatherAdapter {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            client: build_client(timeout_secs),
            base_url: base_url.into(),
        }
    }

    fn url_for(&self, location: u32) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), location)
    }
}

#[async_trait]
impl LookupAdapter for WeatherAdapter {
    fn id(&self) -> AdapterId {
        AdapterId::Weather
    }

    async fn fetch(&self, request: &LookupRequest) -> Result<LookupResponse, LookupError> {
        let LookupRequest::Weather { location } = request else {
            return Err(LookupError::UnknownAdapter(request.adapter().to_string()));
        };
        let url = self.url_for(*location);
        tracing::debug!(url = %url, "weather fetch");
        let data: WeatherResponse = get_json(&self.client, &url, &[]).await?;
        Ok(LookupResponse::Weather(data))
    }
}
