//! 外部数据源的请求与响应形状
//!
//! 字段名与各服务 JSON 保持一致（serde rename）；缺少必需字段时反序列化失败，
//! 由适配器转为 LookupError::Malformed。

use std::collections::HashMap;

use serde::Deserialize;

/// 适配器标识
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AdapterId {
    Weather,
    Article,
    Dog,
    Cat,
}

impl AdapterId {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterId::Weather => "weather",
            AdapterId::Article => "article",
            AdapterId::Dog => "dog",
            AdapterId::Cat => "cat",
        }
    }
}

impl std::fmt::Display for AdapterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 查询参数（由触发策略决定）
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LookupRequest {
    /// 天气：地区代码（如 130010 = 东京）
    Weather { location: u32 },
    Article,
    DogImage,
    CatImage,
}

impl LookupRequest {
    pub fn adapter(&self) -> AdapterId {
        match self {
            LookupRequest::Weather { .. } => AdapterId::Weather,
            LookupRequest::Article => AdapterId::Article,
            LookupRequest::DogImage => AdapterId::Dog,
            LookupRequest::CatImage => AdapterId::Cat,
        }
    }
}

/// 适配器返回的原始数据
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LookupResponse {
    Weather(WeatherResponse),
    Article(ArticleResponse),
    Dog(DogResponse),
    Cat(Vec<CatImage>),
}

impl LookupResponse {
    pub fn kind(&self) -> &'static str {
        match self {
            LookupResponse::Weather(_) => "weather",
            LookupResponse::Article(_) => "article",
            LookupResponse::Dog(_) => "dog",
            LookupResponse::Cat(_) => "cat",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct WeatherResponse {
    pub forecasts: Vec<Forecast>,
}

/// 单日预报
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Forecast {
    /// 天气标签（晴れ、曇り…）
    pub telop: String,
    pub detail: ForecastDetail,
    #[serde(rename = "chanceOfRain")]
    pub chance_of_rain: ChanceOfRain,
    pub image: ForecastImage,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ForecastDetail {
    pub weather: String,
    pub wind: String,
}

/// 四个时段的降水概率（原样保留字符串，如 "10%"、"--%"）
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ChanceOfRain {
    #[serde(rename = "T00_06")]
    pub t00_06: String,
    #[serde(rename = "T06_12")]
    pub t06_12: String,
    #[serde(rename = "T12_18")]
    pub t12_18: String,
    #[serde(rename = "T18_24")]
    pub t18_24: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ForecastImage {
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ArticleResponse {
    pub query: ArticleQuery,
}

/// 随机条目查询结果：pageids 给出顺序，pages 以 id 为键
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ArticleQuery {
    pub pageids: Vec<String>,
    pub pages: HashMap<String, ArticlePage>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ArticlePage {
    pub title: String,
    pub fullurl: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct DogResponse {
    /// 图片 URL
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct CatImage {
    pub url: String,
}
