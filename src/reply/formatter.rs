//! 回复格式化：把外部数据源的原始响应变成结构化 Reply
//!
//! 纯函数、同步。响应缺少预期内容（如预报天数不足、结果数组为空）时返回 LookupError::Malformed，
//! 由分派器按查询失败处理，而不是生成一条格式化回复。

use crate::chat::Reply;
use crate::core::LookupError;
use crate::lookup::{ArticleResponse, CatImage, DogResponse, LookupResponse, WeatherResponse};

pub const DOG_REPLY: &str = "今日の犬です🐕";
pub const CAT_REPLY: &str = "今日の猫です🐈";

/// 预报日（forecasts 数组下标）
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ForecastDay {
    Today,
    Tomorrow,
}

impl ForecastDay {
    pub fn index(&self) -> usize {
        match self {
            ForecastDay::Today => 0,
            ForecastDay::Tomorrow => 1,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ForecastDay::Today => "今日",
            ForecastDay::Tomorrow => "明日",
        }
    }
}

/// 与 Lookup 策略绑定的格式化器
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Formatter {
    Weather(ForecastDay),
    Article,
    Dog,
    Cat,
}

impl Formatter {
    pub fn apply(&self, response: &LookupResponse) -> Result<Reply, LookupError> {
        match (self, response) {
            (Formatter::Weather(day), LookupResponse::Weather(data)) => format_weather(*day, data),
            (Formatter::Article, LookupResponse::Article(data)) => format_article(data),
            (Formatter::Dog, LookupResponse::Dog(data)) => Ok(format_dog(data)),
            (Formatter::Cat, LookupResponse::Cat(images)) => format_cat(images),
            (formatter, other) => Err(LookupError::ResponseMismatch {
                expected: formatter.expects(),
                actual: other.kind(),
            }),
        }
    }

    fn expects(&self) -> &'static str {
        match self {
            Formatter::Weather(_) => "weather",
            Formatter::Article => "article",
            Formatter::Dog => "dog",
            Formatter::Cat => "cat",
        }
    }
}

/// 去掉所有空白（含全角空格）
fn strip_whitespace(s: &str) -> String {
    s.split_whitespace().collect()
}

pub fn format_weather(day: ForecastDay, data: &WeatherResponse) -> Result<Reply, LookupError> {
    let forecast = data.forecasts.get(day.index()).ok_or_else(|| {
        LookupError::Malformed(format!(
            "forecast for {} missing ({} entries)",
            day.label(),
            data.forecasts.len()
        ))
    })?;

    let rain = &forecast.chance_of_rain;
    let detail = format!(
        "詳細：{}\n風の強さ：{}\n降水確率：{}　{}　{}　{}",
        strip_whitespace(&forecast.detail.weather),
        strip_whitespace(&forecast.detail.wind),
        rain.t00_06,
        rain.t06_12,
        rain.t12_18,
        rain.t18_24,
    );

    Ok(Reply::text(format!("{}の天気は{}です", day.label(), forecast.telop))
        .with_secondary(detail)
        .with_icon(forecast.image.url.clone()))
}

/// 取 pageids 中第一个 id 对应的条目
pub fn format_article(data: &ArticleResponse) -> Result<Reply, LookupError> {
    let page_id = data
        .query
        .pageids
        .first()
        .ok_or_else(|| LookupError::Malformed("no page id returned".into()))?;
    let page = data
        .query
        .pages
        .get(page_id)
        .ok_or_else(|| LookupError::Malformed(format!("page {page_id} missing")))?;

    Ok(Reply::text(format!("今日の記事は「{}」です🔍", page.title)).with_link(page.fullurl.clone()))
}

pub fn format_dog(data: &DogResponse) -> Reply {
    Reply::text(DOG_REPLY).with_image(data.message.clone())
}

pub fn format_cat(images: &[CatImage]) -> Result<Reply, LookupError> {
    let first = images
        .first()
        .ok_or_else(|| LookupError::Malformed("empty cat image list".into()))?;
    Ok(Reply::text(CAT_REPLY).with_image(first.url.clone()))
}
