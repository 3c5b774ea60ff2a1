//! 触发表：精确触发词 → 回复策略
//!
//! 按完整字符串匹配（区分大小写与空白，不做任何归一化）。进程启动时构建一次，之后只读。
//! 构建时拒绝与任何固定回复文本相同的触发词，否则系统回复会再次触发自身。

use std::collections::HashMap;

use crate::core::TriggerError;
use crate::lookup::LookupRequest;
use crate::reply::formatter::{ForecastDay, Formatter, CAT_REPLY, DOG_REPLY};

pub const GOOD_MORNING_REPLY: &str = "おはようございます、ご主人様💖\n今日も一日がんばりましょう🍭";
pub const GOOD_NIGHT_REPLY: &str = "おやすみなさい、ご主人様💤\n今日も一日お疲れさまでした🍵";

pub const TODAY_FORTUNES: &[&str] = &[
    "今日の天気は晴れです🌞",
    "今日の天気は曇りです☁",
    "今日の天気は雨です☔",
];

pub const TOMORROW_FORTUNES: &[&str] = &[
    "明日の天気は晴れです🌞",
    "明日の天気は曇りです☁",
    "明日の天気は雨です☔",
];

/// 回复策略
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplyStrategy {
    /// 固定文本
    StaticText(String),
    /// 从非空候选中均匀随机选一条
    RandomText(Vec<String>),
    /// 调用外部数据源，再用绑定的格式化器生成回复
    Lookup {
        request: LookupRequest,
        formatter: Formatter,
    },
}

impl ReplyStrategy {
    pub fn static_text(text: impl Into<String>) -> Self {
        ReplyStrategy::StaticText(text.into())
    }

    pub fn random<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ReplyStrategy::RandomText(candidates.into_iter().map(Into::into).collect())
    }

    pub fn lookup(request: LookupRequest, formatter: Formatter) -> Self {
        ReplyStrategy::Lookup { request, formatter }
    }

    /// 该策略可能产生的固定文本
    fn canned_texts(&self) -> Vec<&str> {
        match self {
            ReplyStrategy::StaticText(text) => vec![text.as_str()],
            ReplyStrategy::RandomText(candidates) => candidates.iter().map(String::as_str).collect(),
            ReplyStrategy::Lookup { formatter, .. } => match formatter {
                Formatter::Dog => vec![DOG_REPLY],
                Formatter::Cat => vec![CAT_REPLY],
                Formatter::Weather(_) | Formatter::Article => vec![],
            },
        }
    }
}

/// 只读触发表
#[derive(Clone, Debug, Default)]
pub struct TriggerTable {
    entries: HashMap<String, ReplyStrategy>,
}

impl TriggerTable {
    pub fn builder() -> TriggerTableBuilder {
        TriggerTableBuilder::default()
    }

    /// 默认词表（早晚问候、天气、百科、狗、猫、天气占卜）
    pub fn defaults(weather_location: u32) -> TriggerTableBuilder {
        Self::builder()
            .add("おはよう", ReplyStrategy::static_text(GOOD_MORNING_REPLY))
            .add("おやすみ", ReplyStrategy::static_text(GOOD_NIGHT_REPLY))
            .add(
                "今日の天気",
                ReplyStrategy::lookup(
                    LookupRequest::Weather { location: weather_location },
                    Formatter::Weather(ForecastDay::Today),
                ),
            )
            .add(
                "明日の天気",
                ReplyStrategy::lookup(
                    LookupRequest::Weather { location: weather_location },
                    Formatter::Weather(ForecastDay::Tomorrow),
                ),
            )
            .add(
                "今日の記事",
                ReplyStrategy::lookup(LookupRequest::Article, Formatter::Article),
            )
            .add("犬", ReplyStrategy::lookup(LookupRequest::DogImage, Formatter::Dog))
            .add("猫", ReplyStrategy::lookup(LookupRequest::CatImage, Formatter::Cat))
            .add("天気占い", ReplyStrategy::random(TODAY_FORTUNES.iter().copied()))
            .add("明日の天気占い", ReplyStrategy::random(TOMORROW_FORTUNES.iter().copied()))
    }

    /// 精确匹配
    pub fn get(&self, phrase: &str) -> Option<&ReplyStrategy> {
        self.entries.get(phrase)
    }

    pub fn phrases(&self) -> Vec<&str> {
        let mut phrases: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        phrases.sort_unstable();
        phrases
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// 触发表构建器：新增触发词只需追加一条 add
#[derive(Debug, Default)]
pub struct TriggerTableBuilder {
    entries: Vec<(String, ReplyStrategy)>,
    reserved: Vec<String>,
}

impl TriggerTableBuilder {
    pub fn add(mut self, phrase: impl Into<String>, strategy: ReplyStrategy) -> Self {
        self.entries.push((phrase.into(), strategy));
        self
    }

    /// 登记一条表外的系统回复文本（如查询失败提示），同样不允许作为触发词
    pub fn reserve_reply(mut self, text: impl Into<String>) -> Self {
        self.reserved.push(text.into());
        self
    }

    pub fn build(self) -> Result<TriggerTable, TriggerError> {
        let mut canned: Vec<&str> = self.reserved.iter().map(String::as_str).collect();
        for (phrase, strategy) in &self.entries {
            if let ReplyStrategy::RandomText(candidates) = strategy {
                if candidates.is_empty() {
                    return Err(TriggerError::EmptyCandidates(phrase.clone()));
                }
            }
            canned.extend(strategy.canned_texts());
        }

        let mut entries = HashMap::with_capacity(self.entries.len());
        for (phrase, strategy) in &self.entries {
            if canned.contains(&phrase.as_str()) {
                return Err(TriggerError::CollidesWithReply(phrase.clone()));
            }
            if entries.insert(phrase.clone(), strategy.clone()).is_some() {
                return Err(TriggerError::Duplicate(phrase.clone()));
            }
        }
        Ok(TriggerTable { entries })
    }
}
