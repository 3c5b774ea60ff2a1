//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `HIBIKI__*` 覆盖（双下划线表示嵌套，如 `HIBIKI__APP__REPLY_DELAY_MS=500`）。

use std::path::PathBuf;

use serde::Deserialize;

use crate::reply::ResetPolicy;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSection,
    #[serde(default)]
    pub lookup: LookupSection,
}

/// [app] 段：显示名、回复延迟、重置策略、查询失败提示
#[derive(Debug, Clone, Deserialize)]
pub struct AppSection {
    #[serde(default = "default_name")]
    pub name: String,
    /// 匹配到回复后到可见之间的固定延迟（毫秒）
    #[serde(default = "default_reply_delay_ms")]
    pub reply_delay_ms: u64,
    /// clear() 时在途回复：cancel 丢弃 / deliver 照常追加
    #[serde(default)]
    pub reset_policy: ResetPolicy,
    /// 查询失败时是否追加提示消息（false 则静默）
    #[serde(default = "default_surface_lookup_failures")]
    pub surface_lookup_failures: bool,
    #[serde(default = "default_lookup_failure_text")]
    pub lookup_failure_text: String,
}

fn default_name() -> String {
    "Hibiki".to_string()
}

fn default_reply_delay_ms() -> u64 {
    1000
}

fn default_surface_lookup_failures() -> bool {
    true
}

fn default_lookup_failure_text() -> String {
    "ごめんなさい、情報を取得できませんでした🙇".to_string()
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: default_name(),
            reply_delay_ms: default_reply_delay_ms(),
            reset_policy: ResetPolicy::default(),
            surface_lookup_failures: default_surface_lookup_failures(),
            lookup_failure_text: default_lookup_failure_text(),
        }
    }
}

impl AppSection {
    /// 生效的失败提示文本
    pub fn failure_reply(&self) -> Option<String> {
        self.surface_lookup_failures
            .then(|| self.lookup_failure_text.clone())
    }
}

/// [lookup] 段：外部数据源地址、超时、天气地区代码、猫图 API Key
#[derive(Debug, Clone, Deserialize)]
pub struct LookupSection {
    /// 单次查询超时（秒）
    #[serde(default = "default_lookup_timeout_secs")]
    pub timeout_secs: u64,
    /// 天气地区代码，130010 = 东京
    #[serde(default = "default_weather_location")]
    pub weather_location: u32,
    #[serde(default = "default_weather_base_url")]
    pub weather_base_url: String,
    #[serde(default = "default_article_url")]
    pub article_url: String,
    #[serde(default = "default_dog_url")]
    pub dog_url: String,
    #[serde(default = "default_cat_url")]
    pub cat_url: String,
    pub cat_api_key: Option<String>,
}

fn default_lookup_timeout_secs() -> u64 {
    10
}

fn default_weather_location() -> u32 {
    130010
}

fn default_weather_base_url() -> String {
    "https://weather.tsukumijima.net/api/forecast/city".to_string()
}

fn default_article_url() -> String {
    "https://ja.wikipedia.org/w/api.php".to_string()
}

fn default_dog_url() -> String {
    "https://dog.ceo/api/breeds/image/random".to_string()
}

fn default_cat_url() -> String {
    "https://api.thecatapi.com/v1/images/search".to_string()
}

impl Default for LookupSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_lookup_timeout_secs(),
            weather_location: default_weather_location(),
            weather_base_url: default_weather_base_url(),
            article_url: default_article_url(),
            dog_url: default_dog_url(),
            cat_url: default_cat_url(),
            cat_api_key: None,
        }
    }
}

/// 从 config 目录加载配置，环境变量 HIBIKI__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 HIBIKI__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("HIBIKI")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.app.reply_delay_ms, 1000);
        assert_eq!(cfg.app.reset_policy, ResetPolicy::Cancel);
        assert_eq!(cfg.lookup.weather_location, 130010);
        assert!(cfg.app.failure_reply().is_some());
        assert!(cfg.lookup.cat_api_key.is_none());
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[app]
reply_delay_ms = 250
reset_policy = "deliver"
surface_lookup_failures = false

[lookup]
weather_location = 270000
cat_api_key = "secret"
"#
        )
        .unwrap();

        let cfg = load_config(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(cfg.app.reply_delay_ms, 250);
        assert_eq!(cfg.app.reset_policy, ResetPolicy::Deliver);
        assert!(cfg.app.failure_reply().is_none());
        assert_eq!(cfg.lookup.weather_location, 270000);
        assert_eq!(cfg.lookup.cat_api_key.as_deref(), Some("secret"));
        assert_eq!(cfg.lookup.timeout_secs, 10);
        assert_eq!(cfg.app.name, "Hibiki");
    }
}
