//! 外部查询：适配器 trait、注册表、各数据源实现（天气 / 百科 / 狗 / 猫）与固定响应 Mock

pub mod animal;
pub mod article;
pub mod http;
pub mod mock;
pub mod registry;
pub mod types;
pub mod weather;

pub use animal::{CatAdapter, DogAdapter};
pub use article::ArticleAdapter;
pub use mock::StaticAdapter;
pub use registry::{AdapterRegistry, LookupAdapter};
pub use types::{
    AdapterId, ArticlePage, ArticleQuery, ArticleResponse, CatImage, ChanceOfRain, DogResponse,
    Forecast, ForecastDetail, ForecastImage, LookupRequest, LookupResponse, WeatherResponse,
};
pub use weather::WeatherAdapter;
