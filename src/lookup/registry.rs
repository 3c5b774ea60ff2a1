//! 适配器注册表
//!
//! 所有外部数据源实现 LookupAdapter（id / fetch），由 AdapterRegistry 按 AdapterId 注册与查找；
//! fetch 时统一施加超时，并输出一条结构化审计日志。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{timeout, Instant};

use crate::core::LookupError;
use crate::lookup::{AdapterId, LookupRequest, LookupResponse};

/// 外部查询适配器：输入查询参数，输出服务特有的响应形状或失败
#[async_trait]
pub trait LookupAdapter: Send + Sync {
    fn id(&self) -> AdapterId;

    async fn fetch(&self, request: &LookupRequest) -> Result<LookupResponse, LookupError>;
}

/// 适配器注册表：每个 AdapterId 至多一个实现
pub struct AdapterRegistry {
    adapters: HashMap<AdapterId, Arc<dyn LookupAdapter>>,
    timeout: Duration,
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new(10)
    }
}

impl AdapterRegistry {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            adapters: HashMap::new(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// 注册适配器；同 id 的旧实现被替换
    pub fn register(&mut self, adapter: impl LookupAdapter + 'static) {
        self.register_arc(Arc::new(adapter));
    }

    pub fn register_arc(&mut self, adapter: Arc<dyn LookupAdapter>) {
        self.adapters.insert(adapter.id(), adapter);
    }

    pub fn get(&self, id: AdapterId) -> Option<Arc<dyn LookupAdapter>> {
        self.adapters.get(&id).cloned()
    }

    pub fn ids(&self) -> Vec<AdapterId> {
        self.adapters.keys().copied().collect()
    }

    /// 按请求类型路由到对应适配器；超时返回 LookupError::Timeout
    pub async fn fetch(&self, request: &LookupRequest) -> Result<LookupResponse, LookupError> {
        let id = request.adapter();
        let adapter = self
            .get(id)
            .ok_or_else(|| LookupError::UnknownAdapter(id.to_string()))?;

        let start = Instant::now();
        let result = match timeout(self.timeout, adapter.fetch(request)).await {
            Ok(result) => result,
            Err(_) => Err(LookupError::Timeout(self.timeout.as_secs())),
        };

        let outcome = match &result {
            Ok(_) => "ok",
            Err(LookupError::Timeout(_)) => "timeout",
            Err(_) => "error",
        };
        tracing::info!(
            adapter = %id,
            outcome,
            duration_ms = start.elapsed().as_millis() as u64,
            "lookup"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::{DogResponse, StaticAdapter};

    #[tokio::test]
    async fn test_fetch_routes_by_request() {
        let mut registry = AdapterRegistry::default();
        registry.register(StaticAdapter::ok(
            AdapterId::Dog,
            LookupResponse::Dog(DogResponse {
                message: "http://x/dog.jpg".into(),
            }),
        ));

        let resp = registry.fetch(&LookupRequest::DogImage).await.unwrap();
        assert_eq!(resp.kind(), "dog");
    }

    #[tokio::test]
    async fn test_fetch_unknown_adapter() {
        let registry = AdapterRegistry::default();
        let err = registry.fetch(&LookupRequest::CatImage).await.unwrap_err();
        assert_eq!(err, LookupError::UnknownAdapter("cat".into()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_times_out() {
        let mut registry = AdapterRegistry::new(2);
        registry.register(
            StaticAdapter::ok(
                AdapterId::Cat,
                LookupResponse::Cat(vec![]),
            )
            .with_latency(Duration::from_secs(5)),
        );

        let err = registry.fetch(&LookupRequest::CatImage).await.unwrap_err();
        assert_eq!(err, LookupError::Timeout(2));
    }
}
