//! 固定响应适配器（用于测试与离线运行，无需网络）
//!
//! 返回预设的响应或错误，可选模拟延迟，并记录被调用次数与最近一次请求。

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::core::LookupError;
use crate::lookup::{AdapterId, LookupAdapter, LookupRequest, LookupResponse};

/// 固定响应适配器
pub struct StaticAdapter {
    id: AdapterId,
    result: Result<LookupResponse, LookupError>,
    latency: Duration,
    calls: Arc<AtomicUsize>,
    last_request: Arc<Mutex<Option<LookupRequest>>>,
}

impl StaticAdapter {
    pub fn ok(id: AdapterId, response: LookupResponse) -> Self {
        Self::with_result(id, Ok(response))
    }

    pub fn failing(id: AdapterId, error: LookupError) -> Self {
        Self::with_result(id, Err(error))
    }

    fn with_result(id: AdapterId, result: Result<LookupResponse, LookupError>) -> Self {
        Self {
            id,
            result,
            latency: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// 调用计数（注册后仍可读取）
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }

    pub fn last_request_handle(&self) -> Arc<Mutex<Option<LookupRequest>>> {
        self.last_request.clone()
    }
}

#[async_trait]
impl LookupAdapter for StaticAdapter {
    fn id(&self) -> AdapterId {
        self.id
    }

    async fn fetch(&self, request: &LookupRequest) -> Result<LookupResponse, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.result.clone()
    }
}
