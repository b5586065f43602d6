//! HTTP 路线服务客户端
//!
//! 通过 reqwest 调用后端（可配置 base_url）。服务端常以 200 + `{"error": ...}` 报告业务错误，
//! 因此先解析 JSON 再看状态码。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::service::{PlanRequest, ServiceError, TourService};
use crate::tour::{ElevationProfile, ElevationRequest, Stage};

/// HTTP 客户端：持有 reqwest Client 与去掉尾部斜杠的 base_url
pub struct HttpTourService {
    client: Client,
    base_url: String,
}

impl HttpTourService {
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// 读取响应体为 JSON；`error` 字段优先于状态码
    async fn read_json(resp: reqwest::Response) -> Result<Value, ServiceError> {
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| ServiceError::Network(format!("Read body: {}", e)))?;
        let value: Value = match serde_json::from_str(&body) {
            Ok(v) => v,
            Err(_) if !status.is_success() => return Err(ServiceError::Status(status.as_u16())),
            Err(e) => return Err(ServiceError::Malformed(e.to_string())),
        };
        if let Some(err) = value.get("error").filter(|v| !v.is_null()) {
            let msg = match err {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            return Err(ServiceError::Rejected(msg));
        }
        if !status.is_success() {
            return Err(ServiceError::Status(status.as_u16()));
        }
        Ok(value)
    }

    fn parse_stages(mut value: Value) -> Result<Vec<Stage>, ServiceError> {
        let stages = value
            .get_mut("stages")
            .map(Value::take)
            .ok_or_else(|| ServiceError::Malformed("missing `stages`".to_string()))?;
        serde_json::from_value(stages).map_err(|e| ServiceError::Malformed(e.to_string()))
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<Value, ServiceError> {
        let resp = req
            .send()
            .await
            .map_err(|e| ServiceError::Network(format!("Request failed: {}", e)))?;
        Self::read_json(resp).await
    }
}

#[async_trait]
impl TourService for HttpTourService {
    async fn coarse_stages(&self, stage_length_km: f64) -> Result<Vec<Stage>, ServiceError> {
        tracing::debug!(base = %self.base_url, stage_length_km, "GET /stages");
        let value = self
            .send(
                self.client
                    .get(self.url("/stages"))
                    .query(&[("stage_length_km", stage_length_km)]),
            )
            .await?;
        Self::parse_stages(value)
    }

    async fn stage_details(&self, stage: &Stage) -> Result<Value, ServiceError> {
        let value = self
            .send(self.client.post(self.url("/stage_details")).json(stage))
            .await?;
        if !value.is_object() {
            return Err(ServiceError::Malformed("stage details is not an object".to_string()));
        }
        Ok(value)
    }

    async fn elevation(&self, request: &ElevationRequest) -> Result<ElevationProfile, ServiceError> {
        let value = self
            .send(self.client.post(self.url("/elevation")).json(request))
            .await?;
        serde_json::from_value(value).map_err(|e| ServiceError::Malformed(e.to_string()))
    }

    async fn route_to_stages(&self, request: &PlanRequest) -> Result<Vec<Stage>, ServiceError> {
        tracing::info!(start = %request.start, end = %request.end, stops = request.stops.len(), "POST /route_to_stages");
        let value = self
            .send(self.client.post(self.url("/route_to_stages")).json(request))
            .await?;
        Self::parse_stages(value)
    }
}
