//! 路线服务抽象
//!
//! 所有后端（HTTP / Mock）实现 TourService：粗略分段、单段详情、高程剖面、按地名规划分段。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tour::{ElevationProfile, ElevationRequest, Stage};

/// 服务调用错误（传输层 / 协议层）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("Malformed response: {0}")]
    Malformed(String),

    /// 服务端返回的结构化错误（原样透传）
    #[error("{0}")]
    Rejected(String),
}

/// POST /route_to_stages 请求体
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub stops: Vec<String>,
    pub stage_length_km: f64,
}

impl PlanRequest {
    /// 逗号分隔的途经点：去空白、去空项
    pub fn parse_stops(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }

    /// 反向行程：起终点互换，途经点倒序
    pub fn reversed(&self) -> Self {
        Self {
            start: self.end.clone(),
            end: self.start.clone(),
            stops: self.stops.iter().rev().cloned().collect(),
            stage_length_km: self.stage_length_km,
        }
    }
}

/// 路线服务 trait
#[async_trait]
pub trait TourService: Send + Sync {
    /// GET /stages：粗略分段
    async fn coarse_stages(&self, stage_length_km: f64) -> Result<Vec<Stage>, ServiceError>;

    /// POST /stage_details：单段详情（部分 Stage 字段，JSON 对象）
    async fn stage_details(&self, stage: &Stage) -> Result<serde_json::Value, ServiceError>;

    /// POST /elevation：带高度的几何
    async fn elevation(&self, request: &ElevationRequest) -> Result<ElevationProfile, ServiceError>;

    /// POST /route_to_stages：已补全的分段，或服务端的结构化错误
    async fn route_to_stages(&self, request: &PlanRequest) -> Result<Vec<Stage>, ServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stops() {
        assert_eq!(
            PlanRequest::parse_stops(" Augsburg, Ulm,, ,Stuttgart "),
            vec!["Augsburg", "Ulm", "Stuttgart"]
        );
        assert!(PlanRequest::parse_stops("").is_empty());
    }

    #[test]
    fn test_reversed() {
        let req = PlanRequest {
            start: "München".into(),
            end: "Hamburg".into(),
            stops: vec!["Nürnberg".into(), "Kassel".into()],
            stage_length_km: 300.0,
        };
        let rev = req.reversed();
        assert_eq!(rev.start, "Hamburg");
        assert_eq!(rev.end, "München");
        assert_eq!(rev.stops, vec!["Kassel", "Nürnberg"]);
    }

    #[test]
    fn test_rejected_displays_verbatim() {
        assert_eq!(ServiceError::Rejected("no route found".into()).to_string(), "no route found");
    }
}
