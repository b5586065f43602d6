//! 单段补全：粗略 Stage + 详情服务响应 -> 完整 Stage
//!
//! 任何失败（网络、非成功状态、响应格式错误）都在本地恢复为降级 Stage，不向上抛出。

use std::sync::Arc;

use serde_json::Value;

use crate::core::TourError;
use crate::service::TourService;
use crate::tour::{summarize, ElevationRequest, Stage, UNKNOWN_LOCATION};

/// 单段补全器：持有服务句柄与是否启用高程回退
#[derive(Clone)]
pub struct DetailEnricher {
    service: Arc<dyn TourService>,
    elevation_fallback: bool,
}

/// 以响应字段覆盖粗略字段（同名字段响应优先）
fn merge(coarse: &Stage, details: Value) -> Result<Stage, TourError> {
    let Value::Object(overlay) = details else {
        return Err(TourError::DetailUnavailable("details is not an object".to_string()));
    };
    let mut base = match serde_json::to_value(coarse) {
        Ok(Value::Object(map)) => map,
        _ => return Err(TourError::DetailUnavailable("coarse stage not serializable".to_string())),
    };
    for (key, value) in overlay {
        base.insert(key, value);
    }
    let merged: Stage = serde_json::from_value(Value::Object(base))
        .map_err(|e| TourError::DetailUnavailable(format!("malformed details: {}", e)))?;
    if !merged.is_well_formed() {
        return Err(TourError::DetailUnavailable("details broke stage geometry".to_string()));
    }
    Ok(merged)
}

impl DetailEnricher {
    pub fn new(service: Arc<dyn TourService>, elevation_fallback: bool) -> Self {
        Self {
            service,
            elevation_fallback,
        }
    }

    /// 补全一段；失败时返回降级 Stage
    pub async fn enrich(&self, coarse: &Stage) -> Stage {
        match self.try_enrich(coarse).await {
            Ok(stage) => stage,
            Err(e) => {
                tracing::warn!(error = %e, distance_km = coarse.distance_km, "stage degraded");
                Stage::degraded(coarse)
            }
        }
    }

    async fn try_enrich(&self, coarse: &Stage) -> Result<Stage, TourError> {
        let details = self
            .service
            .stage_details(coarse)
            .await
            .map_err(|e| TourError::DetailUnavailable(e.to_string()))?;
        let mut stage = merge(coarse, details)?;

        // 服务成功但没给地名：显式标为未知，避免被当作 complete
        for location in [&mut stage.start_location, &mut stage.end_location] {
            if location.as_deref().map_or(true, |s| s.trim().is_empty()) {
                *location = Some(UNKNOWN_LOCATION.to_string());
            }
        }

        if self.elevation_fallback && !stage.has_elevation_stats() {
            self.fill_elevation(&mut stage).await;
        }
        Ok(stage)
    }

    /// 高程回退：失败时保持 min/max 缺省，不影响 Stage 的完整性
    async fn fill_elevation(&self, stage: &mut Stage) {
        let request = ElevationRequest::for_points(&stage.points);
        match self.service.elevation(&request).await {
            Ok(profile) => match summarize(&profile) {
                Some(stats) => stats.apply_to(stage),
                None => tracing::debug!("elevation profile too short, skipped"),
            },
            Err(e) => tracing::debug!(error = %e, "elevation unavailable"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{MockTourService, ServiceError};
    use crate::tour::ElevationProfile;
    use serde_json::json;

    fn coarse() -> Vec<Stage> {
        vec![Stage::new(vec![[48.0, 11.0], [48.0, 11.01]], 0.74)]
    }

    #[tokio::test]
    async fn test_response_fields_take_precedence() {
        let svc = Arc::new(MockTourService::new(coarse()));
        svc.set_details(
            0,
            Ok(json!({
                "start_location": "München",
                "end_location": "Freising",
                "distance_km": 0.8,
                "min_elevation_m": 480.0,
                "max_elevation_m": 520.0
            })),
        );
        let enricher = DetailEnricher::new(svc.clone(), true);
        let stage = enricher.enrich(&coarse()[0]).await;
        assert!(stage.is_complete());
        assert_eq!(stage.distance_km, 0.8);
        assert_eq!(stage.points, coarse()[0].points);
        // 已有高程统计，不走回退
        assert_eq!(svc.calls.elevation.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failure_is_recovered_locally() {
        let svc = Arc::new(MockTourService::new(coarse()));
        svc.set_details(0, Err(ServiceError::Status(500)));
        let stage = DetailEnricher::new(svc, true).enrich(&coarse()[0]).await;
        assert_eq!(stage, Stage::degraded(&coarse()[0]));
    }

    #[tokio::test]
    async fn test_malformed_details_degrade() {
        let svc = Arc::new(MockTourService::new(coarse()));
        svc.set_details(0, Ok(json!({"points": "oops"})));
        let stage = DetailEnricher::new(svc.clone(), false).enrich(&coarse()[0]).await;
        assert!(!stage.is_complete());

        svc.set_details(0, Ok(json!(["not", "an", "object"])));
        let stage = DetailEnricher::new(svc, false).enrich(&coarse()[0]).await;
        assert_eq!(stage.start_location.as_deref(), Some(UNKNOWN_LOCATION));
    }

    #[tokio::test]
    async fn test_missing_names_marked_unknown() {
        let svc = Arc::new(MockTourService::new(coarse()));
        svc.set_details(0, Ok(json!({"start_location": "München"})));
        let stage = DetailEnricher::new(svc, false).enrich(&coarse()[0]).await;
        assert_eq!(stage.start_location.as_deref(), Some("München"));
        assert_eq!(stage.end_location.as_deref(), Some(UNKNOWN_LOCATION));
        assert!(!stage.is_complete());
    }

    #[tokio::test]
    async fn test_elevation_fallback_fills_stats() {
        let svc = Arc::new(MockTourService::new(coarse()));
        svc.set_details(0, Ok(json!({"start_location": "A", "end_location": "B"})));
        svc.set_elevation(Ok(ElevationProfile {
            geometry: vec![[11.0, 48.0, 500.0], [11.01, 48.0, 540.0]],
        }));
        let stage = DetailEnricher::new(svc, true).enrich(&coarse()[0]).await;
        assert!(stage.is_complete());
        assert_eq!(stage.min_elevation_m, Some(500.0));
        assert_eq!(stage.max_elevation_m, Some(540.0));
        assert_eq!(stage.elevation_gain_m, 40.0);
    }

    #[tokio::test]
    async fn test_elevation_failure_keeps_stage_complete() {
        let svc = Arc::new(MockTourService::new(coarse()));
        svc.set_details(0, Ok(json!({"start_location": "A", "end_location": "B"})));
        svc.set_elevation(Err(ServiceError::Network("down".into())));
        let stage = DetailEnricher::new(svc, true).enrich(&coarse()[0]).await;
        assert!(stage.is_complete());
        assert!(stage.min_elevation_m.is_none());
    }
}
