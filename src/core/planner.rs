//! 路线规划适配：起点 / 终点 / 途经点 -> route_to_stages -> 整体替换当前行程
//!
//! 返回的已是补全后的分段，不再走逐段补全。失败时只展示错误，当前行程保持不变，
//! 直到新行程确认成功才替换。

use std::sync::Arc;

use crate::core::{TourError, TourEvent, TourLoader};
use crate::service::PlanRequest;
use crate::tour::Tour;

/// 路线规划器：共享加载器的周期锁与 generation
#[derive(Clone)]
pub struct RoutePlanner {
    loader: Arc<TourLoader>,
}

impl RoutePlanner {
    pub fn new(loader: Arc<TourLoader>) -> Self {
        Self { loader }
    }

    /// 构造请求：起终点不能为空
    pub fn request(&self, start: &str, end: &str, stops: &[String]) -> Result<PlanRequest, TourError> {
        let (start, end) = (start.trim(), end.trim());
        if start.is_empty() || end.is_empty() {
            return Err(TourError::InvalidRequest("start and end are required".to_string()));
        }
        Ok(PlanRequest {
            start: start.to_string(),
            end: end.to_string(),
            stops: stops
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            stage_length_km: self.loader.settings().stage_length_km,
        })
    }

    pub async fn plan_route(&self, start: &str, end: &str, stops: &[String]) -> Result<Tour, TourError> {
        match self.request(start, end, stops) {
            Ok(request) => self.submit(request).await,
            Err(e) => self.reject(e),
        }
    }

    /// 反向规划：起终点互换，途经点倒序
    pub async fn reverse(&self, start: &str, end: &str, stops: &[String]) -> Result<Tour, TourError> {
        match self.request(start, end, stops) {
            Ok(request) => self.submit(request.reversed()).await,
            Err(e) => self.reject(e),
        }
    }

    fn reject(&self, e: TourError) -> Result<Tour, TourError> {
        self.loader.dispatch(TourEvent::PlanRejected { error: e.to_string() });
        Err(e)
    }

    pub async fn submit(&self, request: PlanRequest) -> Result<Tour, TourError> {
        let loader = &self.loader;
        let _cycle = loader.lock_cycle().await;
        let generation = loader.begin();
        tracing::info!(generation, start = %request.start, end = %request.end, "route planning started");
        loader.commit(generation, TourEvent::LoadStarted { invalidate: false });

        let result = match loader.service().route_to_stages(&request).await {
            Ok(stages) if stages.is_empty() => {
                Err(TourError::PlanningUnavailable("no stages returned".to_string()))
            }
            Ok(stages) => match stages.iter().position(|s| !s.is_well_formed()) {
                Some(i) => Err(TourError::PlanningUnavailable(format!("planned stage {} is malformed", i))),
                None => Ok(Tour::from_stages(stages)),
            },
            Err(e) => Err(TourError::from_planning(e)),
        };

        let tour = match result {
            Ok(tour) => tour,
            Err(e) => {
                tracing::warn!(error = %e, "route planning failed, keeping current tour");
                loader.commit(generation, TourEvent::PlanRejected { error: e.to_string() });
                return Err(e);
            }
        };

        tracing::info!(stages = tour.len(), distance_km = tour.total_distance_km(), "route planned");
        loader.commit(
            generation,
            TourEvent::LoadSucceeded {
                tour: tour.clone(),
                select_first: true,
            },
        );
        loader.persist(generation, &tour).await;
        Ok(tour)
    }
}
