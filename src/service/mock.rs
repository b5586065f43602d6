//! Mock 路线服务（用于测试与离线演示，无需后端）
//!
//! 粗略分段、单段详情、规划结果均可预设；未预设的单段详情按序号生成一个成功响应。
//! 每个端点的调用次数可读取，便于断言「零网络调用」之类的行为。

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::service::{PlanRequest, ServiceError, TourService};
use crate::tour::{ElevationProfile, ElevationRequest, Stage};

/// 各端点调用计数
#[derive(Debug, Default)]
pub struct CallCounts {
    pub coarse: AtomicUsize,
    pub details: AtomicUsize,
    pub elevation: AtomicUsize,
    pub plan: AtomicUsize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.coarse.load(Ordering::SeqCst)
            + self.details.load(Ordering::SeqCst)
            + self.elevation.load(Ordering::SeqCst)
            + self.plan.load(Ordering::SeqCst)
    }
}

/// 可预设响应的 Mock 服务
#[derive(Debug)]
pub struct MockTourService {
    coarse: Mutex<Result<Vec<Stage>, ServiceError>>,
    details: Mutex<HashMap<usize, Result<Value, ServiceError>>>,
    elevation: Mutex<Result<ElevationProfile, ServiceError>>,
    plan: Mutex<Result<Vec<Stage>, ServiceError>>,
    delay: Mutex<Option<Duration>>,
    pub calls: CallCounts,
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// 演示路线：München -> Kassel -> Hamburg
pub fn demo_stages() -> Vec<Stage> {
    vec![
        Stage::new(vec![[48.1351, 11.582], [49.4521, 11.0767], [51.3127, 9.4797]], 395.2),
        Stage::new(vec![[51.3127, 9.4797], [52.3759, 9.732], [53.5511, 9.9937]], 310.8),
    ]
}

impl Default for MockTourService {
    fn default() -> Self {
        Self::new(demo_stages())
    }
}

impl MockTourService {
    pub fn new(coarse: Vec<Stage>) -> Self {
        Self {
            coarse: Mutex::new(Ok(coarse)),
            details: Mutex::new(HashMap::new()),
            elevation: Mutex::new(Err(ServiceError::Status(503))),
            plan: Mutex::new(Err(ServiceError::Rejected("no route found".to_string()))),
            delay: Mutex::new(None),
            calls: CallCounts::default(),
        }
    }

    pub fn set_coarse(&self, result: Result<Vec<Stage>, ServiceError>) {
        *lock(&self.coarse) = result;
    }

    /// 预设第 index 段（按粗略分段中的位置）的详情响应
    pub fn set_details(&self, index: usize, result: Result<Value, ServiceError>) {
        lock(&self.details).insert(index, result);
    }

    pub fn set_elevation(&self, result: Result<ElevationProfile, ServiceError>) {
        *lock(&self.elevation) = result;
    }

    pub fn set_plan(&self, result: Result<Vec<Stage>, ServiceError>) {
        *lock(&self.plan) = result;
    }

    /// 每次调用前等待，模拟慢网络
    pub fn set_delay(&self, delay: Option<Duration>) {
        *lock(&self.delay) = delay;
    }

    async fn pause(&self) {
        let delay = *lock(&self.delay);
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
    }

    fn index_of(&self, stage: &Stage) -> Option<usize> {
        match &*lock(&self.coarse) {
            Ok(stages) => stages.iter().position(|s| s.points == stage.points),
            Err(_) => None,
        }
    }

    fn generated_details(index: usize) -> Value {
        json!({
            "start_location": format!("Etappe {} Start", index + 1),
            "end_location": format!("Etappe {} Ziel", index + 1),
            "elevation_gain_m": 420.0,
            "elevation_loss_m": 380.0,
            "min_elevation_m": 120.0,
            "max_elevation_m": 640.0,
            "estimated_time_h": 4.5,
        })
    }
}

#[async_trait]
impl TourService for MockTourService {
    async fn coarse_stages(&self, _stage_length_km: f64) -> Result<Vec<Stage>, ServiceError> {
        self.calls.coarse.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        lock(&self.coarse).clone()
    }

    async fn stage_details(&self, stage: &Stage) -> Result<Value, ServiceError> {
        self.calls.details.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        let index = self
            .index_of(stage)
            .ok_or_else(|| ServiceError::Malformed("unknown stage".to_string()))?;
        let scripted = lock(&self.details).get(&index).cloned();
        scripted.unwrap_or_else(|| Ok(Self::generated_details(index)))
    }

    async fn elevation(&self, _request: &ElevationRequest) -> Result<ElevationProfile, ServiceError> {
        self.calls.elevation.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        lock(&self.elevation).clone()
    }

    async fn route_to_stages(&self, _request: &PlanRequest) -> Result<Vec<Stage>, ServiceError> {
        self.calls.plan.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        lock(&self.plan).clone()
    }
}
