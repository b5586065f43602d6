//! 行程数据模型：Stage（单段）与 Tour（按行驶顺序排列的多段）
//!
//! Stage 分两类：complete（起终点地名已知）与 degraded（起终点为 UNKNOWN_LOCATION 哨兵值）；
//! 两类都可展示，但只有全部为 complete 的 Tour 才允许写入持久化存储。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// 补全失败时的地名哨兵值
pub const UNKNOWN_LOCATION: &str = "Unbekannt";

/// (纬度, 经度)
pub type LatLon = [f64; 2];

/// 坡度分类（固定三档）
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Steepness {
    Mild,
    Steep,
    VerySteep,
}

/// 单段行程
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    /// 路径几何，至少两个点
    pub points: Vec<LatLon>,
    #[serde(default)]
    pub distance_km: f64,
    #[serde(default)]
    pub elevation_gain_m: f64,
    #[serde(default)]
    pub elevation_loss_m: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_elevation_m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_elevation_m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_location: Option<String>,
    #[serde(default)]
    pub estimated_time_h: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steep_segments: Option<BTreeMap<Steepness, u32>>,
}

fn is_known(location: &Option<String>) -> bool {
    matches!(location.as_deref(), Some(name) if !name.trim().is_empty() && name != UNKNOWN_LOCATION)
}

impl Stage {
    pub fn new(points: Vec<LatLon>, distance_km: f64) -> Self {
        Self {
            points,
            distance_km,
            ..Self::default()
        }
    }

    /// 起终点地名均已知（且不是哨兵值）
    pub fn is_complete(&self) -> bool {
        is_known(&self.start_location) && is_known(&self.end_location)
    }

    /// 几何与距离合法：至少两个点、距离非负且有限
    pub fn is_well_formed(&self) -> bool {
        self.points.len() >= 2
            && self.distance_km.is_finite()
            && self.distance_km >= 0.0
            && self
                .points
                .iter()
                .all(|[lat, lon]| lat.is_finite() && lon.is_finite())
    }

    /// 补全失败时的降级记录：保留几何与距离，地名为哨兵值，派生计数清零
    pub fn degraded(coarse: &Stage) -> Self {
        Self {
            points: coarse.points.clone(),
            distance_km: coarse.distance_km,
            elevation_gain_m: 0.0,
            elevation_loss_m: 0.0,
            min_elevation_m: None,
            max_elevation_m: None,
            start_location: Some(UNKNOWN_LOCATION.to_string()),
            end_location: Some(UNKNOWN_LOCATION.to_string()),
            estimated_time_h: 0.0,
            steep_segments: None,
        }
    }

    pub fn has_elevation_stats(&self) -> bool {
        self.min_elevation_m.is_some() && self.max_elevation_m.is_some()
    }

    /// 包围盒 (south-west, north-east)，供地图聚焦
    pub fn bounds(&self) -> Option<(LatLon, LatLon)> {
        let first = self.points.first()?;
        let init = (*first, *first);
        Some(self.points.iter().fold(init, |(sw, ne), [lat, lon]| {
            (
                [sw[0].min(*lat), sw[1].min(*lon)],
                [ne[0].max(*lat), ne[1].max(*lon)],
            )
        }))
    }
}

/// 多段行程，插入顺序即行驶顺序
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tour {
    stages: Vec<Stage>,
}

impl Tour {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_stages(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    pub fn push(&mut self, stage: Stage) {
        self.stages.push(stage);
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn into_stages(self) -> Vec<Stage> {
        self.stages
    }

    pub fn get(&self, index: usize) -> Option<&Stage> {
        self.stages.get(index)
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// 非空且每一段都 complete 时才允许持久化
    pub fn is_persist_eligible(&self) -> bool {
        !self.stages.is_empty() && self.stages.iter().all(Stage::is_complete)
    }

    pub fn degraded_count(&self) -> usize {
        self.stages.iter().filter(|s| !s.is_complete()).count()
    }

    pub fn total_distance_km(&self) -> f64 {
        self.stages.iter().map(|s| s.distance_km).sum()
    }

    pub fn total_estimated_time_h(&self) -> f64 {
        self.stages.iter().map(|s| s.estimated_time_h).sum()
    }
}

impl From<Vec<Stage>> for Tour {
    fn from(stages: Vec<Stage>) -> Self {
        Self::from_stages(stages)
    }
}
