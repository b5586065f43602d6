//! 高程剖面统计
//!
//! 高程服务返回带高度的几何（[lon, lat, ele]）；此处只做汇总：累计爬升/下降、最低/最高点、
//! 以及按坡度分档的路段计数。高度值本身不在本地计算。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::tour::{LatLon, Stage, Steepness};

const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// 坡度阈值（百分比）
const MILD_GRADE: f64 = 4.0;
const STEEP_GRADE: f64 = 8.0;
const VERY_STEEP_GRADE: f64 = 12.0;

/// 过短的路段坡度噪声太大，不参与分档
const MIN_SEGMENT_M: f64 = 20.0;

/// POST /elevation 请求体
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElevationRequest {
    pub format_in: String,
    pub format_out: String,
    /// [lon, lat] 顺序
    pub geometry: Vec<[f64; 2]>,
}

impl ElevationRequest {
    pub fn for_points(points: &[LatLon]) -> Self {
        Self {
            format_in: "polyline".to_string(),
            format_out: "polyline".to_string(),
            geometry: points.iter().map(|[lat, lon]| [*lon, *lat]).collect(),
        }
    }
}

/// POST /elevation 响应体
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElevationProfile {
    /// [lon, lat, ele] 顺序
    pub geometry: Vec<[f64; 3]>,
}

/// 剖面汇总结果
#[derive(Clone, Debug, PartialEq)]
pub struct ElevationStats {
    pub gain_m: f64,
    pub loss_m: f64,
    pub min_m: f64,
    pub max_m: f64,
    pub steep_segments: BTreeMap<Steepness, u32>,
}

impl ElevationStats {
    /// 写回 Stage（覆盖已有的高程字段）
    pub fn apply_to(self, stage: &mut Stage) {
        stage.elevation_gain_m = self.gain_m;
        stage.elevation_loss_m = self.loss_m;
        stage.min_elevation_m = Some(self.min_m);
        stage.max_elevation_m = Some(self.max_m);
        stage.steep_segments = Some(self.steep_segments);
    }
}

fn haversine_m(a: [f64; 2], b: [f64; 2]) -> f64 {
    let (lat1, lon1) = (a[0].to_radians(), a[1].to_radians());
    let (lat2, lon2) = (b[0].to_radians(), b[1].to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

fn classify(grade_pct: f64) -> Option<Steepness> {
    let grade = grade_pct.abs();
    if grade >= VERY_STEEP_GRADE {
        Some(Steepness::VerySteep)
    } else if grade >= STEEP_GRADE {
        Some(Steepness::Steep)
    } else if grade >= MILD_GRADE {
        Some(Steepness::Mild)
    } else {
        None
    }
}

/// 汇总剖面；少于两个点或高度非有限值时返回 None
pub fn summarize(profile: &ElevationProfile) -> Option<ElevationStats> {
    let geometry = &profile.geometry;
    if geometry.len() < 2 || geometry.iter().any(|p| p.iter().any(|v| !v.is_finite())) {
        return None;
    }

    let mut stats = ElevationStats {
        gain_m: 0.0,
        loss_m: 0.0,
        min_m: f64::INFINITY,
        max_m: f64::NEG_INFINITY,
        steep_segments: BTreeMap::new(),
    };
    for p in geometry {
        stats.min_m = stats.min_m.min(p[2]);
        stats.max_m = stats.max_m.max(p[2]);
    }

    for pair in geometry.windows(2) {
        let ([lon1, lat1, ele1], [lon2, lat2, ele2]) = (pair[0], pair[1]);
        let climb = ele2 - ele1;
        if climb > 0.0 {
            stats.gain_m += climb;
        } else {
            stats.loss_m -= climb;
        }

        let length = haversine_m([lat1, lon1], [lat2, lon2]);
        if length < MIN_SEGMENT_M {
            continue;
        }
        if let Some(category) = classify(climb / length * 100.0) {
            *stats.steep_segments.entry(category).or_insert(0) += 1;
        }
    }

    Some(stats)
}
