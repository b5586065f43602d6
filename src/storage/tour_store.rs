//! 行程快照持久化
//!
//! 固定键下保存一条文本记录：`{"version":1,"saved_at":"...","stages":[...]}`。
//! 读取时兼容两种旧格式（裸 Stage 数组、`{stages: [...]}`），写入只用当前格式。
//! 内容损坏时按空存储处理，不让调用方失败。

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::TourError;
use crate::storage::KeyValueStore;
use crate::tour::{Stage, Tour};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    saved_at: String,
    stages: Vec<Stage>,
}

/// 解析存储内容；无法识别的形状或不合法的 Stage 视为损坏
fn decode(raw: &str) -> Result<Tour, TourError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| TourError::StoreCorrupt(e.to_string()))?;
    let stages = match value {
        Value::Array(_) => value,
        Value::Object(mut map) => {
            if let Some(version) = map.get("version") {
                if version.as_u64() != Some(u64::from(SNAPSHOT_VERSION)) {
                    return Err(TourError::StoreCorrupt(format!("unsupported version {}", version)));
                }
            }
            map.remove("stages")
                .filter(Value::is_array)
                .ok_or_else(|| TourError::StoreCorrupt("missing `stages` array".to_string()))?
        }
        other => {
            return Err(TourError::StoreCorrupt(format!("unexpected payload: {}", other)));
        }
    };
    let stages: Vec<Stage> =
        serde_json::from_value(stages).map_err(|e| TourError::StoreCorrupt(e.to_string()))?;
    if let Some(i) = stages.iter().position(|s| !s.is_well_formed()) {
        return Err(TourError::StoreCorrupt(format!("stage {} is malformed", i)));
    }
    Ok(Tour::from_stages(stages))
}

fn encode(tour: &Tour) -> Result<String, TourError> {
    let snapshot = Snapshot {
        version: SNAPSHOT_VERSION,
        saved_at: chrono::Utc::now().to_rfc3339(),
        stages: tour.stages().to_vec(),
    };
    serde_json::to_string(&snapshot).map_err(|e| TourError::Storage(e.to_string()))
}

/// 行程快照存储
#[derive(Clone)]
pub struct TourStore {
    kv: Arc<dyn KeyValueStore>,
    key: String,
}

impl TourStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self { kv, key: key.into() }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// 非空且每段都 complete 的快照才可信任
    pub fn is_complete(tour: &Tour) -> bool {
        tour.is_persist_eligible()
    }

    /// 读取快照：不存在返回 None，内容损坏返回 StoreCorrupt
    pub async fn read_checked(&self) -> Result<Option<Tour>, TourError> {
        match self.kv.get(&self.key).await? {
            Some(raw) => decode(&raw).map(Some),
            None => Ok(None),
        }
    }

    /// 读取快照；缺失、损坏、读失败一律返回空 Tour
    pub async fn read(&self) -> Tour {
        match self.read_checked().await {
            Ok(Some(tour)) => tour,
            Ok(None) => Tour::new(),
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "discarding unreadable tour snapshot");
                Tour::new()
            }
        }
    }

    /// 写入快照。调用方负责可持久化检查；此处再拦一次，不完整的行程直接跳过
    pub async fn write(&self, tour: &Tour) -> Result<(), TourError> {
        if !Self::is_complete(tour) {
            tracing::warn!(
                stages = tour.len(),
                degraded = tour.degraded_count(),
                "refusing to persist incomplete tour"
            );
            return Ok(());
        }
        let raw = encode(tour)?;
        self.kv.set(&self.key, &raw).await?;
        tracing::debug!(key = %self.key, stages = tour.len(), "tour snapshot written");
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), TourError> {
        self.kv.remove(&self.key).await
    }
}
