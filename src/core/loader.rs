//! 行程加载器：核心状态机
//!
//! 一次加载周期：读快照（可信则直接发布）-> 获取粗略分段 -> 按顺序逐段补全（更新进度）
//! -> 发布行程 -> 全部 complete 时写快照。
//!
//! 并发约束：
//! - 加载/重算/规划共用一把周期锁，后到的调用排在进行中的周期之后；
//! - 每个周期领取一个递增的 generation，只有 generation 仍是最新时才能提交状态或写快照，
//!   被 `delete` 等操作取代的旧周期结果直接丢弃。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use tokio::sync::{watch, Mutex, MutexGuard};

use crate::config::AppConfig;
use crate::core::{TourError, TourEvent, TourState};
use crate::service::TourService;
use crate::storage::TourStore;
use crate::tour::{DetailEnricher, LatLon, Stage, Tour};

/// 加载器参数
#[derive(Clone, Debug, PartialEq)]
pub struct LoaderSettings {
    pub stage_length_km: f64,
    /// 1 = 严格串行；>1 时并行请求、按顺序收集
    pub concurrency: usize,
    pub elevation_fallback: bool,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            stage_length_km: 300.0,
            concurrency: 1,
            elevation_fallback: true,
        }
    }
}

impl From<&AppConfig> for LoaderSettings {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            stage_length_km: cfg.planning.stage_length_km,
            concurrency: cfg.enrichment.concurrency.max(1),
            elevation_fallback: cfg.enrichment.elevation_fallback,
        }
    }
}

pub struct TourLoader {
    service: Arc<dyn TourService>,
    enricher: DetailEnricher,
    store: TourStore,
    settings: LoaderSettings,
    state: watch::Sender<TourState>,
    generation: AtomicU64,
    cycle: Mutex<()>,
    persist: Mutex<()>,
}

impl TourLoader {
    pub fn new(service: Arc<dyn TourService>, store: TourStore, settings: LoaderSettings) -> Self {
        let (state, _) = watch::channel(TourState::default());
        Self {
            enricher: DetailEnricher::new(service.clone(), settings.elevation_fallback),
            service,
            store,
            settings,
            state,
            generation: AtomicU64::new(0),
            cycle: Mutex::new(()),
            persist: Mutex::new(()),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<TourState> {
        self.state.subscribe()
    }

    /// 当前状态快照
    pub fn state(&self) -> TourState {
        self.state.borrow().clone()
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn store(&self) -> &TourStore {
        &self.store
    }

    pub fn settings(&self) -> &LoaderSettings {
        &self.settings
    }

    pub(crate) fn service(&self) -> &Arc<dyn TourService> {
        &self.service
    }

    pub(crate) async fn lock_cycle(&self) -> MutexGuard<'_, ()> {
        self.cycle.lock().await
    }

    /// 领取新的 generation，之前的周期随之失效
    pub(crate) fn begin(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// 无条件应用事件（选中、点击等与加载周期无关的事件）
    pub(crate) fn dispatch(&self, event: TourEvent) {
        self.state.send_modify(|s| *s = std::mem::take(s).reduce(event));
    }

    /// 仅当 generation 仍是最新时应用事件；返回是否已提交
    pub(crate) fn commit(&self, generation: u64, event: TourEvent) -> bool {
        let committed = self.state.send_if_modified(|s| {
            if !self.is_current(generation) {
                return false;
            }
            *s = std::mem::take(s).reduce(event);
            true
        });
        if !committed {
            tracing::debug!(generation, current = self.generation(), "stale load result discarded");
        }
        committed
    }

    /// 写快照：与 `delete` 互斥，且要求 generation 仍是最新
    pub(crate) async fn persist(&self, generation: u64, tour: &Tour) {
        if !tour.is_persist_eligible() {
            tracing::info!(
                stages = tour.len(),
                degraded = tour.degraded_count(),
                "tour not persisted: incomplete stages"
            );
            return;
        }
        let _guard = self.persist.lock().await;
        if !self.is_current(generation) {
            tracing::debug!(generation, "superseded tour not persisted");
            return;
        }
        if let Err(e) = self.store.write(tour).await {
            tracing::warn!(error = %e, "failed to persist tour");
        }
    }

    /// 加载行程；`force_reload` 为 false 时优先使用可信快照
    pub async fn load(&self, force_reload: bool) -> Result<(), TourError> {
        let _cycle = self.lock_cycle().await;
        let generation = self.begin();
        tracing::info!(generation, force_reload, "load cycle started");
        self.commit(generation, TourEvent::LoadStarted { invalidate: false });

        if !force_reload {
            let cached = self.store.read().await;
            if TourStore::is_complete(&cached) {
                tracing::info!(stages = cached.len(), "tour restored from store");
                self.commit(
                    generation,
                    TourEvent::LoadSucceeded {
                        tour: cached,
                        select_first: false,
                    },
                );
                return Ok(());
            }
            if !cached.is_empty() {
                tracing::info!(
                    stages = cached.len(),
                    degraded = cached.degraded_count(),
                    "stored tour incomplete, refetching"
                );
            }
        }

        // 重新获取期间展示空行程，旧选中随之清除
        self.commit(generation, TourEvent::LoadStarted { invalidate: true });
        self.fetch_and_enrich(generation).await
    }

    /// 重算：清进度、删快照后强制重新获取
    pub async fn recompute(&self) -> Result<(), TourError> {
        let _cycle = self.lock_cycle().await;
        let generation = self.begin();
        tracing::info!(generation, "recompute started");
        self.commit(generation, TourEvent::LoadStarted { invalidate: true });
        {
            let _guard = self.persist.lock().await;
            if let Err(e) = self.store.clear().await {
                tracing::warn!(error = %e, "failed to invalidate stored tour");
            }
        }
        self.fetch_and_enrich(generation).await
    }

    async fn fetch_coarse(&self) -> Result<Vec<Stage>, TourError> {
        let stages = self
            .service
            .coarse_stages(self.settings.stage_length_km)
            .await
            .map_err(|e| TourError::PlanningUnavailable(e.to_string()))?;
        if stages.is_empty() {
            return Err(TourError::PlanningUnavailable("no stages returned".to_string()));
        }
        if let Some(i) = stages.iter().position(|s| !s.is_well_formed()) {
            return Err(TourError::PlanningUnavailable(format!("stage {} is malformed", i)));
        }
        Ok(stages)
    }

    async fn fetch_and_enrich(&self, generation: u64) -> Result<(), TourError> {
        let coarse = match self.fetch_coarse().await {
            Ok(stages) => stages,
            Err(e) => {
                tracing::warn!(error = %e, "coarse fetch failed");
                self.commit(generation, TourEvent::LoadFailed { error: e.to_string() });
                return Err(e);
            }
        };
        tracing::info!(stages = coarse.len(), "coarse stages fetched");
        self.commit(generation, TourEvent::EnrichmentStarted { total: coarse.len() });

        let Some(tour) = self.enrich_all(generation, &coarse).await else {
            return Ok(());
        };
        tracing::info!(
            stages = tour.len(),
            degraded = tour.degraded_count(),
            "enrichment finished"
        );

        self.commit(
            generation,
            TourEvent::LoadSucceeded {
                tour: tour.clone(),
                select_first: false,
            },
        );
        self.persist(generation, &tour).await;
        Ok(())
    }

    /// 按行驶顺序补全每一段；周期被取代时返回 None
    async fn enrich_all(&self, generation: u64, coarse: &[Stage]) -> Option<Tour> {
        let total = coarse.len();
        let mut tour = Tour::new();

        if self.settings.concurrency <= 1 {
            for (index, stage) in coarse.iter().enumerate() {
                if !self.commit(generation, TourEvent::StageProgressed { current: index + 1, total }) {
                    return None;
                }
                tour.push(self.enricher.enrich(stage).await);
            }
        } else {
            // 并行请求，buffered 保证结果按原顺序产出，进度仍单调递增
            let mut results = stream::iter(coarse.to_vec())
                .map(|stage| {
                    let enricher = self.enricher.clone();
                    async move { enricher.enrich(&stage).await }
                })
                .buffered(self.settings.concurrency)
                .enumerate();
            while let Some((index, stage)) = results.next().await {
                if !self.commit(generation, TourEvent::StageProgressed { current: index + 1, total }) {
                    return None;
                }
                tour.push(stage);
            }
        }

        self.is_current(generation).then_some(tour)
    }

    /// 删除行程：清快照、清行程与选中，并使进行中的周期失效
    pub async fn delete(&self) -> Result<(), TourError> {
        let _guard = self.persist.lock().await;
        let generation = self.begin();
        tracing::info!(generation, "tour deleted");
        let result = self.store.clear().await;
        self.dispatch(TourEvent::TourCleared);
        result
    }

    /// 手动保存当前行程；不完整的行程不写入，返回 false
    pub async fn save(&self) -> Result<bool, TourError> {
        let tour = self.state.borrow().tour.clone();
        if !tour.is_persist_eligible() {
            tracing::warn!(
                stages = tour.len(),
                degraded = tour.degraded_count(),
                "save refused: tour incomplete"
            );
            return Ok(false);
        }
        let _guard = self.persist.lock().await;
        self.store.write(&tour).await?;
        Ok(true)
    }

    pub fn select(&self, index: usize) {
        self.dispatch(TourEvent::StageSelected { index });
    }

    pub fn clear_selection(&self) {
        self.dispatch(TourEvent::SelectionCleared);
    }

    pub fn click_map(&self, coordinate: LatLon) {
        self.dispatch(TourEvent::MapClicked { coordinate });
    }
}
