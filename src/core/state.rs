//! 视图状态：单一不可变记录 + reducer
//!
//! 行程、加载阶段、进度、错误、选中段全部放在 TourState 中，每个事件经 `reduce` 生成新状态；
//! 替换行程的事件在同一次转换里重置选中段，避免悬空下标。

use serde::Serialize;

use crate::tour::{LatLon, Tour};

/// 加载阶段
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum TourPhase {
    #[default]
    Idle,
    /// 读取存储 / 获取粗略分段
    Loading,
    /// 逐段补全中
    Enriching,
    Ready,
    Failed,
}

/// 进度 (current, total)；total = 0 表示尚未知道总数
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
}

impl Progress {
    /// current 会被截到 total 以内
    pub fn new(current: usize, total: usize) -> Self {
        Self {
            current: current.min(total),
            total,
        }
    }

    pub fn is_known(&self) -> bool {
        self.total > 0
    }

    pub fn is_done(&self) -> bool {
        self.is_known() && self.current == self.total
    }

    /// 百分比（0..=100），总数未知时为 0
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.current * 100) / self.total) as u8
    }
}

/// 选中段与最近一次地图点击
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Selection {
    pub active_stage: Option<usize>,
    pub last_click: Option<LatLon>,
}

impl Selection {
    /// 越界下标清空选中（不 panic、不截断）
    pub fn select(&mut self, index: usize, tour_len: usize) {
        self.active_stage = (index < tour_len).then_some(index);
    }

    pub fn clear(&mut self) {
        self.active_stage = None;
    }

    pub fn current(&self) -> Option<usize> {
        self.active_stage
    }
}

/// 状态事件
#[derive(Clone, Debug, PartialEq)]
pub enum TourEvent {
    /// 开始一次加载；`invalidate` 为 true 时（重算）同时清空行程、选中与进度
    LoadStarted { invalidate: bool },
    /// 粗略分段已获取，开始补全
    EnrichmentStarted { total: usize },
    StageProgressed { current: usize, total: usize },
    /// 新行程替换当前行程；`select_first` 为 true 时选中第 0 段
    LoadSucceeded { tour: Tour, select_first: bool },
    /// 规划不可用：行程置空并展示错误
    LoadFailed { error: String },
    /// 规划被拒绝：展示错误，保留当前行程
    PlanRejected { error: String },
    StageSelected { index: usize },
    MapClicked { coordinate: LatLon },
    SelectionCleared,
    /// 删除行程（连同选中与进度）
    TourCleared,
}

/// UI 看到的完整状态
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TourState {
    pub phase: TourPhase,
    pub tour: Tour,
    pub progress: Progress,
    pub error_message: Option<String>,
    pub selection: Selection,
}

impl TourState {
    pub fn is_loading(&self) -> bool {
        matches!(self.phase, TourPhase::Loading | TourPhase::Enriching)
    }

    pub fn reduce(mut self, event: TourEvent) -> Self {
        match event {
            TourEvent::LoadStarted { invalidate } => {
                self.phase = TourPhase::Loading;
                if invalidate {
                    self.tour = Tour::new();
                    self.selection.clear();
                    self.progress = Progress::default();
                }
            }
            TourEvent::EnrichmentStarted { total } => {
                self.phase = TourPhase::Enriching;
                self.progress = Progress::new(0, total);
            }
            TourEvent::StageProgressed { current, total } => {
                self.progress = Progress::new(current, total);
            }
            TourEvent::LoadSucceeded { tour, select_first } => {
                self.selection.active_stage = (select_first && !tour.is_empty()).then_some(0);
                self.tour = tour;
                self.phase = TourPhase::Ready;
                self.error_message = None;
            }
            TourEvent::LoadFailed { error } => {
                self.tour = Tour::new();
                self.selection.clear();
                self.phase = TourPhase::Failed;
                self.error_message = Some(error);
            }
            TourEvent::PlanRejected { error } => {
                self.phase = if self.tour.is_empty() {
                    TourPhase::Failed
                } else {
                    TourPhase::Ready
                };
                self.error_message = Some(error);
            }
            TourEvent::StageSelected { index } => {
                let len = self.tour.len();
                self.selection.select(index, len);
            }
            TourEvent::MapClicked { coordinate } => {
                self.selection.last_click = Some(coordinate);
            }
            TourEvent::SelectionCleared => self.selection.clear(),
            TourEvent::TourCleared => {
                self.tour = Tour::new();
                self.selection.clear();
                self.progress = Progress::default();
                self.phase = TourPhase::Idle;
                self.error_message = None;
            }
        }
        self
    }

    /// 选中段的包围盒，供地图聚焦
    pub fn focus_bounds(&self) -> Option<(LatLon, LatLon)> {
        let index = self.selection.current()?;
        self.tour.get(index)?.bounds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tour::Stage;

    fn tour(n: usize) -> Tour {
        Tour::from_stages(
            (0..n)
                .map(|i| Stage::new(vec![[48.0 + i as f64, 11.0], [48.5 + i as f64, 11.5]], 50.0))
                .collect(),
        )
    }

    fn ready(n: usize) -> TourState {
        TourState::default().reduce(TourEvent::LoadSucceeded {
            tour: tour(n),
            select_first: false,
        })
    }

    #[test]
    fn test_progress_clamps() {
        assert_eq!(Progress::new(5, 3), Progress { current: 3, total: 3 });
        assert!(!Progress::default().is_known());
        assert!(Progress::new(3, 3).is_done());
        assert_eq!(Progress::new(1, 4).percent(), 25);
    }

    #[test]
    fn test_select_out_of_range_clears() {
        let state = ready(3).reduce(TourEvent::StageSelected { index: 1 });
        assert_eq!(state.selection.current(), Some(1));
        let state = state.reduce(TourEvent::StageSelected { index: 5 });
        assert_eq!(state.selection.current(), None);
    }

    #[test]
    fn test_tour_replacement_resets_selection() {
        let state = ready(3).reduce(TourEvent::StageSelected { index: 2 });
        let state = state.reduce(TourEvent::LoadSucceeded {
            tour: tour(1),
            select_first: false,
        });
        assert_eq!(state.selection.current(), None);
    }

    #[test]
    fn test_plan_success_selects_first() {
        let state = ready(2).reduce(TourEvent::LoadSucceeded {
            tour: tour(4),
            select_first: true,
        });
        assert_eq!(state.selection.current(), Some(0));
        assert_eq!(state.tour.len(), 4);
    }

    #[test]
    fn test_recompute_start_invalidates() {
        let state = ready(3)
            .reduce(TourEvent::StageSelected { index: 1 })
            .reduce(TourEvent::StageProgressed { current: 3, total: 3 })
            .reduce(TourEvent::LoadStarted { invalidate: true });
        assert!(state.tour.is_empty());
        assert_eq!(state.selection.current(), None);
        assert_eq!(state.progress, Progress::default());
        assert!(state.is_loading());
    }

    #[test]
    fn test_plan_rejected_keeps_tour() {
        let state = ready(3)
            .reduce(TourEvent::StageSelected { index: 1 })
            .reduce(TourEvent::PlanRejected {
                error: "no route found".into(),
            });
        assert_eq!(state.tour.len(), 3);
        assert_eq!(state.selection.current(), Some(1));
        assert_eq!(state.error_message.as_deref(), Some("no route found"));
    }

    #[test]
    fn test_load_failed_empties_tour_and_success_clears_error() {
        let state = ready(2).reduce(TourEvent::LoadFailed { error: "down".into() });
        assert!(state.tour.is_empty());
        assert_eq!(state.phase, TourPhase::Failed);
        let state = state.reduce(TourEvent::LoadSucceeded {
            tour: tour(1),
            select_first: false,
        });
        assert_eq!(state.error_message, None);
    }

    #[test]
    fn test_map_click_and_focus_bounds() {
        let state = ready(2)
            .reduce(TourEvent::MapClicked { coordinate: [50.0, 10.0] })
            .reduce(TourEvent::StageSelected { index: 1 });
        assert_eq!(state.selection.last_click, Some([50.0, 10.0]));
        assert_eq!(state.focus_bounds(), Some(([49.0, 11.0], [49.5, 11.5])));
        let state = state.reduce(TourEvent::SelectionCleared);
        assert_eq!(state.focus_bounds(), None);
    }

    #[test]
    fn test_tour_cleared() {
        let state = ready(2)
            .reduce(TourEvent::StageSelected { index: 0 })
            .reduce(TourEvent::TourCleared);
        assert_eq!(state, TourState::default());
    }
}
