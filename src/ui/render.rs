//! 状态摘要渲染（纯文本）

use std::fmt::Write;

use crate::core::{TourPhase, TourState};

/// 把 TourState 渲染成多行文本：阶段与进度、错误、各段概要（选中段以 `>` 标记）
pub fn render_state(state: &TourState) -> String {
    let mut out = String::new();
    let phase = match state.phase {
        TourPhase::Idle => "idle",
        TourPhase::Loading => "loading",
        TourPhase::Enriching => "enriching",
        TourPhase::Ready => "ready",
        TourPhase::Failed => "failed",
    };
    let _ = write!(out, "[{}]", phase);
    if state.is_loading() && state.progress.is_known() {
        let _ = write!(
            out,
            " Etappe {}/{} ({}%)",
            state.progress.current,
            state.progress.total,
            state.progress.percent()
        );
    }
    out.push('\n');

    if let Some(err) = &state.error_message {
        let _ = writeln!(out, "error: {}", err);
    }

    for (i, stage) in state.tour.stages().iter().enumerate() {
        let marker = if state.selection.current() == Some(i) { '>' } else { ' ' };
        let _ = writeln!(
            out,
            "{} {:>2}. {} -> {}  {:.1} km  +{:.0}/-{:.0} m  {:.1} h",
            marker,
            i + 1,
            stage.start_location.as_deref().unwrap_or("?"),
            stage.end_location.as_deref().unwrap_or("?"),
            stage.distance_km,
            stage.elevation_gain_m,
            stage.elevation_loss_m,
            stage.estimated_time_h,
        );
    }
    if !state.tour.is_empty() {
        let _ = writeln!(
            out,
            "   total {:.1} km, {:.1} h",
            state.tour.total_distance_km(),
            state.tour.total_estimated_time_h()
        );
    }
    out
}
