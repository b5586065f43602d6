//! 行程编排器：主控循环
//!
//! 负责：加载配置、创建服务/存储/加载器/规划器，建立 cmd/state 两通道，
//! 并在后台任务中按顺序消费用户命令。加载类命令逐个执行，后到的排在进行中的之后。

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::{mpsc, watch};

use crate::config::{load_config, AppConfig};
use crate::core::{LoaderSettings, RoutePlanner, TourLoader, TourState};
use crate::service::{HttpTourService, MockTourService, TourService};
use crate::storage::{SqliteKeyValueStore, TourStore};
use crate::tour::LatLon;

/// 从 UI 发往编排器的用户命令
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// 页面加载：优先使用快照
    Load,
    /// 删除快照并重新计算
    Recompute,
    /// 按地名规划新行程
    Plan {
        start: String,
        end: String,
        stops: Vec<String>,
    },
    /// 反向规划
    Reverse {
        start: String,
        end: String,
        stops: Vec<String>,
    },
    Select(usize),
    ClickMap(LatLon),
    ClearSelection,
    Save,
    Delete,
    Quit,
}

/// 根据配置选择路线服务（HTTP / Mock）
pub(crate) fn create_service_from_config(cfg: &AppConfig) -> Arc<dyn TourService> {
    if cfg.service.base_url.eq_ignore_ascii_case("mock") {
        tracing::warn!("Using built-in mock tour service");
        return Arc::new(MockTourService::default());
    }
    tracing::info!("Using tour service at {}", cfg.service.base_url);
    Arc::new(HttpTourService::new(
        &cfg.service.base_url,
        cfg.service.request_timeout_secs,
    ))
}

/// 执行单条命令；返回 false 表示退出
pub async fn handle_command(loader: &TourLoader, planner: &RoutePlanner, cmd: Command) -> bool {
    match cmd {
        Command::Load => {
            if let Err(e) = loader.load(false).await {
                tracing::debug!(error = %e, "load failed");
            }
        }
        Command::Recompute => {
            if let Err(e) = loader.recompute().await {
                tracing::debug!(error = %e, "recompute failed");
            }
        }
        Command::Plan { start, end, stops } => {
            if let Err(e) = planner.plan_route(&start, &end, &stops).await {
                tracing::debug!(error = %e, "route planning failed");
            }
        }
        Command::Reverse { start, end, stops } => {
            if let Err(e) = planner.reverse(&start, &end, &stops).await {
                tracing::debug!(error = %e, "reverse planning failed");
            }
        }
        Command::Select(index) => loader.select(index),
        Command::ClickMap(coordinate) => loader.click_map(coordinate),
        Command::ClearSelection => loader.clear_selection(),
        Command::Save => {
            if let Err(e) = loader.save().await {
                tracing::warn!(error = %e, "save failed");
            }
        }
        Command::Delete => {
            if let Err(e) = loader.delete().await {
                tracing::warn!(error = %e, "delete failed");
            }
        }
        Command::Quit => return false,
    }
    true
}

/// 由已构造的组件启动运行时（便于测试注入 Mock 服务与内存存储）
pub fn spawn_runtime(
    loader: Arc<TourLoader>,
) -> (mpsc::UnboundedSender<Command>, watch::Receiver<TourState>) {
    let planner = RoutePlanner::new(loader.clone());
    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel::<Command>();
    let state_rx = loader.subscribe();

    tokio::spawn(async move {
        while let Some(cmd) = cmd_rx.recv().await {
            tracing::debug!(?cmd, "command received");
            if !handle_command(&loader, &planner, cmd).await {
                break;
            }
        }
    });

    (cmd_tx, state_rx)
}

/// 创建行程运行时：返回命令发送端、状态接收端
pub async fn create_tour_runtime(
    config_path: Option<PathBuf>,
) -> anyhow::Result<(mpsc::UnboundedSender<Command>, watch::Receiver<TourState>)> {
    let cfg = load_config(config_path).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });

    let service = create_service_from_config(&cfg);
    let kv = SqliteKeyValueStore::open(&cfg.store.path)
        .with_context(|| format!("Failed to open store at {}", cfg.store.path.display()))?;
    let store = TourStore::new(Arc::new(kv), cfg.store.key.clone());
    let loader = Arc::new(TourLoader::new(service, store, LoaderSettings::from(&cfg)));

    Ok(spawn_runtime(loader))
}
