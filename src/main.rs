//! MotoTourer - 行程编排控制台
//!
//! 入口：初始化日志、创建行程运行时，并运行控制台主循环。

use anyhow::Context;
use mototourer::{create_tour_runtime, observability, ui::run_console};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    // 可选参数：额外的配置文件路径
    let config_path = std::env::args().nth(1).map(std::path::PathBuf::from);

    let (cmd_tx, state_rx) = create_tour_runtime(config_path)
        .await
        .context("Failed to create tour runtime")?;

    run_console(state_rx, cmd_tx)
        .await
        .context("Console run failed")?;

    Ok(())
}
