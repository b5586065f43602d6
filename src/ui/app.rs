//! 控制台主循环
//!
//! 启动即发送 Load（等同页面加载），之后从 stdin 逐行读命令发给编排器；
//! state_rx 每次变化时打印状态摘要。

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};

use crate::core::{Command, TourState};
use crate::ui::{parse_command, render_state};

pub async fn run_console(
    mut state_rx: watch::Receiver<TourState>,
    cmd_tx: mpsc::UnboundedSender<Command>,
) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    cmd_tx.send(Command::Load)?;

    loop {
        tokio::select! {
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break; // 编排器已退出
                }
                let state = state_rx.borrow_and_update().clone();
                print!("{}", render_state(&state));
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    let _ = cmd_tx.send(Command::Quit);
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_command(&line) {
                    Ok(Command::Quit) => {
                        let _ = cmd_tx.send(Command::Quit);
                        break;
                    }
                    Ok(cmd) => cmd_tx.send(cmd)?,
                    Err(e) => eprintln!("{}", e),
                }
            }
        }
    }
    Ok(())
}
