//! 控制台层：行命令解析（event）、状态摘要（render）、主循环（app）

pub mod app;
pub mod event;
pub mod render;

pub use app::run_console;
pub use event::parse_command;
pub use render::render_state;
