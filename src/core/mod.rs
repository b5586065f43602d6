//! 核心编排层：错误、状态与 reducer、加载器、路线规划、主控循环

pub mod error;
pub mod loader;
pub mod orchestrator;
pub mod planner;
pub mod state;

pub use error::TourError;
pub use loader::{LoaderSettings, TourLoader};
pub use orchestrator::{create_tour_runtime, handle_command, spawn_runtime, Command};
pub use planner::RoutePlanner;
pub use state::{Progress, Selection, TourEvent, TourPhase, TourState};
