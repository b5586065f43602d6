//! MotoTourer - 摩托车多日行程编排核心
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 加载器状态机、路线规划、视图状态 reducer、主控循环
//! - **observability**: 日志初始化
//! - **service**: 路线服务抽象与实现（HTTP / Mock）
//! - **storage**: 键值持久化（SQLite / 内存）与行程快照
//! - **tour**: Stage / Tour 数据模型、单段补全、高程剖面汇总
//! - **ui**: 控制台：行命令解析与状态摘要

pub mod config;
pub mod core;
pub mod observability;
pub mod service;
pub mod storage;
pub mod tour;
pub mod ui;

pub use crate::core::{create_tour_runtime, Command, TourLoader, TourState};
