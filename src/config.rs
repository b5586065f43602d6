//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `MOTOTOURER__*` 覆盖（双下划线表示嵌套，如 `MOTOTOURER__SERVICE__BASE_URL=http://host:8000`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub service: ServiceSection,
    #[serde(default)]
    pub planning: PlanningSection,
    #[serde(default)]
    pub enrichment: EnrichmentSection,
    #[serde(default)]
    pub store: StoreSection,
}

/// [service] 段：后端地址与超时；base_url 为 "mock" 时使用内置 Mock 服务
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceSection {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServiceSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

/// [planning] 段
#[derive(Debug, Clone, Deserialize)]
pub struct PlanningSection {
    /// 单段目标长度（公里）
    #[serde(default = "default_stage_length_km")]
    pub stage_length_km: f64,
}

impl Default for PlanningSection {
    fn default() -> Self {
        Self {
            stage_length_km: default_stage_length_km(),
        }
    }
}

fn default_stage_length_km() -> f64 {
    300.0
}

/// [enrichment] 段
#[derive(Debug, Clone, Deserialize)]
pub struct EnrichmentSection {
    /// 详情缺少高程统计时是否调用 /elevation
    #[serde(default = "default_elevation_fallback")]
    pub elevation_fallback: bool,
    /// 并行补全的段数，1 为严格串行
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for EnrichmentSection {
    fn default() -> Self {
        Self {
            elevation_fallback: default_elevation_fallback(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_elevation_fallback() -> bool {
    true
}

fn default_concurrency() -> usize {
    1
}

/// [store] 段：SQLite 文件路径与快照键
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSection {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    #[serde(default = "default_store_key")]
    pub key: String,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            key: default_store_key(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("data/mototourer.db")
}

fn default_store_key() -> String {
    "mototourer_tour".to_string()
}

/// 从 config 目录加载配置，环境变量 MOTOTOURER__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 MOTOTOURER__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("MOTOTOURER")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
