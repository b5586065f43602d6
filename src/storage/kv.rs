//! 键值持久化存储
//!
//! 值为文本；SQLite 实现用于跨进程保留，内存实现用于测试。
//! SQLite 为同步 API，通过 spawn_blocking 避免阻塞 async 上下文。

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::RwLock;

use crate::core::TourError;

/// 键值存储接口
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, TourError>;

    /// 覆盖写入（单条记录原子替换）
    async fn set(&self, key: &str, value: &str) -> Result<(), TourError>;

    async fn remove(&self, key: &str) -> Result<(), TourError>;
}

/// 内存键值存储
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    inner: RwLock<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, TourError> {
        Ok(self.inner.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), TourError> {
        self.inner.write().await.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), TourError> {
        self.inner.write().await.remove(key);
        Ok(())
    }
}

/// SQLite 键值存储：单表 kv(key PRIMARY KEY, value, updated_at)
pub struct SqliteKeyValueStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteKeyValueStore {
    /// 打开（或创建）数据库文件；父目录不存在时自动创建
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TourError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::init(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self, TourError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, TourError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, TourError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().unwrap_or_else(|e| e.into_inner());
            f(&guard).map_err(TourError::from)
        })
        .await
        .map_err(|e| TourError::Storage(e.to_string()))?
    }
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, TourError> {
        let key = key.to_string();
        self.with_conn(move |conn| {
            conn.query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get(0))
                .optional()
        })
        .await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), TourError> {
        let (key, value) = (key.to_string(), value.to_string());
        let now = chrono::Utc::now().to_rfc3339();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, value, now],
            )
            .map(|_| ())
        })
        .await
    }

    async fn remove(&self, key: &str) -> Result<(), TourError> {
        let key = key.to_string();
        self.with_conn(move |conn| conn.execute("DELETE FROM kv WHERE key = ?1", params![key]).map(|_| ()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn exercise(store: &dyn KeyValueStore) {
        assert_eq!(store.get("k").await.unwrap(), None);
        store.set("k", "v1").await.unwrap();
        store.set("k", "v2").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v2"));
        store.remove("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
        // 删除不存在的键不报错
        store.remove("k").await.unwrap();
    }

    #[tokio::test]
    async fn test_memory_store() {
        exercise(&MemoryKeyValueStore::new()).await;
    }

    #[tokio::test]
    async fn test_sqlite_store() {
        exercise(&SqliteKeyValueStore::in_memory().unwrap()).await;
    }

    #[tokio::test]
    async fn test_sqlite_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("tour.db");
        {
            let store = SqliteKeyValueStore::open(&path).unwrap();
            store.set("mototourer_tour", "[]").await.unwrap();
        }
        let store = SqliteKeyValueStore::open(&path).unwrap();
        assert_eq!(store.get("mototourer_tour").await.unwrap().as_deref(), Some("[]"));
    }
}
