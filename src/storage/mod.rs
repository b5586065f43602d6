//! 持久化层：键值存储（SQLite / 内存）与行程快照

pub mod kv;
pub mod tour_store;

pub use kv::{KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore};
pub use tour_store::{TourStore, SNAPSHOT_VERSION};
