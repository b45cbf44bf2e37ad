pub mod postgres;
pub mod preferences;
pub mod redis;

pub use postgres::create_pool;
pub use preferences::{FilePreferenceStore, PreferenceStore};
pub use redis::create_redis_client;
pub use redis::Cache;
pub use redis::CacheKey;
pub use redis::CacheWriterHandle;
