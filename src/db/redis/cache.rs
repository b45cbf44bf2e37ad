use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use redis::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Display;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::{AppError, AppResult};

/// Catalog listings kept in Redis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Channels,
    Solutions,
    PublicationTypes,
    ChannelDirectory,
}

impl CacheKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheKey::Channels => "catalog:channels",
            CacheKey::Solutions => "catalog:solutions",
            CacheKey::PublicationTypes => "catalog:publication_types",
            CacheKey::ChannelDirectory => "catalog:channel_directory",
        }
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opens a Redis client; no connection is made until the first command
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// A serialized listing waiting to be written
struct PendingWrite {
    key: CacheKey,
    payload: String,
    ttl: u64,
}

/// Read-through cache for catalog listings
///
/// Reads go straight to Redis. Writes are queued and applied by a background
/// task, so filling the cache never delays a response.
#[derive(Clone)]
pub struct Cache {
    redis_client: Client,
    write_tx: mpsc::UnboundedSender<PendingWrite>,
}

/// Stops the background writer once queued writes are applied
pub struct CacheWriterHandle {
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl CacheWriterHandle {
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Cache writer task panicked");
        }
    }
}

/// Owns the writer side of the queue and a reusable connection
struct CacheWriter {
    client: Client,
    conn: Option<MultiplexedConnection>,
    failed: u64,
}

impl CacheWriter {
    async fn run(
        mut self,
        mut write_rx: mpsc::UnboundedReceiver<PendingWrite>,
        mut shutdown_rx: oneshot::Receiver<()>,
    ) {
        tracing::debug!("Cache writer started");

        loop {
            tokio::select! {
                Some(write) = write_rx.recv() => self.apply(write).await,
                _ = &mut shutdown_rx => break,
            }
        }

        // Cloned Cache handles keep the sender alive, so drain without waiting
        let mut flushed = 0usize;
        while let Ok(write) = write_rx.try_recv() {
            self.apply(write).await;
            flushed += 1;
        }

        tracing::info!(flushed, failed = self.failed, "Cache writer stopped");
    }

    async fn apply(&mut self, write: PendingWrite) {
        if let Err(e) = self.set(&write).await {
            self.failed += 1;
            tracing::warn!(error = %e, key = %write.key, "Cache write failed");
        }
    }

    /// Writes through the held connection; a failed connection is dropped and
    /// replaced on the next write
    async fn set(&mut self, write: &PendingWrite) -> AppResult<()> {
        let mut conn = match self.conn.take() {
            Some(conn) => conn,
            None => self.client.get_multiplexed_async_connection().await?,
        };
        let _: () = conn
            .set_ex(write.key.as_str(), &write.payload, write.ttl)
            .await?;
        self.conn = Some(conn);
        Ok(())
    }
}

impl Cache {
    /// Creates the cache and spawns its background writer
    pub async fn new(redis_client: Client) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let writer = CacheWriter {
            client: redis_client.clone(),
            conn: None,
            failed: 0,
        };
        let task = tokio::spawn(writer.run(write_rx, shutdown_rx));

        let cache = Self {
            redis_client,
            write_tx,
        };

        (cache, CacheWriterHandle { shutdown_tx, task })
    }

    /// Reads and decodes a cached listing; `None` on a miss
    pub async fn get_from_cache<T: DeserializeOwned>(&self, key: &CacheKey) -> AppResult<Option<T>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(key.as_str()).await?;

        cached
            .map(|json| {
                serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Cached {} is not valid: {}", key, e))
                })
            })
            .transpose()
    }

    /// Queues a listing for writing with `ttl` seconds to live
    pub fn set_in_background<T: Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, key = %key, "Could not serialize listing for cache");
                return;
            }
        };

        let write = PendingWrite {
            key: *key,
            payload,
            ttl,
        };

        if self.write_tx.send(write).is_err() {
            tracing::warn!(key = %key, "Cache writer stopped, dropping write");
        }
    }
}
