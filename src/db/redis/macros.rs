/// Read-through caching for async lookups backed by [`Cache`](crate::db::Cache).
///
/// Returns the cached value on a hit. On a miss, or when Redis cannot be read,
/// awaits `$block`, queues the result for a background write with `$ttl`
/// seconds to live, and returns it. Errors from `$block` propagate with `?`,
/// so the macro must be used inside a function returning `AppResult`.
///
/// # Example
/// ```rust,ignore
/// async fn list_channels(&self) -> AppResult<Vec<String>> {
///     cached!(self.cache, CacheKey::Channels, self.cache_ttl, async {
///         self.query_channels().await
///     })
/// }
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        match $cache.get_from_cache(&$key).await {
            Ok(Some(cached)) => Ok(cached),
            lookup => {
                if let Err(e) = lookup {
                    tracing::warn!(error = %e, key = %$key, "Cache read failed, querying source");
                }
                let value = $block.await?;
                $cache.set_in_background(&$key, &value, $ttl);
                Ok(value)
            }
        }
    }};
}
