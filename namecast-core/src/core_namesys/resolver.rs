/*
    NameResolver - resolve `/ipns/` names through the record store

    Workflow:
    - parse `/ipns/<peer-id>[/rest]` or a bare `<peer-id>[/rest]`
    - fetch the cached record via the store (which also subscribes)
    - decode the envelope and the name entry, reject expired entries
    - with `recursive`, follow `/ipns/` results up to `max_depth` lookups

    Resolved paths are kept in an LRU for the shorter of `cache_ttl` and the
    entry's own ttl. `nocache` skips cache reads but still refreshes it.
*/

use hashlink::LruCache;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use super::errors::{NameStoreError, NameStoreResult};
use super::pubsub_store::PubsubRecordStore;
use crate::config::ResolverConfig;
use crate::core_identity::PeerId;
use crate::core_record::{current_timestamp, NameEntry, Record, RecordKey, IPNS_PREFIX};
use crate::metrics;

/// Per-call resolution flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Keep resolving while the result is an `/ipns/` name
    pub recursive: bool,
    /// Ignore cached results
    pub nocache: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ResolverOptions {
    pub max_depth: usize,
    pub cache_size: usize,
    pub cache_ttl: Duration,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        ResolverConfig::default().into()
    }
}

impl From<ResolverConfig> for ResolverOptions {
    fn from(config: ResolverConfig) -> Self {
        ResolverOptions {
            max_depth: config.max_depth,
            cache_size: config.cache_size,
            cache_ttl: config.cache_ttl,
        }
    }
}

#[derive(Debug, Clone)]
struct CachedPath {
    path: String,
    expires_at: Instant,
}

pub struct NameResolver {
    store: Arc<PubsubRecordStore>,
    options: ResolverOptions,
    cache: Mutex<LruCache<PeerId, CachedPath>>,
}

/// Split a name into its peer id and any trailing path
fn parse_name(name: &str) -> NameStoreResult<(PeerId, String)> {
    let invalid = |reason: String| NameStoreError::InvalidName {
        name: name.to_string(),
        reason,
    };

    let trimmed = name.strip_prefix(IPNS_PREFIX).unwrap_or(name);
    let (id, rest) = match trimmed.find('/') {
        Some(at) => trimmed.split_at(at),
        None => (trimmed, ""),
    };

    if id.is_empty() {
        return Err(invalid("expected /ipns/<peer-id> or a peer id".to_string()));
    }

    let peer = PeerId::parse(id).map_err(|e| invalid(e.to_string()))?;
    Ok((peer, rest.to_string()))
}

impl NameResolver {
    pub fn new(store: Arc<PubsubRecordStore>, options: ResolverOptions) -> Self {
        let capacity = options.cache_size.max(1);
        NameResolver {
            store,
            options,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub async fn resolve(&self, name: &str, options: ResolveOptions) -> NameStoreResult<String> {
        metrics::increment(metrics::RESOLVE_TOTAL);

        let (mut peer, mut rest) = parse_name(name)?;
        let mut lookups = 0;

        loop {
            let path = format!("{}{}", self.resolve_peer(&peer, options.nocache).await?, rest);
            lookups += 1;

            if !options.recursive || !path.starts_with(IPNS_PREFIX) {
                debug!(name, path = %path, lookups, "Resolved name");
                return Ok(path);
            }

            if lookups >= self.options.max_depth {
                return Err(NameStoreError::ResolveDepthExceeded {
                    name: name.to_string(),
                    depth: lookups,
                });
            }

            (peer, rest) = parse_name(&path)?;
        }
    }

    async fn resolve_peer(&self, peer: &PeerId, nocache: bool) -> NameStoreResult<String> {
        if !nocache {
            let mut cache = self.cache.lock().await;
            if let Some(cached) = cache.get(peer) {
                if cached.expires_at > Instant::now() {
                    metrics::increment(metrics::RESOLVE_CACHE_HITS);
                    return Ok(cached.path.clone());
                }
            }
        }

        let key = RecordKey::for_peer(peer);
        let bytes = self.store.get(&key).await?;
        let record = Record::from_bytes(&bytes)?;
        let entry = NameEntry::unmarshal(&record.value)?;

        if entry.is_expired(current_timestamp()) {
            self.cache.lock().await.remove(peer);
            return Err(NameStoreError::RecordExpired {
                name: key.to_string(),
                expired_at: entry.validity,
            });
        }

        let mut ttl = self.options.cache_ttl;
        if entry.ttl > 0 {
            ttl = ttl.min(Duration::from_secs(entry.ttl));
        }

        self.cache.lock().await.insert(
            *peer,
            CachedPath {
                path: entry.value.clone(),
                expires_at: Instant::now() + ttl,
            },
        );

        Ok(entry.value)
    }
}
