use std::{collections::HashMap, hash::Hash, io::ErrorKind, path::PathBuf, sync::Arc};
use tokio::{fs, sync::RwLock};
use tracing::{debug, warn};

use crate::errors::ServiceError;

/// Generic JSON file-backed key-value map store.
///
/// Keeps a `HashMap<K, V>` in memory and mirrors the whole map to a single
/// JSON file after every mutation. The write lock is held until the snapshot
/// has been written, so snapshots from concurrent writers never interleave.
pub struct JsonMapStore<K, V> {
    inner: RwLock<HashMap<K, V>>,
    file_path: PathBuf,
}

impl<K, V> JsonMapStore<K, V>
where
    K: Eq + Hash + serde::Serialize + serde::de::DeserializeOwned + Clone,
    V: serde::Serialize + serde::de::DeserializeOwned + Clone,
{
    /// Open the store at `path`.
    ///
    /// A missing or unparsable file is not an error: the store starts empty
    /// and the problem is logged. The file is only (re)written on the first
    /// mutation.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ServiceError::storage("create data directory", e))?;
        }

        let map: HashMap<K, V> = match fs::read(&file_path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(map) => map,
                Err(e) => {
                    warn!(
                        file = %file_path.display(),
                        error = %e,
                        "snapshot is malformed; starting empty"
                    );
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(file = %file_path.display(), "no snapshot yet; starting empty");
                HashMap::new()
            }
            Err(e) => {
                warn!(
                    file = %file_path.display(),
                    error = %e,
                    "snapshot unreadable; starting empty"
                );
                HashMap::new()
            }
        };

        Ok(Arc::new(Self { inner: RwLock::new(map), file_path }))
    }

    fn tmp_path(&self) -> PathBuf {
        let mut tmp = self.file_path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }

    /// Serialize `map` and replace the snapshot file with it.
    ///
    /// Writes a sibling temp file first and renames it over the target so a
    /// reader never sees a half-written snapshot. The temp file is removed
    /// again if either step fails.
    async fn save(&self, map: &HashMap<K, V>) -> Result<(), ServiceError> {
        let data = serde_json::to_vec_pretty(map)
            .map_err(|e| ServiceError::Serialization(e.to_string()))?;
        let tmp = self.tmp_path();
        let written = match fs::write(&tmp, data).await {
            Ok(()) => fs::rename(&tmp, &self.file_path)
                .await
                .map_err(|e| ServiceError::storage("replace snapshot", e)),
            Err(e) => Err(ServiceError::storage("write snapshot", e)),
        };
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp).await;
            return Err(e);
        }
        debug!(file = %self.file_path.display(), entries = map.len(), "snapshot saved");
        Ok(())
    }

    /// All values, in the map's iteration order.
    pub async fn values(&self) -> Vec<V> {
        let map = self.inner.read().await;
        map.values().cloned().collect()
    }

    /// Get value by key.
    pub async fn get(&self, key: &K) -> Option<V> {
        let map = self.inner.read().await;
        map.get(key).cloned()
    }

    /// First value matching `pred`.
    pub async fn find_value<F>(&self, pred: F) -> Option<V>
    where
        F: Fn(&V) -> bool,
    {
        let map = self.inner.read().await;
        map.values().find(|v| pred(v)).cloned()
    }

    pub async fn count(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Remove a key and persist; returns whether it existed.
    ///
    /// Nothing is written when the key was absent. If the snapshot cannot be
    /// written the entry is put back.
    pub async fn remove(&self, key: &K) -> Result<bool, ServiceError> {
        let mut map = self.inner.write().await;
        let Some(old) = map.remove(key) else {
            return Ok(false);
        };
        if let Err(e) = self.save(&map).await {
            map.insert(key.clone(), old);
            return Err(e);
        }
        Ok(true)
    }

    /// Apply a mutation to the underlying map and persist it under the same
    /// write lock.
    ///
    /// When `f` fails the map is restored and nothing is written. When the
    /// snapshot cannot be written the map is restored as well, so memory
    /// and disk stay in sync.
    pub async fn update_map<F, R, E>(&self, f: F) -> Result<R, E>
    where
        F: FnOnce(&mut HashMap<K, V>) -> Result<R, E>,
        E: From<ServiceError>,
    {
        let mut map = self.inner.write().await;
        let before = map.clone();
        let out = match f(&mut map) {
            Ok(out) => out,
            Err(e) => {
                *map = before;
                return Err(e);
            }
        };
        if let Err(e) = self.save(&map).await {
            *map = before;
            return Err(e.into());
        }
        Ok(out)
    }
}
