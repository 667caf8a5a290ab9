//! Disk-backed cache storage, one TOML file per generation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::{STANDARD as BASE64, URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::CacheStorage;
use crate::error::{Error, Result};
use crate::http::{Request, Response};

/// A cached response as written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    key: String,
    url: String,
    status: u16,
    /// Base64 of the response body.
    body: String,
    headers: Vec<(String, String)>,
}

impl StoredEntry {
    fn new(request: &Request, response: &Response) -> Self {
        Self {
            key: request.cache_key(),
            url: response.url.clone(),
            status: response.status,
            body: BASE64.encode(&response.body),
            headers: response.headers.clone(),
        }
    }

    fn to_response(&self) -> Result<Response> {
        let body = BASE64
            .decode(&self.body)
            .map_err(|e| Error::Cache(format!("corrupt body for {}: {e}", self.key)))?;
        Ok(Response {
            url: self.url.clone(),
            status: self.status,
            headers: self.headers.clone(),
            body: body.into(),
        })
    }
}

/// One generation file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GenerationFile {
    name: String,
    created: DateTime<Utc>,
    entries: Vec<StoredEntry>,
}

impl GenerationFile {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            created: Utc::now(),
            entries: Vec::new(),
        }
    }

    fn lookup(&self, key: &str) -> Option<&StoredEntry> {
        self.entries.iter().find(|e| e.key == key)
    }
}

/// [`CacheStorage`] persisted under a directory, one TOML file per generation.
///
/// Files are replaced with write-tmp-then-rename, so a reader never sees a
/// half-written generation.
#[derive(Debug)]
pub struct DiskCacheStorage {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl DiskCacheStorage {
    /// Creates a storage rooted at `root`. The directory is created on first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the storage root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.root
            .join(format!("{}.toml", URL_SAFE_NO_PAD.encode(name.as_bytes())))
    }

    /// Recovers the generation name a file was written under, if it is one of ours.
    fn name_for(&self, path: &Path) -> Option<String> {
        let stem = path.file_stem()?.to_str()?;
        let bytes = URL_SAFE_NO_PAD.decode(stem).ok()?;
        let name = String::from_utf8(bytes).ok()?;
        (self.path_for(&name).file_name() == path.file_name()).then_some(name)
    }

    async fn read_file(path: &Path) -> Result<GenerationFile> {
        let contents = tokio::fs::read_to_string(path).await?;
        toml::from_str(&contents)
            .map_err(|e| Error::Cache(format!("corrupt generation file {}: {e}", path.display())))
    }

    async fn read(&self, name: &str) -> Result<Option<GenerationFile>> {
        let path = self.path_for(name);
        if tokio::fs::try_exists(&path).await? {
            Self::read_file(&path).await.map(Some)
        } else {
            Ok(None)
        }
    }

    async fn write(&self, generation: &GenerationFile) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;

        let path = self.path_for(&generation.name);
        let tmp_path = path.with_extension("toml.tmp");

        let toml_str = toml::to_string(generation).map_err(|e| Error::Cache(e.to_string()))?;
        tokio::fs::write(&tmp_path, toml_str).await?;
        tokio::fs::rename(&tmp_path, &path).await?;
        Ok(())
    }

    /// Reads every generation, oldest first.
    async fn all(&self) -> Result<Vec<GenerationFile>> {
        let mut read_dir = match tokio::fs::read_dir(&self.root).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut generations = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            let path = entry.path();
            if !path.extension().is_some_and(|ext| ext == "toml") {
                continue;
            }
            let Some(name) = self.name_for(&path) else {
                log::warn!("Ignoring foreign file {} in cache store", path.display());
                continue;
            };
            let generation = Self::read_file(&path).await?;
            if generation.name != name {
                log::warn!(
                    "Ignoring {}: holds generation {} instead of {name}",
                    path.display(),
                    generation.name
                );
                continue;
            }
            generations.push(generation);
        }
        generations.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.name.cmp(&b.name)));
        Ok(generations)
    }
}

#[async_trait]
impl CacheStorage for DiskCacheStorage {
    async fn open(&self, name: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        if self.read(name).await?.is_none() {
            log::debug!("Creating cache generation {name} in {}", self.root.display());
            self.write(&GenerationFile::new(name)).await?;
        }
        Ok(())
    }

    async fn put_all(&self, name: &str, entries: Vec<(Request, Response)>) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut generation = self
            .read(name)
            .await?
            .unwrap_or_else(|| GenerationFile::new(name));

        for (req, res) in &entries {
            let stored = StoredEntry::new(req, res);
            generation.entries.retain(|e| e.key != stored.key);
            generation.entries.push(stored);
        }
        self.write(&generation).await
    }

    async fn match_in(&self, name: &str, request: &Request) -> Result<Option<Response>> {
        let key = request.cache_key();
        match self.read(name).await? {
            Some(generation) => generation.lookup(&key).map(StoredEntry::to_response).transpose(),
            None => Ok(None),
        }
    }

    async fn match_request(&self, request: &Request) -> Result<Option<Response>> {
        let key = request.cache_key();
        for generation in self.all().await? {
            if let Some(entry) = generation.lookup(&key) {
                return entry.to_response().map(Some);
            }
        }
        Ok(None)
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.all().await?.into_iter().map(|g| g.name).collect())
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        match tokio::fs::remove_file(self.path_for(name)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
