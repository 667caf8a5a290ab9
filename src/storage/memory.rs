//! In-memory cache storage.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::CacheStorage;
use crate::error::Result;
use crate::http::{Request, Response};

#[derive(Debug, Default)]
struct Generation {
    name: String,
    entries: HashMap<String, Response>,
}

/// In-process [`CacheStorage`]. Contents are lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    generations: RwLock<Vec<Generation>>,
}

impl MemoryCacheStorage {
    /// Creates an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of entries in a generation, if it exists.
    pub async fn len_of(&self, name: &str) -> Option<usize> {
        self.generations
            .read()
            .await
            .iter()
            .find(|g| g.name == name)
            .map(|g| g.entries.len())
    }
}

fn find_or_create<'a>(generations: &'a mut Vec<Generation>, name: &str) -> &'a mut Generation {
    let idx = match generations.iter().position(|g| g.name == name) {
        Some(idx) => idx,
        None => {
            generations.push(Generation {
                name: name.to_string(),
                entries: HashMap::new(),
            });
            generations.len() - 1
        }
    };
    &mut generations[idx]
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, name: &str) -> Result<()> {
        let mut generations = self.generations.write().await;
        find_or_create(&mut generations, name);
        Ok(())
    }

    async fn put_all(&self, name: &str, entries: Vec<(Request, Response)>) -> Result<()> {
        let mut generations = self.generations.write().await;
        let generation = find_or_create(&mut generations, name);
        generation.entries.extend(
            entries
                .into_iter()
                .map(|(req, res)| (req.cache_key(), res)),
        );
        Ok(())
    }

    async fn match_in(&self, name: &str, request: &Request) -> Result<Option<Response>> {
        let key = request.cache_key();
        Ok(self
            .generations
            .read()
            .await
            .iter()
            .find(|g| g.name == name)
            .and_then(|g| g.entries.get(&key).cloned()))
    }

    async fn match_request(&self, request: &Request) -> Result<Option<Response>> {
        let key = request.cache_key();
        Ok(self
            .generations
            .read()
            .await
            .iter()
            .find_map(|g| g.entries.get(&key).cloned()))
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self
            .generations
            .read()
            .await
            .iter()
            .map(|g| g.name.clone())
            .collect())
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        let mut generations = self.generations.write().await;
        let before = generations.len();
        generations.retain(|g| g.name != name);
        Ok(generations.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(path: &str) -> Request {
        Request::get(&format!("https://grannyb.example{path}")).unwrap()
    }

    #[tokio::test]
    async fn open_is_idempotent() {
        let storage = MemoryCacheStorage::new();
        storage.open("grannybqr-v1").await.unwrap();
        storage.open("grannybqr-v1").await.unwrap();
        assert_eq!(storage.keys().await.unwrap(), vec!["grannybqr-v1"]);
        assert_eq!(storage.len_of("grannybqr-v1").await, Some(0));
    }

    #[tokio::test]
    async fn keys_keep_creation_order() {
        let storage = MemoryCacheStorage::new();
        for name in ["b", "a", "c"] {
            storage.open(name).await.unwrap();
        }
        assert_eq!(storage.keys().await.unwrap(), vec!["b", "a", "c"]);
    }

    #[tokio::test]
    async fn match_searches_generations_in_order() {
        let storage = MemoryCacheStorage::new();
        let logo = req("/granny-b-logo.png");
        let old = Response::ok(logo.url().as_str(), "old");
        let new = Response::ok(logo.url().as_str(), "new");
        storage.put_all("v0", vec![(logo.clone(), old.clone())]).await.unwrap();
        storage.put_all("v1", vec![(logo.clone(), new.clone())]).await.unwrap();

        assert_eq!(storage.match_request(&logo).await.unwrap(), Some(old));
        assert_eq!(storage.match_in("v1", &logo).await.unwrap(), Some(new));
        assert_eq!(storage.match_request(&req("/nope")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn match_is_keyed_by_method() {
        let storage = MemoryCacheStorage::new();
        let get = req("/");
        storage
            .put_all("v1", vec![(get.clone(), Response::ok(get.url().as_str(), "home"))])
            .await
            .unwrap();
        let post = Request::new("POST", get.url().as_str()).unwrap();
        assert!(storage.match_request(&post).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_reports_existence() {
        let storage = MemoryCacheStorage::new();
        storage.open("v1").await.unwrap();
        assert!(storage.delete("v1").await.unwrap());
        assert!(!storage.delete("v1").await.unwrap());
        assert!(storage.keys().await.unwrap().is_empty());
    }
}
