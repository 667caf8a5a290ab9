//! The worker's global scope: waiting-phase control and the client registry.

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::Result;

/// Host hooks the worker calls when activating eagerly.
#[async_trait]
pub trait WorkerScope: Send + Sync {
    /// Asks the host to activate this worker without waiting for old clients to close.
    async fn skip_waiting(&self) -> Result<()>;

    /// Takes control of every open client for the given cache generation.
    ///
    /// Returns the number of clients newly claimed.
    async fn claim_clients(&self, cache_name: &str) -> Result<usize>;
}

/// A scope with no clients, for hosts that have no tabs to control.
#[derive(Debug, Clone, Copy, Default)]
pub struct Detached;

#[async_trait]
impl WorkerScope for Detached {
    async fn skip_waiting(&self) -> Result<()> {
        Ok(())
    }

    async fn claim_clients(&self, _cache_name: &str) -> Result<usize> {
        Ok(0)
    }
}

/// An open browsing context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    /// Client identifier.
    pub id: Uuid,
    /// Cache generation of the worker controlling this client, if any.
    pub controller: Option<String>,
}

#[derive(Debug, Default)]
struct Registry {
    clients: Vec<Client>,
    skip_waiting: bool,
}

/// In-memory client registry implementing [`WorkerScope`].
#[derive(Debug, Default)]
pub struct ClientRegistry {
    inner: RwLock<Registry>,
}

impl ClientRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a new uncontrolled client and returns its id.
    pub async fn open_client(&self) -> Uuid {
        let id = Uuid::new_v4();
        self.inner.write().await.clients.push(Client {
            id,
            controller: None,
        });
        id
    }

    /// Opens a client already controlled by the given generation.
    pub async fn open_controlled(&self, cache_name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.inner.write().await.clients.push(Client {
            id,
            controller: Some(cache_name.to_string()),
        });
        id
    }

    /// Closes a client. Returns false if it was not open.
    pub async fn close_client(&self, id: Uuid) -> bool {
        let mut inner = self.inner.write().await;
        let before = inner.clients.len();
        inner.clients.retain(|c| c.id != id);
        inner.clients.len() != before
    }

    /// Returns a snapshot of the open clients.
    pub async fn clients(&self) -> Vec<Client> {
        self.inner.read().await.clients.clone()
    }

    /// Returns true once the worker has asked to skip waiting.
    pub async fn skipped_waiting(&self) -> bool {
        self.inner.read().await.skip_waiting
    }
}

#[async_trait]
impl WorkerScope for ClientRegistry {
    async fn skip_waiting(&self) -> Result<()> {
        self.inner.write().await.skip_waiting = true;
        Ok(())
    }

    async fn claim_clients(&self, cache_name: &str) -> Result<usize> {
        let mut inner = self.inner.write().await;
        let mut claimed = 0;
        for client in &mut inner.clients {
            if client.controller.as_deref() != Some(cache_name) {
                client.controller = Some(cache_name.to_string());
                claimed += 1;
            }
        }
        Ok(claimed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn claim_takes_every_client() {
        let registry = ClientRegistry::new();
        registry.open_client().await;
        registry.open_controlled("grannybqr-v0").await;
        registry.open_controlled("grannybqr-v1").await;

        assert_eq!(registry.claim_clients("grannybqr-v1").await.unwrap(), 2);
        assert!(
            registry
                .clients()
                .await
                .iter()
                .all(|c| c.controller.as_deref() == Some("grannybqr-v1"))
        );
        assert_eq!(registry.claim_clients("grannybqr-v1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn close_client_removes_it() {
        let registry = ClientRegistry::new();
        let id = registry.open_client().await;
        assert!(registry.close_client(id).await);
        assert!(!registry.close_client(id).await);
        assert!(registry.clients().await.is_empty());
    }

    #[tokio::test]
    async fn skip_waiting_is_recorded() {
        let registry = ClientRegistry::new();
        assert!(!registry.skipped_waiting().await);
        registry.skip_waiting().await.unwrap();
        assert!(registry.skipped_waiting().await);
    }

    #[tokio::test]
    async fn detached_claims_nothing() {
        Detached.skip_waiting().await.unwrap();
        assert_eq!(Detached.claim_clients("v1").await.unwrap(), 0);
    }
}
