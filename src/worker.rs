//! The cache lifecycle manager: install, activate and fetch handling.

use futures::future::try_join_all;
use reqwest::Url;

use crate::config::WorkerConfig;
use crate::error::{Error, Result};
use crate::http::{Request, Response};
use crate::network::Network;
use crate::route::RouteClass;
use crate::scope::{Detached, WorkerScope};
use crate::storage::CacheStorage;

/// Lifecycle events delivered by the host.
#[derive(Debug, Clone)]
pub enum Event {
    /// A new worker version is being installed.
    Install,
    /// This worker version is taking control.
    Activate,
    /// A request from a controlled client.
    Fetch(Request),
}

/// Result of handling one [`Event`].
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Install completed.
    Installed(InstallReport),
    /// Activate completed.
    Activated(ActivateReport),
    /// A fetch was answered.
    Served(Served),
}

/// Summary of a successful install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// Generation that was populated.
    pub cache_name: String,
    /// Number of manifest assets stored.
    pub cached: usize,
    /// Whether the waiting phase was skipped.
    pub skipped_waiting: bool,
}

/// Summary of a successful activate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivateReport {
    /// Stale generations that were deleted.
    pub deleted: Vec<String>,
    /// Clients newly claimed.
    pub claimed: usize,
}

/// Where a fetch response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Replayed from cache storage.
    Cache,
    /// Fetched from the network.
    Network,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cache => write!(f, "cache"),
            Self::Network => write!(f, "network"),
        }
    }
}

/// A fetch response tagged with its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served {
    /// The response handed back to the client.
    pub response: Response,
    /// Where it came from.
    pub source: Source,
}

/// Keeps exactly one cache generation alive and routes intercepted requests.
///
/// Generations are never mutated after install: a new deployment installs a
/// new generation and activate deletes the old one.
pub struct CacheWorker<N: Network, S: CacheStorage, W: WorkerScope = Detached> {
    config: WorkerConfig,
    origin: Url,
    network: N,
    storage: S,
    scope: W,
}

impl<N: Network, S: CacheStorage> CacheWorker<N, S, Detached> {
    /// Creates a worker with no clients to claim.
    #[must_use]
    pub const fn new(config: WorkerConfig, origin: Url, network: N, storage: S) -> Self {
        Self {
            config,
            origin,
            network,
            storage,
            scope: Detached,
        }
    }
}

impl<N: Network, S: CacheStorage, W: WorkerScope> CacheWorker<N, S, W> {
    /// Creates a worker bound to a custom scope.
    #[must_use]
    pub const fn with_scope(
        config: WorkerConfig,
        origin: Url,
        network: N,
        storage: S,
        scope: W,
    ) -> Self {
        Self {
            config,
            origin,
            network,
            storage,
            scope,
        }
    }

    /// Returns the worker configuration.
    #[must_use]
    pub const fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Returns the cache storage.
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Returns the network.
    #[must_use]
    pub const fn network(&self) -> &N {
        &self.network
    }

    /// Returns the worker scope.
    #[must_use]
    pub const fn scope(&self) -> &W {
        &self.scope
    }

    /// Routes an event to its handler.
    ///
    /// # Errors
    ///
    /// Propagates the handler's error unchanged.
    pub async fn dispatch(&self, event: Event) -> Result<Outcome> {
        match event {
            Event::Install => self.install().await.map(Outcome::Installed),
            Event::Activate => self.activate().await.map(Outcome::Activated),
            Event::Fetch(request) => self.fetch(&request).await.map(Outcome::Served),
        }
    }

    /// Populates the current generation from the asset manifest.
    ///
    /// All assets are fetched concurrently and stored together only after
    /// every fetch succeeded. A transport error or non-2xx status on any
    /// asset fails the whole install and nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Install`] naming the first failing asset, or a
    /// storage error.
    pub async fn install(&self) -> Result<InstallReport> {
        let name = &self.config.cache_name;
        log::info!(
            "Installing cache {name} ({} assets)",
            self.config.assets.len()
        );

        self.storage.open(name).await?;

        let requests = self
            .config
            .assets
            .iter()
            .map(|path| Request::for_path(&self.origin, path).map(|req| (path.as_str(), req)))
            .collect::<Result<Vec<_>>>()?;

        let entries = try_join_all(
            requests
                .into_iter()
                .map(|(path, req)| self.precache_one(path, req)),
        )
        .await
        .inspect_err(|e| log::error!("Install of {name} failed: {e}"))?;

        let cached = entries.len();
        self.storage.put_all(name, entries).await?;

        let skipped_waiting = self.config.eager_activation;
        if skipped_waiting {
            self.scope.skip_waiting().await?;
        }

        log::info!("Installed cache {name}: {cached} assets");
        Ok(InstallReport {
            cache_name: name.clone(),
            cached,
            skipped_waiting,
        })
    }

    async fn precache_one(&self, path: &str, request: Request) -> Result<(Request, Response)> {
        let wrap = |source: Error| Error::Install {
            path: path.to_string(),
            source: Box::new(source),
        };

        let response = self.network.fetch(&request).await.map_err(wrap)?;
        if !response.is_ok() {
            return Err(wrap(Error::BadStatus {
                url: response.url,
                status: response.status,
            }));
        }
        log::debug!("Precached {path} ({} bytes)", response.body.len());
        Ok((request, response))
    }

    /// Deletes every generation other than the current one, then claims
    /// clients when activating eagerly. Running it again deletes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Delete`] if any stale generation could not be deleted.
    pub async fn activate(&self) -> Result<ActivateReport> {
        let current = &self.config.cache_name;
        let stale: Vec<String> = self
            .storage
            .keys()
            .await?
            .into_iter()
            .filter(|name| name != current)
            .collect();

        try_join_all(stale.iter().map(|name| async move {
            log::info!("Deleting stale cache {name}");
            self.storage
                .delete(name)
                .await
                .map_err(|e| Error::Delete {
                    name: name.clone(),
                    source: Box::new(e),
                })
        }))
        .await
        .inspect_err(|e| log::error!("Activate of {current} failed: {e}"))?;

        let claimed = if self.config.eager_activation {
            self.scope.claim_clients(current).await?
        } else {
            0
        };

        log::info!(
            "Activated cache {current}: {} stale deleted, {claimed} clients claimed",
            stale.len()
        );
        Ok(ActivateReport {
            deleted: stale,
            claimed,
        })
    }

    /// Answers an intercepted request.
    ///
    /// Dynamic routes go straight to the network. Static routes are served
    /// cache-first; a miss falls through to the network and the response is
    /// not written back.
    ///
    /// # Errors
    ///
    /// Network and storage errors propagate untouched.
    pub async fn fetch(&self, request: &Request) -> Result<Served> {
        if self.config.routes.classify(request.path()) == RouteClass::Dynamic {
            log::debug!("{} {} -> network (dynamic)", request.method(), request.url());
            let response = self.network.fetch(request).await?;
            return Ok(Served {
                response,
                source: Source::Network,
            });
        }

        if let Some(response) = self.storage.match_request(request).await? {
            log::debug!("{} {} -> cache", request.method(), request.url());
            return Ok(Served {
                response,
                source: Source::Cache,
            });
        }

        log::debug!("{} {} -> network (miss)", request.method(), request.url());
        let response = self.network.fetch(request).await?;
        Ok(Served {
            response,
            source: Source::Network,
        })
    }
}
