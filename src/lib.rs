//! offline-shell - A cache lifecycle manager for an offline-capable web app shell.
//!
//! The worker precaches a fixed asset manifest into a versioned cache
//! generation on install, deletes every stale generation on activate, and
//! answers intercepted requests cache-first, except for dynamic API routes
//! which always go to the network.
//!
//! # Example
//!
//! ```no_run
//! use offline_shell::{CacheWorker, DiskCacheStorage, HttpNetwork, Request, WorkerConfig};
//!
//! # async fn example() -> offline_shell::Result<()> {
//! let network = HttpNetwork::new("https://grannyb.example")?;
//! let origin = network.origin().clone();
//! let storage = DiskCacheStorage::new("/tmp/offline-shell");
//!
//! let worker = CacheWorker::new(WorkerConfig::default(), origin, network, storage);
//! worker.install().await?;
//! worker.activate().await?;
//!
//! let served = worker.fetch(&Request::get("https://grannyb.example/granny-b-logo.png")?).await?;
//! println!("{} bytes from {}", served.response.body.len(), served.source);
//! # Ok(())
//! # }
//! ```

#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod config;
pub mod error;
pub mod http;
pub mod network;
pub mod route;
pub mod scope;
pub mod storage;
pub mod worker;

// Re-export main types for convenience
pub use config::{AppConfig, HostConfig, WorkerConfig};
pub use error::{Error, Result};
pub use http::{Request, Response};
pub use network::{HttpNetwork, Network};
pub use route::{RouteClass, RouteConfig};
pub use scope::{Client, ClientRegistry, Detached, WorkerScope};
pub use storage::{CacheStorage, DiskCacheStorage, MemoryCacheStorage};
pub use worker::{ActivateReport, CacheWorker, Event, InstallReport, Outcome, Served, Source};
