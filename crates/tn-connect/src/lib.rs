//! TrueNAS Connect enrollment.
//!
//! [`ConnectManager`] owns the one-shot enrollment latch and the cached
//! [`ConnectConfig`](tn_core::connect_config::ConnectConfig); [`api`] maps
//! JSON-RPC calls onto it and [`server`] serves them over TCP.

pub mod api;
pub mod cache;
pub mod finalizer;
pub mod manager;
pub mod request;
pub mod scheduler;
pub mod server;
pub mod uri;

pub use cache::{ConnectCache, JsonFileCache, MemoryCache};
pub use finalizer::{HttpFinalizer, RegistrationFinalizer};
pub use manager::{ConnectManager, SystemIdentity};
pub use request::ConfigureRequest;
pub use scheduler::{BoxFuture, RecordingSpawner, TaskSpawner, TokioSpawner};
pub use tn_error::{ApiError, ConnectError, ConnectResult};
