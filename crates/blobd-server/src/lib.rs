//! HTTP server for the blobd named blob store.
//!
//! Maps three routes onto [`blobd_store::BlobStore`]:
//! `PUT /upload/{name}`, `GET /download/{name}` and `GET /list/`.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::HealthResponse;
pub use server::{BlobServer, RunningServer};
