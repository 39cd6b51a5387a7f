// ignite-console-api: Async Rust client for the Web Console configuration REST API

pub mod auth;
pub mod client;
pub mod configuration;
pub mod error;
pub mod transport;

pub use client::ConsoleClient;
pub use configuration::{BasicSavePayload, RemoveResult};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
