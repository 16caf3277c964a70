//! Proxy module - forwarding reverse proxy in front of the chat backend

pub mod error;
pub mod handlers;
pub mod server;
pub mod upstream;

pub use error::{ErrorBody, ProxyError};
pub use server::ProxyServer;
pub use upstream::client::UpstreamClient;
