pub mod auth;
pub mod config;
pub mod grpc;
pub mod http;
pub mod ingestion;
pub mod relay;
pub mod state;
pub mod tls;

pub use state::AppState;
