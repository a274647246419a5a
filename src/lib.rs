pub mod config;
pub mod error;
pub mod logging;
pub mod providers;
pub mod proxy;
pub mod server;
pub mod translate;

pub use config::{ProxyConfig, UpstreamSettings};
pub use error::{ProxyError, Result};
pub use logging::SharedLogger;
pub use proxy::{CompletionProxy, ProxyReply};
pub use server::{build_router, AppState};
