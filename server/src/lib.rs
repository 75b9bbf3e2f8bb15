//! HTTP surface for a [`verstore::FileService`].
//!
//! Routes are assembled by [`app::build_app`]; the binary in `main.rs` only
//! parses [`config::Config`], installs logging and serves the router.

pub mod app;
pub mod config;
pub mod error;
pub mod handlers;

pub use app::{build_app, AppState};
pub use config::Config;
pub use error::ApiError;
