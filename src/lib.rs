pub mod api;
pub mod config;
pub mod content;
pub mod email;
pub mod error;
pub mod logging;
pub mod security;
pub mod seed;
pub mod server;
pub mod state;

pub use config::Config;
pub use error::{AppError, Result};
pub use server::create_app;
pub use state::AppState;
