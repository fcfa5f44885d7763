pub mod common;
pub mod domain;
pub mod storage;

#[cfg(feature = "db")]
pub mod database;

pub use common::error::{CmsError, Result, ValidationErrors};
pub use domain::*;

#[cfg(feature = "db")]
pub use database::DatabaseManager;
