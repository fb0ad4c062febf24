//! Library lending service.
//!
//! Domain modules (`books`, `book-requests`) plug into the module registry
//! and are served by the HTTP facade. Each module owns its models, its
//! persistence gateway, its workflow service and its routes.

pub mod app;
pub mod error;
pub mod modules;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{RepoError, ServiceError, ServiceResult};
pub use modules::*;
