//! Axum integration for the folio portfolio library
//!
//! Mount [`folio_router`] to serve the public site and the admin console,
//! after calling [`init`] once at startup.

mod config;
mod error;
mod pages;
mod router;
mod session;
mod static_files;

#[cfg(test)]
mod test_utils;

pub use config::FOLIO_REDIRECT_ANON;
pub use error::IntoResponseError;
pub use router::{folio_router, folio_router_no_trace};
pub use session::AuthUser;

// Re-export the admin prefix and initialization function from the folio crate
pub use folio::{FOLIO_ADMIN_PREFIX, init};
