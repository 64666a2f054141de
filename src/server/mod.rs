//! Web application: router, handlers, embedded UI.

pub mod handlers;
pub mod router;
pub mod ui;

pub use router::{AppState, resq_router};
