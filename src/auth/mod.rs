//! Login store and session plumbing for the web UI.
//!
//! Layout:
//! - `store.rs`: the login YAML shape and constant-time verification
//! - `session.rs`: private session cookie construction and key handling
//! - `extract.rs`: the `AuthedUser` request extractor

pub mod extract;
pub mod session;
pub mod store;

pub use extract::AuthedUser;
pub use store::LoginStore;
