//! The question → SQL → table pipeline.
//!
//! Layout:
//! - `prompt.rs`: few-shot chat prompt construction
//! - `guard.rs`: read-only gate over generated statements
//! - `actor.rs`: the actor owning the database session and model client

pub mod actor;
pub mod guard;
pub mod prompt;

pub use actor::{Translation, TranslatorArgs, TranslatorHandle, spawn};
