//! A discussion board engine.
//!
//! The crate is built around three pieces: the entity store
//! ([`models::Store`]) which keeps boards, topics, and posts; the lifecycle
//! operations ([`services`]) which create topics and replies and produce
//! paginated board listings; and the pagination engine ([`pagination`])
//! which resolves untrusted page requests against an ordered result set.
//!
//! Rendering, routing, and session management are deliberately not part of
//! this crate. Callers hand every operation an explicit [`auth::Identity`]
//! and present the returned values however they like.

pub mod activity;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod pagination;
pub mod schema;
pub mod services;

pub use config::Config;
pub use error::{Error, FieldError, FieldErrors, Result};
