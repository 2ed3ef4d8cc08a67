//! Authentication extractors.
//!
//! - [`auth::AuthUser`] -- the caller behind a valid Bearer token.
//! - [`auth::RequireAdmin`] -- an authenticated caller with the `admin` role.

pub mod auth;
