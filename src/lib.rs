//! Session/token authentication core for a CRUD web service: issues,
//! validates, refreshes and revokes paired access/refresh tokens backed by
//! a key-value cache, and gates per-user mutation routes by role.
//!
//! One property worth knowing before anything else: access-token validation
//! is stateless. The gate checks signature and expiry only, so logout and
//! force-login stop future refreshes but never cut short the validity
//! window of an access token that is already out there. Revocation bites at
//! the next refresh, not at the next request.

pub mod api;
pub mod logger;
pub mod settings;

pub mod server;

pub mod application_impl;
pub mod application_port;
pub mod domain_model;
pub mod domain_port;
pub mod infra_memory;
pub mod infra_mysql;
pub mod infra_redis;
