//! Route handlers for the REST API.

pub mod health;
pub mod tour;
