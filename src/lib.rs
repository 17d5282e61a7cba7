//! devpulse - developer analytics dashboard backend
//!
//! The library exposes the guided product tour, its REST surface and the
//! ambient configuration and logging used by the `devpulse` binary and the
//! `generate_types` binary.

pub mod config;
pub mod logging;
pub mod rest;
pub mod tour;
