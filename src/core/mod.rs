//! Core library components.
//!
//! This module contains the reusable deployment logic: configuration, key
//! storage, the key manager, cipher and cluster backends, and the
//! orchestrator that ties them together.

pub mod apply;
pub mod cancel;
pub mod cipher;
pub mod cluster;
pub mod config;
pub mod constants;
pub mod keys;
pub mod paths;
pub mod store;
