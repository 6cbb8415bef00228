//! Shared components and utilities for the guiding tools.
//!
//! This crate contains the storage and numeric building blocks that the
//! telemetry crates share: a fixed-slot ring buffer, tracking-error
//! statistics, and the persistent settings store.

pub mod algo;
pub mod config_storage;
pub mod ring_buffer;
