// Copyright 2026 Reelfeed Contributors
// SPDX-License-Identifier: Apache-2.0

//! Reelfeed runtime library: acquires short-form video items from a
//! mobile web feed with a headless browser and serves them over HTTP.
//!
//! The library crate exposes the core modules for integration testing.

pub mod acquisition;
pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod renderer;
pub mod rest;
pub mod service;
pub mod session;
