//! Salesdesk library
//!
//! Product, customer and sale records kept in a relational store, revenue
//! aggregation over them, chart series and report prompts built from the
//! aggregates, and a soft-failing client for a locally hosted language model.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod app;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod migrator;
pub mod repositories;
pub mod services;
pub mod text_generation;

pub use app::AppState;
pub use errors::{AppError, ServiceError};
