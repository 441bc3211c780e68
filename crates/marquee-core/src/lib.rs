//! # Marquee Core
//!
//! Hybrid movie retrieval: a relationship graph, a semantic vector index and
//! a genre-intent layer fused into one ranked result list.
//!
//! This crate holds the engine; the `marquee` CLI is a thin shell over it.
//!
//! ## Modules
//!
//! - [`catalog`] - Typed movie records and the CSV loader
//! - [`config`] - Production configuration constants
//! - [`embedding`] - Text embedding trait and implementations
//! - [`error`] - Error types for each concern
//! - [`graph`] - Movie/person/genre graph on redb with fixed traversals
//! - [`processing`] - Bulk ingestion, batch reports and progress
//! - [`search`] - Vector index, intent extraction and fusion search

#![forbid(unsafe_code)]

pub mod catalog;
pub mod config;
pub mod embedding;
pub mod error;
pub mod graph;
pub mod processing;
pub mod search;

#[cfg(test)]
pub(crate) mod test_utils;
