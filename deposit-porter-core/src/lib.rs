#![doc = "deposit-porter-core: pipelines for moving scholarly deposits in and out of a publication platform."]

//! This crate holds the data model, the platform and storage contracts, and the
//! import/export orchestration. It performs no HTTP itself: every network call goes
//! through the [`contract::PlatformApi`] and [`contract::ObjectStore`] traits, which the
//! CLI crate implements with `reqwest` and the tests implement with `mockall`.
//!
//! # Usage
//! Build a [`config::PlatformConfig`], hand an implementation of both traits to
//! [`import::import_deposit`], [`export::export_deposit`] or [`summary::fetch_user_summary`].

pub mod archive;
pub mod config;
pub mod contract;
pub mod error;
pub mod export;
pub mod import;
pub mod manuscript;
pub mod metadata;
pub mod model;
pub mod summary;

pub use error::{PorterError, PorterResult};
