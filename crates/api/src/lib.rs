//! SACCO portal API client.
//!
//! This crate provides a lightweight client for the portal's REST backend.
//! It focuses on:
//!
//! - Constructing an HTTP client from [`PortalConfig`](sacco_util::PortalConfig)
//! - Validating the configured base URL for safety
//! - Attaching the stored bearer token to every non-public request
//! - Tearing the session down when the backend answers 401
//! - Decoding JSON bodies that may or may not be wrapped in `{ "data": ... }`
//!
//! The workflow engine talks to the backend only through the
//! [`LoanPortalApi`] trait, which [`SaccoClient`] implements over HTTP.
//!
//! # Example
//!
//! ```ignore
//! use sacco_api::{LoanPortalApi, SaccoClient};
//! use sacco_util::{PortalConfig, token_store_for};
//!
//! async fn products() -> Result<(), sacco_api::ApiError> {
//!     let config = PortalConfig::load().expect("config");
//!     let client = SaccoClient::new(&config, token_store_for(&config.base_url))?;
//!     for product in client.list_loan_products().await? {
//!         println!("{}", product.name);
//!     }
//!     Ok(())
//! }
//! ```

mod client;
pub mod endpoints;
mod error;
pub mod http;
mod portal;

pub use client::SaccoClient;
pub use error::ApiError;
pub use portal::LoanPortalApi;
