//! Bloom Credit Client Library
//!
//! This library wraps the Bloom Credit API: it authenticates, registers a
//! consumer, places a credit report order and retrieves the finished report.
//!
//! # Modules
//!
//! - `client`: Bloom API client, one method per API call.
//! - `config`: Configuration management (sandbox and production endpoints).
//! - `errors`: Error handling types.
//! - `models`: Consumer, portfolio and response models.
//! - `tokenizer`: JSON request templating.
//! - `utils`: Coalesce and log redaction helpers.
//! - `workflow`: The full auth → order → report sequence.

pub mod client;
pub mod config;
pub mod errors;
pub mod models;
pub mod tokenizer;
pub mod utils;
pub mod workflow;
