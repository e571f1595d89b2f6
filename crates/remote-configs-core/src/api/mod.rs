//! Network access for the remote configuration document.
//!
//! This module provides the `NetworkProvider` capability and
//! `HttpNetworkProvider`, which issues a single GET per fetch with the
//! caller's custom headers attached.

pub mod client;
pub mod error;
pub mod provider;

pub use client::HttpNetworkProvider;
pub use error::ApiError;
pub use provider::NetworkProvider;
