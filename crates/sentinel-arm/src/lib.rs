//! Azure Resource Manager backend for the Sentinel alert rule collection.
//!
//! [`ArmClient`] implements `AlertRulesApi` over the Security Insights REST
//! API (`api-version` [`API_VERSION`]). Requests are authorized with a bearer
//! token obtained from a [`Credential`]: either a pre-issued access token or
//! Entra ID client credentials exchanged and cached by [`TokenSource`].

mod auth;
mod client;

pub use auth::{Credential, TokenSource, DEFAULT_AUTHORITY, MANAGEMENT_SCOPE};
pub use client::{ArmClient, API_VERSION, DEFAULT_ENDPOINT};
