//! Synchronous client for the Watershed learning-analytics API.
//!
//! # Overview
//! Creates organizations, activity providers, invitations, skills, cards and
//! card groups over the Watershed REST API using Basic authentication, and
//! translates plain-language card settings ("highest score" per "month")
//! into the configuration the card API expects.
//!
//! # Design
//! - `WatershedClient` holds only a `ClientConfig` and a `Transport`.
//! - Every resource operation is split into `build_*` (produces an
//!   `HttpRequest`) and `parse_*` (consumes an `HttpResponse`), so the I/O
//!   boundary is explicit and testable without a server.
//! - Unexpected statuses are results (`success == false`), not errors.
//!   `ApiError` is reserved for transport, configuration and vocabulary
//!   failures.
//! - `group_cards` is the one multi-request operation. It reports the step
//!   that failed and never rolls back.

pub mod auth;
pub mod cards;
pub mod client;
pub mod config;
pub mod error;
pub mod grouping;
pub mod http;
pub mod types;
pub mod vocabulary;

#[cfg(test)]
mod testing;

pub use auth::{Auth, AuthConfig};
pub use client::WatershedClient;
pub use config::ClientConfig;
pub use error::{ApiError, ConfigError};
pub use grouping::{GroupOutcome, GroupStep, DEFAULT_PARENT_GROUP};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
pub use types::{
    ActivityProviderResult, ApiResponse, CardGroup, CardGroupLookup, CardGroupResult, CardResult,
    MeasureSpec, OrganizationResult, Role, SkillResult,
};
pub use vocabulary::{
    build_list_string, build_measure, dimension_from_phrase, generate_uuid, measure_from_phrase,
    Aggregation, CardTemplate, Dimension, Measure, StatementProperty, TimePeriod,
};
