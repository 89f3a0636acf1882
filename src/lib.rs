//! # reqcheck
//!
//! **reqcheck** validates the inbound surfaces of an HTTP request (path
//! parameters, query string, JSON body and form fields) against declared
//! schemas before a handler runs, and hands the handler a single
//! [`ValidatedRequest`] holding the validated records.
//!
//! ## Overview
//!
//! A route declares what it accepts once, at registration:
//!
//! - explicit [`Schema`]s per surface (JSON Schema documents with lax
//!   coercion, so `"42"` satisfies an `integer` field), and
//! - optionally a [`HandlerSignature`], the handler's parameter-type table,
//!   used as a per-field fallback for path parameters.
//!
//! The declaration is frozen into a [`ValidationPipeline`] which runs for
//! every request in a fixed order (path, query, then body or form) and stops
//! at the first failure. Failures are typed ([`ValidationError`]) and carry
//! per-field [`FieldViolation`]s; a pluggable
//! [`ErrorHandler`](response::ErrorHandler) turns them into responses.
//!
//! ## Architecture
//!
//! - **[`schema`]** - Compiled schemas, lax coercion and field types
//! - **[`signature`]** - Declared handler parameter types
//! - **[`multi_value`]** - Collapsing repeated query/form keys
//! - **[`request`]** - Request surfaces as handed over by the router
//! - **[`validator`]** - One validator per surface
//! - **[`pipeline`]** - Orchestration and handler wrapping
//! - **[`validated`]** - The per-request validated context
//! - **[`response`]** - Error envelopes
//! - **[`metrics`]** - Validation counters in Prometheus text format
//! - **[`route`]** / **[`lint`]** / **[`cli`]** - Route files and the `reqcheck` binary
//!
//! ## Quick Start
//!
//! ```rust
//! use http::Method;
//! use reqcheck::{FieldType, HandlerSignature, RequestSurfaces, Schema, Validate};
//! use serde_json::json;
//!
//! let pipeline = Validate::new()
//!     .signature(HandlerSignature::new().param("petId", FieldType::Integer))
//!     .query(Schema::new("PetQuery", json!({
//!         "type": "object",
//!         "properties": {"tag": {"type": "array", "items": {"type": "string"}}}
//!     })).unwrap())
//!     .build();
//!
//! let req = RequestSurfaces::new(Method::GET, "/pets/7?tag=a&tag=b")
//!     .with_path_param("petId", "7");
//! let validated = pipeline.run(&req).unwrap();
//!
//! assert_eq!(validated.to_json(), json!({
//!     "path_params": {"petId": 7},
//!     "query_params": {"tag": ["a", "b"]}
//! }));
//! ```
//!
//! ## Configuration
//!
//! See [`runtime_config`] for environment variables controlling undeclared
//! payloads and format assertion, and [`logging`] for log output.

pub mod cli;
pub mod error;
pub mod ids;
pub mod lint;
pub mod logging;
pub mod metrics;
pub mod multi_value;
pub mod pipeline;
pub mod request;
pub mod response;
pub mod route;
pub mod runtime_config;
pub mod schema;
pub mod signature;
pub mod validated;
pub mod validator;

pub use error::{FieldViolation, SchemaError, ValidationError, ViolationKind};
pub use ids::RequestId;
pub use pipeline::{
    validate_body, validate_form, validate_path, validate_query, Validate, ValidatedHandler,
    ValidationPipeline,
};
pub use request::{BodyPayload, RequestSurfaces};
pub use response::{DefaultErrorHandler, ErrorHandler, ErrorResponse};
pub use runtime_config::{RuntimeConfig, UnexpectedBodyPolicy};
pub use schema::{FieldType, Schema};
pub use signature::HandlerSignature;
pub use validated::{Record, ValidatedRequest};
pub use validator::Surface;
