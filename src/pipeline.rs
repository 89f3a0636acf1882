//! Orchestration of the surface validators.
//!
//! A [`ValidationPipeline`] is built once per route and run for every
//! request. It owns no per-request state: each [`run`](ValidationPipeline::run)
//! creates a fresh [`ValidatedRequest`], walks the validators in a fixed
//! order and stops at the first failure.
//!
//! ```
//! use http::Method;
//! use reqcheck::{FieldType, HandlerSignature, RequestSurfaces, Validate};
//!
//! let pipeline = Validate::new()
//!     .signature(HandlerSignature::new().param("petId", FieldType::Integer))
//!     .build();
//!
//! let req = RequestSurfaces::new(Method::GET, "/pets/7").with_path_param("petId", "7");
//! let validated = pipeline.run(&req).unwrap();
//! assert_eq!(validated.path_params.unwrap().get("petId"), Some(&serde_json::json!(7)));
//! ```

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, info_span, warn};

use crate::error::ValidationError;
use crate::ids::RequestId;
use crate::metrics::ValidationMetrics;
use crate::request::RequestSurfaces;
use crate::response::{DefaultErrorHandler, ErrorHandler, ErrorResponse};
use crate::runtime_config::RuntimeConfig;
use crate::schema::Schema;
use crate::signature::HandlerSignature;
use crate::validated::ValidatedRequest;
use crate::validator::{
    BodyValidator, FormValidator, PathValidator, QueryValidator, Surface, SurfaceValidator,
};

/// Header carrying a caller-supplied request id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Declares which schemas apply to a route
///
/// Every surface is optional. Path parameters fall back to the handler
/// signature when no path schema is given; query and body without a schema
/// are not validated (and a body is rejected, see
/// [`RuntimeConfig::unexpected_body`]).
#[derive(Debug, Clone, Default)]
pub struct Validate {
    path: Option<Schema>,
    query: Option<Schema>,
    body: Option<Schema>,
    form: Option<Schema>,
    signature: HandlerSignature,
    config: RuntimeConfig,
    metrics: Option<Arc<ValidationMetrics>>,
}

impl Validate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn path(mut self, schema: Schema) -> Self {
        self.path = Some(schema);
        self
    }

    #[must_use]
    pub fn query(mut self, schema: Schema) -> Self {
        self.query = Some(schema);
        self
    }

    #[must_use]
    pub fn body(mut self, schema: Schema) -> Self {
        self.body = Some(schema);
        self
    }

    #[must_use]
    pub fn form(mut self, schema: Schema) -> Self {
        self.form = Some(schema);
        self
    }

    #[must_use]
    pub fn signature(mut self, signature: HandlerSignature) -> Self {
        self.signature = signature;
        self
    }

    #[must_use]
    pub fn metrics(mut self, metrics: Arc<ValidationMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Freeze the declaration into a pipeline
    ///
    /// Order is path, query, then body or form. A body schema wins over a
    /// form schema; when neither is declared a schemaless body validator
    /// still runs so undeclared payloads are caught.
    #[must_use]
    pub fn build(self) -> ValidationPipeline {
        let mut steps: Vec<Box<dyn SurfaceValidator>> = Vec::with_capacity(3);
        steps.push(Box::new(
            PathValidator::new(self.path, self.signature)
                .validate_formats(self.config.validate_formats),
        ));
        steps.push(Box::new(
            QueryValidator::new(self.query).warn_undeclared(self.config.warn_undeclared_query),
        ));
        match (self.body, self.form) {
            (Some(body), form) => {
                if form.is_some() {
                    warn!("Both body and form schemas declared; the form schema is ignored");
                }
                steps.push(Box::new(
                    BodyValidator::new(Some(body)).policy(self.config.unexpected_body),
                ));
            }
            (None, Some(form)) => steps.push(Box::new(FormValidator::new(form))),
            (None, None) => steps.push(Box::new(
                BodyValidator::new(None).policy(self.config.unexpected_body),
            )),
        }
        ValidationPipeline {
            steps,
            metrics: self.metrics,
        }
    }
}

/// Validate only the path, requiring the route to bind path parameters
#[must_use]
pub fn validate_path(schema: Option<Schema>, signature: HandlerSignature) -> ValidationPipeline {
    ValidationPipeline::single(PathValidator::required(schema, signature))
}

/// Validate only the query string
#[must_use]
pub fn validate_query(schema: Schema) -> ValidationPipeline {
    ValidationPipeline::single(QueryValidator::new(Some(schema)))
}

/// Validate only the JSON body
#[must_use]
pub fn validate_body(schema: Schema) -> ValidationPipeline {
    ValidationPipeline::single(BodyValidator::new(Some(schema)))
}

/// Validate only form fields; non-form requests are rejected with 415
#[must_use]
pub fn validate_form(schema: Schema) -> ValidationPipeline {
    ValidationPipeline::single(FormValidator::new(schema))
}

/// An ordered, immutable list of surface validators
pub struct ValidationPipeline {
    steps: Vec<Box<dyn SurfaceValidator>>,
    metrics: Option<Arc<ValidationMetrics>>,
}

impl std::fmt::Debug for ValidationPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationPipeline")
            .field("surfaces", &self.surfaces())
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

impl ValidationPipeline {
    pub(crate) fn single(validator: impl SurfaceValidator + 'static) -> Self {
        ValidationPipeline {
            steps: vec![Box::new(validator)],
            metrics: None,
        }
    }

    /// Attach counters to a pipeline built by one of the shorthands
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<ValidationMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Surfaces in the order they are validated
    #[must_use]
    pub fn surfaces(&self) -> Vec<Surface> {
        self.steps.iter().map(|s| s.surface()).collect()
    }

    /// Validate a request and return its populated context
    ///
    /// # Errors
    ///
    /// The first failing surface stops the run; its error is returned and no
    /// context is produced.
    pub fn run(&self, req: &RequestSurfaces) -> Result<ValidatedRequest, ValidationError> {
        let request_id = RequestId::from_header_or_new(req.header(REQUEST_ID_HEADER));
        let span = info_span!(
            "validate_request",
            request_id = %request_id,
            method = %req.method,
            path = %req.path
        );
        let _enter = span.enter();
        let started = Instant::now();

        let result = self.run_steps(request_id, req);

        if let Some(metrics) = &self.metrics {
            metrics.record(result.as_ref().map(|_| ()), started.elapsed());
        }
        match &result {
            Ok(validated) => {
                let populated = validated.to_map();
                info!(
                    surfaces = ?populated.keys().collect::<Vec<_>>(),
                    "Request validation passed"
                );
            }
            Err(err) if err.is_precondition() => {
                error!(category = err.category(), error = %err, "Request validation aborted");
            }
            Err(err) => debug!(
                category = err.category(),
                surface = ?err.surface(),
                error = %err,
                "Request validation failed"
            ),
        }
        result
    }

    fn run_steps(
        &self,
        request_id: RequestId,
        req: &RequestSurfaces,
    ) -> Result<ValidatedRequest, ValidationError> {
        let mut validated = ValidatedRequest::with_request_id(request_id);
        for step in &self.steps {
            let surface = step.surface();
            step.precondition(req)?;
            let record = step.validate(req)?;
            debug!(
                surface = %surface,
                populated = record.is_some(),
                "Surface validated"
            );
            validated.set(surface, record);
        }
        Ok(validated)
    }

    /// Validate and install the context into the request extensions
    ///
    /// # Errors
    ///
    /// Same as [`run`](Self::run); the extensions are untouched on failure.
    pub fn install<B>(
        &self,
        request: &mut http::Request<B>,
        surfaces: &RequestSurfaces,
    ) -> Result<(), ValidationError> {
        let validated = self.run(surfaces)?;
        request.extensions_mut().insert(validated);
        Ok(())
    }

    /// Wrap a handler so it only runs on validated requests
    #[must_use]
    pub fn wrap<H, R>(self, handler: H) -> ValidatedHandler<H>
    where
        H: Fn(&RequestSurfaces, &ValidatedRequest) -> R + Send + Sync,
    {
        ValidatedHandler {
            pipeline: self,
            handler,
            errors: Arc::new(DefaultErrorHandler),
        }
    }
}

/// A handler guarded by a validation pipeline
pub struct ValidatedHandler<H> {
    pipeline: ValidationPipeline,
    handler: H,
    errors: Arc<dyn ErrorHandler>,
}

impl<H> ValidatedHandler<H> {
    /// Replace the default JSON error envelope
    #[must_use]
    pub fn error_handler(mut self, errors: Arc<dyn ErrorHandler>) -> Self {
        self.errors = errors;
        self
    }

    #[must_use]
    pub fn pipeline(&self) -> &ValidationPipeline {
        &self.pipeline
    }

    /// Run validation, then the handler
    ///
    /// # Errors
    ///
    /// A failed validation is rendered by the error handler; the wrapped
    /// handler is not invoked.
    pub fn call<R>(&self, req: &RequestSurfaces) -> Result<R, ErrorResponse>
    where
        H: Fn(&RequestSurfaces, &ValidatedRequest) -> R,
    {
        match self.pipeline.run(req) {
            Ok(validated) => Ok((self.handler)(req, &validated)),
            Err(err) => Err(self.errors.handle(&err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime_config::UnexpectedBodyPolicy;
    use crate::schema::FieldType;
    use http::{Method, StatusCode};
    use serde_json::json;

    fn body_schema() -> Schema {
        Schema::new(
            "NewPet",
            json!({
                "type": "object",
                "properties": {"name": {"type": "string"}},
                "required": ["name"]
            }),
        )
        .unwrap()
    }

    fn form_schema() -> Schema {
        Schema::new(
            "Login",
            json!({"type": "object", "properties": {"user": {"type": "string"}}}),
        )
        .unwrap()
    }

    #[test]
    fn test_surface_order() {
        let p = Validate::new().body(body_schema()).build();
        assert_eq!(p.surfaces(), [Surface::Path, Surface::Query, Surface::Body]);
        let p = Validate::new().form(form_schema()).build();
        assert_eq!(p.surfaces(), [Surface::Path, Surface::Query, Surface::Form]);
        let p = Validate::new().body(body_schema()).form(form_schema()).build();
        assert_eq!(p.surfaces(), [Surface::Path, Surface::Query, Surface::Body]);
    }

    #[test]
    fn test_empty_request_yields_empty_context() {
        let p = Validate::new().build();
        let v = p.run(&RequestSurfaces::new(Method::GET, "/health")).unwrap();
        assert!(v.to_map().is_empty());
    }

    #[test]
    fn test_path_failure_stops_pipeline() {
        let p = Validate::new()
            .signature(HandlerSignature::new().param("id", FieldType::Integer))
            .build();
        let req = RequestSurfaces::new(Method::POST, "/items/x")
            .with_path_param("id", "x")
            .with_json_body(json!({"unexpected": true}));
        let err = p.run(&req).unwrap_err();
        assert_eq!(err.surface(), Some(Surface::Path));
    }

    #[test]
    fn test_undeclared_body_rejected_then_ignored() {
        let req = RequestSurfaces::new(Method::POST, "/x").with_json_body(json!({"a": 1}));
        let err = Validate::new().build().run(&req).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let lenient = RuntimeConfig {
            unexpected_body: UnexpectedBodyPolicy::Ignore,
            ..RuntimeConfig::default()
        };
        let v = Validate::new().with_config(lenient).build().run(&req).unwrap();
        assert!(v.body.is_none());
    }

    #[test]
    fn test_request_id_from_header() {
        let id = RequestId::new();
        let req =
            RequestSurfaces::new(Method::GET, "/").with_header("X-Request-Id", id.to_string());
        let v = Validate::new().build().run(&req).unwrap();
        assert_eq!(v.request_id(), id);
    }

    #[test]
    fn test_metrics_recorded() {
        let metrics = Arc::new(ValidationMetrics::new());
        let p = validate_body(body_schema()).with_metrics(Arc::clone(&metrics));
        let ok = RequestSurfaces::new(Method::POST, "/").with_json_body(json!({"name": "rex"}));
        let bad = RequestSurfaces::new(Method::POST, "/").with_json_body(json!({"name": 1}));
        assert!(p.run(&ok).is_ok());
        assert!(p.run(&bad).is_err());
        assert_eq!(metrics.passed(), 1);
        assert_eq!(metrics.failures("field"), 1);
    }

    #[test]
    fn test_wrap_skips_handler_on_failure() {
        let handler = validate_form(form_schema()).wrap(|_req, v| v.form.clone());
        let json_req = RequestSurfaces::new(Method::POST, "/login").with_json_body(json!({}));
        let err = handler.call(&json_req).unwrap_err();
        assert_eq!(err.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let form_req = RequestSurfaces::new(Method::POST, "/login")
            .with_raw_body(Some("application/x-www-form-urlencoded"), b"user=ann");
        let form = handler.call(&form_req).unwrap().unwrap();
        assert_eq!(form.get("user"), Some(&json!("ann")));
    }

    #[test]
    fn test_install_into_extensions() {
        let p = validate_path(None, HandlerSignature::new());
        let surfaces = RequestSurfaces::new(Method::GET, "/u/1").with_path_param("uid", 1);
        let mut request = http::Request::new(());
        p.install(&mut request, &surfaces).unwrap();
        let v = ValidatedRequest::from_extensions(request.extensions()).unwrap();
        assert_eq!(v.path_params.as_ref().unwrap().get("uid"), Some(&json!(1)));
    }
}
