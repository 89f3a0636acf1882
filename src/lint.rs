//! Static checks for route validation files.
//!
//! `lint_route` reports every problem it can find instead of stopping at the
//! first one, so a route author can fix a file in one pass.

use std::fmt;

use serde_json::Value;

use crate::route::{RouteMode, RouteValidation};
use crate::runtime_config::RuntimeConfig;
use crate::schema::{FieldType, Schema};

/// One problem found in a route file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub location: String,
    pub kind: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(
        location: impl Into<String>,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        ValidationIssue {
            location: location.into(),
            kind: kind.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.location, self.message)
    }
}

pub fn print_issues(issues: &[ValidationIssue]) {
    eprintln!("\n❌ Route validation file has {} issue(s):\n", issues.len());
    for issue in issues {
        eprintln!("{issue}");
    }
    eprintln!("\nPlease fix the issues before registering the route.\n");
}

/// Print the issues and fail when there are any
///
/// # Errors
///
/// Returns an error carrying the issue count when `issues` is not empty.
pub fn fail_if_issues(issues: &[ValidationIssue]) -> anyhow::Result<()> {
    if issues.is_empty() {
        return Ok(());
    }
    print_issues(issues);
    anyhow::bail!("{} route validation issue(s) found", issues.len())
}

fn declared_properties(document: &Value) -> Option<Vec<&str>> {
    document
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| props.keys().map(String::as_str).collect())
}

/// Check every schema, type name and mode requirement of a route
#[must_use]
pub fn lint_route(route: &RouteValidation, config: &RuntimeConfig) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let loc = |part: &str| format!("{}.{part}", route.name);

    if route.name.trim().is_empty() {
        issues.push(ValidationIssue::new("name", "missing", "Route has no name"));
    }

    let schemas = [
        ("path_schema", &route.path_schema),
        ("query_schema", &route.query_schema),
        ("body_schema", &route.body_schema),
        ("form_schema", &route.form_schema),
    ];
    for (field, document) in schemas {
        let Some(document) = document else { continue };
        if let Err(e) = Schema::with_formats(loc(field), document.clone(), config.validate_formats)
        {
            issues.push(ValidationIssue::new(loc(field), "schema", e.message));
            continue;
        }
        match document.get("type").and_then(Value::as_str) {
            Some("object") | None => {}
            Some(other) => issues.push(ValidationIssue::new(
                loc(field),
                "shape",
                format!(
                    "Request surfaces validate to records; expected type 'object', found '{other}'"
                ),
            )),
        }
    }

    for (param, type_name) in &route.signature {
        if let Err(e) = type_name.parse::<FieldType>() {
            issues.push(ValidationIssue::new(
                loc(&format!("signature.{param}")),
                "type",
                e.to_string(),
            ));
        }
    }

    if let Some(path_schema) = &route.path_schema {
        if let Some(props) = declared_properties(path_schema) {
            for param in route.signature.keys() {
                if !props.contains(&param.as_str()) {
                    issues.push(ValidationIssue::new(
                        loc(&format!("signature.{param}")),
                        "shadowed",
                        "Signature type is unused: path_schema is declared and has no such property",
                    ));
                }
            }
        }
    }

    let required = match route.mode {
        RouteMode::Query => Some(("query_schema", route.query_schema.is_some())),
        RouteMode::Body => Some(("body_schema", route.body_schema.is_some())),
        RouteMode::Form => Some(("form_schema", route.form_schema.is_some())),
        RouteMode::Combined | RouteMode::Path => None,
    };
    if let Some((field, false)) = required {
        issues.push(ValidationIssue::new(
            loc("mode"),
            "missing",
            format!("Mode requires {field}"),
        ));
    }

    if route.body_schema.is_some() && route.form_schema.is_some() {
        issues.push(ValidationIssue::new(
            loc("form_schema"),
            "conflict",
            "Body and form are exclusive; form_schema is ignored when body_schema is declared",
        ));
    }

    issues
}
