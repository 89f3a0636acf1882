use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use crate::error::ValidationError;

/// Counters for validation outcomes
///
/// All counters use atomic operations so one instance can be shared by every
/// pipeline of a service. Failures are split by category so a spike in
/// `configuration` failures (route setup bugs) stands out from ordinary
/// client mistakes.
#[derive(Debug, Default)]
pub struct ValidationMetrics {
    requests: AtomicUsize,
    passed: AtomicUsize,
    field_failures: AtomicUsize,
    configuration_failures: AtomicUsize,
    media_type_failures: AtomicUsize,
    parse_failures: AtomicUsize,
    total_latency_ns: AtomicU64,
}

impl ValidationMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one pipeline run
    pub fn record(&self, outcome: Result<(), &ValidationError>, latency: Duration) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        let nanos = u64::try_from(latency.as_nanos()).unwrap_or(u64::MAX);
        self.total_latency_ns.fetch_add(nanos, Ordering::Relaxed);
        let counter = match outcome {
            Ok(()) => &self.passed,
            Err(err) => match err.category() {
                "field" => &self.field_failures,
                "configuration" => &self.configuration_failures,
                "media_type" => &self.media_type_failures,
                _ => &self.parse_failures,
            },
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn passed(&self) -> usize {
        self.passed.load(Ordering::Relaxed)
    }

    /// Failures for a category label (`field`, `configuration`, `media_type`, `parse`)
    #[must_use]
    pub fn failures(&self, category: &str) -> usize {
        let counter = match category {
            "field" => &self.field_failures,
            "configuration" => &self.configuration_failures,
            "media_type" => &self.media_type_failures,
            "parse" => &self.parse_failures,
            _ => return 0,
        };
        counter.load(Ordering::Relaxed)
    }

    /// Mean time spent validating; zero before the first run
    #[must_use]
    pub fn average_latency(&self) -> Duration {
        let count = self.requests.load(Ordering::Relaxed) as u64;
        if count == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(self.total_latency_ns.load(Ordering::Relaxed) / count)
        }
    }

    /// Prometheus text exposition of the counters
    #[must_use]
    pub fn render_prometheus(&self) -> String {
        let mut out = format!(
            "# HELP reqcheck_validations_total Total number of validated requests\n\
             # TYPE reqcheck_validations_total counter\n\
             reqcheck_validations_total {}\n\
             # HELP reqcheck_validations_passed_total Requests that passed validation\n\
             # TYPE reqcheck_validations_passed_total counter\n\
             reqcheck_validations_passed_total {}\n\
             # HELP reqcheck_validation_failures_total Failed validations by category\n\
             # TYPE reqcheck_validation_failures_total counter\n",
            self.request_count(),
            self.passed(),
        );
        for category in ["field", "configuration", "media_type", "parse"] {
            out.push_str(&format!(
                "reqcheck_validation_failures_total{{category=\"{category}\"}} {}\n",
                self.failures(category)
            ));
        }
        out.push_str(&format!(
            "# HELP reqcheck_validation_latency_seconds Average validation latency in seconds\n\
             # TYPE reqcheck_validation_latency_seconds gauge\n\
             reqcheck_validation_latency_seconds {}\n",
            self.average_latency().as_secs_f64()
        ));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::Surface;

    #[test]
    fn test_counts_by_category() {
        let m = ValidationMetrics::new();
        m.record(Ok(()), Duration::from_micros(10));
        m.record(
            Err(&ValidationError::UnexpectedData {
                surface: Surface::Body,
            }),
            Duration::from_micros(30),
        );
        m.record(Err(&ValidationError::fields(Surface::Query, vec![])), Duration::ZERO);
        assert_eq!(m.request_count(), 3);
        assert_eq!(m.passed(), 1);
        assert_eq!(m.failures("configuration"), 1);
        assert_eq!(m.failures("field"), 1);
        assert_eq!(m.failures("parse"), 0);
        assert_eq!(m.failures("bogus"), 0);
        assert_eq!(m.average_latency(), Duration::from_nanos(40_000 / 3));
    }

    #[test]
    fn test_prometheus_text() {
        let m = ValidationMetrics::new();
        m.record(Ok(()), Duration::ZERO);
        let text = m.render_prometheus();
        assert!(text.contains("reqcheck_validations_total 1"));
        assert!(text.contains("reqcheck_validation_failures_total{category=\"media_type\"} 0"));
        assert!(text.contains("# TYPE reqcheck_validation_latency_seconds gauge"));
    }
}
