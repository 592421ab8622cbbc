use serde::Serialize;

/// Deterministic and external confidence for the active slide.
///
/// Either side may be absent. `combined` is the plain max of the two, so a
/// missing or stale external score never holds back lexical progress.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ConfidenceSample {
    pub deterministic: Option<f64>,
    pub external: Option<f64>,
}

fn sanitize(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite()).map(|v| v.clamp(0.0, 1.0))
}

impl ConfidenceSample {
    pub fn new(deterministic: Option<f64>, external: Option<f64>) -> Self {
        Self {
            deterministic: sanitize(deterministic),
            external: sanitize(external),
        }
    }

    pub fn with_deterministic(self, value: Option<f64>) -> Self {
        Self::new(value, self.external)
    }

    pub fn with_external(self, value: Option<f64>) -> Self {
        Self::new(self.deterministic, value)
    }

    pub fn combined(&self) -> f64 {
        self.deterministic
            .unwrap_or(0.0)
            .max(self.external.unwrap_or(0.0))
    }
}
