use crate::analysis::domain::spine_metrics::SpineMetrics;
use crate::narrative::domain::narrative_generator::{
    NarrativeContext, NarrativeError, NarrativeGenerator,
};

/// Stand-in used when no language model is configured.
pub struct UnavailableNarrator {
    reason: String,
}

impl UnavailableNarrator {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl NarrativeGenerator for UnavailableNarrator {
    fn generate(
        &self,
        _metrics: &SpineMetrics,
        _context: NarrativeContext,
    ) -> Result<String, NarrativeError> {
        Err(NarrativeError::Unavailable(self.reason.clone()))
    }
}
