use std::collections::HashMap;
use std::time::Instant;

/// Cross-cutting observer for per-frame analysis events.
///
/// The use case reports stage timings and counts here instead of writing
/// to a fixed sink, so the CLI can summarize a run and tests stay silent.
pub trait PipelineLogger: Send {
    /// Called once per analyzed frame with the number of persons emitted.
    fn frame_done(&mut self, frame_index: usize, persons: usize);

    /// Record how long a named stage took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. detected boxes).
    fn metric(&mut self, name: &str, value: f64);

    /// A unit of work was skipped (bad crop, failed estimation).
    fn skipped(&mut self, reason: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Logger that discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn frame_done(&mut self, _frame_index: usize, _persons: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn skipped(&mut self, _reason: &str) {}
}

/// `log`-backed logger that accumulates stage timings and metrics and
/// prints a summary when the run ends.
pub struct StdoutPipelineLogger {
    timings: HashMap<String, Vec<f64>>,
    metrics: HashMap<String, Vec<f64>>,
    start_time: Instant,
    frames: usize,
    persons: usize,
    skipped: usize,
}

impl StdoutPipelineLogger {
    pub fn new() -> Self {
        Self {
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            frames: 0,
            persons: 0,
            skipped: 0,
        }
    }

    /// Returns the formatted summary, or `None` if no frame was analyzed.
    pub fn summary_string(&self) -> Option<String> {
        if self.frames == 0 && self.timings.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let mut lines = vec![format!(
            "Analysis summary ({} frames, {} persons, {} skipped, {:.1}s total):",
            self.frames,
            self.persons,
            self.skipped,
            elapsed_ms / 1000.0
        )];

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = mean(durations);
            lines.push(format!(
                "  {stage:10}: avg {avg_ms:6.1}ms  total {total_ms:7.0}ms  ({} calls)",
                durations.len()
            ));
        }

        let mut names: Vec<_> = self.metrics.keys().collect();
        names.sort();
        for name in names {
            lines.push(format!("  {name}: avg {:.1}", mean(&self.metrics[name])));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new()
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn frame_done(&mut self, frame_index: usize, persons: usize) {
        self.frames += 1;
        self.persons += persons;
        log::info!("Frame {frame_index}: {persons} person(s) analyzed");
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics
            .entry(name.to_string())
            .or_default()
            .push(value);
    }

    fn skipped(&mut self, reason: &str) {
        self.skipped += 1;
        log::warn!("Skipped: {reason}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_logger_all_methods_are_noop() {
        let mut logger = NullPipelineLogger;
        logger.frame_done(0, 2);
        logger.timing("detect", 5.0);
        logger.metric("boxes", 3.0);
        logger.skipped("empty crop");
        logger.summary();
    }

    #[test]
    fn test_timing_records_values_per_stage() {
        let mut logger = StdoutPipelineLogger::new();
        logger.timing("detect", 20.0);
        logger.timing("detect", 30.0);
        logger.timing("estimate", 5.0);

        assert_eq!(logger.timings_for("detect").unwrap(), &[20.0, 30.0]);
        assert_eq!(logger.timings_for("estimate").unwrap(), &[5.0]);
        assert!(logger.timings_for("analyze").is_none());
    }

    #[test]
    fn test_frame_done_accumulates_counts() {
        let mut logger = StdoutPipelineLogger::new();
        logger.frame_done(0, 2);
        logger.frame_done(1, 0);
        logger.skipped("zero-area crop");

        assert_eq!(logger.frames, 2);
        assert_eq!(logger.persons, 2);
        assert_eq!(logger.skipped, 1);
    }

    #[test]
    fn test_summary_includes_stages_and_counts() {
        let mut logger = StdoutPipelineLogger::new();
        logger.frame_done(0, 1);
        logger.timing("detect", 20.0);
        logger.timing("estimate", 8.0);
        logger.metric("boxes", 3.0);
        logger.metric("boxes", 4.0);

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("1 frames, 1 persons"));
        assert!(summary.contains("detect"));
        assert!(summary.contains("estimate"));
        assert!(summary.contains("boxes: avg 3.5"));
    }

    #[test]
    fn test_empty_summary_returns_none() {
        assert!(StdoutPipelineLogger::new().summary_string().is_none());
    }
}
