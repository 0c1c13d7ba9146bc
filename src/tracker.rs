//! Bounded accumulation of rule violations.
//!
//! A tracker counts every occurrence of one rule violation but only keeps the
//! first few sample indices, so a file with millions of bad samples still
//! renders one short line per rule.

use std::fmt;

use crate::report::{Severity, ValidationReport};

/// Number of sample indices a tracker retains.
pub const MAX_SAMPLES: usize = 5;

/// Location of one violation: a sample index, or a pair of indices for
/// violations spanning two arrays (profile/level, measurement/cycle).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleRef {
    Index(usize),
    Pair(usize, usize),
}

impl fmt::Display for SampleRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SampleRef::Index(i) => write!(f, "{}", i),
            SampleRef::Pair(i, j) => write!(f, "({},{})", i, j),
        }
    }
}

/// Keeps the first `MAX_SAMPLES` references pushed into it, drops the rest.
#[derive(Debug, Clone, Default)]
pub struct SampleBuffer {
    items: Vec<SampleRef>,
}

impl SampleBuffer {
    pub fn push(&mut self, sample: SampleRef) {
        if self.items.len() < MAX_SAMPLES {
            self.items.push(sample);
        }
    }

    pub fn as_slice(&self) -> &[SampleRef] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ErrorTracker {
    subject: String,
    unit: &'static str,
    severity: Severity,
    count: usize,
    samples: SampleBuffer,
}

impl ErrorTracker {
    pub fn new<S: Into<String>>(subject: S, unit: &'static str, severity: Severity) -> Self {
        ErrorTracker {
            subject: subject.into(),
            unit,
            severity,
            count: 0,
            samples: SampleBuffer::default(),
        }
    }

    pub fn error<S: Into<String>>(subject: S, unit: &'static str) -> Self {
        Self::new(subject, unit, Severity::Error)
    }

    pub fn warning<S: Into<String>>(subject: S, unit: &'static str) -> Self {
        Self::new(subject, unit, Severity::Warning)
    }

    pub fn record(&mut self, sample: SampleRef) {
        self.count += 1;
        self.samples.push(sample);
    }

    /// True number of occurrences, regardless of how many were retained.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn samples(&self) -> &[SampleRef] {
        self.samples.as_slice()
    }

    pub fn has_fired(&self) -> bool {
        self.count > 0
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// `"<subject>: <count> <unit>; first <n> indices <list>"`, or `None`
    /// when the rule never fired.
    pub fn message(&self) -> Option<String> {
        if self.count == 0 {
            return None;
        }

        let list: Vec<String> = self.samples().iter().map(|s| s.to_string()).collect();
        Some(format!(
            "{}: {} {}; first {} indices {}",
            self.subject,
            self.count,
            self.unit,
            self.samples.len(),
            list.join(", ")
        ))
    }

    /// Render into the report at this rule's severity.
    pub fn emit(self, report: &mut ValidationReport) {
        if let Some(msg) = self.message() {
            report.push(self.severity, msg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retention_is_capped_but_count_is_not() {
        let mut t = ErrorTracker::error("TEMP_QC: invalid QC code", "levels");
        for i in 0..12 {
            t.record(SampleRef::Index(i));
        }
        assert_eq!(t.count(), 12);
        assert_eq!(t.samples().len(), MAX_SAMPLES);
        assert_eq!(t.samples()[4], SampleRef::Index(4));
        assert_eq!(
            t.message().unwrap(),
            "TEMP_QC: invalid QC code: 12 levels; first 5 indices 0, 1, 2, 3, 4"
        );
    }

    #[test]
    fn test_pairs_render() {
        let mut t = ErrorTracker::warning("CYCLE", "measurements");
        t.record(SampleRef::Pair(7, 2));
        assert_eq!(t.message().unwrap(), "CYCLE: 1 measurements; first 1 indices (7,2)");
    }

    #[test]
    fn test_silent_tracker_emits_nothing() {
        let t = ErrorTracker::error("PRES", "levels");
        assert!(t.message().is_none());
        let mut report = ValidationReport::new();
        t.emit(&mut report);
        assert!(report.errors().is_empty());
        assert!(report.warnings().is_empty());
    }

    #[test]
    fn test_emit_severity() {
        let mut report = ValidationReport::new();
        let mut t = ErrorTracker::warning("DOXY_QC: deprecated QC code", "levels");
        t.record(SampleRef::Index(0));
        t.emit(&mut report);
        assert_eq!(report.warnings().len(), 1);
        assert!(report.is_ok());
    }
}
