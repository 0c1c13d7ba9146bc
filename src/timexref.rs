//! Per-cycle event times (`JULD_DESCENT_START`, `JULD_FIRST_LOCATION`, ...)
//! against the times of the measurements carrying the matching measurement
//! code.
//!
//! Measurements must be stored grouped by cycle. First-only and last-only
//! selections apply to each contiguous run of one cycle; a cycle split over
//! several runs is compared once per run and reported by
//! `check_cycle_order`.

use std::collections::BTreeSet;

use float_cmp::{ApproxEq, F64Margin};

use crate::codes::{EventTarget, Selection};
use crate::cycles::CycleIndex;
use crate::fill::is_missing;
use crate::report::ValidationReport;
use crate::tracker::{ErrorTracker, SampleRef};

/// Per-measurement event codes and times.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementTimes {
    pub codes: Vec<i64>,
    pub time: Vec<f64>,
    pub status: Vec<u8>,
    pub fill: f64,
}

impl MeasurementTimes {
    /// Take the adjusted time (and its status) wherever it is set, the raw
    /// time elsewhere.
    pub fn best_estimate(
        codes: Vec<i64>,
        time: Vec<f64>,
        status: Vec<u8>,
        adjusted: Option<(Vec<f64>, Vec<u8>)>,
        fill: f64,
    ) -> Self {
        let mut times = MeasurementTimes {
            codes,
            time,
            status,
            fill,
        };

        if let Some((adj_time, adj_status)) = adjusted {
            for (m, (&t, &s)) in adj_time.iter().zip(adj_status.iter()).enumerate() {
                if m < times.time.len() && !is_missing(fill, t) {
                    times.time[m] = t;
                    times.status[m] = s;
                }
            }
        }
        times
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

/// One per-cycle event-time variable and its status variable, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleEventTimes {
    pub name: String,
    pub values: Vec<f64>,
    pub status: Option<Vec<u8>>,
    pub fill: f64,
}

struct EventMatcher<'a> {
    index: &'a CycleIndex,
    times: &'a MeasurementTimes,
    cycle_times: &'a CycleEventTimes,
    margin: F64Margin,
    matched: Vec<bool>,
    value_mismatch: ErrorTracker,
    status_mismatch: ErrorTracker,
}

impl<'a> EventMatcher<'a> {
    fn compare(&mut self, m: usize) {
        let ci = match self.index.measurement_cycle_index(m) {
            Some(ci) if ci < self.cycle_times.values.len() => ci,
            _ => return,
        };
        self.matched[ci] = true;

        let cycle_value = self.cycle_times.values[ci];
        let meas_value = self.times.time[m];
        let cycle_missing = is_missing(self.cycle_times.fill, cycle_value);
        let meas_missing = is_missing(self.times.fill, meas_value);
        let same = match (cycle_missing, meas_missing) {
            (true, true) => true,
            (false, false) => meas_value.approx_eq(cycle_value, self.margin),
            _ => false,
        };
        if !same {
            self.value_mismatch.record(SampleRef::Pair(m, ci));
        }

        if let Some(status) = &self.cycle_times.status {
            if status.get(ci) != self.times.status.get(m) {
                self.status_mismatch.record(SampleRef::Pair(m, ci));
            }
        }
    }
}

/// Compare one per-cycle event-time variable against the measurements
/// carrying `target.code`, then flag per-cycle values no measurement backs.
pub fn check_event_times(
    index: &CycleIndex,
    times: &MeasurementTimes,
    target: &EventTarget,
    cycle_times: &CycleEventTimes,
    tolerance: f64,
    report: &mut ValidationReport,
) {
    let name = &cycle_times.name;
    let mut matcher = EventMatcher {
        index,
        times,
        cycle_times,
        margin: F64Margin {
            ulps: 2,
            epsilon: tolerance,
        },
        matched: vec![false; cycle_times.values.len()],
        value_mismatch: ErrorTracker::error(
            format!("{}: differs from JULD of MEASUREMENT_CODE {}", name, target.code),
            "measurements",
        ),
        status_mismatch: ErrorTracker::error(
            format!("{}_STATUS: differs from JULD_STATUS of MEASUREMENT_CODE {}", name, target.code),
            "measurements",
        ),
    };

    let mut run_cycle: Option<Option<i64>> = None;
    let mut first_done = false;
    let mut pending_last: Option<usize> = None;

    for m in 0..times.len().min(index.n_measurements()) {
        let cycle = index.measurement_cycle(m);
        if run_cycle != Some(cycle) {
            if let Some(p) = pending_last.take() {
                matcher.compare(p);
            }
            run_cycle = Some(cycle);
            first_done = false;
        }

        if times.codes[m] != target.code {
            continue;
        }
        match target.selection {
            Selection::Exact => matcher.compare(m),
            Selection::FirstOnly => {
                if !first_done {
                    first_done = true;
                    matcher.compare(m);
                }
            }
            Selection::LastOnly => pending_last = Some(m),
        }
    }
    if let Some(p) = pending_last {
        matcher.compare(p);
    }

    let mut orphaned = ErrorTracker::error(
        format!("{}: set but no measurement with MEASUREMENT_CODE {}", name, target.code),
        "cycles",
    );
    for (ci, &value) in cycle_times.values.iter().enumerate() {
        if !matcher.matched[ci] && !is_missing(cycle_times.fill, value) {
            orphaned.record(SampleRef::Index(ci));
        }
    }

    matcher.value_mismatch.emit(report);
    matcher.status_mismatch.emit(report);
    orphaned.emit(report);
}

/// Warn about measurements that reopen a cycle after a different cycle's
/// measurements, i.e. storage not grouped by cycle.
pub fn check_cycle_order(index: &CycleIndex, report: &mut ValidationReport) {
    let mut split = ErrorTracker::warning("CYCLE_NUMBER: measurements not grouped by cycle", "measurements");
    let mut seen = BTreeSet::new();
    let mut current = None;

    for m in 0..index.n_measurements() {
        let cycle = match index.measurement_cycle(m) {
            Some(c) => c,
            None => continue,
        };
        if current == Some(cycle) {
            continue;
        }
        if !seen.insert(cycle) {
            split.record(SampleRef::Index(m));
        }
        current = Some(cycle);
    }

    split.emit(report);
}
