//! Reconciliation of the per-cycle and per-measurement cycle numbers of a
//! trajectory file.
//!
//! Both index spaces store a raw cycle number and, optionally, an adjusted
//! override. The final cycle number of a position is the adjusted one when it
//! is set. Per-cycle positions must carry distinct final numbers, and the two
//! spaces must reference exactly the same set of cycles.

use std::collections::{BTreeMap, BTreeSet};

use crate::codes::DataMode;
use crate::report::ValidationReport;
use crate::tracker::{ErrorTracker, SampleRef};

/// Cycle number of the launch pseudo-cycle. Only allowed on the first
/// measurement and never summarized per cycle.
pub const LAUNCH_CYCLE: i64 = -1;

/// A raw cycle-number array and its optional adjusted override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleNumbers {
    pub name: String,
    pub primary: Vec<i64>,
    pub adjusted: Option<Vec<i64>>,
    pub fill: i64,
}

impl CycleNumbers {
    pub fn new(name: &str, primary: Vec<i64>, adjusted: Option<Vec<i64>>, fill: i64) -> Self {
        CycleNumbers {
            name: name.to_owned(),
            primary,
            adjusted,
            fill,
        }
    }

    pub fn len(&self) -> usize {
        self.primary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_empty()
    }

    fn adjusted_at(&self, i: usize) -> Option<i64> {
        let adjusted = self.adjusted.as_ref()?;
        match adjusted.get(i) {
            Some(&c) if c != self.fill => Some(c),
            _ => None,
        }
    }

    /// Adjusted number if set, else the raw number, else `None`.
    pub fn final_number(&self, i: usize) -> Option<i64> {
        self.adjusted_at(i).or_else(|| match self.primary.get(i) {
            Some(&c) if c != self.fill => Some(c),
            _ => None,
        })
    }

    fn adjusted_name(&self) -> String {
        format!("{}_ADJUSTED", self.name)
    }
}

/// Final cycle number to per-cycle position, plus the resolved final numbers
/// of every position in both index spaces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleIndex {
    map: BTreeMap<i64, usize>,
    cycle_numbers: Vec<Option<i64>>,
    measurement_numbers: Vec<Option<i64>>,
    modes: Vec<Option<DataMode>>,
}

impl CycleIndex {
    pub fn map(&self) -> &BTreeMap<i64, usize> {
        &self.map
    }

    pub fn index_of(&self, cycle: i64) -> Option<usize> {
        self.map.get(&cycle).copied()
    }

    pub fn n_cycles(&self) -> usize {
        self.cycle_numbers.len()
    }

    pub fn n_measurements(&self) -> usize {
        self.measurement_numbers.len()
    }

    /// Final cycle number of measurement `m`, `None` when it has none.
    pub fn measurement_cycle(&self, m: usize) -> Option<i64> {
        self.measurement_numbers.get(m).copied().flatten()
    }

    /// Per-cycle position of measurement `m`'s cycle.
    pub fn measurement_cycle_index(&self, m: usize) -> Option<usize> {
        self.measurement_cycle(m).and_then(|c| self.index_of(c))
    }

    pub fn cycle_mode(&self, index: usize) -> Option<DataMode> {
        self.modes.get(index).copied().flatten()
    }

    /// Data mode of measurement `m`, taken from its cycle.
    pub fn measurement_mode(&self, m: usize) -> Option<DataMode> {
        self.measurement_cycle_index(m).and_then(|i| self.cycle_mode(i))
    }
}

struct ModeTrackers {
    realtime_adjusted: ErrorTracker,
    delayed_unadjusted: ErrorTracker,
    delayed_absent: ErrorTracker,
}

impl ModeTrackers {
    fn new(numbers: &CycleNumbers, unit: &'static str) -> Self {
        let adj = numbers.adjusted_name();
        ModeTrackers {
            realtime_adjusted: ErrorTracker::error(format!("{}: not missing in DATA_MODE 'R'", adj), unit),
            delayed_unadjusted: ErrorTracker::error(format!("{}: missing in DATA_MODE 'D'", adj), unit),
            delayed_absent: ErrorTracker::warning(format!("{}: variable absent in DATA_MODE 'D'", adj), unit),
        }
    }

    fn check(&mut self, numbers: &CycleNumbers, i: usize, mode: Option<DataMode>) {
        if numbers.adjusted.is_none() {
            if mode == Some(DataMode::Delayed) {
                self.delayed_absent.record(SampleRef::Index(i));
            }
            return;
        }
        let is_set = numbers.adjusted_at(i).is_some();
        match mode {
            Some(DataMode::RealTime) if is_set => self.realtime_adjusted.record(SampleRef::Index(i)),
            Some(DataMode::Delayed) if !is_set => self.delayed_unadjusted.record(SampleRef::Index(i)),
            _ => (),
        }
    }

    fn emit(self, report: &mut ValidationReport) {
        self.realtime_adjusted.emit(report);
        self.delayed_unadjusted.emit(report);
        self.delayed_absent.emit(report);
    }
}

/// Build the canonical cycle index and report every inconsistency between
/// the two index spaces. `modes` holds the data mode of each per-cycle
/// position (`None` when unknown).
pub fn reconcile_cycles(
    cycles: &CycleNumbers,
    measurements: &CycleNumbers,
    modes: &[Option<DataMode>],
    report: &mut ValidationReport,
) -> CycleIndex {
    let mut index = CycleIndex {
        map: BTreeMap::new(),
        cycle_numbers: (0..cycles.len()).map(|i| cycles.final_number(i)).collect(),
        measurement_numbers: (0..measurements.len()).map(|m| measurements.final_number(m)).collect(),
        modes: (0..cycles.len()).map(|i| modes.get(i).copied().flatten()).collect(),
    };

    let mut cycle_missing = ErrorTracker::error(format!("{}: missing cycle number", cycles.name), "cycles");
    let mut cycle_invalid = ErrorTracker::error(format!("{}: invalid cycle number", cycles.name), "cycles");
    let mut duplicates = ErrorTracker::error(format!("{}: duplicate cycle number", cycles.name), "cycles");
    let mut cycle_modes = ModeTrackers::new(cycles, "cycles");

    for (i, number) in index.cycle_numbers.iter().enumerate() {
        cycle_modes.check(cycles, i, index.modes[i]);

        let c = match *number {
            Some(c) => c,
            None => {
                cycle_missing.record(SampleRef::Index(i));
                continue;
            }
        };
        if c < 0 {
            cycle_invalid.record(SampleRef::Index(i));
            continue;
        }

        match index.map.get(&c) {
            Some(&first) => duplicates.record(SampleRef::Pair(i, first)),
            None => {
                index.map.insert(c, i);
            }
        }
    }

    let mut meas_missing = ErrorTracker::error(format!("{}: missing cycle number", measurements.name), "measurements");
    let mut meas_invalid = ErrorTracker::error(format!("{}: invalid cycle number", measurements.name), "measurements");
    let mut unsummarized = ErrorTracker::error(
        format!("{}: cycle referenced but never summarized in {}", measurements.name, cycles.name),
        "cycles",
    );
    let mut meas_modes = ModeTrackers::new(measurements, "measurements");
    let mut referenced = BTreeSet::new();

    for (m, number) in index.measurement_numbers.iter().enumerate() {
        let c = match *number {
            Some(c) => c,
            None => {
                meas_missing.record(SampleRef::Index(m));
                continue;
            }
        };
        if c == LAUNCH_CYCLE && m == 0 {
            continue;
        }
        if c < 0 {
            meas_invalid.record(SampleRef::Index(m));
            continue;
        }

        match index.map.get(&c) {
            Some(&i) => meas_modes.check(measurements, m, index.modes[i]),
            None => {
                if !referenced.contains(&c) {
                    unsummarized.record(SampleRef::Index(m));
                }
            }
        }
        referenced.insert(c);
    }

    let mut unreferenced = ErrorTracker::error(
        format!("{}: cycle summarized but never referenced in {}", cycles.name, measurements.name),
        "cycles",
    );
    for (i, number) in index.cycle_numbers.iter().enumerate() {
        if let Some(c) = number {
            if index.map.get(c) == Some(&i) && !referenced.contains(c) {
                unreferenced.record(SampleRef::Index(i));
            }
        }
    }

    cycle_missing.emit(report);
    cycle_invalid.emit(report);
    duplicates.emit(report);
    cycle_modes.emit(report);
    meas_missing.emit(report);
    meas_invalid.emit(report);
    unsummarized.emit(report);
    unreferenced.emit(report);
    meas_modes.emit(report);

    log::debug!(
        "reconciled {} cycles over {} measurements",
        index.map.len(),
        index.measurement_numbers.len()
    );
    index
}
