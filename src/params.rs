//! Per-sample consistency of a parameter, its QC flag and its adjusted triad.
//!
//! Phase 1 looks at the raw value and its QC flag. Phase 2 looks at the
//! adjusted value, adjusted QC and adjusted error, and what is allowed there
//! depends on the sample's data mode. Phase 2 results are only reported when
//! phase 1 found no errors for the parameter.

use crate::codes::{CodeLookup, CodeStatus, DataMode, QcFlags};
use crate::error::{CheckError, Result};
use crate::fill::Presence;
use crate::report::{Severity, ValidationReport};
use crate::source::DataSource;
use crate::spec::ParamCapabilities;
use crate::tracker::{ErrorTracker, SampleRef};

/// What one sample index stands for. Only changes how counts are labelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleAxis {
    Level,
    Measurement,
}

impl SampleAxis {
    pub fn unit(self) -> &'static str {
        match self {
            SampleAxis::Level => "levels",
            SampleAxis::Measurement => "measurements",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdjustedSeries {
    pub value: Vec<f64>,
    pub value_fill: f64,
    pub qc: Vec<u8>,
    pub error: Vec<f64>,
    pub error_fill: f64,
}

/// One group of samples (a profile, or a whole trajectory) of one parameter,
/// extra dimensions already reduced.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSeries {
    pub value: Vec<f64>,
    pub fill: f64,
    pub qc: Vec<u8>,
    pub adjusted: Option<AdjustedSeries>,
}

impl ParamSeries {
    /// Read `<P>`, `<P>_QC` and, when the family has them, the adjusted
    /// triad over `n_samples` samples.
    pub fn read<S: DataSource + ?Sized>(src: &S, name: &str, caps: &ParamCapabilities, n_samples: usize) -> Result<Self> {
        let (value, fill) = src.read_scalar_series(name, n_samples)?;
        let qc = src.read_char_series(&format!("{}_QC", name), n_samples)?;

        let adjusted = if caps.has_adjusted_triad {
            let (adj_value, value_fill) = src.read_scalar_series(&format!("{}_ADJUSTED", name), n_samples)?;
            let adj_qc = src.read_char_series(&format!("{}_ADJUSTED_QC", name), n_samples)?;
            let (error, error_fill) = src.read_scalar_series(&format!("{}_ADJUSTED_ERROR", name), n_samples)?;
            Some(AdjustedSeries {
                value: adj_value,
                value_fill,
                qc: adj_qc,
                error,
                error_fill,
            })
        } else {
            None
        };

        Ok(ParamSeries {
            value,
            fill,
            qc,
            adjusted,
        })
    }

    /// Samples `start..start + len` as their own series.
    pub fn group(&self, start: usize, len: usize) -> ParamSeries {
        let end = (start + len).min(self.value.len());
        ParamSeries {
            value: self.value[start..end].to_vec(),
            fill: self.fill,
            qc: self.qc[start..end].to_vec(),
            adjusted: self.adjusted.as_ref().map(|adj| AdjustedSeries {
                value: adj.value[start..end].to_vec(),
                value_fill: adj.value_fill,
                qc: adj.qc[start..end].to_vec(),
                error: adj.error[start..end].to_vec(),
                error_fill: adj.error_fill,
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    fn check_lengths(&self, name: &str, n_modes: usize) -> Result<()> {
        let n = self.value.len();
        let mut lengths = vec![(format!("{}_QC", name), self.qc.len()), (String::from("data mode"), n_modes)];
        if let Some(adj) = &self.adjusted {
            lengths.push((format!("{}_ADJUSTED", name), adj.value.len()));
            lengths.push((format!("{}_ADJUSTED_QC", name), adj.qc.len()));
            lengths.push((format!("{}_ADJUSTED_ERROR", name), adj.error.len()));
        }

        for (var, found) in lengths {
            if found != n {
                return Err(CheckError::Shape { var, found, expected: n });
            }
        }
        Ok(())
    }
}

/// Which adjusted-field rule applies to a sample in an adjusted data mode or
/// in real time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustedRule {
    /// Real time: adjusted value, QC and error all missing.
    RealTime,
    /// NaN adjusted value; nothing else is checked for the sample.
    InvalidAdjusted,
    /// Raw value missing: adjusted value and error missing, adjusted QC is
    /// the missing marker.
    RawMissing,
    /// Raw value kept but adjusted value dropped: adjusted QC flags it bad
    /// or missing, adjusted error missing.
    AdjustedDropped,
    /// Both present: adjusted QC is not bad/missing. With `error_required`
    /// the adjusted error must be present too.
    BothPresent { error_required: bool },
}

pub fn adjusted_rule(raw: Presence, adjusted: Presence, mode: DataMode) -> AdjustedRule {
    use Presence::*;

    match (raw, adjusted, mode) {
        (_, _, DataMode::RealTime) => AdjustedRule::RealTime,
        (_, Invalid, _) => AdjustedRule::InvalidAdjusted,
        (Missing, _, _) | (Invalid, _, _) => AdjustedRule::RawMissing,
        (Present, Missing, _) => AdjustedRule::AdjustedDropped,
        (Present, Present, DataMode::Delayed) => AdjustedRule::BothPresent { error_required: true },
        (Present, Present, DataMode::Adjusted) => AdjustedRule::BothPresent { error_required: false },
    }
}

struct RawTrackers {
    invalid_qc: ErrorTracker,
    deprecated_qc: ErrorTracker,
    missing_qc_set: ErrorTracker,
    present_qc_missing: ErrorTracker,
    present_no_qc: ErrorTracker,
    nan: ErrorTracker,
}

impl RawTrackers {
    fn new(name: &str, unit: &'static str) -> Self {
        RawTrackers {
            invalid_qc: ErrorTracker::error(format!("{}_QC: invalid QC code", name), unit),
            deprecated_qc: ErrorTracker::warning(format!("{}_QC: deprecated QC code", name), unit),
            missing_qc_set: ErrorTracker::error(
                format!("{}: missing data but {}_QC not missing", name, name),
                unit,
            ),
            present_qc_missing: ErrorTracker::error(
                format!("{}: not-missing data with {}_QC missing", name, name),
                unit,
            ),
            present_no_qc: ErrorTracker::error(
                format!("{}: not-missing data with {}_QC unset", name, name),
                unit,
            ),
            nan: ErrorTracker::error(format!("{}: NaN values", name), unit),
        }
    }

    fn has_errors(&self) -> bool {
        self.invalid_qc.has_fired()
            || self.missing_qc_set.has_fired()
            || self.present_qc_missing.has_fired()
            || self.present_no_qc.has_fired()
            || self.nan.has_fired()
    }

    fn emit(self, report: &mut ValidationReport) {
        self.invalid_qc.emit(report);
        self.deprecated_qc.emit(report);
        self.missing_qc_set.emit(report);
        self.present_qc_missing.emit(report);
        self.present_no_qc.emit(report);
        self.nan.emit(report);
    }
}

struct AdjustedTrackers {
    rt_value: ErrorTracker,
    rt_qc: ErrorTracker,
    rt_error: ErrorTracker,
    invalid_qc: ErrorTracker,
    deprecated_qc: ErrorTracker,
    nan: ErrorTracker,
    not_measured_mismatch: ErrorTracker,
    raw_missing_value: ErrorTracker,
    raw_missing_error: ErrorTracker,
    raw_missing_qc: ErrorTracker,
    dropped_qc: ErrorTracker,
    dropped_error: ErrorTracker,
    present_qc_bad: ErrorTracker,
    delayed_error_missing: ErrorTracker,
}

impl AdjustedTrackers {
    fn new(name: &str, unit: &'static str) -> Self {
        let adj = format!("{}_ADJUSTED", name);
        AdjustedTrackers {
            rt_value: ErrorTracker::error(format!("{}: not missing in DATA_MODE 'R'", adj), unit),
            rt_qc: ErrorTracker::error(format!("{}_QC: not missing in DATA_MODE 'R'", adj), unit),
            rt_error: ErrorTracker::error(format!("{}_ERROR: not missing in DATA_MODE 'R'", adj), unit),
            invalid_qc: ErrorTracker::error(format!("{}_QC: invalid QC code", adj), unit),
            deprecated_qc: ErrorTracker::warning(format!("{}_QC: deprecated QC code", adj), unit),
            nan: ErrorTracker::error(format!("{}: NaN values", adj), unit),
            not_measured_mismatch: ErrorTracker::error(
                format!("{}_QC/{}_QC: only one of them is 'not measured'", name, adj),
                unit,
            ),
            raw_missing_value: ErrorTracker::error(format!("{}: not missing where {} is missing", adj, name), unit),
            raw_missing_error: ErrorTracker::error(
                format!("{}_ERROR: not missing where {} is missing", adj, name),
                unit,
            ),
            raw_missing_qc: ErrorTracker::error(
                format!("{}_QC: not the missing flag where {} is missing", adj, name),
                unit,
            ),
            dropped_qc: ErrorTracker::error(
                format!("{}_QC: not bad or missing where {} is missing", adj, adj),
                unit,
            ),
            dropped_error: ErrorTracker::error(format!("{}_ERROR: not missing where {} is missing", adj, adj), unit),
            present_qc_bad: ErrorTracker::error(
                format!("{}_QC: bad or missing flag where {} is not missing", adj, adj),
                unit,
            ),
            delayed_error_missing: ErrorTracker::error(
                format!("{}_ERROR: missing where {} is not missing in DATA_MODE 'D'", adj, adj),
                unit,
            ),
        }
    }

    fn has_errors(&self) -> bool {
        self.all().iter().any(|t| t.severity() == Severity::Error && t.has_fired())
    }

    fn all(&self) -> [&ErrorTracker; 14] {
        [
            &self.rt_value,
            &self.rt_qc,
            &self.rt_error,
            &self.invalid_qc,
            &self.deprecated_qc,
            &self.nan,
            &self.not_measured_mismatch,
            &self.raw_missing_value,
            &self.raw_missing_error,
            &self.raw_missing_qc,
            &self.dropped_qc,
            &self.dropped_error,
            &self.present_qc_bad,
            &self.delayed_error_missing,
        ]
    }

    fn emit(self, report: &mut ValidationReport) {
        for t in self.all().iter() {
            if let Some(msg) = t.message() {
                report.push(t.severity(), msg);
            }
        }
    }
}

/// Result of the two phases for one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamOutcome {
    pub raw_ok: bool,
    pub adjusted_ok: bool,
}

impl ParamOutcome {
    pub fn is_ok(&self) -> bool {
        self.raw_ok && self.adjusted_ok
    }
}

/// Accumulates both phases for one parameter across all of its groups.
pub struct ParamChecker<'a> {
    name: String,
    caps: ParamCapabilities,
    qc_codes: &'a dyn CodeLookup,
    flags: &'a QcFlags,
    raw: RawTrackers,
    adjusted: AdjustedTrackers,
    saw_adjusted: bool,
}

impl<'a> ParamChecker<'a> {
    pub fn new(
        name: &str,
        caps: ParamCapabilities,
        axis: SampleAxis,
        qc_codes: &'a dyn CodeLookup,
        flags: &'a QcFlags,
    ) -> Self {
        ParamChecker {
            name: name.to_owned(),
            caps,
            qc_codes,
            flags,
            raw: RawTrackers::new(name, axis.unit()),
            adjusted: AdjustedTrackers::new(name, axis.unit()),
            saw_adjusted: false,
        }
    }

    /// Check one group. `group` is the profile index for profile files (so
    /// samples are reported as `(profile,level)` pairs) and `None` when the
    /// sample index is already global. `modes` holds one data mode per
    /// sample; `None` means the mode itself was invalid and phase 2 is
    /// skipped for that sample.
    pub fn check_group(&mut self, group: Option<usize>, series: &ParamSeries, modes: &[Option<DataMode>]) -> Result<()> {
        series.check_lengths(&self.name, modes.len())?;

        let at = |i: usize| match group {
            Some(g) => SampleRef::Pair(g, i),
            None => SampleRef::Index(i),
        };

        for i in 0..series.len() {
            self.check_raw_sample(at(i), series.value[i], series.fill, series.qc[i]);
        }

        if !self.caps.has_adjusted_triad {
            return Ok(());
        }
        let adj = match &series.adjusted {
            Some(adj) => adj,
            None => return Ok(()),
        };
        self.saw_adjusted = true;

        for i in 0..series.len() {
            let mode = match modes[i] {
                Some(mode) => mode,
                None => continue,
            };
            self.check_adjusted_sample(at(i), mode, series, adj, i);
        }

        Ok(())
    }

    fn check_raw_sample(&mut self, at: SampleRef, value: f64, fill: f64, qc: u8) {
        let flags = self.flags;
        let t = &mut self.raw;

        match self.qc_codes.classify(qc).status {
            CodeStatus::Active => (),
            CodeStatus::Deprecated => t.deprecated_qc.record(at),
            CodeStatus::Deleted | CodeStatus::Unknown => t.invalid_qc.record(at),
        }

        if value.is_nan() {
            t.nan.record(at);
        }

        match Presence::of(value, fill) {
            Presence::Missing | Presence::Invalid => {
                if !flags.marks_missing(qc) {
                    t.missing_qc_set.record(at);
                }
            }
            Presence::Present => {
                if flags.marks_missing(qc) {
                    t.present_qc_missing.record(at);
                } else if qc == flags.no_qc && self.caps.qc_required {
                    t.present_no_qc.record(at);
                }
            }
        }
    }

    fn check_adjusted_sample(&mut self, at: SampleRef, mode: DataMode, series: &ParamSeries, adj: &AdjustedSeries, i: usize) {
        let flags = self.flags;
        let t = &mut self.adjusted;

        let raw = Presence::of(series.value[i], series.fill);
        let value = Presence::of(adj.value[i], adj.value_fill);
        let error = Presence::of(adj.error[i], adj.error_fill);
        let qc = series.qc[i];
        let adj_qc = adj.qc[i];

        if value == Presence::Invalid || error == Presence::Invalid {
            t.nan.record(at);
            return;
        }

        if mode.is_adjusted() {
            match self.qc_codes.classify(adj_qc).status {
                CodeStatus::Active => (),
                CodeStatus::Deprecated => t.deprecated_qc.record(at),
                CodeStatus::Deleted | CodeStatus::Unknown => t.invalid_qc.record(at),
            }

            let raw_nm = qc == flags.not_measured;
            let adj_nm = adj_qc == flags.not_measured;
            if raw_nm != adj_nm {
                t.not_measured_mismatch.record(at);
                return;
            }
            if raw_nm {
                if value.is_present() {
                    t.raw_missing_value.record(at);
                }
                if error.is_present() {
                    t.raw_missing_error.record(at);
                }
                return;
            }
        }

        match adjusted_rule(raw, value, mode) {
            AdjustedRule::RealTime => {
                if value.is_present() {
                    t.rt_value.record(at);
                }
                if !flags.marks_missing(adj_qc) {
                    t.rt_qc.record(at);
                }
                if error.is_present() {
                    t.rt_error.record(at);
                }
            }
            AdjustedRule::InvalidAdjusted => (),
            AdjustedRule::RawMissing => {
                if value.is_present() {
                    t.raw_missing_value.record(at);
                }
                if error.is_present() {
                    t.raw_missing_error.record(at);
                }
                if adj_qc != flags.missing {
                    t.raw_missing_qc.record(at);
                }
            }
            AdjustedRule::AdjustedDropped => {
                if !flags.is_adjusted_bad(adj_qc) {
                    t.dropped_qc.record(at);
                }
                if error.is_present() {
                    t.dropped_error.record(at);
                }
            }
            AdjustedRule::BothPresent { error_required } => {
                if flags.is_adjusted_bad(adj_qc) {
                    t.present_qc_bad.record(at);
                }
                if error_required && !error.is_present() {
                    t.delayed_error_missing.record(at);
                }
            }
        }
    }

    /// Render into `report`. When phase 1 failed, phase 2 is replaced by
    /// one advisory warning.
    pub fn finish(self, report: &mut ValidationReport) -> ParamOutcome {
        let raw_ok = !self.raw.has_errors();
        let adjusted_ok = !self.adjusted.has_errors();
        let name = self.name;
        let saw_adjusted = self.saw_adjusted;

        self.raw.emit(report);
        if !saw_adjusted {
            return ParamOutcome { raw_ok, adjusted_ok: true };
        }

        if raw_ok {
            self.adjusted.emit(report);
            ParamOutcome { raw_ok, adjusted_ok }
        } else {
            log::warn!("{}: skipping adjusted-field checks", name);
            report.warning(format!(
                "{}: {}_ADJUSTED/{}_ADJUSTED_QC/{}_ADJUSTED_ERROR not checked because {}/{}_QC are inconsistent",
                name, name, name, name, name, name
            ));
            ParamOutcome {
                raw_ok,
                adjusted_ok: false,
            }
        }
    }
}
