//! Data mode of each group (profile or cycle), globally and per parameter.

use crate::codes::DataMode;
use crate::error::{CheckError, Result};
use crate::report::ValidationReport;
use crate::source::DataSource;
use crate::tracker::{ErrorTracker, SampleRef};

/// Names of the variables holding the modes for one file family.
#[derive(Debug, Clone, Copy)]
pub struct ModeVariables {
    /// One mode per group, e.g. `DATA_MODE`.
    pub global: &'static str,
    /// Parameter names per group, e.g. `STATION_PARAMETERS`.
    pub params: &'static str,
    /// One mode per group and parameter, e.g. `PARAMETER_DATA_MODE`.
    pub param_modes: &'static str,
}

pub const PROFILE_MODES: ModeVariables = ModeVariables {
    global: "DATA_MODE",
    params: "STATION_PARAMETERS",
    param_modes: "PARAMETER_DATA_MODE",
};

pub const TRAJECTORY_MODES: ModeVariables = ModeVariables {
    global: "DATA_MODE",
    params: "TRAJECTORY_PARAMETERS",
    param_modes: "TRAJECTORY_PARAMETER_DATA_MODE",
};

#[derive(Debug, Clone, Default, PartialEq)]
struct ParamModes {
    names: Vec<Vec<String>>,
    modes: Vec<Vec<Option<DataMode>>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModeTable {
    global: Vec<Option<DataMode>>,
    per_param: Option<ParamModes>,
}

impl ModeTable {
    /// A table where every group has the same mode.
    pub fn uniform(n_groups: usize, mode: Option<DataMode>) -> Self {
        ModeTable {
            global: vec![mode; n_groups],
            per_param: None,
        }
    }

    /// Read the modes of `n_groups` groups. Invalid mode codes are reported
    /// once here and become `None`.
    pub fn read<S: DataSource + ?Sized>(
        src: &S,
        vars: &ModeVariables,
        n_groups: usize,
        unit: &'static str,
        report: &mut ValidationReport,
    ) -> Result<Self> {
        let codes = src.read_char_series(vars.global, n_groups)?;
        let mut invalid = ErrorTracker::error(format!("{}: invalid data mode", vars.global), unit);
        let global: Vec<Option<DataMode>> = codes
            .iter()
            .enumerate()
            .map(|(g, &c)| {
                let mode = DataMode::from_code(c);
                if mode.is_none() {
                    invalid.record(SampleRef::Index(g));
                }
                mode
            })
            .collect();
        invalid.emit(report);

        let per_param = if src.has_variable(vars.params) && src.has_variable(vars.param_modes) {
            match read_param_modes(src, vars, n_groups, unit, report) {
                Ok(per_param) => Some(per_param),
                Err(err) => {
                    report.error(err.to_string());
                    None
                }
            }
        } else {
            None
        };

        Ok(ModeTable { global, per_param })
    }

    pub fn global(&self) -> &[Option<DataMode>] {
        &self.global
    }

    /// Mode of `param` in every group, falling back to the global mode
    /// where the group does not list the parameter.
    pub fn for_param(&self, param: &str) -> Vec<Option<DataMode>> {
        let per_param = match &self.per_param {
            Some(p) => p,
            None => return self.global.clone(),
        };

        self.global
            .iter()
            .enumerate()
            .map(|(g, &fallback)| {
                let names = match per_param.names.get(g) {
                    Some(names) => names,
                    None => return fallback,
                };
                match names.iter().position(|n| n == param) {
                    Some(j) => per_param.modes[g].get(j).copied().flatten(),
                    None => fallback,
                }
            })
            .collect()
    }
}

/// The parameter names are either one row per group (profiles,
/// `STATION_PARAMETERS(N_PROF, N_PARAM)`) or one row shared by every group
/// (trajectories, `TRAJECTORY_PARAMETERS(N_PARAM)`).
fn read_param_modes<S: DataSource + ?Sized>(
    src: &S,
    vars: &ModeVariables,
    n_groups: usize,
    unit: &'static str,
    report: &mut ValidationReport,
) -> Result<ParamModes> {
    let names = src.read_chars(vars.params)?.strings();
    let codes = src.read_chars(vars.param_modes)?.values;
    if n_groups == 0 {
        return Ok(ParamModes::default());
    }
    if codes.len() % n_groups != 0 {
        return Err(CheckError::Shape {
            var: vars.param_modes.to_owned(),
            found: codes.len(),
            expected: n_groups,
        });
    }
    let n_param = codes.len() / n_groups;
    let shared = names.len() == n_param;
    if !shared && names.len() != n_groups * n_param {
        return Err(CheckError::Shape {
            var: vars.params.to_owned(),
            found: names.len(),
            expected: n_groups * n_param,
        });
    }

    let mut invalid = ErrorTracker::error(format!("{}: invalid data mode", vars.param_modes), unit);
    let mut per_param = ParamModes::default();
    for g in 0..n_groups {
        let group_names: Vec<String> = if shared {
            names.clone()
        } else {
            names[g * n_param..(g + 1) * n_param].to_vec()
        };
        let group_modes: Vec<Option<DataMode>> = codes[g * n_param..(g + 1) * n_param]
            .iter()
            .enumerate()
            .map(|(j, &code)| {
                let mode = DataMode::from_code(code);
                if mode.is_none() && !group_names[j].is_empty() {
                    invalid.record(SampleRef::Pair(g, j));
                }
                mode
            })
            .collect();
        per_param.names.push(group_names);
        per_param.modes.push(group_modes);
    }
    invalid.emit(report);

    Ok(per_param)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    #[test]
    fn test_global_modes() {
        let src = MemorySource::new().with_char_series("DATA_MODE", b"RDX");
        let mut report = ValidationReport::new();
        let table = ModeTable::read(&src, &PROFILE_MODES, 3, "profiles", &mut report).unwrap();
        assert_eq!(
            table.global(),
            &[Some(DataMode::RealTime), Some(DataMode::Delayed), None]
        );
        assert_eq!(table.for_param("TEMP"), table.global().to_vec());
        assert_eq!(
            report.errors(),
            &["DATA_MODE: invalid data mode: 1 profiles; first 1 indices 2".to_owned()]
        );
    }

    #[test]
    fn test_param_modes() {
        let src = MemorySource::new()
            .with_char_series("DATA_MODE", b"AA")
            .with_chars("STATION_PARAMETERS", &[2, 2, 4], b"PRESDOXYPRES    ")
            .with_chars("PARAMETER_DATA_MODE", &[2, 2], b"RDR ");
        let mut report = ValidationReport::new();
        let table = ModeTable::read(&src, &PROFILE_MODES, 2, "profiles", &mut report).unwrap();
        assert!(report.is_ok(), "{:?}", report);
        assert_eq!(
            table.for_param("DOXY"),
            vec![Some(DataMode::Delayed), Some(DataMode::Adjusted)]
        );
        assert_eq!(
            table.for_param("PRES"),
            vec![Some(DataMode::RealTime), Some(DataMode::RealTime)]
        );
    }

    #[test]
    fn test_trajectory_names_shared_by_every_cycle() {
        let src = MemorySource::new()
            .with_char_series("DATA_MODE", b"RRR")
            .with_chars("TRAJECTORY_PARAMETERS", &[2, 4], b"PRESDOXY")
            .with_chars("TRAJECTORY_PARAMETER_DATA_MODE", &[3, 2], b"RDRDRA");
        let mut report = ValidationReport::new();
        let table = ModeTable::read(&src, &TRAJECTORY_MODES, 3, "cycles", &mut report).unwrap();
        assert!(report.is_ok(), "{:?}", report);
        assert_eq!(
            table.for_param("DOXY"),
            vec![Some(DataMode::Delayed), Some(DataMode::Delayed), Some(DataMode::Adjusted)]
        );
        assert_eq!(table.for_param("PRES"), vec![Some(DataMode::RealTime); 3]);
    }

    #[test]
    fn test_param_name_table_of_wrong_size() {
        let src = MemorySource::new()
            .with_char_series("DATA_MODE", b"DD")
            .with_chars("STATION_PARAMETERS", &[3, 4], b"PRESTEMPPSAL")
            .with_chars("PARAMETER_DATA_MODE", &[2, 2], b"DDDD");
        let mut report = ValidationReport::new();
        let table = ModeTable::read(&src, &PROFILE_MODES, 2, "profiles", &mut report).unwrap();
        assert_eq!(
            report.errors(),
            &["Variable 'STATION_PARAMETERS' has 3 elements for 4 samples".to_owned()]
        );
        assert_eq!(table.for_param("TEMP"), vec![Some(DataMode::Delayed); 2]);
    }

    #[test]
    fn test_missing_mode_variable() {
        let src = MemorySource::new();
        let mut report = ValidationReport::new();
        assert!(ModeTable::read(&src, &TRAJECTORY_MODES, 2, "cycles", &mut report).is_err());
    }
}
