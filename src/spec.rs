//! Lookup of physical parameter names and what variables each one carries.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{CheckError, Result};

const PARAM_TABLE: &'static str = " Name                      Family  Flags
PRES                          core    -
TEMP                          core    -
PSAL                          core    -
CNDC                          core    optional
DOXY                          bio     -
TEMP_DOXY                     bio     intermediate
MOLAR_DOXY                    bio     intermediate
PHASE_DELAY_DOXY              bio     intermediate
BPHASE_DOXY                   bio     intermediate
TPHASE_DOXY                   bio     intermediate
CHLA                          bio     -
FLUORESCENCE_CHLA             bio     intermediate
BBP700                        bio     -
BETA_BACKSCATTERING700        bio     intermediate
CDOM                          bio     -
FLUORESCENCE_CDOM             bio     intermediate
NITRATE                       bio     -
UV_INTENSITY_NITRATE          bio     intermediate
UV_INTENSITY_DARK_NITRATE     bio     intermediate
PH_IN_SITU_TOTAL              bio     -
PH_IN_SITU_FREE               bio     intermediate
VRS_PH                        bio     intermediate
DOWNWELLING_PAR               bio     -
DOWN_IRRADIANCE380            bio     -
DOWN_IRRADIANCE412            bio     -
DOWN_IRRADIANCE490            bio     -
TURBIDITY                     bio     optional
BISULFIDE                     bio     deprecated";

lazy_static! {
    pub static ref ARGO_PARAMS: ParamTable = ParamTable::parse(PARAM_TABLE).expect("built-in parameter table");
}

/// Which of the per-parameter variables a parameter family carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamCapabilities {
    /// `<P>_ADJUSTED`, `<P>_ADJUSTED_QC` and `<P>_ADJUSTED_ERROR` exist.
    pub has_adjusted_triad: bool,
    /// A present value must have had QC performed on it.
    pub qc_required: bool,
    /// A `PROFILE_<P>_QC` aggregate exists in profile files.
    pub has_profile_qc: bool,
}

pub trait ParamSpec {
    fn is_physical_param_name(&self, name: &str) -> bool;
    fn is_deprecated_physical_param(&self, name: &str) -> bool;
    fn is_optional(&self, name: &str) -> bool;
    fn is_intermediate_param(&self, name: &str) -> bool;
    fn all_physical_param_names(&self) -> Vec<String>;

    fn capabilities(&self, name: &str) -> ParamCapabilities {
        let intermediate = self.is_intermediate_param(name);
        ParamCapabilities {
            has_adjusted_triad: !intermediate,
            qc_required: !self.is_optional(name),
            has_profile_qc: !intermediate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ParamEntry {
    name: String,
    optional: bool,
    intermediate: bool,
    deprecated: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ParamTable {
    entries: Vec<ParamEntry>,
}

impl ParamTable {
    pub fn parse(text: &str) -> Result<Self> {
        let mut entries = Vec::new();
        for line in text.lines().skip(1) {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.is_empty() {
                continue;
            }
            if parts.len() != 3 {
                return Err(CheckError::Table(line.to_owned()));
            }

            let flags: Vec<&str> = parts[2].split(',').collect();
            entries.push(ParamEntry {
                name: parts[0].to_owned(),
                optional: flags.contains(&"optional"),
                intermediate: flags.contains(&"intermediate"),
                deprecated: flags.contains(&"deprecated"),
            });
        }

        Ok(ParamTable { entries })
    }

    fn entry(&self, name: &str) -> Option<&ParamEntry> {
        if let Some(e) = self.entries.iter().find(|e| e.name == name) {
            return Some(e);
        }
        let base = base_param_name(name)?;
        self.entries.iter().find(|e| e.name == base)
    }
}

impl ParamSpec for ParamTable {
    fn is_physical_param_name(&self, name: &str) -> bool {
        self.entry(name).is_some()
    }

    fn is_deprecated_physical_param(&self, name: &str) -> bool {
        self.entry(name).map_or(false, |e| e.deprecated)
    }

    fn is_optional(&self, name: &str) -> bool {
        self.entry(name).map_or(false, |e| e.optional)
    }

    fn is_intermediate_param(&self, name: &str) -> bool {
        self.entry(name).map_or(false, |e| e.intermediate)
    }

    fn all_physical_param_names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }
}

/// Strip a sensor number: `DOXY2` -> `DOXY`, `BBP700_2` -> `BBP700`.
pub fn base_param_name(name: &str) -> Option<&str> {
    lazy_static! {
        static ref RE: Regex = Regex::new(r"^([A-Z][A-Z0-9_]*?)_?[2-9]$").unwrap();
    }
    RE.captures(name).and_then(|caps| caps.get(1)).map(|m| m.as_str())
}

/// Pick the physical parameters out of a list of variable names, ordered as
/// the specification lists them (numbered sensors follow their base).
pub fn physical_params_in<'a, S, I>(spec: &S, variable_names: I) -> Vec<String>
where
    S: ParamSpec + ?Sized,
    I: IntoIterator<Item = &'a str>,
{
    let order = spec.all_physical_param_names();
    let rank = |name: &str| -> usize {
        let base = order
            .iter()
            .position(|n| n == name)
            .or_else(|| base_param_name(name).and_then(|b| order.iter().position(|n| n == b)));
        base.unwrap_or(order.len())
    };

    let mut params: Vec<String> = variable_names
        .into_iter()
        .filter(|v| spec.is_physical_param_name(v))
        .map(|v| v.to_owned())
        .collect();
    params.sort_by(|a, b| rank(a).cmp(&rank(b)).then_with(|| a.cmp(b)));
    params.dedup();
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert!(ARGO_PARAMS.is_physical_param_name("TEMP"));
        assert!(!ARGO_PARAMS.is_physical_param_name("TEMP_QC"));
        assert!(!ARGO_PARAMS.is_physical_param_name("JULD"));
        assert!(ARGO_PARAMS.is_optional("CNDC"));
        assert!(ARGO_PARAMS.is_intermediate_param("TEMP_DOXY"));
        assert!(ARGO_PARAMS.is_deprecated_physical_param("BISULFIDE"));
    }

    #[test]
    fn test_numbered_sensors() {
        assert_eq!(base_param_name("DOXY2"), Some("DOXY"));
        assert_eq!(base_param_name("BBP700_2"), Some("BBP700"));
        assert_eq!(base_param_name("TEMP"), None);
        assert!(ARGO_PARAMS.is_physical_param_name("DOXY3"));
        assert!(ARGO_PARAMS.is_intermediate_param("TEMP_DOXY2"));
    }

    #[test]
    fn test_capabilities() {
        let caps = ARGO_PARAMS.capabilities("MOLAR_DOXY");
        assert!(!caps.has_adjusted_triad);
        assert!(!caps.has_profile_qc);

        let caps = ARGO_PARAMS.capabilities("CNDC");
        assert!(caps.has_adjusted_triad);
        assert!(!caps.qc_required);
    }

    #[test]
    fn test_physical_params_in_order() {
        let vars = vec!["JULD", "DOXY2", "TEMP_QC", "DOXY", "PSAL", "TEMP", "PRES"];
        let params = physical_params_in(&*ARGO_PARAMS, vars);
        assert_eq!(params, vec!["PRES", "TEMP", "PSAL", "DOXY", "DOXY2"]);
    }
}
