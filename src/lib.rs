//! Cross-variable consistency checks for Argo profile and trajectory files.
//!
//! The engine never touches a file directly: it reads through a
//! [`DataSource`] and looks names and codes up through the [`ParamSpec`],
//! [`CodeLookup`] and [`EventLookup`] collaborators bundled in a
//! [`CheckContext`]. Every check returns a [`ValidationReport`] of rendered
//! error and warning lines.

pub mod codes;
pub mod context;
pub mod cycles;
pub mod error;
pub mod fill;
pub mod modes;
#[cfg(feature = "netcdf")]
pub mod ncfile;
pub mod params;
pub mod profile;
pub mod profile_qc;
pub mod report;
pub mod source;
pub mod spec;
pub mod timexref;
pub mod tracker;
pub mod trajectory;

use std::fmt;
use std::str::FromStr;

pub use crate::codes::{CodeLookup, DataMode, EventLookup};
pub use crate::context::{CheckContext, CheckerConfig};
pub use crate::error::{CheckError, Result};
pub use crate::profile::check_profile_file;
pub use crate::report::{Severity, ValidationReport};
pub use crate::source::{DataSource, MemorySource};
pub use crate::spec::ParamSpec;
pub use crate::trajectory::check_trajectory_file;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Profile,
    Trajectory,
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FileKind::Profile => write!(f, "profile"),
            FileKind::Trajectory => write!(f, "trajectory"),
        }
    }
}

impl FromStr for FileKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "profile" => Ok(FileKind::Profile),
            "trajectory" => Ok(FileKind::Trajectory),
            _ => Err(format!("Unknown file type '{}'", s)),
        }
    }
}

/// Tell the file family from its dimensions: trajectories have
/// `N_MEASUREMENT`, profiles `N_PROF`.
pub fn detect_file_kind<S: DataSource + ?Sized>(src: &S, name: &str) -> Result<FileKind> {
    if src.dimension_length("N_MEASUREMENT").is_some() {
        Ok(FileKind::Trajectory)
    } else if src.dimension_length("N_PROF").is_some() {
        Ok(FileKind::Profile)
    } else {
        Err(CheckError::UnknownFileType(name.to_owned()))
    }
}

/// Run every check of one file.
pub fn check_file<S: DataSource + ?Sized>(src: &S, kind: FileKind, ctx: &CheckContext) -> ValidationReport {
    log::debug!("checking as a {} file", kind);
    match kind {
        FileKind::Profile => check_profile_file(src, ctx),
        FileKind::Trajectory => check_trajectory_file(src, ctx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_file_kind() {
        let traj = MemorySource::new()
            .with_dimension("N_MEASUREMENT", 3)
            .with_dimension("N_CYCLE", 1);
        assert_eq!(detect_file_kind(&traj, "traj.nc"), Ok(FileKind::Trajectory));

        let prof = MemorySource::new().with_dimension("N_PROF", 1);
        assert_eq!(detect_file_kind(&prof, "prof.nc"), Ok(FileKind::Profile));

        let neither = MemorySource::new();
        assert_eq!(
            detect_file_kind(&neither, "meta.nc"),
            Err(CheckError::UnknownFileType("meta.nc".to_owned()))
        );
    }

    #[test]
    fn test_file_kind_from_str() {
        assert_eq!("profile".parse::<FileKind>(), Ok(FileKind::Profile));
        assert_eq!("trajectory".parse::<FileKind>(), Ok(FileKind::Trajectory));
        assert!("meta".parse::<FileKind>().is_err());
    }
}
