//! Consistency checks of a profile file: every physical parameter over
//! `N_PROF` x `N_LEVELS`, and its `PROFILE_<PARAM>_QC` aggregate.

use crate::codes::{CodeStatus, DataMode};
use crate::context::CheckContext;
use crate::error::Result;
use crate::modes::{ModeTable, PROFILE_MODES};
use crate::params::{ParamChecker, ParamSeries, SampleAxis};
use crate::profile_qc::profile_qc_code;
use crate::report::ValidationReport;
use crate::source::DataSource;
use crate::spec::physical_params_in;
use crate::tracker::{ErrorTracker, SampleRef};

pub fn check_profile_file<S: DataSource + ?Sized>(src: &S, ctx: &CheckContext) -> ValidationReport {
    let mut report = ValidationReport::new();

    let (n_prof, n_levels) = match (src.require_dimension("N_PROF"), src.require_dimension("N_LEVELS")) {
        (Ok(p), Ok(l)) => (p, l),
        (Err(err), _) | (_, Err(err)) => {
            report.error(err.to_string());
            return report;
        }
    };
    log::info!("profile file: {} profiles x {} levels", n_prof, n_levels);

    let modes = match ModeTable::read(src, &PROFILE_MODES, n_prof, "profiles", &mut report) {
        Ok(modes) => modes,
        Err(err) => {
            report.error(format!("{}: {}", PROFILE_MODES.global, err));
            ModeTable::uniform(n_prof, None)
        }
    };

    let names = src.variable_names();
    let params = physical_params_in(ctx.spec, names.iter().map(|n| n.as_str()));
    for param in params.iter() {
        log::debug!("checking {}", param);
        let mut param_report = ValidationReport::new();
        match check_profile_param(src, ctx, param, n_prof, n_levels, &modes, &mut param_report) {
            Ok(()) => report.merge(param_report),
            Err(err) => report.error(format!("{}: {}", param, err)),
        }
    }

    report
}

fn check_profile_param<S: DataSource + ?Sized>(
    src: &S,
    ctx: &CheckContext,
    param: &str,
    n_prof: usize,
    n_levels: usize,
    modes: &ModeTable,
    report: &mut ValidationReport,
) -> Result<()> {
    if ctx.spec.is_deprecated_physical_param(param) {
        report.warning(format!("{}: deprecated parameter", param));
    }

    let caps = ctx.spec.capabilities(param);
    let series = ParamSeries::read(src, param, &caps, n_prof * n_levels)?;
    let profile_qc_var = format!("PROFILE_{}_QC", param);
    let stored = if caps.has_profile_qc {
        Some(src.read_char_series(&profile_qc_var, n_prof)?)
    } else {
        None
    };
    let param_modes = modes.for_param(param);

    let mut checker = ParamChecker::new(param, caps, SampleAxis::Level, ctx.qc_codes, &ctx.flags);
    let mut invalid_profile_qc = ErrorTracker::error(format!("{}: invalid profile QC code", profile_qc_var), "profiles");
    let mut profile_qc_mismatch = ErrorTracker::error(
        format!("{}: does not match the level QC flags of {}", profile_qc_var, param),
        "profiles",
    );

    for p in 0..n_prof {
        let group = series.group(p * n_levels, n_levels);
        let mode = param_modes.get(p).copied().flatten();
        checker.check_group(Some(p), &group, &vec![mode; n_levels])?;

        let stored_qc = match &stored {
            Some(stored) => stored[p],
            None => continue,
        };
        match ctx.profile_qc_codes.classify(stored_qc).status {
            CodeStatus::Active | CodeStatus::Deprecated => (),
            CodeStatus::Deleted | CodeStatus::Unknown => {
                invalid_profile_qc.record(SampleRef::Index(p));
                continue;
            }
        }

        let codes = match (&group.adjusted, mode) {
            (Some(adj), Some(DataMode::Adjusted)) | (Some(adj), Some(DataMode::Delayed)) => &adj.qc,
            _ => &group.qc,
        };
        if profile_qc_code(codes, &ctx.flags) != stored_qc {
            profile_qc_mismatch.record(SampleRef::Index(p));
        }
    }

    let outcome = checker.finish(report);
    invalid_profile_qc.emit(report);
    if stored.is_none() {
        return Ok(());
    }
    if outcome.is_ok() {
        profile_qc_mismatch.emit(report);
    } else {
        log::warn!("{}: skipping aggregate check", param);
        report.warning(format!(
            "{}: not compared with the level QC flags because {} is inconsistent",
            profile_qc_var, param
        ));
    }

    Ok(())
}
