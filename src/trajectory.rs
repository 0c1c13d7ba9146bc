//! Consistency checks of a trajectory file: the two cycle-number index
//! spaces, every physical parameter over `N_MEASUREMENT`, and the per-cycle
//! event times against the measurement times.

use crate::codes::DataMode;
use crate::context::CheckContext;
use crate::cycles::{reconcile_cycles, CycleIndex, CycleNumbers};
use crate::error::Result;
use crate::fill::is_missing;
use crate::modes::{ModeTable, TRAJECTORY_MODES};
use crate::params::{ParamChecker, ParamSeries, SampleAxis};
use crate::report::ValidationReport;
use crate::source::DataSource;
use crate::spec::physical_params_in;
use crate::timexref::{check_cycle_order, check_event_times, CycleEventTimes, MeasurementTimes};

pub fn check_trajectory_file<S: DataSource + ?Sized>(src: &S, ctx: &CheckContext) -> ValidationReport {
    let mut report = ValidationReport::new();

    let (n_meas, n_cycle) = match (src.require_dimension("N_MEASUREMENT"), src.require_dimension("N_CYCLE")) {
        (Ok(m), Ok(c)) => (m, c),
        (Err(err), _) | (_, Err(err)) => {
            report.error(err.to_string());
            return report;
        }
    };
    log::info!("trajectory file: {} measurements over {} cycles", n_meas, n_cycle);

    let modes = match ModeTable::read(src, &TRAJECTORY_MODES, n_cycle, "cycles", &mut report) {
        Ok(modes) => modes,
        Err(err) => {
            report.error(format!("{}: {}", TRAJECTORY_MODES.global, err));
            ModeTable::uniform(n_cycle, None)
        }
    };

    let index = match read_cycle_index(src, n_meas, n_cycle, modes.global(), &mut report) {
        Ok(index) => {
            check_cycle_order(&index, &mut report);
            Some(index)
        }
        Err(err) => {
            report.error(err.to_string());
            None
        }
    };

    let names = src.variable_names();
    let params = physical_params_in(ctx.spec, names.iter().map(|n| n.as_str()));
    for param in params.iter() {
        log::debug!("checking {}", param);
        let param_modes = measurement_modes(index.as_ref(), &modes.for_param(param), n_meas);
        let mut param_report = ValidationReport::new();
        match check_trajectory_param(src, ctx, param, n_meas, &param_modes, &mut param_report) {
            Ok(()) => report.merge(param_report),
            Err(err) => report.error(format!("{}: {}", param, err)),
        }
    }

    match &index {
        Some(index) => {
            if let Err(err) = check_times(src, ctx, index, n_meas, n_cycle, &mut report) {
                report.error(err.to_string());
            }
        }
        None => log::warn!("no usable cycle index, skipping event time checks"),
    }

    report
}

fn read_cycle_numbers<S: DataSource + ?Sized>(src: &S, name: &str, n: usize) -> Result<CycleNumbers> {
    let (primary, fill) = src.read_int_series(name, n)?;
    let adjusted_name = format!("{}_ADJUSTED", name);
    let adjusted = if src.has_variable(&adjusted_name) {
        let (adjusted, adjusted_fill) = src.read_int_series(&adjusted_name, n)?;
        Some(
            adjusted
                .into_iter()
                .map(|c| if c == adjusted_fill { fill } else { c })
                .collect(),
        )
    } else {
        None
    };
    Ok(CycleNumbers::new(name, primary, adjusted, fill))
}

fn read_cycle_index<S: DataSource + ?Sized>(
    src: &S,
    n_meas: usize,
    n_cycle: usize,
    modes: &[Option<DataMode>],
    report: &mut ValidationReport,
) -> Result<CycleIndex> {
    let cycles = read_cycle_numbers(src, "CYCLE_NUMBER_INDEX", n_cycle)?;
    let measurements = read_cycle_numbers(src, "CYCLE_NUMBER", n_meas)?;
    Ok(reconcile_cycles(&cycles, &measurements, modes, report))
}

/// Data mode of every measurement: its cycle's mode for the parameter.
/// The launch measurement and measurements whose cycle is not summarized
/// count as real time. Without an index, phase 2 is skipped everywhere.
fn measurement_modes(index: Option<&CycleIndex>, cycle_modes: &[Option<DataMode>], n_meas: usize) -> Vec<Option<DataMode>> {
    let index = match index {
        Some(index) => index,
        None => return vec![None; n_meas],
    };

    (0..n_meas)
        .map(|m| match index.measurement_cycle_index(m) {
            Some(ci) => cycle_modes.get(ci).copied().flatten(),
            None => Some(DataMode::RealTime),
        })
        .collect()
}

fn check_trajectory_param<S: DataSource + ?Sized>(
    src: &S,
    ctx: &CheckContext,
    param: &str,
    n_meas: usize,
    modes: &[Option<DataMode>],
    report: &mut ValidationReport,
) -> Result<()> {
    if ctx.spec.is_deprecated_physical_param(param) {
        report.warning(format!("{}: deprecated parameter", param));
    }

    let caps = ctx.spec.capabilities(param);
    let series = ParamSeries::read(src, param, &caps, n_meas)?;
    let mut checker = ParamChecker::new(param, caps, SampleAxis::Measurement, ctx.qc_codes, &ctx.flags);
    checker.check_group(None, &series, modes)?;
    checker.finish(report);
    Ok(())
}

fn read_measurement_times<S: DataSource + ?Sized>(src: &S, n_meas: usize) -> Result<MeasurementTimes> {
    let (codes, _) = src.read_int_series("MEASUREMENT_CODE", n_meas)?;
    let (time, fill) = src.read_scalar_series("JULD", n_meas)?;
    let status = src.read_char_series("JULD_STATUS", n_meas)?;

    let adjusted = if src.has_variable("JULD_ADJUSTED") {
        let (adj_time, adj_fill) = src.read_scalar_series("JULD_ADJUSTED", n_meas)?;
        let adj_time = adj_time
            .into_iter()
            .map(|t| if is_missing(adj_fill, t) { fill } else { t })
            .collect();
        let adj_status = if src.has_variable("JULD_ADJUSTED_STATUS") {
            src.read_char_series("JULD_ADJUSTED_STATUS", n_meas)?
        } else {
            status.clone()
        };
        Some((adj_time, adj_status))
    } else {
        None
    };

    Ok(MeasurementTimes::best_estimate(codes, time, status, adjusted, fill))
}

fn read_cycle_event_times<S: DataSource + ?Sized>(src: &S, name: &str, n_cycle: usize) -> Result<CycleEventTimes> {
    let (values, fill) = src.read_scalar_series(name, n_cycle)?;
    let status_name = format!("{}_STATUS", name);
    let status = if src.has_variable(&status_name) {
        Some(src.read_char_series(&status_name, n_cycle)?)
    } else {
        None
    };
    Ok(CycleEventTimes {
        name: name.to_owned(),
        values,
        status,
        fill,
    })
}

fn check_times<S: DataSource + ?Sized>(
    src: &S,
    ctx: &CheckContext,
    index: &CycleIndex,
    n_meas: usize,
    n_cycle: usize,
    report: &mut ValidationReport,
) -> Result<()> {
    let times = read_measurement_times(src, n_meas)?;

    for target in ctx.events.event_targets() {
        if !src.has_variable(&target.variable) {
            continue;
        }
        log::debug!("comparing {} with MEASUREMENT_CODE {}", target.variable, target.code);
        match read_cycle_event_times(src, &target.variable, n_cycle) {
            Ok(cycle_times) => {
                check_event_times(index, &times, target, &cycle_times, ctx.config.time_tolerance, report)
            }
            Err(err) => report.error(format!("{}: {}", target.variable, err)),
        }
    }

    Ok(())
}
