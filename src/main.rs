use clap;

use argo_consistency::{check_file, detect_file_kind, CheckContext, CheckError, DataSource, FileKind, ValidationReport};

#[cfg(feature = "netcdf")]
fn open_source(nc_file: &str) -> Result<Box<dyn DataSource>, CheckError> {
    let src = argo_consistency::ncfile::NcSource::open(nc_file)?;
    Ok(Box::new(src))
}

#[cfg(not(feature = "netcdf"))]
fn open_source(nc_file: &str) -> Result<Box<dyn DataSource>, CheckError> {
    Err(CheckError::Open {
        path: nc_file.to_owned(),
        msg: String::from("built without the netcdf feature"),
    })
}

fn print_report(report: &ValidationReport, verbosity: i8) {
    if verbosity >= 1 {
        for msg in report.errors() {
            println!("    - ERROR: {}", msg);
        }
    }
    if verbosity >= 2 {
        for msg in report.warnings() {
            println!("    - WARNING: {}", msg);
        }
    }
}

fn driver(nc_file: &str, kind: Option<FileKind>, verbosity: i8) -> Result<bool, CheckError> {
    let src = open_source(nc_file)?;
    let kind = match kind {
        Some(k) => k,
        None => detect_file_kind(&*src, nc_file)?,
    };
    log::info!("{}: {} file", nc_file, kind);

    let ctx = CheckContext::argo();
    let report = check_file(&*src, kind, &ctx);

    let overall_ok = report.is_ok();
    if verbosity >= 0 {
        if overall_ok {
            println!("{} PASSES all {} consistency checks ({} warnings)", nc_file, kind, report.warnings().len());
        } else {
            println!("{} FAILS {} {} consistency checks", nc_file, report.n_errors(), kind);
        }
        print_report(&report, verbosity);
    }

    return Ok(overall_ok);
}

#[derive(Debug)]
struct CmdLineArgs {
    nc_files: Vec<String>,
    kind: Option<FileKind>,
    verbosity: i8
}

fn parse_clargs() -> CmdLineArgs {
    let yml = clap::load_yaml!("clargs.yml");
    let clargs = clap::App::from_yaml(yml).version(clap::crate_version!()).get_matches();

    let nc_files: Vec<String> = clargs
        .values_of("nc_files")
        .map(|files| files.map(String::from).collect())
        .unwrap_or_default();
    let kind = match clargs.value_of("type") {
        Some("auto") | None => None,
        Some(other) => other.parse::<FileKind>().ok(),
    };
    let nverb = clargs.occurrences_of("verbose");
    let nquiet = clargs.occurrences_of("quiet");

    let args = CmdLineArgs{
        nc_files,
        kind,
        verbosity: if nquiet > 0 {-1} else {nverb as i8}
    };

    return args;
}

fn init_logging(verbosity: i8) {
    let log_level = match verbosity {
        v if v < 0 => log::LevelFilter::Error,
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();
}

fn main() {
    let clargs = parse_clargs();
    init_logging(clargs.verbosity);

    let mut any_failed = false;
    let mut any_error = false;
    for nc_file in clargs.nc_files.iter() {
        match driver(nc_file, clargs.kind, clargs.verbosity) {
            Ok(passes) => {
                if !passes {any_failed = true;}
            },
            Err(err) => {
                eprintln!("ERROR: {}", err);
                any_error = true;
            }
        }
    }

    if any_error {std::process::exit(2);}
    else if any_failed {std::process::exit(1);}
    else {std::process::exit(0);}
}
