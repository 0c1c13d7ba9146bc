use crate::codes::{CodeLookup, EventLookup, QcFlags, EVENTS, PROFILE_QC_FLAGS, QC_FLAGS};
use crate::spec::{ParamSpec, ARGO_PARAMS};

/// Tolerance, in days, when comparing measurement and per-cycle times.
pub const DEFAULT_TIME_TOLERANCE: f64 = 1.0e-5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckerConfig {
    pub time_tolerance: f64,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        CheckerConfig {
            time_tolerance: DEFAULT_TIME_TOLERANCE,
        }
    }
}

/// The read-only collaborators a check needs. Cheap to share between
/// threads checking different files.
pub struct CheckContext<'a> {
    pub spec: &'a (dyn ParamSpec + Sync),
    pub qc_codes: &'a (dyn CodeLookup + Sync),
    pub profile_qc_codes: &'a (dyn CodeLookup + Sync),
    pub events: &'a (dyn EventLookup + Sync),
    pub flags: QcFlags,
    pub config: CheckerConfig,
}

impl CheckContext<'static> {
    /// Built-in Argo tables and default configuration.
    pub fn argo() -> Self {
        CheckContext {
            spec: &*ARGO_PARAMS,
            qc_codes: &*QC_FLAGS,
            profile_qc_codes: &*PROFILE_QC_FLAGS,
            events: &*EVENTS,
            flags: QcFlags::argo(),
            config: CheckerConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argo_context() {
        let ctx = CheckContext::argo();
        assert!(ctx.spec.is_physical_param_name("PSAL"));
        assert!(ctx.qc_codes.classify(b'1').status.is_valid());
        assert!(ctx.profile_qc_codes.classify(b'A').status.is_valid());
        assert!(!ctx.events.event_targets().is_empty());
        assert_eq!(ctx.config.time_tolerance, DEFAULT_TIME_TOLERANCE);
    }
}
