//! Reference tables: closed code sets (QC flags, profile QC flags) and the
//! measurement-code to cycle event-time table.
//!
//! The tables are kept as text in the same layout as the published reference
//! tables and parsed once on first use.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{CheckError, Result};

const QC_FLAG_TABLE: &'static str = " Code  Status  Meaning
\"0\"   A  \"No QC is performed\"
\"1\"   A  \"Good data\"
\"2\"   A  \"Probably good data\"
\"3\"   A  \"Probably bad data that are potentially correctable\"
\"4\"   A  \"Bad data\"
\"5\"   A  \"Value changed\"
\"6\"   X  \"Not used\"
\"7\"   X  \"Not used\"
\"8\"   A  \"Estimated value\"
\"9\"   A  \"Missing value\"
\" \"   A  \"Not measured\"";

const PROFILE_QC_TABLE: &'static str = " Code  Status  Meaning
\"A\"   A  \"N = 100%; All profile levels contain good data\"
\"B\"   A  \"75% <= N < 100%\"
\"C\"   A  \"50% <= N < 75%\"
\"D\"   A  \"25% <= N < 50%\"
\"E\"   A  \"0% < N < 25%\"
\"F\"   A  \"N = 0%; No profile levels have good data\"
\" \"   A  \"No QC performed\"";

const EVENT_TABLE: &'static str = " Code  Variable                    Selection
100   JULD_DESCENT_START          exact
150   JULD_FIRST_STABILIZATION    exact
200   JULD_DESCENT_END            exact
250   JULD_PARK_START             exact
300   JULD_PARK_END               exact
400   JULD_DEEP_DESCENT_END       exact
450   JULD_DEEP_PARK_START        exact
500   JULD_ASCENT_START           exact
550   JULD_DEEP_ASCENT_START      exact
600   JULD_ASCENT_END             exact
700   JULD_TRANSMISSION_START     exact
702   JULD_FIRST_MESSAGE          first
703   JULD_FIRST_LOCATION         first
703   JULD_LAST_LOCATION          last
704   JULD_LAST_MESSAGE           last
800   JULD_TRANSMISSION_END       exact";

lazy_static! {
    pub static ref QC_FLAGS: CodeTable = CodeTable::parse(QC_FLAG_TABLE).expect("built-in QC flag table");
    pub static ref PROFILE_QC_FLAGS: CodeTable =
        CodeTable::parse(PROFILE_QC_TABLE).expect("built-in profile QC table");
    pub static ref EVENTS: EventTable = EventTable::parse(EVENT_TABLE).expect("built-in event table");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeStatus {
    Active,
    Deprecated,
    Deleted,
    Unknown,
}

impl CodeStatus {
    /// Active and deprecated codes are legal; deprecated ones draw a warning.
    pub fn is_valid(self) -> bool {
        matches!(self, CodeStatus::Active | CodeStatus::Deprecated)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification<'a> {
    pub status: CodeStatus,
    pub message: Option<&'a str>,
}

/// Lookup of one closed code set.
pub trait CodeLookup {
    fn classify(&self, code: u8) -> Classification<'_>;
}

#[derive(Debug, Clone)]
struct CodeEntry {
    status: CodeStatus,
    meaning: String,
}

#[derive(Debug, Clone, Default)]
pub struct CodeTable {
    entries: BTreeMap<u8, CodeEntry>,
}

impl CodeTable {
    /// Parse a table whose first line is a header and whose other lines are
    /// `"<code>"  <A|D|X>  "<meaning>"`.
    pub fn parse(text: &str) -> Result<Self> {
        lazy_static! {
            static ref RE: Regex = Regex::new(r#"^"(.)"\s+([ADX])\s+"(.*)"\s*$"#).unwrap();
        }

        let mut entries = BTreeMap::new();
        for line in text.lines().skip(1) {
            if line.trim().is_empty() {
                continue;
            }
            let caps = RE
                .captures(line)
                .ok_or_else(|| CheckError::Table(line.to_owned()))?;
            let code = caps[1].as_bytes()[0];
            let status = match &caps[2] {
                "A" => CodeStatus::Active,
                "D" => CodeStatus::Deprecated,
                _ => CodeStatus::Deleted,
            };
            entries.insert(
                code,
                CodeEntry {
                    status,
                    meaning: caps[3].to_owned(),
                },
            );
        }

        Ok(CodeTable { entries })
    }

    pub fn with_status(mut self, code: u8, status: CodeStatus) -> Self {
        let entry = self.entries.entry(code).or_insert_with(|| CodeEntry {
            status,
            meaning: String::new(),
        });
        entry.status = status;
        self
    }
}

impl CodeLookup for CodeTable {
    fn classify(&self, code: u8) -> Classification<'_> {
        match self.entries.get(&code) {
            Some(entry) => Classification {
                status: entry.status,
                message: Some(entry.meaning.as_str()),
            },
            None => Classification {
                status: CodeStatus::Unknown,
                message: None,
            },
        }
    }
}

/// The structural roles some QC codes play. The codes themselves come from
/// the reference tables; this only says which one means what.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QcFlags {
    pub missing: u8,
    pub not_measured: u8,
    pub no_qc: u8,
    pub good: Vec<u8>,
    /// Codes an adjusted QC may take when the adjusted value was dropped.
    pub adjusted_bad: Vec<u8>,
}

impl QcFlags {
    pub fn argo() -> Self {
        QcFlags {
            missing: b'9',
            not_measured: b' ',
            no_qc: b'0',
            good: b"1258".to_vec(),
            adjusted_bad: b"49".to_vec(),
        }
    }

    /// Missing marker or not-measured marker.
    pub fn marks_missing(&self, qc: u8) -> bool {
        qc == self.missing || qc == self.not_measured
    }

    pub fn is_good(&self, qc: u8) -> bool {
        self.good.contains(&qc)
    }

    pub fn is_adjusted_bad(&self, qc: u8) -> bool {
        self.adjusted_bad.contains(&qc)
    }
}

impl Default for QcFlags {
    fn default() -> Self {
        Self::argo()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DataMode {
    RealTime,
    Adjusted,
    Delayed,
}

impl DataMode {
    pub fn from_code(code: u8) -> Option<DataMode> {
        match code {
            b'R' => Some(DataMode::RealTime),
            b'A' => Some(DataMode::Adjusted),
            b'D' => Some(DataMode::Delayed),
            _ => None,
        }
    }

    pub fn code(self) -> char {
        match self {
            DataMode::RealTime => 'R',
            DataMode::Adjusted => 'A',
            DataMode::Delayed => 'D',
        }
    }

    pub fn is_adjusted(self) -> bool {
        self != DataMode::RealTime
    }
}

/// Which occurrences of a measurement code within one cycle are compared
/// against the per-cycle event time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Exact,
    FirstOnly,
    LastOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTarget {
    pub code: i64,
    pub variable: String,
    pub selection: Selection,
}

pub trait EventLookup {
    /// Every (code, per-cycle variable) pair, in table order.
    fn event_targets(&self) -> &[EventTarget];

    fn cycle_variables(&self, code: i64) -> Vec<&EventTarget> {
        self.event_targets().iter().filter(|t| t.code == code).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventTable {
    targets: Vec<EventTarget>,
}

impl EventTable {
    pub fn parse(text: &str) -> Result<Self> {
        let mut targets = Vec::new();
        for line in text.lines().skip(1) {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.is_empty() {
                continue;
            }
            if parts.len() != 3 {
                return Err(CheckError::Table(line.to_owned()));
            }

            let code = parts[0]
                .parse::<i64>()
                .map_err(|_| CheckError::Table(line.to_owned()))?;
            let selection = match parts[2] {
                "exact" => Selection::Exact,
                "first" => Selection::FirstOnly,
                "last" => Selection::LastOnly,
                _ => return Err(CheckError::Table(line.to_owned())),
            };
            targets.push(EventTarget {
                code,
                variable: parts[1].to_owned(),
                selection,
            });
        }

        Ok(EventTable { targets })
    }
}

impl EventLookup for EventTable {
    fn event_targets(&self) -> &[EventTarget] {
        &self.targets
    }
}
