/// How serious a rule violation is. Fixed per rule, never per data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// Ordered error and warning messages produced by one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, severity: Severity, msg: String) {
        match severity {
            Severity::Error => self.errors.push(msg),
            Severity::Warning => self.warnings.push(msg),
        }
    }

    pub fn error<S: Into<String>>(&mut self, msg: S) {
        self.errors.push(msg.into());
    }

    pub fn warning<S: Into<String>>(&mut self, msg: S) {
        self.warnings.push(msg.into());
    }

    /// Append another report's messages after this one's.
    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn n_errors(&self) -> usize {
        self.errors.len()
    }

    /// A file passes when no errors were recorded; warnings do not count.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}
