use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CheckError {
    #[error("Could not read variable '{0}'")]
    VariableMissing(String),

    #[error("Dimension '{0}' is not defined")]
    DimensionMissing(String),

    #[error("Could not get data of '{var}' variable: {msg}")]
    Read { var: String, msg: String },

    #[error("Variable '{var}' has {found} elements for {expected} samples")]
    Shape {
        var: String,
        found: usize,
        expected: usize,
    },

    #[error("Unable to open {path}: {msg}")]
    Open { path: String, msg: String },

    #[error("Cannot tell whether {0} is a profile or trajectory file")]
    UnknownFileType(String),

    #[error("Malformed reference table line: '{0}'")]
    Table(String),
}

pub type Result<T> = std::result::Result<T, CheckError>;
