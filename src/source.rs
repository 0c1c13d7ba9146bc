//! Read access to already-materialised file variables.
//!
//! The checkers only ever see a `DataSource`; the netCDF reader and the
//! in-memory source used by the tests both implement it.

use crate::error::{CheckError, Result};
use crate::fill::{reduce, reduce_samples};

/// A numeric variable flattened in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericArray {
    pub shape: Vec<usize>,
    pub values: Vec<f64>,
    pub fill: f64,
}

impl NumericArray {
    /// Elements per sample once the leading `sample_axes` axes are fixed.
    fn slice_width(&self, sample_axes: usize) -> usize {
        self.shape.iter().skip(sample_axes).product()
    }

    /// The extra-dimension slice of sample `sample` over the first
    /// `sample_axes` axes.
    pub fn slice(&self, sample_axes: usize, sample: usize) -> &[f64] {
        let width = self.slice_width(sample_axes);
        let start = (sample * width).min(self.values.len());
        let end = (start + width).min(self.values.len());
        &self.values[start..end]
    }
}

/// A character variable flattened in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharArray {
    pub shape: Vec<usize>,
    pub values: Vec<u8>,
}

impl CharArray {
    /// Fixed-width strings along the last axis, trailing blanks trimmed.
    pub fn strings(&self) -> Vec<String> {
        let width = self.shape.last().copied().unwrap_or(1).max(1);
        self.values
            .chunks(width)
            .map(|chunk| {
                String::from_utf8_lossy(chunk)
                    .trim_end_matches(|c: char| c == ' ' || c == '\0')
                    .to_owned()
            })
            .collect()
    }
}

pub trait DataSource {
    fn dimension_length(&self, name: &str) -> Option<usize>;
    fn has_variable(&self, name: &str) -> bool;
    /// Variable names in storage order.
    fn variable_names(&self) -> Vec<String>;
    fn read_numeric(&self, name: &str) -> Result<NumericArray>;
    fn read_chars(&self, name: &str) -> Result<CharArray>;

    fn fill_value(&self, name: &str) -> Result<f64> {
        Ok(self.read_numeric(name)?.fill)
    }

    fn require_dimension(&self, name: &str) -> Result<usize> {
        self.dimension_length(name)
            .ok_or_else(|| CheckError::DimensionMissing(name.to_owned()))
    }

    /// One value per sample over `n_samples`, extra axes reduced.
    fn read_scalar_series(&self, name: &str, n_samples: usize) -> Result<(Vec<f64>, f64)> {
        let arr = self.read_numeric(name)?;
        let series = reduce_samples(name, &arr.values, n_samples, arr.fill)?;
        Ok((series, arr.fill))
    }

    /// One sample's reduced value, reading only through the slice accessor.
    fn read_slice(&self, name: &str, sample_axes: usize, sample: usize) -> Result<f64> {
        let arr = self.read_numeric(name)?;
        Ok(reduce(arr.slice(sample_axes, sample), arr.fill))
    }

    /// One QC-style character per sample over `n_samples`.
    fn read_char_series(&self, name: &str, n_samples: usize) -> Result<Vec<u8>> {
        let arr = self.read_chars(name)?;
        if arr.values.len() != n_samples {
            return Err(CheckError::Shape {
                var: name.to_owned(),
                found: arr.values.len(),
                expected: n_samples,
            });
        }
        Ok(arr.values)
    }

    /// Integer-valued series, e.g. cycle numbers; fill stays as the fill value.
    fn read_int_series(&self, name: &str, n_samples: usize) -> Result<(Vec<i64>, i64)> {
        let (series, fill) = self.read_scalar_series(name, n_samples)?;
        let ints = series
            .iter()
            .map(|&v| if v.is_nan() { fill as i64 } else { v as i64 })
            .collect();
        Ok((ints, fill as i64))
    }
}

#[derive(Debug, Clone)]
enum MemoryVar {
    Numeric(NumericArray),
    Chars(CharArray),
}

/// A `DataSource` built in memory, variable order preserved.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    dims: Vec<(String, usize)>,
    vars: Vec<(String, MemoryVar)>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dimension(mut self, name: &str, len: usize) -> Self {
        self.dims.retain(|(n, _)| n != name);
        self.dims.push((name.to_owned(), len));
        self
    }

    pub fn with_numeric(mut self, name: &str, shape: &[usize], values: Vec<f64>, fill: f64) -> Self {
        self.insert(
            name,
            MemoryVar::Numeric(NumericArray {
                shape: shape.to_vec(),
                values,
                fill,
            }),
        );
        self
    }

    /// One-dimensional numeric variable.
    pub fn with_series(self, name: &str, values: Vec<f64>, fill: f64) -> Self {
        let len = values.len();
        self.with_numeric(name, &[len], values, fill)
    }

    pub fn with_chars(mut self, name: &str, shape: &[usize], values: &[u8]) -> Self {
        self.insert(
            name,
            MemoryVar::Chars(CharArray {
                shape: shape.to_vec(),
                values: values.to_vec(),
            }),
        );
        self
    }

    /// One-dimensional character variable.
    pub fn with_char_series(self, name: &str, values: &[u8]) -> Self {
        let len = values.len();
        self.with_chars(name, &[len], values)
    }

    fn insert(&mut self, name: &str, var: MemoryVar) {
        self.vars.retain(|(n, _)| n != name);
        self.vars.push((name.to_owned(), var));
    }

    fn get(&self, name: &str) -> Result<&MemoryVar> {
        self.vars
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
            .ok_or_else(|| CheckError::VariableMissing(name.to_owned()))
    }
}

impl DataSource for MemorySource {
    fn dimension_length(&self, name: &str) -> Option<usize> {
        self.dims.iter().find(|(n, _)| n == name).map(|(_, len)| *len)
    }

    fn has_variable(&self, name: &str) -> bool {
        self.vars.iter().any(|(n, _)| n == name)
    }

    fn variable_names(&self) -> Vec<String> {
        self.vars.iter().map(|(n, _)| n.clone()).collect()
    }

    fn read_numeric(&self, name: &str) -> Result<NumericArray> {
        match self.get(name)? {
            MemoryVar::Numeric(arr) => Ok(arr.clone()),
            MemoryVar::Chars(_) => Err(CheckError::Read {
                var: name.to_owned(),
                msg: "character variable read as numeric".to_owned(),
            }),
        }
    }

    fn read_chars(&self, name: &str) -> Result<CharArray> {
        match self.get(name)? {
            MemoryVar::Chars(arr) => Ok(arr.clone()),
            MemoryVar::Numeric(_) => Err(CheckError::Read {
                var: name.to_owned(),
                msg: "numeric variable read as characters".to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILL: f64 = 99999.0;

    fn source() -> MemorySource {
        MemorySource::new()
            .with_dimension("N_LEVELS", 3)
            .with_numeric(
                "RAW",
                &[3, 2],
                vec![FILL, 2.0, FILL, FILL, f64::NAN, 1.0],
                FILL,
            )
            .with_char_series("RAW_QC", b"1 9")
            .with_chars("NAMES", &[2, 4], b"PRESTEMP")
    }

    #[test]
    fn test_scalar_series_reduces_extra_axes() {
        let src = source();
        let (series, fill) = src.read_scalar_series("RAW", 3).unwrap();
        assert_eq!(fill, FILL);
        assert_eq!(src.fill_value("RAW").unwrap(), FILL);
        assert_eq!(series[0], 2.0);
        assert_eq!(series[1], FILL);
        assert!(series[2].is_nan());
    }

    #[test]
    fn test_read_slice() {
        let src = source();
        assert_eq!(src.read_slice("RAW", 1, 0).unwrap(), 2.0);
        assert_eq!(src.read_slice("RAW", 1, 1).unwrap(), FILL);
    }

    #[test]
    fn test_missing_and_mistyped() {
        let src = source();
        assert_eq!(
            src.read_numeric("NOPE").unwrap_err(),
            CheckError::VariableMissing("NOPE".to_owned())
        );
        assert!(src.read_numeric("RAW_QC").is_err());
        assert!(src.read_char_series("RAW_QC", 4).is_err());
        assert!(src.require_dimension("N_PROF").is_err());
        assert_eq!(src.require_dimension("N_LEVELS").unwrap(), 3);
    }

    #[test]
    fn test_strings() {
        let src = source();
        assert_eq!(src.read_chars("NAMES").unwrap().strings(), vec!["PRES", "TEMP"]);
        assert_eq!(src.variable_names(), vec!["RAW", "RAW_QC", "NAMES"]);
    }
}
