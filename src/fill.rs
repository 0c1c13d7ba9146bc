//! Fill-value comparison and collapsing of extra sensor dimensions.
//!
//! Parameters may carry axes beyond the sample axis (several reads of the
//! same sample). Those are collapsed to one value per sample before any
//! consistency rule looks at them.

use crate::error::{CheckError, Result};

/// A value is missing if it is exactly the fill sentinel or NaN.
///
/// Fill sentinels are out-of-range constants (99999 and friends), so no
/// tolerance is applied.
pub fn is_missing(fill: f64, value: f64) -> bool {
    value.is_nan() || value == fill
}

/// Collapse one sample's extra-dimension slice to a single value.
///
/// NaN anywhere wins. Otherwise the first non-missing element is returned,
/// otherwise the fill value. An empty slice yields the fill value.
pub fn reduce(slice: &[f64], fill: f64) -> f64 {
    let mut first_present = None;
    for &value in slice {
        if value.is_nan() {
            return f64::NAN;
        }
        if first_present.is_none() && value != fill {
            first_present = Some(value);
        }
    }

    first_present.unwrap_or(fill)
}

/// Reduce a flattened, sample-major array to one value per sample.
///
/// `values.len()` must be a multiple of `n_samples`; each consecutive chunk
/// of `values.len() / n_samples` elements is one sample's slice.
pub fn reduce_samples(var: &str, values: &[f64], n_samples: usize, fill: f64) -> Result<Vec<f64>> {
    if n_samples == 0 {
        return Ok(Vec::new());
    }
    if values.len() % n_samples != 0 {
        return Err(CheckError::Shape {
            var: var.to_owned(),
            found: values.len(),
            expected: n_samples,
        });
    }

    let width = values.len() / n_samples;
    if width == 1 {
        return Ok(values.to_vec());
    }
    if width == 0 {
        return Ok(vec![fill; n_samples]);
    }

    Ok(values.chunks(width).map(|slice| reduce(slice, fill)).collect())
}

/// Three-way classification of one field of one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Missing,
    Present,
    /// NaN where a value or the fill sentinel was expected.
    Invalid,
}

impl Presence {
    pub fn of(value: f64, fill: f64) -> Presence {
        if value.is_nan() {
            Presence::Invalid
        } else if value == fill {
            Presence::Missing
        } else {
            Presence::Present
        }
    }

    pub fn is_present(self) -> bool {
        self == Presence::Present
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILL: f64 = 99999.0;

    #[test]
    fn test_is_missing() {
        assert!(is_missing(FILL, FILL));
        assert!(is_missing(FILL, f64::NAN));
        assert!(!is_missing(FILL, 99998.9));
        assert!(!is_missing(FILL, 0.0));
    }

    #[test]
    fn test_reduce() {
        assert_eq!(reduce(&[], FILL), FILL);
        assert!(reduce(&[f64::NAN, 5.0, FILL], FILL).is_nan());
        assert!(reduce(&[5.0, FILL, f64::NAN], FILL).is_nan());
        assert_eq!(reduce(&[FILL, FILL, FILL], FILL), FILL);
        assert_eq!(reduce(&[FILL, 7.2, FILL], FILL), 7.2);
        assert_eq!(reduce(&[FILL, 7.2, 3.0], FILL), 7.2);
    }

    #[test]
    fn test_reduce_samples() {
        let values = [1.0, FILL, FILL, FILL, FILL, 4.0];
        let reduced = reduce_samples("X", &values, 3, FILL).unwrap();
        assert_eq!(reduced, vec![1.0, FILL, 4.0]);

        let flat = reduce_samples("X", &[1.0, 2.0], 2, FILL).unwrap();
        assert_eq!(flat, vec![1.0, 2.0]);

        assert!(reduce_samples("X", &[1.0, 2.0, 3.0], 2, FILL).is_err());
        assert!(reduce_samples("X", &[], 0, FILL).unwrap().is_empty());
    }

    #[test]
    fn test_presence() {
        assert_eq!(Presence::of(FILL, FILL), Presence::Missing);
        assert_eq!(Presence::of(1.5, FILL), Presence::Present);
        assert_eq!(Presence::of(f64::NAN, FILL), Presence::Invalid);
    }
}
