//! Expected `PROFILE_<PARAM>_QC` from the per-level QC flags of one profile.

use crate::codes::QcFlags;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QcTally {
    /// Levels whose QC is neither the missing nor the not-measured flag.
    pub n_data: usize,
    pub n_good: usize,
    /// Levels flagged "no QC performed".
    pub n_noqc: usize,
}

impl QcTally {
    pub fn from_codes(codes: &[u8], flags: &QcFlags) -> Self {
        let mut tally = QcTally::default();
        for &qc in codes {
            tally.add(qc, flags);
        }
        tally
    }

    pub fn add(&mut self, qc: u8, flags: &QcFlags) {
        if flags.marks_missing(qc) {
            return;
        }
        self.n_data += 1;
        if flags.is_good(qc) {
            self.n_good += 1;
        }
        if qc == flags.no_qc {
            self.n_noqc += 1;
        }
    }

    /// The aggregate code. Percent thresholds are compared in integers so
    /// 75% is exactly 3 of 4.
    pub fn profile_qc(&self, flags: &QcFlags) -> u8 {
        if self.n_noqc == self.n_data {
            return flags.not_measured;
        }

        let good = self.n_good * 100;
        let data = self.n_data;
        if self.n_good == data {
            b'A'
        } else if good >= 75 * data {
            b'B'
        } else if good >= 50 * data {
            b'C'
        } else if good >= 25 * data {
            b'D'
        } else if self.n_good > 0 {
            b'E'
        } else {
            b'F'
        }
    }
}

pub fn profile_qc_code(codes: &[u8], flags: &QcFlags) -> u8 {
    QcTally::from_codes(codes, flags).profile_qc(flags)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tally(n_good: usize, n_data: usize, n_noqc: usize) -> u8 {
        QcTally { n_data, n_good, n_noqc }.profile_qc(&QcFlags::argo())
    }

    #[test]
    fn test_boundaries() {
        assert_eq!(tally(4, 4, 0), b'A');
        assert_eq!(tally(3, 4, 0), b'B');
        assert_eq!(tally(2, 4, 0), b'C');
        assert_eq!(tally(1, 4, 0), b'D');
        assert_eq!(tally(0, 4, 2), b'F');
        assert_eq!(tally(0, 4, 4), b' ');
        assert_eq!(tally(1, 5, 0), b'E');
        assert_eq!(tally(0, 0, 0), b' ');
    }

    #[test]
    fn test_from_codes() {
        let flags = QcFlags::argo();
        let t = QcTally::from_codes(b"1249 0 85", &flags);
        assert_eq!(t, QcTally { n_data: 6, n_good: 4, n_noqc: 1 });
        // 4/6 = 67%
        assert_eq!(profile_qc_code(b"1249 0 85", &flags), b'C');
        assert_eq!(profile_qc_code(b"0000", &flags), b' ');
        assert_eq!(profile_qc_code(b"99  ", &flags), b' ');
        assert_eq!(profile_qc_code(b"3344", &flags), b'F');
    }
}
