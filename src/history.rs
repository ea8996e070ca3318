//! Circular temperature history log.
//!
//! Fixed-capacity ring of (timestamp, temperature) samples with an
//! overwrite-oldest policy. Readout is a lazy, restartable iterator in
//! chronological order, so the status layer can stream the log without
//! copying the whole buffer; [`write_csv`](HistoryLog::write_csv)
//! renders the `/api/log` body on top of it.

use core::fmt;

/// Default log depth: five minutes at one sample per second.
pub const HISTORY_CAPACITY: usize = 300;

/// One history sample. An invalid probe reading is recorded as
/// `celsius: None` and rendered as `nan` at the CSV boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Milliseconds since boot at record time.
    pub at_ms: u64,
    /// Probe reading, if the probe produced a valid one.
    pub celsius: Option<f32>,
}

const EMPTY: Sample = Sample {
    at_ms: 0,
    celsius: None,
};

/// Fixed-capacity circular sample log.
pub struct HistoryLog<const N: usize = HISTORY_CAPACITY> {
    entries: [Sample; N],
    /// Next write position.
    cursor: usize,
    /// Set once the cursor has wrapped; readout order changes from
    /// `0..cursor` to "right after the cursor, around to the cursor".
    wrapped: bool,
}

impl<const N: usize> HistoryLog<N> {
    pub fn new() -> Self {
        Self {
            entries: [EMPTY; N],
            cursor: 0,
            wrapped: false,
        }
    }

    /// Append one sample, overwriting the oldest entry once full.
    pub fn record(&mut self, at_ms: u64, celsius: Option<f32>) {
        self.entries[self.cursor] = Sample { at_ms, celsius };
        self.cursor = (self.cursor + 1) % N;
        if self.cursor == 0 {
            self.wrapped = true;
        }
    }

    /// Number of samples currently held (saturates at capacity).
    pub fn len(&self) -> usize {
        if self.wrapped { N } else { self.cursor }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Samples in chronological order, oldest first. Lazy and
    /// restartable: each call starts over from the oldest entry.
    pub fn iter(&self) -> impl Iterator<Item = Sample> + '_ {
        let (start, len) = if self.wrapped {
            (self.cursor, N)
        } else {
            (0, self.cursor)
        };
        (0..len).map(move |i| self.entries[(start + i) % N])
    }

    /// Render the log as CSV: a `time,temperature` header followed by
    /// one row per sample in chronological order. Invalid samples
    /// render their temperature as `nan`.
    pub fn write_csv(&self, out: &mut impl fmt::Write) -> fmt::Result {
        out.write_str("time,temperature")?;
        for sample in self.iter() {
            match sample.celsius {
                Some(t) => write!(out, "\n{},{t}", sample.at_ms)?,
                None => write!(out, "\n{},nan", sample.at_ms)?,
            }
        }
        Ok(())
    }
}

impl<const N: usize> Default for HistoryLog<N> {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn readout_is_chronological_and_bounded(n in 0usize..40) {
            let mut log: HistoryLog<8> = HistoryLog::new();
            // Strictly increasing timestamps, as the scheduler records.
            for i in 0..n {
                log.record(i as u64, Some(20.0));
            }

            let times: Vec<u64> = log.iter().map(|s| s.at_ms).collect();
            prop_assert!(times.len() <= 8);
            prop_assert!(times.windows(2).all(|w| w[0] < w[1]));

            // The retained tail is exactly the most recent entries.
            let expect: Vec<u64> = (n.saturating_sub(8)..n).map(|i| i as u64).collect();
            prop_assert_eq!(times, expect);
        }
    }
}
