//! Fixed-range, logarithmic-bucket recorder used for both per-stage search
//! latencies and the insert-time bit-density histogram.
//!
//! Values are clamped into `[1, max_value]` and bucketed into power-of-two
//! octaves, each subdivided linearly into [`SUBDIVISIONS`] steps — enough
//! resolution to separate a 101us sample from a 102us one (roughly three
//! significant decimal digits) without paying for one bucket per value
//! across a multi-second range. All updates are lock-free: a kernel under
//! concurrent search load records into these without coordinating with the
//! index lock, so a few lost samples under extreme contention are
//! acceptable but a corrupted bucket count is not.

use std::sync::atomic::{AtomicU64, Ordering};

const SUBDIVISIONS: u64 = 1024;

pub struct Histogram {
    max_value: u64,
    buckets: Vec<AtomicU64>,
    count: AtomicU64,
    sum: AtomicU64,
}

/// A point-in-time read of a histogram's aggregate statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct Snapshot {
    pub count: u64,
    pub mean: f64,
    pub p10: u64,
    pub p90: u64,
}

impl Histogram {
    /// Creates a histogram covering `[1, max_value]`.
    pub fn new(max_value: u64) -> Self {
        let max_value = max_value.max(1);
        // floor(log2(max_value)) + 1 octaves, each holding SUBDIVISIONS buckets.
        let num_octaves = (64 - max_value.leading_zeros()) as u64;
        let bucket_count = (num_octaves * SUBDIVISIONS) as usize;
        Self {
            max_value,
            buckets: (0..bucket_count).map(|_| AtomicU64::new(0)).collect(),
            count: AtomicU64::new(0),
            sum: AtomicU64::new(0),
        }
    }

    fn octave_of(value: u64) -> u32 {
        63 - value.leading_zeros()
    }

    fn bucket_index(&self, value: u64) -> usize {
        let v = value.clamp(1, self.max_value);
        let e = Self::octave_of(v) as u64;
        let octave_start = 1u64 << e;
        let octave_end = octave_start << 1;
        let sub = ((v - octave_start) * SUBDIVISIONS / (octave_end - octave_start)).min(SUBDIVISIONS - 1);
        (e * SUBDIVISIONS + sub) as usize
    }

    fn bucket_midpoint(&self, idx: usize) -> u64 {
        let e = idx as u64 / SUBDIVISIONS;
        let sub = idx as u64 % SUBDIVISIONS;
        let octave_start = 1u64 << e;
        let octave_end = octave_start << 1;
        let width = ((octave_end - octave_start) / SUBDIVISIONS).max(1);
        (octave_start + sub * width + width / 2).min(self.max_value)
    }

    /// Records one observation, clamped into the histogram's range.
    pub fn record(&self, value: u64) {
        let v = value.clamp(1, self.max_value);
        self.count.fetch_add(1, Ordering::Relaxed);
        self.sum.fetch_add(v, Ordering::Relaxed);
        self.buckets[self.bucket_index(v)].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum.load(Ordering::Relaxed) as f64 / count as f64
        }
    }

    /// Approximate value at percentile `p` in `[0.0, 1.0]`, as the midpoint
    /// of the bucket containing that rank.
    pub fn percentile(&self, p: f64) -> u64 {
        let total = self.count();
        if total == 0 {
            return 0;
        }
        let target = (p.clamp(0.0, 1.0) * total as f64).ceil().max(1.0) as u64;
        let mut cumulative = 0u64;
        for (idx, bucket) in self.buckets.iter().enumerate() {
            cumulative += bucket.load(Ordering::Relaxed);
            if cumulative >= target {
                return self.bucket_midpoint(idx);
            }
        }
        self.max_value
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            count: self.count(),
            mean: self.mean(),
            p10: self.percentile(0.10),
            p90: self.percentile(0.90),
        }
    }
}
