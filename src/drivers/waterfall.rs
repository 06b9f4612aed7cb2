use std::sync::{Arc, Mutex};
use ndarray::Array2;
use crate::drivers::SweepError;
pub const DEFAULT_WATERFALL_DEPTH: usize = 100;
/// Fixed-depth rolling history of power rows, newest first.
///
/// Rows live in a ring indexed by `head` (the slot the next push writes), so an
/// insert never moves the other rows. Rows may differ in length; the effective
/// width is the longest row currently held.
#[derive(Clone, Debug)]
pub struct WaterfallBuffer {
    slots: Vec<Vec<f64>>,
    head: usize,
    len: usize,
}
impl Default for WaterfallBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_WATERFALL_DEPTH)
    }
}
impl WaterfallBuffer {
    pub fn new(depth: usize) -> Self {
        let depth = depth.max(1);
        Self {
            slots: vec![Vec::new(); depth],
            head: 0,
            len: 0,
        }
    }
    pub fn depth(&self) -> usize {
        self.slots.len()
    }
    pub fn len(&self) -> usize {
        self.len
    }
    pub fn push(&mut self, power_db: Vec<f64>) {
        self.slots[self.head] = power_db;
        self.head = (self.head + 1) % self.depth();
        self.len = (self.len + 1).min(self.depth());
    }
    /// Row `age` steps back in time; 0 is the most recent push.
    pub fn row(&self, age: usize) -> Option<&[f64]> {
        if age >= self.len {
            return None;
        }
        let depth = self.depth();
        let idx = (self.head + depth - 1 - age) % depth;
        Some(&self.slots[idx])
    }
    pub fn iter(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.len).filter_map(move |age| self.row(age))
    }
    pub fn width(&self) -> usize {
        self.iter().map(<[f64]>::len).max().unwrap_or(0)
    }
    /// `depth x width` matrix for rendering; cells without data are NaN.
    pub fn snapshot(&self) -> Array2<f64> {
        let mut image = Array2::from_elem((self.depth(), self.width()), f64::NAN);
        for (age, row) in self.iter().enumerate() {
            for (col, value) in row.iter().enumerate() {
                image[[age, col]] = *value;
            }
        }
        image
    }
}
/// Thread-safe handle: each push and snapshot is atomic with respect to the other.
#[derive(Clone, Debug)]
pub struct SharedWaterfall {
    inner: Arc<Mutex<WaterfallBuffer>>,
}
impl SharedWaterfall {
    pub fn new(depth: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(WaterfallBuffer::new(depth))),
        }
    }
    pub fn push(&self, power_db: Vec<f64>) -> Result<(), SweepError> {
        self.inner
            .lock()
            .map_err(|_| SweepError::Synchronization("waterfall"))?
            .push(power_db);
        Ok(())
    }
    pub fn snapshot(&self) -> Result<Array2<f64>, SweepError> {
        let buffer = self
            .inner
            .lock()
            .map_err(|_| SweepError::Synchronization("waterfall"))?;
        Ok(buffer.snapshot())
    }
    pub fn len(&self) -> Result<usize, SweepError> {
        let buffer = self
            .inner
            .lock()
            .map_err(|_| SweepError::Synchronization("waterfall"))?;
        Ok(buffer.len())
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use std::thread;
    #[test]
    fn evicts_oldest_row_past_depth() {
        let mut wf = WaterfallBuffer::new(3);
        for i in 0..4 {
            wf.push(vec![i as f64; 2]);
        }
        assert_eq!(wf.len(), 3);
        assert_eq!(wf.row(0), Some(&[3.0, 3.0][..]));
        assert_eq!(wf.row(2), Some(&[1.0, 1.0][..]));
        assert!(wf.iter().all(|r| r[0] != 0.0));
        assert_eq!(wf.row(3), None);
    }
    #[test]
    fn newest_row_is_always_first() {
        let mut wf = WaterfallBuffer::new(5);
        for i in 0..17 {
            wf.push(vec![i as f64]);
            assert_eq!(wf.row(0), Some(&[i as f64][..]));
        }
        let order: Vec<f64> = wf.iter().map(|r| r[0]).collect();
        assert_eq!(order, vec![16.0, 15.0, 14.0, 13.0, 12.0]);
    }
    #[test]
    fn snapshot_pads_with_nan() {
        let mut wf = WaterfallBuffer::new(4);
        wf.push(vec![-60.0, -61.0]);
        wf.push(vec![-50.0, -51.0, -52.0]);
        let snap = wf.snapshot();
        assert_eq!(snap.dim(), (4, 3));
        assert_eq!(snap[[0, 2]], -52.0);
        assert_eq!(snap[[1, 1]], -61.0);
        assert!(snap[[1, 2]].is_nan());
        assert!(snap.row(2).iter().all(|v| v.is_nan()));
        assert!(snap.row(3).iter().all(|v| v.is_nan()));
    }
    #[test]
    fn width_follows_rows_still_held() {
        let mut wf = WaterfallBuffer::new(2);
        wf.push(vec![0.0; 10]);
        wf.push(vec![0.0; 4]);
        assert_eq!(wf.width(), 10);
        wf.push(vec![0.0; 4]);
        assert_eq!(wf.width(), 4);
        assert_eq!(WaterfallBuffer::new(0).depth(), 1);
        assert_eq!(WaterfallBuffer::default().snapshot().dim(), (100, 0));
    }
    #[test]
    fn concurrent_push_and_snapshot_never_tear() {
        let shared = SharedWaterfall::new(100);
        let writer = shared.clone();
        let handle = thread::spawn(move || {
            let mut rng = rand::thread_rng();
            for i in 0..1000 {
                let width = rng.gen_range(1..64);
                writer.push(vec![i as f64; width]).unwrap();
            }
        });
        let mut seen = 0;
        while !handle.is_finished() || seen == 0 {
            let snap = shared.snapshot().unwrap();
            assert!(snap.nrows() <= 100);
            for row in snap.rows() {
                let mut values = row.iter().filter(|v| !v.is_nan());
                if let Some(first) = values.next() {
                    assert!(values.all(|v| v == first), "row mixes two pushes");
                }
            }
            seen += 1;
        }
        handle.join().unwrap();
        assert_eq!(shared.len().unwrap(), 100);
        let last = shared.snapshot().unwrap();
        assert_eq!(last[[0, 0]], 999.0);
    }
}
