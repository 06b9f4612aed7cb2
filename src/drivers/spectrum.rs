use std::sync::{Arc, Mutex};
use crate::drivers::{SweepError, SweepSegment};
/// Frequency axis and power values of the most recent segment.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpectrumSnapshot {
    freqs_ghz: Vec<f64>,
    power_db: Vec<f64>,
    updates: u64,
}
impl SpectrumSnapshot {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn update(&mut self, segment: &SweepSegment) {
        let axis = frequency_axis(
            segment.start_freq_ghz,
            segment.stop_freq_ghz,
            segment.step_mhz / 1000.0,
            segment.power_db.len(),
        );
        let common = axis.len().min(segment.power_db.len());
        self.freqs_ghz = axis;
        self.freqs_ghz.truncate(common);
        self.power_db.clear();
        self.power_db
            .extend_from_slice(&segment.power_db[..common]);
        self.updates += 1;
    }
    pub fn read(&self) -> (Vec<f64>, Vec<f64>) {
        (self.freqs_ghz.clone(), self.power_db.clone())
    }
    pub fn freqs_ghz(&self) -> &[f64] {
        &self.freqs_ghz
    }
    pub fn power_db(&self) -> &[f64] {
        &self.power_db
    }
    /// Segments applied so far.
    pub fn updates(&self) -> u64 {
        self.updates
    }
    pub fn is_empty(&self) -> bool {
        self.freqs_ghz.is_empty()
    }
    /// First and last frequency currently on the axis.
    pub fn span_ghz(&self) -> Option<(f64, f64)> {
        Some((*self.freqs_ghz.first()?, *self.freqs_ghz.last()?))
    }
}
/// `start, start + step, ...` strictly below `stop`, capped at `limit` points.
fn frequency_axis(start: f64, stop: f64, step: f64, limit: usize) -> Vec<f64> {
    if !(step.is_finite() && step > 0.0 && start.is_finite() && stop.is_finite()) {
        return Vec::new();
    }
    (0..limit)
        .map(|i| start + i as f64 * step)
        .take_while(|f| *f < stop)
        .collect()
}
#[derive(Clone, Debug, Default)]
pub struct SharedSpectrum {
    inner: Arc<Mutex<SpectrumSnapshot>>,
}
impl SharedSpectrum {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn update(&self, segment: &SweepSegment) -> Result<(), SweepError> {
        self.inner
            .lock()
            .map_err(|_| SweepError::Synchronization("spectrum"))?
            .update(segment);
        Ok(())
    }
    pub fn read(&self) -> Result<(Vec<f64>, Vec<f64>), SweepError> {
        let snapshot = self
            .inner
            .lock()
            .map_err(|_| SweepError::Synchronization("spectrum"))?;
        Ok(snapshot.read())
    }
    pub fn latest(&self) -> Result<SpectrumSnapshot, SweepError> {
        let snapshot = self
            .inner
            .lock()
            .map_err(|_| SweepError::Synchronization("spectrum"))?;
        Ok(snapshot.clone())
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    fn segment(start: f64, stop: f64, step_mhz: f64, power_db: Vec<f64>) -> SweepSegment {
        SweepSegment {
            timestamp: String::new(),
            start_freq_ghz: start,
            stop_freq_ghz: stop,
            step_mhz,
            power_db,
        }
    }
    #[test]
    fn axis_matches_power_when_consistent() {
        let mut snap = SpectrumSnapshot::new();
        snap.update(&segment(2.4, 2.404, 1.0, vec![-60.0, -55.0, -58.0, -62.0]));
        let (freqs, power) = snap.read();
        assert_eq!(freqs.len(), 4);
        assert!((freqs[1] - 2.401).abs() < 1e-12);
        assert_eq!(power, vec![-60.0, -55.0, -58.0, -62.0]);
    }
    #[test]
    fn truncates_power_to_short_axis() {
        let mut snap = SpectrumSnapshot::new();
        snap.update(&segment(1.0, 1.0015, 1.0, vec![-1.0, -2.0, -3.0, -4.0]));
        let (freqs, power) = snap.read();
        assert_eq!(freqs.len(), 2);
        assert_eq!(power, vec![-1.0, -2.0]);
    }
    #[test]
    fn truncates_axis_to_short_power() {
        let mut snap = SpectrumSnapshot::new();
        snap.update(&segment(2.4, 2.48, 1.0, vec![-60.0, -55.0, -58.0, -62.0]));
        let (freqs, power) = snap.read();
        assert_eq!(freqs.len(), power.len());
        assert_eq!(power, vec![-60.0, -55.0, -58.0, -62.0]);
        assert_eq!(freqs[0], 2.4);
        assert_eq!(snap.span_ghz().map(|(lo, _)| lo), Some(2.4));
    }
    #[test]
    fn degenerate_step_yields_empty_view() {
        let mut snap = SpectrumSnapshot::new();
        snap.update(&segment(1.0, 2.0, 0.0, vec![-1.0]));
        assert!(snap.is_empty());
        assert!(snap.power_db().is_empty());
        snap.update(&segment(2.0, 1.0, 1.0, vec![-1.0]));
        assert!(snap.is_empty());
        assert_eq!(snap.span_ghz(), None);
    }
    #[test]
    fn shared_read_returns_latest_update() {
        let shared = SharedSpectrum::new();
        shared
            .update(&segment(1.0, 1.01, 1.0, vec![-3.0; 5]))
            .unwrap();
        shared
            .update(&segment(1.0, 1.01, 1.0, vec![-7.0; 3]))
            .unwrap();
        let (freqs, power) = shared.read().unwrap();
        assert_eq!(freqs.len(), 3);
        assert_eq!(power, vec![-7.0; 3]);
        let latest = shared.latest().unwrap();
        assert_eq!(latest.updates(), 2);
        assert_eq!(latest.freqs_ghz(), &freqs[..]);
    }
}
