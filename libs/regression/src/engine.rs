//! Kernel regression in causal and centred (repainting) modes
//!
//! Both modes return arrays aligned index-for-index with the input. Values that
//! cannot be computed (too few bars, degenerate windows) are `NaN`, and the
//! turning-point pass turns them into "no signal".

use crate::error::{RegressionError, Result};
use crate::kernel::Kernel;
use crate::signals::{detect_turning_points, TurningPoint};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Kernel, bandwidth, band width and evaluation mode for one regression run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelSpec {
    pub kernel: Kernel,
    /// Number of bars defining smoothing locality
    pub bandwidth: usize,
    /// Multiplier applied to the weighted standard deviation for the bands
    pub deviations: f64,
    /// Centred mode when true; uses bars after `i` so recent values change
    pub repaint: bool,
}

impl Default for KernelSpec {
    fn default() -> Self {
        Self {
            kernel: Kernel::Laplace,
            bandwidth: 14,
            deviations: 2.0,
            repaint: true,
        }
    }
}

impl KernelSpec {
    pub fn new(kernel: Kernel, bandwidth: usize, deviations: f64, repaint: bool) -> Result<Self> {
        let spec = Self {
            kernel,
            bandwidth,
            deviations,
            repaint,
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> Result<()> {
        if self.bandwidth == 0 {
            return Err(RegressionError::InvalidBandwidth(self.bandwidth));
        }
        if !self.deviations.is_finite() || self.deviations < 0.0 {
            return Err(RegressionError::InvalidDeviation(self.deviations));
        }
        Ok(())
    }
}

/// Smoothed values, band half-widths and turning-point flags aligned to the input
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionResult {
    pub regression: Vec<f64>,
    /// Band half-width (weighted std-dev times the deviation multiplier)
    pub deviation: Vec<f64>,
    pub up_signal: Vec<bool>,
    pub down_signal: Vec<bool>,
}

impl RegressionResult {
    fn from_parts(regression: Vec<f64>, deviation: Vec<f64>) -> Self {
        let (up_signal, down_signal) = detect_turning_points(&regression);
        Self {
            regression,
            deviation,
            up_signal,
            down_signal,
        }
    }

    pub fn len(&self) -> usize {
        self.regression.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regression.is_empty()
    }

    pub fn upper_band(&self) -> Vec<f64> {
        self.regression
            .iter()
            .zip(&self.deviation)
            .map(|(r, d)| r + d)
            .collect()
    }

    pub fn lower_band(&self) -> Vec<f64> {
        self.regression
            .iter()
            .zip(&self.deviation)
            .map(|(r, d)| r - d)
            .collect()
    }

    /// Turning point flagged at `index`, if any
    pub fn signal_at(&self, index: usize) -> Option<TurningPoint> {
        if *self.up_signal.get(index)? {
            Some(TurningPoint::Up)
        } else if *self.down_signal.get(index)? {
            Some(TurningPoint::Down)
        } else {
            None
        }
    }

    /// Turning point flagged at the second-to-last index.
    ///
    /// The final input bar is taken to be still forming; its centred window is the
    /// least settled, so only the bar before it is read.
    pub fn last_closed_signal(&self) -> Option<TurningPoint> {
        self.signal_at(self.len().checked_sub(2)?)
    }
}

/// Normalised causal weights `w_k = kernel(k² / bw²)` for `k in 0..bw`.
///
/// `w_0` belongs to the bar immediately before the one being estimated.
pub fn causal_weights(kernel: Kernel, bandwidth: usize) -> Vec<f64> {
    let bw2 = (bandwidth * bandwidth) as f64;
    let raw: Vec<f64> = (0..bandwidth)
        .map(|k| kernel.weight((k * k) as f64 / bw2))
        .collect();
    normalize(raw)
}

/// Window bounds and normalised weights for the centred estimate at `index`.
///
/// The window is `[max(0, i - bw), min(n, i + bw + 1))` and shrinks at both ends of
/// the series; weights are renormalised over whatever remains.
pub fn centered_weights(
    kernel: Kernel,
    bandwidth: usize,
    index: usize,
    len: usize,
) -> (Range<usize>, Vec<f64>) {
    let start = index.saturating_sub(bandwidth);
    let end = len.min(index + bandwidth + 1);
    let bw = bandwidth as f64;
    let raw = (start..end)
        .map(|j| kernel.weight((index as f64 - j as f64) / bw))
        .collect();
    (start..end, normalize(raw))
}

fn normalize(mut weights: Vec<f64>) -> Vec<f64> {
    let sum: f64 = weights.iter().sum();
    for w in &mut weights {
        *w /= sum;
    }
    weights
}

/// Weighted mean and weighted std-dev over `window` with the given denominator
fn weighted_stats<'a, I>(window: &[f64], weights: I, denominator: f64) -> (f64, f64)
where
    I: Iterator<Item = &'a f64> + Clone,
{
    let mean: f64 = window.iter().zip(weights.clone()).map(|(x, w)| x * w).sum();
    let spread: f64 = window
        .iter()
        .zip(weights)
        .map(|(x, w)| (x - mean).powi(2) * w)
        .sum();
    (mean, (spread / denominator).sqrt())
}

/// Stateless evaluator for one [`KernelSpec`]
#[derive(Debug, Clone, Copy)]
pub struct RegressionEngine {
    spec: KernelSpec,
}

impl RegressionEngine {
    pub fn new(spec: KernelSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &KernelSpec {
        &self.spec
    }

    /// Evaluate in the mode selected by `spec.repaint`
    pub fn calculate(&self, data: &[f64]) -> RegressionResult {
        if self.spec.repaint {
            self.calculate_repainting(data)
        } else {
            self.calculate_causal(data)
        }
    }

    /// Non-repainting estimate: bar `i` only sees bars `i - bw .. i - 1`
    pub fn calculate_causal(&self, data: &[f64]) -> RegressionResult {
        let bw = self.spec.bandwidth;
        let weights = causal_weights(self.spec.kernel, bw);
        let denominator = bw.saturating_sub(1) as f64;

        let mut regression = vec![f64::NAN; data.len()];
        let mut deviation = vec![f64::NAN; data.len()];

        for i in bw..data.len() {
            let window = &data[i - bw..i];
            let (mean, std_dev) = weighted_stats(window, weights.iter().rev(), denominator);
            regression[i] = mean;
            deviation[i] = std_dev * self.spec.deviations;
        }

        RegressionResult::from_parts(regression, deviation)
    }

    /// Centred estimate over a symmetric window; values near the end are provisional
    pub fn calculate_repainting(&self, data: &[f64]) -> RegressionResult {
        let n = data.len();
        let mut regression = Vec::with_capacity(n);
        let mut deviation = Vec::with_capacity(n);

        for i in 0..n {
            let (range, weights) = centered_weights(self.spec.kernel, self.spec.bandwidth, i, n);
            let denominator = (range.len() - 1) as f64;
            let (mean, std_dev) = weighted_stats(&data[range], weights.iter(), denominator);
            regression.push(mean);
            deviation.push(std_dev * self.spec.deviations);
        }

        RegressionResult::from_parts(regression, deviation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn spec(kernel: Kernel, bandwidth: usize, repaint: bool) -> KernelSpec {
        KernelSpec::new(kernel, bandwidth, 1.0, repaint).unwrap()
    }

    #[test]
    fn test_spec_validation() {
        assert_eq!(
            KernelSpec::new(Kernel::Laplace, 0, 2.0, true),
            Err(RegressionError::InvalidBandwidth(0))
        );
        assert!(matches!(
            KernelSpec::new(Kernel::Laplace, 14, -1.0, true),
            Err(RegressionError::InvalidDeviation(_))
        ));
        assert!(KernelSpec::new(Kernel::Laplace, 14, 0.0, false).is_ok());
    }

    #[test]
    fn test_default_spec() {
        let spec = KernelSpec::default();
        assert_eq!(spec.kernel, Kernel::Laplace);
        assert_eq!(spec.bandwidth, 14);
        assert_eq!(spec.deviations, 2.0);
        assert!(spec.repaint);
    }

    #[test]
    fn test_causal_known_values() {
        // laplace, bw = 2: w0 = 0.5, w1 = 0.5 * e^-0.25, most recent bar gets w0
        let engine = RegressionEngine::new(spec(Kernel::Laplace, 2, false));
        let result = engine.calculate(&[1.0, 2.0, 3.0, 4.0, 5.0]);

        assert!(result.regression[0].is_nan());
        assert!(result.regression[1].is_nan());
        assert!((result.regression[2] - 1.562_176_500_885_798).abs() < EPS);
        assert!((result.regression[4] - 3.562_176_500_885_798).abs() < EPS);
        assert!((result.deviation[2] - 0.496_119_020_737_562_9).abs() < EPS);
    }

    #[test]
    fn test_causal_excludes_current_bar() {
        let engine = RegressionEngine::new(spec(Kernel::Gaussian, 3, false));
        let mut data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let before = engine.calculate(&data).regression[4];
        data[4] = 1_000.0;
        let after = engine.calculate(&data).regression[4];
        assert_eq!(before, after);
    }

    #[test]
    fn test_causal_bandwidth_one_has_undefined_deviation() {
        let engine = RegressionEngine::new(spec(Kernel::Laplace, 1, false));
        let result = engine.calculate(&[1.0, 2.0, 3.0]);
        assert_eq!(result.regression[1], 1.0);
        assert!(result.deviation[1].is_nan());
    }

    #[test]
    fn test_short_series_has_no_signals() {
        let engine = RegressionEngine::new(spec(Kernel::Laplace, 14, false));
        let result = engine.calculate(&[1.0, 2.0, 1.0]);
        assert!(result.regression.iter().all(|v| v.is_nan()));
        assert!(result.up_signal.iter().all(|&f| !f));
        assert!(result.down_signal.iter().all(|&f| !f));
    }

    #[test]
    fn test_constant_series_is_flat() {
        for repaint in [true, false] {
            let engine = RegressionEngine::new(spec(Kernel::Epanechnikov, 3, repaint));
            let result = engine.calculate(&[7.0; 12]);
            for i in 3..12 {
                assert!((result.regression[i] - 7.0).abs() < EPS);
                assert!(result.deviation[i].abs() < EPS);
            }
        }

        let causal = RegressionEngine::new(spec(Kernel::Epanechnikov, 3, false));
        let result = causal.calculate(&[7.0; 12]);
        assert!(result.up_signal.iter().all(|&f| !f));
        assert!(result.down_signal.iter().all(|&f| !f));
    }

    #[test]
    fn test_repainting_single_bar_is_undefined_deviation() {
        let engine = RegressionEngine::new(spec(Kernel::Laplace, 2, true));
        let result = engine.calculate(&[10.0]);
        assert_eq!(result.regression, vec![10.0]);
        assert!(result.deviation[0].is_nan());
        assert_eq!(result.up_signal, vec![false]);
    }

    #[test]
    fn test_v_shape_trough_signals_up() {
        let data = [5.0, 4.0, 3.0, 2.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        for kernel in [
            Kernel::Gaussian,
            Kernel::Triangular,
            Kernel::Epanechnikov,
            Kernel::Laplace,
            Kernel::Cauchy,
        ] {
            let engine = RegressionEngine::new(spec(kernel, 2, true));
            let result = engine.calculate(&data);

            let trough = result
                .regression
                .iter()
                .enumerate()
                .min_by(|a, b| a.1.total_cmp(b.1))
                .map(|(i, _)| i)
                .unwrap();
            assert_eq!(trough, 4, "{} trough", kernel);

            let ups: Vec<usize> = (0..data.len()).filter(|&i| result.up_signal[i]).collect();
            assert_eq!(ups, vec![5], "{} up signals", kernel);
            assert!(result.down_signal.iter().all(|&f| !f), "{} down", kernel);
        }
    }

    #[test]
    fn test_bands_are_symmetric() {
        let engine = RegressionEngine::new(KernelSpec::new(Kernel::Gaussian, 3, 2.0, true).unwrap());
        let result = engine.calculate(&[1.0, 3.0, 2.0, 5.0, 4.0, 6.0]);
        let upper = result.upper_band();
        let lower = result.lower_band();
        for i in 0..result.len() {
            assert!(((upper[i] + lower[i]) / 2.0 - result.regression[i]).abs() < EPS);
            assert!(upper[i] >= lower[i]);
        }
    }

    #[test]
    fn test_centered_weights_truncate_at_edges() {
        let (range, weights) = centered_weights(Kernel::Gaussian, 3, 0, 10);
        assert_eq!(range, 0..4);
        assert!((weights.iter().sum::<f64>() - 1.0).abs() < EPS);

        let (range, _) = centered_weights(Kernel::Gaussian, 3, 9, 10);
        assert_eq!(range, 6..10);

        let (range, _) = centered_weights(Kernel::Gaussian, 3, 5, 10);
        assert_eq!(range, 2..9);
    }

    #[test]
    fn test_last_closed_signal_reads_second_to_last_bar() {
        let engine = RegressionEngine::new(spec(Kernel::Laplace, 2, true));

        // Turns up on the final bar only, so nothing is closed yet
        let data = [10.0, 9.0, 8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0, 1.5, 3.0];
        let result = engine.calculate(&data);
        assert_eq!(result.signal_at(11), Some(TurningPoint::Up));
        assert_eq!(result.last_closed_signal(), None);

        let data = [10.0, 9.0, 8.0, 7.0, 6.0, 5.0, 4.0, 0.0, 2.0, 5.0];
        let result = engine.calculate(&data);
        assert_eq!(result.signal_at(8), Some(TurningPoint::Up));
        assert_eq!(result.last_closed_signal(), Some(TurningPoint::Up));

        assert_eq!(engine.calculate(&[1.0]).last_closed_signal(), None);
        assert_eq!(result.signal_at(100), None);
    }
}
