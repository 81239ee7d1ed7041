//! Turning-point detection on a smoothed series

use std::fmt;

/// Direction of a detected reversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurningPoint {
    /// Local trough turning upward
    Up,
    /// Local peak turning downward
    Down,
}

impl TurningPoint {
    pub const fn emoji(self) -> &'static str {
        match self {
            TurningPoint::Up => "📈",
            TurningPoint::Down => "📉",
        }
    }

    pub const fn verb(self) -> &'static str {
        match self {
            TurningPoint::Up => "up",
            TurningPoint::Down => "down",
        }
    }
}

impl fmt::Display for TurningPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// First difference with `delta[0] = 0`
pub fn deltas(regression: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(regression.len());
    if regression.is_empty() {
        return out;
    }
    out.push(0.0);
    out.extend(regression.windows(2).map(|pair| pair[1] - pair[0]));
    out
}

/// Flag sign changes of the first difference.
///
/// `up[i]` holds iff `delta[i] > 0 && delta[i-1] < 0`, and `down[i]` is the mirror.
/// Index 0 never signals. NaN deltas compare false, so undefined regression values
/// produce no signal.
pub fn detect_turning_points(regression: &[f64]) -> (Vec<bool>, Vec<bool>) {
    let delta = deltas(regression);
    let mut up = vec![false; delta.len()];
    let mut down = vec![false; delta.len()];

    for i in 1..delta.len() {
        let (current, previous) = (delta[i], delta[i - 1]);
        up[i] = current > 0.0 && previous < 0.0;
        down[i] = current < 0.0 && previous > 0.0;
    }

    (up, down)
}
