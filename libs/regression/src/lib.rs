//! # Trendline Regression - Kernel Smoothing and Turning Points
//!
//! ## Purpose
//!
//! Nadaraya-Watson style kernel regression over closing prices, with deviation bands
//! and discrete reversal signals. Seventeen weight kernels are available; the engine
//! runs in one of two modes:
//!
//! - **Causal**: bar `i` is estimated from the `bandwidth` bars strictly before it.
//!   Values are final once computed.
//! - **Repainting**: bar `i` is estimated from a centred window that includes later
//!   bars. Values near the end of the series move as new bars arrive, so only closed
//!   bars should ever be acted on.
//!
//! ## Integration Points
//!
//! - **Input**: close prices from `trendline_types::PriceSeries::closes()`
//! - **Output**: [`RegressionResult`] consumed by the monitor's signal scanner
//!
//! ## Example
//!
//! ```rust
//! use trendline_regression::{Kernel, KernelSpec, RegressionEngine, TurningPoint};
//!
//! let spec = KernelSpec::new(Kernel::Gaussian, 2, 2.0, true).unwrap();
//! let result = RegressionEngine::new(spec).calculate(&[5.0, 4.0, 3.0, 2.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
//!
//! assert_eq!(result.signal_at(5), Some(TurningPoint::Up));
//! ```

pub mod engine;
pub mod error;
pub mod kernel;
pub mod signals;

pub use engine::{causal_weights, centered_weights, KernelSpec, RegressionEngine, RegressionResult};
pub use error::{RegressionError, Result};
pub use kernel::Kernel;
pub use signals::{deltas, detect_turning_points, TurningPoint};
