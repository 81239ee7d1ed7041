//! Trend signal scanning over monitored symbols
//!
//! For each (symbol, horizon) pair the scanner fetches recent bars, runs the kernel
//! regression over the whole fetch, and reports a turning point on the most recent
//! closed bar, which is the second-to-last one. The final fetched bar is still forming
//! and its flags are never read; its close is reported as the current price.

use crate::context::MonitorContext;
use crate::error::{ProviderError, Result};
use crate::provider::{exchange_label, with_timeout};
use futures::stream::{self, StreamExt};
use std::time::Duration;
use tracing::{debug, warn};
use trendline_regression::{KernelSpec, RegressionEngine, TurningPoint};
use trendline_types::{ChatId, Horizon, PriceSeries};

#[derive(Debug, Clone)]
pub struct ScannerConfig {
    pub kernel: KernelSpec,
    pub bar_limit: usize,
    pub fetch_timeout: Duration,
    pub max_concurrent_fetches: usize,
    pub report_failures: bool,
}

/// Turning point found on the latest closed bar of one (symbol, horizon)
#[derive(Debug, Clone, PartialEq)]
pub struct TrendEvent {
    pub symbol: String,
    pub horizon: Horizon,
    pub direction: TurningPoint,
    /// Close of the open bar
    pub price: f64,
    pub exchange: String,
}

impl TrendEvent {
    pub fn render(&self) -> String {
        format!(
            "{} {}: Signal for {}: {} in timeframe {} is {}",
            self.direction.emoji(),
            exchange_label(&self.exchange),
            self.symbol,
            self.price,
            self.horizon,
            self.direction.verb()
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanFailure {
    pub symbol: String,
    pub horizon: Horizon,
    pub error: ProviderError,
}

impl ScanFailure {
    pub fn render(&self) -> String {
        format!(
            "⚠️ Error checking signals for {} in timeframe {}",
            self.symbol, self.horizon
        )
    }
}

#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub events: Vec<TrendEvent>,
    pub failures: Vec<ScanFailure>,
    pub pairs_checked: usize,
}

impl ScanOutcome {
    /// One batched message for the user, or `None` when there is nothing to say
    pub fn message(&self, report_failures: bool) -> Option<String> {
        let mut lines: Vec<String> = self.events.iter().map(TrendEvent::render).collect();
        if report_failures {
            lines.extend(self.failures.iter().map(ScanFailure::render));
        }
        (!lines.is_empty()).then(|| lines.join("\n"))
    }
}

/// Turning point on the last closed bar of `series`.
///
/// The regression runs over every fetched bar, open one included, and only the
/// second-to-last bar's flags are read.
pub fn closed_bar_signal(engine: &RegressionEngine, series: &PriceSeries) -> Option<TurningPoint> {
    if series.len() < 3 {
        return None;
    }
    engine.calculate(&series.closes()).last_closed_signal()
}

pub struct SignalScanner {
    context: MonitorContext,
    engine: RegressionEngine,
    config: ScannerConfig,
}

impl SignalScanner {
    pub fn new(context: MonitorContext, config: ScannerConfig) -> Result<Self> {
        config.kernel.validate()?;
        Ok(Self {
            context,
            engine: RegressionEngine::new(config.kernel),
            config,
        })
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Scan every symbol `chat` watches on each of `horizons`.
    ///
    /// Fails only when the user's subscription or config cannot be read; a failed
    /// pair is recorded in [`ScanOutcome::failures`] and the rest still run.
    pub async fn scan_user(&self, chat: ChatId, horizons: &[Horizon]) -> Result<ScanOutcome> {
        let symbols = self.context.store.list_symbols(chat).await?;
        let market = self.context.store.get_or_create(chat).await?.market();

        let pairs: Vec<(String, Horizon)> = symbols
            .iter()
            .flat_map(|symbol| horizons.iter().map(move |h| (symbol.clone(), *h)))
            .collect();

        let provider = &self.context.provider;
        let fetch_timeout = self.config.fetch_timeout;
        let bar_limit = self.config.bar_limit;

        let mut fetched: Vec<(usize, String, Horizon, std::result::Result<PriceSeries, ProviderError>)> =
            stream::iter(pairs.into_iter().enumerate())
                .map(|(index, (symbol, horizon))| async move {
                    let result = with_timeout(
                        &symbol,
                        fetch_timeout,
                        provider.fetch_series(&symbol, horizon.timeframe(), bar_limit, market),
                    )
                    .await;
                    (index, symbol, horizon, result)
                })
                .buffer_unordered(self.config.max_concurrent_fetches.max(1))
                .collect()
                .await;
        fetched.sort_by_key(|(index, ..)| *index);

        let mut outcome = ScanOutcome {
            pairs_checked: fetched.len(),
            ..ScanOutcome::default()
        };

        for (_, symbol, horizon, result) in fetched {
            match result {
                Ok(series) => {
                    let Some(direction) = closed_bar_signal(&self.engine, &series) else {
                        continue;
                    };
                    let price = series.last().map(|bar| bar.close).unwrap_or(f64::NAN);
                    debug!("{} {} {}: {} at {}", chat, symbol, horizon, direction, price);
                    outcome.events.push(TrendEvent {
                        symbol,
                        horizon,
                        direction,
                        price,
                        exchange: provider.name().to_string(),
                    });
                }
                Err(error) => {
                    warn!(
                        "⚠️ Signal check failed for {} {} ({}): {}",
                        symbol, horizon, chat, error
                    );
                    outcome.failures.push(ScanFailure {
                        symbol,
                        horizon,
                        error,
                    });
                }
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::series_from_closes;
    use trendline_regression::Kernel;
    use trendline_types::Timeframe;

    fn engine() -> RegressionEngine {
        RegressionEngine::new(KernelSpec::new(Kernel::Laplace, 2, 2.0, true).unwrap())
    }

    #[test]
    fn test_render_event() {
        let event = TrendEvent {
            symbol: "BTC/USDT".to_string(),
            horizon: Horizon::H4,
            direction: TurningPoint::Up,
            price: 50123.4,
            exchange: "binance".to_string(),
        };
        assert_eq!(
            event.render(),
            "📈 Binance: Signal for BTC/USDT: 50123.4 in timeframe 4h is up"
        );
    }

    #[test]
    fn test_message_batches_lines() {
        let outcome = ScanOutcome {
            events: vec![
                TrendEvent {
                    symbol: "BTC/USDT".to_string(),
                    horizon: Horizon::H2,
                    direction: TurningPoint::Up,
                    price: 1.5,
                    exchange: "binance".to_string(),
                },
                TrendEvent {
                    symbol: "ETH/USDT".to_string(),
                    horizon: Horizon::D1,
                    direction: TurningPoint::Down,
                    price: 2.0,
                    exchange: "binance".to_string(),
                },
            ],
            failures: vec![ScanFailure {
                symbol: "XRP/USDT".to_string(),
                horizon: Horizon::H4,
                error: ProviderError::Upstream {
                    symbol: "XRP/USDT".to_string(),
                    message: "HTTP 503".to_string(),
                },
            }],
            pairs_checked: 3,
        };

        assert_eq!(
            outcome.message(false).unwrap(),
            "📈 Binance: Signal for BTC/USDT: 1.5 in timeframe 2h is up\n\
             📉 Binance: Signal for ETH/USDT: 2 in timeframe 1d is down"
        );
        assert!(outcome
            .message(true)
            .unwrap()
            .ends_with("⚠️ Error checking signals for XRP/USDT in timeframe 4h"));
        assert_eq!(ScanOutcome::default().message(true), None);
    }

    #[test]
    fn test_closed_bar_signal_reads_second_to_last_bar() {
        // Up flag on index 8 of the full run; dropping the open bar first loses it
        let closes = [10.0, 9.0, 8.0, 7.0, 6.0, 5.0, 4.0, 0.0, 2.0, 5.0];
        let series = series_from_closes("BTC/USDT", Timeframe::H4, &closes);
        assert_eq!(closed_bar_signal(&engine(), &series), Some(TurningPoint::Up));
    }

    #[test]
    fn test_closed_bar_signal_skips_turn_on_open_bar() {
        let closes = [10.0, 9.0, 8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0, 1.5, 3.0];
        let series = series_from_closes("BTC/USDT", Timeframe::H4, &closes);
        assert_eq!(closed_bar_signal(&engine(), &series), None);
    }

    #[test]
    fn test_closed_bar_signal_holds_across_open_bar_prices() {
        let closed = [
            30.0, 28.0, 26.0, 24.0, 22.0, 20.0, 18.0, 16.0, 14.0, 12.0, 2.0, 14.0,
        ];
        for open in [7.0, 12.6, 14.0, 15.4, 21.0] {
            let mut closes = closed.to_vec();
            closes.push(open);
            let series = series_from_closes("BTC/USDT", Timeframe::H4, &closes);
            assert_eq!(
                closed_bar_signal(&engine(), &series),
                Some(TurningPoint::Up),
                "open bar {}",
                open
            );
        }
    }

    #[test]
    fn test_closed_bar_signal_needs_two_closed_bars() {
        let series = series_from_closes("BTC/USDT", Timeframe::H4, &[1.0, 2.0]);
        assert_eq!(closed_bar_signal(&engine(), &series), None);
    }
}
