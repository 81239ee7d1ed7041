//! Sweep coordination
//!
//! Two independent loops share one [`MonitorContext`]:
//!
//! - **Alert sweep**: a short fixed tick. Each user is evaluated at most once per their
//!   own `alert_interval`, a cooldown shared by all of that user's rules.
//! - **Signal sweep**: fires on candle-close boundaries from [`HorizonSchedule`],
//!   scanning every horizon due at that instant in one pass.
//!
//! A failing user is logged and skipped, never ending the sweep. Stopping is
//! cooperative: each loop checks its running flag before the next user, and the
//! user in flight finishes or hits its timeout.

use crate::alerts::AlertEvaluator;
use crate::config::MonitorConfig;
use crate::context::MonitorContext;
use crate::error::{MonitorError, Result};
use crate::logging::LogEmoji;
use crate::metrics::{MetricsSnapshot, SweepMetrics};
use crate::scanner::{ScannerConfig, SignalScanner};
use crate::schedule::HorizonSchedule;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use trendline_types::{ChatId, Horizon};

/// Counts for one sweep pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Users the sweep started work on
    pub users_seen: usize,
    pub users_processed: usize,
    /// Alerting disabled or still cooling down
    pub users_skipped: usize,
    pub users_failed: usize,
    pub messages_sent: usize,
    pub send_failures: usize,
    /// A stop request ended the pass before every user was visited
    pub stopped_early: bool,
}

enum UserResult {
    Skipped,
    Processed { sent: usize, send_failures: usize },
}

pub struct Coordinator {
    context: MonitorContext,
    config: MonitorConfig,
    evaluator: AlertEvaluator,
    scanner: SignalScanner,
    cooldowns: RwLock<HashMap<ChatId, DateTime<Utc>>>,
    alerts_running: AtomicBool,
    signals_running: AtomicBool,
    alert_wake: Notify,
    signal_wake: Notify,
    metrics: SweepMetrics,
}

impl Coordinator {
    pub fn new(context: MonitorContext, config: MonitorConfig) -> Result<Self> {
        config.validate()?;

        let evaluator = AlertEvaluator::new(
            context.clone(),
            config.provider.fetch_timeout(),
            config.provider.max_concurrent_fetches,
        );
        let scanner = SignalScanner::new(
            context.clone(),
            ScannerConfig {
                kernel: config.signals.kernel,
                bar_limit: config.signals.bar_limit,
                fetch_timeout: config.provider.fetch_timeout(),
                max_concurrent_fetches: config.provider.max_concurrent_fetches,
                report_failures: config.signals.report_failures,
            },
        )?;

        Ok(Self {
            context,
            config,
            evaluator,
            scanner,
            cooldowns: RwLock::new(HashMap::new()),
            alerts_running: AtomicBool::new(true),
            signals_running: AtomicBool::new(true),
            alert_wake: Notify::new(),
            signal_wake: Notify::new(),
            metrics: SweepMetrics::new(),
        })
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn alerts_running(&self) -> bool {
        self.alerts_running.load(Ordering::Acquire)
    }

    pub fn signals_running(&self) -> bool {
        self.signals_running.load(Ordering::Acquire)
    }

    /// Last completed alert evaluation for `chat`
    pub fn last_evaluated(&self, chat: ChatId) -> Option<DateTime<Utc>> {
        self.cooldowns.read().get(&chat).copied()
    }

    /// Whether `chat`'s cooldown has elapsed at `now`
    pub fn is_due(&self, chat: ChatId, now: DateTime<Utc>, interval: chrono::Duration) -> bool {
        match self.last_evaluated(chat) {
            Some(last) => now - last >= interval,
            None => true,
        }
    }

    /// Spawn both loops, returning (alert loop, signal loop) handles
    pub fn start(self: &Arc<Self>) -> (JoinHandle<()>, JoinHandle<()>) {
        info!("{} Starting alert and signal sweeps", LogEmoji::START);

        let alerts = {
            let coordinator = Arc::clone(self);
            tokio::spawn(async move { coordinator.run_alert_loop().await })
        };
        let signals = {
            let coordinator = Arc::clone(self);
            tokio::spawn(async move { coordinator.run_signal_loop().await })
        };
        (alerts, signals)
    }

    pub fn stop_alerts(&self) {
        self.alerts_running.store(false, Ordering::Release);
        self.alert_wake.notify_one();
        info!("{} Alert sweep stop requested", LogEmoji::STOP);
    }

    pub fn stop_signals(&self) {
        self.signals_running.store(false, Ordering::Release);
        self.signal_wake.notify_one();
        info!("{} Signal sweep stop requested", LogEmoji::STOP);
    }

    pub fn shutdown(&self) {
        self.stop_alerts();
        self.stop_signals();
    }

    /// Tick the alert sweep every `alerts.tick_secs` until stopped
    pub async fn run_alert_loop(&self) {
        let mut interval = tokio::time::interval(self.config.alerts.tick());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while self.alerts_running() {
            tokio::select! {
                _ = interval.tick() => {}
                _ = self.alert_wake.notified() => continue,
            }
            if !self.alerts_running() {
                break;
            }
            self.run_alert_sweep(Utc::now()).await;
        }

        info!("{} Alert sweep stopped", LogEmoji::STOP);
    }

    /// One pass over every alert owner at `now`
    pub async fn run_alert_sweep(&self, now: DateTime<Utc>) -> SweepReport {
        self.metrics.increment_alert_ticks();
        let mut report = SweepReport::default();

        let owners = match self.context.store.alert_owners().await {
            Ok(owners) => owners,
            Err(e) => {
                warn!("{} Alert sweep could not list owners: {}", LogEmoji::WARNING, e);
                return report;
            }
        };

        let user_timeout = self.config.alerts.user_timeout();
        for &chat in &owners {
            if !self.alerts_running() {
                report.stopped_early = true;
                break;
            }
            report.users_seen += 1;

            let result = tokio::time::timeout(user_timeout, self.alert_user(chat, now))
                .await
                .unwrap_or_else(|_| {
                    Err(MonitorError::Timeout {
                        what: format!("alert evaluation for {}", chat),
                        after: user_timeout,
                    })
                });
            self.record(&mut report, chat, "alert", result);
        }

        // Users without rules no longer need a cooldown
        self.cooldowns.write().retain(|chat, _| owners.contains(chat));

        debug!(
            "{} Alert sweep: {} processed, {} skipped, {} failed, {} sent",
            LogEmoji::ALERT,
            report.users_processed,
            report.users_skipped,
            report.users_failed,
            report.messages_sent
        );
        report
    }

    async fn alert_user(&self, chat: ChatId, now: DateTime<Utc>) -> Result<UserResult> {
        let config = self.context.store.get_or_create(chat).await?;
        if !config.alerts_enabled() {
            return Ok(UserResult::Skipped);
        }
        if !self.is_due(chat, now, config.alert_interval_duration()) {
            return Ok(UserResult::Skipped);
        }

        let outcome = self.evaluator.evaluate_user(chat, &config, now).await?;

        let mut sent = 0;
        let mut send_failures = 0;
        for trigger in &outcome.triggers {
            match self.context.sink.send(chat, &trigger.render()).await {
                Ok(()) => sent += 1,
                Err(e) => {
                    warn!("Failed to send alert for {} to {}: {}", trigger.symbol, chat, e);
                    send_failures += 1;
                }
            }
        }

        self.cooldowns.write().insert(chat, now);
        Ok(UserResult::Processed {
            sent,
            send_failures,
        })
    }

    /// Run the signal sweep on each horizon boundary until stopped
    pub async fn run_signal_loop(&self) {
        let settle_delay = self.config.signals.settle_delay();
        let mut schedule = HorizonSchedule::new(&self.config.signals.horizons, Utc::now());

        while self.signals_running() {
            let Some(fire_at) = schedule.peek_next() else {
                break;
            };
            let wait = (fire_at - Utc::now())
                .to_std()
                .unwrap_or(Duration::ZERO)
                + settle_delay;
            info!(
                "{} Next signal sweep at {} (+{:?} settle)",
                LogEmoji::CLOCK,
                fire_at.format("%Y-%m-%d %H:%M UTC"),
                settle_delay
            );

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = self.signal_wake.notified() => continue,
            }
            if !self.signals_running() {
                break;
            }

            let Some((_, horizons)) = schedule.pop_due() else {
                break;
            };
            self.run_signal_sweep(&horizons).await;
        }

        info!("{} Signal sweep stopped", LogEmoji::STOP);
    }

    /// One pass over every monitor owner for `horizons`
    pub async fn run_signal_sweep(&self, horizons: &[Horizon]) -> SweepReport {
        self.metrics.increment_signal_ticks();
        let mut report = SweepReport::default();

        let owners = match self.context.store.monitor_owners().await {
            Ok(owners) => owners,
            Err(e) => {
                warn!("{} Signal sweep could not list owners: {}", LogEmoji::WARNING, e);
                return report;
            }
        };

        info!(
            "{} Signal sweep for {:?} across {} users",
            LogEmoji::SIGNAL,
            horizons.iter().map(ToString::to_string).collect::<Vec<_>>(),
            owners.len()
        );

        let user_timeout = self.config.signals.user_timeout();
        for chat in owners {
            if !self.signals_running() {
                report.stopped_early = true;
                break;
            }
            report.users_seen += 1;

            let result = tokio::time::timeout(user_timeout, self.signal_user(chat, horizons))
                .await
                .unwrap_or_else(|_| {
                    Err(MonitorError::Timeout {
                        what: format!("signal scan for {}", chat),
                        after: user_timeout,
                    })
                });
            self.record(&mut report, chat, "signal", result);
        }

        info!(
            "{} Signal sweep done: {} processed, {} failed, {} messages",
            LogEmoji::CHART,
            report.users_processed,
            report.users_failed,
            report.messages_sent
        );
        report
    }

    async fn signal_user(&self, chat: ChatId, horizons: &[Horizon]) -> Result<UserResult> {
        let outcome = self.scanner.scan_user(chat, horizons).await?;
        let Some(text) = outcome.message(self.scanner.config().report_failures) else {
            return Ok(UserResult::Processed {
                sent: 0,
                send_failures: 0,
            });
        };

        match self.context.sink.send(chat, &text).await {
            Ok(()) => Ok(UserResult::Processed {
                sent: 1,
                send_failures: 0,
            }),
            Err(e) => {
                warn!("Failed to send signals to {}: {}", chat, e);
                Ok(UserResult::Processed {
                    sent: 0,
                    send_failures: 1,
                })
            }
        }
    }

    fn record(&self, report: &mut SweepReport, chat: ChatId, sweep: &str, result: Result<UserResult>) {
        match result {
            Ok(UserResult::Skipped) => {
                report.users_skipped += 1;
                self.metrics.increment_skipped();
            }
            Ok(UserResult::Processed {
                sent,
                send_failures,
            }) => {
                report.users_processed += 1;
                report.messages_sent += sent;
                report.send_failures += send_failures;
                self.metrics.increment_processed();
                self.metrics.add_events_sent(sent as u64);
                self.metrics.add_send_failures(send_failures as u64);
            }
            Err(e) => {
                report.users_failed += 1;
                self.metrics.increment_failed();
                error!("{} {} sweep failed for {}: {}", LogEmoji::WARNING, sweep, chat, e);
            }
        }
    }
}
