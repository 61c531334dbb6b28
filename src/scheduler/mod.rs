pub mod boundary;
pub mod clock;

use chrono::Local;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, timeout, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::cache::{active_cutoff, ActiveRegionRegistry};
use crate::config::Config;
use crate::service::{RefreshError, WeatherService};
use boundary::delay_to_next_boundary;
use clock::Clock;

/// Fixed period between refreshes once the first boundary has fired
pub const REFRESH_PERIOD: Duration = Duration::from_secs(12 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    Idle,
    Armed,
    Running,
    Stopped,
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub active_window_days: i64,
    pub inter_call_delay: Duration,
    pub region_timeout: Duration,
    pub period: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            active_window_days: 10,
            inter_call_delay: Duration::from_millis(100),
            region_timeout: Duration::from_secs(30),
            period: REFRESH_PERIOD,
        }
    }
}

impl From<&Config> for SchedulerConfig {
    fn from(config: &Config) -> Self {
        Self {
            active_window_days: config.active_window_days,
            inter_call_delay: config.refresh_delay,
            region_timeout: config.refresh_region_timeout,
            period: REFRESH_PERIOD,
        }
    }
}

/// Outcome counters of one refresh cycle
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RefreshSummary {
    pub total: usize,
    pub success_count: usize,
    pub error_count: usize,
    pub swept: u64,
}

/// Background refresher for all active regions.
///
/// Armed by `start` for the next 00:00/12:00 local boundary, then every
/// `period` after that. Regions are refreshed one at a time with a pause in
/// between, and one failing region never aborts the batch. `stop` cancels
/// future runs only; a refresh already in progress completes.
pub struct RefreshScheduler {
    inner: Arc<Inner>,
    shutdown: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

struct Inner {
    service: Arc<WeatherService>,
    regions: Arc<dyn ActiveRegionRegistry>,
    clock: Arc<dyn Clock>,
    config: SchedulerConfig,
    state: watch::Sender<SchedulerState>,
    armed: AtomicBool,
    run_lock: tokio::sync::Mutex<()>,
}

impl RefreshScheduler {
    pub fn new(
        service: Arc<WeatherService>,
        regions: Arc<dyn ActiveRegionRegistry>,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
    ) -> Self {
        let (state, _) = watch::channel(SchedulerState::Idle);
        Self {
            inner: Arc::new(Inner {
                service,
                regions,
                clock,
                config,
                state,
                armed: AtomicBool::new(false),
                run_lock: tokio::sync::Mutex::new(()),
            }),
            shutdown: CancellationToken::new(),
            task: Mutex::new(None),
        }
    }

    pub fn state(&self) -> SchedulerState {
        *self.inner.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SchedulerState> {
        self.inner.state.subscribe()
    }

    /// Arm the timer for the next boundary.
    ///
    /// Ignored once armed or stopped. A manual batch in progress does not
    /// block arming; its completion publishes `Armed`.
    pub fn start(&self) {
        if self.shutdown.is_cancelled() {
            warn!("Refresh scheduler start ignored after stop");
            return;
        }
        if self
            .inner
            .armed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Refresh scheduler already armed");
            return;
        }
        self.inner.state.send_if_modified(|state| {
            if *state == SchedulerState::Idle {
                *state = SchedulerState::Armed;
                true
            } else {
                false
            }
        });

        let inner = self.inner.clone();
        let shutdown = self.shutdown.clone();
        let handle = tokio::spawn(async move {
            inner.run(shutdown).await;
        });

        *self.task.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
    }

    /// Cancel pending timers. Idempotent; never interrupts a running refresh.
    pub fn stop(&self) {
        self.inner.armed.store(false, Ordering::SeqCst);
        self.shutdown.cancel();
        let previous = self.inner.state.send_replace(SchedulerState::Stopped);
        if previous != SchedulerState::Stopped {
            info!("Refresh scheduler stopped (was {:?})", previous);
        }
    }

    /// Wait for the timer task to exit, letting an in-flight refresh finish
    pub async fn wait(&self) {
        let handle = self.task.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("Refresh scheduler task failed: {}", e);
            }
        }
    }

    /// Run one refresh cycle now, outside the timer
    pub async fn trigger_once(&self) -> RefreshSummary {
        info!("Manual refresh triggered");
        self.inner.perform_refresh().await
    }
}

impl Inner {
    async fn run(&self, shutdown: CancellationToken) {
        let delay = delay_to_next_boundary(&self.clock.now().with_timezone(&Local));
        info!("Refresh scheduler armed, first run in {:?}", delay);

        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Refresh scheduler cancelled before first run");
                return;
            }
            _ = sleep(delay) => {}
        }

        let fired_at = Instant::now();
        self.perform_refresh().await;

        let mut ticker = interval_at(fired_at + self.config.period, self.config.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Shutting down refresh scheduler");
                    break;
                }
                _ = ticker.tick() => {
                    self.perform_refresh().await;
                }
            }
        }
    }

    async fn perform_refresh(&self) -> RefreshSummary {
        // One batch at a time, whether timer-driven or manual
        let _guard = self.run_lock.lock().await;
        self.enter_running();

        let cutoff = active_cutoff(self.clock.now(), self.config.active_window_days);
        let regions = match self.regions.list_active(cutoff).await {
            Ok(regions) => regions,
            Err(e) => {
                error!("Failed to list active regions: {}", e);
                Vec::new()
            }
        };

        let mut summary = RefreshSummary {
            total: regions.len(),
            ..Default::default()
        };
        info!("Refreshing {} active regions", summary.total);

        for (i, key) in regions.iter().enumerate() {
            let outcome = match timeout(self.config.region_timeout, self.service.refresh_region(key)).await {
                Ok(result) => result,
                Err(_) => Err(RefreshError::Timeout(self.config.region_timeout)),
            };

            match outcome {
                Ok(()) => summary.success_count += 1,
                Err(e) => {
                    summary.error_count += 1;
                    error!(key = %key, "Failed to refresh region: {}", e);
                }
            }

            // Pace upstream calls
            if i + 1 < regions.len() {
                sleep(self.config.inter_call_delay).await;
            }
        }

        let sweep_cutoff = active_cutoff(self.clock.now(), self.config.active_window_days);
        match self.regions.sweep(sweep_cutoff).await {
            Ok(removed) => {
                summary.swept = removed;
                if removed > 0 {
                    debug!("Swept {} inactive regions", removed);
                }
            }
            Err(e) => warn!("Failed to sweep inactive regions: {}", e),
        }

        info!(
            total = summary.total,
            success = summary.success_count,
            errors = summary.error_count,
            swept = summary.swept,
            "Refresh cycle completed"
        );

        self.leave_running();
        summary
    }

    fn enter_running(&self) {
        self.state.send_if_modified(|state| {
            if *state == SchedulerState::Stopped {
                false
            } else {
                *state = SchedulerState::Running;
                true
            }
        });
    }

    fn leave_running(&self) {
        let next = if self.armed.load(Ordering::SeqCst) {
            SchedulerState::Armed
        } else {
            SchedulerState::Idle
        };
        self.state.send_if_modified(|state| {
            if *state == SchedulerState::Running {
                *state = next;
                true
            } else {
                false
            }
        });
    }
}
