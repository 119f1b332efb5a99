use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::domain::{Countdown, Gauge, ReportedStatus, Status, StatusSample};
use crate::ports::{DisplaySurface, ElementId, StatusSource};

use super::render::{set_gauge, set_status};

const COUNTDOWN_PERIOD: Duration = Duration::from_secs(1);

/// Where the refresh cycle currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Fetching,
    Rendering,
    Failed,
}

/// Result of one refresh tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Gauges and banner were updated
    Rendered,
    /// The sampler is still warming up; previous readings stay on screen
    SkippedWarmingUp,
    /// Fetch or payload failure; banner forced to Critical
    Failed,
    /// Another fetch was still outstanding; nothing was done
    Busy,
}

/// Polls a status source and keeps a display surface up to date.
///
/// Owns two timers: the refresh cycle and a one-second countdown. They are
/// started together by [`Poller::start`] and are not synchronised with each
/// other. Tests can skip the timers and call [`Poller::refresh`] and
/// [`Poller::countdown_tick`] directly.
pub struct Poller {
    source: Arc<dyn StatusSource>,
    surface: Arc<dyn DisplaySurface>,
    refresh_interval: Duration,
    countdown: Mutex<Countdown>,
    state: Mutex<RefreshState>,
    in_flight: AtomicBool,
    timers: Mutex<Vec<JoinHandle<()>>>,
}

/// Holds the single-flight slot; releases it even if the refresh future is dropped
struct InFlight<'a> {
    poller: &'a Poller,
}

impl<'a> InFlight<'a> {
    fn acquire(poller: &'a Poller) -> Option<Self> {
        poller
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { poller })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.poller.set_state(RefreshState::Idle);
        self.poller.in_flight.store(false, Ordering::Release);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Poller {
    pub fn new(
        source: Arc<dyn StatusSource>,
        surface: Arc<dyn DisplaySurface>,
        refresh_interval: Duration,
    ) -> Self {
        let refresh_interval = refresh_interval.max(COUNTDOWN_PERIOD);
        let countdown_start = u32::try_from(refresh_interval.as_secs()).unwrap_or(u32::MAX);

        Self {
            source,
            surface,
            refresh_interval,
            countdown: Mutex::new(Countdown::new(countdown_start)),
            state: Mutex::new(RefreshState::Idle),
            in_flight: AtomicBool::new(false),
            timers: Mutex::new(Vec::new()),
        }
    }

    pub fn state(&self) -> RefreshState {
        *lock(&self.state)
    }

    fn set_state(&self, state: RefreshState) {
        *lock(&self.state) = state;
    }

    /// Run one refresh cycle. At most one runs at a time.
    pub async fn refresh(&self) -> RefreshOutcome {
        let Some(_slot) = InFlight::acquire(self) else {
            debug!("Previous refresh still outstanding, skipping tick");
            return RefreshOutcome::Busy;
        };

        self.set_state(RefreshState::Fetching);
        match self.source.fetch_status().await {
            Ok(sample) => self.apply(sample),
            Err(e) => {
                error!("Refresh error: {}", e);
                self.set_state(RefreshState::Failed);
                set_status(self.surface.as_ref(), Status::Critical);
                RefreshOutcome::Failed
            }
        }
    }

    fn apply(&self, sample: StatusSample) -> RefreshOutcome {
        let status = sample.status.effective();
        if status == Status::WarmingUp {
            info!("Sampler warming up, keeping previous readings");
            return RefreshOutcome::SkippedWarmingUp;
        }

        match &sample.status {
            ReportedStatus::Unrecognized(label) => {
                warn!("Unrecognized status {:?}, displaying as {}", label, status)
            }
            ReportedStatus::Missing => warn!("Payload has no status, displaying as {}", status),
            ReportedStatus::Known(_) => {}
        }

        self.set_state(RefreshState::Rendering);
        set_gauge(self.surface.as_ref(), Gauge::Cpu, sample.cpu_or_zero());
        set_gauge(self.surface.as_ref(), Gauge::Mem, sample.mem_or_zero());
        set_status(self.surface.as_ref(), status);

        debug!(
            cpu = ?sample.cpu,
            mem = ?sample.mem,
            disk = ?sample.disk,
            uptime = ?sample.uptime,
            bytes_sent = sample.net.map(|n| n.bytes_sent),
            bytes_recv = sample.net.map(|n| n.bytes_recv),
            "Rendered {}",
            status
        );
        RefreshOutcome::Rendered
    }

    /// Advance the countdown by one second and show it
    pub fn countdown_tick(&self) {
        let text = {
            let mut countdown = lock(&self.countdown);
            countdown.tick();
            countdown.text()
        };
        self.surface.set_text(ElementId::Next, &text);
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        !lock(&self.timers).is_empty()
    }

    /// Start both timers. The first refresh fires immediately. No-op if already running.
    pub fn start(self: &Arc<Self>) {
        let mut timers = lock(&self.timers);
        if !timers.is_empty() {
            return;
        }

        let text = lock(&self.countdown).text();
        self.surface.set_text(ElementId::Next, &text);

        let poller = Arc::clone(self);
        timers.push(tokio::spawn(async move {
            let mut ticker = time::interval(poller.refresh_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // Each tick gets its own task so a hung fetch cannot stall the timer;
            // dropping the set on stop aborts whatever is still outstanding
            let mut refreshes = JoinSet::new();
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let poller = Arc::clone(&poller);
                        refreshes.spawn(async move { poller.refresh().await });
                    }
                    Some(_) = refreshes.join_next(), if !refreshes.is_empty() => {}
                }
            }
        }));

        let poller = Arc::clone(self);
        timers.push(tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + COUNTDOWN_PERIOD, COUNTDOWN_PERIOD);
            loop {
                ticker.tick().await;
                poller.countdown_tick();
            }
        }));

        info!("Polling every {}s", self.refresh_interval.as_secs());
    }

    /// Cancel both timers and any refresh still in progress
    pub fn stop(&self) {
        let timers: Vec<_> = lock(&self.timers).drain(..).collect();
        if timers.is_empty() {
            return;
        }
        for timer in timers {
            timer.abort();
        }
        info!("Polling stopped (refresh state: {:?})", self.state());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use crate::adapters::surface::MemorySurface;
    use crate::domain::{PayloadError, Severity};
    use crate::ports::FetchError;

    /// Replays canned responses; answers OK once the script runs out
    struct ScriptedSource {
        script: Mutex<VecDeque<Result<StatusSample, FetchError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<StatusSample, FetchError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StatusSource for ScriptedSource {
        async fn fetch_status(&self) -> Result<StatusSample, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            lock(&self.script)
                .pop_front()
                .unwrap_or_else(|| Ok(sample(r#"{"status":"OK","cpu":1,"mem":1}"#)))
        }
    }

    /// Blocks every fetch until released
    struct GatedSource {
        gate: Notify,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl StatusSource for GatedSource {
        async fn fetch_status(&self) -> Result<StatusSample, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            Ok(sample(r#"{"status":"OK","cpu":10,"mem":20}"#))
        }
    }

    fn sample(json: &str) -> StatusSample {
        StatusSample::from_json(json.as_bytes()).unwrap()
    }

    fn poller_with(source: Arc<dyn StatusSource>) -> (Arc<Poller>, Arc<MemorySurface>) {
        let surface = Arc::new(MemorySurface::new());
        let poller = Arc::new(Poller::new(source, surface.clone(), Duration::from_secs(3)));
        (poller, surface)
    }

    #[tokio::test]
    async fn test_warning_sample_renders() {
        let source = ScriptedSource::new(vec![Ok(sample(r#"{"status":"Warning","cpu":55,"mem":72}"#))]);
        let (poller, surface) = poller_with(source);

        assert_eq!(poller.refresh().await, RefreshOutcome::Rendered);
        assert_eq!(surface.text(ElementId::CpuVal).as_deref(), Some("55%"));
        assert_eq!(surface.text(ElementId::MemVal).as_deref(), Some("72%"));
        assert_eq!(surface.width(ElementId::CpuBar), Some(55.0));
        assert_eq!(surface.width(ElementId::MemBar), Some(72.0));
        assert_eq!(surface.text(ElementId::Status).as_deref(), Some("Warning"));
        assert_eq!(surface.severity(ElementId::AlertBar), Some(Severity::Warn));
        assert_eq!(surface.width(ElementId::AlertBar), Some(66.0));
        assert_eq!(poller.state(), RefreshState::Idle);
    }

    #[tokio::test]
    async fn test_warming_up_touches_nothing() {
        let source = ScriptedSource::new(vec![Ok(sample(r#"{"status":"WarmingUp"}"#))]);
        let (poller, surface) = poller_with(source);

        assert_eq!(poller.refresh().await, RefreshOutcome::SkippedWarmingUp);
        assert_eq!(surface.mutations(), 0);
        assert_eq!(poller.state(), RefreshState::Idle);
    }

    #[tokio::test]
    async fn test_warming_up_keeps_previous_readings() {
        let source = ScriptedSource::new(vec![
            Ok(sample(r#"{"status":"Critical","cpu":95,"mem":40}"#)),
            Ok(sample(r#"{"status":"WarmingUp"}"#)),
        ]);
        let (poller, surface) = poller_with(source);

        poller.refresh().await;
        let before = surface.mutations();
        assert_eq!(poller.refresh().await, RefreshOutcome::SkippedWarmingUp);
        assert_eq!(surface.mutations(), before);
        assert_eq!(surface.text(ElementId::CpuVal).as_deref(), Some("95%"));
        assert_eq!(surface.text(ElementId::Status).as_deref(), Some("Critical"));
    }

    #[tokio::test]
    async fn test_failure_forces_critical() {
        let source = ScriptedSource::new(vec![
            Ok(sample(r#"{"status":"OK","cpu":12,"mem":34}"#)),
            Err(FetchError::HttpStatus(500)),
            Err(FetchError::Transport("connection refused".into())),
        ]);
        let (poller, surface) = poller_with(source);

        assert_eq!(poller.refresh().await, RefreshOutcome::Rendered);
        assert_eq!(surface.severity(ElementId::AlertBar), Some(Severity::Ok));

        for _ in 0..2 {
            assert_eq!(poller.refresh().await, RefreshOutcome::Failed);
            assert_eq!(surface.text(ElementId::Status).as_deref(), Some("Critical"));
            assert_eq!(surface.severity(ElementId::AlertBar), Some(Severity::Crit));
            assert_eq!(surface.width(ElementId::AlertBar), Some(33.0));
            assert_eq!(poller.state(), RefreshState::Idle);
        }

        // Gauges keep the last good reading
        assert_eq!(surface.text(ElementId::CpuVal).as_deref(), Some("12%"));
    }

    #[tokio::test]
    async fn test_unreadable_extras_still_render() {
        let source = ScriptedSource::new(vec![
            Ok(sample(r#"{"status":"OK","cpu":12,"mem":34,"uptime":"x"}"#)),
            Ok(sample(r#"{"status":7,"cpu":40,"mem":50,"disk":"full"}"#)),
        ]);
        let (poller, surface) = poller_with(source);

        assert_eq!(poller.refresh().await, RefreshOutcome::Rendered);
        assert_eq!(surface.text(ElementId::CpuVal).as_deref(), Some("12%"));
        assert_eq!(surface.text(ElementId::MemVal).as_deref(), Some("34%"));
        assert_eq!(surface.text(ElementId::Status).as_deref(), Some("OK"));
        assert_eq!(surface.severity(ElementId::AlertBar), Some(Severity::Ok));

        assert_eq!(poller.refresh().await, RefreshOutcome::Rendered);
        assert_eq!(surface.text(ElementId::CpuVal).as_deref(), Some("40%"));
        assert_eq!(surface.severity(ElementId::AlertBar), Some(Severity::Ok));
    }

    #[tokio::test]
    async fn test_payload_error_is_a_failure() {
        let payload_err = StatusSample::from_json(b"not json").unwrap_err();
        assert!(matches!(payload_err, PayloadError::Malformed(_)));

        let source = ScriptedSource::new(vec![Err(FetchError::from(payload_err))]);
        let (poller, surface) = poller_with(source);

        assert_eq!(poller.refresh().await, RefreshOutcome::Failed);
        assert_eq!(surface.text(ElementId::Status).as_deref(), Some("Critical"));
    }

    #[tokio::test]
    async fn test_missing_fields_default() {
        let source = ScriptedSource::new(vec![
            Ok(sample(r#"{"cpu":250}"#)),
            Ok(sample(r#"{"status":"Bogus","mem":-4}"#)),
        ]);
        let (poller, surface) = poller_with(source);

        assert_eq!(poller.refresh().await, RefreshOutcome::Rendered);
        assert_eq!(surface.text(ElementId::CpuVal).as_deref(), Some("100%"));
        assert_eq!(surface.text(ElementId::MemVal).as_deref(), Some("0%"));
        assert_eq!(surface.text(ElementId::Status).as_deref(), Some("OK"));

        assert_eq!(poller.refresh().await, RefreshOutcome::Rendered);
        assert_eq!(surface.text(ElementId::CpuVal).as_deref(), Some("0%"));
        assert_eq!(surface.text(ElementId::MemVal).as_deref(), Some("0%"));
        assert_eq!(surface.severity(ElementId::AlertBar), Some(Severity::Ok));
    }

    #[tokio::test]
    async fn test_single_flight() {
        let source = Arc::new(GatedSource {
            gate: Notify::new(),
            calls: AtomicUsize::new(0),
        });
        let (poller, surface) = poller_with(source.clone());

        let first = tokio::spawn({
            let poller = Arc::clone(&poller);
            async move { poller.refresh().await }
        });
        while source.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        assert_eq!(poller.state(), RefreshState::Fetching);

        assert_eq!(poller.refresh().await, RefreshOutcome::Busy);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        source.gate.notify_one();
        assert_eq!(first.await.unwrap(), RefreshOutcome::Rendered);
        assert_eq!(surface.text(ElementId::MemVal).as_deref(), Some("20%"));

        // Slot is free again
        let second = tokio::spawn({
            let poller = Arc::clone(&poller);
            async move { poller.refresh().await }
        });
        while source.calls.load(Ordering::SeqCst) == 1 {
            tokio::task::yield_now().await;
        }
        source.gate.notify_one();
        assert_eq!(second.await.unwrap(), RefreshOutcome::Rendered);
    }

    #[tokio::test]
    async fn test_dropped_refresh_releases_slot() {
        let source = Arc::new(GatedSource {
            gate: Notify::new(),
            calls: AtomicUsize::new(0),
        });
        let (poller, _surface) = poller_with(source.clone());

        let pending = tokio::spawn({
            let poller = Arc::clone(&poller);
            async move { poller.refresh().await }
        });
        while source.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        pending.abort();
        let _ = pending.await;

        assert_eq!(poller.state(), RefreshState::Idle);
        assert!(!poller.in_flight.load(Ordering::SeqCst));
    }

    #[test]
    fn test_countdown_ticks_independently() {
        let source = ScriptedSource::new(vec![]);
        let (poller, surface) = poller_with(source.clone());

        let mut seen = Vec::new();
        for _ in 0..4 {
            poller.countdown_tick();
            seen.push(surface.text(ElementId::Next).unwrap());
        }
        assert_eq!(
            seen,
            vec![
                "Next update in 2s",
                "Next update in 1s",
                "Next update in 3s",
                "Next update in 2s",
            ]
        );
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timers_drive_refresh_and_countdown() {
        let source = ScriptedSource::new(vec![Err(FetchError::HttpStatus(503))]);
        let (poller, surface) = poller_with(source.clone());

        poller.start();
        assert!(poller.is_running());
        assert_eq!(surface.text(ElementId::Next).as_deref(), Some("Next update in 3s"));

        // Refresh fires at 0s and 3s; countdown at 1s, 2s, 3s
        time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(source.calls(), 2);
        assert_eq!(surface.text(ElementId::Next).as_deref(), Some("Next update in 3s"));
        assert_eq!(surface.text(ElementId::Status).as_deref(), Some("OK"));

        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(surface.text(ElementId::Next).as_deref(), Some("Next update in 2s"));

        poller.stop();
        assert!(!poller.is_running());
        let calls = source.calls();
        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(source.calls(), calls);
        assert_eq!(surface.text(ElementId::Next).as_deref(), Some("Next update in 2s"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_twice_is_noop() {
        let source = ScriptedSource::new(vec![]);
        let (poller, _surface) = poller_with(source.clone());

        poller.start();
        poller.start();
        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(source.calls(), 1);
        poller.stop();
    }
}
