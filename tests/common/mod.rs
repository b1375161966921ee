//! Shared test doubles for integration tests

use async_trait::async_trait;
use tracing_subscriber::EnvFilter;
use chrono::{NaiveDate, NaiveDateTime};
use crier::host::{Clock, Delivery, Dispatcher, ServerStateProvider, TickRateSource, Weather};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Route engine tracing to the test writer, honoring `RUST_LOG`. Safe to
/// call from every test; only the first call installs a subscriber.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Dispatcher that records every delivery it receives.
#[derive(Default)]
pub struct RecordingDispatcher {
    deliveries: Mutex<Vec<Delivery>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.deliveries.lock().unwrap().len()
    }

    /// Concatenated segment text of each delivery, in arrival order.
    pub fn texts(&self) -> Vec<String> {
        self.deliveries
            .lock()
            .unwrap()
            .iter()
            .map(|delivery| {
                delivery
                    .segments
                    .iter()
                    .map(|segment| segment.text.as_str())
                    .collect::<String>()
            })
            .collect()
    }
}

#[async_trait]
impl Dispatcher for RecordingDispatcher {
    async fn deliver(&self, delivery: Delivery) {
        self.deliveries.lock().unwrap().push(delivery);
    }
}

/// Server state with adjustable player count, weather, and time of day.
pub struct FakeServer {
    online: AtomicUsize,
    daytime: AtomicBool,
    weather: Mutex<Weather>,
    permissions: Mutex<HashSet<String>>,
    worlds: Mutex<HashSet<String>>,
}

impl FakeServer {
    pub fn new(online: usize) -> Self {
        Self {
            online: AtomicUsize::new(online),
            daytime: AtomicBool::new(true),
            weather: Mutex::new(Weather::Clear),
            permissions: Mutex::new(HashSet::new()),
            worlds: Mutex::new(HashSet::new()),
        }
    }

    pub fn set_online(&self, count: usize) {
        self.online.store(count, Ordering::SeqCst);
    }

    #[allow(dead_code)]
    pub fn set_weather(&self, weather: Weather) {
        *self.weather.lock().unwrap() = weather;
    }

    #[allow(dead_code)]
    pub fn set_daytime(&self, daytime: bool) {
        self.daytime.store(daytime, Ordering::SeqCst);
    }

    #[allow(dead_code)]
    pub fn grant_permission(&self, node: &str) {
        self.permissions.lock().unwrap().insert(node.to_string());
    }

    #[allow(dead_code)]
    pub fn populate_world(&self, world: &str) {
        self.worlds.lock().unwrap().insert(world.to_string());
    }
}

impl ServerStateProvider for FakeServer {
    fn online_player_count(&self) -> usize {
        self.online.load(Ordering::SeqCst)
    }

    fn max_player_count(&self) -> usize {
        100
    }

    fn server_name(&self) -> String {
        "TestServer".to_string()
    }

    fn any_player_has_permission(&self, permission: &str) -> bool {
        self.permissions.lock().unwrap().contains(permission)
    }

    fn any_player_in_world(&self, world: &str) -> bool {
        self.worlds.lock().unwrap().contains(world)
    }

    fn weather(&self) -> Weather {
        *self.weather.lock().unwrap()
    }

    fn is_daytime(&self) -> bool {
        self.daytime.load(Ordering::SeqCst)
    }
}

/// Clock pinned to an adjustable instant.
pub struct TestClock {
    now: Mutex<NaiveDateTime>,
}

impl TestClock {
    pub fn at(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Monday 2024-01-15, 12:00.
    pub fn monday_noon() -> Self {
        Self::at(
            NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        )
    }

    /// Saturday 2024-01-13, 12:00.
    #[allow(dead_code)]
    pub fn saturday_noon() -> Self {
        Self::at(
            NaiveDate::from_ymd_opt(2024, 1, 13)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        )
    }

    #[allow(dead_code)]
    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock().unwrap() = now;
    }
}

impl Clock for TestClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap()
    }
}

/// Millisecond ticks so interval timers fire fast enough for tests.
pub struct FastTicks;

impl TickRateSource for FastTicks {
    fn millis_per_tick(&self) -> u64 {
        1
    }
}
