//! Interval scheduler and engine facade
//!
//! The engine owns one runtime per catalog (the catalog plus its cursor,
//! cache, conditions, bindings, and schedules) and drives dispatch with
//! one tokio timer task per distinct interval group. Timer callbacks
//! select and render, then hand the finished [`Delivery`] to a single
//! delivery task; only that task calls the host [`Dispatcher`], so sends
//! never interleave across timers.
//!
//! Timer tasks hold the catalog *name*, not the runtime: every tick looks
//! the runtime up in the registry and silently skips if it is gone. That
//! keeps reconfiguration trivially safe: replacing a catalog swaps the
//! whole runtime under the registry lock, and stale timers fire into
//! nothing until the scheduler restarts.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, RenderCache, RotationCursor, TICKS_PER_SECOND};
use crate::conditions::{ConditionEvaluator, MessageCondition};
use crate::config::LoadedCatalog;
use crate::error::{ConfigError, Error, Result};
use crate::host::{
    Audience, Clock, Delivery, Dispatcher, PlaceholderSource, ServerStateProvider, TickRateSource,
};
use crate::placeholder::PlaceholderEngine;
use crate::schedule::MessageSchedule;

/// Milliseconds per tick assumed without a [`TickRateSource`].
const DEFAULT_MILLIS_PER_TICK: u64 = 1_000 / TICKS_PER_SECOND;

// ============================================================================
// Catalog runtime
// ============================================================================

/// Per-catalog mutable state: the catalog plus everything it owns.
struct CatalogRuntime {
    catalog: Catalog,
    cursor: RotationCursor,
    cache: RenderCache,
    conditions: ConditionEvaluator,
    bindings: HashMap<usize, String>,
    schedules: Vec<MessageSchedule>,
}

impl CatalogRuntime {
    /// Fresh runtime: cursor at zero, cache invalid until first use.
    fn new(loaded: LoadedCatalog) -> Self {
        let LoadedCatalog {
            catalog,
            conditions,
            bindings,
            schedules,
        } = loaded;

        let mut evaluator = ConditionEvaluator::new();
        evaluator.load(conditions);

        Self {
            catalog,
            cursor: RotationCursor::new(),
            cache: RenderCache::new(),
            conditions: evaluator,
            bindings,
            schedules,
        }
    }
}

type SharedRuntime = Arc<RwLock<CatalogRuntime>>;

// ============================================================================
// Timer groups
// ============================================================================

/// One timer's worth of work: a firing period plus what to do each tick.
#[derive(Debug, Clone, PartialEq, Eq)]
enum TimerGroup {
    /// Automatic rotation at the catalog default interval.
    Rotation { interval_ticks: u64 },
    /// Pinned schedules sharing one effective interval. Positions index
    /// into the runtime's schedule list.
    Scheduled {
        interval_ticks: u64,
        schedule_positions: Vec<usize>,
    },
}

impl TimerGroup {
    fn interval_ticks(&self) -> u64 {
        match self {
            Self::Rotation { interval_ticks } | Self::Scheduled { interval_ticks, .. } => {
                *interval_ticks
            }
        }
    }
}

/// Partition a catalog's schedules by effective interval.
///
/// Schedules with a custom interval form (or join) a group keyed by that
/// interval; everything else shares the catalog-default group. A catalog
/// with no schedules gets the single legacy rotation timer instead.
fn build_timer_groups(runtime: &CatalogRuntime) -> Vec<TimerGroup> {
    if runtime.schedules.is_empty() {
        return vec![TimerGroup::Rotation {
            interval_ticks: runtime.catalog.interval_ticks,
        }];
    }

    let mut by_interval: HashMap<u64, Vec<usize>> = HashMap::new();
    for (position, schedule) in runtime.schedules.iter().enumerate() {
        by_interval
            .entry(schedule.effective_interval(runtime.catalog.interval_ticks))
            .or_default()
            .push(position);
    }

    by_interval
        .into_iter()
        .map(|(interval_ticks, schedule_positions)| TimerGroup::Scheduled {
            interval_ticks,
            schedule_positions,
        })
        .collect()
}

// ============================================================================
// Shared state
// ============================================================================

struct EngineShared {
    catalogs: RwLock<HashMap<String, SharedRuntime>>,
    dispatcher: Arc<dyn Dispatcher>,
    state: Arc<dyn ServerStateProvider>,
    clock: Arc<dyn Clock>,
    placeholders: PlaceholderEngine,
    rng: Mutex<ChaCha8Rng>,
    millis_per_tick: u64,
}

impl EngineShared {
    async fn lookup(&self, name: &str) -> Option<SharedRuntime> {
        self.catalogs.read().await.get(name).cloned()
    }

    /// Run one selection cycle for `catalog` and render the result.
    ///
    /// `pinned` dispatches exactly that message index (schedule-driven,
    /// cursor untouched); `None` runs the catalog's own selection mode.
    /// Returns `None` when nothing is eligible; that is a skipped cycle,
    /// not an error.
    async fn dispatch_cycle(&self, catalog: &str, pinned: Option<usize>) -> Option<Delivery> {
        let runtime = self.lookup(catalog).await?;
        let mut guard = runtime.write().await;
        let runtime = &mut *guard;

        runtime.cache.ensure_valid(&runtime.catalog, |line| {
            self.placeholders
                .expand(line, self.state.as_ref(), self.clock.as_ref())
        });

        let CatalogRuntime {
            catalog,
            cursor,
            cache,
            conditions,
            bindings,
            ..
        } = runtime;

        let eligible = |index: usize| {
            cache.contains(index)
                && conditions.is_met(
                    bindings.get(&index).map(String::as_str),
                    self.state.as_ref(),
                )
        };

        let selected = match pinned {
            Some(index) => eligible(index).then_some(index),
            None if catalog.randomize => {
                let mut rng = self.rng.lock().await;
                RotationCursor::select_random(catalog.messages.len(), &eligible, &mut *rng)
            }
            None => cursor.select_sequential(catalog.messages.len(), &eligible),
        };

        let Some(index) = selected else {
            debug!(catalog = %catalog.name, "no eligible message this cycle");
            return None;
        };

        let segments = cache.get(index)?.to_vec();
        debug!(catalog = %catalog.name, index, "message selected");

        Some(Delivery {
            catalog: catalog.name.clone(),
            separator: catalog.separator.clone(),
            segments,
            audience: Audience::Everyone,
        })
    }
}

/// Timer task body: fire at the group's period (zero initial delay) until
/// aborted.
async fn run_timer(
    shared: Arc<EngineShared>,
    catalog: String,
    group: TimerGroup,
    tx: mpsc::UnboundedSender<Delivery>,
) {
    let millis = group
        .interval_ticks()
        .saturating_mul(shared.millis_per_tick)
        .max(1);
    let mut timer = tokio::time::interval(Duration::from_millis(millis));
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        timer.tick().await;

        match &group {
            TimerGroup::Rotation { .. } => {
                if let Some(delivery) = shared.dispatch_cycle(&catalog, None).await {
                    if tx.send(delivery).is_err() {
                        return;
                    }
                }
            }
            TimerGroup::Scheduled {
                schedule_positions, ..
            } => {
                let now = shared.clock.now();
                for &position in schedule_positions {
                    let pinned = {
                        let Some(runtime) = shared.lookup(&catalog).await else {
                            return;
                        };
                        let guard = runtime.read().await;
                        guard
                            .schedules
                            .get(position)
                            .filter(|schedule| schedule.is_active_at(now))
                            .map(|schedule| schedule.message_index)
                    };
                    if let Some(index) = pinned {
                        if let Some(delivery) = shared.dispatch_cycle(&catalog, Some(index)).await {
                            if tx.send(delivery).is_err() {
                                return;
                            }
                        }
                    }
                }
            }
        }
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Optional host capabilities handed to the engine at construction.
#[derive(Clone, Default)]
pub struct EngineOptions {
    /// Real tick length; absent means the default 50 ms tick.
    pub tick_rate: Option<Arc<dyn TickRateSource>>,
    /// External placeholder vocabulary.
    pub placeholders: Option<Arc<dyn PlaceholderSource>>,
}

/// The rotation and scheduling engine.
///
/// Holds any number of independent catalogs and drives their timers once
/// [`start`](Engine::start)ed. All state mutation goes through `&self`;
/// the engine is meant to live in an `Arc` shared with the host's
/// lifecycle code.
pub struct Engine {
    shared: Arc<EngineShared>,
    timer_tasks: Mutex<Vec<JoinHandle<()>>>,
    delivery_task: Mutex<Option<JoinHandle<()>>>,
    running: AtomicBool,
}

impl Engine {
    /// An engine wired to its host collaborators, with default options.
    pub fn new(
        dispatcher: Arc<dyn Dispatcher>,
        state: Arc<dyn ServerStateProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::with_options(dispatcher, state, clock, EngineOptions::default())
    }

    /// An engine with explicit optional capabilities.
    pub fn with_options(
        dispatcher: Arc<dyn Dispatcher>,
        state: Arc<dyn ServerStateProvider>,
        clock: Arc<dyn Clock>,
        options: EngineOptions,
    ) -> Self {
        let millis_per_tick = options
            .tick_rate
            .as_ref()
            .map(|source| source.millis_per_tick().max(1))
            .unwrap_or(DEFAULT_MILLIS_PER_TICK);

        let placeholders = match options.placeholders {
            Some(source) => PlaceholderEngine::with_source(source),
            None => PlaceholderEngine::new(),
        };

        Self {
            shared: Arc::new(EngineShared {
                catalogs: RwLock::new(HashMap::new()),
                dispatcher,
                state,
                clock,
                placeholders,
                rng: Mutex::new(ChaCha8Rng::from_entropy()),
                millis_per_tick,
            }),
            timer_tasks: Mutex::new(Vec::new()),
            delivery_task: Mutex::new(None),
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Names of every loaded catalog.
    pub async fn catalog_names(&self) -> Vec<String> {
        self.shared.catalogs.read().await.keys().cloned().collect()
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Load or replace one catalog.
    ///
    /// Replacement is atomic: the new runtime arrives with its cursor at
    /// zero and its cache invalid, and readers only ever see the old or
    /// the new runtime. If the scheduler is running it restarts so the
    /// timer set matches the new configuration.
    pub async fn load_catalog(&self, loaded: LoadedCatalog) -> Result<()> {
        if !loaded.catalog.has_usable_messages() {
            return Err(Error::Config(ConfigError::NoMessages {
                name: loaded.catalog.name.clone(),
            }));
        }

        let name = loaded.catalog.name.clone();
        {
            let mut catalogs = self.shared.catalogs.write().await;
            catalogs.insert(
                name.clone(),
                Arc::new(RwLock::new(CatalogRuntime::new(loaded))),
            );
        }
        info!(catalog = %name, "catalog loaded");

        if self.is_running() {
            self.start().await;
        }
        Ok(())
    }

    /// Replace the named catalog's condition set.
    pub async fn load_conditions(
        &self,
        catalog: &str,
        conditions: HashMap<String, MessageCondition>,
    ) -> Result<()> {
        let runtime = self.runtime(catalog).await?;
        runtime.write().await.conditions.load(conditions);
        Ok(())
    }

    /// Replace the named catalog's message-to-condition bindings.
    pub async fn load_bindings(
        &self,
        catalog: &str,
        bindings: HashMap<usize, String>,
    ) -> Result<()> {
        let runtime = self.runtime(catalog).await?;
        runtime.write().await.bindings = bindings;
        Ok(())
    }

    /// Replace the named catalog's schedules.
    ///
    /// Restarts the scheduler when running, since the interval groups may
    /// have changed shape.
    pub async fn load_schedules(
        &self,
        catalog: &str,
        schedules: Vec<MessageSchedule>,
    ) -> Result<()> {
        let runtime = self.runtime(catalog).await?;
        runtime.write().await.schedules = schedules;

        if self.is_running() {
            self.start().await;
        }
        Ok(())
    }

    /// Replace the whole catalog set in response to a configuration
    /// reload.
    ///
    /// Every cursor resets, every cache starts invalid, and the scheduler
    /// restarts (when it was running) so no timer from the old
    /// configuration survives. Catalogs with no usable messages are
    /// skipped with a warning rather than failing the reload.
    pub async fn apply_reload(&self, loaded: Vec<LoadedCatalog>) {
        let was_running = self.is_running();
        self.stop().await;

        {
            let mut catalogs = self.shared.catalogs.write().await;
            catalogs.clear();
            for item in loaded {
                if !item.catalog.has_usable_messages() {
                    warn!(catalog = %item.catalog.name, "skipping catalog with no usable messages");
                    continue;
                }
                catalogs.insert(
                    item.catalog.name.clone(),
                    Arc::new(RwLock::new(CatalogRuntime::new(item))),
                );
            }
            info!(catalogs = catalogs.len(), "configuration reloaded");
        }

        if was_running {
            self.start().await;
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Start one timer task per interval group across all catalogs, plus
    /// the single delivery task.
    ///
    /// Always cancels every previously running timer first, so calling
    /// `start` again is a restart. Starting with no catalogs loaded is a
    /// warning no-op; the scheduler never runs against nothing.
    pub async fn start(&self) {
        self.stop().await;

        let (tx, mut rx) = mpsc::unbounded_channel::<Delivery>();
        let mut new_tasks = Vec::new();

        {
            let catalogs = self.shared.catalogs.read().await;
            if catalogs.is_empty() {
                warn!("no catalogs loaded, scheduler not started");
                return;
            }

            for (name, runtime) in catalogs.iter() {
                for group in build_timer_groups(&*runtime.read().await) {
                    debug!(
                        catalog = %name,
                        interval_ticks = group.interval_ticks(),
                        "starting timer"
                    );
                    new_tasks.push(tokio::spawn(run_timer(
                        Arc::clone(&self.shared),
                        name.clone(),
                        group,
                        tx.clone(),
                    )));
                }
            }
        }

        let dispatcher = Arc::clone(&self.shared.dispatcher);
        let delivery = tokio::spawn(async move {
            while let Some(delivery) = rx.recv().await {
                dispatcher.deliver(delivery).await;
            }
        });

        *self.timer_tasks.lock().await = new_tasks;
        *self.delivery_task.lock().await = Some(delivery);
        self.running.store(true, Ordering::SeqCst);
        info!("scheduler started");
    }

    /// Cancel every timer and the delivery task.
    ///
    /// Idempotent; once it returns, no further dispatch callback fires
    /// until the next `start`.
    pub async fn stop(&self) {
        let mut tasks = self.timer_tasks.lock().await;
        for task in tasks.drain(..) {
            task.abort();
        }
        drop(tasks);

        if let Some(task) = self.delivery_task.lock().await.take() {
            task.abort();
        }

        if self.running.swap(false, Ordering::SeqCst) {
            info!("scheduler stopped");
        }
    }

    // ------------------------------------------------------------------
    // Manual operations
    // ------------------------------------------------------------------

    /// Run one selection cycle immediately and deliver to everyone.
    pub async fn force_dispatch(&self, catalog: &str) -> Result<()> {
        self.force_dispatch_to(catalog, Audience::Everyone).await
    }

    /// Run one selection cycle immediately for an explicit audience.
    ///
    /// Selection exhaustion is a silent skip, exactly as on a timer tick;
    /// only an unknown catalog name is an error.
    pub async fn force_dispatch_to(&self, catalog: &str, audience: Audience) -> Result<()> {
        self.runtime(catalog).await?;

        if let Some(mut delivery) = self.shared.dispatch_cycle(catalog, None).await {
            delivery.audience = audience;
            self.shared.dispatcher.deliver(delivery).await;
        }
        Ok(())
    }

    /// Invalidate the named catalog's render cache. The next selection
    /// rebuilds it.
    pub async fn clear_cache(&self, catalog: &str) -> Result<()> {
        let runtime = self.runtime(catalog).await?;
        runtime.write().await.cache.invalidate();
        info!(catalog, "render cache cleared");
        Ok(())
    }

    async fn runtime(&self, name: &str) -> Result<SharedRuntime> {
        self.shared
            .lookup(name)
            .await
            .ok_or_else(|| Error::UnknownCatalog(name.to_string()))
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        // Best-effort cleanup so timer tasks do not outlive the engine.
        if let Ok(mut tasks) = self.timer_tasks.try_lock() {
            for task in tasks.drain(..) {
                task.abort();
            }
        }
        if let Ok(mut delivery) = self.delivery_task.try_lock() {
            if let Some(task) = delivery.take() {
                task.abort();
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
