//! Zep - debouncer 本体
//!
//! # 状態遷移
//! - `run()`: 最新の引数を記録し、immediate mode なら即実行、
//!   debounced mode ならタイマーが無い時だけ新しく arm する
//! - tick: `run()` が来ていなければ停止（quiescence）、来ていれば最新の引数で 1 回実行
//! - `cancel()`: 次の tick で cancelled として扱う
//! - `abort()`: 次の `run()` でタイマーを破棄し、その呼び出しを捨てる
//!
//! # ロック
//! 状態は 1 つの Mutex にまとめ、callback と handler はロックを外してから呼ぶ。
//! そのため handler や callback の中から同じ `Zep` を触ってもデッドロックしない。

use std::ops::ControlFlow;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tracing::{debug, info, trace};

use super::callback::{self, CallbackOutcome, DynCallback};
use super::handlers::{Handlers, LifecycleEvent};
use super::timer::RecurringTimer;
use crate::domain::{CancelPolicy, ZepConfig, ZepError, ZepId, ZepStats};

/// How `run()` turns into executions.
enum Mode {
    Immediate,
    Debounced { period: Duration, runtime: Handle },
}

struct State<A> {
    latest_args: Option<A>,
    invocation_count: u64,
    execution_count: u64,
    timers_created: u64,
    is_running: bool,
    is_waiting: bool,
    cancel_requested: bool,
    was_cancelled: bool,
    abort_requested: bool,
    was_aborted: bool,
    timer: Option<RecurringTimer>,
    next_generation: u64,
}

impl<A> State<A> {
    fn new() -> Self {
        Self {
            latest_args: None,
            invocation_count: 0,
            execution_count: 0,
            timers_created: 0,
            is_running: false,
            is_waiting: false,
            cancel_requested: false,
            was_cancelled: false,
            abort_requested: false,
            was_aborted: false,
            timer: None,
            next_generation: 0,
        }
    }

    fn begin_cycle(&mut self) {
        self.was_cancelled = false;
        self.was_aborted = false;
        self.is_waiting = true;
        self.is_running = true;
    }

    fn finish_execution(&mut self) {
        self.execution_count += 1;
        self.is_waiting = false;
        self.is_running = false;
    }

    /// Finish a tick execution that read its args when `invocation_count`
    /// was `seen`. A `run()` that landed while the callback was executing
    /// keeps its cycle open so the next tick picks it up.
    fn finish_tick(&mut self, generation: u64, seen: u64) {
        self.execution_count += 1;
        let current = self.timer.as_ref().map(RecurringTimer::generation) == Some(generation);
        if current && self.invocation_count == seen {
            self.is_waiting = false;
            self.is_running = false;
        }
    }
}

struct Shared<A> {
    id: ZepId,
    mode: Mode,
    cancel_policy: CancelPolicy,
    callback: DynCallback<A>,
    state: Mutex<State<A>>,
    handlers: Mutex<Handlers>,
}

/// A debounced callback.
///
/// Repeated `run()` calls within one period collapse into a single execution
/// on the next timer tick, using the arguments of the latest call. Without a
/// period every `run()` executes the callback synchronously.
///
/// `Zep` is a cheap shared handle: clones drive the same instance.
///
/// ```ignore
/// let zep = Zep::new(|query: String| search(&query), Some(Duration::from_millis(200)))?;
/// zep.on_completed(|stats| println!("{stats}"));
///
/// zep.run("r".into()).run("ru".into()).run("rust".into());
/// // one search for "rust" ~200ms later
/// ```
pub struct Zep<A> {
    shared: Arc<Shared<A>>,
}

/// Alias for readers who know the pattern by its usual name.
pub type Debouncer<A> = Zep<A>;

/// Non-owning handle to a `Zep`.
///
/// Handlers registered on a `Zep` are owned by it, so a handler that captures
/// a `Zep` clone keeps the instance (and its timer) alive forever. Capture a
/// `WeakZep` instead.
pub struct WeakZep<A> {
    shared: Weak<Shared<A>>,
}

impl<A> WeakZep<A> {
    /// `None` once every `Zep` handle is dropped.
    pub fn upgrade(&self) -> Option<Zep<A>> {
        self.shared.upgrade().map(|shared| Zep { shared })
    }
}

impl<A> Clone for WeakZep<A> {
    fn clone(&self) -> Self {
        Self {
            shared: Weak::clone(&self.shared),
        }
    }
}

impl<A> Clone for Zep<A> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<A: Clone + Send + 'static> Zep<A> {
    /// `None` or a zero period selects immediate mode.
    ///
    /// # Errors
    /// `ZepError::NoRuntime` when a period is given outside a tokio runtime.
    pub fn new<F, R>(callback: F, period: Option<Duration>) -> Result<Self, ZepError>
    where
        F: Fn(A) -> R + Send + Sync + 'static,
        R: CallbackOutcome,
    {
        let config = period.map(ZepConfig::with_period).unwrap_or_default();
        Self::with_config(callback, config)
    }

    pub fn with_config<F, R>(callback: F, config: ZepConfig) -> Result<Self, ZepError>
    where
        F: Fn(A) -> R + Send + Sync + 'static,
        R: CallbackOutcome,
    {
        let mode = match config.period {
            Some(period) if !period.is_zero() => {
                let runtime = Handle::try_current().map_err(|_| ZepError::NoRuntime)?;
                Mode::Debounced { period, runtime }
            }
            _ => Mode::Immediate,
        };

        let id = ZepId::generate();
        debug!(zep_id = %id, period = ?config.period, "zep created");

        Ok(Self {
            shared: Arc::new(Shared {
                id,
                mode,
                cancel_policy: config.cancel_policy,
                callback: callback::erase(callback),
                state: Mutex::new(State::new()),
                handlers: Mutex::new(Handlers::default()),
            }),
        })
    }

    /// Request an execution with `args`.
    ///
    /// A pending `abort()` is consumed here: the timer is destroyed and this
    /// call is dropped without being counted.
    pub fn run(&self, args: A) -> &Self {
        let shared = &self.shared;
        let mut state = shared.state.lock();

        if state.abort_requested {
            if let Some(timer) = state.timer.take() {
                timer.cancel();
            }
            state.is_running = false;
            state.is_waiting = false;
            state.abort_requested = false;
            state.was_aborted = true;
            drop(state);

            debug!(zep_id = %shared.id, "zep aborted");
            shared.emit(LifecycleEvent::Aborted);
            return self;
        }

        state.invocation_count += 1;
        state.begin_cycle();

        match &shared.mode {
            Mode::Immediate => {
                state.latest_args = Some(args.clone());
                drop(state);

                shared.report(callback::invoke(&shared.callback, args));
                shared.state.lock().finish_execution();
            }
            Mode::Debounced { period, runtime } => {
                state.latest_args = Some(args);
                if state.timer.is_none() {
                    let generation = state.next_generation;
                    state.next_generation += 1;
                    state.timers_created += 1;

                    let weak = Arc::downgrade(shared);
                    state.timer = Some(RecurringTimer::spawn(runtime, *period, generation, move || {
                        Shared::tick_weak(&weak, generation)
                    }));
                    debug!(zep_id = %shared.id, generation, "timer armed");
                }
            }
        }

        self
    }

    /// The next tick marks the cycle as cancelled.
    ///
    /// Does not interrupt an execution that is already in progress.
    pub fn cancel(&self) {
        self.shared.state.lock().cancel_requested = true;
        debug!(zep_id = %self.shared.id, "cancel requested");
    }

    /// The next `run()` destroys the timer and is itself dropped.
    pub fn abort(&self) {
        self.shared.state.lock().abort_requested = true;
        debug!(zep_id = %self.shared.id, "abort requested");
    }
}

impl<A> Zep<A> {
    pub fn downgrade(&self) -> WeakZep<A> {
        WeakZep {
            shared: Arc::downgrade(&self.shared),
        }
    }

    pub fn id(&self) -> ZepId {
        self.shared.id
    }

    /// `None` in immediate mode.
    pub fn period(&self) -> Option<Duration> {
        match &self.shared.mode {
            Mode::Immediate => None,
            Mode::Debounced { period, .. } => Some(*period),
        }
    }

    pub fn invocation_count(&self) -> u64 {
        self.shared.state.lock().invocation_count
    }

    pub fn execution_count(&self) -> u64 {
        self.shared.state.lock().execution_count
    }

    /// Number of timers armed over the lifetime of this instance.
    pub fn timers_count(&self) -> u64 {
        self.shared.state.lock().timers_created
    }

    /// A timer is armed and an execution is pending or in progress.
    pub fn is_waiting(&self) -> bool {
        self.shared.state.lock().is_waiting
    }

    pub fn is_running(&self) -> bool {
        self.shared.state.lock().is_running
    }

    pub fn was_cancelled(&self) -> bool {
        self.shared.state.lock().was_cancelled
    }

    pub fn was_aborted(&self) -> bool {
        self.shared.state.lock().was_aborted
    }

    pub fn stats(&self) -> ZepStats {
        self.shared.stats()
    }

    /// Emit the stats summary as an `info` event.
    pub fn write_stats(&self) {
        let stats = self.stats();
        info!(zep_id = %stats.id, "{stats}");
    }

    // Handlers are owned by the instance. Re-entrant handlers should capture
    // `self.downgrade()`, a captured clone keeps the instance alive.

    pub fn on_before_run<F>(&self, handler: F) -> &Self
    where
        F: Fn(&ZepStats) + Send + Sync + 'static,
    {
        self.set_handler(LifecycleEvent::BeforeRun, handler)
    }

    pub fn on_after_run<F>(&self, handler: F) -> &Self
    where
        F: Fn(&ZepStats) + Send + Sync + 'static,
    {
        self.set_handler(LifecycleEvent::AfterRun, handler)
    }

    /// Fires when a debounce cycle ends by quiescence, unless it was cancelled.
    pub fn on_completed<F>(&self, handler: F) -> &Self
    where
        F: Fn(&ZepStats) + Send + Sync + 'static,
    {
        self.set_handler(LifecycleEvent::Completed, handler)
    }

    pub fn on_cancelled<F>(&self, handler: F) -> &Self
    where
        F: Fn(&ZepStats) + Send + Sync + 'static,
    {
        self.set_handler(LifecycleEvent::Cancelled, handler)
    }

    pub fn on_aborted<F>(&self, handler: F) -> &Self
    where
        F: Fn(&ZepStats) + Send + Sync + 'static,
    {
        self.set_handler(LifecycleEvent::Aborted, handler)
    }

    /// Receives every callback failure. Without it failures are discarded.
    pub fn on_error<F>(&self, handler: F) -> &Self
    where
        F: Fn(&ZepError) + Send + Sync + 'static,
    {
        self.shared.handlers.lock().set_error(Arc::new(handler));
        self
    }

    fn set_handler<F>(&self, event: LifecycleEvent, handler: F) -> &Self
    where
        F: Fn(&ZepStats) + Send + Sync + 'static,
    {
        self.shared.handlers.lock().set(event, Arc::new(handler));
        self
    }
}

impl<A> std::fmt::Debug for Zep<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Zep")
            .field("id", &self.shared.id)
            .field("period", &self.period())
            .finish_non_exhaustive()
    }
}

impl<A> Shared<A> {
    fn stats(&self) -> ZepStats {
        let state = self.state.lock();
        ZepStats {
            id: self.id,
            calls: state.invocation_count,
            timers_created: state.timers_created,
            executions: state.execution_count,
            is_waiting: state.is_waiting,
            is_running: state.is_running,
            was_cancelled: state.was_cancelled,
            was_aborted: state.was_aborted,
        }
    }

    /// Must be called with no lock held.
    fn emit(&self, event: LifecycleEvent) {
        let Some(handler) = self.handlers.lock().get(event) else {
            return;
        };
        let stats = self.stats();
        trace!(zep_id = %self.id, %event, "lifecycle handler");
        handler(&stats);
    }

    /// Must be called with no lock held.
    fn report(&self, result: Result<(), ZepError>) {
        let Err(err) = result else {
            return;
        };
        let handler = self.handlers.lock().error();
        match handler {
            Some(handler) => handler(&err),
            None => debug!(zep_id = %self.id, error = %err, "callback error discarded"),
        }
    }
}

impl<A: Clone> Shared<A> {
    fn tick_weak(weak: &Weak<Self>, generation: u64) -> ControlFlow<()> {
        match weak.upgrade() {
            Some(shared) => shared.tick(generation),
            // every handle is gone
            None => ControlFlow::Break(()),
        }
    }

    fn tick(&self, generation: u64) -> ControlFlow<()> {
        let mut state = self.state.lock();

        if state.timer.as_ref().map(RecurringTimer::generation) != Some(generation) {
            return ControlFlow::Break(());
        }

        if !state.is_running {
            // このタスク自身なので abort せずに切り離すだけ
            state.timer = None;
            state.is_waiting = false;
            state.is_running = false;
            let notify = !state.was_cancelled;
            drop(state);

            debug!(zep_id = %self.id, generation, "zep completed");
            if notify {
                self.emit(LifecycleEvent::Completed);
            }
            return ControlFlow::Break(());
        }

        let cancelled = state.cancel_requested;
        let skip = cancelled && self.cancel_policy == CancelPolicy::SkipThisTick;
        if cancelled {
            state.is_running = false;
            state.cancel_requested = false;
            state.was_cancelled = true;
        }
        let seen = state.invocation_count;
        let args = state.latest_args.clone();
        drop(state);

        if cancelled {
            debug!(zep_id = %self.id, generation, skip, "zep cancelled");
            self.emit(LifecycleEvent::Cancelled);
            if skip {
                return ControlFlow::Continue(());
            }
        }

        if let Some(args) = args {
            self.execute(args, generation, seen);
        }
        ControlFlow::Continue(())
    }

    fn execute(&self, args: A, generation: u64, seen: u64) {
        self.emit(LifecycleEvent::BeforeRun);
        self.report(callback::invoke(&self.callback, args));
        self.emit(LifecycleEvent::AfterRun);

        let mut state = self.state.lock();
        state.finish_tick(generation, seen);
        trace!(zep_id = %self.id, executions = state.execution_count, "tick executed");
    }
}
