//! Logical-clock instrumentation of array reads and slot computations.
//!
//! The [`AccessLogger`] keeps a single logical clock for a whole evaluation
//! session. Every read of an array slot is bracketed by an [`AccessScope`] and
//! every slot computation by a [`CallScope`]; both are RAII guards, so the
//! matching end event is recorded on every exit path, including `?` returns.
//!
//! From the recorded call log and the first/last access-completion times a
//! consumer can reconstruct, for any timestamp, which values were known, which
//! computation was in flight and which values it had read so far (see
//! [`crate::timeline`]).

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::sink::{EventSink, LogEvent};
use crate::LiftingError;

/// A point on the logical clock.
///
/// The first [`AccessLogger::tick`] returns `Timestamp(1)`; `Timestamp(0)`
/// precedes every event.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Timestamp(pub u64);

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// An `(array name, index)` pair identifying one slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotKey {
    /// Array name.
    pub array: String,
    /// Slot index.
    pub index: usize,
}

impl SlotKey {
    /// Create a slot key.
    pub fn new(array: impl Into<String>, index: usize) -> Self {
        Self {
            array: array.into(),
            index,
        }
    }
}

/// One read of an array slot, whether or not it triggered a computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRecord {
    /// Array that was read.
    pub array_name: String,
    /// Slot that was read.
    pub index: usize,
    /// When the read started.
    pub start_time: Timestamp,
    /// When the read completed. `None` while the read is still in progress.
    pub end_time: Option<Timestamp>,
}

/// One computation of a slot value, with the reads it performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRecord {
    /// Array whose slot was computed.
    pub array_name: String,
    /// Slot that was computed.
    pub index: usize,
    /// When the computation started.
    pub start_time: Timestamp,
    /// When the computation finished. `None` while it is still running.
    pub end_time: Option<Timestamp>,
    /// Reads performed by this computation (not by nested ones), in order.
    pub access_log: Vec<AccessRecord>,
}

impl CallRecord {
    /// Returns true if this computation was running at `time`.
    pub fn is_active_at(&self, time: Timestamp) -> bool {
        self.start_time <= time && self.end_time.map_or(true, |end| time <= end)
    }

    /// Reads this computation had started by `time`.
    pub fn accesses_started_by(&self, time: Timestamp) -> impl Iterator<Item = &AccessRecord> + '_ {
        self.access_log
            .iter()
            .filter(move |access| access.start_time <= time)
    }
}

/// Default for [`LoggerConfig::max_call_depth`].
///
/// Each nested computation costs a few stack frames of `read`, `evaluate` and
/// the rule; this depth stays well inside a 2 MiB thread stack in debug builds.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

/// Tunables of an [`AccessLogger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Maximum number of nested slot computations.
    ///
    /// A well-formed chain never nests deeper than its number of arrays.
    /// Raising this far above [`DEFAULT_MAX_CALL_DEPTH`] can overflow the
    /// thread stack before the limit is reached.
    pub max_call_depth: usize,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

impl LoggerConfig {
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }
}

#[derive(Default)]
struct LoggerState {
    time: u64,
    /// Indices into `call_log` of the running computations, outermost first.
    call_stack: Vec<usize>,
    call_log: Vec<CallRecord>,
    first_access: HashMap<SlotKey, Timestamp>,
    last_access: HashMap<SlotKey, Timestamp>,
}

impl LoggerState {
    fn tick(&mut self) -> Timestamp {
        self.time += 1;
        Timestamp(self.time)
    }
}

/// Session-wide recorder of reads and computations.
///
/// Shared between all arrays of a chain via `Arc`. The internal lock is only
/// held while a record is updated, never across a computation.
pub struct AccessLogger {
    config: LoggerConfig,
    state: Mutex<LoggerState>,
    sink: Option<Arc<dyn EventSink>>,
}

impl Default for AccessLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AccessLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("AccessLogger")
            .field("time", &state.time)
            .field("call_depth", &state.call_stack.len())
            .field("calls", &state.call_log.len())
            .finish()
    }
}

impl AccessLogger {
    /// Create a logger with the default configuration.
    pub fn new() -> Self {
        Self::with_config(LoggerConfig::default())
    }

    /// Create a logger with the given configuration.
    pub fn with_config(config: LoggerConfig) -> Self {
        Self {
            config,
            state: Mutex::new(LoggerState::default()),
            sink: None,
        }
    }

    /// Forward every logged event to `sink` as well.
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    /// Advance the clock and return the new time.
    pub fn tick(&self) -> Timestamp {
        self.state.lock().tick()
    }

    /// Current time, without advancing the clock.
    pub fn now(&self) -> Timestamp {
        Timestamp(self.state.lock().time)
    }

    /// Number of computations currently running.
    pub fn call_depth(&self) -> usize {
        self.state.lock().call_stack.len()
    }

    /// Slots currently being computed, outermost first.
    pub fn active_calls(&self) -> Vec<SlotKey> {
        let state = self.state.lock();
        state
            .call_stack
            .iter()
            .map(|&i| SlotKey::new(state.call_log[i].array_name.clone(), state.call_log[i].index))
            .collect()
    }

    /// Every computation so far, ordered by start time.
    pub fn call_log(&self) -> Vec<CallRecord> {
        self.state.lock().call_log.clone()
    }

    /// Completion time of the first read of a slot.
    pub fn first_access_time(&self, array: &str, index: usize) -> Option<Timestamp> {
        self.state
            .lock()
            .first_access
            .get(&SlotKey::new(array, index))
            .copied()
    }

    /// Completion time of the most recent read of a slot.
    pub fn last_access_time(&self, array: &str, index: usize) -> Option<Timestamp> {
        self.state
            .lock()
            .last_access
            .get(&SlotKey::new(array, index))
            .copied()
    }

    /// Snapshot of everything recorded so far.
    pub fn trace(&self) -> Trace {
        let state = self.state.lock();
        let mut access_times: Vec<AccessTimes> = state
            .first_access
            .iter()
            .map(|(key, &first)| AccessTimes {
                array: key.array.clone(),
                index: key.index,
                first,
                last: state.last_access.get(key).copied().unwrap_or(first),
            })
            .collect();
        access_times.sort_by(|a, b| (a.first, &a.array, a.index).cmp(&(b.first, &b.array, b.index)));
        Trace {
            time: Timestamp(state.time),
            calls: state.call_log.clone(),
            access_times,
        }
    }

    /// Start recording the computation of slot `index` of `array`.
    ///
    /// The computation ends when the returned scope is dropped.
    ///
    /// # Errors
    ///
    /// `CallDepthExceeded` if the configured maximum depth would be exceeded.
    ///
    /// # Panics
    ///
    /// Panics if the same slot is already being computed: the dependency graph
    /// contains a cycle.
    pub fn enter_call(&self, array: &str, index: usize) -> Result<CallScope<'_>, LiftingError> {
        let mut state = self.state.lock();

        let depth = state.call_stack.len() + 1;
        if depth > self.config.max_call_depth {
            return Err(LiftingError::CallDepthExceeded { depth });
        }

        let reentrant = state.call_stack.iter().any(|&i| {
            let call = &state.call_log[i];
            call.array_name == array && call.index == index
        });
        if reentrant {
            let mut path: Vec<String> = state
                .call_stack
                .iter()
                .map(|&i| format!("{}[{}]", state.call_log[i].array_name, state.call_log[i].index))
                .collect();
            path.push(format!("{array}[{index}]"));
            drop(state);
            panic!("re-entrant slot computation: {}", path.join(" -> "));
        }

        let start_time = state.tick();
        let record = state.call_log.len();
        state.call_log.push(CallRecord {
            array_name: array.to_string(),
            index,
            start_time,
            end_time: None,
            access_log: Vec::new(),
        });
        state.call_stack.push(record);
        drop(state);

        self.emit(|| LogEvent::CallStart {
            array: array.to_string(),
            index,
            time: start_time,
            depth,
        });

        Ok(CallScope {
            logger: self,
            record,
        })
    }

    /// Start recording a read of slot `index` of `array`.
    ///
    /// The read is attributed to the innermost running computation, if any,
    /// and ends when the returned scope is dropped.
    pub fn enter_access(&self, array: &str, index: usize) -> AccessScope<'_> {
        let mut state = self.state.lock();
        let start_time = state.tick();
        let mut position = None;
        if let Some(&caller) = state.call_stack.last() {
            let access_log = &mut state.call_log[caller].access_log;
            access_log.push(AccessRecord {
                array_name: array.to_string(),
                index,
                start_time,
                end_time: None,
            });
            position = Some((caller, access_log.len() - 1));
        }
        drop(state);

        self.emit(|| LogEvent::AccessStart {
            array: array.to_string(),
            index,
            time: start_time,
        });

        AccessScope {
            logger: self,
            key: SlotKey::new(array, index),
            position,
        }
    }

    fn emit(&self, event: impl FnOnce() -> LogEvent) {
        if let Some(sink) = &self.sink {
            sink.emit(event());
        }
    }
}

/// Guard for a running slot computation. See [`AccessLogger::enter_call`].
#[must_use = "the computation ends when the scope is dropped"]
pub struct CallScope<'a> {
    logger: &'a AccessLogger,
    record: usize,
}

impl Drop for CallScope<'_> {
    fn drop(&mut self) {
        let mut state = self.logger.state.lock();
        let popped = state.call_stack.pop();
        if popped != Some(self.record) && !std::thread::panicking() {
            drop(state);
            panic!(
                "unbalanced call stack: expected call #{} on top, found {:?}",
                self.record, popped
            );
        }
        let end_time = state.tick();
        let call = &mut state.call_log[self.record];
        call.end_time = Some(end_time);
        let (array, index) = (call.array_name.clone(), call.index);
        drop(state);

        self.logger.emit(|| LogEvent::CallEnd {
            array,
            index,
            time: end_time,
        });
    }
}

/// Guard for a slot read in progress. See [`AccessLogger::enter_access`].
#[must_use = "the read ends when the scope is dropped"]
pub struct AccessScope<'a> {
    logger: &'a AccessLogger,
    key: SlotKey,
    position: Option<(usize, usize)>,
}

impl Drop for AccessScope<'_> {
    fn drop(&mut self) {
        let mut state = self.logger.state.lock();
        let end_time = state.tick();
        if let Some((call, access)) = self.position {
            state.call_log[call].access_log[access].end_time = Some(end_time);
        }
        state
            .first_access
            .entry(self.key.clone())
            .or_insert(end_time);
        state.last_access.insert(self.key.clone(), end_time);
        drop(state);

        self.logger.emit(|| LogEvent::AccessEnd {
            array: self.key.array.clone(),
            index: self.key.index,
            time: end_time,
        });
    }
}

/// First and last access-completion times of one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTimes {
    pub array: String,
    pub index: usize,
    pub first: Timestamp,
    pub last: Timestamp,
}

/// A serialisable snapshot of an [`AccessLogger`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Trace {
    /// Clock value when the snapshot was taken.
    pub time: Timestamp,
    /// Every computation, ordered by start time.
    pub calls: Vec<CallRecord>,
    /// Access times of every slot read at least once, ordered by first access.
    pub access_times: Vec<AccessTimes>,
}

impl Trace {
    pub fn access_times_of(&self, array: &str, index: usize) -> Option<&AccessTimes> {
        self.access_times
            .iter()
            .find(|times| times.array == array && times.index == index)
    }
}
