//! Lazily evaluated, memoized arrays.
//!
//! A [`LazyArray`] has a fixed length and one [`Slot`] per index. A slot starts
//! out [`Slot::Unresolved`] (unless pre-populated) and becomes
//! [`Slot::Resolved`] the first time it is read, by running the array's
//! [`SlotRule`]. Every read, cached or not, is recorded by the shared
//! [`AccessLogger`]; every computation additionally opens a call scope.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::logger::AccessLogger;
use crate::stage::{self, LiftingStage, SampleSource};
use crate::LiftingError;

/// State of one array slot. Moves from `Unresolved` to `Resolved` at most once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Slot<T> {
    /// Not computed yet.
    Unresolved,
    /// Known value.
    Resolved(T),
}

impl<T> Slot<T> {
    /// The value, if resolved.
    pub fn value(&self) -> Option<&T> {
        match self {
            Slot::Resolved(value) => Some(value),
            Slot::Unresolved => None,
        }
    }

    /// Returns true if the slot holds a value.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Slot::Resolved(_))
    }
}

impl<T> From<Option<T>> for Slot<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Slot::Resolved(value),
            None => Slot::Unresolved,
        }
    }
}

/// Strategy producing the value of an unresolved slot.
///
/// Any `Fn(usize) -> Result<T, LiftingError>` closure is a rule.
pub trait SlotRule<T>: Send + Sync {
    /// Compute the value at `index`. May read other arrays.
    fn compute(&self, index: usize) -> Result<T, LiftingError>;
}

impl<T, F> SlotRule<T> for F
where
    F: Fn(usize) -> Result<T, LiftingError> + Send + Sync,
{
    fn compute(&self, index: usize) -> Result<T, LiftingError> {
        self(index)
    }
}

/// Rule applying one lifting stage to a source array.
pub struct Lift {
    source: Arc<LazyArray<i64>>,
    stage: LiftingStage,
}

impl Lift {
    pub fn new(source: Arc<LazyArray<i64>>, stage: LiftingStage) -> Self {
        Self { source, stage }
    }

    pub fn source(&self) -> &Arc<LazyArray<i64>> {
        &self.source
    }

    pub fn stage(&self) -> &LiftingStage {
        &self.stage
    }
}

impl SlotRule<i64> for Lift {
    fn compute(&self, index: usize) -> Result<i64, LiftingError> {
        stage::evaluate(&self.stage, &*self.source, index)
    }
}

/// A fixed-length array whose slots are computed on first read and then cached.
pub struct LazyArray<T> {
    name: String,
    slots: Mutex<Vec<Slot<T>>>,
    /// `None` for leaf arrays whose values are all supplied up front.
    rule: Option<Box<dyn SlotRule<T>>>,
    logger: Arc<AccessLogger>,
}

impl<T: fmt::Debug> fmt::Debug for LazyArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyArray")
            .field("name", &self.name)
            .field("slots", &*self.slots.lock())
            .finish()
    }
}

impl<T: Clone> LazyArray<T> {
    /// Create an array of `len` unresolved slots computed by `rule`.
    pub fn new(
        name: impl Into<String>,
        len: usize,
        logger: Arc<AccessLogger>,
        rule: impl SlotRule<T> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            slots: Mutex::new((0..len).map(|_| Slot::Unresolved).collect()),
            rule: Some(Box::new(rule)),
            logger,
        }
    }

    /// Create a leaf array whose values are all known.
    pub fn from_values(
        name: impl Into<String>,
        values: impl IntoIterator<Item = T>,
        logger: Arc<AccessLogger>,
    ) -> Self {
        Self::from_slots(name, values.into_iter().map(Slot::Resolved), logger)
    }

    /// Create a leaf array from a mix of known and unknown values.
    ///
    /// Reading an unresolved slot fails with `Unresolvable` unless a rule is
    /// attached with [`LazyArray::with_rule`].
    pub fn from_slots(
        name: impl Into<String>,
        slots: impl IntoIterator<Item = Slot<T>>,
        logger: Arc<AccessLogger>,
    ) -> Self {
        Self {
            name: name.into(),
            slots: Mutex::new(slots.into_iter().collect()),
            rule: None,
            logger,
        }
    }

    /// Attach a rule for computing unresolved slots.
    pub fn with_rule(mut self, rule: impl SlotRule<T> + 'static) -> Self {
        self.rule = Some(Box::new(rule));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn logger(&self) -> &Arc<AccessLogger> {
        &self.logger
    }

    /// Read the value at `index`, computing and caching it if necessary.
    ///
    /// # Errors
    ///
    /// - `IndexOutOfRange` if `index >= len()`; nothing is logged.
    /// - `Unresolvable` if the slot is unresolved and there is no rule.
    /// - Any error of the rule; the slot then stays unresolved.
    pub fn read(&self, index: usize) -> Result<T, LiftingError> {
        let len = self.len();
        if index >= len {
            return Err(LiftingError::IndexOutOfRange {
                array: self.name.clone(),
                index,
                len,
            });
        }

        let _access = self.logger.enter_access(&self.name, index);

        if let Slot::Resolved(value) = &self.slots.lock()[index] {
            return Ok(value.clone());
        }

        let rule = self
            .rule
            .as_deref()
            .ok_or_else(|| LiftingError::Unresolvable {
                array: self.name.clone(),
                index,
            })?;

        let value = {
            let _call = self.logger.enter_call(&self.name, index)?;
            rule.compute(index)?
        };

        let mut slots = self.slots.lock();
        debug_assert!(
            !slots[index].is_resolved(),
            "slot {index} of '{}' resolved twice",
            self.name
        );
        slots[index] = Slot::Resolved(value.clone());
        Ok(value)
    }

    /// Force every slot in index order and return the values.
    pub fn read_all(&self) -> Result<Vec<T>, LiftingError> {
        self.iter().collect()
    }

    /// Iterator forcing each slot in index order.
    pub fn iter(&self) -> impl Iterator<Item = Result<T, LiftingError>> + '_ {
        (0..self.len()).map(move |index| self.read(index))
    }

    /// Returns true if slot `index` holds a value. Does not log.
    pub fn is_resolved(&self, index: usize) -> bool {
        self.slots
            .lock()
            .get(index)
            .map_or(false, Slot::is_resolved)
    }

    /// Current state of every slot, without forcing or logging anything.
    pub fn snapshot(&self) -> Vec<Slot<T>> {
        self.slots.lock().clone()
    }

    /// Current values, `None` where unresolved. Does not log.
    pub fn current_values(&self) -> Vec<Option<T>> {
        self.slots
            .lock()
            .iter()
            .map(|slot| slot.value().cloned())
            .collect()
    }
}

impl LazyArray<i64> {
    /// Create an array holding `stage` applied to `source`.
    ///
    /// The new array shares the source's logger and has the same length.
    pub fn lifted(name: impl Into<String>, source: Arc<LazyArray<i64>>, stage: LiftingStage) -> Self {
        let len = source.len();
        let logger = source.logger.clone();
        Self::new(name, len, logger, Lift::new(source, stage))
    }
}

impl SampleSource for LazyArray<i64> {
    fn len(&self) -> usize {
        LazyArray::len(self)
    }

    fn sample(&self, index: usize) -> Result<i64, LiftingError> {
        self.read(index)
    }

    fn source_name(&self) -> &str {
        self.name()
    }
}
