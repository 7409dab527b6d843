//! Reconstruction of the evaluation state at any point of a recorded session.
//!
//! A [`Frame`] is what a renderer needs to draw one moment: which values were
//! known, which were still going to be read, and which computation was in
//! flight together with the sources it had read so far. Nothing here draws.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::array::LazyArray;
use crate::logger::{Timestamp, Trace};

/// Final slot values of one array, `None` where never computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArraySnapshot {
    pub name: String,
    pub values: Vec<Option<i64>>,
}

impl ArraySnapshot {
    pub fn of(array: &LazyArray<i64>) -> Self {
        Self {
            name: array.name().to_string(),
            values: array.current_values(),
        }
    }
}

/// State of one slot at a given time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotFrame {
    /// The value, if known at that time.
    pub value: Option<i64>,
    /// The slot is read again at or after that time.
    pub needed_later: bool,
}

/// A computation running at a given time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InFlight {
    /// Slot being computed.
    pub index: usize,
    /// Source slots whose reads had started, in read order.
    pub sources: Vec<usize>,
}

/// State of one array at a given time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayFrame {
    pub name: String,
    pub slots: Vec<SlotFrame>,
    pub in_flight: Option<InFlight>,
}

/// State of every array at a given time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub time: Timestamp,
    pub arrays: Vec<ArrayFrame>,
}

impl Trace {
    /// Reconstruct the state at `time` from this trace and the final array values.
    ///
    /// A slot's value is known from the completion of its first read; slots
    /// that were never read count as known only if they hold a value (inputs).
    ///
    /// `needed_later` holds up to and including the slot's last read. Every
    /// array is treated alike, so slots of the final output also stop being
    /// needed once read; a viewer that wants to keep the output highlighted
    /// should special-case the last array itself.
    pub fn frame_at(&self, time: Timestamp, arrays: &[ArraySnapshot]) -> Frame {
        let times: HashMap<(&str, usize), (Timestamp, Timestamp)> = self
            .access_times
            .iter()
            .map(|t| ((t.array.as_str(), t.index), (t.first, t.last)))
            .collect();

        let arrays = arrays
            .iter()
            .map(|array| {
                let slots = array
                    .values
                    .iter()
                    .enumerate()
                    .map(|(index, &value)| match times.get(&(array.name.as_str(), index)) {
                        Some(&(first, last)) => SlotFrame {
                            value: value.filter(|_| time >= first),
                            needed_later: time <= last,
                        },
                        None => SlotFrame {
                            value,
                            needed_later: false,
                        },
                    })
                    .collect();

                let in_flight = self
                    .calls
                    .iter()
                    .find(|call| call.array_name == array.name && call.is_active_at(time))
                    .map(|call| InFlight {
                        index: call.index,
                        sources: call.accesses_started_by(time).map(|a| a.index).collect(),
                    });

                ArrayFrame {
                    name: array.name.clone(),
                    slots,
                    in_flight,
                }
            })
            .collect();

        Frame { time, arrays }
    }
}
