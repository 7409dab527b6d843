//! Lifting-Flow: a lazy, memoized and instrumented evaluation engine for
//! VC-2 style integer lifting wavelet transforms.
//!
//! A [`TransformChain`] is a sequence of [`LazyArray`]s: the input signal,
//! one array per analysis lifting stage and one per synthesis stage. Nothing
//! is computed when the chain is built. Values are produced on first read and
//! cached, and every read and computation is recorded on a logical clock by
//! the shared [`AccessLogger`], so the order in which a consumer forces the
//! arrays ([`AccessPattern`]) can be reconstructed and replayed afterwards.
//!
//! # Key Features
//!
//! - **Lossless integer lifting**: every wavelet in the filter table decodes
//!   back to its input exactly, for any input length of at least two
//! - **Lazy and memoized**: each slot is computed at most once
//! - **Instrumented**: call and access records with strictly increasing
//!   logical timestamps, plus live events through an [`EventSink`]
//! - **Replayable**: [`Trace::frame_at`] reconstructs the state at any time
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use lifting_flow::{AccessLogger, AccessPattern, TransformChain, Wavelet};
//!
//! let logger = Arc::new(AccessLogger::new());
//! let chain = TransformChain::build(&[1, 2, 3, 4], Wavelet::LeGall5_3, logger)?;
//! AccessPattern::Lazy.drive(&chain)?;
//!
//! assert_eq!(chain.encoded().read_all()?, vec![1, 0, 3, 1]);
//! assert_eq!(chain.output().read_all()?, vec![1, 2, 3, 4]);
//! # Ok::<(), lifting_flow::LiftingError>(())
//! ```

mod access;
mod array;
mod chain;
mod config;
mod error;
pub mod filters;
mod logger;
mod session;
mod sink;
pub mod stage;
pub mod timeline;

pub use access::AccessPattern;
pub use array::{LazyArray, Lift, Slot, SlotRule};
pub use chain::{TransformChain, ENCODED_NAME, INPUT_NAME, MIN_INPUT_LEN, OUTPUT_NAME};
pub use config::{InputKind, SessionConfig};
pub use error::LiftingError;
pub use filters::{FilterPair, Wavelet};
pub use logger::{
    AccessLogger, AccessRecord, AccessScope, AccessTimes, CallRecord, CallScope, LoggerConfig,
    SlotKey, Timestamp, Trace, DEFAULT_MAX_CALL_DEPTH,
};
pub use session::{Session, SessionRecord};
pub use sink::{EventCollector, EventSink, LogEvent, NullSink, TracingSink};
pub use stage::{LiftKind, LiftingStage, SampleSource};
pub use timeline::{ArrayFrame, ArraySnapshot, Frame, InFlight, SlotFrame};
