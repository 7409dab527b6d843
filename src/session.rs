//! Running a configured session and exporting what it recorded.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::chain::TransformChain;
use crate::config::SessionConfig;
use crate::logger::{AccessLogger, Trace};
use crate::sink::EventSink;
use crate::timeline::{ArraySnapshot, Frame};
use crate::LiftingError;

/// Everything a session produced: the configuration, the signals and the trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub config: SessionConfig,
    pub input: Vec<i64>,
    /// Encoded values, `None` where the access pattern never needed them.
    pub encoded: Vec<Option<i64>>,
    pub output: Vec<Option<i64>>,
    /// Final state of every array, input first.
    pub arrays: Vec<ArraySnapshot>,
    pub trace: Trace,
}

impl SessionRecord {
    /// Returns true if every output value was computed and equals the input.
    pub fn is_lossless(&self) -> bool {
        self.output.len() == self.input.len()
            && self
                .output
                .iter()
                .zip(&self.input)
                .all(|(out, input)| *out == Some(*input))
    }

    /// State of all arrays at `time`.
    pub fn frame_at(&self, time: crate::Timestamp) -> Frame {
        self.trace.frame_at(time, &self.arrays)
    }

    pub fn to_json(&self) -> Result<String, LiftingError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the record as pretty-printed JSON.
    pub fn export_to_file(&self, path: &Path) -> Result<(), LiftingError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Builds and drives one chain according to a [`SessionConfig`].
pub struct Session {
    config: SessionConfig,
    sink: Option<Arc<dyn EventSink>>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self { config, sink: None }
    }

    /// Also send live events to `sink`.
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Generate the input, build the chain, drive it and collect the results.
    #[tracing::instrument(skip(self), fields(wavelet = %self.config.wavelet, order = %self.config.order))]
    pub fn run(&self) -> Result<SessionRecord, LiftingError> {
        let mut logger = AccessLogger::with_config(self.config.logger);
        if let Some(sink) = &self.sink {
            logger = logger.with_sink(sink.clone());
        }

        let input = self.config.generate_input();
        let chain = TransformChain::build(&input, self.config.wavelet, Arc::new(logger))?;
        self.config.order.drive(&chain)?;

        let record = SessionRecord {
            config: self.config.clone(),
            encoded: chain.encoded().current_values(),
            output: chain.output().current_values(),
            arrays: chain.arrays().iter().map(|a| ArraySnapshot::of(a)).collect(),
            trace: chain.logger().trace(),
            input,
        };
        tracing::info!(
            calls = record.trace.calls.len(),
            time = record.trace.time.0,
            lossless = record.is_lossless(),
            "session finished"
        );
        Ok(record)
    }
}
