//! Evaluation orders for driving a [`TransformChain`].
//!
//! The chain is purely structural; these patterns decide in which order its
//! slots are forced, which is what the instrumentation log then records.
//! Final values do not depend on the pattern.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::chain::TransformChain;
use crate::LiftingError;

/// Order in which the slots of a chain are forced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessPattern {
    /// Compute each array in its entirety, one after the other.
    #[default]
    Block,
    /// Compute as if every lifting stage were a FIR filter in a pipeline, each
    /// running a fixed delay behind its predecessor.
    Chained,
    /// Read only the output; everything else is computed on demand.
    Lazy,
    /// Read the encoded array, then the output.
    LazyTwoSteps,
}

impl AccessPattern {
    pub const ALL: [AccessPattern; 4] = [
        AccessPattern::Block,
        AccessPattern::Chained,
        AccessPattern::Lazy,
        AccessPattern::LazyTwoSteps,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            AccessPattern::Block => "block",
            AccessPattern::Chained => "chained",
            AccessPattern::Lazy => "lazy",
            AccessPattern::LazyTwoSteps => "lazy_two_steps",
        }
    }

    /// Force the slots of `chain` in this order.
    #[tracing::instrument(skip(chain), fields(wavelet = %chain.wavelet()))]
    pub fn drive(self, chain: &TransformChain) -> Result<(), LiftingError> {
        match self {
            AccessPattern::Block => {
                for array in chain.arrays() {
                    array.read_all()?;
                }
            }
            AccessPattern::Chained => {
                let delays = pipeline_delays(chain);
                let max_delay = delays.iter().copied().max().unwrap_or(0);
                let len = chain.signal_len();
                for step in 0..len + max_delay {
                    for (array, &delay) in chain.arrays().iter().zip(&delays) {
                        if let Some(index) = step.checked_sub(delay).filter(|&i| i < len) {
                            array.read(index)?;
                        }
                    }
                }
            }
            AccessPattern::Lazy => {
                chain.output().read_all()?;
            }
            AccessPattern::LazyTwoSteps => {
                chain.encoded().read_all()?;
                chain.output().read_all()?;
            }
        }
        tracing::debug!(time = chain.logger().now().0, "access pattern finished");
        Ok(())
    }
}

/// Per-array delays for [`AccessPattern::Chained`]: the input starts at 0 and
/// each lifted array lags its source by the stage's tap count.
///
/// The lag only paces the reads for display; a read that runs ahead of the
/// pipeline is still correct, it just computes its sources on demand.
fn pipeline_delays(chain: &TransformChain) -> Vec<usize> {
    let stages = crate::filters::lookup(chain.wavelet());
    let mut delays = vec![0];
    for stage in stages.analysis.iter().chain(stages.synthesis) {
        let previous = delays[delays.len() - 1];
        delays.push(previous + stage.length());
    }
    delays
}

impl fmt::Display for AccessPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AccessPattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AccessPattern::ALL
            .iter()
            .copied()
            .find(|pattern| pattern.name() == s)
            .ok_or_else(|| format!("unknown access pattern: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AccessLogger, Wavelet};
    use std::sync::Arc;

    fn chain(input: &[i64]) -> TransformChain {
        TransformChain::build(input, Wavelet::LeGall5_3, Arc::new(AccessLogger::new())).unwrap()
    }

    #[test]
    fn test_parse_names() {
        for pattern in AccessPattern::ALL {
            assert_eq!(pattern.to_string().parse::<AccessPattern>().unwrap(), pattern);
        }
        assert!("random".parse::<AccessPattern>().is_err());
    }

    #[test]
    fn test_block_resolves_everything() {
        let chain = chain(&[3, 1, 4, 1, 5]);
        AccessPattern::Block.drive(&chain).unwrap();
        for array in chain.arrays() {
            assert!(array.current_values().iter().all(Option::is_some));
        }
        // Every lifted slot is computed exactly once.
        assert_eq!(chain.logger().call_log().len(), 4 * 5);
    }

    #[test]
    fn test_block_computes_in_array_order() {
        let chain = chain(&[3, 1, 4, 1]);
        AccessPattern::Block.drive(&chain).unwrap();
        let order: Vec<String> = chain
            .logger()
            .call_log()
            .into_iter()
            .map(|call| call.array_name)
            .collect();
        let mut sorted = order.clone();
        let position = |name: &String| chain.arrays().iter().position(|a| a.name() == name);
        sorted.sort_by_key(position);
        assert_eq!(order, sorted);
    }

    #[test]
    fn test_lazy_starts_from_output() {
        let chain = chain(&[9, 8, 7, 6]);
        AccessPattern::Lazy.drive(&chain).unwrap();
        let calls = chain.logger().call_log();
        assert_eq!(calls[0].array_name, "Decoder Output");
        assert_eq!(calls[0].index, 0);
    }

    #[test]
    fn test_lazy_two_steps_finishes_encoding_first() {
        let chain = chain(&[9, 8, 7, 6, 5, 4]);
        AccessPattern::LazyTwoSteps.drive(&chain).unwrap();
        let calls = chain.logger().call_log();
        let first_decode = calls
            .iter()
            .position(|call| call.array_name.starts_with("Decode"))
            .unwrap();
        assert!(calls[..first_decode]
            .iter()
            .all(|call| call.array_name.starts_with("Encode")));
        assert_eq!(
            chain.encoded().current_values().iter().filter(|v| v.is_some()).count(),
            6
        );
    }

    #[test]
    fn test_chained_delays() {
        let chain = chain(&[0; 4]);
        assert_eq!(pipeline_delays(&chain), vec![0, 2, 4, 6, 8]);
    }
}
