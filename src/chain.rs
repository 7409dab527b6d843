//! Construction of the full encode/decode chain of lazy arrays.

use std::sync::Arc;

use crate::array::LazyArray;
use crate::filters::{self, Wavelet};
use crate::logger::AccessLogger;
use crate::stage::LiftingStage;
use crate::LiftingError;

/// Name of the pre-populated input array.
pub const INPUT_NAME: &str = "Encoder Input";
/// Name of the last analysis array.
pub const ENCODED_NAME: &str = "Encode Out/Decode In";
/// Name of the last synthesis array.
pub const OUTPUT_NAME: &str = "Decoder Output";

const ENCODE_PREFIX: &str = "Encode Intermediate ";
const DECODE_PREFIX: &str = "Decode Intermediate ";

/// Shortest input the boundary clamp can handle: one sample of each parity.
pub const MIN_INPUT_LEN: usize = 2;

/// The arrays `input → analysis stages → synthesis stages`, each lifted from
/// its predecessor.
///
/// Building a chain computes nothing; values are produced as the caller reads
/// them, in whatever order it chooses.
#[derive(Debug, Clone)]
pub struct TransformChain {
    wavelet: Wavelet,
    arrays: Vec<Arc<LazyArray<i64>>>,
    analysis_len: usize,
    logger: Arc<AccessLogger>,
}

impl TransformChain {
    /// Build the chain for `input` and `wavelet`, recording into `logger`.
    ///
    /// # Errors
    ///
    /// `InputTooShort` if `input` has fewer than [`MIN_INPUT_LEN`] samples.
    #[tracing::instrument(skip(input, logger), fields(len = input.len()))]
    pub fn build(
        input: &[i64],
        wavelet: Wavelet,
        logger: Arc<AccessLogger>,
    ) -> Result<Self, LiftingError> {
        if input.len() < MIN_INPUT_LEN {
            return Err(LiftingError::InputTooShort {
                len: input.len(),
                min: MIN_INPUT_LEN,
            });
        }

        let stages = filters::lookup(wavelet);
        let input = Arc::new(LazyArray::from_values(
            INPUT_NAME,
            input.iter().copied(),
            logger.clone(),
        ));

        let mut arrays = vec![input.clone()];
        arrays.extend(lift_stages(input, stages.analysis, ENCODE_PREFIX, ENCODED_NAME));
        let encoded = arrays[arrays.len() - 1].clone();
        arrays.extend(lift_stages(encoded, stages.synthesis, DECODE_PREFIX, OUTPUT_NAME));

        tracing::debug!(arrays = arrays.len(), "built transform chain");

        Ok(Self {
            wavelet,
            arrays,
            analysis_len: stages.analysis.len(),
            logger,
        })
    }

    pub fn wavelet(&self) -> Wavelet {
        self.wavelet
    }

    pub fn logger(&self) -> &Arc<AccessLogger> {
        &self.logger
    }

    /// Every array, input first, output last.
    pub fn arrays(&self) -> &[Arc<LazyArray<i64>>] {
        &self.arrays
    }

    /// Look up an array by name.
    pub fn array(&self, name: &str) -> Option<&Arc<LazyArray<i64>>> {
        self.arrays.iter().find(|array| array.name() == name)
    }

    pub fn input(&self) -> &Arc<LazyArray<i64>> {
        &self.arrays[0]
    }

    /// The fully analysed (encoded) array.
    pub fn encoded(&self) -> &Arc<LazyArray<i64>> {
        &self.arrays[self.analysis_len]
    }

    /// The fully synthesised (decoded) array.
    pub fn output(&self) -> &Arc<LazyArray<i64>> {
        &self.arrays[self.arrays.len() - 1]
    }

    /// Number of analysis stages.
    pub fn analysis_len(&self) -> usize {
        self.analysis_len
    }

    /// Number of synthesis stages.
    pub fn synthesis_len(&self) -> usize {
        self.arrays.len() - 1 - self.analysis_len
    }

    /// Number of samples in every array of the chain.
    pub fn signal_len(&self) -> usize {
        self.arrays[0].len()
    }
}

/// One lifted array per stage, each reading the previous one. Intermediate
/// arrays are numbered from 1; the last one gets `final_name`.
fn lift_stages(
    source: Arc<LazyArray<i64>>,
    stages: &[LiftingStage],
    intermediate_prefix: &str,
    final_name: &str,
) -> Vec<Arc<LazyArray<i64>>> {
    let mut out = Vec::with_capacity(stages.len());
    let mut previous = source;
    for (i, stage) in stages.iter().enumerate() {
        let name = if i + 1 == stages.len() {
            final_name.to_string()
        } else {
            format!("{intermediate_prefix}{}", i + 1)
        };
        let array = Arc::new(LazyArray::lifted(name, previous, *stage));
        out.push(array.clone());
        previous = array;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(input: &[i64], wavelet: Wavelet) -> TransformChain {
        TransformChain::build(input, wavelet, Arc::new(AccessLogger::new())).unwrap()
    }

    #[test]
    fn test_names_for_two_stage_wavelet() {
        let chain = build(&[1, 2, 3, 4], Wavelet::LeGall5_3);
        let names: Vec<&str> = chain.arrays().iter().map(|a| a.name()).collect();
        assert_eq!(
            names,
            vec![
                "Encoder Input",
                "Encode Intermediate 1",
                "Encode Out/Decode In",
                "Decode Intermediate 1",
                "Decoder Output",
            ]
        );
        assert_eq!(chain.encoded().name(), ENCODED_NAME);
        assert_eq!(chain.output().name(), OUTPUT_NAME);
    }

    #[test]
    fn test_names_for_four_stage_wavelet() {
        let chain = build(&[0; 6], Wavelet::Daubechies9_7);
        assert_eq!(chain.arrays().len(), 9);
        assert_eq!(chain.analysis_len(), 4);
        assert_eq!(chain.synthesis_len(), 4);
        assert_eq!(chain.arrays()[3].name(), "Encode Intermediate 3");
        assert_eq!(chain.arrays()[4].name(), ENCODED_NAME);
        assert_eq!(chain.arrays()[7].name(), "Decode Intermediate 3");
        assert!(chain.array("Decode Intermediate 4").is_none());
    }

    #[test]
    fn test_build_computes_nothing() {
        let chain = build(&[5, 6, 7], Wavelet::Fidelity);
        assert_eq!(chain.logger().now().0, 0);
        for array in &chain.arrays()[1..] {
            assert_eq!(array.len(), 3);
            assert!(array.current_values().iter().all(Option::is_none));
        }
        assert_eq!(chain.input().current_values(), vec![Some(5), Some(6), Some(7)]);
    }

    #[test]
    fn test_all_arrays_share_one_logger() {
        let chain = build(&[1, 2], Wavelet::HaarNoShift);
        for array in chain.arrays() {
            assert!(Arc::ptr_eq(array.logger(), chain.logger()));
        }
    }

    #[test]
    fn test_input_too_short() {
        for input in [&[][..], &[1][..]] {
            let err = TransformChain::build(input, Wavelet::LeGall5_3, Arc::new(AccessLogger::new()))
                .unwrap_err();
            assert!(matches!(err, LiftingError::InputTooShort { min: 2, .. }));
        }
    }

    #[test]
    fn test_le_gall_encodes_by_hand() {
        let chain = build(&[1, 2, 3, 4], Wavelet::LeGall5_3);
        assert_eq!(chain.encoded().read_all().unwrap(), vec![1, 0, 3, 1]);
        assert_eq!(chain.output().read_all().unwrap(), vec![1, 2, 3, 4]);
    }
}
