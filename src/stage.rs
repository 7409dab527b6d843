//! Lifting stage descriptors and the arithmetic that applies one stage.
//!
//! A stage rewrites every sample of one parity (even or odd indices) from a
//! weighted sum of the other parity's samples; the untouched parity is copied
//! through. Because a stage never reads the parity it rewrites, applying the
//! stage and then its [inverse](LiftingStage::inverted) restores the input
//! exactly.

use serde::Serialize;

use crate::LiftingError;

/// Which parity a stage rewrites, and whether the correction is added or subtracted.
///
/// The VC-2 type numbers are available through [`LiftKind::vc2_id`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LiftKind {
    /// Type 1: even samples += weighted odd samples.
    EvenAddOdd,
    /// Type 2: even samples -= weighted odd samples.
    EvenSubtractOdd,
    /// Type 3: odd samples += weighted even samples.
    OddAddEven,
    /// Type 4: odd samples -= weighted even samples.
    OddSubtractEven,
}

impl LiftKind {
    /// Look up a kind by its VC-2 type number (1..=4).
    pub const fn from_vc2_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(LiftKind::EvenAddOdd),
            2 => Some(LiftKind::EvenSubtractOdd),
            3 => Some(LiftKind::OddAddEven),
            4 => Some(LiftKind::OddSubtractEven),
            _ => None,
        }
    }

    /// The VC-2 type number of this kind.
    pub const fn vc2_id(self) -> u8 {
        match self {
            LiftKind::EvenAddOdd => 1,
            LiftKind::EvenSubtractOdd => 2,
            LiftKind::OddAddEven => 3,
            LiftKind::OddSubtractEven => 4,
        }
    }

    /// Returns true if this kind rewrites even-indexed samples.
    pub const fn updates_even(self) -> bool {
        matches!(self, LiftKind::EvenAddOdd | LiftKind::EvenSubtractOdd)
    }

    /// Returns true if the correction is added rather than subtracted.
    pub const fn is_add(self) -> bool {
        matches!(self, LiftKind::EvenAddOdd | LiftKind::OddAddEven)
    }

    /// The kind that undoes this one: same parity, opposite sign.
    pub const fn inverted(self) -> Self {
        match self {
            LiftKind::EvenAddOdd => LiftKind::EvenSubtractOdd,
            LiftKind::EvenSubtractOdd => LiftKind::EvenAddOdd,
            LiftKind::OddAddEven => LiftKind::OddSubtractEven,
            LiftKind::OddSubtractEven => LiftKind::OddAddEven,
        }
    }
}

/// An immutable lifting stage descriptor.
///
/// The tap count always equals the declared length; [`LiftingStage::new`]
/// enforces this, at compile time for `const` tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LiftingStage {
    kind: LiftKind,
    shift: u32,
    length: usize,
    delay: isize,
    taps: &'static [i64],
}

impl LiftingStage {
    /// Create a stage descriptor.
    ///
    /// # Panics
    ///
    /// Panics if `taps.len() != length`. In a `const` context this is a
    /// compile error.
    pub const fn new(
        kind: LiftKind,
        shift: u32,
        length: usize,
        delay: isize,
        taps: &'static [i64],
    ) -> Self {
        assert!(
            taps.len() == length,
            "lifting stage tap count does not match its declared length"
        );
        Self {
            kind,
            shift,
            length,
            delay,
            taps,
        }
    }

    /// Which parity is rewritten and with which sign.
    pub const fn kind(&self) -> LiftKind {
        self.kind
    }

    /// Rounding right shift applied to the weighted sum.
    pub const fn shift(&self) -> u32 {
        self.shift
    }

    /// Number of taps.
    pub const fn length(&self) -> usize {
        self.length
    }

    /// Offset of the first tap, in units of opposite-parity samples.
    pub const fn delay(&self) -> isize {
        self.delay
    }

    /// Filter weights.
    pub const fn taps(&self) -> &'static [i64] {
        self.taps
    }

    /// The stage that undoes this one. Inverting twice yields the original.
    #[must_use]
    pub const fn inverted(self) -> Self {
        Self {
            kind: self.kind.inverted(),
            ..self
        }
    }
}

/// Anything a lifting stage can read samples from.
pub trait SampleSource {
    /// Number of samples.
    fn len(&self) -> usize;

    /// Returns true if there are no samples.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read the sample at `index`.
    fn sample(&self, index: usize) -> Result<i64, LiftingError>;

    /// Name used in error reports.
    fn source_name(&self) -> &str {
        "<slice>"
    }
}

impl SampleSource for [i64] {
    fn len(&self) -> usize {
        <[i64]>::len(self)
    }

    fn sample(&self, index: usize) -> Result<i64, LiftingError> {
        self.get(index)
            .copied()
            .ok_or_else(|| LiftingError::IndexOutOfRange {
                array: "<slice>".to_string(),
                index,
                len: <[i64]>::len(self),
            })
    }
}

/// Inclusive range of neighbor positions a stage may read, for a source of `len` samples.
///
/// The range covers exactly the opposite parity's samples, so clamping a
/// neighbor position replicates the nearest edge sample of that parity.
fn neighbor_bounds(updates_even: bool, len: usize) -> (isize, isize) {
    let len = len as isize;
    let last_odd = if len % 2 == 0 { len - 1 } else { len - 2 };
    let last_even = if len % 2 == 0 { len - 2 } else { len - 1 };
    if updates_even {
        (1, last_odd)
    } else {
        (0, last_even)
    }
}

/// Compute the value at `index` after applying `stage` to `source`.
///
/// Samples of the parity the stage does not rewrite are copied from `source`.
/// The weighted sum is accumulated in `i128`, so intermediate products never
/// wrap; only a result outside the `i64` range is rejected.
///
/// # Errors
///
/// `Overflow` if the updated sample does not fit in an `i64`.
pub fn evaluate<S>(stage: &LiftingStage, source: &S, index: usize) -> Result<i64, LiftingError>
where
    S: SampleSource + ?Sized,
{
    let updates_even = stage.kind.updates_even();
    if (index % 2 == 0) != updates_even {
        return source.sample(index);
    }

    if source.len() < 2 {
        return Err(LiftingError::InputTooShort {
            len: source.len(),
            min: 2,
        });
    }

    let (lo, hi) = neighbor_bounds(updates_even, source.len());
    let mut sum: i128 = 0;
    for (k, &tap) in stage.taps.iter().enumerate() {
        let pos = index as isize + 2 * (k as isize + stage.delay) - 1;
        sum += i128::from(tap) * i128::from(source.sample(pos.clamp(lo, hi) as usize)?);
    }
    if stage.shift > 0 {
        sum += 1 << (stage.shift - 1);
    }
    sum >>= stage.shift;

    let current = i128::from(source.sample(index)?);
    let updated = if stage.kind.is_add() {
        current + sum
    } else {
        current - sum
    };
    i64::try_from(updated).map_err(|_| LiftingError::Overflow {
        array: source.source_name().to_string(),
        index,
    })
}

/// Apply `stage` to every sample of `input` eagerly.
pub fn apply(stage: &LiftingStage, input: &[i64]) -> Result<Vec<i64>, LiftingError> {
    (0..input.len())
        .map(|index| evaluate(stage, input, index))
        .collect()
}
