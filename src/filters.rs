//! The VC-2 lifting filter table.
//!
//! Only the synthesis (reconstruction) stages are stored. The analysis stages
//! are derived from them on first use by reversing the order and inverting
//! each stage, and stay referentially stable afterwards.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::stage::LiftKind::{EvenAddOdd, EvenSubtractOdd, OddAddEven, OddSubtractEven};
use crate::stage::LiftingStage;
use crate::LiftingError;

/// Identifiers of the standard VC-2 wavelets.
///
/// The discriminants are the VC-2 wavelet index numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Wavelet {
    /// Deslauriers-Dubuc (9,7).
    DeslauriersDubuc9_7 = 0,
    /// LeGall (5,3).
    #[default]
    LeGall5_3 = 1,
    /// Deslauriers-Dubuc (13,7).
    DeslauriersDubuc13_7 = 2,
    /// Haar with no shift.
    HaarNoShift = 3,
    /// Haar with a single shift per level. Uses the same lifting stages as [`Wavelet::HaarNoShift`].
    HaarWithShift = 4,
    /// Fidelity filter.
    Fidelity = 5,
    /// Daubechies (9,7) integer approximation.
    Daubechies9_7 = 6,
}

impl Wavelet {
    /// Every supported wavelet, in index order.
    pub const ALL: [Wavelet; 7] = [
        Wavelet::DeslauriersDubuc9_7,
        Wavelet::LeGall5_3,
        Wavelet::DeslauriersDubuc13_7,
        Wavelet::HaarNoShift,
        Wavelet::HaarWithShift,
        Wavelet::Fidelity,
        Wavelet::Daubechies9_7,
    ];

    /// The VC-2 wavelet index.
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// The snake_case name, as accepted by [`FromStr`].
    pub const fn name(self) -> &'static str {
        match self {
            Wavelet::DeslauriersDubuc9_7 => "deslauriers_dubuc_9_7",
            Wavelet::LeGall5_3 => "le_gall_5_3",
            Wavelet::DeslauriersDubuc13_7 => "deslauriers_dubuc_13_7",
            Wavelet::HaarNoShift => "haar_no_shift",
            Wavelet::HaarWithShift => "haar_with_shift",
            Wavelet::Fidelity => "fidelity",
            Wavelet::Daubechies9_7 => "daubechies_9_7",
        }
    }
}

impl fmt::Display for Wavelet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for Wavelet {
    type Error = LiftingError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Wavelet::ALL
            .get(id as usize)
            .copied()
            .ok_or_else(|| LiftingError::UnknownWavelet(id.to_string()))
    }
}

impl FromStr for Wavelet {
    type Err = LiftingError;

    /// Parses either the numeric index (`"1"`) or the name (`"le_gall_5_3"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(id) = s.parse::<u8>() {
            return Wavelet::try_from(id);
        }
        Wavelet::ALL
            .iter()
            .copied()
            .find(|w| w.name() == s)
            .ok_or_else(|| LiftingError::UnknownWavelet(s.to_string()))
    }
}

const DESLAURIERS_DUBUC_9_7: [LiftingStage; 2] = [
    LiftingStage::new(EvenSubtractOdd, 2, 2, 0, &[1, 1]),
    LiftingStage::new(OddAddEven, 4, 4, -1, &[-1, 9, 9, -1]),
];

const LE_GALL_5_3: [LiftingStage; 2] = [
    LiftingStage::new(EvenSubtractOdd, 2, 2, 0, &[1, 1]),
    LiftingStage::new(OddAddEven, 1, 2, 0, &[1, 1]),
];

const DESLAURIERS_DUBUC_13_7: [LiftingStage; 2] = [
    LiftingStage::new(EvenSubtractOdd, 5, 4, -1, &[-1, 9, 9, -1]),
    LiftingStage::new(OddAddEven, 4, 4, -1, &[-1, 9, 9, -1]),
];

const HAAR: [LiftingStage; 2] = [
    LiftingStage::new(EvenSubtractOdd, 1, 1, 1, &[1]),
    LiftingStage::new(OddAddEven, 0, 1, 0, &[1]),
];

const FIDELITY: [LiftingStage; 2] = [
    LiftingStage::new(OddAddEven, 8, 8, -3, &[-2, -10, -25, 81, 81, -25, 10, -2]),
    LiftingStage::new(EvenSubtractOdd, 8, 8, -3, &[-8, 21, -46, 161, 161, -46, 21, -8]),
];

const DAUBECHIES_9_7: [LiftingStage; 4] = [
    LiftingStage::new(EvenSubtractOdd, 12, 2, 0, &[1817, 1817]),
    LiftingStage::new(OddSubtractEven, 12, 2, 0, &[3616, 3616]),
    LiftingStage::new(EvenAddOdd, 12, 2, 0, &[217, 217]),
    LiftingStage::new(OddAddEven, 12, 2, 0, &[6497, 6497]),
];

impl From<Wavelet> for String {
    fn from(wavelet: Wavelet) -> Self {
        wavelet.name().to_string()
    }
}

impl TryFrom<String> for Wavelet {
    type Error = LiftingError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Synthesis (reconstruction) stages of `wavelet`, in application order.
pub fn synthesis_stages(wavelet: Wavelet) -> &'static [LiftingStage] {
    match wavelet {
        Wavelet::DeslauriersDubuc9_7 => &DESLAURIERS_DUBUC_9_7,
        Wavelet::LeGall5_3 => &LE_GALL_5_3,
        Wavelet::DeslauriersDubuc13_7 => &DESLAURIERS_DUBUC_13_7,
        Wavelet::HaarNoShift | Wavelet::HaarWithShift => &HAAR,
        Wavelet::Fidelity => &FIDELITY,
        Wavelet::Daubechies9_7 => &DAUBECHIES_9_7,
    }
}

/// Analysis (decomposition) stages of `wavelet`, in application order.
///
/// These are the synthesis stages reversed, each one inverted.
pub fn analysis_stages(wavelet: Wavelet) -> &'static [LiftingStage] {
    static ANALYSIS: OnceLock<Vec<Vec<LiftingStage>>> = OnceLock::new();
    let table = ANALYSIS.get_or_init(|| {
        Wavelet::ALL
            .iter()
            .map(|&w| {
                synthesis_stages(w)
                    .iter()
                    .rev()
                    .map(|stage| stage.inverted())
                    .collect()
            })
            .collect()
    });
    &table[wavelet.id() as usize]
}

/// Analysis and synthesis stages of one wavelet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterPair {
    /// Forward direction.
    pub analysis: &'static [LiftingStage],
    /// Inverse direction.
    pub synthesis: &'static [LiftingStage],
}

/// Fetch the stages of `wavelet`.
pub fn lookup(wavelet: Wavelet) -> FilterPair {
    FilterPair {
        analysis: analysis_stages(wavelet),
        synthesis: synthesis_stages(wavelet),
    }
}

/// Fetch the stages of the wavelet with VC-2 index `id`.
pub fn lookup_id(id: u8) -> Result<FilterPair, LiftingError> {
    Wavelet::try_from(id).map(lookup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::LiftKind;

    #[test]
    fn test_ids_match_table_order() {
        for (i, wavelet) in Wavelet::ALL.iter().enumerate() {
            assert_eq!(wavelet.id() as usize, i);
            assert_eq!(Wavelet::try_from(i as u8).unwrap(), *wavelet);
        }
    }

    #[test]
    fn test_parse_by_id_and_name() {
        assert_eq!("1".parse::<Wavelet>().unwrap(), Wavelet::LeGall5_3);
        assert_eq!("fidelity".parse::<Wavelet>().unwrap(), Wavelet::Fidelity);
        assert_eq!(
            Wavelet::Daubechies9_7.to_string().parse::<Wavelet>().unwrap(),
            Wavelet::Daubechies9_7
        );
    }

    #[test]
    fn test_unknown_wavelet() {
        assert!(matches!(
            "7".parse::<Wavelet>(),
            Err(LiftingError::UnknownWavelet(s)) if s == "7"
        ));
        assert!(matches!(
            "coif4".parse::<Wavelet>(),
            Err(LiftingError::UnknownWavelet(s)) if s == "coif4"
        ));
        assert!(matches!(lookup_id(42), Err(LiftingError::UnknownWavelet(_))));
    }

    #[test]
    fn test_analysis_is_reversed_inverse_of_synthesis() {
        for wavelet in Wavelet::ALL {
            let pair = lookup(wavelet);
            assert_eq!(pair.analysis.len(), pair.synthesis.len());
            for (a, s) in pair.analysis.iter().zip(pair.synthesis.iter().rev()) {
                assert_eq!(*a, s.inverted());
            }
        }
    }

    #[test]
    fn test_serde_uses_names() {
        let json = serde_json::to_string(&Wavelet::DeslauriersDubuc13_7).unwrap();
        assert_eq!(json, "\"deslauriers_dubuc_13_7\"");
        let back: Wavelet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Wavelet::DeslauriersDubuc13_7);
        assert!(serde_json::from_str::<Wavelet>("\"coif4\"").is_err());
    }

    #[test]
    fn test_le_gall_analysis_stages() {
        let analysis = analysis_stages(Wavelet::LeGall5_3);
        assert_eq!(analysis[0].kind(), LiftKind::OddSubtractEven);
        assert_eq!(analysis[0].shift(), 1);
        assert_eq!(analysis[1].kind(), LiftKind::EvenAddOdd);
        assert_eq!(analysis[1].shift(), 2);
    }

    #[test]
    fn test_analysis_table_is_stable() {
        let first = analysis_stages(Wavelet::Fidelity);
        let second = analysis_stages(Wavelet::Fidelity);
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn test_haar_variants_share_stages() {
        assert_eq!(
            synthesis_stages(Wavelet::HaarNoShift),
            synthesis_stages(Wavelet::HaarWithShift)
        );
    }
}
