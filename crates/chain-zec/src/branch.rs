use crate::error::ZecError;

/// Network upgrades whose consensus branch id may be committed to by a v4
/// transaction signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConsensusBranch {
    Overwinter,
    Sapling,
    Blossom,
    Heartwood,
    Canopy,
    Nu5,
    #[default]
    Nu6,
}

impl ConsensusBranch {
    pub const ALL: [ConsensusBranch; 7] = [
        ConsensusBranch::Overwinter,
        ConsensusBranch::Sapling,
        ConsensusBranch::Blossom,
        ConsensusBranch::Heartwood,
        ConsensusBranch::Canopy,
        ConsensusBranch::Nu5,
        ConsensusBranch::Nu6,
    ];

    pub fn id(&self) -> u32 {
        match self {
            ConsensusBranch::Overwinter => 0x5BA8_1B19,
            ConsensusBranch::Sapling => 0x76B8_09BB,
            ConsensusBranch::Blossom => 0x2BB4_0E60,
            ConsensusBranch::Heartwood => 0xF5B9_230B,
            ConsensusBranch::Canopy => 0xE9FF_75A6,
            ConsensusBranch::Nu5 => 0xC2D6_D0B4,
            ConsensusBranch::Nu6 => 0xC8E7_1055,
        }
    }

    pub fn from_id(id: u32) -> Result<Self, ZecError> {
        Self::ALL
            .into_iter()
            .find(|b| b.id() == id)
            .ok_or(ZecError::UnknownBranchId(id))
    }
}

impl std::fmt::Display for ConsensusBranch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConsensusBranch::Overwinter => "overwinter",
            ConsensusBranch::Sapling => "sapling",
            ConsensusBranch::Blossom => "blossom",
            ConsensusBranch::Heartwood => "heartwood",
            ConsensusBranch::Canopy => "canopy",
            ConsensusBranch::Nu5 => "nu5",
            ConsensusBranch::Nu6 => "nu6",
        };
        write!(f, "{name}")
    }
}
