//! Access widths supported by the bridge and the helpers used to widen and truncate values.
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Width {
    W8 = 8,
    W16 = 16,
    W32 = 32,
}

impl Width {
    #[inline(always)]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    #[inline(always)]
    pub const fn bytes(self) -> usize {
        self as usize / 8
    }

    /// Mask selecting the bits a store of this width keeps.
    #[inline(always)]
    pub const fn mask(self) -> u32 {
        match self {
            Width::W8 => 0xFF,
            Width::W16 => 0xFFFF,
            Width::W32 => 0xFFFF_FFFF,
        }
    }

    pub const fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            8 => Some(Width::W8),
            16 => Some(Width::W16),
            32 => Some(Width::W32),
            _ => None,
        }
    }
}

impl TryFrom<u8> for Width {
    type Error = u8;

    fn try_from(bits: u8) -> Result<Self, u8> {
        Width::from_bits(bits).ok_or(bits)
    }
}

impl fmt::Display for Width {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits())
    }
}
