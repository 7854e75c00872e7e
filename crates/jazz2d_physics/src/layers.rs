//! Collision layer masks
//!
//! Layers partition physics objects into independent broad phase grids.
//! Masks are usually written as bitstrings where character `i` (left to
//! right) enables layer `i`, so `"0001"` selects layer 3 only.

use std::str::FromStr;

use bitflags::bitflags;

use crate::error::PhysicsError;

bitflags! {
    /// Set of collision layers
    ///
    /// Each layer is a bit in a 32-bit mask. Objects register into the grids
    /// of their `layers` mask and query the grids of their `collision_layers`
    /// mask.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct LayerMask: u32 {
        const NONE = 0;
        const LAYER_0 = 1 << 0;
        const LAYER_1 = 1 << 1;
        const LAYER_2 = 1 << 2;
        const LAYER_3 = 1 << 3;
        const ALL = 0xFFFF_FFFF;
    }
}

impl Default for LayerMask {
    /// The `"0001"` mask: layer 3 only
    fn default() -> Self {
        LayerMask::LAYER_3
    }
}

impl LayerMask {
    /// Maximum number of layers a mask can address
    pub const MAX_LAYERS: usize = 32;

    /// Mask with only the given layer set
    pub fn layer(index: usize) -> Result<Self, PhysicsError> {
        if index >= Self::MAX_LAYERS {
            return Err(PhysicsError::InvalidLayers(format!(
                "layer {} exceeds the {} addressable layers",
                index,
                Self::MAX_LAYERS
            )));
        }
        Ok(Self::from_bits_retain(1 << index))
    }

    /// Parse a bitstring such as `"0101"`
    pub fn from_bitstring(bits: &str) -> Result<Self, PhysicsError> {
        if bits.len() > Self::MAX_LAYERS {
            return Err(PhysicsError::InvalidLayers(format!(
                "'{}' is longer than {} layers",
                bits,
                Self::MAX_LAYERS
            )));
        }
        let mut mask = Self::NONE;
        for (index, flag) in bits.chars().enumerate() {
            match flag {
                '1' => mask |= Self::from_bits_retain(1 << index),
                '0' => {}
                other => {
                    return Err(PhysicsError::InvalidLayers(format!(
                        "'{}' contains '{}', expected only '0' and '1'",
                        bits, other
                    )))
                }
            }
        }
        Ok(mask)
    }

    /// Render the first `len` layers as a bitstring
    pub fn to_bitstring(&self, len: usize) -> String {
        (0..len.min(Self::MAX_LAYERS))
            .map(|i| if self.bits() & (1 << i) != 0 { '1' } else { '0' })
            .collect()
    }

    /// Indices of every layer set in this mask, in ascending order
    pub fn indices(&self) -> impl Iterator<Item = usize> {
        let bits = self.bits();
        (0..Self::MAX_LAYERS).filter(move |i| bits & (1 << i) != 0)
    }

    /// Highest layer index set, or `None` for an empty mask
    pub fn highest(&self) -> Option<usize> {
        if self.is_empty() {
            None
        } else {
            Some(Self::MAX_LAYERS - 1 - self.bits().leading_zeros() as usize)
        }
    }
}

impl FromStr for LayerMask {
    type Err = PhysicsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bitstring(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_last_of_four() {
        assert_eq!(LayerMask::default(), LayerMask::from_bitstring("0001").unwrap());
        assert_eq!(LayerMask::default().indices().collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn test_parse_bitstring() {
        let mask: LayerMask = "1010".parse().unwrap();
        assert!(mask.contains(LayerMask::LAYER_0));
        assert!(mask.contains(LayerMask::LAYER_2));
        assert!(!mask.contains(LayerMask::LAYER_1));
        assert_eq!(mask.to_bitstring(4), "1010");
        assert_eq!(mask.highest(), Some(2));
    }

    #[test]
    fn test_parse_empty_and_zero() {
        assert_eq!(LayerMask::from_bitstring("").unwrap(), LayerMask::NONE);
        assert_eq!(LayerMask::from_bitstring("0000").unwrap(), LayerMask::NONE);
        assert_eq!(LayerMask::NONE.highest(), None);
    }

    #[test]
    fn test_parse_rejects_bad_characters() {
        let err = LayerMask::from_bitstring("01x1").unwrap_err();
        assert!(matches!(err, PhysicsError::InvalidLayers(_)));
    }

    #[test]
    fn test_parse_rejects_too_long() {
        let bits = "1".repeat(33);
        assert!(LayerMask::from_bitstring(&bits).is_err());
    }

    #[test]
    fn test_single_layer() {
        assert_eq!(LayerMask::layer(1).unwrap(), LayerMask::LAYER_1);
        assert_eq!(LayerMask::layer(31).unwrap().highest(), Some(31));
        assert!(LayerMask::layer(32).is_err());
    }
}
