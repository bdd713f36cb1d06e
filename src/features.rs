//! Feature flags gating decoding and validation.
//!
//! Each post-MVP proposal is a flag; the decoder, validator and writers
//! consult the enabled set to decide which opcodes, types and shape variants
//! are legal. A flat bitset is all that is needed: proposals do not inherit
//! from each other at the encoding level.

use std::fmt;
use std::str::FromStr;

/// A single WebAssembly proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Feature {
    /// The base 1.0 instruction set. Always enabled.
    Mvp = 0,
    MutableGlobals,
    SaturatingFloatToInt,
    SignExtension,
    Simd,
    Threads,
    MultiValue,
    TailCall,
    BulkMemory,
    ReferenceTypes,
    FunctionReferences,
    Exceptions,
    Gc,
    Memory64,
}

const ALL_FEATURES: [Feature; 14] = [
    Feature::Mvp,
    Feature::MutableGlobals,
    Feature::SaturatingFloatToInt,
    Feature::SignExtension,
    Feature::Simd,
    Feature::Threads,
    Feature::MultiValue,
    Feature::TailCall,
    Feature::BulkMemory,
    Feature::ReferenceTypes,
    Feature::FunctionReferences,
    Feature::Exceptions,
    Feature::Gc,
    Feature::Memory64,
];

impl Feature {
    fn bit(self) -> u32 {
        1 << (self as u32)
    }

    /// The flag's command-line spelling.
    pub fn name(self) -> &'static str {
        match self {
            Feature::Mvp => "mvp",
            Feature::MutableGlobals => "mutable-globals",
            Feature::SaturatingFloatToInt => "saturating-float-to-int",
            Feature::SignExtension => "sign-extension",
            Feature::Simd => "simd",
            Feature::Threads => "threads",
            Feature::MultiValue => "multi-value",
            Feature::TailCall => "tail-call",
            Feature::BulkMemory => "bulk-memory",
            Feature::ReferenceTypes => "reference-types",
            Feature::FunctionReferences => "function-references",
            Feature::Exceptions => "exceptions",
            Feature::Gc => "gc",
            Feature::Memory64 => "memory64",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Feature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_FEATURES
            .iter()
            .copied()
            .find(|f| f.name() == s)
            .ok_or_else(|| format!("unknown feature: {s}"))
    }
}

/// The set of enabled features.
///
/// `Features::default()` is MVP only; `Features::all()` is the usual choice
/// for tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Features {
    bits: u32,
}

impl Default for Features {
    fn default() -> Self {
        Features::mvp()
    }
}

impl Features {
    /// Only the base instruction set.
    pub fn mvp() -> Features {
        Features {
            bits: Feature::Mvp.bit(),
        }
    }

    /// Every known proposal enabled.
    pub fn all() -> Features {
        let mut features = Features::mvp();
        for f in ALL_FEATURES {
            features.enable(f);
        }
        features
    }

    pub fn enable(&mut self, feature: Feature) -> &mut Self {
        self.bits |= feature.bit();
        self
    }

    pub fn with(mut self, feature: Feature) -> Features {
        self.enable(feature);
        self
    }

    pub fn contains(&self, feature: Feature) -> bool {
        self.bits & feature.bit() != 0
    }

    /// Iterate the enabled flags in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = Feature> + '_ {
        ALL_FEATURES.into_iter().filter(|f| self.contains(*f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mvp_is_always_enabled() {
        assert!(Features::default().contains(Feature::Mvp));
        assert!(Features::all().contains(Feature::Mvp));
    }

    #[test]
    fn enable_is_additive() {
        let mut features = Features::mvp();
        assert!(!features.contains(Feature::Simd));
        features.enable(Feature::Simd);
        assert!(features.contains(Feature::Simd));
        assert!(!features.contains(Feature::Threads));
    }

    #[test]
    fn all_contains_every_flag() {
        let features = Features::all();
        for f in ALL_FEATURES {
            assert!(features.contains(f), "missing {f}");
        }
    }

    #[test]
    fn feature_names_round_trip() {
        for f in ALL_FEATURES {
            assert_eq!(f.name().parse::<Feature>().unwrap(), f);
        }
        assert!("no-such-feature".parse::<Feature>().is_err());
    }
}
