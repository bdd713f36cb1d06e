//! Core type domain shared by the readers, validator and writers.

use std::fmt;
use std::ops::{Deref, DerefMut};

use crate::error::WasmError;
use crate::features::{Feature, Features};

/// A value annotated with the byte offset it was decoded from.
///
/// The position is informational only: it never participates in equality or
/// hashing, so structurally equal modules compare equal regardless of where
/// their pieces were read from.
#[derive(Clone, Copy)]
pub struct At<T> {
    value: T,
    offset: usize,
}

impl<T> At<T> {
    pub fn new(value: T, offset: usize) -> At<T> {
        At { value, offset }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

impl<T> Deref for At<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for At<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T: PartialEq> PartialEq for At<T> {
    fn eq(&self, other: &At<T>) -> bool {
        self.value == other.value
    }
}

impl<T: Eq> Eq for At<T> {}

impl<T: fmt::Debug> fmt::Debug for At<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}

impl<T: fmt::Display> fmt::Display for At<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}

/// A value type: numeric, vector or reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    I32,
    I64,
    F32,
    F64,
    V128,
    FuncRef,
    ExternRef,
    ExnRef,
}

impl ValueType {
    pub fn is_value_type_byte(byte: u8) -> bool {
        matches!(byte, 0x7f | 0x7e | 0x7d | 0x7c | 0x7b | 0x70 | 0x6f | 0x68)
    }

    /// Decode a value type byte, checking the feature gates that introduced
    /// the non-MVP types.
    pub fn decode(byte: u8, offset: usize, features: &Features) -> Result<ValueType, WasmError> {
        let (vt, gate) = match byte {
            0x7f => (ValueType::I32, Feature::Mvp),
            0x7e => (ValueType::I64, Feature::Mvp),
            0x7d => (ValueType::F32, Feature::Mvp),
            0x7c => (ValueType::F64, Feature::Mvp),
            0x7b => (ValueType::V128, Feature::Simd),
            0x70 => (ValueType::FuncRef, Feature::ReferenceTypes),
            0x6f => (ValueType::ExternRef, Feature::ReferenceTypes),
            0x68 => (ValueType::ExnRef, Feature::Exceptions),
            _ => {
                return Err(WasmError::malformed(
                    offset,
                    format!("invalid value type: 0x{byte:02x}"),
                ))
            }
        };
        if !features.contains(gate) {
            return Err(WasmError::malformed(
                offset,
                format!("value type {vt} requires the {} feature", gate.name()),
            ));
        }
        Ok(vt)
    }

    pub fn wire_byte(self) -> u8 {
        match self {
            ValueType::I32 => 0x7f,
            ValueType::I64 => 0x7e,
            ValueType::F32 => 0x7d,
            ValueType::F64 => 0x7c,
            ValueType::V128 => 0x7b,
            ValueType::FuncRef => 0x70,
            ValueType::ExternRef => 0x6f,
            ValueType::ExnRef => 0x68,
        }
    }

    pub fn is_num(self) -> bool {
        matches!(
            self,
            ValueType::I32 | ValueType::I64 | ValueType::F32 | ValueType::F64
        )
    }

    pub fn is_vec(self) -> bool {
        self == ValueType::V128
    }

    pub fn is_ref(self) -> bool {
        matches!(
            self,
            ValueType::FuncRef | ValueType::ExternRef | ValueType::ExnRef
        )
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueType::I32 => "i32",
            ValueType::I64 => "i64",
            ValueType::F32 => "f32",
            ValueType::F64 => "f64",
            ValueType::V128 => "v128",
            ValueType::FuncRef => "funcref",
            ValueType::ExternRef => "externref",
            ValueType::ExnRef => "exnref",
        })
    }
}

/// A reference type, used for tables, element segments and `ref.null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefType {
    FuncRef,
    ExternRef,
    ExnRef,
}

impl RefType {
    pub fn decode(byte: u8, offset: usize, features: &Features) -> Result<RefType, WasmError> {
        match byte {
            0x70 => Ok(RefType::FuncRef),
            0x6f if features.contains(Feature::ReferenceTypes) => Ok(RefType::ExternRef),
            0x68 if features.contains(Feature::Exceptions) => Ok(RefType::ExnRef),
            _ => Err(WasmError::malformed(
                offset,
                format!("invalid reference type: 0x{byte:02x}"),
            )),
        }
    }

    pub fn wire_byte(self) -> u8 {
        match self {
            RefType::FuncRef => 0x70,
            RefType::ExternRef => 0x6f,
            RefType::ExnRef => 0x68,
        }
    }
}

impl From<RefType> for ValueType {
    fn from(rt: RefType) -> ValueType {
        match rt {
            RefType::FuncRef => ValueType::FuncRef,
            RefType::ExternRef => ValueType::ExternRef,
            RefType::ExnRef => ValueType::ExnRef,
        }
    }
}

impl fmt::Display for RefType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        ValueType::from(*self).fmt(f)
    }
}

/// The signature of a structured control block: void, a single value type, or
/// a reference to a function-type entry (multi-value).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    Empty,
    Value(ValueType),
    FuncType(u32),
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockType::Empty => Ok(()),
            BlockType::Value(vt) => write!(f, " (result {vt})"),
            BlockType::FuncType(idx) => write!(f, " (type {idx})"),
        }
    }
}

/// Size bounds for a table or memory.
///
/// When `max` is present, `min <= max` must hold. `shared` is only legal on
/// memories with the threads feature enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub min: u32,
    pub max: Option<u32>,
    pub shared: bool,
}

impl Limits {
    pub fn new(min: u32, max: Option<u32>) -> Limits {
        Limits {
            min,
            max,
            shared: false,
        }
    }
}

impl fmt::Display for Limits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "{} {}", self.min, max),
            None => write!(f, "{}", self.min),
        }
    }
}

/// A function signature. Multiple results require the multi-value feature.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FunctionType {
    pub params: Vec<ValueType>,
    pub results: Vec<ValueType>,
}

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{p}")?;
        }
        write!(f, ") -> ")?;
        if self.results.is_empty() {
            write!(f, "nil")
        } else {
            for (i, r) in self.results.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{r}")?;
            }
            Ok(())
        }
    }
}

/// A table declaration: element reference type plus size bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableType {
    pub element: RefType,
    pub limits: Limits,
}

/// A memory declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryType {
    pub limits: Limits,
}

/// A global declaration: value type plus mutability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalType {
    pub value_type: ValueType,
    pub mutable: bool,
}

impl fmt::Display for GlobalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.mutable {
            write!(f, "(mut {})", self.value_type)
        } else {
            write!(f, "{}", self.value_type)
        }
    }
}

/// An event (exception tag) declaration. The attribute is zero for
/// exceptions; the type index names a `[params] -> []` signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventType {
    pub attribute: u32,
    pub type_idx: u32,
}

/// What kind of entity an import or export refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalKind {
    Func,
    Table,
    Memory,
    Global,
    Event,
}

impl ExternalKind {
    pub fn decode(byte: u8, offset: usize, features: &Features) -> Result<ExternalKind, WasmError> {
        match byte {
            0x00 => Ok(ExternalKind::Func),
            0x01 => Ok(ExternalKind::Table),
            0x02 => Ok(ExternalKind::Memory),
            0x03 => Ok(ExternalKind::Global),
            0x04 if features.contains(Feature::Exceptions) => Ok(ExternalKind::Event),
            _ => Err(WasmError::malformed(
                offset,
                format!("invalid external kind: 0x{byte:02x}"),
            )),
        }
    }

    pub fn wire_byte(self) -> u8 {
        match self {
            ExternalKind::Func => 0x00,
            ExternalKind::Table => 0x01,
            ExternalKind::Memory => 0x02,
            ExternalKind::Global => 0x03,
            ExternalKind::Event => 0x04,
        }
    }
}

impl fmt::Display for ExternalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExternalKind::Func => "func",
            ExternalKind::Table => "table",
            ExternalKind::Memory => "memory",
            ExternalKind::Global => "global",
            ExternalKind::Event => "event",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_equality_ignores_position() {
        let a = At::new(ValueType::I32, 10);
        let b = At::new(ValueType::I32, 999);
        assert_eq!(a, b);
        assert_ne!(At::new(ValueType::I32, 0), At::new(ValueType::I64, 0));
    }

    #[test]
    fn at_derefs_to_value() {
        let ft = At::new(
            FunctionType {
                params: vec![ValueType::I32],
                results: vec![],
            },
            4,
        );
        assert_eq!(ft.params.len(), 1);
        assert_eq!(ft.offset(), 4);
    }

    #[test]
    fn value_type_gating() {
        let mvp = Features::mvp();
        assert!(ValueType::decode(0x7f, 0, &mvp).is_ok());
        assert!(ValueType::decode(0x7b, 0, &mvp).is_err());
        assert!(ValueType::decode(0x7b, 0, &Features::all()).is_ok());
        assert!(ValueType::decode(0x42, 0, &Features::all()).is_err());
    }

    #[test]
    fn value_type_wire_bytes_round_trip() {
        let features = Features::all();
        for byte in [0x7f, 0x7e, 0x7d, 0x7c, 0x7b, 0x70, 0x6f, 0x68] {
            let vt = ValueType::decode(byte, 0, &features).unwrap();
            assert_eq!(vt.wire_byte(), byte);
        }
    }

    #[test]
    fn function_type_display() {
        let ft = FunctionType {
            params: vec![ValueType::I32, ValueType::I64],
            results: vec![ValueType::F32],
        };
        assert_eq!(format!("{ft}"), "(i32, i64) -> f32");
        assert_eq!(format!("{}", FunctionType::default()), "() -> nil");
    }
}
