//! Instruction representation: opcodes, immediates and their wire table.
//!
//! A single declarative table maps every opcode to its wire encoding
//! (optional prefix byte + code), its gating feature, the shape of its
//! immediate, a stack signature for "simple" instructions, and its text
//! mnemonic. The decoder, encoder, validator and text writer all consult
//! this table, and a unit test cross-checks the decode/encode mirror against
//! it, so the table cannot drift from the implementations.

pub mod decode;
pub mod encode;

use std::collections::HashMap;
use std::fmt;

use fhex::ToHex;
use once_cell::sync::OnceCell;

use crate::features::Feature;
use crate::types::{BlockType, RefType, ValueType};

pub use decode::ExpressionReader;

/// Memory argument for memory access instructions: alignment exponent plus
/// byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemArg {
    /// Alignment as a power of two.
    pub align: u32,
    /// Constant byte offset added to the address operand.
    pub offset: u32,
}

/// Position of an instruction in the input span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ByteRange {
    pub offset: usize,
    pub length: usize,
}

/// The shape of the immediate that follows an opcode. One entry per distinct
/// wire layout; [`Opcode::immediate_kind`] is the tag-to-shape switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImmediateKind {
    None,
    S32,
    S64,
    F32,
    F64,
    V128,
    /// A single index into some module space (which space follows from the
    /// opcode).
    Index,
    Block,
    BrOnExn,
    BrTable,
    CallIndirect,
    /// Two indices: destination then source.
    Copy,
    /// Segment index then destination index.
    Init,
    MemArg,
    /// Memory argument plus a lane number (SIMD lane loads/stores).
    MemArgLane,
    RefType,
    /// Result types of a typed `select`.
    Select,
    /// Sixteen lane numbers for `i8x16.shuffle`.
    Shuffle,
    SimdLane,
    /// Block type plus extra locals for `let`.
    Let,
}

/// A decoded immediate. The variant always matches the opcode's
/// [`ImmediateKind`]; the decoder guarantees it and the encoder asserts it.
///
/// Floats are carried as raw bit patterns so NaN payloads survive a round
/// trip unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum Immediate {
    None,
    S32(i32),
    S64(i64),
    F32(u32),
    F64(u64),
    V128([u8; 16]),
    Index(u32),
    Block(BlockType),
    BrOnExn {
        depth: u32,
        event: u32,
    },
    BrTable {
        targets: Vec<u32>,
        default: u32,
    },
    CallIndirect {
        type_idx: u32,
        table_idx: u32,
    },
    Copy {
        dst: u32,
        src: u32,
    },
    Init {
        segment: u32,
        dst: u32,
    },
    MemArg(MemArg),
    MemArgLane {
        memarg: MemArg,
        lane: u8,
    },
    RefType(RefType),
    Select(Vec<ValueType>),
    Shuffle([u8; 16]),
    SimdLane(u8),
    Let {
        block_type: BlockType,
        locals: Vec<(u32, ValueType)>,
    },
}

impl Immediate {
    pub fn kind(&self) -> ImmediateKind {
        match self {
            Immediate::None => ImmediateKind::None,
            Immediate::S32(_) => ImmediateKind::S32,
            Immediate::S64(_) => ImmediateKind::S64,
            Immediate::F32(_) => ImmediateKind::F32,
            Immediate::F64(_) => ImmediateKind::F64,
            Immediate::V128(_) => ImmediateKind::V128,
            Immediate::Index(_) => ImmediateKind::Index,
            Immediate::Block(_) => ImmediateKind::Block,
            Immediate::BrOnExn { .. } => ImmediateKind::BrOnExn,
            Immediate::BrTable { .. } => ImmediateKind::BrTable,
            Immediate::CallIndirect { .. } => ImmediateKind::CallIndirect,
            Immediate::Copy { .. } => ImmediateKind::Copy,
            Immediate::Init { .. } => ImmediateKind::Init,
            Immediate::MemArg(_) => ImmediateKind::MemArg,
            Immediate::MemArgLane { .. } => ImmediateKind::MemArgLane,
            Immediate::RefType(_) => ImmediateKind::RefType,
            Immediate::Select(_) => ImmediateKind::Select,
            Immediate::Shuffle(_) => ImmediateKind::Shuffle,
            Immediate::SimdLane(_) => ImmediateKind::SimdLane,
            Immediate::Let { .. } => ImmediateKind::Let,
        }
    }
}

/// A decoded instruction with its position in the input.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub immediate: Immediate,
    pub position: ByteRange,
}

impl Instruction {
    pub fn new(opcode: Opcode, immediate: Immediate, position: ByteRange) -> Instruction {
        Instruction {
            opcode,
            immediate,
            position,
        }
    }

    /// Shorthand for immediate-less instructions in tests and builders.
    pub fn plain(opcode: Opcode) -> Instruction {
        Instruction {
            opcode,
            immediate: Immediate::None,
            position: ByteRange::default(),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.opcode.mnemonic())?;
        match &self.immediate {
            Immediate::None => Ok(()),
            Immediate::S32(v) => write!(f, " {v}"),
            Immediate::S64(v) => write!(f, " {v}"),
            Immediate::F32(bits) => write!(f, " {}", f32::from_bits(*bits).to_hex()),
            Immediate::F64(bits) => write!(f, " {}", f64::from_bits(*bits).to_hex()),
            Immediate::V128(bytes) => {
                write!(f, " 0x")?;
                for byte in bytes.iter().rev() {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
            Immediate::Index(idx) => write!(f, " {idx}"),
            Immediate::Block(bt) => write!(f, "{bt}"),
            Immediate::BrOnExn { depth, event } => write!(f, " {depth} {event}"),
            Immediate::BrTable { targets, default } => {
                for t in targets {
                    write!(f, " {t}")?;
                }
                write!(f, " {default}")
            }
            Immediate::CallIndirect {
                type_idx,
                table_idx,
            } => write!(f, " {table_idx} (type {type_idx})"),
            Immediate::Copy { dst, src } => write!(f, " {dst} {src}"),
            Immediate::Init { segment, dst } => write!(f, " {segment} {dst}"),
            Immediate::MemArg(memarg) => write!(f, " {} {}", memarg.align, memarg.offset),
            Immediate::MemArgLane { memarg, lane } => {
                write!(f, " {} {} {lane}", memarg.align, memarg.offset)
            }
            Immediate::RefType(rt) => write!(f, " {rt}"),
            Immediate::Select(types) => {
                for vt in types {
                    write!(f, " {vt}")?;
                }
                Ok(())
            }
            Immediate::Shuffle(lanes) => {
                for lane in lanes {
                    write!(f, " {lane}")?;
                }
                Ok(())
            }
            Immediate::SimdLane(lane) => write!(f, " {lane}"),
            Immediate::Let { block_type, locals } => {
                write!(f, "{block_type}")?;
                for (count, vt) in locals {
                    write!(f, " (local {count} {vt})")?;
                }
                Ok(())
            }
        }
    }
}

// Stack-signature shorthand for the opcode table below.
const ___: Option<ValueType> = None;
const I32: Option<ValueType> = Some(ValueType::I32);
const I64: Option<ValueType> = Some(ValueType::I64);
const F32: Option<ValueType> = Some(ValueType::F32);
const F64: Option<ValueType> = Some(ValueType::F64);
const V128: Option<ValueType> = Some(ValueType::V128);

macro_rules! opcodes {
    ( $( ($feature:ident, $prefix:expr, $code:expr, $name:ident, $imm:ident, $t1:ident, $t2:ident, $tr:ident, $text:literal), )* ) => {
        /// Every instruction the toolkit understands.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Opcode {
            $( $name, )*
        }

        /// All opcodes in table order. Drives the property tests that keep
        /// the table and the codecs in agreement.
        pub const ALL_OPCODES: &[Opcode] = &[ $( Opcode::$name, )* ];

        impl Opcode {
            /// The proposal that introduced this instruction.
            pub fn feature(self) -> Feature {
                match self { $( Opcode::$name => Feature::$feature, )* }
            }

            /// The shape of this instruction's immediate.
            pub fn immediate_kind(self) -> ImmediateKind {
                match self { $( Opcode::$name => ImmediateKind::$imm, )* }
            }

            /// Wire encoding: optional prefix byte plus opcode (or LEB
            /// subcode when prefixed).
            pub fn encoding(self) -> (Option<u8>, u32) {
                match self { $( Opcode::$name => ($prefix, $code), )* }
            }

            /// Static stack signature for instructions with a fixed
            /// one-or-two operand shape: (first operand, second operand,
            /// result). Parametric and control instructions carry all-`None`
            /// and are typed case-by-case by the validator.
            pub fn simple_signature(
                self,
            ) -> (Option<ValueType>, Option<ValueType>, Option<ValueType>) {
                match self { $( Opcode::$name => ($t1, $t2, $tr), )* }
            }

            pub fn mnemonic(self) -> &'static str {
                match self { $( Opcode::$name => $text, )* }
            }
        }
    }
}

#[rustfmt::skip]
opcodes! {
    // Control ----------------------------------------------------------------
    (Mvp,                  None, 0x00, Unreachable,  None,         ___, ___, ___, "unreachable"),
    (Mvp,                  None, 0x01, Nop,          None,         ___, ___, ___, "nop"),
    (Mvp,                  None, 0x02, Block,        Block,        ___, ___, ___, "block"),
    (Mvp,                  None, 0x03, Loop,         Block,        ___, ___, ___, "loop"),
    (Mvp,                  None, 0x04, If,           Block,        ___, ___, ___, "if"),
    (Mvp,                  None, 0x05, Else,         None,         ___, ___, ___, "else"),
    (Exceptions,           None, 0x06, Try,          Block,        ___, ___, ___, "try"),
    (Exceptions,           None, 0x07, Catch,        None,         ___, ___, ___, "catch"),
    (Exceptions,           None, 0x08, Throw,        Index,        ___, ___, ___, "throw"),
    (Exceptions,           None, 0x09, Rethrow,      None,         ___, ___, ___, "rethrow"),
    (Exceptions,           None, 0x0A, BrOnExn,      BrOnExn,      ___, ___, ___, "br_on_exn"),
    (Mvp,                  None, 0x0B, End,          None,         ___, ___, ___, "end"),
    (Mvp,                  None, 0x0C, Br,           Index,        ___, ___, ___, "br"),
    (Mvp,                  None, 0x0D, BrIf,         Index,        ___, ___, ___, "br_if"),
    (Mvp,                  None, 0x0E, BrTable,      BrTable,      ___, ___, ___, "br_table"),
    (Mvp,                  None, 0x0F, Return,       None,         ___, ___, ___, "return"),
    (Mvp,                  None, 0x10, Call,         Index,        ___, ___, ___, "call"),
    (Mvp,                  None, 0x11, CallIndirect, CallIndirect, ___, ___, ___, "call_indirect"),
    (TailCall,             None, 0x12, ReturnCall,   Index,        ___, ___, ___, "return_call"),
    (TailCall,             None, 0x13, ReturnCallIndirect, CallIndirect, ___, ___, ___, "return_call_indirect"),
    (FunctionReferences,   None, 0x17, Let,          Let,          ___, ___, ___, "let"),

    // Parametric -------------------------------------------------------------
    (Mvp,                  None, 0x1A, Drop,         None,         ___, ___, ___, "drop"),
    (Mvp,                  None, 0x1B, Select,       None,         ___, ___, ___, "select"),
    (ReferenceTypes,       None, 0x1C, SelectT,      Select,       ___, ___, ___, "select"),

    // Variable ---------------------------------------------------------------
    (Mvp,                  None, 0x20, LocalGet,     Index,        ___, ___, ___, "local.get"),
    (Mvp,                  None, 0x21, LocalSet,     Index,        ___, ___, ___, "local.set"),
    (Mvp,                  None, 0x22, LocalTee,     Index,        ___, ___, ___, "local.tee"),
    (Mvp,                  None, 0x23, GlobalGet,    Index,        ___, ___, ___, "global.get"),
    (Mvp,                  None, 0x24, GlobalSet,    Index,        ___, ___, ___, "global.set"),

    // Table ------------------------------------------------------------------
    (ReferenceTypes,       None, 0x25, TableGet,     Index,        ___, ___, ___, "table.get"),
    (ReferenceTypes,       None, 0x26, TableSet,     Index,        ___, ___, ___, "table.set"),

    // Memory -----------------------------------------------------------------
    (Mvp,                  None, 0x28, I32Load,      MemArg,       I32, ___, I32, "i32.load"),
    (Mvp,                  None, 0x29, I64Load,      MemArg,       I32, ___, I64, "i64.load"),
    (Mvp,                  None, 0x2A, F32Load,      MemArg,       I32, ___, F32, "f32.load"),
    (Mvp,                  None, 0x2B, F64Load,      MemArg,       I32, ___, F64, "f64.load"),
    (Mvp,                  None, 0x2C, I32Load8S,    MemArg,       I32, ___, I32, "i32.load8_s"),
    (Mvp,                  None, 0x2D, I32Load8U,    MemArg,       I32, ___, I32, "i32.load8_u"),
    (Mvp,                  None, 0x2E, I32Load16S,   MemArg,       I32, ___, I32, "i32.load16_s"),
    (Mvp,                  None, 0x2F, I32Load16U,   MemArg,       I32, ___, I32, "i32.load16_u"),
    (Mvp,                  None, 0x30, I64Load8S,    MemArg,       I32, ___, I64, "i64.load8_s"),
    (Mvp,                  None, 0x31, I64Load8U,    MemArg,       I32, ___, I64, "i64.load8_u"),
    (Mvp,                  None, 0x32, I64Load16S,   MemArg,       I32, ___, I64, "i64.load16_s"),
    (Mvp,                  None, 0x33, I64Load16U,   MemArg,       I32, ___, I64, "i64.load16_u"),
    (Mvp,                  None, 0x34, I64Load32S,   MemArg,       I32, ___, I64, "i64.load32_s"),
    (Mvp,                  None, 0x35, I64Load32U,   MemArg,       I32, ___, I64, "i64.load32_u"),
    (Mvp,                  None, 0x36, I32Store,     MemArg,       I32, I32, ___, "i32.store"),
    (Mvp,                  None, 0x37, I64Store,     MemArg,       I32, I64, ___, "i64.store"),
    (Mvp,                  None, 0x38, F32Store,     MemArg,       I32, F32, ___, "f32.store"),
    (Mvp,                  None, 0x39, F64Store,     MemArg,       I32, F64, ___, "f64.store"),
    (Mvp,                  None, 0x3A, I32Store8,    MemArg,       I32, I32, ___, "i32.store8"),
    (Mvp,                  None, 0x3B, I32Store16,   MemArg,       I32, I32, ___, "i32.store16"),
    (Mvp,                  None, 0x3C, I64Store8,    MemArg,       I32, I64, ___, "i64.store8"),
    (Mvp,                  None, 0x3D, I64Store16,   MemArg,       I32, I64, ___, "i64.store16"),
    (Mvp,                  None, 0x3E, I64Store32,   MemArg,       I32, I64, ___, "i64.store32"),
    (Mvp,                  None, 0x3F, MemorySize,   Index,        ___, ___, I32, "memory.size"),
    (Mvp,                  None, 0x40, MemoryGrow,   Index,        I32, ___, I32, "memory.grow"),

    // Constants --------------------------------------------------------------
    (Mvp,                  None, 0x41, I32Const,     S32,          ___, ___, I32, "i32.const"),
    (Mvp,                  None, 0x42, I64Const,     S64,          ___, ___, I64, "i64.const"),
    (Mvp,                  None, 0x43, F32Const,     F32,          ___, ___, F32, "f32.const"),
    (Mvp,                  None, 0x44, F64Const,     F64,          ___, ___, F64, "f64.const"),

    // i32 comparisons --------------------------------------------------------
    (Mvp,                  None, 0x45, I32Eqz,       None,         I32, ___, I32, "i32.eqz"),
    (Mvp,                  None, 0x46, I32Eq,        None,         I32, I32, I32, "i32.eq"),
    (Mvp,                  None, 0x47, I32Ne,        None,         I32, I32, I32, "i32.ne"),
    (Mvp,                  None, 0x48, I32LtS,       None,         I32, I32, I32, "i32.lt_s"),
    (Mvp,                  None, 0x49, I32LtU,       None,         I32, I32, I32, "i32.lt_u"),
    (Mvp,                  None, 0x4A, I32GtS,       None,         I32, I32, I32, "i32.gt_s"),
    (Mvp,                  None, 0x4B, I32GtU,       None,         I32, I32, I32, "i32.gt_u"),
    (Mvp,                  None, 0x4C, I32LeS,       None,         I32, I32, I32, "i32.le_s"),
    (Mvp,                  None, 0x4D, I32LeU,       None,         I32, I32, I32, "i32.le_u"),
    (Mvp,                  None, 0x4E, I32GeS,       None,         I32, I32, I32, "i32.ge_s"),
    (Mvp,                  None, 0x4F, I32GeU,       None,         I32, I32, I32, "i32.ge_u"),

    // i64 comparisons --------------------------------------------------------
    (Mvp,                  None, 0x50, I64Eqz,       None,         I64, ___, I32, "i64.eqz"),
    (Mvp,                  None, 0x51, I64Eq,        None,         I64, I64, I32, "i64.eq"),
    (Mvp,                  None, 0x52, I64Ne,        None,         I64, I64, I32, "i64.ne"),
    (Mvp,                  None, 0x53, I64LtS,       None,         I64, I64, I32, "i64.lt_s"),
    (Mvp,                  None, 0x54, I64LtU,       None,         I64, I64, I32, "i64.lt_u"),
    (Mvp,                  None, 0x55, I64GtS,       None,         I64, I64, I32, "i64.gt_s"),
    (Mvp,                  None, 0x56, I64GtU,       None,         I64, I64, I32, "i64.gt_u"),
    (Mvp,                  None, 0x57, I64LeS,       None,         I64, I64, I32, "i64.le_s"),
    (Mvp,                  None, 0x58, I64LeU,       None,         I64, I64, I32, "i64.le_u"),
    (Mvp,                  None, 0x59, I64GeS,       None,         I64, I64, I32, "i64.ge_s"),
    (Mvp,                  None, 0x5A, I64GeU,       None,         I64, I64, I32, "i64.ge_u"),

    // f32 comparisons --------------------------------------------------------
    (Mvp,                  None, 0x5B, F32Eq,        None,         F32, F32, I32, "f32.eq"),
    (Mvp,                  None, 0x5C, F32Ne,        None,         F32, F32, I32, "f32.ne"),
    (Mvp,                  None, 0x5D, F32Lt,        None,         F32, F32, I32, "f32.lt"),
    (Mvp,                  None, 0x5E, F32Gt,        None,         F32, F32, I32, "f32.gt"),
    (Mvp,                  None, 0x5F, F32Le,        None,         F32, F32, I32, "f32.le"),
    (Mvp,                  None, 0x60, F32Ge,        None,         F32, F32, I32, "f32.ge"),

    // f64 comparisons --------------------------------------------------------
    (Mvp,                  None, 0x61, F64Eq,        None,         F64, F64, I32, "f64.eq"),
    (Mvp,                  None, 0x62, F64Ne,        None,         F64, F64, I32, "f64.ne"),
    (Mvp,                  None, 0x63, F64Lt,        None,         F64, F64, I32, "f64.lt"),
    (Mvp,                  None, 0x64, F64Gt,        None,         F64, F64, I32, "f64.gt"),
    (Mvp,                  None, 0x65, F64Le,        None,         F64, F64, I32, "f64.le"),
    (Mvp,                  None, 0x66, F64Ge,        None,         F64, F64, I32, "f64.ge"),

    // i32 arithmetic ---------------------------------------------------------
    (Mvp,                  None, 0x67, I32Clz,       None,         I32, ___, I32, "i32.clz"),
    (Mvp,                  None, 0x68, I32Ctz,       None,         I32, ___, I32, "i32.ctz"),
    (Mvp,                  None, 0x69, I32Popcnt,    None,         I32, ___, I32, "i32.popcnt"),
    (Mvp,                  None, 0x6A, I32Add,       None,         I32, I32, I32, "i32.add"),
    (Mvp,                  None, 0x6B, I32Sub,       None,         I32, I32, I32, "i32.sub"),
    (Mvp,                  None, 0x6C, I32Mul,       None,         I32, I32, I32, "i32.mul"),
    (Mvp,                  None, 0x6D, I32DivS,      None,         I32, I32, I32, "i32.div_s"),
    (Mvp,                  None, 0x6E, I32DivU,      None,         I32, I32, I32, "i32.div_u"),
    (Mvp,                  None, 0x6F, I32RemS,      None,         I32, I32, I32, "i32.rem_s"),
    (Mvp,                  None, 0x70, I32RemU,      None,         I32, I32, I32, "i32.rem_u"),
    (Mvp,                  None, 0x71, I32And,       None,         I32, I32, I32, "i32.and"),
    (Mvp,                  None, 0x72, I32Or,        None,         I32, I32, I32, "i32.or"),
    (Mvp,                  None, 0x73, I32Xor,       None,         I32, I32, I32, "i32.xor"),
    (Mvp,                  None, 0x74, I32Shl,       None,         I32, I32, I32, "i32.shl"),
    (Mvp,                  None, 0x75, I32ShrS,      None,         I32, I32, I32, "i32.shr_s"),
    (Mvp,                  None, 0x76, I32ShrU,      None,         I32, I32, I32, "i32.shr_u"),
    (Mvp,                  None, 0x77, I32Rotl,      None,         I32, I32, I32, "i32.rotl"),
    (Mvp,                  None, 0x78, I32Rotr,      None,         I32, I32, I32, "i32.rotr"),

    // i64 arithmetic ---------------------------------------------------------
    (Mvp,                  None, 0x79, I64Clz,       None,         I64, ___, I64, "i64.clz"),
    (Mvp,                  None, 0x7A, I64Ctz,       None,         I64, ___, I64, "i64.ctz"),
    (Mvp,                  None, 0x7B, I64Popcnt,    None,         I64, ___, I64, "i64.popcnt"),
    (Mvp,                  None, 0x7C, I64Add,       None,         I64, I64, I64, "i64.add"),
    (Mvp,                  None, 0x7D, I64Sub,       None,         I64, I64, I64, "i64.sub"),
    (Mvp,                  None, 0x7E, I64Mul,       None,         I64, I64, I64, "i64.mul"),
    (Mvp,                  None, 0x7F, I64DivS,      None,         I64, I64, I64, "i64.div_s"),
    (Mvp,                  None, 0x80, I64DivU,      None,         I64, I64, I64, "i64.div_u"),
    (Mvp,                  None, 0x81, I64RemS,      None,         I64, I64, I64, "i64.rem_s"),
    (Mvp,                  None, 0x82, I64RemU,      None,         I64, I64, I64, "i64.rem_u"),
    (Mvp,                  None, 0x83, I64And,       None,         I64, I64, I64, "i64.and"),
    (Mvp,                  None, 0x84, I64Or,        None,         I64, I64, I64, "i64.or"),
    (Mvp,                  None, 0x85, I64Xor,       None,         I64, I64, I64, "i64.xor"),
    (Mvp,                  None, 0x86, I64Shl,       None,         I64, I64, I64, "i64.shl"),
    (Mvp,                  None, 0x87, I64ShrS,      None,         I64, I64, I64, "i64.shr_s"),
    (Mvp,                  None, 0x88, I64ShrU,      None,         I64, I64, I64, "i64.shr_u"),
    (Mvp,                  None, 0x89, I64Rotl,      None,         I64, I64, I64, "i64.rotl"),
    (Mvp,                  None, 0x8A, I64Rotr,      None,         I64, I64, I64, "i64.rotr"),

    // f32 arithmetic ---------------------------------------------------------
    (Mvp,                  None, 0x8B, F32Abs,       None,         F32, ___, F32, "f32.abs"),
    (Mvp,                  None, 0x8C, F32Neg,       None,         F32, ___, F32, "f32.neg"),
    (Mvp,                  None, 0x8D, F32Ceil,      None,         F32, ___, F32, "f32.ceil"),
    (Mvp,                  None, 0x8E, F32Floor,     None,         F32, ___, F32, "f32.floor"),
    (Mvp,                  None, 0x8F, F32Trunc,     None,         F32, ___, F32, "f32.trunc"),
    (Mvp,                  None, 0x90, F32Nearest,   None,         F32, ___, F32, "f32.nearest"),
    (Mvp,                  None, 0x91, F32Sqrt,      None,         F32, ___, F32, "f32.sqrt"),
    (Mvp,                  None, 0x92, F32Add,       None,         F32, F32, F32, "f32.add"),
    (Mvp,                  None, 0x93, F32Sub,       None,         F32, F32, F32, "f32.sub"),
    (Mvp,                  None, 0x94, F32Mul,       None,         F32, F32, F32, "f32.mul"),
    (Mvp,                  None, 0x95, F32Div,       None,         F32, F32, F32, "f32.div"),
    (Mvp,                  None, 0x96, F32Min,       None,         F32, F32, F32, "f32.min"),
    (Mvp,                  None, 0x97, F32Max,       None,         F32, F32, F32, "f32.max"),
    (Mvp,                  None, 0x98, F32Copysign,  None,         F32, F32, F32, "f32.copysign"),

    // f64 arithmetic ---------------------------------------------------------
    (Mvp,                  None, 0x99, F64Abs,       None,         F64, ___, F64, "f64.abs"),
    (Mvp,                  None, 0x9A, F64Neg,       None,         F64, ___, F64, "f64.neg"),
    (Mvp,                  None, 0x9B, F64Ceil,      None,         F64, ___, F64, "f64.ceil"),
    (Mvp,                  None, 0x9C, F64Floor,     None,         F64, ___, F64, "f64.floor"),
    (Mvp,                  None, 0x9D, F64Trunc,     None,         F64, ___, F64, "f64.trunc"),
    (Mvp,                  None, 0x9E, F64Nearest,   None,         F64, ___, F64, "f64.nearest"),
    (Mvp,                  None, 0x9F, F64Sqrt,      None,         F64, ___, F64, "f64.sqrt"),
    (Mvp,                  None, 0xA0, F64Add,       None,         F64, F64, F64, "f64.add"),
    (Mvp,                  None, 0xA1, F64Sub,       None,         F64, F64, F64, "f64.sub"),
    (Mvp,                  None, 0xA2, F64Mul,       None,         F64, F64, F64, "f64.mul"),
    (Mvp,                  None, 0xA3, F64Div,       None,         F64, F64, F64, "f64.div"),
    (Mvp,                  None, 0xA4, F64Min,       None,         F64, F64, F64, "f64.min"),
    (Mvp,                  None, 0xA5, F64Max,       None,         F64, F64, F64, "f64.max"),
    (Mvp,                  None, 0xA6, F64Copysign,  None,         F64, F64, F64, "f64.copysign"),

    // Conversions ------------------------------------------------------------
    (Mvp,                  None, 0xA7, I32WrapI64,         None,   I64, ___, I32, "i32.wrap_i64"),
    (Mvp,                  None, 0xA8, I32TruncF32S,       None,   F32, ___, I32, "i32.trunc_f32_s"),
    (Mvp,                  None, 0xA9, I32TruncF32U,       None,   F32, ___, I32, "i32.trunc_f32_u"),
    (Mvp,                  None, 0xAA, I32TruncF64S,       None,   F64, ___, I32, "i32.trunc_f64_s"),
    (Mvp,                  None, 0xAB, I32TruncF64U,       None,   F64, ___, I32, "i32.trunc_f64_u"),
    (Mvp,                  None, 0xAC, I64ExtendI32S,      None,   I32, ___, I64, "i64.extend_i32_s"),
    (Mvp,                  None, 0xAD, I64ExtendI32U,      None,   I32, ___, I64, "i64.extend_i32_u"),
    (Mvp,                  None, 0xAE, I64TruncF32S,       None,   F32, ___, I64, "i64.trunc_f32_s"),
    (Mvp,                  None, 0xAF, I64TruncF32U,       None,   F32, ___, I64, "i64.trunc_f32_u"),
    (Mvp,                  None, 0xB0, I64TruncF64S,       None,   F64, ___, I64, "i64.trunc_f64_s"),
    (Mvp,                  None, 0xB1, I64TruncF64U,       None,   F64, ___, I64, "i64.trunc_f64_u"),
    (Mvp,                  None, 0xB2, F32ConvertI32S,     None,   I32, ___, F32, "f32.convert_i32_s"),
    (Mvp,                  None, 0xB3, F32ConvertI32U,     None,   I32, ___, F32, "f32.convert_i32_u"),
    (Mvp,                  None, 0xB4, F32ConvertI64S,     None,   I64, ___, F32, "f32.convert_i64_s"),
    (Mvp,                  None, 0xB5, F32ConvertI64U,     None,   I64, ___, F32, "f32.convert_i64_u"),
    (Mvp,                  None, 0xB6, F32DemoteF64,       None,   F64, ___, F32, "f32.demote_f64"),
    (Mvp,                  None, 0xB7, F64ConvertI32S,     None,   I32, ___, F64, "f64.convert_i32_s"),
    (Mvp,                  None, 0xB8, F64ConvertI32U,     None,   I32, ___, F64, "f64.convert_i32_u"),
    (Mvp,                  None, 0xB9, F64ConvertI64S,     None,   I64, ___, F64, "f64.convert_i64_s"),
    (Mvp,                  None, 0xBA, F64ConvertI64U,     None,   I64, ___, F64, "f64.convert_i64_u"),
    (Mvp,                  None, 0xBB, F64PromoteF32,      None,   F32, ___, F64, "f64.promote_f32"),
    (Mvp,                  None, 0xBC, I32ReinterpretF32,  None,   F32, ___, I32, "i32.reinterpret_f32"),
    (Mvp,                  None, 0xBD, I64ReinterpretF64,  None,   F64, ___, I64, "i64.reinterpret_f64"),
    (Mvp,                  None, 0xBE, F32ReinterpretI32,  None,   I32, ___, F32, "f32.reinterpret_i32"),
    (Mvp,                  None, 0xBF, F64ReinterpretI64,  None,   I64, ___, F64, "f64.reinterpret_i64"),

    // Sign extension ---------------------------------------------------------
    (SignExtension,        None, 0xC0, I32Extend8S,        None,   I32, ___, I32, "i32.extend8_s"),
    (SignExtension,        None, 0xC1, I32Extend16S,       None,   I32, ___, I32, "i32.extend16_s"),
    (SignExtension,        None, 0xC2, I64Extend8S,        None,   I64, ___, I64, "i64.extend8_s"),
    (SignExtension,        None, 0xC3, I64Extend16S,       None,   I64, ___, I64, "i64.extend16_s"),
    (SignExtension,        None, 0xC4, I64Extend32S,       None,   I64, ___, I64, "i64.extend32_s"),

    // References -------------------------------------------------------------
    (ReferenceTypes,       None, 0xD0, RefNull,      RefType,      ___, ___, ___, "ref.null"),
    (ReferenceTypes,       None, 0xD1, RefIsNull,    None,         ___, ___, ___, "ref.is_null"),
    (ReferenceTypes,       None, 0xD2, RefFunc,      Index,        ___, ___, ___, "ref.func"),

    // Saturating truncation (0xFC) -------------------------------------------
    (SaturatingFloatToInt, Some(0xFC), 0x00, I32TruncSatF32S, None, F32, ___, I32, "i32.trunc_sat_f32_s"),
    (SaturatingFloatToInt, Some(0xFC), 0x01, I32TruncSatF32U, None, F32, ___, I32, "i32.trunc_sat_f32_u"),
    (SaturatingFloatToInt, Some(0xFC), 0x02, I32TruncSatF64S, None, F64, ___, I32, "i32.trunc_sat_f64_s"),
    (SaturatingFloatToInt, Some(0xFC), 0x03, I32TruncSatF64U, None, F64, ___, I32, "i32.trunc_sat_f64_u"),
    (SaturatingFloatToInt, Some(0xFC), 0x04, I64TruncSatF32S, None, F32, ___, I64, "i64.trunc_sat_f32_s"),
    (SaturatingFloatToInt, Some(0xFC), 0x05, I64TruncSatF32U, None, F32, ___, I64, "i64.trunc_sat_f32_u"),
    (SaturatingFloatToInt, Some(0xFC), 0x06, I64TruncSatF64S, None, F64, ___, I64, "i64.trunc_sat_f64_s"),
    (SaturatingFloatToInt, Some(0xFC), 0x07, I64TruncSatF64U, None, F64, ___, I64, "i64.trunc_sat_f64_u"),

    // Bulk memory (0xFC) -----------------------------------------------------
    (BulkMemory,           Some(0xFC), 0x08, MemoryInit, Init,     ___, ___, ___, "memory.init"),
    (BulkMemory,           Some(0xFC), 0x09, DataDrop,   Index,    ___, ___, ___, "data.drop"),
    (BulkMemory,           Some(0xFC), 0x0A, MemoryCopy, Copy,     ___, ___, ___, "memory.copy"),
    (BulkMemory,           Some(0xFC), 0x0B, MemoryFill, Index,    ___, ___, ___, "memory.fill"),
    (BulkMemory,           Some(0xFC), 0x0C, TableInit,  Init,     ___, ___, ___, "table.init"),
    (BulkMemory,           Some(0xFC), 0x0D, ElemDrop,   Index,    ___, ___, ___, "elem.drop"),
    (BulkMemory,           Some(0xFC), 0x0E, TableCopy,  Copy,     ___, ___, ___, "table.copy"),
    (ReferenceTypes,       Some(0xFC), 0x0F, TableGrow,  Index,    ___, ___, ___, "table.grow"),
    (ReferenceTypes,       Some(0xFC), 0x10, TableSize,  Index,    ___, ___, I32, "table.size"),
    (ReferenceTypes,       Some(0xFC), 0x11, TableFill,  Index,    ___, ___, ___, "table.fill"),

    // SIMD loads/stores and lanes (0xFD) -------------------------------------
    (Simd, Some(0xFD), 0x00, V128Load,        MemArg,     I32,  ___,  V128, "v128.load"),
    (Simd, Some(0xFD), 0x01, V128Load8x8S,    MemArg,     I32,  ___,  V128, "v128.load8x8_s"),
    (Simd, Some(0xFD), 0x02, V128Load8x8U,    MemArg,     I32,  ___,  V128, "v128.load8x8_u"),
    (Simd, Some(0xFD), 0x03, V128Load16x4S,   MemArg,     I32,  ___,  V128, "v128.load16x4_s"),
    (Simd, Some(0xFD), 0x04, V128Load16x4U,   MemArg,     I32,  ___,  V128, "v128.load16x4_u"),
    (Simd, Some(0xFD), 0x05, V128Load32x2S,   MemArg,     I32,  ___,  V128, "v128.load32x2_s"),
    (Simd, Some(0xFD), 0x06, V128Load32x2U,   MemArg,     I32,  ___,  V128, "v128.load32x2_u"),
    (Simd, Some(0xFD), 0x07, V128Load8Splat,  MemArg,     I32,  ___,  V128, "v128.load8_splat"),
    (Simd, Some(0xFD), 0x08, V128Load16Splat, MemArg,     I32,  ___,  V128, "v128.load16_splat"),
    (Simd, Some(0xFD), 0x09, V128Load32Splat, MemArg,     I32,  ___,  V128, "v128.load32_splat"),
    (Simd, Some(0xFD), 0x0A, V128Load64Splat, MemArg,     I32,  ___,  V128, "v128.load64_splat"),
    (Simd, Some(0xFD), 0x0B, V128Store,       MemArg,     I32,  V128, ___,  "v128.store"),
    (Simd, Some(0xFD), 0x0C, V128Const,       V128,       ___,  ___,  V128, "v128.const"),
    (Simd, Some(0xFD), 0x0D, I8x16Shuffle,    Shuffle,    V128, V128, V128, "i8x16.shuffle"),
    (Simd, Some(0xFD), 0x0E, I8x16Swizzle,    None,       V128, V128, V128, "i8x16.swizzle"),
    (Simd, Some(0xFD), 0x0F, I8x16Splat,      None,       I32,  ___,  V128, "i8x16.splat"),
    (Simd, Some(0xFD), 0x10, I16x8Splat,      None,       I32,  ___,  V128, "i16x8.splat"),
    (Simd, Some(0xFD), 0x11, I32x4Splat,      None,       I32,  ___,  V128, "i32x4.splat"),
    (Simd, Some(0xFD), 0x12, I64x2Splat,      None,       I64,  ___,  V128, "i64x2.splat"),
    (Simd, Some(0xFD), 0x13, F32x4Splat,      None,       F32,  ___,  V128, "f32x4.splat"),
    (Simd, Some(0xFD), 0x14, F64x2Splat,      None,       F64,  ___,  V128, "f64x2.splat"),
    (Simd, Some(0xFD), 0x15, I8x16ExtractLaneS, SimdLane, V128, ___,  I32,  "i8x16.extract_lane_s"),
    (Simd, Some(0xFD), 0x16, I8x16ExtractLaneU, SimdLane, V128, ___,  I32,  "i8x16.extract_lane_u"),
    (Simd, Some(0xFD), 0x17, I8x16ReplaceLane,  SimdLane, V128, I32,  V128, "i8x16.replace_lane"),
    (Simd, Some(0xFD), 0x18, I16x8ExtractLaneS, SimdLane, V128, ___,  I32,  "i16x8.extract_lane_s"),
    (Simd, Some(0xFD), 0x19, I16x8ExtractLaneU, SimdLane, V128, ___,  I32,  "i16x8.extract_lane_u"),
    (Simd, Some(0xFD), 0x1A, I16x8ReplaceLane,  SimdLane, V128, I32,  V128, "i16x8.replace_lane"),
    (Simd, Some(0xFD), 0x1B, I32x4ExtractLane,  SimdLane, V128, ___,  I32,  "i32x4.extract_lane"),
    (Simd, Some(0xFD), 0x1C, I32x4ReplaceLane,  SimdLane, V128, I32,  V128, "i32x4.replace_lane"),
    (Simd, Some(0xFD), 0x1D, I64x2ExtractLane,  SimdLane, V128, ___,  I64,  "i64x2.extract_lane"),
    (Simd, Some(0xFD), 0x1E, I64x2ReplaceLane,  SimdLane, V128, I64,  V128, "i64x2.replace_lane"),
    (Simd, Some(0xFD), 0x1F, F32x4ExtractLane,  SimdLane, V128, ___,  F32,  "f32x4.extract_lane"),
    (Simd, Some(0xFD), 0x20, F32x4ReplaceLane,  SimdLane, V128, F32,  V128, "f32x4.replace_lane"),
    (Simd, Some(0xFD), 0x21, F64x2ExtractLane,  SimdLane, V128, ___,  F64,  "f64x2.extract_lane"),
    (Simd, Some(0xFD), 0x22, F64x2ReplaceLane,  SimdLane, V128, F64,  V128, "f64x2.replace_lane"),

    // SIMD comparisons (0xFD) ------------------------------------------------
    (Simd, Some(0xFD), 0x23, I8x16Eq,   None, V128, V128, V128, "i8x16.eq"),
    (Simd, Some(0xFD), 0x24, I8x16Ne,   None, V128, V128, V128, "i8x16.ne"),
    (Simd, Some(0xFD), 0x25, I8x16LtS,  None, V128, V128, V128, "i8x16.lt_s"),
    (Simd, Some(0xFD), 0x26, I8x16LtU,  None, V128, V128, V128, "i8x16.lt_u"),
    (Simd, Some(0xFD), 0x27, I8x16GtS,  None, V128, V128, V128, "i8x16.gt_s"),
    (Simd, Some(0xFD), 0x28, I8x16GtU,  None, V128, V128, V128, "i8x16.gt_u"),
    (Simd, Some(0xFD), 0x29, I8x16LeS,  None, V128, V128, V128, "i8x16.le_s"),
    (Simd, Some(0xFD), 0x2A, I8x16LeU,  None, V128, V128, V128, "i8x16.le_u"),
    (Simd, Some(0xFD), 0x2B, I8x16GeS,  None, V128, V128, V128, "i8x16.ge_s"),
    (Simd, Some(0xFD), 0x2C, I8x16GeU,  None, V128, V128, V128, "i8x16.ge_u"),
    (Simd, Some(0xFD), 0x2D, I16x8Eq,   None, V128, V128, V128, "i16x8.eq"),
    (Simd, Some(0xFD), 0x2E, I16x8Ne,   None, V128, V128, V128, "i16x8.ne"),
    (Simd, Some(0xFD), 0x2F, I16x8LtS,  None, V128, V128, V128, "i16x8.lt_s"),
    (Simd, Some(0xFD), 0x30, I16x8LtU,  None, V128, V128, V128, "i16x8.lt_u"),
    (Simd, Some(0xFD), 0x31, I16x8GtS,  None, V128, V128, V128, "i16x8.gt_s"),
    (Simd, Some(0xFD), 0x32, I16x8GtU,  None, V128, V128, V128, "i16x8.gt_u"),
    (Simd, Some(0xFD), 0x33, I16x8LeS,  None, V128, V128, V128, "i16x8.le_s"),
    (Simd, Some(0xFD), 0x34, I16x8LeU,  None, V128, V128, V128, "i16x8.le_u"),
    (Simd, Some(0xFD), 0x35, I16x8GeS,  None, V128, V128, V128, "i16x8.ge_s"),
    (Simd, Some(0xFD), 0x36, I16x8GeU,  None, V128, V128, V128, "i16x8.ge_u"),
    (Simd, Some(0xFD), 0x37, I32x4Eq,   None, V128, V128, V128, "i32x4.eq"),
    (Simd, Some(0xFD), 0x38, I32x4Ne,   None, V128, V128, V128, "i32x4.ne"),
    (Simd, Some(0xFD), 0x39, I32x4LtS,  None, V128, V128, V128, "i32x4.lt_s"),
    (Simd, Some(0xFD), 0x3A, I32x4LtU,  None, V128, V128, V128, "i32x4.lt_u"),
    (Simd, Some(0xFD), 0x3B, I32x4GtS,  None, V128, V128, V128, "i32x4.gt_s"),
    (Simd, Some(0xFD), 0x3C, I32x4GtU,  None, V128, V128, V128, "i32x4.gt_u"),
    (Simd, Some(0xFD), 0x3D, I32x4LeS,  None, V128, V128, V128, "i32x4.le_s"),
    (Simd, Some(0xFD), 0x3E, I32x4LeU,  None, V128, V128, V128, "i32x4.le_u"),
    (Simd, Some(0xFD), 0x3F, I32x4GeS,  None, V128, V128, V128, "i32x4.ge_s"),
    (Simd, Some(0xFD), 0x40, I32x4GeU,  None, V128, V128, V128, "i32x4.ge_u"),
    (Simd, Some(0xFD), 0x41, F32x4Eq,   None, V128, V128, V128, "f32x4.eq"),
    (Simd, Some(0xFD), 0x42, F32x4Ne,   None, V128, V128, V128, "f32x4.ne"),
    (Simd, Some(0xFD), 0x43, F32x4Lt,   None, V128, V128, V128, "f32x4.lt"),
    (Simd, Some(0xFD), 0x44, F32x4Gt,   None, V128, V128, V128, "f32x4.gt"),
    (Simd, Some(0xFD), 0x45, F32x4Le,   None, V128, V128, V128, "f32x4.le"),
    (Simd, Some(0xFD), 0x46, F32x4Ge,   None, V128, V128, V128, "f32x4.ge"),
    (Simd, Some(0xFD), 0x47, F64x2Eq,   None, V128, V128, V128, "f64x2.eq"),
    (Simd, Some(0xFD), 0x48, F64x2Ne,   None, V128, V128, V128, "f64x2.ne"),
    (Simd, Some(0xFD), 0x49, F64x2Lt,   None, V128, V128, V128, "f64x2.lt"),
    (Simd, Some(0xFD), 0x4A, F64x2Gt,   None, V128, V128, V128, "f64x2.gt"),
    (Simd, Some(0xFD), 0x4B, F64x2Le,   None, V128, V128, V128, "f64x2.le"),
    (Simd, Some(0xFD), 0x4C, F64x2Ge,   None, V128, V128, V128, "f64x2.ge"),

    // SIMD bitwise (0xFD) ----------------------------------------------------
    (Simd, Some(0xFD), 0x4D, V128Not,       None, V128, ___,  V128, "v128.not"),
    (Simd, Some(0xFD), 0x4E, V128And,       None, V128, V128, V128, "v128.and"),
    (Simd, Some(0xFD), 0x4F, V128AndNot,    None, V128, V128, V128, "v128.andnot"),
    (Simd, Some(0xFD), 0x50, V128Or,        None, V128, V128, V128, "v128.or"),
    (Simd, Some(0xFD), 0x51, V128Xor,       None, V128, V128, V128, "v128.xor"),
    (Simd, Some(0xFD), 0x52, V128Bitselect, None, ___,  ___,  ___,  "v128.bitselect"),
    (Simd, Some(0xFD), 0x53, V128AnyTrue,   None, V128, ___,  I32,  "v128.any_true"),

    // SIMD lane loads/stores (0xFD) ------------------------------------------
    (Simd, Some(0xFD), 0x54, V128Load8Lane,   MemArgLane, I32, V128, V128, "v128.load8_lane"),
    (Simd, Some(0xFD), 0x55, V128Load16Lane,  MemArgLane, I32, V128, V128, "v128.load16_lane"),
    (Simd, Some(0xFD), 0x56, V128Load32Lane,  MemArgLane, I32, V128, V128, "v128.load32_lane"),
    (Simd, Some(0xFD), 0x57, V128Load64Lane,  MemArgLane, I32, V128, V128, "v128.load64_lane"),
    (Simd, Some(0xFD), 0x58, V128Store8Lane,  MemArgLane, I32, V128, ___,  "v128.store8_lane"),
    (Simd, Some(0xFD), 0x59, V128Store16Lane, MemArgLane, I32, V128, ___,  "v128.store16_lane"),
    (Simd, Some(0xFD), 0x5A, V128Store32Lane, MemArgLane, I32, V128, ___,  "v128.store32_lane"),
    (Simd, Some(0xFD), 0x5B, V128Store64Lane, MemArgLane, I32, V128, ___,  "v128.store64_lane"),
    (Simd, Some(0xFD), 0x5C, V128Load32Zero,  MemArg,     I32, ___,  V128, "v128.load32_zero"),
    (Simd, Some(0xFD), 0x5D, V128Load64Zero,  MemArg,     I32, ___,  V128, "v128.load64_zero"),

    // SIMD float/int lane-wise (0xFD) ----------------------------------------
    (Simd, Some(0xFD), 0x5E, F32x4DemoteF64x2Zero,  None, V128, ___, V128, "f32x4.demote_f64x2_zero"),
    (Simd, Some(0xFD), 0x5F, F64x2PromoteLowF32x4,  None, V128, ___, V128, "f64x2.promote_low_f32x4"),
    (Simd, Some(0xFD), 0x60, I8x16Abs,      None, V128, ___,  V128, "i8x16.abs"),
    (Simd, Some(0xFD), 0x61, I8x16Neg,      None, V128, ___,  V128, "i8x16.neg"),
    (Simd, Some(0xFD), 0x62, I8x16Popcnt,   None, V128, ___,  V128, "i8x16.popcnt"),
    (Simd, Some(0xFD), 0x63, I8x16AllTrue,  None, V128, ___,  I32,  "i8x16.all_true"),
    (Simd, Some(0xFD), 0x64, I8x16Bitmask,  None, V128, ___,  I32,  "i8x16.bitmask"),
    (Simd, Some(0xFD), 0x65, I8x16NarrowI16x8S, None, V128, V128, V128, "i8x16.narrow_i16x8_s"),
    (Simd, Some(0xFD), 0x66, I8x16NarrowI16x8U, None, V128, V128, V128, "i8x16.narrow_i16x8_u"),
    (Simd, Some(0xFD), 0x67, F32x4Ceil,     None, V128, ___,  V128, "f32x4.ceil"),
    (Simd, Some(0xFD), 0x68, F32x4Floor,    None, V128, ___,  V128, "f32x4.floor"),
    (Simd, Some(0xFD), 0x69, F32x4Trunc,    None, V128, ___,  V128, "f32x4.trunc"),
    (Simd, Some(0xFD), 0x6A, F32x4Nearest,  None, V128, ___,  V128, "f32x4.nearest"),
    (Simd, Some(0xFD), 0x6B, I8x16Shl,      None, V128, I32,  V128, "i8x16.shl"),
    (Simd, Some(0xFD), 0x6C, I8x16ShrS,     None, V128, I32,  V128, "i8x16.shr_s"),
    (Simd, Some(0xFD), 0x6D, I8x16ShrU,     None, V128, I32,  V128, "i8x16.shr_u"),
    (Simd, Some(0xFD), 0x6E, I8x16Add,      None, V128, V128, V128, "i8x16.add"),
    (Simd, Some(0xFD), 0x6F, I8x16AddSatS,  None, V128, V128, V128, "i8x16.add_sat_s"),
    (Simd, Some(0xFD), 0x70, I8x16AddSatU,  None, V128, V128, V128, "i8x16.add_sat_u"),
    (Simd, Some(0xFD), 0x71, I8x16Sub,      None, V128, V128, V128, "i8x16.sub"),
    (Simd, Some(0xFD), 0x72, I8x16SubSatS,  None, V128, V128, V128, "i8x16.sub_sat_s"),
    (Simd, Some(0xFD), 0x73, I8x16SubSatU,  None, V128, V128, V128, "i8x16.sub_sat_u"),
    (Simd, Some(0xFD), 0x74, F64x2Ceil,     None, V128, ___,  V128, "f64x2.ceil"),
    (Simd, Some(0xFD), 0x75, F64x2Floor,    None, V128, ___,  V128, "f64x2.floor"),
    (Simd, Some(0xFD), 0x76, I8x16MinS,     None, V128, V128, V128, "i8x16.min_s"),
    (Simd, Some(0xFD), 0x77, I8x16MinU,     None, V128, V128, V128, "i8x16.min_u"),
    (Simd, Some(0xFD), 0x78, I8x16MaxS,     None, V128, V128, V128, "i8x16.max_s"),
    (Simd, Some(0xFD), 0x79, I8x16MaxU,     None, V128, V128, V128, "i8x16.max_u"),
    (Simd, Some(0xFD), 0x7A, F64x2Trunc,    None, V128, ___,  V128, "f64x2.trunc"),
    (Simd, Some(0xFD), 0x7B, I8x16AvgrU,    None, V128, V128, V128, "i8x16.avgr_u"),
    (Simd, Some(0xFD), 0x7C, I16x8ExtaddPairwiseI8x16S, None, V128, ___, V128, "i16x8.extadd_pairwise_i8x16_s"),
    (Simd, Some(0xFD), 0x7D, I16x8ExtaddPairwiseI8x16U, None, V128, ___, V128, "i16x8.extadd_pairwise_i8x16_u"),
    (Simd, Some(0xFD), 0x7E, I32x4ExtaddPairwiseI16x8S, None, V128, ___, V128, "i32x4.extadd_pairwise_i16x8_s"),
    (Simd, Some(0xFD), 0x7F, I32x4ExtaddPairwiseI16x8U, None, V128, ___, V128, "i32x4.extadd_pairwise_i16x8_u"),
    (Simd, Some(0xFD), 0x80, I16x8Abs,      None, V128, ___,  V128, "i16x8.abs"),
    (Simd, Some(0xFD), 0x81, I16x8Neg,      None, V128, ___,  V128, "i16x8.neg"),
    (Simd, Some(0xFD), 0x82, I16x8Q15MulrSatS, None, V128, V128, V128, "i16x8.q15mulr_sat_s"),
    (Simd, Some(0xFD), 0x83, I16x8AllTrue,  None, V128, ___,  I32,  "i16x8.all_true"),
    (Simd, Some(0xFD), 0x84, I16x8Bitmask,  None, V128, ___,  I32,  "i16x8.bitmask"),
    (Simd, Some(0xFD), 0x85, I16x8NarrowI32x4S, None, V128, V128, V128, "i16x8.narrow_i32x4_s"),
    (Simd, Some(0xFD), 0x86, I16x8NarrowI32x4U, None, V128, V128, V128, "i16x8.narrow_i32x4_u"),
    (Simd, Some(0xFD), 0x87, I16x8ExtendLowI8x16S,  None, V128, ___, V128, "i16x8.extend_low_i8x16_s"),
    (Simd, Some(0xFD), 0x88, I16x8ExtendHighI8x16S, None, V128, ___, V128, "i16x8.extend_high_i8x16_s"),
    (Simd, Some(0xFD), 0x89, I16x8ExtendLowI8x16U,  None, V128, ___, V128, "i16x8.extend_low_i8x16_u"),
    (Simd, Some(0xFD), 0x8A, I16x8ExtendHighI8x16U, None, V128, ___, V128, "i16x8.extend_high_i8x16_u"),
    (Simd, Some(0xFD), 0x8B, I16x8Shl,      None, V128, I32,  V128, "i16x8.shl"),
    (Simd, Some(0xFD), 0x8C, I16x8ShrS,     None, V128, I32,  V128, "i16x8.shr_s"),
    (Simd, Some(0xFD), 0x8D, I16x8ShrU,     None, V128, I32,  V128, "i16x8.shr_u"),
    (Simd, Some(0xFD), 0x8E, I16x8Add,      None, V128, V128, V128, "i16x8.add"),
    (Simd, Some(0xFD), 0x8F, I16x8AddSatS,  None, V128, V128, V128, "i16x8.add_sat_s"),
    (Simd, Some(0xFD), 0x90, I16x8AddSatU,  None, V128, V128, V128, "i16x8.add_sat_u"),
    (Simd, Some(0xFD), 0x91, I16x8Sub,      None, V128, V128, V128, "i16x8.sub"),
    (Simd, Some(0xFD), 0x92, I16x8SubSatS,  None, V128, V128, V128, "i16x8.sub_sat_s"),
    (Simd, Some(0xFD), 0x93, I16x8SubSatU,  None, V128, V128, V128, "i16x8.sub_sat_u"),
    (Simd, Some(0xFD), 0x94, F64x2Nearest,  None, V128, ___,  V128, "f64x2.nearest"),
    (Simd, Some(0xFD), 0x95, I16x8Mul,      None, V128, V128, V128, "i16x8.mul"),
    (Simd, Some(0xFD), 0x96, I16x8MinS,     None, V128, V128, V128, "i16x8.min_s"),
    (Simd, Some(0xFD), 0x97, I16x8MinU,     None, V128, V128, V128, "i16x8.min_u"),
    (Simd, Some(0xFD), 0x98, I16x8MaxS,     None, V128, V128, V128, "i16x8.max_s"),
    (Simd, Some(0xFD), 0x99, I16x8MaxU,     None, V128, V128, V128, "i16x8.max_u"),
    (Simd, Some(0xFD), 0x9B, I16x8AvgrU,    None, V128, V128, V128, "i16x8.avgr_u"),
    (Simd, Some(0xFD), 0x9C, I16x8ExtmulLowI8x16S,  None, V128, V128, V128, "i16x8.extmul_low_i8x16_s"),
    (Simd, Some(0xFD), 0x9D, I16x8ExtmulHighI8x16S, None, V128, V128, V128, "i16x8.extmul_high_i8x16_s"),
    (Simd, Some(0xFD), 0x9E, I16x8ExtmulLowI8x16U,  None, V128, V128, V128, "i16x8.extmul_low_i8x16_u"),
    (Simd, Some(0xFD), 0x9F, I16x8ExtmulHighI8x16U, None, V128, V128, V128, "i16x8.extmul_high_i8x16_u"),
    (Simd, Some(0xFD), 0xA0, I32x4Abs,      None, V128, ___,  V128, "i32x4.abs"),
    (Simd, Some(0xFD), 0xA1, I32x4Neg,      None, V128, ___,  V128, "i32x4.neg"),
    (Simd, Some(0xFD), 0xA3, I32x4AllTrue,  None, V128, ___,  I32,  "i32x4.all_true"),
    (Simd, Some(0xFD), 0xA4, I32x4Bitmask,  None, V128, ___,  I32,  "i32x4.bitmask"),
    (Simd, Some(0xFD), 0xA7, I32x4ExtendLowI16x8S,  None, V128, ___, V128, "i32x4.extend_low_i16x8_s"),
    (Simd, Some(0xFD), 0xA8, I32x4ExtendHighI16x8S, None, V128, ___, V128, "i32x4.extend_high_i16x8_s"),
    (Simd, Some(0xFD), 0xA9, I32x4ExtendLowI16x8U,  None, V128, ___, V128, "i32x4.extend_low_i16x8_u"),
    (Simd, Some(0xFD), 0xAA, I32x4ExtendHighI16x8U, None, V128, ___, V128, "i32x4.extend_high_i16x8_u"),
    (Simd, Some(0xFD), 0xAB, I32x4Shl,      None, V128, I32,  V128, "i32x4.shl"),
    (Simd, Some(0xFD), 0xAC, I32x4ShrS,     None, V128, I32,  V128, "i32x4.shr_s"),
    (Simd, Some(0xFD), 0xAD, I32x4ShrU,     None, V128, I32,  V128, "i32x4.shr_u"),
    (Simd, Some(0xFD), 0xAE, I32x4Add,      None, V128, V128, V128, "i32x4.add"),
    (Simd, Some(0xFD), 0xB1, I32x4Sub,      None, V128, V128, V128, "i32x4.sub"),
    (Simd, Some(0xFD), 0xB5, I32x4Mul,      None, V128, V128, V128, "i32x4.mul"),
    (Simd, Some(0xFD), 0xB6, I32x4MinS,     None, V128, V128, V128, "i32x4.min_s"),
    (Simd, Some(0xFD), 0xB7, I32x4MinU,     None, V128, V128, V128, "i32x4.min_u"),
    (Simd, Some(0xFD), 0xB8, I32x4MaxS,     None, V128, V128, V128, "i32x4.max_s"),
    (Simd, Some(0xFD), 0xB9, I32x4MaxU,     None, V128, V128, V128, "i32x4.max_u"),
    (Simd, Some(0xFD), 0xBA, I32x4DotI16x8S, None, V128, V128, V128, "i32x4.dot_i16x8_s"),
    (Simd, Some(0xFD), 0xBC, I32x4ExtmulLowI16x8S,  None, V128, V128, V128, "i32x4.extmul_low_i16x8_s"),
    (Simd, Some(0xFD), 0xBD, I32x4ExtmulHighI16x8S, None, V128, V128, V128, "i32x4.extmul_high_i16x8_s"),
    (Simd, Some(0xFD), 0xBE, I32x4ExtmulLowI16x8U,  None, V128, V128, V128, "i32x4.extmul_low_i16x8_u"),
    (Simd, Some(0xFD), 0xBF, I32x4ExtmulHighI16x8U, None, V128, V128, V128, "i32x4.extmul_high_i16x8_u"),
    (Simd, Some(0xFD), 0xC0, I64x2Abs,      None, V128, ___,  V128, "i64x2.abs"),
    (Simd, Some(0xFD), 0xC1, I64x2Neg,      None, V128, ___,  V128, "i64x2.neg"),
    (Simd, Some(0xFD), 0xC3, I64x2AllTrue,  None, V128, ___,  I32,  "i64x2.all_true"),
    (Simd, Some(0xFD), 0xC4, I64x2Bitmask,  None, V128, ___,  I32,  "i64x2.bitmask"),
    (Simd, Some(0xFD), 0xC7, I64x2ExtendLowI32x4S,  None, V128, ___, V128, "i64x2.extend_low_i32x4_s"),
    (Simd, Some(0xFD), 0xC8, I64x2ExtendHighI32x4S, None, V128, ___, V128, "i64x2.extend_high_i32x4_s"),
    (Simd, Some(0xFD), 0xC9, I64x2ExtendLowI32x4U,  None, V128, ___, V128, "i64x2.extend_low_i32x4_u"),
    (Simd, Some(0xFD), 0xCA, I64x2ExtendHighI32x4U, None, V128, ___, V128, "i64x2.extend_high_i32x4_u"),
    (Simd, Some(0xFD), 0xCB, I64x2Shl,      None, V128, I32,  V128, "i64x2.shl"),
    (Simd, Some(0xFD), 0xCC, I64x2ShrS,     None, V128, I32,  V128, "i64x2.shr_s"),
    (Simd, Some(0xFD), 0xCD, I64x2ShrU,     None, V128, I32,  V128, "i64x2.shr_u"),
    (Simd, Some(0xFD), 0xCE, I64x2Add,      None, V128, V128, V128, "i64x2.add"),
    (Simd, Some(0xFD), 0xD1, I64x2Sub,      None, V128, V128, V128, "i64x2.sub"),
    (Simd, Some(0xFD), 0xD5, I64x2Mul,      None, V128, V128, V128, "i64x2.mul"),
    (Simd, Some(0xFD), 0xD6, I64x2Eq,       None, V128, V128, V128, "i64x2.eq"),
    (Simd, Some(0xFD), 0xD7, I64x2Ne,       None, V128, V128, V128, "i64x2.ne"),
    (Simd, Some(0xFD), 0xD8, I64x2LtS,      None, V128, V128, V128, "i64x2.lt_s"),
    (Simd, Some(0xFD), 0xD9, I64x2GtS,      None, V128, V128, V128, "i64x2.gt_s"),
    (Simd, Some(0xFD), 0xDA, I64x2LeS,      None, V128, V128, V128, "i64x2.le_s"),
    (Simd, Some(0xFD), 0xDB, I64x2GeS,      None, V128, V128, V128, "i64x2.ge_s"),
    (Simd, Some(0xFD), 0xDC, I64x2ExtmulLowI32x4S,  None, V128, V128, V128, "i64x2.extmul_low_i32x4_s"),
    (Simd, Some(0xFD), 0xDD, I64x2ExtmulHighI32x4S, None, V128, V128, V128, "i64x2.extmul_high_i32x4_s"),
    (Simd, Some(0xFD), 0xDE, I64x2ExtmulLowI32x4U,  None, V128, V128, V128, "i64x2.extmul_low_i32x4_u"),
    (Simd, Some(0xFD), 0xDF, I64x2ExtmulHighI32x4U, None, V128, V128, V128, "i64x2.extmul_high_i32x4_u"),
    (Simd, Some(0xFD), 0xE0, F32x4Abs,      None, V128, ___,  V128, "f32x4.abs"),
    (Simd, Some(0xFD), 0xE1, F32x4Neg,      None, V128, ___,  V128, "f32x4.neg"),
    (Simd, Some(0xFD), 0xE3, F32x4Sqrt,     None, V128, ___,  V128, "f32x4.sqrt"),
    (Simd, Some(0xFD), 0xE4, F32x4Add,      None, V128, V128, V128, "f32x4.add"),
    (Simd, Some(0xFD), 0xE5, F32x4Sub,      None, V128, V128, V128, "f32x4.sub"),
    (Simd, Some(0xFD), 0xE6, F32x4Mul,      None, V128, V128, V128, "f32x4.mul"),
    (Simd, Some(0xFD), 0xE7, F32x4Div,      None, V128, V128, V128, "f32x4.div"),
    (Simd, Some(0xFD), 0xE8, F32x4Min,      None, V128, V128, V128, "f32x4.min"),
    (Simd, Some(0xFD), 0xE9, F32x4Max,      None, V128, V128, V128, "f32x4.max"),
    (Simd, Some(0xFD), 0xEA, F32x4PMin,     None, V128, V128, V128, "f32x4.pmin"),
    (Simd, Some(0xFD), 0xEB, F32x4PMax,     None, V128, V128, V128, "f32x4.pmax"),
    (Simd, Some(0xFD), 0xEC, F64x2Abs,      None, V128, ___,  V128, "f64x2.abs"),
    (Simd, Some(0xFD), 0xED, F64x2Neg,      None, V128, ___,  V128, "f64x2.neg"),
    (Simd, Some(0xFD), 0xEF, F64x2Sqrt,     None, V128, ___,  V128, "f64x2.sqrt"),
    (Simd, Some(0xFD), 0xF0, F64x2Add,      None, V128, V128, V128, "f64x2.add"),
    (Simd, Some(0xFD), 0xF1, F64x2Sub,      None, V128, V128, V128, "f64x2.sub"),
    (Simd, Some(0xFD), 0xF2, F64x2Mul,      None, V128, V128, V128, "f64x2.mul"),
    (Simd, Some(0xFD), 0xF3, F64x2Div,      None, V128, V128, V128, "f64x2.div"),
    (Simd, Some(0xFD), 0xF4, F64x2Min,      None, V128, V128, V128, "f64x2.min"),
    (Simd, Some(0xFD), 0xF5, F64x2Max,      None, V128, V128, V128, "f64x2.max"),
    (Simd, Some(0xFD), 0xF6, F64x2PMin,     None, V128, V128, V128, "f64x2.pmin"),
    (Simd, Some(0xFD), 0xF7, F64x2PMax,     None, V128, V128, V128, "f64x2.pmax"),
    (Simd, Some(0xFD), 0xF8, I32x4TruncSatF32x4S,     None, V128, ___, V128, "i32x4.trunc_sat_f32x4_s"),
    (Simd, Some(0xFD), 0xF9, I32x4TruncSatF32x4U,     None, V128, ___, V128, "i32x4.trunc_sat_f32x4_u"),
    (Simd, Some(0xFD), 0xFA, F32x4ConvertI32x4S,      None, V128, ___, V128, "f32x4.convert_i32x4_s"),
    (Simd, Some(0xFD), 0xFB, F32x4ConvertI32x4U,      None, V128, ___, V128, "f32x4.convert_i32x4_u"),
    (Simd, Some(0xFD), 0xFC, I32x4TruncSatF64x2SZero, None, V128, ___, V128, "i32x4.trunc_sat_f64x2_s_zero"),
    (Simd, Some(0xFD), 0xFD, I32x4TruncSatF64x2UZero, None, V128, ___, V128, "i32x4.trunc_sat_f64x2_u_zero"),
    (Simd, Some(0xFD), 0xFE, F64x2ConvertLowI32x4S,   None, V128, ___, V128, "f64x2.convert_low_i32x4_s"),
    (Simd, Some(0xFD), 0xFF, F64x2ConvertLowI32x4U,   None, V128, ___, V128, "f64x2.convert_low_i32x4_u"),

    // Atomics (0xFE) ---------------------------------------------------------
    (Threads, Some(0xFE), 0x00, MemoryAtomicNotify, MemArg, I32, I32, I32, "memory.atomic.notify"),
    (Threads, Some(0xFE), 0x01, MemoryAtomicWait32, MemArg, ___, ___, ___, "memory.atomic.wait32"),
    (Threads, Some(0xFE), 0x02, MemoryAtomicWait64, MemArg, ___, ___, ___, "memory.atomic.wait64"),
    (Threads, Some(0xFE), 0x03, AtomicFence,        Index,  ___, ___, ___, "atomic.fence"),
    (Threads, Some(0xFE), 0x10, I32AtomicLoad,    MemArg, I32, ___, I32, "i32.atomic.load"),
    (Threads, Some(0xFE), 0x11, I64AtomicLoad,    MemArg, I32, ___, I64, "i64.atomic.load"),
    (Threads, Some(0xFE), 0x12, I32AtomicLoad8U,  MemArg, I32, ___, I32, "i32.atomic.load8_u"),
    (Threads, Some(0xFE), 0x13, I32AtomicLoad16U, MemArg, I32, ___, I32, "i32.atomic.load16_u"),
    (Threads, Some(0xFE), 0x14, I64AtomicLoad8U,  MemArg, I32, ___, I64, "i64.atomic.load8_u"),
    (Threads, Some(0xFE), 0x15, I64AtomicLoad16U, MemArg, I32, ___, I64, "i64.atomic.load16_u"),
    (Threads, Some(0xFE), 0x16, I64AtomicLoad32U, MemArg, I32, ___, I64, "i64.atomic.load32_u"),
    (Threads, Some(0xFE), 0x17, I32AtomicStore,   MemArg, I32, I32, ___, "i32.atomic.store"),
    (Threads, Some(0xFE), 0x18, I64AtomicStore,   MemArg, I32, I64, ___, "i64.atomic.store"),
    (Threads, Some(0xFE), 0x19, I32AtomicStore8,  MemArg, I32, I32, ___, "i32.atomic.store8"),
    (Threads, Some(0xFE), 0x1A, I32AtomicStore16, MemArg, I32, I32, ___, "i32.atomic.store16"),
    (Threads, Some(0xFE), 0x1B, I64AtomicStore8,  MemArg, I32, I64, ___, "i64.atomic.store8"),
    (Threads, Some(0xFE), 0x1C, I64AtomicStore16, MemArg, I32, I64, ___, "i64.atomic.store16"),
    (Threads, Some(0xFE), 0x1D, I64AtomicStore32, MemArg, I32, I64, ___, "i64.atomic.store32"),
    (Threads, Some(0xFE), 0x1E, I32AtomicRmwAdd,     MemArg, I32, I32, I32, "i32.atomic.rmw.add"),
    (Threads, Some(0xFE), 0x1F, I64AtomicRmwAdd,     MemArg, I32, I64, I64, "i64.atomic.rmw.add"),
    (Threads, Some(0xFE), 0x20, I32AtomicRmw8AddU,   MemArg, I32, I32, I32, "i32.atomic.rmw8.add_u"),
    (Threads, Some(0xFE), 0x21, I32AtomicRmw16AddU,  MemArg, I32, I32, I32, "i32.atomic.rmw16.add_u"),
    (Threads, Some(0xFE), 0x22, I64AtomicRmw8AddU,   MemArg, I32, I64, I64, "i64.atomic.rmw8.add_u"),
    (Threads, Some(0xFE), 0x23, I64AtomicRmw16AddU,  MemArg, I32, I64, I64, "i64.atomic.rmw16.add_u"),
    (Threads, Some(0xFE), 0x24, I64AtomicRmw32AddU,  MemArg, I32, I64, I64, "i64.atomic.rmw32.add_u"),
    (Threads, Some(0xFE), 0x25, I32AtomicRmwSub,     MemArg, I32, I32, I32, "i32.atomic.rmw.sub"),
    (Threads, Some(0xFE), 0x26, I64AtomicRmwSub,     MemArg, I32, I64, I64, "i64.atomic.rmw.sub"),
    (Threads, Some(0xFE), 0x27, I32AtomicRmw8SubU,   MemArg, I32, I32, I32, "i32.atomic.rmw8.sub_u"),
    (Threads, Some(0xFE), 0x28, I32AtomicRmw16SubU,  MemArg, I32, I32, I32, "i32.atomic.rmw16.sub_u"),
    (Threads, Some(0xFE), 0x29, I64AtomicRmw8SubU,   MemArg, I32, I64, I64, "i64.atomic.rmw8.sub_u"),
    (Threads, Some(0xFE), 0x2A, I64AtomicRmw16SubU,  MemArg, I32, I64, I64, "i64.atomic.rmw16.sub_u"),
    (Threads, Some(0xFE), 0x2B, I64AtomicRmw32SubU,  MemArg, I32, I64, I64, "i64.atomic.rmw32.sub_u"),
    (Threads, Some(0xFE), 0x2C, I32AtomicRmwAnd,     MemArg, I32, I32, I32, "i32.atomic.rmw.and"),
    (Threads, Some(0xFE), 0x2D, I64AtomicRmwAnd,     MemArg, I32, I64, I64, "i64.atomic.rmw.and"),
    (Threads, Some(0xFE), 0x2E, I32AtomicRmw8AndU,   MemArg, I32, I32, I32, "i32.atomic.rmw8.and_u"),
    (Threads, Some(0xFE), 0x2F, I32AtomicRmw16AndU,  MemArg, I32, I32, I32, "i32.atomic.rmw16.and_u"),
    (Threads, Some(0xFE), 0x30, I64AtomicRmw8AndU,   MemArg, I32, I64, I64, "i64.atomic.rmw8.and_u"),
    (Threads, Some(0xFE), 0x31, I64AtomicRmw16AndU,  MemArg, I32, I64, I64, "i64.atomic.rmw16.and_u"),
    (Threads, Some(0xFE), 0x32, I64AtomicRmw32AndU,  MemArg, I32, I64, I64, "i64.atomic.rmw32.and_u"),
    (Threads, Some(0xFE), 0x33, I32AtomicRmwOr,      MemArg, I32, I32, I32, "i32.atomic.rmw.or"),
    (Threads, Some(0xFE), 0x34, I64AtomicRmwOr,      MemArg, I32, I64, I64, "i64.atomic.rmw.or"),
    (Threads, Some(0xFE), 0x35, I32AtomicRmw8OrU,    MemArg, I32, I32, I32, "i32.atomic.rmw8.or_u"),
    (Threads, Some(0xFE), 0x36, I32AtomicRmw16OrU,   MemArg, I32, I32, I32, "i32.atomic.rmw16.or_u"),
    (Threads, Some(0xFE), 0x37, I64AtomicRmw8OrU,    MemArg, I32, I64, I64, "i64.atomic.rmw8.or_u"),
    (Threads, Some(0xFE), 0x38, I64AtomicRmw16OrU,   MemArg, I32, I64, I64, "i64.atomic.rmw16.or_u"),
    (Threads, Some(0xFE), 0x39, I64AtomicRmw32OrU,   MemArg, I32, I64, I64, "i64.atomic.rmw32.or_u"),
    (Threads, Some(0xFE), 0x3A, I32AtomicRmwXor,     MemArg, I32, I32, I32, "i32.atomic.rmw.xor"),
    (Threads, Some(0xFE), 0x3B, I64AtomicRmwXor,     MemArg, I32, I64, I64, "i64.atomic.rmw.xor"),
    (Threads, Some(0xFE), 0x3C, I32AtomicRmw8XorU,   MemArg, I32, I32, I32, "i32.atomic.rmw8.xor_u"),
    (Threads, Some(0xFE), 0x3D, I32AtomicRmw16XorU,  MemArg, I32, I32, I32, "i32.atomic.rmw16.xor_u"),
    (Threads, Some(0xFE), 0x3E, I64AtomicRmw8XorU,   MemArg, I32, I64, I64, "i64.atomic.rmw8.xor_u"),
    (Threads, Some(0xFE), 0x3F, I64AtomicRmw16XorU,  MemArg, I32, I64, I64, "i64.atomic.rmw16.xor_u"),
    (Threads, Some(0xFE), 0x40, I64AtomicRmw32XorU,  MemArg, I32, I64, I64, "i64.atomic.rmw32.xor_u"),
    (Threads, Some(0xFE), 0x41, I32AtomicRmwXchg,    MemArg, I32, I32, I32, "i32.atomic.rmw.xchg"),
    (Threads, Some(0xFE), 0x42, I64AtomicRmwXchg,    MemArg, I32, I64, I64, "i64.atomic.rmw.xchg"),
    (Threads, Some(0xFE), 0x43, I32AtomicRmw8XchgU,  MemArg, I32, I32, I32, "i32.atomic.rmw8.xchg_u"),
    (Threads, Some(0xFE), 0x44, I32AtomicRmw16XchgU, MemArg, I32, I32, I32, "i32.atomic.rmw16.xchg_u"),
    (Threads, Some(0xFE), 0x45, I64AtomicRmw8XchgU,  MemArg, I32, I64, I64, "i64.atomic.rmw8.xchg_u"),
    (Threads, Some(0xFE), 0x46, I64AtomicRmw16XchgU, MemArg, I32, I64, I64, "i64.atomic.rmw16.xchg_u"),
    (Threads, Some(0xFE), 0x47, I64AtomicRmw32XchgU, MemArg, I32, I64, I64, "i64.atomic.rmw32.xchg_u"),
    (Threads, Some(0xFE), 0x48, I32AtomicRmwCmpxchg,    MemArg, ___, ___, ___, "i32.atomic.rmw.cmpxchg"),
    (Threads, Some(0xFE), 0x49, I64AtomicRmwCmpxchg,    MemArg, ___, ___, ___, "i64.atomic.rmw.cmpxchg"),
    (Threads, Some(0xFE), 0x4A, I32AtomicRmw8CmpxchgU,  MemArg, ___, ___, ___, "i32.atomic.rmw8.cmpxchg_u"),
    (Threads, Some(0xFE), 0x4B, I32AtomicRmw16CmpxchgU, MemArg, ___, ___, ___, "i32.atomic.rmw16.cmpxchg_u"),
    (Threads, Some(0xFE), 0x4C, I64AtomicRmw8CmpxchgU,  MemArg, ___, ___, ___, "i64.atomic.rmw8.cmpxchg_u"),
    (Threads, Some(0xFE), 0x4D, I64AtomicRmw16CmpxchgU, MemArg, ___, ___, ___, "i64.atomic.rmw16.cmpxchg_u"),
    (Threads, Some(0xFE), 0x4E, I64AtomicRmw32CmpxchgU, MemArg, ___, ___, ___, "i64.atomic.rmw32.cmpxchg_u"),
}

type LookupTables = (Vec<Option<Opcode>>, HashMap<(u8, u32), Opcode>);

fn lookup_tables() -> &'static LookupTables {
    static TABLES: OnceCell<LookupTables> = OnceCell::new();
    TABLES.get_or_init(|| {
        let mut plain = vec![None; 256];
        let mut prefixed = HashMap::new();
        for op in ALL_OPCODES {
            match op.encoding() {
                (None, code) => plain[code as usize] = Some(*op),
                (Some(prefix), code) => {
                    prefixed.insert((prefix, code), *op);
                }
            }
        }
        (plain, prefixed)
    })
}

impl Opcode {
    /// Look up a single-byte opcode.
    pub fn from_byte(byte: u8) -> Option<Opcode> {
        lookup_tables().0[byte as usize]
    }

    /// Look up a prefixed opcode by its LEB subcode.
    pub fn from_prefixed(prefix: u8, subcode: u32) -> Option<Opcode> {
        lookup_tables().1.get(&(prefix, subcode)).copied()
    }

    /// True for the opcodes that open a nested block and require a matching
    /// `end`.
    pub fn opens_block(self) -> bool {
        matches!(
            self,
            Opcode::Block | Opcode::Loop | Opcode::If | Opcode::Try | Opcode::Let
        )
    }

    /// Number of lanes addressed by this instruction's lane immediate, when
    /// it has one.
    pub fn lane_count(self) -> Option<u8> {
        use Opcode::*;
        match self {
            I8x16ExtractLaneS | I8x16ExtractLaneU | I8x16ReplaceLane | V128Load8Lane
            | V128Store8Lane => Some(16),
            I16x8ExtractLaneS | I16x8ExtractLaneU | I16x8ReplaceLane | V128Load16Lane
            | V128Store16Lane => Some(8),
            I32x4ExtractLane | I32x4ReplaceLane | F32x4ExtractLane | F32x4ReplaceLane
            | V128Load32Lane | V128Store32Lane => Some(4),
            I64x2ExtractLane | I64x2ReplaceLane | F64x2ExtractLane | F64x2ReplaceLane
            | V128Load64Lane | V128Store64Lane => Some(2),
            _ => None,
        }
    }

    /// Natural alignment exponent for memory-access instructions (log2 of
    /// the access width). The encoded alignment may not exceed this.
    pub fn natural_alignment(self) -> Option<u32> {
        use Opcode::*;
        match self {
            I32Load8S | I32Load8U | I64Load8S | I64Load8U | I32Store8 | I64Store8
            | I32AtomicLoad8U | I64AtomicLoad8U | I32AtomicStore8 | I64AtomicStore8
            | I32AtomicRmw8AddU | I64AtomicRmw8AddU | I32AtomicRmw8SubU | I64AtomicRmw8SubU
            | I32AtomicRmw8AndU | I64AtomicRmw8AndU | I32AtomicRmw8OrU | I64AtomicRmw8OrU
            | I32AtomicRmw8XorU | I64AtomicRmw8XorU | I32AtomicRmw8XchgU | I64AtomicRmw8XchgU
            | I32AtomicRmw8CmpxchgU | I64AtomicRmw8CmpxchgU | V128Load8Splat | V128Load8Lane
            | V128Store8Lane => Some(0),
            I32Load16S | I32Load16U | I64Load16S | I64Load16U | I32Store16 | I64Store16
            | I32AtomicLoad16U | I64AtomicLoad16U | I32AtomicStore16 | I64AtomicStore16
            | I32AtomicRmw16AddU | I64AtomicRmw16AddU | I32AtomicRmw16SubU | I64AtomicRmw16SubU
            | I32AtomicRmw16AndU | I64AtomicRmw16AndU | I32AtomicRmw16OrU | I64AtomicRmw16OrU
            | I32AtomicRmw16XorU | I64AtomicRmw16XorU | I32AtomicRmw16XchgU
            | I64AtomicRmw16XchgU | I32AtomicRmw16CmpxchgU | I64AtomicRmw16CmpxchgU
            | V128Load16Splat | V128Load16Lane | V128Store16Lane => Some(1),
            I32Load | F32Load | I32Store | F32Store | I64Load32S | I64Load32U | I64Store32
            | I32AtomicLoad | I32AtomicStore | I64AtomicLoad32U | I64AtomicStore32
            | I32AtomicRmwAdd | I32AtomicRmwSub | I32AtomicRmwAnd | I32AtomicRmwOr
            | I32AtomicRmwXor | I32AtomicRmwXchg | I32AtomicRmwCmpxchg | I64AtomicRmw32AddU
            | I64AtomicRmw32SubU | I64AtomicRmw32AndU | I64AtomicRmw32OrU | I64AtomicRmw32XorU
            | I64AtomicRmw32XchgU | I64AtomicRmw32CmpxchgU | MemoryAtomicNotify
            | MemoryAtomicWait32 | V128Load32Splat | V128Load32Zero | V128Load32Lane
            | V128Store32Lane => Some(2),
            I64Load | F64Load | I64Store | F64Store | I64AtomicLoad | I64AtomicStore
            | I64AtomicRmwAdd | I64AtomicRmwSub | I64AtomicRmwAnd | I64AtomicRmwOr
            | I64AtomicRmwXor | I64AtomicRmwXchg | I64AtomicRmwCmpxchg | MemoryAtomicWait64
            | V128Load8x8S | V128Load8x8U | V128Load16x4S | V128Load16x4U | V128Load32x2S
            | V128Load32x2U | V128Load64Splat | V128Load64Zero | V128Load64Lane
            | V128Store64Lane => Some(3),
            V128Load | V128Store => Some(4),
            _ => None,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
