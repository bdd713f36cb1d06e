//! Instruction decoding from the binary format.
//!
//! Opcodes are one byte, or one prefix byte (0xFC, 0xFD, 0xFE) followed by a
//! LEB128 subcode selecting an extension table entry. Feature flags gate
//! legality: an opcode outside the enabled set is malformed, exactly like an
//! opcode outside the table. Immediates are decoded by shape, driven by
//! [`Opcode::immediate_kind`].

use crate::error::WasmError;
use crate::features::Features;
use crate::limits;
use crate::parser::encoding::{PREFIX_ATOMIC, PREFIX_MISC, PREFIX_SIMD};
use crate::parser::reader::Reader;
use crate::types::{BlockType, RefType, ValueType};

use super::{ByteRange, Immediate, ImmediateKind, Instruction, MemArg, Opcode};

/// Read an opcode, including any prefix byte and subcode.
pub fn read_opcode(reader: &mut Reader<'_>, features: &Features) -> Result<Opcode, WasmError> {
    let start = reader.pos();
    let byte = reader.read_byte()?;
    let opcode = match byte {
        PREFIX_MISC | PREFIX_SIMD | PREFIX_ATOMIC => {
            let subcode = reader.read_vu32()?;
            Opcode::from_prefixed(byte, subcode).ok_or_else(|| {
                WasmError::malformed(
                    start,
                    format!("unknown opcode 0x{byte:02x} 0x{subcode:02x}"),
                )
            })?
        }
        _ => Opcode::from_byte(byte)
            .ok_or_else(|| WasmError::malformed(start, format!("unknown opcode 0x{byte:02x}")))?,
    };
    if !features.contains(opcode.feature()) {
        return Err(WasmError::malformed(
            start,
            format!(
                "opcode {} requires the {} feature",
                opcode.mnemonic(),
                opcode.feature().name()
            ),
        ));
    }
    Ok(opcode)
}

fn read_block_type(reader: &mut Reader<'_>, features: &Features) -> Result<BlockType, WasmError> {
    let start = reader.pos();
    let value = reader.read_vs33()?;
    if value >= 0 {
        if !features.contains(crate::features::Feature::MultiValue) {
            return Err(WasmError::malformed(
                start,
                "block type indices require the multi-value feature",
            ));
        }
        return Ok(BlockType::FuncType(value as u32));
    }
    // Negative one-byte shorthands: the encoded byte is the low 7 bits.
    let byte = (value & 0x7f) as u8;
    if byte == crate::parser::encoding::BLOCK_TYPE_EMPTY {
        return Ok(BlockType::Empty);
    }
    ValueType::decode(byte, start, features).map(BlockType::Value)
}

impl MemArg {
    pub fn decode(reader: &mut Reader<'_>) -> Result<MemArg, WasmError> {
        let align = reader.read_vu32()?;
        let offset = reader.read_vu32()?;
        Ok(MemArg { align, offset })
    }
}

fn read_locals_vec(
    reader: &mut Reader<'_>,
    features: &Features,
) -> Result<Vec<(u32, ValueType)>, WasmError> {
    let run_count = reader.read_count(limits::MAX_FUNCTION_LOCALS, "local declaration")?;
    let mut locals = Vec::with_capacity(run_count as usize);
    let mut total: u64 = 0;
    let start = reader.pos();
    for _ in 0..run_count {
        let count = reader.read_vu32()?;
        let type_pos = reader.pos();
        let vt = ValueType::decode(reader.read_byte()?, type_pos, features)?;
        total += count as u64;
        locals.push((count, vt));
    }
    if total > limits::MAX_FUNCTION_LOCALS as u64 {
        return Err(WasmError::malformed(
            start,
            format!("too many locals: {total}"),
        ));
    }
    Ok(locals)
}

/// Decode the immediate for `opcode` according to its tabled shape.
pub fn read_immediate(
    reader: &mut Reader<'_>,
    opcode: Opcode,
    features: &Features,
) -> Result<Immediate, WasmError> {
    match opcode.immediate_kind() {
        ImmediateKind::None => Ok(Immediate::None),
        ImmediateKind::S32 => Ok(Immediate::S32(reader.read_vs32()?)),
        ImmediateKind::S64 => Ok(Immediate::S64(reader.read_vs64()?)),
        ImmediateKind::F32 => Ok(Immediate::F32(reader.read_f32_bits()?)),
        ImmediateKind::F64 => Ok(Immediate::F64(reader.read_f64_bits()?)),
        ImmediateKind::V128 => Ok(Immediate::V128(reader.read_v128()?)),
        ImmediateKind::Index => Ok(Immediate::Index(reader.read_vu32()?)),
        ImmediateKind::Block => Ok(Immediate::Block(read_block_type(reader, features)?)),
        ImmediateKind::BrOnExn => {
            let depth = reader.read_vu32()?;
            let event = reader.read_vu32()?;
            Ok(Immediate::BrOnExn { depth, event })
        }
        ImmediateKind::BrTable => {
            let count = reader.read_count(limits::MAX_BR_TABLE_LABELS, "br_table label")?;
            let mut targets = Vec::with_capacity(count as usize);
            for _ in 0..count {
                targets.push(reader.read_vu32()?);
            }
            let default = reader.read_vu32()?;
            Ok(Immediate::BrTable { targets, default })
        }
        ImmediateKind::CallIndirect => {
            let type_idx = reader.read_vu32()?;
            let table_idx = reader.read_vu32()?;
            Ok(Immediate::CallIndirect {
                type_idx,
                table_idx,
            })
        }
        ImmediateKind::Copy => {
            let dst = reader.read_vu32()?;
            let src = reader.read_vu32()?;
            Ok(Immediate::Copy { dst, src })
        }
        ImmediateKind::Init => {
            let segment = reader.read_vu32()?;
            let dst = reader.read_vu32()?;
            Ok(Immediate::Init { segment, dst })
        }
        ImmediateKind::MemArg => Ok(Immediate::MemArg(MemArg::decode(reader)?)),
        ImmediateKind::MemArgLane => {
            let memarg = MemArg::decode(reader)?;
            let lane = reader.read_byte()?;
            Ok(Immediate::MemArgLane { memarg, lane })
        }
        ImmediateKind::RefType => {
            let pos = reader.pos();
            let rt = RefType::decode(reader.read_byte()?, pos, features)?;
            Ok(Immediate::RefType(rt))
        }
        ImmediateKind::Select => {
            let count = reader.read_count(limits::MAX_SELECT_TYPED_VALUES, "select type")?;
            let mut types = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let pos = reader.pos();
                types.push(ValueType::decode(reader.read_byte()?, pos, features)?);
            }
            Ok(Immediate::Select(types))
        }
        ImmediateKind::Shuffle => {
            let mut lanes = [0u8; 16];
            lanes.copy_from_slice(reader.read_bytes(16)?);
            Ok(Immediate::Shuffle(lanes))
        }
        ImmediateKind::SimdLane => Ok(Immediate::SimdLane(reader.read_byte()?)),
        ImmediateKind::Let => {
            let block_type = read_block_type(reader, features)?;
            let locals = read_locals_vec(reader, features)?;
            Ok(Immediate::Let { block_type, locals })
        }
    }
}

/// Decode one full instruction, recording its byte range.
pub fn read_instruction(
    reader: &mut Reader<'_>,
    features: &Features,
) -> Result<Instruction, WasmError> {
    let start = reader.pos();
    let opcode = read_opcode(reader, features)?;
    let immediate = read_immediate(reader, opcode, features)?;
    Ok(Instruction {
        opcode,
        immediate,
        position: ByteRange {
            offset: start,
            length: reader.pos() - start,
        },
    })
}

/// Pull-based reader for one expression: instructions up to and including
/// the `end` that matches the expression's entry point.
///
/// Block-opening opcodes (`block`, `loop`, `if`, `try`, `let`) must be
/// matched by `end`; `else` is only legal directly inside an `if`, `catch`
/// only directly inside a `try`. Imbalance is malformed, either here or (for
/// a missing `end`) when the input runs out.
pub struct ExpressionReader<'r, 'a> {
    reader: &'r mut Reader<'a>,
    features: Features,
    frames: Vec<Opcode>,
    done: bool,
}

impl<'r, 'a> ExpressionReader<'r, 'a> {
    pub fn new(reader: &'r mut Reader<'a>, features: &Features) -> ExpressionReader<'r, 'a> {
        ExpressionReader {
            reader,
            features: *features,
            frames: Vec::new(),
            done: false,
        }
    }

    /// Depth of open blocks below the expression's own frame.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    fn step(&mut self) -> Result<Instruction, WasmError> {
        let inst = read_instruction(self.reader, &self.features)?;
        match inst.opcode {
            op if op.opens_block() => self.frames.push(op),
            Opcode::Else => match self.frames.last() {
                Some(Opcode::If) => *self.frames.last_mut().expect("just checked") = Opcode::Else,
                _ => {
                    return Err(WasmError::malformed(
                        inst.position.offset,
                        "else found outside an if block",
                    ))
                }
            },
            Opcode::Catch => match self.frames.last() {
                Some(Opcode::Try) => *self.frames.last_mut().expect("just checked") = Opcode::Catch,
                _ => {
                    return Err(WasmError::malformed(
                        inst.position.offset,
                        "catch found outside a try block",
                    ))
                }
            },
            Opcode::End => {
                if self.frames.pop().is_none() {
                    self.done = true;
                }
            }
            _ => {}
        }
        Ok(inst)
    }

    /// Read the whole expression eagerly.
    pub fn read_all(mut self) -> Result<Vec<Instruction>, WasmError> {
        let mut out = Vec::new();
        while let Some(result) = self.next() {
            out.push(result?);
        }
        Ok(out)
    }
}

impl Iterator for ExpressionReader<'_, '_> {
    type Item = Result<Instruction, WasmError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.step() {
            Ok(inst) => Some(Ok(inst)),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all() -> Features {
        Features::all()
    }

    fn read_expr(bytes: &[u8], features: &Features) -> Result<Vec<Instruction>, WasmError> {
        let mut reader = Reader::new(bytes);
        ExpressionReader::new(&mut reader, features).read_all()
    }

    #[test]
    fn decodes_trivial_body() {
        let insts = read_expr(&[0x0b], &all()).unwrap();
        assert_eq!(insts.len(), 1);
        assert_eq!(insts[0].opcode, Opcode::End);
    }

    #[test]
    fn decodes_const_add() {
        let insts = read_expr(&[0x41, 0x01, 0x41, 0x02, 0x6a, 0x0b], &all()).unwrap();
        assert_eq!(insts.len(), 4);
        assert_eq!(insts[0].opcode, Opcode::I32Const);
        assert_eq!(insts[0].immediate, Immediate::S32(1));
        assert_eq!(insts[2].opcode, Opcode::I32Add);
        assert_eq!(insts[3].opcode, Opcode::End);
    }

    #[test]
    fn records_byte_ranges() {
        let insts = read_expr(&[0x41, 0x80, 0x01, 0x0b], &all()).unwrap();
        assert_eq!(insts[0].position, ByteRange { offset: 0, length: 3 });
        assert_eq!(insts[1].position, ByteRange { offset: 3, length: 1 });
    }

    #[test]
    fn nested_blocks_consume_matching_end() {
        // block (empty) i32.const 0 drop end end ... trailing bytes untouched
        let bytes = [0x02, 0x40, 0x41, 0x00, 0x1a, 0x0b, 0x0b, 0x41];
        let mut reader = Reader::new(&bytes);
        let insts = ExpressionReader::new(&mut reader, &all())
            .read_all()
            .unwrap();
        assert_eq!(insts.last().unwrap().opcode, Opcode::End);
        assert_eq!(insts.len(), 5);
        assert_eq!(reader.pos(), 7);
    }

    #[test]
    fn if_permits_one_else() {
        // if (empty) nop else nop end end
        let insts = read_expr(&[0x04, 0x40, 0x01, 0x05, 0x01, 0x0b, 0x0b], &all()).unwrap();
        assert_eq!(insts[3].opcode, Opcode::Else);

        // A second else in the same if is imbalanced.
        let err = read_expr(&[0x04, 0x40, 0x05, 0x05, 0x0b, 0x0b], &all()).unwrap_err();
        assert!(err.message.contains("else"));
    }

    #[test]
    fn stray_else_is_malformed() {
        let err = read_expr(&[0x05, 0x0b], &all()).unwrap_err();
        assert!(err.message.contains("else found outside"));
    }

    #[test]
    fn truncated_expression_is_malformed() {
        let err = read_expr(&[0x02, 0x40, 0x01], &all()).unwrap_err();
        assert_eq!(err.message, "unexpected end of input");
    }

    #[test]
    fn unknown_opcode_is_malformed() {
        let err = read_expr(&[0xC5, 0x0b], &all()).unwrap_err();
        assert!(err.message.contains("unknown opcode 0xc5"));
    }

    #[test]
    fn unknown_subcode_is_malformed() {
        let err = read_expr(&[0xFC, 0x99, 0x0b], &all()).unwrap_err();
        assert!(err.message.contains("unknown opcode 0xfc"));
    }

    #[test]
    fn feature_gating_rejects_disabled_opcodes() {
        let mvp = Features::mvp();
        // i32.trunc_sat_f32_s needs saturating-float-to-int.
        let err = read_expr(&[0xFC, 0x00, 0x0b], &mvp).unwrap_err();
        assert!(err.message.contains("saturating-float-to-int"));
        // ref.null needs reference-types.
        let err = read_expr(&[0xD0, 0x70, 0x0b], &mvp).unwrap_err();
        assert!(err.message.contains("reference-types"));
    }

    #[test]
    fn block_type_forms() {
        // block (result i32) end end
        let insts = read_expr(&[0x02, 0x7f, 0x0b, 0x0b], &all()).unwrap();
        assert_eq!(
            insts[0].immediate,
            Immediate::Block(BlockType::Value(ValueType::I32))
        );

        // Type-index block type.
        let insts = read_expr(&[0x02, 0x02, 0x0b, 0x0b], &all()).unwrap();
        assert_eq!(insts[0].immediate, Immediate::Block(BlockType::FuncType(2)));

        // Type-index form is gated on multi-value.
        let err = read_expr(&[0x02, 0x02, 0x0b, 0x0b], &Features::mvp()).unwrap_err();
        assert!(err.message.contains("multi-value"));
    }

    #[test]
    fn br_table_immediate() {
        let insts = read_expr(&[0x0e, 0x02, 0x00, 0x01, 0x02, 0x0b], &all()).unwrap();
        assert_eq!(
            insts[0].immediate,
            Immediate::BrTable {
                targets: vec![0, 1],
                default: 2
            }
        );
    }

    #[test]
    fn simd_immediates() {
        // v128.const with an ascending byte pattern.
        let mut bytes = vec![0xFD, 0x0C];
        bytes.extend(0u8..16u8);
        bytes.push(0x0b);
        let insts = read_expr(&bytes, &all()).unwrap();
        assert_eq!(
            insts[0].immediate,
            Immediate::V128([0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15])
        );

        // i8x16.extract_lane_s 3
        let insts = read_expr(&[0xFD, 0x15, 0x03, 0x0b], &all()).unwrap();
        assert_eq!(insts[0].opcode, Opcode::I8x16ExtractLaneS);
        assert_eq!(insts[0].immediate, Immediate::SimdLane(3));

        // v128.load8_lane align=0 offset=4 lane=7
        let insts = read_expr(&[0xFD, 0x54, 0x00, 0x04, 0x07, 0x0b], &all()).unwrap();
        assert_eq!(
            insts[0].immediate,
            Immediate::MemArgLane {
                memarg: MemArg { align: 0, offset: 4 },
                lane: 7
            }
        );
    }

    #[test]
    fn select_typed_immediate() {
        let insts = read_expr(&[0x1C, 0x01, 0x7f, 0x0b], &all()).unwrap();
        assert_eq!(insts[0].opcode, Opcode::SelectT);
        assert_eq!(insts[0].immediate, Immediate::Select(vec![ValueType::I32]));
    }

    #[test]
    fn try_catch_nesting() {
        // try (empty) nop catch nop end end
        let insts = read_expr(&[0x06, 0x40, 0x01, 0x07, 0x01, 0x0b, 0x0b], &all()).unwrap();
        assert_eq!(insts[0].opcode, Opcode::Try);
        assert_eq!(insts[3].opcode, Opcode::Catch);

        let err = read_expr(&[0x07, 0x0b], &all()).unwrap_err();
        assert!(err.message.contains("catch found outside"));
    }

    #[test]
    fn let_immediate() {
        // let (empty) with one run of 2 i32 locals, then end end
        let insts = read_expr(&[0x17, 0x40, 0x01, 0x02, 0x7f, 0x0b, 0x0b], &all()).unwrap();
        assert_eq!(
            insts[0].immediate,
            Immediate::Let {
                block_type: BlockType::Empty,
                locals: vec![(2, ValueType::I32)]
            }
        );
    }
}
