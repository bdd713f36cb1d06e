//! Instruction emission to the binary format.
//!
//! The exact mirror of [`super::decode`]: the opcode's tabled encoding is
//! written first (prefix byte plus LEB subcode where applicable), then the
//! immediate by shape. All integers come out in minimal LEB128 form.

use crate::parser::encoding::{
    write_f32_bits, write_f64_bits, write_v128, write_vs32, write_vs64, write_vu32,
    BLOCK_TYPE_EMPTY,
};
use crate::types::BlockType;

use super::{Immediate, Instruction, Opcode};

impl Opcode {
    /// Append this opcode's wire encoding.
    pub fn encode_into(self, buf: &mut Vec<u8>) {
        match self.encoding() {
            (None, code) => buf.push(code as u8),
            (Some(prefix), code) => {
                buf.push(prefix);
                write_vu32(buf, code);
            }
        }
    }
}

fn write_block_type(buf: &mut Vec<u8>, block_type: &BlockType) {
    match block_type {
        BlockType::Empty => buf.push(BLOCK_TYPE_EMPTY),
        BlockType::Value(vt) => buf.push(vt.wire_byte()),
        BlockType::FuncType(idx) => write_vs64(buf, *idx as i64),
    }
}

impl Instruction {
    /// Append the full wire form of this instruction.
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        debug_assert_eq!(
            self.immediate.kind(),
            self.opcode.immediate_kind(),
            "immediate shape does not match the opcode table for {:?}",
            self.opcode
        );
        self.opcode.encode_into(buf);
        match &self.immediate {
            Immediate::None => {
                // no immediate
            }
            Immediate::S32(v) => write_vs32(buf, *v),
            Immediate::S64(v) => write_vs64(buf, *v),
            Immediate::F32(bits) => write_f32_bits(buf, *bits),
            Immediate::F64(bits) => write_f64_bits(buf, *bits),
            Immediate::V128(bytes) => write_v128(buf, *bytes),
            Immediate::Index(idx) => write_vu32(buf, *idx),
            Immediate::Block(bt) => write_block_type(buf, bt),
            Immediate::BrOnExn { depth, event } => {
                write_vu32(buf, *depth);
                write_vu32(buf, *event);
            }
            Immediate::BrTable { targets, default } => {
                write_vu32(buf, targets.len() as u32);
                for target in targets {
                    write_vu32(buf, *target);
                }
                write_vu32(buf, *default);
            }
            Immediate::CallIndirect {
                type_idx,
                table_idx,
            } => {
                write_vu32(buf, *type_idx);
                write_vu32(buf, *table_idx);
            }
            Immediate::Copy { dst, src } => {
                write_vu32(buf, *dst);
                write_vu32(buf, *src);
            }
            Immediate::Init { segment, dst } => {
                write_vu32(buf, *segment);
                write_vu32(buf, *dst);
            }
            Immediate::MemArg(memarg) => {
                write_vu32(buf, memarg.align);
                write_vu32(buf, memarg.offset);
            }
            Immediate::MemArgLane { memarg, lane } => {
                write_vu32(buf, memarg.align);
                write_vu32(buf, memarg.offset);
                buf.push(*lane);
            }
            Immediate::RefType(rt) => buf.push(rt.wire_byte()),
            Immediate::Select(types) => {
                write_vu32(buf, types.len() as u32);
                for vt in types {
                    buf.push(vt.wire_byte());
                }
            }
            Immediate::Shuffle(lanes) => buf.extend_from_slice(lanes),
            Immediate::SimdLane(lane) => buf.push(*lane),
            Immediate::Let { block_type, locals } => {
                write_block_type(buf, block_type);
                write_vu32(buf, locals.len() as u32);
                for (count, vt) in locals {
                    write_vu32(buf, *count);
                    buf.push(vt.wire_byte());
                }
            }
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.encode_into(&mut buf);
        buf
    }
}
