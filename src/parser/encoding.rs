//! Binary encoding primitives for WebAssembly values.
//!
//! Provides the binary-format constants shared by the reader and the
//! writers, plus LEB128 integer encoding, IEEE 754 float encoding and byte
//! vector encoding. All write functions append to a caller-provided
//! `&mut Vec<u8>` and always produce the minimal LEB128 form.

use byteorder::{LittleEndian, WriteBytesExt};

// ---------------------------------------------------------------------------
// Module framing
// ---------------------------------------------------------------------------

/// `\0asm`
pub const MAGIC: u32 = 0x6d73_6100;
pub const VERSION: u32 = 1;

// Section ids
pub const SECTION_CUSTOM: u8 = 0;
pub const SECTION_TYPE: u8 = 1;
pub const SECTION_IMPORT: u8 = 2;
pub const SECTION_FUNCTION: u8 = 3;
pub const SECTION_TABLE: u8 = 4;
pub const SECTION_MEMORY: u8 = 5;
pub const SECTION_GLOBAL: u8 = 6;
pub const SECTION_EXPORT: u8 = 7;
pub const SECTION_START: u8 = 8;
pub const SECTION_ELEMENT: u8 = 9;
pub const SECTION_CODE: u8 = 10;
pub const SECTION_DATA: u8 = 11;
pub const SECTION_DATA_COUNT: u8 = 12;
pub const SECTION_EVENT: u8 = 13;

// Type constructors
pub const TYPE_FUNC: u8 = 0x60;

// Block type: empty
pub const BLOCK_TYPE_EMPTY: u8 = 0x40;

// Limits flags
pub const LIMITS_MIN: u8 = 0x00;
pub const LIMITS_MIN_MAX: u8 = 0x01;
pub const LIMITS_SHARED_MIN: u8 = 0x02;
pub const LIMITS_SHARED_MIN_MAX: u8 = 0x03;
pub const LIMITS_MIN_64: u8 = 0x04;
pub const LIMITS_MIN_MAX_64: u8 = 0x05;

// Element segment flags. 3-bit encoding: bit 0 = non-active mode,
// bit 1 = explicit table (active) or declarative (non-active),
// bit 2 = expression-encoded init.
pub const ELEM_ACTIVE_FUNCS: u32 = 0;
pub const ELEM_PASSIVE_FUNCS: u32 = 1;
pub const ELEM_ACTIVE_TABLE_FUNCS: u32 = 2;
pub const ELEM_DECLARATIVE_FUNCS: u32 = 3;
pub const ELEM_ACTIVE_EXPRS: u32 = 4;
pub const ELEM_PASSIVE_EXPRS: u32 = 5;
pub const ELEM_ACTIVE_TABLE_EXPRS: u32 = 6;
pub const ELEM_DECLARATIVE_EXPRS: u32 = 7;

pub const ELEMKIND_FUNCREF: u8 = 0x00;

// Data segment flags
pub const DATA_ACTIVE: u32 = 0;
pub const DATA_PASSIVE: u32 = 1;
pub const DATA_ACTIVE_EXPLICIT: u32 = 2;

// Opcode prefixes
pub const PREFIX_MISC: u8 = 0xFC;
pub const PREFIX_SIMD: u8 = 0xFD;
pub const PREFIX_ATOMIC: u8 = 0xFE;

// Expression terminator
pub const OP_END: u8 = 0x0B;

// ---------------------------------------------------------------------------
// Unsigned LEB128
// ---------------------------------------------------------------------------

/// Appends the minimal unsigned LEB128 encoding of a u64 value to `buf`.
fn write_vu(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            break;
        }
        byte |= 0x80;
        buf.push(byte);
    }
}

pub fn write_vu32(buf: &mut Vec<u8>, v: u32) {
    write_vu(buf, v as u64);
}

pub fn write_vu64(buf: &mut Vec<u8>, v: u64) {
    write_vu(buf, v);
}

/// Appends a single-bit boolean as a one-byte LEB128 value (0x00 or 0x01).
pub fn write_vu1(buf: &mut Vec<u8>, v: bool) {
    buf.push(if v { 1 } else { 0 });
}

// ---------------------------------------------------------------------------
// Signed LEB128
// ---------------------------------------------------------------------------

/// Appends the minimal signed LEB128 encoding of an i64 value to `buf`.
fn write_vs(buf: &mut Vec<u8>, mut value: i64) {
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if (value == 0 && (byte & 0x40) == 0) || (value == -1 && (byte & 0x40) != 0) {
            buf.push(byte);
            break;
        }
        byte |= 0x80;
        buf.push(byte);
    }
}

pub fn write_vs32(buf: &mut Vec<u8>, v: i32) {
    write_vs(buf, v as i64);
}

pub fn write_vs64(buf: &mut Vec<u8>, v: i64) {
    write_vs(buf, v);
}

// ---------------------------------------------------------------------------
// IEEE 754 floats (little-endian, bit patterns)
// ---------------------------------------------------------------------------

pub fn write_f32_bits(buf: &mut Vec<u8>, bits: u32) {
    buf.write_u32::<LittleEndian>(bits).expect("vec write");
}

pub fn write_f64_bits(buf: &mut Vec<u8>, bits: u64) {
    buf.write_u64::<LittleEndian>(bits).expect("vec write");
}

// ---------------------------------------------------------------------------
// v128 (16-byte SIMD vector, raw bytes)
// ---------------------------------------------------------------------------

pub fn write_v128(buf: &mut Vec<u8>, v: [u8; 16]) {
    buf.extend_from_slice(&v);
}

// ---------------------------------------------------------------------------
// Length-prefixed vectors
// ---------------------------------------------------------------------------

/// Appends a length-prefixed byte vector (vu32 length + raw bytes).
pub fn write_u8vec(buf: &mut Vec<u8>, v: &[u8]) {
    write_vu32(buf, v.len() as u32);
    buf.extend_from_slice(v);
}

/// Appends a UTF-8 name as a length-prefixed byte vector.
pub fn write_name(buf: &mut Vec<u8>, name: &str) {
    write_u8vec(buf, name.as_bytes());
}
