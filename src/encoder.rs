//! Binary encoder: serialises a [`Module`] to `.wasm` bytes.
//!
//! The conceptual inverse of [`crate::parser::parse`]. Sections are emitted
//! in canonical order, each assembled into a scratch buffer first so its
//! LEB128 size can be prepended, and absent sections are omitted entirely.
//! All integers use minimal LEB128, so feeding the output back through the
//! reader yields a structurally equal module and re-encoding it reproduces
//! the same bytes.
//!
//! Custom sections are emitted after the known sections; their payloads are
//! written back byte-for-byte.

use thiserror::Error;

use crate::module::{
    CustomSection, DataMode, ElementInit, ElementMode, ElementSegment, ImportDesc, Module,
};
use crate::parser::encoding::{
    write_name, write_u8vec, write_vu1, write_vu32, ELEMKIND_FUNCREF, LIMITS_MIN, LIMITS_MIN_MAX,
    LIMITS_SHARED_MIN_MAX, MAGIC, OP_END, SECTION_CODE, SECTION_CUSTOM, SECTION_DATA,
    SECTION_DATA_COUNT, SECTION_ELEMENT, SECTION_EVENT, SECTION_EXPORT, SECTION_FUNCTION,
    SECTION_GLOBAL, SECTION_IMPORT, SECTION_MEMORY, SECTION_START, SECTION_TABLE, SECTION_TYPE,
    TYPE_FUNC, VERSION,
};
use crate::parser::instruction::{Instruction, Opcode};
use crate::types::{EventType, GlobalType, Limits, RefType, TableType};

/// Errors that can occur during binary encoding.
///
/// A module produced by the reader never triggers these; they guard against
/// hand-built models whose segment flags disagree with their payload shape.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("invalid element segment flags: {0}")]
    InvalidElementFlags(u32),
    #[error("invalid state: {0}")]
    InvalidState(String),
}

/// Encode a module to its canonical binary form.
pub fn encode(module: &Module) -> Result<Vec<u8>, EncodeError> {
    let mut buf = Vec::new();

    buf.extend_from_slice(&MAGIC.to_le_bytes());
    buf.extend_from_slice(&VERSION.to_le_bytes());

    encode_type_section(&mut buf, module);
    encode_import_section(&mut buf, module);
    encode_function_section(&mut buf, module);
    encode_table_section(&mut buf, module);
    encode_memory_section(&mut buf, module);
    encode_event_section(&mut buf, module);
    encode_global_section(&mut buf, module);
    encode_export_section(&mut buf, module);
    encode_start_section(&mut buf, module);
    encode_element_section(&mut buf, module)?;
    encode_data_count_section(&mut buf, module);
    encode_code_section(&mut buf, module);
    encode_data_section(&mut buf, module);
    encode_custom_sections(&mut buf, module);

    Ok(buf)
}

// ---------------------------------------------------------------------------
// Section encoders (in wire order)
// ---------------------------------------------------------------------------

fn encode_type_section(buf: &mut Vec<u8>, module: &Module) {
    if module.types.is_empty() {
        return;
    }
    let mut contents = Vec::new();
    write_vu32(&mut contents, module.types.len() as u32);
    for ft in &module.types {
        contents.push(TYPE_FUNC);
        write_vu32(&mut contents, ft.params.len() as u32);
        for p in &ft.params {
            contents.push(p.wire_byte());
        }
        write_vu32(&mut contents, ft.results.len() as u32);
        for r in &ft.results {
            contents.push(r.wire_byte());
        }
    }
    emit_section(buf, SECTION_TYPE, &contents);
}

fn encode_import_section(buf: &mut Vec<u8>, module: &Module) {
    if module.imports.is_empty() {
        return;
    }
    let mut contents = Vec::new();
    write_vu32(&mut contents, module.imports.len() as u32);
    for import in &module.imports {
        write_name(&mut contents, &import.module);
        write_name(&mut contents, &import.name);
        contents.push(import.desc.kind().wire_byte());
        match &import.desc {
            ImportDesc::Func(type_idx) => write_vu32(&mut contents, *type_idx),
            ImportDesc::Table(tt) => emit_table_type(&mut contents, tt),
            ImportDesc::Memory(mt) => emit_limits(&mut contents, &mt.limits),
            ImportDesc::Global(gt) => emit_global_type(&mut contents, gt),
            ImportDesc::Event(et) => emit_event_type(&mut contents, et),
        }
    }
    emit_section(buf, SECTION_IMPORT, &contents);
}

fn encode_function_section(buf: &mut Vec<u8>, module: &Module) {
    if module.functions.is_empty() {
        return;
    }
    let mut contents = Vec::new();
    write_vu32(&mut contents, module.functions.len() as u32);
    for type_idx in &module.functions {
        write_vu32(&mut contents, **type_idx);
    }
    emit_section(buf, SECTION_FUNCTION, &contents);
}

fn encode_table_section(buf: &mut Vec<u8>, module: &Module) {
    if module.tables.is_empty() {
        return;
    }
    let mut contents = Vec::new();
    write_vu32(&mut contents, module.tables.len() as u32);
    for table in &module.tables {
        emit_table_type(&mut contents, table);
    }
    emit_section(buf, SECTION_TABLE, &contents);
}

fn encode_memory_section(buf: &mut Vec<u8>, module: &Module) {
    if module.memories.is_empty() {
        return;
    }
    let mut contents = Vec::new();
    write_vu32(&mut contents, module.memories.len() as u32);
    for memory in &module.memories {
        emit_limits(&mut contents, &memory.limits);
    }
    emit_section(buf, SECTION_MEMORY, &contents);
}

fn encode_event_section(buf: &mut Vec<u8>, module: &Module) {
    if module.events.is_empty() {
        return;
    }
    let mut contents = Vec::new();
    write_vu32(&mut contents, module.events.len() as u32);
    for event in &module.events {
        emit_event_type(&mut contents, event);
    }
    emit_section(buf, SECTION_EVENT, &contents);
}

fn encode_global_section(buf: &mut Vec<u8>, module: &Module) {
    if module.globals.is_empty() {
        return;
    }
    let mut contents = Vec::new();
    write_vu32(&mut contents, module.globals.len() as u32);
    for global in &module.globals {
        emit_global_type(&mut contents, &global.global_type);
        emit_expression(&mut contents, &global.init);
    }
    emit_section(buf, SECTION_GLOBAL, &contents);
}

fn encode_export_section(buf: &mut Vec<u8>, module: &Module) {
    if module.exports.is_empty() {
        return;
    }
    let mut contents = Vec::new();
    write_vu32(&mut contents, module.exports.len() as u32);
    for export in &module.exports {
        write_name(&mut contents, &export.name);
        contents.push(export.kind.wire_byte());
        write_vu32(&mut contents, export.index);
    }
    emit_section(buf, SECTION_EXPORT, &contents);
}

fn encode_start_section(buf: &mut Vec<u8>, module: &Module) {
    let Some(start) = &module.start else {
        return;
    };
    let mut contents = Vec::new();
    write_vu32(&mut contents, **start);
    emit_section(buf, SECTION_START, &contents);
}

fn encode_element_section(buf: &mut Vec<u8>, module: &Module) -> Result<(), EncodeError> {
    if module.elements.is_empty() {
        return Ok(());
    }
    let mut contents = Vec::new();
    write_vu32(&mut contents, module.elements.len() as u32);
    for elem in &module.elements {
        emit_element_segment(&mut contents, elem)?;
    }
    emit_section(buf, SECTION_ELEMENT, &contents);
    Ok(())
}

fn emit_element_segment(buf: &mut Vec<u8>, elem: &ElementSegment) -> Result<(), EncodeError> {
    if elem.flags > 7 {
        return Err(EncodeError::InvalidElementFlags(elem.flags));
    }
    write_vu32(buf, elem.flags);

    let active = elem.flags & 0b001 == 0;
    let explicit_table = elem.flags & 0b010 != 0;
    let expressions = elem.flags & 0b100 != 0;

    if active {
        let ElementMode::Active {
            table_index,
            offset,
        } = &elem.mode
        else {
            return Err(EncodeError::InvalidState(
                "active element flags on a non-active segment".to_string(),
            ));
        };
        if explicit_table {
            write_vu32(buf, *table_index);
        }
        emit_expression(buf, offset);
    }

    // The flag layout leaves the element kind implicit for flags 0 and 4.
    if expressions {
        if elem.flags != 4 {
            buf.push(elem.kind.wire_byte());
        }
    } else if elem.flags != 0 {
        buf.push(ELEMKIND_FUNCREF);
    }

    match (&elem.init, expressions) {
        (ElementInit::Functions(indices), false) => {
            write_vu32(buf, indices.len() as u32);
            for idx in indices {
                write_vu32(buf, **idx);
            }
        }
        (ElementInit::Expressions(exprs), true) => {
            write_vu32(buf, exprs.len() as u32);
            for expr in exprs {
                emit_expression(buf, expr);
            }
        }
        _ => {
            return Err(EncodeError::InvalidState(
                "element segment init does not match its flags".to_string(),
            ));
        }
    }
    Ok(())
}

fn encode_data_count_section(buf: &mut Vec<u8>, module: &Module) {
    if module.data_count.is_none() {
        return;
    }
    let mut contents = Vec::new();
    write_vu32(&mut contents, module.data.len() as u32);
    emit_section(buf, SECTION_DATA_COUNT, &contents);
}

fn encode_code_section(buf: &mut Vec<u8>, module: &Module) {
    if module.code.is_empty() {
        return;
    }
    let mut contents = Vec::new();
    write_vu32(&mut contents, module.code.len() as u32);
    for body in &module.code {
        let mut func_buf = Vec::new();
        write_vu32(&mut func_buf, body.locals.len() as u32);
        for (count, vt) in &body.locals {
            write_vu32(&mut func_buf, *count);
            func_buf.push(vt.wire_byte());
        }
        emit_expression(&mut func_buf, &body.instructions);
        write_vu32(&mut contents, func_buf.len() as u32);
        contents.extend(func_buf);
    }
    emit_section(buf, SECTION_CODE, &contents);
}

fn encode_data_section(buf: &mut Vec<u8>, module: &Module) {
    if module.data.is_empty() {
        return;
    }
    let mut contents = Vec::new();
    write_vu32(&mut contents, module.data.len() as u32);
    for segment in &module.data {
        match &segment.mode {
            DataMode::Active {
                memory_index,
                offset,
            } => {
                if *memory_index == 0 {
                    write_vu32(&mut contents, crate::parser::encoding::DATA_ACTIVE);
                } else {
                    write_vu32(&mut contents, crate::parser::encoding::DATA_ACTIVE_EXPLICIT);
                    write_vu32(&mut contents, *memory_index);
                }
                emit_expression(&mut contents, offset);
            }
            DataMode::Passive => {
                write_vu32(&mut contents, crate::parser::encoding::DATA_PASSIVE);
            }
        }
        write_u8vec(&mut contents, &segment.init);
    }
    emit_section(buf, SECTION_DATA, &contents);
}

fn encode_custom_sections(buf: &mut Vec<u8>, module: &Module) {
    for custom in &module.custom {
        emit_custom_section(buf, custom);
    }
}

fn emit_custom_section(buf: &mut Vec<u8>, custom: &CustomSection) {
    let mut contents = Vec::new();
    write_name(&mut contents, &custom.name);
    contents.extend_from_slice(&custom.data);
    emit_section(buf, SECTION_CUSTOM, &contents);
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Wrap section contents with the section id and its LEB128 length.
fn emit_section(buf: &mut Vec<u8>, id: u8, contents: &[u8]) {
    buf.push(id);
    write_vu32(buf, contents.len() as u32);
    buf.extend_from_slice(contents);
}

fn emit_limits(buf: &mut Vec<u8>, limits: &Limits) {
    if limits.shared {
        buf.push(LIMITS_SHARED_MIN_MAX);
        write_vu32(buf, limits.min);
        write_vu32(buf, limits.max.unwrap_or(limits.min));
        return;
    }
    match limits.max {
        Some(max) => {
            buf.push(LIMITS_MIN_MAX);
            write_vu32(buf, limits.min);
            write_vu32(buf, max);
        }
        None => {
            buf.push(LIMITS_MIN);
            write_vu32(buf, limits.min);
        }
    }
}

fn emit_table_type(buf: &mut Vec<u8>, tt: &TableType) {
    emit_ref_type(buf, &tt.element);
    emit_limits(buf, &tt.limits);
}

fn emit_global_type(buf: &mut Vec<u8>, gt: &GlobalType) {
    buf.push(gt.value_type.wire_byte());
    write_vu1(buf, gt.mutable);
}

fn emit_event_type(buf: &mut Vec<u8>, et: &EventType) {
    write_vu32(buf, et.attribute);
    write_vu32(buf, et.type_idx);
}

fn emit_ref_type(buf: &mut Vec<u8>, rt: &RefType) {
    buf.push(rt.wire_byte());
}

/// Emit an instruction sequence, guaranteeing the `end` terminator.
///
/// Decoded expressions carry their trailing `end`; hand-built ones may not,
/// so one is appended when missing.
fn emit_expression(buf: &mut Vec<u8>, instructions: &[Instruction]) {
    for inst in instructions {
        inst.encode_into(buf);
    }
    if instructions.last().map(|i| i.opcode) != Some(Opcode::End) {
        buf.push(OP_END);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::Features;
    use crate::parser::parse;

    #[test]
    fn empty_module_is_header_only() {
        let bytes = encode(&Module::new()).unwrap();
        assert_eq!(bytes, b"\0asm\x01\x00\x00\x00");
    }

    #[test]
    fn trivial_module_matches_golden_bytes() {
        // One [] -> [] type, one function, body `end`.
        let golden: &[u8] = &[
            0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00, //
            0x01, 0x04, 0x01, 0x60, 0x00, 0x00, //
            0x03, 0x02, 0x01, 0x00, //
            0x0a, 0x04, 0x01, 0x02, 0x00, 0x0b,
        ];
        let module = parse(golden, &Features::all()).unwrap();
        assert_eq!(encode(&module).unwrap(), golden);
    }

    #[test]
    fn mismatched_element_shape_is_rejected() {
        let mut module = Module::new();
        module.elements.push(crate::types::At::new(
            ElementSegment {
                flags: 5,
                kind: RefType::FuncRef,
                mode: ElementMode::Passive,
                init: ElementInit::Functions(vec![]),
            },
            0,
        ));
        assert!(matches!(
            encode(&module),
            Err(EncodeError::InvalidState(_))
        ));
    }
}
