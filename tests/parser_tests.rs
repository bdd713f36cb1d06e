mod common;

use common::*;
use wasmkit::error::ErrorKind;
use wasmkit::features::{Feature, Features};
use wasmkit::module::{DataMode, ElementInit, ImportDesc};
use wasmkit::parser::{parse, SectionId, SectionIterator};
use wasmkit::types::{RefType, ValueType};

#[test]
fn empty_module_parses_and_has_no_contents() {
    let module = parse(HEADER, &Features::all()).unwrap();
    assert!(module.types.is_empty());
    assert!(module.functions.is_empty());
    assert!(module.start.is_none());
    assert_eq!(module.num_funcs(), 0);
}

#[test]
fn magic_version_reject() {
    // Version 2 instead of 1.
    let bytes = [0x00, 0x61, 0x73, 0x6d, 0x02, 0x00, 0x00, 0x00];
    let err = parse(&bytes, &Features::all()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Malformed);
    assert!(err.message.contains("bad version"));
    // Diagnostics render as 0xOFFSET: message.
    assert_eq!(format!("{err}"), format!("0x00000004: {}", err.message));
}

#[test]
fn trivial_identity_module() {
    let module = parse(&trivial_module(), &Features::all()).unwrap();
    assert_eq!(module.types.len(), 1);
    assert!(module.types[0].params.is_empty());
    assert!(module.types[0].results.is_empty());
    assert_eq!(module.functions.len(), 1);
    assert_eq!(module.code.len(), 1);
}

#[test]
fn rich_module_decodes() {
    // import (func "env" "log" type 1), table, memory, global, export,
    // start, element, code, data
    let import_payload = {
        let mut p = leb(1);
        p.extend(leb(3));
        p.extend_from_slice(b"env");
        p.extend(leb(3));
        p.extend_from_slice(b"log");
        p.push(0x00); // func
        p.extend(leb(0));
        p
    };
    let global_payload = {
        let mut p = leb(1);
        p.push(0x7f); // i32
        p.push(0x00); // const
        p.extend_from_slice(&[0x41, 0x2a, 0x0b]); // i32.const 42
        p
    };
    let elem_payload = {
        let mut p = leb(1);
        p.extend(leb(0)); // flags 0: active, table 0, func indices
        p.extend_from_slice(&[0x41, 0x00, 0x0b]); // offset i32.const 0
        p.extend(leb(1));
        p.extend(leb(1)); // func index 1
        p
    };
    let data_payload = {
        let mut p = leb(1);
        p.extend(leb(0)); // active, memory 0
        p.extend_from_slice(&[0x41, 0x08, 0x0b]);
        p.extend(leb(3));
        p.extend_from_slice(b"abc");
        p
    };

    let bytes = module(&[
        type_section(&[(&[], &[]), (&[0x7f], &[0x7f])]),
        section(2, import_payload),
        func_section(&[0]),
        table_section(4),
        memory_section(1, Some(2)),
        section(6, global_payload),
        export_section(&[("run", 0x00, 1), ("mem", 0x02, 0)]),
        section(8, leb(1)), // start: func 1
        section(9, elem_payload),
        code_section(&[&body(&[0x0b])]),
        section(11, data_payload),
    ]);

    let m = parse(&bytes, &Features::all()).unwrap();
    assert_eq!(m.types.len(), 2);
    assert_eq!(m.imports.len(), 1);
    assert!(matches!(m.imports[0].desc, ImportDesc::Func(0)));
    assert_eq!(m.num_funcs(), 2);
    assert_eq!(m.func_type_idx(1), Some(0));
    assert_eq!(m.tables.len(), 1);
    assert_eq!(m.tables[0].element, RefType::FuncRef);
    assert_eq!(m.memories[0].limits.max, Some(2));
    assert_eq!(m.globals[0].global_type.value_type, ValueType::I32);
    assert_eq!(m.exports.len(), 2);
    assert_eq!(**m.start.as_ref().unwrap(), 1);
    assert_eq!(m.elements.len(), 1);
    match &m.elements[0].init {
        ElementInit::Functions(indices) => assert_eq!(**indices.first().unwrap(), 1),
        other => panic!("unexpected element init: {other:?}"),
    }
    assert_eq!(m.data.len(), 1);
    assert!(matches!(m.data[0].mode, DataMode::Active { memory_index: 0, .. }));
    assert_eq!(m.data[0].init, b"abc");
}

#[test]
fn oversized_leb_in_section_size_is_malformed() {
    // Six continuation bytes for a u32 section size.
    let mut bytes = HEADER.to_vec();
    bytes.extend([0x01, 0x80, 0x80, 0x80, 0x80, 0x80, 0x00]);
    let err = parse(&bytes, &Features::all()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Malformed);
    assert!(err.message.contains("zero extension"));
}

#[test]
fn padded_leb_within_bounds_decodes() {
    // Section size 4 encoded as 0x84 0x80 0x80 0x80 0x00 (5 bytes, padded).
    let mut bytes = HEADER.to_vec();
    bytes.push(0x01);
    bytes.extend([0x84, 0x80, 0x80, 0x80, 0x00]);
    bytes.extend([0x01, 0x60, 0x00, 0x00]);
    let module = parse(&bytes, &Features::all()).unwrap();
    assert_eq!(module.types.len(), 1);
}

#[test]
fn unknown_prefixed_subcode_is_malformed() {
    let bytes = module(&[
        type_section(&[(&[], &[])]),
        func_section(&[0]),
        code_section(&[&body(&[0xFC, 0x63, 0x0b])]),
    ]);
    let err = parse(&bytes, &Features::all()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Malformed);
    assert!(err.message.contains("unknown opcode 0xfc"));
}

#[test]
fn truncated_code_entry_is_malformed() {
    // Body claims 10 bytes but the section ends first.
    let mut payload = leb(1);
    payload.extend(leb(10));
    payload.push(0x00);
    let bytes = module(&[
        type_section(&[(&[], &[])]),
        func_section(&[0]),
        section(10, payload),
    ]);
    let err = parse(&bytes, &Features::all()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Malformed);
}

#[test]
fn body_size_mismatch_is_malformed() {
    // Declared size 4 but the expression terminates after 2 bytes.
    let mut payload = leb(1);
    payload.extend(leb(4));
    payload.extend_from_slice(&[0x00, 0x0b, 0x01, 0x01]);
    let bytes = module(&[
        type_section(&[(&[], &[])]),
        func_section(&[0]),
        section(10, payload),
    ]);
    let err = parse(&bytes, &Features::all()).unwrap_err();
    assert!(err.message.contains("function body size mismatch"));
}

#[test]
fn section_trailing_garbage_is_malformed() {
    // Type section declares one entry but carries two.
    let mut payload = leb(1);
    payload.extend_from_slice(&[0x60, 0x00, 0x00, 0x60, 0x00, 0x00]);
    let bytes = module(&[section(1, payload)]);
    let err = parse(&bytes, &Features::all()).unwrap_err();
    assert!(err.message.contains("trailing data"));
}

#[test]
fn non_utf8_import_name_is_malformed() {
    let mut payload = leb(1);
    payload.extend(leb(1));
    payload.push(0xff); // not UTF-8
    payload.extend(leb(1));
    payload.push(b'f');
    payload.push(0x00);
    payload.extend(leb(0));
    let bytes = module(&[type_section(&[(&[], &[])]), section(2, payload)]);
    let err = parse(&bytes, &Features::all()).unwrap_err();
    assert_eq!(err.message, "malformed UTF-8 encoding");
}

#[test]
fn feature_gating_applies_to_sections() {
    // A passive data segment requires bulk-memory.
    let mut payload = leb(1);
    payload.extend(leb(1)); // flags 1: passive
    payload.extend(leb(0)); // empty contents
    let bytes = module(&[section(11, payload)]);

    let err = parse(&bytes, &Features::mvp()).unwrap_err();
    assert!(err.message.contains("bulk-memory"));
    assert!(parse(&bytes, &Features::all()).is_ok());
}

#[test]
fn simd_types_are_gated() {
    let bytes = module(&[type_section(&[(&[0x7b], &[])])]);
    let err = parse(&bytes, &Features::mvp()).unwrap_err();
    assert!(err.message.contains("simd"));
    let mvp_plus_simd = Features::mvp().with(Feature::Simd);
    assert!(parse(&bytes, &mvp_plus_simd).is_ok());
}

#[test]
fn multi_value_results_are_gated() {
    let bytes = module(&[type_section(&[(&[], &[0x7f, 0x7f])])]);
    let err = parse(&bytes, &Features::mvp()).unwrap_err();
    assert!(err.message.contains("multi-value"));
    assert!(parse(&bytes, &Features::all()).is_ok());
}

#[test]
fn section_iterator_is_restartable() {
    let bytes = trivial_module();
    let frames: Vec<_> = SectionIterator::new(&bytes)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(
        frames.iter().map(|s| s.id).collect::<Vec<_>>(),
        vec![SectionId::Type, SectionId::Function, SectionId::Code]
    );

    // Re-reading a saved frame's payload yields the same bytes.
    let payload_a = frames[0].payload().to_vec();
    let payload_b = frames[0].payload().to_vec();
    assert_eq!(payload_a, payload_b);
    assert_eq!(payload_a, vec![0x01, 0x60, 0x00, 0x00]);
}

#[test]
fn event_section_decodes_with_exceptions_enabled() {
    // Event section (id 13) between Memory and Global.
    let mut event_payload = leb(1);
    event_payload.extend(leb(0)); // attribute
    event_payload.extend(leb(0)); // type index
    let bytes = module(&[type_section(&[(&[], &[])]), section(13, event_payload)]);

    let m = parse(&bytes, &Features::all()).unwrap();
    assert_eq!(m.events.len(), 1);
    assert_eq!(m.events[0].type_idx, 0);

    let err = parse(&bytes, &Features::mvp()).unwrap_err();
    assert!(err.message.contains("exceptions"));
}

#[test]
fn event_section_order_sits_between_memory_and_global() {
    let mut event_payload = leb(1);
    event_payload.extend(leb(0));
    event_payload.extend(leb(0));
    let mut global_payload = leb(1);
    global_payload.extend_from_slice(&[0x7f, 0x00, 0x41, 0x00, 0x0b]);

    // Memory, Event, Global in order: fine.
    let ordered = module(&[
        type_section(&[(&[], &[])]),
        memory_section(1, None),
        section(13, event_payload.clone()),
        section(6, global_payload.clone()),
    ]);
    assert!(parse(&ordered, &Features::all()).is_ok());

    // Event after Global: out of order.
    let unordered = module(&[
        type_section(&[(&[], &[])]),
        section(6, global_payload),
        section(13, event_payload),
    ]);
    let err = parse(&unordered, &Features::all()).unwrap_err();
    assert_eq!(
        err.message,
        "Section out of order: Event cannot occur after Global"
    );
}
