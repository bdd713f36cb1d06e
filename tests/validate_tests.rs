mod common;

use common::*;
use rstest::rstest;
use wasmkit::error::{ErrorKind, ErrorList};
use wasmkit::features::Features;
use wasmkit::parser::parse;
use wasmkit::valid::validate;

/// Parse and validate, returning the collected diagnostics.
fn validate_bytes(bytes: &[u8]) -> (bool, Vec<String>) {
    let features = Features::all();
    let module = parse(bytes, &features).expect("fixture must decode");
    let mut errors = ErrorList::new();
    let ok = validate(&module, &features, &mut errors);
    let messages = errors.iter().map(|e| e.message.clone()).collect();
    (ok, messages)
}

fn assert_invalid_with(bytes: &[u8], needle: &str) {
    let (ok, messages) = validate_bytes(bytes);
    assert!(!ok, "expected validation failure for {needle:?}");
    assert!(
        messages.iter().any(|m| m.contains(needle)),
        "no message contains {needle:?}: {messages:?}"
    );
}

#[test]
fn empty_module_validates() {
    let (ok, messages) = validate_bytes(HEADER);
    assert!(ok, "{messages:?}");
}

#[test]
fn trivial_module_validates() {
    let (ok, messages) = validate_bytes(&trivial_module());
    assert!(ok, "{messages:?}");
}

#[test]
fn result_type_mismatch_names_both_types() {
    // Function [] -> [i32] with body `i64.const 0; end`.
    let bytes = module(&[
        type_section(&[(&[], &[0x7f])]),
        func_section(&[0]),
        code_section(&[&body(&[0x42, 0x00, 0x0b])]),
    ]);
    assert_invalid_with(&bytes, "expected i32, got i64");
}

#[test]
fn call_index_out_of_range() {
    // `call 5` in a module with a single function.
    let bytes = module(&[
        type_section(&[(&[], &[])]),
        func_section(&[0]),
        code_section(&[&body(&[0x10, 0x05, 0x0b])]),
    ]);
    assert_invalid_with(&bytes, "function index 5 out of range");
}

#[test]
fn section_order_violation_is_invalid() {
    // Import section after Function section.
    let mut import_payload = leb(1);
    import_payload.extend(leb(1));
    import_payload.push(b'm');
    import_payload.extend(leb(1));
    import_payload.push(b'n');
    import_payload.push(0x00);
    import_payload.extend(leb(0));
    let bytes = module(&[
        type_section(&[(&[], &[])]),
        func_section(&[0]),
        section(2, import_payload),
    ]);
    let err = parse(&bytes, &Features::all()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Invalid);
    assert_eq!(
        err.message,
        "Section out of order: Import cannot occur after Function"
    );
}

/// Global init using a non-constant opcode.
fn nonconst_global_init() -> Vec<u8> {
    let mut p = leb(1);
    p.extend_from_slice(&[0x7f, 0x00, 0x41, 0x01, 0x41, 0x02, 0x6a, 0x0b]);
    module(&[section(6, p)])
}

/// Data segment whose offset is an f32 constant instead of an i32 one.
fn f32_data_offset() -> Vec<u8> {
    let mut p = leb(1);
    p.extend(leb(0));
    p.extend_from_slice(&[0x43, 0x00, 0x00, 0x80, 0x3f, 0x0b]); // f32.const 1.0
    p.extend(leb(0));
    module(&[memory_section(1, None), section(11, p)])
}

/// Element segment offset referencing a defined (non-imported) global.
fn element_offset_defined_global() -> Vec<u8> {
    let mut globals = leb(1);
    globals.extend_from_slice(&[0x7f, 0x00, 0x41, 0x00, 0x0b]);
    let mut elems = leb(1);
    elems.extend(leb(0));
    elems.extend_from_slice(&[0x23, 0x00, 0x0b]); // global.get 0
    elems.extend(leb(0));
    module(&[table_section(1), section(6, globals), section(9, elems)])
}

#[rstest]
#[case::nonconst_global_init(nonconst_global_init(), "not valid in a constant expression")]
#[case::f32_data_offset(
    f32_data_offset(),
    "type mismatch in constant expression: expected i32, got f32"
)]
#[case::element_offset_defined_global(element_offset_defined_global(), "imported globals")]
fn constant_expression_containment(#[case] bytes: Vec<u8>, #[case] needle: &str) {
    assert_invalid_with(&bytes, needle);
}

#[test]
fn start_function_must_be_nullary_void() {
    // start references a [] -> [i32] function.
    let bytes = module(&[
        type_section(&[(&[], &[0x7f])]),
        func_section(&[0]),
        section(8, leb(0)),
        code_section(&[&body(&[0x41, 0x00, 0x0b])]),
    ]);
    assert_invalid_with(&bytes, "start function must have type [] -> []");
}

#[test]
fn start_function_index_out_of_range() {
    let bytes = module(&[
        type_section(&[(&[], &[])]),
        func_section(&[0]),
        section(8, leb(7)),
        code_section(&[&body(&[0x0b])]),
    ]);
    assert_invalid_with(&bytes, "function index 7 out of range");
}

#[test]
fn duplicate_export_names_are_invalid() {
    let bytes = module(&[
        type_section(&[(&[], &[])]),
        func_section(&[0, 0]),
        export_section(&[("f", 0x00, 0), ("f", 0x00, 1)]),
        code_section(&[&body(&[0x0b]), &body(&[0x0b])]),
    ]);
    assert_invalid_with(&bytes, "duplicate export name: f");
}

#[test]
fn export_target_must_resolve() {
    let bytes = module(&[
        type_section(&[(&[], &[])]),
        func_section(&[0]),
        export_section(&[("f", 0x00, 9)]),
        code_section(&[&body(&[0x0b])]),
    ]);
    assert_invalid_with(&bytes, "func index 9 out of range");
}

#[test]
fn validator_collects_multiple_findings() {
    // Two independent problems: a bad export index and a bad start index.
    let bytes = module(&[
        type_section(&[(&[], &[])]),
        func_section(&[0]),
        export_section(&[("f", 0x00, 9)]),
        section(8, leb(9)),
        code_section(&[&body(&[0x0b])]),
    ]);
    let (ok, messages) = validate_bytes(&bytes);
    assert!(!ok);
    assert!(messages.len() >= 2, "{messages:?}");
}

#[test]
fn memory_init_requires_data_count() {
    // memory.init without a DataCount section.
    let bytes = module(&[
        type_section(&[(&[], &[])]),
        func_section(&[0]),
        memory_section(1, None),
        code_section(&[&body(&[
            0x41, 0x00, 0x41, 0x00, 0x41, 0x00, // three i32 operands
            0xFC, 0x08, 0x00, 0x00, // memory.init segment 0 memory 0
            0x0b,
        ])]),
    ]);
    assert_invalid_with(&bytes, "memory.init requires a DataCount section");
}

#[test]
fn branch_depth_out_of_range() {
    let bytes = module(&[
        type_section(&[(&[], &[])]),
        func_section(&[0]),
        code_section(&[&body(&[0x0c, 0x03, 0x0b])]),
    ]);
    assert_invalid_with(&bytes, "label index 3 out of range");
}

#[test]
fn multiple_memories_are_rejected() {
    let mut payload = leb(2);
    payload.extend_from_slice(&[0x00, 0x01]);
    payload.extend_from_slice(&[0x00, 0x01]);
    let bytes = module(&[section(5, payload)]);
    assert_invalid_with(&bytes, "multiple memories");
}

#[test]
fn memory_limit_min_above_max_is_invalid() {
    let bytes = module(&[memory_section(4, Some(2))]);
    assert_invalid_with(&bytes, "must not be greater than maximum");
}

#[test]
fn mutable_global_import_gated_on_feature() {
    let mut import_payload = leb(1);
    import_payload.extend(leb(3));
    import_payload.extend_from_slice(b"env");
    import_payload.extend(leb(1));
    import_payload.push(b'g');
    import_payload.push(0x03); // global
    import_payload.push(0x7f);
    import_payload.push(0x01); // mutable
    let bytes = module(&[section(2, import_payload)]);

    // MVP (without mutable-globals) rejects the import.
    let mvp = Features::mvp();
    let parsed = parse(&bytes, &mvp).unwrap();
    let mut errors = ErrorList::new();
    assert!(!validate(&parsed, &mvp, &mut errors));
    assert!(errors
        .iter()
        .any(|e| e.message.contains("mutable-globals")));

    // The full feature set accepts it.
    let all = Features::all();
    let parsed = parse(&bytes, &all).unwrap();
    let mut errors = ErrorList::new();
    assert!(validate(&parsed, &all, &mut errors));
}

#[test]
fn active_element_segment_needs_a_table() {
    let mut elem_payload = leb(1);
    elem_payload.extend(leb(0));
    elem_payload.extend_from_slice(&[0x41, 0x00, 0x0b]);
    elem_payload.extend(leb(0));
    let bytes = module(&[section(9, elem_payload)]);
    assert_invalid_with(&bytes, "table index 0 out of range");
}

#[test]
fn ref_func_requires_declaration() {
    // ref.func 0 in a body, with no element segment or export declaring it.
    let undeclared = module(&[
        type_section(&[(&[], &[])]),
        func_section(&[0]),
        code_section(&[&body(&[0xd2, 0x00, 0x1a, 0x0b])]),
    ]);
    assert_invalid_with(&undeclared, "undeclared function reference 0");

    // With a declarative element segment naming function 0, it validates.
    let mut elem_payload = leb(1);
    elem_payload.extend(leb(3)); // flags 3: declarative, elemkind, func indices
    elem_payload.push(0x00);
    elem_payload.extend(leb(1));
    elem_payload.extend(leb(0));
    let declared = module(&[
        type_section(&[(&[], &[])]),
        func_section(&[0]),
        section(9, elem_payload),
        code_section(&[&body(&[0xd2, 0x00, 0x1a, 0x0b])]),
    ]);
    let (ok, messages) = validate_bytes(&declared);
    assert!(ok, "{messages:?}");
}

#[test]
fn validated_modules_resolve_all_indices() {
    // The soundness property on a busier module: table ops, calls, globals.
    let mut global_payload = leb(1);
    global_payload.extend_from_slice(&[0x7f, 0x01, 0x41, 0x00, 0x0b]);
    let bytes = module(&[
        type_section(&[(&[], &[]), (&[0x7f], &[0x7f])]),
        func_section(&[0, 1]),
        table_section(2),
        memory_section(1, None),
        section(6, global_payload),
        export_section(&[("main", 0x00, 0)]),
        code_section(&[
            // call 1 with an i32 argument, store the result in global 0
            &body(&[0x41, 0x07, 0x10, 0x01, 0x24, 0x00, 0x0b]),
            // identity-ish: local.get 0
            &body(&[0x20, 0x00, 0x0b]),
        ]),
    ]);
    let (ok, messages) = validate_bytes(&bytes);
    assert!(ok, "{messages:?}");
}
