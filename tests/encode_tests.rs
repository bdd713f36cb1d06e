mod common;

use common::*;
use wasmkit::encoder::encode;
use wasmkit::features::Features;
use wasmkit::parser::parse;

/// A module exercising most section kinds and a spread of instruction
/// shapes (block types, memargs, br_table, prefixed opcodes, SIMD).
fn busy_module() -> Vec<u8> {
    let import_payload = {
        let mut p = leb(1);
        p.extend(leb(3));
        p.extend_from_slice(b"env");
        p.extend(leb(3));
        p.extend_from_slice(b"log");
        p.push(0x00);
        p.extend(leb(0));
        p
    };
    let global_payload = {
        let mut p = leb(1);
        p.extend_from_slice(&[0x7f, 0x01, 0x41, 0x2a, 0x0b]);
        p
    };
    let elem_payload = {
        let mut p = leb(1);
        p.extend(leb(0));
        p.extend_from_slice(&[0x41, 0x00, 0x0b]);
        p.extend(leb(1));
        p.extend(leb(1));
        p
    };
    let data_payload = {
        let mut p = leb(2);
        // active segment
        p.extend(leb(0));
        p.extend_from_slice(&[0x41, 0x08, 0x0b]);
        p.extend(leb(2));
        p.extend_from_slice(&[0xde, 0xad]);
        // passive segment
        p.extend(leb(1));
        p.extend(leb(1));
        p.push(0x99);
        p
    };
    let custom_payload = {
        let mut p = leb(4);
        p.extend_from_slice(b"meta");
        p.extend_from_slice(&[1, 2, 3]);
        p
    };

    let body_main = body(&[
        0x02, 0x7f, // block (result i32)
        0x41, 0x01, // i32.const 1
        0x0b, // end
        0x1a, // drop
        0x41, 0x00, // i32.const 0
        0x28, 0x02, 0x10, // i32.load align=2 offset=16
        0x1a, // drop
        0x41, 0x00, // i32.const 0
        0xfd, 0x11, // i32x4.splat
        0xfd, 0x1b, 0x00, // i32x4.extract_lane 0
        0x1a, // drop
        0x0b, // end
    ]);
    let body_aux = body(&[0x20, 0x00, 0x0b]);

    module(&[
        type_section(&[(&[], &[]), (&[0x7f], &[0x7f])]),
        section(2, import_payload),
        func_section(&[0, 1]),
        table_section(4),
        memory_section(1, Some(4)),
        section(6, global_payload),
        export_section(&[("main", 0x00, 1), ("mem", 0x02, 0)]),
        section(8, leb(1)),
        section(9, elem_payload),
        section(12, leb(2)), // DataCount
        code_section(&[&body_main, &body_aux]),
        section(11, data_payload),
        section(0, custom_payload),
    ])
}

#[test]
fn trivial_identity_golden_bytes() {
    let golden = trivial_module();
    assert_eq!(
        golden,
        vec![
            0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00, //
            0x01, 0x04, 0x01, 0x60, 0x00, 0x00, //
            0x03, 0x02, 0x01, 0x00, //
            0x0a, 0x04, 0x01, 0x02, 0x00, 0x0b,
        ]
    );
    let module = parse(&golden, &Features::all()).unwrap();
    assert_eq!(encode(&module).unwrap(), golden);
}

#[test]
fn round_trip_preserves_structure() {
    let bytes = busy_module();
    let features = Features::all();
    let first = parse(&bytes, &features).unwrap();
    let encoded = encode(&first).unwrap();
    let second = parse(&encoded, &features).unwrap();
    assert_eq!(first, second);
}

#[test]
fn canonical_encoding_is_idempotent() {
    let bytes = busy_module();
    let features = Features::all();
    let first = parse(&bytes, &features).unwrap();
    let once = encode(&first).unwrap();
    let twice = encode(&parse(&once, &features).unwrap()).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn fixtures_built_with_minimal_leb_reencode_byte_identically() {
    // The fixture builders emit minimal LEB128 and canonical section order,
    // so the canonical encoder must reproduce them exactly.
    let bytes = busy_module();
    let module = parse(&bytes, &Features::all()).unwrap();
    assert_eq!(encode(&module).unwrap(), bytes);
}

#[test]
fn padded_input_is_canonicalised() {
    // Same trivial module, but the type section size is a padded LEB.
    let mut padded = HEADER.to_vec();
    padded.push(0x01);
    padded.extend([0x84, 0x80, 0x80, 0x80, 0x00]); // size 4, non-minimal
    padded.extend([0x01, 0x60, 0x00, 0x00]);
    padded.extend(func_section(&[0]));
    padded.extend(code_section(&[&body(&[0x0b])]));

    let features = Features::all();
    let module = parse(&padded, &features).unwrap();
    let canonical = encode(&module).unwrap();
    assert_eq!(canonical, trivial_module());
    assert_ne!(canonical, padded);

    // Structural equality survives the normalisation (positions are not
    // part of equality).
    assert_eq!(parse(&canonical, &features).unwrap(), module);
}

#[test]
fn custom_sections_are_preserved() {
    let mut custom_payload = leb(4);
    custom_payload.extend_from_slice(b"name");
    custom_payload.extend_from_slice(&[0xca, 0xfe]);
    let bytes = module(&[type_section(&[(&[], &[])]), section(0, custom_payload)]);

    let features = Features::all();
    let decoded = parse(&bytes, &features).unwrap();
    assert_eq!(decoded.custom.len(), 1);
    assert_eq!(decoded.custom[0].name, "name");
    assert_eq!(decoded.custom[0].data, vec![0xca, 0xfe]);

    let reencoded = encode(&decoded).unwrap();
    let redecoded = parse(&reencoded, &features).unwrap();
    assert_eq!(decoded, redecoded);
}

#[test]
fn nan_payloads_survive_round_trips() {
    // f64.const with a noncanonical NaN payload.
    let bytes = module(&[
        type_section(&[(&[], &[0x7c])]),
        func_section(&[0]),
        code_section(&[&body(&[
            0x44, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0xf8, 0x7f, 0x0b,
        ])]),
    ]);
    let features = Features::all();
    let first = parse(&bytes, &features).unwrap();
    let second = parse(&encode(&first).unwrap(), &features).unwrap();
    assert_eq!(first, second);
}
