//! Byte-level fixture builders shared by the integration suites.
//!
//! Everything here emits minimal LEB128, so fixtures built this way are also
//! what the canonical encoder is expected to reproduce.

#![allow(dead_code)]

pub const HEADER: &[u8] = &[0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00];

pub fn leb(v: u32) -> Vec<u8> {
    let mut out = Vec::new();
    let mut value = v;
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            break;
        }
        byte |= 0x80;
        out.push(byte);
    }
    out
}

/// `(id, size, payload)` framing for one section.
pub fn section(id: u8, payload: Vec<u8>) -> Vec<u8> {
    let mut out = vec![id];
    out.extend(leb(payload.len() as u32));
    out.extend(payload);
    out
}

/// A whole module from pre-framed sections.
pub fn module(sections: &[Vec<u8>]) -> Vec<u8> {
    let mut out = HEADER.to_vec();
    for s in sections {
        out.extend_from_slice(s);
    }
    out
}

/// Type section from (params, results) pairs of value type bytes.
pub fn type_section(types: &[(&[u8], &[u8])]) -> Vec<u8> {
    let mut payload = leb(types.len() as u32);
    for (params, results) in types {
        payload.push(0x60);
        payload.extend(leb(params.len() as u32));
        payload.extend_from_slice(params);
        payload.extend(leb(results.len() as u32));
        payload.extend_from_slice(results);
    }
    section(1, payload)
}

/// Function section from type indices.
pub fn func_section(type_indices: &[u32]) -> Vec<u8> {
    let mut payload = leb(type_indices.len() as u32);
    for idx in type_indices {
        payload.extend(leb(*idx));
    }
    section(3, payload)
}

/// Code section from raw bodies (`locals-vec ++ instructions ++ end`).
pub fn code_section(bodies: &[&[u8]]) -> Vec<u8> {
    let mut payload = leb(bodies.len() as u32);
    for body in bodies {
        payload.extend(leb(body.len() as u32));
        payload.extend_from_slice(body);
    }
    section(10, payload)
}

/// A body with no locals around the given instruction bytes (end included
/// by the caller).
pub fn body(instructions: &[u8]) -> Vec<u8> {
    let mut out = vec![0x00];
    out.extend_from_slice(instructions);
    out
}

/// Memory section with one memory of the given bounds.
pub fn memory_section(min: u32, max: Option<u32>) -> Vec<u8> {
    let mut payload = leb(1);
    match max {
        Some(max) => {
            payload.push(0x01);
            payload.extend(leb(min));
            payload.extend(leb(max));
        }
        None => {
            payload.push(0x00);
            payload.extend(leb(min));
        }
    }
    section(5, payload)
}

/// Table section with one funcref table.
pub fn table_section(min: u32) -> Vec<u8> {
    let mut payload = leb(1);
    payload.push(0x70);
    payload.push(0x00);
    payload.extend(leb(min));
    section(4, payload)
}

/// Export section from (name, kind, index) triples.
pub fn export_section(exports: &[(&str, u8, u32)]) -> Vec<u8> {
    let mut payload = leb(exports.len() as u32);
    for (name, kind, index) in exports {
        payload.extend(leb(name.len() as u32));
        payload.extend_from_slice(name.as_bytes());
        payload.push(*kind);
        payload.extend(leb(*index));
    }
    section(7, payload)
}

/// The spec's trivial identity module: one `[] -> []` type, one function,
/// body `end`.
pub fn trivial_module() -> Vec<u8> {
    module(&[
        type_section(&[(&[], &[])]),
        func_section(&[0]),
        code_section(&[&body(&[0x0b])]),
    ])
}
