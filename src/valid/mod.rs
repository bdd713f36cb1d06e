//! Module validation.
//!
//! Entity-level range and shape checks across all sections, the
//! constant-expression rules, and the stack-typing algorithm for code
//! bodies. Diagnostics are reported to a caller-provided [`ErrorSink`];
//! validation never aborts on a finding, it keeps collecting across
//! entities and returns `false` if anything was reported. The caller
//! chooses whether to stop.

mod const_expr;
mod func;

pub use const_expr::validate_const_expression;
pub use func::{FuncValidator, MaybeValue};

use std::collections::HashSet;

use crate::error::{ErrorSink, WasmError};
use crate::features::{Feature, Features};
use crate::limits;
use crate::module::{
    DataMode, ElementInit, ElementMode, ImportDesc, Module,
};
use crate::parser::instruction::{Immediate, Instruction, Opcode};
use crate::types::{ExternalKind, GlobalType, Limits, MemoryType, TableType, ValueType};

/// Module-wide facts derived once per validation pass.
///
/// Lives exactly as long as one [`validate`] call.
#[derive(Debug, Default)]
pub struct ValidationContext {
    /// Functions that may be referenced by `ref.func` in code: everything
    /// named by an element segment, an export, or a global initialiser.
    pub declared_funcs: HashSet<u32>,
}

impl ValidationContext {
    fn build(module: &Module) -> ValidationContext {
        let mut declared_funcs = HashSet::new();
        for export in &module.exports {
            if export.kind == ExternalKind::Func {
                declared_funcs.insert(export.index);
            }
        }
        for elem in &module.elements {
            collect_func_refs(&elem.init, &mut declared_funcs);
        }
        for global in &module.globals {
            collect_expr_func_refs(&global.init, &mut declared_funcs);
        }
        ValidationContext { declared_funcs }
    }
}

fn collect_func_refs(init: &ElementInit, out: &mut HashSet<u32>) {
    match init {
        ElementInit::Functions(indices) => {
            for idx in indices {
                out.insert(**idx);
            }
        }
        ElementInit::Expressions(exprs) => {
            for expr in exprs {
                collect_expr_func_refs(expr, out);
            }
        }
    }
}

fn collect_expr_func_refs(expr: &[Instruction], out: &mut HashSet<u32>) {
    for inst in expr {
        if inst.opcode == Opcode::RefFunc {
            if let Immediate::Index(idx) = inst.immediate {
                out.insert(idx);
            }
        }
    }
}

/// Validate a module against the enabled feature set.
///
/// Returns `true` when no diagnostics were reported.
pub fn validate(module: &Module, features: &Features, errors: &mut dyn ErrorSink) -> bool {
    let mut ok = true;
    let ctx = ValidationContext::build(module);

    // Imports -----------------------------------------------------------------
    for (i, import) in module.imports.iter().enumerate() {
        errors.push_context(format!("import {i} ({}::{})", import.module, import.name));
        let result = match &import.desc {
            ImportDesc::Func(type_idx) => check_type_idx(module, *type_idx, import.offset()),
            ImportDesc::Table(tt) => check_table_type(tt, import.offset()),
            ImportDesc::Memory(mt) => check_memory_type(mt, import.offset()),
            ImportDesc::Global(gt) => check_global_import(gt, features, import.offset()),
            ImportDesc::Event(et) => check_event_type(module, et.type_idx, import.offset()),
        };
        if let Err(e) = result {
            ok = false;
            errors.on_error(e);
        }
        errors.pop_context();
    }

    // Functions ---------------------------------------------------------------
    for (i, type_idx) in module.functions.iter().enumerate() {
        if let Err(e) = check_type_idx(module, **type_idx, type_idx.offset()) {
            ok = false;
            errors.push_context(format!("function {}", module.num_imported_funcs() as usize + i));
            errors.on_error(e);
            errors.pop_context();
        }
    }

    // Tables ------------------------------------------------------------------
    if module.num_tables() > 1 && !features.contains(Feature::ReferenceTypes) {
        ok = false;
        errors.on_error(WasmError::invalid(
            "multiple tables require the reference-types feature",
        ));
    }
    for (i, table) in module.tables.iter().enumerate() {
        if let Err(e) = check_table_type(table, table.offset()) {
            ok = false;
            errors.push_context(format!("table {i}"));
            errors.on_error(e);
            errors.pop_context();
        }
    }

    // Memories ----------------------------------------------------------------
    if module.num_memories() > 1 {
        ok = false;
        errors.on_error(WasmError::invalid("multiple memories are not allowed"));
    }
    for (i, memory) in module.memories.iter().enumerate() {
        if let Err(e) = check_memory_type(memory, memory.offset()) {
            ok = false;
            errors.push_context(format!("memory {i}"));
            errors.on_error(e);
            errors.pop_context();
        }
    }

    // Events ------------------------------------------------------------------
    for (i, event) in module.events.iter().enumerate() {
        if let Err(e) = check_event_type(module, event.type_idx, event.offset()) {
            ok = false;
            errors.push_context(format!("event {i}"));
            errors.on_error(e);
            errors.pop_context();
        }
    }

    // Globals -----------------------------------------------------------------
    for (i, global) in module.globals.iter().enumerate() {
        errors.push_context(format!("global {}", module.num_imported_globals() as usize + i));
        if let Err(e) =
            validate_const_expression(module, &global.init, global.global_type.value_type)
        {
            ok = false;
            errors.on_error(e);
        }
        errors.pop_context();
    }

    // Exports -----------------------------------------------------------------
    let mut export_names: HashSet<&str> = HashSet::new();
    for export in &module.exports {
        errors.push_context(format!("export \"{}\"", export.name));
        if !export_names.insert(export.name.as_str()) {
            ok = false;
            errors.on_error(WasmError::invalid_at(
                export.offset(),
                format!("duplicate export name: {}", export.name),
            ));
        }
        if let Err(e) = check_export_target(module, features, export.kind, export.index, export.offset()) {
            ok = false;
            errors.on_error(e);
        }
        errors.pop_context();
    }

    // Start function ----------------------------------------------------------
    if let Some(start) = &module.start {
        match module.func_type(**start) {
            None => {
                ok = false;
                errors.on_error(WasmError::invalid_at(
                    start.offset(),
                    format!("function index {} out of range", **start),
                ));
            }
            Some(ft) => {
                if !ft.params.is_empty() || !ft.results.is_empty() {
                    ok = false;
                    errors.on_error(WasmError::invalid_at(
                        start.offset(),
                        "start function must have type [] -> []",
                    ));
                }
            }
        }
    }

    // Element segments --------------------------------------------------------
    for (i, elem) in module.elements.iter().enumerate() {
        errors.push_context(format!("element segment {i}"));
        if let Err(e) = check_element_segment(module, elem, elem.offset()) {
            ok = false;
            errors.on_error(e);
        }
        errors.pop_context();
    }

    // DataCount ---------------------------------------------------------------
    if let Some(count) = &module.data_count {
        if **count as usize != module.data.len() {
            ok = false;
            errors.on_error(WasmError::invalid_at(
                count.offset(),
                format!(
                    "data count and data section have inconsistent lengths ({} declared, {} segments)",
                    **count,
                    module.data.len()
                ),
            ));
        }
    }

    // Code --------------------------------------------------------------------
    if module.functions.len() != module.code.len() {
        ok = false;
        errors.on_error(WasmError::invalid(format!(
            "function and code section have inconsistent lengths ({} functions, {} bodies)",
            module.functions.len(),
            module.code.len()
        )));
    }
    for (i, body) in module.code.iter().enumerate() {
        let func_idx = module.num_imported_funcs() + i as u32;
        errors.push_context(format!("function {func_idx}"));
        let type_idx = module.functions.get(i).map(|t| **t);
        let func_type = type_idx.and_then(|t| module.types.get(t as usize));
        match func_type {
            None => {
                // Reported above as a count or type-index mismatch.
            }
            Some(ft) => {
                let params = ft.params.len() as u64;
                if params + body.local_count() as u64 > limits::MAX_FUNCTION_LOCALS as u64 {
                    ok = false;
                    errors.on_error(WasmError::invalid_at(
                        body.position.start as usize,
                        format!("too many locals: {}", params + body.local_count() as u64),
                    ));
                } else {
                    let mut v = FuncValidator::new(module, &ctx, ft, body.flat_locals());
                    if let Err(e) = v.validate_body(&body.instructions) {
                        ok = false;
                        errors.on_error(e);
                    }
                }
            }
        }
        errors.pop_context();
    }

    // Data segments -----------------------------------------------------------
    for (i, segment) in module.data.iter().enumerate() {
        errors.push_context(format!("data segment {i}"));
        if let DataMode::Active {
            memory_index,
            offset,
        } = &segment.mode
        {
            if module.memory_type(*memory_index).is_none() {
                ok = false;
                errors.on_error(WasmError::invalid_at(
                    segment.offset(),
                    format!("memory index {memory_index} out of range"),
                ));
            } else if let Err(e) = validate_const_expression(module, offset, ValueType::I32) {
                ok = false;
                errors.on_error(e);
            }
        }
        errors.pop_context();
    }

    ok
}

// ---------------------------------------------------------------------------
// Entity checks
// ---------------------------------------------------------------------------

fn check_type_idx(module: &Module, type_idx: u32, offset: usize) -> Result<(), WasmError> {
    if type_idx as usize >= module.types.len() {
        return Err(WasmError::invalid_at(
            offset,
            format!("type index {type_idx} out of range"),
        ));
    }
    Ok(())
}

fn check_limits(limits: &Limits, bound: u32, what: &str, offset: usize) -> Result<(), WasmError> {
    if let Some(max) = limits.max {
        if limits.min > max {
            return Err(WasmError::invalid_at(
                offset,
                format!(
                    "{what} size minimum {} must not be greater than maximum {max}",
                    limits.min
                ),
            ));
        }
        if max > bound {
            return Err(WasmError::invalid_at(
                offset,
                format!("{what} size maximum {max} exceeds limit {bound}"),
            ));
        }
    }
    if limits.min > bound {
        return Err(WasmError::invalid_at(
            offset,
            format!("{what} size minimum {} exceeds limit {bound}", limits.min),
        ));
    }
    Ok(())
}

fn check_table_type(tt: &TableType, offset: usize) -> Result<(), WasmError> {
    check_limits(&tt.limits, limits::MAX_TABLE_SIZE, "table", offset)
}

fn check_memory_type(mt: &MemoryType, offset: usize) -> Result<(), WasmError> {
    check_limits(&mt.limits, limits::MAX_MEMORY_PAGES_32, "memory", offset)
}

fn check_global_import(
    gt: &GlobalType,
    features: &Features,
    offset: usize,
) -> Result<(), WasmError> {
    if gt.mutable && !features.contains(Feature::MutableGlobals) {
        return Err(WasmError::invalid_at(
            offset,
            "mutable global imports require the mutable-globals feature",
        ));
    }
    Ok(())
}

fn check_event_type(module: &Module, type_idx: u32, offset: usize) -> Result<(), WasmError> {
    check_type_idx(module, type_idx, offset)?;
    let ft = module.types[type_idx as usize].value();
    if !ft.results.is_empty() {
        return Err(WasmError::invalid_at(
            offset,
            "event type must not have results",
        ));
    }
    Ok(())
}

fn check_export_target(
    module: &Module,
    features: &Features,
    kind: ExternalKind,
    index: u32,
    offset: usize,
) -> Result<(), WasmError> {
    let in_range = match kind {
        ExternalKind::Func => index < module.num_funcs(),
        ExternalKind::Table => index < module.num_tables(),
        ExternalKind::Memory => index < module.num_memories(),
        ExternalKind::Global => index < module.num_globals(),
        ExternalKind::Event => index < module.num_events(),
    };
    if !in_range {
        return Err(WasmError::invalid_at(
            offset,
            format!("{kind} index {index} out of range"),
        ));
    }
    if kind == ExternalKind::Global && !features.contains(Feature::MutableGlobals) {
        let gt = module.global_type(index).expect("range checked above");
        if gt.mutable {
            return Err(WasmError::invalid_at(
                offset,
                "mutable global exports require the mutable-globals feature",
            ));
        }
    }
    Ok(())
}

fn check_element_segment(
    module: &Module,
    elem: &crate::module::ElementSegment,
    offset: usize,
) -> Result<(), WasmError> {
    if let ElementMode::Active {
        table_index,
        offset: init_offset,
    } = &elem.mode
    {
        let table = module.table_type(*table_index).ok_or_else(|| {
            WasmError::invalid_at(offset, format!("table index {table_index} out of range"))
        })?;
        if elem.kind != table.element {
            return Err(WasmError::invalid_at(
                offset,
                format!(
                    "type mismatch: element segment type {} does not match table element type {}",
                    elem.kind, table.element
                ),
            ));
        }
        validate_const_expression(module, init_offset, ValueType::I32)?;
    }
    match &elem.init {
        ElementInit::Functions(indices) => {
            for idx in indices {
                if **idx >= module.num_funcs() {
                    return Err(WasmError::invalid_at(
                        idx.offset(),
                        format!("function index {} out of range", **idx),
                    ));
                }
            }
        }
        ElementInit::Expressions(exprs) => {
            for expr in exprs {
                validate_const_expression(module, expr, elem.kind.into())?;
            }
        }
    }
    Ok(())
}
