//! Text (S-expression) writer.
//!
//! Produces the WebAssembly text format from the structural model. Spacing
//! is governed by a small mutable context holding a *pending separator*: a
//! token writer first flushes whatever separator is pending, writes its
//! token, then arms a single space. `(` flushes the separator but arms
//! nothing (no space after an opening paren), `)` discards the pending
//! separator before printing. Newline-and-indent is just another separator,
//! armed around block-opening instructions and their `else`/`catch`/`end`.
//!
//! Imports and exports are attached inline to the construct they belong to
//! (`(func (export "f") (import "m" "n") (type 0))`), and element segments
//! in the original MVP shape print in the legacy form without the `func`
//! keyword.

use fhex::ToHex;

use crate::module::{
    DataMode, ElementInit, ElementMode, ElementSegment, FunctionBody, ImportDesc, Module,
};
use crate::parser::instruction::{Immediate, Instruction, Opcode};
use crate::types::{BlockType, ExternalKind, FunctionType, Limits, RefType, ValueType};

/// Numeric base for integer literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Base {
    #[default]
    Decimal,
    Hex,
}

/// Spacing state threaded through every token writer.
#[derive(Debug)]
pub struct WriteContext {
    separator: String,
    indent: String,
    pub base: Base,
}

impl Default for WriteContext {
    fn default() -> Self {
        WriteContext {
            separator: String::new(),
            indent: "\n".to_string(),
            base: Base::Decimal,
        }
    }
}

impl WriteContext {
    pub fn clear_separator(&mut self) {
        self.separator.clear();
    }

    pub fn space(&mut self) {
        self.separator = " ".to_string();
    }

    pub fn newline(&mut self) {
        self.separator = self.indent.clone();
    }

    pub fn indent(&mut self) {
        self.indent.push_str("  ");
    }

    pub fn dedent(&mut self) {
        self.indent.truncate(self.indent.len() - 2);
    }
}

/// Render a module as text with decimal integer literals.
pub fn write_module(module: &Module) -> String {
    WatWriter::new(module).finish()
}

/// Render a module with a chosen numeric base.
pub fn write_module_with_base(module: &Module, base: Base) -> String {
    let mut writer = WatWriter::new(module);
    writer.ctx.base = base;
    writer.finish()
}

struct WatWriter<'m> {
    module: &'m Module,
    out: String,
    ctx: WriteContext,
}

impl<'m> WatWriter<'m> {
    fn new(module: &'m Module) -> WatWriter<'m> {
        WatWriter {
            module,
            out: String::new(),
            ctx: WriteContext::default(),
        }
    }

    // Token primitives --------------------------------------------------------

    fn raw(&mut self, s: &str) {
        self.out.push_str(s);
    }

    fn flush_separator(&mut self) {
        self.out.push_str(&self.ctx.separator);
        self.ctx.clear_separator();
    }

    fn token(&mut self, s: &str) {
        self.flush_separator();
        self.raw(s);
        self.ctx.space();
    }

    fn lpar(&mut self, keyword: &str) {
        self.flush_separator();
        self.raw("(");
        self.raw(keyword);
        self.ctx.space();
    }

    fn rpar(&mut self) {
        self.ctx.clear_separator();
        self.raw(")");
        self.ctx.space();
    }

    fn nat(&mut self, v: u64) {
        let s = match self.ctx.base {
            Base::Decimal => format!("{v}"),
            Base::Hex => format!("0x{v:x}"),
        };
        self.token(&s);
    }

    fn int(&mut self, v: i64) {
        let s = match self.ctx.base {
            Base::Decimal => format!("{v}"),
            Base::Hex if v < 0 => format!("-0x{:x}", v.unsigned_abs()),
            Base::Hex => format!("0x{v:x}"),
        };
        self.token(&s);
    }

    fn quoted(&mut self, bytes: &[u8]) {
        self.flush_separator();
        self.raw("\"");
        let mut escaped = String::new();
        for byte in bytes {
            match byte {
                b'"' => escaped.push_str("\\\""),
                b'\\' => escaped.push_str("\\\\"),
                b'\t' => escaped.push_str("\\t"),
                b'\n' => escaped.push_str("\\n"),
                b'\r' => escaped.push_str("\\r"),
                0x20..=0x7e => escaped.push(*byte as char),
                _ => escaped.push_str(&format!("\\{byte:02x}")),
            }
        }
        self.raw(&escaped);
        self.raw("\"");
        self.ctx.space();
    }

    // Module ------------------------------------------------------------------

    fn finish(mut self) -> String {
        self.lpar("module");
        self.ctx.indent();

        for ft in self.module.types.iter() {
            self.ctx.newline();
            self.lpar("type");
            self.lpar("func");
            self.write_function_type(ft);
            self.rpar();
            self.rpar();
        }

        let mut func_idx = 0u32;
        let mut table_idx = 0u32;
        let mut memory_idx = 0u32;
        let mut global_idx = 0u32;
        let mut event_idx = 0u32;
        let imports: Vec<_> = self.module.imports.iter().map(|i| i.value().clone()).collect();
        for import in &imports {
            self.ctx.newline();
            match &import.desc {
                ImportDesc::Func(type_idx) => {
                    self.lpar("func");
                    self.write_inline_exports(ExternalKind::Func, func_idx);
                    self.write_inline_import(&import.module, &import.name);
                    self.write_type_use(*type_idx);
                    self.rpar();
                    func_idx += 1;
                }
                ImportDesc::Table(tt) => {
                    self.lpar("table");
                    self.write_inline_exports(ExternalKind::Table, table_idx);
                    self.write_inline_import(&import.module, &import.name);
                    self.write_limits(&tt.limits);
                    self.token(ref_type_name(tt.element));
                    self.rpar();
                    table_idx += 1;
                }
                ImportDesc::Memory(mt) => {
                    self.lpar("memory");
                    self.write_inline_exports(ExternalKind::Memory, memory_idx);
                    self.write_inline_import(&import.module, &import.name);
                    self.write_limits(&mt.limits);
                    if mt.limits.shared {
                        self.token("shared");
                    }
                    self.rpar();
                    memory_idx += 1;
                }
                ImportDesc::Global(gt) => {
                    self.lpar("global");
                    self.write_inline_exports(ExternalKind::Global, global_idx);
                    self.write_inline_import(&import.module, &import.name);
                    self.write_global_type(gt.mutable, gt.value_type);
                    self.rpar();
                    global_idx += 1;
                }
                ImportDesc::Event(et) => {
                    self.lpar("event");
                    self.write_inline_exports(ExternalKind::Event, event_idx);
                    self.write_inline_import(&import.module, &import.name);
                    self.write_type_use(et.type_idx);
                    self.rpar();
                    event_idx += 1;
                }
            }
        }

        for i in 0..self.module.functions.len() {
            let type_idx = *self.module.functions[i].value();
            self.ctx.newline();
            self.lpar("func");
            self.write_inline_exports(ExternalKind::Func, func_idx + i as u32);
            self.write_type_use(type_idx);
            if let Some(ft) = self.module.types.get(type_idx as usize) {
                let ft = ft.value().clone();
                self.write_function_type(&ft);
            }
            let body = self.module.code.get(i).map(|b| b.value().clone());
            if let Some(body) = body {
                self.write_body(&body);
            }
            self.rpar();
        }

        for i in 0..self.module.tables.len() {
            let table = *self.module.tables[i].value();
            self.ctx.newline();
            self.lpar("table");
            self.write_inline_exports(ExternalKind::Table, table_idx + i as u32);
            self.write_limits(&table.limits);
            self.token(ref_type_name(table.element));
            self.rpar();
        }

        for i in 0..self.module.memories.len() {
            let memory = *self.module.memories[i].value();
            self.ctx.newline();
            self.lpar("memory");
            self.write_inline_exports(ExternalKind::Memory, memory_idx + i as u32);
            self.write_limits(&memory.limits);
            if memory.limits.shared {
                self.token("shared");
            }
            self.rpar();
        }

        for i in 0..self.module.events.len() {
            let event = *self.module.events[i].value();
            self.ctx.newline();
            self.lpar("event");
            self.write_inline_exports(ExternalKind::Event, event_idx + i as u32);
            self.write_type_use(event.type_idx);
            self.rpar();
        }

        for i in 0..self.module.globals.len() {
            let global = self.module.globals[i].value().clone();
            self.ctx.newline();
            self.lpar("global");
            self.write_inline_exports(ExternalKind::Global, global_idx + i as u32);
            self.write_global_type(global.global_type.mutable, global.global_type.value_type);
            self.write_const_expression(&global.init, None);
            self.rpar();
        }

        // Exports whose target is an imported entity were already written
        // inline on the import; everything else is inline on its definition,
        // so no standalone export forms remain.

        if let Some(start) = &self.module.start {
            let start = **start;
            self.ctx.newline();
            self.lpar("start");
            self.nat(start as u64);
            self.rpar();
        }

        for i in 0..self.module.elements.len() {
            let elem = self.module.elements[i].value().clone();
            self.ctx.newline();
            self.write_element_segment(&elem);
        }

        for i in 0..self.module.data.len() {
            let segment = self.module.data[i].value().clone();
            self.ctx.newline();
            self.lpar("data");
            match &segment.mode {
                DataMode::Active {
                    memory_index,
                    offset,
                } => {
                    if *memory_index != 0 {
                        self.lpar("memory");
                        self.nat(*memory_index as u64);
                        self.rpar();
                    }
                    self.write_const_expression(offset, Some("offset"));
                }
                DataMode::Passive => {}
            }
            self.quoted(&segment.init);
            self.rpar();
        }

        self.ctx.dedent();
        self.rpar();
        self.out.push('\n');
        self.out
    }

    // Shared pieces -----------------------------------------------------------

    fn write_inline_import(&mut self, module: &str, name: &str) {
        self.lpar("import");
        self.quoted(module.as_bytes());
        self.quoted(name.as_bytes());
        self.rpar();
    }

    fn write_inline_exports(&mut self, kind: ExternalKind, index: u32) {
        let names: Vec<String> = self
            .module
            .exports
            .iter()
            .filter(|e| e.kind == kind && e.index == index)
            .map(|e| e.name.clone())
            .collect();
        for name in names {
            self.lpar("export");
            self.quoted(name.as_bytes());
            self.rpar();
        }
    }

    fn write_type_use(&mut self, type_idx: u32) {
        self.lpar("type");
        self.nat(type_idx as u64);
        self.rpar();
    }

    fn write_function_type(&mut self, ft: &FunctionType) {
        if !ft.params.is_empty() {
            self.lpar("param");
            for p in &ft.params {
                self.token(value_type_name(*p));
            }
            self.rpar();
        }
        if !ft.results.is_empty() {
            self.lpar("result");
            for r in &ft.results {
                self.token(value_type_name(*r));
            }
            self.rpar();
        }
    }

    fn write_global_type(&mut self, mutable: bool, vt: ValueType) {
        if mutable {
            self.lpar("mut");
            self.token(value_type_name(vt));
            self.rpar();
        } else {
            self.token(value_type_name(vt));
        }
    }

    fn write_limits(&mut self, limits: &Limits) {
        self.nat(limits.min as u64);
        if let Some(max) = limits.max {
            self.nat(max as u64);
        }
    }

    /// A constant expression: folded `(i32.const 0)` when it is a single
    /// instruction, otherwise wrapped in the context's full form (`offset`
    /// for segment offsets, `item` for element items) or written bare when
    /// the context has no keyword (global initialisers).
    fn write_const_expression(&mut self, expr: &[Instruction], full_form: Option<&str>) {
        let body: Vec<&Instruction> = expr
            .iter()
            .filter(|i| i.opcode != Opcode::End)
            .collect();
        if body.len() == 1 {
            self.flush_separator();
            self.raw("(");
            let inst = body[0].clone();
            self.write_instruction(&inst);
            self.rpar();
            return;
        }
        if let Some(keyword) = full_form {
            self.lpar(keyword);
        }
        for inst in body {
            let inst = inst.clone();
            self.write_instruction(&inst);
        }
        if full_form.is_some() {
            self.rpar();
        }
    }

    fn write_element_segment(&mut self, elem: &ElementSegment) {
        self.lpar("elem");
        // The legacy MVP shape (funcref kind, implicit table, no bind var)
        // prints without the `func` keyword.
        let legacy = elem.flags == 0;
        match &elem.mode {
            ElementMode::Active {
                table_index,
                offset,
            } => {
                if *table_index != 0 {
                    self.lpar("table");
                    self.nat(*table_index as u64);
                    self.rpar();
                }
                self.write_const_expression(offset, Some("offset"));
            }
            ElementMode::Passive => {}
            ElementMode::Declarative => self.token("declare"),
        }
        match &elem.init {
            ElementInit::Functions(indices) => {
                if !legacy {
                    self.token("func");
                }
                let indices: Vec<u32> = indices.iter().map(|i| **i).collect();
                for idx in indices {
                    self.nat(idx as u64);
                }
            }
            ElementInit::Expressions(exprs) => {
                self.token(ref_type_name(elem.kind));
                let exprs = exprs.clone();
                for expr in &exprs {
                    self.write_const_expression(expr, Some("item"));
                }
            }
        }
        self.rpar();
    }

    // Code bodies -------------------------------------------------------------

    fn write_body(&mut self, body: &FunctionBody) {
        self.ctx.indent();
        if body.local_count() > 0 {
            self.lpar("local");
            for vt in body.flat_locals() {
                self.token(value_type_name(vt));
            }
            self.rpar();
        }

        let instructions = &body.instructions;
        let last = instructions.len().saturating_sub(1);
        let mut depth = 0usize;
        for (i, inst) in instructions.iter().enumerate() {
            match inst.opcode {
                Opcode::End if i == last && depth == 0 => {
                    // The function's closing paren stands in for its end.
                    break;
                }
                Opcode::Else | Opcode::Catch => {
                    self.ctx.dedent();
                    self.ctx.newline();
                    self.write_instruction(inst);
                    self.ctx.indent();
                }
                Opcode::End => {
                    depth = depth.saturating_sub(1);
                    self.ctx.dedent();
                    self.ctx.newline();
                    self.write_instruction(inst);
                }
                op if op.opens_block() => {
                    depth += 1;
                    self.ctx.newline();
                    self.write_instruction(inst);
                    self.ctx.indent();
                }
                _ => {
                    self.ctx.newline();
                    self.write_instruction(inst);
                }
            }
        }
        self.ctx.dedent();
    }

    fn write_block_type(&mut self, block_type: &BlockType) {
        match block_type {
            BlockType::Empty => {}
            BlockType::Value(vt) => {
                self.lpar("result");
                self.token(value_type_name(*vt));
                self.rpar();
            }
            BlockType::FuncType(idx) => self.write_type_use(*idx),
        }
    }

    fn write_memarg(&mut self, opcode: Opcode, memarg: &crate::parser::instruction::MemArg) {
        if memarg.offset != 0 {
            self.token("offset=");
            // offset=<N> with no intervening space
            self.ctx.clear_separator();
            self.nat(memarg.offset as u64);
        }
        let natural = opcode.natural_alignment().unwrap_or(0);
        if memarg.align != natural {
            self.token("align=");
            self.ctx.clear_separator();
            self.nat(1u64 << memarg.align);
        }
    }

    fn write_instruction(&mut self, inst: &Instruction) {
        self.token(inst.opcode.mnemonic());
        match &inst.immediate {
            Immediate::None => {
                // no immediate
            }
            Immediate::S32(v) => self.int(*v as i64),
            Immediate::S64(v) => self.int(*v),
            Immediate::F32(bits) => {
                let s = f32::from_bits(*bits).to_hex();
                self.token(&s);
            }
            Immediate::F64(bits) => {
                let s = f64::from_bits(*bits).to_hex();
                self.token(&s);
            }
            Immediate::V128(bytes) => {
                self.token("i32x4");
                for chunk in bytes.chunks_exact(4) {
                    let lane = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                    self.token(&format!("0x{lane:08x}"));
                }
            }
            Immediate::Index(idx) => match inst.opcode {
                // Single-memory operations print no index.
                Opcode::MemorySize | Opcode::MemoryGrow | Opcode::MemoryFill
                | Opcode::AtomicFence => {}
                _ => self.nat(*idx as u64),
            },
            Immediate::Block(bt) => self.write_block_type(bt),
            Immediate::BrOnExn { depth, event } => {
                self.nat(*depth as u64);
                self.nat(*event as u64);
            }
            Immediate::BrTable { targets, default } => {
                for target in targets {
                    self.nat(*target as u64);
                }
                self.nat(*default as u64);
            }
            Immediate::CallIndirect {
                type_idx,
                table_idx,
            } => {
                if *table_idx != 0 {
                    self.nat(*table_idx as u64);
                }
                self.write_type_use(*type_idx);
            }
            Immediate::Copy { dst, src } => match inst.opcode {
                Opcode::MemoryCopy => {}
                _ => {
                    self.nat(*dst as u64);
                    self.nat(*src as u64);
                }
            },
            Immediate::Init { segment, dst } => match inst.opcode {
                Opcode::MemoryInit => self.nat(*segment as u64),
                _ => {
                    self.nat(*segment as u64);
                    self.nat(*dst as u64);
                }
            },
            Immediate::MemArg(memarg) => self.write_memarg(inst.opcode, memarg),
            Immediate::MemArgLane { memarg, lane } => {
                self.write_memarg(inst.opcode, memarg);
                self.nat(*lane as u64);
            }
            Immediate::RefType(rt) => self.token(heap_type_name(*rt)),
            Immediate::Select(types) => {
                if !types.is_empty() {
                    self.lpar("result");
                    for vt in types {
                        self.token(value_type_name(*vt));
                    }
                    self.rpar();
                }
            }
            Immediate::Shuffle(lanes) => {
                for lane in lanes {
                    self.nat(*lane as u64);
                }
            }
            Immediate::SimdLane(lane) => self.nat(*lane as u64),
            Immediate::Let { block_type, locals } => {
                self.write_block_type(block_type);
                for (count, vt) in locals {
                    self.lpar("local");
                    for _ in 0..*count {
                        self.token(value_type_name(*vt));
                    }
                    self.rpar();
                }
            }
        }
    }
}

fn value_type_name(vt: ValueType) -> &'static str {
    match vt {
        ValueType::I32 => "i32",
        ValueType::I64 => "i64",
        ValueType::F32 => "f32",
        ValueType::F64 => "f64",
        ValueType::V128 => "v128",
        ValueType::FuncRef => "funcref",
        ValueType::ExternRef => "externref",
        ValueType::ExnRef => "exnref",
    }
}

fn ref_type_name(rt: RefType) -> &'static str {
    match rt {
        RefType::FuncRef => "funcref",
        RefType::ExternRef => "externref",
        RefType::ExnRef => "exnref",
    }
}

/// `ref.null` spells heap types in their short form.
fn heap_type_name(rt: RefType) -> &'static str {
    match rt {
        RefType::FuncRef => "func",
        RefType::ExternRef => "extern",
        RefType::ExnRef => "exn",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::Features;
    use crate::parser::parse;

    fn text_of(bytes: &[u8]) -> String {
        let module = parse(bytes, &Features::all()).unwrap();
        write_module(&module)
    }

    const HEADER: &[u8] = &[0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00];

    #[test]
    fn empty_module() {
        assert_eq!(text_of(HEADER), "(module)\n");
    }

    #[test]
    fn trivial_function() {
        let mut bytes = HEADER.to_vec();
        bytes.extend([0x01, 0x04, 0x01, 0x60, 0x00, 0x00]);
        bytes.extend([0x03, 0x02, 0x01, 0x00]);
        bytes.extend([0x0a, 0x04, 0x01, 0x02, 0x00, 0x0b]);
        assert_eq!(
            text_of(&bytes),
            "(module\n  (type (func))\n  (func (type 0)))\n"
        );
    }

    #[test]
    fn function_with_body_and_params() {
        // type (param i32 i32) (result i32); body: local.get 0; local.get 1; i32.add
        let mut bytes = HEADER.to_vec();
        bytes.extend([0x01, 0x07, 0x01, 0x60, 0x02, 0x7f, 0x7f, 0x01, 0x7f]);
        bytes.extend([0x03, 0x02, 0x01, 0x00]);
        bytes.extend([0x0a, 0x09, 0x01, 0x07, 0x00, 0x20, 0x00, 0x20, 0x01, 0x6a, 0x0b]);
        let text = text_of(&bytes);
        assert_eq!(
            text,
            "(module\n  (type (func (param i32 i32) (result i32)))\n  (func (type 0) (param i32 i32) (result i32)\n    local.get 0\n    local.get 1\n    i32.add))\n"
        );
    }

    #[test]
    fn block_indentation_and_end() {
        // void function: block; nop; end
        let mut bytes = HEADER.to_vec();
        bytes.extend([0x01, 0x04, 0x01, 0x60, 0x00, 0x00]);
        bytes.extend([0x03, 0x02, 0x01, 0x00]);
        bytes.extend([0x0a, 0x08, 0x01, 0x06, 0x00, 0x02, 0x40, 0x01, 0x0b, 0x0b]);
        let text = text_of(&bytes);
        assert!(
            text.contains("    block\n      nop\n    end"),
            "unexpected layout:\n{text}"
        );
    }

    #[test]
    fn memarg_offset_concatenated() {
        // i32.load offset=16 with natural alignment: (func ... i32.load offset=16 drop)
        let mut bytes = HEADER.to_vec();
        bytes.extend([0x01, 0x04, 0x01, 0x60, 0x00, 0x00]);
        bytes.extend([0x03, 0x02, 0x01, 0x00]);
        bytes.extend([0x05, 0x03, 0x01, 0x00, 0x01]); // memory 1
        bytes.extend([
            0x0a, 0x0a, 0x01, 0x08, 0x00, 0x41, 0x00, 0x28, 0x02, 0x10, 0x1a, 0x0b,
        ]);
        let text = text_of(&bytes);
        assert!(text.contains("i32.load offset=16\n"), "{text}");
        assert!(!text.contains("offset= 16"), "{text}");
    }

    #[test]
    fn memarg_nondefault_alignment() {
        // i32.load with align=1 (2**0 bytes = 1): prints align=1
        let mut bytes = HEADER.to_vec();
        bytes.extend([0x01, 0x04, 0x01, 0x60, 0x00, 0x00]);
        bytes.extend([0x03, 0x02, 0x01, 0x00]);
        bytes.extend([0x05, 0x03, 0x01, 0x00, 0x01]);
        bytes.extend([
            0x0a, 0x0a, 0x01, 0x08, 0x00, 0x41, 0x00, 0x28, 0x00, 0x00, 0x1a, 0x0b,
        ]);
        let text = text_of(&bytes);
        assert!(text.contains("i32.load align=1\n"), "{text}");
    }

    #[test]
    fn inline_import_and_export() {
        // import "env" "log" (func (type 0)), exported as "log2"
        let mut bytes = HEADER.to_vec();
        bytes.extend([0x01, 0x04, 0x01, 0x60, 0x00, 0x00]);
        bytes.extend([
            0x02, 0x0b, 0x01, 0x03, b'e', b'n', b'v', 0x03, b'l', b'o', b'g', 0x00, 0x00,
        ]);
        bytes.extend([0x07, 0x08, 0x01, 0x04, b'l', b'o', b'g', b'2', 0x00, 0x00]);
        let text = text_of(&bytes);
        assert!(
            text.contains("(func (export \"log2\") (import \"env\" \"log\") (type 0))"),
            "{text}"
        );
    }

    #[test]
    fn element_segment_legacy_form() {
        // Flag-0 element segment prints without the func keyword; a passive
        // one keeps it.
        let mut bytes = HEADER.to_vec();
        bytes.extend([0x01, 0x04, 0x01, 0x60, 0x00, 0x00]);
        bytes.extend([0x03, 0x02, 0x01, 0x00]);
        bytes.extend([0x04, 0x04, 0x01, 0x70, 0x00, 0x01]); // table 1 funcref
        bytes.extend([0x09, 0x07, 0x01, 0x00, 0x41, 0x00, 0x0b, 0x01, 0x00]); // elem flags 0
        bytes.extend([0x0a, 0x04, 0x01, 0x02, 0x00, 0x0b]);
        let text = text_of(&bytes);
        assert!(text.contains("(elem (i32.const 0) 0)"), "{text}");

        let mut bytes = HEADER.to_vec();
        bytes.extend([0x01, 0x04, 0x01, 0x60, 0x00, 0x00]);
        bytes.extend([0x03, 0x02, 0x01, 0x00]);
        bytes.extend([0x09, 0x05, 0x01, 0x01, 0x00, 0x01, 0x00]); // elem flags 1 (passive)
        bytes.extend([0x0a, 0x04, 0x01, 0x02, 0x00, 0x0b]);
        let text = text_of(&bytes);
        assert!(text.contains("(elem func 0)"), "{text}");
    }

    #[test]
    fn globals_and_data() {
        let mut bytes = HEADER.to_vec();
        // global (mut i32) (i32.const 7)
        bytes.extend([0x06, 0x06, 0x01, 0x7f, 0x01, 0x41, 0x07, 0x0b]);
        // memory + data "hi\n"
        bytes.extend([0x05, 0x03, 0x01, 0x00, 0x01]);
        bytes.extend([
            0x0b, 0x09, 0x01, 0x00, 0x41, 0x08, 0x0b, 0x03, b'h', b'i', 0x0a,
        ]);
        let text = text_of(&bytes);
        assert!(text.contains("(global (mut i32) (i32.const 7))"), "{text}");
        assert!(text.contains("(data (i32.const 8) \"hi\\n\")"), "{text}");
    }

    #[test]
    fn hex_base_applies_to_integers() {
        let mut bytes = HEADER.to_vec();
        bytes.extend([0x01, 0x05, 0x01, 0x60, 0x00, 0x01, 0x7f]);
        bytes.extend([0x03, 0x02, 0x01, 0x00]);
        bytes.extend([0x0a, 0x07, 0x01, 0x05, 0x00, 0x41, 0xff, 0x01, 0x0b]); // i32.const 255
        let module = parse(&bytes, &Features::all()).unwrap();
        let text = write_module_with_base(&module, Base::Hex);
        assert!(text.contains("i32.const 0xff"), "{text}");
    }
}
