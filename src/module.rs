//! Structural model of a decoded module.
//!
//! The model is plain data: the lazy readers in [`crate::parser`] produce it
//! incrementally, and it is immutable after construction. Positions travel
//! with entries as [`At`] annotations and as byte ranges on function bodies;
//! they never affect equality, so two modules decoded from differently
//! padded encodings of the same structure compare equal.

use std::fmt;

use crate::parser::instruction::Instruction;
use crate::types::{
    At, EventType, ExternalKind, FunctionType, GlobalType, MemoryType, TableType, ValueType,
};

/// Byte range of a section or function body in the original input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SectionPosition {
    pub start: u32,
    pub end: u32,
}

impl SectionPosition {
    pub fn new(start: u32, end: u32) -> SectionPosition {
        SectionPosition { start, end }
    }

    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for SectionPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "start=0x{:08x} end=0x{:08x} (size=0x{:08x})",
            self.start,
            self.end,
            self.len()
        )
    }
}

/// What an import provides.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportDesc {
    Func(u32),
    Table(TableType),
    Memory(MemoryType),
    Global(GlobalType),
    Event(EventType),
}

impl ImportDesc {
    pub fn kind(&self) -> ExternalKind {
        match self {
            ImportDesc::Func(_) => ExternalKind::Func,
            ImportDesc::Table(_) => ExternalKind::Table,
            ImportDesc::Memory(_) => ExternalKind::Memory,
            ImportDesc::Global(_) => ExternalKind::Global,
            ImportDesc::Event(_) => ExternalKind::Event,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub module: String,
    pub name: String,
    pub desc: ImportDesc,
}

impl fmt::Display for Import {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{} kind = {}", self.module, self.name, self.desc.kind())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub name: String,
    pub kind: ExternalKind,
    pub index: u32,
}

impl fmt::Display for Export {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}] -> \"{}\"", self.kind, self.index, self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Global {
    pub global_type: GlobalType,
    pub init: Vec<Instruction>,
}

/// Placement of an element segment.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementMode {
    Active {
        table_index: u32,
        offset: Vec<Instruction>,
    },
    Passive,
    Declarative,
}

/// Element segment payload: plain function indices (flags 0-3) or full
/// constant expressions (flags 4-7).
#[derive(Debug, Clone, PartialEq)]
pub enum ElementInit {
    Functions(Vec<At<u32>>),
    Expressions(Vec<Vec<Instruction>>),
}

impl ElementInit {
    pub fn len(&self) -> usize {
        match self {
            ElementInit::Functions(v) => v.len(),
            ElementInit::Expressions(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementSegment {
    /// The wire flags byte (0-7) the segment was decoded from (or should be
    /// encoded with).
    pub flags: u32,
    pub kind: crate::types::RefType,
    pub mode: ElementMode,
    pub init: ElementInit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataMode {
    Active {
        memory_index: u32,
        offset: Vec<Instruction>,
    },
    Passive,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataSegment {
    pub mode: DataMode,
    pub init: Vec<u8>,
}

/// A function body: compressed locals plus the instruction sequence
/// (terminated by its `end`).
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionBody {
    pub locals: Vec<(u32, ValueType)>,
    pub instructions: Vec<Instruction>,
    pub position: SectionPosition,
}

impl FunctionBody {
    /// Total number of declared locals (excluding parameters).
    pub fn local_count(&self) -> u32 {
        self.locals.iter().map(|(n, _)| *n).sum()
    }

    /// Expand the compressed (count, type) runs into one type per local.
    pub fn flat_locals(&self) -> Vec<ValueType> {
        let mut out = Vec::with_capacity(self.local_count() as usize);
        for (count, vt) in &self.locals {
            for _ in 0..*count {
                out.push(*vt);
            }
        }
        out
    }
}

/// A custom section, preserved byte-for-byte so unknown tool payloads
/// survive a round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomSection {
    pub name: String,
    pub data: Vec<u8>,
}

/// A fully decoded module.
///
/// Index spaces are imports-first: `func_type(0)` resolves to the first
/// imported function when function imports exist.
#[derive(Debug, Default, PartialEq)]
pub struct Module {
    pub types: Vec<At<FunctionType>>,
    pub imports: Vec<At<Import>>,
    /// Type indices of locally defined functions.
    pub functions: Vec<At<u32>>,
    pub tables: Vec<At<TableType>>,
    pub memories: Vec<At<MemoryType>>,
    pub events: Vec<At<EventType>>,
    pub globals: Vec<At<Global>>,
    pub exports: Vec<At<Export>>,
    pub start: Option<At<u32>>,
    pub elements: Vec<At<ElementSegment>>,
    pub data_count: Option<At<u32>>,
    pub code: Vec<At<FunctionBody>>,
    pub data: Vec<At<DataSegment>>,
    pub custom: Vec<At<CustomSection>>,
}

impl Module {
    pub fn new() -> Module {
        Module::default()
    }

    // Index spaces (imports occupy the low indices) ---------------------------

    pub fn imports_of_kind(&self, kind: ExternalKind) -> impl Iterator<Item = &At<Import>> {
        self.imports.iter().filter(move |i| i.desc.kind() == kind)
    }

    pub fn num_imported_funcs(&self) -> u32 {
        self.imports_of_kind(ExternalKind::Func).count() as u32
    }

    pub fn num_funcs(&self) -> u32 {
        self.num_imported_funcs() + self.functions.len() as u32
    }

    /// Type index of the function at `func_idx` in the joint index space.
    pub fn func_type_idx(&self, func_idx: u32) -> Option<u32> {
        let mut remaining = func_idx;
        for import in &self.imports {
            if let ImportDesc::Func(type_idx) = import.desc {
                if remaining == 0 {
                    return Some(type_idx);
                }
                remaining -= 1;
            }
        }
        self.functions.get(remaining as usize).map(|t| **t)
    }

    pub fn func_type(&self, func_idx: u32) -> Option<&FunctionType> {
        let type_idx = self.func_type_idx(func_idx)?;
        self.types.get(type_idx as usize).map(|ft| ft.value())
    }

    pub fn num_tables(&self) -> u32 {
        self.imports_of_kind(ExternalKind::Table).count() as u32 + self.tables.len() as u32
    }

    pub fn table_type(&self, table_idx: u32) -> Option<TableType> {
        let mut remaining = table_idx;
        for import in &self.imports {
            if let ImportDesc::Table(tt) = import.desc {
                if remaining == 0 {
                    return Some(tt);
                }
                remaining -= 1;
            }
        }
        self.tables.get(remaining as usize).map(|t| **t)
    }

    pub fn num_memories(&self) -> u32 {
        self.imports_of_kind(ExternalKind::Memory).count() as u32 + self.memories.len() as u32
    }

    pub fn memory_type(&self, memory_idx: u32) -> Option<MemoryType> {
        let mut remaining = memory_idx;
        for import in &self.imports {
            if let ImportDesc::Memory(mt) = import.desc {
                if remaining == 0 {
                    return Some(mt);
                }
                remaining -= 1;
            }
        }
        self.memories.get(remaining as usize).map(|m| **m)
    }

    pub fn num_globals(&self) -> u32 {
        self.imports_of_kind(ExternalKind::Global).count() as u32 + self.globals.len() as u32
    }

    pub fn num_imported_globals(&self) -> u32 {
        self.imports_of_kind(ExternalKind::Global).count() as u32
    }

    pub fn global_type(&self, global_idx: u32) -> Option<GlobalType> {
        let mut remaining = global_idx;
        for import in &self.imports {
            if let ImportDesc::Global(gt) = import.desc {
                if remaining == 0 {
                    return Some(gt);
                }
                remaining -= 1;
            }
        }
        self.globals.get(remaining as usize).map(|g| g.global_type)
    }

    pub fn num_events(&self) -> u32 {
        self.imports_of_kind(ExternalKind::Event).count() as u32 + self.events.len() as u32
    }

    pub fn event_type(&self, event_idx: u32) -> Option<EventType> {
        let mut remaining = event_idx;
        for import in &self.imports {
            if let ImportDesc::Event(et) = import.desc {
                if remaining == 0 {
                    return Some(et);
                }
                remaining -= 1;
            }
        }
        self.events.get(remaining as usize).map(|e| **e)
    }

    /// Number of data segments: the DataCount section when present (it is
    /// validated to agree), the data section length otherwise.
    pub fn num_data_segments(&self) -> u32 {
        match &self.data_count {
            Some(count) => **count,
            None => self.data.len() as u32,
        }
    }

    /// Export name of an entity, when one exists. Used by the dump output.
    pub fn export_name_of(&self, kind: ExternalKind, index: u32) -> Option<&str> {
        self.exports
            .iter()
            .find(|e| e.kind == kind && e.index == index)
            .map(|e| e.name.as_str())
    }

    // Dump rendering ----------------------------------------------------------

    /// Per-entry listing in the style of a disassembler's `--details` view.
    pub fn details(&self) -> String {
        let mut out = String::new();
        if !self.types.is_empty() {
            out.push_str(&format!("Type[{}]:\n", self.types.len()));
            for (i, ft) in self.types.iter().enumerate() {
                out.push_str(&format!(" - type[{i}] {}\n", ft.value()));
            }
        }
        if !self.imports.is_empty() {
            out.push_str(&format!("Import[{}]:\n", self.imports.len()));
            for (i, import) in self.imports.iter().enumerate() {
                out.push_str(&format!(" - import[{i}] {}\n", import.value()));
            }
        }
        if !self.functions.is_empty() {
            out.push_str(&format!("Function[{}]:\n", self.functions.len()));
            let imported = self.num_imported_funcs();
            for (i, type_idx) in self.functions.iter().enumerate() {
                let func_idx = imported + i as u32;
                let exp = self
                    .export_name_of(ExternalKind::Func, func_idx)
                    .map(|n| format!(" <{n}>"))
                    .unwrap_or_default();
                out.push_str(&format!(" - func[{func_idx}] sig={}{exp}\n", **type_idx));
            }
        }
        if !self.tables.is_empty() {
            out.push_str(&format!("Table[{}]:\n", self.tables.len()));
            for (i, table) in self.tables.iter().enumerate() {
                out.push_str(&format!(
                    " - table[{i}] type={} limits={}\n",
                    table.element, table.limits
                ));
            }
        }
        if !self.memories.is_empty() {
            out.push_str(&format!("Memory[{}]:\n", self.memories.len()));
            for (i, memory) in self.memories.iter().enumerate() {
                out.push_str(&format!(" - memory[{i}] pages={}\n", memory.limits));
            }
        }
        if !self.events.is_empty() {
            out.push_str(&format!("Event[{}]:\n", self.events.len()));
            for (i, event) in self.events.iter().enumerate() {
                out.push_str(&format!(" - event[{i}] sig={}\n", event.type_idx));
            }
        }
        if !self.globals.is_empty() {
            out.push_str(&format!("Global[{}]:\n", self.globals.len()));
            for (i, global) in self.globals.iter().enumerate() {
                out.push_str(&format!(" - global[{i}] {}\n", global.global_type));
            }
        }
        if !self.exports.is_empty() {
            out.push_str(&format!("Export[{}]:\n", self.exports.len()));
            for export in self.exports.iter() {
                out.push_str(&format!(" - {}\n", export.value()));
            }
        }
        if let Some(start) = &self.start {
            out.push_str(&format!("Start:\n - func[{}]\n", **start));
        }
        if !self.elements.is_empty() {
            out.push_str(&format!("Elem[{}]:\n", self.elements.len()));
            for (i, elem) in self.elements.iter().enumerate() {
                out.push_str(&format!(
                    " - segment[{i}] flags={} count={}\n",
                    elem.flags,
                    elem.init.len()
                ));
            }
        }
        if !self.code.is_empty() {
            out.push_str(&format!("Code[{}]:\n", self.code.len()));
            let imported = self.num_imported_funcs();
            for (i, body) in self.code.iter().enumerate() {
                let func_idx = imported + i as u32;
                let exp = self
                    .export_name_of(ExternalKind::Func, func_idx)
                    .map(|n| format!(" <{n}>"))
                    .unwrap_or_default();
                out.push_str(&format!(
                    " - func[{func_idx}] size={}{exp}\n",
                    body.position.len()
                ));
            }
        }
        if !self.data.is_empty() {
            out.push_str(&format!("Data[{}]:\n", self.data.len()));
            for (i, segment) in self.data.iter().enumerate() {
                out.push_str(&format!(
                    " - segment[{i}] size={}\n",
                    segment.init.len()
                ));
            }
        }
        for custom in &self.custom {
            out.push_str(&format!(
                "Custom \"{}\" size={}\n",
                custom.name,
                custom.data.len()
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Limits, RefType};

    fn module_with_imports() -> Module {
        let mut module = Module::new();
        module.types.push(At::new(
            FunctionType {
                params: vec![ValueType::I32],
                results: vec![],
            },
            0,
        ));
        module.types.push(At::new(FunctionType::default(), 0));
        module.imports.push(At::new(
            Import {
                module: "env".to_string(),
                name: "log".to_string(),
                desc: ImportDesc::Func(0),
            },
            0,
        ));
        module.imports.push(At::new(
            Import {
                module: "env".to_string(),
                name: "tab".to_string(),
                desc: ImportDesc::Table(TableType {
                    element: RefType::FuncRef,
                    limits: Limits::new(1, None),
                }),
            },
            0,
        ));
        module.functions.push(At::new(1, 0));
        module
    }

    #[test]
    fn func_index_space_is_imports_first() {
        let module = module_with_imports();
        assert_eq!(module.num_funcs(), 2);
        assert_eq!(module.func_type_idx(0), Some(0));
        assert_eq!(module.func_type_idx(1), Some(1));
        assert_eq!(module.func_type_idx(2), None);
    }

    #[test]
    fn table_index_space_counts_imports() {
        let module = module_with_imports();
        assert_eq!(module.num_tables(), 1);
        assert_eq!(
            module.table_type(0).unwrap().element,
            RefType::FuncRef
        );
        assert!(module.table_type(1).is_none());
    }

    #[test]
    fn flat_locals_expands_runs() {
        let body = FunctionBody {
            locals: vec![(2, ValueType::I32), (1, ValueType::F64)],
            instructions: vec![],
            position: SectionPosition::default(),
        };
        assert_eq!(body.local_count(), 3);
        assert_eq!(
            body.flat_locals(),
            vec![ValueType::I32, ValueType::I32, ValueType::F64]
        );
    }

    #[test]
    fn export_name_lookup() {
        let mut module = module_with_imports();
        module.exports.push(At::new(
            Export {
                name: "run".to_string(),
                kind: ExternalKind::Func,
                index: 1,
            },
            0,
        ));
        assert_eq!(module.export_name_of(ExternalKind::Func, 1), Some("run"));
        assert_eq!(module.export_name_of(ExternalKind::Func, 0), None);
    }
}
