//! Lazy typed readers for section payloads.
//!
//! Each known section payload is exposed as a finite, single-pass sequence
//! of typed entries. The sequences borrow the input span and are restartable
//! by re-reading from the section's saved payload. Errors are deferred:
//! iteration yields `Result` items, so a consumer may record a diagnostic
//! and stop, or skip the rest of the section. After an entry-level error the
//! reader resynchronises to the end of the section so the enclosing section
//! iterator stays on the rails.

use crate::error::WasmError;
use crate::features::{Feature, Features};
use crate::limits;
use crate::module::{
    CustomSection, DataMode, DataSegment, ElementInit, ElementMode, ElementSegment, Export,
    FunctionBody, Global, Import, ImportDesc, SectionPosition,
};
use crate::parser::encoding::{
    DATA_ACTIVE, DATA_ACTIVE_EXPLICIT, DATA_PASSIVE, ELEMKIND_FUNCREF, LIMITS_MIN, LIMITS_MIN_64,
    LIMITS_MIN_MAX, LIMITS_MIN_MAX_64, LIMITS_SHARED_MIN, LIMITS_SHARED_MIN_MAX, TYPE_FUNC,
};
use crate::parser::instruction::{ExpressionReader, Instruction};
use crate::parser::reader::Reader;
use crate::parser::Section;
use crate::types::{
    At, EventType, ExternalKind, FunctionType, GlobalType, Limits, MemoryType, RefType, TableType,
    ValueType,
};

type EntryParser<T> = fn(&mut Reader<'_>, &Features) -> Result<T, WasmError>;

/// Lazy iterator over one section's entries.
///
/// Yields `count` items (fewer after an error). The declared count is
/// available up front via [`EntryReader::count`] so consumers can
/// preallocate or cross-check.
pub struct EntryReader<'a, T> {
    reader: Reader<'a>,
    features: Features,
    count: u32,
    index: u32,
    end: usize,
    failed: bool,
    parse: EntryParser<T>,
}

impl<'a, T> EntryReader<'a, T> {
    fn new(
        section: &Section<'a>,
        features: &Features,
        limit: u32,
        what: &str,
        parse: EntryParser<T>,
    ) -> Result<EntryReader<'a, T>, WasmError> {
        let mut reader = section.payload_reader();
        let count = reader.read_count(limit, what)?;
        Ok(EntryReader {
            end: reader.len(),
            reader,
            features: *features,
            count,
            index: 0,
            failed: false,
            parse,
        })
    }

    /// The entry count stored at the start of the section.
    pub fn count(&self) -> u32 {
        self.count
    }
}

impl<T> Iterator for EntryReader<'_, T> {
    type Item = Result<At<T>, WasmError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        if self.index >= self.count {
            // The declared count must consume the payload exactly.
            if !self.reader.is_at_end() {
                self.failed = true;
                return Some(Err(WasmError::malformed(
                    self.reader.pos(),
                    format!(
                        "section has {} bytes of unexpected trailing data",
                        self.reader.remaining()
                    ),
                )));
            }
            return None;
        }
        self.index += 1;
        let offset = self.reader.pos();
        match (self.parse)(&mut self.reader, &self.features) {
            Ok(entry) => Some(Ok(At::new(entry, offset))),
            Err(e) => {
                self.failed = true;
                self.reader.skip_to(self.end);
                Some(Err(e))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Shared entry parsers
// ---------------------------------------------------------------------------

pub(crate) fn read_limits(
    reader: &mut Reader<'_>,
    features: &Features,
    is_memory: bool,
) -> Result<Limits, WasmError> {
    let flag_pos = reader.pos();
    let flag = reader.read_byte()?;
    match flag {
        LIMITS_MIN => Ok(Limits::new(reader.read_vu32()?, None)),
        LIMITS_MIN_MAX => {
            let min = reader.read_vu32()?;
            let max = reader.read_vu32()?;
            Ok(Limits::new(min, Some(max)))
        }
        LIMITS_SHARED_MIN | LIMITS_SHARED_MIN_MAX => {
            if !is_memory || !features.contains(Feature::Threads) {
                return Err(WasmError::malformed(
                    flag_pos,
                    "shared limits require the threads feature on a memory",
                ));
            }
            if flag == LIMITS_SHARED_MIN {
                return Err(WasmError::malformed(
                    flag_pos,
                    "shared memory must have a maximum size",
                ));
            }
            let min = reader.read_vu32()?;
            let max = reader.read_vu32()?;
            Ok(Limits {
                min,
                max: Some(max),
                shared: true,
            })
        }
        LIMITS_MIN_64 | LIMITS_MIN_MAX_64 => {
            if !is_memory || !features.contains(Feature::Memory64) {
                return Err(WasmError::malformed(
                    flag_pos,
                    "64-bit limits require the memory64 feature on a memory",
                ));
            }
            let min = reader.read_vu64()?;
            let max = if flag == LIMITS_MIN_MAX_64 {
                Some(reader.read_vu64()?)
            } else {
                None
            };
            let narrow = |v: u64| -> Result<u32, WasmError> {
                u32::try_from(v).map_err(|_| {
                    WasmError::malformed(flag_pos, format!("memory size {v} out of supported range"))
                })
            };
            Ok(Limits::new(
                narrow(min)?,
                max.map(narrow).transpose()?,
            ))
        }
        _ => Err(WasmError::malformed(
            flag_pos,
            format!("invalid limits flags: 0x{flag:02x}"),
        )),
    }
}

fn read_value_types(
    reader: &mut Reader<'_>,
    features: &Features,
    limit: u32,
    what: &str,
) -> Result<Vec<ValueType>, WasmError> {
    let count = reader.read_count(limit, what)?;
    let mut types = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let pos = reader.pos();
        types.push(ValueType::decode(reader.read_byte()?, pos, features)?);
    }
    Ok(types)
}

fn read_function_type(
    reader: &mut Reader<'_>,
    features: &Features,
) -> Result<FunctionType, WasmError> {
    let form_pos = reader.pos();
    let form = reader.read_byte()?;
    if form != TYPE_FUNC {
        return Err(WasmError::malformed(
            form_pos,
            format!("expected function type form 0x60, got 0x{form:02x}"),
        ));
    }
    let params = read_value_types(reader, features, limits::MAX_FUNCTION_PARAMS, "param")?;
    let results = read_value_types(reader, features, limits::MAX_FUNCTION_RETURNS, "result")?;
    if results.len() > 1 && !features.contains(Feature::MultiValue) {
        return Err(WasmError::malformed(
            form_pos,
            "multiple results require the multi-value feature",
        ));
    }
    Ok(FunctionType { params, results })
}

fn read_table_type(reader: &mut Reader<'_>, features: &Features) -> Result<TableType, WasmError> {
    let pos = reader.pos();
    let element = RefType::decode(reader.read_byte()?, pos, features)?;
    let limits = read_limits(reader, features, false)?;
    Ok(TableType { element, limits })
}

fn read_memory_type(reader: &mut Reader<'_>, features: &Features) -> Result<MemoryType, WasmError> {
    let limits = read_limits(reader, features, true)?;
    Ok(MemoryType { limits })
}

fn read_global_type(reader: &mut Reader<'_>, features: &Features) -> Result<GlobalType, WasmError> {
    let pos = reader.pos();
    let value_type = ValueType::decode(reader.read_byte()?, pos, features)?;
    let mut_pos = reader.pos();
    let mutable = match reader.read_byte()? {
        0x00 => false,
        0x01 => true,
        byte => {
            return Err(WasmError::malformed(
                mut_pos,
                format!("invalid mutability: 0x{byte:02x}"),
            ))
        }
    };
    Ok(GlobalType {
        value_type,
        mutable,
    })
}

fn read_event_type(reader: &mut Reader<'_>, _features: &Features) -> Result<EventType, WasmError> {
    let attr_pos = reader.pos();
    let attribute = reader.read_vu32()?;
    if attribute != 0 {
        return Err(WasmError::malformed(
            attr_pos,
            format!("invalid event attribute: {attribute}"),
        ));
    }
    let type_idx = reader.read_vu32()?;
    Ok(EventType {
        attribute,
        type_idx,
    })
}

fn read_import(reader: &mut Reader<'_>, features: &Features) -> Result<Import, WasmError> {
    let module = reader.read_name()?;
    let name = reader.read_name()?;
    let kind_pos = reader.pos();
    let kind = ExternalKind::decode(reader.read_byte()?, kind_pos, features)?;
    let desc = match kind {
        ExternalKind::Func => ImportDesc::Func(reader.read_vu32()?),
        ExternalKind::Table => ImportDesc::Table(read_table_type(reader, features)?),
        ExternalKind::Memory => ImportDesc::Memory(read_memory_type(reader, features)?),
        ExternalKind::Global => ImportDesc::Global(read_global_type(reader, features)?),
        ExternalKind::Event => ImportDesc::Event(read_event_type(reader, features)?),
    };
    Ok(Import { module, name, desc })
}

fn read_export(reader: &mut Reader<'_>, features: &Features) -> Result<Export, WasmError> {
    let name = reader.read_name()?;
    let kind_pos = reader.pos();
    let kind = ExternalKind::decode(reader.read_byte()?, kind_pos, features)?;
    let index = reader.read_vu32()?;
    Ok(Export { name, kind, index })
}

fn read_expression(
    reader: &mut Reader<'_>,
    features: &Features,
) -> Result<Vec<Instruction>, WasmError> {
    ExpressionReader::new(reader, features).read_all()
}

fn read_global(reader: &mut Reader<'_>, features: &Features) -> Result<Global, WasmError> {
    let global_type = read_global_type(reader, features)?;
    let init = read_expression(reader, features)?;
    Ok(Global { global_type, init })
}

fn read_func_index_vec(reader: &mut Reader<'_>) -> Result<Vec<At<u32>>, WasmError> {
    let count = reader.read_count(limits::MAX_TABLE_SIZE, "element function index")?;
    let mut indices = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let pos = reader.pos();
        indices.push(At::new(reader.read_vu32()?, pos));
    }
    Ok(indices)
}

fn read_expression_vec(
    reader: &mut Reader<'_>,
    features: &Features,
) -> Result<Vec<Vec<Instruction>>, WasmError> {
    let count = reader.read_count(limits::MAX_TABLE_SIZE, "element expression")?;
    let mut exprs = Vec::with_capacity(count as usize);
    for _ in 0..count {
        exprs.push(read_expression(reader, features)?);
    }
    Ok(exprs)
}

fn read_element_segment(
    reader: &mut Reader<'_>,
    features: &Features,
) -> Result<ElementSegment, WasmError> {
    let flags_pos = reader.pos();
    let flags = reader.read_vu32()?;
    if flags > 7 {
        return Err(WasmError::malformed(
            flags_pos,
            format!("invalid element segment flags: {flags}"),
        ));
    }
    if flags != 0 && !features.contains(Feature::BulkMemory) {
        return Err(WasmError::malformed(
            flags_pos,
            "non-MVP element segments require the bulk-memory feature",
        ));
    }

    let active = flags & 0b001 == 0;
    let explicit_table = flags & 0b010 != 0;
    let expressions = flags & 0b100 != 0;

    let mode = if active {
        let table_index = if explicit_table { reader.read_vu32()? } else { 0 };
        let offset = read_expression(reader, features)?;
        ElementMode::Active {
            table_index,
            offset,
        }
    } else if explicit_table {
        ElementMode::Declarative
    } else {
        ElementMode::Passive
    };

    // Flags 1-3 carry an elemkind byte; flags 5-7 a reference type; flags
    // 0 and 4 leave the funcref kind implicit.
    let kind = if expressions {
        if flags != ELEM_ACTIVE_EXPRS_IMPLICIT {
            let pos = reader.pos();
            RefType::decode(reader.read_byte()?, pos, features)?
        } else {
            RefType::FuncRef
        }
    } else if flags != 0 {
        let pos = reader.pos();
        let elemkind = reader.read_byte()?;
        if elemkind != ELEMKIND_FUNCREF {
            return Err(WasmError::malformed(
                pos,
                format!("invalid elemkind: 0x{elemkind:02x}"),
            ));
        }
        RefType::FuncRef
    } else {
        RefType::FuncRef
    };

    let init = if expressions {
        ElementInit::Expressions(read_expression_vec(reader, features)?)
    } else {
        ElementInit::Functions(read_func_index_vec(reader)?)
    };

    Ok(ElementSegment {
        flags,
        kind,
        mode,
        init,
    })
}

const ELEM_ACTIVE_EXPRS_IMPLICIT: u32 = crate::parser::encoding::ELEM_ACTIVE_EXPRS;

fn read_data_segment(
    reader: &mut Reader<'_>,
    features: &Features,
) -> Result<DataSegment, WasmError> {
    let flags_pos = reader.pos();
    let flags = reader.read_vu32()?;
    let mode = match flags {
        DATA_ACTIVE => DataMode::Active {
            memory_index: 0,
            offset: read_expression(reader, features)?,
        },
        DATA_PASSIVE => {
            if !features.contains(Feature::BulkMemory) {
                return Err(WasmError::malformed(
                    flags_pos,
                    "passive data segments require the bulk-memory feature",
                ));
            }
            DataMode::Passive
        }
        DATA_ACTIVE_EXPLICIT => {
            let memory_index = reader.read_vu32()?;
            DataMode::Active {
                memory_index,
                offset: read_expression(reader, features)?,
            }
        }
        _ => {
            return Err(WasmError::malformed(
                flags_pos,
                format!("invalid data segment flags: {flags}"),
            ))
        }
    };
    let init = reader.read_u8vec()?.to_vec();
    Ok(DataSegment { mode, init })
}

fn read_code_entry(
    reader: &mut Reader<'_>,
    features: &Features,
) -> Result<FunctionBody, WasmError> {
    let size_pos = reader.pos();
    let size = reader.read_vu32()?;
    if size > limits::MAX_FUNCTION_SIZE {
        return Err(WasmError::malformed(
            size_pos,
            format!("function body size {size} exceeds implementation limit"),
        ));
    }
    let body_start = reader.pos();
    let body_end = body_start + size as usize;
    if !reader.has_at_least(size as usize) {
        return Err(WasmError::malformed(
            size_pos,
            format!(
                "function body size {size} extends past the end of the section ({} bytes left)",
                reader.remaining()
            ),
        ));
    }

    let run_count = reader.read_count(limits::MAX_FUNCTION_LOCALS, "local declaration")?;
    let mut locals = Vec::with_capacity(run_count as usize);
    let mut total: u64 = 0;
    for _ in 0..run_count {
        let count = reader.read_vu32()?;
        let type_pos = reader.pos();
        let vt = ValueType::decode(reader.read_byte()?, type_pos, features)?;
        total += count as u64;
        locals.push((count, vt));
    }
    if total > limits::MAX_FUNCTION_LOCALS as u64 {
        return Err(WasmError::malformed(
            body_start,
            format!("too many locals: {total}"),
        ));
    }

    let instructions = read_expression(reader, features)?;
    if reader.pos() != body_end {
        return Err(WasmError::malformed(
            size_pos,
            format!(
                "function body size mismatch: declared {size}, consumed {}",
                reader.pos() - body_start
            ),
        ));
    }

    Ok(FunctionBody {
        locals,
        instructions,
        position: SectionPosition::new(body_start as u32, body_end as u32),
    })
}

fn read_type_index(reader: &mut Reader<'_>, _features: &Features) -> Result<u32, WasmError> {
    reader.read_vu32()
}

// ---------------------------------------------------------------------------
// Per-section reader constructors
// ---------------------------------------------------------------------------

pub fn type_entries<'a>(
    section: &Section<'a>,
    features: &Features,
) -> Result<EntryReader<'a, FunctionType>, WasmError> {
    EntryReader::new(section, features, limits::MAX_TYPES, "type", read_function_type)
}

pub fn import_entries<'a>(
    section: &Section<'a>,
    features: &Features,
) -> Result<EntryReader<'a, Import>, WasmError> {
    EntryReader::new(section, features, limits::MAX_IMPORTS, "import", read_import)
}

pub fn function_entries<'a>(
    section: &Section<'a>,
    features: &Features,
) -> Result<EntryReader<'a, u32>, WasmError> {
    EntryReader::new(
        section,
        features,
        limits::MAX_FUNCTIONS,
        "function",
        read_type_index,
    )
}

pub fn table_entries<'a>(
    section: &Section<'a>,
    features: &Features,
) -> Result<EntryReader<'a, TableType>, WasmError> {
    EntryReader::new(section, features, limits::MAX_TABLES, "table", read_table_type)
}

pub fn memory_entries<'a>(
    section: &Section<'a>,
    features: &Features,
) -> Result<EntryReader<'a, MemoryType>, WasmError> {
    EntryReader::new(section, features, limits::MAX_TABLES, "memory", read_memory_type)
}

pub fn event_entries<'a>(
    section: &Section<'a>,
    features: &Features,
) -> Result<EntryReader<'a, EventType>, WasmError> {
    EntryReader::new(section, features, limits::MAX_EVENTS, "event", read_event_type)
}

pub fn global_entries<'a>(
    section: &Section<'a>,
    features: &Features,
) -> Result<EntryReader<'a, Global>, WasmError> {
    EntryReader::new(section, features, limits::MAX_GLOBALS, "global", read_global)
}

pub fn export_entries<'a>(
    section: &Section<'a>,
    features: &Features,
) -> Result<EntryReader<'a, Export>, WasmError> {
    EntryReader::new(section, features, limits::MAX_EXPORTS, "export", read_export)
}

pub fn element_entries<'a>(
    section: &Section<'a>,
    features: &Features,
) -> Result<EntryReader<'a, ElementSegment>, WasmError> {
    EntryReader::new(
        section,
        features,
        limits::MAX_ELEMENT_SEGMENTS,
        "element segment",
        read_element_segment,
    )
}

pub fn code_entries<'a>(
    section: &Section<'a>,
    features: &Features,
) -> Result<EntryReader<'a, FunctionBody>, WasmError> {
    EntryReader::new(
        section,
        features,
        limits::MAX_FUNCTIONS,
        "function body",
        read_code_entry,
    )
}

pub fn data_entries<'a>(
    section: &Section<'a>,
    features: &Features,
) -> Result<EntryReader<'a, DataSegment>, WasmError> {
    EntryReader::new(
        section,
        features,
        limits::MAX_DATA_SEGMENTS,
        "data segment",
        read_data_segment,
    )
}

/// Single-value payload of a start section.
pub fn start_entry(section: &Section<'_>) -> Result<At<u32>, WasmError> {
    let mut reader = section.payload_reader();
    let offset = reader.pos();
    let index = reader.read_vu32()?;
    if !reader.is_at_end() {
        return Err(WasmError::malformed(
            reader.pos(),
            "start section has trailing bytes",
        ));
    }
    Ok(At::new(index, offset))
}

/// Single-value payload of a DataCount section.
pub fn data_count_entry(section: &Section<'_>, features: &Features) -> Result<At<u32>, WasmError> {
    if !features.contains(Feature::BulkMemory) {
        return Err(WasmError::malformed(
            section.range.start as usize,
            "DataCount section requires the bulk-memory feature",
        ));
    }
    let mut reader = section.payload_reader();
    let offset = reader.pos();
    let count = reader.read_vu32()?;
    if !reader.is_at_end() {
        return Err(WasmError::malformed(
            reader.pos(),
            "DataCount section has trailing bytes",
        ));
    }
    Ok(At::new(count, offset))
}

/// Name plus raw bytes of a custom section.
pub fn custom_entry(section: &Section<'_>) -> Result<At<CustomSection>, WasmError> {
    let mut reader = section.payload_reader();
    let offset = reader.pos();
    let name = reader.read_name()?;
    let data = reader.read_bytes(reader.remaining())?.to_vec();
    Ok(At::new(CustomSection { name, data }, offset))
}
