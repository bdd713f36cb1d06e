//! Binary format decoder.
//!
//! The decoder is layered, lazy-first:
//!
//! 1. [`read_header`] checks the magic and version.
//! 2. [`SectionIterator`] frames the input into `(id, payload)` sections
//!    without touching payload contents.
//! 3. [`sections`] exposes each payload as a lazy sequence of typed entries.
//! 4. [`parse`] drives all three into an eager [`Module`], stopping at the
//!    first error. [`crate::visitor`] drives the same layers one callback at
//!    a time instead.
//!
//! All layers borrow the input span; nothing is copied until an owned model
//! value (a name, a data segment) is actually built.

pub mod encoding;
pub mod instruction;
pub mod reader;
pub mod sections;

use std::fmt;

use log::debug;

use crate::error::WasmError;
use crate::features::Features;
use crate::module::{Module, SectionPosition};
use reader::Reader;

/// Identifier of a top-level section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionId {
    Custom,
    Type,
    Import,
    Function,
    Table,
    Memory,
    Event,
    Global,
    Export,
    Start,
    Element,
    DataCount,
    Code,
    Data,
}

impl SectionId {
    pub fn from_byte(byte: u8) -> Option<SectionId> {
        match byte {
            encoding::SECTION_CUSTOM => Some(SectionId::Custom),
            encoding::SECTION_TYPE => Some(SectionId::Type),
            encoding::SECTION_IMPORT => Some(SectionId::Import),
            encoding::SECTION_FUNCTION => Some(SectionId::Function),
            encoding::SECTION_TABLE => Some(SectionId::Table),
            encoding::SECTION_MEMORY => Some(SectionId::Memory),
            encoding::SECTION_EVENT => Some(SectionId::Event),
            encoding::SECTION_GLOBAL => Some(SectionId::Global),
            encoding::SECTION_EXPORT => Some(SectionId::Export),
            encoding::SECTION_START => Some(SectionId::Start),
            encoding::SECTION_ELEMENT => Some(SectionId::Element),
            encoding::SECTION_DATA_COUNT => Some(SectionId::DataCount),
            encoding::SECTION_CODE => Some(SectionId::Code),
            encoding::SECTION_DATA => Some(SectionId::Data),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            SectionId::Custom => encoding::SECTION_CUSTOM,
            SectionId::Type => encoding::SECTION_TYPE,
            SectionId::Import => encoding::SECTION_IMPORT,
            SectionId::Function => encoding::SECTION_FUNCTION,
            SectionId::Table => encoding::SECTION_TABLE,
            SectionId::Memory => encoding::SECTION_MEMORY,
            SectionId::Event => encoding::SECTION_EVENT,
            SectionId::Global => encoding::SECTION_GLOBAL,
            SectionId::Export => encoding::SECTION_EXPORT,
            SectionId::Start => encoding::SECTION_START,
            SectionId::Element => encoding::SECTION_ELEMENT,
            SectionId::DataCount => encoding::SECTION_DATA_COUNT,
            SectionId::Code => encoding::SECTION_CODE,
            SectionId::Data => encoding::SECTION_DATA,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SectionId::Custom => "Custom",
            SectionId::Type => "Type",
            SectionId::Import => "Import",
            SectionId::Function => "Function",
            SectionId::Table => "Table",
            SectionId::Memory => "Memory",
            SectionId::Event => "Event",
            SectionId::Global => "Global",
            SectionId::Export => "Export",
            SectionId::Start => "Start",
            SectionId::Element => "Element",
            SectionId::DataCount => "DataCount",
            SectionId::Code => "Code",
            SectionId::Data => "Data",
        }
    }

    /// Canonical position of a known section. Custom sections have no rank
    /// and may appear anywhere.
    fn rank(self) -> Option<u8> {
        match self {
            SectionId::Custom => None,
            SectionId::Type => Some(1),
            SectionId::Import => Some(2),
            SectionId::Function => Some(3),
            SectionId::Table => Some(4),
            SectionId::Memory => Some(5),
            SectionId::Event => Some(6),
            SectionId::Global => Some(7),
            SectionId::Export => Some(8),
            SectionId::Start => Some(9),
            SectionId::Element => Some(10),
            SectionId::DataCount => Some(11),
            SectionId::Code => Some(12),
            SectionId::Data => Some(13),
        }
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A raw section frame: id plus the byte range of its payload.
///
/// The frame keeps the whole input span, so typed readers derived from it
/// report absolute offsets, and a consumer can re-read the payload as often
/// as it likes.
#[derive(Debug, Clone)]
pub struct Section<'a> {
    pub id: SectionId,
    input: &'a [u8],
    pub range: SectionPosition,
}

impl<'a> Section<'a> {
    /// The payload bytes.
    pub fn payload(&self) -> &'a [u8] {
        &self.input[self.range.start as usize..self.range.end as usize]
    }

    /// A reader over the payload, bounded at the payload end, reporting
    /// absolute input offsets.
    pub fn payload_reader(&self) -> Reader<'a> {
        Reader::at(
            &self.input[..self.range.end as usize],
            self.range.start as usize,
        )
    }
}

/// Check the `\0asm` magic and version header.
pub fn read_header(reader: &mut Reader<'_>) -> Result<(), WasmError> {
    let magic_pos = reader.pos();
    let magic = reader.read_u32()?;
    if magic != encoding::MAGIC {
        return Err(WasmError::malformed(
            magic_pos,
            format!("bad magic value: 0x{magic:08x}"),
        ));
    }
    let version_pos = reader.pos();
    let version = reader.read_u32()?;
    if version != encoding::VERSION {
        return Err(WasmError::malformed(
            version_pos,
            format!("bad version: {version} (expected {})", encoding::VERSION),
        ));
    }
    Ok(())
}

/// Lazy iterator over a module's top-level sections.
///
/// Constructed with [`SectionIterator::new`], which consumes the header.
/// Yields an error (then ends) if the remaining bytes do not form a complete
/// `(id, size, payload)` triple.
pub struct SectionIterator<'a> {
    input: &'a [u8],
    reader: Reader<'a>,
    failed: bool,
}

impl<'a> SectionIterator<'a> {
    pub fn new(bytes: &'a [u8]) -> Result<SectionIterator<'a>, WasmError> {
        let mut reader = Reader::new(bytes);
        read_header(&mut reader)?;
        Ok(SectionIterator {
            input: bytes,
            reader,
            failed: false,
        })
    }

    fn read_section(&mut self) -> Result<Section<'a>, WasmError> {
        let id_pos = self.reader.pos();
        let id_byte = self.reader.read_byte()?;
        let id = SectionId::from_byte(id_byte).ok_or_else(|| {
            WasmError::malformed(id_pos, format!("invalid section id: {id_byte}"))
        })?;
        let size_pos = self.reader.pos();
        let size = self.reader.read_vu32()?;
        if !self.reader.has_at_least(size as usize) {
            return Err(WasmError::malformed(
                size_pos,
                format!(
                    "not enough bytes left for section, expected {size}, got {}",
                    self.reader.remaining()
                ),
            ));
        }
        let start = self.reader.pos();
        self.reader.skip_to(start + size as usize);
        debug!("section {} ({} bytes at 0x{start:08x})", id.name(), size);
        Ok(Section {
            id,
            input: self.input,
            range: SectionPosition::new(start as u32, (start + size as usize) as u32),
        })
    }
}

impl<'a> Iterator for SectionIterator<'a> {
    type Item = Result<Section<'a>, WasmError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.reader.is_at_end() {
            return None;
        }
        match self.read_section() {
            Ok(section) => Some(Ok(section)),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Tracks the canonical ordering of known sections across one pass.
#[derive(Debug, Default)]
pub struct SectionOrder {
    last: Option<SectionId>,
}

impl SectionOrder {
    pub fn new() -> SectionOrder {
        SectionOrder::default()
    }

    /// Record `id`, reporting an ordering violation (including duplicates)
    /// as an Invalid-kind error. Custom sections always pass.
    pub fn check(&mut self, id: SectionId, offset: usize) -> Result<(), WasmError> {
        let Some(rank) = id.rank() else {
            return Ok(());
        };
        if let Some(last) = self.last {
            let last_rank = last.rank().expect("only ranked sections are recorded");
            if rank <= last_rank {
                return Err(WasmError::invalid_at(
                    offset,
                    format!("Section out of order: {id} cannot occur after {last}"),
                ));
            }
        }
        self.last = Some(id);
        Ok(())
    }
}

/// Decode a whole module eagerly, stopping at the first diagnostic.
///
/// This is the strict front door used by the tools; consumers that want to
/// continue past errors drive [`SectionIterator`] and [`sections`] (or
/// [`crate::visitor`]) themselves.
pub fn parse(bytes: &[u8], features: &Features) -> Result<Module, WasmError> {
    let mut module = Module::new();
    let mut order = SectionOrder::new();

    for section in SectionIterator::new(bytes)? {
        let section = section?;
        order.check(section.id, section.range.start as usize)?;
        match section.id {
            SectionId::Custom => {
                module.custom.push(sections::custom_entry(&section)?);
            }
            SectionId::Type => {
                for entry in sections::type_entries(&section, features)? {
                    module.types.push(entry?);
                }
            }
            SectionId::Import => {
                for entry in sections::import_entries(&section, features)? {
                    module.imports.push(entry?);
                }
            }
            SectionId::Function => {
                for entry in sections::function_entries(&section, features)? {
                    module.functions.push(entry?);
                }
            }
            SectionId::Table => {
                for entry in sections::table_entries(&section, features)? {
                    module.tables.push(entry?);
                }
            }
            SectionId::Memory => {
                for entry in sections::memory_entries(&section, features)? {
                    module.memories.push(entry?);
                }
            }
            SectionId::Event => {
                if !features.contains(crate::features::Feature::Exceptions) {
                    return Err(WasmError::malformed(
                        section.range.start as usize,
                        "event section requires the exceptions feature",
                    ));
                }
                for entry in sections::event_entries(&section, features)? {
                    module.events.push(entry?);
                }
            }
            SectionId::Global => {
                for entry in sections::global_entries(&section, features)? {
                    module.globals.push(entry?);
                }
            }
            SectionId::Export => {
                for entry in sections::export_entries(&section, features)? {
                    module.exports.push(entry?);
                }
            }
            SectionId::Start => {
                module.start = Some(sections::start_entry(&section)?);
            }
            SectionId::Element => {
                for entry in sections::element_entries(&section, features)? {
                    module.elements.push(entry?);
                }
            }
            SectionId::DataCount => {
                module.data_count = Some(sections::data_count_entry(&section, features)?);
            }
            SectionId::Code => {
                for entry in sections::code_entries(&section, features)? {
                    module.code.push(entry?);
                }
            }
            SectionId::Data => {
                for entry in sections::data_entries(&section, features)? {
                    module.data.push(entry?);
                }
            }
        }
    }

    if module.functions.len() != module.code.len() {
        return Err(WasmError::malformed(
            bytes.len(),
            format!(
                "function and code section have inconsistent lengths ({} functions, {} bodies)",
                module.functions.len(),
                module.code.len()
            ),
        ));
    }
    if let Some(count) = &module.data_count {
        if **count as usize != module.data.len() {
            return Err(WasmError::malformed(
                bytes.len(),
                format!(
                    "data count and data section have inconsistent lengths ({} declared, {} segments)",
                    **count,
                    module.data.len()
                ),
            ));
        }
    }

    Ok(module)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const EMPTY_MODULE: &[u8] = &[0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00];

    #[test]
    fn empty_module_parses() {
        let module = parse(EMPTY_MODULE, &Features::all()).unwrap();
        assert_eq!(module, Module::new());
    }

    #[test]
    fn bad_magic_is_malformed() {
        let err = parse(&[0x00, 0x61, 0x73, 0x00, 0x01, 0, 0, 0], &Features::all()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Malformed);
        assert!(err.message.contains("bad magic value"));
        assert_eq!(err.offset, Some(0));
    }

    #[test]
    fn bad_version_is_malformed() {
        let err = parse(&[0x00, 0x61, 0x73, 0x6d, 0x02, 0, 0, 0], &Features::all()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Malformed);
        assert!(err.message.contains("bad version"));
        assert_eq!(err.offset, Some(4));
    }

    #[test]
    fn truncated_header_is_malformed() {
        let err = parse(&[0x00, 0x61], &Features::all()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Malformed);
    }

    #[test]
    fn incomplete_section_triple_is_malformed() {
        // Section id with no size byte.
        let mut bytes = EMPTY_MODULE.to_vec();
        bytes.push(0x01);
        let err = parse(&bytes, &Features::all()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Malformed);

        // Declared size larger than the remaining input.
        let mut bytes = EMPTY_MODULE.to_vec();
        bytes.extend([0x01, 0x7f, 0x00]);
        let err = parse(&bytes, &Features::all()).unwrap_err();
        assert!(err.message.contains("not enough bytes left for section"));
    }

    #[test]
    fn section_order_is_enforced() {
        // Function section (one entry, type 0) before Import section.
        let mut bytes = EMPTY_MODULE.to_vec();
        bytes.extend([0x01, 0x04, 0x01, 0x60, 0x00, 0x00]); // type section
        bytes.extend([0x03, 0x02, 0x01, 0x00]); // function section
        bytes.extend([
            0x02, 0x07, 0x01, 0x01, b'm', 0x01, b'n', 0x00, 0x00, // import section
        ]);
        // The import has no matching code entry, but ordering fails first.
        let err = parse(&bytes, &Features::all()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Invalid);
        assert_eq!(
            err.message,
            "Section out of order: Import cannot occur after Function"
        );
    }

    #[test]
    fn duplicate_section_is_out_of_order() {
        let mut bytes = EMPTY_MODULE.to_vec();
        bytes.extend([0x01, 0x04, 0x01, 0x60, 0x00, 0x00]);
        bytes.extend([0x01, 0x04, 0x01, 0x60, 0x00, 0x00]);
        let err = parse(&bytes, &Features::all()).unwrap_err();
        assert_eq!(
            err.message,
            "Section out of order: Type cannot occur after Type"
        );
    }

    #[test]
    fn custom_sections_may_appear_anywhere() {
        let mut bytes = EMPTY_MODULE.to_vec();
        // custom "a" with payload [1,2], then type section, then custom "b".
        bytes.extend([0x00, 0x04, 0x01, b'a', 0x01, 0x02]);
        bytes.extend([0x01, 0x04, 0x01, 0x60, 0x00, 0x00]);
        bytes.extend([0x00, 0x02, 0x01, b'b']);
        let module = parse(&bytes, &Features::all()).unwrap();
        assert_eq!(module.custom.len(), 2);
        assert_eq!(module.custom[0].name, "a");
        assert_eq!(module.custom[0].data, vec![1, 2]);
        assert_eq!(module.custom[1].name, "b");
        assert!(module.custom[1].data.is_empty());
    }

    #[test]
    fn trivial_module_parses() {
        // (module (func)) -- one [] -> [] type, one function, empty body.
        let bytes = [
            0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00, //
            0x01, 0x04, 0x01, 0x60, 0x00, 0x00, //
            0x03, 0x02, 0x01, 0x00, //
            0x0a, 0x04, 0x01, 0x02, 0x00, 0x0b,
        ];
        let module = parse(&bytes, &Features::all()).unwrap();
        assert_eq!(module.types.len(), 1);
        assert_eq!(module.functions.len(), 1);
        assert_eq!(module.code.len(), 1);
        assert!(module.code[0].locals.is_empty());
        assert_eq!(module.code[0].instructions.len(), 1);
    }

    #[test]
    fn func_code_count_mismatch_is_malformed() {
        let mut bytes = EMPTY_MODULE.to_vec();
        bytes.extend([0x01, 0x04, 0x01, 0x60, 0x00, 0x00]);
        bytes.extend([0x03, 0x02, 0x01, 0x00]); // one function, no code section
        let err = parse(&bytes, &Features::all()).unwrap_err();
        assert!(err.message.contains("inconsistent lengths"));
    }

    #[test]
    fn data_count_mismatch_is_malformed() {
        let mut bytes = EMPTY_MODULE.to_vec();
        bytes.extend([0x0c, 0x01, 0x02]); // DataCount = 2
        bytes.extend([0x0b, 0x01, 0x00]); // Data section with zero segments
        let err = parse(&bytes, &Features::all()).unwrap_err();
        assert!(err.message.contains("data count and data section"));
    }

    #[test]
    fn lazy_section_iterator_reports_frames() {
        let mut bytes = EMPTY_MODULE.to_vec();
        bytes.extend([0x01, 0x04, 0x01, 0x60, 0x00, 0x00]);
        let frames: Vec<_> = SectionIterator::new(&bytes)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].id, SectionId::Type);
        assert_eq!(frames[0].payload(), &[0x01, 0x60, 0x00, 0x00]);
        assert_eq!(frames[0].range.start, 10);
    }
}
