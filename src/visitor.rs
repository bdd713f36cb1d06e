//! Single-pass visitor over the lazy module layers.
//!
//! Drives [`crate::parser::SectionIterator`] and the typed entry readers
//! once, dispatching one callback per section and one per entry, in declared
//! order. Known sections arriving out of order are rejected before their
//! callback fires. A callback returning an error stops the traversal
//! immediately; malformed entries are reported to the sink and the walk
//! resumes at the next section.

use crate::error::{ErrorSink, WasmError};
use crate::features::{Feature, Features};
use crate::module::{
    CustomSection, DataSegment, ElementSegment, Export, FunctionBody, Global, Import,
};
use crate::parser::{sections, Section, SectionId, SectionIterator, SectionOrder};
use crate::types::{At, EventType, FunctionType, MemoryType, TableType};

pub type VisitResult = Result<(), WasmError>;

/// Callbacks for one traversal. Every method defaults to "keep going".
#[allow(unused_variables)]
pub trait ModuleVisitor {
    fn begin_module(&mut self) -> VisitResult {
        Ok(())
    }

    /// Called for every section frame before its entries.
    fn begin_section(&mut self, section: &Section<'_>) -> VisitResult {
        Ok(())
    }

    fn on_type(&mut self, index: u32, ft: &At<FunctionType>) -> VisitResult {
        Ok(())
    }

    fn on_import(&mut self, index: u32, import: &At<Import>) -> VisitResult {
        Ok(())
    }

    fn on_function(&mut self, index: u32, type_idx: &At<u32>) -> VisitResult {
        Ok(())
    }

    fn on_table(&mut self, index: u32, table: &At<TableType>) -> VisitResult {
        Ok(())
    }

    fn on_memory(&mut self, index: u32, memory: &At<MemoryType>) -> VisitResult {
        Ok(())
    }

    fn on_event(&mut self, index: u32, event: &At<EventType>) -> VisitResult {
        Ok(())
    }

    fn on_global(&mut self, index: u32, global: &At<Global>) -> VisitResult {
        Ok(())
    }

    fn on_export(&mut self, index: u32, export: &At<Export>) -> VisitResult {
        Ok(())
    }

    fn on_start(&mut self, func_idx: &At<u32>) -> VisitResult {
        Ok(())
    }

    fn on_element(&mut self, index: u32, segment: &At<ElementSegment>) -> VisitResult {
        Ok(())
    }

    fn on_data_count(&mut self, count: &At<u32>) -> VisitResult {
        Ok(())
    }

    fn on_code(&mut self, index: u32, body: &At<FunctionBody>) -> VisitResult {
        Ok(())
    }

    fn on_data(&mut self, index: u32, segment: &At<DataSegment>) -> VisitResult {
        Ok(())
    }

    fn on_custom(&mut self, section: &At<CustomSection>) -> VisitResult {
        Ok(())
    }

    fn end_module(&mut self) -> VisitResult {
        Ok(())
    }
}

enum Step {
    Continue,
    Stop,
}

/// Traverse `bytes` once, reporting diagnostics to `errors`.
///
/// Returns `true` when the whole module was visited without any diagnostic
/// and no callback failed.
pub fn visit<V: ModuleVisitor>(
    bytes: &[u8],
    features: &Features,
    visitor: &mut V,
    errors: &mut dyn ErrorSink,
) -> bool {
    match drive(bytes, features, visitor, errors) {
        Ok(clean) => clean,
        Err(e) => {
            errors.on_error(e);
            false
        }
    }
}

fn drive<V: ModuleVisitor>(
    bytes: &[u8],
    features: &Features,
    visitor: &mut V,
    errors: &mut dyn ErrorSink,
) -> Result<bool, WasmError> {
    let mut clean = true;
    let mut order = SectionOrder::new();

    visitor.begin_module()?;

    let mut section_iter = SectionIterator::new(bytes)?;
    for section in &mut section_iter {
        let section = match section {
            Ok(section) => section,
            Err(e) => {
                errors.on_error(e);
                return Ok(false);
            }
        };
        if let Err(e) = order.check(section.id, section.range.start as usize) {
            errors.on_error(e);
            return Ok(false);
        }
        visitor.begin_section(&section)?;
        match visit_section(&section, features, visitor, errors)? {
            Step::Continue => {}
            Step::Stop => clean = false,
        }
    }

    visitor.end_module()?;
    Ok(clean)
}

/// Walk one section's entries. Returns `Step::Stop` when a malformed entry
/// was reported (the reader has already resynchronised to the section end).
fn visit_section<V: ModuleVisitor>(
    section: &Section<'_>,
    features: &Features,
    visitor: &mut V,
    errors: &mut dyn ErrorSink,
) -> Result<Step, WasmError> {
    macro_rules! walk {
        ($entries:expr, $callback:ident) => {{
            let entries = $entries;
            let mut index = 0u32;
            for entry in entries {
                match entry {
                    Ok(entry) => visitor.$callback(index, &entry)?,
                    Err(e) => {
                        errors.on_error(e);
                        return Ok(Step::Stop);
                    }
                }
                index += 1;
            }
            Ok(Step::Continue)
        }};
    }

    match section.id {
        SectionId::Custom => {
            let entry = sections::custom_entry(section)?;
            visitor.on_custom(&entry)?;
            Ok(Step::Continue)
        }
        SectionId::Type => walk!(sections::type_entries(section, features)?, on_type),
        SectionId::Import => walk!(sections::import_entries(section, features)?, on_import),
        SectionId::Function => walk!(sections::function_entries(section, features)?, on_function),
        SectionId::Table => walk!(sections::table_entries(section, features)?, on_table),
        SectionId::Memory => walk!(sections::memory_entries(section, features)?, on_memory),
        SectionId::Event => {
            if !features.contains(Feature::Exceptions) {
                return Err(WasmError::malformed(
                    section.range.start as usize,
                    "event section requires the exceptions feature",
                ));
            }
            walk!(sections::event_entries(section, features)?, on_event)
        }
        SectionId::Global => walk!(sections::global_entries(section, features)?, on_global),
        SectionId::Export => walk!(sections::export_entries(section, features)?, on_export),
        SectionId::Start => {
            let entry = sections::start_entry(section)?;
            visitor.on_start(&entry)?;
            Ok(Step::Continue)
        }
        SectionId::Element => walk!(sections::element_entries(section, features)?, on_element),
        SectionId::DataCount => {
            let entry = sections::data_count_entry(section, features)?;
            visitor.on_data_count(&entry)?;
            Ok(Step::Continue)
        }
        SectionId::Code => walk!(sections::code_entries(section, features)?, on_code),
        SectionId::Data => walk!(sections::data_entries(section, features)?, on_data),
    }
}
