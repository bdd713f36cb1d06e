//! Error model for the toolkit.
//!
//! Two kinds of failure exist, matching the WebAssembly standard's
//! terminology:
//!
//! - **Malformed**: the byte stream cannot be parsed (bad LEB128, truncated
//!   input, unknown opcode, bad magic). Reported by the readers.
//! - **Invalid**: the structure parses but violates static semantics (type
//!   mismatch, unknown index, section order). Reported by the validator.
//!
//! Errors are values, not control flow. Readers yield them as `Err` items and
//! keep the enclosing sequence honest; the validator reports every finding
//! through an [`ErrorSink`] and returns a plain `bool`. Callers decide
//! whether a diagnostic is fatal.

use std::fmt;

/// Standard distinction between "does not parse" and "parses but violates
/// static semantics".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Malformed,
    Invalid,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Malformed => write!(f, "malformed"),
            ErrorKind::Invalid => write!(f, "invalid"),
        }
    }
}

/// A single diagnostic, with the byte offset it was observed at when one is
/// available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WasmError {
    pub kind: ErrorKind,
    pub offset: Option<usize>,
    pub message: String,
}

impl WasmError {
    pub fn malformed(offset: usize, message: impl Into<String>) -> WasmError {
        WasmError {
            kind: ErrorKind::Malformed,
            offset: Some(offset),
            message: message.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> WasmError {
        WasmError {
            kind: ErrorKind::Invalid,
            offset: None,
            message: message.into(),
        }
    }

    pub fn invalid_at(offset: usize, message: impl Into<String>) -> WasmError {
        WasmError {
            kind: ErrorKind::Invalid,
            offset: Some(offset),
            message: message.into(),
        }
    }
}

impl fmt::Display for WasmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.offset {
            Some(offset) => write!(f, "0x{:08x}: {}", offset, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for WasmError {}

/// Receiver for diagnostics.
///
/// The sink is caller-provided; readers and the validator never abort on a
/// report. `push_context`/`pop_context` bracket nested work ("function 3",
/// "element segment 0") so that reports carry their surroundings.
pub trait ErrorSink {
    fn on_error(&mut self, error: WasmError);

    fn push_context(&mut self, _desc: String) {}

    fn pop_context(&mut self) {}
}

/// Accumulating sink. The default choice for library callers and tests.
#[derive(Debug, Default)]
pub struct ErrorList {
    errors: Vec<WasmError>,
    contexts: Vec<String>,
}

impl ErrorList {
    pub fn new() -> ErrorList {
        ErrorList::default()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WasmError> {
        self.errors.iter()
    }

    pub fn into_vec(self) -> Vec<WasmError> {
        self.errors
    }

    /// True if any accumulated error has the given kind.
    pub fn has_kind(&self, kind: ErrorKind) -> bool {
        self.errors.iter().any(|e| e.kind == kind)
    }
}

impl ErrorSink for ErrorList {
    fn on_error(&mut self, mut error: WasmError) {
        if !self.contexts.is_empty() {
            error.message = format!("{}: {}", self.contexts.join(": "), error.message);
        }
        self.errors.push(error);
    }

    fn push_context(&mut self, desc: String) {
        self.contexts.push(desc);
    }

    fn pop_context(&mut self) {
        self.contexts.pop();
    }
}

/// Sink that prints each diagnostic to stderr as it arrives. Used by the
/// command-line tools.
#[derive(Debug, Default)]
pub struct PrintingErrors {
    count: usize,
    contexts: Vec<String>,
}

impl PrintingErrors {
    pub fn new() -> PrintingErrors {
        PrintingErrors::default()
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

impl ErrorSink for PrintingErrors {
    fn on_error(&mut self, error: WasmError) {
        self.count += 1;
        if self.contexts.is_empty() {
            eprintln!("{error}");
        } else {
            eprintln!("{}: {}", self.contexts.join(": "), error);
        }
    }

    fn push_context(&mut self, desc: String) {
        self.contexts.push(desc);
    }

    fn pop_context(&mut self) {
        self.contexts.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_with_offset() {
        let err = WasmError::malformed(0x2a, "bad version");
        assert_eq!(format!("{err}"), "0x0000002a: bad version");
    }

    #[test]
    fn display_without_offset() {
        let err = WasmError::invalid("duplicate export name: f");
        assert_eq!(format!("{err}"), "duplicate export name: f");
    }

    #[test]
    fn list_applies_context() {
        let mut errors = ErrorList::new();
        errors.push_context("function 3".to_string());
        errors.on_error(WasmError::invalid("type mismatch"));
        errors.pop_context();
        errors.on_error(WasmError::invalid("unknown table 1"));

        let collected = errors.into_vec();
        assert_eq!(collected[0].message, "function 3: type mismatch");
        assert_eq!(collected[1].message, "unknown table 1");
    }

    #[test]
    fn has_kind_distinguishes() {
        let mut errors = ErrorList::new();
        errors.on_error(WasmError::malformed(0, "truncated"));
        assert!(errors.has_kind(ErrorKind::Malformed));
        assert!(!errors.has_kind(ErrorKind::Invalid));
    }
}
