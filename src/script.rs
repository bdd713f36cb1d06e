//! Structural model of conformance-suite scripts.
//!
//! A script is a sequence of commands: module definitions, registrations
//! for cross-module imports, bare actions, and assertions about behaviour
//! (`assert_return`, `assert_trap`, `assert_malformed`, ...). This crate
//! consumes scripts in already-structured form; the text front-end that
//! produces them is an external collaborator.
//!
//! [`check`] runs the *static* half of a script against the decoder and
//! validator: `assert_malformed` and `assert_invalid` expectations are
//! verified for binary modules, and everything requiring execution or
//! linking is reported as skipped.

use std::fmt;

use crate::error::{ErrorKind, ErrorList, ErrorSink};
use crate::features::Features;
use crate::parser;
use crate::valid;

/// A whole script.
#[derive(Debug, Default)]
pub struct Script {
    pub commands: Vec<Command>,
}

/// How a module is provided in a script.
#[derive(Debug, Clone)]
pub enum ScriptModule {
    /// Raw binary bytes: `(module binary "...")` or a pre-assembled module.
    Binary(Vec<u8>),
    /// Quoted text source: `(module quote "...")`. Requires the external
    /// text parser to process.
    Quote(String),
}

/// An expected or provided constant value.
///
/// Floats distinguish exact bit patterns from the `nan:canonical` /
/// `nan:arithmetic` classes used by the conformance suite.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptValue {
    I32(i32),
    I64(i64),
    F32(FloatValue<u32>),
    F64(FloatValue<u64>),
    V128([u8; 16]),
    RefNull,
    RefExtern(u32),
    RefFunc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatValue<T> {
    Bits(T),
    CanonicalNan,
    ArithmeticNan,
}

impl<T: fmt::LowerHex> fmt::Display for FloatValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FloatValue::Bits(bits) => write!(f, "0x{bits:x}"),
            FloatValue::CanonicalNan => f.write_str("nan:canonical"),
            FloatValue::ArithmeticNan => f.write_str("nan:arithmetic"),
        }
    }
}

impl fmt::Display for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptValue::I32(v) => write!(f, "{v}"),
            ScriptValue::I64(v) => write!(f, "{v}"),
            ScriptValue::F32(v) => write!(f, "{v}"),
            ScriptValue::F64(v) => write!(f, "{v}"),
            ScriptValue::V128(bytes) => {
                write!(f, "0x")?;
                for byte in bytes.iter().rev() {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
            ScriptValue::RefNull => f.write_str("ref.null"),
            ScriptValue::RefExtern(v) => write!(f, "ref.extern {v}"),
            ScriptValue::RefFunc => f.write_str("ref.func"),
        }
    }
}

/// Something a script can do to a registered module.
#[derive(Debug, Clone)]
pub enum Action {
    Invoke {
        module: Option<String>,
        field: String,
        args: Vec<ScriptValue>,
    },
    Get {
        module: Option<String>,
        field: String,
    },
}

/// A top-level script command.
#[derive(Debug)]
pub enum Command {
    /// Define a module, optionally named for later reference.
    Module {
        name: Option<String>,
        module: ScriptModule,
    },

    /// Register the most recent (or named) module for imports.
    Register {
        as_name: String,
        module_name: Option<String>,
    },

    /// Top-level action without an assertion.
    Action(Action),

    /// Assert that an action returns the expected values.
    AssertReturn {
        action: Action,
        expected: Vec<ScriptValue>,
    },

    /// Assert that an action traps with the given message.
    AssertTrap { action: Action, message: String },

    /// Assert that an action exhausts resources.
    AssertExhaustion { action: Action, message: String },

    /// Assert that a module fails to decode.
    AssertMalformed {
        module: ScriptModule,
        message: String,
    },

    /// Assert that a module decodes but fails validation.
    AssertInvalid {
        module: ScriptModule,
        message: String,
    },

    /// Assert that a module fails import resolution.
    AssertUnlinkable {
        module: ScriptModule,
        message: String,
    },

    /// Assert that module instantiation traps.
    AssertUninstantiable {
        module: ScriptModule,
        message: String,
    },
}

/// Outcome of statically checking one command.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Failed(String),
    Skipped(&'static str),
}

/// Results of a [`check`] run, indexed by command position.
#[derive(Debug, Default)]
pub struct CheckReport {
    pub outcomes: Vec<Outcome>,
}

impl CheckReport {
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| **o == Outcome::Passed).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, Outcome::Failed(_)))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, Outcome::Skipped(_)))
            .count()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }
}

/// Run the static half of a script: decode and validate every module, and
/// verify `assert_malformed` / `assert_invalid` expectations. Failures are
/// also reported to `errors`.
pub fn check(script: &Script, features: &Features, errors: &mut dyn ErrorSink) -> CheckReport {
    let mut report = CheckReport::default();
    for (index, command) in script.commands.iter().enumerate() {
        let outcome = check_command(command, features);
        if let Outcome::Failed(reason) = &outcome {
            errors.on_error(crate::error::WasmError::invalid(format!(
                "command {index}: {reason}"
            )));
        }
        report.outcomes.push(outcome);
    }
    report
}

fn check_command(command: &Command, features: &Features) -> Outcome {
    match command {
        Command::Module { module, .. } => match module {
            ScriptModule::Binary(bytes) => {
                let module = match parser::parse(bytes, features) {
                    Ok(module) => module,
                    Err(e) => return Outcome::Failed(format!("module does not decode: {e}")),
                };
                let mut diagnostics = ErrorList::new();
                if valid::validate(&module, features, &mut diagnostics) {
                    Outcome::Passed
                } else {
                    let first = diagnostics
                        .iter()
                        .next()
                        .map(|e| e.to_string())
                        .unwrap_or_default();
                    Outcome::Failed(format!("module does not validate: {first}"))
                }
            }
            ScriptModule::Quote(_) => Outcome::Skipped("requires the text parser"),
        },

        Command::AssertMalformed { module, .. } => match module {
            ScriptModule::Binary(bytes) => match parser::parse(bytes, features) {
                Err(e) if e.kind == ErrorKind::Malformed => Outcome::Passed,
                Err(e) => Outcome::Failed(format!(
                    "expected a malformed module, got an invalid one: {e}"
                )),
                Ok(_) => Outcome::Failed("expected a malformed module, but it decodes".to_string()),
            },
            ScriptModule::Quote(_) => Outcome::Skipped("requires the text parser"),
        },

        Command::AssertInvalid { module, .. } => match module {
            ScriptModule::Binary(bytes) => match parser::parse(bytes, features) {
                Err(e) if e.kind == ErrorKind::Invalid => Outcome::Passed,
                Err(e) => Outcome::Failed(format!(
                    "expected an invalid module, got a malformed one: {e}"
                )),
                Ok(module) => {
                    let mut diagnostics = ErrorList::new();
                    if valid::validate(&module, features, &mut diagnostics) {
                        Outcome::Failed(
                            "expected an invalid module, but it validates".to_string(),
                        )
                    } else {
                        Outcome::Passed
                    }
                }
            },
            ScriptModule::Quote(_) => Outcome::Skipped("requires the text parser"),
        },

        Command::Register { .. } => Outcome::Skipped("requires linking"),
        Command::AssertUnlinkable { .. } => Outcome::Skipped("requires linking"),
        Command::Action(_)
        | Command::AssertReturn { .. }
        | Command::AssertTrap { .. }
        | Command::AssertExhaustion { .. }
        | Command::AssertUninstantiable { .. } => Outcome::Skipped("requires execution"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trivial_module() -> Vec<u8> {
        let mut bytes = b"\0asm\x01\x00\x00\x00".to_vec();
        bytes.extend([0x01, 0x04, 0x01, 0x60, 0x00, 0x00]);
        bytes.extend([0x03, 0x02, 0x01, 0x00]);
        bytes.extend([0x0a, 0x04, 0x01, 0x02, 0x00, 0x0b]);
        bytes
    }

    fn bad_version_module() -> Vec<u8> {
        vec![0x00, 0x61, 0x73, 0x6d, 0x02, 0x00, 0x00, 0x00]
    }

    fn invalid_module() -> Vec<u8> {
        // Function of type [] -> [i32] whose body yields i64.
        let mut bytes = b"\0asm\x01\x00\x00\x00".to_vec();
        bytes.extend([0x01, 0x05, 0x01, 0x60, 0x00, 0x01, 0x7f]);
        bytes.extend([0x03, 0x02, 0x01, 0x00]);
        bytes.extend([0x0a, 0x06, 0x01, 0x04, 0x00, 0x42, 0x00, 0x0b]);
        bytes
    }

    #[test]
    fn module_and_static_asserts() {
        let script = Script {
            commands: vec![
                Command::Module {
                    name: None,
                    module: ScriptModule::Binary(trivial_module()),
                },
                Command::AssertMalformed {
                    module: ScriptModule::Binary(bad_version_module()),
                    message: "bad version".to_string(),
                },
                Command::AssertInvalid {
                    module: ScriptModule::Binary(invalid_module()),
                    message: "type mismatch".to_string(),
                },
                Command::AssertReturn {
                    action: Action::Invoke {
                        module: None,
                        field: "f".to_string(),
                        args: vec![],
                    },
                    expected: vec![ScriptValue::I32(1)],
                },
            ],
        };
        let mut errors = ErrorList::new();
        let report = check(&script, &Features::all(), &mut errors);
        assert_eq!(report.outcomes[0], Outcome::Passed);
        assert_eq!(report.outcomes[1], Outcome::Passed);
        assert_eq!(report.outcomes[2], Outcome::Passed);
        assert!(matches!(report.outcomes[3], Outcome::Skipped(_)));
        assert!(report.all_passed());
        assert!(errors.is_empty());
    }

    #[test]
    fn wrong_expectations_fail() {
        let script = Script {
            commands: vec![
                Command::AssertMalformed {
                    module: ScriptModule::Binary(trivial_module()),
                    message: "anything".to_string(),
                },
                Command::AssertInvalid {
                    module: ScriptModule::Binary(trivial_module()),
                    message: "anything".to_string(),
                },
            ],
        };
        let mut errors = ErrorList::new();
        let report = check(&script, &Features::all(), &mut errors);
        assert_eq!(report.failed(), 2);
        assert!(!report.all_passed());
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn quoted_modules_are_skipped() {
        let script = Script {
            commands: vec![Command::Module {
                name: None,
                module: ScriptModule::Quote("(module)".to_string()),
            }],
        };
        let mut errors = ErrorList::new();
        let report = check(&script, &Features::all(), &mut errors);
        assert_eq!(report.skipped(), 1);
    }

    #[test]
    fn value_spellings() {
        assert_eq!(ScriptValue::RefExtern(3).to_string(), "ref.extern 3");
        assert_eq!(ScriptValue::RefNull.to_string(), "ref.null");
        assert_eq!(
            ScriptValue::F32(FloatValue::CanonicalNan).to_string(),
            "nan:canonical"
        );
        assert_eq!(
            ScriptValue::F64(FloatValue::ArithmeticNan).to_string(),
            "nan:arithmetic"
        );
    }
}
