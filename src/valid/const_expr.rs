//! Validation of constant expressions.
//!
//! Global initialisers, active-segment offsets and element expressions are a
//! restricted stack machine: only `*.const`, `global.get` of an imported
//! immutable global, `ref.null` and `ref.func` may appear, and the sequence
//! must produce exactly one value of the expected type before its `end`.

use crate::error::WasmError;
use crate::module::Module;
use crate::parser::instruction::{Immediate, Instruction, Opcode};
use crate::types::ValueType;

/// Validate `instructions` (including the trailing `end`) as a constant
/// expression producing one value of type `expected`.
pub fn validate_const_expression(
    module: &Module,
    instructions: &[Instruction],
    expected: ValueType,
) -> Result<(), WasmError> {
    let mut stack: Vec<ValueType> = Vec::new();
    let mut ended = false;

    for inst in instructions {
        let offset = inst.position.offset;
        if ended {
            return Err(WasmError::invalid_at(
                offset,
                "constant expression continues after end",
            ));
        }
        match inst.opcode {
            Opcode::I32Const => stack.push(ValueType::I32),
            Opcode::I64Const => stack.push(ValueType::I64),
            Opcode::F32Const => stack.push(ValueType::F32),
            Opcode::F64Const => stack.push(ValueType::F64),
            Opcode::V128Const => stack.push(ValueType::V128),
            Opcode::GlobalGet => {
                let Immediate::Index(idx) = inst.immediate else {
                    unreachable!("shape checked by the decoder");
                };
                if idx >= module.num_imported_globals() {
                    return Err(WasmError::invalid_at(
                        offset,
                        format!("constant expression may only reference imported globals, got global {idx}"),
                    ));
                }
                let gt = module.global_type(idx).ok_or_else(|| {
                    WasmError::invalid_at(offset, format!("global index {idx} out of range"))
                })?;
                if gt.mutable {
                    return Err(WasmError::invalid_at(
                        offset,
                        format!("constant expression may not reference mutable global {idx}"),
                    ));
                }
                stack.push(gt.value_type);
            }
            Opcode::RefNull => {
                let Immediate::RefType(rt) = inst.immediate else {
                    unreachable!("shape checked by the decoder");
                };
                stack.push(rt.into());
            }
            Opcode::RefFunc => {
                let Immediate::Index(idx) = inst.immediate else {
                    unreachable!("shape checked by the decoder");
                };
                if idx >= module.num_funcs() {
                    return Err(WasmError::invalid_at(
                        offset,
                        format!("function index {idx} out of range"),
                    ));
                }
                stack.push(ValueType::FuncRef);
            }
            Opcode::End => ended = true,
            op => {
                return Err(WasmError::invalid_at(
                    offset,
                    format!("opcode {} is not valid in a constant expression", op.mnemonic()),
                ));
            }
        }
    }

    let last_offset = instructions
        .last()
        .map(|i| i.position.offset)
        .unwrap_or_default();
    if !ended {
        return Err(WasmError::invalid_at(
            last_offset,
            "constant expression must be terminated by end",
        ));
    }
    match stack.as_slice() {
        [t] if *t == expected => Ok(()),
        [t] => Err(WasmError::invalid_at(
            last_offset,
            format!("type mismatch in constant expression: expected {expected}, got {t}"),
        )),
        [] => Err(WasmError::invalid_at(
            last_offset,
            "constant expression produces no value",
        )),
        values => Err(WasmError::invalid_at(
            last_offset,
            format!(
                "constant expression must produce exactly one value, got {}",
                values.len()
            ),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::Features;
    use crate::module::{Import, ImportDesc};
    use crate::parser::instruction::ExpressionReader;
    use crate::parser::reader::Reader;
    use crate::types::{At, GlobalType};

    fn decode(bytes: &[u8]) -> Vec<Instruction> {
        let features = Features::all();
        let mut reader = Reader::new(bytes);
        ExpressionReader::new(&mut reader, &features)
            .read_all()
            .unwrap()
    }

    fn module_with_imported_global(mutable: bool) -> Module {
        let mut module = Module::new();
        module.imports.push(At::new(
            Import {
                module: "env".to_string(),
                name: "g".to_string(),
                desc: ImportDesc::Global(GlobalType {
                    value_type: ValueType::I32,
                    mutable,
                }),
            },
            0,
        ));
        module
    }

    #[test]
    fn const_of_matching_type_is_valid() {
        let module = Module::new();
        validate_const_expression(&module, &decode(&[0x41, 0x2a, 0x0b]), ValueType::I32).unwrap();
        validate_const_expression(&module, &decode(&[0x42, 0x00, 0x0b]), ValueType::I64).unwrap();
    }

    #[test]
    fn const_of_wrong_type_is_invalid() {
        let module = Module::new();
        let err =
            validate_const_expression(&module, &decode(&[0x42, 0x00, 0x0b]), ValueType::I32)
                .unwrap_err();
        assert!(err.message.contains("expected i32, got i64"));
    }

    #[test]
    fn non_constant_opcode_is_rejected() {
        let module = Module::new();
        // i32.const 1; i32.const 2; i32.add; end
        let err = validate_const_expression(
            &module,
            &decode(&[0x41, 0x01, 0x41, 0x02, 0x6a, 0x0b]),
            ValueType::I32,
        )
        .unwrap_err();
        assert!(err.message.contains("i32.add is not valid in a constant expression"));
    }

    #[test]
    fn global_get_of_imported_immutable_is_valid() {
        let module = module_with_imported_global(false);
        validate_const_expression(&module, &decode(&[0x23, 0x00, 0x0b]), ValueType::I32).unwrap();
    }

    #[test]
    fn global_get_of_mutable_import_is_invalid() {
        let module = module_with_imported_global(true);
        let err = validate_const_expression(&module, &decode(&[0x23, 0x00, 0x0b]), ValueType::I32)
            .unwrap_err();
        assert!(err.message.contains("mutable global"));
    }

    #[test]
    fn global_get_of_defined_global_is_invalid() {
        // Global 0 is locally defined, not imported.
        let mut module = Module::new();
        module.globals.push(At::new(
            crate::module::Global {
                global_type: GlobalType {
                    value_type: ValueType::I32,
                    mutable: false,
                },
                init: vec![],
            },
            0,
        ));
        let err = validate_const_expression(&module, &decode(&[0x23, 0x00, 0x0b]), ValueType::I32)
            .unwrap_err();
        assert!(err.message.contains("imported globals"));
    }

    #[test]
    fn ref_null_and_ref_func_are_constant() {
        let mut module = Module::new();
        module.types.push(At::new(Default::default(), 0));
        module.functions.push(At::new(0, 0));
        module.code.push(At::new(
            crate::module::FunctionBody {
                locals: vec![],
                instructions: vec![],
                position: Default::default(),
            },
            0,
        ));
        validate_const_expression(&module, &decode(&[0xd0, 0x70, 0x0b]), ValueType::FuncRef)
            .unwrap();
        validate_const_expression(&module, &decode(&[0xd2, 0x00, 0x0b]), ValueType::FuncRef)
            .unwrap();
        let err =
            validate_const_expression(&module, &decode(&[0xd2, 0x05, 0x0b]), ValueType::FuncRef)
                .unwrap_err();
        assert!(err.message.contains("function index 5 out of range"));
    }

    #[test]
    fn empty_expression_produces_no_value() {
        let module = Module::new();
        let err = validate_const_expression(&module, &decode(&[0x0b]), ValueType::I32).unwrap_err();
        assert!(err.message.contains("produces no value"));
    }

    #[test]
    fn two_values_are_rejected() {
        let module = Module::new();
        let err = validate_const_expression(
            &module,
            &decode(&[0x41, 0x01, 0x41, 0x02, 0x0b]),
            ValueType::I32,
        )
        .unwrap_err();
        assert!(err.message.contains("exactly one value"));
    }
}
