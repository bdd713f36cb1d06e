//! Stack-typing validation of function bodies.
//!
//! The algorithm simulates the operand stack and a stack of control frames
//! through the instruction sequence. A frame records the types at its entry
//! (`height`) and becomes polymorphic when `unreachable` is set: dead code
//! then typechecks by materialising `Unknown` values instead of failing,
//! exactly as the specification's appendix algorithm prescribes.

use std::fmt;

use crate::error::WasmError;
use crate::module::Module;
use crate::parser::instruction::{Immediate, Instruction, MemArg, Opcode};
use crate::types::{BlockType, FunctionType, ValueType};

use super::ValidationContext;

/// A value-stack slot: a concrete type, or the polymorphic bottom produced
/// by unreachable code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaybeValue {
    Val(ValueType),
    Unknown,
}

impl MaybeValue {
    fn is_num(self) -> bool {
        match self {
            MaybeValue::Val(v) => v.is_num() || v.is_vec(),
            MaybeValue::Unknown => true,
        }
    }

    fn is_ref(self) -> bool {
        match self {
            MaybeValue::Val(v) => v.is_ref(),
            MaybeValue::Unknown => true,
        }
    }

    fn unifies_with(self, other: MaybeValue) -> bool {
        self == other || self == MaybeValue::Unknown || other == MaybeValue::Unknown
    }
}

impl fmt::Display for MaybeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaybeValue::Val(v) => v.fmt(f),
            MaybeValue::Unknown => f.write_str("unknown"),
        }
    }
}

fn vals(types: &[ValueType]) -> Vec<MaybeValue> {
    types.iter().map(|t| MaybeValue::Val(*t)).collect()
}

struct CtrlFrame {
    opcode: Opcode,
    start_types: Vec<MaybeValue>,
    end_types: Vec<MaybeValue>,
    height: usize,
    unreachable: bool,
    /// Locals prepended by a `let` frame, removed again at its `end`.
    let_locals: usize,
}

impl CtrlFrame {
    /// The types a branch to this frame's label carries: a loop's label is
    /// its entry, every other label is its exit.
    fn label_types(&self) -> &[MaybeValue] {
        if self.opcode == Opcode::Loop {
            &self.start_types
        } else {
            &self.end_types
        }
    }
}

/// Validator for a single function body (or standalone expression).
pub struct FuncValidator<'m> {
    module: &'m Module,
    ctx: &'m ValidationContext,
    func_type: &'m FunctionType,
    locals: Vec<ValueType>,
    vals: Vec<MaybeValue>,
    ctrls: Vec<CtrlFrame>,
}

impl<'m> FuncValidator<'m> {
    pub fn new(
        module: &'m Module,
        ctx: &'m ValidationContext,
        func_type: &'m FunctionType,
        locals: Vec<ValueType>,
    ) -> FuncValidator<'m> {
        let mut all_locals = func_type.params.clone();
        all_locals.extend(locals);
        let mut v = FuncValidator {
            module,
            ctx,
            func_type,
            locals: all_locals,
            vals: Vec::new(),
            ctrls: Vec::new(),
        };
        // The implicit function frame: branching to it is `return`.
        v.push_ctrl(Opcode::Block, Vec::new(), vals(&func_type.results), 0);
        v
    }

    /// True once the implicit function frame has been popped by the final
    /// `end`.
    pub fn ended(&self) -> bool {
        self.ctrls.is_empty()
    }

    pub fn finish(&self, offset: usize) -> Result<(), WasmError> {
        if !self.ended() {
            return Err(WasmError::invalid_at(
                offset,
                format!("{} unclosed blocks at end of function body", self.ctrls.len()),
            ));
        }
        Ok(())
    }

    // Core stack operations ---------------------------------------------------

    fn push_val(&mut self, val: MaybeValue) {
        self.vals.push(val);
    }

    fn push_vals(&mut self, values: &[MaybeValue]) {
        self.vals.extend_from_slice(values);
    }

    fn pop_val(&mut self, offset: usize) -> Result<MaybeValue, WasmError> {
        let frame = self
            .ctrls
            .last()
            .ok_or_else(|| WasmError::invalid_at(offset, "instruction after function end"))?;
        if self.vals.len() <= frame.height {
            if frame.unreachable {
                return Ok(MaybeValue::Unknown);
            }
            return Err(WasmError::invalid_at(
                offset,
                "type mismatch: expected a value on the stack, found nothing",
            ));
        }
        Ok(self.vals.pop().expect("stack is above frame height"))
    }

    fn pop_expected(&mut self, expected: MaybeValue, offset: usize) -> Result<MaybeValue, WasmError> {
        let actual = self.pop_val(offset)?;
        if !actual.unifies_with(expected) {
            return Err(WasmError::invalid_at(
                offset,
                format!("type mismatch: expected {expected}, got {actual}"),
            ));
        }
        Ok(actual)
    }

    fn pop_type(&mut self, expected: ValueType, offset: usize) -> Result<MaybeValue, WasmError> {
        self.pop_expected(MaybeValue::Val(expected), offset)
    }

    /// Pop a list of expected types (last element popped first). The
    /// returned values are in the same order as `expected`.
    fn pop_expecteds(
        &mut self,
        expected: &[MaybeValue],
        offset: usize,
    ) -> Result<Vec<MaybeValue>, WasmError> {
        let mut popped = Vec::with_capacity(expected.len());
        for want in expected.iter().rev() {
            popped.push(self.pop_expected(*want, offset)?);
        }
        popped.reverse();
        Ok(popped)
    }

    fn push_ctrl(
        &mut self,
        opcode: Opcode,
        start_types: Vec<MaybeValue>,
        end_types: Vec<MaybeValue>,
        let_locals: usize,
    ) {
        let height = self.vals.len();
        self.vals.extend_from_slice(&start_types);
        self.ctrls.push(CtrlFrame {
            opcode,
            start_types,
            end_types,
            height,
            unreachable: false,
            let_locals,
        });
    }

    fn pop_ctrl(&mut self, offset: usize) -> Result<CtrlFrame, WasmError> {
        let end_types = match self.ctrls.last() {
            Some(frame) => frame.end_types.clone(),
            None => {
                return Err(WasmError::invalid_at(offset, "end with no open block"));
            }
        };
        self.pop_expecteds(&end_types, offset)?;
        let frame = self.ctrls.last().expect("checked above");
        if self.vals.len() != frame.height {
            return Err(WasmError::invalid_at(
                offset,
                format!(
                    "type mismatch: {} extra values on the stack at end of block",
                    self.vals.len() - frame.height
                ),
            ));
        }
        let frame = self.ctrls.pop().expect("checked above");
        if frame.let_locals > 0 {
            self.locals.drain(0..frame.let_locals);
        }
        Ok(frame)
    }

    fn set_unreachable(&mut self) {
        let frame = self.ctrls.last_mut().expect("frame exists while validating");
        self.vals.truncate(frame.height);
        frame.unreachable = true;
    }

    // Lookups -----------------------------------------------------------------

    fn label(&self, depth: u32, offset: usize) -> Result<Vec<MaybeValue>, WasmError> {
        let depth = depth as usize;
        if depth >= self.ctrls.len() {
            return Err(WasmError::invalid_at(
                offset,
                format!("label index {depth} out of range"),
            ));
        }
        Ok(self.ctrls[self.ctrls.len() - 1 - depth].label_types().to_vec())
    }

    fn local(&self, idx: u32, offset: usize) -> Result<ValueType, WasmError> {
        self.locals.get(idx as usize).copied().ok_or_else(|| {
            WasmError::invalid_at(offset, format!("local index {idx} out of range"))
        })
    }

    fn func_type_of(&self, func_idx: u32, offset: usize) -> Result<&'m FunctionType, WasmError> {
        if func_idx >= self.module.num_funcs() {
            return Err(WasmError::invalid_at(
                offset,
                format!("function index {func_idx} out of range"),
            ));
        }
        self.module.func_type(func_idx).ok_or_else(|| {
            WasmError::invalid_at(
                offset,
                format!("type index of function {func_idx} out of range"),
            )
        })
    }

    fn type_at(&self, type_idx: u32, offset: usize) -> Result<&'m FunctionType, WasmError> {
        self.module
            .types
            .get(type_idx as usize)
            .map(|at| at.value())
            .ok_or_else(|| {
                WasmError::invalid_at(offset, format!("type index {type_idx} out of range"))
            })
    }

    fn table_at(&self, table_idx: u32, offset: usize) -> Result<crate::types::TableType, WasmError> {
        self.module.table_type(table_idx).ok_or_else(|| {
            WasmError::invalid_at(offset, format!("table index {table_idx} out of range"))
        })
    }

    fn check_memory(&self, memory_idx: u32, offset: usize) -> Result<(), WasmError> {
        if self.module.memory_type(memory_idx).is_none() {
            return Err(WasmError::invalid_at(
                offset,
                format!("memory index {memory_idx} out of range"),
            ));
        }
        Ok(())
    }

    fn block_signature(
        &self,
        block_type: &BlockType,
        offset: usize,
    ) -> Result<(Vec<MaybeValue>, Vec<MaybeValue>), WasmError> {
        match block_type {
            BlockType::Empty => Ok((Vec::new(), Vec::new())),
            BlockType::Value(vt) => Ok((Vec::new(), vec![MaybeValue::Val(*vt)])),
            BlockType::FuncType(idx) => {
                let ft = self.type_at(*idx, offset)?;
                Ok((vals(&ft.params), vals(&ft.results)))
            }
        }
    }

    fn check_alignment(
        &self,
        opcode: Opcode,
        memarg: &MemArg,
        offset: usize,
    ) -> Result<(), WasmError> {
        let natural = opcode
            .natural_alignment()
            .expect("memarg opcodes have a natural alignment");
        if memarg.align > natural {
            return Err(WasmError::invalid_at(
                offset,
                format!(
                    "alignment 2**{} must not be larger than natural alignment 2**{natural}",
                    memarg.align
                ),
            ));
        }
        if opcode.feature() == crate::features::Feature::Threads && memarg.align != natural {
            return Err(WasmError::invalid_at(
                offset,
                "atomic accesses must be naturally aligned",
            ));
        }
        Ok(())
    }

    fn event_params(&self, event_idx: u32, offset: usize) -> Result<Vec<MaybeValue>, WasmError> {
        let event = self.module.event_type(event_idx).ok_or_else(|| {
            WasmError::invalid_at(offset, format!("event index {event_idx} out of range"))
        })?;
        let ft = self.type_at(event.type_idx, offset)?;
        Ok(vals(&ft.params))
    }

    // Instruction dispatch ----------------------------------------------------

    pub fn validate(&mut self, inst: &Instruction) -> Result<(), WasmError> {
        use Opcode::*;
        let offset = inst.position.offset;

        if self.ctrls.is_empty() {
            return Err(WasmError::invalid_at(offset, "instruction after function end"));
        }

        // Memory-access prechecks shared by everything with a memarg.
        match &inst.immediate {
            Immediate::MemArg(memarg) => {
                self.check_memory(0, offset)?;
                self.check_alignment(inst.opcode, memarg, offset)?;
            }
            Immediate::MemArgLane { memarg, lane } => {
                self.check_memory(0, offset)?;
                self.check_alignment(inst.opcode, memarg, offset)?;
                let lanes = inst.opcode.lane_count().expect("lane opcode");
                if *lane >= lanes {
                    return Err(WasmError::invalid_at(
                        offset,
                        format!("lane index {lane} out of range"),
                    ));
                }
            }
            Immediate::SimdLane(lane) => {
                let lanes = inst.opcode.lane_count().expect("lane opcode");
                if *lane >= lanes {
                    return Err(WasmError::invalid_at(
                        offset,
                        format!("lane index {lane} out of range"),
                    ));
                }
            }
            _ => {}
        }

        match inst.opcode {
            Unreachable => {
                self.set_unreachable();
                Ok(())
            }
            Nop => Ok(()),

            Block | Loop | If | Try => {
                let Immediate::Block(bt) = &inst.immediate else {
                    unreachable!("shape checked by the decoder");
                };
                if inst.opcode == If {
                    self.pop_type(ValueType::I32, offset)?;
                }
                let (start_types, end_types) = self.block_signature(bt, offset)?;
                self.pop_expecteds(&start_types, offset)?;
                self.push_ctrl(inst.opcode, start_types, end_types, 0);
                Ok(())
            }

            Let => {
                let Immediate::Let { block_type, locals } = &inst.immediate else {
                    unreachable!("shape checked by the decoder");
                };
                let (start_types, end_types) = self.block_signature(block_type, offset)?;
                let mut new_locals = Vec::new();
                for (count, vt) in locals {
                    for _ in 0..*count {
                        new_locals.push(*vt);
                    }
                }
                // `let` pops one value per new local and makes the locals
                // visible at the front of the index space.
                for vt in new_locals.iter().rev() {
                    self.pop_type(*vt, offset)?;
                }
                self.pop_expecteds(&start_types, offset)?;
                let count = new_locals.len();
                self.locals.splice(0..0, new_locals);
                self.push_ctrl(Opcode::Let, start_types, end_types, count);
                Ok(())
            }

            Else => {
                let frame = self.pop_ctrl(offset)?;
                if frame.opcode != If {
                    return Err(WasmError::invalid_at(offset, "else without a matching if"));
                }
                self.push_ctrl(Else, frame.start_types, frame.end_types, 0);
                Ok(())
            }

            Catch => {
                let frame = self.pop_ctrl(offset)?;
                if frame.opcode != Try {
                    return Err(WasmError::invalid_at(offset, "catch without a matching try"));
                }
                // The catch body starts with the exception packet on the
                // stack.
                self.push_ctrl(
                    Catch,
                    vec![MaybeValue::Val(ValueType::ExnRef)],
                    frame.end_types,
                    0,
                );
                Ok(())
            }

            End => {
                let frame = self.pop_ctrl(offset)?;
                if frame.opcode == If && frame.start_types != frame.end_types {
                    // An if without an else must be a no-op signature, since
                    // the implicit else arm passes the inputs through.
                    return Err(WasmError::invalid_at(
                        offset,
                        "if without else cannot change stack types",
                    ));
                }
                self.push_vals(&frame.end_types);
                Ok(())
            }

            Br => {
                let Immediate::Index(depth) = inst.immediate else {
                    unreachable!("shape checked by the decoder");
                };
                let types = self.label(depth, offset)?;
                self.pop_expecteds(&types, offset)?;
                self.set_unreachable();
                Ok(())
            }

            BrIf => {
                let Immediate::Index(depth) = inst.immediate else {
                    unreachable!("shape checked by the decoder");
                };
                self.pop_type(ValueType::I32, offset)?;
                let types = self.label(depth, offset)?;
                let popped = self.pop_expecteds(&types, offset)?;
                self.push_vals(&popped);
                Ok(())
            }

            BrTable => {
                let Immediate::BrTable { targets, default } = &inst.immediate else {
                    unreachable!("shape checked by the decoder");
                };
                self.pop_type(ValueType::I32, offset)?;
                let default_types = self.label(*default, offset)?;
                for target in targets {
                    let types = self.label(*target, offset)?;
                    if types.len() != default_types.len() {
                        return Err(WasmError::invalid_at(
                            offset,
                            format!(
                                "br_table target arity mismatch: label {target} has {} types, default has {}",
                                types.len(),
                                default_types.len()
                            ),
                        ));
                    }
                    let popped = self.pop_expecteds(&types, offset)?;
                    self.push_vals(&popped);
                }
                self.pop_expecteds(&default_types, offset)?;
                self.set_unreachable();
                Ok(())
            }

            Return => {
                let results = vals(&self.func_type.results);
                self.pop_expecteds(&results, offset)?;
                self.set_unreachable();
                Ok(())
            }

            Call | ReturnCall => {
                let Immediate::Index(func_idx) = inst.immediate else {
                    unreachable!("shape checked by the decoder");
                };
                let ft = self.func_type_of(func_idx, offset)?;
                let params = vals(&ft.params);
                let results = vals(&ft.results);
                self.pop_expecteds(&params, offset)?;
                if inst.opcode == Call {
                    self.push_vals(&results);
                } else {
                    self.check_tail_results(&ft.results, offset)?;
                    self.set_unreachable();
                }
                Ok(())
            }

            CallIndirect | ReturnCallIndirect => {
                let Immediate::CallIndirect {
                    type_idx,
                    table_idx,
                } = inst.immediate
                else {
                    unreachable!("shape checked by the decoder");
                };
                let table = self.table_at(table_idx, offset)?;
                if table.element != crate::types::RefType::FuncRef {
                    return Err(WasmError::invalid_at(
                        offset,
                        "call_indirect requires a funcref table",
                    ));
                }
                let ft = self.type_at(type_idx, offset)?;
                self.pop_type(ValueType::I32, offset)?;
                let params = vals(&ft.params);
                let results = vals(&ft.results);
                self.pop_expecteds(&params, offset)?;
                if inst.opcode == CallIndirect {
                    self.push_vals(&results);
                } else {
                    self.check_tail_results(&ft.results, offset)?;
                    self.set_unreachable();
                }
                Ok(())
            }

            Throw => {
                let Immediate::Index(event_idx) = inst.immediate else {
                    unreachable!("shape checked by the decoder");
                };
                let params = self.event_params(event_idx, offset)?;
                self.pop_expecteds(&params, offset)?;
                self.set_unreachable();
                Ok(())
            }

            Rethrow => {
                self.pop_type(ValueType::ExnRef, offset)?;
                self.set_unreachable();
                Ok(())
            }

            BrOnExn => {
                let Immediate::BrOnExn { depth, event } = inst.immediate else {
                    unreachable!("shape checked by the decoder");
                };
                self.pop_type(ValueType::ExnRef, offset)?;
                let label = self.label(depth, offset)?;
                let params = self.event_params(event, offset)?;
                if label.len() != params.len()
                    || !label.iter().zip(&params).all(|(l, p)| l.unifies_with(*p))
                {
                    return Err(WasmError::invalid_at(
                        offset,
                        "br_on_exn event signature does not match target label",
                    ));
                }
                self.push_val(MaybeValue::Val(ValueType::ExnRef));
                Ok(())
            }

            Drop => {
                self.pop_val(offset)?;
                Ok(())
            }

            Select => {
                self.pop_type(ValueType::I32, offset)?;
                let a = self.pop_val(offset)?;
                let b = self.pop_val(offset)?;
                if !a.is_num() || !b.is_num() {
                    return Err(WasmError::invalid_at(
                        offset,
                        "type mismatch: select requires numeric or vector operands",
                    ));
                }
                if !a.unifies_with(b) {
                    return Err(WasmError::invalid_at(
                        offset,
                        format!("type mismatch: select operands disagree, {b} vs {a}"),
                    ));
                }
                self.push_val(if a == MaybeValue::Unknown { b } else { a });
                Ok(())
            }

            SelectT => {
                let Immediate::Select(types) = &inst.immediate else {
                    unreachable!("shape checked by the decoder");
                };
                if types.len() != 1 {
                    return Err(WasmError::invalid_at(
                        offset,
                        format!("select must have exactly one result type, got {}", types.len()),
                    ));
                }
                let vt = types[0];
                self.pop_type(ValueType::I32, offset)?;
                self.pop_type(vt, offset)?;
                self.pop_type(vt, offset)?;
                self.push_val(MaybeValue::Val(vt));
                Ok(())
            }

            LocalGet | LocalSet | LocalTee => {
                let Immediate::Index(idx) = inst.immediate else {
                    unreachable!("shape checked by the decoder");
                };
                let vt = self.local(idx, offset)?;
                match inst.opcode {
                    LocalGet => self.push_val(MaybeValue::Val(vt)),
                    LocalSet => {
                        self.pop_type(vt, offset)?;
                    }
                    _ => {
                        self.pop_type(vt, offset)?;
                        self.push_val(MaybeValue::Val(vt));
                    }
                }
                Ok(())
            }

            GlobalGet | GlobalSet => {
                let Immediate::Index(idx) = inst.immediate else {
                    unreachable!("shape checked by the decoder");
                };
                let gt = self.module.global_type(idx).ok_or_else(|| {
                    WasmError::invalid_at(offset, format!("global index {idx} out of range"))
                })?;
                if inst.opcode == GlobalGet {
                    self.push_val(MaybeValue::Val(gt.value_type));
                } else {
                    if !gt.mutable {
                        return Err(WasmError::invalid_at(
                            offset,
                            format!("global {idx} is immutable"),
                        ));
                    }
                    self.pop_type(gt.value_type, offset)?;
                }
                Ok(())
            }

            TableGet | TableSet | TableGrow | TableSize | TableFill => {
                let Immediate::Index(table_idx) = inst.immediate else {
                    unreachable!("shape checked by the decoder");
                };
                let table = self.table_at(table_idx, offset)?;
                let elem = MaybeValue::Val(table.element.into());
                match inst.opcode {
                    TableGet => {
                        self.pop_type(ValueType::I32, offset)?;
                        self.push_val(elem);
                    }
                    TableSet => {
                        self.pop_expected(elem, offset)?;
                        self.pop_type(ValueType::I32, offset)?;
                    }
                    TableGrow => {
                        self.pop_type(ValueType::I32, offset)?;
                        self.pop_expected(elem, offset)?;
                        self.push_val(MaybeValue::Val(ValueType::I32));
                    }
                    TableSize => self.push_val(MaybeValue::Val(ValueType::I32)),
                    _ => {
                        self.pop_type(ValueType::I32, offset)?;
                        self.pop_expected(elem, offset)?;
                        self.pop_type(ValueType::I32, offset)?;
                    }
                }
                Ok(())
            }

            TableInit => {
                let Immediate::Init { segment, dst } = inst.immediate else {
                    unreachable!("shape checked by the decoder");
                };
                let table = self.table_at(dst, offset)?;
                let elem = self.module.elements.get(segment as usize).ok_or_else(|| {
                    WasmError::invalid_at(
                        offset,
                        format!("element segment index {segment} out of range"),
                    )
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
                self.pop_type(ValueType::I32, offset)?;
                self.pop_type(ValueType::I32, offset)?;
                self.pop_type(ValueType::I32, offset)?;
                Ok(())
            }

            ElemDrop => {
                let Immediate::Index(segment) = inst.immediate else {
                    unreachable!("shape checked by the decoder");
                };
                if segment as usize >= self.module.elements.len() {
                    return Err(WasmError::invalid_at(
                        offset,
                        format!("element segment index {segment} out of range"),
                    ));
                }
                Ok(())
            }

            TableCopy => {
                let Immediate::Copy { dst, src } = inst.immediate else {
                    unreachable!("shape checked by the decoder");
                };
                let dst_table = self.table_at(dst, offset)?;
                let src_table = self.table_at(src, offset)?;
                if dst_table.element != src_table.element {
                    return Err(WasmError::invalid_at(
                        offset,
                        "type mismatch between table.copy source and destination",
                    ));
                }
                self.pop_type(ValueType::I32, offset)?;
                self.pop_type(ValueType::I32, offset)?;
                self.pop_type(ValueType::I32, offset)?;
                Ok(())
            }

            MemorySize | MemoryGrow => {
                let Immediate::Index(memory_idx) = inst.immediate else {
                    unreachable!("shape checked by the decoder");
                };
                self.check_memory(memory_idx, offset)?;
                self.apply_simple_signature(inst.opcode, offset)
            }

            MemoryInit | DataDrop => {
                let segment = match inst.immediate {
                    Immediate::Init { segment, dst } => {
                        self.check_memory(dst, offset)?;
                        segment
                    }
                    Immediate::Index(segment) => segment,
                    _ => unreachable!("shape checked by the decoder"),
                };
                if self.module.data_count.is_none() {
                    return Err(WasmError::invalid_at(
                        offset,
                        format!("{} requires a DataCount section", inst.opcode.mnemonic()),
                    ));
                }
                if segment >= self.module.num_data_segments() {
                    return Err(WasmError::invalid_at(
                        offset,
                        format!("data segment index {segment} out of range"),
                    ));
                }
                if inst.opcode == MemoryInit {
                    self.pop_type(ValueType::I32, offset)?;
                    self.pop_type(ValueType::I32, offset)?;
                    self.pop_type(ValueType::I32, offset)?;
                }
                Ok(())
            }

            MemoryCopy => {
                let Immediate::Copy { dst, src } = inst.immediate else {
                    unreachable!("shape checked by the decoder");
                };
                self.check_memory(dst, offset)?;
                self.check_memory(src, offset)?;
                self.pop_type(ValueType::I32, offset)?;
                self.pop_type(ValueType::I32, offset)?;
                self.pop_type(ValueType::I32, offset)?;
                Ok(())
            }

            MemoryFill => {
                let Immediate::Index(memory_idx) = inst.immediate else {
                    unreachable!("shape checked by the decoder");
                };
                self.check_memory(memory_idx, offset)?;
                self.pop_type(ValueType::I32, offset)?;
                self.pop_type(ValueType::I32, offset)?;
                self.pop_type(ValueType::I32, offset)?;
                Ok(())
            }

            RefNull => {
                let Immediate::RefType(rt) = inst.immediate else {
                    unreachable!("shape checked by the decoder");
                };
                self.push_val(MaybeValue::Val(rt.into()));
                Ok(())
            }

            RefIsNull => {
                let val = self.pop_val(offset)?;
                if !val.is_ref() {
                    return Err(WasmError::invalid_at(
                        offset,
                        format!("type mismatch: expected a reference, got {val}"),
                    ));
                }
                self.push_val(MaybeValue::Val(ValueType::I32));
                Ok(())
            }

            RefFunc => {
                let Immediate::Index(func_idx) = inst.immediate else {
                    unreachable!("shape checked by the decoder");
                };
                self.func_type_of(func_idx, offset)?;
                if !self.ctx.declared_funcs.contains(&func_idx) {
                    return Err(WasmError::invalid_at(
                        offset,
                        format!("undeclared function reference {func_idx}"),
                    ));
                }
                self.push_val(MaybeValue::Val(ValueType::FuncRef));
                Ok(())
            }

            AtomicFence => {
                let Immediate::Index(reserved) = inst.immediate else {
                    unreachable!("shape checked by the decoder");
                };
                if reserved != 0 {
                    return Err(WasmError::invalid_at(
                        offset,
                        "atomic.fence reserved value must be 0",
                    ));
                }
                Ok(())
            }

            MemoryAtomicWait32 | MemoryAtomicWait64 => {
                let expected = if inst.opcode == MemoryAtomicWait32 {
                    ValueType::I32
                } else {
                    ValueType::I64
                };
                self.pop_type(ValueType::I64, offset)?;
                self.pop_type(expected, offset)?;
                self.pop_type(ValueType::I32, offset)?;
                self.push_val(MaybeValue::Val(ValueType::I32));
                Ok(())
            }

            I32AtomicRmwCmpxchg | I32AtomicRmw8CmpxchgU | I32AtomicRmw16CmpxchgU => {
                self.cmpxchg(ValueType::I32, offset)
            }
            I64AtomicRmwCmpxchg | I64AtomicRmw8CmpxchgU | I64AtomicRmw16CmpxchgU
            | I64AtomicRmw32CmpxchgU => self.cmpxchg(ValueType::I64, offset),

            V128Bitselect => {
                self.pop_type(ValueType::V128, offset)?;
                self.pop_type(ValueType::V128, offset)?;
                self.pop_type(ValueType::V128, offset)?;
                self.push_val(MaybeValue::Val(ValueType::V128));
                Ok(())
            }

            I8x16Shuffle => {
                let Immediate::Shuffle(lanes) = &inst.immediate else {
                    unreachable!("shape checked by the decoder");
                };
                if let Some(lane) = lanes.iter().find(|l| **l >= 32) {
                    return Err(WasmError::invalid_at(
                        offset,
                        format!("shuffle lane index {lane} out of range"),
                    ));
                }
                self.apply_simple_signature(inst.opcode, offset)
            }

            _ => self.apply_simple_signature(inst.opcode, offset),
        }
    }

    fn cmpxchg(&mut self, vt: ValueType, offset: usize) -> Result<(), WasmError> {
        self.pop_type(vt, offset)?;
        self.pop_type(vt, offset)?;
        self.pop_type(ValueType::I32, offset)?;
        self.push_val(MaybeValue::Val(vt));
        Ok(())
    }

    fn check_tail_results(
        &self,
        callee_results: &[ValueType],
        offset: usize,
    ) -> Result<(), WasmError> {
        if callee_results != self.func_type.results.as_slice() {
            return Err(WasmError::invalid_at(
                offset,
                "tail call result types do not match the caller's results",
            ));
        }
        Ok(())
    }

    /// Pop/push according to the opcode table's static signature.
    fn apply_simple_signature(&mut self, opcode: Opcode, offset: usize) -> Result<(), WasmError> {
        let (t1, t2, tr) = opcode.simple_signature();
        if let Some(t2) = t2 {
            self.pop_type(t2, offset)?;
        }
        if let Some(t1) = t1 {
            self.pop_type(t1, offset)?;
        }
        if let Some(tr) = tr {
            self.push_val(MaybeValue::Val(tr));
        }
        Ok(())
    }

    /// Validate a full body and check the implicit frame is closed.
    pub fn validate_body(&mut self, instructions: &[Instruction]) -> Result<(), WasmError> {
        let mut last_offset = 0;
        for inst in instructions {
            self.validate(inst)?;
            last_offset = inst.position.offset;
        }
        self.finish(last_offset)
    }

    #[cfg(test)]
    fn stack(&self) -> &[MaybeValue] {
        &self.vals
    }
}
