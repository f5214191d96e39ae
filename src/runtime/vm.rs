use std::collections::HashMap;

use tracing::{debug, trace};

use crate::{
    compiler::{
        instr::{Instr, NumOp},
        module::ENTRY_EXPORT,
    },
    errors::errors::{Error, ErrorImpl},
    Position,
};

use super::{
    assembler::{assemble, Function, Module},
    host::{HostFunction, HostImports},
    memory::LinearMemory,
    reader::assembly_error,
};

/// Nested calls allowed before a run is stopped.
pub const DEFAULT_CALL_DEPTH: u32 = 1000;

/// Assembles and runs module text.
pub trait Runtime {
    /// Runs the module's exported entry function. Returns its result, if it
    /// declares one.
    fn execute(&mut self, module_text: &str, imports: &mut dyn HostImports) -> Result<Option<i32>, Error>;
}

fn trap(message: impl Into<String>) -> Error {
    Error::new(
        ErrorImpl::Trap {
            message: message.into(),
        },
        Position::null(),
    )
}

/// Reference interpreter for the generated modules.
///
/// Memory persists from one `execute` to the next, so the units of one
/// session see each other's top-level variables.
#[derive(Debug, Clone)]
pub struct Vm {
    memory: LinearMemory,
    call_depth_limit: u32,
}

impl Default for Vm {
    fn default() -> Self {
        Vm::new()
    }
}

impl Vm {
    pub fn new() -> Self {
        Vm {
            memory: LinearMemory::default(),
            call_depth_limit: DEFAULT_CALL_DEPTH,
        }
    }

    pub fn with_call_depth_limit(mut self, limit: u32) -> Self {
        self.call_depth_limit = limit;
        self
    }

    pub fn memory(&self) -> &LinearMemory {
        &self.memory
    }

    fn link(module: &Module) -> Result<(), Error> {
        for function in module.functions.iter() {
            let Some((import_module, field)) = &function.import else {
                continue;
            };

            match HostFunction::resolve(import_module, field) {
                Some(host) if host.arity() == function.params.len() && function.results == 0 => {}
                Some(_) => {
                    return Err(assembly_error(
                        format!("import {}.{} has the wrong signature", import_module, field),
                        0,
                    ))
                }
                None => {
                    return Err(assembly_error(
                        format!("unknown import {}.{}", import_module, field),
                        0,
                    ))
                }
            }
        }
        Ok(())
    }
}

impl Runtime for Vm {
    fn execute(&mut self, module_text: &str, imports: &mut dyn HostImports) -> Result<Option<i32>, Error> {
        let module = assemble(module_text)?;
        Vm::link(&module)?;

        let entry = module
            .exported(ENTRY_EXPORT)
            .ok_or_else(|| assembly_error(format!("no exported `{}`", ENTRY_EXPORT), 0))?;

        let mut machine = Machine {
            module: &module,
            memory: &mut self.memory,
            imports,
            limit: self.call_depth_limit,
        };
        let result = machine.call(entry)?;

        debug!(result = ?result, "executed module");
        Ok(result)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum LabelKind {
    /// The function body itself; branching to it returns.
    Body,
    Block,
    Loop,
}

/// An instruction sequence being executed, with where to resume in it.
struct Label<'m> {
    kind: LabelKind,
    body: &'m [Instr],
    pc: usize,
    /// Operand stack height when the sequence was entered.
    height: usize,
}

struct Frame<'m> {
    function: &'m Function,
    locals: HashMap<String, i32>,
    stack: Vec<i32>,
    labels: Vec<Label<'m>>,
}

impl<'m> Frame<'m> {
    fn new(function: &'m Function, args: Vec<i32>) -> Self {
        let mut locals: HashMap<String, i32> = function.params.iter().cloned().zip(args).collect();
        for local in function.locals.iter() {
            locals.insert(local.clone(), 0);
        }

        Frame {
            function,
            locals,
            stack: vec![],
            labels: vec![Label {
                kind: LabelKind::Body,
                body: &function.body,
                pc: 0,
                height: 0,
            }],
        }
    }

    fn pop(&mut self) -> Result<i32, Error> {
        self.stack.pop().ok_or_else(|| trap("operand stack underflow"))
    }

    fn pop_n(&mut self, count: usize) -> Result<Vec<i32>, Error> {
        if count > self.stack.len() {
            return Err(trap("operand stack underflow"));
        }
        Ok(self.stack.split_off(self.stack.len() - count))
    }

    fn local(&self, name: &str) -> Result<i32, Error> {
        self.locals
            .get(name)
            .copied()
            .ok_or_else(|| trap(format!("unknown local `{}`", name)))
    }

    fn enter(&mut self, kind: LabelKind, body: &'m [Instr]) {
        self.labels.push(Label {
            kind,
            body,
            pc: 0,
            height: self.stack.len(),
        });
    }

    /// Unwinds to the label `depth` levels out. Returns false when the branch
    /// leaves the function.
    fn branch(&mut self, depth: u32) -> Result<bool, Error> {
        let depth = depth as usize;
        if depth >= self.labels.len() {
            return Err(trap(format!("branch depth {} out of range", depth)));
        }

        let index = self.labels.len() - 1 - depth;
        let (kind, height) = (self.labels[index].kind, self.labels[index].height);
        match kind {
            LabelKind::Body => return Ok(false),
            LabelKind::Block => self.labels.truncate(index),
            LabelKind::Loop => {
                self.labels.truncate(index + 1);
                self.labels[index].pc = 0;
            }
        }
        self.stack.truncate(height);
        Ok(true)
    }

    fn result(mut self) -> Result<Option<i32>, Error> {
        if self.function.results == 0 {
            return Ok(None);
        }
        self.pop()
            .map(Some)
            .map_err(|_| trap("function returned without a value"))
    }
}

/// What the machine does after one instruction.
enum Step {
    Next,
    Call(usize, Vec<i32>),
    Return,
}

/// Runs one module invocation as a flat loop. Guest calls push onto the
/// frame stack, never onto the host stack.
struct Machine<'m> {
    module: &'m Module,
    memory: &'m mut LinearMemory,
    imports: &'m mut dyn HostImports,
    limit: u32,
}

fn binary(op: NumOp, left: i32, right: i32) -> Result<i32, Error> {
    let value = match op {
        NumOp::Add => left.wrapping_add(right),
        NumOp::Sub => left.wrapping_sub(right),
        NumOp::Mul => left.wrapping_mul(right),
        NumOp::DivS => {
            if right == 0 {
                return Err(trap("integer divide by zero"));
            }
            left.checked_div(right).ok_or_else(|| trap("integer overflow"))?
        }
        NumOp::RemS => {
            if right == 0 {
                return Err(trap("integer divide by zero"));
            }
            left.wrapping_rem(right)
        }
        NumOp::LtS => (left < right) as i32,
        NumOp::LeS => (left <= right) as i32,
        NumOp::GtS => (left > right) as i32,
        NumOp::GeS => (left >= right) as i32,
        NumOp::Eq => (left == right) as i32,
        NumOp::Ne => (left != right) as i32,
    };
    Ok(value)
}

impl<'m> Machine<'m> {
    fn call(&mut self, entry: usize) -> Result<Option<i32>, Error> {
        let mut frames: Vec<Frame<'m>> = vec![];
        self.invoke(&mut frames, entry, vec![])?;

        loop {
            let Some(frame) = frames.last_mut() else {
                // The entry was a host import
                return Ok(None);
            };

            match self.step(frame)? {
                Step::Next => {}
                Step::Call(index, args) => self.invoke(&mut frames, index, args)?,
                Step::Return => {
                    let Some(frame) = frames.pop() else {
                        return Ok(None);
                    };
                    let result = frame.result()?;

                    match frames.last_mut() {
                        Some(caller) => caller.stack.extend(result),
                        None => return Ok(result),
                    }
                }
            }
        }
    }

    /// Calls a host import right away, or pushes a frame for a defined
    /// function.
    fn invoke(&mut self, frames: &mut Vec<Frame<'m>>, index: usize, args: Vec<i32>) -> Result<(), Error> {
        let module = self.module;
        let function = module
            .functions
            .get(index)
            .ok_or_else(|| trap(format!("unknown function index {}", index)))?;

        if let Some((import_module, field)) = &function.import {
            let host = HostFunction::resolve(import_module, field)
                .ok_or_else(|| trap(format!("unknown import {}.{}", import_module, field)))?;
            return host
                .call(&mut *self.imports, &args)
                .map_err(|error| Error::new(error, Position::null()));
        }

        if frames.len() as u32 >= self.limit {
            return Err(trap("call stack exhausted"));
        }

        trace!(function = ?function.name, depth = frames.len(), "call");
        frames.push(Frame::new(function, args));
        Ok(())
    }

    fn step(&mut self, frame: &mut Frame<'m>) -> Result<Step, Error> {
        let Some(label) = frame.labels.last_mut() else {
            return Ok(Step::Return);
        };
        let body = label.body;

        let Some(instr) = body.get(label.pc) else {
            // Falling off the end of a loop leaves it, like a block
            return match frame.labels.pop().map(|label| label.kind) {
                Some(LabelKind::Body) | None => Ok(Step::Return),
                Some(_) => Ok(Step::Next),
            };
        };
        label.pc += 1;

        match instr {
            Instr::Const(value) => frame.stack.push(*value),
            Instr::Address { offset, .. } => frame.stack.push(*offset),
            Instr::Num(op) => {
                let right = frame.pop()?;
                let left = frame.pop()?;
                frame.stack.push(binary(*op, left, right)?);
            }
            Instr::Load => {
                let address = frame.pop()?;
                let value = self
                    .memory
                    .load(address)
                    .map_err(|error| Error::new(error, Position::null()))?;
                frame.stack.push(value);
            }
            Instr::Store => {
                let value = frame.pop()?;
                let address = frame.pop()?;
                self.memory
                    .store(address, value)
                    .map_err(|error| Error::new(error, Position::null()))?;
            }
            Instr::LocalGet(name) => {
                let value = frame.local(name)?;
                frame.stack.push(value);
            }
            Instr::LocalSet(name) => {
                let value = frame.pop()?;
                frame.locals.insert(name.clone(), value);
            }
            Instr::Call { name, params, .. } => {
                let index = self
                    .module
                    .function_index(name)
                    .ok_or_else(|| trap(format!("unknown function `${}`", name)))?;
                let args = frame.pop_n(*params as usize)?;
                return Ok(Step::Call(index, args));
            }
            Instr::Drop => {
                frame.pop()?;
            }
            Instr::Nop => {}
            Instr::Return => return Ok(Step::Return),
            Instr::Br(depth) => {
                if !frame.branch(*depth)? {
                    return Ok(Step::Return);
                }
            }
            Instr::BrIf(depth) => {
                if frame.pop()? != 0 && !frame.branch(*depth)? {
                    return Ok(Step::Return);
                }
            }
            Instr::Block(body) => frame.enter(LabelKind::Block, body),
            Instr::Loop(body) => frame.enter(LabelKind::Loop, body),
        }
        Ok(Step::Next)
    }
}
