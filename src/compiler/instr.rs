//! Stack-machine instructions and their static stack effects.
//!
//! Code generation builds `Instr` trees rather than strings so that every
//! emitted instruction can be run through a `StackCounter` before rendering.
//! The same type is produced by the runtime's assembler when it reads
//! rendered text back in.

use crate::errors::errors::ErrorImpl;

/// Two-operand i32 instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumOp {
    Add,
    Sub,
    Mul,
    DivS,
    RemS,
    LtS,
    LeS,
    GtS,
    GeS,
    Eq,
    Ne,
}

impl NumOp {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            NumOp::Add => "i32.add",
            NumOp::Sub => "i32.sub",
            NumOp::Mul => "i32.mul",
            NumOp::DivS => "i32.div_s",
            NumOp::RemS => "i32.rem_s",
            NumOp::LtS => "i32.lt_s",
            NumOp::LeS => "i32.le_s",
            NumOp::GtS => "i32.gt_s",
            NumOp::GeS => "i32.ge_s",
            NumOp::Eq => "i32.eq",
            NumOp::Ne => "i32.ne",
        }
    }

    pub fn from_mnemonic(mnemonic: &str) -> Option<NumOp> {
        match mnemonic {
            "i32.add" => Some(NumOp::Add),
            "i32.sub" => Some(NumOp::Sub),
            "i32.mul" => Some(NumOp::Mul),
            "i32.div_s" => Some(NumOp::DivS),
            "i32.rem_s" => Some(NumOp::RemS),
            "i32.lt_s" => Some(NumOp::LtS),
            "i32.le_s" => Some(NumOp::LeS),
            "i32.gt_s" => Some(NumOp::GtS),
            "i32.ge_s" => Some(NumOp::GeS),
            "i32.eq" => Some(NumOp::Eq),
            "i32.ne" => Some(NumOp::Ne),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
    Const(i32),
    /// Byte address of a top-level variable's slot.
    Address { offset: i32, name: String },
    Num(NumOp),
    Load,
    Store,
    LocalGet(String),
    LocalSet(String),
    Call {
        name: String,
        params: u32,
        results: u32,
    },
    Drop,
    Nop,
    Return,
    Br(u32),
    BrIf(u32),
    /// Result-less block; branching to it jumps past its end.
    Block(Vec<Instr>),
    /// Result-less loop; branching to it jumps back to its start.
    Loop(Vec<Instr>),
}

impl Instr {
    /// Number of operands popped and results pushed.
    ///
    /// Blocks and loops are neutral: their bodies are accounted for
    /// instruction by instruction as they are emitted.
    pub fn stack_effect(&self) -> (u32, u32) {
        match self {
            Instr::Const(_) | Instr::Address { .. } | Instr::LocalGet(_) => (0, 1),
            Instr::Num(_) => (2, 1),
            Instr::Load => (1, 1),
            Instr::Store => (2, 0),
            Instr::LocalSet(_) | Instr::Drop | Instr::Return | Instr::BrIf(_) => (1, 0),
            Instr::Call {
                params, results, ..
            } => (*params, *results),
            Instr::Nop | Instr::Br(_) | Instr::Block(_) | Instr::Loop(_) => (0, 0),
        }
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            Instr::Const(_) | Instr::Address { .. } => "i32.const",
            Instr::Num(op) => op.mnemonic(),
            Instr::Load => "i32.load",
            Instr::Store => "i32.store",
            Instr::LocalGet(_) => "local.get",
            Instr::LocalSet(_) => "local.set",
            Instr::Call { .. } => "call",
            Instr::Drop => "drop",
            Instr::Nop => "nop",
            Instr::Return => "return",
            Instr::Br(_) => "br",
            Instr::BrIf(_) => "br_if",
            Instr::Block(_) => "block",
            Instr::Loop(_) => "loop",
        }
    }

    /// Writes the instruction in folded text form, one instruction per line.
    pub fn render(&self, indent: usize, out: &mut String) {
        let pad = "  ".repeat(indent);
        match self {
            Instr::Const(value) => out.push_str(&format!("{}(i32.const {})\n", pad, value)),
            Instr::Address { offset, name } => {
                out.push_str(&format!("{}(i32.const {}) ;; {}\n", pad, offset, name))
            }
            Instr::LocalGet(name) | Instr::LocalSet(name) => {
                out.push_str(&format!("{}({} ${})\n", pad, self.mnemonic(), name))
            }
            Instr::Call { name, .. } => out.push_str(&format!("{}(call ${})\n", pad, name)),
            Instr::Br(depth) | Instr::BrIf(depth) => {
                out.push_str(&format!("{}({} {})\n", pad, self.mnemonic(), depth))
            }
            Instr::Block(body) | Instr::Loop(body) => {
                out.push_str(&format!("{}({}\n", pad, self.mnemonic()));
                for instr in body.iter() {
                    instr.render(indent + 1, out);
                }
                out.push_str(&format!("{})\n", pad));
            }
            _ => out.push_str(&format!("{}({})\n", pad, self.mnemonic())),
        }
    }
}

pub fn render_all(instrs: &[Instr], indent: usize) -> String {
    let mut out = String::new();
    for instr in instrs.iter() {
        instr.render(indent, &mut out);
    }
    out
}

/// Models the operand stack depth of straight-line emitted code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackCounter {
    depth: u32,
}

impl StackCounter {
    pub fn new() -> Self {
        StackCounter::default()
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn reset(&mut self) {
        self.depth = 0;
    }

    pub fn apply(&mut self, instr: &Instr) -> Result<(), ErrorImpl> {
        let (pops, pushes) = instr.stack_effect();
        if pops > self.depth {
            return Err(ErrorImpl::StackUnderflow {
                instruction: instr.mnemonic().to_string(),
                needed: pops,
                available: self.depth,
            });
        }

        self.depth = self.depth - pops + pushes;
        Ok(())
    }
}
