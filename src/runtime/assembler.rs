//! Reads module text back into instruction trees.
//!
//! Only the subset the code generator emits is accepted: `i32` values,
//! result-less blocks and loops, an imported memory and imported host
//! functions. Operands may be written flat or folded.

use std::collections::HashMap;

use tracing::debug;

use crate::{compiler::instr::{Instr, NumOp}, errors::errors::Error};

use super::reader::{assembly_error, read, SExpr};

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: Option<String>,
    /// Parameter names; unnamed parameters are named by their index.
    pub params: Vec<String>,
    pub results: u32,
    pub locals: Vec<String>,
    pub body: Vec<Instr>,
    /// `(module, field)` of an imported function.
    pub import: Option<(String, String)>,
    pub export: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryImport {
    pub module: String,
    pub field: String,
    pub pages: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Module {
    pub functions: Vec<Function>,
    pub memory: Option<MemoryImport>,
    index: HashMap<String, usize>,
}

impl Module {
    pub fn function_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn exported(&self, name: &str) -> Option<usize> {
        self.functions
            .iter()
            .position(|function| function.export.as_deref() == Some(name))
    }
}

/// A function whose header has been read but whose body has not.
struct Pending<'t> {
    function: Function,
    body: &'t [SExpr],
    offset: u32,
}

fn expect_string(form: &SExpr, what: &str) -> Result<String, Error> {
    form.string()
        .map(str::to_string)
        .ok_or_else(|| assembly_error(format!("expected a string for {}", what), form.offset()))
}

fn read_i32_types(items: &[SExpr], what: &str) -> Result<u32, Error> {
    for item in items.iter() {
        if item.atom() != Some("i32") {
            return Err(assembly_error(format!("only i32 {} are supported", what), item.offset()));
        }
    }
    Ok(items.len() as u32)
}

/// Reads `(param ...)`/`(local ...)` declarations into names. Unnamed entries
/// are named by their index, which starts at `base` for locals.
fn read_names(items: &[SExpr], names: &mut Vec<String>, base: usize, what: &str) -> Result<(), Error> {
    match items.first().and_then(SExpr::ident) {
        Some(name) => {
            read_i32_types(&items[1..], what)?;
            if items.len() != 2 {
                return Err(assembly_error(format!("named {} must have one type", what), items[0].offset()));
            }
            names.push(name.to_string());
        }
        None => {
            for _ in 0..read_i32_types(items, what)? {
                names.push((base + names.len()).to_string());
            }
        }
    }
    Ok(())
}

fn read_func_header(items: &[SExpr], offset: u32) -> Result<Pending<'_>, Error> {
    let mut function = Function {
        name: None,
        params: vec![],
        results: 0,
        locals: vec![],
        body: vec![],
        import: None,
        export: None,
    };

    let mut index = 1;
    if let Some(name) = items.get(index).and_then(SExpr::ident) {
        function.name = Some(name.to_string());
        index += 1;
    }

    while let Some(form) = items.get(index) {
        let Some(fields) = form.items() else {
            return Err(assembly_error(String::from("unexpected atom in function"), form.offset()));
        };

        match form.head() {
            Some("import") if fields.len() == 3 => {
                function.import = Some((
                    expect_string(&fields[1], "import module")?,
                    expect_string(&fields[2], "import field")?,
                ));
            }
            Some("export") if fields.len() == 2 => {
                function.export = Some(expect_string(&fields[1], "export name")?);
            }
            Some("param") => read_names(&fields[1..], &mut function.params, 0, "params")?,
            Some("result") => function.results += read_i32_types(&fields[1..], "results")?,
            Some("local") => {
                let base = function.params.len();
                read_names(&fields[1..], &mut function.locals, base, "locals")?
            }
            _ => break,
        }
        index += 1;
    }

    if function.results > 1 {
        return Err(assembly_error(String::from("at most one result is supported"), offset));
    }

    let body = &items[index..];
    if function.import.is_some() && !body.is_empty() {
        return Err(assembly_error(String::from("an imported function cannot have a body"), offset));
    }

    Ok(Pending { function, body, offset })
}

fn read_memory_import(fields: &[SExpr], offset: u32) -> Result<MemoryImport, Error> {
    let [_, module, field, memory] = fields else {
        return Err(assembly_error(String::from("malformed import"), offset));
    };

    let pages = match memory.items() {
        Some([kind, pages]) if kind.atom() == Some("memory") => pages
            .atom()
            .and_then(|pages| pages.parse::<u32>().ok())
            .ok_or_else(|| assembly_error(String::from("invalid memory size"), pages.offset()))?,
        _ => {
            return Err(assembly_error(
                String::from("only memory imports are supported here"),
                memory.offset(),
            ))
        }
    };

    Ok(MemoryImport {
        module: expect_string(module, "import module")?,
        field: expect_string(field, "import field")?,
        pages,
    })
}

/// Per-function state while reading instructions.
struct Context<'m> {
    signatures: &'m HashMap<String, (u32, u32)>,
    locals: Vec<String>,
    /// Enclosing branch targets, the function body included.
    labels: u32,
}

impl<'m> Context<'m> {
    fn local(&self, operand: &SExpr) -> Result<String, Error> {
        let name = match (operand.ident(), operand.atom()) {
            (Some(name), _) => name.to_string(),
            (None, Some(index)) => index.to_string(),
            _ => return Err(assembly_error(String::from("expected a local"), operand.offset())),
        };

        if !self.locals.contains(&name) {
            return Err(assembly_error(format!("unknown local `{}`", name), operand.offset()));
        }
        Ok(name)
    }

    fn depth(&self, operand: &SExpr) -> Result<u32, Error> {
        let depth = operand
            .atom()
            .and_then(|depth| depth.parse::<u32>().ok())
            .ok_or_else(|| assembly_error(String::from("expected a branch depth"), operand.offset()))?;

        if depth >= self.labels {
            return Err(assembly_error(format!("branch depth {} out of range", depth), operand.offset()));
        }
        Ok(depth)
    }

    fn read_body(&mut self, forms: &[SExpr], out: &mut Vec<Instr>) -> Result<(), Error> {
        for form in forms.iter() {
            self.read_instr(form, out)?;
        }
        Ok(())
    }

    fn read_instr(&mut self, form: &SExpr, out: &mut Vec<Instr>) -> Result<(), Error> {
        let offset = form.offset();
        let (Some(items), Some(op)) = (form.items(), form.head()) else {
            return Err(assembly_error(String::from("expected an instruction"), offset));
        };

        if op == "block" || op == "loop" {
            if items.get(1).and_then(SExpr::head) == Some("result") {
                return Err(assembly_error(String::from("block results are not supported"), offset));
            }

            let mut body = vec![];
            self.labels += 1;
            let result = self.read_body(&items[1..], &mut body);
            self.labels -= 1;
            result?;

            out.push(if op == "block" {
                Instr::Block(body)
            } else {
                Instr::Loop(body)
            });
            return Ok(());
        }

        // Folded operands come before the instruction itself
        let mut immediates = vec![];
        for item in items[1..].iter() {
            match item {
                SExpr::List { .. } => self.read_instr(item, out)?,
                SExpr::Atom { .. } => immediates.push(item),
            }
        }

        let immediate = |count: usize| -> Result<(), Error> {
            if immediates.len() != count {
                return Err(assembly_error(
                    format!("`{}` takes {} immediate(s), got {}", op, count, immediates.len()),
                    offset,
                ));
            }
            Ok(())
        };

        let instr = match op {
            "i32.const" => {
                immediate(1)?;
                let value = immediates[0]
                    .atom()
                    .and_then(|value| value.parse::<i32>().ok())
                    .ok_or_else(|| assembly_error(String::from("invalid i32 constant"), immediates[0].offset()))?;
                Instr::Const(value)
            }
            "i32.load" => {
                immediate(0)?;
                Instr::Load
            }
            "i32.store" => {
                immediate(0)?;
                Instr::Store
            }
            "local.get" => {
                immediate(1)?;
                Instr::LocalGet(self.local(immediates[0])?)
            }
            "local.set" => {
                immediate(1)?;
                Instr::LocalSet(self.local(immediates[0])?)
            }
            "call" => {
                immediate(1)?;
                let name = immediates[0]
                    .ident()
                    .ok_or_else(|| assembly_error(String::from("expected a function name"), immediates[0].offset()))?;
                let (params, results) = self
                    .signatures
                    .get(name)
                    .copied()
                    .ok_or_else(|| assembly_error(format!("unknown function `${}`", name), immediates[0].offset()))?;
                Instr::Call {
                    name: name.to_string(),
                    params,
                    results,
                }
            }
            "br" => {
                immediate(1)?;
                Instr::Br(self.depth(immediates[0])?)
            }
            "br_if" => {
                immediate(1)?;
                Instr::BrIf(self.depth(immediates[0])?)
            }
            "drop" => {
                immediate(0)?;
                Instr::Drop
            }
            "nop" => {
                immediate(0)?;
                Instr::Nop
            }
            "return" => {
                immediate(0)?;
                Instr::Return
            }
            other => match NumOp::from_mnemonic(other) {
                Some(num_op) => {
                    immediate(0)?;
                    Instr::Num(num_op)
                }
                None => return Err(assembly_error(format!("unknown instruction `{}`", other), offset)),
            },
        };

        out.push(instr);
        Ok(())
    }
}

/// Assembles module text into a `Module`.
pub fn assemble(text: &str) -> Result<Module, Error> {
    let forms = read(text)?;
    let [root] = forms.as_slice() else {
        return Err(assembly_error(String::from("expected exactly one module"), 0));
    };
    let (Some(fields), Some("module")) = (root.items(), root.head()) else {
        return Err(assembly_error(String::from("expected `(module ...)`"), root.offset()));
    };

    let mut module = Module::default();
    let mut pending = vec![];

    for field in fields[1..].iter() {
        let Some(items) = field.items() else {
            return Err(assembly_error(String::from("unexpected atom in module"), field.offset()));
        };

        match field.head() {
            Some("func") => pending.push(read_func_header(items, field.offset())?),
            Some("import") => {
                if module.memory.is_some() {
                    return Err(assembly_error(String::from("only one memory is supported"), field.offset()));
                }
                module.memory = Some(read_memory_import(items, field.offset())?);
            }
            other => {
                return Err(assembly_error(
                    format!("unsupported module field `{}`", other.unwrap_or("?")),
                    field.offset(),
                ))
            }
        }
    }

    let mut signatures = HashMap::new();
    for (index, entry) in pending.iter().enumerate() {
        if let Some(name) = &entry.function.name {
            let signature = (entry.function.params.len() as u32, entry.function.results);
            if signatures.insert(name.clone(), signature).is_some() {
                return Err(assembly_error(format!("duplicate function `${}`", name), entry.offset));
            }
            module.index.insert(name.clone(), index);
        }
    }

    for entry in pending.into_iter() {
        let Pending {
            mut function,
            body,
            ..
        } = entry;

        let mut context = Context {
            signatures: &signatures,
            locals: function.params.iter().chain(function.locals.iter()).cloned().collect(),
            labels: 1,
        };
        context.read_body(body, &mut function.body)?;
        module.functions.push(function);
    }

    debug!(functions = module.functions.len(), "assembled module");
    Ok(module)
}
