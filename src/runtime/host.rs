use std::io::{self, Write};

use crate::errors::errors::ErrorImpl;

/// Module name every host function is imported from.
pub const IMPORT_MODULE: &str = "imports";

/// The functions a compiled module may import from its host.
///
/// A failed write surfaces as a trap of the running module.
pub trait HostImports {
    /// Prints a value of type `None`.
    fn print(&mut self, value: i32) -> io::Result<()>;
    fn print_global(&mut self, slot: i32, value: i32) -> io::Result<()>;
    fn print_int(&mut self, value: i32) -> io::Result<()>;
    fn print_bool(&mut self, value: i32) -> io::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostFunction {
    Print,
    PrintGlobal,
    PrintInt,
    PrintBool,
}

impl HostFunction {
    pub fn resolve(module: &str, field: &str) -> Option<HostFunction> {
        if module != IMPORT_MODULE {
            return None;
        }

        match field {
            "imported_func" => Some(HostFunction::Print),
            "print_global_func" => Some(HostFunction::PrintGlobal),
            "print_int" => Some(HostFunction::PrintInt),
            "print_bool" => Some(HostFunction::PrintBool),
            _ => None,
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            HostFunction::PrintGlobal => 2,
            _ => 1,
        }
    }

    pub fn call(&self, imports: &mut dyn HostImports, args: &[i32]) -> Result<(), ErrorImpl> {
        if args.len() != self.arity() {
            return Err(ErrorImpl::Trap {
                message: format!(
                    "host function {:?} expects {} argument(s), got {}",
                    self,
                    self.arity(),
                    args.len()
                ),
            });
        }

        let written = match self {
            HostFunction::Print => imports.print(args[0]),
            HostFunction::PrintGlobal => imports.print_global(args[0], args[1]),
            HostFunction::PrintInt => imports.print_int(args[0]),
            HostFunction::PrintBool => imports.print_bool(args[0]),
        };
        written.map_err(|error| ErrorImpl::Trap {
            message: format!("host output failed: {}", error),
        })
    }
}

pub fn format_bool(value: i32) -> &'static str {
    if value == 1 {
        "True"
    } else {
        "False"
    }
}

/// Collects everything printed, one value per line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BufferedImports {
    pub output: String,
}

impl BufferedImports {
    pub fn new() -> Self {
        BufferedImports::default()
    }

    /// Returns the output so far and clears the buffer.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    fn line(&mut self, text: &str) -> io::Result<()> {
        self.output.push_str(text);
        self.output.push('\n');
        Ok(())
    }
}

impl HostImports for BufferedImports {
    fn print(&mut self, _value: i32) -> io::Result<()> {
        self.line("None")
    }

    fn print_global(&mut self, _slot: i32, value: i32) -> io::Result<()> {
        self.line(&value.to_string())
    }

    fn print_int(&mut self, value: i32) -> io::Result<()> {
        self.line(&value.to_string())
    }

    fn print_bool(&mut self, value: i32) -> io::Result<()> {
        self.line(format_bool(value))
    }
}

/// Writes printed values straight to standard output.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutImports;

impl StdoutImports {
    fn line(&self, text: &str) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", text)?;
        stdout.flush()
    }
}

impl HostImports for StdoutImports {
    fn print(&mut self, _value: i32) -> io::Result<()> {
        self.line("None")
    }

    fn print_global(&mut self, _slot: i32, value: i32) -> io::Result<()> {
        self.line(&value.to_string())
    }

    fn print_int(&mut self, value: i32) -> io::Result<()> {
        self.line(&value.to_string())
    }

    fn print_bool(&mut self, value: i32) -> io::Result<()> {
        self.line(format_bool(value))
    }
}
