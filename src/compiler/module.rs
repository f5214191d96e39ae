use super::compiler::CompiledUnit;

/// Name of the function the host calls to run a unit.
pub const ENTRY_EXPORT: &str = "exported_func";

/// Host functions every module imports, as `(name, import field, params)`.
pub const HOST_FUNCTIONS: [(&str, &str, u32); 4] = [
    ("print", "imported_func", 1),
    ("print_global", "print_global_func", 2),
    ("print_int", "print_int", 1),
    ("print_bool", "print_bool", 1),
];

fn indent_lines(text: &str, indent: usize, out: &mut String) {
    let pad = "  ".repeat(indent);
    for line in text.lines() {
        out.push_str(&pad);
        out.push_str(line);
        out.push('\n');
    }
}

/// Wraps generated code into a complete module: host imports, the imported
/// memory, the function definitions and the exported entry function.
pub fn assemble_module(function_defs: &[String], main_source: &str, returns_value: bool) -> String {
    let mut out = String::from("(module\n");

    for (name, field, params) in HOST_FUNCTIONS.iter() {
        out.push_str(&format!("  (func ${} (import \"imports\" \"{}\")", name, field));
        for _ in 0..*params {
            out.push_str(" (param i32)");
        }
        out.push_str(")\n");
    }
    out.push_str("  (import \"js\" \"memory\" (memory 1))\n");

    for def in function_defs.iter() {
        indent_lines(def, 1, &mut out);
    }

    out.push_str(&format!("  (func (export \"{}\")", ENTRY_EXPORT));
    if returns_value {
        out.push_str(" (result i32)");
    }
    out.push('\n');
    out.push_str(main_source);
    out.push_str("  )\n");
    out.push_str(")\n");
    out
}

/// Assembles a unit on top of the function definitions of earlier units.
pub fn assemble_unit(previous: &[String], unit: &CompiledUnit) -> String {
    let mut defs = previous.to_vec();
    defs.extend(unit.function_defs.iter().cloned());
    assemble_module(&defs, &unit.main_source, unit.returns_value)
}
