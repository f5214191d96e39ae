use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::ast::ast::{Expr, ExprKind};

/// A function the compiler provides without a user definition.
///
/// Calls to a built-in are rewritten into a dedicated expression node during
/// lowering instead of a generic `Call`.
pub struct Builtin {
    pub arity: usize,
    pub lower: fn(Vec<Expr>) -> Option<ExprKind>,
}

fn lower_print(args: Vec<Expr>) -> Option<ExprKind> {
    args.into_iter()
        .next()
        .map(|arg| ExprKind::Print(Box::new(arg)))
}

lazy_static! {
    pub static ref BUILTINS: HashMap<&'static str, Builtin> = {
        let mut map = HashMap::new();
        map.insert("print", Builtin { arity: 1, lower: lower_print });
        map
    };

    /// Names bound by the host import table of every emitted module.
    pub static ref HOST_IMPORTS: Vec<&'static str> =
        vec!["print", "print_global", "print_int", "print_bool"];
}

pub fn get_builtin(name: &str) -> Option<&'static Builtin> {
    BUILTINS.get(name)
}

/// User functions may not shadow a built-in or a host import.
pub fn is_reserved(name: &str) -> bool {
    BUILTINS.contains_key(name) || HOST_IMPORTS.contains(&name)
}
