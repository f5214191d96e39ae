use tracing::debug;

use crate::{
    ast::{
        ast::{Expr, ExprKind, Param, Program, Stmt, StmtKind},
        types::{BinaryOp, Type, UnaryOp},
    },
    errors::errors::{Error, ErrorImpl},
    lowering::builtins::is_reserved,
    Position,
};

use super::environment::{Binding, Environment, FunctionSig, TypeEnvironment};

/// Outcome of a successful check.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Type of the last top-level statement that produced a value, or `NoneType`.
    pub result_type: Type,
    /// Top-level declarations, including any seeded from earlier units.
    pub environment: Environment,
}

#[derive(Debug)]
pub struct TypeChecker {
    pub env: TypeEnvironment,
    /// Declared return type of the function whose body is being checked.
    function_ret: Option<Type>,
}

impl TypeChecker {
    pub fn new(env: TypeEnvironment) -> Self {
        TypeChecker {
            env,
            function_ret: None,
        }
    }

    pub fn in_function(&self) -> bool {
        self.function_ret.is_some()
    }

    /// Names from earlier units may be re-declared as variables, but a
    /// function name stays bound for the rest of the session.
    fn check_outer_conflict(&self, name: &str, is_function: bool, position: &Position) -> Result<(), Error> {
        if self.in_function() {
            return Ok(());
        }

        let conflict = match self.env.lookup_outer(name) {
            Some(Binding::Function(_)) => true,
            Some(Binding::Variable(_)) => is_function,
            None => false,
        };

        if conflict {
            Err(Error::new(
                ErrorImpl::DuplicateDeclaration {
                    name: name.to_string(),
                },
                position.clone(),
            ))
        } else {
            Ok(())
        }
    }

    pub fn declare_variable(&mut self, name: &str, type_: Type, position: Position) -> Result<(), Error> {
        self.check_outer_conflict(name, false, &position)?;
        self.env.current_mut().declare_variable(name, type_, position)
    }

    pub fn declare_function(&mut self, name: &str, sig: FunctionSig, position: Position) -> Result<(), Error> {
        self.check_outer_conflict(name, true, &position)?;
        self.env.current_mut().declare_function(name, sig, position)
    }
}

fn type_mismatch(expected: Type, received: Type, position: Position) -> Error {
    Error::new(
        ErrorImpl::TypeMatchError {
            expected: expected.to_string(),
            received: received.to_string(),
        },
        position,
    )
}

/// Types an expression against `env` without changing it.
pub fn type_check_expr(env: &TypeEnvironment, expr: &Expr) -> Result<Type, Error> {
    let position = expr.span.start.clone();

    match &expr.kind {
        ExprKind::None => Ok(Type::NoneType),
        ExprKind::Bool(_) => Ok(Type::Bool),
        ExprKind::Int(_) => Ok(Type::Int),
        ExprKind::Identifier(name) => env.lookup_variable(name).ok_or_else(|| {
            Error::new(ErrorImpl::NotAVariable { name: name.clone() }, position)
        }),
        ExprKind::Call { name, args } => {
            let Some(sig) = env.lookup_function(name) else {
                return Err(Error::new(ErrorImpl::NotAFunction { name: name.clone() }, position));
            };

            if args.len() != sig.params.len() {
                return Err(Error::new(
                    ErrorImpl::UnexpectedArguments {
                        expected: sig.params.len(),
                        received: args.len(),
                    },
                    position,
                ));
            }

            for (index, (arg, expected)) in args.iter().zip(sig.params.iter()).enumerate() {
                let received = type_check_expr(env, arg)?;
                if received != *expected {
                    return Err(Error::new(
                        ErrorImpl::ArgumentTypeMatchError {
                            expected: expected.to_string(),
                            received: received.to_string(),
                            index,
                        },
                        arg.span.start.clone(),
                    ));
                }
            }

            Ok(sig.ret)
        }
        ExprKind::Print(arg) => type_check_expr(env, arg),
        ExprKind::Unary { op, operand } => {
            let operand_type = type_check_expr(env, operand)?;
            let expected = match op {
                UnaryOp::Neg => Type::Int,
                UnaryOp::Not => Type::Bool,
            };

            if operand_type != expected {
                return Err(Error::new(
                    ErrorImpl::UnaryOperatorTypeError {
                        operator: op.to_string(),
                        operand: operand_type.to_string(),
                    },
                    position,
                ));
            }

            Ok(expected)
        }
        ExprKind::Binary { op, left, right } => {
            let left_type = type_check_expr(env, left)?;
            let right_type = type_check_expr(env, right)?;

            let both = |type_: Type| left_type == type_ && right_type == type_;
            let (valid, result) = match op {
                BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::FloorDiv | BinaryOp::Mod => {
                    (both(Type::Int), Type::Int)
                }
                BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => (both(Type::Int), Type::Bool),
                BinaryOp::Eq | BinaryOp::Ne => (true, Type::Bool),
                BinaryOp::Is => (both(Type::NoneType), Type::Bool),
            };

            if !valid {
                return Err(Error::new(
                    ErrorImpl::BinaryOperatorTypeError {
                        operator: op.to_string(),
                        left: left_type.to_string(),
                        right: right_type.to_string(),
                    },
                    position,
                ));
            }

            Ok(result)
        }
    }
}

fn check_condition(checker: &TypeChecker, cond: &Expr) -> Result<(), Error> {
    let cond_type = type_check_expr(&checker.env, cond)?;
    if cond_type != Type::Bool {
        return Err(Error::new(
            ErrorImpl::ConditionTypeError {
                received: cond_type.to_string(),
            },
            cond.span.start.clone(),
        ));
    }
    Ok(())
}

fn type_check_body(checker: &mut TypeChecker, body: &[Stmt]) -> Result<(), Error> {
    for stmt in body.iter() {
        type_check_stmt(checker, stmt)?;
    }
    Ok(())
}

/// Checks a statement after its block's declaration prefix.
///
/// Returns the type of the value the statement produces, `NoType` if none.
pub fn type_check_stmt(checker: &mut TypeChecker, stmt: &Stmt) -> Result<Type, Error> {
    let position = stmt.span.start.clone();

    match &stmt.kind {
        StmtKind::Init { name, .. } => Err(Error::new(
            ErrorImpl::LateInitialization { name: name.clone() },
            position,
        )),
        StmtKind::FunctionDef { name, .. } => {
            let error = if checker.in_function() {
                ErrorImpl::NestedFunctionDefinition { name: name.clone() }
            } else {
                ErrorImpl::LateFunctionDefinition { name: name.clone() }
            };
            Err(Error::new(error, position))
        }
        StmtKind::Return(expr) => {
            let Some(ret) = checker.function_ret else {
                return Err(Error::new(ErrorImpl::ReturnOutsideFunction, position));
            };

            let value_type = type_check_expr(&checker.env, expr)?;
            if value_type != ret {
                return Err(Error::new(
                    ErrorImpl::ReturnTypeMatchError {
                        expected: ret.to_string(),
                        received: value_type.to_string(),
                    },
                    position,
                ));
            }

            Ok(value_type)
        }
        StmtKind::Assign { name, value } => {
            let Some(var_type) = checker.env.lookup_variable(name) else {
                return Err(Error::new(ErrorImpl::NotAVariable { name: name.clone() }, position));
            };

            if checker.in_function() && !checker.env.is_local(name) {
                return Err(Error::new(
                    ErrorImpl::NonLocalAssignment { name: name.clone() },
                    position,
                ));
            }

            let value_type = type_check_expr(&checker.env, value)?;
            if value_type != var_type {
                return Err(type_mismatch(var_type, value_type, value.span.start.clone()));
            }

            Ok(Type::NoType)
        }
        StmtKind::If {
            cond,
            then_body,
            elif,
            else_body,
        } => {
            check_condition(checker, cond)?;
            type_check_body(checker, then_body)?;

            if let Some((elif_cond, elif_body)) = elif {
                check_condition(checker, elif_cond)?;
                type_check_body(checker, elif_body)?;
            }

            type_check_body(checker, else_body)?;
            Ok(Type::NoType)
        }
        StmtKind::While { cond, body } => {
            check_condition(checker, cond)?;
            type_check_body(checker, body)?;
            Ok(Type::NoType)
        }
        StmtKind::Pass => Ok(Type::NoType),
        StmtKind::Expr(expr) => type_check_expr(&checker.env, expr),
    }
}

/// Folds the leading `Init`/`FunctionDef` statements of a block into the
/// innermost scope and returns how many there were.
pub fn collect_declarations(checker: &mut TypeChecker, block: &[Stmt]) -> Result<usize, Error> {
    let mut count = 0;

    for stmt in block.iter() {
        let position = stmt.span.start.clone();

        match &stmt.kind {
            StmtKind::Init { name, type_, value } => {
                let value_type = type_check_expr(&checker.env, value)?;
                if value_type != *type_ {
                    return Err(type_mismatch(*type_, value_type, value.span.start.clone()));
                }

                checker.declare_variable(name, *type_, position)?;
            }
            StmtKind::FunctionDef { name, params, ret, .. } => {
                if checker.in_function() {
                    return Err(Error::new(
                        ErrorImpl::NestedFunctionDefinition { name: name.clone() },
                        position,
                    ));
                }
                if is_reserved(name) {
                    return Err(Error::new(ErrorImpl::ReservedName { name: name.clone() }, position));
                }

                let sig = FunctionSig {
                    params: params.iter().map(|param| param.type_).collect(),
                    ret: *ret,
                };
                checker.declare_function(name, sig, position)?;
            }
            _ => break,
        }

        count += 1;
    }

    Ok(count)
}

fn check_function(checker: &mut TypeChecker, params: &[Param], ret: Type, body: &[Stmt]) -> Result<(), Error> {
    // Parameters are declared in the function's own block, next to its locals
    let mut layer = Environment::new();
    for param in params.iter() {
        layer.declare_variable(&param.name, param.type_, param.span.start.clone())?;
    }

    checker.env.push_layer(layer);
    checker.function_ret = Some(ret);

    let result = collect_declarations(checker, body).and_then(|prefix| type_check_body(checker, &body[prefix..]));

    checker.function_ret = None;
    checker.env.pop_layer();

    result
}

/// Checks a whole unit, optionally on top of the top-level declarations of
/// earlier units.
pub fn type_check_seeded(program: &Program, seed: Option<&Environment>) -> Result<Analysis, Error> {
    let env = match seed {
        Some(seed) => TypeEnvironment::seeded(seed),
        None => TypeEnvironment::new(),
    };
    let mut checker = TypeChecker::new(env);

    let prefix = collect_declarations(&mut checker, &program.body)?;

    let mut result_type = Type::NoneType;
    for stmt in program.body[prefix..].iter() {
        let stmt_type = type_check_stmt(&mut checker, stmt)?;
        if stmt_type.is_value() {
            result_type = stmt_type;
        }
    }

    for stmt in program.body[..prefix].iter() {
        if let StmtKind::FunctionDef { name, params, ret, body } = &stmt.kind {
            debug!(function = name.as_str(), "checking function body");
            check_function(&mut checker, params, *ret, body)?;
        }
    }

    debug!(result = %result_type, "type checked program");

    Ok(Analysis {
        result_type,
        environment: checker.env.flatten(),
    })
}

pub fn type_check(program: &Program) -> Result<Analysis, Error> {
    type_check_seeded(program, None)
}
