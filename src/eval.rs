//! The tree-walking evaluator.
//!
//! Each AST node is evaluated by a free function taking an environment and an `in_loop` flag,
//! returning a [`Flow`] rather than a bare [`Value`]: this is how `return`/`break` unwind through
//! nested blocks without being folded into the value type itself.

use std::rc::Rc;

use crate::ast;
use crate::env::{EnvRef, Environment};
use crate::error::EvalError;
use crate::token::TokenKind;
use crate::value::{FunctionValue, Value};

/// What evaluating a statement or expression produced, as far as control flow goes.
///
/// Only statements inside a block can produce anything other than `Flow::Value` — `return` and
/// `break` are statements, not expressions, so they never appear as a sub-expression's result.
/// `If` and `For` are the two expression forms that evaluate a block internally and must
/// therefore be able to carry a `Return`/`Break` back out to their caller.
#[derive(Debug, Clone)]
pub enum Flow {
    Value(Value),
    Return(Value),
    Break,
}

/// Unwraps a `Result<Flow, EvalError>`, binding the plain value if there is one and otherwise
/// returning the enclosing function early with the `Return`/`Break` flow unchanged. This is how
/// a `return` ten calls deep inside nested `if`s unwinds all the way to the call boundary.
macro_rules! value_of {
    ($e:expr) => {
        match $e? {
            Flow::Value(v) => v,
            other => return Ok(other),
        }
    };
}

/// Evaluates a whole program against `env` and returns its final value.
///
/// The program is the outermost block: a top-level `return` terminates evaluation with the
/// returned value rather than propagating further (there is nothing above it to propagate to).
pub fn eval_program(program: &ast::Program, env: &EnvRef) -> Result<Value, EvalError> {
    match eval_statements(&program.statements, env, false, false)? {
        Flow::Value(v) => Ok(v),
        Flow::Return(v) => Ok(v),
        Flow::Break => Err(EvalError::BreakOutsideLoop),
    }
}

/// Evaluates a `{ ... }` body. Blocks do not introduce their own scope (`env` is reused as-is)
/// and always let `return` bubble past them to the nearest function call.
fn eval_block(block: &ast::Block, env: &EnvRef, in_loop: bool) -> Result<Flow, EvalError> {
    eval_statements(&block.statements, env, in_loop, true)
}

fn eval_statements(
    stmts: &[ast::Stmt],
    env: &EnvRef,
    in_loop: bool,
    bubble_return: bool,
) -> Result<Flow, EvalError> {
    let mut result = Flow::Value(Value::Null);
    for stmt in stmts {
        match eval_stmt(stmt, env, in_loop)? {
            Flow::Return(v) => {
                return Ok(if bubble_return {
                    Flow::Return(v)
                } else {
                    Flow::Value(v)
                });
            }
            Flow::Break => return Ok(Flow::Break),
            value @ Flow::Value(_) => result = value,
        }
    }
    Ok(result)
}

fn eval_stmt(stmt: &ast::Stmt, env: &EnvRef, in_loop: bool) -> Result<Flow, EvalError> {
    match stmt {
        ast::Stmt::Var { name, value } => {
            let v = value_of!(eval_expr(value, env, in_loop));
            env.borrow_mut().set(name.clone(), v.clone());
            Ok(Flow::Value(v))
        }
        ast::Stmt::Assign { name, value } => {
            let v = value_of!(eval_expr(value, env, in_loop));
            env.borrow_mut().assign(name, v.clone())?;
            Ok(Flow::Value(v))
        }
        ast::Stmt::Return { value: Some(expr) } => {
            let v = value_of!(eval_expr(expr, env, in_loop));
            Ok(Flow::Return(v))
        }
        ast::Stmt::Return { value: None } => Ok(Flow::Return(Value::Null)),
        ast::Stmt::Break => {
            if in_loop {
                Ok(Flow::Break)
            } else {
                Err(EvalError::BreakOutsideLoop)
            }
        }
        ast::Stmt::Expression(expr) => eval_expr(expr, env, in_loop),
    }
}

fn eval_expr(expr: &ast::Expr, env: &EnvRef, in_loop: bool) -> Result<Flow, EvalError> {
    match expr {
        ast::Expr::Identifier(name) => env
            .borrow()
            .get(name)
            .map(Flow::Value)
            .ok_or_else(|| EvalError::NameNotFound { name: name.clone() }),
        ast::Expr::IntegerLit(n) => Ok(Flow::Value(Value::Integer(*n))),
        ast::Expr::BooleanLit(b) => Ok(Flow::Value(Value::Boolean(*b))),
        ast::Expr::NullLit => Ok(Flow::Value(Value::Null)),
        ast::Expr::Prefix { op, right } => {
            let v = value_of!(eval_expr(right, env, in_loop));
            Ok(Flow::Value(eval_prefix(*op, v)?))
        }
        ast::Expr::Infix { op, left, right } => {
            let l = value_of!(eval_expr(left, env, in_loop));
            let r = value_of!(eval_expr(right, env, in_loop));
            Ok(Flow::Value(eval_infix(*op, l, r)?))
        }
        ast::Expr::If { clauses, else_block } => {
            for clause in clauses {
                let cond = value_of!(eval_expr(&clause.cond, env, in_loop));
                if cond.is_truthy() {
                    return eval_block(&clause.then, env, in_loop);
                }
            }
            match else_block {
                Some(block) => eval_block(block, env, in_loop),
                None => Ok(Flow::Value(Value::Null)),
            }
        }
        ast::Expr::Func { params, body } => Ok(Flow::Value(Value::Function(FunctionValue {
            params: Rc::new(params.clone()),
            body: Rc::new(body.clone()),
            env: env.clone(),
        }))),
        ast::Expr::Call { callee, args } => eval_call(callee, args, env, in_loop),
        ast::Expr::For { body } => loop {
            match eval_block(body, env, true)? {
                Flow::Break => return Ok(Flow::Value(Value::Null)),
                Flow::Return(v) => return Ok(Flow::Return(v)),
                Flow::Value(_) => continue,
            }
        },
    }
}

fn eval_call(
    callee: &ast::Expr,
    args: &[ast::Expr],
    env: &EnvRef,
    in_loop: bool,
) -> Result<Flow, EvalError> {
    let callee_value = value_of!(eval_expr(callee, env, in_loop));
    let func = match callee_value {
        Value::Function(f) => f,
        other => {
            return Err(EvalError::NotCallable {
                type_name: other.type_name(),
            })
        }
    };

    let mut arg_values = Vec::with_capacity(args.len());
    for arg in args {
        arg_values.push(value_of!(eval_expr(arg, env, in_loop)));
    }
    if arg_values.len() != func.params.len() {
        return Err(EvalError::ArityMismatch {
            expected: func.params.len(),
            got: arg_values.len(),
        });
    }

    let call_env = Environment::new_enclosed(func.env.clone());
    for (name, value) in func.params.iter().zip(arg_values) {
        call_env.borrow_mut().set(name.clone(), value);
    }

    log::debug!("calling function with {} argument(s)", func.params.len());
    match eval_block(&func.body, &call_env, false)? {
        Flow::Return(v) | Flow::Value(v) => Ok(Flow::Value(v)),
        Flow::Break => Err(EvalError::BreakOutsideLoop),
    }
}

fn b2i(b: bool) -> i64 {
    if b {
        1
    } else {
        0
    }
}

fn eval_prefix(op: TokenKind, value: Value) -> Result<Value, EvalError> {
    match op {
        TokenKind::Bang => match value {
            Value::Integer(n) => Ok(Value::Boolean(n == 0)),
            Value::Boolean(b) => Ok(Value::Boolean(!b)),
            Value::Null => Ok(Value::Boolean(true)),
            Value::Function(_) => Err(EvalError::UnsupportedOperation {
                op: "!".to_string(),
                type_name: "function",
            }),
        },
        TokenKind::Minus => match value {
            Value::Integer(n) => Ok(Value::Integer(n.wrapping_neg())),
            Value::Boolean(b) => Ok(Value::Integer(if b { -1 } else { 0 })),
            other => Err(EvalError::UnsupportedOperation {
                op: "-".to_string(),
                type_name: other.type_name(),
            }),
        },
        other => unreachable!("parser never produces a prefix operator other than ! or -: {other}"),
    }
}

/// Dispatches a binary operator on the pair of runtime types involved. This table is unusual —
/// mixed Integer/Boolean/Null operands coerce in specific, non-obvious ways — and is preserved
/// bit-for-bit from the source language's behavior.
fn eval_infix(op: TokenKind, left: Value, right: Value) -> Result<Value, EvalError> {
    match (&left, &right) {
        (Value::Integer(a), Value::Integer(b)) => integer_infix(op, *a, *b),
        (Value::Integer(a), Value::Boolean(b)) => integer_infix(op, *a, b2i(*b)),
        (Value::Boolean(a), Value::Integer(b)) => integer_infix(op, b2i(*a), *b),
        (Value::Boolean(a), Value::Boolean(b)) => boolean_infix(op, *a, *b),
        (Value::Null, Value::Null) => null_vs_null(op),
        (Value::Null, _) => null_rules(op, &right, true),
        (_, Value::Null) => null_rules(op, &left, false),
        _ => Err(EvalError::UnsupportedInfix {
            op: op.to_string(),
            left: left.type_name(),
            right: right.type_name(),
        }),
    }
}

fn integer_infix(op: TokenKind, a: i64, b: i64) -> Result<Value, EvalError> {
    use TokenKind::*;
    match op {
        Plus => Ok(Value::Integer(a.wrapping_add(b))),
        Minus => Ok(Value::Integer(a.wrapping_sub(b))),
        Star => Ok(Value::Integer(a.wrapping_mul(b))),
        Slash if b == 0 => Err(EvalError::DivisionByZero),
        Slash => Ok(Value::Integer(a.wrapping_div(b))),
        Percent if b == 0 => Err(EvalError::ModuloByZero),
        Percent => Ok(Value::Integer(a.wrapping_rem(b))),
        Lt => Ok(Value::Boolean(a < b)),
        LtEq => Ok(Value::Boolean(a <= b)),
        Gt => Ok(Value::Boolean(a > b)),
        GtEq => Ok(Value::Boolean(a >= b)),
        Eq => Ok(Value::Boolean(a == b)),
        NotEq => Ok(Value::Boolean(a != b)),
        // Lazy-value selectors, not boolean short-circuit: the deciding operand is returned as-is.
        And => Ok(Value::Integer(if a == 0 { a } else { b })),
        Or => Ok(Value::Integer(if a != 0 { a } else { b })),
        _ => Err(EvalError::UnsupportedInfix {
            op: op.to_string(),
            left: "integer",
            right: "integer",
        }),
    }
}

fn boolean_infix(op: TokenKind, a: bool, b: bool) -> Result<Value, EvalError> {
    use TokenKind::*;
    match op {
        Eq => Ok(Value::Boolean(a == b)),
        NotEq => Ok(Value::Boolean(a != b)),
        And => Ok(Value::Boolean(a && b)),
        Or => Ok(Value::Boolean(a || b)),
        Plus | Minus | Star | Slash | Percent | Lt | LtEq | Gt | GtEq => {
            integer_infix(op, b2i(a), b2i(b))
        }
        _ => Err(EvalError::UnsupportedInfix {
            op: op.to_string(),
            left: "boolean",
            right: "boolean",
        }),
    }
}

/// One side is `Null`, the other is `non_null`. `is_null_left` says which side `Null` was on,
/// since `<`/`>`/`<=`/`>=` are not symmetric ("Null is less than anything non-null").
fn null_rules(op: TokenKind, non_null: &Value, is_null_left: bool) -> Result<Value, EvalError> {
    use TokenKind::*;
    match op {
        Eq => Ok(Value::Boolean(false)),
        NotEq => Ok(Value::Boolean(true)),
        Lt | LtEq => Ok(Value::Boolean(is_null_left)),
        Gt | GtEq => Ok(Value::Boolean(!is_null_left)),
        And => Ok(if non_null.is_truthy() {
            Value::Null
        } else {
            non_null.clone()
        }),
        Or => Ok(if non_null.is_truthy() {
            non_null.clone()
        } else {
            Value::Null
        }),
        _ => Err(EvalError::UnsupportedInfix {
            op: op.to_string(),
            left: "null",
            right: non_null.type_name(),
        }),
    }
}

fn null_vs_null(op: TokenKind) -> Result<Value, EvalError> {
    use TokenKind::*;
    match op {
        Eq | LtEq | GtEq => Ok(Value::Boolean(true)),
        NotEq | Lt | Gt => Ok(Value::Boolean(false)),
        And | Or => Ok(Value::Null),
        _ => Err(EvalError::UnsupportedInfix {
            op: op.to_string(),
            left: "null",
            right: "null",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn run(src: &str) -> Value {
        let (program, errors) = parse(src);
        assert!(errors.is_empty(), "unexpected parse errors: {errors:?}");
        let env = Environment::new();
        eval_program(&program, &env).expect("eval should succeed")
    }

    fn run_err(src: &str) -> EvalError {
        let (program, errors) = parse(src);
        assert!(errors.is_empty(), "unexpected parse errors: {errors:?}");
        let env = Environment::new();
        eval_program(&program, &env).expect_err("eval should fail")
    }

    #[test]
    fn arithmetic_precedence() {
        assert!(matches!(run("5 + 5 + 5 + 5 - 10"), Value::Integer(10)));
        assert!(matches!(
            run("(5 + 10 * 2 + 15 / 3) * 2 + -10"),
            Value::Integer(50)
        ));
    }

    #[test]
    fn logical_operators_on_booleans() {
        assert!(matches!(
            run("true && false || true"),
            Value::Boolean(true)
        ));
    }

    #[test]
    fn null_comparisons() {
        assert!(matches!(run("null > 0"), Value::Boolean(false)));
        assert!(matches!(run("null < 0"), Value::Boolean(true)));
        assert!(matches!(run("null == null"), Value::Boolean(true)));
    }

    #[test]
    fn null_logical_selectors() {
        assert!(matches!(run("1 || null"), Value::Integer(1)));
        assert!(matches!(run("0 || null"), Value::Null));
    }

    #[test]
    fn if_else_if_chain() {
        let src = "if (1 > 2) { 10 } else if (2 > 1) { 20 } else { 30 }";
        assert!(matches!(run(src), Value::Integer(20)));
    }

    #[test]
    fn nested_return_unwinds_one_function() {
        let src = "if (10 > 1) { if (10 > 1) { return 10; } return 1; }";
        assert!(matches!(run(src), Value::Integer(10)));
    }

    #[test]
    fn variable_bindings() {
        let src = "var a = 5; var b = a; var c = a + b + 5; c;";
        assert!(matches!(run(src), Value::Integer(15)));
    }

    #[test]
    fn closures_capture_environment() {
        let src = "var add = func(x, y) { x + y; }; add(5 + 5, add(5, 5))";
        assert!(matches!(run(src), Value::Integer(20)));
    }

    #[test]
    fn immediately_invoked_function() {
        assert!(matches!(run("func(x) { x; }(5)"), Value::Integer(5)));
    }

    #[test]
    fn for_loop_with_break() {
        let src = "var i = 0; for { if (i >= 3) { break; } i = i + 1; } i";
        assert!(matches!(run(src), Value::Integer(3)));
    }

    #[test]
    fn blocks_do_not_introduce_scope() {
        let src = "var x = 1; if (true) { x = 2; } x";
        assert!(matches!(run(src), Value::Integer(2)));
    }

    #[test]
    fn break_outside_loop_is_an_error() {
        assert!(matches!(run_err("break;"), EvalError::BreakOutsideLoop));
    }

    #[test]
    fn assigning_an_undefined_name_is_an_error() {
        assert!(matches!(
            run_err("x = 1;"),
            EvalError::UndefinedAssignTarget { .. }
        ));
    }

    #[test]
    fn calling_a_non_function_is_an_error() {
        assert!(matches!(run_err("var x = 1; x(1);"), EvalError::NotCallable { .. }));
    }

    #[test]
    fn wrong_arity_is_an_error() {
        assert!(matches!(
            run_err("func(x) { x; }(1, 2)"),
            EvalError::ArityMismatch { .. }
        ));
    }

    #[test]
    fn division_by_zero_is_an_error() {
        assert!(matches!(run_err("1 / 0;"), EvalError::DivisionByZero));
    }

    #[test]
    fn function_values_are_falsy() {
        assert!(matches!(
            run("if (func() {}) { 1 } else { 2 }"),
            Value::Integer(2)
        ));
    }
}
