//! The Q/Hermes abstract syntax tree.
//!
//! Nodes are plain tagged variants (one sum type for expressions, one for statements), dispatched
//! over with an exhaustive `match` in [`crate::eval`] rather than one `Eval` method per node type.
//!
//! Every node implements [`std::fmt::Display`], reconstructing Q/Hermes source text. This backs
//! [`crate::value::inspect`]'s rendering of a function's body.

use std::fmt;

use crate::token::TokenKind;

/// The root node: a whole parsed program.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

/// A `{ ... }` body, shared by `if`/`else`/`func`/`for`. Blocks do not introduce their own scope:
/// evaluating a `Block` reuses the caller's environment, so a `var` inside one is visible to the
/// caller after the block finishes (only a function call opens a new frame).
#[derive(Debug, Clone, Default)]
pub struct Block {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Var { name: String, value: Expr },
    Assign { name: String, value: Expr },
    Return { value: Option<Expr> },
    Break,
    Expression(Expr),
}

#[derive(Debug, Clone)]
pub struct IfClause {
    pub cond: Expr,
    pub then: Block,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Identifier(String),
    IntegerLit(i64),
    BooleanLit(bool),
    NullLit,
    Prefix {
        op: TokenKind,
        right: Box<Expr>,
    },
    Infix {
        op: TokenKind,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    If {
        clauses: Vec<IfClause>,
        else_block: Option<Block>,
    },
    /// Parameter names, in declaration order. Names are only required to be unique when the
    /// function is called and its arguments are bound; the parser does not enforce it.
    Func {
        params: Vec<String>,
        body: Block,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    For {
        body: Block,
    },
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.statements {
            write!(f, "{stmt}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stmt in &self.statements {
            write!(f, "{stmt}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Var { name, value } => write!(f, "var {name} = {value};"),
            Stmt::Assign { name, value } => write!(f, "{name} = {value};"),
            Stmt::Return { value: Some(v) } => write!(f, "return {v};"),
            Stmt::Return { value: None } => write!(f, "return;"),
            Stmt::Break => write!(f, "break;"),
            Stmt::Expression(expr) => write!(f, "{expr}"),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Identifier(name) => f.write_str(name),
            Expr::IntegerLit(value) => write!(f, "{value}"),
            Expr::BooleanLit(value) => write!(f, "{value}"),
            Expr::NullLit => f.write_str("null"),
            Expr::Prefix { op, right } => write!(f, "({op}{right})"),
            Expr::Infix { op, left, right } => write!(f, "({left} {op} {right})"),
            Expr::If { clauses, else_block } => {
                for (i, clause) in clauses.iter().enumerate() {
                    if i == 0 {
                        write!(f, "if")?;
                    } else {
                        write!(f, "else if")?;
                    }
                    write!(f, "({}) {{{}}}", clause.cond, clause.then)?;
                }
                if let Some(block) = else_block {
                    write!(f, "else {{{block}}}")?;
                }
                Ok(())
            }
            Expr::Func { params, body } => {
                write!(f, "func({}) {{\n{}\n}}", params.join(", "), body)
            }
            Expr::Call { callee, args } => {
                let args = args.iter().map(ToString::to_string).collect::<Vec<_>>();
                write!(f, "{callee}({})", args.join(", "))
            }
            Expr::For { body } => write!(f, "for {{{body}}}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_function_body_for_inspect() {
        let func = Expr::Func {
            params: vec!["x".to_string(), "y".to_string()],
            body: Block {
                statements: vec![Stmt::Expression(Expr::Infix {
                    op: TokenKind::Plus,
                    left: Box::new(Expr::Identifier("x".to_string())),
                    right: Box::new(Expr::Identifier("y".to_string())),
                })],
            },
        };
        assert_eq!(func.to_string(), "func(x, y) {\n(x + y)\n}");
    }
}
