use crate::diagnostics::CompileError;
use crate::parser::ast::{BinOp, ClassDecl, Expr, Stmt};
use crate::span::Spanned;
use crate::typeck::ClassTable;

/// Ordered field-name → initializer-text map produced by flattening a
/// constructor chain. Insertion order is emission order; writing a
/// field that is already present overwrites it in place, so ancestor
/// fields keep their early position even when a subclass re-initializes
/// them.
#[derive(Debug, Default)]
pub struct FieldInits {
    entries: Vec<(String, String)>,
}

impl FieldInits {
    fn set(&mut self, field: &str, value: String) {
        match self.entries.iter_mut().find(|(name, _)| name == field) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((field.to_string(), value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Collapses the `super`-linked constructor chain of `class` into one
/// flat initializer list for an instantiation with `actual_args`
/// (already rendered to target text by the caller).
///
/// A `super(...)` statement recurses into the superclass before the
/// remaining statements run, so ancestor fields land ahead of the
/// fields the current constructor writes. The chain forwards the
/// outermost instantiation's arguments unchanged; the argument
/// expressions written at a `super` call site are ignored.
pub fn flatten(
    table: &ClassTable<'_>,
    class: &ClassDecl,
    actual_args: &[String],
) -> Result<FieldInits, CompileError> {
    let mut inits = FieldInits::default();
    flatten_into(table, class, actual_args, &mut inits)?;
    Ok(inits)
}

fn flatten_into(
    table: &ClassTable<'_>,
    class: &ClassDecl,
    actual_args: &[String],
    inits: &mut FieldInits,
) -> Result<(), CompileError> {
    let ctor = &class.ctor.node;
    flatten_statement(table, class, actual_args, inits, &ctor.body)
}

fn flatten_statement(
    table: &ClassTable<'_>,
    class: &ClassDecl,
    actual_args: &[String],
    inits: &mut FieldInits,
    stmt: &Spanned<Stmt>,
) -> Result<(), CompileError> {
    match &stmt.node {
        Stmt::Block(stmts) => {
            for s in stmts {
                flatten_statement(table, class, actual_args, inits, s)?;
            }
            Ok(())
        }
        Stmt::Super(_) => {
            let parent = table.parent(class)?.ok_or_else(|| {
                CompileError::codegen(format!(
                    "constructor of '{}' chains to a superclass it does not have",
                    class.name.node
                ))
            })?;
            flatten_into(table, parent, actual_args, inits)
        }
        Stmt::Assign { target, value } => {
            let ctor = &class.ctor.node;
            // A bare parameter reference picks up the argument supplied
            // at the instantiation site; anything else renders as-is.
            let rendered = match param_position(ctor, &value.node) {
                Some(i) => actual_args
                    .get(i)
                    .cloned()
                    .ok_or_else(|| {
                        CompileError::codegen(format!(
                            "instantiation supplies no argument for parameter {} of '{}'",
                            i, class.name.node
                        ))
                    })?,
                None => render_init_expr(&value.node)?,
            };
            inits.set(&target.node, rendered);
            Ok(())
        }
        _ => Err(CompileError::codegen(format!(
            "constructor of '{}' contains a statement that cannot be flattened",
            class.name.node
        ))),
    }
}

fn param_position(ctor: &crate::parser::ast::Constructor, value: &Expr) -> Option<usize> {
    match value {
        Expr::Var(name) => ctor.params.iter().position(|p| &p.name.node == name),
        _ => None,
    }
}

/// Renders a constructor initializer expression. Only literal-shaped
/// expressions are meaningful here; instantiation and dispatch inside
/// an initializer are rejected.
fn render_init_expr(expr: &Expr) -> Result<String, CompileError> {
    match expr {
        Expr::IntLit(n) => Ok(n.to_string()),
        Expr::BoolLit(b) => Ok(b.to_string()),
        Expr::Var(name) => Ok(name.clone()),
        Expr::BinOp { op, lhs, rhs } => {
            let left = render_init_operand(&lhs.node, *op, false)?;
            let right = render_init_operand(&rhs.node, *op, true)?;
            Ok(format!("{} {} {}", left, op.symbol(), right))
        }
        Expr::New { .. } | Expr::MethodCall { .. } => Err(CompileError::codegen(
            "field initializers may not create objects or call methods",
        )),
    }
}

fn render_init_operand(expr: &Expr, parent: BinOp, is_rhs: bool) -> Result<String, CompileError> {
    let text = render_init_expr(expr)?;
    if let Expr::BinOp { op, .. } = expr {
        let needs_parens = op.precedence() < parent.precedence()
            || (is_rhs && op.precedence() == parent.precedence() && matches!(parent, BinOp::Sub | BinOp::Div));
        if needs_parens {
            return Ok(format!("({text})"));
        }
    }
    Ok(text)
}
