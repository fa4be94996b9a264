pub mod flatten;
pub mod vtable;

use std::collections::{HashMap, HashSet};

use crate::diagnostics::CompileError;
use crate::parser::ast::*;
use crate::span::Spanned;
use crate::typeck::ClassTable;
use flatten::flatten;
use vtable::VTableBuilder;

/// Lowers a validated program to target text.
///
/// All class declarations are compiled first, an ancestor always before
/// its descendants, then the top-level statement. The result is one
/// fragment per emitted definition or statement, joined by newlines.
pub fn lower<'p>(program: &'p Program, table: &'p ClassTable<'p>) -> Result<String, CompileError> {
    let mut lowerer = Lowerer {
        table,
        vtables: VTableBuilder::new(),
        emitted: HashSet::new(),
        code: Vec::new(),
    };

    for class in &program.classes {
        lowerer.compile_class(&class.node)?;
    }

    let mut scope = Scope::top_level();
    lowerer.emit_statement(&program.statement, &mut scope)?;

    let mut out = lowerer.code.join("\n");
    out.push('\n');
    Ok(out)
}

/// Names visible while rendering one statement context.
struct Scope {
    /// Fields reachable through the implicit `self` parameter.
    fields: HashSet<String>,
    /// Parameters and declared variables; these shadow fields.
    locals: HashSet<String>,
    /// Instance variable → declared class, for dispatch resolution.
    bindings: HashMap<String, String>,
}

impl Scope {
    fn top_level() -> Self {
        Self {
            fields: HashSet::new(),
            locals: HashSet::new(),
            bindings: HashMap::new(),
        }
    }

    /// Field references go through `self`; locals shadow them.
    fn render_ident(&self, name: &str) -> String {
        if !self.locals.contains(name) && self.fields.contains(name) {
            format!("self.{name}")
        } else {
            name.to_string()
        }
    }
}

struct Lowerer<'p> {
    table: &'p ClassTable<'p>,
    vtables: VTableBuilder<'p>,
    emitted: HashSet<String>,
    code: Vec<String>,
}

impl<'p> Lowerer<'p> {
    fn compile_class(&mut self, class: &'p ClassDecl) -> Result<(), CompileError> {
        let name = class.name.node.as_str();
        if !self.emitted.insert(name.to_string()) {
            return Ok(());
        }

        if let Some(parent) = self.table.parent(class)? {
            self.compile_class(parent)?;
        }
        self.vtables.build(self.table, name)?;

        for method in &class.methods {
            let text = self.render_method(class, &method.node)?;
            self.code.push(text);
        }

        let vt = self.vtables.get(name)?;
        self.code
            .push(format!("var {}_vtable = [{}];", name, vt.slots.join(", ")));
        Ok(())
    }

    fn render_method(
        &mut self,
        class: &'p ClassDecl,
        method: &'p MethodDecl,
    ) -> Result<String, CompileError> {
        let mut scope = self.method_scope(class, method)?;

        let mut sig: Vec<&str> = method.params.iter().map(|p| p.name.node.as_str()).collect();
        sig.push("self");

        let mut out = format!(
            "var {}_{} = function({}) {{\n",
            class.name.node,
            method.name.node,
            sig.join(", ")
        );
        out.push_str(&self.render_stmt(&method.body, 1, &mut scope)?);
        out.push_str("};");
        Ok(out)
    }

    fn method_scope(
        &self,
        class: &'p ClassDecl,
        method: &'p MethodDecl,
    ) -> Result<Scope, CompileError> {
        let mut fields = HashSet::new();
        let mut current = Some(class);
        while let Some(c) = current {
            for field in &c.fields {
                fields.insert(field.name.node.clone());
            }
            current = self.table.parent(c)?;
        }

        let mut locals = HashSet::new();
        let mut bindings = HashMap::new();
        for param in &method.params {
            locals.insert(param.name.node.clone());
            if let TypeExpr::Class { name, .. } = &param.ty.node {
                bindings.insert(param.name.node.clone(), name.clone());
            }
        }

        Ok(Scope { fields, locals, bindings })
    }

    /// Top-level emission: every statement becomes its own fragment;
    /// a block contributes one fragment per inner statement.
    fn emit_statement(
        &mut self,
        stmt: &'p Spanned<Stmt>,
        scope: &mut Scope,
    ) -> Result<(), CompileError> {
        match &stmt.node {
            Stmt::Block(stmts) => {
                for s in stmts {
                    self.emit_statement(s, scope)?;
                }
                Ok(())
            }
            _ => {
                let mut text = self.render_stmt(stmt, 0, scope)?;
                if text.ends_with('\n') {
                    text.pop();
                }
                self.code.push(text);
                Ok(())
            }
        }
    }

    /// Renders one statement, indented, ending with a newline. Blocks
    /// are flattened into their parent's indentation level; braces in
    /// the output come only from function, `if` and `while` forms.
    fn render_stmt(
        &mut self,
        stmt: &'p Spanned<Stmt>,
        indent: usize,
        scope: &mut Scope,
    ) -> Result<String, CompileError> {
        let ind = "\t".repeat(indent);
        match &stmt.node {
            Stmt::Block(stmts) => {
                let mut out = String::new();
                for s in stmts {
                    out.push_str(&self.render_stmt(s, indent, scope)?);
                }
                Ok(out)
            }
            Stmt::Super(_) => Err(CompileError::codegen(
                "'super' may only appear in a constructor",
            )),
            Stmt::VarDecl { ty, name, value } => self.render_var_decl(ty, name, value, indent, scope),
            Stmt::Assign { target, value } => {
                let lhs = scope.render_ident(&target.node);
                let rhs = self.render_expr(value, scope)?;
                Ok(format!("{ind}{lhs} = {rhs};\n"))
            }
            Stmt::If { condition, then_branch, else_branch } => {
                let cond = self.render_expr(condition, scope)?;
                let then_text = self.render_stmt(then_branch, indent + 1, scope)?;
                let else_text = self.render_stmt(else_branch, indent + 1, scope)?;
                Ok(format!(
                    "{ind}if ({cond}) {{\n{then_text}{ind}}} else {{\n{else_text}{ind}}}\n"
                ))
            }
            Stmt::While { condition, body } => {
                let cond = self.render_expr(condition, scope)?;
                let body_text = self.render_stmt(body, indent + 1, scope)?;
                Ok(format!("{ind}while ({cond}) {{\n{body_text}{ind}}}\n"))
            }
            Stmt::Break => Ok(format!("{ind}break;\n")),
            Stmt::Return(None) => Ok(format!("{ind}return;\n")),
            Stmt::Return(Some(value)) => {
                let rendered = self.render_expr(value, scope)?;
                Ok(format!("{ind}return {rendered};\n"))
            }
            Stmt::Print(value) => {
                let rendered = self.render_expr(value, scope)?;
                Ok(format!("{ind}console.log({rendered});\n"))
            }
            Stmt::Expr(value) => {
                let rendered = self.render_expr(value, scope)?;
                Ok(format!("{ind}{rendered};\n"))
            }
        }
    }

    fn render_var_decl(
        &mut self,
        ty: &'p Spanned<TypeExpr>,
        name: &'p Spanned<String>,
        value: &'p Spanned<Expr>,
        indent: usize,
        scope: &mut Scope,
    ) -> Result<String, CompileError> {
        let ind = "\t".repeat(indent);

        // `ClassType v = new ClassName(...)` lowers to an object
        // literal: the vtable reference first, then the flattened
        // constructor-chain fields.
        if let (TypeExpr::Class { .. }, Expr::New { class, args, .. }) = (&ty.node, &value.node) {
            let decl = self.table.resolve(&class.node)?;
            self.compile_class(decl)?;

            let mut rendered_args = Vec::with_capacity(args.len());
            for arg in args {
                rendered_args.push(self.render_expr(arg, scope)?);
            }
            let inits = flatten(self.table, decl, &rendered_args)?;

            scope.locals.insert(name.node.clone());
            scope.bindings.insert(name.node.clone(), class.node.clone());

            let mut out = format!(
                "{ind}var {} = {{\n{ind}\tvtable: {}_vtable",
                name.node, class.node
            );
            for (field, init) in inits.iter() {
                out.push_str(&format!(",\n{ind}\t{field}: {init}"));
            }
            out.push_str(&format!("\n{ind}}};\n"));
            return Ok(out);
        }

        let rendered = self.render_expr(value, scope)?;
        scope.locals.insert(name.node.clone());
        Ok(format!("{ind}var {} = {rendered};\n", name.node))
    }

    fn render_expr(
        &mut self,
        expr: &'p Spanned<Expr>,
        scope: &mut Scope,
    ) -> Result<String, CompileError> {
        match &expr.node {
            Expr::IntLit(n) => Ok(n.to_string()),
            Expr::BoolLit(b) => Ok(b.to_string()),
            Expr::Var(name) => Ok(scope.render_ident(name)),
            Expr::BinOp { op, lhs, rhs } => {
                let left = self.render_operand(lhs, *op, false, scope)?;
                let right = self.render_operand(rhs, *op, true, scope)?;
                Ok(format!("{} {} {}", left, op.symbol(), right))
            }
            Expr::New { class, .. } => Err(CompileError::codegen(format!(
                "'new {}' may only appear on the right-hand side of a variable declaration",
                class.node
            ))),
            Expr::MethodCall { receiver, method, args } => {
                let class_name = scope
                    .bindings
                    .get(&receiver.node)
                    .cloned()
                    .ok_or_else(|| CompileError::unbound_receiver(&receiver.node))?;
                let decl = self.table.resolve(&class_name)?;
                self.compile_class(decl)?;
                let offset = self
                    .vtables
                    .get(&class_name)?
                    .offset_of(&method.node, &class_name)?;

                let mut parts = Vec::with_capacity(args.len() + 1);
                for arg in args {
                    parts.push(self.render_expr(arg, scope)?);
                }
                parts.push(receiver.node.clone());
                Ok(format!(
                    "{}.vtable[{}]({})",
                    receiver.node,
                    offset,
                    parts.join(", ")
                ))
            }
        }
    }

    fn render_operand(
        &mut self,
        operand: &'p Spanned<Expr>,
        parent: BinOp,
        is_rhs: bool,
        scope: &mut Scope,
    ) -> Result<String, CompileError> {
        let text = self.render_expr(operand, scope)?;
        if let Expr::BinOp { op, .. } = &operand.node {
            let needs_parens = op.precedence() < parent.precedence()
                || (is_rhs
                    && op.precedence() == parent.precedence()
                    && matches!(parent, BinOp::Sub | BinOp::Div));
            if needs_parens {
                return Ok(format!("({text})"));
            }
        }
        Ok(text)
    }
}
