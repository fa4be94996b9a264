use std::collections::{HashMap, HashSet};

use crate::diagnostics::CompileError;
use crate::parser::ast::*;
use crate::span::Spanned;

/// Name-indexed view of the program's class declarations.
///
/// Built once per compilation; both validation and lowering resolve
/// classes and superclass chains through it.
pub struct ClassTable<'a> {
    classes: HashMap<&'a str, &'a Spanned<ClassDecl>>,
}

impl<'a> ClassTable<'a> {
    pub fn build(program: &'a Program) -> Result<Self, CompileError> {
        let mut classes = HashMap::new();
        for class in &program.classes {
            let name = class.node.name.node.as_str();
            if classes.insert(name, class).is_some() {
                return Err(CompileError::duplicate_class(name));
            }
        }
        Ok(Self { classes })
    }

    pub fn get(&self, name: &str) -> Option<&'a ClassDecl> {
        self.classes.get(name).map(|c| &c.node)
    }

    pub fn resolve(&self, name: &str) -> Result<&'a ClassDecl, CompileError> {
        self.get(name).ok_or_else(|| CompileError::unknown_class(name))
    }

    pub fn parent(&self, class: &ClassDecl) -> Result<Option<&'a ClassDecl>, CompileError> {
        match &class.extends {
            Some(ext) => Ok(Some(self.resolve(&ext.name.node)?)),
            None => Ok(None),
        }
    }

    /// Looks `method` up on `class` and its ancestors, nearest first.
    pub fn find_method(
        &self,
        class: &'a ClassDecl,
        method: &str,
    ) -> Result<Option<&'a MethodDecl>, CompileError> {
        let mut current = Some(class);
        while let Some(c) = current {
            if let Some(m) = c.methods.iter().find(|m| m.node.name.node == method) {
                return Ok(Some(&m.node));
            }
            current = self.parent(c)?;
        }
        Ok(None)
    }

    fn is_ancestor_or_self(&self, class: &'a ClassDecl, ancestor: &str) -> Result<bool, CompileError> {
        let mut current = Some(class);
        while let Some(c) = current {
            if c.name.node == ancestor {
                return Ok(true);
            }
            current = self.parent(c)?;
        }
        Ok(false)
    }

    fn field_exists(&self, class: &'a ClassDecl, field: &str) -> Result<bool, CompileError> {
        let mut current = Some(class);
        while let Some(c) = current {
            if c.fields.iter().any(|f| f.name.node == field) {
                return Ok(true);
            }
            current = self.parent(c)?;
        }
        Ok(false)
    }
}

/// What a name in scope can be asked to do.
#[derive(Clone, Debug)]
enum Binding {
    /// Instance of a known class; method calls dispatch through it.
    Instance(String),
    /// Type-parameter typed value; erased before lowering, so no method
    /// can be resolved through it.
    Opaque,
    Primitive,
}

/// Validates the program's class structure and returns the class table
/// the lowering pass consumes.
///
/// Pass 1 registers classes and checks the inheritance graph.
/// Pass 2 checks each class body, then the top-level statement.
pub fn check(program: &Program) -> Result<ClassTable<'_>, CompileError> {
    let table = ClassTable::build(program)?;

    for class in &program.classes {
        check_hierarchy(&table, &class.node)?;
    }
    for class in &program.classes {
        check_class(&table, &class.node)?;
    }

    let mut bindings = HashMap::new();
    check_statement(&table, &program.statement, &mut bindings, 0)?;

    Ok(table)
}

/// Superclass must exist and the chain above `class` must be acyclic.
fn check_hierarchy(table: &ClassTable<'_>, class: &ClassDecl) -> Result<(), CompileError> {
    let mut seen = HashSet::new();
    seen.insert(class.name.node.as_str());
    let mut current = table.parent(class)?;
    while let Some(c) = current {
        if !seen.insert(c.name.node.as_str()) {
            return Err(CompileError::cyclic_inheritance(&class.name.node));
        }
        current = table.parent(c)?;
    }
    Ok(())
}

fn check_class<'a>(table: &ClassTable<'a>, class: &'a ClassDecl) -> Result<(), CompileError> {
    let mut field_names = HashSet::new();
    for field in &class.fields {
        if !field_names.insert(field.name.node.as_str()) {
            return Err(CompileError::type_err(
                format!(
                    "field '{}' is declared twice in class '{}'",
                    field.name.node, class.name.node
                ),
                field.name.span,
            ));
        }
    }

    for (i, method) in class.methods.iter().enumerate() {
        let dup = class.methods[..i].iter().any(|m| {
            m.node.name.node == method.node.name.node && m.node.same_signature(&method.node)
        });
        if dup {
            return Err(CompileError::type_err(
                format!(
                    "method '{}' is declared twice in class '{}' with the same signature",
                    method.node.name.node, class.name.node
                ),
                method.node.name.span,
            ));
        }
    }

    check_constructor(table, class)?;

    for method in &class.methods {
        let mut bindings = bindings_for(&method.node.params);
        check_statement(table, &method.node.body, &mut bindings, 0)?;
    }

    Ok(())
}

/// Constructor bodies are restricted to what initialization lowering
/// understands: an optional leading `super(...)` followed by field
/// assignments, possibly nested in blocks.
fn check_constructor<'a>(table: &ClassTable<'a>, class: &'a ClassDecl) -> Result<(), CompileError> {
    let ctor = &class.ctor.node;
    let mut stmts = Vec::new();
    collect_ctor_statements(&ctor.body, &mut stmts);

    let param_bindings = bindings_for(&ctor.params);

    for (i, stmt) in stmts.iter().enumerate() {
        match &stmt.node {
            Stmt::Super(args) => {
                if i != 0 {
                    return Err(CompileError::type_err(
                        "'super' must be the first statement of a constructor",
                        stmt.span,
                    ));
                }
                let parent = table.parent(class)?.ok_or_else(|| {
                    CompileError::type_err(
                        format!(
                            "class '{}' has no superclass but its constructor calls 'super'",
                            class.name.node
                        ),
                        stmt.span,
                    )
                })?;
                let expected = parent.ctor.node.params.len();
                if args.len() != expected {
                    return Err(CompileError::type_err(
                        format!(
                            "'super' passes {} argument(s) but the constructor of '{}' takes {}",
                            args.len(),
                            parent.name.node,
                            expected
                        ),
                        stmt.span,
                    ));
                }
                // Initialization forwards the instantiation's arguments by
                // position, so every ancestor constructor must fit inside
                // the arity of the constructor being instantiated.
                if expected > ctor.params.len() {
                    return Err(CompileError::type_err(
                        format!(
                            "the constructor of '{}' takes {} parameter(s) but '{}' declares only {}",
                            parent.name.node,
                            expected,
                            class.name.node,
                            ctor.params.len()
                        ),
                        stmt.span,
                    ));
                }
                for arg in args {
                    check_expr(table, arg, &param_bindings)?;
                }
            }
            Stmt::Assign { target, value } => {
                if !table.field_exists(class, &target.node)? {
                    return Err(CompileError::type_err(
                        format!(
                            "constructor of '{}' assigns to '{}', which is not a field",
                            class.name.node, target.node
                        ),
                        target.span,
                    ));
                }
                check_expr(table, value, &param_bindings)?;
            }
            _ => {
                return Err(CompileError::type_err(
                    "constructor bodies may only call 'super' and assign fields",
                    stmt.span,
                ));
            }
        }
    }

    Ok(())
}

fn collect_ctor_statements<'a>(stmt: &'a Spanned<Stmt>, out: &mut Vec<&'a Spanned<Stmt>>) {
    match &stmt.node {
        Stmt::Block(stmts) => {
            for s in stmts {
                collect_ctor_statements(s, out);
            }
        }
        _ => out.push(stmt),
    }
}

fn bindings_for(params: &[Param]) -> HashMap<String, Binding> {
    let mut bindings = HashMap::new();
    for param in params {
        bindings.insert(param.name.node.clone(), binding_of(&param.ty.node));
    }
    bindings
}

fn binding_of(ty: &TypeExpr) -> Binding {
    match ty {
        TypeExpr::Class { name, .. } => Binding::Instance(name.clone()),
        TypeExpr::Var(_) => Binding::Opaque,
        _ => Binding::Primitive,
    }
}

fn check_statement(
    table: &ClassTable<'_>,
    stmt: &Spanned<Stmt>,
    bindings: &mut HashMap<String, Binding>,
    loop_depth: usize,
) -> Result<(), CompileError> {
    match &stmt.node {
        Stmt::Block(stmts) => {
            for s in stmts {
                check_statement(table, s, bindings, loop_depth)?;
            }
            Ok(())
        }
        Stmt::Super(_) => Err(CompileError::type_err(
            "'super' is only allowed in constructors",
            stmt.span,
        )),
        Stmt::Assign { value, .. } => check_expr(table, value, bindings),
        Stmt::VarDecl { ty, name, value } => {
            check_expr(table, value, bindings)?;
            if let TypeExpr::Class { name: class_name, .. } = &ty.node {
                let declared = table.resolve(class_name)?;
                match &value.node {
                    Expr::New { class, .. } => {
                        let created = table.resolve(&class.node)?;
                        if !table.is_ancestor_or_self(created, &declared.name.node)? {
                            return Err(CompileError::type_err(
                                format!(
                                    "cannot initialize a '{}' from 'new {}'",
                                    declared.name.node, class.node
                                ),
                                value.span,
                            ));
                        }
                    }
                    _ => {
                        return Err(CompileError::type_err(
                            format!(
                                "a variable of class type '{}' must be initialized with 'new'",
                                declared.name.node
                            ),
                            value.span,
                        ));
                    }
                }
            } else if let Expr::New { class, .. } = &value.node {
                return Err(CompileError::type_err(
                    format!(
                        "cannot initialize a variable of type '{}' from 'new {}'",
                        ty.node, class.node
                    ),
                    value.span,
                ));
            }
            bindings.insert(name.node.clone(), binding_of(&ty.node));
            Ok(())
        }
        Stmt::If { condition, then_branch, else_branch } => {
            check_expr(table, condition, bindings)?;
            check_statement(table, then_branch, bindings, loop_depth)?;
            check_statement(table, else_branch, bindings, loop_depth)
        }
        Stmt::While { condition, body } => {
            check_expr(table, condition, bindings)?;
            check_statement(table, body, bindings, loop_depth + 1)
        }
        Stmt::Break => {
            if loop_depth == 0 {
                return Err(CompileError::type_err("'break' outside of a loop", stmt.span));
            }
            Ok(())
        }
        Stmt::Return(value) => {
            if let Some(v) = value {
                check_expr(table, v, bindings)?;
            }
            Ok(())
        }
        Stmt::Print(value) | Stmt::Expr(value) => check_expr(table, value, bindings),
    }
}

fn check_expr(
    table: &ClassTable<'_>,
    expr: &Spanned<Expr>,
    bindings: &HashMap<String, Binding>,
) -> Result<(), CompileError> {
    match &expr.node {
        Expr::IntLit(_) | Expr::BoolLit(_) | Expr::Var(_) => Ok(()),
        Expr::BinOp { lhs, rhs, .. } => {
            check_expr(table, lhs, bindings)?;
            check_expr(table, rhs, bindings)
        }
        Expr::New { class, args, .. } => {
            let decl = table.resolve(&class.node)?;
            let expected = decl.ctor.node.params.len();
            if args.len() != expected {
                return Err(CompileError::type_err(
                    format!(
                        "'new {}' passes {} argument(s) but its constructor takes {}",
                        class.node,
                        args.len(),
                        expected
                    ),
                    expr.span,
                ));
            }
            for arg in args {
                check_expr(table, arg, bindings)?;
            }
            Ok(())
        }
        Expr::MethodCall { receiver, method, args } => {
            for arg in args {
                check_expr(table, arg, bindings)?;
            }
            match bindings.get(&receiver.node) {
                None => Err(CompileError::unbound_receiver(&receiver.node)),
                Some(Binding::Primitive) => Err(CompileError::type_err(
                    format!("'{}' is not an object and has no methods", receiver.node),
                    receiver.span,
                )),
                Some(Binding::Opaque) => Err(CompileError::type_err(
                    format!(
                        "cannot call a method on '{}': its type is a type parameter",
                        receiver.node
                    ),
                    receiver.span,
                )),
                Some(Binding::Instance(class_name)) => {
                    let class = table.resolve(class_name)?;
                    let decl = table
                        .find_method(class, &method.node)?
                        .ok_or_else(|| CompileError::unknown_method(class_name, &method.node))?;
                    if args.len() != decl.params.len() {
                        return Err(CompileError::type_err(
                            format!(
                                "method '{}' of '{}' takes {} argument(s), {} given",
                                method.node,
                                class_name,
                                decl.params.len(),
                                args.len()
                            ),
                            expr.span,
                        ));
                    }
                    Ok(())
                }
            }
        }
    }
}
