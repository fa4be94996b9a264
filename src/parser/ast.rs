use crate::span::Spanned;

/// A program is a list of class declarations followed by one top-level
/// statement (usually a block).
#[derive(Debug)]
pub struct Program {
    pub classes: Vec<Spanned<ClassDecl>>,
    pub statement: Spanned<Stmt>,
}

#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub name: Spanned<String>,
    pub type_params: Vec<Spanned<String>>,
    pub extends: Option<Extends>,
    pub fields: Vec<Field>,
    pub ctor: Spanned<Constructor>,
    pub methods: Vec<Spanned<MethodDecl>>,
}

/// Superclass reference. Type arguments are carried for arity checking but
/// erased before lowering.
#[derive(Debug, Clone)]
pub struct Extends {
    pub name: Spanned<String>,
    pub type_args: Vec<TypeExpr>,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub ty: Spanned<TypeExpr>,
    pub name: Spanned<String>,
}

#[derive(Debug, Clone)]
pub struct Constructor {
    pub params: Vec<Param>,
    pub body: Spanned<Stmt>,
}

#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub access: Access,
    pub return_type: Spanned<TypeExpr>,
    pub name: Spanned<String>,
    pub params: Vec<Param>,
    pub body: Spanned<Stmt>,
}

impl MethodDecl {
    /// Two methods share a signature iff their parameter lists are equal
    /// element by element on both name and type. A renamed parameter is a
    /// different signature.
    pub fn same_signature(&self, other: &MethodDecl) -> bool {
        self.params.len() == other.params.len()
            && self
                .params
                .iter()
                .zip(&other.params)
                .all(|(a, b)| a.name.node == b.name.node && a.ty.node == b.ty.node)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Access {
    Public,
    Private,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub ty: Spanned<TypeExpr>,
    pub name: Spanned<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Int,
    Boolean,
    Void,
    /// A class type parameter, e.g. `T` in `class Box<T>`.
    Var(String),
    Class { name: String, args: Vec<TypeExpr> },
}

impl std::fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeExpr::Int => write!(f, "int"),
            TypeExpr::Boolean => write!(f, "boolean"),
            TypeExpr::Void => write!(f, "void"),
            TypeExpr::Var(name) => write!(f, "{name}"),
            TypeExpr::Class { name, args } => {
                write!(f, "{name}<")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ">")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Block(Vec<Spanned<Stmt>>),
    /// `super(args);` — only legal as the leading statement of a
    /// constructor in a class that extends.
    Super(Vec<Spanned<Expr>>),
    Assign {
        target: Spanned<String>,
        value: Spanned<Expr>,
    },
    VarDecl {
        ty: Spanned<TypeExpr>,
        name: Spanned<String>,
        value: Spanned<Expr>,
    },
    If {
        condition: Spanned<Expr>,
        then_branch: Box<Spanned<Stmt>>,
        else_branch: Box<Spanned<Stmt>>,
    },
    While {
        condition: Spanned<Expr>,
        body: Box<Spanned<Stmt>>,
    },
    Break,
    Return(Option<Spanned<Expr>>),
    Print(Spanned<Expr>),
    Expr(Spanned<Expr>),
}

#[derive(Debug, Clone)]
pub enum Expr {
    IntLit(i64),
    BoolLit(bool),
    Var(String),
    BinOp {
        op: BinOp,
        lhs: Box<Spanned<Expr>>,
        rhs: Box<Spanned<Expr>>,
    },
    New {
        class: Spanned<String>,
        type_args: Vec<TypeExpr>,
        args: Vec<Spanned<Expr>>,
    },
    MethodCall {
        receiver: Spanned<String>,
        method: Spanned<String>,
        args: Vec<Spanned<Expr>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Eq,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Lt => "<",
            BinOp::Eq => "==",
        }
    }

    /// Binding strength, used when the emitter decides whether an operand
    /// needs parentheses.
    pub fn precedence(self) -> u8 {
        match self {
            BinOp::Lt | BinOp::Eq => 0,
            BinOp::Add | BinOp::Sub => 1,
            BinOp::Mul | BinOp::Div => 2,
        }
    }
}
