use crate::span::Span;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Syntax error: {msg}")]
    Syntax { msg: String, span: Span },

    #[error("Type error: {msg}")]
    Type { msg: String, span: Span },

    #[error("Unknown class '{name}'")]
    UnknownClass { name: String },

    #[error("Duplicate class '{name}'")]
    DuplicateClass { name: String },

    #[error("Variable '{name}' is not bound to an instance of any class")]
    UnboundReceiver { name: String },

    #[error("Class '{class}' has no method '{method}'")]
    UnknownMethod { class: String, method: String },

    #[error("Cyclic inheritance involving class '{name}'")]
    CyclicInheritance { name: String },

    #[error("Codegen error: {msg}")]
    Codegen { msg: String },
}

impl CompileError {
    pub fn syntax(msg: impl Into<String>, span: Span) -> Self {
        Self::Syntax { msg: msg.into(), span }
    }

    pub fn type_err(msg: impl Into<String>, span: Span) -> Self {
        Self::Type { msg: msg.into(), span }
    }

    pub fn unknown_class(name: impl Into<String>) -> Self {
        Self::UnknownClass { name: name.into() }
    }

    pub fn duplicate_class(name: impl Into<String>) -> Self {
        Self::DuplicateClass { name: name.into() }
    }

    pub fn unbound_receiver(name: impl Into<String>) -> Self {
        Self::UnboundReceiver { name: name.into() }
    }

    pub fn unknown_method(class: impl Into<String>, method: impl Into<String>) -> Self {
        Self::UnknownMethod { class: class.into(), method: method.into() }
    }

    pub fn cyclic_inheritance(name: impl Into<String>) -> Self {
        Self::CyclicInheritance { name: name.into() }
    }

    pub fn codegen(msg: impl Into<String>) -> Self {
        Self::Codegen { msg: msg.into() }
    }
}

/// Render a CompileError with ariadne for nice terminal output.
pub fn render_error(source: &str, _filename: &str, err: &CompileError) {
    use ariadne::{Label, Report, ReportKind, Source};

    match err {
        CompileError::Syntax { msg, span } | CompileError::Type { msg, span } => {
            let kind_str = match err {
                CompileError::Syntax { .. } => "syntax",
                CompileError::Type { .. } => "type",
                _ => unreachable!(),
            };
            Report::build(ReportKind::Error, (), span.start)
                .with_message(format!("{kind_str} error"))
                .with_label(
                    Label::new(span.start..span.end)
                        .with_message(msg),
                )
                .finish()
                .eprint(Source::from(source))
                .unwrap();
        }
        other => {
            eprintln!("error: {other}");
        }
    }
}
