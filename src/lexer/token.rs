use logos::Logos;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token {
    // Keywords
    #[token("class")]
    Class,
    #[token("extends")]
    Extends,
    #[token("constructor")]
    Constructor,
    #[token("super")]
    Super,
    #[token("new")]
    New,
    #[token("public")]
    Public,
    #[token("private")]
    Private,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("break")]
    Break,
    #[token("return")]
    Return,
    #[token("print")]
    Print,
    #[token("true")]
    True,
    #[token("false")]
    False,

    // Built-in type names
    #[token("int")]
    Int,
    #[token("boolean")]
    Boolean,
    #[token("void")]
    Void,

    // Literals
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    IntLit(i64),

    // Identifiers
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,

    // Operators
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("==")]
    EqEq,
    #[token("=")]
    Eq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,

    // Punctuation
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(";")]
    Semi,
    #[token(".")]
    Dot,

    // Comments (filtered out by the lexer driver)
    #[regex(r"//[^\n]*")]
    Comment,
}

/// Returns true if the given string is an Opal keyword.
pub fn is_keyword(s: &str) -> bool {
    matches!(s, "class" | "extends" | "constructor" | "super" | "new"
        | "public" | "private" | "if" | "else" | "while" | "break"
        | "return" | "print" | "true" | "false" | "int" | "boolean" | "void")
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Class => write!(f, "class"),
            Token::Extends => write!(f, "extends"),
            Token::Constructor => write!(f, "constructor"),
            Token::Super => write!(f, "super"),
            Token::New => write!(f, "new"),
            Token::Public => write!(f, "public"),
            Token::Private => write!(f, "private"),
            Token::If => write!(f, "if"),
            Token::Else => write!(f, "else"),
            Token::While => write!(f, "while"),
            Token::Break => write!(f, "break"),
            Token::Return => write!(f, "return"),
            Token::Print => write!(f, "print"),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::Int => write!(f, "int"),
            Token::Boolean => write!(f, "boolean"),
            Token::Void => write!(f, "void"),
            Token::IntLit(n) => write!(f, "{n}"),
            Token::Ident => write!(f, "identifier"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::EqEq => write!(f, "=="),
            Token::Eq => write!(f, "="),
            Token::Lt => write!(f, "<"),
            Token::Gt => write!(f, ">"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Comma => write!(f, ","),
            Token::Semi => write!(f, ";"),
            Token::Dot => write!(f, "."),
            Token::Comment => write!(f, "comment"),
        }
    }
}
