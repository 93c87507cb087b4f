use std::fmt::{Display, Formatter};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Dot,
    Colon,
    SemiColon,

    Minus,
    Plus,
    Slash,
    Star,

    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,

    Identifier,
    String,
    Number,

    Else,
    False,
    Function,
    If,
    Let,
    Return,
    True,
    Var,
    While,

    Illegal,
    Eof,
}

impl Type {
    /// The spelling used for this token type in diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Type::LeftParen => "(",
            Type::RightParen => ")",
            Type::LeftBrace => "{",
            Type::RightBrace => "}",
            Type::LeftBracket => "[",
            Type::RightBracket => "]",
            Type::Comma => ",",
            Type::Dot => ".",
            Type::Colon => ":",
            Type::SemiColon => ";",
            Type::Minus => "-",
            Type::Plus => "+",
            Type::Slash => "/",
            Type::Star => "*",
            Type::Bang => "!",
            Type::BangEqual => "!=",
            Type::Equal => "=",
            Type::EqualEqual => "==",
            Type::Greater => ">",
            Type::GreaterEqual => ">=",
            Type::Less => "<",
            Type::LessEqual => "<=",
            Type::Identifier => "IDENT",
            Type::String => "STRING",
            Type::Number => "NUMBER",
            Type::Else => "else",
            Type::False => "false",
            Type::Function => "function",
            Type::If => "if",
            Type::Let => "let",
            Type::Return => "return",
            Type::True => "true",
            Type::Var => "var",
            Type::While => "while",
            Type::Illegal => "ILLEGAL",
            Type::Eof => "EOF",
        }
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    pub ty: Type,
    // For strings this is the text between the quotes, for everything else the source slice
    pub lexeme: String,
    pub line: usize,
    pub col: usize,
}

impl Token {
    pub fn new(ty: Type, lexeme: String, line: usize, col: usize) -> Self {
        Token {
            ty,
            lexeme,
            line,
            col,
        }
    }

    pub fn eof(line: usize, col: usize) -> Self {
        Token::new(Type::Eof, String::new(), line, col)
    }

    pub fn is(&self, ty: Type) -> bool {
        self.ty == ty
    }
}
