use phf::{phf_map, Map};

use crate::token::{Token, Type};

pub struct Scanner;

impl Scanner {
    const KEYWORDS: Map<&'static str, Type> = phf_map! {
        "else" => Type::Else,
        "false" => Type::False,
        "function" => Type::Function,
        "if" => Type::If,
        "let" => Type::Let,
        "return" => Type::Return,
        "true" => Type::True,
        "var" => Type::Var,
        "while" => Type::While,
    };

    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Scanner
    }

    pub fn scan_tokens<'a>(&mut self, src: &'a str) -> TokenStream<'a> {
        TokenStream::new(src)
    }

    /// Resolves an identifier against the keyword table.
    pub fn lookup_ident(ident: &str) -> Type {
        Scanner::KEYWORDS
            .get(ident)
            .copied()
            .unwrap_or(Type::Identifier)
    }
}

/// A lazy stream of tokens over a source string. Tokens are scanned one at a time on
/// request; nothing is buffered besides the current position.
pub struct TokenStream<'a> {
    src: &'a str,
    line: usize,

    // Byte offset of the first character of the current line, used for columns
    line_start: usize,

    // `start` and `current` are byte offsets to the start and end of the token being scanned
    start: usize,
    current: usize,

    // This flag is set to `true` once the eof token has been handed out by the iterator, so
    // that the iterator yields it exactly once.
    eof: bool,
}

impl<'a> TokenStream<'a> {
    pub fn new(src: &'a str) -> Self {
        TokenStream {
            src,
            line: 1,
            line_start: 0,
            start: 0,
            current: 0,
            eof: false,
        }
    }

    /// Scans the next token. Once the input is exhausted every call returns an `Eof` token.
    pub fn next_token(&mut self) -> Token {
        while !self.is_at_end() {
            self.start = self.current;
            if let Some(token) = self.scan_token() {
                return token;
            }
        }

        self.start = self.current;
        Token::eof(self.line, self.column())
    }

    fn scan_token(&mut self) -> Option<Token> {
        let c = self.advance();

        match c {
            '(' => Some(self.make_token(Type::LeftParen)),
            ')' => Some(self.make_token(Type::RightParen)),
            '{' => Some(self.make_token(Type::LeftBrace)),
            '}' => Some(self.make_token(Type::RightBrace)),
            '[' => Some(self.make_token(Type::LeftBracket)),
            ']' => Some(self.make_token(Type::RightBracket)),
            ',' => Some(self.make_token(Type::Comma)),
            '.' => Some(self.make_token(Type::Dot)),
            ':' => Some(self.make_token(Type::Colon)),
            ';' => Some(self.make_token(Type::SemiColon)),
            '-' => Some(self.make_token(Type::Minus)),
            '+' => Some(self.make_token(Type::Plus)),
            '*' => Some(self.make_token(Type::Star)),

            '!' => {
                if self.match_char('=') {
                    Some(self.make_token(Type::BangEqual))
                } else {
                    Some(self.make_token(Type::Bang))
                }
            }

            '=' => {
                if self.match_char('=') {
                    Some(self.make_token(Type::EqualEqual))
                } else {
                    Some(self.make_token(Type::Equal))
                }
            }

            '<' => {
                if self.match_char('=') {
                    Some(self.make_token(Type::LessEqual))
                } else {
                    Some(self.make_token(Type::Less))
                }
            }

            '>' => {
                if self.match_char('=') {
                    Some(self.make_token(Type::GreaterEqual))
                } else {
                    Some(self.make_token(Type::Greater))
                }
            }

            '/' => {
                if self.match_char('/') {
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                    None
                } else {
                    Some(self.make_token(Type::Slash))
                }
            }

            '"' => Some(self.string()),

            // White spaces, do nothing
            ' ' | '\t' | '\r' => None,

            '\n' => {
                self.newline();
                None
            }

            _ => {
                if c.is_ascii_digit() {
                    Some(self.number())
                } else if c.is_alphabetic() || c == '_' {
                    Some(self.identifier())
                } else {
                    Some(self.make_token(Type::Illegal))
                }
            }
        }
    }

    // No escape sequences. An unterminated string runs to the end of the input.
    fn string(&mut self) -> Token {
        let line = self.line;
        let col = self.column();

        while self.peek() != '"' && !self.is_at_end() {
            if self.advance() == '\n' {
                self.newline();
            }
        }

        let content = String::from(&self.src[self.start + 1..self.current]);

        // consume the closing "
        if !self.is_at_end() {
            self.advance();
        }

        Token::new(Type::String, content, line, col)
    }

    // Digits and dots are taken greedily, so "1.2.3" is a single (invalid) number token.
    fn number(&mut self) -> Token {
        while self.peek().is_ascii_digit() || self.peek() == '.' {
            self.advance();
        }

        self.make_token(Type::Number)
    }

    fn identifier(&mut self) -> Token {
        while self.peek().is_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let ty = Scanner::lookup_ident(&self.src[self.start..self.current]);
        self.make_token(ty)
    }

    fn peek(&self) -> char {
        self.src[self.current..].chars().next().unwrap_or('\0')
    }

    fn advance(&mut self) -> char {
        let res = self.peek();
        self.current += res.len_utf8();
        res
    }

    fn match_char(&mut self, c: char) -> bool {
        if self.is_at_end() || self.peek() != c {
            false
        } else {
            self.current += c.len_utf8();
            true
        }
    }

    fn newline(&mut self) {
        self.line += 1;
        self.line_start = self.current;
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.src.len()
    }

    fn column(&self) -> usize {
        self.start - self.line_start + 1
    }

    fn make_token(&self, ty: Type) -> Token {
        let lexeme = String::from(&self.src[self.start..self.current]);
        Token::new(ty, lexeme, self.line, self.column())
    }
}

impl<'a> Iterator for TokenStream<'a> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.eof {
            return None;
        }

        let token = self.next_token();
        if token.is(Type::Eof) {
            self.eof = true;
        }
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use crate::scanner::Scanner;
    use crate::token::{Token, Type};
    use pretty_assertions::assert_eq;

    fn types(src: &str) -> Vec<Type> {
        Scanner::new().scan_tokens(src).map(|t| t.ty).collect()
    }

    #[test]
    fn test_basic_scanning() {
        let source = "var foo = function(a, b) { return a; } // this is a comment";
        let stream = Scanner::new().scan_tokens(source);

        assert_eq!(
            stream.collect::<Vec<Token>>(),
            vec![
                Token::new(Type::Var, String::from("var"), 1, 1),
                Token::new(Type::Identifier, String::from("foo"), 1, 5),
                Token::new(Type::Equal, String::from("="), 1, 9),
                Token::new(Type::Function, String::from("function"), 1, 11),
                Token::new(Type::LeftParen, String::from("("), 1, 19),
                Token::new(Type::Identifier, String::from("a"), 1, 20),
                Token::new(Type::Comma, String::from(","), 1, 21),
                Token::new(Type::Identifier, String::from("b"), 1, 23),
                Token::new(Type::RightParen, String::from(")"), 1, 24),
                Token::new(Type::LeftBrace, String::from("{"), 1, 26),
                Token::new(Type::Return, String::from("return"), 1, 28),
                Token::new(Type::Identifier, String::from("a"), 1, 35),
                Token::new(Type::SemiColon, String::from(";"), 1, 36),
                Token::new(Type::RightBrace, String::from("}"), 1, 38),
                Token::new(Type::Eof, String::new(), 1, 60),
            ]
        );
    }

    #[test]
    fn test_two_character_operators() {
        assert_eq!(
            types("== != <= >= = ! < >"),
            vec![
                Type::EqualEqual,
                Type::BangEqual,
                Type::LessEqual,
                Type::GreaterEqual,
                Type::Equal,
                Type::Bang,
                Type::Less,
                Type::Greater,
                Type::Eof,
            ]
        );
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_eq!(
            types("let var if else while return true false function _x1 whiles"),
            vec![
                Type::Let,
                Type::Var,
                Type::If,
                Type::Else,
                Type::While,
                Type::Return,
                Type::True,
                Type::False,
                Type::Function,
                Type::Identifier,
                Type::Identifier,
                Type::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers_are_greedy() {
        let tokens: Vec<Token> = Scanner::new().scan_tokens("42 3.14 1.2.3").collect();
        let lexemes: Vec<&str> = tokens.iter().map(|t| t.lexeme.as_str()).collect();
        assert_eq!(lexemes, vec!["42", "3.14", "1.2.3", ""]);
        assert!(tokens[..3].iter().all(|t| t.is(Type::Number)));
    }

    #[test]
    fn test_strings() {
        let tokens: Vec<Token> = Scanner::new()
            .scan_tokens("\"hello world\" \"a\\nb\"")
            .collect();
        assert_eq!(tokens[0], Token::new(Type::String, String::from("hello world"), 1, 1));
        // no escape processing
        assert_eq!(tokens[1].lexeme, "a\\nb");
    }

    #[test]
    fn test_unterminated_string_reads_to_end() {
        let tokens: Vec<Token> = Scanner::new().scan_tokens("\"hello").collect();
        assert_eq!(
            tokens,
            vec![
                Token::new(Type::String, String::from("hello"), 1, 1),
                Token::new(Type::Eof, String::new(), 1, 7),
            ]
        );
    }

    #[test]
    fn test_illegal_characters_do_not_abort() {
        let tokens: Vec<Token> = Scanner::new().scan_tokens("a @ b # é").collect();
        assert_eq!(
            tokens.iter().map(|t| t.ty).collect::<Vec<Type>>(),
            vec![
                Type::Identifier,
                Type::Illegal,
                Type::Identifier,
                Type::Illegal,
                Type::Identifier,
                Type::Eof,
            ]
        );
        assert_eq!(tokens[1].lexeme, "@");
    }

    #[test]
    fn test_lines_and_comments() {
        let tokens: Vec<Token> = Scanner::new()
            .scan_tokens("// header\nx\n  y // trailing\n")
            .collect();
        assert_eq!(
            tokens,
            vec![
                Token::new(Type::Identifier, String::from("x"), 2, 1),
                Token::new(Type::Identifier, String::from("y"), 3, 3),
                Token::new(Type::Eof, String::new(), 4, 1),
            ]
        );
    }

    #[test]
    fn test_eof_is_repeated_by_next_token() {
        let mut stream = Scanner::new().scan_tokens("x");
        assert!(stream.next_token().is(Type::Identifier));
        assert!(stream.next_token().is(Type::Eof));
        assert!(stream.next_token().is(Type::Eof));
    }

    #[test]
    fn test_iterator_yields_eof_once() {
        let mut stream = Scanner::new().scan_tokens("");
        assert_eq!(stream.next().map(|t| t.ty), Some(Type::Eof));
        assert_eq!(stream.next(), None);
    }
}
