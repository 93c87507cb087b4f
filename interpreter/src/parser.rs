use crate::ast::{Expr, Program, Stmt};
use crate::error::Error;
use sable_core::{Token, TokenStream, Type};
use tracing::debug;

/// Binding power of infix operators, lowest first. An infix operator continues the current
/// expression only while its precedence is higher than the one the caller parses at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Assign,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Call,
}

impl Precedence {
    fn of(ty: Type) -> Self {
        match ty {
            Type::Equal => Precedence::Assign,
            Type::EqualEqual | Type::BangEqual => Precedence::Equals,
            Type::Less | Type::Greater | Type::LessEqual | Type::GreaterEqual => {
                Precedence::LessGreater
            }
            Type::Plus | Type::Minus => Precedence::Sum,
            Type::Star | Type::Slash => Precedence::Product,
            Type::LeftParen | Type::Dot | Type::LeftBracket => Precedence::Call,
            _ => Precedence::Lowest,
        }
    }
}

/// Pratt parser over a lazy token stream. Only the lookahead and the previously consumed
/// token are held at any time.
pub struct Parser<'a> {
    tokens: TokenStream<'a>,
    current: Token,
    previous: Token,
    errors: Vec<Error>,

    // Number of blocks currently open, recovery only stops at a `}` inside one
    depth: usize,
}

// Helper alias for shorter return types
type BlockResult = Result<Vec<Stmt>, Error>;
type StmtResult = Result<Stmt, Error>;
type ExprResult = Result<Expr, Error>;

impl<'a> Parser<'a> {
    pub fn new(mut tokens: TokenStream<'a>) -> Self {
        let current = tokens.next_token();
        Parser {
            tokens,
            previous: current.clone(),
            current,
            errors: Vec::new(),
            depth: 0,
        }
    }

    /// Parses the whole input. The returned program holds every statement that parsed
    /// cleanly; failures are collected in `errors` and parsing resumes at the next statement.
    pub fn parse(&mut self) -> Program {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            if self.match_one(Type::SemiColon) {
                continue;
            }

            match self.declaration() {
                Ok(stmt) => statements.push(stmt),
                Err(err) => self.errors.push(err),
            };
        }

        debug!(
            statements = statements.len(),
            errors = self.errors.len(),
            "parsed program"
        );
        Program { statements }
    }

    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    /// Consumes the parser, turning any collected errors into a single `Error::Parse`.
    pub fn finish(mut self) -> Result<Program, Error> {
        let program = self.parse();
        if self.errors.is_empty() {
            Ok(program)
        } else {
            Err(Error::Parse(self.errors))
        }
    }

    fn declaration(&mut self) -> StmtResult {
        let res = self.statement();
        if res.is_err() {
            self.synchronize();
        }

        res
    }

    fn statement(&mut self) -> StmtResult {
        let stmt = if self.match_either(&[Type::Var, Type::Let]) {
            self.var_declaration()
        } else if self.match_one(Type::Return) {
            self.return_statement()
        } else if self.match_one(Type::If) {
            self.if_statement()
        } else if self.match_one(Type::While) {
            self.while_statement()
        } else if self.match_one(Type::LeftBrace) {
            Ok(Stmt::block(self.block()?))
        } else {
            self.expression_statement()
        }?;

        // semicolons are optional terminators
        self.match_one(Type::SemiColon);
        Ok(stmt)
    }

    fn var_declaration(&mut self) -> StmtResult {
        let name = self.consume(Type::Identifier)?.clone();
        let init = if self.match_one(Type::Equal) {
            Some(self.expression(Precedence::Lowest)?)
        } else {
            None
        };

        Ok(Stmt::var(name, init))
    }

    fn return_statement(&mut self) -> StmtResult {
        let keyword = self.previous().clone();
        let value = if self.check(Type::SemiColon)
            || self.check(Type::RightBrace)
            || self.is_at_end()
        {
            None
        } else {
            Some(self.expression(Precedence::Lowest)?)
        };

        Ok(Stmt::return_(keyword, value))
    }

    fn if_statement(&mut self) -> StmtResult {
        self.consume(Type::LeftParen)?;
        let condition = self.expression(Precedence::Lowest)?;
        self.consume(Type::RightParen)?;
        self.consume(Type::LeftBrace)?;
        let then_branch = self.block()?;

        let else_branch = if self.match_one(Type::Else) {
            if self.match_one(Type::If) {
                Some(self.if_statement()?)
            } else {
                self.consume(Type::LeftBrace)?;
                Some(Stmt::block(self.block()?))
            }
        } else {
            None
        };

        Ok(Stmt::if_(condition, then_branch, else_branch))
    }

    fn while_statement(&mut self) -> StmtResult {
        self.consume(Type::LeftParen)?;
        let condition = self.expression(Precedence::Lowest)?;
        self.consume(Type::RightParen)?;
        self.consume(Type::LeftBrace)?;
        let body = self.block()?;

        Ok(Stmt::while_(condition, body))
    }

    // Expects the opening brace to be consumed already. Errors inside the block are
    // recorded and skipped like at the top level, only a missing `}` fails the block.
    fn block(&mut self) -> BlockResult {
        let mut statements = Vec::new();
        self.depth += 1;
        while !self.check(Type::RightBrace) && !self.is_at_end() {
            if self.match_one(Type::SemiColon) {
                continue;
            }

            match self.declaration() {
                Ok(stmt) => statements.push(stmt),
                Err(err) => self.errors.push(err),
            }
        }
        self.depth -= 1;

        self.consume(Type::RightBrace)?;
        Ok(statements)
    }

    fn expression_statement(&mut self) -> StmtResult {
        let expr = self.expression(Precedence::Lowest)?;
        Ok(Stmt::expression(expr))
    }

    fn expression(&mut self, precedence: Precedence) -> ExprResult {
        let mut expr = self.prefix()?;

        while precedence < Precedence::of(self.peek().ty) {
            let operator = self.advance().clone();
            expr = match operator.ty {
                Type::LeftParen => {
                    let args = self.expression_list(Type::RightParen)?;
                    Expr::call(expr, operator, args)
                }
                Type::Dot => {
                    let name = self.consume(Type::Identifier)?.clone();
                    Expr::property(expr, name)
                }
                Type::LeftBracket => {
                    let index = self.expression(Precedence::Lowest)?;
                    self.consume(Type::RightBracket)?;
                    Expr::index(expr, index)
                }
                Type::Equal => self.assignment(expr, &operator)?,
                _ => {
                    let right = self.expression(Precedence::of(operator.ty))?;
                    Expr::infix(expr, operator, right)
                }
            };
        }

        Ok(expr)
    }

    // Right associative: the value is parsed at the lowest precedence so `a = b = 1` nests
    // to the right.
    fn assignment(&mut self, target: Expr, equals: &Token) -> ExprResult {
        match target {
            Expr::Identifier { name } => {
                let value = self.expression(Precedence::Lowest)?;
                Ok(Expr::assign(name, value))
            }
            _ => Err(Error::parser_error(equals, "invalid assignment target")),
        }
    }

    fn prefix(&mut self) -> ExprResult {
        let token = self.peek().clone();
        match token.ty {
            Type::Identifier => {
                self.advance();
                Ok(Expr::identifier(token))
            }
            Type::Number => {
                self.advance();
                match token.lexeme.parse::<f64>() {
                    Ok(value) => Ok(Expr::literal(value)),
                    Err(_) => Err(Error::parser_error(
                        &token,
                        &format!("could not parse \"{}\" as number", token.lexeme),
                    )),
                }
            }
            Type::String => {
                self.advance();
                Ok(Expr::literal(token.lexeme))
            }
            Type::True => {
                self.advance();
                Ok(Expr::literal(true))
            }
            Type::False => {
                self.advance();
                Ok(Expr::literal(false))
            }
            Type::Bang | Type::Minus => {
                self.advance();
                let right = self.expression(Precedence::Prefix)?;
                Ok(Expr::prefix(token, right))
            }
            Type::LeftParen => {
                self.advance();
                let expr = self.expression(Precedence::Lowest)?;
                self.consume(Type::RightParen)?;
                Ok(expr)
            }
            Type::Function => {
                self.advance();
                self.function_literal()
            }
            Type::LeftBrace => {
                self.advance();
                self.object_literal()
            }
            Type::LeftBracket => {
                self.advance();
                let elements = self.expression_list(Type::RightBracket)?;
                Ok(Expr::Array { elements })
            }
            Type::Illegal => Err(Error::parser_error(
                &token,
                &format!("unexpected character '{}'", token.lexeme),
            )),
            _ => Err(Error::parser_error(
                &token,
                &format!("no prefix parse function for {} found", token.ty),
            )),
        }
    }

    fn function_literal(&mut self) -> ExprResult {
        self.consume(Type::LeftParen)?;

        let mut params = Vec::new();
        if !self.check(Type::RightParen) {
            loop {
                params.push(self.consume(Type::Identifier)?.clone());
                if !self.match_one(Type::Comma) {
                    break;
                }
            }
        }

        self.consume(Type::RightParen)?;
        self.consume(Type::LeftBrace)?;

        let body = self.block()?;
        Ok(Expr::function(params, body))
    }

    // Keys are bare identifiers or string literals, a trailing comma is allowed.
    fn object_literal(&mut self) -> ExprResult {
        let mut pairs = Vec::new();

        while !self.check(Type::RightBrace) && !self.is_at_end() {
            let key = match self.peek().ty {
                Type::Identifier | Type::String => self.advance().lexeme.clone(),
                ty => {
                    return Err(Error::parser_error(
                        self.peek(),
                        &format!("expected property name, got {} instead", ty),
                    ))
                }
            };

            self.consume(Type::Colon)?;
            let value = self.expression(Precedence::Lowest)?;
            pairs.push((key, value));

            if !self.match_one(Type::Comma) {
                break;
            }
        }

        self.consume(Type::RightBrace)?;
        Ok(Expr::Object { pairs })
    }

    // Comma separated expressions up to `end`, used for call arguments and array literals.
    fn expression_list(&mut self, end: Type) -> Result<Vec<Expr>, Error> {
        let mut list = Vec::new();
        if self.match_one(end) {
            return Ok(list);
        }

        loop {
            list.push(self.expression(Precedence::Lowest)?);
            if !self.match_one(Type::Comma) || self.check(end) {
                break;
            }
        }

        self.consume(end)?;
        Ok(list)
    }

    fn is_at_end(&self) -> bool {
        self.peek().ty == Type::Eof
    }

    fn check(&self, ty: Type) -> bool {
        self.peek().ty == ty
    }

    fn consume(&mut self, ty: Type) -> Result<&Token, Error> {
        if self.check(ty) {
            Ok(self.advance())
        } else {
            let msg = format!(
                "expected next token to be {}, got {} instead",
                ty,
                self.peek().ty
            );
            Err(Error::parser_error(self.peek(), &msg))
        }
    }

    // Discards tokens until a likely statement boundary: just past a `;`, or right before a
    // statement keyword or the `}` of an open block.
    fn synchronize(&mut self) {
        if self.depth > 0 && self.check(Type::RightBrace) {
            return;
        }
        self.advance();

        while !self.is_at_end() {
            if self.previous().ty == Type::SemiColon {
                return;
            }

            match self.peek().ty {
                Type::Var | Type::Let | Type::If | Type::While | Type::Return => return,
                Type::RightBrace if self.depth > 0 => return,
                _ => {}
            }

            self.advance();
        }
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            let next = self.tokens.next_token();
            self.previous = std::mem::replace(&mut self.current, next);
        }

        self.previous()
    }

    fn peek(&self) -> &Token {
        &self.current
    }

    fn previous(&self) -> &Token {
        &self.previous
    }

    fn match_either(&mut self, types: &[Type]) -> bool {
        for ty in types {
            if self.match_one(*ty) {
                // Already skipped in the `match_one`, just return result
                return true;
            }
        }

        false
    }

    fn match_one(&mut self, ty: Type) -> bool {
        if self.check(ty) {
            self.advance();
            true
        } else {
            false
        }
    }
}
