use std::rc::Rc;

use sable_core::Token;

use crate::ast::{Expr, ExprVisitor, Literal, Program, Stmt, StmtVisitor};

/// Renders a syntax tree as parenthesized prefix notation, one top-level statement per line.
/// Used by `--print-ast` and by the parser tests to compare tree shapes.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(&mut self, program: &Program) -> String {
        program
            .statements
            .iter()
            .map(|stmt| self.visit_stmt(stmt))
            .collect::<Vec<String>>()
            .join("\n")
    }

    fn parenthesize(&mut self, name: &str, parts: &[String]) -> String {
        let mut out = format!("({}", name);
        for part in parts {
            out.push(' ');
            out.push_str(part);
        }
        out.push(')');
        out
    }

    fn statements(&mut self, name: &str, stmts: &[Stmt]) -> String {
        let parts: Vec<String> = stmts.iter().map(|stmt| self.visit_stmt(stmt)).collect();
        self.parenthesize(name, &parts)
    }
}

impl ExprVisitor for AstPrinter {
    type Item = String;

    fn visit_identifier(&mut self, name: &Token) -> String {
        name.lexeme.clone()
    }

    fn visit_literal(&mut self, value: &Literal) -> String {
        match value {
            Literal::Str(val) => format!("{:?}", val),
            Literal::Num(val) => format!("{}", val),
            Literal::Bool(val) => format!("{}", val),
        }
    }

    fn visit_prefix(&mut self, operator: &Token, right: &Expr) -> String {
        let right = self.visit_expr(right);
        self.parenthesize(&operator.lexeme, &[right])
    }

    fn visit_infix(&mut self, left: &Expr, operator: &Token, right: &Expr) -> String {
        let parts = [self.visit_expr(left), self.visit_expr(right)];
        self.parenthesize(&operator.lexeme, &parts)
    }

    fn visit_assign(&mut self, name: &Token, value: &Expr) -> String {
        let value = self.visit_expr(value);
        self.parenthesize("=", &[name.lexeme.clone(), value])
    }

    fn visit_function(&mut self, params: &[Token], body: &Rc<Vec<Stmt>>) -> String {
        let params: Vec<&str> = params.iter().map(|p| p.lexeme.as_str()).collect();
        let body = self.statements("block", body);
        self.parenthesize("function", &[format!("({})", params.join(" ")), body])
    }

    fn visit_call(&mut self, callee: &Expr, _paren: &Token, args: &[Expr]) -> String {
        let mut parts = vec![self.visit_expr(callee)];
        parts.extend(args.iter().map(|arg| self.visit_expr(arg)));
        self.parenthesize("call", &parts)
    }

    fn visit_object(&mut self, pairs: &[(String, Expr)]) -> String {
        let fields: Vec<String> = pairs
            .iter()
            .map(|(key, value)| format!("{}: {}", key, self.visit_expr(value)))
            .collect();
        format!("{{{}}}", fields.join(", "))
    }

    fn visit_array(&mut self, elements: &[Expr]) -> String {
        let elements: Vec<String> = elements.iter().map(|e| self.visit_expr(e)).collect();
        format!("[{}]", elements.join(", "))
    }

    fn visit_property(&mut self, object: &Expr, name: &Token) -> String {
        let object = self.visit_expr(object);
        self.parenthesize(".", &[object, name.lexeme.clone()])
    }

    fn visit_index(&mut self, left: &Expr, index: &Expr) -> String {
        let parts = [self.visit_expr(left), self.visit_expr(index)];
        self.parenthesize("index", &parts)
    }
}

impl StmtVisitor for AstPrinter {
    type Item = String;

    fn visit_var(&mut self, name: &Token, init: Option<&Expr>) -> String {
        let mut parts = vec![name.lexeme.clone()];
        if let Some(init) = init {
            parts.push(self.visit_expr(init));
        }
        self.parenthesize("var", &parts)
    }

    fn visit_return(&mut self, _keyword: &Token, value: Option<&Expr>) -> String {
        match value {
            Some(value) => {
                let value = self.visit_expr(value);
                self.parenthesize("return", &[value])
            }
            None => String::from("(return)"),
        }
    }

    fn visit_expression(&mut self, expression: &Expr) -> String {
        self.visit_expr(expression)
    }

    fn visit_block(&mut self, statements: &[Stmt]) -> String {
        self.statements("block", statements)
    }

    fn visit_if(
        &mut self,
        condition: &Expr,
        then_branch: &[Stmt],
        else_branch: Option<&Stmt>,
    ) -> String {
        let mut parts = vec![
            self.visit_expr(condition),
            self.statements("block", then_branch),
        ];
        if let Some(else_branch) = else_branch {
            parts.push(self.visit_stmt(else_branch));
        }
        self.parenthesize("if", &parts)
    }

    fn visit_while(&mut self, condition: &Expr, body: &[Stmt]) -> String {
        let parts = [self.visit_expr(condition), self.statements("block", body)];
        self.parenthesize("while", &parts)
    }
}
