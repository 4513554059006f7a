use std::rc::Rc;

use crate::{
    ast::{Node, Script},
    diagnostics::{Result, SkribeError},
    lexer::{Keyword, Lexer, Token, TokenKind},
    preprocessor::Preprocessor,
    value::Value,
};

/// Preprocesses, tokenizes and parses `source` into a script whose root is a
/// block of the top-level statements.
pub fn parse(source: &str, preprocessor: &Preprocessor) -> Result<Script> {
    let canonical = preprocessor.process(source);
    let tokens = Lexer::new(&canonical).tokenize()?;
    Parser::new(tokens).parse_script()
}

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    /// `tokens` must end with an `EndOfFile` token, as produced by the lexer.
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, current: 0 }
    }

    pub fn parse_script(&mut self) -> Result<Script> {
        let mut statements = Vec::new();
        self.skip_line_ends();
        while !self.is_at_end() {
            statements.push(self.parse_statement()?);
            self.skip_line_ends();
        }
        Ok(Script::new(Node::Block(statements)))
    }

    fn parse_statement(&mut self) -> Result<Node> {
        let Some(kind) = self.peek().map(|token| token.kind) else {
            return Err(self.error_eof("expected statement"));
        };
        match kind {
            TokenKind::Keyword(Keyword::If) => self.parse_if(),
            TokenKind::Keyword(Keyword::While) => self.parse_while(),
            TokenKind::Keyword(Keyword::For) => self.parse_for(),
            TokenKind::Keyword(Keyword::Function) => self.parse_function(),
            TokenKind::Keyword(Keyword::Return) => self.parse_return(),
            TokenKind::Keyword(Keyword::Var) => self.parse_var_decl(),
            TokenKind::Keyword(Keyword::On) => self.parse_event_handler(),
            TokenKind::Keyword(Keyword::Trigger) => self.parse_trigger(),
            TokenKind::LeftBrace => self.parse_block(),
            TokenKind::EndOfFile => Err(self.error_eof("expected statement")),
            _ => self.parse_expression_statement(),
        }
    }

    /// Body of `if`/`while`/`for`/`function`/`on`, which may start on the next line.
    fn parse_body(&mut self) -> Result<Node> {
        self.skip_line_ends();
        self.parse_statement()
    }

    fn parse_block(&mut self) -> Result<Node> {
        self.consume(TokenKind::LeftBrace, "`{`")?;
        let mut statements = Vec::new();
        self.skip_line_ends();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            statements.push(self.parse_statement()?);
            self.skip_line_ends();
        }
        self.consume(TokenKind::RightBrace, "`}`")?;
        Ok(Node::Block(statements))
    }

    fn parse_if(&mut self) -> Result<Node> {
        self.consume_keyword(Keyword::If)?;
        let condition = self.parse_condition()?;
        let then_branch = self.parse_body()?;
        let else_branch = if self.matches_else() {
            Some(Box::new(self.parse_body()?))
        } else {
            None
        };
        Ok(Node::If {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch,
        })
    }

    /// Consumes an `else`, looking past line ends so the keyword may begin the
    /// next line. Leaves the line ends in place when no `else` follows.
    fn matches_else(&mut self) -> bool {
        let mut lookahead = self.current;
        while matches!(
            self.tokens.get(lookahead).map(|t| t.kind),
            Some(TokenKind::EndOfLine)
        ) {
            lookahead += 1;
        }
        match self.tokens.get(lookahead) {
            Some(token) if token.kind == TokenKind::Keyword(Keyword::Else) => {
                self.current = lookahead + 1;
                true
            }
            _ => false,
        }
    }

    fn parse_while(&mut self) -> Result<Node> {
        self.consume_keyword(Keyword::While)?;
        let condition = self.parse_condition()?;
        let body = self.parse_body()?;
        Ok(Node::While {
            condition: Box::new(condition),
            body: Box::new(body),
        })
    }

    fn parse_for(&mut self) -> Result<Node> {
        self.consume_keyword(Keyword::For)?;
        self.consume(TokenKind::LeftParen, "`(`")?;
        let init = if self.check(TokenKind::Keyword(Keyword::Var)) {
            self.parse_var_decl()?
        } else {
            self.parse_expression()?
        };
        self.consume(TokenKind::EndOfLine, "`;`")?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::EndOfLine, "`;`")?;
        let increment = self.parse_expression()?;
        self.consume(TokenKind::RightParen, "`)`")?;
        let body = self.parse_body()?;
        Ok(Node::For {
            init: Box::new(init),
            condition: Box::new(condition),
            increment: Box::new(increment),
            body: Box::new(body),
        })
    }

    fn parse_function(&mut self) -> Result<Node> {
        self.consume_keyword(Keyword::Function)?;
        let name = self.consume(TokenKind::Identifier, "function name")?.text;
        self.consume(TokenKind::LeftParen, "`(`")?;
        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                params.push(self.consume(TokenKind::Identifier, "parameter name")?.text);
                if !self.matches(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "`)`")?;
        let body = self.parse_body()?;
        Ok(Node::FunctionDef {
            name,
            params,
            body: Rc::new(body),
        })
    }

    fn parse_return(&mut self) -> Result<Node> {
        self.consume_keyword(Keyword::Return)?;
        let value = if self.check(TokenKind::EndOfLine)
            || self.check(TokenKind::RightBrace)
            || self.is_at_end()
        {
            Node::null()
        } else {
            self.parse_expression()?
        };
        Ok(Node::Return(Box::new(value)))
    }

    /// `var name [= expr]`; a declaration is a local assignment.
    fn parse_var_decl(&mut self) -> Result<Node> {
        self.consume_keyword(Keyword::Var)?;
        let name = self.consume(TokenKind::Identifier, "variable name")?.text;
        let value = if self.matches_operator("=") {
            self.parse_expression()?
        } else {
            Node::null()
        };
        Ok(Node::Assignment {
            name,
            value: Box::new(value),
        })
    }

    fn parse_event_handler(&mut self) -> Result<Node> {
        self.consume_keyword(Keyword::On)?;
        let event = self.consume(TokenKind::Identifier, "event name")?.text;
        let body = self.parse_body()?;
        Ok(Node::EventHandler {
            event,
            body: Rc::new(body),
        })
    }

    fn parse_trigger(&mut self) -> Result<Node> {
        self.consume_keyword(Keyword::Trigger)?;
        let event = self.consume(TokenKind::Identifier, "event name")?.text;
        let args = if self.matches(TokenKind::LeftParen) {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        self.matches(TokenKind::EndOfLine);
        Ok(Node::Trigger { event, args })
    }

    fn parse_expression_statement(&mut self) -> Result<Node> {
        let expr = self.parse_expression()?;
        self.matches(TokenKind::EndOfLine);
        Ok(expr)
    }

    fn parse_condition(&mut self) -> Result<Node> {
        self.consume(TokenKind::LeftParen, "`(`")?;
        let condition = self.parse_expression()?;
        self.consume(TokenKind::RightParen, "`)`")?;
        Ok(condition)
    }

    pub fn parse_expression(&mut self) -> Result<Node> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<Node> {
        let expr = self.parse_or()?;
        if self.check_operator("=") {
            let equals = self.advance();
            let value = self.parse_assignment()?;
            return match expr {
                Node::Variable(name) => Ok(Node::Assignment {
                    name,
                    value: Box::new(value),
                }),
                _ => Err(SkribeError::syntax(
                    "invalid assignment target",
                    Some(equals.position()),
                )),
            };
        }
        Ok(expr)
    }

    fn parse_or(&mut self) -> Result<Node> {
        let mut expr = self.parse_and()?;
        while self.matches_keyword(Keyword::Or) || self.matches_operator("||") {
            let right = self.parse_and()?;
            expr = binary(expr, "or", right);
        }
        Ok(expr)
    }

    fn parse_and(&mut self) -> Result<Node> {
        let mut expr = self.parse_equality()?;
        while self.matches_keyword(Keyword::And) || self.matches_operator("&&") {
            let right = self.parse_equality()?;
            expr = binary(expr, "and", right);
        }
        Ok(expr)
    }

    fn parse_equality(&mut self) -> Result<Node> {
        let mut expr = self.parse_comparison()?;
        while let Some(op) = self.match_operator_in(&["==", "!="]) {
            let right = self.parse_comparison()?;
            expr = binary(expr, &op, right);
        }
        Ok(expr)
    }

    fn parse_comparison(&mut self) -> Result<Node> {
        let mut expr = self.parse_term()?;
        while let Some(op) = self.match_operator_in(&["<", ">", "<=", ">="]) {
            let right = self.parse_term()?;
            expr = binary(expr, &op, right);
        }
        Ok(expr)
    }

    fn parse_term(&mut self) -> Result<Node> {
        let mut expr = self.parse_factor()?;
        while let Some(op) = self.match_operator_in(&["+", "-"]) {
            let right = self.parse_factor()?;
            expr = binary(expr, &op, right);
        }
        Ok(expr)
    }

    fn parse_factor(&mut self) -> Result<Node> {
        let mut expr = self.parse_unary()?;
        while let Some(op) = self.match_operator_in(&["*", "/", "%"]) {
            let right = self.parse_unary()?;
            expr = binary(expr, &op, right);
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Node> {
        let operator = if let Some(op) = self.match_operator_in(&["-", "!"]) {
            op
        } else if self.matches_keyword(Keyword::Not) {
            "not".to_string()
        } else {
            return self.parse_primary();
        };
        let operand = self.parse_unary()?;
        Ok(Node::Unary {
            operator,
            operand: Box::new(operand),
        })
    }

    fn parse_primary(&mut self) -> Result<Node> {
        let Some(token) = self.peek().cloned() else {
            return Err(self.error_eof("unexpected end of input"));
        };
        match token.kind {
            TokenKind::Number => {
                self.advance();
                let number = token.text.parse::<f64>().map_err(|_| {
                    SkribeError::syntax(
                        format!("invalid number `{}`", token.text),
                        Some(token.position()),
                    )
                })?;
                Ok(Node::Literal(Value::number(number)))
            }
            TokenKind::String => {
                self.advance();
                Ok(Node::Literal(Value::text(token.text)))
            }
            TokenKind::Keyword(Keyword::True) => {
                self.advance();
                Ok(Node::Literal(Value::bool(true)))
            }
            TokenKind::Keyword(Keyword::False) => {
                self.advance();
                Ok(Node::Literal(Value::bool(false)))
            }
            TokenKind::Keyword(Keyword::Null) => {
                self.advance();
                Ok(Node::null())
            }
            TokenKind::Identifier => {
                self.advance();
                if self.matches(TokenKind::LeftParen) {
                    let args = self.parse_arguments()?;
                    Ok(Node::Call {
                        name: token.text,
                        args,
                    })
                } else {
                    Ok(Node::Variable(token.text))
                }
            }
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.consume(TokenKind::RightParen, "`)`")?;
                Ok(expr)
            }
            TokenKind::EndOfFile => Err(self.error_eof("unexpected end of input")),
            _ => Err(self.error(&token, "expression")),
        }
    }

    /// Comma separated expressions after an opening `(`, through the closing `)`.
    fn parse_arguments(&mut self) -> Result<Vec<Node>> {
        let mut args = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                args.push(self.parse_expression()?);
                if !self.matches(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "`)`")?;
        Ok(args)
    }

    fn skip_line_ends(&mut self) {
        while self.matches(TokenKind::EndOfLine) {}
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn matches_keyword(&mut self, keyword: Keyword) -> bool {
        self.matches(TokenKind::Keyword(keyword))
    }

    fn check_operator(&self, op: &str) -> bool {
        matches!(self.peek(), Some(token) if token.kind == TokenKind::Operator && token.text == op)
    }

    fn matches_operator(&mut self, op: &str) -> bool {
        if self.check_operator(op) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_operator_in(&mut self, ops: &[&str]) -> Option<String> {
        let op = ops.iter().find(|op| self.check_operator(op))?;
        self.advance();
        Some((*op).to_string())
    }

    fn consume(&mut self, kind: TokenKind, expected: &str) -> Result<Token> {
        if self.check(kind) {
            return Ok(self.advance());
        }
        Err(match self.peek() {
            Some(token) if token.kind != TokenKind::EndOfFile => self.error(token, expected),
            _ => self.error_eof(&format!("expected {expected}, found end of input")),
        })
    }

    fn consume_keyword(&mut self, keyword: Keyword) -> Result<Token> {
        self.consume(TokenKind::Keyword(keyword), keyword.as_str())
    }

    fn check(&self, kind: TokenKind) -> bool {
        matches!(self.peek(), Some(token) if token.kind == kind)
    }

    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous().clone()
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.current)
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek().map(|t| t.kind), Some(TokenKind::EndOfFile) | None)
    }

    fn error(&self, token: &Token, expected: &str) -> SkribeError {
        let found = match token.kind {
            TokenKind::EndOfLine => "end of line".to_string(),
            _ => format!("`{}`", token.text),
        };
        SkribeError::syntax(
            format!("expected {expected}, found {found}"),
            Some(token.position()),
        )
    }

    fn error_eof(&self, message: &str) -> SkribeError {
        let position = self.tokens.last().map(Token::position);
        SkribeError::syntax(message.to_string(), position)
    }
}

fn binary(left: Node, operator: &str, right: Node) -> Node {
    Node::Binary {
        left: Box::new(left),
        operator: operator.to_string(),
        right: Box::new(right),
    }
}
