use crate::diagnostics::{Result, SkribeError, SourcePosition};

const OPERATOR_CHARS: &str = "+-*/=<>!&|%^";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    If,
    Else,
    While,
    For,
    Function,
    Return,
    True,
    False,
    Null,
    And,
    Or,
    Not,
    Var,
    Event,
    On,
    Trigger,
}

impl Keyword {
    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::If => "if",
            Keyword::Else => "else",
            Keyword::While => "while",
            Keyword::For => "for",
            Keyword::Function => "function",
            Keyword::Return => "return",
            Keyword::True => "true",
            Keyword::False => "false",
            Keyword::Null => "null",
            Keyword::And => "and",
            Keyword::Or => "or",
            Keyword::Not => "not",
            Keyword::Var => "var",
            Keyword::Event => "event",
            Keyword::On => "on",
            Keyword::Trigger => "trigger",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    Number,
    String,
    Operator,
    Keyword(Keyword),
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Colon,
    EndOfLine,
    EndOfFile,
}

impl TokenKind {
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Identifier => "identifier",
            TokenKind::Number => "number",
            TokenKind::String => "string",
            TokenKind::Operator => "operator",
            TokenKind::Keyword(keyword) => keyword.as_str(),
            TokenKind::LeftParen => "`(`",
            TokenKind::RightParen => "`)`",
            TokenKind::LeftBrace => "`{`",
            TokenKind::RightBrace => "`}`",
            TokenKind::LeftBracket => "`[`",
            TokenKind::RightBracket => "`]`",
            TokenKind::Comma => "`,`",
            TokenKind::Colon => "`:`",
            TokenKind::EndOfLine => "end of line",
            TokenKind::EndOfFile => "end of input",
        }
    }
}

/// A lexeme with its 1-based position. String tokens carry the unescaped
/// contents without quotes.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn position(&self) -> SourcePosition {
        SourcePosition::new(self.line, self.column)
    }
}

pub struct Lexer<'a> {
    source: &'a str,
    chars: std::str::CharIndices<'a>,
    current: usize,
    peeked: Option<(usize, char)>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices(),
            current: 0,
            peeked: None,
            line: 1,
            column: 1,
        }
    }

    fn bump(&mut self) -> Option<(usize, char)> {
        let next = match self.peeked.take() {
            Some(pair) => Some(pair),
            None => self.chars.next(),
        };
        if let Some((idx, ch)) = next {
            self.current = idx + ch.len_utf8();
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        next
    }

    fn peek(&mut self) -> Option<(usize, char)> {
        if self.peeked.is_none() {
            self.peeked = self.chars.next();
        }
        self.peeked
    }

    fn collect_while<F>(&mut self, start: usize, mut predicate: F) -> String
    where
        F: FnMut(char) -> bool,
    {
        while let Some((_, ch)) = self.peek() {
            if !predicate(ch) {
                break;
            }
            self.bump();
        }
        self.source[start..self.current].to_string()
    }

    fn skip_comment(&mut self) {
        while let Some((_, ch)) = self.peek() {
            if ch == '\n' {
                break;
            }
            self.bump();
        }
    }

    fn identifier_or_keyword(&mut self, start: usize, line: usize, column: usize) -> Token {
        let text = self.collect_while(start, |ch| ch.is_alphanumeric() || ch == '_' || ch == '.');
        let kind = keyword_for(&text)
            .map(TokenKind::Keyword)
            .unwrap_or(TokenKind::Identifier);
        Token {
            kind,
            text,
            line,
            column,
        }
    }

    fn number_literal(&mut self, start: usize, line: usize, column: usize) -> Token {
        let mut seen_dot = false;
        let text = self.collect_while(start, |ch| match ch {
            '0'..='9' => true,
            '.' if !seen_dot => {
                seen_dot = true;
                true
            }
            _ => false,
        });
        Token {
            kind: TokenKind::Number,
            text,
            line,
            column,
        }
    }

    fn string_literal(&mut self, quote: char, line: usize, column: usize) -> Result<Token> {
        let mut value = String::new();
        while let Some((_, ch)) = self.bump() {
            match ch {
                '\\' => match self.bump() {
                    Some((_, esc)) => value.push(match esc {
                        'n' => '\n',
                        'r' => '\r',
                        't' => '\t',
                        '0' => '\0',
                        other => other,
                    }),
                    None => break,
                },
                ch if ch == quote => {
                    return Ok(Token {
                        kind: TokenKind::String,
                        text: value,
                        line,
                        column,
                    });
                }
                _ => value.push(ch),
            }
        }
        Err(SkribeError::lexical(
            "unterminated string literal",
            SourcePosition::new(line, column),
        ))
    }

    fn operator(&mut self, start: usize, line: usize, column: usize) -> Token {
        let text = self.collect_while(start, |ch| OPERATOR_CHARS.contains(ch));
        Token {
            kind: TokenKind::Operator,
            text,
            line,
            column,
        }
    }

    fn simple_token(&self, kind: TokenKind, ch: char, line: usize, column: usize) -> Token {
        Token {
            kind,
            text: ch.to_string(),
            line,
            column,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let (line, column) = (self.line, self.column);
            let Some((start, ch)) = self.bump() else {
                tokens.push(Token {
                    kind: TokenKind::EndOfFile,
                    text: String::new(),
                    line,
                    column,
                });
                break;
            };

            let token = match ch {
                '\n' => self.simple_token(TokenKind::EndOfLine, ch, line, column),
                ch if ch.is_whitespace() => continue,
                '#' => {
                    self.skip_comment();
                    continue;
                }
                ch if ch.is_alphabetic() || ch == '_' => {
                    self.identifier_or_keyword(start, line, column)
                }
                '0'..='9' => self.number_literal(start, line, column),
                '"' | '\'' => self.string_literal(ch, line, column)?,
                '(' => self.simple_token(TokenKind::LeftParen, ch, line, column),
                ')' => self.simple_token(TokenKind::RightParen, ch, line, column),
                '{' => self.simple_token(TokenKind::LeftBrace, ch, line, column),
                '}' => self.simple_token(TokenKind::RightBrace, ch, line, column),
                '[' => self.simple_token(TokenKind::LeftBracket, ch, line, column),
                ']' => self.simple_token(TokenKind::RightBracket, ch, line, column),
                ',' => self.simple_token(TokenKind::Comma, ch, line, column),
                ':' => self.simple_token(TokenKind::Colon, ch, line, column),
                ';' => self.simple_token(TokenKind::EndOfLine, ch, line, column),
                ch if OPERATOR_CHARS.contains(ch) => self.operator(start, line, column),
                other => {
                    return Err(SkribeError::lexical(
                        format!("unexpected character `{other}`"),
                        SourcePosition::new(line, column),
                    ));
                }
            };
            tokens.push(token);
        }
        Ok(tokens)
    }
}

pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    Lexer::new(source).tokenize()
}

fn keyword_for(ident: &str) -> Option<Keyword> {
    use self::Keyword as Kw;
    let keyword = match ident {
        "if" => Kw::If,
        "else" => Kw::Else,
        "while" => Kw::While,
        "for" => Kw::For,
        "function" => Kw::Function,
        "return" => Kw::Return,
        "true" => Kw::True,
        "false" => Kw::False,
        "null" => Kw::Null,
        "and" => Kw::And,
        "or" => Kw::Or,
        "not" => Kw::Not,
        "var" => Kw::Var,
        "event" => Kw::Event,
        "on" => Kw::On,
        "trigger" => Kw::Trigger,
        _ => return None,
    };
    Some(keyword)
}
