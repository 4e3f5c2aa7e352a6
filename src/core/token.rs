use crate::JSError;

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Number(f64),
    Str(String),
    Regex { pattern: String, flags: String },
    Punct(Punct),
    Eof,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Punct {
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semi,
    Comma,
    Dot,
    Colon,
    Question,
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    PlusPlus,
    MinusMinus,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    Shl,
    Shr,
    UShr,
    ShlAssign,
    ShrAssign,
    UShrAssign,
    Lt,
    Gt,
    Le,
    Ge,
    EqEq,
    NotEq,
    EqEqEq,
    NotEqEq,
    Amp,
    Pipe,
    Caret,
    AmpAssign,
    PipeAssign,
    CaretAssign,
    AmpAmp,
    PipePipe,
    Bang,
    Tilde,
}

#[derive(Clone, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub line: u32,
    pub column: u32,
    pub end_line: u32,
    pub end_column: u32,
    /// A line terminator appeared between the previous token and this one;
    /// drives semicolon insertion and the restricted productions.
    pub newline_before: bool,
}

const KEYWORDS: &[&str] = &[
    "break", "case", "catch", "continue", "debugger", "default", "delete", "do", "else", "false", "finally", "for", "function", "if",
    "in", "instanceof", "new", "null", "return", "switch", "this", "throw", "true", "try", "typeof", "var", "void", "while", "with",
];

pub fn is_keyword(name: &str) -> bool {
    KEYWORDS.contains(&name)
}

struct Lexer<'a> {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
    name: &'a str,
}

impl<'a> Lexer<'a> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn error(&self, message: &str) -> JSError {
        JSError::Parse {
            message: message.to_string(),
            name: self.name.to_string(),
            line: self.line,
            column: self.column,
        }
    }

    /// Skips whitespace and comments; reports whether a line terminator was
    /// crossed.
    fn skip_trivia(&mut self) -> Result<bool, JSError> {
        let mut newline = false;
        loop {
            match self.peek() {
                Some(ch) if ch.is_whitespace() => {
                    if ch == '\n' || ch == '\r' || ch == '\u{2028}' || ch == '\u{2029}' {
                        newline = true;
                    }
                    self.bump();
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    while let Some(ch) = self.peek() {
                        if ch == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some('/') if self.peek_at(1) == Some('*') => {
                    self.bump();
                    self.bump();
                    loop {
                        match self.peek() {
                            None => return Err(self.error("unterminated comment")),
                            Some('*') if self.peek_at(1) == Some('/') => {
                                self.bump();
                                self.bump();
                                break;
                            }
                            Some(ch) => {
                                if ch == '\n' {
                                    newline = true;
                                }
                                self.bump();
                            }
                        }
                    }
                }
                _ => return Ok(newline),
            }
        }
    }

    fn scan_identifier(&mut self) -> String {
        let mut name = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || ch == '_' || ch == '$' {
                name.push(ch);
                self.bump();
            } else {
                break;
            }
        }
        name
    }

    fn scan_number(&mut self) -> Result<f64, JSError> {
        let mut text = String::new();
        if self.peek() == Some('0') && matches!(self.peek_at(1), Some('x') | Some('X')) {
            self.bump();
            self.bump();
            while let Some(ch) = self.peek() {
                if ch.is_ascii_hexdigit() {
                    text.push(ch);
                    self.bump();
                } else {
                    break;
                }
            }
            if text.is_empty() {
                return Err(self.error("missing hexadecimal digits"));
            }
            return Ok(u64::from_str_radix(&text, 16).map_err(|_| self.error("hexadecimal literal too large"))? as f64);
        }
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                text.push(ch);
                self.bump();
            } else {
                break;
            }
        }
        if self.peek() == Some('.') {
            text.push('.');
            self.bump();
            while let Some(ch) = self.peek() {
                if ch.is_ascii_digit() {
                    text.push(ch);
                    self.bump();
                } else {
                    break;
                }
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            text.push('e');
            self.bump();
            if let Some(sign @ ('+' | '-')) = self.peek() {
                text.push(sign);
                self.bump();
            }
            let mut has_digits = false;
            while let Some(ch) = self.peek() {
                if ch.is_ascii_digit() {
                    text.push(ch);
                    self.bump();
                    has_digits = true;
                } else {
                    break;
                }
            }
            if !has_digits {
                return Err(self.error("missing exponent digits"));
            }
        }
        text.parse::<f64>().map_err(|_| self.error("malformed number literal"))
    }

    fn scan_string(&mut self, quote: char) -> Result<String, JSError> {
        self.bump();
        let mut text = String::new();
        loop {
            match self.peek() {
                None | Some('\n') => return Err(self.error("unterminated string literal")),
                Some(ch) if ch == quote => {
                    self.bump();
                    return Ok(text);
                }
                Some('\\') => {
                    self.bump();
                    let Some(esc) = self.bump() else {
                        return Err(self.error("unterminated string literal"));
                    };
                    match esc {
                        'b' => text.push('\u{8}'),
                        't' => text.push('\t'),
                        'n' => text.push('\n'),
                        'v' => text.push('\u{b}'),
                        'f' => text.push('\u{c}'),
                        'r' => text.push('\r'),
                        '0' => text.push('\0'),
                        'x' => text.push(self.scan_hex_escape(2)?),
                        'u' => text.push(self.scan_hex_escape(4)?),
                        '\n' => {}
                        other => text.push(other),
                    }
                }
                Some(ch) => {
                    text.push(ch);
                    self.bump();
                }
            }
        }
    }

    fn scan_hex_escape(&mut self, digits: usize) -> Result<char, JSError> {
        let mut code: u32 = 0;
        for _ in 0..digits {
            let Some(ch) = self.bump() else {
                return Err(self.error("unterminated escape sequence"));
            };
            let Some(d) = ch.to_digit(16) else {
                return Err(self.error("invalid hexadecimal escape"));
            };
            code = code * 16 + d;
        }
        Ok(char::from_u32(code).unwrap_or('\u{fffd}'))
    }

    fn scan_regex(&mut self) -> Result<(String, String), JSError> {
        self.bump(); // leading '/'
        let mut pattern = String::new();
        let mut in_class = false;
        loop {
            match self.peek() {
                None | Some('\n') => return Err(self.error("unterminated regular expression")),
                Some('\\') => {
                    pattern.push('\\');
                    self.bump();
                    if let Some(ch) = self.bump() {
                        pattern.push(ch);
                    }
                }
                Some('[') => {
                    in_class = true;
                    pattern.push('[');
                    self.bump();
                }
                Some(']') => {
                    in_class = false;
                    pattern.push(']');
                    self.bump();
                }
                Some('/') if !in_class => {
                    self.bump();
                    break;
                }
                Some(ch) => {
                    pattern.push(ch);
                    self.bump();
                }
            }
        }
        let flags = self.scan_identifier();
        Ok((pattern, flags))
    }

    fn scan_punct(&mut self) -> Result<Punct, JSError> {
        use Punct::*;
        let ch = self.bump().expect("caller checked for input");
        let punct = match ch {
            '(' => LParen,
            ')' => RParen,
            '{' => LBrace,
            '}' => RBrace,
            '[' => LBracket,
            ']' => RBracket,
            ';' => Semi,
            ',' => Comma,
            '.' => Dot,
            ':' => Colon,
            '?' => Question,
            '~' => Tilde,
            '+' => match self.peek() {
                Some('+') => {
                    self.bump();
                    PlusPlus
                }
                Some('=') => {
                    self.bump();
                    PlusAssign
                }
                _ => Plus,
            },
            '-' => match self.peek() {
                Some('-') => {
                    self.bump();
                    MinusMinus
                }
                Some('=') => {
                    self.bump();
                    MinusAssign
                }
                _ => Minus,
            },
            '*' => match self.peek() {
                Some('=') => {
                    self.bump();
                    StarAssign
                }
                _ => Star,
            },
            '/' => match self.peek() {
                Some('=') => {
                    self.bump();
                    SlashAssign
                }
                _ => Slash,
            },
            '%' => match self.peek() {
                Some('=') => {
                    self.bump();
                    PercentAssign
                }
                _ => Percent,
            },
            '=' => match (self.peek(), self.peek_at(1)) {
                (Some('='), Some('=')) => {
                    self.bump();
                    self.bump();
                    EqEqEq
                }
                (Some('='), _) => {
                    self.bump();
                    EqEq
                }
                _ => Assign,
            },
            '!' => match (self.peek(), self.peek_at(1)) {
                (Some('='), Some('=')) => {
                    self.bump();
                    self.bump();
                    NotEqEq
                }
                (Some('='), _) => {
                    self.bump();
                    NotEq
                }
                _ => Bang,
            },
            '<' => match (self.peek(), self.peek_at(1)) {
                (Some('<'), Some('=')) => {
                    self.bump();
                    self.bump();
                    ShlAssign
                }
                (Some('<'), _) => {
                    self.bump();
                    Shl
                }
                (Some('='), _) => {
                    self.bump();
                    Le
                }
                _ => Lt,
            },
            '>' => match (self.peek(), self.peek_at(1), self.peek_at(2)) {
                (Some('>'), Some('>'), Some('=')) => {
                    self.bump();
                    self.bump();
                    self.bump();
                    UShrAssign
                }
                (Some('>'), Some('>'), _) => {
                    self.bump();
                    self.bump();
                    UShr
                }
                (Some('>'), Some('='), _) => {
                    self.bump();
                    self.bump();
                    ShrAssign
                }
                (Some('>'), _, _) => {
                    self.bump();
                    Shr
                }
                (Some('='), _, _) => {
                    self.bump();
                    Ge
                }
                _ => Gt,
            },
            '&' => match self.peek() {
                Some('&') => {
                    self.bump();
                    AmpAmp
                }
                Some('=') => {
                    self.bump();
                    AmpAssign
                }
                _ => Amp,
            },
            '|' => match self.peek() {
                Some('|') => {
                    self.bump();
                    PipePipe
                }
                Some('=') => {
                    self.bump();
                    PipeAssign
                }
                _ => Pipe,
            },
            '^' => match self.peek() {
                Some('=') => {
                    self.bump();
                    CaretAssign
                }
                _ => Caret,
            },
            other => return Err(self.error(&format!("unexpected character '{other}'"))),
        };
        Ok(punct)
    }
}

/// True when a `/` at this point starts a regular expression literal rather
/// than a division, judged from the previous significant token.
fn regex_allowed(prev: Option<&TokenKind>) -> bool {
    match prev {
        None => true,
        Some(TokenKind::Punct(Punct::RParen)) | Some(TokenKind::Punct(Punct::RBracket)) => false,
        Some(TokenKind::Punct(_)) => true,
        Some(TokenKind::Ident(name)) => is_keyword(name),
        _ => false,
    }
}

pub fn tokenize(source: &str, name: &str) -> Result<Vec<Token>, JSError> {
    let mut lexer = Lexer {
        chars: source.chars().collect(),
        pos: 0,
        line: 1,
        column: 1,
        name,
    };
    let mut tokens: Vec<Token> = Vec::new();
    loop {
        let newline_before = lexer.skip_trivia()?;
        let (line, column) = (lexer.line, lexer.column);
        let kind = match lexer.peek() {
            None => TokenKind::Eof,
            Some(ch) if ch.is_alphabetic() || ch == '_' || ch == '$' => TokenKind::Ident(lexer.scan_identifier()),
            Some(ch) if ch.is_ascii_digit() => TokenKind::Number(lexer.scan_number()?),
            Some('.') if lexer.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => TokenKind::Number(lexer.scan_number()?),
            Some('\'') => TokenKind::Str(lexer.scan_string('\'')?),
            Some('"') => TokenKind::Str(lexer.scan_string('"')?),
            Some('/') if !matches!(lexer.peek_at(1), Some('/') | Some('*')) && regex_allowed(tokens.last().map(|t| &t.kind)) => {
                let (pattern, flags) = lexer.scan_regex()?;
                TokenKind::Regex { pattern, flags }
            }
            Some(_) => TokenKind::Punct(lexer.scan_punct()?),
        };
        let done = kind == TokenKind::Eof;
        tokens.push(Token {
            kind,
            line,
            column,
            end_line: lexer.line,
            end_column: lexer.column,
            newline_before,
        });
        if done {
            return Ok(tokens);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source, "test").unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn scans_punctuation_greedily() {
        assert_eq!(
            kinds("a >>>= b"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Punct(Punct::UShrAssign),
                TokenKind::Ident("b".into()),
                TokenKind::Eof,
            ]
        );
        assert_eq!(kinds("1===2")[1], TokenKind::Punct(Punct::EqEqEq));
    }

    #[test]
    fn scans_numbers() {
        assert_eq!(kinds("0x10")[0], TokenKind::Number(16.0));
        assert_eq!(kinds("1.5e2")[0], TokenKind::Number(150.0));
        assert_eq!(kinds(".5")[0], TokenKind::Number(0.5));
    }

    #[test]
    fn scans_string_escapes() {
        assert_eq!(kinds(r#""a\tbA""#)[0], TokenKind::Str("a\tbA".into()));
    }

    #[test]
    fn regex_vs_division() {
        assert!(matches!(kinds("/ab+c/gi")[0], TokenKind::Regex { .. }));
        // after an identifier a slash is division
        assert_eq!(kinds("x /2/ y")[1], TokenKind::Punct(Punct::Slash));
        // after a keyword it is a regex again
        assert!(matches!(kinds("return /a/;")[1], TokenKind::Regex { .. }));
    }

    #[test]
    fn tracks_newline_before() {
        let tokens = tokenize("a\nb", "test").unwrap();
        assert!(!tokens[0].newline_before);
        assert!(tokens[1].newline_before);
    }

    #[test]
    fn comments_are_trivia() {
        assert_eq!(kinds("1 /* two */ + // three\n3").len(), 4);
    }
}
