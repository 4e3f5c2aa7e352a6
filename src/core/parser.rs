use std::collections::HashMap;
use std::rc::Rc;

use crate::JSError;
use crate::core::ast::*;
use crate::core::number_to_string;
use crate::core::token::{Punct, Token, TokenKind, is_keyword, tokenize};

/// Parse result: the program plus the string table its `Sym` indices point
/// into.
pub struct ParsedProgram {
    pub program: Program,
    pub strings: Vec<String>,
}

pub fn parse_program(source: &str, name: &str) -> Result<ParsedProgram, JSError> {
    let tokens = tokenize(source, name)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        name: name.to_string(),
        table: Vec::new(),
        interned: HashMap::new(),
        fn_depth: 0,
    };
    let mut body = Vec::new();
    while !parser.at_eof() {
        body.push(parser.parse_statement()?);
    }
    log::debug!("parsed {} top-level statements from {}", body.len(), name);
    Ok(ParsedProgram {
        program: Program { body },
        strings: parser.table,
    })
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    name: String,
    table: Vec<String>,
    interned: HashMap<String, Sym>,
    fn_depth: u32,
}

enum BinKind {
    Bin(BinaryOp),
    Log(LogicalOp),
}

impl Parser {
    fn cur(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn cur_kind(&self) -> &TokenKind {
        &self.tokens[self.pos].kind
    }

    fn at_eof(&self) -> bool {
        matches!(self.cur_kind(), TokenKind::Eof)
    }

    fn bump(&mut self) {
        if !self.at_eof() {
            self.pos += 1;
        }
    }

    fn start(&self) -> Position {
        Position {
            line: self.cur().line,
            column: self.cur().column,
        }
    }

    fn last_end(&self) -> Position {
        if self.pos == 0 {
            return self.start();
        }
        let t = &self.tokens[self.pos - 1];
        Position {
            line: t.end_line,
            column: t.end_column,
        }
    }

    fn span_from(&self, start: Position) -> Span {
        Span {
            start,
            end: self.last_end(),
        }
    }

    fn error(&self, message: &str) -> JSError {
        JSError::Parse {
            message: message.to_string(),
            name: self.name.clone(),
            line: self.cur().line,
            column: self.cur().column,
        }
    }

    fn intern(&mut self, s: &str) -> Sym {
        if let Some(&sym) = self.interned.get(s) {
            return sym;
        }
        let sym = self.table.len() as Sym;
        self.table.push(s.to_string());
        self.interned.insert(s.to_string(), sym);
        sym
    }

    fn check_punct(&self, p: Punct) -> bool {
        matches!(self.cur_kind(), TokenKind::Punct(q) if *q == p)
    }

    fn eat_punct(&mut self, p: Punct) -> bool {
        if self.check_punct(p) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, p: Punct) -> Result<(), JSError> {
        if self.eat_punct(p) {
            Ok(())
        } else {
            Err(self.error(&format!("expected {p:?}")))
        }
    }

    fn check_kw(&self, kw: &str) -> bool {
        matches!(self.cur_kind(), TokenKind::Ident(n) if n == kw)
    }

    fn eat_kw(&mut self, kw: &str) -> bool {
        if self.check_kw(kw) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect_kw(&mut self, kw: &str) -> Result<(), JSError> {
        if self.eat_kw(kw) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{kw}'")))
        }
    }

    /// Current token as a non-keyword identifier name.
    fn ident_name(&self) -> Option<String> {
        match self.cur_kind() {
            TokenKind::Ident(n) if !is_keyword(n) => Some(n.clone()),
            _ => None,
        }
    }

    fn expect_ident(&mut self) -> Result<Sym, JSError> {
        let Some(name) = self.ident_name() else {
            return Err(self.error("expected identifier"));
        };
        self.bump();
        Ok(self.intern(&name))
    }

    /// 7.9 automatic semicolon insertion: an explicit `;`, or an offending
    /// token that is `}`, EOF, or preceded by a line terminator.
    fn expect_semicolon(&mut self) -> Result<(), JSError> {
        if self.eat_punct(Punct::Semi) {
            return Ok(());
        }
        if self.check_punct(Punct::RBrace) || self.at_eof() || self.cur().newline_before {
            return Ok(());
        }
        Err(self.error("expected ';'"))
    }

    // ── Statements ──────────────────────────────────────────────────────

    fn parse_statement(&mut self) -> Result<Stmt, JSError> {
        let start = self.start();
        let kind = self.parse_statement_kind()?;
        Ok(Stmt {
            kind,
            span: self.span_from(start),
        })
    }

    fn parse_statement_kind(&mut self) -> Result<StmtKind, JSError> {
        if self.check_punct(Punct::LBrace) {
            return Ok(StmtKind::Block(self.parse_block_body()?));
        }
        if self.eat_punct(Punct::Semi) {
            return Ok(StmtKind::Empty);
        }
        let keyword = match self.cur_kind() {
            TokenKind::Ident(name) => Some(name.clone()),
            _ => None,
        };
        if let Some(name) = keyword {
            match name.as_str() {
                "var" => {
                    self.bump();
                    let decls = self.parse_var_declarators(false)?;
                    self.expect_semicolon()?;
                    return Ok(StmtKind::VarDecl(decls));
                }
                "if" => return self.parse_if(),
                "while" => return self.parse_while(),
                "do" => return self.parse_do_while(),
                "for" => return self.parse_for(),
                "function" => {
                    self.bump();
                    let node = self.parse_function_rest(true)?;
                    return Ok(StmtKind::FunctionDecl(Rc::new(node)));
                }
                "return" => return self.parse_return(),
                "throw" => return self.parse_throw(),
                "try" => return self.parse_try(),
                "switch" => return self.parse_switch(),
                "break" => {
                    self.bump();
                    let label = self.parse_label_opt();
                    self.expect_semicolon()?;
                    return Ok(StmtKind::Break(label));
                }
                "continue" => {
                    self.bump();
                    let label = self.parse_label_opt();
                    self.expect_semicolon()?;
                    return Ok(StmtKind::Continue(label));
                }
                "with" => {
                    self.bump();
                    self.expect_punct(Punct::LParen)?;
                    let object = self.parse_expression(false)?;
                    self.expect_punct(Punct::RParen)?;
                    return Ok(StmtKind::With(object, Box::new(self.parse_statement()?)));
                }
                "debugger" => {
                    self.bump();
                    self.expect_semicolon()?;
                    return Ok(StmtKind::Debugger);
                }
                _ => {
                    if !is_keyword(&name)
                        && matches!(
                            self.tokens.get(self.pos + 1).map(|t| &t.kind),
                            Some(TokenKind::Punct(Punct::Colon))
                        )
                    {
                        let label = self.expect_ident()?;
                        self.bump(); // ':'
                        return Ok(StmtKind::Labeled(label, Box::new(self.parse_statement()?)));
                    }
                }
            }
        }
        let expr = self.parse_expression(false)?;
        self.expect_semicolon()?;
        Ok(StmtKind::Expression(expr))
    }

    fn parse_label_opt(&mut self) -> Option<Sym> {
        if self.cur().newline_before {
            return None;
        }
        let name = self.ident_name()?;
        self.bump();
        Some(self.intern(&name))
    }

    fn parse_block_body(&mut self) -> Result<Vec<Stmt>, JSError> {
        self.expect_punct(Punct::LBrace)?;
        let mut body = Vec::new();
        while !self.check_punct(Punct::RBrace) {
            if self.at_eof() {
                return Err(self.error("unterminated block"));
            }
            body.push(self.parse_statement()?);
        }
        self.bump();
        Ok(body)
    }

    fn parse_block_stmt(&mut self) -> Result<Stmt, JSError> {
        let start = self.start();
        let body = self.parse_block_body()?;
        Ok(Stmt {
            kind: StmtKind::Block(body),
            span: self.span_from(start),
        })
    }

    fn parse_var_declarators(&mut self, no_in: bool) -> Result<Vec<VarDeclarator>, JSError> {
        let mut decls = Vec::new();
        loop {
            let id = self.expect_ident()?;
            let init = if self.eat_punct(Punct::Assign) {
                Some(self.parse_assignment(no_in)?)
            } else {
                None
            };
            decls.push(VarDeclarator { id, init });
            if !self.eat_punct(Punct::Comma) {
                return Ok(decls);
            }
        }
    }

    fn parse_if(&mut self) -> Result<StmtKind, JSError> {
        self.bump();
        self.expect_punct(Punct::LParen)?;
        let test = self.parse_expression(false)?;
        self.expect_punct(Punct::RParen)?;
        let consequent = Box::new(self.parse_statement()?);
        let alternate = if self.eat_kw("else") {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(StmtKind::If(test, consequent, alternate))
    }

    fn parse_while(&mut self) -> Result<StmtKind, JSError> {
        self.bump();
        self.expect_punct(Punct::LParen)?;
        let test = self.parse_expression(false)?;
        self.expect_punct(Punct::RParen)?;
        Ok(StmtKind::While(test, Box::new(self.parse_statement()?)))
    }

    fn parse_do_while(&mut self) -> Result<StmtKind, JSError> {
        self.bump();
        let body = Box::new(self.parse_statement()?);
        self.expect_kw("while")?;
        self.expect_punct(Punct::LParen)?;
        let test = self.parse_expression(false)?;
        self.expect_punct(Punct::RParen)?;
        self.eat_punct(Punct::Semi);
        Ok(StmtKind::DoWhile(body, test))
    }

    fn parse_for(&mut self) -> Result<StmtKind, JSError> {
        self.bump();
        self.expect_punct(Punct::LParen)?;

        if self.eat_kw("var") {
            let decls = self.parse_var_declarators(true)?;
            if self.eat_kw("in") {
                if decls.len() != 1 {
                    return Err(self.error("for-in needs a single variable declaration"));
                }
                let right = self.parse_expression(false)?;
                self.expect_punct(Punct::RParen)?;
                let body = Box::new(self.parse_statement()?);
                return Ok(StmtKind::ForIn {
                    left: ForInTarget::VarDecl(decls),
                    right,
                    body,
                });
            }
            self.expect_punct(Punct::Semi)?;
            return self.parse_for_rest(Some(ForInit::VarDecl(decls)));
        }

        if self.eat_punct(Punct::Semi) {
            return self.parse_for_rest(None);
        }

        let init = self.parse_expression(true)?;
        if self.eat_kw("in") {
            if !matches!(init.kind, ExprKind::Identifier(_) | ExprKind::Member { .. }) {
                return Err(self.error("invalid for-in loop target"));
            }
            let right = self.parse_expression(false)?;
            self.expect_punct(Punct::RParen)?;
            let body = Box::new(self.parse_statement()?);
            return Ok(StmtKind::ForIn {
                left: ForInTarget::Expr(init),
                right,
                body,
            });
        }
        self.expect_punct(Punct::Semi)?;
        self.parse_for_rest(Some(ForInit::Expr(init)))
    }

    fn parse_for_rest(&mut self, init: Option<ForInit>) -> Result<StmtKind, JSError> {
        let test = if self.check_punct(Punct::Semi) {
            None
        } else {
            Some(self.parse_expression(false)?)
        };
        self.expect_punct(Punct::Semi)?;
        let update = if self.check_punct(Punct::RParen) {
            None
        } else {
            Some(self.parse_expression(false)?)
        };
        self.expect_punct(Punct::RParen)?;
        let body = Box::new(self.parse_statement()?);
        Ok(StmtKind::For { init, test, update, body })
    }

    fn parse_return(&mut self) -> Result<StmtKind, JSError> {
        if self.fn_depth == 0 {
            return Err(self.error("return outside of function"));
        }
        self.bump();
        let argument = if self.check_punct(Punct::Semi) || self.check_punct(Punct::RBrace) || self.at_eof() || self.cur().newline_before {
            None
        } else {
            Some(self.parse_expression(false)?)
        };
        self.expect_semicolon()?;
        Ok(StmtKind::Return(argument))
    }

    fn parse_throw(&mut self) -> Result<StmtKind, JSError> {
        self.bump();
        if self.cur().newline_before {
            return Err(self.error("newline not allowed after 'throw'"));
        }
        let argument = self.parse_expression(false)?;
        self.expect_semicolon()?;
        Ok(StmtKind::Throw(argument))
    }

    fn parse_try(&mut self) -> Result<StmtKind, JSError> {
        self.bump();
        let block = Box::new(self.parse_block_stmt()?);
        let handler = if self.eat_kw("catch") {
            self.expect_punct(Punct::LParen)?;
            let param = self.expect_ident()?;
            self.expect_punct(Punct::RParen)?;
            Some(CatchClause {
                param,
                body: Box::new(self.parse_block_stmt()?),
            })
        } else {
            None
        };
        let finalizer = if self.eat_kw("finally") {
            Some(Box::new(self.parse_block_stmt()?))
        } else {
            None
        };
        if handler.is_none() && finalizer.is_none() {
            return Err(self.error("missing catch or finally after try"));
        }
        Ok(StmtKind::Try { block, handler, finalizer })
    }

    fn parse_switch(&mut self) -> Result<StmtKind, JSError> {
        self.bump();
        self.expect_punct(Punct::LParen)?;
        let discriminant = self.parse_expression(false)?;
        self.expect_punct(Punct::RParen)?;
        self.expect_punct(Punct::LBrace)?;
        let mut cases = Vec::new();
        let mut seen_default = false;
        while !self.eat_punct(Punct::RBrace) {
            if self.at_eof() {
                return Err(self.error("unterminated switch"));
            }
            let test = if self.eat_kw("case") {
                let test = self.parse_expression(false)?;
                Some(test)
            } else if self.eat_kw("default") {
                if seen_default {
                    return Err(self.error("duplicate default clause"));
                }
                seen_default = true;
                None
            } else {
                return Err(self.error("expected 'case' or 'default'"));
            };
            self.expect_punct(Punct::Colon)?;
            let mut body = Vec::new();
            while !self.check_punct(Punct::RBrace) && !self.check_kw("case") && !self.check_kw("default") {
                if self.at_eof() {
                    return Err(self.error("unterminated switch"));
                }
                body.push(self.parse_statement()?);
            }
            cases.push(SwitchCase { test, body });
        }
        Ok(StmtKind::Switch(discriminant, cases))
    }

    /// Parses `function` with the keyword already consumed.
    fn parse_function_rest(&mut self, name_required: bool) -> Result<FunctionNode, JSError> {
        let start = self.last_end();
        let id = match self.ident_name() {
            Some(name) => {
                self.bump();
                Some(self.intern(&name))
            }
            None if name_required => return Err(self.error("function declaration needs a name")),
            None => None,
        };
        self.expect_punct(Punct::LParen)?;
        let mut params = Vec::new();
        if !self.check_punct(Punct::RParen) {
            loop {
                params.push(self.expect_ident()?);
                if !self.eat_punct(Punct::Comma) {
                    break;
                }
            }
        }
        self.expect_punct(Punct::RParen)?;
        self.fn_depth += 1;
        let body = self.parse_block_body();
        self.fn_depth -= 1;
        Ok(FunctionNode {
            id,
            params,
            body: body?,
            span: self.span_from(start),
        })
    }

    // ── Expressions ─────────────────────────────────────────────────────

    fn parse_expression(&mut self, no_in: bool) -> Result<Expr, JSError> {
        let start = self.start();
        let first = self.parse_assignment(no_in)?;
        if !self.check_punct(Punct::Comma) {
            return Ok(first);
        }
        let mut exprs = vec![first];
        while self.eat_punct(Punct::Comma) {
            exprs.push(self.parse_assignment(no_in)?);
        }
        Ok(Expr {
            kind: ExprKind::Sequence(exprs),
            span: self.span_from(start),
        })
    }

    fn assignment_op(&self) -> Option<Option<BinaryOp>> {
        let p = match self.cur_kind() {
            TokenKind::Punct(p) => *p,
            _ => return None,
        };
        Some(match p {
            Punct::Assign => None,
            Punct::PlusAssign => Some(BinaryOp::Add),
            Punct::MinusAssign => Some(BinaryOp::Sub),
            Punct::StarAssign => Some(BinaryOp::Mul),
            Punct::SlashAssign => Some(BinaryOp::Div),
            Punct::PercentAssign => Some(BinaryOp::Mod),
            Punct::ShlAssign => Some(BinaryOp::Shl),
            Punct::ShrAssign => Some(BinaryOp::Shr),
            Punct::UShrAssign => Some(BinaryOp::UShr),
            Punct::AmpAssign => Some(BinaryOp::BitAnd),
            Punct::PipeAssign => Some(BinaryOp::BitOr),
            Punct::CaretAssign => Some(BinaryOp::BitXor),
            _ => return None,
        })
    }

    fn parse_assignment(&mut self, no_in: bool) -> Result<Expr, JSError> {
        let start = self.start();
        let left = self.parse_conditional(no_in)?;
        let Some(op) = self.assignment_op() else {
            return Ok(left);
        };
        if !matches!(left.kind, ExprKind::Identifier(_) | ExprKind::Member { .. }) {
            return Err(self.error("invalid assignment target"));
        }
        self.bump();
        let right = self.parse_assignment(no_in)?;
        Ok(Expr {
            kind: ExprKind::Assign(op, Box::new(left), Box::new(right)),
            span: self.span_from(start),
        })
    }

    fn parse_conditional(&mut self, no_in: bool) -> Result<Expr, JSError> {
        let start = self.start();
        let test = self.parse_binary(1, no_in)?;
        if !self.eat_punct(Punct::Question) {
            return Ok(test);
        }
        let consequent = self.parse_assignment(false)?;
        self.expect_punct(Punct::Colon)?;
        let alternate = self.parse_assignment(no_in)?;
        Ok(Expr {
            kind: ExprKind::Conditional(Box::new(test), Box::new(consequent), Box::new(alternate)),
            span: self.span_from(start),
        })
    }

    fn binary_op(&self, no_in: bool) -> Option<(BinKind, u8)> {
        use BinaryOp::*;
        if self.check_kw("instanceof") {
            return Some((BinKind::Bin(InstanceOf), 7));
        }
        if self.check_kw("in") {
            return if no_in { None } else { Some((BinKind::Bin(In), 7)) };
        }
        let p = match self.cur_kind() {
            TokenKind::Punct(p) => *p,
            _ => return None,
        };
        Some(match p {
            Punct::PipePipe => (BinKind::Log(LogicalOp::Or), 1),
            Punct::AmpAmp => (BinKind::Log(LogicalOp::And), 2),
            Punct::Pipe => (BinKind::Bin(BitOr), 3),
            Punct::Caret => (BinKind::Bin(BitXor), 4),
            Punct::Amp => (BinKind::Bin(BitAnd), 5),
            Punct::EqEq => (BinKind::Bin(Eq), 6),
            Punct::NotEq => (BinKind::Bin(NotEq), 6),
            Punct::EqEqEq => (BinKind::Bin(StrictEq), 6),
            Punct::NotEqEq => (BinKind::Bin(StrictNotEq), 6),
            Punct::Lt => (BinKind::Bin(Lt), 7),
            Punct::Gt => (BinKind::Bin(Gt), 7),
            Punct::Le => (BinKind::Bin(Le), 7),
            Punct::Ge => (BinKind::Bin(Ge), 7),
            Punct::Shl => (BinKind::Bin(Shl), 8),
            Punct::Shr => (BinKind::Bin(Shr), 8),
            Punct::UShr => (BinKind::Bin(UShr), 8),
            Punct::Plus => (BinKind::Bin(Add), 9),
            Punct::Minus => (BinKind::Bin(Sub), 9),
            Punct::Star => (BinKind::Bin(Mul), 10),
            Punct::Slash => (BinKind::Bin(Div), 10),
            Punct::Percent => (BinKind::Bin(Mod), 10),
            _ => return None,
        })
    }

    fn parse_binary(&mut self, min_prec: u8, no_in: bool) -> Result<Expr, JSError> {
        let start = self.start();
        let mut left = self.parse_unary(no_in)?;
        while let Some((kind, prec)) = self.binary_op(no_in) {
            if prec < min_prec {
                break;
            }
            self.bump();
            let right = self.parse_binary(prec + 1, no_in)?;
            left = Expr {
                kind: match kind {
                    BinKind::Bin(op) => ExprKind::Binary(op, Box::new(left), Box::new(right)),
                    BinKind::Log(op) => ExprKind::Logical(op, Box::new(left), Box::new(right)),
                },
                span: self.span_from(start),
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self, no_in: bool) -> Result<Expr, JSError> {
        let start = self.start();
        let unary = match self.cur_kind() {
            TokenKind::Ident(n) if n == "delete" => Some(UnaryOp::Delete),
            TokenKind::Ident(n) if n == "void" => Some(UnaryOp::Void),
            TokenKind::Ident(n) if n == "typeof" => Some(UnaryOp::TypeOf),
            TokenKind::Punct(Punct::Plus) => Some(UnaryOp::Plus),
            TokenKind::Punct(Punct::Minus) => Some(UnaryOp::Minus),
            TokenKind::Punct(Punct::Tilde) => Some(UnaryOp::BitNot),
            TokenKind::Punct(Punct::Bang) => Some(UnaryOp::Not),
            _ => None,
        };
        if let Some(op) = unary {
            self.bump();
            let arg = self.parse_unary(no_in)?;
            return Ok(Expr {
                kind: ExprKind::Unary(op, Box::new(arg)),
                span: self.span_from(start),
            });
        }
        if let TokenKind::Punct(p @ (Punct::PlusPlus | Punct::MinusMinus)) = self.cur_kind() {
            let op = if *p == Punct::PlusPlus {
                UpdateOp::Increment
            } else {
                UpdateOp::Decrement
            };
            self.bump();
            let arg = self.parse_unary(no_in)?;
            if !matches!(arg.kind, ExprKind::Identifier(_) | ExprKind::Member { .. }) {
                return Err(self.error("invalid increment/decrement target"));
            }
            return Ok(Expr {
                kind: ExprKind::Update {
                    op,
                    prefix: true,
                    arg: Box::new(arg),
                },
                span: self.span_from(start),
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, JSError> {
        let start = self.start();
        let expr = self.parse_left_hand_side()?;
        if !self.cur().newline_before
            && let TokenKind::Punct(p @ (Punct::PlusPlus | Punct::MinusMinus)) = self.cur_kind()
        {
            let op = if *p == Punct::PlusPlus {
                UpdateOp::Increment
            } else {
                UpdateOp::Decrement
            };
            if !matches!(expr.kind, ExprKind::Identifier(_) | ExprKind::Member { .. }) {
                return Err(self.error("invalid increment/decrement target"));
            }
            self.bump();
            return Ok(Expr {
                kind: ExprKind::Update {
                    op,
                    prefix: false,
                    arg: Box::new(expr),
                },
                span: self.span_from(start),
            });
        }
        Ok(expr)
    }

    fn parse_left_hand_side(&mut self) -> Result<Expr, JSError> {
        let start = self.start();
        let base = if self.check_kw("new") {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };
        self.parse_call_suffixes(base, start, true)
    }

    fn parse_new(&mut self) -> Result<Expr, JSError> {
        let start = self.start();
        self.bump(); // 'new'
        let callee = if self.check_kw("new") {
            self.parse_new()?
        } else {
            let cstart = self.start();
            let primary = self.parse_primary()?;
            self.parse_call_suffixes(primary, cstart, false)?
        };
        let args = if self.check_punct(Punct::LParen) {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        Ok(Expr {
            kind: ExprKind::New(Box::new(callee), args),
            span: self.span_from(start),
        })
    }

    fn parse_call_suffixes(&mut self, mut expr: Expr, start: Position, allow_call: bool) -> Result<Expr, JSError> {
        loop {
            if self.eat_punct(Punct::Dot) {
                let name = match self.cur_kind() {
                    TokenKind::Ident(n) => n.clone(),
                    _ => return Err(self.error("expected property name after '.'")),
                };
                self.bump();
                let sym = self.intern(&name);
                expr = Expr {
                    kind: ExprKind::Member {
                        object: Box::new(expr),
                        property: MemberKey::Name(sym),
                    },
                    span: self.span_from(start),
                };
            } else if self.eat_punct(Punct::LBracket) {
                let index = self.parse_expression(false)?;
                self.expect_punct(Punct::RBracket)?;
                expr = Expr {
                    kind: ExprKind::Member {
                        object: Box::new(expr),
                        property: MemberKey::Computed(Box::new(index)),
                    },
                    span: self.span_from(start),
                };
            } else if allow_call && self.check_punct(Punct::LParen) {
                let args = self.parse_arguments()?;
                expr = Expr {
                    kind: ExprKind::Call(Box::new(expr), args),
                    span: self.span_from(start),
                };
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expr>, JSError> {
        self.expect_punct(Punct::LParen)?;
        let mut args = Vec::new();
        if !self.check_punct(Punct::RParen) {
            loop {
                args.push(self.parse_assignment(false)?);
                if !self.eat_punct(Punct::Comma) {
                    break;
                }
            }
        }
        self.expect_punct(Punct::RParen)?;
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Expr, JSError> {
        let start = self.start();
        let kind = match self.cur_kind().clone() {
            TokenKind::Number(n) => {
                self.bump();
                ExprKind::Number(n)
            }
            TokenKind::Str(s) => {
                self.bump();
                ExprKind::StringLit(self.intern(&s))
            }
            TokenKind::Regex { pattern, flags } => {
                self.bump();
                ExprKind::RegExpLit {
                    pattern: self.intern(&pattern),
                    flags: self.intern(&flags),
                }
            }
            TokenKind::Ident(name) => match name.as_str() {
                "this" => {
                    self.bump();
                    ExprKind::This
                }
                "null" => {
                    self.bump();
                    ExprKind::Null
                }
                "true" => {
                    self.bump();
                    ExprKind::Boolean(true)
                }
                "false" => {
                    self.bump();
                    ExprKind::Boolean(false)
                }
                "function" => {
                    self.bump();
                    ExprKind::Function(Rc::new(self.parse_function_rest(false)?))
                }
                _ if !is_keyword(&name) => {
                    self.bump();
                    ExprKind::Identifier(self.intern(&name))
                }
                _ => return Err(self.error(&format!("unexpected keyword '{name}'"))),
            },
            TokenKind::Punct(Punct::LParen) => {
                self.bump();
                let expr = self.parse_expression(false)?;
                self.expect_punct(Punct::RParen)?;
                return Ok(expr);
            }
            TokenKind::Punct(Punct::LBracket) => self.parse_array_literal()?,
            TokenKind::Punct(Punct::LBrace) => self.parse_object_literal()?,
            other => return Err(self.error(&format!("unexpected token {other:?}"))),
        };
        Ok(Expr {
            kind,
            span: self.span_from(start),
        })
    }

    fn parse_array_literal(&mut self) -> Result<ExprKind, JSError> {
        self.bump(); // '['
        let mut elements: Vec<Option<Expr>> = Vec::new();
        loop {
            if self.eat_punct(Punct::RBracket) {
                break;
            }
            if self.eat_punct(Punct::Comma) {
                elements.push(None);
                continue;
            }
            elements.push(Some(self.parse_assignment(false)?));
            if !self.eat_punct(Punct::Comma) {
                self.expect_punct(Punct::RBracket)?;
                break;
            }
            // `[1, 2,]` — a single trailing comma is not an elision
            if self.eat_punct(Punct::RBracket) {
                break;
            }
        }
        Ok(ExprKind::Array(elements))
    }

    fn parse_property_key(&mut self) -> Result<Sym, JSError> {
        let key = match self.cur_kind().clone() {
            TokenKind::Ident(name) => name,
            TokenKind::Str(s) => s,
            TokenKind::Number(n) => number_to_string(n),
            _ => return Err(self.error("expected property name")),
        };
        self.bump();
        Ok(self.intern(&key))
    }

    fn parse_object_literal(&mut self) -> Result<ExprKind, JSError> {
        self.bump(); // '{'
        let mut properties = Vec::new();
        loop {
            if self.eat_punct(Punct::RBrace) {
                break;
            }
            let accessor = match self.cur_kind() {
                TokenKind::Ident(n) if (n == "get" || n == "set") => {
                    let is_get = n == "get";
                    match self.tokens.get(self.pos + 1).map(|t| &t.kind) {
                        Some(TokenKind::Ident(_)) | Some(TokenKind::Str(_)) | Some(TokenKind::Number(_)) => Some(is_get),
                        _ => None,
                    }
                }
                _ => None,
            };
            let prop = if let Some(is_get) = accessor {
                self.bump(); // 'get' / 'set'
                let key = self.parse_property_key()?;
                let fstart = self.start();
                self.expect_punct(Punct::LParen)?;
                let mut params = Vec::new();
                if !is_get {
                    params.push(self.expect_ident()?);
                }
                self.expect_punct(Punct::RParen)?;
                self.fn_depth += 1;
                let body = self.parse_block_body();
                self.fn_depth -= 1;
                let node = FunctionNode {
                    id: None,
                    params,
                    body: body?,
                    span: self.span_from(fstart),
                };
                PropertyInit {
                    key,
                    value: Expr {
                        kind: ExprKind::Function(Rc::new(node)),
                        span: self.span_from(fstart),
                    },
                    kind: if is_get { PropKind::Get } else { PropKind::Set },
                }
            } else {
                let key = self.parse_property_key()?;
                self.expect_punct(Punct::Colon)?;
                let value = self.parse_assignment(false)?;
                PropertyInit {
                    key,
                    value,
                    kind: PropKind::Init,
                }
            };
            properties.push(prop);
            if !self.eat_punct(Punct::Comma) {
                self.expect_punct(Punct::RBrace)?;
                break;
            }
        }
        Ok(ExprKind::Object(properties))
    }
}
