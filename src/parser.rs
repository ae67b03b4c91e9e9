//! Recursive-descent parser that emits three-address code as it recognises
//! the program.
//!
//! There is no syntax tree. Each non-terminal is one method that consumes
//! tokens, emits instructions and hands back what its caller still needs: the
//! operand holding an expression's value, the true/false jump lists of a
//! condition, or the next-list of a statement. Forward jumps are emitted with
//! an empty target and resolved through `BackpatchList` once the address they
//! should reach is known.
//!
//! Errors in the program never stop the parse. They are recorded with the
//! current line, the missing token is treated as present (or the failed lookup
//! as valid), and parsing continues. Every loop consumes at least one token per
//! iteration, so malformed input always terminates.

use snafu::ensure;

use crate::Compilation;
use crate::backpatch::BackpatchList;
use crate::code::{ArithOp, Instruction, InstructionStore, RelOp, Rvalue, TempNames};
use crate::error::{
  AssignToConstantSnafu, CompileResult, DanglingJumpsSnafu, DiagnosticKind, Diagnostics,
  DuplicateDeclarationSnafu, ExpectedSnafu, NestingTooDeepSnafu, TrailingInputSnafu,
  UndeclaredSnafu,
};
use crate::options::Options;
use crate::symtab::{SymbolKind, SymbolTable};
use crate::tokenizer::{Scanner, Token, TokenKind};

/// Operand text used where an operand is missing from the source.
const MISSING: &str = "?";

/// Parse `source` and generate its listing.
pub fn parse(source: &str, options: &Options) -> CompileResult<Compilation> {
  Parser::new(source, options).run()
}

struct Parser<'a> {
  scanner: Scanner<'a>,
  current: Token,
  symbols: SymbolTable,
  code: InstructionStore,
  temps: TempNames,
  diagnostics: Diagnostics,
  depth: usize,
  max_depth: usize,
  depth_reported: bool,
}

impl<'a> Parser<'a> {
  fn new(source: &'a str, options: &Options) -> Self {
    let mut diagnostics = Diagnostics::default();
    let mut scanner = Scanner::new(source, options.max_digits);
    let current = scanner.next_token(&mut diagnostics);
    Self {
      scanner,
      current,
      symbols: SymbolTable::new(),
      code: InstructionStore::new(options.first_address),
      temps: TempNames::new(options.first_temp),
      diagnostics,
      depth: 0,
      max_depth: options.max_depth,
      depth_reported: false,
    }
  }

  fn run(mut self) -> CompileResult<Compilation> {
    let (program, next) = self.program()?;
    let end = self.code.next_address();
    next.backpatch(&mut self.code, end)?;

    let addresses = self.code.unresolved();
    ensure!(addresses.is_empty(), DanglingJumpsSnafu { addresses });

    log::debug!(
      "generated {} instructions, {} diagnostics",
      self.code.len(),
      self.diagnostics.len()
    );
    Ok(Compilation {
      program,
      symbols: self.symbols,
      code: self.code,
      diagnostics: self.diagnostics.into_vec(),
    })
  }

  fn next(&mut self) {
    self.current = self.scanner.next_token(&mut self.diagnostics);
  }

  fn at(&self, kind: &TokenKind) -> bool {
    self.current.kind == *kind
  }

  fn eat(&mut self, kind: &TokenKind) -> bool {
    if self.at(kind) {
      self.next();
      return true;
    }
    false
  }

  fn expect(&mut self, kind: &TokenKind) {
    if !self.eat(kind) {
      self.expected(&kind.to_string());
    }
  }

  fn expected(&mut self, what: &str) {
    let found = self.current.kind.to_string();
    self.report(
      ExpectedSnafu {
        expected: what,
        found,
      }
      .build(),
    );
  }

  fn report(&mut self, kind: DiagnosticKind) {
    self.report_at(self.current.line, kind);
  }

  fn report_at(&mut self, line: usize, kind: DiagnosticKind) {
    self.diagnostics.report(line, kind);
  }

  /// Take the current identifier, or report `what` as missing.
  fn ident(&mut self, what: &str) -> Option<String> {
    if let TokenKind::Ident(name) = &self.current.kind {
      let name = name.clone();
      self.next();
      return Some(name);
    }
    self.expected(what);
    None
  }

  fn starts_statement(&self) -> bool {
    matches!(
      self.current.kind,
      TokenKind::Ident(_) | TokenKind::If | TokenKind::While | TokenKind::Begin
    )
  }

  /// Enter one level of nesting. Past the limit the construct starting at the
  /// current token is skipped instead and `false` is returned.
  fn descend(&mut self) -> bool {
    if self.depth >= self.max_depth {
      if !self.depth_reported {
        self.depth_reported = true;
        self.report(
          NestingTooDeepSnafu {
            max: self.max_depth,
          }
          .build(),
        );
      }
      self.skip_construct();
      return false;
    }
    self.depth += 1;
    true
  }

  fn ascend(&mut self) {
    self.depth -= 1;
  }

  /// Drop tokens up to the `;`, `END` or `)` that closes the construct at the
  /// current token without parsing it. Bracketing pairs opened on the way are
  /// skipped whole.
  fn skip_construct(&mut self) {
    let mut open = 0usize;
    loop {
      match self.current.kind {
        TokenKind::Eof => return,
        TokenKind::Begin | TokenKind::LParen => open += 1,
        TokenKind::Semicolon | TokenKind::End | TokenKind::RParen if open == 0 => return,
        TokenKind::End | TokenKind::RParen => open -= 1,
        _ => {}
      }
      self.next();
    }
  }

  fn program(&mut self) -> CompileResult<(Option<String>, BackpatchList)> {
    self.expect(&TokenKind::Program);
    let name = self.ident("program name");
    let next = self.subprogram()?;

    if !self.at(&TokenKind::Eof) {
      let found = self.current.kind.to_string();
      self.report(TrailingInputSnafu { found }.build());
    }
    Ok((name, next))
  }

  fn subprogram(&mut self) -> CompileResult<BackpatchList> {
    loop {
      match self.current.kind {
        TokenKind::Const => self.const_decl()?,
        TokenKind::Var => self.var_decl(),
        _ => break,
      }
    }
    self.statement(BackpatchList::new())
  }

  fn const_decl(&mut self) -> CompileResult<()> {
    self.next();
    loop {
      self.const_def()?;
      if !self.eat(&TokenKind::Comma) {
        break;
      }
    }
    self.expect(&TokenKind::Semicolon);
    Ok(())
  }

  /// `id := num`, emitted as `id:=num`.
  fn const_def(&mut self) -> CompileResult<()> {
    let line = self.current.line;
    let name = self.ident("constant name");
    if let Some(name) = &name {
      self.declare(name, SymbolKind::Constant, line);
    }

    if !self.eat(&TokenKind::Becomes) {
      self.expected("':='");
      // `=` is the classic slip here; step over it.
      self.eat(&TokenKind::Eql);
    }

    let value = match self.current.kind {
      TokenKind::Number(value) => {
        self.next();
        Some(value)
      }
      _ => {
        self.expected("number");
        None
      }
    };

    if let (Some(dest), Some(value)) = (name, value) {
      self.code.emit(Instruction::Assign {
        dest,
        value: Rvalue::Copy(value.to_string()),
      })?;
    }
    Ok(())
  }

  fn var_decl(&mut self) {
    self.next();
    loop {
      let line = self.current.line;
      if let Some(name) = self.ident("variable name") {
        self.declare(&name, SymbolKind::Variable, line);
      }
      if !self.eat(&TokenKind::Comma) {
        break;
      }
    }
    self.expect(&TokenKind::Semicolon);
  }

  fn declare(&mut self, name: &str, kind: SymbolKind, line: usize) {
    if !self.symbols.declare(name, kind, line) {
      self.report_at(line, DuplicateDeclarationSnafu { name }.build());
    }
  }

  /// Parse one statement. `pending` holds the jumps of the preceding
  /// statement that should land wherever this one begins; the returned list
  /// holds this statement's own unresolved exits.
  fn statement(&mut self, pending: BackpatchList) -> CompileResult<BackpatchList> {
    if !self.descend() {
      return Ok(pending);
    }
    let next = match self.current.kind {
      TokenKind::Ident(_) => self.assignment(pending),
      TokenKind::If => self.if_stmt(pending),
      TokenKind::While => self.while_stmt(pending),
      TokenKind::Begin => self.compound(pending),
      // Empty statement: nothing emitted, pending jumps fall through.
      TokenKind::Semicolon | TokenKind::End | TokenKind::Eof => Ok(pending),
      _ => {
        self.expected("statement");
        self.next();
        Ok(pending)
      }
    };
    self.ascend();
    next
  }

  /// Resolve `pending` to the address the statement about to be generated
  /// starts at.
  fn enter(&mut self, pending: BackpatchList) -> CompileResult<usize> {
    let entry = self.code.next_address();
    pending.backpatch(&mut self.code, entry)?;
    Ok(entry)
  }

  fn assignment(&mut self, pending: BackpatchList) -> CompileResult<BackpatchList> {
    self.enter(pending)?;

    let line = self.current.line;
    let dest = self.ident("identifier").unwrap_or_else(|| MISSING.to_string());
    match self.symbols.kind_of(&dest) {
      Some(SymbolKind::Variable) => {}
      Some(SymbolKind::Constant) => {
        self.report_at(line, AssignToConstantSnafu { name: &dest }.build());
      }
      None => self.report_at(line, UndeclaredSnafu { name: &dest }.build()),
    }

    if !self.eat(&TokenKind::Becomes) {
      self.expected("':='");
      self.eat(&TokenKind::Eql);
    }

    let value = self.expression()?;
    self.code.emit(Instruction::Assign {
      dest,
      value: Rvalue::Copy(value),
    })?;
    Ok(BackpatchList::new())
  }

  fn compound(&mut self, pending: BackpatchList) -> CompileResult<BackpatchList> {
    self.next();
    let mut next = self.statement(pending)?;
    loop {
      if self.eat(&TokenKind::Semicolon) {
        next = self.statement(next)?;
      } else if self.starts_statement() {
        self.expected("';'");
        next = self.statement(next)?;
      } else {
        break;
      }
    }
    self.expect(&TokenKind::End);
    Ok(next)
  }

  /// IF C THEN (M1) S (M2)
  fn if_stmt(&mut self, pending: BackpatchList) -> CompileResult<BackpatchList> {
    self.enter(pending)?;
    self.next();

    let (truelist, falselist) = self.condition()?;
    self.expect(&TokenKind::Then);

    let m1 = self.code.next_address();
    truelist.backpatch(&mut self.code, m1)?;

    let next = self.statement(BackpatchList::new())?;

    let m2 = self.code.next_address();
    falselist.backpatch(&mut self.code, m2)?;
    Ok(next)
  }

  /// WHILE (M1) C DO (M2) S goto M1 (M3)
  fn while_stmt(&mut self, pending: BackpatchList) -> CompileResult<BackpatchList> {
    let m1 = self.enter(pending)?;
    self.next();

    let (truelist, falselist) = self.condition()?;
    self.expect(&TokenKind::Do);

    let m2 = self.code.next_address();
    truelist.backpatch(&mut self.code, m2)?;

    let body = self.statement(BackpatchList::new())?;
    body.backpatch(&mut self.code, m1)?;
    self.code.emit(Instruction::Jump { target: Some(m1) })?;

    let m3 = self.code.next_address();
    falselist.backpatch(&mut self.code, m3)?;
    Ok(BackpatchList::new())
  }

  /// Emits `if l op r goto _` and `goto _` back to back and returns their
  /// addresses as the true-list and false-list.
  fn condition(&mut self) -> CompileResult<(BackpatchList, BackpatchList)> {
    let lhs = self.expression()?;

    let op = match relational(&self.current.kind) {
      Some(op) => {
        self.next();
        op
      }
      None => {
        self.expected("relational operator");
        RelOp::Eq
      }
    };

    let rhs = self.expression()?;
    let on_true = self.code.emit(Instruction::CondJump {
      lhs,
      op,
      rhs,
      target: None,
    })?;
    let on_false = self.code.emit(Instruction::Jump { target: None })?;
    Ok((
      BackpatchList::single(on_true),
      BackpatchList::single(on_false),
    ))
  }

  /// Returns the operand (name, literal or temporary) holding the value.
  fn expression(&mut self) -> CompileResult<String> {
    if !self.descend() {
      return Ok(MISSING.to_string());
    }

    let negate = match self.current.kind {
      TokenKind::Minus => {
        self.next();
        true
      }
      TokenKind::Plus => {
        self.next();
        false
      }
      _ => false,
    };

    let mut value = self.term()?;
    if negate {
      let dest = self.temps.fresh();
      self.code.emit(Instruction::Assign {
        dest: dest.clone(),
        value: Rvalue::Neg(value),
      })?;
      value = dest;
    }

    loop {
      let op = match self.current.kind {
        TokenKind::Plus => ArithOp::Add,
        TokenKind::Minus => ArithOp::Sub,
        _ => break,
      };
      self.next();
      let rhs = self.term()?;
      value = self.binary(op, value, rhs)?;
    }

    self.ascend();
    Ok(value)
  }

  fn term(&mut self) -> CompileResult<String> {
    let mut value = self.factor()?;
    loop {
      let op = match self.current.kind {
        TokenKind::Times => ArithOp::Mul,
        TokenKind::Slash => ArithOp::Div,
        _ => break,
      };
      self.next();
      let rhs = self.factor()?;
      value = self.binary(op, value, rhs)?;
    }
    Ok(value)
  }

  fn factor(&mut self) -> CompileResult<String> {
    Ok(match &self.current.kind {
      TokenKind::Ident(name) => {
        let name = name.clone();
        if !self.symbols.lookup(&name) {
          self.report(UndeclaredSnafu { name: &name }.build());
        }
        self.next();
        name
      }
      TokenKind::Number(value) => {
        let value = value.to_string();
        self.next();
        value
      }
      TokenKind::LParen => {
        self.next();
        let value = self.expression()?;
        self.expect(&TokenKind::RParen);
        value
      }
      _ => {
        self.expected("identifier, number or '('");
        MISSING.to_string()
      }
    })
  }

  fn binary(&mut self, op: ArithOp, lhs: String, rhs: String) -> CompileResult<String> {
    let dest = self.temps.fresh();
    self.code.emit(Instruction::Assign {
      dest: dest.clone(),
      value: Rvalue::Binary { op, lhs, rhs },
    })?;
    Ok(dest)
  }
}

fn relational(kind: &TokenKind) -> Option<RelOp> {
  Some(match kind {
    TokenKind::Eql => RelOp::Eq,
    TokenKind::Neq => RelOp::Ne,
    TokenKind::Lss => RelOp::Lt,
    TokenKind::Leq => RelOp::Le,
    TokenKind::Gtr => RelOp::Gt,
    TokenKind::Geq => RelOp::Ge,
    _ => return None,
  })
}
