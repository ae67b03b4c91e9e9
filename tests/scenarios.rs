//! End-to-end tests through the public `compile` entry point.

use pl0tac::code::Instruction;
use pl0tac::{Compilation, CompileError, DiagnosticKind, Options, compile};

fn compile_default(source: &str) -> Compilation {
  compile(source, &Options::default()).expect("compilation aborted")
}

fn texts(c: &Compilation) -> Vec<String> {
  c.listing().into_iter().map(|(_, text)| text).collect()
}

/// Every jump carries a target inside the emitted range or the address just
/// past it.
fn assert_jumps_resolved(c: &Compilation) {
  let first = c.code.first_address();
  let end = c.code.next_address();
  for (address, instruction) in c.code.iter() {
    if instruction.is_jump() {
      let target = instruction
        .target()
        .unwrap_or_else(|| panic!("jump at {address} left blank"));
      assert!(
        (first..=end).contains(&target),
        "jump at {address} targets {target}, outside {first}..={end}"
      );
    }
  }
}

// ============================================================================
// Scenarios
// ============================================================================

mod scenarios {
  use super::*;

  #[test]
  fn straight_line_assignment() {
    let c = compile_default("PROGRAM p VAR x; x:=1+2");
    assert!(c.is_clean(), "{:?}", c.diagnostics);
    assert_eq!(texts(&c), vec!["0:\tt0:=1+2", "1:\tx:=t0"]);
    assert_eq!(c.code.len(), 2);
    assert!(c.code.unresolved().is_empty());
    assert_eq!(c.program.as_deref(), Some("p"));
  }

  #[test]
  fn if_targets_then_branch_and_fallthrough() {
    let c = compile_default("PROGRAM p VAR x; IF x>0 THEN x:=1");
    assert!(c.is_clean());
    assert_jumps_resolved(&c);

    let assign = c
      .code
      .iter()
      .find(|(_, i)| matches!(i, Instruction::Assign { dest, .. } if dest == "x"))
      .map(|(address, _)| address)
      .unwrap();

    let cond = c.code.get(0).unwrap();
    assert!(matches!(cond, Instruction::CondJump { .. }));
    assert_eq!(cond.target(), Some(assign));
    assert_eq!(c.code.get(1).unwrap().target(), Some(assign + 1));
  }

  #[test]
  fn while_exits_past_the_closing_goto() {
    let c = compile_default("PROGRAM p VAR x; WHILE x>0 DO x:=x-1");
    assert!(c.is_clean());
    assert_jumps_resolved(&c);
    assert_eq!(
      texts(&c),
      vec![
        "0:    if x > 0 goto 2",
        "1:    goto 5",
        "2:\tt0:=x-1",
        "3:\tx:=t0",
        "4:    goto 0",
      ]
    );

    // the closing goto returns to the first condition instruction
    let (closing, back) = c.code.iter().last().unwrap();
    assert_eq!(back.target(), Some(0));
    assert!(matches!(c.code.get(0), Some(Instruction::CondJump { .. })));
    assert_eq!(c.code.get(1).unwrap().target(), Some(closing + 1));
  }

  #[test]
  fn while_head_is_first_condition_instruction() {
    let c = compile_default("PROGRAM p VAR x; BEGIN x:=3; WHILE x*2>1 DO x:=x-1 END");
    assert!(c.is_clean());
    assert_jumps_resolved(&c);
    assert_eq!(
      texts(&c),
      vec![
        "0:\tx:=3",
        "1:\tt0:=x*2",
        "2:    if t0 > 1 goto 4",
        "3:    goto 7",
        "4:\tt1:=x-1",
        "5:\tx:=t1",
        "6:    goto 1",
      ]
    );
  }

  #[test]
  fn duplicate_constant_does_not_abort() {
    let c = compile_default("PROGRAM p CONST a:=1; CONST a:=2; VAR x; x:=a");
    assert_eq!(
      c.diagnostics
        .iter()
        .map(|d| d.kind.clone())
        .collect::<Vec<_>>(),
      vec![DiagnosticKind::DuplicateDeclaration {
        name: "a".to_string()
      }]
    );
    assert_eq!(texts(&c), vec!["0:\ta:=1", "1:\ta:=2", "2:\tx:=a"]);
  }

  #[test]
  fn duplicate_constant_without_trailing_semicolon() {
    let c = compile_default("PROGRAM p CONST a:=1; CONST a:=2");
    assert!(c.diagnostics.iter().any(|d| d.kind
      == DiagnosticKind::DuplicateDeclaration {
        name: "a".to_string()
      }));
    assert_eq!(c.code.len(), 2);
  }

  #[test]
  fn undeclared_reference_keeps_raw_name() {
    let c = compile_default("PROGRAM p VAR x; x:=y+1");
    assert_eq!(c.diagnostics.len(), 1);
    assert_eq!(c.diagnostics[0].line, 1);
    assert_eq!(
      c.diagnostics[0].kind,
      DiagnosticKind::Undeclared {
        name: "y".to_string()
      }
    );
    assert_eq!(texts(&c), vec!["0:\tt0:=y+1", "1:\tx:=t0"]);
  }
}

// ============================================================================
// Properties
// ============================================================================

mod properties {
  use super::*;

  const PROGRAMS: &[&str] = &[
    "PROGRAM p VAR x; IF x>0 THEN IF x<10 THEN x:=1",
    "PROGRAM p VAR x, y; WHILE x>0 DO BEGIN IF y=x THEN y:=0; x:=x-1 END",
    "PROGRAM p VAR x; BEGIN WHILE x>0 DO x:=x-1; WHILE x<5 DO x:=x+1 END",
    "PROGRAM p VAR x; BEGIN IF x>0 THEN WHILE x>0 DO x:=x-1; x:=7 END",
    "PROGRAM p VAR x; WHILE x>0 DO WHILE x>1 DO WHILE x>2 DO x:=x-1",
    "PROGRAM p VAR x; BEGIN IF x=0 THEN ; x:=1 END",
  ];

  #[test]
  fn every_jump_is_resolved_in_range() {
    for source in PROGRAMS {
      let c = compile_default(source);
      assert!(c.is_clean(), "{source}: {:?}", c.diagnostics);
      assert_jumps_resolved(&c);
    }
  }

  #[test]
  fn nothing_renders_a_blank_target() {
    for source in PROGRAMS {
      let c = compile_default(source);
      for (_, text) in c.listing() {
        assert!(!text.ends_with("goto "), "{source}: {text}");
      }
    }
  }

  #[test]
  fn addresses_are_dense_from_the_first_address() {
    let options = Options::default().with_first_address(40);
    let c = compile(PROGRAMS[1], &options).unwrap();
    let addresses: Vec<usize> = c.listing().into_iter().map(|(a, _)| a).collect();
    let expected: Vec<usize> = (40..40 + addresses.len()).collect();
    assert_eq!(addresses, expected);
    assert_jumps_resolved(&c);
  }

  #[test]
  fn if_with_empty_then_branch_jumps_to_next_statement() {
    let c = compile_default(PROGRAMS[5]);
    assert_eq!(
      texts(&c),
      vec!["0:    if x = 0 goto 2", "1:    goto 2", "2:\tx:=1"]
    );
  }

  #[test]
  fn diagnostics_carry_source_lines() {
    let source = "PROGRAM p\nVAR x;\nBEGIN\n  x:=1;\n  y:=2;\n  x:=z\nEND";
    let c = compile_default(source);
    let found: Vec<(usize, DiagnosticKind)> = c
      .diagnostics
      .iter()
      .map(|d| (d.line, d.kind.clone()))
      .collect();
    assert_eq!(
      found,
      vec![
        (
          5,
          DiagnosticKind::Undeclared {
            name: "y".to_string()
          }
        ),
        (
          6,
          DiagnosticKind::Undeclared {
            name: "z".to_string()
          }
        ),
      ]
    );
  }

  #[test]
  fn long_literal_is_reported_and_parsing_continues() {
    let options = Options::default().with_max_digits(3);
    let c = compile("PROGRAM p VAR x; x:=12345", &options).unwrap();
    assert!(matches!(
      c.diagnostics[0].kind,
      DiagnosticKind::NumberTooLong { max: 3, .. }
    ));
    assert_eq!(texts(&c), vec!["0:\tx:=12345"]);
  }

  #[test]
  fn first_address_at_the_top_of_the_range_is_an_error() {
    for first in [usize::MAX, usize::MAX - 1] {
      let options = Options::default().with_first_address(first);
      let result = compile("PROGRAM p VAR x; x:=1+2", &options);
      assert!(
        matches!(result, Err(CompileError::AddressOverflow { .. })),
        "{first}: {result:?}"
      );
    }

    // two instructions fit below usize::MAX
    let options = Options::default().with_first_address(usize::MAX - 2);
    let c = compile("PROGRAM p VAR x; x:=1+2", &options).unwrap();
    assert_eq!(c.code.next_address(), usize::MAX);
  }

  #[test]
  fn deep_nesting_reports_a_single_diagnostic() {
    let options = Options::default().with_max_depth(16);
    let source = format!(
      "PROGRAM p VAR x; {}x:=1{}",
      "BEGIN ".repeat(1000),
      " END".repeat(1000)
    );
    let c = compile(&source, &options).unwrap();
    assert_eq!(
      c.diagnostics
        .iter()
        .map(|d| d.kind.clone())
        .collect::<Vec<_>>(),
      vec![DiagnosticKind::NestingTooDeep { max: 16 }]
    );
    assert!(c.code.is_empty());
  }

  #[test]
  fn garbage_input_terminates_without_dangling_jumps() {
    for source in [
      "WHILE WHILE WHILE",
      "PROGRAM p VAR x; IF IF IF THEN THEN",
      "PROGRAM p VAR x; BEGIN BEGIN BEGIN",
      "PROGRAM p VAR ; CONST ; x := := := ;",
      "PROGRAM p VAR x; x:=)))(((",
      "))) END END ; ; PROGRAM",
    ] {
      let c = compile_default(source);
      assert!(!c.is_clean(), "{source}");
      assert_jumps_resolved(&c);
    }
  }
}
