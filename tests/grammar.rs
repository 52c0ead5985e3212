// This file is part of safeshell-syntax.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! End-to-end grammar parser tests: the concrete scenarios and the
//! universal/boundary properties.

use safeshell_syntax::arith::ArithmeticExpression;
use safeshell_syntax::dialect::Shell;
use safeshell_syntax::parser::Parser;
use safeshell_syntax::syntax::{
    Alternate, BinaryTestOperator, LogicalTestOperator, ParamType, PipelineOperator, Statement, TestCondition,
    UnaryTestOperator, WordPart,
};
use safeshell_syntax::{parse, parse_with_recovery};

fn single_statement(source: &str) -> Statement {
    let program = parse(source, None).unwrap_or_else(|err| panic!("parse({source:?}) failed: {err}"));
    assert_eq!(program.body.len(), 1, "expected exactly one top-level statement in {source:?}");
    program.body.into_iter().next().unwrap()
}

fn command_args(word_values: &[&str]) -> Vec<String> {
    word_values.iter().map(|s| s.to_string()).collect()
}

// --- concrete scenario 1 --------------------------------------------------

#[test]
fn scenario_pipeline() {
    let statement = single_statement("ls -la | grep .ts");
    let Statement::Pipeline(pipeline) = statement else { panic!("expected Pipeline") };
    assert_eq!(pipeline.operator, Some(PipelineOperator::Pipe));
    assert_eq!(pipeline.commands.len(), 2);

    let Statement::Command(ls) = &pipeline.commands[0] else { panic!("expected Command") };
    assert_eq!(ls.name.value, "ls");
    assert_eq!(command_args(&["-la"]), ls.args.iter().map(|w| w.value.clone()).collect::<Vec<_>>());

    let Statement::Command(grep) = &pipeline.commands[1] else { panic!("expected Command") };
    assert_eq!(grep.name.value, "grep");
    assert_eq!(grep.args[0].value, ".ts");
}

// --- concrete scenario 2 --------------------------------------------------

#[test]
fn scenario_if_else() {
    let statement = single_statement("if test -f f; then echo y; else echo n; fi");
    let Statement::IfStatement(if_stmt) = statement else { panic!("expected IfStatement") };
    assert_eq!(if_stmt.consequent.len(), 1);
    let Statement::Command(echo_y) = &if_stmt.consequent[0] else { panic!("expected Command") };
    assert_eq!(echo_y.name.value, "echo");
    assert_eq!(echo_y.args[0].value, "y");

    match if_stmt.alternate {
        Alternate::Else(ref body) => {
            assert_eq!(body.len(), 1);
            let Statement::Command(echo_n) = &body[0] else { panic!("expected Command") };
            assert_eq!(echo_n.args[0].value, "n");
        }
        _ => panic!("expected Alternate::Else"),
    }
}

// --- concrete scenario 3 --------------------------------------------------

#[test]
fn scenario_for_loop() {
    let statement = single_statement("for i in 1 2 3; do echo $i; done");
    let Statement::ForStatement(for_stmt) = statement else { panic!("expected ForStatement") };
    assert_eq!(for_stmt.variable, "i");
    let iterable = for_stmt.iterable.expect("expected an 'in' clause");
    assert_eq!(iterable.iter().map(|w| w.value.clone()).collect::<Vec<_>>(), vec!["1", "2", "3"]);

    assert_eq!(for_stmt.body.len(), 1);
    let Statement::Command(echo) = &for_stmt.body[0] else { panic!("expected Command") };
    assert_eq!(echo.name.value, "echo");
    assert_eq!(echo.args.len(), 1);
    assert_eq!(echo.args[0].parts.len(), 1);
    match &echo.args[0].parts[0] {
        WordPart::ParameterExpansion(param) => assert_eq!(param.parameter, "i"),
        other => panic!("expected ParameterExpansion, got {other:?}"),
    }
}

// --- concrete scenario 4 --------------------------------------------------

#[test]
fn scenario_heredoc() {
    let statement = single_statement("cat <<EOF\nhello $u\nEOF\n");
    let Statement::Command(cat) = statement else { panic!("expected Command") };
    assert_eq!(cat.name.value, "cat");
    assert_eq!(cat.redirects.len(), 1);
    use safeshell_syntax::syntax::RedirectionBody;
    match &cat.redirects[0].body {
        RedirectionBody::HereDoc(here_doc) => {
            let body = here_doc.content.borrow();
            let body = body.as_ref().expect("heredoc body should have been drained");
            assert_eq!(body.value, "hello $u\n");
        }
        other => panic!("expected RedirectionBody::HereDoc, got {other:?}"),
    }
}

// --- concrete scenario 5 --------------------------------------------------

#[test]
fn scenario_leading_assignments() {
    let statement = single_statement("VAR=1 OTHER=2 cmd a b");
    let Statement::Command(cmd) = statement else { panic!("expected Command") };
    assert_eq!(cmd.name.value, "cmd");
    assert_eq!(cmd.assignments.len(), 2);
    assert_eq!(cmd.assignments[0].name, "VAR");
    assert_eq!(cmd.assignments[1].name, "OTHER");
    assert_eq!(command_args(&["a", "b"]), cmd.args.iter().map(|w| w.value.clone()).collect::<Vec<_>>());
}

// --- concrete scenario 6 --------------------------------------------------

#[test]
fn scenario_post_name_assignment_is_an_argument() {
    let statement = single_statement(r#"curl -d name="Basic""#);
    let Statement::Command(curl) = statement else { panic!("expected Command") };
    assert_eq!(curl.name.value, "curl");
    assert!(curl.assignments.is_empty(), "assignment-shaped word after the command name must not be hoisted");
    assert_eq!(curl.args.len(), 2);
    assert_eq!(curl.args[0].value, "-d");
    assert_eq!(curl.args[1].value, "name=Basic");
}

// --- concrete scenario 7 --------------------------------------------------

#[test]
fn scenario_right_associative_arithmetic_expansion() {
    let statement = single_statement("echo $((2 ** 3 ** 2))");
    let Statement::Command(echo) = statement else { panic!("expected Command") };
    assert_eq!(echo.args.len(), 1);
    assert_eq!(echo.args[0].parts.len(), 1);
    let WordPart::ArithmeticExpansion(expansion) = &echo.args[0].parts[0] else {
        panic!("expected ArithmeticExpansion")
    };
    let ArithmeticExpression::BinaryArithmeticExpression { operator, left, right, .. } = expansion.expression.as_ref()
    else {
        panic!("expected BinaryArithmeticExpression")
    };
    assert_eq!(*operator, safeshell_syntax::arith::ArithmeticOp::Pow);
    assert!(matches!(**left, ArithmeticExpression::NumberLiteral { value: 2, .. }));
    match right.as_ref() {
        ArithmeticExpression::BinaryArithmeticExpression { operator, left, right, .. } => {
            assert_eq!(*operator, safeshell_syntax::arith::ArithmeticOp::Pow);
            assert!(matches!(**left, ArithmeticExpression::NumberLiteral { value: 3, .. }));
            assert!(matches!(**right, ArithmeticExpression::NumberLiteral { value: 2, .. }));
        }
        other => panic!("expected a right-associative nested '**', got {other:?}"),
    }
}

// --- concrete scenario 8 --------------------------------------------------

#[test]
fn scenario_test_command_logical_and() {
    let statement = single_statement("[[ $x -gt 3 && -f /f ]]");
    let Statement::Pipeline(pipeline) = statement else { panic!("expected Pipeline") };
    assert_eq!(pipeline.commands.len(), 1);
    let Statement::TestCommand(test_command) = &pipeline.commands[0] else { panic!("expected TestCommand") };
    match &test_command.condition {
        TestCondition::Logical { operator: LogicalTestOperator::And, left: Some(left), right } => {
            match left.as_ref() {
                TestCondition::Binary { operator: BinaryTestOperator::NumGt, left, .. } => {
                    assert_eq!(left.parts.len(), 1);
                    match &left.parts[0] {
                        WordPart::ParameterExpansion(param) => {
                            assert_eq!(param.parameter, "x");
                            assert_eq!(param.param_type, ParamType::Variable);
                        }
                        other => panic!("expected ParameterExpansion, got {other:?}"),
                    }
                }
                other => panic!("expected BinaryTestOperator::NumGt, got {other:?}"),
            }
            match right.as_ref() {
                TestCondition::Unary { operator: UnaryTestOperator::RegularFile, operand } => {
                    assert_eq!(operand.value, "/f");
                }
                other => panic!("expected UnaryTestOperator::RegularFile, got {other:?}"),
            }
        }
        other => panic!("expected a top-level logical '&&', got {other:?}"),
    }
}

// --- universal properties -------------------------------------------------

#[test]
fn every_node_id_has_a_recorded_span() {
    let mut parser = Parser::new("if true; then for i in a b; do echo $i; done; fi", Shell::Bash);
    let program = parser.parse_program().expect("parse should succeed");
    let map = parser.get_position_map();
    assert!(map.size() > 0);
    for (id, span) in map.entries() {
        assert!(map.has(id));
        assert!(span.start.offset <= span.end.offset);
    }
    assert!(!program.body.is_empty());
}

#[test]
fn quoted_reserved_word_is_an_ordinary_name() {
    let statement = single_statement(r#"echo "if""#);
    let Statement::Command(echo) = statement else { panic!("expected Command") };
    assert_eq!(echo.args.len(), 1);
    assert!(echo.args[0].quoted);
    assert_eq!(echo.args[0].value, "if");

    use safeshell_syntax::diagnostics::DiagnosticCollector;
    use safeshell_syntax::lexer::{Lexer, TokenKind};
    let mut lexer = Lexer::new(r#""if""#);
    let mut collector = DiagnosticCollector::new();
    let token = lexer.next(&mut collector);
    assert_eq!(token.kind, TokenKind::Name);
}

#[test]
fn strict_and_recovery_agree_on_valid_input() {
    let source = "ls -la | grep .ts && echo done || echo failed";
    let strict = parse(source, None).unwrap();
    let (recovered, notes) = parse_with_recovery(source, None);
    assert_eq!(strict, recovered);
    assert!(notes.is_empty());
}

#[test]
fn left_associative_chain_stays_flat() {
    let statement = single_statement("cmd1 && cmd2 && cmd3");
    let Statement::Pipeline(pipeline) = statement else { panic!("expected Pipeline") };
    assert_eq!(pipeline.operator, Some(PipelineOperator::And));
    assert_eq!(pipeline.commands.len(), 3);
}

#[test]
fn precedence_layers_and_inside_or() {
    let statement = single_statement("cmd1 && cmd2 || cmd3");
    let Statement::Pipeline(outer) = statement else { panic!("expected Pipeline") };
    assert_eq!(outer.operator, Some(PipelineOperator::Or));
    assert_eq!(outer.commands.len(), 2);
    let Statement::Pipeline(inner) = &outer.commands[0] else { panic!("expected nested Pipeline") };
    assert_eq!(inner.operator, Some(PipelineOperator::And));
    assert_eq!(inner.commands.len(), 2);
}

#[test]
fn bare_command_is_a_single_command_pipeline() {
    let statement = single_statement("ls");
    let Statement::Pipeline(pipeline) = statement else { panic!("expected Pipeline") };
    assert_eq!(pipeline.operator, None);
    assert_eq!(pipeline.commands.len(), 1);
    assert!(!pipeline.background);
}

#[test]
fn background_flag_set_without_disturbing_single_command_operator() {
    let statement = single_statement("sleep 1 &");
    let Statement::Pipeline(pipeline) = statement else { panic!("expected Pipeline") };
    assert_eq!(pipeline.operator, None);
    assert_eq!(pipeline.commands.len(), 1);
    assert!(pipeline.background);
}

#[test]
fn background_multi_command_chain_reports_background_operator() {
    let statement = single_statement("make build && make test &");
    let Statement::Pipeline(pipeline) = statement else { panic!("expected Pipeline") };
    assert_eq!(pipeline.operator, Some(PipelineOperator::Background));
    assert_eq!(pipeline.commands.len(), 2);
    assert!(pipeline.background);
}

#[test]
fn dialect_detection_prefers_bash() {
    for (name, expected) in [("bash", Shell::Bash), ("sh", Shell::Sh), ("dash", Shell::Dash), ("ksh", Shell::Ksh), ("zsh", Shell::Zsh)] {
        let shebang = format!("#!/bin/{name}\necho hi\n");
        let detected = safeshell_syntax::detect_shell(&shebang, 10).unwrap_or_else(|| panic!("no shell detected for {name}"));
        assert_eq!(detected, expected, "shebang naming {name} should detect {expected:?}");
    }
}

#[test]
fn dialect_directive_is_overridden_by_shebang() {
    let source = "#!/bin/bash\n# shell: zsh\necho hi\n";
    let detected = safeshell_syntax::detect_shell(source, 10).unwrap();
    assert_eq!(detected, Shell::Bash);
}

// --- boundary cases --------------------------------------------------------

#[test]
fn empty_input_is_an_empty_program() {
    let program = parse("", None).unwrap();
    assert!(program.body.is_empty());
    let (_, notes) = parse_with_recovery("", None);
    assert!(notes.is_empty());
}

#[test]
fn whitespace_and_comments_only_input_is_empty() {
    let program = parse("   \n\t\n# just a comment\n\n", None).unwrap();
    assert!(program.body.is_empty());
}

#[test]
fn unterminated_double_quote_does_not_panic() {
    let (program, _notes) = parse_with_recovery("echo \"unterminated", None);
    assert_eq!(program.body.len(), 1);
}

#[test]
fn unterminated_single_quote_does_not_panic() {
    let (program, _notes) = parse_with_recovery("echo 'unterminated", None);
    assert_eq!(program.body.len(), 1);
}

#[test]
fn heredoc_without_closing_delimiter_runs_to_eof() {
    let (program, _notes) = parse_with_recovery("cat <<EOF\nline one\nline two\n", None);
    assert_eq!(program.body.len(), 1);
    let Statement::Command(cat) = &program.body[0] else { panic!("expected Command") };
    use safeshell_syntax::syntax::RedirectionBody;
    match &cat.redirects[0].body {
        RedirectionBody::HereDoc(here_doc) => {
            let body = here_doc.content.borrow();
            let body = body.as_ref().expect("unterminated heredoc body still gets drained at EOF");
            assert!(body.value.contains("line one") && body.value.contains("line two"));
        }
        other => panic!("expected RedirectionBody::HereDoc, got {other:?}"),
    }
}

#[test]
fn long_and_chain_produces_one_flat_pipeline() {
    let count = 2000;
    let source = (0..count).map(|i| format!("cmd{i}")).collect::<Vec<_>>().join(" && ");
    let program = parse(&source, None).unwrap_or_else(|err| panic!("parse of long chain failed: {err}"));
    assert_eq!(program.body.len(), 1);
    let Statement::Pipeline(pipeline) = &program.body[0] else { panic!("expected Pipeline") };
    assert_eq!(pipeline.operator, Some(PipelineOperator::And));
    assert_eq!(pipeline.commands.len(), count);
}
