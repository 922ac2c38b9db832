use super::api::JsParser;
use super::api::Rule;
use super::ast::*;

use pest::consumes_to;
use pest::parses_to;
use pest::Parser;

fn parse_single_item(source: &str) -> ModuleItemType {
    let program = JsParser::parse_module(source).unwrap();
    assert_eq!(program.body.len(), 1, "expected one module item in {:?}", source);
    program.body.into_iter().next().unwrap()
}

fn parse_single_expression(source: &str) -> ExpressionType {
    match parse_single_item(source) {
        ModuleItemType::Statement(StatementType::ExpressionStatement { expression, .. }) => {
            *expression
        }
        other => panic!("expected an expression statement, got {:?}", other),
    }
}

#[test]
fn test_number_literal() {
    parses_to! {
        parser: JsParser,
        input: "10.5",
        rule: Rule::number,
        tokens: [
            number(0, 4)
        ]
    };
}

#[test]
fn test_string_literal_keeps_raw_body() {
    parses_to! {
        parser: JsParser,
        input: "\"a\\nb\"",
        rule: Rule::string,
        tokens: [
            string(0, 6, [
                string_double(1, 5)
            ])
        ]
    };
}

#[test]
fn test_identifier_excludes_reserved_words() {
    assert!(JsParser::parse(Rule::identifier, "in").is_err());
    assert!(JsParser::parse(Rule::identifier, "return").is_err());
    parses_to! {
        parser: JsParser,
        input: "instance",
        rule: Rule::identifier,
        tokens: [
            identifier(0, 8)
        ]
    };
}

#[test]
fn test_binary_precedence() {
    match parse_single_expression("1 + 2 * 3;") {
        ExpressionType::BinaryExpression {
            operator: BinaryOperator::Add,
            right,
            ..
        } => assert!(matches!(
            *right,
            ExpressionType::BinaryExpression {
                operator: BinaryOperator::Multiply,
                ..
            }
        )),
        other => panic!("unexpected tree {:?}", other),
    }
}

#[test]
fn test_exponent_is_right_associative() {
    match parse_single_expression("2 ** 3 ** 2;") {
        ExpressionType::BinaryExpression {
            operator: BinaryOperator::Exponent,
            left,
            right,
            ..
        } => {
            assert!(matches!(*left, ExpressionType::Literal(_)));
            assert!(matches!(*right, ExpressionType::BinaryExpression { .. }));
        }
        other => panic!("unexpected tree {:?}", other),
    }
}

#[test]
fn test_logical_operators_build_logical_nodes() {
    assert!(matches!(
        parse_single_expression("a ?? b || c;"),
        ExpressionType::LogicalExpression {
            operator: LogicalOperator::Nullish,
            ..
        }
    ));
}

#[test]
fn test_compound_assignment_is_not_split_into_binary() {
    assert!(matches!(
        parse_single_expression("total += 1;"),
        ExpressionType::AssignmentExpression {
            operator: AssignmentOperator::AddEquals,
            ..
        }
    ));
}

#[test]
fn test_invalid_assignment_target_is_rejected() {
    assert!(JsParser::parse_module("1 = 2;").is_err());
    assert!(JsParser::parse_module("f()++;").is_err());
}

#[test]
fn test_const_requires_initializer() {
    assert!(JsParser::parse_module("const a;").is_err());
    assert!(JsParser::parse_module("let a;").is_ok());
}

#[test]
fn test_member_and_call_chain() {
    match parse_single_expression("app.commands?.add(\"x\", ...rest);") {
        ExpressionType::CallExpression {
            callee, arguments, ..
        } => {
            assert_eq!(arguments.len(), 2);
            assert!(matches!(
                arguments[1],
                ExpressionOrSpreadElement::SpreadElement(_)
            ));
            assert!(matches!(
                *callee,
                ExpressionType::MemberExpression(MemberExpressionType::SimpleMemberExpression {
                    optional: true,
                    ..
                })
            ));
        }
        other => panic!("unexpected tree {:?}", other),
    }
}

#[test]
fn test_optional_call_and_index() {
    match parse_single_expression("handlers?.[name]?.(event);") {
        ExpressionType::CallExpression {
            callee, optional, ..
        } => {
            assert!(optional);
            assert!(matches!(
                *callee,
                ExpressionType::MemberExpression(MemberExpressionType::ComputedMemberExpression {
                    optional: true,
                    ..
                })
            ));
        }
        other => panic!("unexpected tree {:?}", other),
    }
    // `?.` followed by a digit is still a conditional.
    assert!(matches!(
        parse_single_expression("a?.5:1;"),
        ExpressionType::ConditionalExpression { .. }
    ));
}

#[test]
fn test_arrow_function_with_typed_parameters() {
    match parse_single_expression("async (a: number, b?: string): Promise<void> => a;") {
        ExpressionType::ArrowFunctionExpression(f) => {
            assert!(f.is_async);
            assert!(f.is_arrow);
            assert_eq!(f.params.len(), 2);
            assert!(matches!(f.body, FunctionBodyType::Expression(_)));
        }
        other => panic!("unexpected tree {:?}", other),
    }
}

#[test]
fn test_template_literal_quasis() {
    match parse_single_expression("`a${b}c${d}`;") {
        ExpressionType::TemplateLiteral {
            quasis,
            expressions,
            ..
        } => {
            assert_eq!(quasis, vec!["a".to_string(), "c".to_string(), String::new()]);
            assert_eq!(expressions.len(), 2);
        }
        other => panic!("unexpected tree {:?}", other),
    }
}

#[test]
fn test_object_literal_property_kinds() {
    match parse_single_expression("({ a, b: 1, [c]: 2, 'd': 3, 4: 5, m() {}, ...e });") {
        ExpressionType::ObjectExpression { properties, .. } => {
            assert_eq!(properties.len(), 7);
            assert!(matches!(properties[0], PropertyType::Init { shorthand: true, .. }));
            assert!(matches!(
                &properties[2],
                PropertyType::Init {
                    key: PropertyKey::Computed(_),
                    ..
                }
            ));
            match &properties[4] {
                PropertyType::Init {
                    key: PropertyKey::Static(k),
                    ..
                } => assert_eq!(k, "4"),
                other => panic!("unexpected property {:?}", other),
            }
            assert!(matches!(properties[5], PropertyType::Method { .. }));
            assert!(matches!(properties[6], PropertyType::Spread { .. }));
        }
        other => panic!("unexpected tree {:?}", other),
    }
}

#[test]
fn test_import_forms() {
    match parse_single_item("import def, { a, b as c, type T } from './mod';") {
        ModuleItemType::ImportDeclaration(data) => {
            assert_eq!(data.source, "./mod");
            assert!(!data.type_only);
            assert_eq!(data.specifiers.len(), 4);
            assert!(matches!(
                &data.specifiers[0],
                ImportSpecifierType::Default { local } if local.name == "def"
            ));
            assert!(matches!(
                &data.specifiers[2],
                ImportSpecifierType::Named { imported, local, type_only: false }
                    if imported == "b" && local.name == "c"
            ));
            assert!(matches!(
                &data.specifiers[3],
                ImportSpecifierType::Named { type_only: true, .. }
            ));
        }
        other => panic!("unexpected item {:?}", other),
    }
    match parse_single_item("import type { Token } from '@lumino/coreutils';") {
        ModuleItemType::ImportDeclaration(data) => assert!(data.type_only),
        other => panic!("unexpected item {:?}", other),
    }
    match parse_single_item("import * as ns from \"m\";") {
        ModuleItemType::ImportDeclaration(data) => assert!(matches!(
            &data.specifiers[0],
            ImportSpecifierType::Namespace { local } if local.name == "ns"
        )),
        other => panic!("unexpected item {:?}", other),
    }
    match parse_single_item("import 'side-effect';") {
        ModuleItemType::ImportDeclaration(data) => assert!(data.specifiers.is_empty()),
        other => panic!("unexpected item {:?}", other),
    }
}

#[test]
fn test_export_forms() {
    assert!(matches!(
        parse_single_item("export default { id: 'x' };"),
        ModuleItemType::ExportDefaultDeclaration {
            declaration: ExportDefaultType::Expression(_),
            ..
        }
    ));
    assert!(matches!(
        parse_single_item("export default function activate() {}"),
        ModuleItemType::ExportDefaultDeclaration {
            declaration: ExportDefaultType::FunctionDeclaration(_),
            ..
        }
    ));
    assert!(matches!(
        parse_single_item("export = plugin;"),
        ModuleItemType::ExportAssignment { .. }
    ));
    match parse_single_item("export { a, b as default } from './x';") {
        ModuleItemType::ExportSpecifiers {
            specifiers, source, ..
        } => {
            assert_eq!(source.as_deref(), Some("./x"));
            assert_eq!(specifiers[1].local, "b");
            assert_eq!(specifiers[1].exported, "default");
        }
        other => panic!("unexpected item {:?}", other),
    }
    assert!(matches!(
        parse_single_item("export * as helpers from './helpers';"),
        ModuleItemType::ExportAllDeclaration { exported: Some(_), .. }
    ));
    assert!(matches!(
        parse_single_item("export const a: number = 1, b = 2;"),
        ModuleItemType::ExportNamedDeclaration { .. }
    ));
}

#[test]
fn test_type_declarations_are_erased() {
    let program = JsParser::parse_module(
        "interface Options { readonly name?: string; run(x: number): void }\n\
         type Id = string | number;\n\
         export interface Shared<T> extends Options { value: T[] }\n\
         declare type Maybe<T> = T | null;\n\
         const x = (y as unknown as Options)!;",
    )
    .unwrap();
    assert_eq!(program.body.len(), 1);
}

#[test]
fn test_statements() {
    let statements = JsParser::parse_function_body(
        "for (let i = 0; i < 3; i++) { if (i === 1) continue; else break; }\n\
         for (const [k, v] of entries) {}\n\
         for (const key in obj) {}\n\
         while (false) {}\n\
         switch (x) { case 1: y(); break; default: z(); }\n\
         try { risky(); } catch (e) { handle(e); } finally { done(); }\n\
         try { risky(); } catch { }\n\
         return exports;",
    )
    .unwrap();
    assert_eq!(statements.len(), 8);
    assert!(matches!(statements[0], StatementType::ForStatement { .. }));
    assert!(matches!(statements[1], StatementType::ForOfStatement { .. }));
    assert!(matches!(statements[2], StatementType::ForInStatement { .. }));
    match &statements[4] {
        StatementType::SwitchStatement { cases, .. } => {
            assert_eq!(cases.len(), 2);
            assert!(cases[1].test.is_none());
            assert_eq!(cases[0].consequent.len(), 2);
        }
        other => panic!("unexpected statement {:?}", other),
    }
    assert!(matches!(statements[7], StatementType::ReturnStatement { .. }));
}

#[test]
fn test_destructuring_patterns() {
    let statements =
        JsParser::parse_function_body("const { a, b: { c = 1 }, ...rest } = obj; let [x, , y] = z;");
    assert!(statements.is_err(), "array holes are not supported");
    let statements =
        JsParser::parse_function_body("const { a, b: { c = 1 }, ...rest } = obj;").unwrap();
    match &statements[0] {
        StatementType::Declaration(DeclarationType::VariableDeclaration(data)) => {
            match &data.declarations[0].id {
                PatternType::ObjectPattern {
                    properties, rest, ..
                } => {
                    assert_eq!(properties.len(), 2);
                    assert!(rest.is_some());
                    assert!(matches!(
                        properties[1].value,
                        PatternType::ObjectPattern { .. }
                    ));
                }
                other => panic!("unexpected pattern {:?}", other),
            }
        }
        other => panic!("unexpected statement {:?}", other),
    }
}

#[test]
fn test_await_and_new() {
    match parse_single_expression("await new Foo.Bar(1);") {
        ExpressionType::AwaitExpression { argument, .. } => match *argument {
            ExpressionType::NewExpression {
                callee, arguments, ..
            } => {
                assert!(matches!(*callee, ExpressionType::MemberExpression(_)));
                assert_eq!(arguments.len(), 1);
            }
            other => panic!("unexpected tree {:?}", other),
        },
        other => panic!("unexpected tree {:?}", other),
    }
}

#[test]
fn test_comments_and_keywords_as_property_names() {
    let expression = parse_single_expression(
        "/* leading */ obj.default.new // trailing\n;",
    );
    assert!(matches!(expression, ExpressionType::MemberExpression(_)));
}
