use std::rc::Rc;

use pest::error::{Error, ErrorVariant};
use pest::iterators::Pair;
use pest::pratt_parser::PrattParser;
use pest::{Parser, Position};
use pest_derive::Parser;

use super::ast::*;
use super::util::{cook_string, format_number, parse_number};

#[derive(Parser)]
#[grammar = "parser/js_grammar.pest"] // relative to src
pub struct JsParser;

const TAB_WIDTH: usize = 2;

lazy_static! {
    static ref BINARY_PRATT_PARSER: PrattParser<Rule> = {
        use pest::pratt_parser::{Assoc, Op};
        PrattParser::new()
            .op(Op::infix(Rule::nullish, Assoc::Left))
            .op(Op::infix(Rule::logical_or, Assoc::Left))
            .op(Op::infix(Rule::logical_and, Assoc::Left))
            .op(Op::infix(Rule::bit_or, Assoc::Left))
            .op(Op::infix(Rule::bit_xor, Assoc::Left))
            .op(Op::infix(Rule::bit_and, Assoc::Left))
            .op(Op::infix(Rule::strict_eq, Assoc::Left)
                | Op::infix(Rule::strict_ne, Assoc::Left)
                | Op::infix(Rule::loose_eq, Assoc::Left)
                | Op::infix(Rule::loose_ne, Assoc::Left))
            .op(Op::infix(Rule::le, Assoc::Left)
                | Op::infix(Rule::ge, Assoc::Left)
                | Op::infix(Rule::lt, Assoc::Left)
                | Op::infix(Rule::gt, Assoc::Left)
                | Op::infix(Rule::op_instanceof, Assoc::Left)
                | Op::infix(Rule::op_in, Assoc::Left))
            .op(Op::infix(Rule::add, Assoc::Left) | Op::infix(Rule::sub, Assoc::Left))
            .op(Op::infix(Rule::mul, Assoc::Left)
                | Op::infix(Rule::div, Assoc::Left)
                | Op::infix(Rule::rem, Assoc::Left))
            .op(Op::infix(Rule::exponent, Assoc::Right))
    };
}

impl JsParser {
    /// Parses an ES module (plugin source) into its module items.
    pub fn parse_module(source: &str) -> Result<ProgramData, Error<Rule>> {
        let module_pair = match JsParser::parse(Rule::module, source)?.next() {
            Some(p) => p,
            None => return Err(get_empty_input_error(source)),
        };
        let meta = get_meta(&module_pair);
        let mut body = vec![];
        for item_pair in significant(module_pair) {
            if let Some(item) = build_ast_from_module_item(item_pair)? {
                body.push(item);
            }
        }
        Ok(ProgramData { meta, body })
    }

    /// Parses a bare statement list, as found inside a function body. Top
    /// level `return` and `await` are accepted.
    pub fn parse_function_body(script: &str) -> Result<Vec<StatementType>, Error<Rule>> {
        let body_pair = match JsParser::parse(Rule::function_body_script, script)?.next() {
            Some(p) => p,
            None => return Err(get_empty_input_error(script)),
        };
        build_ast_from_statement_list(body_pair)
    }
}

/// Renders the pest token tree of a module. Handy when debugging grammar
/// issues from the command line.
pub fn parse_to_token_tree(source: &str) -> Result<String, Error<Rule>> {
    let mut tree = vec![];
    for pair in JsParser::parse(Rule::module, source)? {
        tree.push(pair_to_string(pair, 0).join("\n"));
    }
    Ok(tree.join("\n"))
}

fn pair_to_string(pair: Pair<Rule>, level: usize) -> Vec<String> {
    let mut tree = vec![];
    let span = pair.as_span();
    tree.push(format!(
        "{}{:?} => ({},{}) #{:?}",
        " ".repeat(level * TAB_WIDTH),
        pair.as_rule(),
        span.start(),
        span.end(),
        span.as_str()
    ));
    for child_pair in pair.into_inner() {
        tree.append(pair_to_string(child_pair, level + 1).as_mut());
    }
    tree
}

fn get_meta(pair: &Pair<Rule>) -> Meta {
    let span = pair.as_span();
    Meta {
        start_index: span.start(),
        end_index: span.end(),
    }
}

fn get_unexpected_error(id: i32, pair: &Pair<Rule>) -> Error<Rule> {
    let message = format!("Unexpected state reached [{:?}] - {}", pair.as_rule(), id);
    Error::new_from_span(ErrorVariant::CustomError { message }, pair.as_span())
}

fn get_validation_error(message: &str, pair: &Pair<Rule>) -> Error<Rule> {
    Error::new_from_span(
        ErrorVariant::CustomError {
            message: message.to_string(),
        },
        pair.as_span(),
    )
}

fn get_empty_input_error(source: &str) -> Error<Rule> {
    Error::new_from_pos(
        ErrorVariant::CustomError {
            message: "Nothing to parse".to_string(),
        },
        Position::from_start(source),
    )
}

/// Keywords that only delimit syntax, and TypeScript-only syntax that is
/// erased from the tree.
fn is_noise(rule: Rule) -> bool {
    matches!(
        rule,
        Rule::kw_as
            | Rule::kw_break
            | Rule::kw_case
            | Rule::kw_catch
            | Rule::kw_continue
            | Rule::kw_declare
            | Rule::kw_default
            | Rule::kw_else
            | Rule::kw_export
            | Rule::kw_extends
            | Rule::kw_finally
            | Rule::kw_for
            | Rule::kw_from
            | Rule::kw_function
            | Rule::kw_if
            | Rule::kw_import
            | Rule::kw_in
            | Rule::kw_interface
            | Rule::kw_new
            | Rule::kw_of
            | Rule::kw_return
            | Rule::kw_switch
            | Rule::kw_throw
            | Rule::kw_try
            | Rule::kw_type
            | Rule::kw_while
            | Rule::type_annotation
            | Rule::type_parameters
            | Rule::ts_as_suffix
            | Rule::definite_marker
            | Rule::optional_marker
            | Rule::non_null_assertion
            | Rule::EOI
    )
}

fn significant<'i>(pair: Pair<'i, Rule>) -> impl Iterator<Item = Pair<'i, Rule>> {
    pair.into_inner().filter(|p| !is_noise(p.as_rule()))
}

fn first_significant<'i>(pair: Pair<'i, Rule>) -> Result<Pair<'i, Rule>, Error<Rule>> {
    let err = get_unexpected_error(1, &pair);
    significant(pair).next().ok_or(err)
}

fn get_identifier_data(pair: Pair<Rule>) -> IdentifierData {
    IdentifierData {
        name: pair.as_str().to_string(),
        meta: get_meta(&pair),
    }
}

fn get_string_value(pair: Pair<Rule>) -> String {
    match pair.into_inner().next() {
        Some(raw) => cook_string(raw.as_str()),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Module items
// ---------------------------------------------------------------------------

fn build_ast_from_module_item(pair: Pair<Rule>) -> Result<Option<ModuleItemType>, Error<Rule>> {
    let meta = get_meta(&pair);
    Ok(Some(match pair.as_rule() {
        Rule::import_declaration => {
            ModuleItemType::ImportDeclaration(build_ast_from_import_declaration(pair)?)
        }
        Rule::export_default => {
            let inner_pair = first_significant(pair)?;
            if inner_pair.as_rule() == Rule::ts_interface {
                return Ok(None);
            }
            let declaration = if inner_pair.as_rule() == Rule::function_declaration {
                ExportDefaultType::FunctionDeclaration(Rc::new(build_ast_from_function(
                    inner_pair,
                )?))
            } else {
                ExportDefaultType::Expression(Box::new(build_ast_from_expression(inner_pair)?))
            };
            ModuleItemType::ExportDefaultDeclaration { meta, declaration }
        }
        Rule::export_assignment => ModuleItemType::ExportAssignment {
            meta,
            expression: Box::new(build_ast_from_expression(first_significant(pair)?)?),
        },
        Rule::export_all => {
            let mut exported = None;
            let mut source = String::new();
            for inner_pair in significant(pair) {
                match inner_pair.as_rule() {
                    Rule::identifier_name => exported = Some(inner_pair.as_str().to_string()),
                    Rule::module_specifier => source = get_module_specifier(inner_pair)?,
                    _ => return Err(get_unexpected_error(2, &inner_pair)),
                }
            }
            ModuleItemType::ExportAllDeclaration {
                meta,
                exported,
                source,
            }
        }
        Rule::export_named => {
            let mut specifiers = vec![];
            let mut source = None;
            let mut type_only = false;
            for inner_pair in significant(pair) {
                match inner_pair.as_rule() {
                    Rule::type_only_marker => type_only = true,
                    Rule::export_clause => {
                        for spec_pair in inner_pair.into_inner() {
                            let mut names = significant(spec_pair).map(|p| p.as_str().to_string());
                            let local = names.next().unwrap_or_default();
                            let exported = names.next().unwrap_or_else(|| local.clone());
                            specifiers.push(ExportSpecifierData { local, exported });
                        }
                    }
                    Rule::module_specifier => source = Some(get_module_specifier(inner_pair)?),
                    _ => return Err(get_unexpected_error(3, &inner_pair)),
                }
            }
            ModuleItemType::ExportSpecifiers {
                meta,
                specifiers,
                source,
                type_only,
            }
        }
        Rule::export_declaration => {
            let inner_pair = first_significant(pair)?;
            match inner_pair.as_rule() {
                Rule::ts_declaration => return Ok(None),
                Rule::variable_statement => ModuleItemType::ExportNamedDeclaration {
                    meta,
                    declaration: DeclarationType::VariableDeclaration(
                        build_ast_from_variable_declaration(first_significant(inner_pair)?)?,
                    ),
                },
                Rule::function_declaration => ModuleItemType::ExportNamedDeclaration {
                    meta,
                    declaration: DeclarationType::FunctionDeclaration(Rc::new(
                        build_ast_from_function(inner_pair)?,
                    )),
                },
                _ => return Err(get_unexpected_error(4, &inner_pair)),
            }
        }
        _ => match build_ast_from_statement(pair)? {
            Some(s) => ModuleItemType::Statement(s),
            None => return Ok(None),
        },
    }))
}

fn get_module_specifier(pair: Pair<Rule>) -> Result<String, Error<Rule>> {
    Ok(get_string_value(first_significant(pair)?))
}

fn build_ast_from_import_declaration(pair: Pair<Rule>) -> Result<ImportDeclarationData, Error<Rule>> {
    let meta = get_meta(&pair);
    let mut specifiers = vec![];
    let mut source = String::new();
    let mut type_only = false;
    for inner_pair in significant(pair) {
        match inner_pair.as_rule() {
            Rule::type_only_marker => type_only = true,
            Rule::default_import => specifiers.push(ImportSpecifierType::Default {
                local: get_identifier_data(first_significant(inner_pair)?),
            }),
            Rule::namespace_import => specifiers.push(ImportSpecifierType::Namespace {
                local: get_identifier_data(first_significant(inner_pair)?),
            }),
            Rule::named_imports => {
                for spec_pair in inner_pair.into_inner() {
                    specifiers.push(build_ast_from_import_specifier(spec_pair)?);
                }
            }
            Rule::module_specifier => source = get_module_specifier(inner_pair)?,
            _ => return Err(get_unexpected_error(5, &inner_pair)),
        }
    }
    Ok(ImportDeclarationData {
        meta,
        specifiers,
        source,
        type_only,
    })
}

fn build_ast_from_import_specifier(pair: Pair<Rule>) -> Result<ImportSpecifierType, Error<Rule>> {
    let err = get_unexpected_error(26, &pair);
    let mut type_only = false;
    let mut imported = None;
    let mut local = None;
    for inner_pair in significant(pair) {
        match inner_pair.as_rule() {
            Rule::specifier_type_marker => type_only = true,
            Rule::identifier_name => {
                imported = Some(inner_pair.as_str().to_string());
                local = Some(get_identifier_data(inner_pair));
            }
            Rule::identifier => local = Some(get_identifier_data(inner_pair)),
            _ => return Err(get_unexpected_error(6, &inner_pair)),
        }
    }
    match (imported, local) {
        (Some(imported), Some(local)) => Ok(ImportSpecifierType::Named {
            imported,
            local,
            type_only,
        }),
        _ => Err(err),
    }
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

fn build_ast_from_statement_list(pair: Pair<Rule>) -> Result<Vec<StatementType>, Error<Rule>> {
    let mut statements = vec![];
    for inner_pair in significant(pair) {
        if let Some(s) = build_ast_from_statement(inner_pair)? {
            statements.push(s);
        }
    }
    Ok(statements)
}

/// Statements that are pure type declarations build to `None`.
fn build_ast_from_statement(pair: Pair<Rule>) -> Result<Option<StatementType>, Error<Rule>> {
    let meta = get_meta(&pair);
    Ok(Some(match pair.as_rule() {
        Rule::ts_declaration => return Ok(None),
        Rule::block_statement => StatementType::BlockStatement {
            meta,
            body: build_ast_from_statement_list(pair)?,
        },
        Rule::empty_statement => StatementType::EmptyStatement { meta },
        Rule::expression_statement => StatementType::ExpressionStatement {
            meta,
            expression: Box::new(build_ast_from_expression(first_significant(pair)?)?),
        },
        Rule::variable_statement => StatementType::Declaration(DeclarationType::VariableDeclaration(
            build_ast_from_variable_declaration(first_significant(pair)?)?,
        )),
        Rule::function_declaration => StatementType::Declaration(
            DeclarationType::FunctionDeclaration(Rc::new(build_ast_from_function(pair)?)),
        ),
        Rule::if_statement => {
            let mut pair_iter = significant(pair);
            let test = next_expression(&mut pair_iter, &meta)?;
            let consequent = next_statement(&mut pair_iter, &meta)?;
            let alternate = match pair_iter.next() {
                Some(p) => Some(Box::new(build_ast_from_required_statement(p)?)),
                None => None,
            };
            StatementType::IfStatement {
                meta,
                test,
                consequent,
                alternate,
            }
        }
        Rule::while_statement => {
            let mut pair_iter = significant(pair);
            let test = next_expression(&mut pair_iter, &meta)?;
            let body = next_statement(&mut pair_iter, &meta)?;
            StatementType::WhileStatement { meta, test, body }
        }
        Rule::for_statement => build_ast_from_for_statement(pair)?,
        Rule::for_in_statement | Rule::for_of_statement => {
            let is_of = pair.as_rule() == Rule::for_of_statement;
            let err = get_unexpected_error(7, &pair);
            let mut pair_iter = significant(pair);
            let kind = match pair_iter.next() {
                Some(p) => get_variable_declaration_kind(&p),
                None => return Err(err),
            };
            let left = match pair_iter.next() {
                Some(p) => build_ast_from_binding_target(p)?,
                None => return Err(err),
            };
            let right = next_expression(&mut pair_iter, &meta)?;
            let body = next_statement(&mut pair_iter, &meta)?;
            if is_of {
                StatementType::ForOfStatement {
                    meta,
                    kind,
                    left,
                    right,
                    body,
                }
            } else {
                StatementType::ForInStatement {
                    meta,
                    kind,
                    left,
                    right,
                    body,
                }
            }
        }
        Rule::switch_statement => {
            let mut pair_iter = significant(pair);
            let discriminant = next_expression(&mut pair_iter, &meta)?;
            let mut cases = vec![];
            for case_pair in pair_iter {
                cases.push(build_ast_from_switch_case(case_pair)?);
            }
            StatementType::SwitchStatement {
                meta,
                discriminant,
                cases,
            }
        }
        Rule::return_statement => StatementType::ReturnStatement {
            meta,
            argument: match significant(pair).next() {
                Some(p) => Some(Box::new(build_ast_from_expression(p)?)),
                None => None,
            },
        },
        Rule::throw_statement => StatementType::ThrowStatement {
            meta,
            argument: Box::new(build_ast_from_expression(first_significant(pair)?)?),
        },
        Rule::try_statement => {
            let mut block = vec![];
            let mut handler = None;
            let mut finalizer = None;
            for inner_pair in significant(pair) {
                match inner_pair.as_rule() {
                    Rule::block_statement => block = build_ast_from_statement_list(inner_pair)?,
                    Rule::catch_clause => {
                        let catch_meta = get_meta(&inner_pair);
                        let mut param = None;
                        let mut body = vec![];
                        for catch_pair in significant(inner_pair) {
                            if catch_pair.as_rule() == Rule::block_statement {
                                body = build_ast_from_statement_list(catch_pair)?;
                            } else {
                                param = Some(build_ast_from_binding_target(catch_pair)?);
                            }
                        }
                        handler = Some(CatchClauseData {
                            meta: catch_meta,
                            param,
                            body,
                        });
                    }
                    Rule::finally_clause => {
                        finalizer = Some(build_ast_from_statement_list(first_significant(
                            inner_pair,
                        )?)?);
                    }
                    _ => return Err(get_unexpected_error(8, &inner_pair)),
                }
            }
            StatementType::TryStatement {
                meta,
                block,
                handler,
                finalizer,
            }
        }
        Rule::break_statement => StatementType::BreakStatement { meta },
        Rule::continue_statement => StatementType::ContinueStatement { meta },
        _ => return Err(get_unexpected_error(9, &pair)),
    }))
}

fn build_ast_from_required_statement(pair: Pair<Rule>) -> Result<StatementType, Error<Rule>> {
    let meta = get_meta(&pair);
    Ok(build_ast_from_statement(pair)?.unwrap_or(StatementType::EmptyStatement { meta }))
}

fn next_expression<'i>(
    pair_iter: &mut impl Iterator<Item = Pair<'i, Rule>>,
    meta: &Meta,
) -> Result<Box<ExpressionType>, Error<Rule>> {
    match pair_iter.next() {
        Some(p) => Ok(Box::new(build_ast_from_expression(p)?)),
        None => Err(get_missing_node_error(meta)),
    }
}

fn next_statement<'i>(
    pair_iter: &mut impl Iterator<Item = Pair<'i, Rule>>,
    meta: &Meta,
) -> Result<Box<StatementType>, Error<Rule>> {
    match pair_iter.next() {
        Some(p) => Ok(Box::new(build_ast_from_required_statement(p)?)),
        None => Err(get_missing_node_error(meta)),
    }
}

fn get_missing_node_error(meta: &Meta) -> Error<Rule> {
    Error::new_from_pos(
        ErrorVariant::CustomError {
            message: format!(
                "Incomplete syntax tree between {} and {}",
                meta.start_index, meta.end_index
            ),
        },
        Position::from_start(""),
    )
}

fn build_ast_from_for_statement(pair: Pair<Rule>) -> Result<StatementType, Error<Rule>> {
    let meta = get_meta(&pair);
    let mut init = None;
    let mut test = None;
    let mut update = None;
    let mut body = None;
    for inner_pair in significant(pair) {
        match inner_pair.as_rule() {
            Rule::for_init => {
                let init_pair = first_significant(inner_pair)?;
                init = Some(if init_pair.as_rule() == Rule::variable_declaration {
                    ForInit::VariableDeclaration(build_ast_from_variable_declaration(init_pair)?)
                } else {
                    ForInit::Expression(Box::new(build_ast_from_expression(init_pair)?))
                });
            }
            Rule::for_test => {
                test = Some(Box::new(build_ast_from_expression(first_significant(inner_pair)?)?))
            }
            Rule::for_update => {
                update = Some(Box::new(build_ast_from_expression(first_significant(
                    inner_pair,
                )?)?))
            }
            _ => body = Some(Box::new(build_ast_from_required_statement(inner_pair)?)),
        }
    }
    match body {
        Some(body) => Ok(StatementType::ForStatement {
            meta,
            init,
            test,
            update,
            body,
        }),
        None => Err(get_missing_node_error(&meta)),
    }
}

fn build_ast_from_switch_case(pair: Pair<Rule>) -> Result<SwitchCaseData, Error<Rule>> {
    let meta = get_meta(&pair);
    let mut test = None;
    let mut consequent = vec![];
    let mut seen_head = false;
    for inner_pair in pair.into_inner() {
        match inner_pair.as_rule() {
            Rule::kw_case | Rule::kw_default => {}
            Rule::expression if !seen_head => {
                seen_head = true;
                test = Some(Box::new(build_ast_from_expression(inner_pair)?));
            }
            _ => {
                seen_head = true;
                if let Some(s) = build_ast_from_statement(inner_pair)? {
                    consequent.push(s);
                }
            }
        }
    }
    Ok(SwitchCaseData {
        meta,
        test,
        consequent,
    })
}

fn get_variable_declaration_kind(pair: &Pair<Rule>) -> VariableDeclarationKind {
    match pair.as_str() {
        "const" => VariableDeclarationKind::Const,
        "let" => VariableDeclarationKind::Let,
        _ => VariableDeclarationKind::Var,
    }
}

fn build_ast_from_variable_declaration(
    pair: Pair<Rule>,
) -> Result<VariableDeclarationData, Error<Rule>> {
    let meta = get_meta(&pair);
    let mut kind = VariableDeclarationKind::Var;
    let mut declarations = vec![];
    for inner_pair in significant(pair) {
        match inner_pair.as_rule() {
            Rule::var_kind => kind = get_variable_declaration_kind(&inner_pair),
            Rule::variable_declarator => {
                let declarator_meta = get_meta(&inner_pair);
                let missing_init_error =
                    get_validation_error("Missing initializer in const declaration", &inner_pair);
                let mut id = None;
                let mut init = None;
                for declarator_pair in significant(inner_pair) {
                    if declarator_pair.as_rule() == Rule::initializer {
                        init = Some(Box::new(build_ast_from_initializer(declarator_pair)?));
                    } else {
                        id = Some(build_ast_from_binding_target(declarator_pair)?);
                    }
                }
                if kind == VariableDeclarationKind::Const && init.is_none() {
                    return Err(missing_init_error);
                }
                match id {
                    Some(id) => declarations.push(VariableDeclaratorData {
                        meta: declarator_meta,
                        id,
                        init,
                    }),
                    None => return Err(get_missing_node_error(&declarator_meta)),
                }
            }
            _ => return Err(get_unexpected_error(10, &inner_pair)),
        }
    }
    Ok(VariableDeclarationData {
        meta,
        kind,
        declarations,
    })
}

fn build_ast_from_initializer(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    build_ast_from_expression(first_significant(pair)?)
}

// ---------------------------------------------------------------------------
// Functions and patterns
// ---------------------------------------------------------------------------

fn build_ast_from_function(pair: Pair<Rule>) -> Result<FunctionData, Error<Rule>> {
    let meta = get_meta(&pair);
    let mut is_async = false;
    let mut id = None;
    let mut params = vec![];
    let mut rest = None;
    let mut body = None;
    for inner_pair in significant(pair) {
        match inner_pair.as_rule() {
            Rule::kw_async => is_async = true,
            Rule::identifier => id = Some(get_identifier_data(inner_pair)),
            Rule::property_name => {}
            Rule::formal_parameters => {
                let (p, r) = build_ast_from_formal_parameters(inner_pair)?;
                params = p;
                rest = r;
            }
            Rule::function_body => {
                body = Some(FunctionBodyType::Block(build_ast_from_statement_list(
                    inner_pair,
                )?))
            }
            _ => return Err(get_unexpected_error(11, &inner_pair)),
        }
    }
    match body {
        Some(body) => Ok(FunctionData {
            meta,
            id,
            params,
            rest,
            body,
            is_async,
            is_arrow: false,
        }),
        None => Err(get_missing_node_error(&meta)),
    }
}

fn build_ast_from_arrow_function(pair: Pair<Rule>) -> Result<FunctionData, Error<Rule>> {
    let meta = get_meta(&pair);
    let mut is_async = false;
    let mut params = vec![];
    let mut rest = None;
    let mut body = None;
    for inner_pair in significant(pair) {
        match inner_pair.as_rule() {
            Rule::kw_async => is_async = true,
            Rule::arrow_parameters => {
                let param_pair = first_significant(inner_pair)?;
                if param_pair.as_rule() == Rule::identifier {
                    params.push(PatternType::Identifier(get_identifier_data(param_pair)));
                } else {
                    let (p, r) = build_ast_from_formal_parameters(param_pair)?;
                    params = p;
                    rest = r;
                }
            }
            Rule::function_body => {
                body = Some(FunctionBodyType::Block(build_ast_from_statement_list(
                    inner_pair,
                )?))
            }
            _ => {
                body = Some(FunctionBodyType::Expression(Box::new(
                    build_ast_from_expression(inner_pair)?,
                )))
            }
        }
    }
    match body {
        Some(body) => Ok(FunctionData {
            meta,
            id: None,
            params,
            rest,
            body,
            is_async,
            is_arrow: true,
        }),
        None => Err(get_missing_node_error(&meta)),
    }
}

fn build_ast_from_formal_parameters(
    pair: Pair<Rule>,
) -> Result<(Vec<PatternType>, Option<PatternType>), Error<Rule>> {
    let mut params = vec![];
    let mut rest = None;
    for param_pair in significant(pair) {
        let meta = get_meta(&param_pair);
        let mut is_rest = false;
        let mut target = None;
        let mut init = None;
        for inner_pair in significant(param_pair) {
            match inner_pair.as_rule() {
                Rule::rest_marker => is_rest = true,
                Rule::initializer => init = Some(build_ast_from_initializer(inner_pair)?),
                _ => target = Some(build_ast_from_binding_target(inner_pair)?),
            }
        }
        let target = match target {
            Some(t) => with_default(meta, t, init),
            None => return Err(get_missing_node_error(&meta)),
        };
        if is_rest {
            rest = Some(target);
        } else {
            params.push(target);
        }
    }
    Ok((params, rest))
}

fn with_default(meta: Meta, target: PatternType, init: Option<ExpressionType>) -> PatternType {
    match init {
        Some(right) => PatternType::AssignmentPattern {
            meta,
            left: Box::new(target),
            right: Box::new(right),
        },
        None => target,
    }
}

fn build_ast_from_binding_target(pair: Pair<Rule>) -> Result<PatternType, Error<Rule>> {
    let meta = get_meta(&pair);
    Ok(match pair.as_rule() {
        Rule::identifier => PatternType::Identifier(get_identifier_data(pair)),
        Rule::object_pattern => {
            let mut properties = vec![];
            let mut rest = None;
            for inner_pair in significant(pair) {
                let property_meta = get_meta(&inner_pair);
                match inner_pair.as_rule() {
                    Rule::rest_element => {
                        rest = Some(Box::new(build_ast_from_binding_target(first_significant(
                            inner_pair,
                        )?)?))
                    }
                    Rule::shorthand_binding_property => {
                        let mut property_iter = significant(inner_pair);
                        let id = match property_iter.next() {
                            Some(p) => get_identifier_data(p),
                            None => return Err(get_missing_node_error(&property_meta)),
                        };
                        let init = match property_iter.next() {
                            Some(p) => Some(build_ast_from_initializer(p)?),
                            None => None,
                        };
                        properties.push(AssignmentPropertyData {
                            meta: property_meta.clone(),
                            key: PropertyKey::Static(id.name.clone()),
                            value: with_default(property_meta, PatternType::Identifier(id), init),
                            shorthand: true,
                        });
                    }
                    Rule::aliased_binding_property => {
                        let mut property_iter = significant(inner_pair);
                        let key = match property_iter.next() {
                            Some(p) => build_ast_from_property_name(p)?,
                            None => return Err(get_missing_node_error(&property_meta)),
                        };
                        let value = match property_iter.next() {
                            Some(p) => build_ast_from_binding_element(p)?,
                            None => return Err(get_missing_node_error(&property_meta)),
                        };
                        properties.push(AssignmentPropertyData {
                            meta: property_meta,
                            key,
                            value,
                            shorthand: false,
                        });
                    }
                    _ => return Err(get_unexpected_error(12, &inner_pair)),
                }
            }
            PatternType::ObjectPattern {
                meta,
                properties,
                rest,
            }
        }
        Rule::array_pattern => {
            let mut elements = vec![];
            let mut rest = None;
            for inner_pair in significant(pair) {
                if inner_pair.as_rule() == Rule::rest_element {
                    rest = Some(Box::new(build_ast_from_binding_target(first_significant(
                        inner_pair,
                    )?)?));
                } else {
                    elements.push(build_ast_from_binding_element(inner_pair)?);
                }
            }
            PatternType::ArrayPattern {
                meta,
                elements,
                rest,
            }
        }
        _ => return Err(get_unexpected_error(13, &pair)),
    })
}

fn build_ast_from_binding_element(pair: Pair<Rule>) -> Result<PatternType, Error<Rule>> {
    let meta = get_meta(&pair);
    let mut pair_iter = significant(pair);
    let target = match pair_iter.next() {
        Some(p) => build_ast_from_binding_target(p)?,
        None => return Err(get_missing_node_error(&meta)),
    };
    let init = match pair_iter.next() {
        Some(p) => Some(build_ast_from_initializer(p)?),
        None => None,
    };
    Ok(with_default(meta, target, init))
}

fn build_ast_from_property_name(pair: Pair<Rule>) -> Result<PropertyKey, Error<Rule>> {
    let inner_pair = first_significant(pair)?;
    Ok(match inner_pair.as_rule() {
        Rule::identifier_name => PropertyKey::Static(inner_pair.as_str().to_string()),
        Rule::string => PropertyKey::Static(get_string_value(inner_pair)),
        Rule::number => match parse_number(inner_pair.as_str()) {
            Some(n) => PropertyKey::Static(format_number(n)),
            None => return Err(get_unexpected_error(14, &inner_pair)),
        },
        Rule::computed_property_name => PropertyKey::Computed(Box::new(
            build_ast_from_expression(first_significant(inner_pair)?)?,
        )),
        _ => return Err(get_unexpected_error(15, &inner_pair)),
    })
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

/// Builds any expression-level pair, from `expression` down to the primary
/// expressions.
fn build_ast_from_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    match pair.as_rule() {
        Rule::expression | Rule::parenthesized_expression => {
            build_ast_from_expression(first_significant(pair)?)
        }
        Rule::assignment_expression => build_ast_from_assignment_expression(pair),
        Rule::arrow_function => Ok(ExpressionType::ArrowFunctionExpression(Rc::new(
            build_ast_from_arrow_function(pair)?,
        ))),
        Rule::conditional_expression => build_ast_from_conditional_expression(pair),
        Rule::binary_expression => build_ast_from_binary_expression(pair),
        Rule::unary_expression => build_ast_from_unary_expression(pair),
        Rule::postfix_expression => build_ast_from_postfix_expression(pair),
        Rule::left_hand_side_expression => build_ast_from_left_hand_side_expression(pair),
        Rule::new_expression => build_ast_from_new_expression(pair),
        _ => build_ast_from_primary_expression(pair),
    }
}

fn build_ast_from_assignment_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let meta = get_meta(&pair);
    let mut pair_iter = significant(pair);
    let left_pair = match pair_iter.next() {
        Some(p) => p,
        None => return Err(get_missing_node_error(&meta)),
    };
    let operator_pair = match pair_iter.next() {
        Some(p) => p,
        None => return build_ast_from_expression(left_pair),
    };
    let operator = match operator_pair.as_str().trim() {
        "=" => AssignmentOperator::Equals,
        "+=" => AssignmentOperator::AddEquals,
        "-=" => AssignmentOperator::SubtractEquals,
        "*=" => AssignmentOperator::MultiplyEquals,
        "/=" => AssignmentOperator::DivideEquals,
        "%=" => AssignmentOperator::ModuloEquals,
        "||=" => AssignmentOperator::OrEquals,
        "&&=" => AssignmentOperator::AndEquals,
        "??=" => AssignmentOperator::NullishEquals,
        _ => return Err(get_unexpected_error(16, &operator_pair)),
    };
    let target_error = get_validation_error("Invalid left-hand side in assignment", &left_pair);
    let left = build_ast_from_expression(left_pair)?;
    if !is_simple_target(&left) {
        return Err(target_error);
    }
    let right = next_expression(&mut pair_iter, &meta)?;
    Ok(ExpressionType::AssignmentExpression {
        meta,
        operator,
        left: Box::new(left),
        right,
    })
}

fn is_simple_target(expression: &ExpressionType) -> bool {
    match expression {
        ExpressionType::Identifier(_) => true,
        ExpressionType::MemberExpression(
            MemberExpressionType::SimpleMemberExpression { optional, .. }
            | MemberExpressionType::ComputedMemberExpression { optional, .. },
        ) => !optional,
        _ => false,
    }
}

fn build_ast_from_conditional_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let meta = get_meta(&pair);
    let mut pair_iter = significant(pair);
    let test = next_expression(&mut pair_iter, &meta)?;
    match pair_iter.next() {
        None => Ok(*test),
        Some(consequent_pair) => {
            let consequent = Box::new(build_ast_from_expression(consequent_pair)?);
            let alternate = next_expression(&mut pair_iter, &meta)?;
            Ok(ExpressionType::ConditionalExpression {
                meta,
                test,
                consequent,
                alternate,
            })
        }
    }
}

fn build_ast_from_binary_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    BINARY_PRATT_PARSER
        .map_primary(build_ast_from_unary_expression)
        .map_infix(|left, op, right| {
            let left = Box::new(left?);
            let right = Box::new(right?);
            let meta = Meta::span(left.get_meta(), right.get_meta());
            let logical = match op.as_rule() {
                Rule::nullish => Some(LogicalOperator::Nullish),
                Rule::logical_or => Some(LogicalOperator::Or),
                Rule::logical_and => Some(LogicalOperator::And),
                _ => None,
            };
            if let Some(operator) = logical {
                return Ok(ExpressionType::LogicalExpression {
                    meta,
                    operator,
                    left,
                    right,
                });
            }
            let operator = match op.as_rule() {
                Rule::bit_or => BinaryOperator::BitwiseOr,
                Rule::bit_xor => BinaryOperator::BitwiseXor,
                Rule::bit_and => BinaryOperator::BitwiseAnd,
                Rule::strict_eq => BinaryOperator::StrictlyEqual,
                Rule::strict_ne => BinaryOperator::StrictlyUnequal,
                Rule::loose_eq => BinaryOperator::LooselyEqual,
                Rule::loose_ne => BinaryOperator::LooselyUnequal,
                Rule::le => BinaryOperator::LessThanEqual,
                Rule::ge => BinaryOperator::GreaterThanEqual,
                Rule::lt => BinaryOperator::LessThan,
                Rule::gt => BinaryOperator::GreaterThan,
                Rule::op_instanceof => BinaryOperator::InstanceOf,
                Rule::op_in => BinaryOperator::In,
                Rule::add => BinaryOperator::Add,
                Rule::sub => BinaryOperator::Subtract,
                Rule::mul => BinaryOperator::Multiply,
                Rule::div => BinaryOperator::Divide,
                Rule::rem => BinaryOperator::Modulo,
                Rule::exponent => BinaryOperator::Exponent,
                _ => return Err(get_unexpected_error(17, &op)),
            };
            Ok(ExpressionType::BinaryExpression {
                meta,
                operator,
                left,
                right,
            })
        })
        .parse(pair.into_inner())
}

fn build_ast_from_unary_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let err = get_unexpected_error(27, &pair);
    let mut prefixes = vec![];
    let mut argument = None;
    for inner_pair in pair.into_inner() {
        if inner_pair.as_rule() == Rule::postfix_expression {
            argument = Some(build_ast_from_postfix_expression(inner_pair)?);
        } else {
            prefixes.push(inner_pair);
        }
    }
    let mut expression = match argument {
        Some(a) => a,
        None => return Err(err),
    };
    for prefix in prefixes.into_iter().rev() {
        let meta = Meta {
            start_index: prefix.as_span().start(),
            end_index: expression.get_meta().end_index,
        };
        let argument = Box::new(expression);
        expression = match prefix.as_rule() {
            Rule::kw_await => ExpressionType::AwaitExpression { meta, argument },
            Rule::pre_increment | Rule::pre_decrement => {
                if !is_simple_target(&argument) {
                    return Err(get_validation_error(
                        "Invalid left-hand side expression in prefix operation",
                        &prefix,
                    ));
                }
                ExpressionType::UpdateExpression {
                    meta,
                    operator: if prefix.as_rule() == Rule::pre_increment {
                        UpdateOperator::PlusPlus
                    } else {
                        UpdateOperator::MinusMinus
                    },
                    argument,
                    prefix: true,
                }
            }
            rule => ExpressionType::UnaryExpression {
                meta,
                operator: match rule {
                    Rule::logical_not => UnaryOperator::LogicalNot,
                    Rule::negate => UnaryOperator::Minus,
                    Rule::unary_plus => UnaryOperator::Plus,
                    Rule::bitwise_not => UnaryOperator::BitwiseNot,
                    Rule::kw_typeof => UnaryOperator::TypeOf,
                    Rule::kw_void => UnaryOperator::Void,
                    Rule::kw_delete => UnaryOperator::Delete,
                    _ => return Err(get_unexpected_error(18, &prefix)),
                },
                argument,
            },
        };
    }
    Ok(expression)
}

fn build_ast_from_postfix_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let meta = get_meta(&pair);
    let mut expression = None;
    for inner_pair in significant(pair) {
        match inner_pair.as_rule() {
            Rule::left_hand_side_expression => {
                expression = Some(build_ast_from_left_hand_side_expression(inner_pair)?)
            }
            Rule::post_increment | Rule::post_decrement => {
                let argument = match expression.take() {
                    Some(a) if is_simple_target(&a) => a,
                    _ => {
                        return Err(get_validation_error(
                            "Invalid left-hand side expression in postfix operation",
                            &inner_pair,
                        ))
                    }
                };
                expression = Some(ExpressionType::UpdateExpression {
                    meta: meta.clone(),
                    operator: if inner_pair.as_rule() == Rule::post_increment {
                        UpdateOperator::PlusPlus
                    } else {
                        UpdateOperator::MinusMinus
                    },
                    argument: Box::new(argument),
                    prefix: false,
                });
            }
            _ => return Err(get_unexpected_error(19, &inner_pair)),
        }
    }
    expression.ok_or_else(|| get_missing_node_error(&meta))
}

fn build_ast_from_left_hand_side_expression(
    pair: Pair<Rule>,
) -> Result<ExpressionType, Error<Rule>> {
    let err = get_unexpected_error(28, &pair);
    let mut pair_iter = significant(pair);
    let mut expression = match pair_iter.next() {
        Some(p) => build_ast_from_expression(p)?,
        None => return Err(err),
    };
    for suffix_pair in pair_iter {
        expression = apply_call_suffix(expression, suffix_pair)?;
    }
    Ok(expression)
}

fn apply_call_suffix(object: ExpressionType, suffix_pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let meta = Meta {
        start_index: object.get_meta().start_index,
        end_index: suffix_pair.as_span().end(),
    };
    Ok(match suffix_pair.as_rule() {
        Rule::arguments => ExpressionType::CallExpression {
            meta,
            callee: Box::new(object),
            arguments: build_ast_from_list_elements(suffix_pair)?,
            optional: false,
        },
        Rule::optional_call => ExpressionType::CallExpression {
            meta,
            callee: Box::new(object),
            arguments: build_ast_from_list_elements(first_significant(suffix_pair)?)?,
            optional: true,
        },
        Rule::member_dot | Rule::optional_member => {
            let optional = suffix_pair.as_rule() == Rule::optional_member;
            ExpressionType::MemberExpression(MemberExpressionType::SimpleMemberExpression {
                meta,
                object: Box::new(object),
                property: get_identifier_data(first_significant(suffix_pair)?),
                optional,
            })
        }
        Rule::member_bracket | Rule::optional_bracket => {
            let optional = suffix_pair.as_rule() == Rule::optional_bracket;
            ExpressionType::MemberExpression(MemberExpressionType::ComputedMemberExpression {
                meta,
                object: Box::new(object),
                property: Box::new(build_ast_from_expression(first_significant(suffix_pair)?)?),
                optional,
            })
        }
        _ => return Err(get_unexpected_error(20, &suffix_pair)),
    })
}

fn build_ast_from_new_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let meta = get_meta(&pair);
    let mut pair_iter = significant(pair);
    let mut callee = match pair_iter.next() {
        Some(p) => build_ast_from_primary_expression(p)?,
        None => return Err(get_missing_node_error(&meta)),
    };
    let mut arguments = vec![];
    for inner_pair in pair_iter {
        if inner_pair.as_rule() == Rule::arguments {
            arguments = build_ast_from_list_elements(inner_pair)?;
        } else {
            callee = apply_call_suffix(callee, inner_pair)?;
        }
    }
    Ok(ExpressionType::NewExpression {
        meta,
        callee: Box::new(callee),
        arguments,
    })
}

fn build_ast_from_list_elements(
    pair: Pair<Rule>,
) -> Result<Vec<ExpressionOrSpreadElement>, Error<Rule>> {
    let mut elements = vec![];
    for inner_pair in significant(pair) {
        elements.push(if inner_pair.as_rule() == Rule::spread_element {
            ExpressionOrSpreadElement::SpreadElement(Box::new(build_ast_from_expression(
                first_significant(inner_pair)?,
            )?))
        } else {
            ExpressionOrSpreadElement::Expression(Box::new(build_ast_from_expression(inner_pair)?))
        });
    }
    Ok(elements)
}

fn build_ast_from_primary_expression(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let meta = get_meta(&pair);
    Ok(match pair.as_rule() {
        Rule::identifier => ExpressionType::Identifier(get_identifier_data(pair)),
        Rule::this_expression => ExpressionType::ThisExpression { meta },
        Rule::null_literal => ExpressionType::Literal(LiteralData {
            meta,
            value: LiteralType::NullLiteral,
        }),
        Rule::boolean_literal => ExpressionType::Literal(LiteralData {
            value: LiteralType::BooleanLiteral(pair.as_str() == "true"),
            meta,
        }),
        Rule::number => match parse_number(pair.as_str()) {
            Some(n) => ExpressionType::Literal(LiteralData {
                meta,
                value: LiteralType::NumberLiteral(n),
            }),
            None => return Err(get_unexpected_error(21, &pair)),
        },
        Rule::string => ExpressionType::Literal(LiteralData {
            meta,
            value: LiteralType::StringLiteral(get_string_value(pair)),
        }),
        Rule::template_literal => build_ast_from_template_literal(pair)?,
        Rule::array_literal => ExpressionType::ArrayExpression {
            meta,
            elements: build_ast_from_list_elements(pair)?,
        },
        Rule::object_literal => build_ast_from_object_literal(pair)?,
        Rule::function_expression => {
            ExpressionType::FunctionExpression(Rc::new(build_ast_from_function(pair)?))
        }
        Rule::parenthesized_expression | Rule::expression => {
            build_ast_from_expression(first_significant(pair)?)?
        }
        _ => return Err(get_unexpected_error(22, &pair)),
    })
}

fn build_ast_from_template_literal(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let meta = get_meta(&pair);
    let mut quasis = vec![String::new()];
    let mut expressions = vec![];
    for inner_pair in pair.into_inner() {
        match inner_pair.as_rule() {
            Rule::template_chars => {
                if let Some(last) = quasis.last_mut() {
                    last.push_str(&cook_string(inner_pair.as_str()));
                }
            }
            Rule::template_substitution => {
                expressions.push(build_ast_from_expression(first_significant(inner_pair)?)?);
                quasis.push(String::new());
            }
            _ => return Err(get_unexpected_error(23, &inner_pair)),
        }
    }
    Ok(ExpressionType::TemplateLiteral {
        meta,
        quasis,
        expressions,
    })
}

fn build_ast_from_object_literal(pair: Pair<Rule>) -> Result<ExpressionType, Error<Rule>> {
    let meta = get_meta(&pair);
    let mut properties = vec![];
    for property_pair in significant(pair) {
        let property_meta = get_meta(&property_pair);
        properties.push(match property_pair.as_rule() {
            Rule::spread_element => PropertyType::Spread {
                meta: property_meta,
                argument: Box::new(build_ast_from_expression(first_significant(property_pair)?)?),
            },
            Rule::shorthand_property => {
                let id = get_identifier_data(first_significant(property_pair)?);
                PropertyType::Init {
                    meta: property_meta,
                    key: PropertyKey::Static(id.name.clone()),
                    value: Box::new(ExpressionType::Identifier(id)),
                    shorthand: true,
                }
            }
            Rule::key_value_property => {
                let mut property_iter = significant(property_pair);
                let key = match property_iter.next() {
                    Some(p) => build_ast_from_property_name(p)?,
                    None => return Err(get_missing_node_error(&property_meta)),
                };
                let value = next_expression(&mut property_iter, &property_meta)?;
                PropertyType::Init {
                    meta: property_meta,
                    key,
                    value,
                    shorthand: false,
                }
            }
            Rule::method_property => {
                let key_pair = property_pair
                    .clone()
                    .into_inner()
                    .find(|p| p.as_rule() == Rule::property_name);
                let key = match key_pair {
                    Some(p) => build_ast_from_property_name(p)?,
                    None => return Err(get_unexpected_error(24, &property_pair)),
                };
                PropertyType::Method {
                    meta: property_meta,
                    key,
                    value: Rc::new(build_ast_from_function(property_pair)?),
                }
            }
            _ => return Err(get_unexpected_error(25, &property_pair)),
        });
    }
    Ok(ExpressionType::ObjectExpression { meta, properties })
}
