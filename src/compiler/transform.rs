//! Lowers an ES module tree to the statement list of the sandbox body.
//!
//! Imports become `require` calls, exports become assignments on the local
//! `exports` object. A second walk awaits every `require(...)` call that sits
//! where `await` is allowed (module scope and async functions).

use std::rc::Rc;

use crate::parser::ast::*;
use crate::runner::plugin::ImportStatement;

use super::transpiler::Diagnostic;

pub const REQUIRE: &str = "require";
pub const EXPORTS: &str = "exports";

pub struct LoweredModule {
    pub body: Vec<StatementType>,
    pub imports: Vec<ImportStatement>,
    pub diagnostics: Vec<Diagnostic>,
    pub default_export: Option<String>,
}

pub fn lower_module(program: ProgramData, source: &str) -> LoweredModule {
    let mut lowering = ModuleLowering {
        source,
        body: vec![],
        trailing: vec![],
        imports: vec![],
        diagnostics: vec![],
        default_export: None,
        temp_counter: 0,
    };
    for item in program.body {
        lowering.lower_item(item);
    }
    let mut body = lowering.body;
    body.append(&mut lowering.trailing);
    for statement in body.iter_mut() {
        await_requires_in_statement(statement);
    }
    LoweredModule {
        body,
        imports: lowering.imports,
        diagnostics: lowering.diagnostics,
        default_export: lowering.default_export,
    }
}

struct ModuleLowering<'s> {
    source: &'s str,
    body: Vec<StatementType>,
    /// Local export lists (`export { a }`) are bound after the whole body ran.
    trailing: Vec<StatementType>,
    imports: Vec<ImportStatement>,
    diagnostics: Vec<Diagnostic>,
    default_export: Option<String>,
    temp_counter: usize,
}

impl<'s> ModuleLowering<'s> {
    fn lower_item(&mut self, item: ModuleItemType) {
        match item {
            ModuleItemType::Statement(s) => self.body.push(s),
            ModuleItemType::ImportDeclaration(data) => self.lower_import(data),
            ModuleItemType::ExportDefaultDeclaration { meta, declaration } => {
                let (text_meta, value) = match declaration {
                    ExportDefaultType::Expression(e) => (e.get_meta().clone(), *e),
                    ExportDefaultType::FunctionDeclaration(f) => {
                        let f_meta = f.meta.clone();
                        let value = match &f.id {
                            Some(id) => {
                                let value = identifier(&id.name, &meta);
                                self.body.push(StatementType::Declaration(
                                    DeclarationType::FunctionDeclaration(f.clone()),
                                ));
                                value
                            }
                            None => ExpressionType::FunctionExpression(f),
                        };
                        (f_meta, value)
                    }
                };
                self.record_default_export(&text_meta);
                self.body.push(export_assignment("default", value, &meta));
            }
            ModuleItemType::ExportAssignment { meta, .. } => {
                let diagnostic = Diagnostic {
                    message: "`export =` is not supported in plugins, use `export default` instead; the statement was dropped".to_string(),
                    start: meta.start_index,
                    end: meta.end_index,
                };
                warn!("{}", diagnostic);
                self.diagnostics.push(diagnostic);
            }
            ModuleItemType::ExportNamedDeclaration { meta, declaration } => {
                let mut names = vec![];
                match &declaration {
                    DeclarationType::FunctionDeclaration(f) => {
                        if let Some(id) = &f.id {
                            names.push(id.name.clone());
                        }
                    }
                    DeclarationType::VariableDeclaration(data) => {
                        for d in &data.declarations {
                            d.id.bound_names(&mut names);
                        }
                    }
                }
                self.body.push(StatementType::Declaration(declaration));
                for name in names {
                    let value = identifier(&name, &meta);
                    self.body.push(export_assignment(&name, value, &meta));
                }
            }
            ModuleItemType::ExportSpecifiers {
                meta,
                specifiers,
                source,
                type_only,
            } => {
                if type_only {
                    return;
                }
                match source {
                    None => {
                        for spec in specifiers {
                            if spec.exported == "default" {
                                self.default_export = Some(spec.local.clone());
                            }
                            let value = identifier(&spec.local, &meta);
                            self.trailing
                                .push(export_assignment(&spec.exported, value, &meta));
                        }
                    }
                    Some(module) => {
                        let temp = self.next_temp();
                        self.body.push(const_declaration(
                            PatternType::Identifier(IdentifierData {
                                name: temp.clone(),
                                meta: meta.clone(),
                            }),
                            require_call(&module, &meta),
                            &meta,
                        ));
                        for spec in specifiers {
                            self.imports.push(
                                ImportStatement::named(module.clone(), spec.local.clone())
                                    .with_alias(spec.exported.clone()),
                            );
                            if spec.exported == "default" {
                                self.default_export =
                                    Some(format!("{}.{}", module, spec.local));
                            }
                            let value = member(identifier(&temp, &meta), &spec.local, &meta);
                            self.body.push(export_assignment(&spec.exported, value, &meta));
                        }
                    }
                }
            }
            ModuleItemType::ExportAllDeclaration {
                meta,
                exported,
                source,
            } => match exported {
                Some(ns) => {
                    self.imports
                        .push(ImportStatement::whole(source.clone(), ns.clone()));
                    self.body
                        .push(export_assignment(&ns, require_call(&source, &meta), &meta));
                }
                None => {
                    self.imports
                        .push(ImportStatement::whole(source.clone(), source.clone()));
                    let temp = self.next_temp();
                    self.body.push(const_declaration(
                        PatternType::Identifier(IdentifierData {
                            name: temp.clone(),
                            meta: meta.clone(),
                        }),
                        require_call(&source, &meta),
                        &meta,
                    ));
                    self.body.push(copy_exports_loop(&temp, &meta));
                }
            },
        }
    }

    fn lower_import(&mut self, data: ImportDeclarationData) {
        let meta = data.meta.clone();
        let module = data.source;
        let mut namespace = None;
        let mut properties = vec![];
        for spec in &data.specifiers {
            match spec {
                ImportSpecifierType::Default { local } => {
                    self.imports.push(
                        ImportStatement::default_import(module.clone(), local.name.clone())
                            .with_type_only(data.type_only),
                    );
                    if !data.type_only {
                        properties.push(("default".to_string(), local.clone()));
                    }
                }
                ImportSpecifierType::Namespace { local } => {
                    self.imports.push(
                        ImportStatement::whole(module.clone(), local.name.clone())
                            .with_type_only(data.type_only),
                    );
                    if !data.type_only {
                        namespace = Some(local.clone());
                    }
                }
                ImportSpecifierType::Named {
                    imported,
                    local,
                    type_only,
                } => {
                    let erased = data.type_only || *type_only;
                    self.imports.push(
                        ImportStatement::named(module.clone(), imported.clone())
                            .with_alias(local.name.clone())
                            .with_type_only(erased),
                    );
                    if !erased {
                        properties.push((imported.clone(), local.clone()));
                    }
                }
            }
        }
        if data.type_only {
            return;
        }
        if data.specifiers.is_empty() {
            self.body.push(StatementType::ExpressionStatement {
                meta: meta.clone(),
                expression: Box::new(require_call(&module, &meta)),
            });
            return;
        }
        let source_value = match namespace {
            Some(ns) => {
                self.body.push(const_declaration(
                    PatternType::Identifier(ns.clone()),
                    require_call(&module, &meta),
                    &meta,
                ));
                identifier(&ns.name, &meta)
            }
            None => require_call(&module, &meta),
        };
        if properties.is_empty() {
            return;
        }
        let properties = properties
            .into_iter()
            .map(|(imported, local)| AssignmentPropertyData {
                meta: meta.clone(),
                shorthand: imported == local.name,
                key: PropertyKey::Static(imported),
                value: PatternType::Identifier(local),
            })
            .collect();
        self.body.push(const_declaration(
            PatternType::ObjectPattern {
                meta: meta.clone(),
                properties,
                rest: None,
            },
            source_value,
            &meta,
        ));
    }

    fn record_default_export(&mut self, meta: &Meta) {
        if self.default_export.is_some() {
            let diagnostic = Diagnostic {
                message: "duplicate default export, the last one wins".to_string(),
                start: meta.start_index,
                end: meta.end_index,
            };
            warn!("{}", diagnostic);
            self.diagnostics.push(diagnostic);
        }
        let text = self
            .source
            .get(meta.start_index..meta.end_index)
            .unwrap_or_default()
            .trim()
            .to_string();
        self.default_export = Some(text);
    }

    fn next_temp(&mut self) -> String {
        self.temp_counter += 1;
        format!("__reexport_{}", self.temp_counter)
    }
}

fn identifier(name: &str, meta: &Meta) -> ExpressionType {
    ExpressionType::Identifier(IdentifierData {
        name: name.to_string(),
        meta: meta.clone(),
    })
}

fn string_literal(value: &str, meta: &Meta) -> ExpressionType {
    ExpressionType::Literal(LiteralData {
        meta: meta.clone(),
        value: LiteralType::StringLiteral(value.to_string()),
    })
}

fn member(object: ExpressionType, property: &str, meta: &Meta) -> ExpressionType {
    ExpressionType::MemberExpression(MemberExpressionType::ComputedMemberExpression {
        meta: meta.clone(),
        object: Box::new(object),
        property: Box::new(string_literal(property, meta)),
        optional: false,
    })
}

fn exports_member(name: &str, meta: &Meta) -> ExpressionType {
    let is_plain_name = name
        .chars()
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        .unwrap_or(false)
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if is_plain_name {
        ExpressionType::MemberExpression(MemberExpressionType::SimpleMemberExpression {
            meta: meta.clone(),
            object: Box::new(identifier(EXPORTS, meta)),
            property: IdentifierData {
                name: name.to_string(),
                meta: meta.clone(),
            },
            optional: false,
        })
    } else {
        member(identifier(EXPORTS, meta), name, meta)
    }
}

fn require_call(module: &str, meta: &Meta) -> ExpressionType {
    ExpressionType::CallExpression {
        meta: meta.clone(),
        callee: Box::new(identifier(REQUIRE, meta)),
        arguments: vec![ExpressionOrSpreadElement::Expression(Box::new(
            string_literal(module, meta),
        ))],
        optional: false,
    }
}

fn export_assignment(name: &str, value: ExpressionType, meta: &Meta) -> StatementType {
    StatementType::ExpressionStatement {
        meta: meta.clone(),
        expression: Box::new(ExpressionType::AssignmentExpression {
            meta: meta.clone(),
            operator: AssignmentOperator::Equals,
            left: Box::new(exports_member(name, meta)),
            right: Box::new(value),
        }),
    }
}

fn const_declaration(id: PatternType, init: ExpressionType, meta: &Meta) -> StatementType {
    StatementType::Declaration(DeclarationType::VariableDeclaration(
        VariableDeclarationData {
            meta: meta.clone(),
            kind: VariableDeclarationKind::Const,
            declarations: vec![VariableDeclaratorData {
                meta: meta.clone(),
                id,
                init: Some(Box::new(init)),
            }],
        },
    ))
}

/// `for (const __key in temp) { if (__key !== "default") exports[__key] = temp[__key]; }`
fn copy_exports_loop(temp: &str, meta: &Meta) -> StatementType {
    let key = "__key";
    let assignment = StatementType::ExpressionStatement {
        meta: meta.clone(),
        expression: Box::new(ExpressionType::AssignmentExpression {
            meta: meta.clone(),
            operator: AssignmentOperator::Equals,
            left: Box::new(ExpressionType::MemberExpression(
                MemberExpressionType::ComputedMemberExpression {
                    meta: meta.clone(),
                    object: Box::new(identifier(EXPORTS, meta)),
                    property: Box::new(identifier(key, meta)),
                    optional: false,
                },
            )),
            right: Box::new(ExpressionType::MemberExpression(
                MemberExpressionType::ComputedMemberExpression {
                    meta: meta.clone(),
                    object: Box::new(identifier(temp, meta)),
                    property: Box::new(identifier(key, meta)),
                    optional: false,
                },
            )),
        }),
    };
    StatementType::ForInStatement {
        meta: meta.clone(),
        kind: VariableDeclarationKind::Const,
        left: PatternType::Identifier(IdentifierData {
            name: key.to_string(),
            meta: meta.clone(),
        }),
        right: Box::new(identifier(temp, meta)),
        body: Box::new(StatementType::IfStatement {
            meta: meta.clone(),
            test: Box::new(ExpressionType::BinaryExpression {
                meta: meta.clone(),
                operator: BinaryOperator::StrictlyUnequal,
                left: Box::new(identifier(key, meta)),
                right: Box::new(string_literal("default", meta)),
            }),
            consequent: Box::new(assignment),
            alternate: None,
        }),
    }
}

// ---------------------------------------------------------------------------
// Await injection
// ---------------------------------------------------------------------------

fn is_require_call(expression: &ExpressionType) -> bool {
    match expression {
        ExpressionType::CallExpression { callee, .. } => {
            matches!(&**callee, ExpressionType::Identifier(id) if id.name == REQUIRE)
        }
        _ => false,
    }
}

fn await_requires_in_statements(statements: &mut [StatementType]) {
    for s in statements.iter_mut() {
        await_requires_in_statement(s);
    }
}

fn await_requires_in_statement(statement: &mut StatementType) {
    match statement {
        StatementType::ExpressionStatement { expression, .. } => {
            await_requires_in_expression(expression)
        }
        StatementType::BlockStatement { body, .. } => await_requires_in_statements(body),
        StatementType::EmptyStatement { .. }
        | StatementType::BreakStatement { .. }
        | StatementType::ContinueStatement { .. } => {}
        StatementType::Declaration(DeclarationType::FunctionDeclaration(f)) => {
            await_requires_in_function(f)
        }
        StatementType::Declaration(DeclarationType::VariableDeclaration(data)) => {
            await_requires_in_variable_declaration(data)
        }
        StatementType::IfStatement {
            test,
            consequent,
            alternate,
            ..
        } => {
            await_requires_in_expression(test);
            await_requires_in_statement(consequent);
            if let Some(alternate) = alternate {
                await_requires_in_statement(alternate);
            }
        }
        StatementType::WhileStatement { test, body, .. } => {
            await_requires_in_expression(test);
            await_requires_in_statement(body);
        }
        StatementType::ForStatement {
            init,
            test,
            update,
            body,
            ..
        } => {
            match init {
                Some(ForInit::VariableDeclaration(data)) => {
                    await_requires_in_variable_declaration(data)
                }
                Some(ForInit::Expression(e)) => await_requires_in_expression(e),
                None => {}
            }
            if let Some(test) = test {
                await_requires_in_expression(test);
            }
            if let Some(update) = update {
                await_requires_in_expression(update);
            }
            await_requires_in_statement(body);
        }
        StatementType::ForInStatement {
            left, right, body, ..
        }
        | StatementType::ForOfStatement {
            left, right, body, ..
        } => {
            await_requires_in_pattern(left);
            await_requires_in_expression(right);
            await_requires_in_statement(body);
        }
        StatementType::SwitchStatement {
            discriminant,
            cases,
            ..
        } => {
            await_requires_in_expression(discriminant);
            for case in cases.iter_mut() {
                if let Some(test) = &mut case.test {
                    await_requires_in_expression(test);
                }
                await_requires_in_statements(&mut case.consequent);
            }
        }
        StatementType::ReturnStatement { argument, .. } => {
            if let Some(argument) = argument {
                await_requires_in_expression(argument);
            }
        }
        StatementType::ThrowStatement { argument, .. } => await_requires_in_expression(argument),
        StatementType::TryStatement {
            block,
            handler,
            finalizer,
            ..
        } => {
            await_requires_in_statements(block);
            if let Some(handler) = handler {
                if let Some(param) = &mut handler.param {
                    await_requires_in_pattern(param);
                }
                await_requires_in_statements(&mut handler.body);
            }
            if let Some(finalizer) = finalizer {
                await_requires_in_statements(finalizer);
            }
        }
    }
}

fn await_requires_in_variable_declaration(data: &mut VariableDeclarationData) {
    for d in data.declarations.iter_mut() {
        await_requires_in_pattern(&mut d.id);
        if let Some(init) = &mut d.init {
            await_requires_in_expression(init);
        }
    }
}

fn await_requires_in_pattern(pattern: &mut PatternType) {
    match pattern {
        PatternType::Identifier(_) => {}
        PatternType::ObjectPattern {
            properties, rest, ..
        } => {
            for p in properties.iter_mut() {
                if let PropertyKey::Computed(e) = &mut p.key {
                    await_requires_in_expression(e);
                }
                await_requires_in_pattern(&mut p.value);
            }
            if let Some(rest) = rest {
                await_requires_in_pattern(rest);
            }
        }
        PatternType::ArrayPattern { elements, rest, .. } => {
            for e in elements.iter_mut() {
                await_requires_in_pattern(e);
            }
            if let Some(rest) = rest {
                await_requires_in_pattern(rest);
            }
        }
        PatternType::AssignmentPattern { left, right, .. } => {
            await_requires_in_pattern(left);
            await_requires_in_expression(right);
        }
    }
}

/// Only async functions may contain `await`; other function bodies are
/// left untouched.
fn await_requires_in_function(f: &mut Rc<FunctionData>) {
    if !f.is_async {
        return;
    }
    let f = Rc::make_mut(f);
    for p in f.params.iter_mut() {
        await_requires_in_pattern(p);
    }
    if let Some(rest) = &mut f.rest {
        await_requires_in_pattern(rest);
    }
    match &mut f.body {
        FunctionBodyType::Block(body) => await_requires_in_statements(body),
        FunctionBodyType::Expression(e) => await_requires_in_expression(e),
    }
}

fn await_requires_in_list(elements: &mut [ExpressionOrSpreadElement]) {
    for e in elements.iter_mut() {
        match e {
            ExpressionOrSpreadElement::Expression(e)
            | ExpressionOrSpreadElement::SpreadElement(e) => await_requires_in_expression(e),
        }
    }
}

fn await_requires_in_expression(expression: &mut ExpressionType) {
    match expression {
        ExpressionType::AwaitExpression { argument, .. } => {
            if is_require_call(argument) {
                if let ExpressionType::CallExpression { arguments, .. } = &mut **argument {
                    await_requires_in_list(arguments);
                }
            } else {
                await_requires_in_expression(argument);
            }
            return;
        }
        ExpressionType::Literal(_)
        | ExpressionType::Identifier(_)
        | ExpressionType::ThisExpression { .. } => {}
        ExpressionType::TemplateLiteral { expressions, .. } => {
            for e in expressions.iter_mut() {
                await_requires_in_expression(e);
            }
        }
        ExpressionType::ArrayExpression { elements, .. } => await_requires_in_list(elements),
        ExpressionType::ObjectExpression { properties, .. } => {
            for p in properties.iter_mut() {
                match p {
                    PropertyType::Init { key, value, .. } => {
                        if let PropertyKey::Computed(k) = key {
                            await_requires_in_expression(k);
                        }
                        await_requires_in_expression(value);
                    }
                    PropertyType::Method { key, value, .. } => {
                        if let PropertyKey::Computed(k) = key {
                            await_requires_in_expression(k);
                        }
                        await_requires_in_function(value);
                    }
                    PropertyType::Spread { argument, .. } => {
                        await_requires_in_expression(argument)
                    }
                }
            }
        }
        ExpressionType::FunctionExpression(f) | ExpressionType::ArrowFunctionExpression(f) => {
            await_requires_in_function(f)
        }
        ExpressionType::UnaryExpression { argument, .. }
        | ExpressionType::UpdateExpression { argument, .. } => {
            await_requires_in_expression(argument)
        }
        ExpressionType::BinaryExpression { left, right, .. }
        | ExpressionType::LogicalExpression { left, right, .. }
        | ExpressionType::AssignmentExpression { left, right, .. } => {
            await_requires_in_expression(left);
            await_requires_in_expression(right);
        }
        ExpressionType::ConditionalExpression {
            test,
            consequent,
            alternate,
            ..
        } => {
            await_requires_in_expression(test);
            await_requires_in_expression(consequent);
            await_requires_in_expression(alternate);
        }
        ExpressionType::CallExpression {
            callee, arguments, ..
        }
        | ExpressionType::NewExpression {
            callee, arguments, ..
        } => {
            await_requires_in_expression(callee);
            await_requires_in_list(arguments);
        }
        ExpressionType::MemberExpression(MemberExpressionType::SimpleMemberExpression {
            object,
            ..
        }) => await_requires_in_expression(object),
        ExpressionType::MemberExpression(MemberExpressionType::ComputedMemberExpression {
            object,
            property,
            ..
        }) => {
            await_requires_in_expression(object);
            await_requires_in_expression(property);
        }
    }
    if is_require_call(expression) {
        let meta = expression.get_meta().clone();
        let call = std::mem::replace(
            expression,
            ExpressionType::ThisExpression { meta: meta.clone() },
        );
        *expression = ExpressionType::AwaitExpression {
            meta,
            argument: Box::new(call),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::codegen::CodeGenerator;
    use crate::parser::JsParser;

    fn lower(source: &str) -> (String, LoweredModule) {
        let program = JsParser::parse_module(source).unwrap();
        let lowered = lower_module(program, source);
        let mut generator = CodeGenerator::new();
        generator.emit_statements(&lowered.body);
        (generator.finish(), lowered)
    }

    #[test]
    fn test_named_and_default_imports_share_one_require() {
        let (text, lowered) = lower("import d, { a, b as c } from 'm';");
        assert_eq!(
            text,
            "const { default: d, a, b: c } = await require(\"m\");\n"
        );
        assert_eq!(lowered.imports.len(), 3);
        assert!(lowered.imports[0].is_default);
        assert_eq!(lowered.imports[2].local_name(), "c");
    }

    #[test]
    fn test_namespace_and_side_effect_imports() {
        let (text, _) = lower("import * as ns from 'm'; import 'n';");
        assert_eq!(
            text,
            "const ns = await require(\"m\");\nawait require(\"n\");\n"
        );
    }

    #[test]
    fn test_type_only_imports_are_erased_but_described() {
        let (text, lowered) =
            lower("import type { A } from 'types'; import { type B, c } from 'm';");
        assert_eq!(text, "const { c } = await require(\"m\");\n");
        assert_eq!(lowered.imports.len(), 3);
        assert!(lowered.imports[0].is_type_only);
        assert!(lowered.imports[1].is_type_only);
        assert!(!lowered.imports[2].is_type_only);
    }

    #[test]
    fn test_user_require_calls_are_awaited_once() {
        let (text, _) = lower("const a = require('a'); const b = await require('b');");
        assert_eq!(
            text,
            "const a = await require(\"a\");\nconst b = await require(\"b\");\n"
        );
    }

    #[test]
    fn test_sync_function_bodies_are_not_awaited() {
        let (text, _) = lower("function f() { return require('x'); }");
        assert!(text.contains("return require(\"x\");"));
        let (text, _) = lower("const f = async () => require('x');");
        assert!(text.contains("async () => await require(\"x\")"));
    }

    #[test]
    fn test_default_export_is_recorded_as_source_text() {
        let (text, lowered) = lower("export default  1 + 1 ;");
        assert_eq!(text, "exports.default = 1 + 1;\n");
        assert_eq!(lowered.default_export.as_deref(), Some("1 + 1"));
    }

    #[test]
    fn test_export_assignment_is_dropped_with_diagnostic() {
        let (text, lowered) = lower("const x = 1; export = x;");
        assert_eq!(text, "const x = 1;\n");
        assert_eq!(lowered.diagnostics.len(), 1);
        assert!(lowered.default_export.is_none());
    }

    #[test]
    fn test_named_exports() {
        let (text, lowered) =
            lower("export const a = 1, { b } = o; export function f() {} export { a as default, f as g };");
        assert_eq!(
            text,
            "const a = 1, { b } = o;\nexports.a = a;\nexports.b = b;\nfunction f() {}\nexports.f = f;\nexports.default = a;\nexports.g = f;\n"
        );
        assert_eq!(lowered.default_export.as_deref(), Some("a"));
    }

    #[test]
    fn test_reexports() {
        let (text, _) = lower("export { x as y } from './x'; export * from 'all'; export * as ns from 'n';");
        assert_eq!(
            text,
            "const __reexport_1 = await require(\"./x\");\n\
             exports.y = __reexport_1[\"x\"];\n\
             const __reexport_2 = await require(\"all\");\n\
             for (const __key in __reexport_2) {\n  if (__key !== \"default\") {\n    exports[__key] = __reexport_2[__key];\n  }\n}\n\
             exports.ns = await require(\"n\");\n"
        );
    }
}
