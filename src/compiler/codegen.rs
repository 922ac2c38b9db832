//! Prints a statement tree back to script text.
//!
//! Output is normalized: two-space indentation, one statement per line,
//! parentheses only where operator precedence requires them.

use crate::parser::ast::*;
use crate::parser::util::format_number;

const TAB_WIDTH: usize = 2;

const PREC_ASSIGNMENT: u8 = 1;
const PREC_CONDITIONAL: u8 = 2;
const PREC_NULLISH: u8 = 3;
const PREC_UNARY: u8 = 15;
const PREC_UPDATE: u8 = 16;
const PREC_CALL: u8 = 17;
const PREC_PRIMARY: u8 = 18;

pub struct CodeGenerator {
    out: String,
    indent: usize,
}

impl CodeGenerator {
    pub fn new() -> Self {
        CodeGenerator {
            out: String::new(),
            indent: 0,
        }
    }

    fn with_indent(indent: usize) -> Self {
        CodeGenerator {
            out: String::new(),
            indent,
        }
    }

    pub fn finish(self) -> String {
        self.out
    }

    pub fn line(&mut self, text: &str) {
        self.out.push_str(&" ".repeat(self.indent * TAB_WIDTH));
        self.out.push_str(text);
        self.out.push('\n');
    }

    pub fn emit_statements(&mut self, statements: &[StatementType]) {
        for s in statements {
            self.emit_statement(s);
        }
    }

    fn emit_block(&mut self, head: &str, body: &[StatementType], tail: &str) {
        self.line(&format!("{}{{", head));
        self.indent += 1;
        self.emit_statements(body);
        self.indent -= 1;
        self.line(&format!("}}{}", tail));
    }

    /// Bodies of `if`/loops are always printed as blocks.
    fn emit_nested(&mut self, head: &str, statement: &StatementType) {
        match statement {
            StatementType::BlockStatement { body, .. } => self.emit_block(head, body, ""),
            other => self.emit_block(head, std::slice::from_ref(other), ""),
        }
    }

    fn emit_statement(&mut self, statement: &StatementType) {
        match statement {
            StatementType::ExpressionStatement { expression, .. } => {
                let text = self.expression(expression, PREC_ASSIGNMENT);
                if needs_statement_parens(expression) {
                    self.line(&format!("({});", text));
                } else {
                    self.line(&format!("{};", text));
                }
            }
            StatementType::BlockStatement { body, .. } => self.emit_block("", body, ""),
            StatementType::EmptyStatement { .. } => self.line(";"),
            StatementType::Declaration(DeclarationType::VariableDeclaration(data)) => {
                let text = self.variable_declaration(data);
                self.line(&format!("{};", text));
            }
            StatementType::Declaration(DeclarationType::FunctionDeclaration(f)) => {
                let text = self.function(f);
                self.out.push_str(&" ".repeat(self.indent * TAB_WIDTH));
                self.out.push_str(&text);
                self.out.push('\n');
            }
            StatementType::IfStatement {
                test,
                consequent,
                alternate,
                ..
            } => {
                let head = format!("if ({}) ", self.expression(test, PREC_ASSIGNMENT));
                self.emit_nested(&head, consequent);
                if let Some(alternate) = alternate {
                    // Merge the closing brace with `else`.
                    if self.out.ends_with('\n') {
                        self.out.pop();
                    }
                    self.out.push_str(" else ");
                    let mut nested = CodeGenerator::with_indent(self.indent);
                    nested.emit_nested("", alternate);
                    self.out.push_str(nested.finish().trim_start_matches(' '));
                }
            }
            StatementType::WhileStatement { test, body, .. } => {
                let head = format!("while ({}) ", self.expression(test, PREC_ASSIGNMENT));
                self.emit_nested(&head, body);
            }
            StatementType::ForStatement {
                init,
                test,
                update,
                body,
                ..
            } => {
                let init = match init {
                    Some(ForInit::VariableDeclaration(d)) => self.variable_declaration(d),
                    Some(ForInit::Expression(e)) => self.expression(e, PREC_ASSIGNMENT),
                    None => String::new(),
                };
                let test = match test {
                    Some(e) => format!(" {}", self.expression(e, PREC_ASSIGNMENT)),
                    None => String::new(),
                };
                let update = match update {
                    Some(e) => format!(" {}", self.expression(e, PREC_ASSIGNMENT)),
                    None => String::new(),
                };
                let head = format!("for ({};{};{}) ", init, test, update);
                self.emit_nested(&head, body);
            }
            StatementType::ForInStatement {
                kind,
                left,
                right,
                body,
                ..
            }
            | StatementType::ForOfStatement {
                kind,
                left,
                right,
                body,
                ..
            } => {
                let keyword = if matches!(statement, StatementType::ForInStatement { .. }) {
                    "in"
                } else {
                    "of"
                };
                let head = format!(
                    "for ({} {} {} {}) ",
                    kind.as_str(),
                    self.pattern(left),
                    keyword,
                    self.expression(right, PREC_ASSIGNMENT)
                );
                self.emit_nested(&head, body);
            }
            StatementType::SwitchStatement {
                discriminant,
                cases,
                ..
            } => {
                self.line(&format!(
                    "switch ({}) {{",
                    self.expression(discriminant, PREC_ASSIGNMENT)
                ));
                self.indent += 1;
                for case in cases {
                    match &case.test {
                        Some(test) => {
                            let text = self.expression(test, PREC_ASSIGNMENT);
                            self.line(&format!("case {}:", text));
                        }
                        None => self.line("default:"),
                    }
                    self.indent += 1;
                    self.emit_statements(&case.consequent);
                    self.indent -= 1;
                }
                self.indent -= 1;
                self.line("}");
            }
            StatementType::ReturnStatement { argument, .. } => match argument {
                Some(a) => {
                    let text = self.expression(a, PREC_ASSIGNMENT);
                    self.line(&format!("return {};", text));
                }
                None => self.line("return;"),
            },
            StatementType::ThrowStatement { argument, .. } => {
                let text = self.expression(argument, PREC_ASSIGNMENT);
                self.line(&format!("throw {};", text));
            }
            StatementType::TryStatement {
                block,
                handler,
                finalizer,
                ..
            } => {
                self.line("try {");
                self.indent += 1;
                self.emit_statements(block);
                self.indent -= 1;
                if let Some(handler) = handler {
                    let head = match &handler.param {
                        Some(p) => format!("}} catch ({}) {{", self.pattern(p)),
                        None => "} catch {".to_string(),
                    };
                    self.line(&head);
                    self.indent += 1;
                    self.emit_statements(&handler.body);
                    self.indent -= 1;
                }
                if let Some(finalizer) = finalizer {
                    self.line("} finally {");
                    self.indent += 1;
                    self.emit_statements(finalizer);
                    self.indent -= 1;
                }
                self.line("}");
            }
            StatementType::BreakStatement { .. } => self.line("break;"),
            StatementType::ContinueStatement { .. } => self.line("continue;"),
        }
    }

    fn variable_declaration(&self, data: &VariableDeclarationData) -> String {
        let declarators: Vec<String> = data
            .declarations
            .iter()
            .map(|d| match &d.init {
                Some(init) => format!(
                    "{} = {}",
                    self.pattern(&d.id),
                    self.expression(init, PREC_ASSIGNMENT)
                ),
                None => self.pattern(&d.id),
            })
            .collect();
        format!("{} {}", data.kind.as_str(), declarators.join(", "))
    }

    fn function(&self, f: &FunctionData) -> String {
        let params = self.parameters(f);
        let prefix = if f.is_async { "async " } else { "" };
        if f.is_arrow {
            let body = match &f.body {
                FunctionBodyType::Expression(e) => {
                    if matches!(**e, ExpressionType::ObjectExpression { .. }) {
                        format!("({})", self.expression(e, PREC_ASSIGNMENT))
                    } else {
                        self.expression(e, PREC_ASSIGNMENT)
                    }
                }
                FunctionBodyType::Block(body) => self.function_block(body),
            };
            return format!("{}({}) => {}", prefix, params, body);
        }
        let name = match &f.id {
            Some(id) => format!(" {}", id.name),
            None => String::new(),
        };
        let body = match &f.body {
            FunctionBodyType::Block(body) => self.function_block(body),
            FunctionBodyType::Expression(e) => {
                format!("{{ return {}; }}", self.expression(e, PREC_ASSIGNMENT))
            }
        };
        format!("{}function{}({}) {}", prefix, name, params, body)
    }

    fn function_block(&self, body: &[StatementType]) -> String {
        if body.is_empty() {
            return "{}".to_string();
        }
        let mut nested = CodeGenerator::with_indent(self.indent + 1);
        nested.emit_statements(body);
        format!(
            "{{\n{}{}}}",
            nested.finish(),
            " ".repeat(self.indent * TAB_WIDTH)
        )
    }

    fn parameters(&self, f: &FunctionData) -> String {
        let mut params: Vec<String> = f.params.iter().map(|p| self.pattern(p)).collect();
        if let Some(rest) = &f.rest {
            params.push(format!("...{}", self.pattern(rest)));
        }
        params.join(", ")
    }

    fn pattern(&self, pattern: &PatternType) -> String {
        match pattern {
            PatternType::Identifier(id) => id.name.clone(),
            PatternType::ObjectPattern {
                properties, rest, ..
            } => {
                let mut parts: Vec<String> = properties
                    .iter()
                    .map(|p| {
                        if p.shorthand {
                            self.pattern(&p.value)
                        } else {
                            format!("{}: {}", self.property_key(&p.key), self.pattern(&p.value))
                        }
                    })
                    .collect();
                if let Some(rest) = rest {
                    parts.push(format!("...{}", self.pattern(rest)));
                }
                if parts.is_empty() {
                    "{}".to_string()
                } else {
                    format!("{{ {} }}", parts.join(", "))
                }
            }
            PatternType::ArrayPattern { elements, rest, .. } => {
                let mut parts: Vec<String> = elements.iter().map(|e| self.pattern(e)).collect();
                if let Some(rest) = rest {
                    parts.push(format!("...{}", self.pattern(rest)));
                }
                format!("[{}]", parts.join(", "))
            }
            PatternType::AssignmentPattern { left, right, .. } => format!(
                "{} = {}",
                self.pattern(left),
                self.expression(right, PREC_ASSIGNMENT)
            ),
        }
    }

    fn property_key(&self, key: &PropertyKey) -> String {
        match key {
            PropertyKey::Static(name) => {
                if is_identifier_name(name) {
                    name.clone()
                } else if is_canonical_index(name) {
                    name.clone()
                } else {
                    quote(name)
                }
            }
            PropertyKey::Computed(e) => format!("[{}]", self.expression(e, PREC_ASSIGNMENT)),
        }
    }

    fn list(&self, elements: &[ExpressionOrSpreadElement]) -> String {
        elements
            .iter()
            .map(|e| match e {
                ExpressionOrSpreadElement::Expression(e) => self.expression(e, PREC_ASSIGNMENT),
                ExpressionOrSpreadElement::SpreadElement(e) => {
                    format!("...{}", self.expression(e, PREC_ASSIGNMENT))
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Prints `expression`, parenthesized when its precedence is below
    /// `min_precedence`.
    pub fn expression(&self, expression: &ExpressionType, min_precedence: u8) -> String {
        let text = self.bare_expression(expression);
        if precedence(expression) < min_precedence {
            format!("({})", text)
        } else {
            text
        }
    }

    fn bare_expression(&self, expression: &ExpressionType) -> String {
        match expression {
            ExpressionType::Literal(data) => match &data.value {
                LiteralType::NullLiteral => "null".to_string(),
                LiteralType::BooleanLiteral(b) => b.to_string(),
                LiteralType::StringLiteral(s) => quote(s),
                LiteralType::NumberLiteral(n) => format_number(*n),
            },
            ExpressionType::Identifier(id) => id.name.clone(),
            ExpressionType::ThisExpression { .. } => "this".to_string(),
            ExpressionType::TemplateLiteral {
                quasis,
                expressions,
                ..
            } => {
                let mut s = String::from("`");
                for (idx, quasi) in quasis.iter().enumerate() {
                    s.push_str(&escape_template(quasi));
                    if let Some(e) = expressions.get(idx) {
                        s.push_str(&format!("${{{}}}", self.expression(e, PREC_ASSIGNMENT)));
                    }
                }
                s.push('`');
                s
            }
            ExpressionType::ArrayExpression { elements, .. } => format!("[{}]", self.list(elements)),
            ExpressionType::ObjectExpression { properties, .. } => {
                if properties.is_empty() {
                    return "{}".to_string();
                }
                let parts: Vec<String> = properties
                    .iter()
                    .map(|p| match p {
                        PropertyType::Init {
                            key,
                            value,
                            shorthand,
                            ..
                        } => {
                            if *shorthand {
                                if let ExpressionType::Identifier(id) = &**value {
                                    return id.name.clone();
                                }
                            }
                            format!(
                                "{}: {}",
                                self.property_key(key),
                                self.expression(value, PREC_ASSIGNMENT)
                            )
                        }
                        PropertyType::Method { key, value, .. } => {
                            let prefix = if value.is_async { "async " } else { "" };
                            let body = match &value.body {
                                FunctionBodyType::Block(b) => self.function_block(b),
                                FunctionBodyType::Expression(e) => format!(
                                    "{{ return {}; }}",
                                    self.expression(e, PREC_ASSIGNMENT)
                                ),
                            };
                            format!(
                                "{}{}({}) {}",
                                prefix,
                                self.property_key(key),
                                self.parameters(value),
                                body
                            )
                        }
                        PropertyType::Spread { argument, .. } => {
                            format!("...{}", self.expression(argument, PREC_ASSIGNMENT))
                        }
                    })
                    .collect();
                format!("{{ {} }}", parts.join(", "))
            }
            ExpressionType::FunctionExpression(f) | ExpressionType::ArrowFunctionExpression(f) => {
                self.function(f)
            }
            ExpressionType::UnaryExpression {
                operator, argument, ..
            } => {
                let arg = self.expression(argument, PREC_UNARY);
                match operator {
                    UnaryOperator::TypeOf | UnaryOperator::Void | UnaryOperator::Delete => {
                        format!("{} {}", operator.as_str(), arg)
                    }
                    _ => {
                        let op = operator.as_str();
                        if arg.starts_with(op) && (op == "-" || op == "+") {
                            format!("{}({})", op, arg)
                        } else {
                            format!("{}{}", op, arg)
                        }
                    }
                }
            }
            ExpressionType::UpdateExpression {
                operator,
                argument,
                prefix,
                ..
            } => {
                let arg = self.expression(argument, PREC_CALL);
                if *prefix {
                    format!("{}{}", operator.as_str(), arg)
                } else {
                    format!("{}{}", arg, operator.as_str())
                }
            }
            ExpressionType::BinaryExpression {
                operator,
                left,
                right,
                ..
            } => {
                let prec = binary_precedence(operator);
                let (left_min, right_min) = if *operator == BinaryOperator::Exponent {
                    // `-a ** b` is a syntax error, so unary operands get parenthesized.
                    (PREC_UNARY + 1, prec)
                } else {
                    (prec, prec + 1)
                };
                format!(
                    "{} {} {}",
                    self.expression(left, left_min),
                    operator.as_str(),
                    self.expression(right, right_min)
                )
            }
            ExpressionType::LogicalExpression {
                operator,
                left,
                right,
                ..
            } => {
                let prec = logical_precedence(operator);
                // `??` cannot be mixed with `||`/`&&` without parentheses.
                let (left_min, right_min) = if *operator == LogicalOperator::Nullish {
                    (PREC_NULLISH + 3, PREC_NULLISH + 3)
                } else {
                    (prec, prec + 1)
                };
                let left_text = match &**left {
                    ExpressionType::LogicalExpression { operator: inner, .. }
                        if *inner != *operator && (*inner == LogicalOperator::Nullish) =>
                    {
                        format!("({})", self.bare_expression(left))
                    }
                    _ => self.expression(left, left_min),
                };
                let right_text = match &**right {
                    ExpressionType::LogicalExpression { operator: inner, .. }
                        if *inner == LogicalOperator::Nullish =>
                    {
                        format!("({})", self.bare_expression(right))
                    }
                    _ => self.expression(right, right_min),
                };
                format!("{} {} {}", left_text, operator.as_str(), right_text)
            }
            ExpressionType::AssignmentExpression {
                operator,
                left,
                right,
                ..
            } => format!(
                "{} {} {}",
                self.expression(left, PREC_CALL),
                operator.as_str(),
                self.expression(right, PREC_ASSIGNMENT)
            ),
            ExpressionType::ConditionalExpression {
                test,
                consequent,
                alternate,
                ..
            } => format!(
                "{} ? {} : {}",
                self.expression(test, PREC_NULLISH),
                self.expression(consequent, PREC_ASSIGNMENT),
                self.expression(alternate, PREC_ASSIGNMENT)
            ),
            ExpressionType::CallExpression {
                callee,
                arguments,
                optional,
                ..
            } => format!(
                "{}{}({})",
                self.object_expression(callee),
                if *optional { "?." } else { "" },
                self.list(arguments)
            ),
            ExpressionType::NewExpression {
                callee, arguments, ..
            } => {
                let callee_text = if contains_call(callee) {
                    format!("({})", self.bare_expression(callee))
                } else {
                    self.object_expression(callee)
                };
                format!("new {}({})", callee_text, self.list(arguments))
            }
            ExpressionType::MemberExpression(MemberExpressionType::SimpleMemberExpression {
                object,
                property,
                optional,
                ..
            }) => format!(
                "{}{}{}",
                self.object_expression(object),
                if *optional { "?." } else { "." },
                property.name
            ),
            ExpressionType::MemberExpression(MemberExpressionType::ComputedMemberExpression {
                object,
                property,
                optional,
                ..
            }) => format!(
                "{}{}[{}]",
                self.object_expression(object),
                if *optional { "?." } else { "" },
                self.expression(property, PREC_ASSIGNMENT)
            ),
            ExpressionType::AwaitExpression { argument, .. } => {
                format!("await {}", self.expression(argument, PREC_UNARY))
            }
        }
    }

    fn object_expression(&self, object: &ExpressionType) -> String {
        match object {
            ExpressionType::Literal(LiteralData {
                value: LiteralType::NumberLiteral(_),
                ..
            }) => format!("({})", self.bare_expression(object)),
            _ => self.expression(object, PREC_CALL),
        }
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn precedence(expression: &ExpressionType) -> u8 {
    match expression {
        ExpressionType::AssignmentExpression { .. }
        | ExpressionType::ArrowFunctionExpression(_) => PREC_ASSIGNMENT,
        ExpressionType::ConditionalExpression { .. } => PREC_CONDITIONAL,
        ExpressionType::LogicalExpression { operator, .. } => logical_precedence(operator),
        ExpressionType::BinaryExpression { operator, .. } => binary_precedence(operator),
        ExpressionType::UnaryExpression { .. } | ExpressionType::AwaitExpression { .. } => {
            PREC_UNARY
        }
        ExpressionType::UpdateExpression { .. } => PREC_UPDATE,
        ExpressionType::CallExpression { .. }
        | ExpressionType::NewExpression { .. }
        | ExpressionType::MemberExpression(_) => PREC_CALL,
        _ => PREC_PRIMARY,
    }
}

fn logical_precedence(operator: &LogicalOperator) -> u8 {
    match operator {
        LogicalOperator::Nullish => PREC_NULLISH,
        LogicalOperator::Or => 4,
        LogicalOperator::And => 5,
    }
}

fn binary_precedence(operator: &BinaryOperator) -> u8 {
    match operator {
        BinaryOperator::BitwiseOr => 6,
        BinaryOperator::BitwiseXor => 7,
        BinaryOperator::BitwiseAnd => 8,
        BinaryOperator::StrictlyEqual
        | BinaryOperator::StrictlyUnequal
        | BinaryOperator::LooselyEqual
        | BinaryOperator::LooselyUnequal => 9,
        BinaryOperator::LessThan
        | BinaryOperator::GreaterThan
        | BinaryOperator::LessThanEqual
        | BinaryOperator::GreaterThanEqual
        | BinaryOperator::In
        | BinaryOperator::InstanceOf => 10,
        BinaryOperator::Add | BinaryOperator::Subtract => 12,
        BinaryOperator::Multiply | BinaryOperator::Divide | BinaryOperator::Modulo => 13,
        BinaryOperator::Exponent => 14,
    }
}

fn contains_call(expression: &ExpressionType) -> bool {
    match expression {
        ExpressionType::CallExpression { .. } => true,
        ExpressionType::MemberExpression(MemberExpressionType::SimpleMemberExpression {
            object,
            ..
        })
        | ExpressionType::MemberExpression(MemberExpressionType::ComputedMemberExpression {
            object,
            ..
        }) => contains_call(object),
        _ => false,
    }
}

/// An expression statement may not begin with `{` or `function`.
fn needs_statement_parens(expression: &ExpressionType) -> bool {
    match leftmost(expression) {
        ExpressionType::ObjectExpression { .. } => true,
        ExpressionType::FunctionExpression(_) => true,
        _ => false,
    }
}

fn leftmost(expression: &ExpressionType) -> &ExpressionType {
    match expression {
        ExpressionType::BinaryExpression { left, .. }
        | ExpressionType::LogicalExpression { left, .. }
        | ExpressionType::AssignmentExpression { left, .. } => leftmost(left),
        ExpressionType::ConditionalExpression { test, .. } => leftmost(test),
        ExpressionType::CallExpression { callee, .. } => leftmost(callee),
        ExpressionType::MemberExpression(MemberExpressionType::SimpleMemberExpression {
            object,
            ..
        })
        | ExpressionType::MemberExpression(MemberExpressionType::ComputedMemberExpression {
            object,
            ..
        }) => leftmost(object),
        ExpressionType::UpdateExpression {
            argument,
            prefix: false,
            ..
        } => leftmost(argument),
        other => other,
    }
}

pub fn quote(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s))
}

fn escape_template(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('`', "\\`")
        .replace("${", "\\${")
}

fn is_identifier_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn is_canonical_index(name: &str) -> bool {
    !name.is_empty()
        && name.chars().all(|c| c.is_ascii_digit())
        && (name == "0" || !name.starts_with('0'))
}
