use std::fmt::Debug;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub struct Meta {
    pub start_index: usize,
    pub end_index: usize,
}

impl Meta {
    pub fn span(start: &Meta, end: &Meta) -> Meta {
        Meta {
            start_index: start.start_index,
            end_index: end.end_index,
        }
    }
}

pub trait HasMeta {
    fn get_meta(&self) -> &Meta;
}

#[derive(Debug, Clone)]
pub struct IdentifierData {
    pub name: String,
    pub meta: Meta,
}

impl HasMeta for IdentifierData {
    fn get_meta(&self) -> &Meta {
        &self.meta
    }
}

#[derive(Debug, Clone)]
pub enum LiteralType {
    NullLiteral,
    BooleanLiteral(bool),
    StringLiteral(String),
    NumberLiteral(f64),
}

#[derive(Debug, Clone)]
pub struct LiteralData {
    pub meta: Meta,
    pub value: LiteralType,
}

#[derive(Debug, Clone)]
pub enum ExpressionType {
    Literal(LiteralData),
    Identifier(IdentifierData),
    ThisExpression {
        meta: Meta,
    },
    TemplateLiteral {
        meta: Meta,
        /// Cooked text chunks; always one more than `expressions`.
        quasis: Vec<String>,
        expressions: Vec<ExpressionType>,
    },
    ArrayExpression {
        meta: Meta,
        elements: Vec<ExpressionOrSpreadElement>,
    },
    ObjectExpression {
        meta: Meta,
        properties: Vec<PropertyType>,
    },
    FunctionExpression(Rc<FunctionData>),
    ArrowFunctionExpression(Rc<FunctionData>),
    UnaryExpression {
        meta: Meta,
        operator: UnaryOperator,
        argument: Box<ExpressionType>,
    },
    UpdateExpression {
        meta: Meta,
        operator: UpdateOperator,
        argument: Box<ExpressionType>,
        prefix: bool,
    },
    BinaryExpression {
        meta: Meta,
        operator: BinaryOperator,
        left: Box<ExpressionType>,
        right: Box<ExpressionType>,
    },
    LogicalExpression {
        meta: Meta,
        operator: LogicalOperator,
        left: Box<ExpressionType>,
        right: Box<ExpressionType>,
    },
    AssignmentExpression {
        meta: Meta,
        operator: AssignmentOperator,
        /// Either an `Identifier` or a `MemberExpression`.
        left: Box<ExpressionType>,
        right: Box<ExpressionType>,
    },
    ConditionalExpression {
        meta: Meta,
        test: Box<ExpressionType>,
        consequent: Box<ExpressionType>,
        alternate: Box<ExpressionType>,
    },
    CallExpression {
        meta: Meta,
        callee: Box<ExpressionType>,
        arguments: Vec<ExpressionOrSpreadElement>,
        optional: bool,
    },
    NewExpression {
        meta: Meta,
        callee: Box<ExpressionType>,
        arguments: Vec<ExpressionOrSpreadElement>,
    },
    MemberExpression(MemberExpressionType),
    AwaitExpression {
        meta: Meta,
        argument: Box<ExpressionType>,
    },
}

impl HasMeta for ExpressionType {
    fn get_meta(&self) -> &Meta {
        match self {
            ExpressionType::Literal(data) => &data.meta,
            ExpressionType::Identifier(data) => &data.meta,
            ExpressionType::ThisExpression { meta } => meta,
            ExpressionType::TemplateLiteral { meta, .. } => meta,
            ExpressionType::ArrayExpression { meta, .. } => meta,
            ExpressionType::ObjectExpression { meta, .. } => meta,
            ExpressionType::FunctionExpression(data) => &data.meta,
            ExpressionType::ArrowFunctionExpression(data) => &data.meta,
            ExpressionType::UnaryExpression { meta, .. } => meta,
            ExpressionType::UpdateExpression { meta, .. } => meta,
            ExpressionType::BinaryExpression { meta, .. } => meta,
            ExpressionType::LogicalExpression { meta, .. } => meta,
            ExpressionType::AssignmentExpression { meta, .. } => meta,
            ExpressionType::ConditionalExpression { meta, .. } => meta,
            ExpressionType::CallExpression { meta, .. } => meta,
            ExpressionType::NewExpression { meta, .. } => meta,
            ExpressionType::MemberExpression(data) => data.get_meta(),
            ExpressionType::AwaitExpression { meta, .. } => meta,
        }
    }
}

#[derive(Debug, Clone)]
pub enum MemberExpressionType {
    SimpleMemberExpression {
        meta: Meta,
        object: Box<ExpressionType>,
        property: IdentifierData,
        optional: bool,
    },
    ComputedMemberExpression {
        meta: Meta,
        object: Box<ExpressionType>,
        property: Box<ExpressionType>,
        optional: bool,
    },
}

impl HasMeta for MemberExpressionType {
    fn get_meta(&self) -> &Meta {
        match self {
            MemberExpressionType::SimpleMemberExpression { meta, .. } => meta,
            MemberExpressionType::ComputedMemberExpression { meta, .. } => meta,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ExpressionOrSpreadElement {
    Expression(Box<ExpressionType>),
    SpreadElement(Box<ExpressionType>),
}

#[derive(Debug, Clone)]
pub enum PropertyKey {
    Static(String),
    Computed(Box<ExpressionType>),
}

#[derive(Debug, Clone)]
pub enum PropertyType {
    Init {
        meta: Meta,
        key: PropertyKey,
        value: Box<ExpressionType>,
        shorthand: bool,
    },
    Method {
        meta: Meta,
        key: PropertyKey,
        value: Rc<FunctionData>,
    },
    Spread {
        meta: Meta,
        argument: Box<ExpressionType>,
    },
}

#[derive(Debug, Clone)]
pub enum PatternType {
    Identifier(IdentifierData),
    ObjectPattern {
        meta: Meta,
        properties: Vec<AssignmentPropertyData>,
        rest: Option<Box<PatternType>>,
    },
    ArrayPattern {
        meta: Meta,
        elements: Vec<PatternType>,
        rest: Option<Box<PatternType>>,
    },
    AssignmentPattern {
        meta: Meta,
        left: Box<PatternType>,
        right: Box<ExpressionType>,
    },
}

impl HasMeta for PatternType {
    fn get_meta(&self) -> &Meta {
        match self {
            PatternType::Identifier(data) => &data.meta,
            PatternType::ObjectPattern { meta, .. } => meta,
            PatternType::ArrayPattern { meta, .. } => meta,
            PatternType::AssignmentPattern { meta, .. } => meta,
        }
    }
}

impl PatternType {
    /// Collects the names this pattern declares.
    pub fn bound_names(&self, names: &mut Vec<String>) {
        match self {
            PatternType::Identifier(id) => names.push(id.name.clone()),
            PatternType::ObjectPattern {
                properties, rest, ..
            } => {
                for p in properties {
                    p.value.bound_names(names);
                }
                if let Some(rest) = rest {
                    rest.bound_names(names);
                }
            }
            PatternType::ArrayPattern { elements, rest, .. } => {
                for e in elements {
                    e.bound_names(names);
                }
                if let Some(rest) = rest {
                    rest.bound_names(names);
                }
            }
            PatternType::AssignmentPattern { left, .. } => left.bound_names(names),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AssignmentPropertyData {
    pub meta: Meta,
    pub key: PropertyKey,
    pub value: PatternType,
    pub shorthand: bool,
}

#[derive(Debug, Clone)]
pub enum FunctionBodyType {
    Block(Vec<StatementType>),
    Expression(Box<ExpressionType>),
}

#[derive(Debug, Clone)]
pub struct FunctionData {
    pub meta: Meta,
    pub id: Option<IdentifierData>,
    pub params: Vec<PatternType>,
    pub rest: Option<PatternType>,
    pub body: FunctionBodyType,
    pub is_async: bool,
    pub is_arrow: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VariableDeclarationKind {
    Var,
    Let,
    Const,
}

impl VariableDeclarationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VariableDeclarationKind::Var => "var",
            VariableDeclarationKind::Let => "let",
            VariableDeclarationKind::Const => "const",
        }
    }
}

#[derive(Debug, Clone)]
pub struct VariableDeclaratorData {
    pub meta: Meta,
    pub id: PatternType,
    pub init: Option<Box<ExpressionType>>,
}

#[derive(Debug, Clone)]
pub struct VariableDeclarationData {
    pub meta: Meta,
    pub kind: VariableDeclarationKind,
    pub declarations: Vec<VariableDeclaratorData>,
}

#[derive(Debug, Clone)]
pub enum DeclarationType {
    FunctionDeclaration(Rc<FunctionData>),
    VariableDeclaration(VariableDeclarationData),
}

impl HasMeta for DeclarationType {
    fn get_meta(&self) -> &Meta {
        match self {
            DeclarationType::FunctionDeclaration(data) => &data.meta,
            DeclarationType::VariableDeclaration(data) => &data.meta,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ForInit {
    VariableDeclaration(VariableDeclarationData),
    Expression(Box<ExpressionType>),
}

#[derive(Debug, Clone)]
pub struct SwitchCaseData {
    pub meta: Meta,
    /// `None` for the `default` clause.
    pub test: Option<Box<ExpressionType>>,
    pub consequent: Vec<StatementType>,
}

#[derive(Debug, Clone)]
pub struct CatchClauseData {
    pub meta: Meta,
    pub param: Option<PatternType>,
    pub body: Vec<StatementType>,
}

#[derive(Debug, Clone)]
pub enum StatementType {
    ExpressionStatement {
        meta: Meta,
        expression: Box<ExpressionType>,
    },
    BlockStatement {
        meta: Meta,
        body: Vec<StatementType>,
    },
    EmptyStatement {
        meta: Meta,
    },
    Declaration(DeclarationType),
    IfStatement {
        meta: Meta,
        test: Box<ExpressionType>,
        consequent: Box<StatementType>,
        alternate: Option<Box<StatementType>>,
    },
    WhileStatement {
        meta: Meta,
        test: Box<ExpressionType>,
        body: Box<StatementType>,
    },
    ForStatement {
        meta: Meta,
        init: Option<ForInit>,
        test: Option<Box<ExpressionType>>,
        update: Option<Box<ExpressionType>>,
        body: Box<StatementType>,
    },
    ForInStatement {
        meta: Meta,
        kind: VariableDeclarationKind,
        left: PatternType,
        right: Box<ExpressionType>,
        body: Box<StatementType>,
    },
    ForOfStatement {
        meta: Meta,
        kind: VariableDeclarationKind,
        left: PatternType,
        right: Box<ExpressionType>,
        body: Box<StatementType>,
    },
    SwitchStatement {
        meta: Meta,
        discriminant: Box<ExpressionType>,
        cases: Vec<SwitchCaseData>,
    },
    ReturnStatement {
        meta: Meta,
        argument: Option<Box<ExpressionType>>,
    },
    ThrowStatement {
        meta: Meta,
        argument: Box<ExpressionType>,
    },
    TryStatement {
        meta: Meta,
        block: Vec<StatementType>,
        handler: Option<CatchClauseData>,
        finalizer: Option<Vec<StatementType>>,
    },
    BreakStatement {
        meta: Meta,
    },
    ContinueStatement {
        meta: Meta,
    },
}

impl HasMeta for StatementType {
    fn get_meta(&self) -> &Meta {
        match self {
            StatementType::ExpressionStatement { meta, .. } => meta,
            StatementType::BlockStatement { meta, .. } => meta,
            StatementType::EmptyStatement { meta } => meta,
            StatementType::Declaration(data) => data.get_meta(),
            StatementType::IfStatement { meta, .. } => meta,
            StatementType::WhileStatement { meta, .. } => meta,
            StatementType::ForStatement { meta, .. } => meta,
            StatementType::ForInStatement { meta, .. } => meta,
            StatementType::ForOfStatement { meta, .. } => meta,
            StatementType::SwitchStatement { meta, .. } => meta,
            StatementType::ReturnStatement { meta, .. } => meta,
            StatementType::ThrowStatement { meta, .. } => meta,
            StatementType::TryStatement { meta, .. } => meta,
            StatementType::BreakStatement { meta } => meta,
            StatementType::ContinueStatement { meta } => meta,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ImportSpecifierType {
    Default {
        local: IdentifierData,
    },
    Namespace {
        local: IdentifierData,
    },
    Named {
        imported: String,
        local: IdentifierData,
        type_only: bool,
    },
}

#[derive(Debug, Clone)]
pub struct ImportDeclarationData {
    pub meta: Meta,
    pub specifiers: Vec<ImportSpecifierType>,
    pub source: String,
    pub type_only: bool,
}

#[derive(Debug, Clone)]
pub struct ExportSpecifierData {
    pub local: String,
    pub exported: String,
}

#[derive(Debug, Clone)]
pub enum ExportDefaultType {
    FunctionDeclaration(Rc<FunctionData>),
    Expression(Box<ExpressionType>),
}

#[derive(Debug, Clone)]
pub enum ModuleItemType {
    Statement(StatementType),
    ImportDeclaration(ImportDeclarationData),
    ExportDefaultDeclaration {
        meta: Meta,
        declaration: ExportDefaultType,
    },
    /// `export = X`
    ExportAssignment {
        meta: Meta,
        expression: Box<ExpressionType>,
    },
    ExportNamedDeclaration {
        meta: Meta,
        declaration: DeclarationType,
    },
    ExportSpecifiers {
        meta: Meta,
        specifiers: Vec<ExportSpecifierData>,
        source: Option<String>,
        type_only: bool,
    },
    ExportAllDeclaration {
        meta: Meta,
        exported: Option<String>,
        source: String,
    },
}

impl HasMeta for ModuleItemType {
    fn get_meta(&self) -> &Meta {
        match self {
            ModuleItemType::Statement(data) => data.get_meta(),
            ModuleItemType::ImportDeclaration(data) => &data.meta,
            ModuleItemType::ExportDefaultDeclaration { meta, .. } => meta,
            ModuleItemType::ExportAssignment { meta, .. } => meta,
            ModuleItemType::ExportNamedDeclaration { meta, .. } => meta,
            ModuleItemType::ExportSpecifiers { meta, .. } => meta,
            ModuleItemType::ExportAllDeclaration { meta, .. } => meta,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProgramData {
    pub meta: Meta,
    pub body: Vec<ModuleItemType>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOperator {
    Minus,
    Plus,
    LogicalNot,
    BitwiseNot,
    TypeOf,
    Void,
    Delete,
}

impl UnaryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOperator::Minus => "-",
            UnaryOperator::Plus => "+",
            UnaryOperator::LogicalNot => "!",
            UnaryOperator::BitwiseNot => "~",
            UnaryOperator::TypeOf => "typeof",
            UnaryOperator::Void => "void",
            UnaryOperator::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpdateOperator {
    PlusPlus,
    MinusMinus,
}

impl UpdateOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateOperator::PlusPlus => "++",
            UpdateOperator::MinusMinus => "--",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOperator {
    StrictlyEqual,
    StrictlyUnequal,
    LooselyEqual,
    LooselyUnequal,
    LessThan,
    GreaterThan,
    LessThanEqual,
    GreaterThanEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Exponent,
    BitwiseOr,
    BitwiseXor,
    BitwiseAnd,
    In,
    InstanceOf,
}

impl BinaryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::StrictlyEqual => "===",
            BinaryOperator::StrictlyUnequal => "!==",
            BinaryOperator::LooselyEqual => "==",
            BinaryOperator::LooselyUnequal => "!=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::LessThanEqual => "<=",
            BinaryOperator::GreaterThanEqual => ">=",
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Exponent => "**",
            BinaryOperator::BitwiseOr => "|",
            BinaryOperator::BitwiseXor => "^",
            BinaryOperator::BitwiseAnd => "&",
            BinaryOperator::In => "in",
            BinaryOperator::InstanceOf => "instanceof",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogicalOperator {
    Or,
    And,
    Nullish,
}

impl LogicalOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOperator::Or => "||",
            LogicalOperator::And => "&&",
            LogicalOperator::Nullish => "??",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AssignmentOperator {
    Equals,
    AddEquals,
    SubtractEquals,
    MultiplyEquals,
    DivideEquals,
    ModuloEquals,
    OrEquals,
    AndEquals,
    NullishEquals,
}

impl AssignmentOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentOperator::Equals => "=",
            AssignmentOperator::AddEquals => "+=",
            AssignmentOperator::SubtractEquals => "-=",
            AssignmentOperator::MultiplyEquals => "*=",
            AssignmentOperator::DivideEquals => "/=",
            AssignmentOperator::ModuloEquals => "%=",
            AssignmentOperator::OrEquals => "||=",
            AssignmentOperator::AndEquals => "&&=",
            AssignmentOperator::NullishEquals => "??=",
        }
    }
}
