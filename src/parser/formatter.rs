use super::{
    expression::{
        AssignmentTarget, Expression, ExpressionAtom, ExpressionAtomKind, ExpressionNode,
        ExpressionNodeRef, InfixAssignmentOperator, InfixShortCircuitOperator,
    },
    statement::{FunctionDecl, Statement},
    ParserError, Program,
};
use crate::lexer::LineBreaks;
use ariadne::{Color, Label, Report, ReportKind, Source};
use std::path::Path;

const ARIADNE_MSG: &str = "Ariadne produces valid utf-8 strings";
const ARIADNE_WRITE_MSG: &str = "Write into buffer should not fail.";

pub trait ExpressionFormatter {
    fn format(&self, tree: &Expression) -> String;
}

pub trait ProgramFormatter {
    fn format(&self, program: &Program) -> String;
}

pub struct DebugExpressionFormatter;

impl ExpressionFormatter for DebugExpressionFormatter {
    fn format(&self, tree: &Expression) -> String {
        format!("{tree:?}")
    }
}

impl ProgramFormatter for DebugExpressionFormatter {
    fn format(&self, program: &Program) -> String {
        format!("{program:#?}")
    }
}

/// Renders trees as parenthesised prefix forms, one statement per line.
pub struct SExpressionFormatter;

impl SExpressionFormatter {
    fn format_atom(atom: &ExpressionAtom) -> String {
        match atom.kind {
            ExpressionAtomKind::Int(v) => format!("{v}"),
            ExpressionAtomKind::Float(v) => format!("{v:?}"),
            ExpressionAtomKind::Bool(v) => format!("{v}"),
            ExpressionAtomKind::Null => "null".into(),
            ExpressionAtomKind::Identifier(ref name) => format!("{name}"),
            ExpressionAtomKind::StringLiteral(ref v) => format!("{v:?}"),
        }
    }

    fn format_list(tree: &Expression, head: &str, nodes: &[ExpressionNodeRef]) -> String {
        let mut buffer = format!("({head}");
        for node in nodes {
            buffer.push(' ');
            buffer.push_str(&Self::format_node(tree, *node));
        }
        buffer.push(')');
        buffer
    }

    fn format_node(tree: &Expression, node: ExpressionNodeRef) -> String {
        let current_node = tree
            .get_node(node)
            .expect("Caller should make sure the ref is valid.");

        match current_node {
            ExpressionNode::Atom(atom) => Self::format_atom(atom),
            ExpressionNode::Group { inner } => {
                format!("(group {})", Self::format_node(tree, *inner))
            }
            ExpressionNode::Sequence { expressions } => {
                Self::format_list(tree, "sequence", expressions)
            }
            ExpressionNode::Prefix { operator, rhs } => {
                format!("({} {})", operator.symbol(), Self::format_node(tree, *rhs))
            }
            ExpressionNode::Infix { operator, lhs, rhs } => format!(
                "({} {} {})",
                operator.symbol(),
                Self::format_node(tree, *lhs),
                Self::format_node(tree, *rhs),
            ),
            ExpressionNode::InfixShortCircuit { operator, lhs, rhs } => {
                let symbol = match operator {
                    InfixShortCircuitOperator::And => "and",
                    InfixShortCircuitOperator::Or => "or",
                };
                format!(
                    "({symbol} {} {})",
                    Self::format_node(tree, *lhs),
                    Self::format_node(tree, *rhs),
                )
            }
            ExpressionNode::InfixAssignment {
                operator,
                target,
                rhs,
            } => {
                let symbol = match operator {
                    InfixAssignmentOperator::Assign => "=".to_string(),
                    InfixAssignmentOperator::Inplace(op) => format!("{}=", op.symbol()),
                };
                let target = match target {
                    AssignmentTarget::Variable(name) => name.to_string(),
                    AssignmentTarget::Attribute { object, name } => {
                        format!("(. {} {name})", Self::format_node(tree, *object))
                    }
                    AssignmentTarget::Subscript { object, index } => format!(
                        "([] {} {})",
                        Self::format_node(tree, *object),
                        Self::format_node(tree, *index)
                    ),
                };
                format!("({symbol} {target} {})", Self::format_node(tree, *rhs))
            }
            ExpressionNode::Call { callee, arguments } => {
                let head = format!("call {}", Self::format_node(tree, *callee));
                Self::format_list(tree, &head, arguments)
            }
            ExpressionNode::New { class, arguments } => {
                let head = format!("new {}", Self::format_node(tree, *class));
                Self::format_list(tree, &head, arguments)
            }
            ExpressionNode::Subscript { object, index } => format!(
                "([] {} {})",
                Self::format_node(tree, *object),
                Self::format_node(tree, *index)
            ),
            ExpressionNode::Get { object, name } => {
                format!("(. {} {name})", Self::format_node(tree, *object))
            }
            ExpressionNode::Function(decl) => Self::format_function("fun", decl),
            ExpressionNode::List { elements } => Self::format_list(tree, "list", elements),
            ExpressionNode::Dict { entries } => {
                let mut buffer = String::from("(dict");
                for (key, value) in entries {
                    buffer.push_str(&format!(
                        " ({} {})",
                        Self::format_node(tree, *key),
                        Self::format_node(tree, *value)
                    ));
                }
                buffer.push(')');
                buffer
            }
        }
    }

    fn format_function(head: &str, decl: &FunctionDecl) -> String {
        let parameters: Vec<String> = decl.parameters.iter().map(|p| p.to_string()).collect();
        format!(
            "({head} {} ({}) {})",
            decl.name,
            parameters.join(" "),
            Self::format_body(&decl.body)
        )
    }

    fn format_body(body: &[Statement]) -> String {
        let mut buffer = String::from("(block");
        for statement in body {
            buffer.push(' ');
            buffer.push_str(&Self::format_statement(statement));
        }
        buffer.push(')');
        buffer
    }

    fn format_statement(statement: &Statement) -> String {
        match statement {
            Statement::FunctionDecl(decl) => Self::format_function("fun", decl),
            Statement::ModuleDecl(decl) => {
                format!("(module {} {})", decl.name, Self::format_body(&decl.body))
            }
            Statement::ClassDecl(decl) => match &decl.super_class {
                Some(super_class) => format!(
                    "(class {} {} {})",
                    decl.name,
                    Self::format_expression(super_class),
                    Self::format_body(&decl.body)
                ),
                None => format!("(class {} {})", decl.name, Self::format_body(&decl.body)),
            },
            Statement::Body(stmt) => Self::format_body(&stmt.body),
            Statement::Include(stmt) => format!("(include {:?})", stmt.path.as_str()),
            Statement::Expression(stmt) => Self::format_expression(&stmt.expr),
            Statement::If(stmt) => match &stmt.failure {
                Some(failure) => format!(
                    "(if {} {} {})",
                    Self::format_expression(&stmt.condition),
                    Self::format_body(&stmt.success),
                    Self::format_body(failure)
                ),
                None => format!(
                    "(if {} {})",
                    Self::format_expression(&stmt.condition),
                    Self::format_body(&stmt.success)
                ),
            },
            Statement::While(stmt) => {
                let head = if stmt.eval_after { "do-while" } else { "while" };
                let condition = stmt
                    .condition
                    .as_ref()
                    .map_or_else(|| "true".to_string(), Self::format_expression);
                match &stmt.step {
                    Some(step) => format!(
                        "({head} {condition} {} {})",
                        Self::format_body(&stmt.body),
                        Self::format_expression(step)
                    ),
                    None => format!("({head} {condition} {})", Self::format_body(&stmt.body)),
                }
            }
            Statement::ForEach(stmt) => format!(
                "(for {} {} {})",
                stmt.variable,
                Self::format_expression(&stmt.iterable),
                Self::format_body(&stmt.body)
            ),
            Statement::Break(_) => "(break)".into(),
            Statement::Continue(_) => "(continue)".into(),
            Statement::Return(stmt) => match &stmt.value {
                Some(value) => format!("(return {})", Self::format_expression(value)),
                None => "(return)".into(),
            },
        }
    }

    fn format_expression(tree: &Expression) -> String {
        Self::format_node(tree, tree.get_root_ref())
    }
}

impl ExpressionFormatter for SExpressionFormatter {
    fn format(&self, tree: &Expression) -> String {
        Self::format_expression(tree)
    }
}

impl ProgramFormatter for SExpressionFormatter {
    fn format(&self, program: &Program) -> String {
        let statements: Vec<String> = program.iter().map(Self::format_statement).collect();
        statements.join("\n")
    }
}

pub trait ParserFormatter {
    fn format_error(&self, error: &ParserError) -> String;
}

pub struct DebugParserFormatter;

impl ParserFormatter for DebugParserFormatter {
    fn format_error(&self, error: &ParserError) -> String {
        format!("{error:?}")
    }
}

pub struct BasicParserFormatter {
    line_breaks: LineBreaks,
}

impl BasicParserFormatter {
    pub fn new(text: &str) -> Self {
        Self {
            line_breaks: LineBreaks::new(text),
        }
    }
}

impl ParserFormatter for BasicParserFormatter {
    fn format_error(&self, error: &ParserError) -> String {
        let (line, column) = self.line_breaks.get_position(error.span);
        format!("[line {line}:{column}] Error: {error}")
    }
}

pub struct PrettyParserFormatter<'src> {
    text: &'src str,
    path: &'src Path,
}

impl<'src> PrettyParserFormatter<'src> {
    pub fn new(text: &'src str, path: &'src Path) -> Self {
        Self { text, path }
    }
}

impl<'src> ParserFormatter for PrettyParserFormatter<'src> {
    fn format_error(&self, error: &ParserError) -> String {
        let path = self.path.to_string_lossy();
        let path: &str = &path;
        let mut output = std::io::Cursor::new(Vec::new());
        Report::build(ReportKind::Error, (path, error.span.range()))
            .with_code(error.code())
            .with_message("Syntax error")
            .with_label(
                Label::new((path, error.span.range()))
                    .with_message(error.to_string())
                    .with_color(Color::Red),
            )
            .finish()
            .write((path, Source::from(self.text)), &mut output)
            .expect(ARIADNE_WRITE_MSG);
        String::from_utf8(output.into_inner()).expect(ARIADNE_MSG)
    }
}
