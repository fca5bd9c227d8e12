use std::rc::Rc;

use compact_str::CompactString;

use super::{
    InfixAssignmentOperator, InfixOperator, InfixShortCircuitOperator, PrefixOperator,
};
use crate::{
    lexer::Span,
    parser::statement::FunctionDecl,
    string::{Ident, IdentName},
};

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionAtomKind {
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
    Identifier(IdentName),
    StringLiteral(CompactString),
}

#[derive(Debug, Clone)]
pub struct ExpressionAtom {
    pub kind: ExpressionAtomKind,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpressionNodeRef(pub u32);

/// Places an assignment can write to.
#[derive(Debug, Clone)]
pub enum AssignmentTarget {
    Variable(Ident),
    Attribute {
        object: ExpressionNodeRef,
        name: Ident,
    },
    Subscript {
        object: ExpressionNodeRef,
        index: ExpressionNodeRef,
    },
}

#[derive(Debug, Clone)]
pub enum ExpressionNode {
    Atom(ExpressionAtom),
    Group {
        inner: ExpressionNodeRef,
    },
    Sequence {
        expressions: Vec<ExpressionNodeRef>,
    },
    Prefix {
        operator: PrefixOperator,
        rhs: ExpressionNodeRef,
    },
    Infix {
        operator: InfixOperator,
        lhs: ExpressionNodeRef,
        rhs: ExpressionNodeRef,
    },
    InfixShortCircuit {
        operator: InfixShortCircuitOperator,
        lhs: ExpressionNodeRef,
        rhs: ExpressionNodeRef,
    },
    InfixAssignment {
        operator: InfixAssignmentOperator,
        target: AssignmentTarget,
        rhs: ExpressionNodeRef,
    },
    Call {
        callee: ExpressionNodeRef,
        arguments: Vec<ExpressionNodeRef>,
    },
    New {
        class: ExpressionNodeRef,
        arguments: Vec<ExpressionNodeRef>,
    },
    Subscript {
        object: ExpressionNodeRef,
        index: ExpressionNodeRef,
    },
    Get {
        object: ExpressionNodeRef,
        name: Ident,
    },
    Function(Rc<FunctionDecl>),
    List {
        elements: Vec<ExpressionNodeRef>,
    },
    Dict {
        entries: Vec<(ExpressionNodeRef, ExpressionNodeRef)>,
    },
}

impl ExpressionNode {
    /// Converts the node into something an assignment can write to.
    pub fn get_assignment_target(&self) -> Option<AssignmentTarget> {
        match self {
            ExpressionNode::Atom(ExpressionAtom {
                kind: ExpressionAtomKind::Identifier(name),
                span,
            }) => Some(AssignmentTarget::Variable(Ident {
                name: name.clone(),
                span: *span,
            })),
            ExpressionNode::Get { object, name } => Some(AssignmentTarget::Attribute {
                object: *object,
                name: name.clone(),
            }),
            ExpressionNode::Subscript { object, index } => Some(AssignmentTarget::Subscript {
                object: *object,
                index: *index,
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IncompleteExpression {
    nodes: Vec<ExpressionNode>,
    spans: Vec<Span>,
}

impl IncompleteExpression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: ExpressionNode, span: Span) -> ExpressionNodeRef {
        self.nodes.push(node);
        self.spans.push(span);
        ExpressionNodeRef(self.nodes.len() as u32 - 1)
    }

    pub fn get_node(&self, node: ExpressionNodeRef) -> Option<&ExpressionNode> {
        self.nodes.get(node.0 as usize)
    }

    pub fn get_span(&self, node: ExpressionNodeRef) -> Option<Span> {
        self.spans.get(node.0 as usize).copied()
    }
}

/// An expression tree stored as a flat arena of nodes plus the root handle.
#[derive(Debug, Clone)]
pub struct Expression {
    nodes: Vec<ExpressionNode>,
    spans: Vec<Span>,
    root: ExpressionNodeRef,
}

impl Expression {
    pub fn new(tree: IncompleteExpression, root: ExpressionNodeRef) -> Option<Self> {
        if !(0..tree.nodes.len()).contains(&(root.0 as usize)) {
            None
        } else {
            Some(Self {
                nodes: tree.nodes,
                spans: tree.spans,
                root,
            })
        }
    }

    pub fn get_root_ref(&self) -> ExpressionNodeRef {
        self.root
    }

    pub fn get_root(&self) -> &ExpressionNode {
        self.get_node(self.root)
            .expect("The root exists within the tree.")
    }

    pub fn get_node(&self, node: ExpressionNodeRef) -> Option<&ExpressionNode> {
        self.nodes.get(node.0 as usize)
    }

    pub fn get_subspan(&self, node: ExpressionNodeRef) -> Option<Span> {
        self.spans.get(node.0 as usize).copied()
    }

    /// Every node in the arena, in allocation order.
    pub fn iter_nodes(&self) -> std::slice::Iter<'_, ExpressionNode> {
        self.nodes.iter()
    }

    pub fn get_span(&self) -> Span {
        self.get_subspan(self.root)
            .expect("The root exists within the tree.")
    }
}
