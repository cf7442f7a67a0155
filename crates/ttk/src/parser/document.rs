//! Turns parsed statements into a [`Document`]: BLOCK definitions are
//! hoisted out of the body and loop-control placement is checked.

use std::mem;
use std::rc::Rc;

use super::ast::{Document, LoopControl, Node};
use super::error::ParseError;

impl Document {
    pub(crate) fn compile(body: Vec<Node>, source: &str) -> Result<Self, ParseError> {
        Self::compile_block(body, Vec::new(), source)
    }

    fn compile_block(
        mut body: Vec<Node>,
        meta: Vec<(String, String)>,
        source: &str,
    ) -> Result<Self, ParseError> {
        let mut blocks = Vec::new();
        hoist(&mut body, &mut blocks, source)?;
        check_loop_control(&body, 0, source)?;
        Ok(Document { body, blocks, meta })
    }
}

/// Move every BLOCK found in `nodes` (at any nesting below other
/// directives) into `blocks`. A BLOCK's own nested blocks stay with it.
fn hoist(
    nodes: &mut Vec<Node>,
    blocks: &mut Vec<(String, Rc<Document>)>,
    source: &str,
) -> Result<(), ParseError> {
    let mut kept = Vec::with_capacity(nodes.len());
    for node in mem::take(nodes) {
        match node {
            Node::Block { name, meta, body } => {
                let document = Document::compile_block(body, meta, source)?;
                blocks.push((name, Rc::new(document)));
            }
            mut other => {
                for child in children(&mut other) {
                    hoist(child, blocks, source)?;
                }
                kept.push(other);
            }
        }
    }
    *nodes = kept;
    Ok(())
}

fn children(node: &mut Node) -> Vec<&mut Vec<Node>> {
    match node {
        Node::If {
            body,
            elsifs,
            otherwise,
            ..
        } => {
            let mut children = vec![body];
            children.extend(elsifs.iter_mut().map(|(_, body)| body));
            children.extend(otherwise);
            children
        }
        Node::For { body, .. }
        | Node::While { body, .. }
        | Node::Wrapper { body, .. }
        | Node::Filter { body, .. } => vec![body],
        Node::Switch { cases, .. } => cases.iter_mut().map(|case| &mut case.body).collect(),
        Node::Try {
            body,
            catches,
            finally,
        } => {
            let mut children = vec![body];
            children.extend(catches.iter_mut().map(|catch| &mut catch.body));
            children.extend(finally);
            children
        }
        _ => Vec::new(),
    }
}

/// Reject `NEXT`/`LAST` that are not inside a `FOR` or `WHILE` of the
/// same document.
fn check_loop_control(nodes: &[Node], depth: usize, source: &str) -> Result<(), ParseError> {
    for node in nodes {
        match node {
            Node::LoopControl { control, position } if depth == 0 => {
                let keyword = match control {
                    LoopControl::Next => "NEXT",
                    LoopControl::Last => "LAST",
                };
                return Err(ParseError::syntax(
                    source,
                    *position,
                    format!("{keyword} used outside of a loop"),
                ));
            }
            Node::For { body, .. } | Node::While { body, .. } => {
                check_loop_control(body, depth + 1, source)?;
            }
            Node::If {
                body,
                elsifs,
                otherwise,
                ..
            } => {
                check_loop_control(body, depth, source)?;
                for (_, body) in elsifs {
                    check_loop_control(body, depth, source)?;
                }
                if let Some(body) = otherwise {
                    check_loop_control(body, depth, source)?;
                }
            }
            Node::Switch { cases, .. } => {
                for case in cases {
                    check_loop_control(&case.body, depth, source)?;
                }
            }
            Node::Try {
                body,
                catches,
                finally,
            } => {
                check_loop_control(body, depth, source)?;
                for catch in catches {
                    check_loop_control(&catch.body, depth, source)?;
                }
                if let Some(body) = finally {
                    check_loop_control(body, depth, source)?;
                }
            }
            Node::Wrapper { body, .. } | Node::Filter { body, .. } => {
                check_loop_control(body, depth, source)?;
            }
            _ => {}
        }
    }
    Ok(())
}
