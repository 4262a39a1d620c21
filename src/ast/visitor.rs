//! Tree traversal.
//!
//! `walk_script` drives a [`Visitor`] over the tree in document (pre-)order;
//! the `leave_*` hooks fire in post-order for visitors that need them.
//! `node_at` answers span-containment queries for editor integrations.

use crate::ast::types::{
    Command, Comment, Expr, Pos, Script, ScriptItem, Word,
};

/// Visitor over syntax tree nodes. All methods default to no-ops so
/// implementations only override what they care about.
pub trait Visitor {
    fn visit_script(&mut self, _script: &Script) {}
    fn visit_command(&mut self, _command: &Command) {}
    fn visit_comment(&mut self, _comment: &Comment) {}
    fn visit_word(&mut self, _word: &Word) {}
    fn visit_expr(&mut self, _expr: &Expr) {}

    fn leave_script(&mut self, _script: &Script) {}
    fn leave_command(&mut self, _command: &Command) {}
}

pub fn walk_script<V: Visitor + ?Sized>(v: &mut V, script: &Script) {
    v.visit_script(script);
    for item in &script.items {
        match item {
            ScriptItem::Command(c) => walk_command(v, c),
            ScriptItem::Comment(c) => v.visit_comment(c),
        }
    }
    v.leave_script(script);
}

pub fn walk_command<V: Visitor + ?Sized>(v: &mut V, command: &Command) {
    v.visit_command(command);
    for word in &command.words {
        walk_word(v, word);
    }
    v.leave_command(command);
}

pub fn walk_word<V: Visitor + ?Sized>(v: &mut V, word: &Word) {
    v.visit_word(word);
    match word {
        Word::Bare(_) | Word::Braced(_) | Word::BackslashSub(_) => {}
        Word::Quoted(w) => {
            for part in &w.parts {
                walk_word(v, part);
            }
        }
        Word::Compound(w) => {
            for part in &w.parts {
                walk_word(v, part);
            }
        }
        Word::VarSub(w) => {
            for part in &w.index {
                walk_word(v, part);
            }
        }
        Word::CmdSub(w) => walk_script(v, &w.script),
        Word::ArgExpansion(w) => walk_word(v, &w.word),
        Word::List(w) => {
            for item in &w.items {
                walk_word(v, item);
            }
        }
        Word::Script(w) => walk_script(v, &w.script),
        Word::Expr(w) => walk_expr(v, &w.expr),
    }
}

pub fn walk_expr<V: Visitor + ?Sized>(v: &mut V, expr: &Expr) {
    v.visit_expr(expr);
    match expr {
        Expr::Word(w) => walk_word(v, w),
        Expr::Unary(e) => walk_expr(v, &e.operand),
        Expr::Binary(e) => {
            walk_expr(v, &e.left);
            walk_expr(v, &e.right);
        }
        Expr::Ternary(e) => {
            walk_expr(v, &e.cond);
            walk_expr(v, &e.then_expr);
            walk_expr(v, &e.else_expr);
        }
        Expr::Function(e) => {
            for arg in &e.args {
                walk_expr(v, arg);
            }
        }
        Expr::Paren(e) => walk_expr(v, &e.inner),
    }
}

/// Reference to a node found by [`node_at`].
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Script(&'a Script),
    Command(&'a Command),
    Comment(&'a Comment),
    Word(&'a Word),
    Expr(&'a Expr),
}

/// Returns the deepest node whose span contains `pos`.
pub fn node_at(script: &Script, pos: Pos) -> Option<NodeRef<'_>> {
    if !script.span.contains(pos) {
        return None;
    }
    for item in &script.items {
        match item {
            ScriptItem::Command(c) if c.span.contains(pos) => {
                return Some(command_at(c, pos));
            }
            ScriptItem::Comment(c) if c.span.contains(pos) => {
                return Some(NodeRef::Comment(c));
            }
            _ => {}
        }
    }
    Some(NodeRef::Script(script))
}

fn command_at<'a>(command: &'a Command, pos: Pos) -> NodeRef<'a> {
    for word in &command.words {
        if word.span().contains(pos) {
            return word_at(word, pos);
        }
    }
    NodeRef::Command(command)
}

fn word_at<'a>(word: &'a Word, pos: Pos) -> NodeRef<'a> {
    let parts: &[Word] = match word {
        Word::Quoted(w) => &w.parts,
        Word::Compound(w) => &w.parts,
        Word::VarSub(w) => &w.index,
        Word::List(w) => &w.items,
        Word::ArgExpansion(w) => return word_at(&w.word, pos),
        Word::CmdSub(w) => return node_at(&w.script, pos).unwrap_or(NodeRef::Word(word)),
        Word::Script(w) => return node_at(&w.script, pos).unwrap_or(NodeRef::Word(word)),
        Word::Expr(w) => return expr_at(&w.expr, pos).unwrap_or(NodeRef::Word(word)),
        _ => return NodeRef::Word(word),
    };
    for part in parts {
        if part.span().contains(pos) {
            return word_at(part, pos);
        }
    }
    NodeRef::Word(word)
}

fn expr_at<'a>(expr: &'a Expr, pos: Pos) -> Option<NodeRef<'a>> {
    if !expr.span().contains(pos) {
        return None;
    }
    let children: Vec<&Expr> = match expr {
        Expr::Word(w) => return Some(word_at(w, pos)),
        Expr::Unary(e) => vec![e.operand.as_ref()],
        Expr::Binary(e) => vec![e.left.as_ref(), e.right.as_ref()],
        Expr::Ternary(e) => {
            vec![e.cond.as_ref(), e.then_expr.as_ref(), e.else_expr.as_ref()]
        }
        Expr::Function(e) => e.args.iter().collect(),
        Expr::Paren(e) => vec![e.inner.as_ref()],
    };
    for child in children {
        if let Some(found) = expr_at(child, pos) {
            return Some(found);
        }
    }
    Some(NodeRef::Expr(expr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{CommandRegistry, Dialect};
    use crate::parser::Parser;

    fn parse(source: &str) -> Script {
        let registry = CommandRegistry::new(Dialect::Tcl);
        let mut parser = Parser::new(&registry);
        parser.parse(source)
    }

    #[test]
    fn test_node_at_finds_word() {
        let tree = parse("puts $name\n");
        match node_at(&tree, Pos::new(1, 7)) {
            Some(NodeRef::Word(Word::VarSub(var))) => assert_eq!(var.name, "name"),
            other => panic!("expected var sub, got {other:?}"),
        }
    }

    #[test]
    fn test_node_at_descends_into_bodies() {
        let tree = parse("proc foo {} {\n    puts hi\n}\n");
        match node_at(&tree, Pos::new(2, 10)) {
            Some(NodeRef::Word(Word::Bare(bare))) => assert_eq!(bare.text, "hi"),
            other => panic!("expected bare word, got {other:?}"),
        }
    }

    #[test]
    fn test_node_at_outside() {
        let tree = parse("puts hi\n");
        assert!(node_at(&tree, Pos::new(5, 1)).is_none());
    }

    #[test]
    fn test_walk_order() {
        struct Collector {
            routines: Vec<String>,
        }
        impl Visitor for Collector {
            fn visit_command(&mut self, command: &Command) {
                if let Some(name) = command.routine() {
                    self.routines.push(name);
                }
            }
        }

        let tree = parse("if {1} {\n    puts a\n}\nputs b\n");
        let mut collector = Collector { routines: Vec::new() };
        walk_script(&mut collector, &tree);
        assert_eq!(collector.routines, vec!["if", "puts", "puts"]);
    }
}
