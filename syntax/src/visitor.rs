use crate::ast::*;

pub trait Visitor: Sized {
    fn visit_document(&mut self, document: &Document) {
        walk_nodes(self, &document.nodes);
    }

    fn visit_node(&mut self, node: &Node) {
        walk_node(self, node);
    }

    fn visit_tag(&mut self, tag: &Tag) {
        walk_nodes(self, &tag.nodes);
    }

    fn visit_block(&mut self, block: &Block, _line: usize) {
        walk_nodes(self, &block.nodes);
    }

    fn visit_extends(&mut self, extends: &Extends) {
        for replace in &extends.replaces {
            self.visit_replace(replace);
        }
    }

    fn visit_replace(&mut self, replace: &Replace) {
        walk_nodes(self, &replace.nodes);
    }

    fn visit_include(&mut self, _include: &Include) {}

    fn visit_text(&mut self, _text: &str) {}
}

pub fn walk_nodes<V: Visitor>(visitor: &mut V, nodes: &[Node]) {
    for node in nodes {
        visitor.visit_node(node);
    }
}

pub fn walk_node<V: Visitor>(visitor: &mut V, Node { kind, line, .. }: &Node) {
    use NodeKind::*;
    match kind {
        Tag(tag) => visitor.visit_tag(tag),
        Text(text) => visitor.visit_text(text),
        Block(block) => visitor.visit_block(block, *line),
        Extends(extends) => visitor.visit_extends(extends),
        Include(include) => visitor.visit_include(include),
        Case(case) => {
            for arm in &case.arms {
                walk_nodes(visitor, &arm.nodes);
            }
        }
        If(if_node) => {
            for branch in &if_node.branches {
                walk_nodes(visitor, &branch.nodes);
            }
            if let Some(nodes) = &if_node.otherwise {
                walk_nodes(visitor, nodes);
            }
        }
        While(while_node) => walk_nodes(visitor, &while_node.nodes),
        Each(each) => walk_nodes(visitor, &each.nodes),
        Doctype(_) | Comment { .. } => (),
    }
}
