use crate::ast::*;

/// Names the default interpreter resolves itself; they never need to be
/// bound from the template context.
const GLOBALS: &[&str] = &["String", "Number", "Boolean", "JSON"];

pub fn is_global(name: &str) -> bool {
    GLOBALS.contains(&name)
}

pub trait Visitor: Sized {
    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }

    fn visit_ident(&mut self, _ident: &Ident) {}

    fn visit_property(&mut self, property: &Property) {
        self.visit_expr(&property.value);
    }
}

pub fn walk_expr<V: Visitor>(visitor: &mut V, Expr { kind, .. }: &Expr) {
    use ExprKind::*;
    match kind {
        Lit(_) => (),
        Reference(ident) => {
            visitor.visit_ident(ident);
        }
        Array(exprs) => {
            for expr in exprs {
                visitor.visit_expr(expr);
            }
        }
        Object(properties) => {
            for property in properties {
                visitor.visit_property(property);
            }
        }
        // The property name of a member expression isn't a reference
        Member(object, _) => {
            visitor.visit_expr(object);
        }
        Index(object, index) => {
            visitor.visit_expr(object);
            visitor.visit_expr(index);
        }
        Call(callee, arguments) => {
            visitor.visit_expr(callee);
            for arg in arguments {
                visitor.visit_expr(arg);
            }
        }
        Unary(_op, operand) => {
            visitor.visit_expr(operand);
        }
        Binary(_op, left, right) => {
            visitor.visit_expr(left);
            visitor.visit_expr(right);
        }
        Cond(test, consequent, alt) => {
            visitor.visit_expr(test);
            visitor.visit_expr(consequent);
            visitor.visit_expr(alt);
        }
    }
}

#[derive(Default)]
struct References {
    names: Vec<String>,
}

impl Visitor for References {
    fn visit_ident(&mut self, ident: &Ident) {
        if !is_global(&ident.name) && !self.names.iter().any(|name| name == &ident.name) {
            self.names.push(ident.name.clone());
        }
    }
}

/// Every identifier `expr` reads, in order of first appearance.
pub fn free_identifiers(expr: &Expr) -> Vec<String> {
    let mut references = References::default();
    references.visit_expr(expr);
    references.names
}
