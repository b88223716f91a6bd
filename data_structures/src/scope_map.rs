use crate::HashMap;

use std::borrow::Borrow;
use std::fmt::Debug;
use std::hash::Hash;

/// An individual scope. Mapped to a loop body or a compiled file, as those
/// are the only template constructs that introduce bindings.
#[derive(Debug)]
pub struct Scope<K: Eq + Hash, V> {
    bindings: HashMap<K, V>,
}

impl<K: Eq + Hash, V> Default for Scope<K, V> {
    fn default() -> Self {
        Scope {
            bindings: HashMap::default(),
        }
    }
}

impl<K: Eq + Hash, V> Scope<K, V> {
    pub fn define(&mut self, reference: K, referant: V) {
        self.bindings.insert(reference, referant);
    }

    pub fn resolve<Q>(&self, reference: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.bindings.get(reference)
    }
}

/// ScopeMap tracks the lexical scopes that are active while walking
/// a tree, resolving references from the innermost scope outwards.
#[derive(Debug)]
pub struct ScopeMap<K: Eq + Hash, V> {
    // The list of scopes that are currently active
    active_scopes: Vec<Scope<K, V>>,
}

impl<K: Eq + Hash, V> Default for ScopeMap<K, V> {
    fn default() -> Self {
        ScopeMap {
            active_scopes: vec![],
        }
    }
}

impl<K: Eq + Hash + Debug, V> ScopeMap<K, V> {
    /// Define a new binding in the innermost scope.
    pub fn define(&mut self, reference: K, referant: V) {
        match self.active_scopes.last_mut() {
            Some(scope) => scope.define(reference, referant),
            None => {
                // Defining without an explicit scope opens the root scope.
                let mut scope = Scope::default();
                scope.define(reference, referant);
                self.active_scopes.push(scope);
            }
        }
    }

    pub fn enter_scope(&mut self) {
        self.active_scopes.push(Scope::default());
    }

    pub fn exit_scope(&mut self) -> Option<Scope<K, V>> {
        self.active_scopes.pop()
    }

    pub fn depth(&self) -> usize {
        self.active_scopes.len()
    }

    /// Resolve a reference to a binding, if it exists.
    pub fn resolve<Q>(&self, reference: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        // Walk through the active scopes backwards, as we want to attempt
        // resolution with the *newest* scope first.
        self.active_scopes
            .iter()
            .rev()
            .find_map(|scope| scope.resolve(reference))
    }

    pub fn is_defined<Q>(&self, reference: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.resolve(reference).is_some()
    }
}
