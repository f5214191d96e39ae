use std::collections::HashMap;

use crate::{
    ast::types::Type,
    errors::errors::{Error, ErrorImpl},
    Position,
};

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSig {
    pub params: Vec<Type>,
    pub ret: Type,
}

/// What a name is bound to in some layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Binding<'a> {
    Variable(Type),
    Function(&'a FunctionSig),
}

/// One scope: the declarations of a single block.
///
/// Variables and functions share one namespace, so a name lives in at most
/// one of the two maps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    pub variables: HashMap<String, Type>,
    pub functions: HashMap<String, FunctionSig>,
}

impl Environment {
    pub fn new() -> Self {
        Environment::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name) || self.functions.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<Binding<'_>> {
        if let Some(type_) = self.variables.get(name) {
            Some(Binding::Variable(*type_))
        } else {
            self.functions.get(name).map(Binding::Function)
        }
    }

    pub fn declare_variable(
        &mut self,
        name: &str,
        type_: Type,
        position: Position,
    ) -> Result<(), Error> {
        if self.contains(name) {
            return Err(Error::new(
                ErrorImpl::DuplicateDeclaration {
                    name: name.to_string(),
                },
                position,
            ));
        }

        self.variables.insert(name.to_string(), type_);
        Ok(())
    }

    pub fn declare_function(
        &mut self,
        name: &str,
        sig: FunctionSig,
        position: Position,
    ) -> Result<(), Error> {
        if self.contains(name) {
            return Err(Error::new(
                ErrorImpl::DuplicateDeclaration {
                    name: name.to_string(),
                },
                position,
            ));
        }

        self.functions.insert(name.to_string(), sig);
        Ok(())
    }

    /// Lays `other` over `self`: names declared in `other` replace any binding
    /// of the same name here.
    pub fn overlay(&mut self, other: &Environment) {
        for (name, type_) in other.variables.iter() {
            self.functions.remove(name);
            self.variables.insert(name.clone(), *type_);
        }
        for (name, sig) in other.functions.iter() {
            self.variables.remove(name);
            self.functions.insert(name.clone(), sig.clone());
        }
    }
}

/// A stack of scopes, outermost first. Lookups resolve innermost first and
/// declarations always go to the innermost layer.
#[derive(Debug, Clone)]
pub struct TypeEnvironment {
    layers: Vec<Environment>,
}

impl Default for TypeEnvironment {
    fn default() -> Self {
        TypeEnvironment::new()
    }
}

impl TypeEnvironment {
    pub fn new() -> Self {
        TypeEnvironment {
            layers: vec![Environment::new()],
        }
    }

    /// Starts from the top-level declarations of earlier units. The seed stays
    /// a separate outer layer, so the new unit may re-declare its variables.
    pub fn seeded(seed: &Environment) -> Self {
        TypeEnvironment {
            layers: vec![seed.clone(), Environment::new()],
        }
    }

    pub fn push_layer(&mut self, layer: Environment) {
        self.layers.push(layer);
    }

    pub fn pop_layer(&mut self) -> Option<Environment> {
        if self.layers.len() > 1 {
            self.layers.pop()
        } else {
            None
        }
    }

    pub fn current(&self) -> &Environment {
        &self.layers[self.layers.len() - 1]
    }

    pub fn current_mut(&mut self) -> &mut Environment {
        let last = self.layers.len() - 1;
        &mut self.layers[last]
    }

    pub fn lookup(&self, name: &str) -> Option<Binding<'_>> {
        self.layers.iter().rev().find_map(|layer| layer.get(name))
    }

    /// Finds `name` in any layer except the innermost one.
    pub fn lookup_outer(&self, name: &str) -> Option<Binding<'_>> {
        let outer = &self.layers[..self.layers.len() - 1];
        outer.iter().rev().find_map(|layer| layer.get(name))
    }

    pub fn lookup_variable(&self, name: &str) -> Option<Type> {
        match self.lookup(name) {
            Some(Binding::Variable(type_)) => Some(type_),
            _ => None,
        }
    }

    pub fn lookup_function(&self, name: &str) -> Option<&FunctionSig> {
        match self.lookup(name) {
            Some(Binding::Function(sig)) => Some(sig),
            _ => None,
        }
    }

    /// Whether `name` is a variable of the innermost layer.
    pub fn is_local(&self, name: &str) -> bool {
        self.current().variables.contains_key(name)
    }

    /// Collapses all layers into one, inner declarations winning.
    pub fn flatten(&self) -> Environment {
        let mut merged = Environment::new();
        for layer in self.layers.iter() {
            merged.overlay(layer);
        }
        merged
    }
}
