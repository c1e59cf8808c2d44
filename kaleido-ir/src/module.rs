//! The [`Module`], a named collection of functions.

use crate::function::Function;

/// Owns every function generated across a session, keyed by name.
/// Functions keep their insertion order so that output is deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Module {
    functions: Vec<Function>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|function| function.name == name)
    }

    /// Returns the function called `name`, adding a bodiless declaration if it
    /// does not exist yet. The second element is `true` when a declaration was added.
    pub fn declare(&mut self, name: &str, params: &[String]) -> (&Function, bool) {
        match self.position(name) {
            Some(index) => (&self.functions[index], false),
            None => {
                self.functions
                    .push(Function::declaration(name, params.to_vec()));
                (&self.functions[self.functions.len() - 1], true)
            }
        }
    }

    /// Inserts `function`, replacing any function with the same name in place.
    pub fn define(&mut self, function: Function) -> &Function {
        let index = match self.position(&function.name) {
            Some(index) => {
                self.functions[index] = function;
                index
            }
            None => {
                self.functions.push(function);
                self.functions.len() - 1
            }
        };
        &self.functions[index]
    }

    pub fn remove(&mut self, name: &str) -> Option<Function> {
        self.position(name)
            .map(|index| self.functions.remove(index))
    }

    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.functions
            .iter()
            .position(|function| function.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn test_declare_is_idempotent() {
        let mut module = Module::new();
        let (function, added) = module.declare("sin", &params(&["x"]));
        assert!(function.is_declaration());
        assert!(added);

        let (function, added) = module.declare("sin", &params(&["y", "z"]));
        assert_eq!(function.params, params(&["x"]));
        assert!(!added);
        assert_eq!(module.functions().len(), 1);
    }

    #[test]
    fn test_define_replaces_in_place() {
        let mut module = Module::new();
        module.declare("a", &[]);
        module.declare("b", &[]);

        let defined = module.define(Function::declaration("a", params(&["x"])));
        assert_eq!(defined.params, params(&["x"]));

        let names: Vec<_> = module.functions().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(module.get_function("a").unwrap().arity(), 1);
    }

    #[test]
    fn test_remove() {
        let mut module = Module::new();
        module.declare("a", &[]);
        assert!(module.remove("a").is_some());
        assert!(module.remove("a").is_none());
        assert!(module.functions().is_empty());
    }
}
