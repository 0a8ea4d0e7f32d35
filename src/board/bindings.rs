use std::collections::BTreeMap;

use crate::board::wire::EvaluationItem;

/// Variables assigned in earlier rounds, sent along with every request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VariableBindings {
    vars: BTreeMap<String, String>,
}

impl VariableBindings {
    /// Insert or overwrite the binding for `expression`.
    pub fn update(&mut self, expression: impl Into<String>, result: impl Into<String>) {
        let expression = expression.into();
        let result = result.into();
        tracing::debug!(%expression, %result, "binding variable");
        self.vars.insert(expression, result);
    }

    /// Apply every assignment in `items`, in order. Later items win.
    pub fn apply_assignments(&mut self, items: &[EvaluationItem]) -> usize {
        let mut applied = 0;
        for item in items.iter().filter(|item| item.is_assignment) {
            self.update(item.expression.clone(), item.answer.clone());
            applied += 1;
        }
        applied
    }

    /// Copy of the current mapping for the next request.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.vars.clone()
    }

    pub fn get(&self, expression: &str) -> Option<&str> {
        self.vars.get(expression).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn reset(&mut self) {
        self.vars.clear();
    }
}
