use crate::operator::Operator;

/// One or more comparison predicates keyed by component name, e.g.
/// "component `comp-1`'s amount equals 10" (§4.B). Rendered sorted by
/// component name for the same order-independence as [`crate::MetaQuery`].
#[derive(Debug, Clone, Default)]
pub struct ComponentQuery {
    operators: Vec<(String, Operator)>,
}

impl ComponentQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn component_operator(mut self, name: impl Into<String>, operator: Operator) -> Self {
        self.operators.push((name.into(), operator));
        self
    }

    pub(crate) fn render(&self) -> String {
        let mut sorted = self.operators.clone();
        sorted.sort_by(|(a, _), (b, _)| a.cmp(b));
        sorted
            .iter()
            .map(|(name, op)| op.render(&format!("component.{name}")))
            .collect::<Vec<_>>()
            .join("&")
    }
}
