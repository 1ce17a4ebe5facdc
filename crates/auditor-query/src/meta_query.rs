/// A predicate over a single `meta` key: "the value list at this key
/// contains every listed string" (§4.B).
#[derive(Debug, Clone)]
pub struct MetaOperator {
    contains: Vec<String>,
}

impl MetaOperator {
    pub fn new() -> Self {
        Self { contains: Vec::new() }
    }

    pub fn contains(mut self, values: Vec<String>) -> Self {
        self.contains = values;
        self
    }
}

impl Default for MetaOperator {
    fn default() -> Self {
        Self::new()
    }
}

/// One or more [`MetaOperator`] predicates keyed by meta field name.
/// Rendered sorted by key so insertion order into the query never affects
/// the built query string.
#[derive(Debug, Clone, Default)]
pub struct MetaQuery {
    operators: Vec<(String, MetaOperator)>,
}

impl MetaQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn meta_operator(mut self, key: impl Into<String>, operator: MetaOperator) -> Self {
        self.operators.push((key.into(), operator));
        self
    }

    pub(crate) fn render(&self) -> String {
        let mut sorted = self.operators.clone();
        sorted.sort_by(|(a, _), (b, _)| a.cmp(b));
        sorted
            .iter()
            .map(|(key, op)| format!("meta.{key}[contains]={}", op.contains.join(",")))
            .collect::<Vec<_>>()
            .join("&")
    }
}
