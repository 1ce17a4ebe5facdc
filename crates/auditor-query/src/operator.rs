use crate::value::Value;

/// The comparison kinds a predicate may carry. Ordered here exactly as they
/// are rendered, so two operators built from the same comparisons in a
/// different call order still produce byte-identical output (§4.B
/// determinism guarantee).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum OpKind {
    Gt,
    Gte,
    Lt,
    Lte,
    Equals,
}

impl OpKind {
    fn tag(self) -> &'static str {
        match self {
            OpKind::Gt => "gt",
            OpKind::Gte => "gte",
            OpKind::Lt => "lt",
            OpKind::Lte => "lte",
            OpKind::Equals => "equals",
        }
    }
}

/// A composable comparison, e.g. `Operator::new().gt(v1).lt(v2)` renders as
/// a half-open range. Comparisons are kept sorted by kind rather than call
/// order so the builder stays order-independent.
#[derive(Debug, Clone, Default)]
pub struct Operator {
    comparisons: Vec<(OpKind, Value)>,
}

impl Operator {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, kind: OpKind, value: Value) -> Self {
        self.comparisons.push((kind, value));
        self
    }

    pub fn gt(self, value: Value) -> Self {
        self.push(OpKind::Gt, value)
    }

    pub fn gte(self, value: Value) -> Self {
        self.push(OpKind::Gte, value)
    }

    pub fn lt(self, value: Value) -> Self {
        self.push(OpKind::Lt, value)
    }

    pub fn lte(self, value: Value) -> Self {
        self.push(OpKind::Lte, value)
    }

    pub fn equals(self, value: Value) -> Self {
        self.push(OpKind::Equals, value)
    }

    pub fn is_empty(&self) -> bool {
        self.comparisons.is_empty()
    }

    /// Render as `field[op]=value` predicates joined with `&`, for `field`.
    pub(crate) fn render(&self, field: &str) -> String {
        let mut sorted = self.comparisons.clone();
        sorted.sort_by_key(|(kind, _)| *kind);
        sorted
            .iter()
            .map(|(kind, value)| format!("{field}[{}]={}", kind.tag(), value.render()))
            .collect::<Vec<_>>()
            .join("&")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_order_is_independent_of_call_order() {
        let a = Operator::new()
            .gt(Value::count(1))
            .lt(Value::count(5))
            .render("amount");
        let b = Operator::new()
            .lt(Value::count(5))
            .gt(Value::count(1))
            .render("amount");
        assert_eq!(a, b);
        assert_eq!(a, "amount[gt]=1&amount[lt]=5");
    }
}
