use crate::component_query::ComponentQuery;
use crate::meta_query::MetaQuery;
use crate::operator::Operator;
use crate::sort::SortBy;

/// Builds the query string consumed by `GET /records?…`.
///
/// Pure and side-effect free: every `with_*` call returns a new builder
/// state, and the order in which calls are chained never changes the
/// built output (§4.B). Default sort, when `sort_by` is never called, is
/// descending `stop_time` then ascending `record_id` — enforced server-side,
/// not encoded by this builder.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    record_id: Option<String>,
    start_time: Option<Operator>,
    stop_time: Option<Operator>,
    meta_query: Option<MetaQuery>,
    component_query: Option<ComponentQuery>,
    sort_by: Option<SortBy>,
    limit: Option<u64>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record_id(mut self, record_id: impl Into<String>) -> Self {
        self.record_id = Some(record_id.into());
        self
    }

    pub fn with_start_time(mut self, operator: Operator) -> Self {
        self.start_time = Some(operator);
        self
    }

    pub fn with_stop_time(mut self, operator: Operator) -> Self {
        self.stop_time = Some(operator);
        self
    }

    pub fn with_meta_query(mut self, meta_query: MetaQuery) -> Self {
        self.meta_query = Some(meta_query);
        self
    }

    pub fn with_component_query(mut self, component_query: ComponentQuery) -> Self {
        self.component_query = Some(component_query);
        self
    }

    pub fn sort_by(mut self, sort_by: SortBy) -> Self {
        self.sort_by = Some(sort_by);
        self
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Renders every set predicate in a fixed field order, independent of
    /// the order `with_*` was called in.
    pub fn build(&self) -> String {
        let mut clauses = Vec::new();

        if let Some(record_id) = &self.record_id {
            clauses.push(format!("record_id={record_id}"));
        }
        if let Some(op) = &self.start_time {
            if !op.is_empty() {
                clauses.push(op.render("start_time"));
            }
        }
        if let Some(op) = &self.stop_time {
            if !op.is_empty() {
                clauses.push(op.render("stop_time"));
            }
        }
        if let Some(meta_query) = &self.meta_query {
            let rendered = meta_query.render();
            if !rendered.is_empty() {
                clauses.push(rendered);
            }
        }
        if let Some(component_query) = &self.component_query {
            let rendered = component_query.render();
            if !rendered.is_empty() {
                clauses.push(rendered);
            }
        }
        if let Some(sort_by) = &self.sort_by {
            clauses.push(sort_by.render());
        }
        if let Some(limit) = self.limit {
            clauses.push(format!("limit={limit}"));
        }

        clauses.join("&")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta_query::MetaOperator;
    use crate::value::Value;
    use chrono::{TimeZone, Utc};

    #[test]
    fn chain_order_does_not_affect_output() {
        let a = QueryBuilder::new()
            .with_record_id("record-03")
            .limit(4)
            .build();
        let b = QueryBuilder::new()
            .limit(4)
            .with_record_id("record-03")
            .build();
        assert_eq!(a, b);
    }

    #[test]
    fn half_open_range_on_start_time() {
        let lo = Utc.with_ymd_and_hms(2022, 8, 8, 11, 30, 0).unwrap();
        let hi = Utc.with_ymd_and_hms(2022, 8, 8, 15, 30, 0).unwrap();
        let op = Operator::new().gt(Value::datetime(lo)).lt(Value::datetime(hi));
        let query = QueryBuilder::new().with_start_time(op).build();
        assert!(query.contains("start_time[gt]="));
        assert!(query.contains("start_time[lt]="));
    }

    #[test]
    fn meta_query_renders_contains_clause() {
        let meta_query = MetaQuery::new()
            .meta_operator("group_id", MetaOperator::new().contains(vec!["group_1".into()]));
        let query = QueryBuilder::new().with_meta_query(meta_query).build();
        assert_eq!(query, "meta.group_id[contains]=group_1");
    }

    #[test]
    fn empty_builder_renders_empty_string() {
        assert_eq!(QueryBuilder::new().build(), "");
    }

    #[test]
    fn sort_by_renders_field_and_order() {
        let query = QueryBuilder::new().sort_by(SortBy::descending("start_time")).build();
        assert_eq!(query, "sort_by=start_time&order=desc");
    }
}
