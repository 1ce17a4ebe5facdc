#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    fn tag(self) -> &'static str {
        match self {
            Direction::Ascending => "asc",
            Direction::Descending => "desc",
        }
    }
}

/// The `sort_by=<field>&order=<asc|desc>` clause (§4.B). When unspecified,
/// the query builder falls back to its default tie-break: descending
/// `stop_time` then ascending `record_id`.
#[derive(Debug, Clone)]
pub struct SortBy {
    field: String,
    direction: Direction,
}

impl SortBy {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Ascending,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: Direction::Descending,
        }
    }

    pub(crate) fn render(&self) -> String {
        format!("sort_by={}&order={}", self.field, self.direction.tag())
    }
}
