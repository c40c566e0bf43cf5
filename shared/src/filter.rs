use chrono::{DateTime, Utc};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Clause {
    pub sql: String,
    pub params: Vec<i64>,
}

/// Conjunction of constraints appended to the statistics query.
///
/// Time range clauses on the indexed `SubmitTime`/`EndTime` columns are always
/// rendered ahead of the id `IN` lists, whatever order they were added in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterPredicate {
    Satisfiable {
        ranges: Vec<Clause>,
        matches: Vec<Clause>,
    },
    /// Some filter matched nothing, no record can be selected.
    Unsatisfiable,
}

impl Default for FilterPredicate {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterPredicate {
    pub fn new() -> Self {
        FilterPredicate::Satisfiable {
            ranges: Vec::new(),
            matches: Vec::new(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn is_satisfiable(&self) -> bool {
        matches!(self, FilterPredicate::Satisfiable { .. })
    }

    pub fn mark_unsatisfiable(&mut self) {
        *self = FilterPredicate::Unsatisfiable;
    }

    /// Adds `column IN (...)` over `ids`. An empty id list means the filter
    /// matched nothing and turns the whole predicate unsatisfiable.
    pub fn add_ids(&mut self, column: &str, ids: &[i64]) {
        if ids.is_empty() {
            self.mark_unsatisfiable();
            return;
        }
        if let FilterPredicate::Satisfiable { matches, .. } = self {
            let placeholders = vec!["?"; ids.len()].join(",");
            matches.push(Clause {
                sql: format!("{} IN ({})", column, placeholders),
                params: ids.to_vec(),
            });
        }
    }

    /// Records submitted strictly after `time`.
    pub fn submitted_after(&mut self, time: DateTime<Utc>) {
        self.add_range("SubmitTime > ?", time.timestamp());
    }

    /// Records finished strictly before `time`.
    pub fn ended_before(&mut self, time: DateTime<Utc>) {
        self.add_range("EndTime < ?", time.timestamp());
    }

    fn add_range(&mut self, sql: &str, epoch: i64) {
        if let FilterPredicate::Satisfiable { ranges, .. } = self {
            ranges.push(Clause {
                sql: sql.to_string(),
                params: vec![epoch],
            });
        }
    }

    fn clauses(&self) -> impl Iterator<Item = &Clause> {
        let (ranges, matches): (&[Clause], &[Clause]) = match self {
            FilterPredicate::Satisfiable { ranges, matches } => (ranges.as_slice(), matches.as_slice()),
            FilterPredicate::Unsatisfiable => (&[], &[]),
        };
        ranges.iter().chain(matches.iter())
    }

    /// SQL fragment to append after a `WHERE` base clause, e.g.
    /// ` AND SubmitTime > ? AND QueueID IN (?,?)`. Empty when no filters.
    pub fn sql(&self) -> String {
        self.clauses()
            .map(|c| format!(" AND {}", c.sql))
            .collect()
    }

    /// Bound values in the same order as the placeholders of [`Self::sql`].
    pub fn params(&self) -> Vec<i64> {
        self.clauses()
            .flat_map(|c| c.params.iter().copied())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses().next().is_none()
    }
}

/// Renders `sql` with every `?` replaced by the matching parameter, for logs.
pub fn substitute_params(sql: &str, params: &[i64]) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut values = params.iter();
    for ch in sql.chars() {
        if ch == '?' {
            match values.next() {
                Some(v) => out.push_str(&v.to_string()),
                None => out.push('?'),
            }
        } else {
            out.push(ch);
        }
    }
    out
}
