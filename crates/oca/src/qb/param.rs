//! Placeholder numbering shared by all builders.

use crate::dialect::Dialect;
use crate::qb::condition::{Condition, QuoteState};
use crate::value::Value;

/// Collects bound arguments for one `build()` call and emits the dialect's
/// placeholder for each, keeping a single running index.
#[derive(Debug)]
pub(crate) struct ParamList {
    dialect: Dialect,
    args: Vec<Value>,
}

impl ParamList {
    pub(crate) fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            args: Vec::new(),
        }
    }

    /// Append `value` to `sql`: raw literals inline, everything else as the next
    /// placeholder.
    pub(crate) fn push(&mut self, sql: &mut String, value: &Value) {
        match value {
            Value::Raw(literal) => sql.push_str(literal),
            other => {
                self.args.push(other.clone());
                sql.push_str(&self.dialect.placeholder(self.args.len()));
            }
        }
    }

    /// Append a condition with its `?` markers rewritten. Markers inside string
    /// literals or quoted identifiers are copied verbatim, as are markers with no argument left.
    pub(crate) fn push_condition(&mut self, sql: &mut String, cond: &Condition) {
        let mut args = cond.args().iter();
        let mut quotes = QuoteState::default();
        for ch in cond.expr().chars() {
            let outside = quotes.step(ch);
            match ch {
                '?' if outside => match args.next() {
                    Some(value) => self.push(sql, value),
                    None => sql.push(ch),
                },
                _ => sql.push(ch),
            }
        }
    }

    /// Append ` WHERE a AND b ...` when there are conditions.
    pub(crate) fn push_where(&mut self, sql: &mut String, conditions: &[Condition]) {
        for (i, cond) in conditions.iter().enumerate() {
            sql.push_str(if i == 0 { " WHERE " } else { " AND " });
            self.push_condition(sql, cond);
        }
    }

    pub(crate) fn into_args(self) -> Vec<Value> {
        self.args
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qb::condition::col;
    use crate::value::raw;

    #[test]
    fn dollar_numbering_runs_across_pushes() {
        let mut params = ParamList::new(Dialect::POSTGRES);
        let mut sql = String::new();
        params.push_condition(&mut sql, &col("a").eq(1));
        sql.push_str(" / ");
        params.push(&mut sql, &Value::I64(2));
        assert_eq!(sql, "a = $1 / $2");
        assert_eq!(params.into_args(), [Value::I32(1), Value::I64(2)]);
    }

    #[test]
    fn raw_values_are_inlined() {
        let mut params = ParamList::new(Dialect::POSTGRES);
        let mut sql = String::new();
        params.push_condition(&mut sql, &col("created_at").lt(raw("NOW()")));
        params.push(&mut sql, &Value::from("x"));
        assert_eq!(sql, "created_at < NOW()$1");
        assert_eq!(params.into_args(), [Value::from("x")]);
    }

    #[test]
    fn quoted_markers_are_kept() {
        let cond = Condition::new("note = '?' AND id = ?", vec![7.into()]).unwrap();
        let mut params = ParamList::new(Dialect::POSTGRES);
        let mut sql = String::new();
        params.push_condition(&mut sql, &cond);
        assert_eq!(sql, "note = '?' AND id = $1");
    }

    #[test]
    fn quoted_identifier_markers_are_kept() {
        let mut params = ParamList::new(Dialect::POSTGRES);
        let mut sql = String::new();
        params.push_condition(&mut sql, &col("\"why?\"").eq(1));
        assert_eq!(sql, "\"why?\" = $1");
        assert_eq!(params.into_args(), [Value::I32(1)]);
    }
}
