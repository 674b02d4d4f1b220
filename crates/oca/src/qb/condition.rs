//! Condition algebra for WHERE clauses.
//!
//! A [`Condition`] is an expression template using `?` as the positional marker plus
//! the arguments for those markers, in order. Markers are rewritten into
//! dialect-specific placeholders only when a statement is built, so conditions can
//! be composed freely with [`and`], [`or`] and [`not`].

use crate::error::{OrmError, OrmResult};
use crate::value::Value;

/// A parameterized boolean SQL fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    expr: String,
    args: Vec<Value>,
}

impl Condition {
    /// Build a custom condition from a `?` template.
    ///
    /// The number of markers (outside string literals and quoted identifiers) must equal the
    /// number of arguments.
    ///
    /// ```ignore
    /// let c = Condition::new("lower(email) = lower(?)", vec!["A@B.C".into()])?;
    /// ```
    pub fn new(expr: impl Into<String>, args: Vec<Value>) -> OrmResult<Self> {
        let expr = expr.into();
        let markers = count_markers(&expr);
        if markers != args.len() {
            return Err(OrmError::validation(format!(
                "condition '{expr}' has {markers} placeholder(s) but {} argument(s)",
                args.len()
            )));
        }
        Ok(Self { expr, args })
    }

    pub(crate) fn unchecked(expr: String, args: Vec<Value>) -> Self {
        Self { expr, args }
    }

    /// The expression template with `?` markers.
    pub fn expr(&self) -> &str {
        &self.expr
    }

    /// Bound arguments, in marker order.
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Split into template and arguments.
    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.expr, self.args)
    }
}

/// A column reference used to build conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: String,
}

/// Reference a column by name.
///
/// ```ignore
/// use oca::col;
/// let adults = col("age").gte(18);
/// ```
pub fn col(name: impl Into<String>) -> Column {
    Column { name: name.into() }
}

/// Alias for [`col`].
pub fn c(name: impl Into<String>) -> Column {
    col(name)
}

impl Column {
    /// Column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn compare(&self, op: &str, value: Value) -> Condition {
        Condition::unchecked(format!("{} {} ?", self.name, op), vec![value])
    }

    /// `column = ?`
    pub fn eq(&self, value: impl Into<Value>) -> Condition {
        self.compare("=", value.into())
    }

    /// `column != ?`
    pub fn neq(&self, value: impl Into<Value>) -> Condition {
        self.compare("!=", value.into())
    }

    /// `column > ?`
    pub fn gt(&self, value: impl Into<Value>) -> Condition {
        self.compare(">", value.into())
    }

    /// `column >= ?`
    pub fn gte(&self, value: impl Into<Value>) -> Condition {
        self.compare(">=", value.into())
    }

    /// `column < ?`
    pub fn lt(&self, value: impl Into<Value>) -> Condition {
        self.compare("<", value.into())
    }

    /// `column <= ?`
    pub fn lte(&self, value: impl Into<Value>) -> Condition {
        self.compare("<=", value.into())
    }

    /// `column IS NULL`
    pub fn is_null(&self) -> Condition {
        Condition::unchecked(format!("{} IS NULL", self.name), Vec::new())
    }

    /// `column IS NOT NULL`
    pub fn is_not_null(&self) -> Condition {
        Condition::unchecked(format!("{} IS NOT NULL", self.name), Vec::new())
    }

    fn membership<I, V>(&self, op: &str, values: I, empty: &str) -> Condition
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let args: Vec<Value> = values.into_iter().map(Into::into).collect();
        if args.is_empty() {
            return Condition::unchecked(empty.to_string(), Vec::new());
        }
        let markers = vec!["?"; args.len()].join(", ");
        Condition::unchecked(format!("{} {} ({})", self.name, op, markers), args)
    }

    /// `column IN (?, ?, ...)`. An empty list matches nothing (`1=0`).
    pub fn in_list<I, V>(&self, values: I) -> Condition
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.membership("IN", values, "1=0")
    }

    /// `column NOT IN (?, ?, ...)`. An empty list matches everything (`1=1`).
    pub fn not_in<I, V>(&self, values: I) -> Condition
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.membership("NOT IN", values, "1=1")
    }

    /// `column LIKE ?`
    pub fn like(&self, pattern: impl Into<String>) -> Condition {
        self.compare("LIKE", Value::Text(pattern.into()))
    }

    /// `column NOT LIKE ?`
    pub fn not_like(&self, pattern: impl Into<String>) -> Condition {
        self.compare("NOT LIKE", Value::Text(pattern.into()))
    }

    /// `column BETWEEN ? AND ?`
    pub fn between(&self, start: impl Into<Value>, end: impl Into<Value>) -> Condition {
        Condition::unchecked(
            format!("{} BETWEEN ? AND ?", self.name),
            vec![start.into(), end.into()],
        )
    }

    /// `column NOT BETWEEN ? AND ?`
    pub fn not_between(&self, start: impl Into<Value>, end: impl Into<Value>) -> Condition {
        Condition::unchecked(
            format!("{} NOT BETWEEN ? AND ?", self.name),
            vec![start.into(), end.into()],
        )
    }
}

fn group(conds: impl IntoIterator<Item = Condition>, op: &str, empty: &str) -> Condition {
    let mut exprs = Vec::new();
    let mut args = Vec::new();
    for cond in conds {
        let (expr, cond_args) = cond.into_parts();
        exprs.push(expr);
        args.extend(cond_args);
    }
    if exprs.is_empty() {
        return Condition::unchecked(empty.to_string(), args);
    }
    Condition::unchecked(format!("({})", exprs.join(op)), args)
}

/// `(a AND b AND ...)`. No children yields `1=1`.
pub fn and(conds: impl IntoIterator<Item = Condition>) -> Condition {
    group(conds, " AND ", "1=1")
}

/// `(a OR b OR ...)`. No children yields `1=0`.
pub fn or(conds: impl IntoIterator<Item = Condition>) -> Condition {
    group(conds, " OR ", "1=0")
}

/// `NOT (cond)`, removing one redundant pair of outer parentheses first.
pub fn not(cond: Condition) -> Condition {
    let (expr, args) = cond.into_parts();
    let inner = strip_outer_parens(&expr);
    Condition::unchecked(format!("NOT ({})", inner), args)
}

/// Remove one pair of parentheses when the opening `(` at the start is closed by
/// the final `)`. `(a) OR (b)` is left untouched.
fn strip_outer_parens(expr: &str) -> &str {
    if !(expr.starts_with('(') && expr.ends_with(')')) {
        return expr;
    }
    let mut depth = 0usize;
    let mut quotes = QuoteState::default();
    for (i, ch) in expr.char_indices() {
        let outside = quotes.step(ch);
        match ch {
            '(' if outside => depth += 1,
            ')' if outside => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return if i == expr.len() - 1 {
                        &expr[1..i]
                    } else {
                        expr
                    };
                }
            }
            _ => {}
        }
    }
    expr
}

/// Tracks whether a scan is inside a `'string'` literal or a `"quoted"`
/// identifier. Doubled quotes close and reopen the span, which leaves the state
/// unchanged.
#[derive(Debug, Default)]
pub(crate) struct QuoteState {
    single: bool,
    double: bool,
}

impl QuoteState {
    /// Feed the next character. Returns `true` when `ch` sits outside any quoted
    /// span and may be treated as syntax.
    pub(crate) fn step(&mut self, ch: char) -> bool {
        match ch {
            '\'' if !self.double => {
                self.single = !self.single;
                false
            }
            '"' if !self.single => {
                self.double = !self.double;
                false
            }
            _ => !(self.single || self.double),
        }
    }
}

/// Count `?` markers that sit outside string literals and quoted identifiers.
pub(crate) fn count_markers(expr: &str) -> usize {
    let mut quotes = QuoteState::default();
    expr.chars()
        .filter(|&ch| quotes.step(ch) && ch == '?')
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparisons() {
        let age = col("age");
        let cases = [
            (age.eq(18), "age = ?"),
            (age.neq(20), "age != ?"),
            (age.gt(10), "age > ?"),
            (age.gte(15), "age >= ?"),
            (age.lt(50), "age < ?"),
            (age.lte(40), "age <= ?"),
        ];
        for (cond, expr) in cases {
            assert_eq!(cond.expr(), expr);
            assert_eq!(cond.args().len(), 1);
        }
        assert_eq!(age.eq(18).args(), [Value::I32(18)]);
    }

    #[test]
    fn null_checks_have_no_args() {
        assert_eq!(col("deleted_at").is_null().expr(), "deleted_at IS NULL");
        assert_eq!(col("deleted_at").is_not_null().expr(), "deleted_at IS NOT NULL");
        assert!(col("deleted_at").is_null().args().is_empty());
    }

    #[test]
    fn membership() {
        let c = col("id").in_list([1i64, 2, 3]);
        assert_eq!(c.expr(), "id IN (?, ?, ?)");
        assert_eq!(c.args(), [Value::I64(1), Value::I64(2), Value::I64(3)]);

        let c = col("status").not_in(["a", "b"]);
        assert_eq!(c.expr(), "status NOT IN (?, ?)");
        assert_eq!(c.args().len(), 2);
    }

    #[test]
    fn empty_membership_lists() {
        assert_eq!(col("id").in_list(Vec::<i64>::new()).expr(), "1=0");
        assert_eq!(col("id").not_in(Vec::<i64>::new()).expr(), "1=1");
    }

    #[test]
    fn patterns_and_ranges() {
        let c = col("name").like("%john%");
        assert_eq!(c.expr(), "name LIKE ?");
        assert_eq!(c.args(), [Value::Text("%john%".into())]);
        assert_eq!(col("name").not_like("%doe%").expr(), "name NOT LIKE ?");

        let c = col("age").between(10, 20);
        assert_eq!(c.expr(), "age BETWEEN ? AND ?");
        assert_eq!(c.args(), [Value::I32(10), Value::I32(20)]);
        assert_eq!(col("age").not_between(30, 40).expr(), "age NOT BETWEEN ? AND ?");
    }

    #[test]
    fn logical_groups() {
        let c1 = col("age").gt(18);
        let c2 = col("status").eq("active");
        let c3 = col("score").lt(100);

        let a = and([c1.clone(), c2.clone(), c3.clone()]);
        assert_eq!(a.expr(), "(age > ? AND status = ? AND score < ?)");
        assert_eq!(
            a.args(),
            [Value::I32(18), Value::Text("active".into()), Value::I32(100)]
        );

        let o = or([c1.clone(), and([c2, c3])]);
        assert_eq!(o.expr(), "(age > ? OR (status = ? AND score < ?))");
        assert_eq!(o.args().len(), 3);

        assert_eq!(not(c1).expr(), "NOT (age > ?)");
    }

    #[test]
    fn not_strips_exactly_one_pair() {
        let c = not(and([col("a").eq(1), col("b").eq(2)]));
        assert_eq!(c.expr(), "NOT (a = ? AND b = ?)");

        let twice = not(not(and([col("a").eq(1), col("b").eq(2)])));
        assert_eq!(twice.expr(), "NOT (NOT (a = ? AND b = ?))");

        let nested = Condition::new("((a = ?))", vec![Value::I32(1)]).unwrap();
        assert_eq!(not(nested).expr(), "NOT ((a = ?))");
    }

    #[test]
    fn not_keeps_unbalanced_outer_pair() {
        let c = Condition::new("(a = ?) OR (b = ?)", vec![1.into(), 2.into()]).unwrap();
        assert_eq!(not(c).expr(), "NOT ((a = ?) OR (b = ?))");
    }

    #[test]
    fn empty_groups() {
        assert_eq!(and(Vec::new()).expr(), "1=1");
        assert_eq!(or(Vec::new()).expr(), "1=0");
    }

    #[test]
    fn custom_condition_checks_arity() {
        assert!(Condition::new("a = ? AND b = ?", vec![1.into()]).is_err());
        let ok = Condition::new("note = '?' AND id = ?", vec![5.into()]).unwrap();
        assert_eq!(ok.args().len(), 1);
    }

    #[test]
    fn marker_counting_skips_literals() {
        assert_eq!(count_markers("a = ? AND b = '?' AND c = ?"), 2);
        assert_eq!(count_markers("x = 'it''s ?'"), 0);
        assert_eq!(count_markers("\"why?\" = ? AND 'say \"?' = ?"), 2);
    }

    #[test]
    fn quoted_identifier_markers_are_not_arguments() {
        let c = Condition::new("\"why?\" = ?", vec![1.into()]).unwrap();
        assert_eq!(c.args(), [Value::I32(1)]);
        assert_eq!(col("\"why?\"").eq(1).expr(), "\"why?\" = ?");
    }

    #[test]
    fn not_ignores_parens_in_quoted_identifiers() {
        assert_eq!(not(col("\"a)(b\"").eq(1)).expr(), "NOT (\"a)(b\" = ?)");
        assert_eq!(
            not(Condition::new("(\"x(\" = ?)", vec![1.into()]).unwrap()).expr(),
            "NOT (\"x(\" = ?)"
        );
    }
}
