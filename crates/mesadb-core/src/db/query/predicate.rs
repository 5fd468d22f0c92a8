use crate::{
    db::record::Record,
    value::{Value, range_cmp, value_eq},
};
use std::cmp::Ordering;

///
/// CompareOp
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CompareOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    fn test(self, left: &Value, right: &Value) -> bool {
        match self {
            Self::Eq => value_eq(left, right),
            Self::Neq => !value_eq(left, right),
            Self::Gt => range_cmp(left, right) == Some(Ordering::Greater),
            Self::Gte => matches!(
                range_cmp(left, right),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Self::Lt => range_cmp(left, right) == Some(Ordering::Less),
            Self::Lte => matches!(
                range_cmp(left, right),
                Some(Ordering::Less | Ordering::Equal)
            ),
        }
    }
}

///
/// Predicate
///
/// One filter term. A term naming a column the record does not have never
/// matches; that is not an error.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    Compare {
        column: String,
        op: CompareOp,
        value: Value,
    },
    In {
        column: String,
        values: Vec<Value>,
    },
    IsNull {
        column: String,
    },
}

impl Predicate {
    #[must_use]
    pub fn column(&self) -> &str {
        match self {
            Self::Compare { column, .. } | Self::In { column, .. } | Self::IsNull { column } => {
                column
            }
        }
    }

    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        let Some(field) = record.get(self.column()) else {
            return false;
        };

        match self {
            Self::Compare { op, value, .. } => op.test(field, value),
            Self::In { values, .. } => values.iter().any(|v| value_eq(field, v)),
            Self::IsNull { .. } => field.is_null(),
        }
    }

    /// The equality value, when this term is a plain `eq`.
    #[must_use]
    pub const fn as_eq(&self) -> Option<(&String, &Value)> {
        match self {
            Self::Compare {
                column,
                op: CompareOp::Eq,
                value,
            } => Some((column, value)),
            _ => None,
        }
    }
}

///
/// Filter
/// Conjunction of predicates; the empty filter matches every record.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter(Vec<Predicate>);

impl Filter {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, predicate: Predicate) {
        self.0.push(predicate);
    }

    #[must_use]
    pub fn predicates(&self) -> &[Predicate] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        self.0.iter().all(|p| p.matches(record))
    }
}

impl From<Vec<Predicate>> for Filter {
    fn from(predicates: Vec<Predicate>) -> Self {
        Self(predicates)
    }
}

///
/// FilterExt
///
/// The chainable predicate vocabulary shared by every builder that takes
/// a filter (select, single, update, delete).
///

pub trait FilterExt: Sized {
    #[doc(hidden)]
    fn filter_mut(&mut self) -> &mut Filter;

    /// Append an arbitrary predicate.
    #[must_use]
    fn filter(mut self, predicate: Predicate) -> Self {
        self.filter_mut().push(predicate);
        self
    }

    #[must_use]
    fn eq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.compare(column, CompareOp::Eq, value)
    }

    #[must_use]
    fn neq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.compare(column, CompareOp::Neq, value)
    }

    #[must_use]
    fn gt(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.compare(column, CompareOp::Gt, value)
    }

    #[must_use]
    fn gte(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.compare(column, CompareOp::Gte, value)
    }

    #[must_use]
    fn lt(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.compare(column, CompareOp::Lt, value)
    }

    #[must_use]
    fn lte(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.compare(column, CompareOp::Lte, value)
    }

    /// Set membership; an empty set matches nothing.
    #[must_use]
    fn in_<I, V>(self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.filter(Predicate::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    #[must_use]
    fn is_null(self, column: impl Into<String>) -> Self {
        self.filter(Predicate::IsNull {
            column: column.into(),
        })
    }

    #[doc(hidden)]
    #[must_use]
    fn compare(self, column: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        self.filter(Predicate::Compare {
            column: column.into(),
            op,
            value: value.into(),
        })
    }
}

///
/// TESTS
///
