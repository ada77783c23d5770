/// Query constraints (filter, order, limit)
///
/// Callers compose constraints; the accessor never inspects them and hands the
/// resulting `Query` to the driver verbatim.

use crate::path::CollectionRef;
use crate::types::{Document, Value};
use std::cmp::Ordering;

/// Comparison used by a `Where` constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    ArrayContains,
    In,
    NotIn,
}

impl FilterOp {
    /// Evaluate `field_value <op> operand`
    pub fn matches(&self, field_value: &Value, operand: &Value) -> bool {
        let ord = || field_value.compare(operand);
        match self {
            FilterOp::Equal => ord() == Ordering::Equal,
            FilterOp::NotEqual => ord() != Ordering::Equal,
            FilterOp::LessThan => same_kind(field_value, operand) && ord() == Ordering::Less,
            FilterOp::LessThanOrEqual => same_kind(field_value, operand) && ord() != Ordering::Greater,
            FilterOp::GreaterThan => same_kind(field_value, operand) && ord() == Ordering::Greater,
            FilterOp::GreaterThanOrEqual => same_kind(field_value, operand) && ord() != Ordering::Less,
            FilterOp::ArrayContains => field_value
                .as_array()
                .map(|items| items.iter().any(|v| v.compare(operand) == Ordering::Equal))
                .unwrap_or(false),
            FilterOp::In => operand
                .as_array()
                .map(|items| items.iter().any(|v| field_value.compare(v) == Ordering::Equal))
                .unwrap_or(false),
            FilterOp::NotIn => operand
                .as_array()
                .map(|items| items.iter().all(|v| field_value.compare(v) != Ordering::Equal))
                .unwrap_or(false),
        }
    }
}

// Range filters only match values of the operand's type
fn same_kind(a: &Value, b: &Value) -> bool {
    let numeric = |v: &Value| matches!(v, Value::Integer(_) | Value::Double(_));
    (numeric(a) && numeric(b)) || std::mem::discriminant(a) == std::mem::discriminant(b)
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

/// A single composable query directive
#[derive(Debug, Clone, PartialEq)]
pub enum QueryConstraint {
    Where {
        field: String,
        op: FilterOp,
        value: Value,
    },
    OrderBy {
        field: String,
        direction: Direction,
    },
    Limit(usize),
    LimitToLast(usize),
}

/// Filter on a (dotted) field path
pub fn where_field(field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> QueryConstraint {
    QueryConstraint::Where {
        field: field.into(),
        op,
        value: value.into(),
    }
}

pub fn order_by(field: impl Into<String>, direction: Direction) -> QueryConstraint {
    QueryConstraint::OrderBy {
        field: field.into(),
        direction,
    }
}

pub fn limit(n: usize) -> QueryConstraint {
    QueryConstraint::Limit(n)
}

pub fn limit_to_last(n: usize) -> QueryConstraint {
    QueryConstraint::LimitToLast(n)
}

/// A collection plus its constraints
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    collection: CollectionRef,
    constraints: Vec<QueryConstraint>,
}

impl Query {
    pub fn new(collection: CollectionRef, constraints: Vec<QueryConstraint>) -> Self {
        Self {
            collection,
            constraints,
        }
    }

    pub fn collection(&self) -> &CollectionRef {
        &self.collection
    }

    pub fn constraints(&self) -> &[QueryConstraint] {
        &self.constraints
    }

    /// Apply the constraints to `(id, document)` pairs already ordered by id.
    ///
    /// Filters run first, then ordering (stable, so ties keep id order), then
    /// limits. Documents lacking an order-by field are excluded.
    pub fn apply<'a>(&self, docs: Vec<(&'a str, &'a Document)>) -> Vec<(&'a str, &'a Document)> {
        let mut docs: Vec<_> = docs
            .into_iter()
            .filter(|(_, doc)| self.matches(doc))
            .collect();

        let orderings: Vec<(&str, Direction)> = self
            .constraints
            .iter()
            .filter_map(|c| match c {
                QueryConstraint::OrderBy { field, direction } => Some((field.as_str(), *direction)),
                _ => None,
            })
            .collect();

        if !orderings.is_empty() {
            docs.retain(|(_, doc)| orderings.iter().all(|(field, _)| doc.get_path(field).is_some()));
            docs.sort_by(|(_, a), (_, b)| {
                orderings
                    .iter()
                    .map(|(field, direction)| {
                        let ord = match (a.get_path(field), b.get_path(field)) {
                            (Some(x), Some(y)) => x.compare(y),
                            _ => Ordering::Equal,
                        };
                        match direction {
                            Direction::Ascending => ord,
                            Direction::Descending => ord.reverse(),
                        }
                    })
                    .find(|ord| *ord != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            });
        }

        // Only the last limit directive counts
        let last_limit = self
            .constraints
            .iter()
            .rev()
            .find(|c| matches!(c, QueryConstraint::Limit(_) | QueryConstraint::LimitToLast(_)));
        match last_limit {
            Some(QueryConstraint::Limit(n)) => docs.truncate(*n),
            Some(QueryConstraint::LimitToLast(n)) => {
                let skip = docs.len().saturating_sub(*n);
                docs.drain(..skip);
            }
            _ => {}
        }

        docs
    }

    fn matches(&self, doc: &Document) -> bool {
        self.constraints.iter().all(|c| match c {
            QueryConstraint::Where { field, op, value } => doc
                .get_path(field)
                .map(|field_value| op.matches(field_value, value))
                .unwrap_or(false),
            _ => true,
        })
    }
}
