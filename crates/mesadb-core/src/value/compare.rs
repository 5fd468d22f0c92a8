use crate::value::Value;
use std::cmp::Ordering;

// 2^63 as f64; floats at or above this are outside the i64 range.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// Predicate equality.
///
/// Same-variant values compare structurally; an `Int` and a `Float` are
/// equal only when they denote exactly the same number. Every other
/// cross-variant pairing is unequal.
#[must_use]
pub fn value_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Int(i), Value::Float(f)) | (Value::Float(f), Value::Int(i)) => int_float_eq(*i, *f),
        (Value::List(a), Value::List(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(a, b)| value_eq(a, b))
        }
        (Value::Map(a), Value::Map(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, v)| b.get(k).is_some_and(|other| value_eq(v, other)))
        }
        _ => left == right,
    }
}

/// Comparator for range predicates (`gt`, `gte`, `lt`, `lte`).
///
/// Returns `None` when the pair is not orderable; such a predicate
/// simply does not match.
#[must_use]
pub fn range_cmp(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
        (Value::Int(a), Value::Float(b)) => int_float_cmp(*a, *b),
        (Value::Float(a), Value::Int(b)) => int_float_cmp(*b, *a).map(Ordering::reverse),
        (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Total canonical comparator used by `order` directives.
///
/// Ordering rules:
/// 1. Canonical variant rank (null < bool < number < text < list < map)
/// 2. Variant-specific comparison for same-ranked values
#[must_use]
pub fn canonical_cmp(left: &Value, right: &Value) -> Ordering {
    let rank = left.canonical_rank().cmp(&right.canonical_rank());
    if rank != Ordering::Equal {
        return rank;
    }

    canonical_cmp_same_rank(left, right)
}

fn canonical_cmp_same_rank(left: &Value, right: &Value) -> Ordering {
    #[allow(clippy::match_same_arms)]
    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        (Value::Float(a), Value::Float(b)) => a.partial_cmp(b).unwrap_or_else(|| a.total_cmp(b)),
        (Value::Int(a), Value::Float(b)) => canonical_int_float_cmp(*a, *b),
        (Value::Float(a), Value::Int(b)) => canonical_int_float_cmp(*b, *a).reverse(),
        (Value::Text(a), Value::Text(b)) => a.cmp(b),
        (Value::List(a), Value::List(b)) => canonical_cmp_list(a, b),
        (Value::Map(a), Value::Map(b)) => {
            for ((left_key, left_value), (right_key, right_value)) in a.iter().zip(b.iter()) {
                let cmp = left_key
                    .cmp(right_key)
                    .then_with(|| canonical_cmp(left_value, right_value));
                if cmp != Ordering::Equal {
                    return cmp;
                }
            }
            a.len().cmp(&b.len())
        }
        (Value::Null, Value::Null) => Ordering::Equal,
        _ => Ordering::Equal,
    }
}

fn canonical_cmp_list(left: &[Value], right: &[Value]) -> Ordering {
    for (left, right) in left.iter().zip(right.iter()) {
        let cmp = canonical_cmp(left, right);
        if cmp != Ordering::Equal {
            return cmp;
        }
    }

    left.len().cmp(&right.len())
}

/// Exact integral view of a float, if it has one inside the i64 range.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn float_as_exact_int(f: f64) -> Option<i64> {
    if f.fract() == 0.0 && (-I64_BOUND..I64_BOUND).contains(&f) {
        Some(f as i64)
    } else {
        None
    }
}

fn int_float_eq(i: i64, f: f64) -> bool {
    float_as_exact_int(f) == Some(i)
}

// Exact: no rounding of the integer side. `None` only for NaN.
#[allow(clippy::cast_possible_truncation)]
fn int_float_cmp(i: i64, f: f64) -> Option<Ordering> {
    if f.is_nan() {
        return None;
    }
    if f >= I64_BOUND {
        return Some(Ordering::Less);
    }
    if f < -I64_BOUND {
        return Some(Ordering::Greater);
    }

    let whole = f.trunc() as i64;
    Some(i.cmp(&whole).then_with(|| {
        let fract = f.fract();
        if fract > 0.0 {
            Ordering::Less
        } else if fract < 0.0 {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }))
}

// NaN sits where `total_cmp` puts it: above every number when positive,
// below when negative.
fn canonical_int_float_cmp(i: i64, f: f64) -> Ordering {
    int_float_cmp(i, f).unwrap_or(if f.is_sign_negative() {
        Ordering::Greater
    } else {
        Ordering::Less
    })
}
