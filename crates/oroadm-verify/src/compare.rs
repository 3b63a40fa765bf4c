//! Recursive "is a subset of" comparison over JSON values.
//!
//! Used to assert that an observed configuration contains at least an
//! expected partial configuration. Extra keys in the observed value are
//! ignored; sequences are compared as multisets.

use std::fmt;

use serde_json::Value;

/// Why a comparison failed.
#[derive(Debug, Clone, PartialEq)]
pub enum MismatchReason {
    /// The key is declared in the expected value but absent.
    MissingKey,
    /// Both sides are sequences but not equal as multisets.
    SequenceDiffers { expected: Value, actual: Value },
    /// Scalar (or shape) mismatch.
    ValueDiffers { expected: Value, actual: Value },
}

/// First mismatch found by [`find_mismatch`].
#[derive(Debug, Clone, PartialEq)]
pub struct Mismatch {
    /// Slash-separated path of the offending key, `/` for the root.
    pub path: String,
    pub reason: MismatchReason,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            MismatchReason::MissingKey => write!(f, "{}: missing", self.path),
            MismatchReason::SequenceDiffers { expected, actual } => {
                write!(f, "{}: expected sequence {} got {}", self.path, expected, actual)
            }
            MismatchReason::ValueDiffers { expected, actual } => {
                write!(f, "{}: expected {} got {}", self.path, expected, actual)
            }
        }
    }
}

/// Returns true if everything declared in `expected` is present in `actual`.
pub fn is_subset(expected: &Value, actual: &Value) -> bool {
    find_mismatch(expected, actual).is_none()
}

/// Returns the first place where `actual` does not contain `expected`.
pub fn find_mismatch(expected: &Value, actual: &Value) -> Option<Mismatch> {
    let mut path = Vec::new();
    mismatch_at(expected, actual, &mut path)
}

fn mismatch_at<'e>(expected: &'e Value, actual: &Value, path: &mut Vec<&'e str>) -> Option<Mismatch> {
    match expected {
        Value::Object(fields) => {
            for (key, expected_value) in fields {
                path.push(key);
                let found = match actual.get(key) {
                    None => Some(mismatch(path, MismatchReason::MissingKey)),
                    Some(actual_value) => compare_values(expected_value, actual_value, path),
                };
                path.pop();
                if found.is_some() {
                    return found;
                }
            }
            None
        }
        _ => compare_values(expected, actual, path),
    }
}

fn compare_values<'e>(
    expected: &'e Value,
    actual: &Value,
    path: &mut Vec<&'e str>,
) -> Option<Mismatch> {
    match (expected, actual) {
        (Value::Object(_), Value::Object(_)) => mismatch_at(expected, actual, path),
        (Value::Array(e), Value::Array(a)) => {
            if multiset_eq(e, a) {
                None
            } else {
                Some(mismatch(
                    path,
                    MismatchReason::SequenceDiffers {
                        expected: expected.clone(),
                        actual: actual.clone(),
                    },
                ))
            }
        }
        _ if expected == actual => None,
        _ => Some(mismatch(
            path,
            MismatchReason::ValueDiffers {
                expected: expected.clone(),
                actual: actual.clone(),
            },
        )),
    }
}

/// Order-independent equality with multiplicity.
fn multiset_eq(expected: &[Value], actual: &[Value]) -> bool {
    if expected.len() != actual.len() {
        return false;
    }
    let mut used = vec![false; actual.len()];
    expected.iter().all(|item| {
        let slot = actual
            .iter()
            .enumerate()
            .position(|(i, candidate)| !used[i] && candidate == item);
        match slot {
            Some(i) => {
                used[i] = true;
                true
            }
            None => false,
        }
    })
}

fn mismatch(path: &[&str], reason: MismatchReason) -> Mismatch {
    Mismatch {
        path: format!("/{}", path.join("/")),
        reason,
    }
}
