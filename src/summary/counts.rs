// src/summary/counts.rs

use std::collections::HashMap;

use super::column;
use crate::error::PipelineError;
use crate::table::{Table, Value};

/// Hashable identity of a scalar cell. Floats compare by bit pattern.
#[derive(Hash, PartialEq, Eq)]
enum Key<'a> {
    Bool(bool),
    Int(i64),
    Float(u64),
    Text(&'a str),
    Other(String),
}

fn key(v: &Value) -> Option<Key<'_>> {
    Some(match v {
        Value::Null => return None,
        Value::Bool(b) => Key::Bool(*b),
        Value::Int(i) => Key::Int(*i),
        Value::Float(f) => Key::Float(f.to_bits()),
        Value::Text(s) => Key::Text(s),
        Value::Object(_) => Key::Other(v.to_string()),
    })
}

/// Distinct non-null values of `column` with their counts, most frequent
/// first; ties keep first-seen order.
pub fn value_counts(table: &Table, column_name: &str) -> Result<Vec<(Value, usize)>, PipelineError> {
    let mut index: HashMap<Key<'_>, usize> = HashMap::new();
    let mut counts: Vec<(Value, usize)> = Vec::new();

    for v in column(table, column_name)? {
        let Some(k) = key(v) else { continue };
        match index.get(&k) {
            Some(&ix) => counts[ix].1 += 1,
            None => {
                index.insert(k, counts.len());
                counts.push((v.clone(), 1));
            }
        }
    }

    // stable: equal counts stay in first-seen order
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(counts)
}
