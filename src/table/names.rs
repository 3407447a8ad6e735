// src/table/names.rs

use std::collections::HashSet;

/// Hands out unique column names in order.
///
/// A repeated name gets `_1`, `_2`, … (skipping suffixes already taken);
/// an empty name becomes `column_<position>`.
#[derive(Debug, Default)]
pub struct ColumnNamer {
    taken: HashSet<String>,
    position: usize,
}

impl ColumnNamer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&mut self, raw: &str) -> String {
        let pos = self.position;
        self.position += 1;

        let base = if raw.is_empty() {
            format!("column_{}", pos)
        } else {
            raw.to_string()
        };

        let mut name = base.clone();
        let mut n = 1;
        while self.taken.contains(&name) {
            name = format!("{}_{}", base, n);
            n += 1;
        }
        self.taken.insert(name.clone());
        name
    }
}
