use std::cmp::Ordering;

use anyhow::anyhow;

use crate::overrides::types::{ModOverride, OverrideKind};

/// Field to order query results by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    BaseClass,
    NewClass,
    Kind,
}

impl std::str::FromStr for SortField {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "base" | "base_class" => Ok(SortField::BaseClass),
            "new" | "new_class" => Ok(SortField::NewClass),
            "kind" => Ok(SortField::Kind),
            other => Err(anyhow!("Unknown sort field: {}", other)),
        }
    }
}

/// Options for filtering an override snapshot
#[derive(Debug, Clone, Default)]
pub struct OverrideQuery {
    /// Keep only overrides of this kind
    pub kind: Option<OverrideKind>,

    /// Keep only overrides of this base class (case-insensitive)
    pub base_class: Option<String>,

    /// Keep only overrides declared by this class (case-insensitive)
    pub new_class: Option<String>,

    /// Sort results by this field, case-insensitively
    pub sort_by: Option<SortField>,

    /// Sort in descending order
    pub descending: bool,

    /// Maximum number of results to return
    pub limit: Option<usize>,
}

impl OverrideQuery {
    pub fn matches(&self, record: &ModOverride) -> bool {
        if self.kind.is_some_and(|kind| kind != record.kind) {
            return false;
        }
        if let Some(base_class) = &self.base_class {
            if !record.targets(base_class) {
                return false;
            }
        }
        if let Some(new_class) = &self.new_class {
            if !record.new_class.eq_ignore_ascii_case(new_class.trim()) {
                return false;
            }
        }
        true
    }

    /// Apply the query to a snapshot
    pub fn apply<'a>(&self, overrides: &'a [ModOverride]) -> Vec<&'a ModOverride> {
        let mut results: Vec<&ModOverride> = overrides.iter()
            .filter(|record| self.matches(record))
            .collect();

        if let Some(sort_by) = self.sort_by {
            results.sort_by(|a, b| {
                let ordering = compare(a, b, sort_by);
                if self.descending { ordering.reverse() } else { ordering }
            });
        }

        if let Some(limit) = self.limit {
            results.truncate(limit);
        }

        results
    }
}

fn compare(a: &ModOverride, b: &ModOverride, field: SortField) -> Ordering {
    match field {
        SortField::BaseClass => a.base_class_key().cmp(&b.base_class_key()),
        SortField::NewClass => a.new_class_key().cmp(&b.new_class_key()),
        SortField::Kind => a.kind.cmp(&b.kind),
    }
}
