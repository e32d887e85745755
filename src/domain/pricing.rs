//! Package pricing entries and the ordered table that holds them.

use serde::{Deserialize, Serialize};

use crate::domain::common::Displayable;

/// Unit rate for a single package label, in whole currency units.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PackageRate {
    pub package: String,
    pub rate: u64,
}

impl PackageRate {
    pub fn new(package: impl Into<String>, rate: u64) -> Self {
        Self {
            package: package.into(),
            rate,
        }
    }
}

impl Displayable for PackageRate {
    fn display_label(&self) -> String {
        format!("{} @ {}", self.package, self.rate)
    }
}

/// Ordered mapping from package label to rate. Labels are unique; insertion
/// order is kept for display.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct PricingTable {
    entries: Vec<PackageRate>,
}

impl PricingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from entries; a repeated label overwrites the earlier rate
    /// but keeps the earlier position.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = PackageRate>,
    {
        let mut table = Self::new();
        for entry in entries {
            table.upsert(&entry.package, entry.rate);
        }
        table
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, package: &str) -> Option<u64> {
        let label = package.trim();
        self.entries
            .iter()
            .find(|entry| entry.package == label)
            .map(|entry| entry.rate)
    }

    pub fn contains(&self, package: &str) -> bool {
        self.get(package).is_some()
    }

    /// Inserts or replaces the rate for `package`, returning the previous rate.
    pub fn upsert(&mut self, package: &str, rate: u64) -> Option<u64> {
        let label = package.trim();
        match self.entries.iter_mut().find(|entry| entry.package == label) {
            Some(entry) => Some(std::mem::replace(&mut entry.rate, rate)),
            None => {
                self.entries.push(PackageRate::new(label, rate));
                None
            }
        }
    }

    /// Inserts the rate only when the label is absent. Returns whether it was inserted.
    pub fn insert_if_absent(&mut self, package: &str, rate: u64) -> bool {
        if self.contains(package) {
            return false;
        }
        self.upsert(package, rate);
        true
    }

    pub fn labels(&self) -> Vec<&str> {
        self.entries
            .iter()
            .map(|entry| entry.package.as_str())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PackageRate> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[PackageRate] {
        &self.entries
    }
}
