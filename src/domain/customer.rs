//! Customer directory: village → ordered customer names.
//!
//! Two names are the same customer when they match after trimming and
//! lowercasing. A village never holds two equivalent names.

use std::fmt;

use serde::{
    de::{MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};

use crate::domain::common::same_key;
use crate::errors::{Result, SalesError};

/// Customers registered for one village, in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VillageCustomers {
    pub village: String,
    pub names: Vec<String>,
}

impl VillageCustomers {
    pub fn new(village: impl Into<String>) -> Self {
        Self {
            village: village.into(),
            names: Vec::new(),
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|existing| same_key(existing, name))
    }
}

/// Whole-loaded customer directory.
///
/// Serializes as a JSON object `{ "village": ["name", ...] }` with villages in
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerBook {
    villages: Vec<VillageCustomers>,
}

impl CustomerBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a book from `(village, names)` pairs, dropping empty and
    /// equivalent names (first occurrence wins).
    pub fn from_entries<I, V, N>(entries: I) -> Self
    where
        I: IntoIterator<Item = (V, Vec<N>)>,
        V: Into<String>,
        N: AsRef<str>,
    {
        let mut book = Self::new();
        for (village, names) in entries {
            let village = village.into();
            book.ensure_village(&village);
            for name in names {
                let _ = book.add(&village, name.as_ref());
            }
        }
        book
    }

    /// Merges several sources into one book; the first occurrence of an
    /// equivalent name is the one kept.
    pub fn merged<'a, I>(sources: I) -> Self
    where
        I: IntoIterator<Item = &'a CustomerBook>,
    {
        let mut book = Self::new();
        for source in sources {
            book.merge(source);
        }
        book
    }

    /// Appends every name from `other` not already present. Returns the number added.
    pub fn merge(&mut self, other: &CustomerBook) -> usize {
        let mut added = 0;
        for village in &other.villages {
            self.ensure_village(&village.village);
            for name in &village.names {
                if matches!(self.add(&village.village, name), Ok(true)) {
                    added += 1;
                }
            }
        }
        added
    }

    pub fn is_empty(&self) -> bool {
        self.villages.iter().all(|village| village.names.is_empty())
    }

    pub fn total_customers(&self) -> usize {
        self.villages.iter().map(|village| village.names.len()).sum()
    }

    pub fn villages(&self) -> impl Iterator<Item = &VillageCustomers> {
        self.villages.iter()
    }

    pub fn village_names(&self) -> Vec<&str> {
        self.villages
            .iter()
            .map(|village| village.village.as_str())
            .collect()
    }

    /// Customer names for `village`; empty when the village is unknown.
    pub fn names(&self, village: &str) -> &[String] {
        self.village(village)
            .map(|entry| entry.names.as_slice())
            .unwrap_or(&[])
    }

    /// Registers a village with no customers if it is not already present.
    pub fn ensure_village(&mut self, village: &str) {
        let village = village.trim();
        if self.village(village).is_none() {
            self.villages.push(VillageCustomers::new(village));
        }
    }

    pub fn exists(&self, village: &str, name: &str) -> bool {
        self.find(village, name).is_some()
    }

    /// Returns the stored display form of the entry equivalent to `name`.
    pub fn find(&self, village: &str, name: &str) -> Option<&str> {
        let entry = self.village(village)?;
        entry.position(name).map(|idx| entry.names[idx].as_str())
    }

    /// Adds a trimmed name. `Ok(false)` means an equivalent entry already exists.
    pub fn add(&mut self, village: &str, name: &str) -> Result<bool> {
        let trimmed = validate_name(name)?;
        if self.exists(village, trimmed) {
            return Ok(false);
        }
        self.ensure_village(village);
        if let Some(entry) = self.village_mut(village) {
            entry.names.push(trimmed.to_string());
        }
        Ok(true)
    }

    /// Changes the display name of an existing entry in place.
    ///
    /// `Ok(false)` when `old_name` has no equivalent entry. Renaming onto a
    /// different existing entry is rejected so the village stays duplicate free.
    pub fn rename(&mut self, village: &str, old_name: &str, new_name: &str) -> Result<bool> {
        let trimmed = validate_name(new_name)?;
        let Some(entry) = self.village_mut(village) else {
            return Ok(false);
        };
        let Some(index) = entry.position(old_name) else {
            return Ok(false);
        };
        if let Some(clash) = entry.position(trimmed) {
            if clash != index {
                return Err(SalesError::invalid(format!(
                    "customer `{}` already exists in {}",
                    entry.names[clash], entry.village
                )));
            }
        }
        entry.names[index] = trimmed.to_string();
        Ok(true)
    }

    /// Removes the first equivalent entry. Returns whether anything was removed.
    pub fn remove(&mut self, village: &str, name: &str) -> bool {
        let Some(entry) = self.village_mut(village) else {
            return false;
        };
        match entry.position(name) {
            Some(index) => {
                entry.names.remove(index);
                true
            }
            None => false,
        }
    }

    fn village(&self, village: &str) -> Option<&VillageCustomers> {
        let village = village.trim();
        self.villages.iter().find(|entry| entry.village == village)
    }

    fn village_mut(&mut self, village: &str) -> Option<&mut VillageCustomers> {
        let village = village.trim();
        self.villages.iter_mut().find(|entry| entry.village == village)
    }
}

/// Trims a customer name, rejecting names that are empty after trimming.
pub fn validate_name(name: &str) -> Result<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        Err(SalesError::invalid("customer name must not be empty"))
    } else {
        Ok(trimmed)
    }
}

impl Serialize for CustomerBook {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.villages.len()))?;
        for entry in &self.villages {
            map.serialize_entry(&entry.village, &entry.names)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CustomerBook {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(CustomerBookVisitor)
    }
}

struct CustomerBookVisitor;

impl<'de> Visitor<'de> for CustomerBookVisitor {
    type Value = CustomerBook;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of village names to customer name lists")
    }

    fn visit_map<A>(self, mut access: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries: Vec<(String, Vec<String>)> = Vec::new();
        while let Some((village, names)) = access.next_entry::<String, Vec<String>>()? {
            entries.push((village, names));
        }
        Ok(CustomerBook::from_entries(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> CustomerBook {
        CustomerBook::from_entries([
            ("vairgwadi", vec![" suresh patil ", "Rajesh Kumar"]),
            ("Bardwadi", vec!["Sanjay Jadhav"]),
        ])
    }

    #[test]
    fn add_skips_equivalent_names() {
        let mut book = book();
        assert_eq!(book.add("vairgwadi", "Suresh Patil"), Ok(false));
        assert_eq!(book.add("vairgwadi", "SURESH PATIL  "), Ok(false));
        assert_eq!(book.names("vairgwadi").len(), 2);
        assert_eq!(book.find("vairgwadi", "suresh patil"), Some("suresh patil"));
    }

    #[test]
    fn add_trims_and_creates_village() {
        let mut book = CustomerBook::new();
        assert_eq!(book.add("Harali KH", "  Balaji Naik "), Ok(true));
        assert_eq!(book.names("Harali KH"), ["Balaji Naik".to_string()]);
    }

    #[test]
    fn add_rejects_blank_name() {
        let mut book = book();
        assert!(matches!(
            book.add("vairgwadi", "   "),
            Err(SalesError::InvalidInput(_))
        ));
        assert_eq!(book.total_customers(), 3);
    }

    #[test]
    fn rename_changes_display_name_in_place() {
        let mut book = book();
        assert_eq!(book.rename("vairgwadi", "RAJESH kumar", "Rajesh K."), Ok(true));
        assert_eq!(book.names("vairgwadi")[1], "Rajesh K.");
        assert_eq!(book.rename("vairgwadi", "suresh patil", "Suresh Patil"), Ok(true));
        assert_eq!(book.names("vairgwadi")[0], "Suresh Patil");
    }

    #[test]
    fn rename_refuses_to_collide_with_other_entry() {
        let mut book = book();
        let err = book
            .rename("vairgwadi", "Rajesh Kumar", " Suresh patil")
            .unwrap_err();
        assert!(matches!(err, SalesError::InvalidInput(_)));
        assert_eq!(book.names("vairgwadi")[1], "Rajesh Kumar");
    }

    #[test]
    fn rename_and_remove_report_missing_entries() {
        let mut book = book();
        assert_eq!(book.rename("vairgwadi", "Nobody", "Somebody"), Ok(false));
        assert_eq!(book.rename("Unknown", "Nobody", "Somebody"), Ok(false));
        assert!(!book.remove("Bardwadi", "Nobody"));
        assert!(book.remove("Bardwadi", " sanjay JADHAV"));
        assert!(book.names("Bardwadi").is_empty());
    }

    #[test]
    fn merged_keeps_first_occurrence() {
        let seed = CustomerBook::from_entries([("vairgwadi", vec!["Suresh Patil"])]);
        let stored = CustomerBook::from_entries([("vairgwadi", vec!["suresh patil", "Anil"])]);
        let merged = CustomerBook::merged([&seed, &stored]);
        assert_eq!(
            merged.names("vairgwadi"),
            ["Suresh Patil".to_string(), "Anil".to_string()]
        );
    }

    #[test]
    fn json_shape_preserves_village_order() {
        let json = r#"{"Bardwadi":["Ajay"],"vairgwadi":["Anil","anil "],"Other":[]}"#;
        let book: CustomerBook = serde_json::from_str(json).unwrap();
        assert_eq!(book.village_names(), vec!["Bardwadi", "vairgwadi", "Other"]);
        assert_eq!(book.names("vairgwadi").len(), 1);
        let out = serde_json::to_string(&book).unwrap();
        assert_eq!(out, r#"{"Bardwadi":["Ajay"],"vairgwadi":["Anil"],"Other":[]}"#);
    }
}
