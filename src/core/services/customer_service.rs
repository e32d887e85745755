use tracing::info;

use crate::domain::customer::validate_name;
use crate::domain::CustomerBook;
use crate::errors::SalesError;
use crate::storage::RecordStore;

use super::ServiceResult;

pub struct CustomerService;

impl CustomerService {
    /// The store-backed directory, deduplicated with the customer rule and
    /// with every `villages` entry present (possibly empty).
    pub fn get_all(store: &dyn RecordStore, villages: &[String]) -> ServiceResult<CustomerBook> {
        let stored = store.list_customers()?;
        let mut book = CustomerBook::new();
        for village in villages {
            book.ensure_village(village);
        }
        book.merge(&stored);
        Ok(book)
    }

    pub fn exists(book: &CustomerBook, village: &str, name: &str) -> bool {
        book.exists(village, name)
    }

    /// Adds a customer. `Ok(false)` when an equivalent name already exists.
    pub fn add(store: &dyn RecordStore, village: &str, name: &str) -> ServiceResult<bool> {
        let village = require_village(village)?;
        let name = validate_name(name)?;
        let added = store.upsert_customer(village, name)?;
        if added {
            info!(village, name, "customer added");
        }
        Ok(added)
    }

    pub fn rename(
        store: &dyn RecordStore,
        village: &str,
        old_name: &str,
        new_name: &str,
    ) -> ServiceResult<bool> {
        let village = require_village(village)?;
        let new_name = validate_name(new_name)?;
        let renamed = store.rename_customer(village, old_name, new_name)?;
        if renamed {
            info!(village, old = old_name.trim(), new = new_name, "customer renamed");
        }
        Ok(renamed)
    }

    pub fn remove(store: &dyn RecordStore, village: &str, name: &str) -> ServiceResult<bool> {
        let village = require_village(village)?;
        let removed = store.delete_customer(village, name)?;
        if removed {
            info!(village, name = name.trim(), "customer removed");
        }
        Ok(removed)
    }

    /// Suggestions for a partially typed name.
    ///
    /// A blank term lists the whole village. Otherwise names containing the
    /// term (case-insensitive) are returned; with no match the trimmed term
    /// itself is the single suggestion.
    pub fn search(book: &CustomerBook, village: &str, term: &str) -> Vec<String> {
        let names = book.names(village);
        let term = term.trim();
        if term.is_empty() {
            return names.to_vec();
        }
        let needle = term.to_lowercase();
        let matches: Vec<String> = names
            .iter()
            .filter(|name| name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        if matches.is_empty() {
            vec![term.to_string()]
        } else {
            matches
        }
    }
}

fn require_village(village: &str) -> ServiceResult<&str> {
    let village = village.trim();
    if village.is_empty() {
        Err(SalesError::invalid("village must not be empty"))
    } else {
        Ok(village)
    }
}
