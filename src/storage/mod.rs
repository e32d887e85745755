//! Record store contract and the backends that implement it.

pub mod import;
pub mod json_backend;
pub mod memory;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{CustomerBook, Identifiable, PricingTable, SaleDraft, SaleRecord};
use crate::errors::Result;

pub use json_backend::JsonStore;
pub use memory::InMemoryStore;

/// Durable storage for sales, the customer directory, and the pricing directory.
///
/// Every backend assigns sale ids and timestamps itself. `revision` increases
/// after each successful mutation so callers can detect stale caches.
pub trait RecordStore: Send + Sync {
    /// Short backend label used in logs and status output.
    fn backend_name(&self) -> &'static str;

    /// Verifies the backend is reachable.
    fn check(&self) -> Result<()>;

    fn revision(&self) -> u64;

    /// Sales in insertion order.
    fn list_sales(&self) -> Result<Vec<SaleRecord>>;
    fn get_sale(&self, id: Uuid) -> Result<Option<SaleRecord>>;
    fn insert_sale(&self, sale: &SaleDraft) -> Result<Uuid>;
    /// Returns `false` when no record has `id`.
    fn update_sale(&self, id: Uuid, sale: &SaleDraft) -> Result<bool>;
    /// Returns `false` when no record has `id`.
    fn delete_sale(&self, id: Uuid) -> Result<bool>;

    fn list_customers(&self) -> Result<CustomerBook>;
    /// Inserts the customer unless an equivalent name exists (`Ok(false)`).
    fn upsert_customer(&self, village: &str, name: &str) -> Result<bool>;
    fn rename_customer(&self, village: &str, old_name: &str, new_name: &str) -> Result<bool>;
    fn delete_customer(&self, village: &str, name: &str) -> Result<bool>;

    fn list_pricing(&self) -> Result<PricingTable>;
    /// Sets the rate for `package`, returning the previous rate.
    fn upsert_pricing(&self, package: &str, rate: u64) -> Result<Option<u64>>;

    /// Inserts the rate only when `package` has none yet.
    fn insert_pricing_if_absent(&self, package: &str, rate: u64) -> Result<bool> {
        if self.list_pricing()?.contains(package) {
            return Ok(false);
        }
        self.upsert_pricing(package, rate)?;
        Ok(true)
    }
}

/// In-memory image of every collection, shared by the backends.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreData {
    pub sales: Vec<SaleRecord>,
    pub customers: CustomerBook,
    pub pricing: PricingTable,
}

impl StoreData {
    pub fn sale(&self, id: Uuid) -> Option<&SaleRecord> {
        position_by_id(&self.sales, id).map(|idx| &self.sales[idx])
    }

    pub fn insert_sale(&mut self, sale: &SaleDraft, now: DateTime<Utc>) -> Uuid {
        let id = Uuid::new_v4();
        self.sales.push(SaleRecord::new(id, sale.clone(), now));
        id
    }

    pub fn update_sale(&mut self, id: Uuid, sale: &SaleDraft, now: DateTime<Utc>) -> bool {
        match position_by_id(&self.sales, id) {
            Some(idx) => {
                self.sales[idx].replace(sale.clone(), now);
                true
            }
            None => false,
        }
    }

    pub fn delete_sale(&mut self, id: Uuid) -> bool {
        match position_by_id(&self.sales, id) {
            Some(idx) => {
                self.sales.remove(idx);
                true
            }
            None => false,
        }
    }
}

fn position_by_id<T: Identifiable>(items: &[T], id: Uuid) -> Option<usize> {
    items.iter().position(|item| item.id() == id)
}
