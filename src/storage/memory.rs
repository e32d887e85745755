use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

use uuid::Uuid;

use crate::core::time::{Clock, SystemClock};
use crate::domain::{CustomerBook, PricingTable, SaleDraft, SaleRecord};
use crate::errors::{Result, SalesError};

use super::{RecordStore, StoreData};

/// Process-local record store. Contents vanish with the process.
pub struct InMemoryStore {
    data: RwLock<StoreData>,
    clock: Arc<dyn Clock>,
    revision: AtomicU64,
    offline: AtomicBool,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            data: RwLock::new(StoreData::default()),
            clock,
            revision: AtomicU64::new(0),
            offline: AtomicBool::new(false),
        }
    }

    /// Simulates an unreachable backend: every operation fails with
    /// [`SalesError::StoreUnavailable`] while set.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(SalesError::StoreUnavailable(
                "in-memory store is offline".into(),
            ))
        } else {
            Ok(())
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, StoreData>> {
        self.ensure_online()?;
        self.data
            .read()
            .map_err(|_| SalesError::StoreUnavailable("store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, StoreData>> {
        self.ensure_online()?;
        self.data
            .write()
            .map_err(|_| SalesError::StoreUnavailable("store lock poisoned".into()))
    }

    fn bump(&self, changed: bool) {
        if changed {
            self.revision.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl RecordStore for InMemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn check(&self) -> Result<()> {
        self.read().map(|_| ())
    }

    fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    fn list_sales(&self) -> Result<Vec<SaleRecord>> {
        Ok(self.read()?.sales.clone())
    }

    fn get_sale(&self, id: Uuid) -> Result<Option<SaleRecord>> {
        Ok(self.read()?.sale(id).cloned())
    }

    fn insert_sale(&self, sale: &SaleDraft) -> Result<Uuid> {
        let id = self.write()?.insert_sale(sale, self.clock.now());
        self.bump(true);
        Ok(id)
    }

    fn update_sale(&self, id: Uuid, sale: &SaleDraft) -> Result<bool> {
        let updated = self.write()?.update_sale(id, sale, self.clock.now());
        self.bump(updated);
        Ok(updated)
    }

    fn delete_sale(&self, id: Uuid) -> Result<bool> {
        let deleted = self.write()?.delete_sale(id);
        self.bump(deleted);
        Ok(deleted)
    }

    fn list_customers(&self) -> Result<CustomerBook> {
        Ok(self.read()?.customers.clone())
    }

    fn upsert_customer(&self, village: &str, name: &str) -> Result<bool> {
        let added = self.write()?.customers.add(village, name)?;
        self.bump(added);
        Ok(added)
    }

    fn rename_customer(&self, village: &str, old_name: &str, new_name: &str) -> Result<bool> {
        let renamed = self.write()?.customers.rename(village, old_name, new_name)?;
        self.bump(renamed);
        Ok(renamed)
    }

    fn delete_customer(&self, village: &str, name: &str) -> Result<bool> {
        let removed = self.write()?.customers.remove(village, name);
        self.bump(removed);
        Ok(removed)
    }

    fn list_pricing(&self) -> Result<PricingTable> {
        Ok(self.read()?.pricing.clone())
    }

    fn upsert_pricing(&self, package: &str, rate: u64) -> Result<Option<u64>> {
        let previous = self.write()?.pricing.upsert(package, rate);
        self.bump(previous != Some(rate));
        Ok(previous)
    }

    fn insert_pricing_if_absent(&self, package: &str, rate: u64) -> Result<bool> {
        let inserted = self.write()?.pricing.insert_if_absent(package, rate);
        self.bump(inserted);
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_store_reports_unavailable() {
        let store = InMemoryStore::new();
        store.set_offline(true);
        assert!(matches!(store.check(), Err(SalesError::StoreUnavailable(_))));
        assert!(store.list_pricing().unwrap_err().is_unavailable());
        store.set_offline(false);
        assert!(store.check().is_ok());
    }

    #[test]
    fn revision_moves_only_on_change() {
        let store = InMemoryStore::new();
        assert_eq!(store.revision(), 0);
        assert!(store.upsert_customer("Bardwadi", "Ajay Thorat").unwrap());
        assert_eq!(store.revision(), 1);
        assert!(!store.upsert_customer("Bardwadi", "ajay thorat").unwrap());
        assert_eq!(store.revision(), 1);
        assert!(!store.delete_customer("Bardwadi", "Nobody").unwrap());
        assert_eq!(store.revision(), 1);
    }

    #[test]
    fn insert_pricing_if_absent_does_not_overwrite() {
        let store = InMemoryStore::new();
        store.upsert_pricing("1kg", 400).unwrap();
        assert!(!store.insert_pricing_if_absent("1kg", 350).unwrap());
        assert_eq!(store.list_pricing().unwrap().get("1kg"), Some(400));
    }
}
