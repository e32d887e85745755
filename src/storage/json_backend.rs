use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard,
    },
};
use tracing::debug;
use uuid::Uuid;

use crate::{
    core::{
        time::{Clock, SystemClock},
        utils::{ensure_dir, write_atomic, PathResolver},
    },
    domain::{CustomerBook, PricingTable, SaleDraft, SaleRecord},
    errors::{Result, SalesError},
};

use super::{RecordStore, StoreData};

const SALES_FILE: &str = "sales.json";
const CUSTOMERS_FILE: &str = "customers.json";
const PRICING_FILE: &str = "pricing.json";

/// Flat-file record store: one pretty-printed JSON document per collection.
///
/// A missing file reads as an empty collection. Every write stages a sibling
/// `.tmp` file and renames it into place.
pub struct JsonStore {
    root: PathBuf,
    clock: Arc<dyn Clock>,
    lock: Mutex<()>,
    revision: AtomicU64,
}

impl JsonStore {
    pub fn new(root: PathBuf) -> Result<Self> {
        Self::with_clock(root, Arc::new(SystemClock))
    }

    pub fn with_clock(root: PathBuf, clock: Arc<dyn Clock>) -> Result<Self> {
        ensure_dir(&root)?;
        Ok(Self {
            root,
            clock,
            lock: Mutex::new(()),
            revision: AtomicU64::new(0),
        })
    }

    /// Opens the store beneath the application home (`<home>/data`).
    pub fn new_default() -> Result<Self> {
        Self::new(PathResolver::data_dir_in(&PathResolver::base_dir()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn sales_path(&self) -> PathBuf {
        self.root.join(SALES_FILE)
    }

    pub fn customers_path(&self) -> PathBuf {
        self.root.join(CUSTOMERS_FILE)
    }

    pub fn pricing_path(&self) -> PathBuf {
        self.root.join(PRICING_FILE)
    }

    /// Reads every collection at once.
    pub fn snapshot(&self) -> Result<StoreData> {
        let _guard = self.guard()?;
        Ok(StoreData {
            sales: read_collection(&self.sales_path())?,
            customers: read_collection(&self.customers_path())?,
            pricing: read_collection(&self.pricing_path())?,
        })
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>> {
        self.lock
            .lock()
            .map_err(|_| SalesError::StoreUnavailable("store lock poisoned".into()))
    }

    /// Read-modify-write of one collection. The file is rewritten only when
    /// `apply` reports a change.
    fn mutate<T, R, F>(&self, path: PathBuf, apply: F) -> Result<R>
    where
        T: Serialize + DeserializeOwned + Default,
        F: FnOnce(&mut T) -> Result<(R, bool)>,
    {
        let _guard = self.guard()?;
        let mut collection: T = read_collection(&path)?;
        let (result, changed) = apply(&mut collection)?;
        if changed {
            write_collection(&path, &collection)?;
            self.revision.fetch_add(1, Ordering::SeqCst);
            debug!(path = %path.display(), "collection written");
        }
        Ok(result)
    }

    fn read<T>(&self, path: PathBuf) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let _guard = self.guard()?;
        read_collection(&path)
    }
}

fn read_collection<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(T::default()),
        Err(err) => {
            return Err(SalesError::StoreUnavailable(format!(
                "{}: {}",
                path.display(),
                err
            )))
        }
    };
    if data.trim().is_empty() {
        return Ok(T::default());
    }
    serde_json::from_str(&data)
        .map_err(|err| SalesError::Parse(format!("{}: {}", path.display(), err)))
}

fn write_collection<T: Serialize>(path: &Path, collection: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(collection)?;
    write_atomic(path, &json)
        .map_err(|err| SalesError::StoreUnavailable(format!("{}: {}", path.display(), err)))
}

impl RecordStore for JsonStore {
    fn backend_name(&self) -> &'static str {
        "json"
    }

    fn check(&self) -> Result<()> {
        let metadata = fs::metadata(&self.root).map_err(|err| {
            SalesError::StoreUnavailable(format!("{}: {}", self.root.display(), err))
        })?;
        if !metadata.is_dir() {
            return Err(SalesError::StoreUnavailable(format!(
                "{} is not a directory",
                self.root.display()
            )));
        }
        if metadata.permissions().readonly() {
            return Err(SalesError::StoreUnavailable(format!(
                "{} is read-only",
                self.root.display()
            )));
        }
        Ok(())
    }

    fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    fn list_sales(&self) -> Result<Vec<SaleRecord>> {
        self.read(self.sales_path())
    }

    fn get_sale(&self, id: Uuid) -> Result<Option<SaleRecord>> {
        let sales: Vec<SaleRecord> = self.read(self.sales_path())?;
        Ok(sales.into_iter().find(|record| record.id == id))
    }

    fn insert_sale(&self, sale: &SaleDraft) -> Result<Uuid> {
        let now = self.clock.now();
        self.mutate(self.sales_path(), |sales: &mut Vec<SaleRecord>| {
            let id = Uuid::new_v4();
            sales.push(SaleRecord::new(id, sale.clone(), now));
            Ok((id, true))
        })
    }

    fn update_sale(&self, id: Uuid, sale: &SaleDraft) -> Result<bool> {
        let now = self.clock.now();
        self.mutate(self.sales_path(), |sales: &mut Vec<SaleRecord>| {
            let updated = match sales.iter_mut().find(|record| record.id == id) {
                Some(record) => {
                    record.replace(sale.clone(), now);
                    true
                }
                None => false,
            };
            Ok((updated, updated))
        })
    }

    fn delete_sale(&self, id: Uuid) -> Result<bool> {
        self.mutate(self.sales_path(), |sales: &mut Vec<SaleRecord>| {
            let before = sales.len();
            sales.retain(|record| record.id != id);
            let deleted = sales.len() != before;
            Ok((deleted, deleted))
        })
    }

    fn list_customers(&self) -> Result<CustomerBook> {
        self.read(self.customers_path())
    }

    fn upsert_customer(&self, village: &str, name: &str) -> Result<bool> {
        self.mutate(self.customers_path(), |book: &mut CustomerBook| {
            let added = book.add(village, name)?;
            Ok((added, added))
        })
    }

    fn rename_customer(&self, village: &str, old_name: &str, new_name: &str) -> Result<bool> {
        self.mutate(self.customers_path(), |book: &mut CustomerBook| {
            let renamed = book.rename(village, old_name, new_name)?;
            Ok((renamed, renamed))
        })
    }

    fn delete_customer(&self, village: &str, name: &str) -> Result<bool> {
        self.mutate(self.customers_path(), |book: &mut CustomerBook| {
            let removed = book.remove(village, name);
            Ok((removed, removed))
        })
    }

    fn list_pricing(&self) -> Result<PricingTable> {
        self.read(self.pricing_path())
    }

    fn upsert_pricing(&self, package: &str, rate: u64) -> Result<Option<u64>> {
        self.mutate(self.pricing_path(), |table: &mut PricingTable| {
            let previous = table.upsert(package, rate);
            Ok((previous, previous != Some(rate)))
        })
    }

    fn insert_pricing_if_absent(&self, package: &str, rate: u64) -> Result<bool> {
        self.mutate(self.pricing_path(), |table: &mut PricingTable| {
            let inserted = table.insert_if_absent(package, rate);
            Ok((inserted, inserted))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_files_read_as_empty() {
        let dir = tempdir().unwrap();
        let store = JsonStore::new(dir.path().to_path_buf()).unwrap();
        assert!(store.list_sales().unwrap().is_empty());
        assert!(store.list_customers().unwrap().is_empty());
        assert!(store.list_pricing().unwrap().is_empty());
        assert!(store.check().is_ok());
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempdir().unwrap();
        let store = JsonStore::new(dir.path().to_path_buf()).unwrap();
        fs::write(store.pricing_path(), "[{ broken").unwrap();
        assert!(matches!(store.list_pricing(), Err(SalesError::Parse(_))));
    }

    #[test]
    fn unchanged_rate_does_not_rewrite() {
        let dir = tempdir().unwrap();
        let store = JsonStore::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(store.upsert_pricing("1kg", 350).unwrap(), None);
        let revision = store.revision();
        assert_eq!(store.upsert_pricing("1kg", 350).unwrap(), Some(350));
        assert_eq!(store.revision(), revision);
    }
}
