//! Sale entry: turns caller selections into a priced, balanced draft and
//! persists it through the record store.
//!
//! Every check runs in [`SaleService::build`] before anything is written, so a
//! rejected sale never leaves a half-added customer behind.

use chrono::NaiveDate;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::domain::{
    CustomerBook, DayOfWeek, DayVillageTable, PaymentStatus, PricingTable, SaleDraft, SaleRecord,
};
use crate::domain::customer::validate_name;
use crate::errors::SalesError;
use crate::storage::RecordStore;

use super::{PricingService, ScheduleService, ServiceResult};

/// Caller selections for one sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleRequest {
    pub date: NaiveDate,
    /// Defaults to the weekday of `date`.
    pub day: Option<DayOfWeek>,
    /// Defaults to the weekday table, then to the first configured village.
    pub village: Option<String>,
    pub customer_name: String,
    pub product_type: String,
    pub package: String,
    pub quantity: u32,
    pub payment_status: PaymentStatus,
    /// Only read for [`PaymentStatus::HalfPaid`]; missing means nothing paid yet.
    pub amount_paid: Option<u64>,
}

impl SaleRequest {
    pub fn new(
        date: NaiveDate,
        customer_name: impl Into<String>,
        package: impl Into<String>,
        quantity: u32,
    ) -> Self {
        Self {
            date,
            day: None,
            village: None,
            customer_name: customer_name.into(),
            product_type: String::new(),
            package: package.into(),
            quantity,
            payment_status: PaymentStatus::Paid,
            amount_paid: None,
        }
    }
}

impl From<&SaleDraft> for SaleRequest {
    /// Selections that rebuild `draft` at today's rates.
    fn from(draft: &SaleDraft) -> Self {
        Self {
            date: draft.date,
            day: Some(draft.day),
            village: Some(draft.village.clone()),
            customer_name: draft.customer_name.clone(),
            product_type: draft.product_type.clone(),
            package: draft.package.clone(),
            quantity: draft.quantity,
            payment_status: draft.payment_status,
            amount_paid: Some(draft.amount_paid),
        }
    }
}

/// Directories and configuration a sale is checked against.
#[derive(Debug, Clone, Copy)]
pub struct SaleContext<'a> {
    pub pricing: &'a PricingTable,
    pub customers: &'a CustomerBook,
    pub villages: &'a [String],
    pub tea_types: &'a [String],
    pub day_villages: &'a DayVillageTable,
    pub brand: &'a str,
}

impl<'a> SaleContext<'a> {
    pub fn new(config: &'a Config, pricing: &'a PricingTable, customers: &'a CustomerBook) -> Self {
        Self {
            pricing,
            customers,
            villages: &config.villages,
            tea_types: &config.tea_types,
            day_villages: &config.day_villages,
            brand: &config.brand_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltSale {
    pub draft: SaleDraft,
    /// The customer is not yet in the directory and will be added on submit.
    pub new_customer: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedSale {
    pub record: SaleRecord,
    pub new_customer: bool,
}

pub struct SaleService;

impl SaleService {
    /// Validates the request and computes the draft without touching any store.
    pub fn build(request: &SaleRequest, context: &SaleContext<'_>) -> ServiceResult<BuiltSale> {
        let customer = validate_name(&request.customer_name)?;
        let selection =
            ScheduleService::resolve(context.day_villages, context.villages, request.date, request.day);
        let village = Self::resolve_village(request.village.as_deref(), selection.suggested_village, context)?;
        let product_type = Self::resolve_product_type(&request.product_type, context)?;

        let package = request.package.trim();
        let rate = PricingService::get_rate(context.pricing, package).map_err(|err| match err {
            SalesError::NotFound(_) => SalesError::invalid(format!("unknown package `{}`", package)),
            other => other,
        })?;
        if request.quantity == 0 {
            return Err(SalesError::invalid("quantity must be at least 1"));
        }
        let total_amount = rate
            .checked_mul(u64::from(request.quantity))
            .ok_or_else(|| SalesError::invalid("total amount is too large"))?;
        let amount_paid = match request.payment_status {
            PaymentStatus::Paid => total_amount,
            PaymentStatus::NotPaid => 0,
            PaymentStatus::HalfPaid => {
                let paid = request.amount_paid.unwrap_or(0);
                if paid > total_amount {
                    return Err(SalesError::invalid(format!(
                        "amount paid {} exceeds total {}",
                        paid, total_amount
                    )));
                }
                paid
            }
        };

        let existing = context.customers.find(&village, customer);
        let new_customer = existing.is_none();
        let customer_name = existing.unwrap_or(customer).to_string();

        let draft = SaleDraft {
            date: request.date,
            day: selection.day,
            village,
            customer_name,
            brand: context.brand.to_string(),
            product_type,
            package: package.to_string(),
            rate,
            quantity: request.quantity,
            total_amount,
            payment_status: request.payment_status,
            amount_paid,
            balance: total_amount - amount_paid,
        };
        debug!(customer = %draft.customer_name, total = draft.total_amount, "sale built");
        Ok(BuiltSale {
            draft,
            new_customer,
        })
    }

    pub fn submit(
        store: &dyn RecordStore,
        context: &SaleContext<'_>,
        request: &SaleRequest,
    ) -> ServiceResult<SubmittedSale> {
        let built = Self::build(request, context)?;
        let new_customer = Self::register_customer(store, &built)?;
        let id = match store.insert_sale(&built.draft) {
            Ok(id) => id,
            Err(err) => return Err(Self::forget_customer(store, &built, new_customer, err)),
        };
        let record = Self::fetch(store, id)?;
        info!(
            %id,
            customer = %record.sale.customer_name,
            village = %record.sale.village,
            total = record.sale.total_amount,
            balance = record.sale.balance,
            "sale recorded"
        );
        Ok(SubmittedSale {
            record,
            new_customer,
        })
    }

    /// Recomputes an existing sale from a fresh request, keeping its id and
    /// creation time.
    pub fn update(
        store: &dyn RecordStore,
        context: &SaleContext<'_>,
        id: Uuid,
        request: &SaleRequest,
    ) -> ServiceResult<SubmittedSale> {
        if store.get_sale(id)?.is_none() {
            return Err(SalesError::not_found(format!("sale {}", id)));
        }
        let built = Self::build(request, context)?;
        let new_customer = Self::register_customer(store, &built)?;
        let updated = match store.update_sale(id, &built.draft) {
            Ok(true) => Ok(()),
            Ok(false) => Err(SalesError::not_found(format!("sale {}", id))),
            Err(err) => Err(err),
        };
        if let Err(err) = updated {
            return Err(Self::forget_customer(store, &built, new_customer, err));
        }
        let record = Self::fetch(store, id)?;
        info!(%id, total = record.sale.total_amount, "sale updated");
        Ok(SubmittedSale {
            record,
            new_customer,
        })
    }

    pub fn delete(store: &dyn RecordStore, id: Uuid) -> ServiceResult<bool> {
        let deleted = store.delete_sale(id)?;
        if deleted {
            info!(%id, "sale deleted");
        }
        Ok(deleted)
    }

    /// The last `count` sales, most recent first.
    pub fn recent(store: &dyn RecordStore, count: usize) -> ServiceResult<Vec<SaleRecord>> {
        let records = store.list_sales()?;
        Ok(records.into_iter().rev().take(count).collect())
    }

    fn resolve_village(
        requested: Option<&str>,
        suggested: Option<String>,
        context: &SaleContext<'_>,
    ) -> ServiceResult<String> {
        let village = match requested.map(str::trim) {
            Some(value) if !value.is_empty() => value.to_string(),
            _ => suggested.ok_or_else(|| SalesError::invalid("a village must be selected"))?,
        };
        if context.villages.iter().any(|known| known == &village) {
            Ok(village)
        } else {
            Err(SalesError::invalid(format!("unknown village `{}`", village)))
        }
    }

    fn resolve_product_type(requested: &str, context: &SaleContext<'_>) -> ServiceResult<String> {
        let requested = requested.trim();
        if requested.is_empty() {
            return context
                .tea_types
                .first()
                .cloned()
                .ok_or_else(|| SalesError::invalid("a product type must be selected"));
        }
        context
            .tea_types
            .iter()
            .find(|known| known.eq_ignore_ascii_case(requested))
            .cloned()
            .ok_or_else(|| SalesError::invalid(format!("unknown product type `{}`", requested)))
    }

    fn register_customer(store: &dyn RecordStore, built: &BuiltSale) -> ServiceResult<bool> {
        if !built.new_customer {
            return Ok(false);
        }
        let added = store.upsert_customer(&built.draft.village, &built.draft.customer_name)?;
        if added {
            info!(
                village = %built.draft.village,
                name = %built.draft.customer_name,
                "customer added from sale"
            );
        }
        Ok(added)
    }

    /// Undoes a customer registration whose sale never reached the store.
    fn forget_customer(
        store: &dyn RecordStore,
        built: &BuiltSale,
        added: bool,
        err: SalesError,
    ) -> SalesError {
        if !added {
            return err;
        }
        match store.delete_customer(&built.draft.village, &built.draft.customer_name) {
            Ok(_) => warn!(
                village = %built.draft.village,
                name = %built.draft.customer_name,
                "customer registration rolled back"
            ),
            Err(rollback) => warn!(
                village = %built.draft.village,
                name = %built.draft.customer_name,
                error = %rollback,
                "customer registration could not be rolled back"
            ),
        }
        err
    }

    fn fetch(store: &dyn RecordStore, id: Uuid) -> ServiceResult<SaleRecord> {
        store
            .get_sale(id)?
            .ok_or_else(|| SalesError::StoreUnavailable(format!("sale {} missing after write", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Result;
    use crate::storage::InMemoryStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn request(customer: &str, package: &str, quantity: u32) -> SaleRequest {
        let mut request = SaleRequest::new(date(2025, 1, 6), customer, package, quantity);
        request.product_type = "Mix".into();
        request
    }

    #[test]
    fn half_paid_balance_is_total_minus_paid() {
        let config = Config::default();
        let customers = config.seed_customers.clone();
        let context = SaleContext::new(&config, &config.default_pricing, &customers);
        let mut req = request("Balaji Naik", "1kg", 2);
        req.payment_status = PaymentStatus::HalfPaid;
        req.amount_paid = Some(300);
        let built = SaleService::build(&req, &context).unwrap();
        assert_eq!(built.draft.rate, 350);
        assert_eq!(built.draft.total_amount, 700);
        assert_eq!(built.draft.amount_paid, 300);
        assert_eq!(built.draft.balance, 400);
        assert_eq!(built.draft.village, "Harali KH");
        assert_eq!(built.draft.brand, "GOLD Tea Powder");
        assert!(!built.new_customer);
        assert!(built.draft.is_consistent());
    }

    #[test]
    fn paid_and_not_paid_ignore_amount_input() {
        let config = Config::default();
        let customers = CustomerBook::new();
        let context = SaleContext::new(&config, &config.default_pricing, &customers);
        let mut req = request("Someone", "250gm", 3);
        req.amount_paid = Some(10);
        let paid = SaleService::build(&req, &context).unwrap().draft;
        assert_eq!((paid.amount_paid, paid.balance), (255, 0));
        req.payment_status = PaymentStatus::NotPaid;
        let unpaid = SaleService::build(&req, &context).unwrap().draft;
        assert_eq!((unpaid.amount_paid, unpaid.balance), (0, 255));
    }

    #[test]
    fn build_rejects_bad_input() {
        let config = Config::default();
        let customers = CustomerBook::new();
        let context = SaleContext::new(&config, &config.default_pricing, &customers);

        let mut over = request("A", "100gm", 1);
        over.payment_status = PaymentStatus::HalfPaid;
        over.amount_paid = Some(36);
        let cases = vec![
            request("  ", "1kg", 1),
            request("A", "1kg", 0),
            request("A", "2kg", 1),
            over,
            SaleRequest {
                village: Some("Atlantis".into()),
                ..request("A", "1kg", 1)
            },
            SaleRequest {
                product_type: "Green".into(),
                ..request("A", "1kg", 1)
            },
        ];
        for case in cases {
            let err = SaleService::build(&case, &context).unwrap_err();
            assert!(matches!(err, SalesError::InvalidInput(_)), "{case:?} -> {err:?}");
        }
    }

    #[test]
    fn tuesday_without_village_uses_first_configured() {
        let config = Config::default();
        let customers = CustomerBook::new();
        let context = SaleContext::new(&config, &config.default_pricing, &customers);
        let mut req = request("A", "1kg", 1);
        req.date = date(2025, 1, 7);
        let draft = SaleService::build(&req, &context).unwrap().draft;
        assert_eq!(draft.day, DayOfWeek::Tuesday);
        assert_eq!(draft.village, "vairgwadi");
    }

    #[test]
    fn submit_adds_new_customer_once() {
        let config = Config::default();
        let store = InMemoryStore::new();
        let customers = CustomerBook::new();
        let context = SaleContext::new(&config, &config.default_pricing, &customers);
        let first = SaleService::submit(&store, &context, &request(" Ishwar Patil ", "500gm", 1))
            .unwrap();
        assert!(first.new_customer);
        assert_eq!(first.record.sale.customer_name, "Ishwar Patil");

        let refreshed = store.list_customers().unwrap();
        let context = SaleContext::new(&config, &config.default_pricing, &refreshed);
        let second =
            SaleService::submit(&store, &context, &request("ishwar patil", "500gm", 1)).unwrap();
        assert!(!second.new_customer);
        assert_eq!(second.record.sale.customer_name, "Ishwar Patil");
        assert_eq!(store.list_customers().unwrap().names("Harali KH").len(), 1);
    }

    #[test]
    fn failed_build_does_not_add_customer() {
        let config = Config::default();
        let store = InMemoryStore::new();
        let customers = CustomerBook::new();
        let context = SaleContext::new(&config, &config.default_pricing, &customers);
        assert!(SaleService::submit(&store, &context, &request("New Person", "2kg", 1)).is_err());
        assert!(store.list_customers().unwrap().is_empty());
        assert!(store.list_sales().unwrap().is_empty());
    }

    #[test]
    fn update_unknown_id_is_not_found() {
        let config = Config::default();
        let store = InMemoryStore::new();
        let customers = CustomerBook::new();
        let context = SaleContext::new(&config, &config.default_pricing, &customers);
        let err = SaleService::update(&store, &context, Uuid::new_v4(), &request("A", "1kg", 1))
            .unwrap_err();
        assert!(matches!(err, SalesError::NotFound(_)));
        assert!(store.list_customers().unwrap().is_empty());
    }

    #[test]
    fn recent_is_most_recent_first() {
        let config = Config::default();
        let store = InMemoryStore::new();
        let customers = CustomerBook::new();
        let context = SaleContext::new(&config, &config.default_pricing, &customers);
        for name in ["A", "B", "C"] {
            SaleService::submit(&store, &context, &request(name, "100gm", 1)).unwrap();
        }
        let recent = SaleService::recent(&store, 2).unwrap();
        let names: Vec<_> = recent.iter().map(|r| r.sale.customer_name.as_str()).collect();
        assert_eq!(names, vec!["C", "B"]);
    }

    /// Delegates to an in-memory store but refuses every sale write.
    struct ReadOnlySales(InMemoryStore);

    impl RecordStore for ReadOnlySales {
        fn backend_name(&self) -> &'static str {
            "read-only-sales"
        }
        fn check(&self) -> Result<()> {
            self.0.check()
        }
        fn revision(&self) -> u64 {
            self.0.revision()
        }
        fn list_sales(&self) -> Result<Vec<SaleRecord>> {
            self.0.list_sales()
        }
        fn get_sale(&self, id: Uuid) -> Result<Option<SaleRecord>> {
            self.0.get_sale(id)
        }
        fn insert_sale(&self, _sale: &SaleDraft) -> Result<Uuid> {
            Err(SalesError::StoreUnavailable("sales are read-only".into()))
        }
        fn update_sale(&self, _id: Uuid, _sale: &SaleDraft) -> Result<bool> {
            Err(SalesError::StoreUnavailable("sales are read-only".into()))
        }
        fn delete_sale(&self, id: Uuid) -> Result<bool> {
            self.0.delete_sale(id)
        }
        fn list_customers(&self) -> Result<CustomerBook> {
            self.0.list_customers()
        }
        fn upsert_customer(&self, village: &str, name: &str) -> Result<bool> {
            self.0.upsert_customer(village, name)
        }
        fn rename_customer(&self, village: &str, old_name: &str, new_name: &str) -> Result<bool> {
            self.0.rename_customer(village, old_name, new_name)
        }
        fn delete_customer(&self, village: &str, name: &str) -> Result<bool> {
            self.0.delete_customer(village, name)
        }
        fn list_pricing(&self) -> Result<PricingTable> {
            self.0.list_pricing()
        }
        fn upsert_pricing(&self, package: &str, rate: u64) -> Result<Option<u64>> {
            self.0.upsert_pricing(package, rate)
        }
    }

    #[test]
    fn failed_insert_rolls_back_new_customer() {
        let config = Config::default();
        let store = ReadOnlySales(InMemoryStore::new());
        let customers = CustomerBook::new();
        let context = SaleContext::new(&config, &config.default_pricing, &customers);
        let err = SaleService::submit(&store, &context, &request("Brand New", "1kg", 1))
            .unwrap_err();
        assert!(err.is_unavailable());
        assert!(!store.list_customers().unwrap().exists("Harali KH", "Brand New"));
    }

    #[test]
    fn failed_update_rolls_back_new_customer_only() {
        let config = Config::default();
        let inner = InMemoryStore::new();
        let customers = CustomerBook::new();
        let context = SaleContext::new(&config, &config.default_pricing, &customers);
        let first = SaleService::submit(&inner, &context, &request("Buyer", "500gm", 1)).unwrap();

        let store = ReadOnlySales(inner);
        let customers = store.list_customers().unwrap();
        let context = SaleContext::new(&config, &config.default_pricing, &customers);
        let mut changed = SaleRequest::from(&first.record.sale);
        changed.customer_name = "Someone Else".into();
        let err = SaleService::update(&store, &context, first.record.id, &changed).unwrap_err();
        assert!(err.is_unavailable());

        let book = store.list_customers().unwrap();
        assert!(book.exists("Harali KH", "Buyer"));
        assert!(!book.exists("Harali KH", "Someone Else"));
        assert_eq!(store.get_sale(first.record.id).unwrap().unwrap(), first.record);
    }
}
