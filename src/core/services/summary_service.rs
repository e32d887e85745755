use std::collections::HashMap;

use serde::Serialize;

use crate::domain::{normalize_key, DateWindow, SaleRecord};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SalesTotals {
    pub entries: usize,
    pub quantity: u64,
    pub total_amount: u64,
    pub amount_paid: u64,
    pub outstanding: u64,
}

impl SalesTotals {
    fn add(&mut self, record: &SaleRecord) {
        self.entries += 1;
        self.quantity += u64::from(record.sale.quantity);
        self.total_amount += record.sale.total_amount;
        self.amount_paid += record.sale.amount_paid;
        self.outstanding += record.sale.balance;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupTotals {
    pub key: String,
    pub totals: SalesTotals,
}

pub struct SummaryService;

impl SummaryService {
    pub fn totals<'a, I>(records: I) -> SalesTotals
    where
        I: IntoIterator<Item = &'a SaleRecord>,
    {
        let mut totals = SalesTotals::default();
        for record in records {
            totals.add(record);
        }
        totals
    }

    pub fn within(records: &[SaleRecord], window: DateWindow) -> Vec<SaleRecord> {
        records
            .iter()
            .filter(|record| window.contains(record.sale.date))
            .cloned()
            .collect()
    }

    pub fn by_village(records: &[SaleRecord]) -> Vec<GroupTotals> {
        group(records, |record| {
            (record.sale.village.clone(), record.sale.village.clone())
        })
    }

    /// Groups by village and normalised customer name; the key shows the
    /// first spelling seen.
    pub fn by_customer(records: &[SaleRecord]) -> Vec<GroupTotals> {
        group(records, |record| {
            (
                format!("{}\u{0}{}", record.sale.village, normalize_key(&record.sale.customer_name)),
                format!("{} ({})", record.sale.customer_name.trim(), record.sale.village),
            )
        })
    }

    pub fn by_product(records: &[SaleRecord]) -> Vec<GroupTotals> {
        group(records, |record| {
            (
                normalize_key(&record.sale.product_type),
                record.sale.product_type.clone(),
            )
        })
    }

    pub fn by_package(records: &[SaleRecord]) -> Vec<GroupTotals> {
        group(records, |record| {
            (record.sale.package.clone(), record.sale.package.clone())
        })
    }

    /// Customers still owing money, largest balance first.
    pub fn outstanding_by_customer(records: &[SaleRecord]) -> Vec<GroupTotals> {
        let mut owing: Vec<GroupTotals> = Self::by_customer(records)
            .into_iter()
            .filter(|group| group.totals.outstanding > 0)
            .collect();
        owing.sort_by(|a, b| {
            b.totals
                .outstanding
                .cmp(&a.totals.outstanding)
                .then_with(|| a.key.cmp(&b.key))
        });
        owing
    }
}

/// `key_of` returns `(grouping key, display key)`.
fn group<F>(records: &[SaleRecord], key_of: F) -> Vec<GroupTotals>
where
    F: Fn(&SaleRecord) -> (String, String),
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<GroupTotals> = Vec::new();
    for record in records {
        let (key, label) = key_of(record);
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push(GroupTotals {
                key: label,
                totals: SalesTotals::default(),
            });
            groups.len() - 1
        });
        groups[slot].totals.add(record);
    }
    groups.sort_by(|a, b| {
        b.totals
            .total_amount
            .cmp(&a.totals.total_amount)
            .then_with(|| a.key.cmp(&b.key))
    });
    groups
}
