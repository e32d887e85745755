use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::common::{Displayable, Identifiable};
use crate::domain::schedule::DayOfWeek;
use crate::errors::SalesError;

/// Settlement state of a sale; drives the paid amount and balance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PaymentStatus {
    #[serde(rename = "Paid")]
    Paid,
    #[serde(rename = "Half paid")]
    HalfPaid,
    #[serde(rename = "Not paid")]
    NotPaid,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 3] = [
        PaymentStatus::Paid,
        PaymentStatus::HalfPaid,
        PaymentStatus::NotPaid,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PaymentStatus::Paid => "Paid",
            PaymentStatus::HalfPaid => "Half paid",
            PaymentStatus::NotPaid => "Not paid",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PaymentStatus {
    type Err = SalesError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized: String = value
            .trim()
            .to_ascii_lowercase()
            .chars()
            .map(|c| if c == '-' || c == '_' { ' ' } else { c })
            .collect();
        match normalized.as_str() {
            "paid" => Ok(PaymentStatus::Paid),
            "half paid" | "half" | "partial" => Ok(PaymentStatus::HalfPaid),
            "not paid" | "unpaid" => Ok(PaymentStatus::NotPaid),
            _ => Err(SalesError::invalid(format!(
                "unknown payment status `{}` (use Paid, Half paid or Not paid)",
                value.trim()
            ))),
        }
    }
}

/// A fully computed sale that has not been persisted yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SaleDraft {
    pub date: NaiveDate,
    pub day: DayOfWeek,
    pub village: String,
    pub customer_name: String,
    pub brand: String,
    pub product_type: String,
    pub package: String,
    /// Rate copied from the pricing table when the sale was entered.
    pub rate: u64,
    pub quantity: u32,
    pub total_amount: u64,
    pub payment_status: PaymentStatus,
    pub amount_paid: u64,
    pub balance: u64,
}

impl SaleDraft {
    /// Checks the total/paid/balance relationship for the payment status.
    pub fn is_consistent(&self) -> bool {
        if self.total_amount != self.rate * u64::from(self.quantity) {
            return false;
        }
        match self.payment_status {
            PaymentStatus::Paid => self.balance == 0 && self.amount_paid == self.total_amount,
            PaymentStatus::NotPaid => self.amount_paid == 0 && self.balance == self.total_amount,
            PaymentStatus::HalfPaid => {
                self.amount_paid <= self.total_amount
                    && self.balance == self.total_amount - self.amount_paid
            }
        }
    }
}

/// A persisted sale. Ids and timestamps are assigned by the record store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SaleRecord {
    pub id: Uuid,
    #[serde(flatten)]
    pub sale: SaleDraft,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SaleRecord {
    pub fn new(id: Uuid, sale: SaleDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            sale,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces the sale contents, keeping `created_at`.
    pub fn replace(&mut self, sale: SaleDraft, now: DateTime<Utc>) {
        self.sale = sale;
        self.updated_at = now;
    }
}

impl Identifiable for SaleRecord {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Displayable for SaleRecord {
    fn display_label(&self) -> String {
        format!(
            "{} {} ({}) {} x{} = {} [{}]",
            self.sale.date,
            self.sale.customer_name,
            self.sale.village,
            self.sale.package,
            self.sale.quantity,
            self.sale.total_amount,
            self.sale.payment_status
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_status_parses_loose_spellings() {
        assert_eq!("Half paid".parse::<PaymentStatus>(), Ok(PaymentStatus::HalfPaid));
        assert_eq!("half-paid".parse::<PaymentStatus>(), Ok(PaymentStatus::HalfPaid));
        assert_eq!("NOT_PAID".parse::<PaymentStatus>(), Ok(PaymentStatus::NotPaid));
        assert_eq!("paid".parse::<PaymentStatus>(), Ok(PaymentStatus::Paid));
        assert!("later".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn payment_status_serializes_with_display_labels() {
        let json = serde_json::to_string(&PaymentStatus::HalfPaid).unwrap();
        assert_eq!(json, "\"Half paid\"");
    }

    #[test]
    fn record_serializes_flat() {
        let draft = SaleDraft {
            date: NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
            day: DayOfWeek::Monday,
            village: "Harali KH".into(),
            customer_name: "Balaji Naik".into(),
            brand: "GOLD Tea Powder".into(),
            product_type: "Mix".into(),
            package: "1kg".into(),
            rate: 350,
            quantity: 2,
            total_amount: 700,
            payment_status: PaymentStatus::HalfPaid,
            amount_paid: 300,
            balance: 400,
        };
        assert!(draft.is_consistent());
        let record = SaleRecord::new(Uuid::new_v4(), draft, Utc::now());
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["balance"], 400);
        assert_eq!(value["day"], "Monday");
        assert_eq!(value["payment_status"], "Half paid");
        let back: SaleRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }
}
