//! Pure sales domain models. No I/O, no CLI, no storage.

pub mod common;
pub mod customer;
pub mod pricing;
pub mod sale;
pub mod schedule;
pub mod window;

pub use common::{normalize_key, Displayable, Identifiable};
pub use customer::{CustomerBook, VillageCustomers};
pub use pricing::{PackageRate, PricingTable};
pub use sale::{PaymentStatus, SaleDraft, SaleRecord};
pub use schedule::{day_of_week, DayAssignment, DayOfWeek, DayVillageTable};
pub use window::DateWindow;
