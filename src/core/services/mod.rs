pub mod customer_service;
pub mod pricing_service;
pub mod sale_service;
pub mod schedule_service;
pub mod summary_service;

pub use customer_service::CustomerService;
pub use pricing_service::{LoadSource, PricingService, PricingSnapshot, RateChange};
pub use sale_service::{BuiltSale, SaleContext, SaleRequest, SaleService, SubmittedSale};
pub use schedule_service::{DaySelection, ScheduleService};
pub use summary_service::{GroupTotals, SalesTotals, SummaryService};

pub type ServiceResult<T> = crate::errors::Result<T>;
