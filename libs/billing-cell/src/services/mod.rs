pub mod allowance;
pub mod cycles;
pub mod import;
pub mod packages;
pub mod records;
pub mod rules;

pub use allowance::SessionAllowanceService;
pub use cycles::BillingCycleService;
pub use import::BulkImportService;
pub use packages::PackageLedgerService;
pub use records::BillingRecordService;
pub use rules::{evaluate_billing_rule, BillingOutcome};
