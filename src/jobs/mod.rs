//! Background Jobs Module
//!
//! Entry points for the scheduled jobs registered with the job scheduler
//! service. Each job runs independently of user requests and of the other
//! jobs; the only state shared between invocations lives in the database.
//!
//! # Available Jobs
//!
//! - `budget_alerts_job` - Checks each budget against the month's spending
//! - `recurring_transactions_job` - Emits processing events for due
//!   recurring transactions
//! - `monthly_report_job` - Builds and emails per-user monthly reports
//!
//! Jobs are idempotent: every mutating step re-verifies its precondition,
//! so at-least-once scheduling and mid-run failures are safe. Per-entity
//! failures are logged and counted without aborting the batch.

pub mod budget_alerts_job;
pub mod monthly_report_job;
pub mod recurring_transactions_job;
