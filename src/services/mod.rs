pub mod budget_alert_service;
pub mod email_service;
pub mod insights_service;
pub mod job_dispatcher;
pub mod job_scheduler_service;
pub mod monthly_report_service;
pub mod receipt_scan_service;
pub mod recurrence;
pub mod recurring_transaction_service;
