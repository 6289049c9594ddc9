//! Scheduled jobs.
//!
//! Each job is a plain function over the store and the notification sink;
//! the scheduler (cron, systemd timer, test harness) is external. All jobs
//! are idempotent so an overlapping or repeated run never double-acts.

pub mod expiration_warning;
pub mod low_stock_scan;
pub mod overdue_sweep;
pub mod production_report;

pub use expiration_warning::warn_expiring_batches;
pub use low_stock_scan::scan_low_stock;
pub use overdue_sweep::sweep_overdue_invoices;
pub use production_report::daily_production_report;
