//! Rule-based validation of feature tables.
//!
//! The battery coerces configured columns, then applies per-column and
//! cross-field rules. Each violation is either a problem, which fails the
//! run and is recorded in the failure trail, or a warning, which is only
//! counted.

mod coerce;
mod engine;
mod issue;
mod report;
mod rules;

pub use coerce::parse_date;
pub(crate) use coerce::to_number;
pub use engine::{validate, ValidationOutcome, Validator};
pub use issue::{Check, CheckStatus, FailureRecord, Issue, RuleId, RuleOutcome, Severity};
pub use report::{ReportStatus, ValidationReport};
pub use rules::{MAX_SPAN_DAYS, TOLERANCE};
