//! Leave-day accounting: calendar classification, day counting, the balance
//! ledger and the approval state machine. Nothing in here touches storage.

pub mod approval;
pub mod calendar;
pub mod day_count;
pub mod ledger;
pub mod validation;
