//! sqlx operations. Anything that reads and then writes leave or balance rows
//! runs in one transaction that holds the employee's `leave_balances` row lock
//! (`SELECT ... FOR UPDATE`), taken before any `leave_requests` row lock.

pub mod balance_store;
pub mod holiday_store;
pub mod leave_store;
pub mod team_store;
