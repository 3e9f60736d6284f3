//! Expense-sharing ledger: groups, split expenses, balances and settlement.
//!
//! The pure core lives in [`money`], [`split`], [`balance`] and
//! [`settlement`]. The remaining modules wrap it in an actix-web service.

pub mod auth;
pub mod balance;
pub mod config;
pub mod error;
pub mod handlers;
pub mod money;
pub mod schemas;
pub mod service;
pub mod settlement;
pub mod split;
pub mod store;
