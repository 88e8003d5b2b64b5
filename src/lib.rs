//! Payslip derivation engine for Japanese home-care helper payroll.
//!
//! This crate turns a month of raw shift records and a helper's pay profile
//! into a fully computed pay statement: gross pay by category, social
//! insurance premiums, withholding income tax, and net pay with a bank/cash
//! split. Statutory bracket tables are versioned configuration data, and
//! every derived field supports a manual override pin that survives
//! recomputation.

#![warn(missing_docs)]

pub mod calculation;
pub mod config;
pub mod error;
pub mod models;
