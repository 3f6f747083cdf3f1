//! Attendance & payroll computation engine.
//!
//! This crate turns raw clock-in/out scans, approved leave, holidays,
//! manual corrections and a compensation policy into per-day attendance
//! classifications, period and year-to-date summaries, and bi-monthly
//! payslips with a split-and-reconcile social security contribution.
//!
//! The calculation functions in [`calculation`] are pure; [`service`]
//! drives them against a [`store::RecordStore`] and [`api`] exposes them
//! over HTTP.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod store;
