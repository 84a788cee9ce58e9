//! # Domain Models
//!
//! This crate contains the pure routing types with minimal dependencies (`serde`, `bitflags`).
//! Keep it lean: no I/O, networking or compilation logic, only data and simple helpers.

pub mod config;
pub mod method;
pub mod param;
pub mod routes;
