//! Queries owned by abase-api; the schema lives in abase-common

pub mod catalog;
pub mod social;
pub mod tips;
