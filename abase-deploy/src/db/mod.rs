//! Database access layer for abase-deploy

pub mod deployments;
