#![doc = "drop2s3-core: three-way reconciliation engine for drop2s3."]

//! Keeps a photo inbox, a local staging directory and an object-store bucket in step
//! for one (year, month, device) partition at a time.
//!
//! # Flow
//! 1. Build a [`session::ReconcileSession`]: scan all three locations and fill the
//!    [`store::ReconciliationStore`].
//! 2. Each file gets a [`store::ReconciliationState`] from its three presence flags.
//! 3. The [`transfer`] operations act on those states and return
//!    [`report::OperationReport`]s; none of them print anything.
//! 4. After anything that changes disk or bucket, re-scan before reading the table again.
//!
//! Transports sit behind [`contract::ObjectStore`]. The CLI crate provides the S3 one;
//! [`remote::DirectoryObjectStore`] emulates a bucket on disk.

pub mod config;
pub mod contract;
pub mod error;
pub mod extension;
pub mod partition;
pub mod remote;
pub mod report;
pub mod scan;
pub mod session;
pub mod store;
pub mod transfer;
pub mod workflow;
