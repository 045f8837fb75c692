//! Fabrication-lab 3D print job tracking service.
//!
//! Students submit print requests (model file + metadata) through a
//! multipart form; staff review, approve or reject, and walk accepted jobs
//! through a forward-only status workflow. Every status transition updates
//! the job row, relocates the job's files into the directory named after
//! the new status, and appends an audit event in the same transaction.
//!
//! Single-process deployment only: the short-id counter file and the
//! storage tree are mutated without cross-process locking.

pub mod app;
pub mod config;
pub mod db;
pub mod infra;
pub mod module;
pub mod service;
