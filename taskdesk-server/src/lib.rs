//! `TaskDesk` server library.
//!
//! Exposes the router, store, and session layer for use in tests and
//! embedding. The server renders HTML pages for listing, searching,
//! creating, editing, and deleting tasks; every write is stamped with
//! audit metadata immediately before it is committed.

pub mod account;
pub mod config;
pub mod error;
pub mod handlers;
pub mod server;
pub mod session;
pub mod store;
pub mod views;
