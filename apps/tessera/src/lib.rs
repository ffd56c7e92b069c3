//! # Tessera
//!
//! The application half of Tessera: configuration, the CLI and the HTTP
//! API around a [`tessera_core::DashboardSession`].

pub mod api;
pub mod cli;
pub mod config;
pub mod observer;
