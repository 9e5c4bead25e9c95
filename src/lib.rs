// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! SafeStat - Health Metrics Ledger Service
//!
//! Records health metric submissions and tracks the wallet transaction that
//! anchors each one on the Sepolia test network.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `blockchain` - Wallet gateway, receipt polling and account/chain events
//! - `store` - In-memory record store behind the `HealthRecordStore` trait
//! - `workflow` - Submission state machine and the API client it drives

pub mod api;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod state;
pub mod store;
pub mod workflow;
