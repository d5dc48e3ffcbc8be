//! # movie-report
//!
//! Batch enrichment of TMDB movie ids into a spreadsheet report.
//!
//! A run reads a CSV column of movie ids, looks each one up against the
//! TMDB API with bounded concurrency and retrying, and writes two
//! artifacts: an `.xlsx` report sorted by id with Action titles
//! emphasized, and a dead-letter CSV listing every input row or id that
//! did not make it into the report, with the reason.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌─────────────┐   ┌───────────┐   ┌───────────┐
//! │  input   │──▶│ validate  │──▶│ coordinator │──▶│ transform │──▶│ aggregate │
//! │  (CSV)   │   │ ids+rejects│  │  + client   │   │   rows    │   │  sorted   │
//! └──────────┘   └───────────┘   └─────────────┘   └───────────┘   └─────┬─────┘
//!                                                                       │
//!                                               ┌───────────────────────┤
//!                                               ▼                       ▼
//!                                          ┌──────────┐          ┌─────────────┐
//!                                          │  report  │          │ dead_letter │
//!                                          │  (xlsx)  │          │   (CSV)     │
//!                                          └──────────┘          └─────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`models`] | Shared record types: tokens, rejects, failures, rows |
//! | [`validate`] | Token parsing, dedup, reject classification |
//! | [`client`] | HTTP transport, retry policy, backoff with jitter |
//! | [`coordinator`] | Semaphore-bounded fan-out of lookups |
//! | [`transform`] | Payload → report row with per-field defaults |
//! | [`aggregate`] | Final sort and ledger assembly |
//! | [`pipeline`] | Stage wiring, run summary, dry run |
//! | [`input`] | `ID` column reader |
//! | [`report`] | Workbook writer |
//! | [`dead_letter`] | Ledger CSV writer |
//! | [`atomic_write`] | Temp-file-and-rename output |
//! | [`config`] | TOML configuration and credential lookup |
//! | [`progress`] | Human / JSON progress on stderr |

pub mod aggregate;
pub mod atomic_write;
pub mod client;
pub mod config;
pub mod coordinator;
pub mod dead_letter;
pub mod input;
pub mod models;
pub mod pipeline;
pub mod progress;
pub mod report;
pub mod transform;
pub mod validate;
