//! # Lectio
//!
//! A structured-text engine for daily Bible reading on the M'Cheyne plan.
//!
//! Lectio models passages as typed verse collections with word-level
//! highlights, parses raw passage text into clean verses, and caches each
//! day's readings as JSON locally with an optional S3 mirror. Legacy
//! string-format cache entries are migrated lazily on read.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌───────────────┐
//! │  Raw text    │──▶│   Parser     │──▶│  BiblePassage │
//! │  (any shape) │   │ extract/ref  │   │ verses+marks  │
//! └──────────────┘   └──────────────┘   └──────┬────────┘
//!                                              │
//!                          ┌───────────────────┤
//!                          ▼                   ▼
//!                    ┌──────────┐        ┌──────────┐
//!                    │  Cache   │        │ Display  │
//!                    │ local/S3 │        │ terminal │
//!                    └──────────┘        └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! lectio show                   # today's readings
//! lectio show --offset -1       # yesterday's readings
//! lectio parse "Genesis 1:1-5" --file passage.txt
//! lectio stats                  # reading and highlight statistics
//! lectio migrate 8 28           # convert a legacy cache entry
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Verses, passages, highlight positions |
//! | [`highlights`] | Highlight aggregation, merging, coverage |
//! | [`display`] | Terminal formatting |
//! | [`reference`] | Bible reference parsing and book names |
//! | [`typography`] | Quote, apostrophe, and divine-name styling |
//! | [`extract`] | Verse extraction from raw passage text |
//! | [`cache`] | Dated reading cache with a JSON envelope |
//! | [`migrate`] | Legacy cache entry migration |
//! | [`store`] | Local byte store |
//! | [`store_s3`] | S3 byte store (SigV4) |

pub mod cache;
pub mod config;
pub mod display;
pub mod error;
pub mod extract;
pub mod highlights;
pub mod memo;
pub mod migrate;
pub mod models;
pub mod readings;
pub mod reference;
pub mod store;
pub mod store_s3;
pub mod typography;
