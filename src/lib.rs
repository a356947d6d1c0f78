//! # Voter List Crawler
//!
//! Walks the administrative hierarchy of the voter list lookup service
//! (state → district → VDC/municipality → ward → registration centre) and
//! records the voter list link of every registration centre it reaches.
//!
//! Each level's options depend on the selections above it, so the crawl is
//! a depth-first walk over a four-level option tree that only exists one
//! request at a time.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │    Walker    │──▶│   Resolver   │──▶│              │
//! │ (depth-first │   │  <option>s   │   │    Oracle    │
//! │  + pool)     │──▶│  LinkLookup  │──▶│  (HTTP POST) │
//! └──────┬───────┘   └──────────────┘   └──────────────┘
//!        │ LeafRecord
//!        ▼
//! ┌──────────────┐
//! │     Sink     │  {state}_links.txt
//! └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! vlist crawl 3                          # crawl state 3 into ./3_links.txt
//! vlist crawl --concurrency 1            # prompt for the state, crawl sequentially
//! vlist options vdc --state 3 --district 27
//! vlist lookup --state 3 --district 27 --vdc 5 --ward 1 --reg-centre 4021
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Levels, selection paths, records |
//! | [`error`] | Oracle failure taxonomy |
//! | [`form`] | Multipart form bodies |
//! | [`traits`] | `Oracle` and `Sink` extension points |
//! | [`oracle`] | HTTP oracle with timeout and retry |
//! | [`resolver`] | Option list requests and parsing |
//! | [`lookup`] | Voter list link lookup |
//! | [`sink`] | File and in-memory sinks |
//! | [`walker`] | Depth-first walk with a bounded worker pool |
//! | [`progress`] | Walk event reporting |
//! | [`crawl`] | `vlist crawl` orchestration |
//! | [`probe`] | `vlist options` / `vlist lookup` |

pub mod config;
pub mod crawl;
pub mod error;
pub mod form;
pub mod lookup;
pub mod models;
pub mod oracle;
pub mod probe;
pub mod progress;
pub mod resolver;
pub mod sink;
pub mod traits;
pub mod walker;
