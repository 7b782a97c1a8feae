//! # lede
//!
//! Reconstructs how the opening sentence of an article changed across its
//! revision history and how long each version stayed in place.
//!
//! lede lists every revision of a page, renders only the lead section of
//! the revisions it has not seen before, normalizes each into a canonical
//! first sentence, and folds the observations into contiguous intervals
//! ranked by total active days.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐   ┌──────────────┐
//! │ RevisionIndex│──▶│ cache diff  │──▶│ ContentFetch │
//! │  (listing)   │   │             │   │ + normalize  │
//! └──────────────┘   └─────────────┘   └──────┬───────┘
//!                                            ▼
//! ┌──────────────┐   ┌─────────────┐   ┌──────────────┐
//! │  Aggregator  │◀──│  Timeline   │◀──│ RevisionCache│
//! │ (ranked out) │   │ reconstruct │   │ (checkpoint) │
//! └──────────────┘   └─────────────┘   └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! lede analyze "27 Club"                 # fetch, reconstruct, save record
//! lede export 27_Club_first_sentence_analysis.json
//! lede summary 27_Club_first_sentence_analysis.json
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`error`] | Service and cache error taxonomy |
//! | [`normalize`] | Markup → canonical sentence |
//! | [`traits`] | Revision index / content source seams |
//! | [`mediawiki`] | MediaWiki Action API client |
//! | [`fetcher`] | Throttled, retrying content fetcher |
//! | [`store`] | Record storage backends |
//! | [`record`] | Persisted record layout |
//! | [`cache`] | Revision cache: load, diff, merge, checkpoint |
//! | [`timeline`] | Interval reconstruction |
//! | [`aggregate`] | Per-sentence ranking |
//! | [`analyze`] | Pipeline orchestration |
//! | [`export`] | Chronological CSV export |
//! | [`report`] | Console reports |
//! | [`progress`] | Progress on stderr |
//! | [`logging`] | Tracing setup |

pub mod aggregate;
pub mod analyze;
pub mod cache;
pub mod config;
pub mod error;
pub mod export;
pub mod fetcher;
pub mod logging;
pub mod mediawiki;
pub mod models;
pub mod normalize;
pub mod progress;
pub mod record;
pub mod report;
pub mod store;
pub mod timeline;
pub mod traits;
