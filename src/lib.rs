#![warn(
    unused_extern_crates,
    missing_debug_implementations,
    rust_2018_idioms,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
#![cfg_attr(not(test), warn(clippy::unwrap_used))]
#![forbid(unsafe_code)]

//! Embeds an arbitrary file into the Bitcoin blockchain across one or more
//! legacy P2SH transaction inputs, and reconstructs the original bytes back
//! out of a transaction that carries it.
//!
//! The pipeline is six small, independently testable stages:
//! [`chunker`] splits a payload into per-input parts and per-push chunks;
//! [`script`] assembles the redeem and signature scripts for one part;
//! [`address`] derives the ordered funding plan a payer sends coins to;
//! [`transaction`] builds and signs the final redemption transaction;
//! [`watcher`] observes those funding addresses for incoming UTXOs; and
//! [`extractor`] reverses the whole thing back into the original bytes.

pub mod address;
pub mod chunker;
pub mod config;
mod error;
pub mod keys;
pub mod script;
pub mod transaction;
pub mod watcher;

mod extractor;

pub use ::bitcoin;
pub use error::{Error, Result};
pub use extractor::{extract, extract_from_bytes};
pub use watcher::{broadcast, BroadcastOutcome};
