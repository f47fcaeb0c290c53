//! # Glimpse Relay
//!
//! The lookup façade: cache check, upstream fetch, normalization, cache
//! fill, and incident emission on failure.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod notify;
mod relay;

pub use notify::{LogSink, Notifier, TelegramConfig, TelegramSink};
pub use relay::{Lookup, ProfileRelay, RelayOptions};
