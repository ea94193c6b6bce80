//! Headliner core library
//!
//! Caching, aggregation and scheduled cache-warming for a personalized news
//! service. The aggregator answers per-subscriber article requests out of a
//! TTL cache, fanning out to the upstream headlines provider on a miss, while
//! the refresh scheduler re-primes every known subscriber's entry on a fixed
//! period.

pub mod aggregator;
pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod directory;
pub mod refresh;
