//! # ACI Doc Index
//!
//! Reader for the search index shards of generated API documentation.
//!
//! ## Features
//!
//! - **Shard parsing** - `var searchData=[...];` array literals, HTML entities decoded
//! - **Target kinds** - files, classes, structs, free and member functions
//! - **Integrity** - keys duplicated within a shard
//! - **Lookup** - case-insensitive key search

mod error;
mod literal;
mod shard;

pub use error::{DocIndexError, Result};
pub use shard::{
    decode_entities, parse_shard, read_shard, SearchEntry, Shard, Target, TargetKind,
};
