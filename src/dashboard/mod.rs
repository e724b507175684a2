//! Dashboard aggregation.
//!
//! `calc` holds the pure arithmetic over fetched session facts; `storage`
//! runs the queries and assembles the response DTOs in `model`.

pub mod calc;
pub mod model;
pub mod storage;
