//! Administrative hierarchy lookups
//!
//! Lists districts, taluks, villages and panchayats from the document store
//! and feeds the results into a registration form through fetch tickets.

mod loader;

pub use loader::{FetchCompletion, HierarchyLoader};
