//! The three cache tiers and their shared counters
//!
//! Each tier has its own refresh cadence and TTL and is read
//! independently; a caller must be prepared for any tier to be absent
//! for an entity the others know about.

pub mod attribute;
pub mod position;
pub mod stats;
pub mod transform;

pub use attribute::{AttributeCache, AttributeRecord};
pub use position::{PositionCache, PositionRecord};
pub use stats::CacheStats;
pub use transform::{TransformCache, TransformRecord};
