//! Sightline - entity state cache and batched remote-read pipeline
//!
//! Tracks many dynamic remote entities (position, health, pose,
//! identity) at render-loop frequency while minimizing round trips
//! against the remote source. Three independent cache tiers trade
//! freshness against read cost, and every remote access rides a
//! batched gateway so the cost driver stays call count, not bandwidth.

pub mod cache;
pub mod collect;
pub mod core;
pub mod gateway;
pub mod pipeline;
pub mod project;
pub mod render;
