//! State module for tracking traversal progress
//!
//! # Components
//!
//! - `ItemState`: lifecycle of a dequeued frontier item (classifying, downloading, expanding, dropped)
//! - `FrontierItem`: a `(url, depth)` pair awaiting traversal
//! - `VisitedSet`: insert-if-absent set of URLs enqueued during one run

mod item_state;
mod visited;

// Re-export main types
pub use item_state::{DropReason, ItemState};
pub use visited::{FrontierItem, VisitedSet};
