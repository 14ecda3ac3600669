//! Triangle soup preprocessing.
//!
//! - **Welding**: merge nearly coincident points so the exact-position
//!   mesh builder can pair shared edges

pub mod weld;
