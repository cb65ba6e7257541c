//! Critical path method (CPM) over a task snapshot.
//!
//! A forward pass in topological order yields earliest start/finish, a
//! backward pass in reverse order yields latest start/finish, and the
//! difference is each task's float. Tasks without float form the critical
//! path that fixes the minimum project duration.

mod calculation;
mod paths;
mod types;

pub use calculation::{calculate_on_graph, compute_critical_path, mark_critical};
pub use paths::{enumerate_paths, longest_path};
pub use types::{CriticalPathResult, FloatRecord, SchedulePath, SchedulingError};
