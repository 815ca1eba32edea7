//! Shared pieces of the best-effort bulk mode.

use serde::{Deserialize, Serialize};

/// One failed item of a bulk call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkError {
    pub path: String,
    pub error: String,
}

/// Summary line for a bulk call.
pub(crate) fn bulk_message(operation: &str, affected: usize, failed: usize) -> String {
    if failed == 0 {
        format!("Bulk {operation} completed: {affected} succeeded")
    } else {
        format!("Bulk {operation} partially completed: {affected} succeeded, {failed} failed")
    }
}
