//! CLI command implementations
//!
//! - `report` - Monthly report run and browser open
//! - `detect` - Bank format detection for CSV files

pub mod detect;
pub mod report;

// Re-export command functions for main.rs
pub use detect::*;
pub use report::*;

pub use tally_core::ReportRequest;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
