//! Terminal styling helpers
//!
//! Output goes through `anstream`, which strips colors when stdout is not a
//! terminal, so styling here is unconditional.

use owo_colors::OwoColorize;
use std::fmt::Display;

/// Check mark for ready items
pub const CHECK: &str = "✓";
/// Marker for items still waiting on conditions
pub const PENDING: &str = "…";

/// Semantic styles for CLI output
pub trait Stylize: Display + Sized {
    /// De-emphasized text
    fn muted(&self) -> String {
        self.dimmed().to_string()
    }

    /// Headings and key names
    fn emphasis(&self) -> String {
        self.bold().to_string()
    }

    /// Values worth picking out
    fn accent(&self) -> String {
        self.cyan().to_string()
    }

    /// Positive outcome
    fn success(&self) -> String {
        self.green().to_string()
    }

    /// Waiting / partial outcome
    fn warning(&self) -> String {
        self.yellow().to_string()
    }
}

impl<T: Display> Stylize for T {}

/// Styled check mark
pub fn check() -> String {
    CHECK.success()
}

/// Styled pending marker
pub fn pending() -> String {
    PENDING.warning()
}

/// Styled arrow for list items
pub fn arrow() -> String {
    "→".muted()
}
