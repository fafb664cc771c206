//! Shared serde helper functions.

/// Serde default function that returns `true`.
///
/// Used for unit and config flags that are on unless switched off.
pub fn default_true() -> bool {
    true
}
