use uuid::Uuid;

/// Identifies entities that expose a stable unique identifier.
pub trait Identifiable {
    fn id(&self) -> Uuid;
}

/// Supplies a presentation-ready label for UI or logs.
pub trait Displayable {
    fn display_label(&self) -> String;
}

/// Canonical comparison key for free-text names: surrounding whitespace
/// removed and lowercased.
pub fn normalize_key(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Returns `true` when both values normalize to the same key.
pub fn same_key(left: &str, right: &str) -> bool {
    normalize_key(left) == normalize_key(right)
}

// Re-export common dependencies so consumers can rely on this module as a façade.
pub use chrono;
pub use serde;
pub use uuid;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_key_trims_and_lowercases() {
        assert_eq!(normalize_key("  Suresh PATIL \t"), "suresh patil");
    }

    #[test]
    fn same_key_ignores_case_and_padding() {
        assert!(same_key("Suresh Patil", " suresh patil "));
        assert!(!same_key("Suresh Patil", "Suresh  Patil"));
    }
}
