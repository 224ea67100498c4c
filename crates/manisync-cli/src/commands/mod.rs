pub mod completions;
pub mod man_pages;
pub mod sync;

use manisync_core::TargetOutcome;
use std::path::Path;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_MANIFEST_ERROR: u8 = 2;
pub const EXIT_DRIFT: u8 = 3;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn colorize_outcome(outcome: TargetOutcome) -> String {
    use console::Style;
    let label = format!("{:<12}", outcome.as_str());
    match outcome {
        TargetOutcome::Updated => Style::new().green().apply_to(label).to_string(),
        TargetOutcome::WouldUpdate => Style::new().yellow().apply_to(label).to_string(),
        TargetOutcome::Unchanged => Style::new().dim().apply_to(label).to_string(),
    }
}

/// `path` relative to `base` when it lives underneath it, for display.
pub fn display_path(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_pretty_serializes_object() {
        let val = serde_json::json!({"key": "value"});
        let result = json_pretty(&val).unwrap();
        assert!(result.contains("\"key\""));
        assert!(result.contains("\"value\""));
    }

    #[test]
    fn colorize_outcome_keeps_label() {
        assert!(colorize_outcome(TargetOutcome::Updated).contains("updated"));
        assert!(colorize_outcome(TargetOutcome::Unchanged).contains("unchanged"));
        assert!(colorize_outcome(TargetOutcome::WouldUpdate).contains("would update"));
    }

    #[test]
    fn display_path_strips_base() {
        let shown = display_path(Path::new("proj/crates/a/Cargo.toml"), Path::new("proj"));
        assert_eq!(shown, Path::new("crates/a/Cargo.toml").display().to_string());
    }

    #[test]
    fn display_path_keeps_foreign_paths() {
        let shown = display_path(Path::new("/elsewhere/Cargo.toml"), Path::new("proj"));
        assert_eq!(shown, "/elsewhere/Cargo.toml");
    }

    #[test]
    fn exit_codes_are_distinct() {
        assert_ne!(EXIT_SUCCESS, EXIT_FAILURE);
        assert_ne!(EXIT_FAILURE, EXIT_MANIFEST_ERROR);
        assert_ne!(EXIT_MANIFEST_ERROR, EXIT_DRIFT);
    }
}
