//! Status message functions for terminal output.

use owo_colors::{OwoColorize, Stream::Stderr};

/// Print a success message to stderr.
///
/// ```no_run
/// use karium_cli::ui::success;
///
/// success("Build succeeded");
/// ```
pub fn success(message: &str) {
    eprintln!(
        "{} {}",
        "✓".if_supports_color(Stderr, |t| t.green().bold().to_string()),
        message
    );
}

/// Print an info message to stderr.
pub fn info(message: &str) {
    eprintln!(
        "{} {}",
        "ℹ".if_supports_color(Stderr, |t| t.blue().bold().to_string()),
        message
    );
}

/// Print a warning message to stderr.
pub fn warning(message: &str) {
    eprintln!(
        "{} {}",
        "⚠".if_supports_color(Stderr, |t| t.yellow().bold().to_string()),
        message.if_supports_color(Stderr, |t| t.yellow())
    );
}

/// Print every build warning under a single heading.
pub fn warnings<'a>(items: impl IntoIterator<Item = &'a String>) {
    let items: Vec<&String> = items.into_iter().collect();
    if items.is_empty() {
        return;
    }
    warning("Build is done with some warnings:");
    for item in items {
        eprintln!("  - {}", item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_messages() {
        // These should not panic
        success("Success message");
        info("Info message");
        warning("Warning message");
        warnings(&["one".to_string(), "two".to_string()]);
        warnings(&Vec::<String>::new());
    }
}
