//! Formatting utilities for sizes and the build report.

use std::path::Path;

use karium_build::{BuildReport, ReportChunk};
use owo_colors::{OwoColorize, Stream::Stderr};

/// Format file size in human-readable format.
///
/// Converts bytes to the most appropriate unit (B, KB, MB, GB).
///
/// ```
/// use karium_cli::ui::format_size;
///
/// assert_eq!(format_size(0), "0 B");
/// assert_eq!(format_size(500), "500 B");
/// assert_eq!(format_size(1024), "1.00 KB");
/// assert_eq!(format_size(1_048_576), "1.00 MB");
/// ```
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", size as u64, UNITS[unit_idx])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

/// Print the size report to stderr with paths relative to `cwd`.
pub fn print_build_report(report: &BuildReport, cwd: &Path) {
    for line in report_lines(report, cwd) {
        eprintln!("{}", line);
    }
}

/// Render the report one line per output.
///
/// Each entry line is followed by its chunks (`└─`) and the embedded
/// `node_modules` modules (`📦`), then orphan chunks and the total.
pub fn report_lines(report: &BuildReport, cwd: &Path) -> Vec<String> {
    let mut lines = Vec::new();

    for entry in &report.entries {
        let mut details = Vec::new();
        if entry.total_bytes > 0 {
            details.push(format!("total size: {}", format_size(entry.total_bytes)));
        }
        if let Some(bytes) = entry.bytes.filter(|&b| b > 0) {
            details.push(format!("chunk size: {}", format_size(bytes)));
        }
        if !entry.exports.is_empty() {
            details.push(format!("exports: {}", entry.exports.join(", ")));
        }

        lines.push(format!(
            "  {} ({})",
            display_path(&entry.path, cwd).if_supports_color(Stderr, |t| t.bold().to_string()),
            details.join(", ").if_supports_color(Stderr, |t| t.dimmed().to_string())
        ));

        for chunk in &entry.chunks {
            lines.push(format!("    └─ {}", chunk_line(chunk, cwd)));
        }

        for module in &entry.modules {
            lines.push(format!(
                "    📦 {}{}",
                module.id.if_supports_color(Stderr, |t| t.dimmed().to_string()),
                size_suffix(Some(module.bytes))
            ));
        }
    }

    for chunk in &report.orphan_chunks {
        lines.push(format!("  {}", chunk_line(chunk, cwd)));
    }

    lines.push(format!(
        "Σ Total dist size (byte size): {}",
        format_size(report.total_bytes).if_supports_color(Stderr, |t| t.cyan().to_string())
    ));

    lines
}

fn chunk_line(chunk: &ReportChunk, cwd: &Path) -> String {
    format!(
        "{}{}",
        display_path(&chunk.path, cwd).if_supports_color(Stderr, |t| t.dimmed().to_string()),
        size_suffix(chunk.bytes)
    )
}

/// ` (<size>)`, or nothing for unmeasured and empty files.
fn size_suffix(bytes: Option<u64>) -> String {
    match bytes {
        Some(bytes) if bytes > 0 => format!(" ({})", format_size(bytes)),
        _ => String::new(),
    }
}

/// `path` relative to `cwd` with `/` separators, or as-is outside it.
pub fn display_path(path: &Path, cwd: &Path) -> String {
    match path.strip_prefix(cwd) {
        Ok(relative) => relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => path.to_string_lossy().into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use karium_build::{ModuleSize, ReportEntry};
    use std::path::PathBuf;

    #[test]
    fn test_format_size_bytes() {
        assert_eq!(format_size(1), "1 B");
        assert_eq!(format_size(1023), "1023 B");
    }

    #[test]
    fn test_format_size_units() {
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1_572_864), "1.50 MB");
        assert_eq!(format_size(2_147_483_648), "2.00 GB");
    }

    #[test]
    fn paths_are_shown_relative_to_cwd() {
        let cwd = PathBuf::from("/work/pkg");
        assert_eq!(display_path(&cwd.join("dist/index.mjs"), &cwd), "dist/index.mjs");
        assert_eq!(display_path(Path::new("/elsewhere/a.mjs"), &cwd), "/elsewhere/a.mjs");
    }

    #[test]
    fn report_lists_chunks_modules_and_total() {
        let cwd = PathBuf::from("/work/pkg");
        let report = BuildReport {
            name: "pkg".into(),
            entries: vec![ReportEntry {
                path: cwd.join("dist/index.mjs"),
                total_bytes: 300,
                bytes: Some(200),
                exports: vec!["a".into(), "b".into()],
                chunks: vec![ReportChunk {
                    path: cwd.join("dist/chunks/shared.mjs"),
                    bytes: Some(100),
                }],
                modules: vec![ModuleSize {
                    id: "node_modules/dep/index.js".into(),
                    bytes: 50,
                }],
            }],
            orphan_chunks: vec![ReportChunk {
                path: cwd.join("dist/extra.txt"),
                bytes: Some(4),
            }],
            total_bytes: 304,
        };

        let lines = report_lines(&report, &cwd);
        assert_eq!(lines.len(), 5);
        assert!(lines[0].contains("dist/index.mjs"));
        assert!(lines[0].contains("total size: 300 B"));
        assert!(lines[0].contains("chunk size: 200 B"));
        assert!(lines[0].contains("exports: a, b"));
        assert!(lines[1].contains("└─"));
        assert!(lines[1].contains("dist/chunks/shared.mjs"));
        assert!(lines[2].contains("📦"));
        assert!(lines[2].contains("50 B"));
        assert!(lines[3].contains("dist/extra.txt"));
        assert!(lines[4].starts_with("Σ Total dist size (byte size): "));
        assert!(lines[4].contains("304 B"));
    }

    #[test]
    fn sizes_appear_only_when_known() {
        let cwd = PathBuf::from("/work/pkg");
        let entry = |path: &str, total_bytes, bytes| ReportEntry {
            path: cwd.join(path),
            total_bytes,
            bytes,
            exports: Vec::new(),
            chunks: Vec::new(),
            modules: Vec::new(),
        };
        let report = BuildReport {
            name: "pkg".into(),
            entries: vec![
                entry("dist/index.mjs", 120, Some(120)),
                entry("dist/empty.mjs", 0, Some(0)),
            ],
            orphan_chunks: vec![ReportChunk {
                path: cwd.join("dist/unmeasured.txt"),
                bytes: None,
            }],
            total_bytes: 120,
        };

        let lines = report_lines(&report, &cwd);
        assert!(lines[0].contains("total size: 120 B"));
        assert!(lines[0].contains("chunk size: 120 B"));
        assert!(!lines[1].contains("total size"));
        assert!(!lines[1].contains("chunk size"));
        assert!(lines[2].contains("dist/unmeasured.txt"));
        assert!(!lines[2].contains('('));
    }
}
