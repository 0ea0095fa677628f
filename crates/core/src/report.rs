//! Terminal formatting for the returned analysis report.

/// Width of the banner rules around the report title.
const BANNER_WIDTH: usize = 40;

/// Formats the model's analysis text for terminal output.
#[derive(Debug, Clone, Default)]
pub struct ReportFormatter;

impl ReportFormatter {
    /// Create a new report formatter.
    pub fn new() -> Self {
        Self
    }

    /// Wrap the report body in a titled banner.
    ///
    /// # Example output
    /// ```text
    /// ========================================
    ///       AI Inconsistency Report
    /// ========================================
    /// **Conflicting Revenue Projections** ...
    /// ```
    pub fn format(&self, report_body: &str) -> String {
        let rule = "=".repeat(BANNER_WIDTH);
        format!(
            "{rule}\n      AI Inconsistency Report\n{rule}\n{}",
            report_body.trim_end()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_surrounds_title() {
        let out = ReportFormatter::new().format("body text");
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines[0], "=".repeat(40));
        assert!(lines[1].contains("AI Inconsistency Report"));
        assert_eq!(lines[2], "=".repeat(40));
        assert_eq!(lines[3], "body text");
    }

    #[test]
    fn test_trailing_whitespace_trimmed() {
        let out = ReportFormatter::new().format("report\n\n\n");
        assert!(out.ends_with("report"));
    }
}
