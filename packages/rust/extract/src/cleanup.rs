//! Post-extraction cleanup pipeline for article text.
//!
//! Each cleanup pass is a function `&str -> String` applied in sequence.
//! The pipeline drops boilerplate lines, collapses whitespace, and trims.

use std::sync::LazyLock;

use regex::Regex;

/// Run the full cleanup pipeline on raw extracted text.
pub(crate) fn run_pipeline(text: &str) -> String {
    let mut result = text.to_string();

    result = collapse_inline_whitespace(&result);
    result = drop_boilerplate_lines(&result);
    result = drop_blank_lines(&result);

    result.trim().to_string()
}

// ---------------------------------------------------------------------------
// Pass 1: Collapse whitespace within each line
// ---------------------------------------------------------------------------

/// Turn runs of spaces/tabs/nbsp into a single space and trim each line.
fn collapse_inline_whitespace(text: &str) -> String {
    static WS_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[ \t\u{00A0}\u{200B}\u{3000}]+").expect("valid regex"));

    text.lines()
        .map(|line| WS_RE.replace_all(line, " ").trim().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Pass 2: Drop boilerplate lines
// ---------------------------------------------------------------------------

/// Remove copyright notices, redistribution warnings, and bare contact lines.
fn drop_boilerplate_lines(text: &str) -> String {
    static BOILERPLATE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(
            r"(?i)(copyright\s|ⓒ|©|all rights reserved|무단\s*전재|재배포\s*금지|구독\s*신청|기사\s*제보|sign up for our newsletter|subscribe to)",
        )
        .expect("valid regex")
    });
    static CONTACT_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^[\w.+-]+@[\w-]+(\.[\w-]+)+$").expect("valid regex")
    });

    text.lines()
        .filter(|line| {
            // Short lines only: a long paragraph that mentions "copyright" is content.
            let short = line.chars().count() < 120;
            !(short && BOILERPLATE_RE.is_match(line)) && !CONTACT_RE.is_match(line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Pass 3: Drop blank lines
// ---------------------------------------------------------------------------

/// Keep one paragraph per line.
fn drop_blank_lines(text: &str) -> String {
    text.lines()
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapse_inline_whitespace_squeezes_runs() {
        let input = "  Rates \t rose\u{00A0}\u{00A0}again  \nnext";
        assert_eq!(collapse_inline_whitespace(input), "Rates rose again\nnext");
    }

    #[test]
    fn drop_boilerplate_removes_short_notices() {
        let input = "Markets rallied on Tuesday.\nCopyright 2025 Example News\nⓒ 연합뉴스, 무단 전재 및 재배포 금지\nreporter@example.com";
        assert_eq!(drop_boilerplate_lines(input), "Markets rallied on Tuesday.");
    }

    #[test]
    fn drop_boilerplate_keeps_long_paragraphs() {
        let long = format!(
            "{} the court ruled on the copyright dispute between the two publishers.",
            "After months of hearings".repeat(4)
        );
        assert_eq!(drop_boilerplate_lines(&long), long);
    }

    #[test]
    fn full_pipeline_cleans_text() {
        let input = "\n\n  First   paragraph.  \n\n\n\nSecond paragraph.\nAll rights reserved.\n";
        assert_eq!(run_pipeline(input), "First paragraph.\nSecond paragraph.");
    }
}
