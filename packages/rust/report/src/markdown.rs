//! Markdown report renderer.

use std::fmt::Write as _;

use newsbrief_shared::{Report, Result};

use crate::outlet::outlet_name;
use crate::{DocumentRenderer, RenderContext};

const DEFAULT_TITLE: &str = "News briefing";

/// Renders a report as a standalone Markdown document.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl DocumentRenderer for MarkdownRenderer {
    fn render(&self, report: &Report, ctx: &RenderContext) -> Result<Vec<u8>> {
        Ok(render_markdown(report, ctx).into_bytes())
    }

    fn extension(&self) -> &'static str {
        "md"
    }
}

fn render_markdown(report: &Report, ctx: &RenderContext) -> String {
    let mut out = String::new();

    let title = match report.seed.title.trim() {
        "" => DEFAULT_TITLE,
        t => t,
    };
    // Writing to a String never fails.
    let _ = writeln!(out, "# {}\n", escape(title));
    let _ = writeln!(
        out,
        "_Generated {} from <{}>_\n",
        ctx.generated_at.format("%Y-%m-%d %H:%M %Z"),
        report.seed.url
    );

    if !report.keywords.is_empty() {
        let _ = writeln!(out, "**Keywords:** {}\n", escape(&report.keywords.join(", ")));
    }

    let _ = writeln!(out, "## Summary\n\n{}\n", report.summary_text.trim());

    if !report.conclusion_text.trim().is_empty() {
        let _ = writeln!(out, "## Conclusion\n\n{}\n", report.conclusion_text.trim());
    }

    if !report.sources.is_empty() {
        out.push_str("## References\n\n");
        for (i, source) in report.sources.iter().enumerate() {
            let mut detail = outlet_name(&source.url);
            if let Some(ts) = source.published_at {
                let _ = write!(detail, ", {}", ts.format("%Y-%m-%d"));
            }
            let _ = writeln!(
                out,
                "{}. [{}]({}) ({detail})",
                i + 1,
                escape(&source.title),
                source.url
            );
        }
        out.push('\n');
    }

    if !ctx.failed.is_empty() {
        out.push_str("## Failed links\n\n");
        for failed in &ctx.failed {
            let _ = writeln!(out, "- <{}> ({})", failed.candidate.url, failed.kind);
        }
        out.push('\n');
    }

    let trimmed_len = out.trim_end().len();
    out.truncate(trimmed_len);
    out.push('\n');
    out
}

/// Escape characters that would break inline Markdown link text.
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '[' | ']' | '*' | '_' | '`') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
