//! JSON report renderer, for machine consumption.

use chrono::{DateTime, Utc};
use newsbrief_shared::{FailedFetch, NewsBriefError, Report, Result};
use serde::Serialize;

use crate::{DocumentRenderer, RenderContext};

/// Renders the report plus render context as pretty-printed JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

#[derive(Serialize)]
struct JsonDocument<'a> {
    generated_at: DateTime<Utc>,
    #[serde(flatten)]
    report: &'a Report,
    #[serde(skip_serializing_if = "no_failures")]
    failed: &'a [FailedFetch],
}

fn no_failures(failed: &&[FailedFetch]) -> bool {
    failed.is_empty()
}

impl DocumentRenderer for JsonRenderer {
    fn render(&self, report: &Report, ctx: &RenderContext) -> Result<Vec<u8>> {
        let doc = JsonDocument {
            generated_at: ctx.generated_at,
            report,
            failed: &ctx.failed,
        };
        let mut bytes = serde_json::to_vec_pretty(&doc).map_err(|e| {
            NewsBriefError::validation(format!("JSON serialization failed: {e}"))
        })?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use newsbrief_shared::SeedRef;

    #[test]
    fn flattens_report_fields() {
        let report = Report {
            seed: SeedRef {
                url: "https://a.com".into(),
                title: "A".into(),
            },
            keywords: vec!["k".into()],
            summary_text: "s".into(),
            conclusion_text: String::new(),
            sources: vec![],
        };
        let ctx = RenderContext::new(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single().expect("ts"));

        let bytes = JsonRenderer.render(&report, &ctx).expect("render");
        let value: serde_json::Value = serde_json::from_slice(&bytes).expect("json");

        assert_eq!(value["summary_text"], "s");
        assert_eq!(value["seed"]["title"], "A");
        assert_eq!(value["generated_at"], "2025-01-01T00:00:00Z");
        assert!(value.get("failed").is_none());
    }
}
