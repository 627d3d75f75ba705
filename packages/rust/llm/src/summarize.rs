//! Single-call summarization of the aggregated article texts.

use std::sync::{Arc, LazyLock};

use newsbrief_shared::{AggregatedContent, Candidate, NewsBriefError, Result};
use regex::Regex;
use tracing::{debug, info, instrument};

use crate::client::{CompletionClient, Prompt};

/// A truncated tail shorter than this is not worth including.
const MIN_TAIL_CHARS: usize = 200;

const SYSTEM_PROMPT: &str = "You are a senior news analyst. You write concise, factual briefings \
that compare how several outlets cover the same story. Never invent facts that are not in the articles.";

/// Summarizer output before it is folded into a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub summary_text: String,
    pub conclusion_text: String,
    /// Candidates whose text entered the prompt, in rank order.
    pub sources: Vec<Candidate>,
}

/// Prompt text plus the candidates it covers.
#[derive(Debug, Clone)]
pub struct SummaryInput {
    pub body: String,
    pub sources: Vec<Candidate>,
}

// ---------------------------------------------------------------------------
// Summarizer
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct Summarizer {
    client: Arc<dyn CompletionClient>,
    input_budget: usize,
    max_chars: usize,
    max_output_tokens: u32,
}

impl Summarizer {
    /// `input_budget` bounds the article text sent (in chars); `max_chars`
    /// bounds the returned summary.
    pub fn new(
        client: Arc<dyn CompletionClient>,
        input_budget: usize,
        max_chars: usize,
        max_output_tokens: u32,
    ) -> Self {
        Self {
            client,
            input_budget,
            max_chars,
            max_output_tokens,
        }
    }

    /// Summarize everything in `aggregated` with one completion request.
    ///
    /// Fails with `EmptyInput` when there is nothing to summarize.
    #[instrument(skip_all, fields(entries = aggregated.len(), budget = self.input_budget))]
    pub async fn summarize(&self, aggregated: &AggregatedContent) -> Result<Summary> {
        if aggregated.is_empty() {
            return Err(NewsBriefError::EmptyInput);
        }

        let input = build_input(aggregated, self.input_budget);
        debug!(
            included = input.sources.len(),
            prompt_chars = input.body.chars().count(),
            "summary prompt built"
        );

        let prompt = Prompt {
            system: SYSTEM_PROMPT.into(),
            user: summary_prompt(&input.body),
            max_output_tokens: self.max_output_tokens,
        };
        let reply = self.client.complete(&prompt).await?;
        let (summary_text, conclusion_text) = parse_summary(&reply, self.max_chars)?;

        info!(
            sources = input.sources.len(),
            summary_chars = summary_text.chars().count(),
            has_conclusion = !conclusion_text.is_empty(),
            "summary generated"
        );

        Ok(Summary {
            summary_text,
            conclusion_text,
            sources: input.sources,
        })
    }
}

fn summary_prompt(body: &str) -> String {
    format!(
        "Below are news articles on the same topic, numbered by relevance.\n\n\
         Write a briefing with these parts:\n\
         1. An executive summary of the story.\n\
         2. The key developments, citing article numbers like [1].\n\
         3. A comparison of how the outlets frame the story differently.\n\
         Start the briefing with a line `SUMMARY:`. Finish with a line `CONCLUSION:` \
         followed by a short overall conclusion.\n\
         Write in the language of the articles.\n\n\
         {body}"
    )
}

// ---------------------------------------------------------------------------
// Prompt budget
// ---------------------------------------------------------------------------

/// Concatenate entries in rank order until `budget` chars are used.
///
/// The first entry is always included (truncated if needed); later entries
/// are truncated to the remaining budget only when a useful tail remains.
pub fn build_input(aggregated: &AggregatedContent, budget: usize) -> SummaryInput {
    let mut body = String::new();
    let mut sources = Vec::new();
    let mut used = 0;

    for (i, entry) in aggregated.entries().iter().enumerate() {
        let header = format!(
            "[{}] {}\n{}\n",
            i + 1,
            entry.candidate.title,
            entry.candidate.url
        );
        let block_chars = header.chars().count() + entry.text.chars().count();
        let remaining = budget.saturating_sub(used);

        if block_chars <= remaining {
            body.push_str(&header);
            body.push_str(&entry.text);
            body.push_str("\n\n");
            used += block_chars;
            sources.push(entry.candidate.clone());
            continue;
        }

        let text_room = remaining.saturating_sub(header.chars().count());
        if sources.is_empty() || text_room >= MIN_TAIL_CHARS {
            body.push_str(&header);
            body.push_str(&truncate_chars(&entry.text, text_room.max(1)));
            body.push_str("\n\n");
            sources.push(entry.candidate.clone());
        }
        break;
    }

    SummaryInput {
        body: body.trim_end().to_string(),
        sources,
    }
}

// ---------------------------------------------------------------------------
// Reply parsing
// ---------------------------------------------------------------------------

/// Split a reply into `(summary, conclusion)` on the `CONCLUSION:` marker.
///
/// Without the marker the whole reply is the summary and the conclusion is
/// empty. A blank reply is a `Parse` error.
pub fn parse_summary(reply: &str, max_chars: usize) -> Result<(String, String)> {
    static SUMMARY_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?im)^[\s#*]*summary[\s*]*:[\s*]*").expect("valid regex")
    });
    static CONCLUSION_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?im)^[\s#*]*conclusion[\s*]*:[\s*]*").expect("valid regex")
    });

    let reply = reply.trim();
    if reply.is_empty() {
        return Err(NewsBriefError::parse("model returned an empty summary"));
    }

    let (summary_part, conclusion_part) = match CONCLUSION_RE.find(reply) {
        Some(m) => (&reply[..m.start()], reply[m.end()..].trim()),
        None => (reply, ""),
    };

    let summary = SUMMARY_RE.replace(summary_part, "").trim().to_string();
    if summary.is_empty() {
        return Err(NewsBriefError::parse("summary section is empty"));
    }

    Ok((
        truncate_chars(&summary, max_chars),
        conclusion_part.to_string(),
    ))
}

/// Truncate to at most `max` characters on a char boundary.
fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use newsbrief_shared::{ErrorKind, FetchResult};

    struct FixedClient {
        reply: String,
        prompts: Mutex<Vec<Prompt>>,
    }

    impl FixedClient {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.into(),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CompletionClient for FixedClient {
        async fn complete(&self, prompt: &Prompt) -> Result<String> {
            self.prompts.lock().expect("lock").push(prompt.clone());
            Ok(self.reply.clone())
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    fn aggregated(texts: &[&str]) -> AggregatedContent {
        let results: Vec<FetchResult> = texts
            .iter()
            .enumerate()
            .map(|(rank, text)| FetchResult::Success {
                candidate: Candidate {
                    url: format!("https://news.example.com/{rank}"),
                    title: format!("Story {rank}"),
                    source_rank: rank,
                    published_at: None,
                },
                extracted_text: text.to_string(),
                page_title: None,
            })
            .collect();
        AggregatedContent::from_results(&results)
    }

    #[tokio::test]
    async fn empty_input_is_reported() {
        let client = FixedClient::new("SUMMARY: x");
        let summarizer = Summarizer::new(client.clone(), 1000, 1000, 256);

        let err = summarizer
            .summarize(&AggregatedContent::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::EmptyInput);
        assert!(client.prompts.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn splits_summary_and_conclusion() {
        let client = FixedClient::new(
            "SUMMARY:\nRates were held.\n[1] and [2] agree.\n\nCONCLUSION: Expect a cut in May.",
        );
        let summarizer = Summarizer::new(client.clone(), 10_000, 10_000, 256);

        let summary = summarizer
            .summarize(&aggregated(&["alpha text", "beta text"]))
            .await
            .expect("summarize");

        assert_eq!(summary.summary_text, "Rates were held.\n[1] and [2] agree.");
        assert_eq!(summary.conclusion_text, "Expect a cut in May.");
        assert_eq!(summary.sources.len(), 2);

        let prompts = client.prompts.lock().expect("lock");
        let user = &prompts[0].user;
        assert!(user.find("alpha text") < user.find("beta text"));
        assert_eq!(prompts[0].max_output_tokens, 256);
    }

    #[test]
    fn missing_conclusion_keeps_whole_reply_as_summary() {
        let (summary, conclusion) =
            parse_summary("Markets rallied after the decision.", 100).expect("parse");
        assert_eq!(summary, "Markets rallied after the decision.");
        assert_eq!(conclusion, "");
    }

    #[test]
    fn markdown_styled_markers_are_recognized() {
        let (summary, conclusion) =
            parse_summary("## **Summary:** Body here\n\n**Conclusion:** Wrap up", 100)
                .expect("parse");
        assert_eq!(summary, "Body here");
        assert_eq!(conclusion, "Wrap up");
    }

    #[test]
    fn blank_reply_is_parse_error() {
        assert_eq!(parse_summary("   \n", 100).unwrap_err().kind(), ErrorKind::Parse);
    }

    #[test]
    fn summary_truncates_on_char_boundary() {
        let (summary, _) = parse_summary("한국은행 기준금리 동결", 6).expect("parse");
        assert_eq!(summary, "한국은행 기");
    }

    #[test]
    fn budget_keeps_earliest_entries() {
        let agg = aggregated(&[&"a".repeat(600), &"b".repeat(600), &"c".repeat(600)]);

        let input = build_input(&agg, 800);

        let ranks: Vec<_> = input.sources.iter().map(|c| c.source_rank).collect();
        assert_eq!(ranks, vec![0]);
        assert!(input.body.contains("[1] Story 0"));
        assert!(!input.body.contains("[2]"));
    }

    #[test]
    fn budget_includes_useful_tail() {
        let agg = aggregated(&[&"a".repeat(300), &"b".repeat(2000)]);

        let input = build_input(&agg, 1000);

        assert_eq!(input.sources.len(), 2);
        assert!(input.body.chars().count() <= 1000 + 4);
        assert!(input.body.contains("bbbb"));
    }

    #[test]
    fn first_entry_always_included_even_over_budget() {
        let agg = aggregated(&[&"z".repeat(5000)]);
        let input = build_input(&agg, 100);
        assert_eq!(input.sources.len(), 1);
        assert!(input.body.chars().count() < 200);
    }
}
