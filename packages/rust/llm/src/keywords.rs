//! Keyword derivation from the seed article.

use std::sync::{Arc, LazyLock};

use newsbrief_shared::{ErrorKind, KeywordSet, NewsBriefError, Result};
use regex::Regex;
use tracing::{debug, info, instrument, warn};

use crate::client::{CompletionClient, Prompt};

/// Seed body characters included in the keyword prompt.
const SEED_PROMPT_CHARS: usize = 6_000;

/// Entries with more words than this are prose, not keywords.
const MAX_KEYWORD_WORDS: usize = 6;

const SYSTEM_PROMPT: &str = "You are a news desk editor who picks search keywords for finding related coverage of a story.";

const FALLBACK_SYSTEM_PROMPT: &str = "Reply with search keywords only, as a single comma-separated line. No numbering, no explanations.";

// ---------------------------------------------------------------------------
// KeywordExtractor
// ---------------------------------------------------------------------------

/// Asks the language model for the most searchable terms of an article.
#[derive(Clone)]
pub struct KeywordExtractor {
    client: Arc<dyn CompletionClient>,
    max_output_tokens: u32,
    fallback_prompt: bool,
}

impl KeywordExtractor {
    pub fn new(client: Arc<dyn CompletionClient>, max_output_tokens: u32) -> Self {
        Self {
            client,
            max_output_tokens,
            fallback_prompt: false,
        }
    }

    /// Retry once with a stricter prompt when the first reply cannot be parsed.
    pub fn with_fallback_prompt(mut self, enabled: bool) -> Self {
        self.fallback_prompt = enabled;
        self
    }

    /// Derive at most `max_keywords` distinct keywords for the seed.
    ///
    /// `max_keywords == 0` yields an empty set without contacting the model.
    #[instrument(skip_all, fields(max_keywords, seed_chars = seed_text.chars().count()))]
    pub async fn derive(
        &self,
        seed_title: &str,
        seed_text: &str,
        max_keywords: usize,
    ) -> Result<KeywordSet> {
        if max_keywords == 0 {
            return Ok(KeywordSet::empty());
        }

        let prompt = keyword_prompt(seed_title, seed_text, max_keywords, self.max_output_tokens);
        let reply = self.client.complete(&prompt).await?;

        let keywords = match parse_keywords(&reply, max_keywords) {
            Err(e) if e.kind() == ErrorKind::Parse && self.fallback_prompt => {
                warn!(error = %e, "keyword reply unusable, retrying with fallback prompt");
                let prompt =
                    fallback_prompt(seed_title, seed_text, max_keywords, self.max_output_tokens);
                let reply = self.client.complete(&prompt).await?;
                parse_keywords(&reply, max_keywords)?
            }
            other => other?,
        };

        info!(keywords = ?keywords.as_slice(), "keywords derived");
        Ok(keywords)
    }
}

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

fn keyword_prompt(title: &str, text: &str, max_keywords: usize, max_tokens: u32) -> Prompt {
    let body: String = text.chars().take(SEED_PROMPT_CHARS).collect();
    Prompt {
        system: SYSTEM_PROMPT.into(),
        user: format!(
            "Extract the {max_keywords} most important search keywords from this news article.\n\
             Prefer nouns and proper nouns, favouring terms that appear in the headline.\n\
             Write the keywords in the article's language, one per line, most important first.\n\n\
             Headline: {title}\n\n\
             Article:\n{body}"
        ),
        max_output_tokens: max_tokens,
    }
}

fn fallback_prompt(title: &str, text: &str, max_keywords: usize, max_tokens: u32) -> Prompt {
    let body: String = text.chars().take(SEED_PROMPT_CHARS / 2).collect();
    Prompt {
        system: FALLBACK_SYSTEM_PROMPT.into(),
        user: format!(
            "List exactly {max_keywords} short search keywords (one to three words each) \
             for this article, separated by commas.\n\n{title}\n\n{body}"
        ),
        max_output_tokens: max_tokens,
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Decompose a model reply into keywords.
///
/// Splits on newlines and commas, strips list numbering, bullets, quotes and
/// hashes, drops empty or sentence-length entries, dedupes case-insensitively
/// and truncates to `max_keywords`. A reply with no usable entry is a `Parse`
/// error.
pub fn parse_keywords(reply: &str, max_keywords: usize) -> Result<KeywordSet> {
    static LIST_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)^\s*(?:\d+\s*[.):]|[-*•·]|keywords?\s*:)\s*").expect("valid regex")
    });

    let cleaned = reply
        .split(['\n', ','])
        .map(|raw| {
            LIST_MARKER_RE
                .replace(raw, "")
                .trim_matches(|c: char| {
                    c.is_whitespace() || matches!(c, '"' | '\'' | '`' | '#' | '“' | '”' | '‘' | '’')
                })
                .to_string()
        })
        .filter(|kw| !kw.is_empty() && kw.split_whitespace().count() <= MAX_KEYWORD_WORDS);

    let keywords = KeywordSet::bounded(cleaned, max_keywords);
    if keywords.is_empty() {
        return Err(NewsBriefError::parse(format!(
            "no keywords found in model reply ({} chars)",
            reply.chars().count()
        )));
    }

    debug!(count = keywords.len(), "keywords parsed");
    Ok(keywords)
}
