//! Seed article loading.

use std::time::Duration;

use newsbrief_crawler::PageFetcher;
use newsbrief_extract::extract_article;
use newsbrief_shared::{NewsBriefError, Result, SeedArticle};
use tracing::{debug, info, instrument};
use url::Url;

/// Where the seed article comes from.
#[derive(Debug, Clone)]
pub enum SeedInput {
    /// Fetch the page behind this URL.
    Url(String),
    /// Markup already in hand; `url` is kept for attribution.
    Markup { url: String, markup: String },
}

impl SeedInput {
    pub fn url(&self) -> &str {
        match self {
            Self::Url(url) | Self::Markup { url, .. } => url,
        }
    }
}

/// Resolve `input` into an extracted [`SeedArticle`].
///
/// URL seeds get a single fetch attempt. A page with no extractable text is
/// an `EmptyContent` error.
#[instrument(skip_all, fields(url = %input.url()))]
pub async fn load_seed(
    input: SeedInput,
    fetcher: &dyn PageFetcher,
    timeout: Duration,
) -> Result<SeedArticle> {
    let (url, raw_markup) = match input {
        SeedInput::Url(url) => {
            validate_seed_url(&url)?;
            let markup = fetcher.fetch(&url, timeout).await?;
            (url, markup)
        }
        SeedInput::Markup { url, markup } => (url, markup),
    };

    let article = extract_article(&raw_markup);
    let chars = article.text.chars().count();
    if article.text.trim().is_empty() {
        return Err(NewsBriefError::EmptyContent { url, chars });
    }
    debug!(chars, has_title = article.title.is_some(), "seed extracted");

    let title = article.title.unwrap_or_else(|| url.clone());
    info!(%title, chars, "seed loaded");

    Ok(SeedArticle {
        url,
        raw_markup,
        title,
        extracted_text: article.text,
    })
}

fn validate_seed_url(raw: &str) -> Result<()> {
    let url = Url::parse(raw)
        .map_err(|e| NewsBriefError::validation(format!("invalid seed URL '{raw}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(NewsBriefError::validation(format!(
            "unsupported seed URL scheme '{other}': {raw}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use newsbrief_shared::ErrorKind;

    struct StaticFetcher(Result<String>);

    #[async_trait]
    impl PageFetcher for StaticFetcher {
        async fn fetch(&self, _url: &str, _timeout: Duration) -> Result<String> {
            match &self.0 {
                Ok(markup) => Ok(markup.clone()),
                Err(e) => Err(NewsBriefError::Network(e.to_string())),
            }
        }
    }

    const PAGE: &str = r#"<html><head><title>Site | Rates held</title>
        <meta property="og:title" content="Rates held at 2.75%"></head>
        <body><nav>Home</nav><article><p>The central bank kept its policy rate unchanged on Tuesday.</p></article></body></html>"#;

    #[tokio::test]
    async fn url_seed_is_fetched_and_extracted() {
        let fetcher = StaticFetcher(Ok(PAGE.into()));
        let seed = load_seed(
            SeedInput::Url("https://news.example.com/a".into()),
            &fetcher,
            Duration::from_secs(1),
        )
        .await
        .expect("seed");

        assert_eq!(seed.title, "Rates held at 2.75%");
        assert!(seed.extracted_text.contains("policy rate unchanged"));
        assert!(!seed.extracted_text.contains("Home"));
        assert_eq!(seed.url, "https://news.example.com/a");
    }

    #[tokio::test]
    async fn markup_seed_skips_fetch() {
        let fetcher = StaticFetcher(Err(NewsBriefError::Network("unused".into())));
        let seed = load_seed(
            SeedInput::Markup {
                url: "https://news.example.com/a".into(),
                markup: "<p>Plain body text.</p>".into(),
            },
            &fetcher,
            Duration::from_secs(1),
        )
        .await
        .expect("seed");

        assert_eq!(seed.title, "https://news.example.com/a");
        assert_eq!(seed.extracted_text, "Plain body text.");
    }

    #[tokio::test]
    async fn fetch_failure_is_network_error() {
        let fetcher = StaticFetcher(Err(NewsBriefError::Network("refused".into())));
        let err = load_seed(
            SeedInput::Url("https://news.example.com/a".into()),
            &fetcher,
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
    }

    #[tokio::test]
    async fn empty_body_is_empty_content() {
        let fetcher = StaticFetcher(Ok("<html><body><script>x()</script></body></html>".into()));
        let err = load_seed(
            SeedInput::Url("https://news.example.com/a".into()),
            &fetcher,
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyContent);
    }

    #[tokio::test]
    async fn non_http_url_rejected() {
        let fetcher = StaticFetcher(Ok(PAGE.into()));
        let err = load_seed(
            SeedInput::Url("ftp://news.example.com/a".into()),
            &fetcher,
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
