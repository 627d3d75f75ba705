//! Publication-date window filtering.

use newsbrief_shared::DateWindow;

use crate::provider::SearchHit;

/// Keep only hits published inside `window`. Undated hits are dropped.
///
/// Dates are compared in the publisher's own UTC offset, so an article dated
/// 2025-03-01 00:30 +09:00 belongs to March 1st.
pub fn apply_window(hits: Vec<SearchHit>, window: Option<&DateWindow>) -> Vec<SearchHit> {
    let Some(window) = window else {
        return hits;
    };

    hits.into_iter()
        .filter(|hit| {
            hit.published_at
                .is_some_and(|ts| window.contains(ts.date_naive()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, NaiveDate};

    fn hit(url: &str, date: Option<&str>) -> SearchHit {
        SearchHit {
            url: url.into(),
            title: url.into(),
            published_at: date.map(|d| DateTime::parse_from_rfc2822(d).expect("valid date")),
        }
    }

    fn march() -> DateWindow {
        DateWindow::new(
            NaiveDate::from_ymd_opt(2025, 3, 1).expect("date"),
            NaiveDate::from_ymd_opt(2025, 3, 31).expect("date"),
        )
        .expect("window")
    }

    #[test]
    fn no_window_keeps_everything() {
        let hits = vec![hit("a", None), hit("b", Some("Sat, 01 Feb 2025 10:00:00 +0900"))];
        assert_eq!(apply_window(hits, None).len(), 2);
    }

    #[test]
    fn window_drops_undated_and_out_of_range() {
        let hits = vec![
            hit("undated", None),
            hit("feb", Some("Fri, 28 Feb 2025 23:59:00 +0900")),
            hit("march", Some("Sat, 01 Mar 2025 00:30:00 +0900")),
            hit("april", Some("Tue, 01 Apr 2025 09:00:00 +0900")),
        ];
        let kept: Vec<_> = apply_window(hits, Some(&march()))
            .into_iter()
            .map(|h| h.url)
            .collect();
        assert_eq!(kept, vec!["march"]);
    }
}
