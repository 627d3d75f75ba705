//! Outlet display names derived from article hosts.

use url::Url;

/// Second-level labels that sit between the outlet name and a country TLD.
const GENERIC_SLDS: &[&str] = &["co", "or", "ne", "go", "ac", "com", "net", "org"];

/// Publisher label to display name.
const KNOWN_OUTLETS: &[(&str, &str)] = &[
    ("chosun", "조선일보"),
    ("donga", "동아일보"),
    ("mk", "매일경제"),
    ("joongang", "중앙일보"),
    ("hani", "한겨레"),
    ("yna", "연합뉴스"),
    ("inews24", "아이뉴스24"),
    ("fnnews", "파이낸셜뉴스"),
    ("naver", "네이버뉴스"),
    ("hankyung", "한국경제"),
    ("khan", "경향신문"),
    ("sedaily", "서울경제"),
];

/// Display name of the outlet behind `url`.
///
/// Known outlets map to their names; anything else falls back to the host
/// without `www.` / `n.news.` prefixes.
pub fn outlet_name(url: &str) -> String {
    let Some(host) = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_lowercase))
    else {
        return "unknown source".into();
    };

    let host = host
        .strip_prefix("www.")
        .or_else(|| host.strip_prefix("n.news."))
        .unwrap_or(&host)
        .to_string();

    let label = publisher_label(&host);
    KNOWN_OUTLETS
        .iter()
        .find(|(key, _)| *key == label)
        .map(|(_, name)| (*name).to_string())
        .unwrap_or(host)
}

/// The label naming the publisher: `news.chosun.com` → `chosun`,
/// `www.hani.co.kr` → `hani`.
fn publisher_label(host: &str) -> &str {
    let labels: Vec<&str> = host.split('.').collect();
    match labels.len() {
        0 => host,
        1 => labels[0],
        n => {
            let sld = labels[n - 2];
            if n >= 3 && GENERIC_SLDS.contains(&sld) && labels[n - 1].len() == 2 {
                labels[n - 3]
            } else {
                sld
            }
        }
    }
}
