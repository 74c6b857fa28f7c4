//! Catalog discovery: the institution list and each institution's
//! department links
//!
//! Discovery is pure: no filtering, no retries beyond what the fetcher
//! already performs. An unobtainable page yields an empty list, never an
//! error; a legitimately empty catalog is not a fault.

use crate::crawler::fetcher::Fetcher;
use crate::model::{DepartmentLink, Institution};
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

/// Anchor pattern of institution entries on the catalog entry page
const INSTITUTION_LINK_SELECTOR: &str = r#"table tr td a[href^="ShowSchGsd.php"]"#;

/// Anchor pattern of department detail pages on an institution page
const DEPARTMENT_LINK_SELECTOR: &str = r#"a[href*="/html/"]"#;

/// Query-parameter pattern carrying the institution code
const CODE_PATTERN: &str = r"colno=(\w+)";

/// Fetches the entry page and discovers the institution list
///
/// The entry page is fetched with itself as referer. Each matching anchor
/// becomes an [`Institution`] with its code pulled from the `colno` query
/// parameter (`Unknown` when absent) and its link resolved to an absolute
/// URL.
pub async fn discover_institutions(fetcher: &Fetcher, entry_url: &str) -> Vec<Institution> {
    let Some(body) = fetcher.fetch(entry_url, Some(entry_url)).await else {
        return Vec::new();
    };
    let Ok(base) = Url::parse(entry_url) else {
        tracing::warn!("Entry URL {} is not a valid base URL", entry_url);
        return Vec::new();
    };
    parse_institution_list(&body, &base)
}

/// Fetches an institution page and discovers its department links
///
/// The caller supplies the referer (the entry page); each discovered link
/// is tagged with the owning institution's name and URL for the detail
/// fetch later.
pub async fn discover_departments(
    fetcher: &Fetcher,
    institution: &Institution,
    referer: &str,
) -> Vec<DepartmentLink> {
    let Some(body) = fetcher.fetch(&institution.url, Some(referer)).await else {
        return Vec::new();
    };
    let Ok(base) = Url::parse(&institution.url) else {
        return Vec::new();
    };
    parse_department_list(&body, &base, institution)
}

/// Extracts institutions from entry-page HTML
pub fn parse_institution_list(html: &str, base_url: &Url) -> Vec<Institution> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse(INSTITUTION_LINK_SELECTOR) else {
        return Vec::new();
    };
    let code_pattern = Regex::new(CODE_PATTERN).expect("valid code pattern");

    let mut institutions = Vec::new();
    for anchor in document.select(&selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Ok(url) = base_url.join(href) else {
            continue;
        };

        let name = anchor.text().collect::<String>().trim().to_string();
        let code = code_pattern
            .captures(href)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| "Unknown".to_string());

        institutions.push(Institution {
            name,
            code,
            url: url.to_string(),
        });
    }
    institutions
}

/// Extracts department detail links from institution-page HTML
pub fn parse_department_list(
    html: &str,
    base_url: &Url,
    institution: &Institution,
) -> Vec<DepartmentLink> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse(DEPARTMENT_LINK_SELECTOR) else {
        return Vec::new();
    };

    let mut links = Vec::new();
    for anchor in document.select(&selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if !href.contains("htm") {
            continue;
        }
        let Ok(url) = base_url.join(href) else {
            continue;
        };

        links.push(DepartmentLink {
            url: url.to_string(),
            institution_name: institution.name.clone(),
            institution_url: institution.url.clone(),
        });
    }
    links
}
