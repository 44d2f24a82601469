use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{AiError, Result};

static LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<a\s+(?:[^>]*?)href="([^"]*)""#).expect("link pattern is valid")
});

/// A set of pages and the links between them.
///
/// Pages are kept sorted by name. Links only ever point at other pages of
/// the same corpus; self-links are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    links: BTreeMap<String, BTreeSet<String>>,
}

impl Corpus {
    /// Build a corpus from raw page → links pairs, discarding self-links
    /// and links to pages that are not part of the corpus.
    pub fn new<I, S, L>(pages: I) -> Self
    where
        I: IntoIterator<Item = (S, L)>,
        S: Into<String>,
        L: IntoIterator,
        L::Item: Into<String>,
    {
        let raw: BTreeMap<String, BTreeSet<String>> = pages
            .into_iter()
            .map(|(page, links)| (page.into(), links.into_iter().map(Into::into).collect()))
            .collect();

        let links = raw
            .iter()
            .map(|(page, targets)| {
                let kept = targets
                    .iter()
                    .filter(|t| *t != page && raw.contains_key(*t))
                    .cloned()
                    .collect();
                (page.clone(), kept)
            })
            .collect();

        Self { links }
    }

    /// Parse every `*.html` file in `dir` and collect its anchor links.
    ///
    /// # Errors
    /// Returns an error if the directory or a page cannot be read, or if no
    /// HTML page is found.
    pub fn crawl<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let mut pages = Vec::new();

        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if !file_name.ends_with(".html") {
                continue;
            }
            let contents = std::fs::read_to_string(entry.path())?;
            pages.push((file_name, extract_links(&contents)));
        }

        if pages.is_empty() {
            return Err(AiError::Corpus(format!(
                "no .html pages found in '{}'",
                dir.display()
            )));
        }
        log::debug!("Crawled {} pages from '{}'", pages.len(), dir.display());
        Ok(Self::new(pages))
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn contains(&self, page: &str) -> bool {
        self.links.contains_key(page)
    }

    /// Outgoing links of `page`, or `None` if the page is not in the corpus.
    pub fn links(&self, page: &str) -> Option<&BTreeSet<String>> {
        self.links.get(page)
    }

    /// Page names in sorted order.
    pub fn pages(&self) -> impl Iterator<Item = &str> {
        self.links.keys().map(String::as_str)
    }

    /// Position of `page` in [`Corpus::pages`] order.
    pub fn page_index(&self, page: &str) -> Option<usize> {
        self.links.keys().position(|p| p == page)
    }
}

/// Every `href` target of an `<a>` tag in `html`.
pub fn extract_links(html: &str) -> BTreeSet<String> {
    LINK_RE
        .captures_iter(html)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    /// Helper: create an empty, process-unique temporary directory.
    fn temp_dir() -> std::path::PathBuf {
        let id = COUNTER.fetch_add(1, Ordering::Relaxed);
        let dir = std::env::temp_dir().join(format!("test_corpus_{}_{}", std::process::id(), id));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_extract_links() {
        let html = r#"<html><body>
            <a href="2.html">two</a>
            <a class="nav" href="3.html">three</a>
            <a href="2.html">again</a>
            <link href="style.css">
        </body></html>"#;
        let links = extract_links(html);
        let expected: BTreeSet<String> =
            ["2.html", "3.html"].iter().map(|s| s.to_string()).collect();
        assert_eq!(links, expected);
    }

    #[test]
    fn test_new_drops_self_and_external_links() {
        let corpus = Corpus::new(vec![
            ("1.html", vec!["1.html", "2.html", "https://example.com"]),
            ("2.html", vec![]),
        ]);
        assert_eq!(corpus.len(), 2);
        let links: Vec<&String> = corpus.links("1.html").unwrap().iter().collect();
        assert_eq!(links, vec!["2.html"]);
        assert!(corpus.links("2.html").unwrap().is_empty());
        assert_eq!(corpus.page_index("2.html"), Some(1));
    }

    #[test]
    fn test_crawl_directory() {
        let dir = temp_dir();
        std::fs::write(dir.join("1.html"), r#"<a href="2.html">2</a>"#).unwrap();
        std::fs::write(
            dir.join("2.html"),
            r#"<a href="1.html">1</a><a href="3.html">3</a>"#,
        )
        .unwrap();
        std::fs::write(dir.join("notes.txt"), r#"<a href="1.html">1</a>"#).unwrap();

        let corpus = Corpus::crawl(&dir).unwrap();
        std::fs::remove_dir_all(&dir).ok();

        let pages: Vec<&str> = corpus.pages().collect();
        assert_eq!(pages, vec!["1.html", "2.html"]);
        assert!(corpus.links("2.html").unwrap().contains("1.html"));
        assert!(!corpus.links("2.html").unwrap().contains("3.html"));
    }

    #[test]
    fn test_crawl_empty_directory_is_an_error() {
        let dir = temp_dir();
        let result = Corpus::crawl(&dir);
        std::fs::remove_dir_all(&dir).ok();
        assert!(matches!(result.unwrap_err(), AiError::Corpus(_)));
    }
}
