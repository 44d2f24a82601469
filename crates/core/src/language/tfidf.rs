use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{AiError, Result};

use super::tokenize::{split_sentences, tokenize};

/// Named documents, each as its list of words in order.
pub type Documents = IndexMap<String, Vec<String>>;

/// Word → inverse document frequency.
pub type Idfs = HashMap<String, f64>;

/// How many files and sentences the pipeline keeps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QaConfig {
    pub file_matches: usize,
    pub sentence_matches: usize,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            file_matches: 1,
            sentence_matches: 1,
        }
    }
}

/// Read every `*.txt` file in `dir`, keyed by file name in sorted order.
///
/// # Errors
/// Returns an error if the directory or a file cannot be read, or if the
/// directory holds no text files.
pub fn load_files<P: AsRef<Path>>(dir: P) -> Result<IndexMap<String, String>> {
    let dir = dir.as_ref();
    let mut files = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let file_name = entry.file_name().to_string_lossy().into_owned();
        if !file_name.ends_with(".txt") {
            continue;
        }
        files.push((file_name, std::fs::read_to_string(entry.path())?));
    }

    if files.is_empty() {
        return Err(AiError::Corpus(format!(
            "no .txt files found in '{}'",
            dir.display()
        )));
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files.into_iter().collect())
}

/// `idf(w) = ln(N / n_w)` where `n_w` is the number of documents containing `w`.
pub fn compute_idfs(documents: &Documents) -> Idfs {
    let n_docs = documents.len() as f64;
    let mut doc_freq: HashMap<&str, usize> = HashMap::new();

    for words in documents.values() {
        let unique: HashSet<&str> = words.iter().map(String::as_str).collect();
        for word in unique {
            *doc_freq.entry(word).or_insert(0) += 1;
        }
    }

    doc_freq
        .into_iter()
        .map(|(word, n)| (word.to_string(), (n_docs / n as f64).ln()))
        .collect()
}

/// Names of the `n` files with the highest summed tf-idf over `query`.
/// Ties keep document order.
pub fn top_files(query: &HashSet<String>, files: &Documents, idfs: &Idfs, n: usize) -> Vec<String> {
    let mut scored: Vec<(&String, f64)> = files
        .iter()
        .map(|(name, words)| {
            let score: f64 = query
                .iter()
                .map(|q| {
                    let tf = words.iter().filter(|w| *w == q).count() as f64;
                    tf * idfs.get(q).copied().unwrap_or(0.0)
                })
                .sum();
            (name, score)
        })
        .collect();

    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.into_iter().take(n).map(|(name, _)| name.clone()).collect()
}

/// The `n` sentences with the highest matching-word measure (summed idf of
/// query words present), ties broken by query term density.
pub fn top_sentences(
    query: &HashSet<String>,
    sentences: &Documents,
    idfs: &Idfs,
    n: usize,
) -> Vec<String> {
    let mut scored: Vec<(&String, f64, f64)> = sentences
        .iter()
        .map(|(sentence, words)| {
            let matching: f64 = query
                .iter()
                .filter(|q| words.contains(q))
                .map(|q| idfs.get(q).copied().unwrap_or(0.0))
                .sum();
            let density = if words.is_empty() {
                0.0
            } else {
                words.iter().filter(|w| query.contains(*w)).count() as f64 / words.len() as f64
            };
            (sentence, matching, density)
        })
        .collect();

    scored.sort_by(|a, b| match b.1.total_cmp(&a.1) {
        Ordering::Equal => b.2.total_cmp(&a.2),
        other => other,
    });
    scored.into_iter().take(n).map(|(s, _, _)| s.clone()).collect()
}

/// Sentences of the named files, each mapped to its words. Sentences with
/// no words left after tokenizing are skipped.
pub fn sentences_of(files: &IndexMap<String, String>, names: &[String]) -> Documents {
    let mut sentences = Documents::new();
    for name in names {
        let Some(text) = files.get(name) else {
            continue;
        };
        for passage in text.lines() {
            for sentence in split_sentences(passage) {
                let tokens = tokenize(&sentence);
                if !tokens.is_empty() {
                    sentences.insert(sentence, tokens);
                }
            }
        }
    }
    sentences
}

/// Answer `query` from `files`: rank files by tf-idf, split the best ones
/// into sentences, and rank those by idf.
///
/// # Errors
/// Returns an error if there are no files or the query has no words left
/// after tokenizing.
pub fn answer(
    query: &str,
    files: &IndexMap<String, String>,
    config: &QaConfig,
) -> Result<Vec<String>> {
    if files.is_empty() {
        return Err(AiError::Corpus("no documents to search".to_string()));
    }
    let query: HashSet<String> = tokenize(query).into_iter().collect();
    if query.is_empty() {
        return Err(AiError::Malformed(
            "query has no words after removing stopwords and punctuation".to_string(),
        ));
    }

    let file_words: Documents = files
        .iter()
        .map(|(name, text)| (name.clone(), tokenize(text)))
        .collect();
    let file_idfs = compute_idfs(&file_words);
    let best_files = top_files(&query, &file_words, &file_idfs, config.file_matches);
    log::debug!("Best matching files: {:?}", best_files);

    let sentences = sentences_of(files, &best_files);
    let idfs = compute_idfs(&sentences);
    Ok(top_sentences(&query, &sentences, &idfs, config.sentence_matches))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn docs(pairs: &[(&str, &str)]) -> Documents {
        pairs
            .iter()
            .map(|(name, text)| (name.to_string(), tokenize(text)))
            .collect()
    }

    fn query(words: &[&str]) -> HashSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_compute_idfs() {
        let d = docs(&[("a", "cat dog"), ("b", "cat fish"), ("c", "cat")]);
        let idfs = compute_idfs(&d);
        assert_relative_eq!(idfs["cat"], 0.0);
        assert_relative_eq!(idfs["dog"], (3.0f64).ln());
        assert_relative_eq!(idfs["fish"], (3.0f64).ln());
        assert_eq!(idfs.len(), 3);
    }

    #[test]
    fn test_top_files_uses_term_frequency() {
        let d = docs(&[
            ("python.txt", "python python snakes code"),
            ("snakes.txt", "snakes python reptiles"),
            ("cats.txt", "cats whiskers"),
        ]);
        let idfs = compute_idfs(&d);
        let best = top_files(&query(&["python"]), &d, &idfs, 2);
        assert_eq!(best, vec!["python.txt", "snakes.txt"]);
    }

    #[test]
    fn test_top_sentences_breaks_ties_by_density() {
        let d: Documents = [
            "Turing machines model computation in general terms.",
            "Turing machines.",
        ]
        .iter()
        .map(|s| (s.to_string(), tokenize(s)))
        .collect();
        let idfs: Idfs = [("turing".to_string(), 1.0), ("machines".to_string(), 1.0)]
            .into_iter()
            .collect();

        let best = top_sentences(&query(&["turing", "machines"]), &d, &idfs, 1);
        assert_eq!(best, vec!["Turing machines."]);
    }

    #[test]
    fn test_answer_pipeline() {
        let mut files = IndexMap::new();
        files.insert(
            "ai.txt".to_string(),
            "Artificial intelligence is studied widely. \
             Alan Turing proposed the imitation game in 1950."
                .to_string(),
        );
        files.insert(
            "python.txt".to_string(),
            "Python is a programming language. It was created by Guido van Rossum.".to_string(),
        );
        files.insert(
            "cooking.txt".to_string(),
            "Bread needs flour, water and yeast.".to_string(),
        );

        let result = answer("When did Turing propose the imitation game?", &files, &QaConfig::default())
            .unwrap();
        assert_eq!(result, vec!["Alan Turing proposed the imitation game in 1950."]);
    }

    #[test]
    fn test_answer_rejects_empty_query() {
        let mut files = IndexMap::new();
        files.insert("a.txt".to_string(), "text".to_string());
        assert!(answer("the of and", &files, &QaConfig::default()).is_err());
    }
}
