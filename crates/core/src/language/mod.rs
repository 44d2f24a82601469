// Language module
// Tokenizing, TF-IDF ranking and sentence retrieval

pub mod tfidf;
pub mod tokenize;

pub use tfidf::{answer, compute_idfs, load_files, top_files, top_sentences, QaConfig};
pub use tokenize::{split_sentences, tokenize};
