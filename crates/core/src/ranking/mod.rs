// Ranking module
// Link corpus and PageRank by sampling or iteration

pub mod corpus;
pub mod pagerank;

pub use corpus::Corpus;
pub use pagerank::{iterate_pagerank, sample_pagerank, transition_model, PageRankConfig, PageRanks};
