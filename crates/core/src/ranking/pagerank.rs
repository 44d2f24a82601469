use std::collections::BTreeMap;

use nalgebra::{DMatrix, DVector};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::Serialize;

use crate::diagnostics::ConvergenceMonitor;
use crate::error::{AiError, Result};
use crate::types::Probability;

use super::corpus::Corpus;

/// Parameters for both PageRank estimators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageRankConfig {
    /// Probability of following a link rather than jumping to a random page.
    pub damping: Probability,
    /// Number of pages visited by the random surfer.
    pub samples: usize,
    /// Iteration stops once no rank moves by more than this.
    pub tolerance: f64,
    /// Hard cap on the number of iteration sweeps.
    pub max_iterations: usize,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            damping: 0.85,
            samples: 10_000,
            tolerance: 0.001,
            max_iterations: 1_000,
        }
    }
}

impl PageRankConfig {
    /// # Errors
    /// Returns [`AiError::InvalidParameter`] for a damping factor outside
    /// [0, 1], zero samples, a non-positive tolerance, or a zero iteration cap.
    pub fn validate(&self) -> Result<()> {
        check_damping(self.damping)?;
        if self.samples == 0 {
            return Err(AiError::InvalidParameter(
                "sample count must be positive".to_string(),
            ));
        }
        if self.tolerance.is_nan() || self.tolerance <= 0.0 {
            return Err(AiError::InvalidParameter(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if self.max_iterations == 0 {
            return Err(AiError::InvalidParameter(
                "max_iterations must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// PageRank per page, sorted by page name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PageRanks {
    ranks: BTreeMap<String, Probability>,
}

impl PageRanks {
    pub fn get(&self, page: &str) -> Option<Probability> {
        self.ranks.get(page).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Probability)> {
        self.ranks.iter().map(|(p, &r)| (p.as_str(), r))
    }

    pub fn total(&self) -> Probability {
        self.ranks.values().sum()
    }

    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }

    fn from_values(corpus: &Corpus, values: impl IntoIterator<Item = Probability>) -> Self {
        Self {
            ranks: corpus.pages().map(str::to_string).zip(values).collect(),
        }
    }
}

/// Distribution over the next page to visit from `page`.
///
/// With probability `damping` the surfer follows one of the page's links
/// uniformly at random; otherwise it jumps to any page of the corpus. A page
/// without outgoing links is treated as linking to every page.
///
/// # Errors
/// Returns an error if `page` is not in the corpus or `damping` is not a
/// probability.
pub fn transition_model(
    corpus: &Corpus,
    page: &str,
    damping: Probability,
) -> Result<BTreeMap<String, Probability>> {
    check_damping(damping)?;
    let links = corpus
        .links(page)
        .ok_or_else(|| AiError::Corpus(format!("page '{}' is not in the corpus", page)))?;
    let n = corpus.len() as Probability;

    let model = corpus
        .pages()
        .map(|target| {
            let p = if links.is_empty() {
                1.0 / n
            } else {
                let followed = if links.contains(target) {
                    damping / links.len() as Probability
                } else {
                    0.0
                };
                (1.0 - damping) / n + followed
            };
            (target.to_string(), p)
        })
        .collect();
    Ok(model)
}

/// Estimate PageRank by following the random surfer for `samples` steps,
/// starting at a uniformly chosen page.
///
/// # Errors
/// Returns an error for an empty corpus, zero samples, or a bad damping
/// factor.
pub fn sample_pagerank<R: Rng>(
    corpus: &Corpus,
    damping: Probability,
    samples: usize,
    rng: &mut R,
) -> Result<PageRanks> {
    if corpus.is_empty() {
        return Err(AiError::Corpus("cannot rank an empty corpus".to_string()));
    }
    if samples == 0 {
        return Err(AiError::InvalidParameter(
            "sample count must be positive".to_string(),
        ));
    }

    // One sampler per page; rows follow `corpus.pages()` order.
    let samplers = corpus
        .pages()
        .map(|page| {
            let row = transition_model(corpus, page, damping)?;
            WeightedIndex::new(row.values().copied())
                .map_err(|e| AiError::InvalidParameter(format!("transition model: {}", e)))
        })
        .collect::<Result<Vec<_>>>()?;

    let n = corpus.len();
    let mut visits = vec![0usize; n];
    let mut current = rng.gen_range(0..n);
    visits[current] += 1;

    for _ in 1..samples {
        current = samplers[current].sample(rng);
        visits[current] += 1;
    }

    let total = samples as Probability;
    Ok(PageRanks::from_values(
        corpus,
        visits.into_iter().map(|v| v as Probability / total),
    ))
}

/// Compute PageRank by repeatedly applying
/// `PR(p) = (1 - d) / N + d * sum_i PR(i) / NumLinks(i)`
/// until no rank changes by more than `config.tolerance`.
///
/// The link structure is a dense column-stochastic matrix, so each sweep is
/// a single matrix-vector product. Pages without links spread their rank
/// evenly over every page.
///
/// # Errors
/// Returns an error for an empty corpus or invalid configuration.
pub fn iterate_pagerank(corpus: &Corpus, config: &PageRankConfig) -> Result<PageRanks> {
    if corpus.is_empty() {
        return Err(AiError::Corpus("cannot rank an empty corpus".to_string()));
    }
    config.validate()?;

    let n = corpus.len();
    let links = link_matrix(corpus);
    let teleport = (1.0 - config.damping) / n as Probability;

    let mut ranks = DVector::from_element(n, 1.0 / n as Probability);
    let mut monitor = ConvergenceMonitor::new(config.tolerance, config.max_iterations);

    loop {
        let next = (&links * &ranks) * config.damping;
        let next = next.add_scalar(teleport);
        let change = (&next - &ranks).amax();
        ranks = next;
        monitor.record(monitor.n_iterations() + 1, change);

        if monitor.is_converged() {
            break;
        }
        if monitor.max_reached() {
            log::warn!(
                "PageRank did not converge after {} iterations (change = {:.2e})",
                monitor.n_iterations(),
                change
            );
            break;
        }
    }
    log::debug!("PageRank iteration finished after {} sweeps", monitor.n_iterations());

    let total = ranks.sum();
    Ok(PageRanks::from_values(corpus, ranks.iter().map(|r| r / total)))
}

/// Column `i` holds the probability of moving from page `i` to each page
/// when following links.
fn link_matrix(corpus: &Corpus) -> DMatrix<Probability> {
    let n = corpus.len();
    let mut m = DMatrix::zeros(n, n);

    for (col, page) in corpus.pages().enumerate() {
        let targets = corpus.links(page).map(|l| l.len()).unwrap_or(0);
        if targets == 0 {
            m.column_mut(col).fill(1.0 / n as Probability);
            continue;
        }
        let weight = 1.0 / targets as Probability;
        for target in corpus.links(page).into_iter().flatten() {
            if let Some(row) = corpus.page_index(target) {
                m[(row, col)] = weight;
            }
        }
    }
    m
}

fn check_damping(damping: Probability) -> Result<()> {
    if !(0.0..=1.0).contains(&damping) {
        return Err(AiError::InvalidParameter(format!(
            "damping factor must lie in [0, 1], got {}",
            damping
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn corpus0() -> Corpus {
        Corpus::new(vec![
            ("1.html", vec!["2.html"]),
            ("2.html", vec!["1.html", "3.html"]),
            ("3.html", vec!["2.html", "4.html"]),
            ("4.html", vec!["2.html"]),
        ])
    }

    #[test]
    fn test_transition_model_follows_links() {
        let corpus = Corpus::new(vec![
            ("1.html", vec!["2.html", "3.html"]),
            ("2.html", vec!["3.html"]),
            ("3.html", vec!["2.html"]),
        ]);
        let model = transition_model(&corpus, "1.html", 0.85).unwrap();
        assert_relative_eq!(model["1.html"], 0.05, epsilon = 1e-12);
        assert_relative_eq!(model["2.html"], 0.475, epsilon = 1e-12);
        assert_relative_eq!(model["3.html"], 0.475, epsilon = 1e-12);
    }

    #[test]
    fn test_transition_model_without_links_is_uniform() {
        let corpus = Corpus::new(vec![("a.html", vec![]), ("b.html", vec!["a.html"])]);
        let model = transition_model(&corpus, "a.html", 0.85).unwrap();
        assert_relative_eq!(model["a.html"], 0.5);
        assert_relative_eq!(model["b.html"], 0.5);
    }

    #[test]
    fn test_transition_model_unknown_page() {
        assert!(transition_model(&corpus0(), "9.html", 0.85).is_err());
        assert!(transition_model(&corpus0(), "1.html", 1.5).is_err());
    }

    #[test]
    fn test_iterate_sums_to_one_and_ranks_hub_highest() {
        let ranks = iterate_pagerank(&corpus0(), &PageRankConfig::default()).unwrap();
        assert_eq!(ranks.len(), 4);
        assert_relative_eq!(ranks.total(), 1.0, epsilon = 1e-9);

        let hub = ranks.get("2.html").unwrap();
        for (page, r) in ranks.iter() {
            if page != "2.html" {
                assert!(hub > r, "{} outranks the hub", page);
            }
        }
    }

    #[test]
    fn test_iterate_symmetric_cycle_is_uniform() {
        let corpus = Corpus::new(vec![
            ("a", vec!["b"]),
            ("b", vec!["c"]),
            ("c", vec!["a"]),
        ]);
        let ranks = iterate_pagerank(&corpus, &PageRankConfig::default()).unwrap();
        for (_, r) in ranks.iter() {
            assert_relative_eq!(r, 1.0 / 3.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_sampling_agrees_with_iteration() {
        let corpus = corpus0();
        let mut rng = StdRng::seed_from_u64(42);
        let sampled = sample_pagerank(&corpus, 0.85, 50_000, &mut rng).unwrap();
        let iterated = iterate_pagerank(&corpus, &PageRankConfig::default()).unwrap();

        assert_relative_eq!(sampled.total(), 1.0, epsilon = 1e-9);
        for (page, r) in iterated.iter() {
            assert!(
                (sampled.get(page).unwrap() - r).abs() < 0.03,
                "{}: sampled {} vs iterated {}",
                page,
                sampled.get(page).unwrap(),
                r
            );
        }
    }

    #[test]
    fn test_sampling_is_deterministic_for_a_seed() {
        let corpus = corpus0();
        let a = sample_pagerank(&corpus, 0.85, 1_000, &mut StdRng::seed_from_u64(7)).unwrap();
        let b = sample_pagerank(&corpus, 0.85, 1_000, &mut StdRng::seed_from_u64(7)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_corpus_and_zero_samples() {
        let empty = Corpus::default();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(sample_pagerank(&empty, 0.85, 10, &mut rng).is_err());
        assert!(iterate_pagerank(&empty, &PageRankConfig::default()).is_err());
        assert!(sample_pagerank(&corpus0(), 0.85, 0, &mut rng).is_err());
    }

    #[test]
    fn test_config_validation() {
        let bad = PageRankConfig {
            damping: 1.2,
            ..PageRankConfig::default()
        };
        assert!(bad.validate().is_err());
        let bad = PageRankConfig {
            tolerance: 0.0,
            ..PageRankConfig::default()
        };
        assert!(bad.validate().is_err());
        assert!(PageRankConfig::default().validate().is_ok());
    }
}
