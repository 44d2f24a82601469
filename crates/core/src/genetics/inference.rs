use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{AiError, Result};
use crate::types::Probability;

use super::enumerate::{scenarios, Evidence, Scenario, MASK_BITS};
use super::model::{GeneCount, InheritanceModel};
use super::pedigree::Pedigree;

/// Default cap on the number of people the exhaustive enumeration accepts.
///
/// With no observed traits the enumeration visits 3^n × 2^n scenarios, so
/// ten people already means about 6 × 10^7 joint probabilities.
pub const DEFAULT_MAX_PEOPLE: usize = 10;

/// Posterior (or, before normalization, accumulated) weight per gene count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GeneDistribution {
    #[serde(rename = "2")]
    pub two: Probability,
    #[serde(rename = "1")]
    pub one: Probability,
    #[serde(rename = "0")]
    pub zero: Probability,
}

impl GeneDistribution {
    pub fn get(&self, gene: GeneCount) -> Probability {
        match gene {
            GeneCount::Two => self.two,
            GeneCount::One => self.one,
            GeneCount::Zero => self.zero,
        }
    }

    fn add(&mut self, gene: GeneCount, p: Probability) {
        match gene {
            GeneCount::Two => self.two += p,
            GeneCount::One => self.one += p,
            GeneCount::Zero => self.zero += p,
        }
    }

    pub fn total(&self) -> Probability {
        self.two + self.one + self.zero
    }
}

/// Weight for the trait being present or absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TraitDistribution {
    #[serde(rename = "true")]
    pub present: Probability,
    #[serde(rename = "false")]
    pub absent: Probability,
}

impl TraitDistribution {
    pub fn get(&self, has_trait: bool) -> Probability {
        if has_trait {
            self.present
        } else {
            self.absent
        }
    }

    fn add(&mut self, has_trait: bool, p: Probability) {
        if has_trait {
            self.present += p;
        } else {
            self.absent += p;
        }
    }

    pub fn total(&self) -> Probability {
        self.present + self.absent
    }
}

/// Marginal distributions for a single person.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PersonMarginals {
    pub gene: GeneDistribution,
    #[serde(rename = "trait")]
    pub trait_presence: TraitDistribution,
}

impl PersonMarginals {
    /// Rescale both distributions to sum to one.
    fn normalize(&mut self) -> Result<()> {
        let gene_total = self.gene.total();
        let trait_total = self.trait_presence.total();
        if gene_total <= 0.0 || trait_total <= 0.0 {
            return Err(AiError::ContradictoryEvidence);
        }

        self.gene.two /= gene_total;
        self.gene.one /= gene_total;
        self.gene.zero /= gene_total;
        self.trait_presence.present /= trait_total;
        self.trait_presence.absent /= trait_total;
        Ok(())
    }
}

/// Per-person marginals, keyed by name in pedigree order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeredityReport {
    pub people: IndexMap<String, PersonMarginals>,
    /// Sum of joint probabilities over every scenario consistent with the
    /// evidence, i.e. the likelihood of the observations.
    pub evidence_likelihood: Probability,
    /// Number of scenarios evaluated.
    pub n_scenarios: u64,
}

impl HeredityReport {
    pub fn get(&self, name: &str) -> Option<&PersonMarginals> {
        self.people.get(name)
    }

    /// Render the report with four decimal places per value.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for (name, m) in &self.people {
            out.push_str(&format!("{}:\n  Gene:\n", name));
            for gene in GeneCount::REPORT_ORDER {
                out.push_str(&format!("    {}: {:.4}\n", gene.copies(), m.gene.get(gene)));
            }
            out.push_str("  Trait:\n");
            for has_trait in [true, false] {
                let label = if has_trait { "True" } else { "False" };
                out.push_str(&format!(
                    "    {}: {:.4}\n",
                    label,
                    m.trait_presence.get(has_trait)
                ));
            }
        }
        out
    }
}

/// Exact inference over a pedigree by exhaustive enumeration.
///
/// Construction validates the pedigree and computes the parents-first
/// evaluation order once; [`HeredityEngine::infer`] then enumerates every
/// scenario consistent with the observed traits, weights each by its joint
/// probability, and normalizes the per-person sums.
#[derive(Debug)]
pub struct HeredityEngine<'a> {
    pedigree: &'a Pedigree,
    model: &'a InheritanceModel,
    order: Vec<usize>,
    evidence: Evidence,
}

impl<'a> HeredityEngine<'a> {
    /// Create an engine with the default size cap.
    ///
    /// # Errors
    /// See [`HeredityEngine::with_max_people`].
    pub fn new(pedigree: &'a Pedigree, model: &'a InheritanceModel) -> Result<Self> {
        Self::with_max_people(pedigree, model, DEFAULT_MAX_PEOPLE)
    }

    /// Create an engine that refuses pedigrees with more than `max_people`.
    ///
    /// # Errors
    /// Returns [`AiError::TooLarge`] above the cap (never more than 64), or
    /// a pedigree error if the family tree is invalid.
    pub fn with_max_people(
        pedigree: &'a Pedigree,
        model: &'a InheritanceModel,
        max_people: usize,
    ) -> Result<Self> {
        let max = max_people.min(MASK_BITS);
        if pedigree.n_people() > max {
            return Err(AiError::TooLarge {
                got: pedigree.n_people(),
                max,
            });
        }
        pedigree.validate()?;

        let order = pedigree.topological_order()?;
        let evidence =
            Evidence::from_observations((0..pedigree.n_people()).map(|i| pedigree.observed(i)));

        Ok(Self {
            pedigree,
            model,
            order,
            evidence,
        })
    }

    /// Probability of one fully specified scenario.
    ///
    /// Each person contributes P(gene) × P(trait | gene), where P(gene) is
    /// the founder prior or, for children, the inheritance probability
    /// given both parents' gene counts in the same scenario.
    pub fn joint_probability(&self, scenario: &Scenario) -> Probability {
        let mut probability = 1.0;

        for &person in &self.order {
            let gene = scenario.gene(person);
            let gene_p = match self.pedigree.parents(person) {
                None => self.model.prior(gene),
                Some((mother, father)) => {
                    self.model
                        .inherited(gene, scenario.gene(mother), scenario.gene(father))
                }
            };

            probability *= gene_p * self.model.trait_probability(gene, scenario.has_trait(person));
            if probability == 0.0 {
                break;
            }
        }
        probability
    }

    /// Run the full enumeration and return normalized marginals.
    ///
    /// # Errors
    /// Returns [`AiError::ContradictoryEvidence`] if no scenario consistent
    /// with the observations has positive probability.
    pub fn infer(&self) -> Result<HeredityReport> {
        let n = self.pedigree.n_people();
        let mut acc = vec![PersonMarginals::default(); n];
        let mut likelihood = 0.0;
        let mut n_scenarios = 0u64;

        for scenario in scenarios(n, self.evidence) {
            n_scenarios += 1;
            let p = self.joint_probability(&scenario);
            if p == 0.0 {
                continue;
            }
            likelihood += p;
            for (person, m) in acc.iter_mut().enumerate() {
                m.gene.add(scenario.gene(person), p);
                m.trait_presence.add(scenario.has_trait(person), p);
            }
        }

        log::debug!(
            "Evaluated {} scenarios for {} people, evidence likelihood {:.3e}",
            n_scenarios,
            n,
            likelihood
        );

        let mut people = IndexMap::with_capacity(n);
        for (person, mut m) in acc.into_iter().enumerate() {
            m.normalize()?;
            people.insert(self.pedigree.name(person).to_string(), m);
        }

        Ok(HeredityReport {
            people,
            evidence_likelihood: likelihood,
            n_scenarios,
        })
    }
}

/// Convenience wrapper: validate, enumerate and normalize in one call.
pub fn infer_marginals(pedigree: &Pedigree, model: &InheritanceModel) -> Result<HeredityReport> {
    HeredityEngine::new(pedigree, model)?.infer()
}

/// Build a scenario from sets of names, as used when checking individual
/// joint probabilities by hand.
///
/// # Errors
/// Returns [`AiError::Pedigree`] if a name is unknown or appears in both
/// gene sets.
pub fn scenario_from_names(
    pedigree: &Pedigree,
    one_copy: &[&str],
    two_copies: &[&str],
    has_trait: &[&str],
) -> Result<Scenario> {
    let mask = |names: &[&str]| -> Result<u64> {
        names.iter().try_fold(0u64, |acc, name| {
            let idx = pedigree
                .person_index(name)
                .ok_or_else(|| AiError::Pedigree(format!("Unknown person '{}'", name)))?;
            Ok(acc | (1u64 << idx))
        })
    };

    let scenario = Scenario {
        one_copy: mask(one_copy)?,
        two_copies: mask(two_copies)?,
        has_trait: mask(has_trait)?,
    };
    if scenario.one_copy & scenario.two_copies != 0 {
        return Err(AiError::Pedigree(
            "A person cannot carry one and two copies at once".to_string(),
        ));
    }
    Ok(scenario)
}
