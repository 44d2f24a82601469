use serde::Serialize;

use crate::error::{AiError, Result};
use crate::types::{Probability, SUM_TOLERANCE};

/// Number of copies of the modelled allele a person carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum GeneCount {
    Zero,
    One,
    Two,
}

impl GeneCount {
    /// All values, in the order results are reported (2, 1, 0).
    pub const REPORT_ORDER: [GeneCount; 3] = [GeneCount::Two, GeneCount::One, GeneCount::Zero];

    pub fn copies(self) -> usize {
        match self {
            GeneCount::Zero => 0,
            GeneCount::One => 1,
            GeneCount::Two => 2,
        }
    }

    pub fn from_copies(copies: usize) -> Option<Self> {
        match copies {
            0 => Some(GeneCount::Zero),
            1 => Some(GeneCount::One),
            2 => Some(GeneCount::Two),
            _ => None,
        }
    }
}

/// Immutable probability tables for the single-gene inheritance model.
///
/// - `gene_prior[k]`: unconditional probability that a founder carries
///   `k` copies.
/// - `trait_given_gene[k]`: probability of showing the trait given `k`
///   copies. The probability of not showing it is the complement.
/// - `mutation`: probability that a transmitted allele flips.
///
/// The default matches the classic hearing-impairment (GJB2) exercise.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InheritanceModel {
    gene_prior: [Probability; 3],
    trait_given_gene: [Probability; 3],
    mutation: Probability,
}

impl Default for InheritanceModel {
    fn default() -> Self {
        Self {
            gene_prior: [0.96, 0.03, 0.01],
            trait_given_gene: [0.01, 0.56, 0.65],
            mutation: 0.01,
        }
    }
}

impl InheritanceModel {
    /// Build a model, checking that every entry is a probability and that
    /// the founder prior sums to one.
    ///
    /// # Errors
    /// Returns [`AiError::InvalidParameter`] describing the first bad value.
    pub fn new(
        gene_prior: [Probability; 3],
        trait_given_gene: [Probability; 3],
        mutation: Probability,
    ) -> Result<Self> {
        for (k, &p) in gene_prior.iter().enumerate() {
            check_probability(p, &format!("gene prior for {} copies", k))?;
        }
        let total: Probability = gene_prior.iter().sum();
        if (total - 1.0).abs() > SUM_TOLERANCE {
            return Err(AiError::InvalidParameter(format!(
                "gene prior sums to {}, expected 1",
                total
            )));
        }
        for (k, &p) in trait_given_gene.iter().enumerate() {
            check_probability(p, &format!("trait probability for {} copies", k))?;
        }
        check_probability(mutation, "mutation rate")?;

        Ok(Self {
            gene_prior,
            trait_given_gene,
            mutation,
        })
    }

    /// Same tables as `self` with a different mutation rate.
    pub fn with_mutation(&self, mutation: Probability) -> Result<Self> {
        Self::new(self.gene_prior, self.trait_given_gene, mutation)
    }

    pub fn mutation(&self) -> Probability {
        self.mutation
    }

    /// Unconditional probability of `gene` for someone with no parents on record.
    pub fn prior(&self, gene: GeneCount) -> Probability {
        self.gene_prior[gene.copies()]
    }

    /// Probability of the trait being present (or absent) given `gene`.
    pub fn trait_probability(&self, gene: GeneCount, has_trait: bool) -> Probability {
        let present = self.trait_given_gene[gene.copies()];
        if has_trait {
            present
        } else {
            1.0 - present
        }
    }

    /// Probability that a parent carrying `gene` passes the allele on.
    pub fn transmission(&self, gene: GeneCount) -> Probability {
        match gene {
            GeneCount::Two => 1.0 - self.mutation,
            GeneCount::One => 0.5,
            GeneCount::Zero => self.mutation,
        }
    }

    /// Probability that a child of parents carrying `mother` and `father`
    /// copies ends up with `child` copies.
    pub fn inherited(&self, child: GeneCount, mother: GeneCount, father: GeneCount) -> Probability {
        let from_mother = self.transmission(mother);
        let from_father = self.transmission(father);
        match child {
            GeneCount::Two => from_mother * from_father,
            GeneCount::One => {
                from_mother * (1.0 - from_father) + (1.0 - from_mother) * from_father
            }
            GeneCount::Zero => (1.0 - from_mother) * (1.0 - from_father),
        }
    }
}

fn check_probability(p: Probability, what: &str) -> Result<()> {
    if !(0.0..=1.0).contains(&p) {
        return Err(AiError::InvalidParameter(format!(
            "{} must lie in [0, 1], got {}",
            what, p
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_tables() {
        let m = InheritanceModel::default();
        assert_relative_eq!(m.prior(GeneCount::Zero), 0.96);
        assert_relative_eq!(m.prior(GeneCount::One), 0.03);
        assert_relative_eq!(m.prior(GeneCount::Two), 0.01);
        assert_relative_eq!(m.trait_probability(GeneCount::Two, true), 0.65);
        assert_relative_eq!(m.trait_probability(GeneCount::Two, false), 0.35);
        assert_relative_eq!(m.trait_probability(GeneCount::One, false), 0.44);
        assert_relative_eq!(m.trait_probability(GeneCount::Zero, false), 0.99);
        assert_relative_eq!(m.mutation(), 0.01);
    }

    #[test]
    fn test_transmission() {
        let m = InheritanceModel::default();
        assert_relative_eq!(m.transmission(GeneCount::Two), 0.99);
        assert_relative_eq!(m.transmission(GeneCount::One), 0.5);
        assert_relative_eq!(m.transmission(GeneCount::Zero), 0.01);
    }

    #[test]
    fn test_inherited_sums_to_one_for_every_parent_pair() {
        let m = InheritanceModel::default();
        for &mother in &GeneCount::REPORT_ORDER {
            for &father in &GeneCount::REPORT_ORDER {
                let total: f64 = GeneCount::REPORT_ORDER
                    .iter()
                    .map(|&child| m.inherited(child, mother, father))
                    .sum();
                assert_relative_eq!(total, 1.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_inherited_one_copy_from_mixed_parents() {
        // Mother 2 copies (passes 0.99), father 0 copies (passes 0.01).
        let m = InheritanceModel::default();
        let p = m.inherited(GeneCount::One, GeneCount::Two, GeneCount::Zero);
        assert_relative_eq!(p, 0.99 * 0.99 + 0.01 * 0.01, epsilon = 1e-12);
    }

    #[test]
    fn test_new_rejects_bad_prior() {
        let err = InheritanceModel::new([0.5, 0.3, 0.1], [0.01, 0.56, 0.65], 0.01);
        assert!(err.is_err());
        let err = InheritanceModel::new([1.2, -0.1, -0.1], [0.01, 0.56, 0.65], 0.01);
        assert!(err.is_err());
    }

    #[test]
    fn test_new_rejects_bad_mutation() {
        let m = InheritanceModel::default();
        assert!(m.with_mutation(1.5).is_err());
        assert!(m.with_mutation(-0.01).is_err());
        assert_relative_eq!(m.with_mutation(0.0).unwrap().mutation(), 0.0);
    }

    #[test]
    fn test_gene_count_copies_roundtrip() {
        for copies in 0..3 {
            assert_eq!(GeneCount::from_copies(copies).unwrap().copies(), copies);
        }
        assert_eq!(GeneCount::from_copies(3), None);
    }
}
