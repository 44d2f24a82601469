//! Bitmask enumeration of pedigree scenarios.
//!
//! Person `i` of a pedigree is bit `i` of a `u64` mask. A scenario is a
//! triple of masks: who carries one copy, who carries two copies (disjoint
//! from the first), and who shows the trait. Everyone else carries zero
//! copies and does not show the trait.
//!
//! The number of scenarios is `3^n` gene partitions times up to `2^n` trait
//! subsets, so this only works for small families.

use super::model::GeneCount;

/// Largest number of people a mask can address.
pub const MASK_BITS: usize = u64::BITS as usize;

/// One complete assignment of gene counts and trait presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scenario {
    pub one_copy: u64,
    pub two_copies: u64,
    pub has_trait: u64,
}

impl Scenario {
    pub fn gene(&self, person: usize) -> GeneCount {
        let bit = 1u64 << person;
        if self.two_copies & bit != 0 {
            GeneCount::Two
        } else if self.one_copy & bit != 0 {
            GeneCount::One
        } else {
            GeneCount::Zero
        }
    }

    pub fn has_trait(&self, person: usize) -> bool {
        self.has_trait & (1u64 << person) != 0
    }
}

/// Iterates over every submask of `set`, from `set` itself down to the
/// empty mask (both included).
#[derive(Debug, Clone)]
pub struct Submasks {
    set: u64,
    next: Option<u64>,
}

impl Submasks {
    pub fn of(set: u64) -> Self {
        Self {
            set,
            next: Some(set),
        }
    }
}

impl Iterator for Submasks {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let current = self.next?;
        self.next = if current == 0 {
            None
        } else {
            Some((current - 1) & self.set)
        };
        Some(current)
    }
}

/// Mask with the low `n` bits set.
pub fn full_mask(n: usize) -> u64 {
    if n >= MASK_BITS {
        u64::MAX
    } else {
        (1u64 << n) - 1
    }
}

/// Trait evidence split into people known to show the trait and people
/// known not to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Evidence {
    pub present: u64,
    pub absent: u64,
}

impl Evidence {
    /// Build evidence from per-person observations, indexed like the pedigree.
    pub fn from_observations(observed: impl IntoIterator<Item = Option<bool>>) -> Self {
        let mut evidence = Self::default();
        for (i, obs) in observed.into_iter().enumerate() {
            match obs {
                Some(true) => evidence.present |= 1u64 << i,
                Some(false) => evidence.absent |= 1u64 << i,
                None => {}
            }
        }
        evidence
    }

    /// Whether a trait subset agrees with every observation.
    pub fn admits(&self, has_trait: u64) -> bool {
        has_trait & self.present == self.present && has_trait & self.absent == 0
    }
}

/// Every trait subset of `n` people consistent with `evidence`.
///
/// Observed people are pinned, so only the unobserved bits vary.
pub fn trait_subsets(n: usize, evidence: Evidence) -> impl Iterator<Item = u64> {
    let free = full_mask(n) & !(evidence.present | evidence.absent);
    Submasks::of(free).map(move |sub| sub | evidence.present)
}

/// Every split of `n` people into disjoint one-copy and two-copy sets.
pub fn gene_partitions(n: usize) -> impl Iterator<Item = (u64, u64)> {
    let all = full_mask(n);
    Submasks::of(all).flat_map(move |one| Submasks::of(all & !one).map(move |two| (one, two)))
}

/// Every scenario for `n` people consistent with `evidence`.
pub fn scenarios(n: usize, evidence: Evidence) -> impl Iterator<Item = Scenario> {
    trait_subsets(n, evidence).flat_map(move |has_trait| {
        gene_partitions(n).map(move |(one_copy, two_copies)| Scenario {
            one_copy,
            two_copies,
            has_trait,
        })
    })
}
