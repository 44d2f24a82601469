// Genetics module
// Pedigree, inheritance model, scenario enumeration, exact inference

pub mod enumerate;
pub mod inference;
pub mod model;
pub mod pedigree;

pub use inference::{
    infer_marginals, scenario_from_names, GeneDistribution, DEFAULT_MAX_PEOPLE, HeredityEngine, HeredityReport,
    PersonMarginals, TraitDistribution,
};
pub use model::{GeneCount, InheritanceModel};
pub use pedigree::{Pedigree, PersonRecord};
