use std::collections::{HashMap, VecDeque};
use std::path::Path;

use crate::error::{AiError, Result};

/// Input row describing one person before parent names are resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonRecord {
    pub name: String,
    pub mother: Option<String>,
    pub father: Option<String>,
    /// Observed trait: `Some(true)` present, `Some(false)` absent, `None` unknown.
    pub observed: Option<bool>,
}

impl PersonRecord {
    pub fn founder(name: &str, observed: Option<bool>) -> Self {
        Self {
            name: name.to_string(),
            mother: None,
            father: None,
            observed,
        }
    }

    pub fn child(name: &str, mother: &str, father: &str, observed: Option<bool>) -> Self {
        Self {
            name: name.to_string(),
            mother: Some(mother.to_string()),
            father: Some(father.to_string()),
            observed,
        }
    }
}

/// A resolved pedigree entry with parents stored as indices.
#[derive(Debug, Clone)]
struct Person {
    name: String,
    mother: Option<usize>,
    father: Option<usize>,
    observed: Option<bool>,
}

/// A family tree with optional trait observations.
///
/// People keep the order in which they were added; parents are stored as
/// 0-based indices into that order. Unlike a breeding pedigree, a person
/// has either both parents on record or none, and every parent name must
/// resolve to a person in the same pedigree.
#[derive(Debug, Clone, Default)]
pub struct Pedigree {
    people: Vec<Person>,
    name_to_index: HashMap<String, usize>,
}

impl Pedigree {
    /// Create an empty pedigree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of people in the pedigree.
    pub fn n_people(&self) -> usize {
        self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    /// Look up the 0-based index of a person by name.
    pub fn person_index(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    /// Name of the person at `index`.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    pub fn name(&self, index: usize) -> &str {
        &self.people[index].name
    }

    pub fn mother(&self, index: usize) -> Option<usize> {
        self.people[index].mother
    }

    pub fn father(&self, index: usize) -> Option<usize> {
        self.people[index].father
    }

    /// Both parents of the person at `index`, as `(mother, father)`.
    pub fn parents(&self, index: usize) -> Option<(usize, usize)> {
        let p = &self.people[index];
        p.mother.zip(p.father)
    }

    pub fn is_founder(&self, index: usize) -> bool {
        self.parents(index).is_none()
    }

    /// Observed trait for the person at `index`, if known.
    pub fn observed(&self, index: usize) -> Option<bool> {
        self.people[index].observed
    }

    /// Names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.people.iter().map(|p| p.name.as_str())
    }

    /// Add a person whose parents (if any) are already in the pedigree.
    ///
    /// # Errors
    /// Returns an error if the name already exists, if only one parent is
    /// given, or if a parent name is not yet registered.
    pub fn add_person(
        &mut self,
        name: &str,
        mother: Option<&str>,
        father: Option<&str>,
        observed: Option<bool>,
    ) -> Result<()> {
        if self.name_to_index.contains_key(name) {
            return Err(duplicate(name));
        }
        check_parent_pair(name, mother, father)?;

        let mother = mother.map(|m| self.resolve(name, m)).transpose()?;
        let father = father.map(|f| self.resolve(name, f)).transpose()?;

        self.name_to_index.insert(name.to_string(), self.people.len());
        self.people.push(Person {
            name: name.to_string(),
            mother,
            father,
            observed,
        });
        Ok(())
    }

    /// Build a pedigree from records given in any order.
    ///
    /// # Errors
    /// Returns an error for duplicate names, a single listed parent, a
    /// parent name with no record, or a cycle in the parent-of relation.
    pub fn from_records(records: &[PersonRecord]) -> Result<Self> {
        let mut ped = Self::new();

        // First pass: register every name so parents may appear after
        // their children in the input.
        for rec in records {
            if ped.name_to_index.contains_key(&rec.name) {
                return Err(duplicate(&rec.name));
            }
            check_parent_pair(&rec.name, rec.mother.as_deref(), rec.father.as_deref())?;
            ped.name_to_index.insert(rec.name.clone(), ped.people.len());
            ped.people.push(Person {
                name: rec.name.clone(),
                mother: None,
                father: None,
                observed: rec.observed,
            });
        }

        // Second pass: resolve parent indices.
        for (i, rec) in records.iter().enumerate() {
            let mother = rec
                .mother
                .as_deref()
                .map(|m| ped.resolve(&rec.name, m))
                .transpose()?;
            let father = rec
                .father
                .as_deref()
                .map(|f| ped.resolve(&rec.name, f))
                .transpose()?;
            ped.people[i].mother = mother;
            ped.people[i].father = father;
        }

        ped.validate()?;
        Ok(ped)
    }

    /// Read a pedigree from a CSV file.
    ///
    /// Expected columns (header required): `name`, `mother`, `father`,
    /// `trait`. Blank parents mean "no parents on record"; `trait` is `1`,
    /// `0`, or blank for unknown.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, a column is missing, a
    /// row has the wrong number of fields, a trait value is not `1`/`0`/blank,
    /// or the resulting pedigree is invalid.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .trim(csv::Trim::All)
            .from_path(path.as_ref())?;
        Self::from_csv_reader(reader)
    }

    /// Same as [`Pedigree::from_csv`], reading from any byte source.
    pub fn from_csv_reader<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Self> {
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_lowercase())
            .collect();

        let column = |wanted: &str| {
            headers.iter().position(|h| h == wanted).ok_or_else(|| {
                AiError::Malformed(format!("CSV missing '{}' column", wanted))
            })
        };
        let name_col = column("name")?;
        let mother_col = column("mother")?;
        let father_col = column("father")?;
        let trait_col = column("trait")?;

        let mut records = Vec::new();
        for result in reader.records() {
            let row = result?;

            let name = field(&row, name_col, "name")?;
            if name.is_empty() {
                return Err(AiError::Malformed("Empty name in row".to_string()));
            }

            records.push(PersonRecord {
                name: name.to_string(),
                mother: parse_parent(field(&row, mother_col, "mother")?),
                father: parse_parent(field(&row, father_col, "father")?),
                observed: parse_trait(field(&row, trait_col, "trait")?)?,
            });
        }

        log::debug!("Read {} pedigree records", records.len());
        Self::from_records(&records)
    }

    /// Validate the pedigree for consistency.
    ///
    /// Checks that nobody is their own parent, that parents are either both
    /// recorded or both absent, and that the parent-of relation is acyclic.
    ///
    /// # Errors
    /// Returns an error describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        for (i, p) in self.people.iter().enumerate() {
            if p.mother.is_some() != p.father.is_some() {
                return Err(AiError::Pedigree(format!(
                    "'{}' must have both parents or neither",
                    p.name
                )));
            }
            if p.mother == Some(i) || p.father == Some(i) {
                return Err(AiError::Pedigree(format!(
                    "'{}' is listed as their own parent",
                    p.name
                )));
            }
        }
        self.topological_order().map(|_| ())
    }

    /// Indices ordered so that both parents precede each child.
    ///
    /// Uses Kahn's algorithm with a FIFO queue, so founders come out in
    /// insertion order.
    ///
    /// # Errors
    /// Returns an error if the pedigree contains a cycle.
    pub fn topological_order(&self) -> Result<Vec<usize>> {
        let n = self.people.len();
        let mut children_of: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut in_degree = vec![0u32; n];

        for (i, p) in self.people.iter().enumerate() {
            for parent in [p.mother, p.father].into_iter().flatten() {
                children_of[parent].push(i);
                in_degree[i] += 1;
            }
        }

        let mut queue: VecDeque<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(n);

        while let Some(node) = queue.pop_front() {
            order.push(node);
            for &child in &children_of[node] {
                in_degree[child] -= 1;
                if in_degree[child] == 0 {
                    queue.push_back(child);
                }
            }
        }

        if order.len() != n {
            return Err(AiError::Pedigree("Pedigree contains a cycle".to_string()));
        }
        Ok(order)
    }

    fn resolve(&self, person: &str, parent: &str) -> Result<usize> {
        self.person_index(parent).ok_or_else(|| AiError::UnknownParent {
            person: person.to_string(),
            parent: parent.to_string(),
        })
    }
}

fn field<'r>(row: &'r csv::StringRecord, col: usize, what: &str) -> Result<&'r str> {
    row.get(col)
        .ok_or_else(|| AiError::Malformed(format!("Missing {} field in row", what)))
}

fn duplicate(name: &str) -> AiError {
    AiError::Pedigree(format!("Duplicate person name: '{}'", name))
}

fn check_parent_pair(name: &str, mother: Option<&str>, father: Option<&str>) -> Result<()> {
    if mother.is_some() != father.is_some() {
        return Err(AiError::Pedigree(format!(
            "'{}' must have both parents or neither",
            name
        )));
    }
    Ok(())
}

/// Blank parent fields mean "not on record".
fn parse_parent(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse a trait cell: `1` present, `0` absent, blank unknown.
pub fn parse_trait(s: &str) -> Result<Option<bool>> {
    match s.trim() {
        "1" => Ok(Some(true)),
        "0" => Ok(Some(false)),
        "" => Ok(None),
        other => Err(AiError::Malformed(format!(
            "Trait must be 1, 0 or blank, got '{}'",
            other
        ))),
    }
}
