//! Canonical directed difference between two genotypes
//!
//! The delta of a genotype pair is the ordered list of per-position changes
//! between them, plus a direction tag saying which argument is the start of
//! the change sequence. The direction is decided once, at the *smallest*
//! differing position: if both genotypes carry a mutation there, the one
//! with the alphabetically smaller allele defines `Forward`; if only one
//! side carries a mutation, that side defines `Forward` when it is the
//! first argument. Every later change is then rendered consistently with
//! that choice, substituting the wild-type allele `Z` for a missing side.
//!
//! The tie-break is asymmetric on purpose: the same pair yields the same
//! change tokens regardless of argument order, so an edge or diagonal is
//! never emitted twice under two spellings. Downstream diagonal comparison
//! depends on this exact canonicalization; do not "simplify" it.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::constants::WILD_TYPE_ALLELE;
use crate::error::HypercubeError;
use crate::genotype::{parse_site, Genotype, Mutation};

/// Which argument of [`delta`] is the start of the change sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// The first genotype is the start
    Forward,
    /// The second genotype is the start
    Reverse,
}

/// A single positional change, rendered as `<from><site><to>` (e.g. `A10Z`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Change {
    from: char,
    site: String,
    position: u32,
    to: char,
}

impl Change {
    fn new(from: char, site: &str, position: u32, to: char) -> Self {
        Self {
            from,
            site: site.to_string(),
            position,
            to,
        }
    }

    /// Parse a change token such as `A10Z` or `AV10Z`
    pub fn parse(token: &str) -> Result<Self, HypercubeError> {
        if !token.is_ascii() || token.len() < 3 {
            return Err(HypercubeError::malformed(
                token,
                "change token must be ASCII with two alleles and a site",
            ));
        }
        let bytes = token.as_bytes();
        let from = bytes[0] as char;
        let to = bytes[token.len() - 1] as char;
        if !from.is_ascii_alphabetic() || !to.is_ascii_alphabetic() {
            return Err(HypercubeError::malformed(
                token,
                "change token must start and end with an allele letter",
            ));
        }
        let site = &token[1..token.len() - 1];
        let position = parse_site(site).map_err(|reason| HypercubeError::malformed(token, reason))?;
        Ok(Self {
            from,
            site: site.to_string(),
            position,
            to,
        })
    }

    /// The allele at this position in the start genotype
    pub fn from_allele(&self) -> char {
        self.from
    }

    /// The allele at this position in the end genotype
    pub fn to_allele(&self) -> char {
        self.to
    }

    /// The numeric position this change applies to
    pub fn position(&self) -> u32 {
        self.position
    }

    /// Render the token as text, e.g. `A10Z`
    pub fn token(&self) -> String {
        format!("{}{}{}", self.from, self.site, self.to)
    }

    /// The end-state mutation at this position, or `None` when the end
    /// state is wild type (the mutation is removed rather than substituted)
    pub fn end_state(&self) -> Option<Mutation> {
        (self.to != WILD_TYPE_ALLELE)
            .then(|| Mutation::from_parts(self.site.clone(), self.position, self.to))
    }
}

/// Compute the canonical directed difference between two genotypes.
///
/// Changes are ordered by increasing numeric position; this ordering, not
/// lexicographic text order, is the canonical order used for diagonal
/// comparison. A delta of length 1 denotes a direct edge in the mutation
/// graph.
///
/// # Errors
/// Returns [`HypercubeError::IncomparableGenotypes`] when the two genotypes
/// have identical mutation sets; callers must guard against comparing a
/// genotype to itself.
pub fn delta(g1: &Genotype, g2: &Genotype) -> Result<(Direction, Vec<Change>), HypercubeError> {
    let s1: HashSet<&Mutation> = g1.point_mutations().iter().collect();
    let s2: HashSet<&Mutation> = g2.point_mutations().iter().collect();

    // d-side: mutations only in g1; D-side: only in g2
    let mut d_side: BTreeMap<u32, &Mutation> = BTreeMap::new();
    for m in s1.difference(&s2) {
        d_side.insert(m.position(), *m);
    }
    let mut big_d_side: BTreeMap<u32, &Mutation> = BTreeMap::new();
    for m in s2.difference(&s1) {
        big_d_side.insert(m.position(), *m);
    }

    let positions: BTreeSet<u32> = d_side.keys().chain(big_d_side.keys()).copied().collect();
    let mut iter = positions.into_iter();
    let first = iter.next().ok_or(HypercubeError::IncomparableGenotypes)?;

    // The smallest differing position fixes the direction for the whole delta
    let (reverse, first_change) = match (d_side.get(&first), big_d_side.get(&first)) {
        (Some(d), Some(big)) => {
            if d.allele() < big.allele() {
                (false, Change::new(d.allele(), d.site(), first, big.allele()))
            } else {
                (true, Change::new(big.allele(), big.site(), first, d.allele()))
            }
        }
        (Some(d), None) => (
            false,
            Change::new(d.allele(), d.site(), first, WILD_TYPE_ALLELE),
        ),
        (None, Some(big)) => (
            true,
            Change::new(big.allele(), big.site(), first, WILD_TYPE_ALLELE),
        ),
        (None, None) => unreachable!("position came from one of the two sides"),
    };

    let mut changes = vec![first_change];
    for position in iter {
        let change = match (d_side.get(&position), big_d_side.get(&position)) {
            (Some(d), Some(big)) => {
                if !reverse {
                    Change::new(d.allele(), d.site(), position, big.allele())
                } else {
                    Change::new(big.allele(), big.site(), position, d.allele())
                }
            }
            (Some(d), None) => {
                if !reverse {
                    Change::new(d.allele(), d.site(), position, WILD_TYPE_ALLELE)
                } else {
                    Change::new(WILD_TYPE_ALLELE, d.site(), position, d.allele())
                }
            }
            (None, Some(big)) => {
                if reverse {
                    Change::new(big.allele(), big.site(), position, WILD_TYPE_ALLELE)
                } else {
                    Change::new(WILD_TYPE_ALLELE, big.site(), position, big.allele())
                }
            }
            (None, None) => unreachable!("position came from one of the two sides"),
        };
        changes.push(change);
    }

    let direction = if reverse {
        Direction::Reverse
    } else {
        Direction::Forward
    };
    Ok((direction, changes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn g(field: &str) -> Genotype {
        Genotype::parse(field).unwrap()
    }

    fn tokens(changes: &[Change]) -> Vec<String> {
        changes.iter().map(Change::token).collect()
    }

    /// Apply a change list to its start genotype, giving the end genotype
    fn apply(start: &Genotype, changes: &[Change]) -> BTreeSet<String> {
        let mut mutations: Vec<Mutation> = start
            .point_mutations()
            .iter()
            .filter(|m| !changes.iter().any(|c| c.position() == m.position()))
            .cloned()
            .collect();
        for change in changes {
            if let Some(m) = change.end_state() {
                mutations.push(m);
            }
        }
        token_set(&Genotype::from_mutations(mutations))
    }

    fn token_set(genotype: &Genotype) -> BTreeSet<String> {
        if genotype.is_wild_type() {
            return BTreeSet::new();
        }
        genotype
            .point_mutations()
            .iter()
            .map(Mutation::token)
            .collect()
    }

    #[test]
    fn test_wild_type_to_single_mutant() {
        let (dir, changes) = delta(&g("wt"), &g("10A")).unwrap();
        assert_eq!(dir, Direction::Reverse);
        assert_eq!(tokens(&changes), ["A10Z"]);
    }

    #[test]
    fn test_single_mutant_to_wild_type() {
        let (dir, changes) = delta(&g("10A"), &g("wt")).unwrap();
        assert_eq!(dir, Direction::Forward);
        assert_eq!(tokens(&changes), ["A10Z"]);
    }

    #[test]
    fn test_substitution_at_shared_position() {
        // Both genotypes mutated at 10; smaller allele defines forward
        let (dir, changes) = delta(&g("10A"), &g("10V")).unwrap();
        assert_eq!(dir, Direction::Forward);
        assert_eq!(tokens(&changes), ["A10V"]);

        let (dir, changes) = delta(&g("10V"), &g("10A")).unwrap();
        assert_eq!(dir, Direction::Reverse);
        assert_eq!(tokens(&changes), ["A10V"]);
    }

    #[test]
    fn test_changes_ordered_by_numeric_position() {
        // 9 < 10 numerically but "9" > "10" lexicographically
        let (_, changes) = delta(&g("9K:10A"), &g("wt")).unwrap();
        assert_eq!(tokens(&changes), ["K9Z", "A10Z"]);
    }

    #[test]
    fn test_identical_genotypes_incomparable() {
        let err = delta(&g("10A"), &g("10A")).unwrap_err();
        assert!(matches!(err, HypercubeError::IncomparableGenotypes));
        let err = delta(&g("wt"), &g("0Z")).unwrap_err();
        assert!(matches!(err, HypercubeError::IncomparableGenotypes));
    }

    #[test]
    fn test_opposite_directions_identical_changes() {
        let samples = [
            g("wt"),
            g("10A"),
            g("20K"),
            g("10A:20K"),
            g("V5T"),
            g("V5T:10A"),
            g("9K:10A:30M"),
        ];
        for (i, g1) in samples.iter().enumerate() {
            for g2 in samples.iter().skip(i + 1) {
                let (dir12, changes12) = delta(g1, g2).unwrap();
                let (dir21, changes21) = delta(g2, g1).unwrap();
                assert_ne!(dir12, dir21, "{} vs {}", g1.key(), g2.key());
                assert_eq!(changes12, changes21, "{} vs {}", g1.key(), g2.key());
            }
        }
    }

    #[test]
    fn test_round_trip_reconstructs_end_genotype() {
        let samples = [
            g("wt"),
            g("10A"),
            g("20K"),
            g("10A:20K"),
            g("V5T"),
            g("V5T:10A"),
            g("9K:10A:30M"),
        ];
        for (i, g1) in samples.iter().enumerate() {
            for g2 in samples.iter().skip(i + 1) {
                let (dir, changes) = delta(g1, g2).unwrap();
                let (start, end) = match dir {
                    Direction::Forward => (g1, g2),
                    Direction::Reverse => (g2, g1),
                };
                assert_eq!(
                    apply(start, &changes),
                    token_set(end),
                    "{} -> {}",
                    start.key(),
                    end.key()
                );
            }
        }
    }

    #[test]
    fn test_change_parse_roundtrip() {
        let c = Change::parse("A10Z").unwrap();
        assert_eq!(c.from_allele(), 'A');
        assert_eq!(c.to_allele(), 'Z');
        assert_eq!(c.position(), 10);
        assert_eq!(c.token(), "A10Z");
        assert!(c.end_state().is_none());

        let c = Change::parse("AV10K").unwrap();
        assert_eq!(c.position(), 10);
        assert_eq!(c.end_state().unwrap().token(), "V10K");
    }

    #[test]
    fn test_change_parse_malformed() {
        assert!(Change::parse("").is_err());
        assert!(Change::parse("AZ").is_err());
        assert!(Change::parse("AxZ").is_err()); // no digits in site
        assert!(Change::parse("A10").is_err()); // trailing digit, no allele
    }
}
