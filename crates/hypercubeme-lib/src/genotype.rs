//! Genotype parsing and canonical representation
//!
//! A genotype is an ordered set of point-mutation tokens. Each token is a
//! *site* followed by a single allele character, e.g. `10A` (position 10
//! mutated to `A`). The site may carry a non-numeric prefix naming the
//! wild-type residue, e.g. `V10A`; the numeric part is the position used
//! for all ordering. The canonical wild type is the sentinel token `0Z`.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;

use crate::constants::WILD_TYPE_ALLELE;
use crate::error::HypercubeError;

/// A single point mutation: a site and the resulting allele
///
/// Invariant: within one genotype, no two mutations share a position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Mutation {
    site: String,
    position: u32,
    allele: char,
}

impl Mutation {
    /// The wild-type sentinel mutation, `0Z`
    pub fn wild_type() -> Self {
        Self {
            site: "0".to_string(),
            position: 0,
            allele: WILD_TYPE_ALLELE,
        }
    }

    /// Parse a mutation token such as `10A`, `V10A`, or the sentinel `0Z`
    pub fn parse(token: &str) -> Result<Self, HypercubeError> {
        if !token.is_ascii() || token.len() < 2 {
            return Err(HypercubeError::malformed(
                token,
                "mutation token must be ASCII with at least a site and an allele",
            ));
        }
        let allele = token.as_bytes()[token.len() - 1] as char;
        if !allele.is_ascii_alphabetic() {
            return Err(HypercubeError::malformed(
                token,
                "mutation token must end with an allele letter",
            ));
        }
        let site = &token[..token.len() - 1];
        let position = parse_site(site).map_err(|reason| HypercubeError::malformed(token, reason))?;
        Ok(Self {
            site: site.to_string(),
            position,
            allele,
        })
    }

    pub(crate) fn from_parts(site: String, position: u32, allele: char) -> Self {
        Self {
            site,
            position,
            allele,
        }
    }

    /// The site string, the token minus its trailing allele (e.g. `10` or `V10`)
    pub fn site(&self) -> &str {
        &self.site
    }

    /// The numeric position within the sequence
    pub fn position(&self) -> u32 {
        self.position
    }

    /// The resulting allele at this position
    pub fn allele(&self) -> char {
        self.allele
    }

    /// Whether this is the wild-type sentinel (position 0, allele `Z`)
    pub fn is_wild_type(&self) -> bool {
        self.position == 0 && self.allele == WILD_TYPE_ALLELE
    }

    /// Render the token as text, e.g. `10A`
    pub fn token(&self) -> String {
        format!("{}{}", self.site, self.allele)
    }
}

/// Parse a site string of the form `[letters]digits` into its numeric position
pub(crate) fn parse_site(site: &str) -> Result<u32, String> {
    let digits_start = site
        .find(|c: char| c.is_ascii_digit())
        .ok_or_else(|| format!("site {site:?} contains no position digits"))?;
    let (prefix, digits) = site.split_at(digits_start);
    if !prefix.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(format!("site {site:?} has a non-alphabetic prefix"));
    }
    digits
        .parse::<u32>()
        .map_err(|_| format!("site {site:?} has an invalid position"))
}

/// A genotype: an ordered, deduplicated set of point mutations
///
/// The wild type is represented by the single sentinel mutation `0Z`; any
/// genotype whose mutation set would be empty is normalized to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Genotype {
    mutations: Vec<Mutation>,
}

impl Genotype {
    /// The canonical wild-type genotype, `0Z`
    pub fn wild_type() -> Self {
        Self {
            mutations: vec![Mutation::wild_type()],
        }
    }

    /// Parse a colon-delimited mutation list; empty or `wt` means wild type
    pub fn parse(field: &str) -> Result<Self, HypercubeError> {
        if field.is_empty() || field == "wt" {
            return Ok(Self::wild_type());
        }
        let mutations = field
            .split(':')
            .map(Mutation::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { mutations })
    }

    /// Build a genotype from mutations, normalizing the empty set to wild type
    pub fn from_mutations(mutations: Vec<Mutation>) -> Self {
        if mutations.is_empty() {
            Self::wild_type()
        } else {
            Self { mutations }
        }
    }

    /// Whether this genotype is the wild type
    pub fn is_wild_type(&self) -> bool {
        self.mutations.len() == 1 && self.mutations[0].is_wild_type()
    }

    /// The observed point mutations; empty for the wild type
    pub fn point_mutations(&self) -> &[Mutation] {
        if self.is_wild_type() {
            &[]
        } else {
            &self.mutations
        }
    }

    /// The colon-joined canonical string, used on disk and for output sorting
    pub fn key(&self) -> String {
        let tokens: Vec<String> = self.mutations.iter().map(Mutation::token).collect();
        tokens.join(":")
    }
}

/// Read a genotype list from a tab-delimited text file.
///
/// The first line is a header and is skipped; every following line's first
/// tab-delimited field is parsed as a genotype. Blank lines are ignored.
/// Repeated genotypes keep their first occurrence only; a duplicated input
/// would otherwise repeat every edge it takes part in.
pub fn read_genotypes(path: &Path) -> Result<Vec<Genotype>, HypercubeError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => HypercubeError::InputNotFound(path.to_path_buf()),
        _ => HypercubeError::Io(e),
    })?;
    let reader = BufReader::new(file);

    let mut genotypes = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut num_duplicates = 0usize;
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if idx == 0 {
            continue; // header
        }
        if line.trim().is_empty() {
            continue;
        }
        let field = line.split('\t').next().unwrap_or("").trim_end_matches('\r');
        let genotype = Genotype::parse(field)?;
        if seen.insert(genotype.key()) {
            genotypes.push(genotype);
        } else {
            num_duplicates += 1;
        }
    }
    if num_duplicates > 0 {
        tracing::warn!("Ignored {} duplicate genotypes in {}", num_duplicates, path.display());
    }
    Ok(genotypes)
}
