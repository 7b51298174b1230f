use std::collections::{BTreeMap, BTreeSet, HashMap};

use once_cell::sync::OnceCell;

use crate::{
    error::{Error, Result},
    manifest::{Manifest, Owner},
    parser::{self, ParseError},
    pattern::{MatchMode, Matcher},
    source::ManifestSource,
};

/// Options controlling how an [`OwnershipIndex`] resolves paths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexOptions {
    pub match_mode: MatchMode,
}

/// Resolves file paths to the owners responsible for them.
///
/// Unlike CODEOWNERS, where the last matching rule decides, a path is owned
/// by every owner with at least one matching pattern. The index never changes
/// after construction; the owner set and per-owner pattern lists are computed
/// once on first use and shared by all readers.
pub struct OwnershipIndex {
    manifest: Manifest,
    matchers: Vec<Matcher>,
    options: IndexOptions,
    owners: OnceCell<BTreeSet<Owner>>,
    owner_patterns: OnceCell<BTreeMap<Owner, Vec<usize>>>,
}

impl OwnershipIndex {
    /// Read the manifest from `source` and build an index from it. Malformed
    /// lines are skipped; only a failure to read the source is an error.
    pub fn build<S>(source: &S, options: IndexOptions) -> Result<OwnershipIndex>
    where
        S: ManifestSource + ?Sized,
    {
        let text = source
            .read_manifest()
            .map_err(|err| Error::ManifestUnavailable {
                location: source.location(),
                source: err,
            })?;

        // Patterns too large to compile are skipped like any other bad line.
        let mut result = parser::parse(&text);
        let mut compiled = HashMap::new();
        let mut rejected = Vec::new();
        result.rules.retain(|rule| {
            let pattern = &rule.pattern.0;
            if compiled.contains_key(pattern) {
                return true;
            }
            match Matcher::new(pattern, options.match_mode) {
                Ok(matcher) => {
                    compiled.insert(pattern.clone(), matcher);
                    true
                }
                Err(err) => {
                    rejected.push(ParseError::new(
                        format!("pattern can't be compiled: {}", err),
                        rule.pattern.1.clone(),
                    ));
                    false
                }
            }
        });
        result.errors.extend(rejected);

        for err in &result.errors {
            tracing::debug!(
                start = err.span.0,
                end = err.span.1,
                "skipping manifest line: {}",
                err.message
            );
        }

        let index = OwnershipIndex::with_matchers(result.into_manifest(), options, compiled);
        tracing::debug!(
            location = %source.location(),
            patterns = index.manifest.len(),
            match_mode = %options.match_mode,
            "built ownership index"
        );
        Ok(index)
    }

    /// Build an index from an already parsed manifest. Rules whose pattern
    /// can't be compiled are left out.
    pub fn new(manifest: Manifest, options: IndexOptions) -> OwnershipIndex {
        OwnershipIndex::with_matchers(manifest, options, HashMap::new())
    }

    fn with_matchers(
        manifest: Manifest,
        options: IndexOptions,
        mut compiled: HashMap<String, Matcher>,
    ) -> OwnershipIndex {
        let mut rules = Vec::with_capacity(manifest.len());
        let mut matchers = Vec::with_capacity(manifest.len());
        for rule in manifest.into_rules() {
            let matcher = match compiled.remove(&rule.pattern) {
                Some(matcher) => Ok(matcher),
                None => Matcher::new(&rule.pattern, options.match_mode),
            };
            match matcher {
                Ok(matcher) => {
                    matchers.push(matcher);
                    rules.push(rule);
                }
                Err(err) => tracing::debug!(
                    pattern = %rule.pattern,
                    error = %err,
                    "skipping pattern that can't be compiled"
                ),
            }
        }

        OwnershipIndex {
            manifest: rules.into_iter().collect(),
            matchers,
            options,
            owners: OnceCell::new(),
            owner_patterns: OnceCell::new(),
        }
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn options(&self) -> IndexOptions {
        self.options
    }

    /// Every owner named by at least one rule.
    pub fn all_owners(&self) -> &BTreeSet<Owner> {
        self.owners.get_or_init(|| {
            self.manifest
                .rules()
                .iter()
                .flat_map(|rule| rule.owners.iter().cloned())
                .collect()
        })
    }

    /// The patterns whose owner list contains `owner`, in manifest order.
    pub fn patterns_for(&self, owner: &str) -> Vec<&str> {
        self.owner_patterns()
            .get(owner)
            .map(|ids| ids.iter().map(|&id| self.matchers[id].pattern()).collect())
            .unwrap_or_default()
    }

    /// The owners responsible for `path`. Leading slashes are ignored.
    pub fn owners_for(&self, path: &str) -> BTreeSet<&str> {
        let hits = self.pattern_hits(path);
        self.owner_patterns()
            .iter()
            .filter(|(_, ids)| ids.iter().any(|&id| hits[id]))
            .map(|(owner, _)| owner.as_str())
            .collect()
    }

    /// The patterns that match `path`, in manifest order.
    pub fn matching_patterns(&self, path: &str) -> Vec<&str> {
        self.pattern_hits(path)
            .into_iter()
            .zip(&self.matchers)
            .filter(|(hit, _)| *hit)
            .map(|(_, matcher)| matcher.pattern())
            .collect()
    }

    /// Populate the owner and per-owner pattern caches up front, so later
    /// lookups are pure reads.
    pub fn prefetch(&self) {
        self.owner_patterns();
    }

    fn pattern_hits(&self, path: &str) -> Vec<bool> {
        let path = path.trim_start_matches('/');
        self.matchers.iter().map(|m| m.is_match(path)).collect()
    }

    fn owner_patterns(&self) -> &BTreeMap<Owner, Vec<usize>> {
        self.owner_patterns.get_or_init(|| self.collect_owner_patterns())
    }

    #[cfg(feature = "rayon")]
    fn collect_owner_patterns(&self) -> BTreeMap<Owner, Vec<usize>> {
        use rayon::prelude::*;
        self.all_owners()
            .par_iter()
            .map(|owner| (owner.clone(), self.pattern_ids_for(owner)))
            .collect()
    }

    #[cfg(not(feature = "rayon"))]
    fn collect_owner_patterns(&self) -> BTreeMap<Owner, Vec<usize>> {
        self.all_owners()
            .iter()
            .map(|owner| (owner.clone(), self.pattern_ids_for(owner)))
            .collect()
    }

    fn pattern_ids_for(&self, owner: &str) -> Vec<usize> {
        self.manifest
            .rules()
            .iter()
            .enumerate()
            .filter(|(_, rule)| rule.owners.iter().any(|o| o == owner))
            .map(|(id, _)| id)
            .collect()
    }
}

/// Owns a manifest source and the index built from it. The index is built on
/// the first call to [`IndexCell::get`]; concurrent first callers wait for a
/// single build rather than each reading the source.
pub struct IndexCell<S> {
    source: S,
    options: IndexOptions,
    index: OnceCell<OwnershipIndex>,
}

impl<S: ManifestSource> IndexCell<S> {
    pub fn new(source: S, options: IndexOptions) -> Self {
        Self {
            source,
            options,
            index: OnceCell::new(),
        }
    }

    pub fn get(&self) -> Result<&OwnershipIndex> {
        self.index
            .get_or_try_init(|| OwnershipIndex::build(&self.source, self.options))
    }

    /// Discard the cached index and build a new one from the source.
    pub fn reload(&mut self) -> Result<&OwnershipIndex> {
        self.index = OnceCell::new();
        self.get()
    }

    pub fn is_built(&self) -> bool {
        self.index.get().is_some()
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}
