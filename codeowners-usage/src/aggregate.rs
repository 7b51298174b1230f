use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    fmt,
};

use serde::Serialize;

use crate::{
    index::OwnershipIndex,
    manifest::Owner,
    report::{UsageInstance, UsageReport},
};

/// Usage counts per component and owner. Owners with no usage of a
/// component are absent rather than present with a zero count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResultTable(BTreeMap<String, BTreeMap<Owner, u64>>);

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times `owner` uses `component`.
    pub fn count(&self, component: &str, owner: &str) -> u64 {
        self.0
            .get(component)
            .and_then(|owners| owners.get(owner))
            .copied()
            .unwrap_or(0)
    }

    pub fn owners(&self, component: &str) -> Option<&BTreeMap<Owner, u64>> {
        self.0.get(component)
    }

    /// Sum of all owner counts for `component`. An instance owned by several
    /// owners counts once per owner.
    pub fn total(&self, component: &str) -> u64 {
        self.0
            .get(component)
            .map(|owners| owners.values().sum())
            .unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeMap<Owner, u64>)> {
        self.0.iter().map(|(name, owners)| (name.as_str(), owners))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> BTreeMap<String, BTreeMap<Owner, u64>> {
        self.0
    }
}

/// Why an instance didn't contribute to any count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnattributedReason {
    MissingPath,
    NoOwner { path: String },
}

impl fmt::Display for UnattributedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnattributedReason::MissingPath => f.write_str("instance has no file path"),
            UnattributedReason::NoOwner { path } => write!(f, "no owner for {}", path),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unattributed {
    pub component: String,
    /// Position of the instance within its component's instance list.
    pub instance: usize,
    pub reason: UnattributedReason,
}

/// The outcome of an aggregation run: the result table plus the instances
/// that couldn't be attributed to anyone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregation {
    pub table: ResultTable,
    pub unattributed: Vec<Unattributed>,
}

/// Count component usage per owner. Convenience wrapper around
/// [`Aggregator::run`] that drops the unattributed instances.
pub fn aggregate(report: &UsageReport, index: &OwnershipIndex) -> ResultTable {
    Aggregator::new(index).run(report).table
}

pub struct Aggregator<'a> {
    index: &'a OwnershipIndex,
}

impl<'a> Aggregator<'a> {
    pub fn new(index: &'a OwnershipIndex) -> Self {
        Self { index }
    }

    pub fn run(&self, report: &UsageReport) -> Aggregation {
        self.index.prefetch();

        let mut aggregation = Aggregation::default();
        for (component, counts, unattributed) in self.count_components(report) {
            aggregation.table.0.insert(component.to_owned(), counts);
            aggregation.unattributed.extend(unattributed);
        }

        if !aggregation.unattributed.is_empty() {
            tracing::warn!(
                unattributed = aggregation.unattributed.len(),
                total = report.instance_count(),
                "some component usages could not be attributed to an owner"
            );
        }
        tracing::debug!(
            components = aggregation.table.len(),
            owners = self.index.all_owners().len(),
            "aggregated component usage"
        );
        aggregation
    }

    #[cfg(feature = "rayon")]
    fn count_components<'r>(&self, report: &'r UsageReport) -> Vec<ComponentCounts<'r>> {
        use rayon::prelude::*;
        let components: Vec<_> = report.components().collect();
        components
            .into_par_iter()
            .map(|(component, instances)| self.count_component(component, instances))
            .collect()
    }

    #[cfg(not(feature = "rayon"))]
    fn count_components<'r>(&self, report: &'r UsageReport) -> Vec<ComponentCounts<'r>> {
        report
            .components()
            .map(|(component, instances)| self.count_component(component, instances))
            .collect()
    }

    fn count_component<'r>(
        &self,
        component: &'r str,
        instances: &'r [UsageInstance],
    ) -> ComponentCounts<'r> {
        let mut counts: BTreeMap<Owner, u64> = BTreeMap::new();
        let mut unattributed = Vec::new();
        // Scanners report many usages per file, so resolve each path once.
        let mut resolved: HashMap<&str, BTreeSet<&str>> = HashMap::new();

        for (position, instance) in instances.iter().enumerate() {
            let Some(path) = instance.file.as_deref() else {
                tracing::debug!(
                    component,
                    instance = position,
                    "skipping usage without a file path"
                );
                unattributed.push(Unattributed {
                    component: component.to_owned(),
                    instance: position,
                    reason: UnattributedReason::MissingPath,
                });
                continue;
            };

            let owners = resolved
                .entry(path)
                .or_insert_with(|| self.index.owners_for(path));
            if owners.is_empty() {
                tracing::debug!(component, path, "usage has no owner");
                unattributed.push(Unattributed {
                    component: component.to_owned(),
                    instance: position,
                    reason: UnattributedReason::NoOwner {
                        path: path.to_owned(),
                    },
                });
                continue;
            }

            for &owner in owners.iter() {
                *counts.entry(owner.to_owned()).or_default() += 1;
            }
        }

        (component, counts, unattributed)
    }
}

type ComponentCounts<'r> = (&'r str, BTreeMap<Owner, u64>, Vec<Unattributed>);
