use std::collections::HashMap;

/// An owner handle, e.g. `@acme/app-team` or `dev@example.com`. Owners are
/// compared by exact string equality.
pub type Owner = String;

/// A single ownership rule: a (leading-slash stripped) pattern and the owners
/// responsible for paths matching it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub pattern: String,
    pub owners: Vec<Owner>,
}

impl Rule {
    pub fn new(pattern: impl Into<String>, owners: Vec<Owner>) -> Self {
        Self {
            pattern: pattern.into(),
            owners,
        }
    }
}

/// Ordered set of rules keyed by their literal pattern. Adding a rule whose
/// pattern is already present replaces that rule's owners but keeps its
/// original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    rules: Vec<Rule>,
    positions: HashMap<String, usize>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, rule: Rule) {
        match self.positions.get(&rule.pattern) {
            Some(&idx) => self.rules[idx].owners = rule.owners,
            None => {
                self.positions.insert(rule.pattern.clone(), self.rules.len());
                self.rules.push(rule);
            }
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn into_rules(self) -> Vec<Rule> {
        self.rules
    }

    pub fn get(&self, pattern: &str) -> Option<&Rule> {
        self.positions.get(pattern).map(|&idx| &self.rules[idx])
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl FromIterator<Rule> for Manifest {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        let mut manifest = Manifest::new();
        for rule in iter {
            manifest.add(rule);
        }
        manifest
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
