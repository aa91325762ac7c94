//! Join-alias allocation.
//!
//! One counter per [`AssociationType`]. Requests reuse the most recently
//! issued alias of a type by default, so criteria from different groups
//! constrain the same joined row. A fresh request mints a new alias whose
//! join is isolated from every earlier usage.

use std::collections::BTreeMap;

use fedquery_criteria::Alias;

use crate::key_type::AssociationType;

/// Per-association alias counters for one translation run.
#[derive(Debug, Clone, Default)]
pub struct AliasAllocator {
    counters: BTreeMap<AssociationType, u32>,
}

impl AliasAllocator {
    /// Creates an allocator with no issued aliases.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an alias for `association`.
    ///
    /// With `force_fresh` false the latest alias of that type is returned,
    /// allocating the first one if needed. With `force_fresh` true a new alias
    /// is always minted.
    pub fn get_alias(&mut self, association: AssociationType, force_fresh: bool) -> Alias {
        let counter = self.counters.entry(association).or_insert(0);
        if force_fresh || *counter == 0 {
            *counter += 1;
        }
        make_alias(association, *counter)
    }
}

fn make_alias(association: AssociationType, n: u32) -> Alias {
    Alias::new(
        association.object_type(),
        format!("{}{}", association.alias_prefix(), n),
        association.join_path(),
    )
}

/// Aliases allocated for one group, keyed by association.
#[derive(Debug, Clone, Default)]
pub struct GroupAliases {
    by_association: BTreeMap<AssociationType, Alias>,
}

impl GroupAliases {
    /// Records the alias allocated for `association`.
    pub fn insert(&mut self, association: AssociationType, alias: Alias) {
        self.by_association.insert(association, alias);
    }

    /// The alias allocated for `association`.
    ///
    /// # Panics
    ///
    /// Panics if no alias was allocated for `association`; the translator
    /// allocates one for every association its group's key types join.
    pub fn get(&self, association: AssociationType) -> &Alias {
        match self.by_association.get(&association) {
            Some(alias) => alias,
            None => panic!(
                "no {} alias allocated for this group (allocated: {:?})",
                association,
                self.names()
            ),
        }
    }

    /// Allocated aliases, in association order.
    pub fn iter(&self) -> impl Iterator<Item = &Alias> {
        self.by_association.values()
    }

    /// Allocated alias names, in association order.
    pub fn names(&self) -> Vec<&str> {
        self.iter().map(|a| a.name.as_str()).collect()
    }
}
