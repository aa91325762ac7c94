//! Group/item translator.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use fedquery_criteria::{Alias, Criterion, Junction, JunctionKind, SearchQuery};
use tracing::{debug, trace, warn};

use crate::alias::{AliasAllocator, GroupAliases};
use crate::cache::TranslationCache;
use crate::config::TranslatorConfig;
use crate::error::TranslatorResult;
use crate::input::{QueryGroup, QueryItem};
use crate::item_key::{parse_item_key, ItemKey};
use crate::key_type::{AssociationType, KeyType};
use crate::phrase::{PhraseBuilder, PhraseInput};
use crate::result::{SkipReason, SkippedItem, Translation, TranslationRequest, TranslationStats};
use crate::traits::{bare_code, DomainExpansion, NamespaceRegistry};

/// Translates query groups into a [`SearchQuery`].
///
/// The translator borrows its two collaborators and owns no per-run state:
/// every call to [`translate_request`](Self::translate_request) starts a
/// fresh alias allocator and conflict history, so one translator may serve
/// many requests in sequence.
///
/// # Example
///
/// ```ignore
/// let translator = QueryTranslator::new(&terminology, &registry);
/// let translation = translator.translate(&groups)?;
/// println!("{}", translation.query);
/// ```
pub struct QueryTranslator<'a> {
    expansion: &'a dyn DomainExpansion,
    namespaces: &'a dyn NamespaceRegistry,
    config: TranslatorConfig,
    cache: Option<Arc<TranslationCache>>,
}

impl<'a> QueryTranslator<'a> {
    /// Creates a translator with default configuration.
    pub fn new(expansion: &'a dyn DomainExpansion, namespaces: &'a dyn NamespaceRegistry) -> Self {
        Self {
            expansion,
            namespaces,
            config: TranslatorConfig::default(),
            cache: None,
        }
    }

    /// Creates a translator with custom configuration.
    pub fn with_config(
        expansion: &'a dyn DomainExpansion,
        namespaces: &'a dyn NamespaceRegistry,
        config: TranslatorConfig,
    ) -> Self {
        let cache = config
            .cache
            .as_ref()
            .map(|c| Arc::new(TranslationCache::new(c.clone())));
        Self {
            expansion,
            namespaces,
            config,
            cache,
        }
    }

    /// Returns a reference to the cache if enabled.
    pub fn cache(&self) -> Option<&TranslationCache> {
        self.cache.as_deref()
    }

    /// Returns a reference to the translator configuration.
    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    /// Translates groups with no query-level options.
    pub fn translate(&self, groups: &[QueryGroup]) -> TranslatorResult<Translation> {
        self.translate_request(&TranslationRequest::new(groups.to_vec()))
    }

    /// Translates a request.
    ///
    /// Groups are ANDed together; the criteria of one group are ORed. A group
    /// whose key types conflict with those of any earlier group is isolated in
    /// a correlated sub-query so it gets its own joined row.
    ///
    /// # Errors
    ///
    /// Fails on the first phrase that cannot be built: an empty domain for a
    /// coded key type, an unsupported value flag, or a malformed domain token.
    pub fn translate_request(&self, request: &TranslationRequest) -> TranslatorResult<Translation> {
        let start = Instant::now();

        let fingerprint = request.fingerprint();
        if let Some(ref cache) = self.cache {
            if let Some(mut cached) = cache.get(request) {
                trace!(fingerprint, "translation cache hit");
                cached.stats.duration = start.elapsed();
                cached.stats.cache_hit = true;
                return Ok(cached);
            }
            trace!(fingerprint, "translation cache miss");
        }

        let mut run = Run::new(self);
        for (index, group) in request.groups.iter().enumerate() {
            run.translate_group(index, group)?;
        }

        let root = junction_of(JunctionKind::Conjunction, run.conjuncts).into_collapsed();
        let query = SearchQuery::builder(self.config.root_object_name.as_str(), root)
            .maybe_id(request.query_id.clone())
            .sorts(request.sort_criteria.iter().cloned())
            .aliases(run.global_aliases);
        let query = match request.first_result {
            Some(first) => query.first_result(first),
            None => query,
        };
        let query = match request.max_results {
            Some(max) => query.max_results(max),
            None => query,
        };
        let query = query.build()?;

        let translation = Translation {
            query,
            skipped_items: run.skipped,
            stats: TranslationStats {
                duration: start.elapsed(),
                groups: request.groups.len(),
                contributing_groups: run.contributing_groups,
                subqueries: run.subqueries,
                cache_hit: false,
            },
        };

        if let Some(ref cache) = self.cache {
            cache.set(request.clone(), translation.clone());
        }
        Ok(translation)
    }

    fn find_domain(&self, key: &ItemKey) -> Vec<String> {
        self.expansion
            .find_domain(&key.domain_pattern())
            .iter()
            .map(|code| bare_code(code).to_string())
            .collect()
    }
}

// =============================================================================
// Per-request state
// =============================================================================

struct Run<'t, 'a> {
    translator: &'t QueryTranslator<'a>,
    phrases: PhraseBuilder<'a>,
    allocator: AliasAllocator,
    past_key_types: BTreeSet<KeyType>,
    global_aliases: Vec<Alias>,
    conjuncts: Vec<Criterion>,
    skipped: Vec<SkippedItem>,
    contributing_groups: usize,
    subqueries: usize,
}

/// An item that classified to a known key type.
struct Classified<'g> {
    item: &'g QueryItem,
    key: ItemKey,
    key_type: KeyType,
}

impl<'t, 'a> Run<'t, 'a> {
    fn new(translator: &'t QueryTranslator<'a>) -> Self {
        Self {
            translator,
            phrases: PhraseBuilder::new(translator.namespaces, translator.config.max_in),
            allocator: AliasAllocator::new(),
            past_key_types: BTreeSet::new(),
            global_aliases: Vec::new(),
            conjuncts: Vec::new(),
            skipped: Vec::new(),
            contributing_groups: 0,
            subqueries: 0,
        }
    }

    fn translate_group(&mut self, index: usize, group: &QueryGroup) -> TranslatorResult<()> {
        let items = self.classify(index, group);

        let current: BTreeSet<KeyType> = items
            .iter()
            .map(|c| c.key_type)
            .filter(|kt| !kt.is_demographic())
            .collect();
        let needs_subquery = current
            .iter()
            .any(|kt| self.past_key_types.iter().any(|past| kt.conflicts_with(*past)));

        let aliases = self.allocate_aliases(&items, needs_subquery);
        let criteria = self.build_phrases(index, &items, &aliases)?;

        let combined = if criteria.is_empty() {
            None
        } else {
            Some(junction_of(JunctionKind::Disjunction, criteria).into_collapsed())
        };

        if let Some(criterion) = combined {
            let referenced = referenced_aliases(&criterion, &aliases);
            let criterion = if needs_subquery {
                self.subqueries += 1;
                let config = &self.translator.config;
                let subquery = SearchQuery::builder(config.root_object_name.as_str(), criterion)
                    .aliases(referenced)
                    .build()?;
                Criterion::InSubquery {
                    property: config.correlation_property.clone(),
                    subquery: Box::new(subquery),
                }
            } else {
                for alias in referenced {
                    if !self.global_aliases.contains(&alias) {
                        self.global_aliases.push(alias);
                    }
                }
                criterion
            };
            let criterion = if group.inverted {
                Criterion::Not(Box::new(criterion))
            } else {
                criterion
            };
            self.conjuncts.push(criterion);
            self.contributing_groups += 1;
        }

        debug!(
            group = index,
            items = group.items.len(),
            key_types = ?current,
            aliases = ?aliases.names(),
            needs_subquery,
            inverted = group.inverted,
            "translated group"
        );
        self.past_key_types.extend(current);
        Ok(())
    }

    fn classify<'g>(&mut self, index: usize, group: &'g QueryGroup) -> Vec<Classified<'g>> {
        let mut classified = Vec::with_capacity(group.items.len());
        for item in &group.items {
            let key = match parse_item_key(&item.item_key) {
                Ok(key) => key,
                Err(err) => {
                    warn!(group = index, item_key = %item.item_key, error = %err, "skipping item");
                    self.skip(index, item, SkipReason::UnparsableKey);
                    continue;
                }
            };
            let key_type = KeyType::classify_key(&key, &item.tool_tip);
            if key_type == KeyType::Unknown {
                warn!(
                    group = index,
                    item_key = %item.item_key,
                    "skipping item of unknown key type"
                );
                self.skip(index, item, SkipReason::UnknownKeyType);
                continue;
            }
            classified.push(Classified {
                item,
                key,
                key_type,
            });
        }
        classified
    }

    fn allocate_aliases(&mut self, items: &[Classified<'_>], needs_subquery: bool) -> GroupAliases {
        let associations: BTreeSet<AssociationType> = items
            .iter()
            .filter_map(|c| c.key_type.association())
            .collect();
        let mut aliases = GroupAliases::default();
        for association in associations {
            let fresh = needs_subquery && association.supports_fresh_alias();
            aliases.insert(association, self.allocator.get_alias(association, fresh));
        }
        aliases
    }

    fn build_phrases(
        &mut self,
        index: usize,
        items: &[Classified<'_>],
        aliases: &GroupAliases,
    ) -> TranslatorResult<Vec<Criterion>> {
        let mut criteria = Vec::new();
        let mut grouped_done: BTreeSet<KeyType> = BTreeSet::new();

        for (position, classified) in items.iter().enumerate() {
            let key_type = classified.key_type;
            let phrase = if key_type.is_grouped_criteria() {
                if !grouped_done.insert(key_type) {
                    continue;
                }
                let domain = self.merged_domain(&items[position..], key_type);
                let input = PhraseInput::merged(key_type, &classified.item.item_key, &domain);
                self.phrases.build(&input, aliases)?
            } else {
                let domain = self.translator.find_domain(&classified.key);
                let input = PhraseInput::for_item(key_type, classified.item, &domain);
                self.phrases.build(&input, aliases)?
            };

            match phrase {
                Some(criterion) => criteria.push(criterion),
                None => {
                    warn!(
                        group = index,
                        item_key = %classified.item.item_key,
                        key_type = %key_type,
                        "skipping item with empty domain"
                    );
                    self.skip(index, classified.item, SkipReason::EmptyDomain);
                }
            }
        }
        Ok(criteria)
    }

    /// Union of the domains of every item of `key_type`, in first-seen order.
    fn merged_domain(&self, items: &[Classified<'_>], key_type: KeyType) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut domain = Vec::new();
        for classified in items.iter().filter(|c| c.key_type == key_type) {
            for code in self.translator.find_domain(&classified.key) {
                if seen.insert(code.clone()) {
                    domain.push(code);
                }
            }
        }
        domain
    }

    fn skip(&mut self, index: usize, item: &QueryItem, reason: SkipReason) {
        self.skipped.push(SkippedItem {
            group_index: index,
            item_key: item.item_key.clone(),
            reason,
        });
    }
}

fn junction_of(kind: JunctionKind, criteria: Vec<Criterion>) -> Junction {
    criteria.into_iter().fold(Junction::new(kind), Junction::with)
}

/// Group aliases that `criterion` actually references.
fn referenced_aliases(criterion: &Criterion, aliases: &GroupAliases) -> Vec<Alias> {
    let paths = criterion.property_paths();
    aliases
        .iter()
        .filter(|alias| {
            paths
                .iter()
                .any(|path| path.split_once('.').is_some_and(|(name, _)| name == alias.name))
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Namespace;
    use std::collections::HashMap;

    struct MapExpansion(HashMap<String, Vec<String>>);

    impl DomainExpansion for MapExpansion {
        fn find_domain(&self, item_key: &str) -> Vec<String> {
            self.0.get(item_key).cloned().unwrap_or_default()
        }
    }

    struct Registry;

    impl NamespaceRegistry for Registry {
        fn namespace_id(&self, namespace: Namespace) -> i64 {
            namespace as i64
        }

        fn namespace_name(&self, namespace: Namespace) -> String {
            namespace.to_string()
        }
    }

    fn expansion(entries: &[(&str, &[&str])]) -> MapExpansion {
        MapExpansion(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.iter().map(|c| c.to_string()).collect()))
                .collect(),
        )
    }

    #[test]
    fn test_empty_request_is_true() {
        let domains = expansion(&[]);
        let translator = QueryTranslator::new(&domains, &Registry);
        let translation = translator.translate(&[]).unwrap();
        assert_eq!(translation.query.root_criterion().to_string(), "TRUE");
        assert_eq!(translation.stats.groups, 0);
    }

    #[test]
    fn test_compound_codes_are_reduced() {
        let domains = expansion(&[("\\Demographics\\Gender\\%", &["GENDER:F"])]);
        let translator = QueryTranslator::new(&domains, &Registry);
        let group = QueryGroup::new(vec![QueryItem::new("\\\\i2b2\\Demographics\\Gender\\")]);
        let translation = translator.translate(&[group]).unwrap();
        assert_eq!(
            translation.query.root_criterion().to_string(),
            "administrativeGender = 'F'"
        );
    }

    #[test]
    fn test_grouped_items_merge_domains() {
        let domains = expansion(&[
            ("\\Demographics\\Gender\\Female\\%", &["F"]),
            ("\\Demographics\\Gender\\Male\\%", &["M", "F"]),
        ]);
        let translator = QueryTranslator::new(&domains, &Registry);
        let group = QueryGroup::new(vec![
            QueryItem::new("\\\\i2b2\\Demographics\\Gender\\Female\\"),
            QueryItem::new("\\\\i2b2\\Demographics\\Gender\\Male\\"),
        ]);
        let translation = translator.translate(&[group]).unwrap();
        assert_eq!(
            translation.query.root_criterion().to_string(),
            "administrativeGender IN ('F', 'M')"
        );
        assert!(translation.query.aliases().is_empty());
    }

    #[test]
    fn test_unknown_items_are_recorded() {
        let domains = expansion(&[]);
        let translator = QueryTranslator::new(&domains, &Registry);
        let group = QueryGroup::new(vec![
            QueryItem::new("\\\\i2b2\\Nothing\\Here\\"),
            QueryItem::new(""),
        ]);
        let translation = translator.translate(&[group]).unwrap();
        assert_eq!(translation.stats.contributing_groups, 0);
        let reasons: Vec<SkipReason> = translation
            .skipped_items
            .iter()
            .map(|s| s.reason)
            .collect();
        assert_eq!(
            reasons,
            vec![SkipReason::UnknownKeyType, SkipReason::UnparsableKey]
        );
    }
}
