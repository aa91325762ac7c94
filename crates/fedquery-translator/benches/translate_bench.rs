//! Translation benchmarks.

use std::collections::HashMap;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fedquery_translator::{
    DomainExpansion, Namespace, NamespaceRegistry, QueryGroup, QueryItem, QueryTranslator,
};

struct Ontology(HashMap<String, Vec<String>>);

impl DomainExpansion for Ontology {
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

fn ontology(codes: usize) -> Ontology {
    let mut domains = HashMap::new();
    domains.insert(
        "\\Labs\\LOINC\\%".to_string(),
        (0..codes).map(|i| format!("{}-{}", i, i % 10)).collect(),
    );
    domains.insert(
        "\\Diagnoses\\ICD9\\%".to_string(),
        (0..codes).map(|i| format!("{}.{}", i / 100, i % 100)).collect(),
    );
    domains.insert(
        "\\Demographics\\Gender\\%".to_string(),
        vec!["F".to_string(), "M".to_string()],
    );
    Ontology(domains)
}

fn bench_domain_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("translate_domain_size");
    let request = [QueryGroup::new(vec![QueryItem::new("\\\\i2b2\\Labs\\LOINC\\")])];

    for size in [10, 1_000, 10_000] {
        let ontology = ontology(size);
        let translator = QueryTranslator::new(&ontology, &Registry);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| translator.translate(black_box(&request)))
        });
    }
    group.finish();
}

fn bench_conflicting_groups(c: &mut Criterion) {
    let ontology = ontology(100);
    let translator = QueryTranslator::new(&ontology, &Registry);
    let request = [
        QueryGroup::new(vec![QueryItem::new("\\\\i2b2\\Demographics\\Gender\\")]),
        QueryGroup::new(vec![QueryItem::new("\\\\i2b2\\Labs\\LOINC\\")]),
        QueryGroup::new(vec![QueryItem::new("\\\\i2b2\\Diagnoses\\ICD9\\")]),
        QueryGroup::inverted(vec![QueryItem::new("\\\\i2b2\\Labs\\LOINC\\")]),
    ];

    c.bench_function("translate_conflicting_groups", |b| {
        b.iter(|| translator.translate(black_box(&request)))
    });
}

criterion_group!(benches, bench_domain_size, bench_conflicting_groups);
criterion_main!(benches);
