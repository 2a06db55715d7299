//! Benchmark for rule evaluation and classification
//!
//! Target: 100-rule table evaluated in well under a millisecond

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use reclass_classifier::classification::render;
use reclass_classifier::{
    ClassSpec, Classifier, MemoryStore, NodeAttributes, ParamValue, Rule, RuleTable,
};

fn node_attrs() -> NodeAttributes {
    [
        ("host", "web042"),
        ("domain", "lab.local"),
        ("env", "prod"),
        ("role", "web"),
        ("cluster_name", "lab"),
        ("__pub_fun", "state.apply"),
    ]
    .into_iter()
    .collect()
}

fn rule_table(size: usize) -> RuleTable {
    (0..size)
        .map(|i| {
            let expression = match i % 3 {
                0 => "all".to_string(),
                1 => format!("<<host>>__startswith__web{:02}", i % 10),
                _ => "<<env>>__equals__prod".to_string(),
            };
            let rule = Rule::new(expression)
                .with_classes(
                    ClassSpec::templates(["cluster.<<cluster_name>>.<<role>>"])
                        .and_literals([format!("system.service{}", i)]),
                )
                .with_node_param(
                    format!("param_{}", i % 7),
                    ParamValue::template("<<host>>.<<domain>>"),
                )
                .with_cluster_param(format!("vip_{}", i % 5), ParamValue::literal(i as u64));
            (format!("rule-{:03}", i), rule)
        })
        .collect()
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("template");
    group.throughput(Throughput::Elements(1));

    let attrs = node_attrs();
    group.bench_function("render_three_placeholders", |b| {
        b.iter(|| render(black_box("cluster.<<cluster_name>>.<<role>>.<<missing>>"), &attrs));
    });

    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("classifier");
    group.throughput(Throughput::Elements(100));

    let store = MemoryStore::new();
    let classifier = Classifier::new(&store);
    let attrs = node_attrs();
    let rules = rule_table(100);

    group.bench_function("evaluate_100_rules", |b| {
        b.iter(|| classifier.evaluate(black_box(&attrs), black_box(&rules)));
    });

    group.finish();
}

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classifier");
    group.throughput(Throughput::Elements(1));

    let store = MemoryStore::new();
    let classifier = Classifier::new(&store);
    let attrs = node_attrs();
    let rules = rule_table(20);

    group.bench_function("classify_new_node", |b| {
        let mut counter = 0u64;
        b.iter(|| {
            counter += 1;
            let node = format!("web{:06}.lab.local", counter);
            classifier.classify(black_box(&node), &attrs, &rules)
        });
    });

    group.finish();
}

criterion_group!(benches, bench_render, bench_evaluate, bench_classify);
criterion_main!(benches);
