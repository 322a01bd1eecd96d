use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use vascular_cco::growth::{BoxDomain, GrowthConfig, TreeGenerator};
use vascular_cco::model::{Point, VascularTree, VascularTreeBuilder};

const GROWTH_TARGETS: &[(&str, usize)] = &[("grow-10", 10), ("grow-25", 25)];

fn grow(terminals: usize) -> VascularTree {
    let domain = BoxDomain::new(Point::new(-1.0, 0.0, 0.0), Point::new(1.0, 2.0, 0.0), 42);
    let config = GrowthConfig::builder().with_bifurcation_tests(5).build().unwrap();
    let mut tree = VascularTreeBuilder::new(Point::new(0.0, 0.0, 0.0), 1.0)
        .with_root_radius(0.1)
        .build();
    TreeGenerator::new(domain, config).grow(&mut tree, terminals).unwrap();
    tree
}

fn growth(c: &mut Criterion) {
    for (name, terminals) in GROWTH_TARGETS {
        c.bench_function(name, |b| {
            b.iter(|| grow(black_box(*terminals)));
        });
    }
}

fn settle(c: &mut Criterion) {
    let tree = grow(50);
    c.bench_function("settle-50", |b| {
        b.iter(|| {
            let mut copy = tree.clone();
            copy.settle().unwrap()
        });
    });
}

criterion_group!(solver, settle);
criterion_group! {
    name = growing;
    config = Criterion::default().sample_size(10);
    targets = growth
}
criterion_main!(solver, growing);
