use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use nested_circles::config::LayoutConfig;
use nested_circles::layout::{PackOptions, TreeVisualizer, pack};
use nested_circles::parser::parse_tree;
use nested_circles::render::SceneBinding;
use nested_circles::text_metrics::FixedWidthMeasure;
use std::hint::black_box;

/// `packages` packages with `classes` classes each, two levels deep.
fn class_list_source(packages: usize, classes: usize) -> String {
    let mut out = String::new();
    for p in 0..packages {
        for c in 0..classes {
            out.push_str(&format!("org.bench.module{}.pkg{}.Class{}\n", p % 4, p, c));
        }
    }
    out
}

fn radii(count: usize) -> Vec<f64> {
    (0..count).map(|i| 8.0 + ((i * 37) % 23) as f64).collect()
}

fn bench_pack(c: &mut Criterion) {
    let mut group = c.benchmark_group("pack");
    let options = PackOptions::default();
    for count in [5usize, 20, 60] {
        let input = radii(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &input, |b, data| {
            b.iter(|| {
                let packing = pack(black_box(data), 10.0, &options);
                black_box(packing.enclosing_radius);
            });
        });
    }
    group.finish();
}

fn bench_visualize(c: &mut Criterion) {
    let mut group = c.benchmark_group("visualize_tree");
    let visualizer = TreeVisualizer::new(LayoutConfig::default(), FixedWidthMeasure::new(6.0));
    for (packages, classes) in [(4usize, 5usize), (12, 10), (24, 20)] {
        let name = format!("{}x{}", packages, classes);
        let tree = parse_tree(&class_list_source(packages, classes)).expect("parse failed");
        group.bench_with_input(BenchmarkId::from_parameter(name), &tree, |b, tree| {
            b.iter(|| {
                let mut tree = tree.clone();
                let mut binding = SceneBinding::new();
                visualizer.visualize_tree(black_box(&mut tree), &mut binding);
                black_box(binding.shapes.len());
            });
        });
    }
    group.finish();
}

fn bench_fold_cycle(c: &mut Criterion) {
    let visualizer = TreeVisualizer::new(LayoutConfig::default(), FixedWidthMeasure::new(6.0));
    let mut tree = parse_tree(&class_list_source(12, 10)).expect("parse failed");
    let mut binding = SceneBinding::new();
    visualizer.visualize_tree(&mut tree, &mut binding);
    let target = tree.id_of("org.bench.module1.pkg5").expect("missing package");
    c.bench_function("fold_unfold", |b| {
        b.iter(|| {
            tree.change_fold(target);
            visualizer.adapt_to_fold_state(&mut tree, target, &mut binding);
            tree.change_fold(target);
            visualizer.adapt_to_fold_state(&mut tree, target, &mut binding);
            black_box(tree.visual(target).r);
        });
    });
}

criterion_group!(benches, bench_pack, bench_visualize, bench_fold_cycle);
criterion_main!(benches);
