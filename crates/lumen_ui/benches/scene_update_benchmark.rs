//! # Scene Update Benchmark
//!
//! Measures one frame of a populated scene:
//! - `update(dt)` over nodes that each carry a running animator
//! - derived-state queries (effective alpha / rect) on deep chains
//! - hit-testing and draw-list generation
//!
//! Run with: `cargo bench --package lumen_ui`

// Benchmarks don't need docs
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lumen_ui::{Animator, DrawList, Facet, NodeId, Rect, Scene, Vec2, Waveform};

/// Builds `count` quads under one root, each with a sine animator on X.
fn populated_scene(count: usize) -> (Scene, NodeId) {
    let mut scene = Scene::new();
    let root = scene.create_node("root").unwrap();
    scene.tree_mut().node_mut(root).unwrap().rect = Rect::new(0.0, 0.0, 1920.0, 1080.0);
    for i in 0..count {
        let tree = scene.tree_mut();
        let quad = tree.create_node(format!("quad_{i}"));
        let f = i as f32;
        tree.node_mut(quad).unwrap().rect = Rect::new(f % 1900.0, (f * 7.0) % 1060.0, 20.0, 20.0);
        let anim = tree.create_animator(
            format!("wobble_{i}"),
            Animator::new(Facet::X)
                .with_waveform(Waveform::Sine)
                .with_amplitude(5.0)
                .with_periods(-1.0)
                .with_inherit_value(true),
        );
        tree.attach(root, quad).unwrap();
        tree.attach(quad, anim).unwrap();
    }
    scene.add_root(root).unwrap();
    (scene, root)
}

/// Builds a single chain `depth` nodes deep.
fn deep_chain(depth: usize) -> (Scene, NodeId) {
    let mut scene = Scene::new();
    let root = scene.create_node("root").unwrap();
    let mut parent = root;
    for i in 0..depth {
        let tree = scene.tree_mut();
        let child = tree.create_node(format!("link_{i}"));
        tree.node_mut(child).unwrap().rect = Rect::new(1.0, 1.0, 100.0, 100.0);
        tree.attach(parent, child).unwrap();
        parent = child;
    }
    scene.add_root(root).unwrap();
    (scene, parent)
}

fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("scene_update");
    for count in [100, 1_000, 10_000] {
        let (mut scene, _) = populated_scene(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| scene.update(black_box(1.0 / 60.0)));
        });
    }
    group.finish();
}

fn bench_derived_state(c: &mut Criterion) {
    let (scene, leaf) = deep_chain(64);
    c.bench_function("effective_rect_depth_64", |b| {
        b.iter(|| black_box(scene.tree().effective_rect(black_box(leaf))));
    });
    c.bench_function("effective_alpha_depth_64", |b| {
        b.iter(|| black_box(scene.tree().effective_alpha(black_box(leaf))));
    });
}

fn bench_hit_test(c: &mut Criterion) {
    let (scene, _) = populated_scene(1_000);
    c.bench_function("hit_test_1000", |b| {
        b.iter(|| black_box(scene.hit_test(black_box(Vec2::new(500.0, 300.0)))));
    });
}

fn bench_draw(c: &mut Criterion) {
    let (scene, _) = populated_scene(1_000);
    let mut list = DrawList::new();
    c.bench_function("draw_1000", |b| {
        b.iter(|| {
            scene.draw_into(&mut list);
            black_box(list.len())
        });
    });
}

criterion_group!(benches, bench_update, bench_derived_state, bench_hit_test, bench_draw);

criterion_main!(benches);
