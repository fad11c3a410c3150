use std::collections::BTreeMap;

use arena_avl::AvlTree;
use criterion::{criterion_group, criterion_main, Criterion};
use rand::prelude::SliceRandom;
use rand::thread_rng;

fn avl(adds: &[usize], removes: &[usize]) {
    let mut tree: AvlTree<usize> = AvlTree::new();

    let handles: Vec<_> = adds.iter().map(|&key| tree.add(key)).collect();

    for &i in removes {
        tree.remove(handles[i]);
    }
}

fn btree(adds: &[usize], removes: &[usize]) {
    let mut tree = BTreeMap::new();

    for (i, &key) in adds.iter().enumerate() {
        tree.insert((key, i), ());
    }

    for &i in removes {
        tree.remove(&(adds[i], i));
    }
}

fn bench_add_remove(c: &mut Criterion) {
    let mut rng = thread_rng();

    let mut nums = (0..700).collect::<Vec<_>>();
    nums.shuffle(&mut rng);
    let adds = nums.clone();
    nums.shuffle(&mut rng);
    let removes = nums;

    c.bench_function("AVL adds & removes", |b| b.iter(|| avl(&adds, &removes)));
    c.bench_function("BTreeMap inserts & removes", |b| {
        b.iter(|| btree(&adds, &removes))
    });
}

fn bench_pop_smallest(c: &mut Criterion) {
    let mut rng = thread_rng();

    let mut nums = (0..700).collect::<Vec<usize>>();
    nums.shuffle(&mut rng);

    c.bench_function("AVL pop smallest", |b| {
        b.iter(|| {
            let mut tree: AvlTree<usize> = nums.iter().copied().collect();
            while tree.pop_smallest().is_some() {}
        })
    });
}

criterion_group!(benches, bench_add_remove, bench_pop_smallest);
criterion_main!(benches);
