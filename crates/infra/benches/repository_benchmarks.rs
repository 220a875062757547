use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use catalog_infra::{InMemoryProductRepository, ProductRepository};
use catalog_products::Product;
use tokio::runtime::Runtime;

const CATEGORIES: [&str; 4] = ["Electronics", "Office", "Gaming", "Home"];

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("tokio runtime")
}

fn product(i: usize) -> Product {
    Product::restore(
        format!("product-{i}"),
        i as i64 + 1,
        vec![
            CATEGORIES[i % CATEGORIES.len()].to_string(),
            CATEGORIES[(i + 1) % CATEGORIES.len()].to_string(),
        ],
        (i as i64 % 500) + 1,
    )
    .expect("valid product")
}

fn seeded(rt: &Runtime, size: usize) -> InMemoryProductRepository {
    let repo = InMemoryProductRepository::new();
    rt.block_on(async {
        for i in 0..size {
            repo.add(product(i)).await.expect("add");
        }
    });
    repo
}

fn bench_add_latency(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("in_memory_add");
    group.throughput(Throughput::Elements(1));

    group.bench_function("add_into_fresh_repository", |b| {
        b.iter_batched(
            InMemoryProductRepository::new,
            |repo| rt.block_on(async { repo.add(black_box(product(0))).await.expect("add") }),
            criterion::BatchSize::SmallInput,
        );
    });

    group.bench_function("add_duplicate_rejected", |b| {
        let repo = seeded(&rt, 1);
        b.iter(|| rt.block_on(async { black_box(repo.add(product(0)).await.is_err()) }));
    });

    group.finish();
}

fn bench_reads(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("in_memory_reads");

    for size in [100usize, 1_000, 10_000].iter() {
        let repo = seeded(&rt, *size);
        group.throughput(Throughput::Elements(*size as u64));

        group.bench_with_input(BenchmarkId::new("get_metrics", size), size, |b, _| {
            b.iter(|| rt.block_on(async { black_box(repo.get_metrics().await.expect("metrics")) }));
        });

        group.bench_with_input(BenchmarkId::new("find_all", size), size, |b, _| {
            b.iter(|| rt.block_on(async { black_box(repo.find_all().await.expect("find_all")) }));
        });

        group.bench_with_input(BenchmarkId::new("find_one", size), size, |b, size| {
            let name = format!("product-{}", size / 2);
            b.iter(|| rt.block_on(async { black_box(repo.find_one(&name).await.expect("find_one")) }));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_add_latency, bench_reads);
criterion_main!(benches);
