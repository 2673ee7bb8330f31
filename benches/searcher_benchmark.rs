use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gendex::{Config, DocId, Document, FieldValue, LowMemoryNotifier, MemoryIndex, SearcherHolder};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use rand::Rng;

fn create_index(count: u32) -> Arc<MemoryIndex> {
    let mut rng = rand::thread_rng();
    let docs = (0..count).map(|id| {
        Document::new(DocId(id)).with_field("Category", FieldValue::Text(format!("category_{}", rng.gen_range(0..10))))
    });
    Arc::new(MemoryIndex::from_documents(docs).unwrap())
}

/// Benchmark uncontended checkout and release
fn bench_checkout(c: &mut Criterion) {
    let holder = SearcherHolder::new("Products", create_index(100), Config::default(), LowMemoryNotifier::new());

    c.bench_function("checkout_release", |b| {
        b.iter(|| {
            let handle = holder.check_out().unwrap();
            black_box(handle.generation());
        });
    });
}

/// Benchmark checkout while other threads hammer the same generation
fn bench_contended_checkout(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended_checkout");

    for threads in [1usize, 4, 8].iter() {
        let holder = Arc::new(SearcherHolder::new("Products", create_index(100), Config::default(), LowMemoryNotifier::new()));
        let stop = Arc::new(AtomicBool::new(false));
        let background: Vec<_> = (0..*threads)
            .map(|_| {
                let holder = holder.clone();
                let stop = stop.clone();
                thread::spawn(move || {
                    while !stop.load(Ordering::Relaxed) {
                        black_box(holder.check_out().unwrap().usage());
                    }
                })
            })
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(threads), threads, |b, _| {
            b.iter(|| black_box(holder.check_out().unwrap().generation()));
        });

        stop.store(true, Ordering::Relaxed);
        for t in background {
            t.join().unwrap();
        }
    }

    group.finish();
}

/// Benchmark swap including pre-warm of recently used facets
fn bench_swap_with_prewarm(c: &mut Criterion) {
    let config = Config::default().with_prewarm(Duration::from_secs(600), Duration::from_secs(3));
    let holder = SearcherHolder::new("Products", create_index(10_000), config, LowMemoryNotifier::new());
    let next = create_index(10_000);

    c.bench_function("swap_with_prewarm", |b| {
        b.iter(|| {
            holder.check_out().unwrap().record_facet_usage("Category");
            black_box(holder.swap(next.clone(), false));
        });
    });
}

criterion_group!(benches, bench_checkout, bench_contended_checkout, bench_swap_with_prewarm);
criterion_main!(benches);
