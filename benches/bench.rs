use criterion::{black_box, criterion_group, criterion_main, Criterion};

use palaver::pagination::{page_number, Paginator};

fn resolve_page(items: Vec<u32>, raw: Option<&str>) -> u32 {
    Paginator::new(items, 4).page(page_number(raw)).num
}

pub fn bench_pagination(c: &mut Criterion) {
    c.bench_function("paginate overflow", |b| {
        b.iter(|| {
            let items: Vec<u32> = (0..10_000).collect();
            resolve_page(black_box(items), black_box(Some("99999")))
        })
    });
}

criterion_group!(benches, bench_pagination);
criterion_main!(benches);
