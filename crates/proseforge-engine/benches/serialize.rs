use criterion::{Criterion, black_box, criterion_group, criterion_main};
use proseforge_engine::{read_document, write_document};
mod common;

fn bench_reading(c: &mut Criterion) {
    let mut group = c.benchmark_group("html_reading");
    group.sample_size(20);

    let html = common::generate_article_html(50);
    group.bench_function("read_document", |b| {
        b.iter(|| {
            let doc = read_document(black_box(&html)).unwrap();
            black_box(doc);
        });
    });

    group.finish();
}

fn bench_writing(c: &mut Criterion) {
    let mut group = c.benchmark_group("html_writing");
    group.sample_size(20);

    let html = common::generate_article_html(50);
    let doc = read_document(&html).unwrap();

    group.bench_function("write_document", |b| {
        b.iter(|| {
            let html = write_document(black_box(&doc));
            black_box(html);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_reading, bench_writing);
criterion_main!(benches);
