//! Matcher Benchmarks
//!
//! Run with: cargo bench --bench normalize

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use pagewatch::commands::interpret;
use pagewatch::matcher::{contains, normalize, Phrase};

fn sample_page(repeat: usize) -> String {
    let block = "<div class=\"notice\">التسجيل مغلق حالياً، يرجى المحاولة لاحقاً</div>\n\
                 <p>Résumé   submissions are   CLOSED</p>\n";
    let mut page = block.repeat(repeat);
    page.push_str("<a href=\"/register\">سجّل الآن</a>");
    page
}

fn benchmark_normalize(c: &mut Criterion) {
    let page = sample_page(200);

    let mut group = c.benchmark_group("normalize");
    group.throughput(Throughput::Bytes(page.len() as u64));

    group.bench_function("page", |b| {
        b.iter(|| normalize(black_box(&page)));
    });

    group.bench_function("contains", |b| {
        b.iter(|| contains(black_box(&page), black_box("سجل الان")));
    });

    let phrase = Phrase::new("سجل الان");
    group.bench_function("phrase_found_in", |b| {
        b.iter(|| phrase.found_in(black_box(&page)));
    });

    group.finish();
}

fn benchmark_interpret(c: &mut Criterion) {
    let mut group = c.benchmark_group("commands");
    group.throughput(Throughput::Elements(1));

    group.bench_function("interpret_watch", |b| {
        b.iter(|| {
            interpret(black_box(
                "/watch@PageWatchBot https://a.test/x https://b.test/y https://c.test/z 10",
            ))
        });
    });

    group.finish();
}

criterion_group!(benches, benchmark_normalize, benchmark_interpret);
criterion_main!(benches);
