//! Microbenchmarks for metadata extraction and fallback chunking.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use legal_rag::chunking::FallbackChunker;
use legal_rag::extraction::LegalMetadataExtractor;

fn synthetic_judgment() -> String {
    let mut text = String::from(
        "AIR 2020 SC 123\nSUPREME COURT OF INDIA\nCORAM: J. SMITH, J. DOE, J. ROE\n\
         DATED: 05-06-2020 JUDGMENT\nState of Maharashtra vs Raj Kumar\n",
    );
    for i in 0..200 {
        text.push_str(&format!(
            "FACTS: paragraph {} discusses Section 302 of the Indian Penal Code \
             and Article 21 of the Constitution, citing AIR 19{:02} SC {}. ",
            i,
            50 + (i % 50),
            i + 1
        ));
    }
    text.push_str("HELD: the appeal is allowed.");
    text
}

fn bench_extract_all(c: &mut Criterion) {
    let extractor = LegalMetadataExtractor::new().unwrap();
    let text = synthetic_judgment();

    c.bench_function("extract_all", |b| {
        b.iter(|| extractor.extract_all(black_box(&text)))
    });
}

fn bench_chunker(c: &mut Criterion) {
    let chunker = FallbackChunker::new(1000, 200);
    let text = synthetic_judgment().repeat(4);

    c.bench_function("fallback_chunk", |b| {
        b.iter(|| chunker.chunk(black_box(&text)))
    });
}

criterion_group!(benches, bench_extract_all, bench_chunker);
criterion_main!(benches);
