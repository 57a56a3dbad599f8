use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use imessage_wrapped_rust::phrases::{PhraseExtractionConfig, PhraseExtractor};
use imessage_wrapped_rust::scoring::ScoringMethod;

/// Synthetic chat lines with a few recurring catchphrases
fn generate_messages(count: usize) -> Vec<String> {
    let openers = ["on my way", "see you soon", "sounds good to me", "talk to you later"];
    let fillers = ["lol", "ok cool", "pizza tonight?", "running late", "call me when free"];

    (0..count)
        .map(|i| {
            format!(
                "{} {} message {}",
                openers[i % openers.len()],
                fillers[(i / 3) % fillers.len()],
                i % 17
            )
        })
        .collect()
}

fn bench_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("phrase_extraction");

    for size in [500, 5_000, 20_000] {
        let messages = generate_messages(size);
        group.throughput(Throughput::Elements(size as u64));

        for scoring in [ScoringMethod::Frequency, ScoringMethod::Tfidf] {
            let config = PhraseExtractionConfig::builder()
                .scoring(scoring)
                .build()
                .unwrap();
            let extractor = PhraseExtractor::new(config);

            group.bench_with_input(
                BenchmarkId::new(scoring.as_str(), size),
                &messages,
                |b, messages| b.iter(|| extractor.extract(black_box(messages.as_slice()), None, None)),
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_extraction);
criterion_main!(benches);
