use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::Array1;
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use salary_predictor::embedding::HashingEmbedder;
use salary_predictor::pipeline::{FeatureBuilder, FeaturePipeline};
use salary_predictor::preprocessing::{PcaConfig, StopWords, TextNormalizer};
use salary_predictor::record::JobPosting;
use salary_predictor::training::{HgbrConfig, HistGradientBoostingRegressor};
use std::sync::Arc;

const STATES: [&str; 6] = ["CA", "NY", "TX", "WA", "FL", "IL"];
const WORDS: [&str; 12] = [
    "data", "engineer", "analyst", "senior", "sales", "nurse", "manager", "reports",
    "backend", "customers", "python", "care",
];

fn create_postings(n_rows: usize) -> (Vec<JobPosting>, Array1<f64>) {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
    let postings: Vec<JobPosting> = (0..n_rows)
        .map(|_| {
            let description: Vec<&str> = (0..12).map(|_| WORDS[rng.gen_range(0..WORDS.len())]).collect();
            JobPosting {
                remote_allowed: rng.gen_range(0..2) as f64,
                work_type_contract: false,
                work_type_full_time: true,
                work_type_part_time: false,
                state: STATES[rng.gen_range(0..STATES.len())].to_string(),
                company_name: Some(format!("Company {}", rng.gen_range(0..50))),
                title: Some(WORDS[rng.gen_range(0..WORDS.len())].to_string()),
                description: Some(description.join(" ")),
            }
        })
        .collect();
    let target = (0..n_rows).map(|_| 40_000.0 + rng.gen::<f64>() * 120_000.0).collect();
    (postings, target)
}

fn feature_builder() -> FeatureBuilder {
    let stop_words = Arc::new(StopWords::from_words(["and", "the", "for"]));
    let normalizer = TextNormalizer::new(stop_words).unwrap();
    FeatureBuilder::new(normalizer, Arc::new(HashingEmbedder::new(384).unwrap()), "state")
}

fn pipeline() -> FeaturePipeline {
    let model = HistGradientBoostingRegressor::new(HgbrConfig {
        max_iter: 50,
        ..Default::default()
    });
    FeaturePipeline::new(PcaConfig { n_components: 50 }, model)
}

fn bench_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_fit");
    group.sample_size(10);

    let builder = feature_builder();
    for n_rows in [500, 2000].iter() {
        let (postings, target) = create_postings(*n_rows);
        let frame = builder.build(&postings).unwrap();

        group.bench_with_input(BenchmarkId::new("fit", n_rows), &frame, |b, frame| {
            b.iter(|| {
                let mut pipeline = pipeline();
                pipeline.fit(black_box(frame), &target).unwrap();
            })
        });
    }

    group.finish();
}

fn bench_predict(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_predict");

    let builder = feature_builder();
    let (postings, target) = create_postings(2000);
    let frame = builder.build(&postings).unwrap();
    let mut fitted = pipeline();
    fitted.fit(&frame, &target).unwrap();

    for batch in [1, 100].iter() {
        let batch_postings = &postings[..*batch];
        group.bench_with_input(
            BenchmarkId::new("build_and_predict", batch),
            batch_postings,
            |b, batch_postings| {
                b.iter(|| {
                    let frame = builder.build(black_box(batch_postings)).unwrap();
                    fitted.predict(&frame).unwrap()
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_fit, bench_predict);
criterion_main!(benches);
