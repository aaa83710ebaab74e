use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};

use funding_recsys::{
    CatalogBuilder, EmbeddingVector, FactorScorer, InteractionRecord, ItemId, Space, Trainer,
    TrainerConfig, UserId, VectorIndex,
};

fn random_vector(rng: &mut StdRng, dim: usize) -> EmbeddingVector {
    (0..dim).map(|_| rng.gen_range(-1.0f32..1.0)).collect::<Vec<f32>>().into()
}

fn vector_index_benchmark(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(1);
    // CLIP 相当の 512 次元
    let mut index = VectorIndex::with_dim(Space::Image, 512);
    for i in 0..5_000u64 {
        index
            .insert(ItemId::from(i), random_vector(&mut rng, 512))
            .expect("fixed dimension");
    }
    let probe = random_vector(&mut rng, 512);

    c.bench_function("image_top_k_5000x512", |b| {
        b.iter(|| index.top_k(black_box(&probe), 10).expect("same dimension"))
    });
}

fn text_search_benchmark(c: &mut Criterion) {
    let words = [
        "spicy", "sweet", "kimchi", "pork", "beef", "noodle", "soup", "rice", "bbq", "vegan",
        "bakery", "coffee", "tea", "seafood", "grill", "fried", "chicken", "tofu", "dumpling", "curry",
    ];
    let mut rng = StdRng::seed_from_u64(2);
    let mut builder = CatalogBuilder::new();
    for i in 0..2_000u64 {
        let text: Vec<&str> = (0..12).map(|_| words[rng.gen_range(0..words.len())]).collect();
        builder.description(i, text.join(" "));
    }
    let snapshot = builder.build().expect("catalog");

    c.bench_function("text_search_2000_docs", |b| {
        b.iter(|| snapshot.search_text(black_box("spicy pork noodle soup"), 10).expect("text index"))
    });
}

fn factor_scoring_benchmark(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(3);
    let records: Vec<InteractionRecord> = (0..5_000)
        .map(|_| {
            InteractionRecord::new(
                UserId::from(rng.gen_range(0..500u64)),
                ItemId::from(rng.gen_range(0..2_000u64)),
            )
        })
        .collect();
    let config = TrainerConfig {
        epochs: 2,
        ..TrainerConfig::default()
    };
    let model = Trainer::new(config).expect("config").fit(&records).expect("model");
    let user = records[0].user.clone();
    let scorer = FactorScorer::from(model);

    c.bench_function("score_all_2000_items", |b| {
        b.iter(|| scorer.score_all(black_box(&user)).expect("known user"))
    });
}

criterion_group!(
    benches,
    vector_index_benchmark,
    text_search_benchmark,
    factor_scoring_benchmark
);
criterion_main!(benches);
