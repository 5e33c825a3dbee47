use meme_signal::config::ClusteringConfig;
use meme_signal::lookalike::{
    cosine_similarity, create_feature_vector, BenchmarkSpace, BenchmarkSpec, MemeClusterer,
    BENCHMARK_ICI, BENCHMARK_SERIOUSNESS, FEATURE_DIM,
};
use meme_signal::scoring::SemanticScorer;
use meme_signal::{enrich, TextRecord};

#[test]
fn feature_vector_layout() {
    let text = "BUY crypto NOW!! $$ rocket";
    let vector = create_feature_vector(text, 0.8, 0.6);
    let denom = (text.chars().count() + 1) as f64;

    assert_eq!(vector.len(), FEATURE_DIM);
    assert_eq!(vector[0], 0.8);
    assert_eq!(vector[1], 0.6);
    // "buy"
    assert!((vector[2] - 1.0 / denom).abs() < 1e-12);
    assert!((vector[10] - 0.05).abs() < 1e-12);
    // BUY, NOW
    assert!((vector[11] - 2.0 / denom).abs() < 1e-12);
    assert!((vector[12] - 2.0 / denom).abs() < 1e-12);
    assert!((vector[13] - 2.0 / denom).abs() < 1e-12);
    assert_eq!(vector[14], 1.0);
    assert_eq!(vector[15], 0.0);
    assert_eq!(vector[16], 0.0);
    assert!((vector[17] - 1.0 / denom).abs() < 1e-12);
}

#[test]
fn benchmark_matches_itself() {
    let space = BenchmarkSpace::new(&BenchmarkSpec::defaults()).unwrap();
    for benchmark in space.benchmarks() {
        let vector =
            create_feature_vector(&benchmark.spec.text, BENCHMARK_SERIOUSNESS, BENCHMARK_ICI);
        let matched = space.match_vector(&vector);
        assert!((matched.similarity - 1.0).abs() < 1e-9);
        assert!(
            (matched.estimated_market_impact - benchmark.spec.market_impact).abs() < 1e-9
        );
    }
}

#[test]
fn cosine_is_scale_invariant() {
    let a = create_feature_vector("GME stonks ape strong", 0.7, 0.4);
    let scaled = a.map(|value| value * 3.5);
    assert!((cosine_similarity(&a, &scaled) - 1.0).abs() < 1e-9);

    let b = create_feature_vector("lol nft joke", 0.2, 0.1);
    let left = cosine_similarity(&a, &b);
    let right = cosine_similarity(&scaled, &b);
    assert!((left - right).abs() < 1e-9);
}

#[test]
fn zero_vector_has_zero_similarity() {
    let zero = [0.0; FEATURE_DIM];
    let other = create_feature_vector("buy", 0.5, 0.5);
    assert_eq!(cosine_similarity(&zero, &other), 0.0);
    assert_eq!(cosine_similarity(&zero, &zero), 0.0);
}

#[test]
fn ties_keep_first_listed_benchmark() {
    let specs = vec![
        BenchmarkSpec::new("FIRST", "hold the line", 0.5, "stocks"),
        BenchmarkSpec::new("SECOND", "hold the line", 0.9, "stocks"),
    ];
    let space = BenchmarkSpace::new(&specs).unwrap();
    let vector = create_feature_vector("hold the line", 0.3, 0.3);
    let matched = space.match_vector(&vector);

    assert_eq!(matched.benchmark_id, "FIRST");
    assert!((matched.estimated_market_impact - 0.5 * matched.similarity).abs() < 1e-12);
}

#[test]
fn empty_benchmark_set_is_rejected() {
    assert!(BenchmarkSpace::new(&[]).is_err());
}

#[test]
fn lookalikes_for_empty_batch_are_empty() {
    let space = BenchmarkSpace::new(&BenchmarkSpec::defaults()).unwrap();
    assert!(space.find_lookalikes(&[]).is_empty());
}

#[test]
fn lookalikes_are_attached_in_order() {
    let space = BenchmarkSpace::new(&BenchmarkSpec::defaults()).unwrap();
    let scorer = SemanticScorer::default();
    let records = scorer.score_records(&enrich(vec![
        TextRecord::new("doge", "DOGE to the moon diamond hands hold the line crypto"),
        TextRecord::new("nft", "new NFT mint drop, digital art on blockchain"),
        TextRecord::new("plain", "just had lunch"),
    ]));

    let matched = space.find_lookalikes(&records);

    assert_eq!(matched.len(), 3);
    assert_eq!(matched[0].record.id, "doge");
    assert_eq!(matched[2].record.id, "plain");
    for record in &matched {
        let lookalike = record.lookalike.as_ref().unwrap();
        assert!(space.get(&lookalike.benchmark_id).is_some());
        assert!((-1.0..=1.0 + 1e-12).contains(&lookalike.similarity));
    }
    assert_eq!(matched[0].lookalike.as_ref().unwrap().benchmark_id, "DOGE_2021");
}

#[test]
fn similarity_matrix_has_one_column_per_benchmark() {
    let space = BenchmarkSpace::new(&BenchmarkSpec::defaults()).unwrap();
    let vectors = vec![
        create_feature_vector("buy stonks", 0.9, 0.9),
        create_feature_vector("lol", 0.0, 0.1),
    ];
    let matrix = space.similarity_matrix(&vectors);
    assert_eq!(matrix.len(), 2);
    assert!(matrix.iter().all(|row| row.len() == space.benchmarks().len()));
}

#[test]
fn clustering_is_seeded_and_bounded() {
    let scorer = SemanticScorer::default();
    let texts = [
        "buy the dip",
        "hold forever",
        "lol joke",
        "haha kidding",
        "NFT mint drop",
        "crypto rocket gains",
        "stonks go up",
        "weather talk",
    ];
    let records = scorer.score_records(&enrich(
        texts
            .iter()
            .enumerate()
            .map(|(idx, text)| TextRecord::new(format!("post_{}", idx), *text))
            .collect(),
    ));
    let clusterer = MemeClusterer::new(ClusteringConfig {
        clusters: 3,
        n_init: 4,
        ..ClusteringConfig::default()
    });

    let first = clusterer.cluster_records(&records);
    let second = clusterer.cluster_records(&records);

    assert_eq!(first, second);
    assert_eq!(first.labels.len(), texts.len());
    assert_eq!(first.centroids.len(), 3);
    assert!(first.labels.iter().all(|&label| label < 3));
    assert!(first.inertia >= 0.0);
}

#[test]
fn clustering_caps_k_at_batch_size() {
    let clusterer = MemeClusterer::new(ClusteringConfig::default());
    let vectors = vec![
        create_feature_vector("buy", 1.0, 0.9),
        create_feature_vector("lol", 0.0, 0.1),
    ];
    let assignment = clusterer.fit(&vectors);
    assert_eq!(assignment.centroids.len(), 2);
    assert!(assignment.inertia.abs() < 1e-12);

    let empty = clusterer.fit(&[]);
    assert!(empty.labels.is_empty());
}
