use meme_signal::config::ModelConfig;
use meme_signal::lookalike::{BenchmarkSpace, BenchmarkSpec};
use meme_signal::modeling::{
    calculate_impact_probability, category_anova, correlation_matrix, engineer_features,
    ici_ttest, impact_probabilities, residual_analysis, students_t_test, FeatureColumn, Horizon,
    LinearRegression, MarketImpactModel, StandardScaler,
};
use meme_signal::scoring::SemanticScorer;
use meme_signal::{enrich, EnrichedRecord, LookalikeMatch, SignalError, TextRecord};

const TEXTS: [&str; 8] = [
    "HODL diamond hands, buy the dip now!",
    "lol this is just a joke haha",
    "Invest in crypto today, going long",
    "stonks only go up lmao",
    "NFT mint drop, hold your position",
    "kidding, calls are a joke",
    "URGENT: buy before the rocket leaves!!",
    "nice weather for a walk",
];

fn prepared(count: usize) -> Vec<EnrichedRecord> {
    let records: Vec<TextRecord> = (0..count)
        .map(|idx| {
            TextRecord::new(format!("post_{}", idx), TEXTS[idx % TEXTS.len()])
                .with_score((idx as u64 * 37) % 101 + idx as u64)
        })
        .collect();
    let scored = SemanticScorer::default().score_records(&enrich(records));
    BenchmarkSpace::new(&BenchmarkSpec::defaults())
        .unwrap()
        .find_lookalikes(&scored)
}

#[test]
fn predict_before_train_fails() {
    let model = MarketImpactModel::new(ModelConfig::default());
    let result = model.predict(&prepared(4));
    assert!(matches!(result, Err(SignalError::ModelNotTrained)));
}

#[test]
fn too_few_records_is_insufficient_data() {
    let mut model = MarketImpactModel::new(ModelConfig::default());
    assert_eq!(model.minimum_records(), 6);

    let result = model.train(&prepared(5));
    match result {
        Err(SignalError::InsufficientData { records, required }) => {
            assert_eq!(records, 5);
            assert_eq!(required, 6);
        }
        other => panic!("expected InsufficientData, got {:?}", other),
    }
    assert!(!model.is_trained());
}

#[test]
fn constant_labels_fail_training() {
    let records: Vec<TextRecord> = (0..10)
        .map(|idx| TextRecord::new(format!("same_{}", idx), "buy the dip").with_score(5))
        .collect();
    let scored = SemanticScorer::default().score_records(&enrich(records));
    let mut model = MarketImpactModel::new(ModelConfig::default());

    let result = model.train(&scored);
    assert!(matches!(result, Err(SignalError::TrainingFailed { .. })));
    assert!(!model.is_trained());
}

#[test]
fn training_reports_metrics_and_predictions_are_attached() {
    let records = prepared(40);
    let mut model = MarketImpactModel::new(ModelConfig::default());
    let metrics = model.train(&records).unwrap();

    assert_eq!(metrics.train_samples, 32);
    assert_eq!(metrics.test_samples, 8);
    assert_eq!(metrics.coefficients.len(), 10);
    assert_eq!(metrics.coefficients[0].0, "seriousness_threshold");
    assert!(metrics.train_r2.is_finite());
    assert!(metrics.test_mae >= 0.0);
    assert!((metrics.overfit_gap - (metrics.train_r2 - metrics.test_r2)).abs() < 1e-12);

    let predicted = model.predict(&records).unwrap();
    assert_eq!(predicted.len(), records.len());
    for (before, after) in records.iter().zip(predicted.iter()) {
        assert_eq!(before.record.id, after.record.id);
        assert!(after.predicted_readiness.is_some());
        assert!(after.features.is_some());
    }
}

#[test]
fn prediction_reuses_fitted_scaler() {
    let records = prepared(30);
    let mut model = MarketImpactModel::new(ModelConfig::default());
    model.train(&records).unwrap();
    let before = model.scaler().unwrap().clone();

    let unseen = prepared(11);
    let first = model.predict(&unseen).unwrap();
    let second = model.predict(&unseen).unwrap();

    assert_eq!(model.scaler().unwrap(), &before);
    assert_eq!(first, second);
}

#[test]
fn split_is_deterministic_and_complete() {
    let model = MarketImpactModel::new(ModelConfig::default());
    let (train, test) = model.train_test_split(23);
    let (train_again, test_again) = model.train_test_split(23);

    assert_eq!(train, train_again);
    assert_eq!(test, test_again);
    // ceil(23 * 0.2)
    assert_eq!(test.len(), 5);

    let mut all: Vec<usize> = train.iter().chain(test.iter()).copied().collect();
    all.sort_unstable();
    assert_eq!(all, (0..23).collect::<Vec<_>>());

    let reseeded = MarketImpactModel::new(ModelConfig {
        seed: 7,
        ..ModelConfig::default()
    });
    assert_eq!(reseeded.train_test_split(23).1.len(), 5);
}

#[test]
fn feature_engineering_is_idempotent() {
    let records = prepared(12);
    let once = engineer_features(&records);
    let twice = engineer_features(&once);
    assert_eq!(once, twice);
}

#[test]
fn readiness_label_uses_batch_max_engagement() {
    let records = SemanticScorer::default().score_records(&enrich(vec![
        TextRecord::new("a", "buy").with_score(50),
        TextRecord::new("b", "buy").with_score(100),
    ]));
    let engineered = engineer_features(&records);

    // s = 1, ici = 0.9, no lookalike
    let base = 0.3 * 1.0 + 0.3 * 0.9;
    let a = engineered[0].features.unwrap().market_readiness;
    let b = engineered[1].features.unwrap().market_readiness;
    assert!((a - (base + 0.2 * 0.5)).abs() < 1e-12);
    assert!((b - (base + 0.2)).abs() < 1e-12);

    let silent = engineer_features(&enrich(vec![TextRecord::new("c", "quiet")]));
    let label = silent[0].features.unwrap().market_readiness;
    assert!((label - (0.3 * 0.5 + 0.3 * 0.5)).abs() < 1e-12);
}

#[test]
fn text_features_count_actions_and_urgency() {
    let engineered = engineer_features(&enrich(vec![TextRecord::new(
        "x",
        "BUY now, hold long! Fast!",
    )]));
    let features = engineered[0].features.unwrap();

    assert_eq!(features.financial_words, 3);
    assert_eq!(features.urgency_words, 2);
    assert_eq!(features.exclamation_count, 2);
    assert_eq!(features.text_length, 25);
    assert!((features.caps_ratio - 4.0 / 26.0).abs() < 1e-12);
}

#[test]
fn probabilities_clamp_to_percent_range() {
    let high = impact_probabilities(10.0, 1.0, 1.0);
    assert_eq!(high.impact_prob_24h, 100.0);
    assert_eq!(high.impact_prob_48h, 100.0);
    assert_eq!(high.impact_prob_72h, 100.0);

    let negative = impact_probabilities(-0.4, 0.5, 0.5);
    assert_eq!(negative.impact_prob_24h, 0.0);
    assert_eq!(negative.impact_prob_72h, 0.0);
}

#[test]
fn probability_formula_per_horizon() {
    let (readiness, ici, similarity) = (0.5, 0.5, 0.5);
    let expected_24 = 50.0 * (0.6 + 0.4 * ici) * (0.7 + 0.3 * similarity);
    let expected_72 = 50.0 * (0.8 + 0.2 * ici) * (0.9 + 0.1 * similarity);

    assert!((Horizon::H24.probability(readiness, ici, similarity) - expected_24).abs() < 1e-9);
    assert!((Horizon::H72.probability(readiness, ici, similarity) - expected_72).abs() < 1e-9);
    assert_eq!(Horizon::ALL.map(Horizon::hours), [24, 48, 72]);
}

#[test]
fn probabilities_grow_with_readiness() {
    let mut previous = impact_probabilities(0.0, 0.7, 0.4);
    for step in 1..=20 {
        let current = impact_probabilities(step as f64 * 0.05, 0.7, 0.4);
        assert!(current.impact_prob_24h >= previous.impact_prob_24h);
        assert!(current.impact_prob_48h >= previous.impact_prob_48h);
        assert!(current.impact_prob_72h >= previous.impact_prob_72h);
        previous = current;
    }
}

#[test]
fn impact_requires_prediction() {
    let records = prepared(3);
    match calculate_impact_probability(&records) {
        Err(SignalError::MissingPrediction { record_id }) => assert_eq!(record_id, "post_0"),
        other => panic!("expected MissingPrediction, got {:?}", other),
    }
}

#[test]
fn correlation_matrix_is_symmetric() {
    let records = engineer_features(&prepared(16));
    let columns = [
        FeatureColumn::SeriousnessThreshold,
        FeatureColumn::IronyCollapseIndex,
        FeatureColumn::CapsRatio,
    ];
    let matrix = correlation_matrix(&records, &columns);

    assert_eq!(matrix.columns.len(), 3);
    for i in 0..3 {
        assert!((matrix.values[i][i] - 1.0).abs() < 1e-9);
        for j in 0..3 {
            assert!((matrix.values[i][j] - matrix.values[j][i]).abs() < 1e-12);
        }
    }
    assert!(matrix.get("caps_ratio", "irony_collapse_index").is_some());
    assert!(matrix.get("unknown", "caps_ratio").is_none());
}

#[test]
fn ttest_needs_both_ici_groups() {
    let only_serious = SemanticScorer::default().score_records(&enrich(vec![
        TextRecord::new("a", "buy"),
        TextRecord::new("b", "hold"),
    ]));
    assert!(ici_ttest(&only_serious).is_none());
}

#[test]
fn residuals_summarize_errors() {
    let actual = [1.0, 2.0, 3.0, 4.0];
    let predicted = [0.5, 2.5, 2.5, 4.5];
    let analysis = residual_analysis(&actual, &predicted).unwrap();

    assert!(analysis.mean_residual.abs() < 1e-12);
    // residuals are +-0.5, sample std over n - 1
    assert!((analysis.std_residual - (1.0_f64 / 3.0).sqrt()).abs() < 1e-12);
    assert!(analysis.skewness.abs() < 1e-12);
    assert!((analysis.kurtosis + 2.0).abs() < 1e-12);

    assert!(residual_analysis(&[1.0], &[1.0]).is_none());
}

#[test]
fn overfit_gap_is_flagged_against_tolerance() {
    let records = prepared(40);

    let mut strict = MarketImpactModel::new(ModelConfig {
        overfit_tolerance: -1.0,
        ..ModelConfig::default()
    });
    let metrics = strict.train(&records).unwrap();
    assert!(metrics.is_overfit);
    assert!(metrics.overfit_gap > -1.0);

    let mut lenient = MarketImpactModel::new(ModelConfig {
        overfit_tolerance: f64::INFINITY,
        ..ModelConfig::default()
    });
    let metrics = lenient.train(&records).unwrap();
    assert!(!metrics.is_overfit);
}

#[test]
fn minimum_records_follows_test_fraction() {
    let minimum = |test_fraction: f64| {
        MarketImpactModel::new(ModelConfig {
            test_fraction,
            ..ModelConfig::default()
        })
        .minimum_records()
    };
    assert_eq!(minimum(0.2), 6);
    assert_eq!(minimum(0.5), 4);
    assert_eq!(minimum(0.1), 11);
    assert_eq!(minimum(0.9), 20);
    assert_eq!(minimum(0.0), usize::MAX);
}

#[test]
fn regression_recovers_exact_line() {
    let rows: Vec<Vec<f64>> = (0..6).map(|i| vec![i as f64, (i * i) as f64]).collect();
    let targets: Vec<f64> = rows.iter().map(|row| 1.5 + 2.0 * row[0] - 0.5 * row[1]).collect();
    let model = LinearRegression::fit(&rows, &targets).unwrap();

    assert!((model.intercept() - 1.5).abs() < 1e-9);
    assert!((model.coefficients()[0] - 2.0).abs() < 1e-9);
    assert!((model.coefficients()[1] + 0.5).abs() < 1e-9);
}

#[test]
fn regression_zeroes_duplicated_column() {
    let rows: Vec<Vec<f64>> = (0..5).map(|i| vec![i as f64, i as f64]).collect();
    let targets: Vec<f64> = (0..5).map(|i| 2.0 * i as f64).collect();
    let model = LinearRegression::fit(&rows, &targets).unwrap();

    assert!((model.coefficients()[0] - 2.0).abs() < 1e-9);
    assert_eq!(model.coefficients()[1], 0.0);
    assert!((model.predict_row(&[3.0, 3.0]) - 6.0).abs() < 1e-9);
}

#[test]
fn scaler_keeps_constant_columns_finite() {
    let rows = vec![vec![1.0, 5.0], vec![3.0, 5.0]];
    let scaler = StandardScaler::fit(&rows).unwrap();

    assert_eq!(scaler.mean(), &[2.0, 5.0]);
    assert_eq!(scaler.scale(), &[1.0, 1.0]);
    let scaled = scaler.transform(&rows);
    assert_eq!(scaled[0], vec![-1.0, 0.0]);
    assert_eq!(scaled[1], vec![1.0, 0.0]);
}

#[test]
fn t_test_matches_hand_calculation() {
    let high = [1.0, 2.0, 3.0, 4.0, 5.0];
    let low = [2.0, 3.0, 4.0, 5.0, 9.0];
    let result = students_t_test(&high, &low).unwrap();

    assert!((result.t_statistic + 1.142857).abs() < 1e-6);
    assert!((result.p_value - 0.286145).abs() < 1e-5);
    assert_eq!(result.degrees_of_freedom, 8.0);
    assert!(!result.significant);
}

#[test]
fn t_test_identical_groups_and_separated_groups() {
    let same = students_t_test(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).unwrap();
    assert!(same.t_statistic.abs() < 1e-12);
    assert!((same.p_value - 1.0).abs() < 1e-9);

    let high = [0.90, 0.92, 0.88, 0.91, 0.89];
    let low = [0.10, 0.12, 0.08, 0.11, 0.09];
    let separated = students_t_test(&high, &low).unwrap();
    assert!(separated.t_statistic > 10.0);
    assert!(separated.p_value < 1e-6);
    assert!(separated.significant);

    assert!(students_t_test(&[], &[1.0, 2.0]).is_none());
}

fn matched(id: &str, benchmark_id: &str, readiness: f64) -> EnrichedRecord {
    let mut record = EnrichedRecord::new(TextRecord::new(id, "meme"));
    record.lookalike = Some(LookalikeMatch {
        benchmark_id: benchmark_id.to_string(),
        similarity: 1.0,
        estimated_market_impact: 0.9,
    });
    record.predicted_readiness = Some(readiness);
    record
}

#[test]
fn anova_across_benchmark_categories() {
    let space = BenchmarkSpace::new(&BenchmarkSpec::defaults()).unwrap();
    let records = vec![
        matched("a", "DOGE_2021", 0.1),
        matched("b", "SHIB_2021", 0.2),
        matched("c", "DOGE_2021", 0.3),
        matched("d", "GME_2021", 0.7),
        matched("e", "GME_2021", 0.8),
        matched("f", "GME_2021", 0.9),
    ];
    let result = category_anova(&records, &space).unwrap();

    // between 0.54 on 1 df, within 0.04 on 4 df
    assert!((result.f_statistic - 54.0).abs() < 1e-9);
    assert_eq!(result.df_between, 1.0);
    assert_eq!(result.df_within, 4.0);
    assert_eq!(
        result.groups,
        vec![("cryptocurrency".to_string(), 3), ("stocks".to_string(), 3)]
    );
    assert!(result.p_value > 0.0 && result.p_value < 0.01);
    assert!(result.significant);

    let single = vec![matched("a", "DOGE_2021", 0.1), matched("b", "SHIB_2021", 0.4)];
    assert!(category_anova(&single, &space).is_none());
}
