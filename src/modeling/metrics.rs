pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let center = mean(values);
    values.iter().map(|value| (value - center).powi(2)).sum::<f64>() / values.len() as f64
}

pub fn mean_squared_error(actual: &[f64], predicted: &[f64]) -> f64 {
    let errors: Vec<f64> = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .collect();
    mean(&errors)
}

pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> f64 {
    let errors: Vec<f64> = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).abs())
        .collect();
    mean(&errors)
}

pub fn r2_score(actual: &[f64], predicted: &[f64]) -> Option<f64> {
    if actual.is_empty() {
        return None;
    }
    let center = mean(actual);
    let total: f64 = actual.iter().map(|a| (a - center).powi(2)).sum();
    if total <= f64::EPSILON {
        return None;
    }
    let residual: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    Some(1.0 - residual / total)
}

pub fn correlation(pairs: &[(f64, f64)]) -> f64 {
    if pairs.len() < 2 {
        return 0.0;
    }

    let (xs, ys): (Vec<f64>, Vec<f64>) = pairs.iter().cloned().unzip();
    let mean_x = mean(&xs);
    let mean_y = mean(&ys);

    let mut numerator = 0.0;
    let mut denom_x = 0.0;
    let mut denom_y = 0.0;

    for (x, y) in xs.iter().zip(ys.iter()) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        numerator += dx * dy;
        denom_x += dx * dx;
        denom_y += dy * dy;
    }

    if denom_x <= 0.0 || denom_y <= 0.0 {
        return 0.0;
    }

    numerator / (denom_x.sqrt() * denom_y.sqrt())
}
