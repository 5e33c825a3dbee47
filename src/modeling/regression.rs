use serde::{Deserialize, Serialize};

use crate::error::{Result, SignalError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self> {
        let width = rows.first().map(|row| row.len()).ok_or(SignalError::InsufficientData {
            records: 0,
            required: 1,
        })?;
        let count = rows.len() as f64;
        let mut mean = vec![0.0; width];
        for row in rows {
            for (acc, value) in mean.iter_mut().zip(row.iter()) {
                *acc += value / count;
            }
        }
        let mut scale = vec![0.0; width];
        for row in rows {
            for ((acc, value), center) in scale.iter_mut().zip(row.iter()).zip(mean.iter()) {
                *acc += (value - center).powi(2) / count;
            }
        }
        for value in scale.iter_mut() {
            *value = value.sqrt();
            if *value <= f64::EPSILON {
                *value = 1.0;
            }
        }
        Ok(Self { mean, scale })
    }

    pub fn transform(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter().map(|row| self.transform_row(row)).collect()
    }

    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.mean.iter().zip(self.scale.iter()))
            .map(|(value, (center, scale))| (value - center) / scale)
            .collect()
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    intercept: f64,
    coefficients: Vec<f64>,
}

impl LinearRegression {
    pub fn fit(rows: &[Vec<f64>], targets: &[f64]) -> Result<Self> {
        if rows.is_empty() || rows.len() != targets.len() {
            return Err(SignalError::InsufficientData {
                records: rows.len().min(targets.len()),
                required: 1,
            });
        }
        let width = rows[0].len();
        let count = rows.len() as f64;

        let mut x_mean = vec![0.0; width];
        for row in rows {
            for (acc, value) in x_mean.iter_mut().zip(row.iter()) {
                *acc += value / count;
            }
        }
        let y_mean = targets.iter().sum::<f64>() / count;

        // normal equations on centered data: (XᵀX) β = Xᵀy
        let mut gram = vec![vec![0.0; width]; width];
        let mut moment = vec![0.0; width];
        for (row, target) in rows.iter().zip(targets.iter()) {
            let centered: Vec<f64> = row.iter().zip(x_mean.iter()).map(|(v, m)| v - m).collect();
            let dy = target - y_mean;
            for i in 0..width {
                moment[i] += centered[i] * dy;
                for j in 0..width {
                    gram[i][j] += centered[i] * centered[j];
                }
            }
        }

        let coefficients = solve_least_squares(gram, moment);
        let intercept = y_mean
            - coefficients
                .iter()
                .zip(x_mean.iter())
                .map(|(beta, center)| beta * center)
                .sum::<f64>();

        Ok(Self {
            intercept,
            coefficients,
        })
    }

    pub fn predict_row(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row.iter())
                .map(|(beta, value)| beta * value)
                .sum::<f64>()
    }

    pub fn predict(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        rows.iter().map(|row| self.predict_row(row)).collect()
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }
}

/// Gauss-Jordan elimination with partial pivoting. Columns without a usable
/// pivot (collinear or constant features) get a zero coefficient.
fn solve_least_squares(mut matrix: Vec<Vec<f64>>, mut rhs: Vec<f64>) -> Vec<f64> {
    let n = rhs.len();
    let magnitude = (0..n).map(|i| matrix[i][i].abs()).fold(0.0, f64::max);
    let tolerance = magnitude.max(1.0) * 1e-10;

    let mut pivot_rows: Vec<Option<usize>> = vec![None; n];
    let mut row = 0usize;
    for col in 0..n {
        if row >= n {
            break;
        }
        let (best, best_value) = (row..n)
            .map(|r| (r, matrix[r][col].abs()))
            .fold((row, 0.0), |acc, item| if item.1 > acc.1 { item } else { acc });
        if best_value <= tolerance {
            continue;
        }
        matrix.swap(row, best);
        rhs.swap(row, best);

        let pivot = matrix[row][col];
        for value in matrix[row].iter_mut() {
            *value /= pivot;
        }
        rhs[row] /= pivot;

        for other in 0..n {
            if other == row {
                continue;
            }
            let factor = matrix[other][col];
            if factor == 0.0 {
                continue;
            }
            for k in 0..n {
                matrix[other][k] -= factor * matrix[row][k];
            }
            rhs[other] -= factor * rhs[row];
        }

        pivot_rows[col] = Some(row);
        row += 1;
    }

    pivot_rows
        .into_iter()
        .map(|pivot| pivot.map(|r| rhs[r]).unwrap_or(0.0))
        .collect()
}
