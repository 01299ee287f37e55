use crate::domain::model::{CalibrationPoint, LinearModel};
use crate::utils::error::{QuantError, Result};

/// Ordinary least-squares fit of concentration against peak area.
///
/// Fails with [`QuantError::DegenerateFit`] for fewer than two points, non-finite
/// input, or when every point shares the same area (the slope is undefined).
/// R² is `1 - SS_res / SS_tot`; when every reference concentration is equal the
/// fitted line is horizontal and exact, and R² is 1.
pub fn fit(points: &[CalibrationPoint]) -> Result<LinearModel> {
    if points.len() < 2 {
        return Err(QuantError::DegenerateFit {
            reason: format!("need at least 2 calibration points, got {}", points.len()),
        });
    }

    if let Some(bad) = points
        .iter()
        .position(|p| !p.measured_area.is_finite() || !p.reference_concentration.is_finite())
    {
        return Err(QuantError::DegenerateFit {
            reason: format!("calibration point {} is not a finite number", bad + 1),
        });
    }

    let first = points[0];
    if points.iter().all(|p| p.measured_area == first.measured_area) {
        return Err(QuantError::DegenerateFit {
            reason: format!(
                "all {} calibration areas are identical ({})",
                points.len(),
                first.measured_area
            ),
        });
    }

    if points
        .iter()
        .all(|p| p.reference_concentration == first.reference_concentration)
    {
        return Ok(LinearModel {
            slope: 0.0,
            intercept: first.reference_concentration,
            r_squared: 1.0,
        });
    }

    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.measured_area).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.reference_concentration).sum::<f64>() / n;

    let (sxx, sxy) = points.iter().fold((0.0, 0.0), |(sxx, sxy), p| {
        let dx = p.measured_area - mean_x;
        (sxx + dx * dx, sxy + dx * (p.reference_concentration - mean_y))
    });

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    if !slope.is_finite() || !intercept.is_finite() {
        return Err(QuantError::DegenerateFit {
            reason: "calibration areas are too close together to resolve a slope".to_string(),
        });
    }

    let mut model = LinearModel {
        slope,
        intercept,
        r_squared: 0.0,
    };

    let ss_res: f64 = residuals(&model, points).iter().map(|r| r * r).sum();
    let ss_tot: f64 = points
        .iter()
        .map(|p| (p.reference_concentration - mean_y).powi(2))
        .sum();
    model.r_squared = 1.0 - ss_res / ss_tot;

    tracing::debug!(
        "Fitted slope={} intercept={} r2={} (SS_res={}, SS_tot={})",
        model.slope,
        model.intercept,
        model.r_squared,
        ss_res,
        ss_tot
    );

    Ok(model)
}

/// Observed minus fitted concentration, one per point.
pub fn residuals(model: &LinearModel, points: &[CalibrationPoint]) -> Vec<f64> {
    points
        .iter()
        .map(|p| p.reference_concentration - model.predict(p.measured_area))
        .collect()
}
