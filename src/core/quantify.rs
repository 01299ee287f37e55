use crate::domain::model::{DilutionFactor, LinearModel, QuantifiedSample, SampleRecord};

/// Projects one unknown sample through the calibration line.
///
/// `estimated = dilution * (slope * area + intercept)`. Pure; the caller owns the
/// sample count and the dilution decision.
pub fn quantify(
    model: &LinearModel,
    sample: &SampleRecord,
    dilution: DilutionFactor,
) -> QuantifiedSample {
    QuantifiedSample {
        sample_name: sample.display_name(),
        measured_area: sample.measured_area,
        estimated_concentration: dilution.value() * model.predict(sample.measured_area),
        dilution_factor: dilution.value(),
    }
}

/// Applies one dilution decision to a whole batch.
pub fn quantify_batch(
    model: &LinearModel,
    samples: &[SampleRecord],
    dilution: DilutionFactor,
) -> Vec<QuantifiedSample> {
    samples
        .iter()
        .map(|sample| quantify(model, sample, dilution))
        .collect()
}
