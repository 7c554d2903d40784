use crate::data::case::Case;
use crate::error::{Error, Result};
use rand::seq::SliceRandom;
use rand::Rng;

/// Splits a case collection into training / validation / test / mapping
/// subsets.
///
/// The full collection is shuffled once and sliced sequentially; with a
/// usage fraction below 1 the cases past the combined fraction are dropped
/// from all three subsets. The mapping subset is an independent re-shuffled
/// draw capped at `map_batch_size` and may overlap the others; it is used
/// only for inspecting activations, never for gradient updates.
#[derive(Debug)]
pub struct CaseManager {
    training: Vec<Case>,
    validation: Vec<Case>,
    testing: Vec<Case>,
    mapping: Vec<Case>,
}

impl CaseManager {
    pub fn new<R: Rng>(
        cases: Vec<Case>,
        validation_fraction: f64,
        test_fraction: f64,
        usage_fraction: f64,
        map_batch_size: usize,
        rng: &mut R,
    ) -> Result<CaseManager> {
        if !(0.0..=1.0).contains(&validation_fraction)
            || !(0.0..=1.0).contains(&test_fraction)
            || !(0.0..=1.0).contains(&usage_fraction)
        {
            return Err(Error::Config(format!(
                "fractions must lie in [0, 1]: vfrac={}, tfrac={}, casefrac={}",
                validation_fraction, test_fraction, usage_fraction
            )));
        }
        if validation_fraction + test_fraction > 1.0 {
            return Err(Error::Config(format!(
                "vfrac ({}) + tfrac ({}) exceeds 1; no cases would remain for training",
                validation_fraction, test_fraction
            )));
        }

        let train_frac = (1.0 - (validation_fraction + test_fraction)) * usage_fraction;
        let val_frac = validation_fraction * usage_fraction;
        let test_frac = test_fraction * usage_fraction;

        let n = cases.len();
        let mut shuffled = cases;
        shuffled.shuffle(rng);

        let sep1 = (n as f64 * train_frac).round() as usize;
        let sep2 = sep1 + (n as f64 * val_frac).round() as usize;
        let sep3 = (sep2 + (n as f64 * test_frac).round() as usize).min(n);

        let training = shuffled[0..sep1.min(n)].to_vec();
        let validation = shuffled[sep1.min(n)..sep2.min(n)].to_vec();
        let testing = shuffled[sep2.min(n)..sep3].to_vec();

        // Independent draw for the mapping subset.
        shuffled.shuffle(rng);
        shuffled.truncate(map_batch_size.min(n));

        Ok(CaseManager {
            training,
            validation,
            testing,
            mapping: shuffled,
        })
    }

    pub fn training_cases(&self) -> &[Case] {
        &self.training
    }

    pub fn validation_cases(&self) -> &[Case] {
        &self.validation
    }

    pub fn testing_cases(&self) -> &[Case] {
        &self.testing
    }

    pub fn mapping_cases(&self) -> &[Case] {
        &self.mapping
    }

    /// Input width of the dataset, from the first retained case.
    pub fn input_width(&self) -> usize {
        self.any_case().map_or(0, |c| c.input.len())
    }

    /// Target width of the dataset, from the first retained case.
    pub fn target_width(&self) -> usize {
        self.any_case().map_or(0, |c| c.target.len())
    }

    fn any_case(&self) -> Option<&Case> {
        self.training
            .first()
            .or_else(|| self.validation.first())
            .or_else(|| self.testing.first())
            .or_else(|| self.mapping.first())
    }
}
