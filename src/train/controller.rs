use crate::data::case::Case;
use crate::data::caseman::CaseManager;
use crate::error::{Error, Result};
use crate::math::matrix::Matrix;
use crate::network::network::Network;
use crate::state::store::Store;
use crate::train::monitor::{Monitor, ProbeStats, TensorKind, TensorSnapshot};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

/// Training-loop knobs that are not part of the network itself.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Cases per gradient update.
    pub minibatch_size: usize,
    /// Validate every this many global steps; 0 disables validation.
    pub validation_interval: u64,
    /// Logical snapshot path; the stored file embeds the step number.
    pub save_path: PathBuf,
    /// Seed for the minibatch sampler.
    pub seed: u64,
}

/// Lifecycle of a controller across run / run_more calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Training,
    Tested,
    Suspended,
}

/// What a completed training phase reported.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub steps: u64,
    pub global_step: u64,
    /// Score on the full training subset (mean loss, or correct count when
    /// `best_k` was set).
    pub training_score: f64,
    pub training_cases: usize,
    /// Score on the test subset, absent when the subset is empty.
    pub test_score: Option<f64>,
    pub test_cases: usize,
    pub best_k: Option<usize>,
}

/// Monitored tensors collected for one mapping case.
#[derive(Debug, Clone)]
pub struct MapResult {
    pub target: Vec<f64>,
    pub grabs: Vec<TensorSnapshot>,
}

/// Orchestrates minibatch training with periodic validation, final testing,
/// and suspend/resume across phases.
///
/// Each phase (`run` or `run_more`) trains for a requested number of steps,
/// scores the full training subset and the test subset, then suspends:
/// parameters go to the state store and the phase ends. `run_more` restores
/// the last snapshot first and continues the global step counter; the error
/// and validation histories are only ever appended to.
#[derive(Debug)]
pub struct Controller {
    network: Network,
    cases: CaseManager,
    config: ControllerConfig,
    rng: StdRng,
    phase: Phase,
    global_step: u64,
    error_history: Vec<(u64, f64)>,
    validation_history: Vec<(u64, f64)>,
    monitors: Vec<Monitor>,
    saved_path: Option<PathBuf>,
}

impl Controller {
    pub fn new(network: Network, cases: CaseManager, config: ControllerConfig) -> Result<Controller> {
        network.check_dimensions(cases.input_width(), cases.target_width())?;
        if config.minibatch_size == 0 {
            return Err(Error::Config("minibatch size must be at least 1".into()));
        }
        // Sampling without replacement cannot draw more cases than exist.
        if config.minibatch_size > cases.training_cases().len() {
            return Err(Error::Config(format!(
                "minibatch size ({}) exceeds the training subset size ({})",
                config.minibatch_size,
                cases.training_cases().len()
            )));
        }
        let rng = StdRng::seed_from_u64(config.seed);
        Ok(Controller {
            network,
            cases,
            config,
            rng,
            phase: Phase::Uninitialized,
            global_step: 0,
            error_history: Vec::new(),
            validation_history: Vec::new(),
            monitors: Vec::new(),
            saved_path: None,
        })
    }

    /// Trains for `steps` minibatches from the current parameters, scores,
    /// and suspends.
    pub fn run(&mut self, steps: u64, best_k: Option<usize>) -> Result<RunReport> {
        self.train_phase(steps, best_k)
    }

    /// Restores the last suspended session's parameters, then trains for
    /// `steps` more minibatches, continuing the step counter and histories.
    pub fn run_more(&mut self, steps: u64, best_k: Option<usize>) -> Result<RunReport> {
        self.reopen()?;
        self.train_phase(steps, best_k)
    }

    fn reopen(&mut self) -> Result<()> {
        let path = self.saved_path.clone().ok_or_else(|| {
            Error::StateMismatch("no persisted session to resume; call run first".into())
        })?;
        Store::restore(&mut self.network, &path)?;
        Ok(())
    }

    fn train_phase(&mut self, steps: u64, best_k: Option<usize>) -> Result<RunReport> {
        let mbs = self.config.minibatch_size;
        self.phase = Phase::Training;

        for i in 0..steps {
            let step = self.global_step + i;
            let (input, target) = self.sample_minibatch(mbs);
            let error = self.network.forward_and_update(&input, &target);
            self.error_history.push((step, error));
            self.consider_validation(step);
        }
        self.global_step += steps;

        // Inference-only scoring on the full training subset, then the test
        // subset.
        let training_cases = self.cases.training_cases().len();
        let (input, target) = batch_of(self.cases.training_cases());
        let training_score = self.network.evaluate(&input, &target, best_k);
        report_score("total training", training_score, training_cases, best_k);

        let test_cases = self.cases.testing_cases().len();
        let test_score = if test_cases > 0 {
            let (input, target) = batch_of(self.cases.testing_cases());
            let score = self.network.evaluate(&input, &target, best_k);
            report_score("final testing", score, test_cases, best_k);
            Some(score)
        } else {
            None
        };
        self.phase = Phase::Tested;

        self.suspend()?;

        Ok(RunReport {
            steps,
            global_step: self.global_step,
            training_score,
            training_cases,
            test_score,
            test_cases,
            best_k,
        })
    }

    fn sample_minibatch(&mut self, mbs: usize) -> (Matrix, Matrix) {
        let training = self.cases.training_cases();
        // Without replacement within the batch, with replacement across
        // batches.
        let picks = rand::seq::index::sample(&mut self.rng, training.len(), mbs);
        let input = Matrix::from_rows(picks.iter().map(|i| training[i].input.as_slice()));
        let target = Matrix::from_rows(picks.iter().map(|i| training[i].target.as_slice()));
        (input, target)
    }

    fn consider_validation(&mut self, step: u64) {
        let interval = self.config.validation_interval;
        if interval == 0 || step % interval != 0 {
            return;
        }
        if self.cases.validation_cases().is_empty() {
            return;
        }
        let (input, target) = batch_of(self.cases.validation_cases());
        let error = self.network.evaluate(&input, &target, None);
        self.validation_history.push((step, error));
        tracing::info!(step, error, "validation checkpoint");
    }

    /// End-of-phase persistence: parameters go to the state store and the
    /// stored location is remembered for the next `run_more`.
    fn suspend(&mut self) -> Result<()> {
        let stored = Store::save(&self.network, &self.config.save_path, self.global_step)?;
        self.saved_path = Some(stored);
        self.phase = Phase::Suspended;
        Ok(())
    }

    /// Selects a layer tensor for monitoring during `map` and `probe`.
    pub fn add_monitor(&mut self, layer: usize, kind: TensorKind) -> Result<()> {
        if layer >= self.network.layers().len() {
            return Err(Error::Config(format!(
                "monitor layer {} out of range; the network has {} layers",
                layer,
                self.network.layers().len()
            )));
        }
        self.monitors.push(Monitor { layer, kind });
        Ok(())
    }

    /// Runs every mapping case through the network (no updates) and collects
    /// the monitored tensors per case. Histories are untouched.
    pub fn map(&mut self) -> Result<Vec<MapResult>> {
        if self.saved_path.is_some() {
            self.reopen()?;
        }
        let cases: Vec<Case> = self.cases.mapping_cases().to_vec();
        let mut results = Vec::with_capacity(cases.len());
        for case in &cases {
            let input = Matrix::from_rows([case.input.as_slice()]);
            self.network.predict(&input);
            let grabs = self
                .monitors
                .iter()
                .map(|m| m.grab(&self.network.layers()[m.layer]))
                .collect();
            results.push(MapResult {
                target: case.target.clone(),
                grabs,
            });
        }
        Ok(results)
    }

    /// Summary statistics for every monitored tensor, as of the last
    /// forward pass.
    pub fn probe_monitors(&self) -> Vec<ProbeStats> {
        self.monitors
            .iter()
            .map(|m| m.probe(&self.network.layers()[m.layer]))
            .collect()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn global_step(&self) -> u64 {
        self.global_step
    }

    pub fn error_history(&self) -> &[(u64, f64)] {
        &self.error_history
    }

    pub fn validation_history(&self) -> &[(u64, f64)] {
        &self.validation_history
    }

    pub fn network(&self) -> &Network {
        &self.network
    }
}

/// Stacks a case subset into (input, target) batch matrices.
fn batch_of(cases: &[Case]) -> (Matrix, Matrix) {
    let input = Matrix::from_rows(cases.iter().map(|c| c.input.as_slice()));
    let target = Matrix::from_rows(cases.iter().map(|c| c.target.as_slice()));
    (input, target)
}

fn report_score(label: &str, score: f64, cases: usize, best_k: Option<usize>) {
    match best_k {
        None => tracing::info!("{} set error = {:.6}", label, score),
        Some(_) => tracing::info!(
            "{} set correct classifications = {:.2}%",
            label,
            100.0 * score / cases.max(1) as f64
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use crate::activation::output::OutputFunction;
    use crate::data::sources;
    use crate::layers::dense::WeightInit;
    use crate::loss::loss_type::LossType;
    use crate::optim::optimizer::OptimizerKind;

    fn build_controller(name: &str, minibatch: usize, vint: u64) -> Controller {
        let mut rng = StdRng::seed_from_u64(100);
        let cases = sources::load("auto_onehot", &[8], &mut rng).unwrap();
        let cases = CaseManager::new(cases, 0.125, 0.125, 1.0, 4, &mut rng).unwrap();

        let network = Network::new(
            &[8, 6, 8],
            ActivationFunction::Sigmoid,
            OutputFunction::Linear,
            LossType::Mse,
            OptimizerKind::Gd,
            0.3,
            WeightInit::Uniform {
                low: -0.2,
                high: 0.2,
            },
            &mut rng,
        )
        .unwrap();

        let dir = std::env::temp_dir().join("gantry-controller-test");
        std::fs::create_dir_all(&dir).unwrap();
        let config = ControllerConfig {
            minibatch_size: minibatch,
            validation_interval: vint,
            save_path: dir.join(name),
            seed: 200,
        };
        Controller::new(network, cases, config).unwrap()
    }

    #[test]
    fn run_then_run_more_matches_one_long_run() {
        let mut split = build_controller("split", 4, 0);
        split.run(20, None).unwrap();
        split.run_more(10, None).unwrap();

        let mut whole = build_controller("whole", 4, 0);
        whole.run(30, None).unwrap();

        assert_eq!(split.global_step(), 30);
        assert_eq!(split.error_history().len(), 30);
        assert_eq!(split.error_history(), whole.error_history());
    }

    #[test]
    fn histories_are_appended_never_truncated() {
        let mut ctl = build_controller("append", 4, 5);
        ctl.run(10, None).unwrap();
        let first_len = ctl.error_history().len();
        let first_val_len = ctl.validation_history().len();
        ctl.run_more(10, None).unwrap();
        assert_eq!(ctl.error_history().len(), first_len + 10);
        assert!(ctl.validation_history().len() > first_val_len);
        // Steps stay strictly increasing across the phase boundary.
        let steps: Vec<u64> = ctl.error_history().iter().map(|&(s, _)| s).collect();
        assert!(steps.windows(2).all(|w| w[1] == w[0] + 1));
    }

    #[test]
    fn validation_runs_on_the_configured_interval() {
        let mut ctl = build_controller("vint", 4, 5);
        ctl.run(10, None).unwrap();
        // Steps 0 and 5 hit the interval.
        let steps: Vec<u64> = ctl.validation_history().iter().map(|&(s, _)| s).collect();
        assert_eq!(steps, vec![0, 5]);
    }

    #[test]
    fn oversized_minibatch_is_rejected_before_any_step() {
        let mut rng = StdRng::seed_from_u64(100);
        let cases = sources::load("auto_onehot", &[8], &mut rng).unwrap();
        let cases = CaseManager::new(cases, 0.125, 0.125, 1.0, 0, &mut rng).unwrap();
        let network = Network::new(
            &[8, 8],
            ActivationFunction::Sigmoid,
            OutputFunction::Linear,
            LossType::Mse,
            OptimizerKind::Gd,
            0.1,
            WeightInit::Uniform {
                low: -0.1,
                high: 0.1,
            },
            &mut rng,
        )
        .unwrap();
        let config = ControllerConfig {
            minibatch_size: 64,
            validation_interval: 0,
            save_path: std::env::temp_dir().join("gantry-controller-test/oversized"),
            seed: 1,
        };
        let err = Controller::new(network, cases, config).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn run_more_without_run_is_a_state_mismatch() {
        let mut ctl = build_controller("norun", 4, 0);
        let err = ctl.run_more(5, None).unwrap_err();
        assert!(matches!(err, Error::StateMismatch(_)));
    }

    #[test]
    fn run_suspends_with_a_stored_snapshot() {
        let mut ctl = build_controller("suspend", 4, 0);
        ctl.run(5, None).unwrap();
        assert_eq!(ctl.phase(), Phase::Suspended);
        assert!(ctl.error_history().len() == 5);
    }

    #[test]
    fn map_collects_monitored_tensors_per_case() {
        let mut ctl = build_controller("map", 4, 0);
        ctl.add_monitor(0, TensorKind::Output).unwrap();
        ctl.add_monitor(1, TensorKind::Weights).unwrap();
        ctl.run(5, None).unwrap();
        let history_len = ctl.error_history().len();

        let results = ctl.map().unwrap();
        assert_eq!(results.len(), 4);
        for result in &results {
            assert_eq!(result.grabs.len(), 2);
            assert_eq!(result.grabs[0].name, "layer-0-out");
            assert_eq!(result.grabs[1].name, "layer-1-wgt");
        }
        assert_eq!(ctl.error_history().len(), history_len);
    }

    #[test]
    fn monitor_on_missing_layer_is_config_error() {
        let mut ctl = build_controller("badmon", 4, 0);
        assert!(matches!(
            ctl.add_monitor(9, TensorKind::Input),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn best_k_report_counts_test_cases() {
        let mut ctl = build_controller("bestk", 4, 0);
        let report = ctl.run(50, Some(1)).unwrap();
        assert_eq!(report.best_k, Some(1));
        assert_eq!(report.test_cases, 1);
        let score = report.test_score.unwrap();
        assert!(score == 0.0 || score == 1.0);
    }
}
