use anyhow::Result;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;

use gantry::{
    data::{caseman::CaseManager, sources},
    train::monitor::TensorKind,
    ActivationFunction, Controller, ControllerConfig, LossType, Network, OptimizerKind,
    OutputFunction, RunReport, WeightInit,
};

/// Assemble a multi-layer perceptron from command-line-specified dimensions,
/// activations, loss and optimizer, then train it with minibatch gradient
/// descent against a generated or file-based dataset.
#[derive(Parser, Debug)]
#[command(name = "gantry", version, about)]
struct Args {
    /// Hidden layer sizes; the input and output widths are derived from the
    /// dataset
    #[arg(short, long, num_args = 1.., required = true)]
    dims: Vec<usize>,

    /// Data source (parity, symmetry, auto_onehot, auto_dense, bitcounter,
    /// segmentcounter, or a .txt file)
    #[arg(short, long)]
    source: String,

    /// Generator parameters for the data source; defaults apply when omitted
    #[arg(long, num_args = 1..)]
    source_init: Vec<usize>,

    /// Activation function of the hidden layers
    #[arg(short, long)]
    afunc: String,

    /// Activation function of the output layer
    #[arg(long)]
    ofunc: String,

    /// Cost / loss function
    #[arg(short, long)]
    cfunc: String,

    /// Learning rate
    #[arg(short, long)]
    lrate: f64,

    /// Lower and upper bound for random weight initialization
    #[arg(short, long, num_args = 2, default_values_t = [-0.1, 0.1])]
    wrange: Vec<f64>,

    /// Optimizer (gd, adagrad, adam, rmsprop)
    #[arg(short, long)]
    optimizer: String,

    /// Fraction of the dataset to use at all
    #[arg(long, default_value_t = 1.0)]
    casefrac: f64,

    /// Validation fraction
    #[arg(long, default_value_t = 0.1)]
    vfrac: f64,

    /// Test fraction
    #[arg(long, default_value_t = 0.1)]
    tfrac: f64,

    /// Training steps between validation checks; 0 disables validation
    #[arg(long, default_value_t = 100)]
    vint: u64,

    /// Number of cases in a minibatch
    #[arg(long)]
    mbs: usize,

    /// Number of cases drawn for the mapping subset; 0 disables mapping
    #[arg(long, default_value_t = 20)]
    mapbs: usize,

    /// Total number of minibatches to run through the network
    #[arg(long)]
    steps: u64,

    /// Additional training steps run as a resumed session after the first
    /// phase completes
    #[arg(long, default_value_t = 0)]
    extra_steps: u64,

    /// Layers whose outputs are collected during the mapping pass
    #[arg(long, num_args = 0..)]
    map_layers: Vec<usize>,

    /// Layers whose weight matrices are summarized after the run
    #[arg(long, num_args = 0..)]
    dispw: Vec<usize>,

    /// Layers whose bias vectors are summarized after the run
    #[arg(long, num_args = 0..)]
    dispb: Vec<usize>,

    /// Use the fan-in-variance-scaled initializer for weights
    #[arg(long)]
    usevsi: bool,

    /// Score testing by loss instead of best-1 classification counts
    #[arg(long)]
    notbest1: bool,

    /// Seed for shuffling, weight initialization and minibatch sampling
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Logical path for parameter snapshots
    #[arg(long, default_value = "netsaver/session")]
    save_path: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("gantry=info".parse()?),
        )
        .init();

    let args = Args::parse();

    // Resolve and echo every configuration value before committing to a
    // (possibly long) training run.
    let afunc: ActivationFunction = args.afunc.parse()?;
    let ofunc: OutputFunction = args.ofunc.parse()?;
    let cfunc: LossType = args.cfunc.parse()?;
    let optimizer: OptimizerKind = args.optimizer.parse()?;
    let (wlow, whigh) = (args.wrange[0], args.wrange[1]);

    println!("source: {}", args.source);
    println!("activation function: {}", args.afunc);
    println!("output activation function: {}", args.ofunc);
    println!("cost / loss function: {}", args.cfunc);
    println!("optimizer: {}", args.optimizer);
    println!("learning rate: {}", args.lrate);
    println!("weight range: [{}, {})", wlow, whigh);
    println!("use variance scaling for weights: {}", args.usevsi);
    println!("casefrac: {}", args.casefrac);
    println!("validation fraction: {}", args.vfrac);
    println!("test fraction: {}", args.tfrac);
    println!("validation interval: {}", args.vint);
    println!("minibatch size: {}", args.mbs);
    println!("map batch size: {}", args.mapbs);
    println!("steps: {}", args.steps);
    println!("extra steps: {}", args.extra_steps);
    println!("layers to map: {:?}", args.map_layers);
    println!("weights to display: {:?}", args.dispw);
    println!("biases to display: {:?}", args.dispb);
    println!("save path: {}", args.save_path.display());
    println!("seed: {}", args.seed);

    let mut rng = StdRng::seed_from_u64(args.seed);
    let cases = sources::load(&args.source, &args.source_init, &mut rng)?;

    // Input and output widths come from the data, not the command line.
    let mut dims = Vec::with_capacity(args.dims.len() + 2);
    dims.push(cases[0].input.len());
    dims.extend_from_slice(&args.dims);
    dims.push(cases[0].target.len());
    println!("dimensions: {:?}", dims);

    let caseman = CaseManager::new(
        cases,
        args.vfrac,
        args.tfrac,
        args.casefrac,
        args.mapbs,
        &mut rng,
    )?;

    let init = if args.usevsi {
        WeightInit::FanInScaled {
            low: wlow,
            high: whigh,
        }
    } else {
        WeightInit::Uniform {
            low: wlow,
            high: whigh,
        }
    };
    let network = Network::new(
        &dims,
        afunc,
        ofunc,
        cfunc,
        optimizer,
        args.lrate,
        init,
        &mut rng,
    )?;

    let mut controller = Controller::new(
        network,
        caseman,
        ControllerConfig {
            minibatch_size: args.mbs,
            validation_interval: args.vint,
            save_path: args.save_path.clone(),
            seed: args.seed,
        },
    )?;

    for &layer in &args.map_layers {
        controller.add_monitor(layer, TensorKind::Output)?;
    }
    for &layer in &args.dispw {
        controller.add_monitor(layer, TensorKind::Weights)?;
    }
    for &layer in &args.dispb {
        controller.add_monitor(layer, TensorKind::Biases)?;
    }

    let best_k = if args.notbest1 { None } else { Some(1) };

    let report = controller.run(args.steps, best_k)?;
    print_report(&report);

    if args.extra_steps > 0 {
        let report = controller.run_more(args.extra_steps, best_k)?;
        print_report(&report);
    }

    if args.mapbs > 0 && !args.map_layers.is_empty() {
        let results = controller.map()?;
        println!("mapping pass over {} cases:", results.len());
        for (i, result) in results.iter().enumerate() {
            println!("  case {} target {:?}", i, result.target);
            for grab in &result.grabs {
                println!(
                    "    {} ({}x{})",
                    grab.name, grab.values.rows, grab.values.cols
                );
            }
        }
    }

    for stats in controller.probe_monitors() {
        println!(
            "{}: mean={:.4} min={:.4} max={:.4} hist={:?}",
            stats.name, stats.mean, stats.min, stats.max, stats.histogram
        );
    }

    Ok(())
}

fn print_report(report: &RunReport) {
    println!(
        "phase complete: {} steps, global step {}",
        report.steps, report.global_step
    );
    match report.best_k {
        None => {
            println!("total training set error = {:.6}", report.training_score);
            if let Some(score) = report.test_score {
                println!("final testing set error = {:.6}", score);
            }
        }
        Some(_) => {
            println!(
                "total training set correct classifications = {:.2}%",
                100.0 * report.training_score / report.training_cases.max(1) as f64
            );
            if let Some(score) = report.test_score {
                println!(
                    "final testing set correct classifications = {:.2}%",
                    100.0 * score / report.test_cases.max(1) as f64
                );
            }
        }
    }
}
