use clap::{Parser, Subcommand};
use kdam::BarExt;
use serde::{Deserialize, Serialize};

use plate_rd::prelude::*;

#[derive(Clone, Debug, Eq, Deserialize, PartialEq, Serialize)]
struct SimSettings {
    n_plates: usize,
    n_threads: usize,
    n_grid: usize,
    n_steps: usize,
}

fn define_jobs(sim_settings: &SimSettings) -> Result<Vec<(Plate<f64>, Settings<f64>)>, PlateError> {
    let n_grid = sim_settings.n_grid;
    let receivers: Vec<_> = (1..n_grid)
        .step_by(4)
        .flat_map(|i| (1..n_grid).step_by(4).map(move |j| [i, j]))
        .collect();
    (0..sim_settings.n_plates)
        .map(|n| {
            // Vary the amount of inducer between plates
            let setup = PlateSetup::new(
                receivers.clone(),
                vec![[0, 0]],
                1.0 + n as f64,
                (n_grid, n_grid),
                4.5,
            )
            .with_flags(true, true, false);
            let (params, curve) = fitted_parameters(setup.topology);
            let plate = make_plate(&setup, &params, UniformGrowth::new(curve))?;
            let settings = Settings {
                time: FixedStepsize::from_save_freq(
                    0.0,
                    1.0,
                    sim_settings.n_steps as f64,
                    sim_settings.n_steps,
                )?,
                solver: Solver::RungeKutta4,
                show_progressbar: false,
            };
            Ok((plate, settings))
        })
        .collect()
}

/// Wall-clock times of one batch configuration
#[derive(Clone, Debug, Deserialize, Serialize)]
struct BenchmarkResult {
    simulation_settings: SimSettings,
    /// Duration of every sampled batch in nanoseconds
    times: Vec<u128>,
    /// Integrated plates per second, one entry per sample
    plates_per_second: Vec<f64>,
}

impl BenchmarkResult {
    fn from_times(simulation_settings: SimSettings, times: Vec<u128>) -> Self {
        let n_plates = simulation_settings.n_plates as f64;
        let plates_per_second = times
            .iter()
            .map(|t| n_plates * 1e9 / *t as f64)
            .collect();
        Self {
            simulation_settings,
            times,
            plates_per_second,
        }
    }

    fn median_throughput(&self) -> f64 {
        let mut sorted = self.plates_per_second.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        sorted.get(sorted.len() / 2).copied().unwrap_or(0.0)
    }

    fn store_to_file(&self, path: &std::path::Path, index: usize) -> std::io::Result<()> {
        std::fs::create_dir_all(path)?;
        let buffer = std::fs::File::create(path.join(format!("{index:010}.json")))?;
        serde_json::to_writer_pretty(buffer, self)?;
        Ok(())
    }
}

/// Times one batch of plates. Job construction is excluded from the measurement.
fn time_batch(sim_settings: &SimSettings) -> Result<u128, Box<dyn std::error::Error>> {
    let jobs = define_jobs(sim_settings)?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(sim_settings.n_threads)
        .build()?;
    let now = std::time::Instant::now();
    let results = std::hint::black_box(pool.install(|| run_batch(jobs)));
    let elapsed = now.elapsed().as_nanos();
    for result in results {
        result?;
    }
    Ok(elapsed)
}

fn run_sim(
    args: &CLIArgs,
    settings: Vec<SimSettings>,
    label: impl Fn(&SimSettings) -> String,
    save_prefix: &str,
) -> Vec<BenchmarkResult> {
    let mut progress_bar =
        (!args.no_output).then(|| kdam::tqdm!(total = settings.len() * args.sample_size));
    let storage_path = args.get_storage_base_path().join(save_prefix);
    let mut results = vec![];
    for (index, setting) in settings.into_iter().enumerate() {
        // Warm-up run which also rejects invalid configurations
        if let Err(e) = time_batch(&setting) {
            println!("{}: batch failed with error: {e}", label(&setting));
            continue;
        }
        let mut times = Vec::with_capacity(args.sample_size);
        for _ in 0..args.sample_size {
            match time_batch(&setting) {
                Ok(t) => times.push(t),
                Err(e) => println!("{}: batch failed with error: {e}", label(&setting)),
            }
            if let Some(bar) = progress_bar.as_mut() {
                let _ = bar.update(1);
            }
        }
        let result = BenchmarkResult::from_times(setting, times);
        if let Some(bar) = progress_bar.as_mut() {
            bar.set_description(format!(
                "{} {:.1} plates/s",
                label(&result.simulation_settings),
                result.median_throughput()
            ));
        }
        if !args.no_save {
            if let Err(e) = result.store_to_file(&storage_path, index) {
                println!("Storing to file failed with error: {e}");
            }
        }
        results.push(result);
    }
    results
}

fn thread_scaling(args: &CLIArgs, threads: &[usize]) -> Vec<BenchmarkResult> {
    let simulation_settings = threads
        .iter()
        .map(|&n_threads| SimSettings {
            n_plates: args.n_plates,
            n_threads,
            n_grid: 32,
            n_steps: args.n_steps,
        })
        .collect();
    run_sim(
        args,
        simulation_settings,
        |setting| format!("threads={}", setting.n_threads),
        "thread-scaling",
    )
}

fn grid_size_scaling(
    args: &CLIArgs,
    grid_sizes: &[usize],
    n_threads: usize,
) -> Vec<BenchmarkResult> {
    let simulation_settings = grid_sizes
        .iter()
        .map(|&n_grid| SimSettings {
            n_plates: args.n_plates,
            n_threads,
            n_grid,
            n_steps: args.n_steps,
        })
        .collect();
    run_sim(
        args,
        simulation_settings,
        |setting| format!("grid={}x{}", setting.n_grid, setting.n_grid),
        "grid-size",
    )
}

#[derive(Subcommand, Debug)]
enum Scaling {
    /// Vary the size of the rayon thread pool for a fixed batch on a 32x32 grid
    Threads {
        /// Thread counts to measure
        #[arg(required = true)]
        threads: Vec<usize>,
    },
    /// Vary the number of grid points per side with a fixed thread count
    GridSize {
        /// Grid sizes to measure
        #[arg(required = true)]
        grid_sizes: Vec<usize>,
        /// Threads of the rayon pool
        #[arg(short = 't', long, default_value_t = 1)]
        n_threads: usize,
    },
}

/// Throughput of batch integration of bandpass plates
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct CLIArgs {
    /// Label of the measured machine, used as subdirectory of the results
    device: String,

    #[command(subcommand)]
    scaling: Scaling,

    /// Directory in which results are stored
    #[arg(short, long, default_value = "benchmark_results")]
    output_directory: std::path::PathBuf,

    /// Plates integrated per batch
    #[arg(short = 'p', long, default_value_t = 16)]
    n_plates: usize,

    /// Time steps of every plate
    #[arg(long, default_value_t = 50)]
    n_steps: usize,

    /// Measured batches per configuration
    #[arg(short, long, default_value_t = 5)]
    sample_size: usize,

    /// Only print results, do not write them to disk
    #[arg(long)]
    no_save: bool,

    /// Hide the progress bar
    #[arg(long)]
    no_output: bool,
}

impl CLIArgs {
    fn get_storage_base_path(&self) -> std::path::PathBuf {
        self.output_directory.join(&self.device)
    }
}

fn main() {
    let args = CLIArgs::parse();
    let results = match &args.scaling {
        Scaling::Threads { threads } => thread_scaling(&args, threads),
        Scaling::GridSize {
            grid_sizes,
            n_threads,
        } => grid_size_scaling(&args, grid_sizes, *n_threads),
    };
    for result in results.iter() {
        let SimSettings {
            n_plates,
            n_threads,
            n_grid,
            n_steps,
        } = result.simulation_settings;
        println!(
            "{n_plates} plates {n_grid}x{n_grid} {n_steps} steps {n_threads} threads: {:.2} plates/s",
            result.median_throughput()
        );
    }
}
