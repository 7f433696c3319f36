//! PDP Solver - Command Line Interface
//!
//! Generates p-dispersion instances and solves them with constructive and
//! interchange heuristics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use pdp_solver::benchmark::{improvement, list_instance_files, Benchmark, BenchmarkConfig};
use pdp_solver::heuristics::construction::*;
use pdp_solver::heuristics::local_search::*;
use pdp_solver::heuristics::{ConstructiveKind, LocalSearchKind};
use pdp_solver::instance::PDPInstance;
use pdp_solver::solution::Solution;
use pdp_solver::validation::{
    parse_n, parse_percentage, parse_positive_int, selection_size, validate_p, validate_parameters,
};
use pdp_solver::visualization::Visualizer;

use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "pdp-solver")]
#[command(author = "M2 AI2D Student")]
#[command(version = "1.0")]
#[command(about = "Instance generator and heuristic solver for the p-dispersion problem")]
struct Cli {
    /// Increase output verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate random instances
    Generate {
        /// Total number of candidate points
        #[arg(value_parser = parse_n)]
        n: usize,

        /// Percentage of points to select, between 0 and 1
        #[arg(value_parser = parse_percentage)]
        p: f64,

        /// Locate the points in a square plane of dimensions LENGTH x LENGTH
        #[arg(short, long, value_name = "LENGTH", conflicts_with = "rectangle", required_unless_present = "rectangle")]
        square: Option<i64>,

        /// Locate the points in a rectangular plane of dimensions LENGTH x WIDTH
        #[arg(short, long, num_args = 2, value_names = ["LENGTH", "WIDTH"])]
        rectangle: Option<Vec<i64>>,

        /// Number of instances to generate
        #[arg(short, long, default_value = "1", value_parser = parse_positive_int)]
        instances: usize,

        /// Seed of the first instance, incremented for each following one
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Directory receiving the instance files
        #[arg(short, long, default_value = "instances")]
        output_dir: PathBuf,

        /// Also draw each instance as SVG
        #[arg(long)]
        svg: bool,
    },

    /// Solve one instance
    Solve {
        /// Path to the instance file (<n>_<p>_<index>.dat)
        instance: PathBuf,

        /// Constructive heuristic
        #[arg(short, long, value_enum, default_value = "gc")]
        constructive: Constructive,

        /// Local search applied to the constructive solution
        #[arg(short, long, value_enum, default_value = "im")]
        local_search: Search,

        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Output solution to JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Draw the final solution to an SVG file
        #[arg(long)]
        svg: Option<PathBuf>,

        /// Write one SVG frame per accepted interchange into this directory
        #[arg(long)]
        frames: Option<PathBuf>,
    },

    /// Run a constructive + local search pair on a batch of instances
    Benchmark {
        /// Size n of the instances to solve
        #[arg(value_parser = parse_n)]
        size: usize,

        /// Directory containing instance files
        #[arg(short, long, default_value = "instances")]
        dir: PathBuf,

        /// Number of instances to solve, 1 if neither this nor --all is given
        #[arg(short, long, value_parser = parse_positive_int, conflicts_with = "all")]
        instances: Option<usize>,

        /// Solve all instances of the given size
        #[arg(short, long)]
        all: bool,

        /// Constructive heuristic
        #[arg(short, long, value_enum, default_value = "gc")]
        constructive: Constructive,

        /// Local search heuristic
        #[arg(short, long, value_enum, default_value = "if")]
        local_search: Search,

        /// Seed of the random constructive
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output_dir: PathBuf,

        /// Solve the instances one after another
        #[arg(long)]
        sequential: bool,
    },

    /// Analyze an instance
    Analyze {
        /// Path to the instance file
        instance: PathBuf,
    },

    /// Compare heuristic combinations on an instance
    Compare {
        /// Path to the instance file
        instance: PathBuf,

        /// Number of runs (seeds of the random constructive)
        #[arg(short, long, default_value = "10")]
        runs: usize,

        /// Output CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Constructive {
    /// p points chosen at random
    Random,
    /// Greedy construction
    Gc,
}

impl From<Constructive> for ConstructiveKind {
    fn from(c: Constructive) -> Self {
        match c {
            Constructive::Random => ConstructiveKind::Random,
            Constructive::Gc => ConstructiveKind::Greedy,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Search {
    /// First pairwise interchange
    If,
    /// Best pairwise interchange
    Im,
    /// Keep the constructive solution
    None,
}

impl Search {
    fn kind(self) -> Option<LocalSearchKind> {
        match self {
            Search::If => Some(LocalSearchKind::FirstInterchange),
            Search::Im => Some(LocalSearchKind::BestInterchange),
            Search::None => None,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let result = match cli.command {
        Commands::Generate { n, p, square, rectangle, instances, seed, output_dir, svg } => {
            generate_instances(n, p, square, rectangle, instances, seed, &output_dir, svg)
        }

        Commands::Solve { instance, constructive, local_search, seed, output, svg, frames } => {
            solve_instance(&instance, constructive, local_search, seed, output, svg, frames)
        }

        Commands::Benchmark {
            size,
            dir,
            instances,
            all,
            constructive,
            local_search,
            seed,
            output_dir,
            sequential,
        } => {
            let count = if all { 20 } else { instances.unwrap_or(1) };
            run_benchmark(size, &dir, count, constructive, local_search, seed, &output_dir, sequential)
        }

        Commands::Analyze { instance } => analyze_instance(&instance),

        Commands::Compare { instance, runs, output } => compare_algorithms(&instance, runs, output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log level from the `-v` count, `RUST_LOG` wins when set
fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn load_instance(path: &Path) -> Result<PDPInstance, String> {
    let instance = PDPInstance::from_file(path).map_err(|e| format!("Error loading instance: {}", e))?;
    validate_p(instance.n(), instance.p)?;
    Ok(instance)
}

/// `seed, seed + 1, ...`, wrapping at `u64::MAX`
fn instance_seeds(seed: u64, count: usize) -> impl Iterator<Item = u64> {
    (0..count as u64).map(move |i| seed.wrapping_add(i))
}

#[allow(clippy::too_many_arguments)]
fn generate_instances(
    n: usize,
    percentage: f64,
    square: Option<i64>,
    rectangle: Option<Vec<i64>>,
    count: usize,
    seed: u64,
    output_dir: &Path,
    svg: bool,
) -> Result<(), String> {
    let (x_max, y_max) = match (square, rectangle.as_deref()) {
        (Some(length), _) => (length, length),
        (None, Some([length, width])) => (*length, *width),
        _ => return Err("either --square or --rectangle must be given".to_string()),
    };

    let p = selection_size(n, percentage);
    validate_parameters(n, p, x_max, y_max)?;

    std::fs::create_dir_all(output_dir)
        .map_err(|e| format!("Failed to create output directory: {}", e))?;

    let viz = Visualizer::new();
    for (i, instance_seed) in instance_seeds(seed, count).enumerate() {
        let instance = PDPInstance::random(n, p, x_max, y_max, instance_seed);
        let path = instance.to_file(output_dir, i)?;
        println!("Instance saved to {:?}", path);

        if svg {
            let svg_path = path.with_extension("svg");
            viz.save_svg(&viz.generate_instance_svg(&instance), &svg_path)
                .map_err(|e| format!("Failed to save SVG: {}", e))?;
        }
    }

    Ok(())
}

fn solve_instance(
    path: &Path,
    constructive: Constructive,
    search: Search,
    seed: u64,
    output: Option<PathBuf>,
    svg: Option<PathBuf>,
    frames: Option<PathBuf>,
) -> Result<(), String> {
    println!("Loading instance from {:?}...", path);
    let instance = load_instance(path)?;
    log::info!("\n{}", instance.statistics());

    let heuristic = ConstructiveKind::from(constructive).build(seed);
    let start = Instant::now();
    let mut solution = heuristic.construct(&instance);
    let constructive_objective = solution.objective;
    println!("CH OF = {}", constructive_objective);
    println!("CH Time = {:.6} s", solution.computation_time);

    let viz = Visualizer::new();
    if let Some(dir) = &frames {
        std::fs::create_dir_all(dir).map_err(|e| format!("Failed to create frame directory: {}", e))?;
        viz.save_svg(&viz.generate_svg(&instance, &solution), dir.join("frame_0000.svg"))
            .map_err(|e| format!("Failed to write frame: {}", e))?;
    }

    if let Some(kind) = search.kind() {
        let local_search = kind.build();
        let mut frame = 0;
        let mut frame_error: Option<String> = None;

        local_search.improve_with_observer(&instance, &mut solution, |_, current| {
            if let Some(dir) = &frames {
                frame += 1;
                let svg = viz.generate_svg(&instance, current);
                if let Err(e) = viz.save_svg(&svg, dir.join(format!("frame_{:04}.svg", frame))) {
                    frame_error.get_or_insert_with(|| e.to_string());
                }
            }
        });
        if let Some(e) = frame_error {
            return Err(format!("Failed to write frame: {}", e));
        }

        solution.algorithm = format!("{}+{}", heuristic.name(), local_search.name());
        println!("LSH OF = {}", solution.objective);
        println!("LSH Time = {:.6} s", solution.computation_time);
    }

    let elapsed = start.elapsed();

    println!("\n========== Results ==========");
    println!("Algorithm: {}", solution.algorithm);
    println!("Objective: {}", solution.objective);
    let gain = improvement(constructive.into(), constructive_objective, solution.objective);
    if let (Some(_), Some((abs, rel))) = (search.kind(), gain) {
        println!("Absolute improvement: {}", abs);
        if let Some(rel) = rel {
            println!("Relative improvement: {:.3}%", rel);
        }
    }
    println!("Feasible: {}", solution.feasible);
    println!("Time: {:.4}s", elapsed.as_secs_f64());
    if let Some(iter) = solution.iterations {
        println!("Interchanges: {}", iter);
    }
    println!("S = {:?}", solution.sorted_indices());

    if let Some(out_path) = output {
        let json = serde_json::to_string_pretty(&solution)
            .map_err(|e| format!("Failed to serialize solution: {}", e))?;
        std::fs::write(&out_path, json).map_err(|e| format!("Failed to write output: {}", e))?;
        println!("\nSolution saved to {:?}", out_path);
    }

    if let Some(svg_path) = svg {
        viz.save_svg(&viz.generate_svg(&instance, &solution), &svg_path)
            .map_err(|e| format!("Failed to save SVG: {}", e))?;
        println!("Visualization saved to {:?}", svg_path);
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_benchmark(
    size: usize,
    dir: &Path,
    count: usize,
    constructive: Constructive,
    search: Search,
    seed: u64,
    output: &Path,
    sequential: bool,
) -> Result<(), String> {
    let local_search = search
        .kind()
        .ok_or_else(|| "the benchmark needs a local search (if or im)".to_string())?;

    println!("Loading instances from {:?}...", dir);
    let files = list_instance_files(dir, size, count)?;
    if files.is_empty() {
        return Err(format!("No instances of size {} found in {:?}", size, dir));
    }
    println!("Found {} instances", files.len());

    std::fs::create_dir_all(output).map_err(|e| format!("Failed to create output directory: {}", e))?;

    let config = BenchmarkConfig {
        constructive: constructive.into(),
        local_search,
        seed,
        parallel: !sequential,
        output_dir: output.to_string_lossy().to_string(),
        ..Default::default()
    };

    let mut benchmark = Benchmark::new(config);
    benchmark.run_files(&files);

    let results_path = benchmark.results_path(size);
    benchmark
        .export_to_csv(&results_path)
        .map_err(|e| format!("Failed to export results: {}", e))?;
    println!("\nResults exported to {:?}", results_path);

    let report = benchmark.generate_report();
    println!("\n{}", report);

    let report_path = results_path.with_extension("txt");
    std::fs::write(&report_path, &report).map_err(|e| format!("Failed to save report: {}", e))?;
    println!("Report saved to {:?}", report_path);

    Ok(())
}

fn analyze_instance(path: &Path) -> Result<(), String> {
    let instance = load_instance(path)?;

    println!("========== Instance Analysis ==========\n");
    println!("{}", instance.statistics());

    if let Some((a, b)) = instance.farthest_pair() {
        println!("Farthest pair: {} and {} (distance {})", a.index, b.index, instance.distance(a.index, b.index));
    }

    let gc = GreedyConstruction::new().construct(&instance);

    let mut gc_if = gc.clone();
    PairwiseInterchange::first_improvement().improve(&instance, &mut gc_if);

    let mut gc_im = gc.clone();
    PairwiseInterchange::best_improvement().improve(&instance, &mut gc_im);

    println!("\nQuick Solution Estimates:");
    println!("  GC: {} ({:.4}s)", gc.objective, gc.computation_time);
    println!("  GC + IF: {} ({} interchanges)", gc_if.objective, gc_if.iterations.unwrap_or(0));
    println!("  GC + IM: {} ({} interchanges)", gc_im.objective, gc_im.iterations.unwrap_or(0));

    Ok(())
}

fn compare_algorithms(path: &Path, runs: usize, output: Option<PathBuf>) -> Result<(), String> {
    let instance = load_instance(path)?;

    println!("Comparing heuristics on {} (n={}, p={})...\n", instance.name, instance.n(), instance.p);

    fn with_search(mut sol: Solution, search: PairwiseInterchange, instance: &PDPInstance) -> Solution {
        search.improve(instance, &mut sol);
        sol
    }

    let algorithms: Vec<(&str, Box<dyn Fn(&PDPInstance, u64) -> Solution>)> = vec![
        ("GC", Box::new(|inst: &PDPInstance, _seed: u64| {
            GreedyConstruction::new().construct(inst)
        })),
        ("GC+IF", Box::new(|inst: &PDPInstance, _seed: u64| {
            with_search(GreedyConstruction::new().construct(inst), PairwiseInterchange::first_improvement(), inst)
        })),
        ("GC+IM", Box::new(|inst: &PDPInstance, _seed: u64| {
            with_search(GreedyConstruction::new().construct(inst), PairwiseInterchange::best_improvement(), inst)
        })),
        ("random+IF", Box::new(|inst: &PDPInstance, seed: u64| {
            with_search(RandomConstruction::new(seed).construct(inst), PairwiseInterchange::first_improvement(), inst)
        })),
        ("random+IM", Box::new(|inst: &PDPInstance, seed: u64| {
            with_search(RandomConstruction::new(seed).construct(inst), PairwiseInterchange::best_improvement(), inst)
        })),
    ];

    let mut results: Vec<(String, Vec<u64>, Vec<f64>)> = Vec::new();

    for (name, solver) in &algorithms {
        let mut objectives = Vec::new();
        let mut times = Vec::new();

        for seed in 0..runs as u64 {
            let start = Instant::now();
            let sol = solver(&instance, seed);
            let elapsed = start.elapsed().as_secs_f64();

            if sol.feasible {
                objectives.push(sol.objective);
                times.push(elapsed);
            }
        }

        log::info!("{}: {} feasible runs", name, objectives.len());
        results.push((name.to_string(), objectives, times));
    }

    println!("{:<12} {:>10} {:>10} {:>10} {:>10}", "Algorithm", "Best", "Average", "Worst", "Avg Time");
    println!("{}", "-".repeat(56));

    for (name, objectives, times) in &results {
        if let (Some(best), Some(worst)) = (objectives.iter().max(), objectives.iter().min()) {
            let avg = objectives.iter().sum::<u64>() as f64 / objectives.len() as f64;
            let avg_time = times.iter().sum::<f64>() / times.len() as f64;

            println!("{:<12} {:>10} {:>10.2} {:>10} {:>10.4}", name, best, avg, worst, avg_time);
        } else {
            println!("{:<12} no feasible solutions", name);
        }
    }

    if let Some(out_path) = output {
        let mut writer = csv::Writer::from_path(&out_path).map_err(|e| format!("Failed to create CSV: {}", e))?;
        writer
            .write_record(["algorithm", "run", "objective", "time"])
            .map_err(|e| format!("Failed to write CSV: {}", e))?;

        for (name, objectives, times) in &results {
            for (i, (objective, time)) in objectives.iter().zip(times.iter()).enumerate() {
                writer
                    .write_record([name.clone(), i.to_string(), objective.to_string(), format!("{:.6}", time)])
                    .map_err(|e| format!("Failed to write CSV: {}", e))?;
            }
        }

        writer.flush().map_err(|e| format!("Failed to write CSV: {}", e))?;
        println!("\nResults exported to {:?}", out_path);
    }

    Ok(())
}
