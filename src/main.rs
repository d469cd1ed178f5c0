//! Coloring engine - Command Line Interface
//!
//! Runs the ant-colony coloring engine on DIMACS instances, analyzes
//! instances, and benchmarks the colony against the greedy baselines.

use clap::{Parser, Subcommand};

use aco_regalloc::benchmark::{benchmark_suite, Benchmark, BenchmarkConfig};
use aco_regalloc::heuristics::colony::{solve, solve_to_completion, ColonyConfig};
use aco_regalloc::heuristics::greedy::{ConstructionHeuristic, DsaturHeuristic, RandomHeuristic};
use aco_regalloc::instance::ColoringInstance;
use aco_regalloc::solution::Coloring;

use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "aco-regalloc")]
#[command(version = "1.0")]
#[command(about = "An ant-colony graph coloring engine for register allocation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Color a DIMACS instance
    Solve {
        /// Path to the DIMACS .col file
        #[arg(short, long)]
        instance: PathBuf,

        /// Number of available colors
        #[arg(short, long)]
        colors: usize,

        /// Pheromone exponent
        #[arg(long, default_value = "3.0")]
        alpha: f64,

        /// Heuristic exponent
        #[arg(long, default_value = "16.0")]
        beta: f64,

        /// Pheromone decay per cycle
        #[arg(long, default_value = "0.7")]
        rho: f64,

        /// Wall-clock cap in seconds
        #[arg(short, long, default_value = "100")]
        time_limit: f64,

        /// Wall-clock cap per tabucol refinement
        #[arg(long, default_value = "0.1")]
        tabucol_time: f64,

        /// Maximum number of cycles
        #[arg(long, default_value = "625")]
        cycles: usize,

        /// Maximum tabucol iterations per refinement
        #[arg(long, default_value = "25")]
        tabucol_cycles: usize,

        /// Ants per cycle
        #[arg(long, default_value = "80")]
        ants: usize,

        /// Pheromone-source alternation period
        #[arg(long, default_value = "25")]
        gap: usize,

        /// Exponent on spill costs in the spill score
        #[arg(long, default_value = "0")]
        spill_cost_importance: f64,

        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Run the per-cycle ant loop in parallel
        #[arg(long)]
        parallel: bool,

        /// Re-color after each spill until the coloring is conflict-free
        #[arg(long)]
        iterate: bool,

        /// Output solution to file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Analyze an instance
    Analyze {
        /// Path to the DIMACS .col file
        #[arg(short, long)]
        instance: PathBuf,

        /// Number of available colors
        #[arg(short, long)]
        colors: usize,
    },

    /// Run benchmarks on a generated instance suite
    Benchmark {
        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Number of runs per algorithm
        #[arg(short, long, default_value = "5")]
        runs: usize,

        /// Time limit per colony run
        #[arg(short, long, default_value = "10")]
        time_limit: f64,

        /// Base seed for instances and runs
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Run the per-cycle ant loop in parallel
        #[arg(long)]
        parallel: bool,
    },

    /// Compare algorithms on an instance
    Compare {
        /// Path to the DIMACS .col file
        #[arg(short, long)]
        instance: PathBuf,

        /// Number of available colors
        #[arg(short, long)]
        colors: usize,

        /// Number of runs
        #[arg(short, long, default_value = "10")]
        runs: usize,

        /// Output CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Solve {
            instance,
            colors,
            alpha,
            beta,
            rho,
            time_limit,
            tabucol_time,
            cycles,
            tabucol_cycles,
            ants,
            gap,
            spill_cost_importance,
            seed,
            parallel,
            iterate,
            output,
            verbose,
        } => {
            let config = ColonyConfig {
                alpha,
                beta,
                rho,
                max_time: time_limit,
                max_tabucol_time: tabucol_time,
                max_cycles: cycles,
                max_tabucol_cycles: tabucol_cycles,
                num_ants: ants,
                gap,
                spill_cost_importance,
                seed,
                parallel,
            };
            solve_instance(&instance, colors, &config, iterate, output, verbose);
        }

        Commands::Analyze { instance, colors } => {
            analyze_instance(&instance, colors);
        }

        Commands::Benchmark {
            output,
            runs,
            time_limit,
            seed,
            parallel,
        } => {
            run_benchmark(&output, runs, time_limit, seed, parallel);
        }

        Commands::Compare {
            instance,
            colors,
            runs,
            output,
        } => {
            compare_algorithms(&instance, colors, runs, output);
        }
    }
}

fn load_instance(path: &PathBuf, colors: usize) -> ColoringInstance {
    match ColoringInstance::from_file(path, colors) {
        Ok(instance) => instance,
        Err(e) => {
            eprintln!("Error loading instance: {}", e);
            std::process::exit(1);
        }
    }
}

fn solve_instance(
    path: &PathBuf,
    colors: usize,
    config: &ColonyConfig,
    iterate: bool,
    output: Option<PathBuf>,
    verbose: bool,
) {
    println!("Loading instance from {:?}...", path);
    let instance = load_instance(path, colors);

    if verbose {
        println!("{}", instance.statistics());
    }

    println!("Coloring with {} colors...", colors);
    let start = Instant::now();

    let result = if iterate {
        solve_to_completion(&instance, config)
    } else {
        solve(&instance, config)
    };
    let coloring = match result {
        Ok(coloring) => coloring,
        Err(e) => {
            eprintln!("Engine error: {}", e);
            std::process::exit(1);
        }
    };

    let elapsed = start.elapsed();

    println!("\n========== Results ==========");
    println!("Algorithm: {}", coloring.algorithm);
    println!("Conflicting edges: {}", coloring.conflicting_edges);
    println!("Conflicting vertices: {}", coloring.conflicting_vertices);
    println!("Spilled vertices: {}", coloring.num_spilled());
    println!("Time: {:.4}s", elapsed.as_secs_f64());
    if let Some(cycles) = coloring.cycles {
        println!("Cycles: {}", cycles);
    }

    if verbose {
        println!("\nColors: {:?}", coloring.colors);
        if coloring.num_spilled() > 0 {
            println!("Spilled: {:?}", coloring.spilled_vertices());
        }
    }

    if let Some(out_path) = output {
        let json = serde_json::to_string_pretty(&coloring).unwrap();
        std::fs::write(&out_path, json).expect("Failed to write output");
        println!("\nSolution saved to {:?}", out_path);
    }
}

fn analyze_instance(path: &PathBuf, colors: usize) {
    let instance = load_instance(path, colors);

    println!("========== Instance Analysis ==========\n");
    println!("{}", instance.statistics());

    // quick estimates from the cheap baselines
    let dsatur = DsaturHeuristic::new().construct(&instance);
    let random = RandomHeuristic::new(42).construct(&instance);

    println!("\nQuick Coloring Estimates:");
    println!(
        "  DSATUR: {} conflicting edges, {} uncolored",
        dsatur.conflicting_edges,
        dsatur.num_spilled()
    );
    println!(
        "  Random: {} conflicting edges, {} uncolored",
        random.conflicting_edges,
        random.num_spilled()
    );
}

fn run_benchmark(output: &PathBuf, runs: usize, time_limit: f64, seed: u64, parallel: bool) {
    let instances = benchmark_suite(seed);
    println!("Benchmarking {} generated instances", instances.len());

    std::fs::create_dir_all(output).expect("Failed to create output directory");

    let config = BenchmarkConfig {
        num_runs: runs,
        time_limit,
        seed,
        parallel_ants: parallel,
    };
    let mut benchmark = Benchmark::new(config);
    benchmark.run_suite(&instances);

    let results_path = output.join("results.csv");
    benchmark
        .export_to_csv(&results_path)
        .expect("Failed to export results");
    println!("Results exported to {:?}", results_path);

    let stats_path = output.join("statistics.csv");
    benchmark
        .export_statistics_csv(&stats_path)
        .expect("Failed to export statistics");
    println!("Statistics exported to {:?}", stats_path);

    let report = benchmark.generate_report();
    println!("\n{}", report);

    let report_path = output.join("report.txt");
    std::fs::write(&report_path, &report).expect("Failed to save report");
    println!("Report saved to {:?}", report_path);
}

fn compare_algorithms(path: &PathBuf, colors: usize, runs: usize, output: Option<PathBuf>) {
    let instance = load_instance(path, colors);

    println!(
        "Comparing algorithms on {} (n={}, k={})...\n",
        instance.name,
        instance.num_vertices(),
        colors
    );

    type Solver = Box<dyn Fn(&ColoringInstance, u64) -> Coloring>;
    let algorithms: Vec<(&str, Solver)> = vec![
        (
            "DSATUR",
            Box::new(|inst: &ColoringInstance, _seed: u64| DsaturHeuristic::new().construct(inst)),
        ),
        (
            "Random",
            Box::new(|inst: &ColoringInstance, seed: u64| {
                RandomHeuristic::new(seed).construct(inst)
            }),
        ),
        (
            "ColorAnt3",
            Box::new(|inst: &ColoringInstance, seed: u64| {
                let config = ColonyConfig {
                    max_cycles: 150,
                    num_ants: 20,
                    max_time: 10.0,
                    seed,
                    ..Default::default()
                };
                match solve(inst, &config) {
                    Ok(coloring) => coloring,
                    Err(e) => {
                        eprintln!("Engine error: {}", e);
                        std::process::exit(1);
                    }
                }
            }),
        ),
    ];

    let mut results: Vec<(String, Vec<usize>, Vec<f64>)> = Vec::new();

    for (name, solver) in &algorithms {
        let mut conflicts = Vec::new();
        let mut times = Vec::new();

        print!("Testing {}... ", name);
        std::io::Write::flush(&mut std::io::stdout()).unwrap();

        for seed in 0..runs as u64 {
            let start = Instant::now();
            let coloring = solver(&instance, seed);
            conflicts.push(coloring.conflicting_edges);
            times.push(start.elapsed().as_secs_f64());
        }

        let avg = conflicts.iter().sum::<usize>() as f64 / conflicts.len() as f64;
        let best = conflicts.iter().min().copied().unwrap_or(0);
        let avg_time = times.iter().sum::<f64>() / times.len() as f64;
        println!("avg={:.2}, best={}, time={:.4}s", avg, best, avg_time);

        results.push((name.to_string(), conflicts, times));
    }

    println!("\n========== Summary ==========");
    println!(
        "{:<15} {:>10} {:>10} {:>10} {:>10}",
        "Algorithm", "Best", "Average", "Worst", "Avg Time"
    );
    println!("{}", "-".repeat(60));

    for (name, conflicts, times) in &results {
        let best = conflicts.iter().min().copied().unwrap_or(0);
        let worst = conflicts.iter().max().copied().unwrap_or(0);
        let avg = conflicts.iter().sum::<usize>() as f64 / conflicts.len() as f64;
        let avg_time = times.iter().sum::<f64>() / times.len() as f64;

        println!(
            "{:<15} {:>10} {:>10.2} {:>10} {:>10.4}",
            name, best, avg, worst, avg_time
        );
    }

    if let Some(out_path) = output {
        let mut csv = String::new();
        csv.push_str("algorithm,run,conflicting_edges,time\n");
        for (name, conflicts, times) in &results {
            for (i, (c, t)) in conflicts.iter().zip(times.iter()).enumerate() {
                csv.push_str(&format!("{},{},{},{:.4}\n", name, i, c, t));
            }
        }
        std::fs::write(&out_path, csv).expect("Failed to write CSV");
        println!("\nResults exported to {:?}", out_path);
    }
}
