use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dots_core::{
    CheckpointStore, EvolutionConfig, GenerationReport, GenomeStats, Goal, Layout, Population,
};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

const BENCHMARK_GENERATIONS: u64 = 20;
const TARGET_GPS: f64 = 10.0;

#[derive(Parser)]
#[command(name = "dots")]
#[command(about = "Evolve dots that learn to reach a goal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evolve a population, writing checkpoints and a summary to the output directory
    Run {
        /// Path to config file (JSON); defaults apply to missing fields
        #[arg(long, conflicts_with = "resume")]
        config: Option<PathBuf>,

        /// Output directory for run.json, summary.jsonl and checkpoints
        #[arg(long)]
        out: Option<PathBuf>,

        /// Stop once this many generations have been evolved (default: from config)
        #[arg(long)]
        generations: Option<u64>,

        /// Obstacle layout, e.g. `open`, `two_bars`, `scatter`
        #[arg(long, value_parser = parse_layout, conflicts_with = "resume")]
        layout: Option<Layout>,

        /// Continue from a saved population checkpoint
        #[arg(long)]
        resume: Option<PathBuf>,
    },
    /// Print generation, configuration and genome statistics of a checkpoint
    Inspect {
        /// Path to a population checkpoint
        checkpoint: PathBuf,
    },
    /// Run the performance benchmark suite
    Benchmark,
    /// Dump the default configuration to stdout
    DumpDefaultConfig,
}

fn parse_layout(s: &str) -> Result<Layout, String> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|_| format!("unknown layout {s:?}"))
}

/// Written once to `run.json` at the start of a run.
#[derive(Serialize)]
struct RunManifest<'a> {
    config: &'a EvolutionConfig,
    goal: Goal,
    walls: usize,
    start_generation: u64,
    target_generation: u64,
    resumed_from: Option<&'a Path>,
}

struct RunOutput {
    store: CheckpointStore,
    summary: BufWriter<File>,
}

impl RunOutput {
    fn create(dir: &Path, manifest: &RunManifest<'_>) -> Result<Self> {
        let store = CheckpointStore::open(dir).context("failed to create output directory")?;
        let file = File::create(dir.join("run.json")).context("failed to create run.json")?;
        serde_json::to_writer_pretty(file, manifest).context("failed to write run.json")?;
        let summary = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("summary.jsonl"))
            .context("failed to open summary.jsonl")?;
        Ok(Self {
            store,
            summary: BufWriter::new(summary),
        })
    }

    fn record(&mut self, report: &GenerationReport) -> Result<()> {
        serde_json::to_writer(&mut self.summary, report).context("failed to write summary")?;
        writeln!(self.summary).context("failed to write summary")?;
        Ok(())
    }

    fn checkpoint(&mut self, population: &Population) -> Result<()> {
        self.summary.flush().context("failed to flush summary")?;
        let slot = CheckpointStore::generation_slot(population.generation());
        self.store
            .write(&slot, population)
            .with_context(|| format!("failed to write checkpoint {slot}"))?;
        Ok(())
    }
}

fn load_config(path: Option<&Path>) -> Result<EvolutionConfig> {
    let Some(path) = path else {
        return Ok(EvolutionConfig::default());
    };
    let file = File::open(path).context("failed to open config file")?;
    let reader = BufReader::new(file);
    let config = serde_json::from_reader(reader).context("failed to parse config")?;
    println!("Loaded config from {:?}", path);
    Ok(config)
}

fn run(
    config: Option<PathBuf>,
    out: Option<PathBuf>,
    generations: Option<u64>,
    layout: Option<Layout>,
    resume: Option<PathBuf>,
) -> Result<()> {
    let mut population = match &resume {
        Some(path) => CheckpointStore::read_path(path)
            .with_context(|| format!("failed to resume from {:?}", path))?,
        None => {
            let mut config = load_config(config.as_deref())?;
            if let Some(layout) = layout {
                config.layout = layout;
            }
            config.validate().context("Config validation error")?;
            let goal = Layout::goal(&config);
            Population::new(config, goal).context("failed to initialize population")?
        }
    };
    let config = population.config().clone();
    let field = config.layout.build(&config);
    let start = population.generation();
    let target = generations.unwrap_or(config.generations);
    if target <= start {
        warn!(start, target, "nothing to evolve");
        return Ok(());
    }

    let mut output = match &out {
        Some(dir) => {
            let manifest = RunManifest {
                config: &config,
                goal: *field.goal(),
                walls: field.walls().count(),
                start_generation: start,
                target_generation: target,
                resumed_from: resume.as_deref(),
            };
            Some(RunOutput::create(dir, &manifest)?)
        }
        None => None,
    };

    println!(
        "Evolving {} dots on {:?} from generation {start} to {target}...",
        config.population_size, config.layout
    );
    let started = Instant::now();
    let mut last_checkpoint = None;
    let mut last_report = None;
    while population.generation() < target {
        let evolved = population
            .run_generation(&field)
            .context("generation failed")?;
        let report = evolved.report;
        info!(
            generation = report.generation,
            ticks = report.ticks,
            best_moves = report.best_moves,
            goal_reached = report.goal_reached,
            "generation complete"
        );
        if let Some(output) = output.as_mut() {
            output.record(&report)?;
            if population.generation() % config.checkpoint_interval == 0 {
                output.checkpoint(&population)?;
                last_checkpoint = Some(population.generation());
            }
        }
        last_report = Some(report);
    }
    if let Some(output) = output.as_mut() {
        if last_checkpoint != Some(population.generation()) {
            output.checkpoint(&population)?;
        }
    }

    let elapsed = started.elapsed().as_secs_f64();
    match out {
        Some(dir) => println!("Run complete in {elapsed:.1}s. Results saved to {:?}", dir),
        None => println!("Run complete in {elapsed:.1}s."),
    }
    if let Some(report) = last_report {
        println!(
            "Best dot: {} moves, fitness {:.2}, {} of {} reached the goal",
            report.best_moves, report.best_fitness, report.goal_reached, config.population_size
        );
    }
    Ok(())
}

fn inspect(path: &Path) -> Result<()> {
    let population = CheckpointStore::read_path(path)
        .with_context(|| format!("failed to read checkpoint {:?}", path))?;
    let config = population.config();
    let stats = GenomeStats::collect(population.dots());
    println!("Checkpoint:    {:?}", path);
    println!("Generation:    {}", population.generation());
    println!(
        "Population:    {} dots ({} alive, {} elites)",
        population.len(),
        population.alive_count(),
        population.elites().len()
    );
    println!(
        "Layout:        {:?} ({} x {}), mode {:?}",
        config.layout,
        config.field_width,
        config.field_height,
        population.reproduction_mode()
    );
    println!(
        "Genomes:       min={} max={} mean={:.1}",
        stats.min_len, stats.max_len, stats.mean_len
    );
    Ok(())
}

fn run_benchmark(population_size: usize, layout: Layout) -> Result<()> {
    let mating_pool_size = (population_size / 10).max(1);
    let config = EvolutionConfig {
        population_size,
        mating_pool_size,
        elitism_count: mating_pool_size.min(15),
        layout,
        ..EvolutionConfig::default()
    };
    let field = layout.build(&config);
    let mut population =
        Population::new(config, *field.goal()).context("Benchmark config validation error")?;

    let started = Instant::now();
    let mut total_ticks = 0usize;
    let mut reached = 0usize;
    for _ in 0..BENCHMARK_GENERATIONS {
        let report = population.run_generation(&field)?.report;
        total_ticks += report.ticks;
        reached = report.goal_reached;
    }
    let elapsed = started.elapsed().as_secs_f64();
    let gens_per_sec = BENCHMARK_GENERATIONS as f64 / elapsed;

    println!("--- {population_size} dots, {layout:?} ---");
    println!(
        "  Avg generation: {:.1} ms ({gens_per_sec:.1} generations/sec)",
        elapsed * 1000.0 / BENCHMARK_GENERATIONS as f64
    );
    println!(
        "  Avg ticks:      {:.0}",
        total_ticks as f64 / BENCHMARK_GENERATIONS as f64
    );
    let verdict = if gens_per_sec >= TARGET_GPS {
        "GO"
    } else {
        "NO-GO"
    };
    println!("  Verdict:        {verdict} (target: >={TARGET_GPS} generations/sec)");
    println!("  Goal reached:   {reached}/{population_size}");
    println!();
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::DumpDefaultConfig => {
            let config = EvolutionConfig::default();
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Benchmark => {
            if cfg!(debug_assertions) {
                eprintln!("WARNING: running in debug mode. Results are not representative.");
                eprintln!("         Use: cargo run -p dots-cli --release -- benchmark");
                eprintln!();
            }
            println!("=== Dots Benchmark ===");
            println!("Generations: {BENCHMARK_GENERATIONS}, Target: >={TARGET_GPS} generations/sec");
            println!();

            for layout in [Layout::Open, Layout::CenterBar, Layout::Checkerboard] {
                println!("=== Layout: {:?} ===", layout);
                for size in [100, 500, 2000] {
                    run_benchmark(size, layout)?;
                }
            }
        }
        Commands::Inspect { checkpoint } => inspect(&checkpoint)?,
        Commands::Run {
            config,
            out,
            generations,
            layout,
            resume,
        } => run(config, out, generations, layout, resume)?,
    }
    Ok(())
}
