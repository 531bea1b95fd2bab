use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Builder;
use log::{debug, error, info, trace, warn, LevelFilter};
use particle_common::SimulationConfig;
use particle_interactions::render::{self, Command, TerminalSession};
use particle_interactions::Simulation;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Ticks run in headless mode when neither the config nor the CLI sets a limit.
const DEFAULT_HEADLESS_TICKS: u64 = 1000;
/// Universe size used when the terminal cannot be queried.
const FALLBACK_TERMINAL_SIZE: (u16, u16) = (80, 24);
/// Seconds between status lines in headless mode.
const STATUS_INTERVAL_SECS: f64 = 5.0;

#[derive(Parser, Debug)]
#[command(author, version, about = "Particle interactions in a terminal", long_about = None)]
struct Args {
    /// TOML configuration file; built-in defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of particles created at every reset
    #[arg(short = 'n', long)]
    count: Option<u32>,

    /// Preset: 1 hunt, 2 stratification, 3 chaos, 4 alliances, 5 clustering
    #[arg(short, long)]
    preset: Option<u32>,

    /// Enable random events
    #[arg(long, conflicts_with = "no_events")]
    events: bool,

    /// Disable random events
    #[arg(long)]
    no_events: bool,

    /// Universe width in cells (defaults to the terminal width)
    #[arg(long)]
    width: Option<u32>,

    /// Universe height in cells (defaults to the terminal height)
    #[arg(long)]
    height: Option<u32>,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Delay between ticks in milliseconds
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Stop after this many ticks
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Run without the terminal renderer
    #[arg(long)]
    headless: bool,

    /// Where to write the statistics CSV
    #[arg(long)]
    stats_csv: Option<String>,

    /// Where to write the statistics JSON
    #[arg(long)]
    stats_json: Option<String>,
}

impl Args {
    fn apply(&self, config: &mut SimulationConfig) {
        if let Some(count) = self.count {
            config.initial_conditions.particle_count = count;
        }
        if let Some(preset) = self.preset {
            config.initial_conditions.preset = preset;
        }
        if self.events {
            config.events.enabled = true;
        }
        if self.no_events {
            config.events.enabled = false;
        }
        if let Some(width) = self.width {
            config.universe.width = width;
        }
        if let Some(height) = self.height {
            config.universe.height = height;
        }
        if self.seed.is_some() {
            config.initial_conditions.seed = self.seed;
        }
        if let Some(tick_ms) = self.tick_ms {
            config.timing.tick_ms = tick_ms;
        }
        if self.max_ticks.is_some() {
            config.timing.max_ticks = self.max_ticks;
        }
        if self.stats_csv.is_some() {
            config.output.stats_csv = self.stats_csv.clone();
        }
        if self.stats_json.is_some() {
            config.output.stats_json = self.stats_json.clone();
        }
    }
}

fn load_config(args: &Args) -> Result<SimulationConfig> {
    let mut config = match &args.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };
    args.apply(&mut config);

    if !config.universe.is_resolved() {
        let (cols, rows) = render::terminal_size().unwrap_or_else(|e| {
            warn!("{:#}; using {}x{}.", e, FALLBACK_TERMINAL_SIZE.0, FALLBACK_TERMINAL_SIZE.1);
            FALLBACK_TERMINAL_SIZE
        });
        config.universe.resolve_with(cols, rows);
    }
    config.validate_resolved().context("invalid configuration")?;
    Ok(config)
}

fn run_headless(sim: &mut Simulation) {
    let total_ticks = sim.config().timing.max_ticks.unwrap_or(DEFAULT_HEADLESS_TICKS);
    info!("Running {} ticks headless...", total_ticks);

    let start_time = Instant::now();
    let mut previous_print_time = start_time;

    for tick in 0..total_ticks {
        let step_start_time = Instant::now();
        sim.step();
        let step_duration = step_start_time.elapsed();

        let now = Instant::now();
        let is_last_tick = tick + 1 == total_ticks;
        if now.duration_since(previous_print_time).as_secs_f64() >= STATUS_INTERVAL_SECS || is_last_tick {
            info!(
                "Tick [{}/{}] | Particles: {} | Events: {} | Step Time: {:6.3} ms | Elapsed: {:.2} s",
                tick + 1,
                total_ticks,
                sim.particle_count(),
                sim.statistics().total_random_events,
                step_duration.as_secs_f64() * 1000.0,
                start_time.elapsed().as_secs_f64()
            );
            previous_print_time = now;
        } else {
            trace!("Tick [{}/{}] completed in {:.3} ms", tick + 1, total_ticks, step_duration.as_secs_f64() * 1000.0);
        }

        if sim.particle_count() == 0 {
            warn!("Population died out at tick {}.", tick + 1);
            break;
        }
    }
}

fn run_live(sim: &mut Simulation) -> Result<()> {
    let tick_interval = Duration::from_millis(sim.config().timing.tick_ms);
    let max_ticks = sim.config().timing.max_ticks;
    let mut session = TerminalSession::start()?;
    let mut paused = false;

    session.draw(&render::compose_frame(&sim.snapshot()))?;
    loop {
        match session.poll_command(tick_interval)? {
            Some(Command::Quit) => break,
            Some(Command::Reset) => {
                sim.reset();
                session.draw(&render::compose_frame(&sim.snapshot()))?;
                continue;
            }
            Some(Command::TogglePause) => {
                paused = !paused;
                debug!("Paused: {}", paused);
                continue;
            }
            None => {}
        }
        if paused {
            continue;
        }

        sim.step();
        session.draw(&render::compose_frame(&sim.snapshot()))?;

        if max_ticks.is_some_and(|limit| sim.tick() >= limit) {
            break;
        }
    }
    Ok(())
}

fn report(sim: &Simulation) {
    let Some(summary) = sim.summary() else {
        info!("No particles left; nothing to summarise.");
        return;
    };
    let output = &sim.config().output;

    if output.print_summary {
        println!("{}", summary);
    }
    if let Some(path) = &output.stats_csv {
        match summary.write_csv(path) {
            Ok(()) => info!("Statistics saved to {}", path),
            Err(e) => error!("{:#}", e),
        }
    }
    if let Some(path) = &output.stats_json {
        match summary.write_json(path) {
            Ok(()) => info!("Statistics saved to {}", path),
            Err(e) => error!("{:#}", e),
        }
    }
}

fn main() -> Result<()> {
    Builder::new().filter_level(LevelFilter::Info).parse_default_env().init();

    let args = Args::parse();
    info!("Starting particle interactions...");

    let config = load_config(&args)?;
    let mut sim = Simulation::new(config)?;
    debug!("Simulation parameters: {:#?}", sim.params());

    if args.headless {
        run_headless(&mut sim);
    } else {
        run_live(&mut sim)?;
    }

    info!("Finished after {} ticks with {} particles.", sim.tick(), sim.particle_count());
    report(&sim);
    Ok(())
}
