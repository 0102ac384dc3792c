use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use moonshot::dsl::ast::Program;
use moonshot::dsl::opcode;
use moonshot::dsl::parser::parse;
use moonshot::settings::{self, SimSettings};
use moonshot::sim::scenario;
use moonshot::sim::{BotSnapshot, World};

// ── CLI argument parsing ─────────────────────────────────────────

#[derive(Parser)]
#[command(name = "moonshot-cli", about = "Bot control language compiler and simulator", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output raw JSON instead of formatted text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a program and report errors
    Check { file: PathBuf },
    /// Compile a program and print its canonical listing
    Disasm { file: PathBuf },
    /// Load a scenario and advance the world
    Run {
        /// Scenario name (defaults to the one in settings)
        #[arg(long)]
        scenario: Option<String>,
        #[arg(long, default_value_t = 60)]
        ticks: u64,
        /// Settings file
        #[arg(long)]
        config: Option<PathBuf>,
        /// Worker thread override
        #[arg(long)]
        workers: Option<usize>,
    },
    /// List registered scenarios
    Scenarios,
    /// Print the instruction reference
    Opcodes,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,moonshot=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    match &cli.command {
        Commands::Check { file } => {
            let program = compile_file(file);
            if cli.json {
                let json = serde_json::json!({
                    "genes": program.len(),
                    "instructions": program.instruction_count(),
                });
                println!("{}", serde_json::to_string_pretty(&json).unwrap_or_default());
            } else {
                println!(
                    "{}: ok, {} genes, {} instructions",
                    file.display(),
                    program.len(),
                    program.instruction_count()
                );
            }
        }
        Commands::Disasm { file } => {
            let program = compile_file(file);
            print!("{program}");
        }
        Commands::Run {
            scenario,
            ticks,
            config,
            workers,
        } => run(scenario.as_deref(), *ticks, config.as_deref(), *workers, cli.json),
        Commands::Scenarios => {
            if cli.json {
                let all: Vec<_> = scenario::scenarios().collect();
                println!("{}", serde_json::to_string_pretty(&all).unwrap_or_default());
            } else {
                for s in scenario::scenarios() {
                    println!("{:<8} {}", s.name, s.description);
                }
            }
        }
        Commands::Opcodes => print_opcodes(cli.json),
    }
}

/// Read and compile a program file, exiting with a located error on failure.
fn compile_file(path: &Path) -> Program {
    let source = fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error: cannot read {}: {e}", path.display());
        process::exit(1);
    });
    parse(&source).unwrap_or_else(|e| {
        eprintln!("{}: {}", path.display(), e.format_with_source(&source));
        process::exit(1);
    })
}

fn load_settings(config: Option<&Path>) -> SimSettings {
    let Some(path) = config else {
        return SimSettings::default();
    };
    match settings::load_settings(path) {
        Ok(Some(s)) => s,
        Ok(None) => {
            eprintln!("Error: settings file {} not found", path.display());
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn run(scenario_name: Option<&str>, ticks: u64, config: Option<&Path>, workers: Option<usize>, raw_json: bool) {
    let mut settings = load_settings(config);
    if let Some(workers) = workers {
        settings.workers = workers;
    }
    let name = scenario_name.map_or_else(|| settings.default_scenario.clone(), str::to_string);

    let result = scenario::find(&name).and_then(|s| {
        let mut world = World::new(&settings)?;
        s.load(&mut world)?;
        Ok(world)
    });
    let mut world = result.unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        process::exit(1);
    });

    world.advance(ticks);

    let snapshots: Vec<BotSnapshot> = world.bots().iter().map(|b| b.snapshot()).collect();
    if raw_json {
        let json = serde_json::json!({ "ticks": world.ticks(), "bots": snapshots });
        println!("{}", serde_json::to_string_pretty(&json).unwrap_or_default());
        return;
    }

    println!("{name}: {} bots after {} ticks", snapshots.len(), world.ticks());
    for snap in &snapshots {
        print_bot(snap);
    }
}

// ── Output formatting ────────────────────────────────────────────

fn print_opcodes(raw_json: bool) {
    if raw_json {
        let rows: Vec<_> = opcode::OPCODES
            .iter()
            .map(|op| {
                serde_json::json!({
                    "mnemonic": op.mnemonic,
                    "family": op.family.name(),
                    "usage": op.usage(),
                    "pops": op.pops,
                    "pushes": op.pushes,
                    "summary": op.summary,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows).unwrap_or_default());
        return;
    }

    let mut family = None;
    for op in &opcode::OPCODES {
        if family != Some(op.family) {
            family = Some(op.family);
            println!();
            println!("{}:", op.family.name());
        }
        println!("  {:<18} {:<12} {}", op.usage(), op.stack_effect(), op.summary);
    }
}

fn print_bot(snap: &BotSnapshot) {
    println!();
    println!("bot ({})", snap.id);
    println!("  Position: ({:.2}, {:.2})", snap.position.x, snap.position.y);
    println!("  Heading:  {}", snap.heading);
    println!("  Velocity: ({:.2}, {:.2})", snap.velocity.x, snap.velocity.y);
    println!("  Energy:   {}", snap.energy);
    println!("  Faults:   {}", snap.faults);

    let registers: Vec<String> = snap.registers.iter().map(ToString::to_string).collect();
    println!("  Registers: {}", registers.join(" "));

    let genes: String = snap.activations.iter().map(|&on| if on { '#' } else { '.' }).collect();
    if !genes.is_empty() {
        println!("  Genes:     {genes}");
    }
}
