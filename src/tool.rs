// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! CLI tool for inspecting Maglev lookup tables

use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use humansize::{SizeFormatter, BINARY};
use maglev_table::{Config, Maglev, NodeIndex};
use rustyline::DefaultEditor;
use std::cell::Cell;
use std::io::{self, BufRead, IsTerminal, Write};
use tracing_subscriber::{
    filter::{EnvFilter, LevelFilter},
    prelude::*,
    registry::Registry,
};

macro_rules! die {
    ($fmt:literal, $($arg:tt)*) => {{
        eprintln!($fmt, $($arg)*);
        std::process::exit(1);
    }};

    ($msg:literal) => {{
        eprintln!($msg);
        std::process::exit(1);
    }};

    () => {{
        eprintln!("Program terminated unexpectedly");
        std::process::exit(1);
    }};
}

#[allow(unused_imports)]
use tracing::{debug, error, info, trace, warn};

pub fn init_tracing(quiet: bool, verbose: u8) -> (bool, LevelFilter) {
    let is_verbose = !quiet && verbose > 0;

    let level_filter = if quiet {
        LevelFilter::ERROR
    } else {
        match verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    };

    // Bridge log crate macros to tracing (the library only uses log::*)
    tracing_log::LogTracer::init().expect("Failed to set log tracer");

    let registry = Registry::default();

    let env_filter = EnvFilter::builder()
        .with_default_directive(level_filter.into())
        .with_env_var("MAGLEV_LOG")
        .from_env_lossy()
        .add_directive(
            "rustyline=warn"
                .parse()
                .expect("Failed to parse rustyline directive"),
        );

    let subscriber = registry.with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .compact(),
    );

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        die!("INTERNAL ERROR: setting default tracing::subscriber failed");
    }

    let prev_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing_panic::panic_hook(info);
        prev_hook(info); // daisy-chain to old panic hook
    }));

    (is_verbose, level_filter)
}

/// CLI tool for inspecting Maglev lookup tables
#[derive(Parser, Debug)]
#[command(name = "maglev")]
#[command(about = "CLI tool for inspecting Maglev lookup tables")]
struct ToolArgs {
    /// Suppress all output except for errors. This overrides the -v flag.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Turn on verbose output. Supply -v multiple times to increase verbosity.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Number of backend nodes
    #[arg(short, long, value_name = "N")]
    nodes: u32,

    /// Number of lookup table slots, must be a prime greater than N
    /// (defaults to the smallest prime >= 5 * N)
    #[arg(short = 'm', long, value_name = "M")]
    table_size: Option<u32>,

    /// Command to run (if omitted, starts interactive shell)
    #[command(subcommand)]
    command: Option<ToolCommand>,
}

#[derive(Subcommand, Debug, Clone)]
enum ToolCommand {
    /// Show which node a key is routed to
    Lookup {
        /// The key to look up
        key: String,
    },
    /// Measure how many slots keep their node when a node goes down
    Remove {
        /// The node to take down
        node: NodeIndex,
    },
    /// Measure how many slots keep their node when a node comes up
    Add {
        /// The node to bring up
        node: NodeIndex,
    },
    /// Show how slots are distributed over the active nodes
    #[command(visible_alias = "distribution")]
    Dist,
    /// Show table statistics
    Info,
}

// Internal shell commands, include all external tool commands
#[derive(Parser, Debug)]
#[command(name = "")]
#[command(no_binary_name = true)]
#[command(disable_version_flag = true)]
#[command(help_template = "
{version}

Available Commands:

{subcommands}

Use `help COMMAND` or `COMMAND --help` for more details.

")]

struct ShellArgs {
    #[command(subcommand)]
    command: ShellCommand,
}

// Shell commands (including ones not available from CLI)
#[derive(Subcommand, Debug, Clone)]
enum ShellCommand {
    #[command(flatten)]
    ToolCmd(ToolCommand),

    /// Mark a node as active (takes effect on `build`)
    Up {
        /// The node to bring up
        node: NodeIndex,
    },
    /// Mark a node as inactive (takes effect on `build`)
    Down {
        /// The node to take down
        node: NodeIndex,
    },
    /// Rebuild and publish the lookup table
    Build,
    /// Exit the current shell
    #[command(visible_alias = "quit")]
    Exit,
}

/// Which membership change an experiment measures
#[derive(Copy, Clone, Debug)]
enum Experiment {
    Remove,
    Add,
}

struct Session {
    maglev: Maglev,

    /// Whether liveness changed since the last build
    dirty: Cell<bool>,
}

impl Session {
    fn open(node_count: u32, table_size: Option<u32>) -> maglev_table::Result<Self> {
        let config = Config::new(node_count);

        let config = if let Some(table_size) = table_size {
            config.table_size(table_size)
        } else {
            config
        };

        Ok(Self {
            maglev: config.open()?,
            dirty: Cell::new(false),
        })
    }
}

fn handle_lookup(session: &Session, key: &str) {
    match session.maglev.lookup(key) {
        Some(node) => println!("{}", node),
        None => println!("(no table)"),
    }
}

fn handle_set_active(session: &Session, node: NodeIndex, active: bool) {
    match session.maglev.set_active(node, active) {
        Ok(()) => {
            session.dirty.set(true);
            println!("OK (pending, run `build` to publish)");
        }
        Err(e) => eprintln!("Error: {}", e),
    }
}

fn handle_build(session: &Session) {
    match session.maglev.build() {
        Ok(table) => {
            session.dirty.set(false);
            println!("OK ({} slots)", table.len());
        }
        Err(e) => eprintln!("Error: {}", e),
    }
}

/// Builds a table, flips `node` and rebuilds, on a fresh table of the same shape.
fn run_experiment(
    session: &Session,
    node: NodeIndex,
    experiment: Experiment,
) -> maglev_table::Result<()> {
    let maglev = Maglev::new(session.maglev.node_count(), session.maglev.table_size())?;

    if let Experiment::Add = experiment {
        maglev.down(node)?;
    }
    let before = maglev.build()?;

    match experiment {
        Experiment::Remove => maglev.down(node)?,
        Experiment::Add => maglev.up(node)?,
    }
    let after = maglev.build()?;

    let changed = before.diff(&after);
    let moved_elsewhere = changed
        .iter()
        .filter(|&&slot| before.get(slot) != Some(node) && after.get(slot) != Some(node))
        .count();

    debug!(?experiment, node, changed = changed.len(), "experiment finished");

    println!(
        "consistent rate: {:.4}% ({} of {} slots changed, {} not involving node {})",
        before.unchanged_ratio(&after) * 100.0,
        changed.len(),
        after.len(),
        moved_elsewhere,
        node,
    );

    Ok(())
}

fn handle_experiment(session: &Session, node: NodeIndex, experiment: Experiment) {
    if let Err(e) = run_experiment(session, node, experiment) {
        eprintln!("Error: {}", e);
    }
}

fn handle_dist(session: &Session) {
    let table = session.maglev.table();
    let dist = table.distribution();

    let active = session.maglev.active_nodes();
    let counts = active
        .iter()
        .map(|node| dist.get(node).copied().unwrap_or_default())
        .collect::<Vec<_>>();

    let (Some(min), Some(max)) = (counts.iter().min(), counts.iter().max()) else {
        println!("(no active nodes)");
        return;
    };

    #[allow(clippy::cast_precision_loss)]
    let mean = counts.iter().sum::<usize>() as f64 / counts.len() as f64;

    println!("Active nodes: {}", active.len());
    println!("Slots per node: min={} max={} mean={:.2}", min, max, mean);

    let starved = counts.iter().filter(|&&count| count == 0).count();
    if starved > 0 {
        println!("Active nodes without slots: {}", starved);
    }
    if session.dirty.get() {
        eprintln!("Warning: liveness changes are pending, run `build` to publish");
    }
}

fn print_info(session: &Session) {
    let maglev = &session.maglev;
    let table = maglev.table();

    println!("Nodes: {}", maglev.node_count());
    println!("Active nodes: {}", maglev.active_count());
    println!("Table size: {}", maglev.table_size());
    println!("Unassigned slots: {}", table.unassigned_count());
    println!(
        "Permutation memory: {}",
        SizeFormatter::new(maglev.permutation().size(), BINARY)
    );
    println!("Table memory: {}", SizeFormatter::new(table.size(), BINARY));
    if session.dirty.get() {
        println!("Pending liveness changes: yes");
    }
}

/// Result of executing a command
enum CommandResult {
    Continue,
    Exit,
}

/// Execute a parsed command
fn execute_command(session: &Session, cmd: ToolCommand) -> CommandResult {
    match cmd {
        ToolCommand::Lookup { key } => handle_lookup(session, &key),
        ToolCommand::Remove { node } => handle_experiment(session, node, Experiment::Remove),
        ToolCommand::Add { node } => handle_experiment(session, node, Experiment::Add),
        ToolCommand::Dist => handle_dist(session),
        ToolCommand::Info => print_info(session),
    }
    CommandResult::Continue
}

/// Execute a shell-only command
fn execute_shell_command(session: &Session, cmd: ShellCommand) -> CommandResult {
    match cmd {
        ShellCommand::ToolCmd(tool_cmd) => return execute_command(session, tool_cmd),
        ShellCommand::Up { node } => handle_set_active(session, node, true),
        ShellCommand::Down { node } => handle_set_active(session, node, false),
        ShellCommand::Build => handle_build(session),
        ShellCommand::Exit => {
            if session.dirty.get() {
                eprintln!("Warning: discarding unpublished liveness changes");
            }
            return CommandResult::Exit;
        }
    }
    CommandResult::Continue
}

/// Parse and run a shell command line
fn run_shell_command(session: &Session, line: &str) -> CommandResult {
    let line = line.trim();
    if line.is_empty() {
        return CommandResult::Continue;
    }

    let tokens = match shlex::split(line) {
        Some(t) if !t.is_empty() => t,
        Some(_) => return CommandResult::Continue,
        None => {
            eprintln!("error: unclosed quote");
            return CommandResult::Continue;
        }
    };

    match ShellArgs::try_parse_from(&tokens) {
        Ok(args) => execute_shell_command(session, args.command),
        Err(e) => {
            // Print clap's error message
            eprintln!("{}", e);
            CommandResult::Continue
        }
    }
}

fn run_shell(session: &Session) {
    if io::stdin().is_terminal() {
        run_shell_interactive(session);
    } else {
        run_shell_non_interactive(session);
    }
}

fn run_shell_interactive(session: &Session) {
    println!("Welcome to the Maglev shell");
    println!("Type 'help' for available commands, 'exit' to quit.\n");

    let mut rl = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("Error initializing line editor: {}", e);
            return;
        }
    };

    loop {
        match rl.readline("maglev> ") {
            Ok(line) => {
                let _ = rl.add_history_entry(&line);
                if let CommandResult::Exit = run_shell_command(session, &line) {
                    break;
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                // Ignore Ctrl+C, just show a new prompt
                continue;
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!();
                break;
            }
            Err(e) => {
                eprintln!("Error reading input: {}", e);
                break;
            }
        }
    }
}

fn run_shell_non_interactive(session: &Session) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        if stdout.flush().is_err() {
            die!("can't flush stdout");
        }

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => {
                // EOF
                break;
            }
            Ok(_) => {
                if let CommandResult::Exit = run_shell_command(session, &line) {
                    break;
                }
            }
            Err(e) => {
                die!("Error reading input: {}", e);
            }
        }
    }
}

fn main() {
    let args = ToolArgs::parse();
    let (verbose, level_filter) = init_tracing(args.quiet, args.verbose);

    let cmd = ToolArgs::command();

    info!(
        "starting {} ({} {}), log level: {level_filter}",
        cmd.get_name(),
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let session = match Session::open(args.nodes, args.table_size) {
        Ok(s) => s,
        Err(e) => {
            let note = if verbose {
                ""
            } else {
                ". Note: Use -v (one or multiple times) for more information"
            };
            die!("Error creating table: {}{}", e, note);
        }
    };

    match args.command {
        Some(cmd) => {
            execute_command(&session, cmd);
        }
        None => run_shell(&session),
    }
}
