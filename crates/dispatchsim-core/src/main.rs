//! DispatchSim CLI — Compare load-balancer dispatch policies in virtual time.

use clap::{Args, Parser, Subcommand};
use dispatchsim_core::config::SimConfig;
use dispatchsim_core::{metrics, sweep, PolicyKind, Simulation};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "dispatchsim",
    about = "Simulate and compare load-balancer dispatch policies",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Settings shared by every simulation subcommand. Flags override the
/// config file, which overrides the built-in defaults.
#[derive(Args)]
struct RunArgs {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Random seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Virtual-time horizon.
    #[arg(long)]
    horizon: Option<f64>,
    /// Number of servers.
    #[arg(short = 'n', long)]
    servers: Option<u32>,
    /// Comma-separated server speeds.
    #[arg(long, value_delimiter = ',')]
    speeds: Option<Vec<f64>>,
    /// Maximum queue length per server.
    #[arg(long)]
    queue_capacity: Option<usize>,
    /// EMA smoothing factor for response times.
    #[arg(long)]
    smoothing_factor: Option<f64>,
    /// Output results to JSON file.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation with a single policy.
    Run {
        #[command(flatten)]
        args: RunArgs,
        /// Dispatch policy name.
        #[arg(short, long)]
        policy: Option<String>,
        /// Arrival rate (requests per time unit).
        #[arg(short, long)]
        rate: Option<f64>,
    },
    /// Compare several policies on the same config.
    Compare {
        #[command(flatten)]
        args: RunArgs,
        /// Comma-separated list of policy names (default: all).
        #[arg(short = 'P', long, value_delimiter = ',')]
        policies: Vec<String>,
        /// Arrival rate (requests per time unit).
        #[arg(short, long)]
        rate: Option<f64>,
    },
    /// Sweep arrival rates for one or more policies.
    Sweep {
        #[command(flatten)]
        args: RunArgs,
        /// Comma-separated list of policy names (default: all).
        #[arg(short = 'P', long, value_delimiter = ',')]
        policies: Vec<String>,
        /// Lowest arrival rate.
        #[arg(long, default_value = "0.2")]
        from: f64,
        /// Highest arrival rate.
        #[arg(long, default_value = "4.0")]
        to: f64,
        /// Number of evenly spaced rates.
        #[arg(long, default_value = "40")]
        steps: usize,
    },
    /// List available dispatch policies.
    ListPolicies,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { args, policy, rate } => {
            let mut sim_config = load_config(&args);
            if let Some(policy) = policy {
                sim_config.simulation.policy = policy;
            }
            if let Some(rate) = rate {
                sim_config.workload.arrival_rate = rate;
            }

            let mut sim = Simulation::new(sim_config).unwrap_or_else(|e| fail("config", e));
            let result = sim.run().unwrap_or_else(|e| fail("simulation", e));
            println!("{}", metrics::format_table(&result));

            if let Some(output_path) = &args.output {
                write_json(output_path, &result);
            }
        }
        Commands::Compare {
            args,
            policies,
            rate,
        } => {
            let mut sim_config = load_config(&args);
            if let Some(rate) = rate {
                sim_config.workload.arrival_rate = rate;
            }
            let kinds = parse_policies(&policies);

            let results = sweep::compare_policies(&sim_config, &kinds)
                .unwrap_or_else(|e| fail("simulation", e));
            println!("{}", metrics::format_comparison_table(&results));

            for result in &results {
                println!("{}", metrics::format_table(result));
            }

            if let Some(output_path) = &args.output {
                write_json(output_path, &results);
            }
        }
        Commands::Sweep {
            args,
            policies,
            from,
            to,
            steps,
        } => {
            let sim_config = load_config(&args);
            let kinds = parse_policies(&policies);
            let rates = sweep::linspace(from, to, steps);

            let points = sweep::sweep_arrival_rates(&sim_config, &kinds, &rates)
                .unwrap_or_else(|e| fail("simulation", e));
            println!("{}", sweep::format_sweep_table(&points));

            if let Some(output_path) = &args.output {
                write_json(output_path, &points);
            }
        }
        Commands::ListPolicies => {
            println!("Available dispatch policies:");
            for name in dispatchsim_policies::available_policies() {
                println!("  - {}", name);
            }
        }
    }
}

fn fail(what: &str, e: impl std::fmt::Display) -> ! {
    eprintln!("Error in {}: {}", what, e);
    std::process::exit(1);
}

fn load_config(args: &RunArgs) -> SimConfig {
    let mut config = match &args.config {
        Some(path) => SimConfig::from_file(path).unwrap_or_else(|e| fail("config", e)),
        None => SimConfig::default(),
    };

    if let Some(seed) = args.seed {
        config.simulation.seed = seed;
    }
    if let Some(horizon) = args.horizon {
        config.simulation.horizon = horizon;
    }
    if let Some(servers) = args.servers {
        config.cluster.num_servers = servers;
        // File speeds no longer line up with a new server count.
        if args.speeds.is_none() {
            config.cluster.speeds = None;
        }
    }
    if let Some(speeds) = &args.speeds {
        config.cluster.speeds = Some(speeds.clone());
    }
    if let Some(capacity) = args.queue_capacity {
        config.cluster.queue_capacity = Some(capacity);
    }
    if let Some(alpha) = args.smoothing_factor {
        config.cluster.smoothing_factor = alpha;
    }
    config
}

fn parse_policies(names: &[String]) -> Vec<PolicyKind> {
    if names.is_empty() {
        return PolicyKind::ALL.to_vec();
    }
    names
        .iter()
        .map(|name| {
            name.parse::<PolicyKind>().unwrap_or_else(|e| {
                eprintln!(
                    "{}. Available: {:?}",
                    e,
                    dispatchsim_policies::available_policies()
                );
                std::process::exit(1);
            })
        })
        .collect()
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) {
    let json = serde_json::to_string_pretty(value).unwrap_or_else(|e| fail("serialization", e));
    std::fs::write(path, json).unwrap_or_else(|e| fail("output", e));
    println!("Results written to {}", path.display());
}
