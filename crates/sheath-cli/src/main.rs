//! Sheath command-line interface.
//!
//! Run conductor-charging simulations from TOML configuration files:
//! ```sh
//! sheath run job.toml
//! sheath validate job.toml
//! ```
//!
//! Builds run single-rank by default; with the `mpi` feature the binary
//! joins the MPI world it is launched into (`mpiexec -n 8 sheath run …`).

mod config;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sheath_comm::Communicator;

#[derive(Parser)]
#[command(name = "sheath")]
#[command(about = "Sheath: capacitance-matrix conductor charging in a PIC grid")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation from a TOML configuration file.
    Run {
        /// Path to the job configuration file.
        config: PathBuf,
        /// Output directory (overrides config file setting).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file without running the simulation.
    Validate {
        /// Path to the job configuration file.
        config: PathBuf,
    },
}

fn main() {
    env_logger::init();

    #[cfg(feature = "mpi")]
    let (_universe, comm) = sheath_comm::mpi_backend::MpiComm::initialize()
        .expect("MPI environment failed to initialise");
    #[cfg(not(feature = "mpi"))]
    let comm = sheath_comm::SerialComm::new();

    if let Err(err) = dispatch(&comm) {
        // One rank-prefixed line, then abort: nothing in the core is
        // recoverable once a collective or the capacitance setup failed.
        eprintln!("[rank {}] error: {err:#}", comm.rank());
        std::process::exit(1);
    }
}

fn dispatch(comm: &dyn Communicator) -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run { config, output } => {
            let job = config::load_config(&config)?;
            log::info!(
                "running {} on {} rank(s)",
                config.display(),
                comm.size()
            );

            let records = runner::run_simulation(&job, comm)?;

            if comm.rank() == 0 {
                let out_dir = output.unwrap_or_else(|| PathBuf::from(&job.output.directory));
                let csv_path = out_dir.join("potentials.csv");
                runner::write_records_csv(&records, &csv_path)?;
                println!("wrote {}", csv_path.display());
            }
            Ok(())
        }
        Commands::Validate { config } => {
            let _job = config::load_config(&config)?;
            println!("configuration is valid: {}", config.display());
            Ok(())
        }
    }
}
