use branching_rs::branching::{self, BranchLoader};
use branching_rs::error::BranchingError;
use branching_rs::server;
use clap::{Parser, Subcommand};
use dotenv::dotenv;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate a branch expression against recorded step results
    Eval {
        /// Path to the branch expression (JSON or YAML)
        #[arg(short, long)]
        branch: String,

        /// Path to the task results (JSON or YAML)
        #[arg(short, long)]
        results: String,
    },
    /// Print the postfix program for a branch expression
    Compile {
        /// Path to the branch expression (JSON or YAML)
        #[arg(short, long)]
        branch: String,
    },
    /// Serve the evaluation API over HTTP
    Serve {
        /// Port to listen on (defaults to BRANCHING_PORT, then 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<(), BranchingError> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let loader = BranchLoader::new();

    match args.command {
        Commands::Eval { branch, results } => {
            let expr = loader.load_branch(&branch)?;
            let results = loader.load_results(&results)?;
            log::info!("Evaluating {} against {} step result(s)", branch, results.len());

            let value = branching::evaluate_branch(&results, &expr)?;
            println!("{}", serde_json::to_string(&value)?);
        }
        Commands::Compile { branch } => {
            let expr = loader.load_branch(&branch)?;
            println!("{}", branching::render(&branching::compile(&expr)));
        }
        Commands::Serve { port } => {
            let port = match port {
                Some(p) => p,
                None => server::port_from_env()?,
            };
            server::serve(port).await?;
        }
    }

    Ok(())
}
