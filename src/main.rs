use azure_compute_utilization::build_aggregator;
use azure_compute_utilization::config::Config;
use azure_compute_utilization::output::print_utilization;
use azure_compute_utilization::server::{serve, ServerState};
use clap::{Parser, Subcommand};
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use uuid::Uuid;

const LOG_CONFIG: &str = "log4rs.yml";

#[derive(Parser)]
#[command(version, about = "Azure compute quota, reservation and usage per VM family")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve GET /{subscriptionId}/ComputeUtilization/{location}/{vmType} (default)
    Serve {
        /// Overrides UTILIZATION_BIND_ADDR
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Print the utilization of one VM family and exit
    Query {
        subscription_id: Uuid,
        location: String,
        vm_type: String,
        /// Print the endpoint JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Do as little as possible in main.rs as it can't contain any tests
    dotenv::dotenv().ok();
    init_logging();
    log::info!("#Start main()");

    let cli = Cli::parse();
    let mut config = Config::from_env()?;

    match cli.command.unwrap_or(Commands::Serve { bind: None }) {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.bind_addr = bind;
            }
            let aggregator = build_aggregator(&config).await?;
            serve(config.bind_addr, ServerState::new(Arc::new(aggregator))).await?;
        }
        Commands::Query {
            subscription_id,
            location,
            vm_type,
            json,
        } => {
            let aggregator = build_aggregator(&config).await?;
            let response = aggregator
                .compute_utilization(subscription_id, &location, &vm_type)
                .await?;
            print_utilization(&response, json)?;
        }
    }

    Ok(())
}

fn init_logging() {
    use log4rs::append::console::{ConsoleAppender, Target};
    use log4rs::config::{Appender, Root};
    use log4rs::encode::pattern::PatternEncoder;

    let Err(e) = log4rs::init_file(LOG_CONFIG, Default::default()) else {
        return;
    };

    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} {h({l})} {t} - {m}{n}",
        )))
        .build();
    let fallback = log4rs::Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(log::LevelFilter::Info));
    match fallback {
        Ok(fallback) => {
            if log4rs::init_config(fallback).is_ok() {
                log::warn!("{LOG_CONFIG} not loaded ({e}), logging to stderr");
            }
        }
        Err(errors) => eprintln!("Error initializing log4rs: {e}; fallback: {errors}"),
    }
}
