use clap::Parser;
use hickory_proto::op::Message;
use hickory_proto::rr::RecordType;
use rootwalk_domain::CliOverrides;
use rootwalk_infrastructure::dns::{QueryBuilder, RecursiveResolver};
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Instant;
use tracing::info;

mod bootstrap;

#[derive(Parser)]
#[command(name = "rootwalk")]
#[command(version)]
#[command(about = "Resolve a name iteratively, starting from the root servers")]
struct Cli {
    /// Domain name to resolve
    name: String,

    /// Record type (A, AAAA, NS, MX, TXT, ...)
    #[arg(short = 't', long = "type", default_value = "A")]
    record_type: String,

    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// Trace every step of the walk
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Recursive resolver used for nameservers without glue
    #[arg(long, value_name = "ADDR")]
    glue_resolver: Option<SocketAddr>,

    /// Per-exchange timeout in milliseconds
    #[arg(long, value_name = "N")]
    timeout_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let overrides = CliOverrides {
        log_level: cli.log_level.clone(),
        verbose: cli.verbose,
        glue_resolver: cli.glue_resolver,
        query_timeout: cli.timeout_ms,
    };
    let config = bootstrap::load_config(cli.config.as_deref(), overrides)?;

    bootstrap::init_logging(&config);

    let record_type = RecordType::from_str(&cli.record_type.to_ascii_uppercase())
        .map_err(|e| anyhow::anyhow!("unknown record type '{}': {}", cli.record_type, e))?;
    let question = QueryBuilder::question(&cli.name, record_type)?;

    info!(
        domain = %question.name(),
        record_type = %record_type,
        "Starting rootwalk v{}",
        env!("CARGO_PKG_VERSION")
    );

    let resolver = RecursiveResolver::new(&config.resolver);
    let mut message = QueryBuilder::build(&question, true);

    let started = Instant::now();
    resolver.resolve(&mut message).await;
    let elapsed = started.elapsed();

    print_message(&message);

    let stats = resolver.stats();
    println!(
        ";; {} in {} ms, {} exchanges ({} over TCP), {} cache hits",
        message.response_code(),
        elapsed.as_millis(),
        stats.network_exchanges,
        stats.tcp_retries,
        stats.cache_hits,
    );

    Ok(())
}

fn print_message(message: &Message) {
    println!(
        ";; id: {}, status: {}, answers: {}",
        message.id(),
        message.response_code(),
        message.answers().len()
    );
    println!(";; QUESTION SECTION:");
    for query in message.queries() {
        println!(";{}", query);
    }
    if !message.answers().is_empty() {
        println!();
        println!(";; ANSWER SECTION:");
        for record in message.answers() {
            println!("{}", record);
        }
    }
    println!();
}
