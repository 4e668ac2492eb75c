use std::process::ExitCode;
use std::sync::Arc;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing::info;
use tracing_subscriber::EnvFilter;

use biogene::app::{GeneService, ReturnCode};
use biogene::cache::CacheLayer;
use biogene::config::{Config, ConfigLoader};
use biogene::domain::{Organism, Query};
use biogene::error::BiogeneError;
use biogene::eutils::EutilsHttpClient;
use biogene::mapping::load_mapping_file;
use biogene::output::{JsonOutput, LookupOutput};
use biogene::populate::{PopulateReport, PopulateSettings};

#[derive(Parser)]
#[command(name = "biogene")]
#[command(about = "Entrez Gene lookup with a layered in-memory cache")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Resolve a gene query and print matching records")]
    Lookup(LookupArgs),
    #[command(about = "Fetch the PubMed record behind a GeneRIF")]
    Abstract(AbstractArgs),
}

#[derive(Args)]
struct LookupArgs {
    query: String,

    #[arg(long = "org", default_value = "Homo sapiens")]
    organism: String,

    #[arg(long, default_value_t = 0)]
    offset: usize,

    #[arg(long, default_value_t = 10)]
    limit: usize,

    #[arg(long)]
    mapping: Option<Utf8PathBuf>,

    #[command(flatten)]
    populate: PopulateArgs,
}

#[derive(Args)]
struct PopulateArgs {
    // Bare `--populate` primes the organisms from the config file.
    #[arg(long = "populate", value_name = "ORG:ORG", num_args = 0..=1, default_missing_value = "")]
    organisms: Option<String>,

    #[arg(long, allow_negative_numbers = true, requires = "organisms")]
    retstart: Option<i64>,

    #[arg(long, allow_negative_numbers = true, requires = "organisms")]
    fetch: Option<i64>,

    #[arg(long, allow_negative_numbers = true, requires = "organisms")]
    total: Option<i64>,

    #[arg(long = "delay-ms", allow_negative_numbers = true, requires = "organisms")]
    delay: Option<i64>,
}

#[derive(Args)]
struct AbstractArgs {
    pubmed_id: String,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<BiogeneError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &BiogeneError) -> u8 {
    match error {
        BiogeneError::GeneNotFound(_) => 2,
        BiogeneError::LookupFailed(_) => 3,
        error if error.is_transport() => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ConfigLoader::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::Lookup(args) => run_lookup(args, &config),
        Commands::Abstract(args) => {
            let client = EutilsHttpClient::new(&config.eutils)?;
            let body = client.fetch_abstract(&args.pubmed_id)?;
            println!("{body}");
            Ok(())
        }
    }
}

type HttpGeneService = GeneService<EutilsHttpClient, EutilsHttpClient>;

fn build_app(config: &Config) -> Result<HttpGeneService, BiogeneError> {
    let client = EutilsHttpClient::new(&config.eutils)?;
    Ok(GeneService::new(client.clone(), client, Arc::new(CacheLayer::new())))
}

// The cache lives as long as this process, so mapping and populate runs only
// pay off for the lookup they precede.
fn run_lookup(args: LookupArgs, config: &Config) -> miette::Result<()> {
    let query: Query = args.query.parse()?;
    let organism: Organism = args.organism.parse()?;
    let app = build_app(config)?;

    let mapping = match args.mapping.as_ref().or(config.uniprot_mapping_path.as_ref()) {
        Some(path) => Some(load_mapping_file(path, app.cache())?),
        None => None,
    };
    let populate = if args.populate.organisms.is_some() {
        run_populate(&app, args.populate, config)?
    } else {
        Vec::new()
    };

    let lookup = app.resolve_and_fetch(&query, &organism, args.offset, args.limit);
    JsonOutput::print_lookup(&LookupOutput {
        lookup: &lookup,
        cache: app.cache_stats(),
        mapping,
        populate,
    })
    .into_diagnostic()?;
    match lookup.code {
        ReturnCode::Success => Ok(()),
        ReturnCode::IdNotFound => Err(BiogeneError::GeneNotFound(query.to_string()).into()),
        ReturnCode::Failure => Err(BiogeneError::LookupFailed(query.to_string()).into()),
    }
}

fn run_populate(
    app: &HttpGeneService,
    args: PopulateArgs,
    config: &Config,
) -> Result<Vec<PopulateReport>, BiogeneError> {
    let mut populate = config.populate.clone();
    if let Some(organisms) = args.organisms.filter(|organisms| !organisms.trim().is_empty()) {
        populate.organisms = organisms;
    }
    if let Some(retstart) = args.retstart {
        populate.retstart = retstart;
    }
    if let Some(fetch) = args.fetch {
        populate.fetch = fetch;
    }
    if let Some(total) = args.total {
        populate.total = total;
    }
    if let Some(delay) = args.delay {
        populate.delay_ms = delay;
    }

    let organisms = populate.organisms()?;
    if organisms.is_empty() {
        return Err(BiogeneError::InvalidOrganism(populate.organisms));
    }
    let template = PopulateSettings::from_config(Organism::All, &populate);

    info!(count = organisms.len(), "populating cache before lookup");
    app.populate_organisms(&organisms, &template)?
        .into_iter()
        .map(|handle| handle.join())
        .collect()
}
