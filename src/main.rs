use anyhow::{Context, Result};
use becas::client::{BecasClient, BecasError};
use becas::config::{default_config_path, find_config_file, load_config, Config};
use becas::models::{ExportFormat, GroupSelection};
use becas::ui::{self, Output};
use becas::utils::{parse_pmid, validate_format, validate_text};
use clap::error::ErrorKind;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio::io::AsyncReadExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// becas - Annotate text or PubMed publications with biomedical concepts
#[derive(Parser, Debug)]
#[command(name = "becas")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Annotate text or PubMed publications using the becas API", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv, -vvv)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Client authentication
#[derive(Args, Debug, Clone, Default)]
struct AuthArgs {
    /// Email address to use in API authentication
    #[arg(long, env = "BECAS_EMAIL")]
    email: Option<String>,

    /// Tool name to use in API authentication (default: becas-python)
    #[arg(long)]
    tool: Option<String>,
}

/// Options shared by every API command
#[derive(Args, Debug, Clone, Default)]
struct CommonArgs {
    /// Semantic groups to use for annotation (e.g. PRGE,DISO,ANAT)
    #[arg(short, long, value_name = "GROUPS", value_parser = GroupSelection::from_codes, long_help = ui::groups_help())]
    groups: Option<GroupSelection>,

    /// File to save annotation results to
    #[arg(short, long, value_name = "FILE")]
    output_file: Option<PathBuf>,

    /// Access the service securely through HTTPS
    #[arg(long)]
    secure: bool,

    /// Skip TLS certificate verification (for hosts without proper CA certificates)
    #[arg(long)]
    insecure: bool,

    /// Seconds to wait before timing out a request (default: 120)
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
}

/// Where to read text from
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
struct TextInput {
    /// Text file to annotate
    #[arg(short, long, value_name = "FILE")]
    file: Option<PathBuf>,

    /// Plain text to annotate
    #[arg(short, long, value_name = "TEXT")]
    text: Option<String>,

    /// Read text from STDIN
    #[arg(short = 'i', long)]
    stdin: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Annotate text as JSON with concept metadata
    AnnotateText {
        #[command(flatten)]
        input: TextInput,

        /// Include the annotated text in the response
        #[arg(long)]
        echo: bool,

        #[command(flatten)]
        auth: AuthArgs,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Export text in a chosen format
    ExportText {
        #[command(flatten)]
        input: TextInput,

        /// Output format (json, xml, a1, conll)
        #[arg(long, value_parser = validate_format)]
        format: ExportFormat,

        #[command(flatten)]
        auth: AuthArgs,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Annotate PubMed publication as JSON with concept metadata
    AnnotatePublication {
        /// PMID of publication to annotate
        #[arg(short, long, value_parser = parse_pmid)]
        pmid: u64,

        #[command(flatten)]
        auth: AuthArgs,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Export PubMed publication in MEDLINE IeXML
    ExportPublication {
        /// PMID of publication to annotate
        #[arg(short, long, value_parser = parse_pmid)]
        pmid: u64,

        #[command(flatten)]
        auth: AuthArgs,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Generate shell completions
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Write a default configuration file
    InitConfig {
        /// Destination (default: the user configuration directory)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_settings(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            ui::print_error(&format!("{:#}", e));
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&cli, &config);

    tokio::select! {
        result = run(cli, config) => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => report(e),
        },
        _ = tokio::signal::ctrl_c() => {
            eprintln!("Manually interrupted by ^C. Aborting.");
            ExitCode::from(130)
        }
    }
}

/// Initialize tracing based on verbosity. Logs go to stderr so stdout only
/// carries results.
fn init_tracing(cli: &Cli, config: &Config) {
    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => config.logging.level.as_str(),
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("becas={}", level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Load configuration from the given file, or from the first file found in
/// the default locations.
fn load_settings(path: Option<&Path>) -> Result<Config> {
    let path = path.map(Path::to_path_buf).or_else(find_config_file);
    load_config(path.as_deref()).context("Failed to load configuration")
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    let quiet = cli.quiet;

    match cli.command {
        Commands::AnnotateText {
            input,
            echo,
            auth,
            common,
        } => {
            let client = client_for(&config, &auth, &common)?;
            let text = read_text(&input).await.unwrap_or_else(|msg| usage_error(msg));
            let results = client
                .annotate_text(&text, common.groups.as_ref(), echo)
                .await?;
            finish(&Output::Annotations(results), &common, quiet)
        }

        Commands::ExportText {
            input,
            format,
            auth,
            common,
        } => {
            let client = client_for(&config, &auth, &common)?;
            let text = read_text(&input).await.unwrap_or_else(|msg| usage_error(msg));
            let results = client
                .export_text(&text, format, common.groups.as_ref())
                .await?;
            finish(&Output::Text(results), &common, quiet)
        }

        Commands::AnnotatePublication { pmid, auth, common } => {
            let client = client_for(&config, &auth, &common)?;
            let results = client
                .annotate_publication(pmid, common.groups.as_ref())
                .await?;
            finish(&Output::Annotations(results), &common, quiet)
        }

        Commands::ExportPublication { pmid, auth, common } => {
            let client = client_for(&config, &auth, &common)?;
            let results = client
                .export_publication(pmid, common.groups.as_ref())
                .await?;
            finish(&Output::Text(results), &common, quiet)
        }

        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "becas", &mut std::io::stdout());
            Ok(())
        }

        Commands::InitConfig { path, force } => {
            let path = path
                .or_else(default_config_path)
                .context("Could not determine the configuration directory")?;
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            Config::default().save(&path)?;
            if !quiet {
                ui::print_success(&format!(
                    "Wrote default configuration to {}",
                    path.display()
                ));
            }
            Ok(())
        }
    }
}

/// Apply command-line overrides on top of the loaded configuration.
fn resolve_config(config: &Config, auth: &AuthArgs, common: &CommonArgs) -> Config {
    let mut resolved = config.clone();
    if let Some(email) = &auth.email {
        resolved.auth.email = Some(email.clone());
    }
    if let Some(tool) = &auth.tool {
        resolved.auth.tool = tool.clone();
    }
    if let Some(timeout) = common.timeout {
        resolved.request.timeout_secs = timeout;
    }
    resolved.request.secure |= common.secure;
    resolved.request.accept_invalid_certs |= common.insecure;
    resolved
}

fn client_for(config: &Config, auth: &AuthArgs, common: &CommonArgs) -> Result<BecasClient> {
    let resolved = resolve_config(config, auth, common);
    if resolved.auth.email.is_none() {
        Cli::command()
            .error(
                ErrorKind::MissingRequiredArgument,
                "the following required arguments were not provided: --email <EMAIL>",
            )
            .exit();
    }
    Ok(BecasClient::new(resolved.client_config())?)
}

/// Read text from the chosen input medium.
async fn read_text(input: &TextInput) -> Result<String, String> {
    if input.stdin {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .map_err(|_| "Got no text from STDIN".to_string())?;
        validate_text(&text).map_err(|_| "Got no text from STDIN".to_string())?;
        Ok(text)
    } else if let Some(path) = &input.file {
        let empty = || format!("`{}` file is empty or non-textual", path.display());
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::InvalidData {
                empty()
            } else {
                format!("can't open '{}': {}", path.display(), e)
            }
        })?;
        validate_text(&text).map_err(|_| empty())?;
        Ok(text)
    } else {
        let text = input.text.clone().unwrap_or_default();
        validate_text(&text).map_err(|_| "Got empty --text argument".to_string())?;
        Ok(text)
    }
}

/// Print results to stdout or to the requested file.
fn finish(output: &Output, common: &CommonArgs, quiet: bool) -> Result<()> {
    let path = common.output_file.as_deref();
    ui::write_output(output, path).with_context(|| match path {
        Some(path) => format!("Failed to write results to {}", path.display()),
        None => "Failed to write results".to_string(),
    })?;

    if let (Some(path), false) = (path, quiet) {
        ui::print_success(&format!("Saved annotation results to {}", path.display()));
    }
    Ok(())
}

/// Exit through the argument parser's error path, like a bad flag would.
fn usage_error(message: impl std::fmt::Display) -> ! {
    Cli::command()
        .error(ErrorKind::ValueValidation, message)
        .exit()
}

/// Invalid input leaves through the argument parser; everything else is a
/// one-line diagnostic with exit code 1.
fn report(err: anyhow::Error) -> ExitCode {
    if let Some(becas_err) = err.downcast_ref::<BecasError>() {
        if becas_err.is_invalid_input() {
            usage_error(becas_err);
        }
    }
    ui::print_error(&format!("{:#}", err));
    ExitCode::FAILURE
}
