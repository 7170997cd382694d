mod report;
mod schema;

use anyhow::Result;
use argentry::{Args, ParseOutcome};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt};

use crate::report::ParseReport;
use crate::schema::Declaration;

const DEFAULT_PROGRAM_NAME: &str = "argentry";

#[derive(Parser)]
#[command(name = "argentry")]
#[command(version, about = "Parse command lines against a JSON entry declaration", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse arguments given after `--` and print the matched values
    Parse(ParseArgs),

    /// Print the usage text for a declaration
    Usage(UsageArgs),
}

#[derive(Parser)]
struct ParseArgs {
    /// Path to the JSON entry declaration
    #[arg(short, long, value_name = "FILE")]
    schema: PathBuf,

    /// Print values as JSON instead of the plain listing
    #[arg(long)]
    json: bool,

    /// Program name shown in usage (overrides the declaration)
    #[arg(short, long, value_name = "NAME")]
    program: Option<String>,

    /// Arguments to parse
    #[arg(last = true, value_name = "ARGS")]
    args: Vec<String>,
}

#[derive(Parser)]
struct UsageArgs {
    /// Path to the JSON entry declaration
    #[arg(short, long, value_name = "FILE")]
    schema: PathBuf,

    /// Program name shown in usage (overrides the declaration)
    #[arg(short, long, value_name = "NAME")]
    program: Option<String>,
}

fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Parse(args) => parse_command(args),
        Commands::Usage(args) => usage_command(args),
    }
}

fn program_name(overridden: Option<String>, decl: &Declaration) -> String {
    overridden
        .or_else(|| decl.program.clone())
        .unwrap_or_else(|| DEFAULT_PROGRAM_NAME.to_string())
}

fn parse_command(args: ParseArgs) -> Result<ExitCode> {
    tracing::debug!("executing parse command");

    let decl = Declaration::from_file(&args.schema)?;
    let program = program_name(args.program, &decl);

    let mut parser = Args::new(std::iter::once(program).chain(args.args));
    let bound = decl.register(&mut parser);

    match parser.parse() {
        ParseOutcome::Help(text) => {
            print!("{text}");
            Ok(ExitCode::SUCCESS)
        }
        ParseOutcome::Errors(errors) => {
            for err in &errors {
                eprintln!("{err}");
            }
            Ok(ExitCode::FAILURE)
        }
        ParseOutcome::Matches(parsed) => {
            if args.json {
                let report = ParseReport::new(&parsed, &bound);
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", parsed.render_values());
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn usage_command(args: UsageArgs) -> Result<ExitCode> {
    tracing::debug!("executing usage command");

    let decl = Declaration::from_file(&args.schema)?;
    let program = program_name(args.program, &decl);

    let mut parser = Args::new([program]);
    decl.register(&mut parser);
    print!("{}", parser.render_help());
    Ok(ExitCode::SUCCESS)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
