use std::collections::HashMap;
use std::fs;
use std::io::{self, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use log::debug;
use stache::{JsonValue, RenderOptions, Template, Value, YamlValue};
use thiserror::Error;

#[derive(Parser)]
#[command(name = "stache", about = "Render a Mustache template")]
struct Cli {
    /// Template file
    #[arg()]
    template: PathBuf,

    /// Data file, JSON or YAML; read from stdin when omitted and piped
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Directory holding partials, one file per partial
    #[arg(short, long)]
    partials: Option<PathBuf>,

    /// Extension of partial files
    #[arg(short, long, default_value = "mustache")]
    extension: String,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Keep tags naming missing values or partials in the output
    #[arg(long)]
    keep: bool,

    /// Initial opening delimiter
    #[arg(long, default_value = "{{")]
    open: String,

    /// Initial closing delimiter
    #[arg(long, default_value = "}}")]
    close: String,
}

#[derive(Error, Debug)]
enum CliError {
    #[error("{}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("{}: invalid data: {message}", .path.display())]
    Data { path: PathBuf, message: String },
    #[error("{0}")]
    Template(#[from] stache::Error),
}

impl CliError {
    fn exit_code(&self) -> u8 {
        match self {
            CliError::Io { .. } => 1,
            CliError::Data { .. } => 2,
            CliError::Template(stache::Error::Delimiter(_)) => 3,
            CliError::Template(stache::Error::UnclosedTag(_)) => 4,
            CliError::Template(stache::Error::MissingClosingTag(_)) => 5,
            CliError::Template(stache::Error::StrayClosingTag(_)) => 6,
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("stache: {}", err);
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let text = read_file(&cli.template)?;
    let template = Template::parse_with(&text, &cli.open, &cli.close)?;
    let data = match &cli.data {
        Some(path) => parse_data(path, &read_file(path)?)?,
        None if !io::stdin().is_terminal() => {
            let stdin = PathBuf::from("<stdin>");
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .map_err(|source| CliError::Io { path: stdin.clone(), source })?;
            parse_data(&stdin, &input)?
        },
        None => Value::Null
    };
    let partials = match &cli.partials {
        Some(dir) => load_partials(dir, &cli.extension)?,
        None => HashMap::new()
    };
    let options = RenderOptions { keep_unresolved: cli.keep };
    let result = template.render_with_options(&data, &partials, &options)?;
    match &cli.output {
        Some(path) => fs::write(path, result)
            .map_err(|source| CliError::Io { path: path.clone(), source }),
        None => io::stdout()
            .write_all(result.as_bytes())
            .map_err(|source| CliError::Io { path: PathBuf::from("<stdout>"), source })
    }
}

fn read_file(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Io { path: path.to_owned(), source })
}

fn parse_data(path: &Path, text: &str) -> Result<Value, CliError> {
    let invalid = |message: String| CliError::Data { path: path.to_owned(), message };
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str::<JsonValue>(text)
            .map(Value::from)
            .map_err(|err| invalid(err.to_string())),
        // YAML also reads JSON documents
        _ => serde_yaml::from_str::<YamlValue>(text)
            .map(Value::from)
            .map_err(|err| invalid(err.to_string()))
    }
}

/// Loads every `*.<extension>` file of `dir`, named by its file stem.
fn load_partials(dir: &Path, extension: &str) -> Result<HashMap<String, String>, CliError> {
    let entries = fs::read_dir(dir).map_err(|source| CliError::Io { path: dir.to_owned(), source })?;
    let mut partials = HashMap::new();
    for entry in entries {
        let path = entry
            .map_err(|source| CliError::Io { path: dir.to_owned(), source })?
            .path();
        if path.extension().and_then(|ext| ext.to_str()) != Some(extension) {
            continue;
        }
        if let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) {
            debug!("partial {:?} from {}", name, path.display());
            partials.insert(name.to_owned(), read_file(&path)?);
        }
    }
    Ok(partials)
}
