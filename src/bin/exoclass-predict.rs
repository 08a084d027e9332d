//! Run one prediction offline against the exported model files.
//!
//! Reads a JSON row from `--input` (or stdin), validates it with the same
//! schema as `POST /predict`, and prints the response body.

use std::io::Read;
use std::path::PathBuf;

use exoclass::{
    config::{ServerConfig, metadata_path_for},
    context::AppContext,
    logging,
};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

#[derive(Debug, Clone)]
struct CliOptions {
    model_path: PathBuf,
    metadata_path: Option<PathBuf>,
    input: Option<PathBuf>,
}

fn run() -> Result<(), String> {
    let Some(options) = parse_args(std::env::args().skip(1).collect())? else {
        return Ok(());
    };
    if let Err(err) = logging::init_console("warn") {
        eprintln!("Logging disabled: {err}");
    }

    let cfg = ServerConfig {
        metadata_path: Some(
            options
                .metadata_path
                .clone()
                .unwrap_or_else(|| metadata_path_for(&options.model_path)),
        ),
        model_path: options.model_path,
        ..ServerConfig::default()
    };
    let ctx = AppContext::load(&cfg).map_err(|err| err.to_string())?;

    let body = match &options.input {
        Some(path) => std::fs::read(path)
            .map_err(|err| format!("Failed to read {}: {err}", path.display()))?,
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .map_err(|err| format!("Failed to read stdin: {err}"))?;
            buf
        }
    };

    let row = ctx.schema().validate_bytes(&body).map_err(|errors| {
        errors
            .0
            .iter()
            .map(|err| format!("- {}: {} ({})", err.loc.join("."), err.msg, err.kind))
            .collect::<Vec<_>>()
            .join("\n")
    })?;
    let result = ctx.predict(row).map_err(|err| err.to_string())?;
    let json = serde_json::to_string_pretty(&result).map_err(|err| err.to_string())?;
    println!("{json}");
    Ok(())
}

fn parse_args(args: Vec<String>) -> Result<Option<CliOptions>, String> {
    let mut model_path: Option<PathBuf> = None;
    let mut metadata_path: Option<PathBuf> = None;
    let mut input: Option<PathBuf> = None;

    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => {
                println!("{}", help_text());
                return Ok(None);
            }
            "--model" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--model requires a value".to_string())?;
                model_path = Some(PathBuf::from(value));
            }
            "--metadata" => {
                idx += 1;
                let value =
                    args.get(idx).ok_or_else(|| "--metadata requires a value".to_string())?;
                metadata_path = Some(PathBuf::from(value));
            }
            "--input" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--input requires a value".to_string())?;
                if value != "-" {
                    input = Some(PathBuf::from(value));
                }
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }

    let model_path = model_path.ok_or_else(|| "--model is required".to_string())?;
    Ok(Some(CliOptions {
        model_path,
        metadata_path,
        input,
    }))
}

fn help_text() -> String {
    [
        "exoclass-predict",
        "",
        "Usage:",
        "  exoclass-predict --model <model.json> [options] < row.json",
        "",
        "Options:",
        "  --metadata <file>   Metadata path (default: <model>.meta.json).",
        "  --input <file|->    JSON row to score (default: stdin).",
    ]
    .join("\n")
}
