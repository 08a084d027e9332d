//! Launcher for the exoclass prediction server.

use std::{path::PathBuf, sync::Arc};

use exoclass::{
    config::ServerConfig,
    context::{AppContext, StartupError},
    logging, server,
};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        tracing::error!("{err}");
        eprintln!("{err}");
        std::process::exit(1);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
struct CliOptions {
    config: Option<PathBuf>,
    model: Option<PathBuf>,
    metadata: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
}

impl CliOptions {
    fn apply(self, cfg: &mut ServerConfig) {
        if let Some(model) = self.model {
            cfg.model_path = model;
        }
        if let Some(metadata) = self.metadata {
            cfg.metadata_path = Some(metadata);
        }
        if let Some(host) = self.host {
            cfg.host = host;
        }
        if let Some(port) = self.port {
            cfg.port = port;
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let Some(options) = parse_args(std::env::args().skip(1).collect())? else {
        return Ok(());
    };

    let mut cfg = ServerConfig::load(options.config.as_deref()).map_err(StartupError::from)?;
    options.apply(&mut cfg);

    if let Err(err) = logging::init_server(&cfg.log) {
        eprintln!("File logging disabled: {err}");
        if let Err(err) = logging::init_console(&cfg.log.filter) {
            eprintln!("Logging disabled: {err}");
        }
    }

    println!("Starting {} API...", cfg.title);
    println!(
        "Visit http://127.0.0.1:{}/form in your browser once the application has loaded.",
        cfg.port
    );
    if !cfg.model_dir().is_dir() {
        tracing::warn!(
            "Model directory {} not found; ensure your model files are exported",
            cfg.model_dir().display()
        );
    }

    let ctx = Arc::new(AppContext::load(&cfg)?);
    server::serve(ctx, &cfg.host, cfg.port).await?;
    Ok(())
}

fn parse_args(args: Vec<String>) -> Result<Option<CliOptions>, String> {
    let mut options = CliOptions::default();
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => {
                println!("{}", help_text());
                return Ok(None);
            }
            "--config" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--config requires a value".to_string())?;
                options.config = Some(PathBuf::from(value));
            }
            "--model" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--model requires a value".to_string())?;
                options.model = Some(PathBuf::from(value));
            }
            "--metadata" => {
                idx += 1;
                let value =
                    args.get(idx).ok_or_else(|| "--metadata requires a value".to_string())?;
                options.metadata = Some(PathBuf::from(value));
            }
            "--host" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--host requires a value".to_string())?;
                options.host = Some(value.to_string());
            }
            "--port" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--port requires a value".to_string())?;
                options.port = Some(
                    value
                        .parse::<u16>()
                        .map_err(|_| format!("Invalid --port value: {value}"))?,
                );
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }
    Ok(Some(options))
}

fn help_text() -> String {
    [
        "exoclass",
        "",
        "Usage:",
        "  exoclass [options]",
        "",
        "Options:",
        "  --config <file.toml>   Config file (default: ./exoclass.toml if present).",
        "  --model <model.json>   Model artifact path.",
        "  --metadata <file>      Metadata path (default: <model>.meta.json).",
        "  --host <addr>          Bind address (default: 0.0.0.0).",
        "  --port <n>             Bind port (default: 8000).",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn flags_override_config_values() {
        let options = parse_args(args(&[
            "--model",
            "export/m.json",
            "--port",
            "9000",
            "--host",
            "127.0.0.1",
        ]))
        .unwrap()
        .unwrap();
        let mut cfg = ServerConfig::default();
        options.apply(&mut cfg);
        assert_eq!(cfg.model_path, PathBuf::from("export/m.json"));
        assert_eq!(cfg.metadata_path(), PathBuf::from("export/m.meta.json"));
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 9000);
    }

    #[test]
    fn rejects_bad_port_and_unknown_flags() {
        assert!(parse_args(args(&["--port", "http"])).is_err());
        assert!(parse_args(args(&["--reload"])).is_err());
        assert!(parse_args(args(&["--model"])).is_err());
    }

    #[test]
    fn no_arguments_means_defaults() {
        assert_eq!(parse_args(Vec::new()).unwrap(), Some(CliOptions::default()));
    }

    #[test]
    fn help_is_not_an_error() {
        assert_eq!(parse_args(args(&["--help"])).unwrap(), None);
        assert_eq!(parse_args(args(&["--port", "9000", "-h"])).unwrap(), None);
    }
}
