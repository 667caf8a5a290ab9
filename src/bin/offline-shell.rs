use std::env;
use std::path::PathBuf;

use offline_shell::{
    AppConfig, CacheStorage, CacheWorker, DiskCacheStorage, HttpNetwork, Request, Source,
};

fn print_usage() {
    eprintln!("Usage: offline-shell [OPTIONS] <COMMAND>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  install             Precache the asset manifest into the current generation");
    eprintln!("  activate            Delete every stale cache generation");
    eprintln!("  deploy              install, then activate");
    eprintln!("  fetch <path>...     Answer requests the way the worker would");
    eprintln!("  keys                List cache generations");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --origin <URL>      Origin asset paths are resolved against");
    eprintln!("  --store <DIR>       Cache storage directory");
    eprintln!("  --config <FILE>     TOML configuration file");
    eprintln!("  -h, --help          Show this help");
    eprintln!();
    eprintln!("Log verbosity is controlled with RUST_LOG (default: info).");
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Install,
    Activate,
    Deploy,
    Fetch(Vec<String>),
    Keys,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    origin: Option<String>,
    store: Option<PathBuf>,
    config: Option<PathBuf>,
    command: Option<Command>,
    help: bool,
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut parsed = Args::default();
    let mut positional = Vec::new();
    let mut i = 0;
    while i < args.len() {
        let arg = args[i].as_str();
        match arg {
            "-h" | "--help" => parsed.help = true,
            "--origin" | "--store" | "--config" => {
                i += 1;
                let value = args
                    .get(i)
                    .ok_or_else(|| format!("{arg} requires a value"))?
                    .clone();
                match arg {
                    "--origin" => parsed.origin = Some(value),
                    "--store" => parsed.store = Some(PathBuf::from(value)),
                    _ => parsed.config = Some(PathBuf::from(value)),
                }
            }
            _ if arg.starts_with('-') => return Err(format!("unknown option {arg}")),
            _ => positional.push(args[i].clone()),
        }
        i += 1;
    }

    let mut positional = positional.into_iter();
    parsed.command = match positional.next().as_deref() {
        None => None,
        Some("install") => Some(Command::Install),
        Some("activate") => Some(Command::Activate),
        Some("deploy") => Some(Command::Deploy),
        Some("keys") => Some(Command::Keys),
        Some("fetch") => {
            let paths: Vec<String> = positional.by_ref().collect();
            if paths.is_empty() {
                return Err("fetch requires at least one path".to_string());
            }
            Some(Command::Fetch(paths))
        }
        Some(other) => return Err(format!("unknown command {other}")),
    };
    if let Some(extra) = positional.next() {
        return Err(format!("unexpected argument {extra}"));
    }
    Ok(parsed)
}

async fn run(args: Args, command: Command) -> offline_shell::Result<()> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(origin) = args.origin {
        config.host.origin = origin;
    }
    if let Some(store) = args.store {
        config.host.store_dir = store;
    }
    config.worker.validate()?;

    let network = HttpNetwork::new(&config.host.origin)?;
    let origin = network.origin().clone();
    let storage = DiskCacheStorage::new(&config.host.store_dir);
    log::debug!("Cache storage at {}", storage.root().display());
    let worker = CacheWorker::new(config.worker, origin.clone(), network, storage);

    match command {
        Command::Install => {
            let report = worker.install().await?;
            println!("installed {} ({} assets)", report.cache_name, report.cached);
        }
        Command::Activate => {
            let report = worker.activate().await?;
            println!("deleted {} stale generation(s)", report.deleted.len());
        }
        Command::Deploy => {
            let installed = worker.install().await?;
            let activated = worker.activate().await?;
            println!(
                "deployed {} ({} assets, {} stale deleted)",
                installed.cache_name,
                installed.cached,
                activated.deleted.len()
            );
        }
        Command::Fetch(paths) => {
            for path in paths {
                let request = Request::for_path(&origin, &path)?;
                let served = worker.fetch(&request).await?;
                let marker = match served.source {
                    Source::Cache => "HIT ",
                    Source::Network => "MISS",
                };
                println!(
                    "{marker} {} {} ({} bytes)",
                    served.response.status,
                    request.url(),
                    served.response.body.len()
                );
            }
        }
        Command::Keys => {
            let current = &worker.config().cache_name;
            for name in worker.storage().keys().await? {
                let mark = if &name == current { "*" } else { " " };
                println!("{mark} {name}");
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let raw: Vec<String> = env::args().skip(1).collect();
    let mut args = match parse_args(&raw) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {e}");
            print_usage();
            std::process::exit(1);
        }
    };

    let Some(command) = args.command.take() else {
        print_usage();
        std::process::exit(if args.help { 0 } else { 1 });
    };
    if args.help {
        print_usage();
        std::process::exit(0);
    }

    if let Err(e) = run(args, command).await {
        log::error!("{e}");
        std::process::exit(1);
    }
}
