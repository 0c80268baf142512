use std::path::PathBuf;

use anyhow::bail;
use blogkit::config::{stock_config_yaml, SiteConfig};
use blogkit::error::BuildError;
use blogkit::generator::{self, BuildOptions};
use clap::{command, Arg, ArgAction, ArgMatches, Command};
use log::error;

fn cli() -> Command {
    command!()
        .subcommand_required(true)
        .args(&[
            Arg::new("config")
                .long("config")
                .help("Site configuration file")
                .value_parser(clap::value_parser!(PathBuf))
                .default_value("_config.yml")
                .global(true),
            Arg::new("content_dir")
                .long("content-dir")
                .help("Directory of posts (overrides content_dir in the config)")
                .value_parser(clap::value_parser!(PathBuf))
                .global(true),
            Arg::new("output_dir")
                .long("output-dir")
                .help("Directory of output (overrides output_dir in the config)")
                .value_parser(clap::value_parser!(PathBuf))
                .global(true),
            Arg::new("unpublished")
                .long("unpublished")
                .help("Include posts marked `published: false`")
                .action(ArgAction::SetTrue)
                .global(true),
        ])
        .subcommand(
            Command::new("build")
                .about("Render every post, the index, tag pages and the feed")
                .arg(
                    Arg::new("clean")
                        .long("clean")
                        .help("Remove the output directory first")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("check").about("Validate posts without writing anything"))
        .subcommand(Command::new("gen-config").about("Print a documented _config.yml"))
}

fn load_config(matches: &ArgMatches) -> anyhow::Result<SiteConfig> {
    let path: &PathBuf = matches
        .get_one("config")
        .ok_or_else(|| anyhow::anyhow!("--config has no value"))?;
    let mut config = SiteConfig::load(path)?;
    if let Some(dir) = matches.get_one::<PathBuf>("content_dir") {
        config.content_dir = dir.clone();
    }
    if let Some(dir) = matches.get_one::<PathBuf>("output_dir") {
        config.output_dir = dir.clone();
    }
    if config.output_dir.exists() && !config.output_dir.is_dir() {
        bail!("if output_dir exists, it must be a directory.");
    }
    Ok(config)
}

/// Logs each per-document failure so the whole report is visible at once.
fn report(err: anyhow::Error) -> anyhow::Error {
    if let Some(BuildError::Documents { failures }) = err.downcast_ref::<BuildError>() {
        for failure in failures {
            error!("{failure}");
        }
    }
    err
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let matches = cli().get_matches();
    let Some((name, sub)) = matches.subcommand() else {
        bail!("no subcommand given");
    };

    match name {
        "gen-config" => print!("{}", stock_config_yaml()),
        "check" => {
            let config = load_config(sub)?;
            let loaded = generator::load(&config, sub.get_flag("unpublished"))?;
            for (date, output, title) in generator::listing(&loaded.collection) {
                println!("{date}  {}  {title}", output.display());
            }
            if !loaded.failures.is_empty() {
                return Err(report(
                    BuildError::Documents {
                        failures: loaded.failures,
                    }
                    .into(),
                ));
            }
            println!("{} post(s) OK", loaded.collection.len());
        }
        "build" => {
            let config = load_config(sub)?;
            let options = BuildOptions {
                clean: sub.get_flag("clean"),
                include_unpublished: sub.get_flag("unpublished"),
            };
            let built = generator::build(&config, options).map_err(report)?;
            println!(
                "Built {} post(s), {} file(s) and {} byte(s) of static files into {}",
                built.posts,
                built.written.len(),
                built.static_bytes,
                config.output_dir.display()
            );
        }
        other => bail!("unknown subcommand {other}"),
    }

    Ok(())
}
