use alsangue::build::build_site;
use alsangue::config::Config;
use anyhow::{Context, Result};
use clap::{crate_version, App, Arg};
use log::debug;
use std::path::Path;

fn main() -> Result<()> {
    let matches = App::new("alsangue")
        .version(crate_version!())
        .about("Builds static websites")
        .arg(
            Arg::with_name("content_directory")
                .index(1)
                .default_value("./content")
                .help("directory of the website structure"),
        )
        .arg(
            Arg::with_name("build_directory")
                .index(2)
                .default_value("./build")
                .help("where to create the built website"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("extended output"),
        )
        .get_matches();

    let verbose = matches.is_present("verbose");
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if verbose { "debug" } else { "info" }),
    )
    .init();

    // Both have defaults, so they're always present.
    let content_directory = Path::new(matches.value_of("content_directory").unwrap_or("./content"));
    let build_directory = Path::new(matches.value_of("build_directory").unwrap_or("./build"));
    debug!("content directory: {}", content_directory.display());
    debug!("build directory: {}", build_directory.display());

    let config = Config::from_directory(content_directory, build_directory)
        .with_context(|| format!("loading configuration from `{}`", content_directory.display()))?;
    build_site(&config)
        .with_context(|| format!("building `{}`", config.output_directory.display()))?;
    Ok(())
}
