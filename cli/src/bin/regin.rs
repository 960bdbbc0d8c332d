use anyhow::{Context, Result};
use clap::{App, Arg};
use log::{error, info};
use regin_core::builder::GraphBuilder;
use regin_core::config::ColumnMapping;
use regin_core::graph::serialization::xgmml;
use simplelog::{ColorChoice, CombinedLogger, LevelFilter, SharedLogger, TermLogger, TerminalMode, WriteLogger};
use std::fs::{File, OpenOptions};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

fn main() {
    let matches = App::new("regin")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Converts tabular interaction files to XGMML networks.")
        .arg(
            Arg::with_name("debug")
                .short("d")
                .long("debug")
                .help("Enables debug output")
                .takes_value(false),
        )
        .arg(
            Arg::with_name("input")
                .short("i")
                .long("input")
                .help("The path to the input file.")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .help("The path to the config file.")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .help("The XGMML file to write the network to.")
                .takes_value(true),
        )
        .get_matches();

    let input = matches.value_of("input").map(PathBuf::from);
    let config = matches.value_of("config").map(PathBuf::from);
    let (input, config) = match (input, config) {
        (Some(input), Some(config)) if input.exists() && config.exists() => (input, config),
        _ => {
            println!("check parameters. at least one parameter is missing.");
            println!("usage: regin -i <input> -c <config> [-o <output>] [-d]");
            std::process::exit(2);
        }
    };
    let output = matches
        .value_of("output")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(format!("{}.xgmml", input.display())));

    let log_filter = if matches.is_present("debug") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    init_logging(log_filter, &PathBuf::from(format!("{}.log", input.display())));

    if let Err(e) = convert(&input, &config, &output) {
        error!("Could not convert file to RegIN: {:#}", e);
        std::process::exit(1);
    }
}

/// Logs to the terminal and to a companion log file next to the input.
fn init_logging(log_filter: LevelFilter, log_file: &Path) {
    let log_config = simplelog::Config::default();
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        log_filter,
        log_config.clone(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    match OpenOptions::new().create(true).append(true).open(log_file) {
        Ok(file) => loggers.push(WriteLogger::new(log_filter, log_config.clone(), file)),
        Err(e) => println!(
            "Error, can't open the log file {}: {}",
            log_file.display(),
            e
        ),
    }
    if let Err(e) = CombinedLogger::init(loggers) {
        println!(
            "Error, can't initialize the log output: {}.\nWill degrade to a more simple logger",
            e
        );
        if let Err(e_simple) = simplelog::SimpleLogger::init(log_filter, log_config) {
            println!("Simple logging failed too: {}", e_simple);
        }
    }
}

fn convert(input: &Path, config: &Path, output: &Path) -> Result<()> {
    info!("Read config file.");
    let mapping = ColumnMapping::from_file(config)
        .with_context(|| format!("could not read config file {}", config.display()))?;
    info!("Conversion of {} started.", mapping.network_name());
    info!("Converting {} to {}", input.display(), output.display());

    let input_file_name = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let reader = File::open(input)
        .with_context(|| format!("could not open input file {}", input.display()))?;
    let graph = GraphBuilder::new(mapping, &input_file_name).convert(reader)?;

    let writer = File::create(output)
        .with_context(|| format!("could not create output file {}", output.display()))?;
    xgmml::export(&graph, BufWriter::new(writer))?;

    info!("conversion of {} done.", graph.title());
    Ok(())
}
