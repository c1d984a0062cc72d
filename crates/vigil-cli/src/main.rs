//! Vigil CLI - validate and normalize behavioural feature tables.

mod cli;
mod commands;
mod logging;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Validate {
            file,
            schema,
            failures,
            json,
            strict,
        } => commands::validate::run(file, schema, failures, json, strict),

        Commands::Fit {
            file,
            schema,
            output,
            label,
            test_fraction,
            validation_fraction,
            seed,
            constants,
            threshold,
            partitions,
        } => commands::fit::run(commands::fit::FitArgs {
            file,
            schema,
            output,
            label,
            test_fraction,
            validation_fraction,
            seed,
            constants,
            threshold,
            partitions,
        }),

        Commands::Transform {
            file,
            artifacts,
            validate,
            schema,
            output,
        } => commands::transform::run(file, artifacts, validate, schema, output),

        Commands::Schema { preset } => commands::schema::run(preset),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
