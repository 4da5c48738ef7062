use clap::Parser;
use colored::*;
use std::path::PathBuf;

use include_advisor::driver::{analyze_translation_unit, DriverOptions};

#[derive(clap::Parser, Debug)]
#[command(name = "include-advisor")]
#[command(about = "A static analyzer that reports which headers a C/C++ file should #include")]
#[command(version)]
struct Args {
    /// C/C++ source files to analyze, one translation unit each
    #[arg(value_name = "FILE", required = true)]
    inputs: Vec<PathBuf>,

    /// Add a directory to the include search path
    #[arg(short = 'I', long = "include-dir", value_name = "DIR")]
    include_dirs: Vec<PathBuf>,

    /// Load a mapping file (may be repeated)
    #[arg(long = "mapping-file", value_name = "FILE")]
    mapping_files: Vec<String>,

    /// Also report on files matching this glob, not just the main file
    #[arg(long = "check-also", value_name = "GLOB")]
    check_also: Vec<String>,

    /// Skip the built-in libc/libstdc++ mapping tables
    #[arg(long)]
    no_default_mappings: bool,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let args = Args::parse();

    let filter = match args.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let options = DriverOptions {
        include_dirs: args.include_dirs.clone(),
        mapping_files: args.mapping_files.clone(),
        check_also: args.check_also.clone(),
        no_default_mappings: args.no_default_mappings,
    };

    println!("{}", "Include Advisor".bold().blue());

    let mut files_with_changes = 0usize;
    for input in &args.inputs {
        println!("Analyzing: {}", input.display());
        match analyze_translation_unit(input, &options) {
            Ok(reports) => {
                for report in &reports {
                    for violation in &report.violations {
                        eprintln!("{}", violation);
                    }
                }
                for report in &reports {
                    eprintln!("{}", report);
                    if report.has_changes {
                        files_with_changes += 1;
                    }
                }
            }
            Err(e) => {
                eprintln!("{}: {}", "Error".red().bold(), e);
                std::process::exit(1);
            }
        }
    }

    if files_with_changes == 0 {
        println!("{}", "✓ All files have correct #includes!".green());
    } else {
        println!(
            "{}",
            format!("✗ {} file(s) should change their #includes", files_with_changes).red()
        );
        std::process::exit(1);
    }
}
