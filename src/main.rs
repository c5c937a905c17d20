//! Field manifold CLI - Build a field from JSON configuration and report on it.

use std::fs;
use std::path::PathBuf;

use field_manifold::{FieldConfig, FieldError, ScalarField};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json>", args[0]);
        eprintln!();
        eprintln!("Build a scalar field from JSON configuration and print its summary.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to field configuration file");
        eprintln!();
        eprintln!("Example configuration is generated with --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let config_path = PathBuf::from(&args[1]);

    let config_str = fs::read_to_string(&config_path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        std::process::exit(1);
    });

    let config: FieldConfig = serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = run(&config) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(config: &FieldConfig) -> Result<(), FieldError> {
    let field = ScalarField::from_config(config)?;
    let manifold = field.manifold();

    println!("Scalar Field");
    println!("============");
    println!("Manifold: {} ({})", manifold.name(), manifold.id());
    println!("Dimension: {}", manifold.dim());
    println!("Array size: {}", manifold.array_size());
    if let Some(step) = manifold.step_size() {
        println!("Step size: {}", step);
    }
    println!("Area: {:.6}", manifold.area());
    println!("Volume: {:.6}", manifold.volume());
    println!();

    let laplacian = field.laplacian()?;
    let (min, max) = laplacian
        .values()
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });

    println!("Integral: {:.6}", field.integrate()?);
    println!("Laplacian range: [{:.6}, {:.6}]", min, max);

    if let Some(path) = &config.dump {
        field.write_to_file(path)?;
        println!("Wrote values to {}", path.display());
    }

    Ok(())
}

fn print_example_config() {
    let config = FieldConfig::default();

    println!("Example configuration (config.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing example: {}", e),
    }
}
