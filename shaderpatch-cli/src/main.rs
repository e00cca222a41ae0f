//! Command-line interface for shaderpatch
//! Patches one GLSL shader file for a host pipeline and prints the result.
//!
//! Usage:
//!   shaderpatch `<path>` --mode `<mode>` --stage `<stage>` [options]

mod patching;

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use shaderpatch::{AlphaTest, Patch, ShaderAttributeInputs, ShaderType};
use shaderpatch_config::{ConfigError, Loader, ShaderPatchConfig};

use crate::patching::Request;

fn main() {
    let matches = Command::new("shaderpatch")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Patch GLSL shader-pack programs for a host rendering pipeline")
        .arg_required_else_help(true)
        .arg(
            Arg::new("path")
                .help("Path to the shader source")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("mode")
                .long("mode")
                .short('m')
                .help("Patch mode: attributes, vanilla, sodium or composite")
                .required(true)
                .value_parser(|s: &str| s.parse::<Patch>()),
        )
        .arg(
            Arg::new("stage")
                .long("stage")
                .short('s')
                .help("Shader stage: vertex, geometry, fragment or compute")
                .required(true)
                .value_parser(|s: &str| s.parse::<ShaderType>()),
        )
        .arg(
            Arg::new("geometry")
                .long("geometry")
                .help("The program has a geometry stage")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("inputs")
                .long("inputs")
                .help("Comma-separated vertex inputs the draw provides (color,tex,light,overlay,normal)")
                .default_value("")
                .value_parser(|s: &str| ShaderAttributeInputs::from_names(s.split(','))),
        )
        .arg(
            Arg::new("chunk-offset")
                .long("chunk-offset")
                .help("Vanilla: positions are offset by the chunk origin")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("alpha-test")
                .long("alpha-test")
                .help("Fragment alpha test, e.g. 'greater:0.1' (default from config)")
                .value_parser(|s: &str| s.parse::<AlphaTest>()),
        )
        .arg(
            Arg::new("position-scale")
                .long("position-scale")
                .help("Sodium: vertex position decode scale")
                .allow_negative_numbers(true)
                .value_parser(value_parser!(f32)),
        )
        .arg(
            Arg::new("position-offset")
                .long("position-offset")
                .help("Sodium: vertex position decode offset")
                .allow_negative_numbers(true)
                .value_parser(value_parser!(f32)),
        )
        .arg(
            Arg::new("texture-scale")
                .long("texture-scale")
                .help("Sodium: texture coordinate decode scale")
                .allow_negative_numbers(true)
                .value_parser(value_parser!(f32)),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Configuration file layered over the built-in defaults"),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .help("Log every patch call at debug level")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let debug = matches.get_flag("debug");
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if debug { "debug" } else { "warn" }),
    )
    .init();

    let config = load_config(matches.get_one::<String>("config"), debug).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });
    let request = build_request(&matches, &config);

    let path = matches.get_one::<String>("path").expect("path is required");
    let source = std::fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Cannot read {}: {}", path, e);
        std::process::exit(1);
    });

    match patching::execute(&config, &request, &source) {
        Ok(Some(patched)) => print!("{}", patched),
        Ok(None) => {}
        Err(e) => {
            eprintln!("Patch error: {}", e);
            std::process::exit(1);
        }
    }
}

fn load_config(path: Option<&String>, debug: bool) -> Result<ShaderPatchConfig, ConfigError> {
    let mut loader = Loader::new();
    if let Some(path) = path {
        loader = loader.with_file(path);
    }
    if debug {
        loader = loader.set_override("debug.log_transforms", true)?;
    }
    loader.build()
}

/// Command-line values win over the configuration
fn build_request(matches: &ArgMatches, config: &ShaderPatchConfig) -> Request {
    let alpha = match matches.get_one::<AlphaTest>("alpha-test") {
        Some(alpha) => *alpha,
        None => config.alpha_test().unwrap_or_else(|e| {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }),
    };
    let factor =
        |name: &str, default: f32| matches.get_one::<f32>(name).copied().unwrap_or(default);

    Request {
        mode: *matches.get_one::<Patch>("mode").expect("mode is required"),
        stage: *matches.get_one::<ShaderType>("stage").expect("stage is required"),
        has_geometry: matches.get_flag("geometry"),
        inputs: matches
            .get_one::<ShaderAttributeInputs>("inputs")
            .copied()
            .unwrap_or_default(),
        has_chunk_offset: matches.get_flag("chunk-offset"),
        alpha,
        position_scale: factor("position-scale", config.sodium.position_scale),
        position_offset: factor("position-offset", config.sodium.position_offset),
        texture_scale: factor("texture-scale", config.sodium.texture_scale),
    }
}
