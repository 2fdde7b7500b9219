//! `stackgen` command line: synthesize, validate and inspect the ECS stack

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use stackgen_core::{EcsStack, EcsStackParams, OutputFormat, SynthesizedStack, DEFAULT_STACK_NAME};
use tracing_subscriber::EnvFilter;

const DEFAULT_OUT_DIR: &str = "cdk.out";

fn config_arg() -> Arg {
    Arg::new("config")
        .long("config")
        .short('c')
        .value_parser(value_parser!(PathBuf))
        .help("Parameter file (.yaml, .yml, .toml or .json)")
}

fn cli() -> Command {
    Command::new("stackgen")
        .version(stackgen_core::VERSION)
        .about("Synthesize the ECS Fargate stack into a CloudFormation template")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("stack-name")
                .long("stack-name")
                .global(true)
                .default_value(DEFAULT_STACK_NAME)
                .help("Stack name, root of every construct path"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Debug logging (RUST_LOG takes precedence)"),
        )
        .subcommand(
            Command::new("synth")
                .about("Write the template and manifest")
                .arg(config_arg())
                .arg(
                    Arg::new("out")
                        .long("out")
                        .short('o')
                        .default_value(DEFAULT_OUT_DIR)
                        .value_parser(value_parser!(PathBuf))
                        .help("Output directory"),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .default_value("json")
                        .value_parser(value_parser!(OutputFormat))
                        .help("Template encoding"),
                )
                .arg(
                    Arg::new("stdout")
                        .long("stdout")
                        .action(ArgAction::SetTrue)
                        .help("Print the template instead of writing files"),
                ),
        )
        .subcommand(
            Command::new("validate")
                .about("Build and validate the stack, print a summary")
                .arg(config_arg()),
        )
        .subcommand(
            Command::new("graph")
                .about("Print deployment order and explicit dependencies")
                .arg(config_arg()),
        )
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn build_stack(matches: &ArgMatches, args: &ArgMatches) -> Result<EcsStack> {
    let name = matches
        .get_one::<String>("stack-name")
        .map_or(DEFAULT_STACK_NAME, String::as_str);
    let config = args.get_one::<PathBuf>("config").map(PathBuf::as_path);
    let params = EcsStackParams::resolve(config).with_context(|| match config {
        Some(path) => format!("loading parameters from {}", path.display()),
        None => "resolving built-in parameters".to_string(),
    })?;
    EcsStack::build(name, &params).with_context(|| format!("building stack {name}"))
}

fn synth(matches: &ArgMatches, args: &ArgMatches) -> Result<()> {
    let stack = build_stack(matches, args)?;
    let format = args.get_one::<OutputFormat>("format").copied().unwrap_or_default();
    let synthesized = SynthesizedStack::new(&stack, format).context("synthesizing stack")?;

    if args.get_flag("stdout") {
        println!("{}", synthesized.render_template()?);
        return Ok(());
    }

    let out = args
        .get_one::<PathBuf>("out")
        .map_or_else(|| Path::new(DEFAULT_OUT_DIR), PathBuf::as_path);
    let written = synthesized
        .write_to(out)
        .with_context(|| format!("writing cloud assembly to {}", out.display()))?;
    for path in written {
        println!("{}", path.display());
    }
    Ok(())
}

fn validate(matches: &ArgMatches, args: &ArgMatches) -> Result<()> {
    let stack = build_stack(matches, args)?;
    let synthesis = stack.synth().context("validating stack")?;
    let report = synthesis.graph.report();

    println!("Stack: {}", stack.name());
    println!("Environment: {}", stack.env());
    println!("Constructs: {}", report.node_count);
    println!("Resources: {}", report.resource_count);
    println!("Declared edges: {}", report.declared_edge_count);
    println!("Resource edges: {}", report.resource_edge_count);
    println!("Fingerprint: {}", report.fingerprint);
    Ok(())
}

fn graph(matches: &ArgMatches, args: &ArgMatches) -> Result<()> {
    let stack = build_stack(matches, args)?;
    let synthesized = SynthesizedStack::new(&stack, OutputFormat::Json).context("synthesizing stack")?;
    let manifest = synthesized.manifest();

    println!("Deployment order:");
    for (i, logical_id) in manifest.deployment_order.iter().enumerate() {
        println!("  {:>3}. {logical_id}", i + 1);
    }
    println!();
    println!("Explicit dependencies:");
    for (logical_id, depends_on) in &manifest.explicit_dependencies {
        println!("  {logical_id} -> {}", depends_on.join(", "));
    }
    Ok(())
}

fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("verbose"));

    match matches.subcommand() {
        Some(("synth", args)) => synth(&matches, args),
        Some(("validate", args)) => validate(&matches, args),
        Some(("graph", args)) => graph(&matches, args),
        _ => Ok(()),
    }
}
