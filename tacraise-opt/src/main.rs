use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

use ariadne::{ColorGenerator, Label, Report, ReportKind, Source};
use clap::Parser as ClapParser;
use log::{error, info};
use tacir::{
    modules::{Module, parser::extend_module_from_path},
    utils::{Error, ParserError},
};
use tacraise::{
    magic::RAISE_PASS_ARGUMENT,
    pass::PassPipeline,
    utils::{conf::RaiseConfig, error::RaiseError},
};

/// Run target raising passes over a textual module.
#[derive(ClapParser)]
pub struct Arguments {
    /// Path to the input file
    #[arg(required_unless_present = "list_passes")]
    input: Option<PathBuf>,

    /// Write the rewritten module to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file (defaults to `$TACRAISE_CONFIG_PATH`, then the user
    /// configuration directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Hardware kind allowed to call into other kinds
    #[arg(long)]
    host_device: Option<String>,

    /// Pass to run, may be repeated (defaults to the raise pass)
    #[arg(long = "pass")]
    passes: Vec<String>,

    /// List registered passes and exit
    #[arg(long)]
    list_passes: bool,

    /// Skip verification of the rewritten module
    #[arg(long)]
    no_verify: bool,
}

fn report_parser_errors(errors: &[ParserError]) {
    let mut colors = ColorGenerator::new();
    let color = colors.next();

    for error in errors {
        let file = error.file.clone().unwrap_or_else(|| "<??>".to_string());
        let span = (file.clone(), error.start..error.end);
        let source = std::fs::read_to_string(&file).unwrap_or_default();

        let printed = Report::build(ReportKind::Error, span.clone())
            .with_message(&error.message)
            .with_label(
                Label::new(span)
                    .with_message("The error occurred here")
                    .with_color(color),
            )
            .finish()
            .eprint((file.clone(), Source::from(source)));
        if printed.is_err() {
            eprintln!("{}", error);
        }
    }
}

fn load_config(args: &Arguments) -> Result<RaiseConfig, RaiseError> {
    let mut config = match &args.config {
        Some(path) => RaiseConfig::load_from_toml(path)?,
        None => RaiseConfig::load_or_default(&RaiseConfig::default_path())?,
    };

    if let Some(host_device) = &args.host_device {
        config.host_device = host_device.clone();
    }
    if args.no_verify {
        config.verify_after = false;
    }
    Ok(config)
}

fn run(args: &Arguments, input: &Path) -> Result<(), RaiseError> {
    let config = load_config(args)?;

    let mut module = Module::default();
    extend_module_from_path(&mut module, input)?;
    module.verify()?;

    let arguments = if args.passes.is_empty() {
        vec![RAISE_PASS_ARGUMENT]
    } else {
        args.passes.iter().map(String::as_str).collect()
    };
    let mut pipeline = PassPipeline::from_arguments(arguments, &config)?;
    pipeline.run(&mut module)?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, module.to_string())?;
            info!("wrote {}", path.display());
        }
        None => print!("{}", module),
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Arguments::parse();

    if args.list_passes {
        for registration in PassPipeline::registered() {
            println!("{:<32} {}", registration.argument, registration.description);
        }
        return ExitCode::SUCCESS;
    }

    let Some(input) = &args.input else {
        error!("no input file given");
        return ExitCode::FAILURE;
    };

    match run(&args, input) {
        Ok(()) => ExitCode::SUCCESS,
        Err(RaiseError::Ir(Error::ParserErrors { errors })) => {
            eprintln!("Failed to parse module from {}:", input.display());
            report_parser_errors(&errors);
            ExitCode::FAILURE
        }
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}
