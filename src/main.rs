use anyhow::Context;
use barebones::{errors::Result, parse, write_all, Debugger, Interpreter};
use clap::Parser;
use log::info;
use std::fs;
use std::path::PathBuf;

/// Format, transpile and run a BareBones program.
#[derive(Debug, Parser)]
#[command(name = "barebones", version)]
struct Cli {
    /// BareBones source file
    file: PathBuf,

    /// Directory the five output files are written to
    #[arg(short, long, default_value = "bareBones")]
    out_dir: PathBuf,

    /// Activate a breakpoint on this line before running (repeatable)
    #[arg(short = 'b', long = "break", value_name = "LINE")]
    breakpoints: Vec<usize>,

    /// Run without the interactive debug console
    #[arg(long)]
    headless: bool,

    /// Only write the output files
    #[arg(long)]
    no_run: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let source = fs::read_to_string(&cli.file)
        .with_context(|| format!("could not read {}", cli.file.display()))?;
    let program =
        parse(&source).with_context(|| format!("could not parse {}", cli.file.display()))?;
    info!("parsed {}", cli.file.display());

    fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("could not create {}", cli.out_dir.display()))?;
    write_all(&program, &cli.out_dir).context("could not write output files")?;

    if cli.no_run {
        return Ok(());
    }

    let interpreter = Interpreter::new(&program);
    let outcome = if cli.headless {
        interpreter.run()
    } else {
        let mut debugger = Debugger::stdio();
        for line in &cli.breakpoints {
            debugger.set_breakpoint(*line);
        }
        interpreter.run_debug(&mut debugger)
    };
    outcome.context("program failed")?;

    for var in program.root_block().locals.values() {
        match var.value() {
            Some(value) => println!("{} = {}", var.name(), value),
            None => println!("{} is uninitialised", var.name()),
        }
    }
    Ok(())
}
