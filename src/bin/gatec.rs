//! Command-line driver.
//!
//! Compiles one source file to a bytecode text file. Nothing is written on
//! failure: the output file is produced only after the whole program has
//! lowered and resolved cleanly.

use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "gatec", about = "Compile gate-language source to bytecode")]
struct Args {
    /// Source file to compile.
    input: PathBuf,

    /// Output bytecode file.
    #[arg(short, long, default_value = "out.gbc")]
    output: PathBuf,

    /// Print the parsed AST instead of compiling.
    #[arg(long)]
    dump_ast: bool,

    /// Print the labeled instruction stream before resolution.
    #[arg(long)]
    dump_labeled: bool,
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let source = fs::read_to_string(&args.input)?;
    let program = gatec::parse::parse(&source)?;

    if args.dump_ast {
        print!("{}", program.dump());
        return Ok(());
    }

    if args.dump_labeled {
        for line in gatec::lower_program(&program)? {
            println!("{line}");
        }
        return Ok(());
    }

    let instructions = gatec::compile_program(&program)?;
    fs::write(&args.output, gatec::inst::render(&instructions))?;
    log::info!(
        "wrote {} instructions to {}",
        instructions.len(),
        args.output.display()
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
