use std::fs;
use std::process;

use iloc::cli::{Cli, Mode};
use iloc::frontend::{self, tokenizer::Tokenizer};
use iloc::ir::View;
use iloc::liveness;
use iloc::registers::{BottomUp, RegisterAllocator};
use iloc::scheduler;
use iloc::{Error, Result};

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    if let Err(err) = run(&cli) {
        eprintln!("error: {err}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let input = fs::read_to_string(&cli.file).map_err(|source| Error::Io {
        path: cli.file.clone(),
        source,
    })?;

    match cli.mode() {
        Mode::Lexer => {
            for lexeme in Tokenizer::tokenize(&input)? {
                println!("{lexeme}");
            }
        }
        Mode::PrettyPrint => print!("{}", frontend::parse(&input)?.listing(View::Source)),
        Mode::Table => print!("{}", frontend::parse(&input)?.table()),
        Mode::Rename => {
            let mut block = frontend::parse(&input)?;
            liveness::annotate(&mut block)?;
            print!("{}", block.listing(View::Virtual));
        }
        Mode::Allocate(k) => {
            let allocator = BottomUp::new(k)?;
            let mut block = frontend::parse(&input)?;
            liveness::annotate(&mut block)?;
            let allocation = allocator.allocate(&block)?;
            print!("{}", allocation.block.listing(View::Physical));
        }
        Mode::Schedule => {
            let mut block = frontend::parse(&input)?;
            liveness::annotate(&mut block)?;
            print!("{}", scheduler::analyze(&block)?);
        }
    }

    Ok(())
}
