use std::path::PathBuf;

use clap::{ArgAction, Parser};
use log::LevelFilter;

#[derive(Parser)]
#[command(name = "iloc")]
#[command(about = "Local register allocation and scheduling analysis for ILOC blocks")]
pub struct Cli {
    /// ILOC source file
    pub file: PathBuf,

    /// Print the token stream
    #[arg(short, long, group = "mode")]
    pub lexer: bool,

    /// Print the parsed block
    #[arg(short, long, group = "mode")]
    pub pretty_print: bool,

    /// Print the parsed block as a table (default)
    #[arg(short, long, group = "mode")]
    pub table_print: bool,

    /// Print the block in virtual registers after next-use analysis
    #[arg(short, long, group = "mode")]
    pub rename: bool,

    /// Allocate with K physical registers and print the result
    #[arg(short = 'k', long, value_name = "K", group = "mode")]
    pub registers: Option<usize>,

    /// Print the dependency graph with critical-path weights
    #[arg(short, long, group = "mode")]
    pub schedule: bool,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, action = ArgAction::Count)]
    pub verbose: u8,
}

/// The phase selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Lexer,
    PrettyPrint,
    Table,
    Rename,
    Allocate(usize),
    Schedule,
}

impl Cli {
    pub fn parse() -> Self {
        Parser::parse()
    }

    pub fn mode(&self) -> Mode {
        if self.lexer {
            Mode::Lexer
        } else if self.pretty_print {
            Mode::PrettyPrint
        } else if self.rename {
            Mode::Rename
        } else if let Some(k) = self.registers {
            Mode::Allocate(k)
        } else if self.schedule {
            Mode::Schedule
        } else {
            Mode::Table
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}
