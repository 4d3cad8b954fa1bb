use std::io;

use clap::Parser;
use clap::Subcommand;
use miette::IntoDiagnostic;
use miette::WrapErr;
use supercalc::{Environment, Lexer, Shell, calculate, parse, rewrite};

#[derive(Parser, Debug)]
#[command(version, about = "Command-line scientific calculator")]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Digits printed after the decimal point (0..=30).
    #[arg(short, long, global = true, default_value_t = supercalc::eval::DEFAULT_PRECISION)]
    precision: usize,

    /// Repeat for more log output (info, debug, trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Start the interactive shell (the default).
    Repl,
    /// Evaluate a single expression or assignment.
    Eval { expression: String },
    /// Print the tokens of an expression.
    Tokenize { expression: String },
    /// Print the call-rewritten text and the RPN program of an expression.
    Rpn { expression: String },
}

fn main() -> miette::Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let mut env = Environment::new();
    env.set_precision(args.precision)
        .into_diagnostic()
        .wrap_err("invalid --precision")?;

    match args.command.unwrap_or(Commands::Repl) {
        Commands::Repl => {
            let stdin = io::stdin();
            Shell::new(env)
                .run(stdin.lock(), &mut io::stdout())
                .into_diagnostic()
                .wrap_err("shell i/o failed")?;
        }
        Commands::Eval { expression } => {
            let evaluation = calculate(expression.trim(), &mut env)?;
            let precision = env.precision();
            println!("= {:.precision$}", evaluation.value());
        }
        Commands::Tokenize { expression } => {
            for token in Lexer::new(&expression) {
                println!("{}", token?);
            }
            println!("EOF  null");
        }
        Commands::Rpn { expression } => {
            let rewritten = rewrite::rewrite_calls(expression.trim())?;
            let rpn = parse::parse(&rewritten)?;
            println!("{rewritten}");
            println!("{}", parse::DisplayRpn(&rpn));
        }
    }
    Ok(())
}
