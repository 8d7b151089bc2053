use clap::{Parser as ClapParser, Subcommand};
use nutmeg_lang::cli::{self, CliError, EvalOptions};
use std::io::{self, Read};

#[derive(ClapParser)]
#[command(name = "nutmeg")]
#[command(about = "Nutmeg - An embeddable expression language over JSON-like state")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate an expression against JSON state
    Eval {
        /// The expression to evaluate
        expression: String,

        /// JSON state (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Validate expression syntax without evaluating
    Check {
        /// The expression to check
        expression: String,
    },

    /// List every registered function
    Functions,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Eval {
            expression,
            input,
            pretty,
        } => run_eval(expression, input, pretty),
        Commands::Check { expression } => match cli::execute_check(&expression) {
            Ok(()) => {
                println!("Syntax is valid");
                Ok(())
            }
            Err(e) => Err(e),
        },
        Commands::Functions => {
            for name in cli::function_names() {
                println!("{}", name);
            }
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run_eval(expression: String, input: Option<String>, pretty: bool) -> Result<(), CliError> {
    let input = match input {
        Some(s) => Some(s),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(CliError::Io)?;
            Some(buffer)
        }
        None => None,
    };

    let options = EvalOptions {
        expression,
        input,
        pretty,
    };

    let output = cli::execute_eval(&options)?;
    let json = if pretty {
        serde_json::to_string_pretty(&output)
    } else {
        serde_json::to_string(&output)
    }
    .map_err(CliError::Json)?;
    println!("{}", json);
    Ok(())
}
