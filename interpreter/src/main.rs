use std::cell::RefCell;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use clap::Parser;
use reedline::{DefaultPrompt, DefaultPromptSegment, Reedline, Signal};
use sable::{AstPrinter, Environment, Error, Interpreter, Natives, Value};
use tracing_subscriber::{fmt, EnvFilter};

/// Sable - a small dynamically typed scripting language
#[derive(Parser, Debug)]
#[command(name = "sable")]
#[command(about = "Run sable scripts or start an interactive session", long_about = None)]
struct Args {
    /// Print the parsed program before evaluating it
    #[arg(long)]
    print_ast: bool,

    /// Evaluate CODE instead of a script file
    #[arg(short = 'e', long = "eval", value_name = "CODE", conflicts_with = "file")]
    eval: Option<String>,

    /// Script to run, the REPL starts when neither a file nor CODE is given
    file: Option<PathBuf>,
}

fn init_logging() {
    // SABLE_LOG takes the usual filter directives, e.g. `SABLE_LOG=sable=trace`
    let filter = EnvFilter::try_from_env("SABLE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

struct Session {
    natives: Natives,
    env: Rc<RefCell<Environment>>,
    print_ast: bool,
}

impl Session {
    fn new(print_ast: bool) -> Self {
        let stdout: Rc<RefCell<dyn Write>> = Rc::new(RefCell::new(io::stdout()));
        Session {
            natives: Natives::standard(stdout),
            env: Rc::new(RefCell::new(Environment::global())),
            print_ast,
        }
    }

    // Parse errors are reported here, the caller only learns that nothing was evaluated.
    fn run(&self, source: &str) -> Option<Value> {
        let program = match sable::parse(source) {
            Ok(program) => program,
            Err(err) => {
                report(&err);
                return None;
            }
        };

        if self.print_ast {
            println!("{}", AstPrinter.print(&program));
        }

        Some(Interpreter::new(&self.natives, Rc::clone(&self.env)).interpret(&program))
    }
}

fn report(err: &Error) {
    match err {
        Error::Parse(errors) => {
            println!("Parser errors:");
            for err in errors {
                println!("  {}", err);
            }
        }
        err => println!("Parser errors:\n  {}", err),
    }
}

fn repl(session: &Session) -> ExitCode {
    println!("sable REPL. Type 'exit' or press Ctrl+D to quit.");

    let mut line_editor = Reedline::create();
    let prompt = DefaultPrompt::new(
        DefaultPromptSegment::Basic(String::from("sable")),
        DefaultPromptSegment::Empty,
    );

    loop {
        let sig = match line_editor.read_line(&prompt) {
            Ok(sig) => sig,
            Err(err) => {
                eprintln!("Error reading input: {}", err);
                return ExitCode::FAILURE;
            }
        };

        match sig {
            Signal::Success(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "exit" {
                    println!("Goodbye!");
                    return ExitCode::SUCCESS;
                }

                match session.run(line) {
                    Some(Value::Undefined) | None => {}
                    Some(value) => println!("{}", value),
                }
            }
            Signal::CtrlD | Signal::CtrlC => {
                println!("Goodbye!");
                return ExitCode::SUCCESS;
            }
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging();

    let session = Session::new(args.print_ast);

    let source = if let Some(code) = args.eval {
        code
    } else if let Some(path) = args.file {
        match fs::read_to_string(&path) {
            Ok(source) => source,
            Err(err) => {
                eprintln!("Error reading file '{}': {}", path.display(), err);
                return ExitCode::FAILURE;
            }
        }
    } else {
        return repl(&session);
    };

    match session.run(&source) {
        Some(_) => ExitCode::SUCCESS,
        None => ExitCode::FAILURE,
    }
}
