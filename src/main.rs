use std::fs;
use std::process;

use clap::Parser;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use wisp::ast::Value;
use wisp::evaluator::{Environment, run};

/// wisp is a minimal dynamically-typed lisp interpreter.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Start an interactive session.
    #[arg(short, conflicts_with_all = ["command", "file"])]
    interactive: bool,

    /// Evaluate a source string.
    #[arg(short, value_name = "SOURCE", conflicts_with = "file")]
    command: Option<String>,

    /// Read and evaluate a source file.
    #[arg(short, value_name = "PATH")]
    file: Option<String>,
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err)
            if matches!(
                err.kind(),
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
            ) =>
        {
            err.exit()
        }
        Err(_) => {
            eprintln!("invalid arguments");
            process::exit(1);
        }
    };

    let mut env = Environment::new();
    env.set(
        "cmd-args",
        Value::List(std::env::args().map(Value::String).collect()),
    );

    let result = if args.interactive {
        repl(&mut env);
        Ok(Value::Unit)
    } else if let Some(source) = args.command {
        run(&source, &mut env)
    } else if let Some(path) = args.file {
        match fs::read_to_string(&path) {
            Ok(source) => run(&source, &mut env),
            Err(_) => {
                eprintln!("could not open file");
                process::exit(1);
            }
        }
    } else {
        repl(&mut env);
        Ok(Value::Unit)
    };

    if let Err(err) = result {
        eprintln!("{err}");
        process::exit(1);
    }
}

/// The interactive loop. Successful lines echo their result's debug form
/// and accumulate in a session buffer that `!export` can write to a file.
fn repl(env: &mut Environment) {
    let Ok(mut editor) = DefaultEditor::new() else {
        eprintln!("could not initialize terminal");
        return;
    };
    let mut session = String::new();

    loop {
        match editor.readline(">>> ") {
            Ok(line) => match line.as_str() {
                "" => {}
                "!q" | "!quit" => break,
                "!e" | "!env" => println!("{env}"),
                "!x" | "!export" => {
                    if let Ok(path) = editor.readline("File to export to: ")
                        && fs::write(path.trim(), &session).is_err()
                    {
                        eprintln!("could not open file");
                    }
                }
                _ => {
                    let _ = editor.add_history_entry(&line);
                    match run(&line, env) {
                        Ok(value) => {
                            println!(" => {value:?}");
                            session.push_str(&line);
                            session.push('\n');
                        }
                        Err(err) => eprintln!("{err}"),
                    }
                }
            },
            Err(ReadlineError::Eof | ReadlineError::Interrupted) => break,
            Err(err) => {
                eprintln!("{err}");
                break;
            }
        }
    }
}
