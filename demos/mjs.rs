use std::process;

use microjs::{Context, JSError, Repl, Value};

#[derive(clap::Parser)]
#[command(
    name = "mjs",
    version,
    about = "Evaluate JavaScript code, interactively or from a script",
    disable_version_flag = true
)]
struct Cli {
    /// Display version information and exit
    #[arg(short = 'v', long = "version", action = clap::ArgAction::Version)]
    version: Option<bool>,

    /// Script files to execute in order
    files: Vec<std::path::PathBuf>,
}

fn main() {
    let cli = <Cli as clap::Parser>::parse();
    env_logger::init();

    if cli.files.is_empty() {
        run_repl();
        return;
    }

    // All files share one context, like a shell session.
    let ctx = Context::new(true);
    for path in &cli.files {
        let source = match std::fs::read_to_string(path) {
            Ok(source) => source,
            Err(err) => {
                eprintln!("{}: {err}", path.display());
                process::exit(1);
            }
        };
        if let Err(err) = ctx.eval(&source, &path.display().to_string()) {
            eprintln!("{}", err.user_message());
            process::exit(1);
        }
    }
}

fn run_repl() {
    use rustyline::Editor;
    use rustyline::error::ReadlineError;

    let version = clap::crate_version!();
    println!("microjs v{version}. Type 'exit' or Ctrl-D to quit.");

    let mut rl = match Editor::<(), rustyline::history::FileHistory>::new() {
        Ok(editor) => editor,
        Err(err) => {
            eprintln!("failed to initialize line editor: {err}");
            process::exit(1);
        }
    };
    let history_path = std::env::var("HOME")
        .ok()
        .map(|home| std::path::PathBuf::from(home).join(".mjs_history"));
    if let Some(ref path) = history_path {
        let _ = rl.load_history(path);
    }

    let repl = Repl::new();
    let mut buffer = String::new();

    loop {
        let prompt = if buffer.is_empty() { "js> " } else { "...> " };
        match rl.readline(prompt) {
            Ok(line) => {
                if buffer.is_empty() && line.trim() == "exit" {
                    break;
                }
                if !buffer.is_empty() {
                    buffer.push('\n');
                }
                buffer.push_str(&line);

                if !Repl::is_complete_input(&buffer) {
                    continue;
                }
                if buffer.trim().is_empty() {
                    buffer.clear();
                    continue;
                }
                let _ = rl.add_history_entry(buffer.clone());

                match repl.eval(&buffer) {
                    Ok(Value::Undefined) => {}
                    Ok(value) => println!("{value}"),
                    Err(JSError::Io(err)) => eprintln!("i/o error: {err}"),
                    Err(err) => eprintln!("{}", err.user_message()),
                }
                buffer.clear();
            }
            Err(ReadlineError::Interrupted) => {
                buffer.clear();
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("readline error: {err}");
                break;
            }
        }
    }

    if let Some(ref path) = history_path {
        let _ = rl.save_history(path);
    }
}
