use clap::{Parser, ValueEnum};
use codegen::RenderError;
use compiler::{Options, Session};
use log::debug;
use serde_json::{Map, Value};
use source::diagnostics::Diagnostic;

use std::fs;
use std::path::PathBuf;
use std::process;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Emit {
    /// Rendered markup
    Html,
    /// A standalone JavaScript render function
    Client,
    Tokens,
    Ast,
    /// The compiled program as JSON
    Program,
}

#[derive(Parser)]
#[command(name = "made", about = "Compile and render made templates")]
struct Cli {
    /// Template to compile
    #[arg()]
    template: PathBuf,

    /// Root directory module references resolve against
    #[arg(long)]
    basedir: Option<PathBuf>,

    /// JSON file with compilation options
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON file with the input context
    #[arg(long)]
    locals: Option<PathBuf>,

    /// Indent non-inline tags
    #[arg(long)]
    pretty: bool,

    /// Also report every extended and included template
    #[arg(long)]
    dep: bool,

    /// Instance name of the template
    #[arg(long)]
    instance: Option<String>,

    #[arg(long, value_enum, default_value = "html")]
    emit: Emit,

    #[arg(short, long)]
    verbose: bool,
}

enum Failure {
    Diagnostic(Diagnostic),
    Render(RenderError),
    Other(String),
}

impl From<Diagnostic> for Failure {
    fn from(diagnostic: Diagnostic) -> Self {
        Failure::Diagnostic(diagnostic)
    }
}

impl From<RenderError> for Failure {
    fn from(err: RenderError) -> Self {
        Failure::Render(err)
    }
}

impl From<serde_json::Error> for Failure {
    fn from(err: serde_json::Error) -> Self {
        Failure::Other(err.to_string())
    }
}

fn options(cli: &Cli) -> Result<Options, Failure> {
    let mut options = match &cli.config {
        Some(path) => Options::from_json_file(path)?,
        None => Options::default(),
    };
    if let Some(basedir) = &cli.basedir {
        options.basedir = basedir.clone();
    }
    if let Some(instance) = &cli.instance {
        options.instance = instance.clone();
    }
    options.pretty |= cli.pretty;
    options.dep |= cli.dep;
    Ok(options)
}

fn locals(cli: &Cli) -> Result<Value, Failure> {
    let path = match &cli.locals {
        Some(path) => path,
        None => return Ok(Value::Object(Map::new())),
    };
    let text = fs::read_to_string(path)
        .map_err(|err| Failure::Other(format!("Unable to read {}: {}", path.display(), err)))?;
    serde_json::from_str(&text)
        .map_err(|err| Failure::Other(format!("Invalid locals in {}: {}", path.display(), err)))
}

fn run(cli: &Cli, session: &Session) -> Result<(), Failure> {
    let options = options(cli)?;
    debug!("{:?}", options);
    match cli.emit {
        Emit::Tokens => {
            let file = session.files().resolve(&cli.template)?;
            let tokens = session
                .files()
                .with_source(file, lexer::tokenize)
                .map_err(|err| err.for_file(file).in_file(&cli.template))?;
            println!("{}", serde_json::to_string_pretty(&tokens)?);
        }
        Emit::Ast => {
            let file = session.files().resolve(&cli.template)?;
            let document = session
                .files()
                .with_source(file, |source| parser::parse(source, Some(cli.template.as_path())))
                .map_err(|err| err.for_file(file))?;
            println!("{}", serde_json::to_string_pretty(&document)?);
        }
        Emit::Program => {
            let template = session.compile_file(&cli.template, &options)?;
            println!("{}", serde_json::to_string_pretty(template.program())?);
        }
        Emit::Client => {
            let template = session.compile_file(&cli.template, &options)?;
            println!("{}", template.to_client());
        }
        Emit::Html => {
            let template = session.compile_file(&cli.template, &options)?;
            let rendered = template.render(&locals(cli)?)?;
            if options.dep {
                println!("{}", serde_json::to_string_pretty(&rendered)?);
            } else {
                println!("{}", rendered.html);
            }
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let session = Session::new();
    if let Err(failure) = run(&cli, &session) {
        match failure {
            Failure::Diagnostic(diagnostic) => {
                let message = diagnostic.to_string();
                if diagnostic.emit_to_terminal(session.files()).is_err() {
                    eprintln!("{}", message);
                }
            }
            Failure::Render(err) => eprintln!("{}", err),
            Failure::Other(message) => eprintln!("{}", message),
        }
        process::exit(1);
    }
}
