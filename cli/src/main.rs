mod test_runner;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use driver::{Entry, Fields};
use rep::{Block, Template};

const SUBCOMMANDS: &[&str] = &["render", "test", "help"];

#[derive(Parser)]
#[command(name = "rep", version, about = "HTML templates with repeatable blocks")]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log parser and render transitions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a template
    Render(RenderArgs),

    /// Run .test.html test files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct RenderArgs {
    /// Template file
    file: String,

    /// TOML file with variable values and block repetitions
    #[arg(short, long)]
    data: Option<String>,

    /// Set a top-level variable (repeatable, overrides --data)
    #[arg(long = "set", value_name = "NAME=VALUE")]
    set: Vec<String>,

    /// Write output to this file instead of stdout
    #[arg(short, long)]
    output: Option<String>,

    /// Parse only, don't render (exit 0 if valid)
    #[arg(long)]
    check: bool,

    /// Print the block tree with its variables
    #[arg(long)]
    tree: bool,

    /// List the path of every block
    #[arg(long)]
    list_blocks: bool,

    /// Discard the rendered output (just check for errors)
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.html file or directory containing them
    path: String,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    // If the first positional arg is not a known subcommand, inject "render"
    // so `rep page.html` works like `rep render page.html`.
    let mut args: Vec<String> = std::env::args().collect();
    if let Some(pos) = args
        .iter()
        .skip(1)
        .position(|a| !a.starts_with('-'))
        .map(|i| i + 1)
    {
        if !SUBCOMMANDS.contains(&args[pos].as_str()) {
            args.insert(pos, "render".to_string());
        }
    }

    let cli = Cli::parse_from(&args);
    init_tracing(cli.verbose);

    match cli.command {
        Command::Render(render_args) => do_render(render_args, cli.no_color),
        Command::Test(test_args) => {
            let path = Path::new(&test_args.path);
            if test_args.list_categories {
                test_runner::list_categories(path);
                return;
            }
            let exit_code = test_runner::run_tests(path, cli.no_color, &test_args.category);
            process::exit(exit_code);
        }
    }
}

/// Logs go to stderr. `RUST_LOG` wins over the default level.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(true)
                .with_filter(filter),
        )
        .init();
}

fn do_render(args: RenderArgs, no_color: bool) {
    let color_choice = if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    let source = match std::fs::read_to_string(&args.file) {
        Ok(s) => s,
        Err(e) => fail(format!("cannot read '{}': {}", args.file, e)),
    };

    let mut files = SimpleFiles::new();
    let file_id = files.add(args.file.clone(), source.clone());

    let parser = rep::Parser::new(source, file_id);
    let mut template: Template<Box<dyn Write>> = match parser.parse() {
        Ok(t) => t,
        Err(error) => {
            let writer = StandardStream::stderr(color_choice);
            let config = term::Config::default();
            let _ = term::emit_to_write_style(
                &mut writer.lock(),
                &config,
                &files,
                &error.to_diagnostic(),
            );
            process::exit(1);
        }
    };

    if args.check {
        eprintln!("ok: {} parsed successfully", args.file);
        return;
    }

    if args.tree {
        print_tree(template.root(), 0);
        return;
    }

    if args.list_blocks {
        fn print_paths(block: &Block, prefix: &str) {
            for child in block.children() {
                let path = format!("{}{}", prefix, child.name().unwrap_or_default());
                println!("{}", path);
                print_paths(child, &format!("{}.", path));
            }
        }
        print_paths(template.root(), "");
        return;
    }

    let mut data = match &args.data {
        Some(path) => load_data(path).unwrap_or_else(|e| fail(e)),
        None => Fields::new(),
    };
    for assignment in &args.set {
        let Some((name, value)) = assignment.split_once('=') else {
            fail(format!("--set expects NAME=VALUE, got '{}'", assignment));
        };
        data.insert(name.to_string(), Entry::from(value));
    }

    let sink: Box<dyn Write> = if args.quiet {
        Box::new(io::sink())
    } else if let Some(path) = &args.output {
        match File::create(path) {
            Ok(file) => Box::new(BufWriter::new(file)),
            Err(e) => fail(format!("cannot create '{}': {}", path, e)),
        }
    } else {
        Box::new(io::stdout())
    };

    match driver::render(&mut template, &data, sink) {
        Ok(warnings) => {
            for warning in &warnings {
                eprintln!("warning: {}", warning);
            }
        }
        Err(error) => fail(error.to_string()),
    }
}

fn load_data(path: &str) -> Result<Fields, String> {
    let text =
        std::fs::read_to_string(path).map_err(|e| format!("cannot read '{}': {}", path, e))?;
    toml::from_str(&text).map_err(|e| format!("invalid data in '{}': {}", path, e))
}

fn print_tree(block: &Block, indent: usize) {
    let pad = "  ".repeat(indent);
    let label = match block.name() {
        Some(name) => format!("blk {}", name),
        None => "(root)".to_string(),
    };
    println!("{}{}", pad, label);
    for var in block.variables().iter() {
        println!("{}  var {} = {:?}", pad, var.name, var.placeholder);
    }
    for child in block.children() {
        print_tree(child, indent + 1);
    }
}

fn fail(message: String) -> ! {
    eprintln!("error: {}", message);
    process::exit(1);
}
