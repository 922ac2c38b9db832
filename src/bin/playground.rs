//! CLI for the plugin playground.
//!
//! Usage:
//!   playground transpile <file>                   # Print the sandbox body
//!   playground tokens <file>                      # Print the parse tree
//!   playground run <file> [--settings <json>]     # Load the plugin

use std::env;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process;
use std::rc::Rc;

use async_trait::async_trait;
use futures::executor::block_on;
use log::{LevelFilter, Log, Metadata, Record};

use playground::compiler::PluginTranspiler;
use playground::parser::parse_to_token_tree;
use playground::runner::plugin::{
    ConsentDecision, ConsentDialog, FileSystemDocuments, InMemorySettings, JsonFileSettings,
    PluginLoader, RemoteLoader, ResolverOptions, SettingsStore,
};
use playground::runner::ds::value::JsValue;
use playground::runner::std_lib::console::format_args;

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

/// Asks on the terminal.
struct TerminalConsent;

#[async_trait(?Send)]
impl ConsentDialog for TerminalConsent {
    async fn ask_cdn_policy(&self, module: &str, cdn_url: &str) -> ConsentDecision {
        eprintln!(
            "`{}` is not available locally. Load it from {}? Code from the CDN runs with full access.",
            module, cdn_url
        );
        eprint!("[a]llow / [f]orbid / anything else aborts: ");
        let _ = io::stderr().flush();

        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return ConsentDecision::Abort;
        }
        match answer.trim() {
            "a" | "allow" => ConsentDecision::Allow,
            "f" | "forbid" => ConsentDecision::Forbid,
            _ => ConsentDecision::Abort,
        }
    }
}

/// The CLI has no network access; consent is still asked and persisted.
struct OfflineRemote;

#[async_trait(?Send)]
impl RemoteLoader for OfflineRemote {
    async fn load(&self, module: &str, cdn_url: &str) -> Result<JsValue, String> {
        Err(format!("cannot fetch `{}` from {} while offline", module, cdn_url))
    }
}

fn main() {
    let _ = log::set_logger(&LOGGER).map(|()| log::set_max_level(LevelFilter::Info));

    let args: Vec<String> = env::args().collect();
    match args.get(1).map(|s| s.as_str()) {
        Some("-h") | Some("--help") => print_usage(),
        Some("transpile") if args.len() == 3 => transpile(&args[2]),
        Some("tokens") if args.len() == 3 => tokens(&args[2]),
        Some("run") if args.len() == 3 => run(&args[2], None),
        Some("run") if args.len() == 5 && args[3] == "--settings" => run(&args[2], Some(&args[4])),
        _ => {
            print_usage();
            process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!("playground - plugin compiler and runner");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  playground transpile <file>                 Print the sandbox body");
    eprintln!("  playground tokens <file>                    Print the parse tree");
    eprintln!("  playground run <file> [--settings <json>]   Load the plugin and print its default export");
}

fn read_source(filename: &str) -> String {
    match fs::read_to_string(filename) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", filename, e);
            process::exit(1);
        }
    }
}

fn transpile(filename: &str) {
    let source = read_source(filename);
    let mut transpiler = PluginTranspiler::new();
    match transpiler.transpile(&source, false) {
        Ok(body) => print!("{}", body),
        Err(e) => {
            eprintln!("Transpile error: {}", e);
            process::exit(1);
        }
    }
    for diagnostic in transpiler.diagnostics() {
        eprintln!("warning: {}", diagnostic);
    }
}

fn tokens(filename: &str) {
    let source = read_source(filename);
    match parse_to_token_tree(&source) {
        Ok(tree) => println!("{}", tree),
        Err(e) => {
            eprintln!("Parse error: {}", e);
            process::exit(1);
        }
    }
}

fn run(filename: &str, settings_path: Option<&String>) {
    let source = read_source(filename);
    let settings: Rc<dyn SettingsStore> = match settings_path {
        Some(path) => match JsonFileSettings::open(Path::new(path)) {
            Ok(settings) => Rc::new(settings),
            Err(e) => {
                eprintln!("Error reading settings '{}': {}", path, e);
                process::exit(1);
            }
        },
        None => Rc::new(InMemorySettings::default()),
    };

    let resolver = ResolverOptions::new()
        .base_path(filename)
        .documents(Rc::new(FileSystemDocuments::new()))
        .settings(settings)
        .remote(Rc::new(OfflineRemote))
        .dialog(Rc::new(TerminalConsent))
        .build();
    let loader = PluginLoader::new(resolver);

    match block_on(loader.load(&source)) {
        Ok(plugin) => println!("{}", format_args(&[plugin.default_export])),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
