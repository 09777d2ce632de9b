use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use env_logger::Env;
use findex::engine::{Delivery, Engine};
use findex::query::SearchMode;
use findex::sort::{SortDirection, SortKey};
use findex::store;
use pico_args::Arguments;

const USAGE: &str = "usage: findex [--root DIR] [--index DIR] [--index-file PATH] \
[--sort type|date] [--desc] [--no-index] [TERM]";

fn main() {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("warn"))
        .format_timestamp_secs()
        .try_init();

    if let Err(err) = run() {
        eprintln!("findex: {err}");
        process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let mut args = Arguments::from_env();

    if args.contains(["-h", "--help"]) {
        println!("{USAGE}");
        return Ok(());
    }

    let index_dir: Option<String> = args
        .opt_value_from_str("--index")
        .map_err(|err| err.to_string())?;
    let index_file: Option<String> = args
        .opt_value_from_str("--index-file")
        .map_err(|err| err.to_string())?;
    let root_arg: Option<String> = args
        .opt_value_from_str("--root")
        .map_err(|err| err.to_string())?;
    let sort_arg: Option<String> = args
        .opt_value_from_str("--sort")
        .map_err(|err| err.to_string())?;
    let descending = args.contains("--desc");
    let no_index = args.contains("--no-index");

    let term: Option<String> = args.opt_free_from_str().map_err(|err| err.to_string())?;

    let leftover = args.finish();
    if !leftover.is_empty() {
        let extras: Vec<String> = leftover
            .into_iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        return Err(format!("unexpected arguments: {}", extras.join(" ")));
    }

    let sort_key = match sort_arg.as_deref() {
        None => SortKey::None,
        Some("type") => SortKey::Type,
        Some("date") => SortKey::Date,
        Some(other) => return Err(format!("unknown sort key {other:?} (expected type or date)")),
    };
    let direction = if descending {
        SortDirection::Desc
    } else {
        SortDirection::Asc
    };

    let index_path = match index_file {
        Some(raw) => PathBuf::from(expand_path(&raw)?),
        None => store::default_index_path(),
    };

    let mut engine = Engine::new(index_path);
    engine.set_sort(sort_key, direction);

    if let Some(raw) = index_dir {
        let root = resolve_directory(&raw)?;
        rebuild_index(&mut engine, &root)?;
        if term.is_none() {
            return Ok(());
        }
    } else if !no_index {
        if let Some(warning) = engine.load_index_if_present() {
            eprintln!("findex: warning: {warning}");
        }
    }

    let Some(term) = term else {
        return Err(format!("missing search term\n{USAGE}"));
    };

    let root = match root_arg {
        Some(raw) => resolve_directory(&raw)?,
        None => std::env::current_dir().map_err(|err| err.to_string())?,
    };

    engine
        .search(&term, &root)
        .map_err(|err| err.to_string())?;

    loop {
        match engine.wait(Duration::from_secs(1)) {
            Some(Delivery::Search { hits, mode }) => {
                if mode == SearchMode::Indexed {
                    eprintln!(
                        "findex: searching the persisted index, not {}",
                        root.display()
                    );
                }
                for hit in &hits {
                    println!("{}\t{}\t{}", hit.path.display(), hit.type_label, hit.modified);
                }
                return Ok(());
            }
            Some(Delivery::Index { .. }) => {}
            None if engine.is_running() => {}
            None => return Ok(()),
        }
    }
}

fn rebuild_index(engine: &mut Engine, root: &Path) -> Result<(), String> {
    engine
        .index_directory(root)
        .map_err(|err| err.to_string())?;

    loop {
        match engine.wait(Duration::from_secs(1)) {
            Some(Delivery::Index {
                entries,
                persist_error,
            }) => {
                if let Some(message) = persist_error {
                    return Err(format!(
                        "indexed {entries} entries but could not persist: {message}"
                    ));
                }
                println!(
                    "Indexed {entries} entries under {} into {}",
                    root.display(),
                    engine.index_path().display()
                );
                return Ok(());
            }
            Some(Delivery::Search { .. }) => {}
            None if engine.is_running() => {}
            None => return Ok(()),
        }
    }
}

fn resolve_directory(raw: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(expand_path(raw)?);
    if !path.exists() {
        return Err(format!("{} does not exist", path.display()));
    }
    if !path.is_dir() {
        return Err(format!("{} is not a directory", path.display()));
    }
    path.canonicalize()
        .map_err(|err| format!("failed to canonicalize {}: {err}", path.display()))
}

fn expand_path(raw: &str) -> Result<String, String> {
    shellexpand::full(raw)
        .map(|cow| cow.into_owned())
        .map_err(|err| err.to_string())
}
