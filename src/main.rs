use anyhow::{anyhow, bail, Context, Result};
use isomesh_l10n::config::{self, Config};
use isomesh_l10n::i18n::{self, Catalog};
use isomesh_l10n::stats::{self, CatalogStats};
use std::ffi::OsString;
use std::path::PathBuf;
use tracing::info;

const USAGE: &str = "\
Usage: isomesh-l10n [OPTIONS] <COMMAND>

Commands:
  lookup <KEY>...       Print the translation of each key
  search <QUERY>        Fuzzy search source texts
  stats [FILE]          Show catalog completion
  untranslated [FILE]   List source texts without a translation
  dump [FILE]           Print the parsed catalog as JSON

Options:
  --config <PATH>       Configuration file
  --lang <LOCALE>       Interface locale, e.g. ru_RU
  --dir <PATH>          Directory with .ts catalogs
  -h, --help            Show this help
";

const SEARCH_LIMIT: usize = 20;

enum Command {
    Lookup(Vec<String>),
    Search(String),
    Stats(Option<PathBuf>),
    Untranslated(Option<PathBuf>),
    Dump(Option<PathBuf>),
}

struct Args {
    config: Option<PathBuf>,
    lang: Option<String>,
    dir: Option<PathBuf>,
    command: Command,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let Some(args) = parse_args()? else {
        print!("{}", USAGE);
        return Ok(());
    };

    let Args {
        config: config_path,
        lang,
        dir,
        command,
    } = args;

    let config = match &config_path {
        Some(path) => config::load_from_path(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => Config::load()?,
    };
    info!("Configuration loaded");

    match command {
        Command::Lookup(keys) => {
            i18n::install(default_catalog(&lang, &dir, &config));
            for key in &keys {
                println!("{}", i18n::tr(key));
            }
        }
        Command::Search(query) => {
            let catalog = default_catalog(&lang, &dir, &config);
            for hit in catalog.search(&query, SEARCH_LIMIT) {
                println!(
                    "{} => {}",
                    hit.entry.source,
                    catalog.lookup_in(hit.context, &hit.entry.source)
                );
            }
        }
        Command::Stats(file) => {
            let catalog = catalog_for(file, &lang, &dir, &config)?;
            let stats = CatalogStats::from_document(catalog.document());
            println!(
                "Locale: {} ({})",
                catalog.locale().unwrap_or("-"),
                catalog.language().display_name()
            );
            println!("Translated keys: {}", catalog.translated_len());
            println!("{}", stats);
            println!("Completion: {:.1}%", stats.completion_ratio() * 100.0);
        }
        Command::Untranslated(file) => {
            let catalog = catalog_for(file, &lang, &dir, &config)?;
            for (context, source) in stats::untranslated_sources(catalog.document()) {
                println!("{}\t{}", context, source);
            }
        }
        Command::Dump(file) => {
            let catalog = catalog_for(file, &lang, &dir, &config)?;
            println!("{}", catalog.document().to_json()?);
        }
    }

    Ok(())
}

/// `None` means help was requested.
fn parse_args() -> Result<Option<Args>> {
    let mut pargs = pico_args::Arguments::from_env();
    if pargs.contains(["-h", "--help"]) {
        return Ok(None);
    }

    let config = pargs.opt_value_from_str("--config")?;
    let lang = pargs.opt_value_from_str("--lang")?;
    let dir = pargs.opt_value_from_str("--dir")?;

    let Some(name) = pargs.subcommand()? else {
        bail!("Missing command\n\n{}", USAGE);
    };
    let rest = into_strings(pargs.finish())?;

    let command = match name.as_str() {
        "lookup" if !rest.is_empty() => Command::Lookup(rest),
        "search" if !rest.is_empty() => Command::Search(rest.join(" ")),
        "stats" => Command::Stats(single_path(rest)?),
        "untranslated" => Command::Untranslated(single_path(rest)?),
        "dump" => Command::Dump(single_path(rest)?),
        "lookup" | "search" => bail!("`{}` needs an argument\n\n{}", name, USAGE),
        other => bail!("Unknown command `{}`\n\n{}", other, USAGE),
    };

    Ok(Some(Args {
        config,
        lang,
        dir,
        command,
    }))
}

fn into_strings(args: Vec<OsString>) -> Result<Vec<String>> {
    args.into_iter()
        .map(|arg| {
            arg.into_string()
                .map_err(|raw| anyhow!("Argument is not valid UTF-8: {:?}", raw))
        })
        .collect()
}

fn single_path(mut rest: Vec<String>) -> Result<Option<PathBuf>> {
    if rest.len() > 1 {
        bail!("Expected at most one file, got {}", rest.len());
    }
    Ok(rest.pop().map(PathBuf::from))
}

/// Catalog for the selected locale; never fails, falls back to an empty catalog.
fn default_catalog(lang: &Option<String>, dir: &Option<PathBuf>, config: &Config) -> Catalog {
    let locale = i18n::select_locale(lang.as_deref(), config);
    let dir = dir
        .clone()
        .unwrap_or_else(|| config.translations_directory_path());
    i18n::load_for_locale(&dir, &config.catalog_prefix, &locale)
}

/// An explicitly named file must load; otherwise use the configured catalog.
fn catalog_for(
    file: Option<PathBuf>,
    lang: &Option<String>,
    dir: &Option<PathBuf>,
    config: &Config,
) -> Result<Catalog> {
    match file {
        Some(path) => Catalog::load(&path)
            .with_context(|| format!("Failed to load catalog {}", path.display())),
        None => Ok(default_catalog(lang, dir, config)),
    }
}
