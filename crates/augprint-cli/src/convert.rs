//! Loading a file and writing its directive stream.

use std::io::Write;

use anyhow::{Context, Result};
use augprint_core::{generate, quote_value, Config, Conversion};
use augprint_tree::{collect_entries, file_root, TreeError, TreeProvider, FALLBACK_GRAMMAR};

/// How the file ended up loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loaded {
    pub filename: String,
    pub grammar: String,
    /// The grammar was named on the command line or chosen as the fallback,
    /// so replay needs an explicit `incl` for it.
    pub explicit: bool,
}

/// Loads `filename` with `lens`, or auto-detects and falls back to the
/// generic line grammar. Warnings about the fallback go to `out` as comments.
pub fn load(
    tree: &mut dyn TreeProvider,
    filename: &str,
    lens: Option<&str>,
    out: &mut dyn Write,
) -> Result<Loaded> {
    if let Some(lens) = lens {
        let grammar = tree
            .load_file(filename, Some(lens))
            .with_context(|| format!("loading {filename} with lens {lens}"))?;
        return Ok(Loaded {
            filename: filename.to_string(),
            grammar,
            explicit: true,
        });
    }

    match tree.load_file(filename, None) {
        Ok(grammar) => {
            tracing::info!(filename, grammar = %grammar, "auto-detected grammar");
            return Ok(Loaded {
                filename: filename.to_string(),
                grammar,
                explicit: false,
            });
        }
        Err(err @ TreeError::Io { .. }) => {
            return Err(err).with_context(|| format!("loading {filename}"));
        }
        Err(err) => tracing::warn!(filename, error = %err, "no usable grammar, falling back"),
    }

    writeln!(out, "# Warning: no lens for file {filename}")?;
    writeln!(out, "# Warning: using lens {FALLBACK_GRAMMAR}")?;
    let grammar = tree
        .load_file(filename, Some(FALLBACK_GRAMMAR))
        .with_context(|| format!("loading {filename} with lens {FALLBACK_GRAMMAR}"))?;
    Ok(Loaded {
        filename: filename.to_string(),
        grammar,
        explicit: true,
    })
}

/// Generates and writes the directive stream for a loaded file.
pub fn write_directives(
    tree: &dyn TreeProvider,
    loaded: &Loaded,
    config: &Config,
    out: &mut dyn Write,
) -> Result<Conversion> {
    let entries = collect_entries(tree, &loaded.filename)
        .with_context(|| format!("reading tree of {}", loaded.filename))?;
    let conversion = generate(&entries, config);

    if loaded.explicit {
        writeln!(
            out,
            "set /augeas/load/{}/incl[0]  {}",
            loaded.grammar.trim_start_matches('@'),
            quote_value(&loaded.filename)
        )?;
    }
    writeln!(out, "load-file {}", loaded.filename)?;
    for directive in &conversion.directives {
        writeln!(out, "{directive}")?;
    }
    if tree.modified_by_normalization() {
        writeln!(out, "match {}//*[modified()]", file_root(&loaded.filename))?;
    }

    tracing::debug!(
        directives = conversion.directives.len(),
        skipped = conversion.skipped,
        unresolved = conversion.unresolved.len(),
        "conversion finished"
    );
    Ok(conversion)
}
