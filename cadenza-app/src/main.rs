//! Cadenza - parametric EQ preset manager
//!
//! Command-line front end over the preset crates: import third-party preset
//! files, export to other dialects, and browse the saved library.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cadenza_codec::{export_autoeq_text, export_poweramp_xml, export_qudelix, from_autoeq,
    import_value, AutoEqParser};
use cadenza_library::{LibraryEntry, PresetLibrary, SqliteStore};
use cadenza_preset::{builtin_presets, Preset};
use cadenza_response::{ResponseCurve, ResponseEngine};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let store = SqliteStore::open(&SqliteStore::default_path())?;
    let mut library = PresetLibrary::open(store)?;
    seed_builtins(&mut library)?;

    match args.as_slice() {
        ["import", path] => import(&mut library, Path::new(path)),
        ["export", name, format] => export(&mut library, name, format),
        ["list"] => {
            print_entries(library.entries().iter());
            Ok(())
        }
        ["search", query] => {
            print_entries(library.search(query).into_iter());
            Ok(())
        }
        ["curve", name] => curve(&library, name),
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn print_usage() {
    println!("Usage: cadenza <command>");
    println!();
    println!("Commands:");
    println!("  import <file>           Import a preset file (JSON or AutoEQ text)");
    println!("  export <name> <format>  Export a preset (autoeq | poweramp | qudelix)");
    println!("  list                    List saved presets");
    println!("  search <query>          Search presets by name, description, or source");
    println!("  curve <name>            Print the predicted frequency response");
}

/// First run: populate the library with the built-in presets.
fn seed_builtins(library: &mut PresetLibrary<SqliteStore>) -> Result<()> {
    if !library.is_empty() {
        return Ok(());
    }
    debug!("seeding built-in presets");
    for preset in builtin_presets() {
        library.add(preset)?;
    }
    Ok(())
}

fn import(library: &mut PresetLibrary<SqliteStore>, path: &Path) -> Result<()> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let preset = parse_preset_file(path, &text)?;

    let entry = library.add(preset)?;
    println!(
        "Imported {:?} ({} bands, source {:?})",
        entry.preset.name,
        entry.preset.bands.len(),
        entry.preset.source
    );
    Ok(())
}

/// JSON files go through format detection; anything else is treated as
/// AutoEQ filter text.
fn parse_preset_file(path: &Path, text: &str) -> Result<Preset> {
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Imported".to_string());

    if let Ok(doc) = serde_json::from_str::<serde_json::Value>(text) {
        return Ok(import_value(&doc)?);
    }

    let parsed = AutoEqParser::new().parse(text)?;
    Ok(from_autoeq(&name, parsed.preamp, &parsed.filters)?)
}

fn export(library: &mut PresetLibrary<SqliteStore>, name: &str, format: &str) -> Result<()> {
    let entry = library
        .find_by_name(name)
        .with_context(|| format!("no preset named {name:?}"))?;
    let preset = entry.preset.clone();
    let id = entry.id.clone();

    let rendered = match format {
        "autoeq" => export_autoeq_text(&preset),
        "poweramp" => export_poweramp_xml(&preset),
        "qudelix" => serde_json::to_string_pretty(&export_qudelix(&preset))?,
        other => bail!("unknown export format {other:?} (autoeq | poweramp | qudelix)"),
    };

    println!("{rendered}");
    library.increment_usage(&id)?;
    Ok(())
}

fn curve(library: &PresetLibrary<SqliteStore>, name: &str) -> Result<()> {
    let entry = library
        .find_by_name(name)
        .with_context(|| format!("no preset named {name:?}"))?;

    let mut engine = ResponseEngine::new();
    let curve = engine.response_for(&entry.preset.bands);
    println!("{}", render_curve(&curve));
    Ok(())
}

/// Coarse text rendering: one row per sampled frequency, a centered bar
/// spanning -12..+12 dB.
fn render_curve(curve: &ResponseCurve) -> String {
    const ROWS: usize = 24;
    const HALF_WIDTH: f64 = 24.0;
    const RANGE_DB: f64 = 12.0;

    let step = curve.frequencies.len() / ROWS;
    let mut out = String::new();
    for row in 0..ROWS {
        let i = row * step;
        let freq = curve.frequencies[i];
        let mag = curve.magnitudes_db[i];
        let offset = (mag / RANGE_DB * HALF_WIDTH)
            .round()
            .clamp(-HALF_WIDTH, HALF_WIDTH) as i64;

        let mut bar = vec![' '; (HALF_WIDTH as usize) * 2 + 1];
        let center = HALF_WIDTH as i64;
        bar[center as usize] = '|';
        let (lo, hi) = if offset < 0 {
            (center + offset, center)
        } else {
            (center, center + offset)
        };
        for cell in bar.iter_mut().take(hi as usize + 1).skip(lo as usize) {
            if *cell == ' ' {
                *cell = '#';
            }
        }

        let bar: String = bar.into_iter().collect();
        out.push_str(&format!("{freq:>8.0} Hz {bar} {mag:+6.1} dB\n"));
    }
    out
}

fn print_entries<'a>(entries: impl Iterator<Item = &'a LibraryEntry>) {
    let mut any = false;
    for entry in entries {
        any = true;
        let star = if entry.favorite { "*" } else { " " };
        println!(
            "{star} {:<24} {:<8} {:>2} bands  used {:>3}  {}",
            entry.preset.name,
            format!("{:?}", entry.preset.source).to_lowercase(),
            entry.preset.bands.len(),
            entry.usage,
            entry.id
        );
    }
    if !any {
        println!("(no presets)");
    }
}
