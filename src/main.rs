use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};

fn main() -> Result<()> {
    match std::env::args().nth(1) {
        Some(path) if Path::new(&path).is_dir() => compile_dir(Path::new(&path)),
        Some(path) => compile_file(Path::new(&path)),
        None => compile_stdin(),
    }
}

fn compile_stdin() -> Result<()> {
    let mut source = String::new();
    io::stdin()
        .read_to_string(&mut source)
        .context("Reading stdin")?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    jackc::compile_to(&source, &mut out).context("Compiling stdin")?;
    out.flush()?;
    Ok(())
}

fn compile_file(path: &Path) -> Result<()> {
    let source =
        fs::read_to_string(path).with_context(|| format!("Reading {}", path.display()))?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    jackc::compile_to(&source, &mut out)
        .with_context(|| format!("Compiling {}", path.display()))?;
    out.flush()?;
    Ok(())
}

/// Compiles every `.jack` file in `dir` to a `.vm` file beside it, one class
/// at a time.
fn compile_dir(dir: &Path) -> Result<()> {
    let mut sources = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Reading {}", dir.display()))? {
        let path = entry?.path();
        if path.extension().map_or(false, |ext| ext == "jack") {
            sources.push(path);
        }
    }
    sources.sort();

    for source_path in sources {
        let source = fs::read_to_string(&source_path)
            .with_context(|| format!("Reading {}", source_path.display()))?;
        let output = jackc::compile(&source)
            .with_context(|| format!("Compiling {}", source_path.display()))?;
        let output_path = source_path.with_extension("vm");
        fs::write(&output_path, output)
            .with_context(|| format!("Writing {}", output_path.display()))?;
    }
    Ok(())
}
