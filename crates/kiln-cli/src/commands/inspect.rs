//! `kiln locate`, `kiln cat`, `kiln list`, `kiln home` — classpath inspection.

use anyhow::bail;
use kiln_classpath::PathEntry;
use std::io::{self, Write};

use super::Context;
use crate::home::HOME_ENV;

/// Print the locator a resource resolves to.
pub fn locate(ctx: &Context, name: &str) -> anyhow::Result<()> {
    let classpath = ctx.open_classpath()?;
    match classpath.resolve_locator(name) {
        Some(locator) => {
            println!("{}", locator);
            Ok(())
        }
        None => bail!("resource not found: {}", name),
    }
}

/// Copy a resource to stdout.
pub fn cat(ctx: &Context, name: &str) -> anyhow::Result<()> {
    let classpath = ctx.open_classpath()?;
    let Some(mut stream) = classpath.open_stream(name) else {
        bail!("resource not found: {}", name);
    };
    let mut stdout = io::stdout().lock();
    io::copy(&mut stream, &mut stdout)?;
    stdout.flush()?;
    Ok(())
}

/// Print classified entries and the archive index.
pub fn list(ctx: &Context) -> anyhow::Result<()> {
    let classpath = ctx.open_classpath()?;

    println!("Classpath:");
    for entry in classpath.entries() {
        let kind = match entry {
            PathEntry::Directory(_) => "dir",
            PathEntry::Archive(_) => "archive",
        };
        println!("  {:<8} {}", kind, entry.path().display());
    }

    println!();
    println!("Archive index ({} resources):", classpath.index_len());
    for name in classpath.indexed_names() {
        if let Some(archive) = classpath.owner_of(name) {
            println!("  {:<48} {}", name, archive.path().display());
        }
    }

    let image = classpath.parent();
    if !image.is_empty() {
        println!();
        println!("Runtime image: {} resources", image.len());
    }
    Ok(())
}

/// Print the runtime home directory.
pub fn home(ctx: &Context) -> anyhow::Result<()> {
    match ctx.home() {
        Some(home) => {
            println!("{}", home.display());
            Ok(())
        }
        None => bail!("no runtime home: set {} or image.home in the config", HOME_ENV),
    }
}
