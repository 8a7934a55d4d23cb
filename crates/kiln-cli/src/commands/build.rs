//! `kiln build` — sequence cluster initialization, then analyze roots in parallel.
//!
//! 1. Open the classpath (fatal on an unreadable archive)
//! 2. Register the configured types; each initializer defines its type from
//!    classpath bytes, then first-touches the types it `touches`
//! 3. Run the trigger sequence once, on this thread
//! 4. Spread the analysis roots over worker threads

use anyhow::{anyhow, Context as _};
use kiln_init::{InitSequencer, SequenceReport, TriggerList, TypeDef, TypeRegistry};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, info, trace};

use super::{Classpath, Context};
use crate::config::TypeConfig;

/// Command-line overrides for a build.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Fail on dependency cycles no trigger reaches.
    pub strict: bool,

    /// Replace the configured analysis roots.
    pub roots: Vec<String>,

    /// Replace the configured worker count.
    pub workers: Option<usize>,
}

/// Result of analyzing one root type.
#[derive(Debug, Clone, PartialEq)]
pub struct RootOutcome {
    pub name: String,

    /// Size of the type's bytes, or why it could not be analyzed.
    pub result: Result<usize, String>,
}

/// Everything a build produced.
#[derive(Debug)]
pub struct BuildSummary {
    pub sequence: SequenceReport,
    pub workers: usize,
    pub roots: Vec<RootOutcome>,
}

pub fn execute(ctx: &Context, options: BuildOptions) -> anyhow::Result<()> {
    let summary = run(ctx, &options)?;

    println!(
        "Initialized {} types from {} triggers ({} ms)",
        summary.sequence.initialized,
        summary.sequence.steps.len(),
        summary.sequence.elapsed.as_millis()
    );
    for step in &summary.sequence.steps {
        println!("  {:<40} +{}", step.name, step.newly_initialized);
    }

    println!(
        "Analyzed {} roots with {} workers",
        summary.roots.len(),
        summary.workers
    );
    let mut missing = 0;
    for root in &summary.roots {
        match &root.result {
            Ok(bytes) => println!("  {:<40} {} bytes", root.name, bytes),
            Err(reason) => {
                missing += 1;
                println!("  {:<40} {}", root.name, reason);
            }
        }
    }
    if missing > 0 {
        println!("{} roots could not be analyzed", missing);
    }

    Ok(())
}

/// Run the whole pipeline and return what happened.
pub fn run(ctx: &Context, options: &BuildOptions) -> anyhow::Result<BuildSummary> {
    let classpath = Arc::new(ctx.open_classpath()?);
    let registry = build_registry(&ctx.config.init.types, &classpath)?;

    let triggers = TriggerList::new(ctx.config.init.triggers.iter().cloned())
        .context("invalid trigger list")?;
    let sequence = InitSequencer::new(triggers)
        .strict(options.strict || ctx.config.init.strict)
        .run_before_analysis(&registry)
        .context("initialization sequence failed")?;

    let roots = if options.roots.is_empty() {
        ctx.config.analysis.roots.clone()
    } else {
        options.roots.clone()
    };
    let workers = options
        .workers
        .or(ctx.config.analysis.workers)
        .unwrap_or_else(num_cpus::get)
        .max(1);

    info!(roots = roots.len(), workers, "analysis started");
    let outcomes = analyze(&roots, workers, &registry, &classpath);

    Ok(BuildSummary {
        sequence,
        workers,
        roots: outcomes,
    })
}

/// Register configured types. Each initializer defines its type from the
/// classpath before touching anything else.
fn build_registry(types: &[TypeConfig], classpath: &Arc<Classpath>) -> anyhow::Result<TypeRegistry> {
    let mut registry = TypeRegistry::new();
    for ty in types {
        let classpath = Arc::clone(classpath);
        let touches = ty.touches.clone();
        let def = TypeDef::new(ty.name.clone())
            .requires(ty.requires.iter().cloned())
            .touches(ty.touches.iter().cloned())
            .with_initializer(move |ctx| {
                let bytes = classpath
                    .load_type_bytes(ctx.type_name())
                    .map_err(|e| e.to_string())?;
                trace!(type_name = ctx.type_name(), bytes = bytes.len(), "type defined");
                for name in &touches {
                    ctx.ensure_initialized(name).map_err(|e| e.to_string())?;
                }
                Ok(())
            });
        registry
            .register(def)
            .map_err(|def| anyhow!("type '{}' declared twice", def.name()))?;
    }
    Ok(registry)
}

/// Analyze roots on `workers` threads pulling from a shared cursor.
///
/// Results come back in root order.
fn analyze(
    roots: &[String],
    workers: usize,
    registry: &TypeRegistry,
    classpath: &Classpath,
) -> Vec<RootOutcome> {
    let next = AtomicUsize::new(0);
    let threads = workers.min(roots.len()).max(1);

    let mut outcomes: Vec<(usize, RootOutcome)> = thread::scope(|s| {
        let handles: Vec<_> = (0..threads)
            .map(|worker| {
                let next = &next;
                s.spawn(move || {
                    let mut done = Vec::new();
                    loop {
                        let index = next.fetch_add(1, Ordering::Relaxed);
                        let Some(root) = roots.get(index) else {
                            break;
                        };
                        debug!(worker, root = %root, "analyzing");
                        done.push((index, analyze_root(root, registry, classpath)));
                    }
                    done
                })
            })
            .collect();

        handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
            .collect()
    });

    outcomes.sort_by_key(|(index, _)| *index);
    outcomes.into_iter().map(|(_, outcome)| outcome).collect()
}

fn analyze_root(root: &str, registry: &TypeRegistry, classpath: &Classpath) -> RootOutcome {
    let result = if registry.contains(root) {
        registry
            .ensure_initialized(root)
            .map_err(|e| e.to_string())
            .and_then(|()| load(root, classpath))
    } else {
        load(root, classpath)
    };
    RootOutcome {
        name: root.to_string(),
        result,
    }
}

fn load(root: &str, classpath: &Classpath) -> Result<usize, String> {
    classpath
        .load_type_bytes(root)
        .map(|bytes| bytes.len())
        .map_err(|e| e.to_string())
}
