use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use tracing::{info, info_span};

use elr_catalog::{Catalog, load_catalog};
use elr_cli::io::{read_report_file, write_report};
use elr_core::{DefaultValues, ReceiverOutcome, ReceiverTranslation, Translator, next_batch_time};

use crate::cli::{NextBatchArgs, RouteArgs, ValidateArgs};
use crate::summary::{print_catalog_summary, print_names};

/// Outcome of a `route` run.
#[derive(Debug)]
pub struct RouteResult {
    pub translations: Vec<ReceiverTranslation>,
    pub has_failures: bool,
}

pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    let catalog = open_catalog(&args.catalog)?;
    print_catalog_summary(&catalog);
    Ok(())
}

pub fn run_route(args: &RouteArgs) -> Result<RouteResult> {
    let catalog = Arc::new(open_catalog(&args.catalog)?);
    let schema = catalog
        .schema(&args.schema)
        .ok_or_else(|| anyhow!("unknown schema {:?}", args.schema))?;
    let report = read_report_file(&args.input, schema)?;
    let span = info_span!("route", report = %report.id(), rows = report.item_count());
    let _guard = span.enter();

    let defaults: DefaultValues = args.defaults.iter().cloned().collect();
    let translator = Translator::new(Arc::clone(&catalog));
    let translations = match &args.receiver {
        Some(name) => vec![translator.translate_receiver(&report, name, &defaults)?],
        None => translator.translate_by_receiver_detailed(&report, &defaults),
    };

    if let Some(dir) = &args.output_dir {
        fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
        for translation in &translations {
            if let ReceiverOutcome::Delivered(output) = &translation.outcome {
                let path = dir.join(format!("{}.csv", translation.receiver));
                let file = fs::File::create(&path)
                    .with_context(|| format!("create {}", path.display()))?;
                write_report(file, output).with_context(|| format!("write {}", path.display()))?;
                info!(receiver = %translation.receiver, path = %path.display(), "report written");
            }
        }
    }

    let has_failures = translations
        .iter()
        .any(|translation| matches!(translation.outcome, ReceiverOutcome::Failed(_)));
    Ok(RouteResult {
        translations,
        has_failures,
    })
}

pub fn run_next_batch(args: &NextBatchArgs) -> Result<()> {
    let catalog = open_catalog(&args.catalog)?;
    let entry = catalog
        .receiver(&args.receiver)
        .ok_or_else(|| anyhow!("unknown receiver {:?}", args.receiver))?;
    let timing = entry
        .receiver()
        .timing
        .as_ref()
        .ok_or_else(|| anyhow!("receiver {} has no batch timing", entry.full_name()))?;
    let next = next_batch_time(timing, Utc::now(), args.min_secs)?;
    let local = next.with_timezone(&timing.time_zone);
    println!(
        "{}: next batch at {} ({} UTC), {} per day from {}",
        entry.full_name(),
        local.format("%Y-%m-%d %H:%M:%S %Z"),
        next.format("%Y-%m-%d %H:%M:%S"),
        timing.number_per_day,
        timing.initial_batch.format("%H:%M"),
    );
    Ok(())
}

pub fn run_filters() {
    let registry = elr_filter::standard_registry();
    print_names("Filter", &registry.names());
}

pub fn run_mappers() {
    let registry = elr_mapper::standard_registry();
    print_names("Mapper", &registry.names());
}

fn open_catalog(path: &Path) -> Result<Catalog> {
    load_catalog(path).with_context(|| format!("load catalog {}", path.display()))
}
