//! Fan-out of a report to every interested receiver.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use elr_catalog::{Catalog, CatalogReceiver};
use elr_filter::FilterContext;
use elr_map::{Mapping, MappingError, apply_mapping, build_mapping};
use elr_mapper::MapperContext;
use elr_model::{Element, FilterType, ModelError, Report, Schema, Source};
use tracing::{debug, info, info_span, warn};

use crate::error::{Result, TranslateError};

/// Element values supplied by the caller, overriding receiver and
/// element defaults during schema mapping.
pub type DefaultValues = BTreeMap<String, String>;

/// What happened to a report on its way to one receiver.
#[derive(Debug)]
pub enum ReceiverOutcome {
    /// Rows survived every stage; the report is bound to the receiver.
    Delivered(Report),
    /// A filter stage removed every row. The report is a zero-row report
    /// in the receiver's schema, still bound to the receiver.
    Empty { report: Report, stage: FilterType },
    /// The receiver's pipeline failed; siblings are unaffected.
    Failed(TranslateError),
}

/// Outcome for one candidate receiver, addressed by full name.
#[derive(Debug)]
pub struct ReceiverTranslation {
    pub receiver: String,
    pub outcome: ReceiverOutcome,
}

type MappingKey = (String, String);

/// Routes reports through each receiver's filters, schema mapping and
/// de-identification.
///
/// A translator borrows nothing mutable from its catalog; the only shared
/// state is a cache of built mappings, so one translator may serve many
/// threads.
pub struct Translator {
    catalog: Arc<Catalog>,
    mappings: RwLock<HashMap<MappingKey, Arc<Mapping>>>,
    fixed_now: Option<DateTime<Utc>>,
}

impl Translator {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            mappings: RwLock::new(HashMap::new()),
            fixed_now: None,
        }
    }

    /// Evaluate time-dependent filters and mappers at `now` instead of the
    /// system clock.
    #[must_use]
    pub fn with_fixed_time(mut self, now: DateTime<Utc>) -> Self {
        self.fixed_now = Some(now);
        self
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    fn now(&self) -> DateTime<Utc> {
        self.fixed_now.unwrap_or_else(Utc::now)
    }

    /// Translates `report` for every active receiver of its topic.
    ///
    /// Delivered reports and zero-row reports for receivers whose filters
    /// removed everything are returned; receivers whose pipeline failed are
    /// logged and left out.
    pub fn translate_by_receiver(&self, report: &Report, defaults: &DefaultValues) -> Vec<Report> {
        self.translate_by_receiver_detailed(report, defaults)
            .into_iter()
            .filter_map(|translation| match translation.outcome {
                ReceiverOutcome::Delivered(report) | ReceiverOutcome::Empty { report, .. } => {
                    Some(report)
                }
                ReceiverOutcome::Failed(_) => None,
            })
            .collect()
    }

    /// Like [`translate_by_receiver`](Self::translate_by_receiver), keeping
    /// one outcome per candidate receiver.
    pub fn translate_by_receiver_detailed(
        &self,
        report: &Report,
        defaults: &DefaultValues,
    ) -> Vec<ReceiverTranslation> {
        let topic = report.schema().topic();
        let mut translations = Vec::new();
        for entry in self.catalog.receivers_for_topic(topic) {
            if !entry.receiver().is_active() {
                debug!(receiver = entry.full_name(), "receiver inactive; skipped");
                continue;
            }
            let span = info_span!("receiver", receiver = entry.full_name());
            let _guard = span.enter();
            let outcome = match self.run(report, entry, defaults) {
                Ok(outcome) => outcome,
                Err(error) => {
                    warn!(
                        receiver = entry.full_name(),
                        %error,
                        "translation failed; receiver excluded"
                    );
                    ReceiverOutcome::Failed(error)
                }
            };
            translations.push(ReceiverTranslation {
                receiver: entry.full_name().to_string(),
                outcome,
            });
        }
        info!(
            report = %report.id(),
            topic = %topic,
            receivers = translations.len(),
            "report translated"
        );
        translations
    }

    /// Translates `report` for the receiver named `full_name`.
    ///
    /// Returns `None` when no rows survive the receiver's filters.
    pub fn translate(
        &self,
        report: &Report,
        full_name: &str,
        defaults: &DefaultValues,
    ) -> Result<Option<Report>> {
        match self.translate_receiver(report, full_name, defaults)?.outcome {
            ReceiverOutcome::Delivered(report) => Ok(Some(report)),
            ReceiverOutcome::Empty { .. } => Ok(None),
            ReceiverOutcome::Failed(error) => Err(error),
        }
    }

    /// Runs only the receiver named `full_name`, keeping its outcome.
    ///
    /// The receiver is looked up case-insensitively and translated whatever
    /// its status. Only an unknown name is an error here; pipeline failures
    /// come back as [`ReceiverOutcome::Failed`].
    pub fn translate_receiver(
        &self,
        report: &Report,
        full_name: &str,
        defaults: &DefaultValues,
    ) -> Result<ReceiverTranslation> {
        let entry = self
            .catalog
            .receiver(full_name)
            .ok_or_else(|| TranslateError::UnknownReceiver(full_name.to_string()))?;
        let span = info_span!("receiver", receiver = entry.full_name());
        let _guard = span.enter();
        let outcome = self
            .run(report, entry, defaults)
            .unwrap_or_else(ReceiverOutcome::Failed);
        Ok(ReceiverTranslation {
            receiver: entry.full_name().to_string(),
            outcome,
        })
    }

    /// The mapping from `from` to `to` under `defaults`.
    ///
    /// The schema pair's mapping is built once and cached; `defaults` are
    /// layered over it per call and never cached.
    pub fn mapping(
        &self,
        from: &Arc<Schema>,
        to: &Arc<Schema>,
        defaults: &DefaultValues,
    ) -> std::result::Result<Arc<Mapping>, MappingError> {
        let shared = self.shared_mapping(from, to)?;
        if defaults.is_empty() {
            return Ok(shared);
        }
        Ok(Arc::new(Mapping::clone(&shared).with_defaults(defaults)))
    }

    /// Number of schema pairs with a cached mapping.
    pub fn cached_mappings(&self) -> usize {
        self.mappings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn shared_mapping(
        &self,
        from: &Arc<Schema>,
        to: &Arc<Schema>,
    ) -> std::result::Result<Arc<Mapping>, MappingError> {
        let key = (from.name().to_string(), to.name().to_string());
        if let Some(mapping) = self
            .mappings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(Arc::clone(mapping));
        }

        let mapping = Arc::new(build_mapping(
            to,
            from,
            &DefaultValues::new(),
            self.catalog.mapper_registry(),
        )?);
        debug!(from = from.name(), to = to.name(), "mapping built");
        let mut cache = self
            .mappings
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(cache.entry(key).or_insert(mapping)))
    }

    fn run(
        &self,
        report: &Report,
        entry: &CatalogReceiver,
        defaults: &DefaultValues,
    ) -> Result<ReceiverOutcome> {
        let receiver = entry.receiver();
        let full_name = entry.full_name();
        let report_error = |source: ModelError| TranslateError::Report {
            receiver: full_name.to_string(),
            source,
        };
        let now = self.now();
        let filter_ctx = FilterContext::at(now);

        let mut current = report.clone();
        for kind in FilterType::ALL {
            let Some(stage) = entry.stage(kind) else {
                if kind == FilterType::Quality {
                    info!(receiver = full_name, "no quality filter applies; stage skipped");
                }
                continue;
            };
            let outcome = stage
                .list()
                .apply(current.data(), &filter_ctx)
                .map_err(|source| TranslateError::Filter {
                    receiver: full_name.to_string(),
                    kind,
                    source,
                })?;
            let before = current.item_count();
            let reverse = kind == FilterType::Quality && receiver.reverse_the_quality_filter;
            let selection = if reverse {
                outcome.selection.invert()
            } else {
                outcome.selection
            };
            current = current
                .filtered(&selection, kind.as_str())
                .map_err(report_error)?;

            if kind == FilterType::Quality {
                let after = current.item_count();
                if after < before {
                    warn!(
                        receiver = full_name,
                        before,
                        after,
                        reversed = reverse,
                        "data quality filter removed rows"
                    );
                }
                current = current.with_item_count_before_quality_filter(before);
            }

            if current.is_empty() {
                debug!(receiver = full_name, stage = %kind, "no rows left");
                let mut empty = Report::empty(
                    Arc::clone(entry.schema()),
                    vec![Source::derived(current.id(), kind.as_str())],
                )
                .map_err(report_error)?;
                if let Some(count) = current.item_count_before_quality_filter() {
                    empty = empty.with_item_count_before_quality_filter(count);
                }
                return Ok(ReceiverOutcome::Empty {
                    report: empty.bind(Arc::clone(receiver)),
                    stage: kind,
                });
            }
        }

        if current.schema().name() != entry.schema().name() {
            let mut merged = receiver
                .translation
                .default_values()
                .cloned()
                .unwrap_or_default();
            merged.extend(
                defaults
                    .iter()
                    .map(|(name, value)| (name.clone(), value.clone())),
            );

            let mapping_error = |source: MappingError| TranslateError::Mapping {
                receiver: full_name.to_string(),
                source,
            };
            let mapping = self
                .mapping(current.schema(), entry.schema(), &merged)
                .map_err(mapping_error)?;
            if !mapping.is_complete() {
                let missing: Vec<String> = mapping
                    .missing
                    .iter()
                    .filter_map(|name| entry.schema().find_element(name))
                    .map(Element::field_mapping)
                    .collect();
                warn!(
                    receiver = full_name,
                    missing = ?missing,
                    "mapping is missing required elements"
                );
            }
            let mapper_ctx = MapperContext::new(now).with_tables(self.catalog.as_ref());
            current = apply_mapping(&current, &mapping, &mapper_ctx).map_err(mapping_error)?;
        }

        if receiver.deidentify {
            current = current.deidentify().map_err(report_error)?;
        }

        Ok(ReceiverOutcome::Delivered(current.bind(Arc::clone(receiver))))
    }
}

impl std::fmt::Debug for Translator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Translator")
            .field("catalog", &self.catalog)
            .field("cached_mappings", &self.cached_mappings())
            .field("fixed_now", &self.fixed_now)
            .finish()
    }
}
