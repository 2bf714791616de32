use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::info;

use crate::cache::{Caches, CounterSnapshot};
use crate::catalog::CatalogClient;
use crate::config::ResolvedConfig;
use crate::error::DexError;
use crate::fetcher::BatchFetcher;
use crate::projector::project;
use crate::resolver::Resolver;
use crate::store::Store;
use crate::table::write_table;

#[derive(Debug, Clone, Serialize)]
pub struct ExportResult {
    pub species: usize,
    pub rows: usize,
    pub output: String,
    pub cache_root: String,
    pub exported_at: String,
    pub cache: CounterSnapshot,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct App<C: CatalogClient> {
    store: Store,
    client: C,
    config: ResolvedConfig,
}

impl<C: CatalogClient> App<C> {
    pub fn new(store: Store, client: C, config: ResolvedConfig) -> Self {
        Self {
            store,
            client,
            config,
        }
    }

    /// Resolves the whole catalog, projects it and writes the table.
    /// Nothing is written unless every fetch succeeded.
    pub async fn export(&self, sink: &dyn ProgressSink) -> Result<ExportResult, DexError> {
        let start = Instant::now();
        sink.event(ProgressEvent {
            message: format!("phase=Resolve; cache at {}", self.store.cache_root()),
            elapsed: None,
        });

        let caches = Caches::new(&self.store);
        let fetcher = BatchFetcher::new(self.config.window_size, self.config.window_delay);
        let resolver = Resolver::new(
            &self.client,
            &caches,
            &fetcher,
            &self.config.language,
            self.config.species_limit,
        );
        let catalog = resolver.resolve(sink).await?;

        sink.event(ProgressEvent {
            message: "phase=Project; joining lookup tables".to_string(),
            elapsed: Some(start.elapsed()),
        });
        let rows = project(&catalog, &self.config.language);

        sink.event(ProgressEvent {
            message: format!("phase=Store; writing {}", self.config.output),
            elapsed: Some(start.elapsed()),
        });
        write_table(&self.config.output, &rows)?;

        let cache = fetcher.cache_totals();
        info!(
            rows = rows.len(),
            memory_hits = cache.memory_hits,
            disk_hits = cache.disk_hits,
            misses = cache.misses,
            "export complete"
        );

        Ok(ExportResult {
            species: catalog.species.len(),
            rows: rows.len(),
            output: self.config.output.to_string(),
            cache_root: self.store.cache_root().to_string(),
            exported_at: chrono::Utc::now().to_rfc3339(),
            cache,
        })
    }
}
