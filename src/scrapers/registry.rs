use crate::models::Source;
use crate::scrapers::traits::ScraperTrait;
use crate::scrapers::types::ScraperConfig;
use crate::scrapers::{AutoTraderScraper, CarsComScraper, CraigslistScraper};
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;

/// Source-keyed lookup of available scrapers
#[derive(Clone, Default)]
pub struct ScraperRegistry {
    scrapers: HashMap<Source, Arc<dyn ScraperTrait>>,
}

impl ScraperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with one scraper per built-in source, sharing `config`
    pub fn with_defaults(config: &ScraperConfig) -> Result<Self> {
        Ok(Self::new()
            .with(Arc::new(CarsComScraper::with_config(config.clone())?))
            .with(Arc::new(AutoTraderScraper::with_config(config.clone())?))
            .with(Arc::new(CraigslistScraper::with_config(config.clone())?)))
    }

    pub fn register(&mut self, scraper: Arc<dyn ScraperTrait>) {
        self.scrapers.insert(scraper.source(), scraper);
    }

    pub fn with(mut self, scraper: Arc<dyn ScraperTrait>) -> Self {
        self.register(scraper);
        self
    }

    pub fn get(&self, source: Source) -> Option<Arc<dyn ScraperTrait>> {
        self.scrapers.get(&source).cloned()
    }

    pub fn sources(&self) -> Vec<Source> {
        let mut sources: Vec<Source> = self.scrapers.keys().copied().collect();
        sources.sort();
        sources
    }
}
