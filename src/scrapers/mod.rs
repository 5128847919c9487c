pub mod autotrader;
pub mod cars_com;
pub mod craigslist;
pub mod page;
pub mod registry;
pub mod traits;
pub mod types;

pub use autotrader::AutoTraderScraper;
pub use cars_com::CarsComScraper;
pub use craigslist::CraigslistScraper;
pub use registry::ScraperRegistry;
pub use traits::ScraperTrait;
pub use types::{FetchReport, ScraperConfig, SearchParams};
