pub mod app_config;
pub mod config;
pub mod credentials;
pub mod error;
pub mod records;
pub mod sites;

pub use app_config::{AppConfig, BrowserMode, Environment, Timings};
pub use config::{load_app_config, load_app_config_from_env};
pub use credentials::{Credentials, CredentialsMissing};
pub use error::{ConfigError, ErrorKind};
pub use records::{
    Customer, MenuProduct, MenuRow, Order, OptionGroup, PageCursor, Product, ProductDetail,
    SubmissionOutcome, Variation,
};
pub use sites::{LoginRequired, SessionProfile, SiteKind};
