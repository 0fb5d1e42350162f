//! URL handling module for Site-Harvester
//!
//! Pure, side-effect-free decisions about URLs: site scoping (domain, language,
//! excluded paths), downloadable-resource classification, link resolution, and
//! content-addressed file naming.

mod classify;
mod domain;
mod filename;
mod normalize;
mod scope;

pub use classify::{CategoryTable, ResourceCategory};
pub use domain::extract_authority;
pub use filename::sanitize_filename;
pub use normalize::{parse_http_url, resolve_href};
pub use scope::{LanguagePattern, SiteScope};
