// src/analyzer/mod.rs
// =============================================================================
// Everything that happens after the page has been downloaded.
//
// Submodules:
// - document: CSS-selector queries over the parsed HTML
// - page: version, title, headings, login form, and the list of hrefs
// - links: internal/external classification and reachability probes
// =============================================================================

mod document;
mod links;
mod page;

pub use links::LinkAnalyzer;
pub use page::PageAnalyzer;
