// src/report.rs
// =============================================================================
// The structured result of analyzing one page, and how it is assembled.
//
// A PageReport is built once from the page facts (version, title, headings,
// login form) plus the link counts. After that it cannot be changed: fields
// are private and only readable through accessor methods.
//
// #[derive(Serialize)] lets the CLI print a report as JSON.
// =============================================================================

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Heading levels we count, h1 through h6.
pub const HEADING_LEVELS: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

/// Which HTML flavour the page declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HtmlVersion {
    #[serde(rename = "HTML5")]
    Html5,
    #[serde(rename = "HTML 4.01")]
    Html401,
    #[serde(rename = "XHTML")]
    Xhtml,
    Unknown,
}

impl fmt::Display for HtmlVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            HtmlVersion::Html5 => "HTML5",
            HtmlVersion::Html401 => "HTML 4.01",
            HtmlVersion::Xhtml => "XHTML",
            HtmlVersion::Unknown => "Unknown",
        };
        f.write_str(label)
    }
}

/// Everything the page analyzer learns from the markup alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFacts {
    pub html_version: HtmlVersion,
    pub title: String,
    /// Always holds all six heading levels.
    pub heading_counts: BTreeMap<String, usize>,
    pub has_login_form: bool,
}

/// Link totals produced by the link analyzer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkCounts {
    pub internal: usize,
    pub external: usize,
    pub unreachable: usize,
}

impl LinkCounts {
    /// Links that resolved; every one of them is either internal or external.
    pub fn resolved(&self) -> usize {
        self.internal + self.external
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageReport {
    source_url: String,
    html_version: HtmlVersion,
    title: String,
    heading_counts: BTreeMap<String, usize>,
    internal_links: usize,
    external_links: usize,
    unreachable_links: usize,
    has_login_form: bool,
}

impl PageReport {
    /// Merges the markup facts and link counts into the final report.
    pub fn assemble(source_url: impl Into<String>, facts: PageFacts, links: LinkCounts) -> Self {
        Self {
            source_url: source_url.into(),
            html_version: facts.html_version,
            title: facts.title,
            heading_counts: facts.heading_counts,
            internal_links: links.internal,
            external_links: links.external,
            unreachable_links: links.unreachable,
            has_login_form: facts.has_login_form,
        }
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn html_version(&self) -> HtmlVersion {
        self.html_version
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn heading_counts(&self) -> &BTreeMap<String, usize> {
        &self.heading_counts
    }

    pub fn internal_links(&self) -> usize {
        self.internal_links
    }

    pub fn external_links(&self) -> usize {
        self.external_links
    }

    pub fn unreachable_links(&self) -> usize {
        self.unreachable_links
    }

    pub fn has_login_form(&self) -> bool {
        self.has_login_form
    }
}
