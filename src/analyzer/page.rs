// src/analyzer/page.rs
// =============================================================================
// Turns a downloaded page into a PageReport.
//
// Steps:
// 1. Read the facts we can get from the markup alone (version, title,
//    headings, login form) and collect every <a href> value
// 2. Hand the hrefs to the LinkAnalyzer, which classifies and probes them
// 3. Assemble the report
//
// Step 1 runs synchronously and drops the parsed document before step 2
// awaits anything; scraper's tree is not Send.
// =============================================================================

use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;

use super::document::{compile_selector, Document};
use super::links::LinkAnalyzer;
use crate::error::AnalyzeError;
use crate::report::{HtmlVersion, PageFacts, PageReport, HEADING_LEVELS};

// Signatures are matched against the lower-cased body with whitespace runs
// collapsed. Order matters: the first hit wins.
const VERSION_SIGNATURES: [(&str, HtmlVersion); 3] = [
    ("<!doctype html>", HtmlVersion::Html5),
    ("-//w3c//dtd html 4.01", HtmlVersion::Html401),
    ("-//w3c//dtd xhtml", HtmlVersion::Xhtml),
];

/// Markup facts plus the raw link targets, before any network work.
#[derive(Debug)]
struct Markup {
    facts: PageFacts,
    hrefs: Vec<String>,
}

pub struct PageAnalyzer {
    links: LinkAnalyzer,
}

impl PageAnalyzer {
    pub fn new(links: LinkAnalyzer) -> Self {
        Self { links }
    }

    // Analyzes `body`, which was fetched from `page_url`
    //
    // Parameters:
    //   cancel: passed on to the link prober
    //   body: raw page bytes as downloaded
    //   page_url: where the body came from; the base for relative links
    //
    // Returns: the assembled report, or the first error from either step
    pub async fn analyze(
        &self,
        cancel: &CancellationToken,
        body: &[u8],
        page_url: &str,
    ) -> Result<PageReport, AnalyzeError> {
        // Step 1: everything the markup alone can tell us.
        // The parsed document lives and dies inside inspect_markup
        let Markup { facts, hrefs } = inspect_markup(body)?;
        log::debug!(
            "{}: {} version, {} href(s) to check",
            page_url,
            facts.html_version,
            hrefs.len()
        );

        // Step 2: classify and probe the links (this is the slow part)
        let counts = self.links.analyze_links(cancel, page_url, &hrefs).await?;

        // Step 3: merge both halves into one immutable report
        Ok(PageReport::assemble(page_url, facts, counts))
    }
}

// Parses the body once and reads every markup fact from it
fn inspect_markup(body: &[u8]) -> Result<Markup, AnalyzeError> {
    let document = Document::parse(body);

    // The version check reads the raw text, not the parsed tree

    let facts = PageFacts {
        html_version: detect_html_version(&String::from_utf8_lossy(body)),
        title: document.find("title")?.first().text().trim().to_string(),
        heading_counts: count_headings(&document)?,
        has_login_form: has_login_form(&document)?,
    };

    // Every <a> that has an href, even an empty one, in document order
    let hrefs = document
        .find("a[href]")?
        .attrs("href")
        .into_iter()
        .map(str::to_string)
        .collect();

    Ok(Markup { facts, hrefs })
}

/// Looks for a known doctype/DTD signature in the raw markup.
pub fn detect_html_version(raw: &str) -> HtmlVersion {
    let normalized = raw
        .split_ascii_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase();

    VERSION_SIGNATURES
        .iter()
        .find(|(signature, _)| normalized.contains(signature))
        .map(|(_, version)| *version)
        .unwrap_or(HtmlVersion::Unknown)
}

fn count_headings(document: &Document) -> Result<BTreeMap<String, usize>, AnalyzeError> {
    HEADING_LEVELS
        .iter()
        .map(|level| document.find(level).map(|set| (level.to_string(), set.len())))
        .collect()
}

// A login form is any <form> holding a password field.
fn has_login_form(document: &Document) -> Result<bool, AnalyzeError> {
    let password = compile_selector("input[type='password']")?;
    let forms = document.find("form")?;

    // Bind the answer first: the iterator borrows `forms` and must be gone
    // before `forms` is dropped at the end of the function.
    let found = forms
        .iter()
        .any(|form| form.select(&password).next().is_some());
    Ok(found)
}
