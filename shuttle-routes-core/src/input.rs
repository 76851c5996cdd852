//! Documents handed to the engine by the crawling and OCR collaborators.
//!
//! Both the nested artifact files and the flat per-record shapes are accepted; the
//! camelCase aliases cover records produced by other tooling.

use serde::{Deserialize, Serialize};

/// Text recovered from one scanned document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrDocument {
    #[serde(default)]
    pub success: bool,
    #[serde(default, alias = "fullText")]
    pub full_text: String,
    #[serde(default)]
    pub filename: Option<String>,
}

/// One route-bearing text fragment scraped from a notice page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlFragment {
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default, alias = "rawText")]
    pub raw_text: String,
    #[serde(default, alias = "sourceUrl")]
    pub source: Option<String>,
}

/// `ocr_results.json` as written by the OCR collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrResults {
    #[serde(default)]
    pub results: Vec<OcrDocument>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrawlPage {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub routes: Vec<CrawlFragment>,
}

/// `crawl_results.json` as written by the crawler.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrawlResults {
    #[serde(default)]
    pub main_results: Vec<CrawlPage>,
    #[serde(default)]
    pub district_results: Vec<CrawlPage>,
}

/// A single unit of raw input, in either collaborator shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceInput {
    Document(OcrDocument),
    Fragment(CrawlFragment),
}

impl From<OcrResults> for Vec<SourceInput> {
    fn from(results: OcrResults) -> Self {
        results
            .results
            .into_iter()
            .map(SourceInput::Document)
            .collect()
    }
}

impl From<CrawlResults> for Vec<SourceInput> {
    fn from(results: CrawlResults) -> Self {
        let main = results.main_results.into_iter();
        // District pages name the page URL, not the fragment, as the source.
        let district = results.district_results.into_iter().map(|mut page| {
            for fragment in &mut page.routes {
                if page.url.is_some() {
                    fragment.source = page.url.clone();
                }
            }
            page
        });
        main.chain(district)
            .flat_map(|page| page.routes)
            .map(SourceInput::Fragment)
            .collect()
    }
}
