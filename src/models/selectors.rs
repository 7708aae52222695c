// src/models/selectors.rs

//! CSS selectors for scraping an HTML job board.

use serde::{Deserialize, Serialize};

/// Selectors for the listing (card) pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingSelectors {
    /// Element whose text starts with the reported total ("123 Jobs")
    #[serde(default = "defaults::total")]
    pub total_selector: String,

    /// Selector for each posting card
    #[serde(default = "defaults::card")]
    pub card_selector: String,

    /// Title element within a card (only its own text nodes are used)
    #[serde(default = "defaults::title")]
    pub title_selector: String,

    #[serde(default = "defaults::company")]
    pub company_selector: String,

    #[serde(default = "defaults::location")]
    pub location_selector: String,

    #[serde(default = "defaults::posted")]
    pub posted_selector: String,

    #[serde(default = "defaults::expires")]
    pub expires_selector: String,

    /// Optional badge ("New", "Featured")
    #[serde(default = "defaults::badge", skip_serializing_if = "Option::is_none")]
    pub badge_selector: Option<String>,

    /// Element carrying the posting link
    #[serde(default = "defaults::link")]
    pub link_selector: String,

    /// HTML attribute holding the link
    #[serde(default = "defaults::link_attr")]
    pub link_attr: String,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            total_selector: defaults::total(),
            card_selector: defaults::card(),
            title_selector: defaults::title(),
            company_selector: defaults::company(),
            location_selector: defaults::location(),
            posted_selector: defaults::posted(),
            expires_selector: defaults::expires(),
            badge_selector: defaults::badge(),
            link_selector: defaults::link(),
            link_attr: defaults::link_attr(),
        }
    }
}

/// Selectors and headings for the posting detail page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailSelectors {
    #[serde(default = "defaults::detail_title")]
    pub title_selector: String,

    /// Prefix stripped from the title (case-insensitive)
    #[serde(default = "defaults::title_prefix")]
    pub title_prefix: String,

    /// Rows of the key/value metadata table
    #[serde(default = "defaults::table_row")]
    pub table_row_selector: String,

    /// Heading elements that introduce text sections
    #[serde(default = "defaults::section_heading")]
    pub section_heading_selector: String,

    /// Content element directly following a section heading
    #[serde(default = "defaults::section_content")]
    pub section_content_selector: String,

    /// Nodes removed from section content before reading its text
    #[serde(default = "defaults::strip")]
    pub strip_selectors: Vec<String>,

    /// Page-level fallback for the company name
    #[serde(default = "defaults::company")]
    pub company_selector: String,

    /// Page-level posted time
    #[serde(default = "defaults::posted")]
    pub posted_selector: String,

    /// Region containing the submission email
    #[serde(default = "defaults::email_region")]
    pub email_region_selector: String,

    /// Text the email region must contain
    #[serde(default = "defaults::email_label")]
    pub email_region_label: String,

    /// Element inside the email region holding the address
    #[serde(default = "defaults::email_value")]
    pub email_value_selector: String,

    /// Section headings, keyed by the output field name
    #[serde(default = "defaults::sections")]
    pub sections: Vec<SectionHeading>,

    /// Section scanned for an email address as last resort
    #[serde(default = "defaults::guideline_heading")]
    pub guideline_heading: String,
}

impl Default for DetailSelectors {
    fn default() -> Self {
        Self {
            title_selector: defaults::detail_title(),
            title_prefix: defaults::title_prefix(),
            table_row_selector: defaults::table_row(),
            section_heading_selector: defaults::section_heading(),
            section_content_selector: defaults::section_content(),
            strip_selectors: defaults::strip(),
            company_selector: defaults::company(),
            posted_selector: defaults::posted(),
            email_region_selector: defaults::email_region(),
            email_region_label: defaults::email_label(),
            email_value_selector: defaults::email_value(),
            sections: defaults::sections(),
            guideline_heading: defaults::guideline_heading(),
        }
    }
}

/// A text section located by its heading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SectionHeading {
    /// Output field name
    pub field: String,
    /// Heading text to look for (substring match)
    pub heading: String,
}

impl SectionHeading {
    pub fn new(field: impl Into<String>, heading: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            heading: heading.into(),
        }
    }
}

mod defaults {
    use super::SectionHeading;

    pub fn total() -> String {
        "h2".into()
    }
    pub fn card() -> String {
        ".job-card".into()
    }
    pub fn title() -> String {
        ".job-title.hidden-xs".into()
    }
    pub fn company() -> String {
        ".text-muted.hidden-xs".into()
    }
    pub fn location() -> String {
        r#"span[data-original-title="Location"]"#.into()
    }
    pub fn posted() -> String {
        ".job-posted-modern".into()
    }
    pub fn expires() -> String {
        ".text-danger".into()
    }
    pub fn badge() -> Option<String> {
        Some(".new-badge".into())
    }
    pub fn link() -> String {
        ".job-box".into()
    }
    pub fn link_attr() -> String {
        "data-href".into()
    }

    pub fn detail_title() -> String {
        ".detail-title".into()
    }
    pub fn title_prefix() -> String {
        "Position Title:".into()
    }
    pub fn table_row() -> String {
        ".table-striped tr".into()
    }
    pub fn section_heading() -> String {
        "h3".into()
    }
    pub fn section_content() -> String {
        "div.job-content".into()
    }
    pub fn strip() -> Vec<String> {
        ["script", "style", "iframe", "ins", ".google-auto-placed", ".autors-widget"]
            .into_iter()
            .map(String::from)
            .collect()
    }
    pub fn email_region() -> String {
        "div.row".into()
    }
    pub fn email_label() -> String {
        "Submission Email".into()
    }
    pub fn email_value() -> String {
        "p".into()
    }
    pub fn sections() -> Vec<SectionHeading> {
        vec![
            SectionHeading::new("aboutCompany", "About"),
            SectionHeading::new("description", "Job Descriptions"),
            SectionHeading::new("requirements", "Job Requirements"),
            SectionHeading::new("submissionGuideline", "Submission Guidelines"),
        ]
    }
    pub fn guideline_heading() -> String {
        "Submission Guidelines".into()
    }
}
