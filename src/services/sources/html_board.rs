// src/services/sources/html_board.rs

//! Scraped HTML job board source (wazifaha style).
//!
//! Listing pages are `{base_url}?page=N`; each card links to a detail page
//! whose metadata table and text sections are read into a [`DetailDocument`].
//! Every selector is compiled once in [`HtmlBoardSource::new`].

use async_trait::async_trait;
use scraper::{Html, Selector};
use serde_json::{Map, Value, json};
use url::Url;

use crate::error::Result;
use crate::models::{
    DetailDocument, DetailSelectors, HtmlBoardConfig, ListingPage, ListingSelectors, RawListing,
    SectionHeading,
};
use crate::services::sources::SourceAdapter;
use crate::utils::extract::{Fallback, camel_key, find_email, leading_number, non_empty};
use crate::utils::html::{
    document_text, element_text, own_text, parse_selector, parse_selectors, section_text,
    select_text, text_without,
};
use crate::utils::http::fetch_text;
use crate::utils::{resolve_url, short_hash};

/// Table fields copied into the `details` object, as (output key, table key).
const DETAIL_FIELDS: &[(&str, &str)] = &[
    ("salary", "salary"),
    ("contractDuration", "contractDuration"),
    ("gender", "gender"),
    ("education", "education"),
    ("experience", "yearsOfExperience"),
    ("category", "category"),
    ("employmentType", "employmentType"),
    ("nationality", "nationality"),
    ("noOfJobs", "no.OfJobs"),
];

struct CardSelectors {
    total: Selector,
    card: Selector,
    title: Selector,
    company: Selector,
    location: Selector,
    posted: Selector,
    expires: Selector,
    badge: Option<Selector>,
    link: Selector,
    link_attr: String,
}

impl CardSelectors {
    fn compile(s: &ListingSelectors) -> Result<Self> {
        Ok(Self {
            total: parse_selector(&s.total_selector)?,
            card: parse_selector(&s.card_selector)?,
            title: parse_selector(&s.title_selector)?,
            company: parse_selector(&s.company_selector)?,
            location: parse_selector(&s.location_selector)?,
            posted: parse_selector(&s.posted_selector)?,
            expires: parse_selector(&s.expires_selector)?,
            badge: s.badge_selector.as_deref().map(parse_selector).transpose()?,
            link: parse_selector(&s.link_selector)?,
            link_attr: s.link_attr.clone(),
        })
    }
}

struct PageSelectors {
    title: Selector,
    title_prefix: String,
    table_row: Selector,
    table_key: Selector,
    table_value: Selector,
    heading: Selector,
    content: Selector,
    strip: Vec<Selector>,
    company: Selector,
    posted: Selector,
    email_region: Selector,
    email_label: String,
    email_value: Selector,
    sections: Vec<SectionHeading>,
    guideline_heading: String,
}

impl PageSelectors {
    fn compile(s: &DetailSelectors) -> Result<Self> {
        Ok(Self {
            title: parse_selector(&s.title_selector)?,
            title_prefix: s.title_prefix.clone(),
            table_row: parse_selector(&s.table_row_selector)?,
            table_key: parse_selector("th")?,
            table_value: parse_selector("td")?,
            heading: parse_selector(&s.section_heading_selector)?,
            content: parse_selector(&s.section_content_selector)?,
            strip: parse_selectors(&s.strip_selectors)?,
            company: parse_selector(&s.company_selector)?,
            posted: parse_selector(&s.posted_selector)?,
            email_region: parse_selector(&s.email_region_selector)?,
            email_label: s.email_region_label.clone(),
            email_value: parse_selector(&s.email_value_selector)?,
            sections: s.sections.clone(),
            guideline_heading: s.guideline_heading.clone(),
        })
    }

    fn section(&self, document: &Html, heading: &str) -> Option<String> {
        section_text(document, &self.heading, &self.content, heading, &self.strip)
    }
}

/// Source backed by server-rendered listing pages.
pub struct HtmlBoardSource {
    name: String,
    client: reqwest::Client,
    base_url: Url,
    cards: CardSelectors,
    page: PageSelectors,
}

impl HtmlBoardSource {
    pub fn new(config: HtmlBoardConfig, client: reqwest::Client) -> Result<Self> {
        Ok(Self {
            base_url: Url::parse(&config.base_url)?,
            cards: CardSelectors::compile(&config.listing)?,
            page: PageSelectors::compile(&config.detail)?,
            name: config.name,
            client,
        })
    }

    fn page_url(&self, page: u32) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut().append_pair("page", &page.to_string());
        url
    }
}

#[async_trait]
impl SourceAdapter for HtmlBoardSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_page(&self, page: u32) -> Result<ListingPage> {
        let url = self.page_url(page);
        log::debug!("[{}] fetching {}", self.name, url);
        let body = fetch_text(&self.client, url.as_str()).await?;
        Ok(parse_listing_page(&body, &self.cards, &self.base_url))
    }

    async fn fetch_detail(&self, listing: &RawListing) -> Result<DetailDocument> {
        log::debug!("[{}] fetching detail {}", self.name, listing.detail_ref);
        let body = fetch_text(&self.client, &listing.detail_ref).await?;
        Ok(parse_detail(&body, &self.page, &listing.detail_ref))
    }

    /// `/jobs/25664/marketing-officer` becomes `25664-marketing-officer`.
    /// Absolute links are keyed by their path alone.
    fn record_key(&self, listing: &RawListing) -> String {
        let parsed = Url::parse(&listing.identity).ok();
        let path = parsed.as_ref().map_or(listing.identity.as_str(), Url::path);
        let parts: Vec<&str> = path
            .split('/')
            .filter(|p| !p.is_empty())
            .collect();
        match parts.as_slice() {
            [_, id, title, ..] => format!("{id}-{title}"),
            [_, id] => format!("{id}-job"),
            _ => short_hash(&listing.identity),
        }
    }

    fn posting_url(&self, listing: &RawListing) -> String {
        listing.detail_ref.clone()
    }

    fn enrichment_input(&self, listing: &RawListing, detail: &DetailDocument) -> Value {
        json!({
            "title": listing.title,
            "company": listing.company,
            "location": listing.location,
            "posted": listing.posted,
            "expiration": listing.expires,
            "details": detail.fields(),
        })
    }

    fn record_content(&self, listing: &RawListing, detail: DetailDocument) -> Map<String, Value> {
        let mut content = listing.to_object();
        content.insert("slug".into(), Value::String(self.record_key(listing)));
        content.insert("details".into(), Value::Object(detail.into_fields()));
        content
    }
}

fn parse_listing_page(body: &str, s: &CardSelectors, base: &Url) -> ListingPage {
    let document = Html::parse_document(body);
    let total = leading_number(&document_text(&document, &s.total));

    let mut items = Vec::new();
    for card in document.select(&s.card) {
        let Some(link) = card
            .select(&s.link)
            .next()
            .and_then(|el| el.value().attr(&s.link_attr))
            .and_then(non_empty)
        else {
            log::warn!("Skipping card without '{}' link", s.link_attr);
            continue;
        };

        let mut listing = RawListing::new(link.clone(), resolve_url(base, &link));
        listing.title = card
            .select(&s.title)
            .next()
            .map(own_text)
            .unwrap_or_default();
        listing.company = select_text(card, &s.company);
        listing.location = select_text(card, &s.location);
        listing.posted = select_text(card, &s.posted);
        listing.expires = select_text(card, &s.expires);
        if let Some(badge) = s.badge.as_ref().map(|b| select_text(card, b)).and_then(non_empty) {
            listing.extra.insert("badge".into(), Value::String(badge));
        }
        listing.extra.insert("link".into(), Value::String(link));
        items.push(listing);
    }

    ListingPage::new(items, total)
}

fn parse_detail(body: &str, s: &PageSelectors, url: &str) -> DetailDocument {
    let document = Html::parse_document(body);

    let title = document_text(&document, &s.title);
    let title = strip_prefix_ignore_case(&title, &s.title_prefix).to_string();

    let mut table = Map::new();
    for row in document.select(&s.table_row) {
        let key = camel_key(&select_text(row, &s.table_key));
        if !key.is_empty() {
            table.insert(key, Value::String(select_text(row, &s.table_value)));
        }
    }
    let cell = |key: &str| table.get(key).and_then(Value::as_str).and_then(non_empty);

    let email = Fallback::new()
        .or_try("table", || cell("submissionEmail"))
        .or_try("footer", || {
            document
                .select(&s.email_region)
                .filter(|region| element_text(*region).contains(&s.email_label))
                .find_map(|region| region.select(&s.email_value).next())
                .map(|p| text_without(p, &[]))
                .filter(|text| text.contains('@'))
        })
        .or_try("guidelines", || {
            s.section(&document, &s.guideline_heading)
                .as_deref()
                .and_then(find_email)
        })
        .resolve();

    let company = Fallback::new()
        .or_try("table", || cell("organization"))
        .or_try("page", || non_empty(document_text(&document, &s.company)))
        .resolve();
    let location = Fallback::new()
        .or_try("jobLocation", || cell("jobLocation"))
        .or_try("city", || cell("city"))
        .resolve();

    let mut details = Map::new();
    for &(out_key, table_key) in DETAIL_FIELDS {
        if let Some(value) = cell(table_key) {
            details.insert(out_key.to_string(), Value::String(value));
        }
    }

    let mut fields = Map::new();
    let mut put = |key: &str, value: Option<String>| {
        if let Some(value) = value {
            fields.insert(key.to_string(), Value::String(value));
        }
    };
    put("title", non_empty(title));
    put("company", company);
    put("location", location);
    put("closeDate", cell("closeDate"));
    put("postedDate", non_empty(document_text(&document, &s.posted)));
    put("vacancyNumber", cell("vacancyNumber"));
    for section in &s.sections {
        put(&section.field, s.section(&document, &section.heading));
    }
    put("submissionEmail", email);
    put("url", Some(url.to_string()));
    fields.insert("details".into(), Value::Object(details));

    DetailDocument::new(fields)
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> &'a str {
    match text.get(..prefix.len()) {
        Some(head) if !prefix.is_empty() && head.eq_ignore_ascii_case(prefix) => {
            text[prefix.len()..].trim_start()
        }
        _ => text,
    }
}
