// src/services/translator.rs
//! On-demand machine translation of the repository description.
//!
//! `attach` decorates the region with an affordance. `activate` turns the
//! region text into a [`PendingTranslation`], which is consumed exactly once
//! by `complete` with whatever the transport produced.

use anyhow::{Context, Result};
use lexicon::{Document, NodeId, SelectorList};
use reqwest::blocking::Client;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::TranslatorConfig;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http client: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    Other(String),
}

/// Status and body of an answered request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationResponse {
    pub status: u16,
    pub body: String,
}

impl TranslationResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }
}

/// Carries a translation request to the remote service.
pub trait TranslationTransport {
    fn fetch(&self, url: &Url) -> Result<TranslationResponse, TransportError>;
}

/// Blocking `GET` through reqwest.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl TranslationTransport for HttpTransport {
    fn fetch(&self, url: &Url) -> Result<TranslationResponse, TransportError> {
        let response = self.client.get(url.clone()).send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        Ok(TranslationResponse { status, body })
    }
}

/// User-facing failure channel.
pub trait Notifier {
    fn notify(&self, message: &str);
}

/// Reports through the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        warn!(message, "translation notice");
    }
}

/// How an activation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationOutcome {
    /// The region had no text of its own; no request was made.
    NothingToTranslate,
    /// The response was appended to this many regions.
    Rendered(usize),
    /// The user was notified; the document is unchanged.
    Failed,
}

#[derive(Debug, Clone)]
pub struct OnDemandTranslator {
    region: SelectorList,
    endpoint: Url,
    affordance_id: String,
    label: String,
    attribution_html: String,
    failure_message: String,
}

impl OnDemandTranslator {
    pub fn from_config(cfg: &TranslatorConfig) -> Result<Self> {
        let region = SelectorList::parse(&cfg.region_selector)
            .with_context(|| format!("parsing region selector {:?}", cfg.region_selector))?;
        let endpoint = Url::parse(&cfg.endpoint)
            .with_context(|| format!("parsing translation endpoint {:?}", cfg.endpoint))?;
        Ok(Self {
            region,
            endpoint,
            affordance_id: cfg.affordance_id.clone(),
            label: cfg.label.clone(),
            attribution_html: cfg.attribution_html.clone(),
            failure_message: cfg.failure_message.clone(),
        })
    }

    fn regions(&self, doc: &Document) -> Vec<NodeId> {
        self.region.select(doc)
    }

    fn affordance_html(&self) -> String {
        format!(
            "<a id='{}' href='#' style='color:rgb(27, 149, 224);font-size: small'>{}</a>",
            self.affordance_id, self.label
        )
    }

    /// Append a line break and the affordance to every region. Returns how many
    /// regions were decorated.
    pub fn attach(&self, doc: &mut Document) -> usize {
        let regions = self.regions(doc);
        let affordance = self.affordance_html();
        for region in &regions {
            doc.append_html(*region, "<br/>");
            doc.append_html(*region, &affordance);
        }
        debug!(regions = regions.len(), "translate affordance attached");
        regions.len()
    }

    /// Collect the region text and build the request. `None` when there is nothing to send.
    pub fn activate(&self, doc: &Document) -> Option<PendingTranslation<'_>> {
        let text: String = self
            .regions(doc)
            .into_iter()
            .map(|region| doc.own_text(region))
            .collect();
        let text = text.trim();
        if text.is_empty() {
            debug!("description empty, nothing to translate");
            return None;
        }

        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("q", text);
        Some(PendingTranslation {
            translator: self,
            url,
            text: text.to_string(),
        })
    }

    /// Activate, fetch and complete in one go.
    pub fn click(
        &self,
        doc: &mut Document,
        transport: &dyn TranslationTransport,
        notifier: &dyn Notifier,
    ) -> TranslationOutcome {
        let Some(pending) = self.activate(doc) else {
            return TranslationOutcome::NothingToTranslate;
        };
        info!(url = %pending.url(), "requesting translation");
        let outcome = transport.fetch(pending.url());
        pending.complete(doc, outcome, notifier)
    }
}

/// An issued request waiting for its answer.
#[derive(Debug)]
pub struct PendingTranslation<'a> {
    translator: &'a OnDemandTranslator,
    url: Url,
    text: String,
}

impl PendingTranslation<'_> {
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Render a successful answer, or notify the user of a failed one.
    pub fn complete(
        self,
        doc: &mut Document,
        outcome: Result<TranslationResponse, TransportError>,
        notifier: &dyn Notifier,
    ) -> TranslationOutcome {
        let translator = self.translator;
        let response = match outcome {
            Ok(response) if response.status == 200 => response,
            Ok(response) => {
                warn!(status = response.status, "translation request refused");
                notifier.notify(&translator.failure_message);
                return TranslationOutcome::Failed;
            }
            Err(err) => {
                warn!(error = %err, "translation request failed");
                notifier.notify(&translator.failure_message);
                return TranslationOutcome::Failed;
            }
        };

        if let Some(affordance) = doc.get_element_by_id(&translator.affordance_id) {
            let style = hidden_style(doc.attr(affordance, "style"));
            doc.set_attribute(affordance, "style", &style);
        }

        let regions = translator.regions(doc);
        for region in &regions {
            doc.append_html(*region, &translator.attribution_html);
            doc.append_html(*region, "<br/>");
            doc.append_html(*region, &response.body);
        }
        info!(regions = regions.len(), "translation rendered");
        TranslationOutcome::Rendered(regions.len())
    }
}

fn hidden_style(existing: Option<&str>) -> String {
    match existing.map(|s| s.trim().trim_end_matches(';')) {
        Some(rest) if !rest.is_empty() => format!("{rest}; display: none;"),
        _ => "display: none;".to_string(),
    }
}
