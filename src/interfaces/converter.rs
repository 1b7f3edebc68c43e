use log::{debug, error, info, warn};

use crate::error::Result;
use crate::generator::render_proxies;
use crate::models::{
    Batch, ClashDocument, ConversionReport, ConversionResult, Diagnostic, OutputMode, Proxy,
};
use crate::parser::explodes::{common::link_label, explode, implode};
use crate::parser::parse_clash_yaml;

/// Turn a Clash document into share links, one per line, in document order.
///
/// Entries that cannot be read or cannot be expressed as a link are skipped
/// and listed in the report. The call itself fails only when the document
/// has no readable proxy list.
pub fn document_to_links(content: &str) -> Result<ConversionReport> {
    let ClashDocument {
        proxies,
        mut skipped,
        ..
    } = parse_clash_yaml(content)?;

    let mut links = Vec::with_capacity(proxies.len());
    for proxy in &proxies {
        match implode(proxy) {
            Ok(link) => links.push(link),
            Err(e) => {
                warn!("Cannot build a link for proxy '{}': {}", proxy.name, e);
                skipped.push(Diagnostic::new(proxy.name.clone(), e));
            }
        }
    }

    info!(
        "Converted {} proxies to links ({} skipped)",
        links.len(),
        skipped.len()
    );
    Ok(ConversionReport {
        converted: links.len(),
        output: links.join("\n"),
        skipped,
    })
}

/// Turn share links into a Clash document.
///
/// Blank lines are ignored and surrounding whitespace is trimmed. Links that
/// fail to decode are skipped and listed in the report; an input with no
/// usable link still yields a valid, empty document.
pub fn links_to_document<S: AsRef<str>>(
    links: &[S],
    mode: OutputMode,
) -> Result<ConversionReport> {
    let mut batch: Batch<Proxy> = Batch::new();

    for link in links
        .iter()
        .map(|l| l.as_ref().trim())
        .filter(|l| !l.is_empty())
    {
        match explode(link) {
            Ok(proxy) => batch.items.push(proxy),
            Err(e) => {
                let subject = link_label(link);
                warn!("Skipping link {}: {}", subject, e);
                batch.skipped.push(Diagnostic::new(subject, e));
            }
        }
    }

    let output = render_proxies(&batch.items, mode)?;
    info!(
        "Converted {} links to a Clash document in {} mode ({} skipped)",
        batch.items.len(),
        mode,
        batch.skipped.len()
    );
    Ok(ConversionReport {
        output,
        converted: batch.items.len(),
        skipped: batch.skipped,
    })
}

/// Clash document to share links, as the `{success, data}` object the UI
/// consumes.
pub fn clash_to_link(content: &str) -> ConversionResult {
    finish("clash_to_link", document_to_links(content))
}

/// Share links to a Clash document, as the `{success, data}` object the UI
/// consumes.
pub fn link_to_clash<S: AsRef<str>>(links: &[S], mode: OutputMode) -> ConversionResult {
    finish("link_to_clash", links_to_document(links, mode))
}

fn finish(operation: &str, result: Result<ConversionReport>) -> ConversionResult {
    match &result {
        Ok(report) => {
            for diagnostic in &report.skipped {
                debug!("{}: {}", operation, diagnostic);
            }
        }
        Err(e) => error!("{} failed: {}", operation, e),
    }
    result.into()
}
