pub mod converter;

pub use converter::{clash_to_link, document_to_links, link_to_clash, links_to_document};
