//! EPUB container reader
//!
//! Locates the package document through `META-INF/container.xml`, walks the
//! OPF spine in reading order, and hands each (X)HTML content document to the
//! markup extractor. Non-HTML spine items (images, SVG pages) are skipped.

use super::html_text::html_to_text;
use super::preprocessor::Preprocessor;
use anyhow::{anyhow, bail, Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use zip::ZipArchive;

const CONTAINER_PATH: &str = "META-INF/container.xml";

const TEXT_MEDIA_TYPES: [&str; 3] = ["application/xhtml+xml", "text/html", "application/html+xml"];

/// Separator placed between content documents.
pub const DOCUMENT_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpineItem {
    /// Archive path, already resolved against the OPF directory.
    pub href: String,
    pub media_type: String,
}

impl SpineItem {
    pub fn is_text_document(&self) -> bool {
        let media_type = self.media_type.to_ascii_lowercase();
        TEXT_MEDIA_TYPES.contains(&media_type.as_str())
    }
}

fn read_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Result<Vec<u8>> {
    let mut file = archive
        .by_name(path)
        .with_context(|| format!("Missing EPUB file: {path}"))?;
    let mut bytes = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut bytes)
        .with_context(|| format!("Failed to read EPUB file: {path}"))?;
    Ok(bytes)
}

fn attribute(e: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Path of the OPF package document, from the first `rootfile` entry.
pub fn find_opf_path<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<String> {
    let bytes = read_entry(archive, CONTAINER_PATH)?;
    let xml = String::from_utf8_lossy(&bytes);
    let mut reader = Reader::from_str(&xml);

    loop {
        match reader
            .read_event()
            .with_context(|| format!("Invalid XML: {CONTAINER_PATH}"))?
        {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"rootfile" => {
                return match attribute(&e, b"full-path")? {
                    Some(path) if !path.is_empty() => Ok(path),
                    _ => Err(anyhow!("Invalid container.xml: rootfile missing full-path")),
                };
            }
            Event::Eof => bail!("Invalid container.xml: missing rootfile"),
            _ => {}
        }
    }
}

/// Spine items in reading order, hrefs resolved to archive paths.
pub fn read_spine<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    opf_path: &str,
) -> Result<Vec<SpineItem>> {
    let bytes = read_entry(archive, opf_path)?;
    let xml = String::from_utf8_lossy(&bytes);
    let mut reader = Reader::from_str(&xml);

    let opf_dir = opf_path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
    let mut manifest: HashMap<String, (String, String)> = HashMap::new();
    let mut idrefs: Vec<String> = Vec::new();
    let mut in_manifest = false;
    let mut in_spine = false;
    let mut saw_spine = false;

    loop {
        let event = reader
            .read_event()
            .with_context(|| format!("Invalid XML: {opf_path}"))?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let is_start = matches!(event, Event::Start(_));
                match e.local_name().as_ref() {
                    b"manifest" => in_manifest = is_start,
                    b"spine" => {
                        saw_spine = true;
                        in_spine = is_start;
                    }
                    b"item" if in_manifest => {
                        let id = attribute(e, b"id")?.unwrap_or_default();
                        let href = attribute(e, b"href")?.unwrap_or_default();
                        let media_type = attribute(e, b"media-type")?.unwrap_or_default();
                        if !id.is_empty() && !href.is_empty() {
                            manifest.insert(id, (href, media_type));
                        }
                    }
                    b"itemref" if in_spine => {
                        if let Some(idref) = attribute(e, b"idref")?.filter(|s| !s.is_empty()) {
                            idrefs.push(idref);
                        }
                    }
                    _ => {}
                }
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"manifest" => in_manifest = false,
                b"spine" => in_spine = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_spine {
        bail!("Invalid OPF: missing spine");
    }

    let items = idrefs
        .iter()
        .filter_map(|idref| {
            let entry = manifest.get(idref);
            if entry.is_none() {
                log::warn!("spine itemref {idref:?} not in manifest, skipping");
            }
            entry
        })
        .map(|(href, media_type)| SpineItem {
            href: resolve_href(opf_dir, href),
            media_type: media_type.clone(),
        })
        .collect();
    Ok(items)
}

/// Joins `href` onto `base_dir` and collapses `.` and `..` segments.
pub fn resolve_href(base_dir: &str, href: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in base_dir.split('/').chain(href.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                if matches!(parts.last(), Some(last) if *last != "..") {
                    parts.pop();
                } else {
                    parts.push("..");
                }
            }
            s => parts.push(s),
        }
    }
    parts.join("/")
}

/// Archive paths of the text content documents, in spine order.
pub fn text_documents<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
    let opf_path = find_opf_path(archive)?;
    let spine = read_spine(archive, &opf_path)?;
    Ok(spine
        .into_iter()
        .filter(SpineItem::is_text_document)
        .map(|item| item.href)
        .collect())
}

pub fn epub_to_text(bytes: &[u8]) -> Result<String> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).context("Failed to read EPUB archive")?;
    let documents = text_documents(&mut archive)?;

    let mut texts = Vec::with_capacity(documents.len());
    for path in &documents {
        match read_entry(&mut archive, path) {
            Ok(doc_bytes) => texts.push(html_to_text(&doc_bytes)),
            Err(e) => log::warn!("skipping spine document: {e:#}"),
        }
    }
    log::debug!("extracted {} of {} spine documents", texts.len(), documents.len());
    Ok(texts.join(DOCUMENT_SEPARATOR))
}

pub struct EpubPreprocessor;

impl Preprocessor for EpubPreprocessor {
    fn extract_text(&self, bytes: &[u8]) -> Result<String> {
        epub_to_text(bytes)
    }

    fn name(&self) -> &str {
        "epub"
    }

    fn supports_file_type(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("epub"))
    }
}
