//! Page text sources.
//!
//! The scanner only needs "plain text per page, in reading order". PDFs go through
//! PDFium; `.txt` dumps (for example `pdftotext` output) are split on form feeds.

use std::path::Path;

use pdfium_render::prelude::Pdfium;
use snafu::{OptionExt, ResultExt};
use tracing::*;

use crate::consts::{PAGE_BREAK, PDFIUM_LIB_PATH_ENV_NAME};
use crate::error::{
    BtebError, IoReadSnafu, PdfiumSnafu, PdfiumUnavailableSnafu, UnsupportedInputSnafu,
};

/// Produces the text of every page of a document, in document order.
pub trait PageSource: Send + Sync {
    fn page_texts(&self, path: &Path) -> Result<Vec<String>, BtebError>;
}

/// Input formats understood by [`InputSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Pdf,
    Text,
}

impl InputKind {
    pub fn for_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "pdf" => Some(InputKind::Pdf),
            "txt" => Some(InputKind::Text),
            _ => None,
        }
    }
}

pub struct PdfiumSource {
    pdfium: Pdfium,
}

impl PdfiumSource {
    /// Binds PDFium from `PDFIUM_DYNAMIC_LIB_PATH`, or from the system library
    /// search path when the variable is unset.
    #[tracing::instrument(skip_all)]
    pub fn new() -> Result<Self, BtebError> {
        let bindings = match std::env::var(PDFIUM_LIB_PATH_ENV_NAME) {
            Ok(pdfium_lib_path) => {
                info!("Loading PDFium from {}.", pdfium_lib_path);
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                    &pdfium_lib_path,
                ))
            }
            Err(_) => {
                info!(
                    "{} not set, loading PDFium from the system library path.",
                    PDFIUM_LIB_PATH_ENV_NAME
                );
                Pdfium::bind_to_system_library()
            }
        }
        .context(PdfiumSnafu {
            stage: "load-dyn-lib",
        })?;

        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }
}

impl PageSource for PdfiumSource {
    #[tracing::instrument(skip_all, fields(pdf = %path.display()))]
    fn page_texts(&self, path: &Path) -> Result<Vec<String>, BtebError> {
        let document = self
            .pdfium
            .load_pdf_from_file(path, None)
            .context(PdfiumSnafu {
                stage: "load-pdf-by-path",
            })?;

        let pages = document
            .pages()
            .iter()
            .map(|page| {
                page.text()
                    .map(|text| text.all())
                    .context(PdfiumSnafu { stage: "text" })
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!("Extracted text of {} pages.", pages.len());
        Ok(pages)
    }
}

/// Reads pre-extracted text where pages are separated by form feeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextFileSource;

impl TextFileSource {
    pub fn split_pages(text: &str) -> Vec<String> {
        let mut pages = text.split(PAGE_BREAK).map(str::to_string).collect::<Vec<_>>();
        // a dump ends with a page break, which leaves an empty trailing page
        if pages.len() > 1 && pages.last().is_some_and(|page| page.trim().is_empty()) {
            pages.pop();
        }
        pages
    }
}

impl PageSource for TextFileSource {
    fn page_texts(&self, path: &Path) -> Result<Vec<String>, BtebError> {
        let text = std::fs::read_to_string(path).context(IoReadSnafu {
            path: path.display().to_string(),
        })?;
        Ok(Self::split_pages(&text))
    }
}

/// Dispatches on the file extension. PDFium is optional so text dumps can be
/// processed on machines without the library.
pub struct InputSource {
    pdf: Option<PdfiumSource>,
    text: TextFileSource,
}

impl InputSource {
    pub fn new(pdf: Option<PdfiumSource>) -> Self {
        Self {
            pdf,
            text: TextFileSource,
        }
    }

    pub fn text_only() -> Self {
        Self::new(None)
    }
}

impl PageSource for InputSource {
    fn page_texts(&self, path: &Path) -> Result<Vec<String>, BtebError> {
        let display = path.display().to_string();
        match InputKind::for_path(path) {
            Some(InputKind::Pdf) => self
                .pdf
                .as_ref()
                .context(PdfiumUnavailableSnafu { path: display })?
                .page_texts(path),
            Some(InputKind::Text) => self.text.page_texts(path),
            None => UnsupportedInputSnafu { path: display }.fail(),
        }
    }
}
