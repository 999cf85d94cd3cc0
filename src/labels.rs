//! Label asset conversion: raster rotation, multi-page PDF assembly and ZPL
//! handling.
//!
//! Every conversion path ends in exactly one durably stored artifact with a
//! retrievable absolute URL. Artifacts are write-once; re-running a
//! conversion produces a fresh file.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::DynamicImage;
use printpdf::{Image as PdfImage, ImageTransform, Mm, PdfDocument, PdfDocumentReference, PdfLayerIndex, PdfPageIndex};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};
use crate::storage::LabelStore;

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Label rasters are placed at 72 px/in; thermal printers rescale to stock
/// size at print time.
const PDF_DPI: f64 = 72.0;

pub struct LabelConverter {
    store: Arc<dyn LabelStore>,
    http: reqwest::Client,
}

impl LabelConverter {
    pub fn new(store: Arc<dyn LabelStore>) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self { store, http })
    }

    /// Fetch raw bytes for a label asset: internal store read when the URL
    /// is ours, HTTP GET otherwise.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        if self.store.is_internal(url) {
            return self.store.read(url).await;
        }
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(Error::MissingLabel(format!(
                "label download failed (status {}): {url}",
                response.status()
            )));
        }
        Ok(response.bytes().await?.to_vec())
    }

    async fn fetch_image(&self, url: &str, rotate: bool) -> Result<DynamicImage> {
        let bytes = self.fetch(url).await?;
        let image = image::load_from_memory(&bytes)?;
        Ok(if rotate { image.rotate90() } else { image })
    }

    /// Convert one raster label into a single-page PDF artifact.
    pub async fn bitmap_to_single_page_pdf(&self, url: &str, rotate: bool) -> Result<String> {
        let urls = [url.to_string()];
        self.bitmaps_to_multi_page_pdf(&urls, rotate).await
    }

    /// Merge raster labels, one per page, into a single PDF artifact.
    pub async fn bitmaps_to_multi_page_pdf(&self, urls: &[String], rotate: bool) -> Result<String> {
        if urls.is_empty() {
            return Err(Error::MissingLabel("no label images to merge".to_string()));
        }
        let mut images = Vec::with_capacity(urls.len());
        for url in urls {
            images.push(self.fetch_image(url, rotate).await?);
        }
        let pdf = images_to_pdf(&images)?;
        let stored = self.store.store(&pdf, "pdf").await?;
        debug!(pages = urls.len(), url = %stored.url, "assembled label PDF");
        Ok(stored.url)
    }

    /// Write raw label markup to one printable file.
    pub async fn text_label_to_file(&self, content: &str) -> Result<String> {
        if content.trim().is_empty() {
            return Err(Error::MissingLabel("empty label content".to_string()));
        }
        let stored = self.store.store(content.as_bytes(), "zpl").await?;
        Ok(stored.url)
    }

    /// Concatenate text labels, one blank line between documents, into a
    /// single file.
    pub async fn merge_text_labels(&self, urls: &[String]) -> Result<String> {
        if urls.is_empty() {
            return Err(Error::MissingLabel("no text labels to merge".to_string()));
        }
        let mut documents = Vec::with_capacity(urls.len());
        for url in urls {
            let bytes = self.fetch(url).await?;
            let text = String::from_utf8(bytes).map_err(|_| {
                Error::MissingLabel(format!("label at {url} is not valid text"))
            })?;
            documents.push(text);
        }
        self.text_label_to_file(&documents.join("\n\n")).await
    }

    /// Decode a `data:image/<ext>;base64,<payload>` URI, rotate the raster
    /// upright (carrier bitmaps arrive turned 90°), store it.
    pub async fn decode_inline_b64_image(&self, data_uri: &str) -> Result<String> {
        let (extension, payload) = split_data_uri(data_uri)?;
        let raw = BASE64.decode(payload)?;
        let image = image::load_from_memory(&raw)?.rotate90();

        let (format, extension) = output_format(extension);
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, format)?;
        let stored = self.store.store(out.get_ref(), extension).await?;
        Ok(stored.url)
    }

    /// Persist whatever label value a purchase left behind: already-internal
    /// URLs pass through, data-URIs are decoded, remote URLs are downloaded.
    pub async fn persist_label_value(&self, value: &str) -> Result<String> {
        if value.trim().is_empty() {
            return Err(Error::MissingLabel("empty label value".to_string()));
        }
        if self.store.is_internal(value) {
            return Ok(value.to_string());
        }
        if value.starts_with("data:image") {
            return self.decode_inline_b64_image(value).await;
        }
        let bytes = self.fetch(value).await?;
        let stored = self.store.store(&bytes, url_extension(value)).await?;
        Ok(stored.url)
    }
}

/// Extension of a remote label URL, ignoring any query string.
fn url_extension(url: &str) -> &str {
    let path = url.split('?').next().unwrap_or(url);
    match path.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && !ext.contains('/') => ext,
        _ => "png",
    }
}

fn split_data_uri(data_uri: &str) -> Result<(&str, &str)> {
    let rest = data_uri.strip_prefix("data:image/").ok_or_else(|| {
        let head: String = data_uri.chars().take(32).collect();
        Error::Validation(format!("not an inline image data URI: {head}"))
    })?;
    let (extension, payload) = rest.split_once(";base64,").ok_or_else(|| {
        Error::Validation("inline image data URI is not base64-encoded".to_string())
    })?;
    Ok((extension, payload))
}

/// Pick an encodable output format for the stored copy. Uncommon source
/// formats are normalized to PNG.
fn output_format(extension: &str) -> (image::ImageOutputFormat, &'static str) {
    match extension.to_lowercase().as_str() {
        "gif" => (image::ImageOutputFormat::Gif, "gif"),
        "jpg" | "jpeg" => (image::ImageOutputFormat::Jpeg(90), "jpeg"),
        _ => (image::ImageOutputFormat::Png, "png"),
    }
}

fn images_to_pdf(images: &[DynamicImage]) -> Result<Vec<u8>> {
    let first = &images[0];
    let (doc, page, layer) = PdfDocument::new(
        "Shipping Label",
        px_to_mm(first.width()),
        px_to_mm(first.height()),
        "label",
    );
    place_on_page(&doc, page, layer, first);

    for image in &images[1..] {
        let (page, layer) = doc.add_page(px_to_mm(image.width()), px_to_mm(image.height()), "label");
        place_on_page(&doc, page, layer, image);
    }

    doc.save_to_bytes().map_err(|err| Error::Pdf(err.to_string()))
}

fn place_on_page(
    doc: &PdfDocumentReference,
    page: PdfPageIndex,
    layer: PdfLayerIndex,
    image: &DynamicImage,
) {
    let layer = doc.get_page(page).get_layer(layer);
    PdfImage::from_dynamic_image(image).add_to_layer(
        layer,
        ImageTransform {
            dpi: Some(PDF_DPI as f32),
            ..ImageTransform::default()
        },
    );
}

fn px_to_mm(px: u32) -> Mm {
    Mm((px as f64 * 25.4 / PDF_DPI) as f32)
}
