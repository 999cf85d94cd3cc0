use anyhow::Result;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

use shipping_broker::labels::LabelConverter;
use shipping_broker::storage::{LabelStore, StoredFile};
use shipping_broker::Error;

const STORE_BASE: &str = "https://erp.test";

/// In-memory stand-in for the host file facility.
#[derive(Clone, Default)]
struct MemoryStore {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    counter: Arc<Mutex<usize>>,
}

impl MemoryStore {
    fn new() -> Self {
        Self::default()
    }

    fn file_count(&self) -> usize {
        self.files.lock().unwrap().len()
    }
}

#[async_trait]
impl LabelStore for MemoryStore {
    async fn store(&self, bytes: &[u8], extension: &str) -> shipping_broker::Result<StoredFile> {
        let mut counter = self.counter.lock().unwrap();
        *counter += 1;
        let file_name = format!("file-{}.{}", *counter, extension);
        let url = format!("{STORE_BASE}/private/files/{file_name}");
        self.files.lock().unwrap().insert(url.clone(), bytes.to_vec());
        Ok(StoredFile { file_name, url })
    }

    async fn read(&self, url: &str) -> shipping_broker::Result<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| Error::Storage(format!("no such file: {url}")))
    }

    fn is_internal(&self, url: &str) -> bool {
        url.starts_with(STORE_BASE)
    }
}

fn converter(store: &MemoryStore) -> LabelConverter {
    LabelConverter::new(Arc::new(store.clone())).unwrap()
}

/// A small PNG with a distinct color per pixel.
fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x * 40) as u8, (y * 40) as u8, 200, 255])
    });
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(image)
        .write_to(&mut out, image::ImageOutputFormat::Png)
        .unwrap();
    out.into_inner()
}

async fn store_png(store: &MemoryStore, width: u32, height: u32) -> String {
    store.store(&png_bytes(width, height), "png").await.unwrap().url
}

#[tokio::test]
async fn data_uri_round_trips_modulo_rotation() -> Result<()> {
    let store = MemoryStore::new();
    let converter = converter(&store);

    let original = png_bytes(2, 3);
    let data_uri = format!("data:image/png;base64,{}", BASE64.encode(&original));
    let url = converter.decode_inline_b64_image(&data_uri).await?;

    let stored = store.read(&url).await?;
    let stored_image = image::load_from_memory(&stored)?;
    let expected = image::load_from_memory(&original)?.rotate90();

    // Rotation swaps the dimensions and every pixel survives.
    assert_eq!(stored_image.width(), 3);
    assert_eq!(stored_image.height(), 2);
    assert_eq!(
        stored_image.to_rgba8().into_raw(),
        expected.to_rgba8().into_raw()
    );
    Ok(())
}

#[tokio::test]
async fn merging_k_bitmaps_yields_exactly_one_artifact() -> Result<()> {
    let store = MemoryStore::new();
    let converter = converter(&store);

    let urls = vec![
        store_png(&store, 4, 6).await,
        store_png(&store, 4, 6).await,
        store_png(&store, 4, 6).await,
    ];
    let before = store.file_count();

    let merged = converter.bitmaps_to_multi_page_pdf(&urls, false).await?;
    assert_eq!(store.file_count(), before + 1);
    assert!(merged.ends_with(".pdf"));

    let bytes = store.read(&merged).await?;
    assert!(bytes.starts_with(b"%PDF"), "merged artifact is not a PDF");
    Ok(())
}

#[tokio::test]
async fn merging_one_bitmap_matches_the_single_page_path() -> Result<()> {
    let store = MemoryStore::new();
    let converter = converter(&store);

    let url = store_png(&store, 4, 6).await;

    let from_merge = converter
        .bitmaps_to_multi_page_pdf(std::slice::from_ref(&url), false)
        .await?;
    let from_single = converter.bitmap_to_single_page_pdf(&url, false).await?;

    // Same output shape: one fresh PDF artifact each (write-once, so the
    // URLs themselves differ).
    assert!(from_merge.ends_with(".pdf"));
    assert!(from_single.ends_with(".pdf"));
    assert_ne!(from_merge, from_single);
    assert!(store.read(&from_merge).await?.starts_with(b"%PDF"));
    assert!(store.read(&from_single).await?.starts_with(b"%PDF"));
    Ok(())
}

#[tokio::test]
async fn text_labels_merge_with_a_separating_blank_line() -> Result<()> {
    let store = MemoryStore::new();
    let converter = converter(&store);

    let first = converter.text_label_to_file("^XA^FDBox 1^FS^XZ").await?;
    let second = converter.text_label_to_file("^XA^FDBox 2^FS^XZ").await?;

    let merged = converter
        .merge_text_labels(&[first, second])
        .await?;
    let content = String::from_utf8(store.read(&merged).await?)?;
    assert_eq!(content, "^XA^FDBox 1^FS^XZ\n\n^XA^FDBox 2^FS^XZ");
    Ok(())
}

#[tokio::test]
async fn empty_merge_inputs_are_hard_errors() {
    let store = MemoryStore::new();
    let converter = converter(&store);

    assert!(matches!(
        converter.bitmaps_to_multi_page_pdf(&[], false).await,
        Err(Error::MissingLabel(_))
    ));
    assert!(matches!(
        converter.merge_text_labels(&[]).await,
        Err(Error::MissingLabel(_))
    ));
    assert!(matches!(
        converter.text_label_to_file("   ").await,
        Err(Error::MissingLabel(_))
    ));
}

#[tokio::test]
async fn persist_label_value_triages_internal_urls_and_data_uris() -> Result<()> {
    let store = MemoryStore::new();
    let converter = converter(&store);

    // Already internal: passes through untouched.
    let internal = store_png(&store, 2, 2).await;
    assert_eq!(converter.persist_label_value(&internal).await?, internal);

    // Data-URI: decoded and stored as a fresh artifact.
    let data_uri = format!("data:image/png;base64,{}", BASE64.encode(png_bytes(2, 2)));
    let stored = converter.persist_label_value(&data_uri).await?;
    assert!(stored.starts_with(STORE_BASE));
    assert!(store.read(&stored).await.is_ok());

    assert!(converter.persist_label_value("").await.is_err());
    Ok(())
}
