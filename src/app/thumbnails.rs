// Thumbnail textures for expanded cards, keyed by thumbnail filename.
// Bytes come from the prompt source; decoding runs on the blocking pool.

use std::collections::{HashMap, HashSet};
use std::sync::{mpsc, Arc};

use eframe::egui;
use tokio::runtime::Handle;

use crate::api::PromptSource;

pub struct DecodedImage {
    pub width: usize,
    pub height: usize,
    pub rgba: Vec<u8>,
}

pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage, image::ImageError> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let (w, h) = rgba.dimensions();
    Ok(DecodedImage {
        width: w as usize,
        height: h as usize,
        rgba: rgba.into_vec(),
    })
}

enum ThumbMsg {
    Ok { name: String, image: DecodedImage },
    Err { name: String },
}

pub enum ThumbnailState<'a> {
    Loading,
    Ready(&'a egui::TextureHandle),
    Failed,
}

pub struct ThumbnailCache {
    source: Arc<dyn PromptSource>,
    runtime: Handle,
    textures: HashMap<String, egui::TextureHandle>,
    loading: HashSet<String>,
    failed: HashSet<String>,
    tx: mpsc::Sender<ThumbMsg>,
    rx: mpsc::Receiver<ThumbMsg>,
}

impl ThumbnailCache {
    pub fn new(source: Arc<dyn PromptSource>, runtime: Handle) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            source,
            runtime,
            textures: HashMap::new(),
            loading: HashSet::new(),
            failed: HashSet::new(),
            tx,
            rx,
        }
    }

    /// Current state for `name`, scheduling a fetch on first sight.
    pub fn get(&mut self, ctx: &egui::Context, name: &str) -> ThumbnailState<'_> {
        if self.failed.contains(name) {
            return ThumbnailState::Failed;
        }
        if !self.textures.contains_key(name) && !self.loading.contains(name) {
            self.schedule(ctx, name);
        }
        match self.textures.get(name) {
            Some(tex) => ThumbnailState::Ready(tex),
            None => ThumbnailState::Loading,
        }
    }

    fn schedule(&mut self, ctx: &egui::Context, name: &str) {
        self.loading.insert(name.to_string());
        let name = name.to_string();
        let source = self.source.clone();
        let tx = self.tx.clone();
        let ctx = ctx.clone();
        log::debug!("thumbnail schedule: {name}");
        self.runtime.spawn(async move {
            let msg = match source.thumbnail(&name).await {
                Ok(bytes) => match tokio::task::spawn_blocking(move || decode_image(&bytes)).await {
                    Ok(Ok(image)) => ThumbMsg::Ok { name, image },
                    Ok(Err(e)) => {
                        log::warn!("thumbnail decode failed: {name}: {e}");
                        ThumbMsg::Err { name }
                    }
                    Err(e) => {
                        log::warn!("thumbnail decode task failed: {name}: {e}");
                        ThumbMsg::Err { name }
                    }
                },
                Err(e) => {
                    log::warn!("thumbnail fetch failed: {name}: {e}");
                    ThumbMsg::Err { name }
                }
            };
            let _ = tx.send(msg);
            ctx.request_repaint();
        });
    }

    /// Uploads finished decodes. Returns true when anything changed.
    pub fn poll_incoming(&mut self, ctx: &egui::Context) -> bool {
        let mut changed = false;
        while let Ok(msg) = self.rx.try_recv() {
            changed = true;
            match msg {
                ThumbMsg::Ok { name, image } => {
                    let color = egui::ColorImage::from_rgba_unmultiplied(
                        [image.width, image.height],
                        &image.rgba,
                    );
                    let tex = ctx.load_texture(
                        format!("thumb_{name}"),
                        color,
                        egui::TextureOptions::default(),
                    );
                    self.loading.remove(&name);
                    self.textures.insert(name, tex);
                }
                ThumbMsg::Err { name } => {
                    self.loading.remove(&name);
                    self.failed.insert(name);
                }
            }
        }
        changed
    }

    /// Forgets failures so they are retried, e.g. after a list refresh.
    pub fn retry_failed(&mut self) {
        self.failed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, ListPage, ListRequest};
    use async_trait::async_trait;
    use std::io::Cursor;
    use std::time::Duration;

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    struct FixedThumbs;

    #[async_trait]
    impl PromptSource for FixedThumbs {
        async fn list(&self, _request: &ListRequest) -> Result<ListPage, ApiError> {
            Ok(ListPage::default())
        }
        async fn toggle_favorite(&self, _id: i64) -> Result<(), ApiError> {
            Ok(())
        }
        async fn delete(&self, _id: i64) -> Result<(), ApiError> {
            Ok(())
        }
        async fn thumbnail(&self, filename: &str) -> Result<Vec<u8>, ApiError> {
            match filename {
                "ok.png" => Ok(png_bytes()),
                "broken.png" => Ok(b"not an image".to_vec()),
                _ => Err(ApiError::Status {
                    status: 404,
                    body: String::new(),
                }),
            }
        }
        fn export_url(&self) -> Result<String, ApiError> {
            Ok("http://localhost/export".into())
        }
        fn thumbnail_url(&self, filename: &str) -> Result<String, ApiError> {
            Ok(format!("http://localhost/thumbnail/{filename}"))
        }
    }

    #[test]
    fn decodes_png_into_rgba() {
        let image = decode_image(&png_bytes()).unwrap();
        assert_eq!((image.width, image.height), (3, 2));
        assert_eq!(image.rgba.len(), 3 * 2 * 4);
        assert_eq!(&image.rgba[..4], &[10, 20, 30, 255]);
        assert!(decode_image(b"garbage").is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn textures_load_and_failures_stick() {
        let ctx = egui::Context::default();
        let mut cache = ThumbnailCache::new(Arc::new(FixedThumbs), Handle::current());
        for name in ["ok.png", "broken.png", "missing.png"] {
            assert!(matches!(cache.get(&ctx, name), ThumbnailState::Loading));
        }

        for _ in 0..200 {
            cache.poll_incoming(&ctx);
            if cache.loading.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert!(matches!(cache.get(&ctx, "ok.png"), ThumbnailState::Ready(_)));
        assert!(matches!(cache.get(&ctx, "broken.png"), ThumbnailState::Failed));
        assert!(matches!(cache.get(&ctx, "missing.png"), ThumbnailState::Failed));

        cache.retry_failed();
        assert!(matches!(cache.get(&ctx, "missing.png"), ThumbnailState::Loading));
    }
}
