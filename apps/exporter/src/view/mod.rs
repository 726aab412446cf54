//! Resume views: a fetched record with its rendered surface and export controller.
//!
//! A view lives from mount until it is unmounted or a newer mount for the same id
//! supersedes it. An export already in flight keeps its own handle to the old
//! surface and finishes normally.

pub mod handlers;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use image::RgbImage;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::export::controller::SurfaceHandle;
use crate::export::{ExportController, SurfaceCapture};
use crate::models::resume::ResumeRecord;
use crate::normalize::normalize_payload;
use crate::render::render;
use crate::source::ResumeSource;

pub struct ResumeView {
    pub id: String,
    pub record: Arc<ResumeRecord>,
    pub surface: SurfaceHandle,
    pub controller: ExportController,
}

/// Fetches, normalizes and renders the resume `id`. Never fails: an unreachable or
/// malformed source yields a view of an empty record.
pub async fn mount_view(
    id: &str,
    source: &dyn ResumeSource,
    capture: Arc<dyn SurfaceCapture>,
) -> ResumeView {
    let payload = match source.fetch(id).await {
        Ok(payload) => payload,
        Err(e) => {
            warn!(resume_id = %id, error = %e, "Failed to fetch resume data; rendering empty record");
            Value::Object(Map::new())
        }
    };
    let record = normalize_payload(payload);

    let profile_image = match &record.profile_img {
        Some(uri) => load_profile_image(source, uri).await,
        None => None,
    };
    let surface = render(&record).with_profile_image(profile_image);

    info!(
        resume_id = %id,
        sections = surface.sections().len(),
        "Resume view mounted"
    );

    ResumeView {
        id: id.to_string(),
        record: Arc::new(record),
        surface: Arc::new(Mutex::new(Some(surface))),
        controller: ExportController::new(capture),
    }
}

async fn load_profile_image(source: &dyn ResumeSource, uri: &str) -> Option<Arc<RgbImage>> {
    let bytes = match source.fetch_asset(uri).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(uri = %uri, error = %e, "Profile image could not be fetched");
            return None;
        }
    };

    // CPU-bound; keep it off the async executor.
    let decoded = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes)).await;
    match decoded {
        Ok(Ok(img)) => Some(Arc::new(img.to_rgb8())),
        Ok(Err(e)) => {
            warn!(uri = %uri, error = %e, "Profile image could not be decoded");
            None
        }
        Err(e) => {
            warn!(uri = %uri, error = %e, "Profile image decode task failed");
            None
        }
    }
}

/// Mounted views by resume id.
#[derive(Clone, Default)]
pub struct ViewRegistry {
    views: Arc<RwLock<HashMap<String, Arc<ResumeView>>>>,
}

impl ViewRegistry {
    /// Registers `view`, returning the view it superseded, if any.
    pub fn insert(&self, view: ResumeView) -> (Arc<ResumeView>, Option<Arc<ResumeView>>) {
        let view = Arc::new(view);
        let previous = self
            .views
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(view.id.clone(), Arc::clone(&view));
        (view, previous)
    }

    pub fn get(&self, id: &str) -> Option<Arc<ResumeView>> {
        self.views
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    pub fn remove(&self, id: &str) -> Option<Arc<ResumeView>> {
        self.views
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::StaticSource;
    use super::*;
    use crate::export::SoftwareCapture;
    use crate::layout::FontFamily;
    use crate::render::SectionKind;
    use crate::source::{AssetPolicy, HttpResumeSource, SourceError};
    use bytes::Bytes;
    use serde_json::json;
    use std::io::Cursor;
    use std::time::Duration;

    fn capture() -> Arc<dyn SurfaceCapture> {
        Arc::new(SoftwareCapture {
            font: FontFamily::Inter,
            viewport_width: 1280,
            max_height_px: 32_768,
        })
    }

    fn surface_kinds(view: &ResumeView) -> Vec<SectionKind> {
        view.surface
            .lock()
            .unwrap()
            .as_ref()
            .map(|s| s.section_kinds())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_mount_renders_fetched_record() {
        let source = StaticSource::with_resume(
            "7",
            json!({ "name": "Ada Lovelace", "description": "Mathematician" }),
        );
        let view = mount_view("7", &source, capture()).await;
        assert_eq!(view.record.name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(
            surface_kinds(&view),
            vec![SectionKind::Header, SectionKind::Summary]
        );
    }

    #[tokio::test]
    async fn test_fetch_failure_mounts_empty_record() {
        let view = mount_view("missing", &StaticSource::default(), capture()).await;
        assert_eq!(*view.record, ResumeRecord::default());
        assert_eq!(surface_kinds(&view), vec![SectionKind::Header]);
    }

    #[tokio::test]
    async fn test_profile_image_is_decoded_when_available() {
        let mut png = Vec::new();
        RgbImage::from_pixel(3, 3, image::Rgb([10, 20, 30]))
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        let mut source = StaticSource::with_resume("1", json!({ "profileImg": "mem://me.png" }));
        source.assets.insert("mem://me.png".to_string(), Bytes::from(png));

        let view = mount_view("1", &source, capture()).await;
        let guard = view.surface.lock().unwrap();
        let surface = guard.as_ref().unwrap();
        assert_eq!(surface.profile_image().map(|i| i.dimensions()), Some((3, 3)));
    }

    #[tokio::test]
    async fn test_broken_profile_image_keeps_section_without_pixels() {
        let mut source = StaticSource::with_resume("1", json!({ "profileImg": "mem://bad.png" }));
        source
            .assets
            .insert("mem://bad.png".to_string(), Bytes::from_static(b"not an image"));

        let view = mount_view("1", &source, capture()).await;
        assert_eq!(surface_kinds(&view)[0], SectionKind::ProfileImage);
        assert!(view.surface.lock().unwrap().as_ref().unwrap().profile_image().is_none());
    }

    /// Resume data from memory, assets through the real HTTP source and its policy.
    struct PolicedAssets {
        data: StaticSource,
        assets: HttpResumeSource,
    }

    #[async_trait::async_trait]
    impl ResumeSource for PolicedAssets {
        async fn fetch(&self, id: &str) -> Result<Value, SourceError> {
            self.data.fetch(id).await
        }

        async fn fetch_asset(&self, uri: &str) -> Result<Bytes, SourceError> {
            self.assets.fetch_asset(uri).await
        }
    }

    #[tokio::test]
    async fn test_internal_profile_image_uri_leaves_placeholder() {
        let source = PolicedAssets {
            data: StaticSource::with_resume(
                "1",
                json!({ "name": "Ada", "profileImg": "http://169.254.169.254/latest/meta-data/" }),
            ),
            assets: HttpResumeSource::new(
                "http://127.0.0.1:9",
                Duration::from_secs(1),
                AssetPolicy {
                    allowed_hosts: Vec::new(),
                    max_bytes: 1024,
                },
            )
            .unwrap(),
        };

        let view = mount_view("1", &source, capture()).await;
        assert_eq!(surface_kinds(&view)[0], SectionKind::ProfileImage);
        assert!(view.surface.lock().unwrap().as_ref().unwrap().profile_image().is_none());
    }

    #[tokio::test]
    async fn test_registry_supersedes_and_removes() {
        let registry = ViewRegistry::default();
        let source = StaticSource::with_resume("9", json!({ "name": "First" }));

        let (_, previous) = registry.insert(mount_view("9", &source, capture()).await);
        assert!(previous.is_none());

        let (current, previous) = registry.insert(mount_view("9", &source, capture()).await);
        assert!(previous.is_some());
        assert!(Arc::ptr_eq(&registry.get("9").unwrap(), &current));

        assert!(registry.remove("9").is_some());
        assert!(registry.get("9").is_none());
        assert!(registry.remove("9").is_none());
    }
}
