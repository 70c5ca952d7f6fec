//! Test harness: the real router over local storage, stub media tools and an in-memory
//! video repository.

#![allow(dead_code)]

use async_trait::async_trait;
use axum_test::TestServer;
use chrono::Utc;
use std::collections::HashMap;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tubely_api::setup::{build_state, routes::build_router};
use tubely_api::AppState;
use tubely_core::models::Video;
use tubely_core::{AppError, Config, DeliveryMode, StorageBackend};
use tubely_db::VideoRepository;
use tubely_storage::{LocalStorage, Storage};
use uuid::Uuid;

pub const ASSETS_BASE_URL: &str = "http://localhost:8091/assets";
pub const LANDSCAPE: &str = r#"{"streams":[{"width":1920,"height":1080}]}"#;
pub const PORTRAIT: &str = r#"{"streams":[{"width":1080,"height":1920}]}"#;

#[derive(Default)]
pub struct MemoryRepository {
    pub videos: Mutex<HashMap<Uuid, Video>>,
}

#[async_trait]
impl VideoRepository for MemoryRepository {
    async fn get_video(&self, id: Uuid) -> Result<Option<Video>, AppError> {
        Ok(self.videos.lock().unwrap().get(&id).cloned())
    }

    async fn update_video(&self, video: &Video) -> Result<Video, AppError> {
        let mut videos = self.videos.lock().unwrap();
        if !videos.contains_key(&video.id) {
            return Err(AppError::NotFound("Video not found".to_string()));
        }
        videos.insert(video.id, video.clone());
        Ok(video.clone())
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub repo: Arc<MemoryRepository>,
    pub assets: TempDir,
    pub scratch: TempDir,
    pub tools: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn token_for(&self, user_id: Uuid) -> String {
        self.state
            .jwt
            .issue(user_id, chrono::Duration::hours(1))
            .expect("Failed to issue token")
    }

    pub fn seed_video(&self, owner: Uuid) -> Uuid {
        let now = Utc::now();
        let video = Video {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            title: "Boots on the ground".to_string(),
            description: "Test clip".to_string(),
            user_id: owner,
            thumbnail_url: None,
            video_url: None,
        };
        let id = video.id;
        self.repo.videos.lock().unwrap().insert(id, video);
        id
    }

    pub fn stored_video(&self, id: Uuid) -> Video {
        self.repo
            .videos
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .expect("video missing")
    }

    /// Whether the stub ffmpeg has been invoked.
    pub fn optimizer_ran(&self) -> bool {
        self.tools.path().join("ffmpeg.ran").exists()
    }
}

pub struct TestOptions {
    pub delivery_mode: DeliveryMode,
    pub probe_json: &'static str,
    pub max_video_size_bytes: u64,
    /// Make the stub ffmpeg exit non-zero after writing a partial output.
    pub optimizer_fails: bool,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            delivery_mode: DeliveryMode::Direct,
            probe_json: LANDSCAPE,
            max_video_size_bytes: 1024,
            optimizer_fails: false,
        }
    }
}

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(TestOptions::default()).await
}

pub async fn setup_test_app_with(options: TestOptions) -> TestApp {
    let tools = TempDir::new().expect("Failed to create tools dir");
    let marker = tools.path().join("ffmpeg.ran");
    // Last argument is the output path; prefix the input with a moov tag.
    let remux = if options.optimizer_fails {
        r#"for last; do :; done; printf 'partial' > "$last"; echo 'Invalid data found when processing input' >&2; exit 1"#
    } else {
        r#"for last; do :; done; { printf 'moov'; cat "$2"; } > "$last""#
    };
    let ffmpeg = write_script(
        tools.path(),
        "ffmpeg",
        &format!("touch '{}'; {}", marker.display(), remux),
    );
    let ffprobe = write_script(
        tools.path(),
        "ffprobe",
        &format!("echo '{}'", options.probe_json),
    );

    let assets = TempDir::new().expect("Failed to create assets dir");
    let scratch = TempDir::new().expect("Failed to create scratch dir");

    let config = create_test_config(&options, &assets, &scratch, &ffmpeg, &ffprobe);

    let local = Arc::new(
        LocalStorage::new(
            assets.path(),
            ASSETS_BASE_URL.to_string(),
            config.local_signing_secret.as_bytes().to_vec(),
        )
        .await
        .expect("Failed to create local storage"),
    );
    let storage: Arc<dyn Storage> = local.clone();
    let repo = Arc::new(MemoryRepository::default());

    let state = build_state(config, repo.clone(), storage, Some(local))
        .expect("Failed to build state");
    let server =
        TestServer::new(build_router(state.clone())).expect("Failed to create test server");

    TestApp {
        server,
        state,
        repo,
        assets,
        scratch,
        tools,
    }
}

fn create_test_config(
    options: &TestOptions,
    assets: &TempDir,
    scratch: &TempDir,
    ffmpeg: &Path,
    ffprobe: &Path,
) -> Config {
    Config {
        server_port: 8091,
        environment: "test".to_string(),
        jwt_secret: "test-secret-key-min-32-characters-long-for-testing".to_string(),
        jwt_issuer: "tubely-access".to_string(),
        database_url: "postgres://localhost/tubely_test".to_string(),
        db_max_connections: 1,
        db_timeout_seconds: 1,
        storage_backend: StorageBackend::Local,
        s3_bucket: None,
        s3_region: None,
        s3_endpoint: None,
        local_storage_path: assets.path().to_path_buf(),
        local_storage_base_url: ASSETS_BASE_URL.to_string(),
        local_signing_secret: "local-signing-secret".to_string(),
        delivery_mode: options.delivery_mode,
        public_base_url: None,
        signed_url_ttl_secs: 3600,
        max_video_size_bytes: options.max_video_size_bytes,
        max_thumbnail_size_bytes: 1024,
        ffmpeg_path: ffmpeg.to_string_lossy().into_owned(),
        ffprobe_path: ffprobe.to_string_lossy().into_owned(),
        media_tool_timeout_secs: 10,
        upload_temp_dir: scratch.path().to_path_buf(),
    }
}

/// All regular files below `dir`.
pub fn files_under(dir: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for entry in std::fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            out.extend(files_under(&path));
        } else {
            out.push(path);
        }
    }
    out
}
