//! Cover image selection.
//!
//! In priority order:
//! 1. the news item's own image, if a HEAD probe says it really is an image;
//! 2. a random file from the local covers directory, served from the
//!    repository's raw-content URL;
//! 3. no cover at all.
//!
//! Nothing here fails the run.

use crate::config::{CoverSettings, RepoLocation};
use crate::error::{BotError, Result};
use crate::models::{CoverImage, CoverOrigin, NewsItem};
use rand::Rng;
use rand::seq::IndexedRandom;
use reqwest::header::CONTENT_TYPE;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Checks whether a URL points at image content.
pub trait ImageProbe {
    async fn is_image(&self, url: &str) -> bool;
}

/// HEAD-request implementation of [`ImageProbe`].
#[derive(Debug, Clone)]
pub struct HttpImageProbe {
    http: reqwest::Client,
}

impl HttpImageProbe {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(PROBE_TIMEOUT)
            .build()
            .map_err(|e| BotError::transport("image probe", e))?;
        Ok(Self { http })
    }
}

impl ImageProbe for HttpImageProbe {
    #[instrument(level = "debug", skip(self))]
    async fn is_image(&self, url: &str) -> bool {
        if !is_fetchable_url(url) {
            debug!("Not an http(s) URL");
            return false;
        }
        match self.http.head(url).send().await {
            Ok(resp) => {
                let status = resp.status().as_u16();
                let content_type = resp
                    .headers()
                    .get(CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok());
                debug!(status, ?content_type, "Image probe response");
                is_image_response(status, content_type)
            }
            Err(e) => {
                debug!(error = %e, "Image URL validation failed");
                false
            }
        }
    }
}

/// Only absolute http(s) URLs are worth probing.
pub fn is_fetchable_url(url: &str) -> bool {
    Url::parse(url).is_ok_and(|u| matches!(u.scheme(), "http" | "https"))
}

/// A 2xx answer whose declared content type starts with `image/`.
pub fn is_image_response(status: u16, content_type: Option<&str>) -> bool {
    (200..300).contains(&status)
        && content_type.is_some_and(|ct| ct.trim().to_ascii_lowercase().starts_with("image/"))
}

/// Names of the files in `dir` with a recognised image extension, sorted.
pub async fn list_cover_files(dir: &Path, extensions: &[String]) -> std::io::Result<Vec<String>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        // Follows symlinks; dangling links are skipped.
        match tokio::fs::metadata(entry.path()).await {
            Ok(meta) if meta.is_file() => {}
            _ => continue,
        }
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        let recognised = Path::new(&name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)));
        if recognised {
            files.push(name);
        }
    }
    files.sort();
    Ok(files)
}

/// Public raw-content URL of `file` inside `dir` of the repository.
pub fn folder_cover_url(repo: &RepoLocation, dir: &str, file: &str) -> String {
    let dir = dir
        .trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .map(|s| urlencoding::encode(s).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    let file = urlencoding::encode(file);
    if dir.is_empty() {
        format!("{}/{}", repo.raw_base_url(), file)
    } else {
        format!("{}/{}/{}", repo.raw_base_url(), dir, file)
    }
}

/// Pick a random image from the covers directory.
#[instrument(level = "info", skip_all, fields(dir = %settings.dir))]
pub async fn random_folder_cover<R: Rng + ?Sized>(
    repo: &RepoLocation,
    settings: &CoverSettings,
    rng: &mut R,
) -> Option<CoverImage> {
    let path = repo.workspace.join(&settings.dir);
    let files = match list_cover_files(&path, &settings.extensions).await {
        Ok(files) => files,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Cannot read the cover images folder");
            return None;
        }
    };

    let Some(file) = files.choose(rng) else {
        warn!(path = %path.display(), "No image files found in the covers folder");
        return None;
    };
    let url = folder_cover_url(repo, &settings.dir, file);
    info!(%file, %url, "Selected fallback cover image from covers folder");
    Some(CoverImage {
        url,
        origin: CoverOrigin::Folder,
    })
}

/// Resolve the cover for this run.
///
/// # Arguments
///
/// * `news` - The news item the article is based on, if any
/// * `probe` - Validates the news item's `urlToImage`
/// * `repo` - Locates the covers directory locally and on raw.githubusercontent.com
/// * `settings` - Covers directory and recognised extensions
/// * `rng` - Picks the folder image
///
/// # Returns
///
/// The validated news image, else a random folder image, else `None`.
#[instrument(level = "info", skip_all)]
pub async fn select_cover<P, R>(
    news: Option<&NewsItem>,
    probe: &P,
    repo: &RepoLocation,
    settings: &CoverSettings,
    rng: &mut R,
) -> Option<CoverImage>
where
    P: ImageProbe,
    R: Rng + ?Sized,
{
    if let Some(url) = news.and_then(|n| n.url_to_image.as_deref()) {
        if probe.is_image(url).await {
            info!(%url, "Using news article image as cover");
            return Some(CoverImage {
                url: url.to_string(),
                origin: CoverOrigin::News,
            });
        }
        warn!(%url, "News image URL is invalid or not an image; falling back to covers folder");
    } else if news.is_some() {
        info!("News item has no image; falling back to covers folder");
    }

    let cover = random_folder_cover(repo, settings, rng).await;
    if cover.is_none() {
        info!("Publishing without a cover image");
    }
    cover
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_http::{response, serve_once};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::cell::RefCell;
    use std::path::PathBuf;

    /// Accepts URLs from a fixed list and records every probe.
    struct FakeProbe {
        valid: Vec<String>,
        probed: RefCell<Vec<String>>,
    }

    impl FakeProbe {
        fn accepting(valid: &[&str]) -> Self {
            Self {
                valid: valid.iter().map(|s| s.to_string()).collect(),
                probed: RefCell::new(Vec::new()),
            }
        }
    }

    impl ImageProbe for FakeProbe {
        async fn is_image(&self, url: &str) -> bool {
            self.probed.borrow_mut().push(url.to_string());
            self.valid.iter().any(|v| v == url)
        }
    }

    fn repo(workspace: PathBuf) -> RepoLocation {
        RepoLocation {
            owner: "octo".into(),
            repo: "blog".into(),
            branch: "main".into(),
            workspace,
        }
    }

    fn covers_fixture(files: &[&str]) -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        let covers = tmp.path().join("covers");
        std::fs::create_dir(&covers).unwrap();
        for f in files {
            std::fs::write(covers.join(f), b"img").unwrap();
        }
        tmp
    }

    fn news_with_image(url: Option<&str>) -> NewsItem {
        NewsItem {
            title: Some("t".into()),
            url_to_image: url.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_is_image_response() {
        assert!(is_image_response(200, Some("image/png")));
        assert!(is_image_response(200, Some("Image/JPEG; charset=binary")));
        assert!(!is_image_response(200, Some("text/html")));
        assert!(!is_image_response(200, None));
        assert!(!is_image_response(404, Some("image/png")));
    }

    #[test]
    fn test_is_fetchable_url() {
        assert!(is_fetchable_url("https://cdn.example/a.png"));
        assert!(!is_fetchable_url("ftp://cdn.example/a.png"));
        assert!(!is_fetchable_url("/relative/a.png"));
        assert!(!is_fetchable_url(""));
    }

    #[test]
    fn test_folder_cover_url_encodes_file_name() {
        let r = repo(PathBuf::from("."));
        assert_eq!(
            folder_cover_url(&r, "covers", "my cover.png"),
            "https://raw.githubusercontent.com/octo/blog/main/covers/my%20cover.png"
        );
        assert_eq!(
            folder_cover_url(&r, "assets/covers/", "a.jpg"),
            "https://raw.githubusercontent.com/octo/blog/main/assets/covers/a.jpg"
        );
    }

    #[tokio::test]
    async fn test_list_cover_files_filters_extensions() {
        let tmp = covers_fixture(&["b.PNG", "a.jpg", "notes.txt", "c.webp", "noext"]);
        std::fs::create_dir(tmp.path().join("covers").join("nested.png")).unwrap();
        let files = list_cover_files(&tmp.path().join("covers"), &CoverSettings::default().extensions)
            .await
            .unwrap();
        assert_eq!(files, vec!["a.jpg", "b.PNG", "c.webp"]);
    }

    #[tokio::test]
    async fn test_valid_news_image_wins() {
        let tmp = covers_fixture(&["a.png"]);
        let probe = FakeProbe::accepting(&["https://cdn.example/news.jpg"]);
        let news = news_with_image(Some("https://cdn.example/news.jpg"));
        let mut rng = StdRng::seed_from_u64(1);
        let cover = select_cover(
            Some(&news),
            &probe,
            &repo(tmp.path().to_path_buf()),
            &CoverSettings::default(),
            &mut rng,
        )
        .await
        .unwrap();
        assert_eq!(cover.origin, CoverOrigin::News);
        assert_eq!(cover.url, "https://cdn.example/news.jpg");
    }

    #[tokio::test]
    async fn test_invalid_news_image_falls_back_to_folder() {
        let tmp = covers_fixture(&["a.png"]);
        let probe = FakeProbe::accepting(&[]);
        let news = news_with_image(Some("https://cdn.example/page.html"));
        let mut rng = StdRng::seed_from_u64(1);
        let cover = select_cover(
            Some(&news),
            &probe,
            &repo(tmp.path().to_path_buf()),
            &CoverSettings::default(),
            &mut rng,
        )
        .await
        .unwrap();
        assert_eq!(cover.origin, CoverOrigin::Folder);
        assert_eq!(cover.url, "https://raw.githubusercontent.com/octo/blog/main/covers/a.png");
        assert_ne!(cover.url, "https://cdn.example/page.html");
        assert_eq!(probe.probed.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_no_news_skips_probe() {
        let tmp = covers_fixture(&["a.png", "b.gif"]);
        let probe = FakeProbe::accepting(&[]);
        let mut rng = StdRng::seed_from_u64(9);
        let cover = select_cover(
            None,
            &probe,
            &repo(tmp.path().to_path_buf()),
            &CoverSettings::default(),
            &mut rng,
        )
        .await
        .unwrap();
        assert_eq!(cover.origin, CoverOrigin::Folder);
        assert!(probe.probed.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_empty_or_missing_folder_means_no_cover() {
        let tmp = covers_fixture(&["readme.md"]);
        let probe = FakeProbe::accepting(&[]);
        let mut rng = StdRng::seed_from_u64(1);
        let settings = CoverSettings::default();
        let cover = select_cover(None, &probe, &repo(tmp.path().to_path_buf()), &settings, &mut rng).await;
        assert!(cover.is_none());

        let missing = repo(tmp.path().join("does-not-exist"));
        let cover = select_cover(None, &probe, &missing, &settings, &mut rng).await;
        assert!(cover.is_none());
    }

    #[tokio::test]
    async fn test_head_request_reads_content_type() {
        let (base, server) = serve_once(response("200 OK", "image/png", "")).await;
        let probe = HttpImageProbe::new().unwrap();
        assert!(probe.is_image(&format!("{base}/img/cover.png")).await);
        let request = server.await.unwrap();
        assert!(request.starts_with("HEAD /img/cover.png HTTP/1.1"), "{request}");
    }

    #[tokio::test]
    async fn test_head_request_rejects_non_image_content() {
        let (base, server) = serve_once(response("200 OK", "text/html; charset=utf-8", "")).await;
        let probe = HttpImageProbe::new().unwrap();
        assert!(!probe.is_image(&format!("{base}/article")).await);
        server.await.unwrap();

        let (base, server) = serve_once(response("404 Not Found", "image/png", "")).await;
        assert!(!probe.is_image(&format!("{base}/gone.png")).await);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_image_host_is_not_an_image() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let probe = HttpImageProbe::new().unwrap();
        assert!(!probe.is_image(&format!("http://{addr}/cover.png")).await);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_list_cover_files_follows_symlinks() {
        let tmp = covers_fixture(&["real.png"]);
        let covers = tmp.path().join("covers");
        let shared = tmp.path().join("shared.jpg");
        std::fs::write(&shared, b"img").unwrap();
        std::os::unix::fs::symlink(&shared, covers.join("linked.jpg")).unwrap();
        std::os::unix::fs::symlink(tmp.path().join("missing.png"), covers.join("dangling.png")).unwrap();

        let files = list_cover_files(&covers, &CoverSettings::default().extensions)
            .await
            .unwrap();
        assert_eq!(files, vec!["linked.jpg", "real.png"]);
    }
}
