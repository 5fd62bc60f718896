// src/upload/batch.rs
// =============================================================================
// The upload operation itself.
//
// Flow:
// 1. Check the repository exists and the token can access it
// 2. Only then start uploading, several files at a time
// 3. Wait for every upload to finish, then report
//
// Why wait for everything before failing?
// - A finished upload is a commit, it can't be taken back
// - Waiting means the set of committed files is settled (and logged) by the
//   time the caller sees the error
//
// Nothing is rolled back: if one file fails, the others that made it stay in
// the repository.
// =============================================================================

use crate::config::UploaderConfig;
use crate::error::{Error, Result};
use crate::github::{GithubClient, RepoId};
use crate::upload::encode::encode_content;
use crate::upload::source::UploadFile;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Everything needed for one upload call.
pub struct UploadRequest {
    pub repository: RepoId,
    pub token: String,
    pub files: Vec<UploadFile>,
}

impl UploadRequest {
    /// Parses the repository identifier and checks the token is not empty.
    pub fn new(
        repository: &str,
        token: impl Into<String>,
        files: Vec<UploadFile>,
    ) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(Error::InvalidRequest("Token must not be empty".to_string()));
        }

        Ok(Self {
            repository: RepoId::parse(repository)?,
            token,
            files,
        })
    }
}

// Hand-written so the token never ends up in logs
impl fmt::Debug for UploadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadRequest")
            .field("repository", &self.repository)
            .field("token", &"<redacted>")
            .field("files", &self.files)
            .finish()
    }
}

/// A committed file and the Contents API response for it.
#[derive(Debug, Clone, Serialize)]
pub struct UploadedFile {
    pub name: String,
    /// Raw JSON body from GitHub (commit and content metadata).
    pub response: Value,
}

/// Uploads files to GitHub repositories.
///
/// One `Uploader` can serve many requests, it only holds configuration and
/// the pooled HTTP client.
pub struct Uploader {
    config: UploaderConfig,
    http: Client,
}

impl Uploader {
    pub fn new(config: UploaderConfig) -> Result<Self> {
        let http = GithubClient::build_http(&config)?;
        Ok(Self { config, http })
    }

    /// Verifies access, then commits every file in `request`.
    ///
    /// On success the results come back in the same order as the input files.
    ///
    /// On failure, files other than the failing one may already be committed.
    /// The reported error is the one from the earliest file (in input order)
    /// that failed.
    pub async fn upload(&self, request: UploadRequest) -> Result<Vec<UploadedFile>> {
        self.upload_with_cancellation(request, CancellationToken::new())
            .await
    }

    /// Same as [`Uploader::upload`], but gives up as soon as `cancel` fires.
    ///
    /// Cancelling aborts the access check and every upload still in flight.
    /// Uploads that already completed stay committed.
    pub async fn upload_with_cancellation(
        &self,
        request: UploadRequest,
        cancel: CancellationToken,
    ) -> Result<Vec<UploadedFile>> {
        let UploadRequest {
            repository,
            token,
            files,
        } = request;

        if token.trim().is_empty() {
            return Err(Error::InvalidRequest("Token must not be empty".to_string()));
        }

        let client = GithubClient::new(self.http.clone(), self.config.endpoint.clone(), token);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(Error::Cancelled { uploads_started: false });
            }
            verified = client.verify_access(&repository) => verified?,
        }
        info!(repo = %repository, files = files.len(), "repository access verified");

        if files.is_empty() {
            return Ok(Vec::new());
        }

        for name in duplicate_names(&files) {
            warn!(
                file = %name,
                "file name appears more than once, the surviving content is undefined"
            );
        }

        let client = &client;
        let repository = &repository;
        let cancel = &cancel;

        // Tag each upload with its input position so results can be put
        // back in order once they all settle
        let uploads = files.into_iter().enumerate().map(move |(index, file)| async move {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(Error::Cancelled { uploads_started: true }),
                uploaded = upload_one(client, repository, file) => uploaded,
            };
            (index, result)
        });

        let mut results: Vec<(usize, Result<UploadedFile>)> = stream::iter(uploads)
            .buffer_unordered(self.config.effective_concurrency())
            .collect()
            .await;
        results.sort_by_key(|(index, _)| *index);

        let mut uploaded = Vec::with_capacity(results.len());
        let mut first_error = None;
        let mut cancelled = false;
        for (_, result) in results {
            match result {
                Ok(file) => uploaded.push(file),
                Err(Error::Cancelled { .. }) => cancelled = true,
                Err(e) => {
                    warn!(repo = %repository, error = %e, "upload failed");
                    first_error.get_or_insert(e);
                }
            }
        }

        if cancelled {
            warn!(repo = %repository, committed = uploaded.len(), "upload cancelled");
            return Err(Error::Cancelled {
                uploads_started: true,
            });
        }

        match first_error {
            Some(e) => {
                warn!(
                    repo = %repository,
                    committed = uploaded.len(),
                    "batch failed, committed files were left in place"
                );
                Err(e)
            }
            None => Ok(uploaded),
        }
    }
}

/// Uploads `files` to `repository` with the default configuration.
///
/// Convenience wrapper around [`Uploader`]. Not atomic: on failure some
/// files may already be committed.
pub async fn upload_files(
    repository: &str,
    token: &str,
    files: Vec<UploadFile>,
) -> Result<Vec<UploadedFile>> {
    let request = UploadRequest::new(repository, token, files)?;
    Uploader::new(UploaderConfig::default())?
        .upload(request)
        .await
}

// Read, encode and commit a single file
async fn upload_one(
    client: &GithubClient,
    repo: &RepoId,
    file: UploadFile,
) -> Result<UploadedFile> {
    let bytes = file.read().await?;
    let content = encode_content(&bytes);

    let response = client.put_file(repo, &file.name, &content).await?;
    info!(%repo, file = %file.name, bytes = bytes.len(), "file committed");

    Ok(UploadedFile {
        name: file.name,
        response,
    })
}

// Same name twice means two writes to one path racing each other.
// Each repeated name is reported once.
fn duplicate_names(files: &[UploadFile]) -> Vec<&str> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for file in files {
        let name = file.name.as_str();
        if !seen.insert(name) && !duplicates.contains(&name) {
            duplicates.push(name);
        }
    }
    duplicates
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why tag uploads with an index?
//    - buffer_unordered yields results as they finish, not in input order
//    - Sorting by index afterwards gives stable output and a stable error
//
// 2. What does tokio::select! do here?
//    - It races the upload against the cancellation token
//    - Whichever finishes first wins, the other future is dropped
//    - Dropping a reqwest future aborts the request
//    - `biased;` checks cancellation first on every poll
//
// 3. Why `let client = &client;` before the map?
//    - Each upload future only needs to borrow the client
//    - Copying a reference into every `async move` block avoids cloning
//    - The borrow is fine because we await the whole stream in this function
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiEndpoint;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    // Notes when each PUT arrives and answers after a fixed delay
    struct SlowCommit {
        arrivals: Arc<Mutex<Vec<Instant>>>,
        delay: Duration,
    }

    impl Respond for SlowCommit {
        fn respond(&self, _request: &Request) -> ResponseTemplate {
            self.arrivals.lock().unwrap().push(Instant::now());
            ResponseTemplate::new(201)
                .set_body_json(json!({}))
                .set_delay(self.delay)
        }
    }

    // Most arrivals seen inside any window shorter than one response delay
    fn peak_in_flight(arrivals: &[Instant], window: Duration) -> usize {
        arrivals
            .iter()
            .map(|end| {
                arrivals
                    .iter()
                    .filter(|start| *start <= end && end.duration_since(**start) < window)
                    .count()
            })
            .max()
            .unwrap_or(0)
    }

    fn uploader_for(server: &MockServer) -> Uploader {
        let config = UploaderConfig::default()
            .with_endpoint(ApiEndpoint::direct(&server.uri()).unwrap())
            .with_concurrency(2);
        Uploader::new(config).unwrap()
    }

    fn request(files: Vec<UploadFile>) -> UploadRequest {
        UploadRequest::new("octo/hello", "token", files).unwrap()
    }

    async fn mount_verify(server: &MockServer, status: u16, expected: u64) {
        Mock::given(method("GET"))
            .and(path("/repos/octo/hello"))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({"id": 1})))
            .expect(expected)
            .mount(server)
            .await;
    }

    async fn mount_put(server: &MockServer, name: &str, content: &[u8], expected: u64) {
        Mock::given(method("PUT"))
            .and(path(format!("/repos/octo/hello/contents/{}", name)))
            .and(body_json(json!({
                "message": format!("Upload {}", name),
                "content": STANDARD.encode(content),
            })))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({"content": {"name": name}})),
            )
            .expect(expected)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_all_files_uploaded_after_verification() {
        let server = MockServer::start().await;
        mount_verify(&server, 200, 1).await;

        let big: Vec<u8> = (0..70_000u32).map(|i| (i % 251) as u8).collect();
        mount_put(&server, "a.txt", b"alpha", 1).await;
        mount_put(&server, "b.bin", &big, 1).await;
        mount_put(&server, "empty", b"", 1).await;

        let files = vec![
            UploadFile::from_bytes("a.txt", b"alpha".to_vec()),
            UploadFile::from_bytes("b.bin", big.clone()),
            UploadFile::from_bytes("empty", Vec::new()),
        ];
        let uploaded = uploader_for(&server).upload(request(files)).await.unwrap();

        let names: Vec<&str> = uploaded.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["a.txt", "b.bin", "empty"]);
        assert_eq!(uploaded[1].response["content"]["name"], "b.bin");

        let received = server.received_requests().await.unwrap();
        assert_eq!(received.len(), 4);
        assert_eq!(received[0].method.as_str(), "GET");
        assert!(received[1..].iter().all(|r| r.method.as_str() == "PUT"));
    }

    #[tokio::test]
    async fn test_failed_verification_prevents_uploads() {
        let server = MockServer::start().await;
        mount_verify(&server, 403, 1).await;
        mount_put(&server, "a.txt", b"alpha", 0).await;

        let files = vec![UploadFile::from_bytes("a.txt", b"alpha".to_vec())];
        let err = uploader_for(&server).upload(request(files)).await.unwrap_err();

        assert!(err.is_before_write());
        assert!(err.to_string().contains("permissions"));
    }

    #[tokio::test]
    async fn test_one_failure_fails_batch_but_others_complete() {
        let server = MockServer::start().await;
        mount_verify(&server, 200, 1).await;
        mount_put(&server, "a.txt", b"a", 1).await;
        mount_put(&server, "c.txt", b"c", 1).await;
        Mock::given(method("PUT"))
            .and(path("/repos/octo/hello/contents/b.txt"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({"message": "X"})))
            .expect(1)
            .mount(&server)
            .await;

        let files = vec![
            UploadFile::from_bytes("a.txt", b"a".to_vec()),
            UploadFile::from_bytes("b.txt", b"b".to_vec()),
            UploadFile::from_bytes("c.txt", b"c".to_vec()),
        ];
        let err = uploader_for(&server).upload(request(files)).await.unwrap_err();

        assert_eq!(err.to_string(), "X");
        assert!(matches!(err, Error::Upload { ref file, .. } if file == "b.txt"));
        // MockServer checks on drop that a.txt and c.txt were still sent
    }

    #[tokio::test]
    async fn test_earliest_failure_is_reported() {
        let server = MockServer::start().await;
        mount_verify(&server, 200, 1).await;
        Mock::given(method("PUT"))
            .and(path("/repos/octo/hello/contents/first.txt"))
            .respond_with(
                ResponseTemplate::new(422)
                    .set_body_json(json!({"message": "first broke"}))
                    .set_delay(Duration::from_millis(200)),
            )
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/repos/octo/hello/contents/second.txt"))
            .respond_with(
                ResponseTemplate::new(422).set_body_json(json!({"message": "second broke"})),
            )
            .mount(&server)
            .await;

        let files = vec![
            UploadFile::from_bytes("first.txt", b"1".to_vec()),
            UploadFile::from_bytes("second.txt", b"2".to_vec()),
        ];
        let err = uploader_for(&server).upload(request(files)).await.unwrap_err();
        assert_eq!(err.to_string(), "first broke");
    }

    #[tokio::test]
    async fn test_reupload_same_content_succeeds_twice() {
        let server = MockServer::start().await;
        mount_verify(&server, 200, 2).await;
        mount_put(&server, "same.txt", b"same", 2).await;

        let uploader = uploader_for(&server);
        for _ in 0..2 {
            let files = vec![UploadFile::from_bytes("same.txt", b"same".to_vec())];
            let uploaded = uploader.upload(request(files)).await.unwrap();
            assert_eq!(uploaded.len(), 1);
        }
    }

    #[tokio::test]
    async fn test_empty_file_set_only_verifies() {
        let server = MockServer::start().await;
        mount_verify(&server, 200, 1).await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let uploaded = uploader_for(&server).upload(request(Vec::new())).await.unwrap();
        assert!(uploaded.is_empty());
    }

    #[tokio::test]
    async fn test_path_source_uploaded_under_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("notes.md");
        std::fs::write(&local, b"# notes").unwrap();

        let server = MockServer::start().await;
        mount_verify(&server, 200, 1).await;
        mount_put(&server, "notes.md", b"# notes", 1).await;

        let files = vec![UploadFile::from_path(&local).unwrap()];
        let uploaded = uploader_for(&server).upload(request(files)).await.unwrap();
        assert_eq!(uploaded[0].name, "notes.md");
    }

    #[tokio::test]
    async fn test_unreadable_file_is_unexpected() {
        let dir = tempfile::tempdir().unwrap();

        let server = MockServer::start().await;
        mount_verify(&server, 200, 1).await;

        let files = vec![UploadFile::with_name("missing.txt", dir.path().join("missing.txt"))];
        let err = uploader_for(&server).upload(request(files)).await.unwrap_err();
        assert!(matches!(err, Error::Unexpected { .. }));
    }

    #[tokio::test]
    async fn test_cancelled_before_start_sends_nothing() {
        let server = MockServer::start().await;
        mount_verify(&server, 200, 0).await;

        let cancel = CancellationToken::new();
        cancel.cancel();

        let files = vec![UploadFile::from_bytes("a.txt", b"a".to_vec())];
        let err = uploader_for(&server)
            .upload_with_cancellation(request(files), cancel)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Cancelled {
                uploads_started: false
            }
        ));
        assert!(err.is_before_write());
    }

    #[tokio::test]
    async fn test_cancel_aborts_pending_uploads() {
        let server = MockServer::start().await;
        mount_verify(&server, 200, 1).await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(201).set_delay(Duration::from_secs(10)))
            .mount(&server)
            .await;

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            trigger.cancel();
        });

        let files = vec![
            UploadFile::from_bytes("a.txt", b"a".to_vec()),
            UploadFile::from_bytes("b.txt", b"b".to_vec()),
        ];
        let err = uploader_for(&server)
            .upload_with_cancellation(request(files), cancel)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Cancelled {
                uploads_started: true
            }
        ));
        assert!(!err.is_before_write());
    }

    #[tokio::test]
    async fn test_concurrency_cap_is_respected() {
        let server = MockServer::start().await;
        mount_verify(&server, 200, 1).await;

        let arrivals = Arc::new(Mutex::new(Vec::new()));
        Mock::given(method("PUT"))
            .respond_with(SlowCommit {
                arrivals: arrivals.clone(),
                delay: Duration::from_millis(300),
            })
            .expect(6)
            .mount(&server)
            .await;

        let files = (0..6)
            .map(|i| UploadFile::from_bytes(format!("f{}.txt", i), vec![i as u8]))
            .collect();
        let uploaded = uploader_for(&server).upload(request(files)).await.unwrap();
        assert_eq!(uploaded.len(), 6);

        let arrivals = arrivals.lock().unwrap().clone();
        assert_eq!(arrivals.len(), 6);
        // uploader_for caps uploads at 2
        assert_eq!(peak_in_flight(&arrivals, Duration::from_millis(200)), 2);
    }

    #[tokio::test]
    async fn test_duplicate_names_are_still_uploaded() {
        let server = MockServer::start().await;
        mount_verify(&server, 200, 1).await;
        mount_put(&server, "dup.txt", b"same", 2).await;

        let files = vec![
            UploadFile::from_bytes("dup.txt", b"same".to_vec()),
            UploadFile::from_bytes("dup.txt", b"same".to_vec()),
        ];
        let uploaded = uploader_for(&server).upload(request(files)).await.unwrap();
        assert_eq!(uploaded.len(), 2);
    }

    #[test]
    fn test_duplicate_names_reported_once() {
        let files: Vec<UploadFile> = ["a", "b", "a", "a", "c", "b"]
            .iter()
            .map(|name| UploadFile::from_bytes(*name, Vec::new()))
            .collect();
        assert_eq!(duplicate_names(&files), ["a", "b"]);
        assert!(duplicate_names(&files[..2]).is_empty());
    }

    #[test]
    fn test_request_validation() {
        assert!(matches!(
            UploadRequest::new("octo/hello", "  ", Vec::new()),
            Err(Error::InvalidRequest(_))
        ));
        assert!(matches!(
            UploadRequest::new("nope", "token", Vec::new()),
            Err(Error::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_request_debug_hides_token() {
        let request = UploadRequest::new("octo/hello", "ghp_supersecret", Vec::new()).unwrap();
        let printed = format!("{:?}", request);
        assert!(!printed.contains("ghp_supersecret"));
        assert!(printed.contains("<redacted>"));
    }
}
