use std::collections::HashSet;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use object_gateway::{
    create_in_memory_app, AppBuilder, AppServices, BucketName, BucketService, ContentType,
    DeletionService, InMemoryBackend, ObjectHead, ObjectKey, ObjectService, PutOutcome,
    StorageError, StorageResult, StoreBackend, UploadSource,
};

/// Wraps the in-memory backend, counting bucket creations and failing deletes
/// of one poisoned key.
#[derive(Default)]
struct InstrumentedBackend {
    inner: InMemoryBackend,
    creates: AtomicUsize,
    poisoned_key: Option<String>,
}

impl InstrumentedBackend {
    fn failing_deletes_of(key: &str) -> Self {
        Self {
            poisoned_key: Some(key.to_string()),
            ..Self::default()
        }
    }
}

#[async_trait]
impl StoreBackend for InstrumentedBackend {
    async fn bucket_exists(&self, bucket: &BucketName) -> StorageResult<bool> {
        self.inner.bucket_exists(bucket).await
    }

    async fn create_bucket(&self, bucket: &BucketName) -> StorageResult<()> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.inner.create_bucket(bucket).await
    }

    async fn put_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<PutOutcome> {
        self.inner.put_object(bucket, key, data, content_type).await
    }

    async fn put_file(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        path: &Path,
        content_type: &str,
    ) -> StorageResult<PutOutcome> {
        self.inner.put_file(bucket, key, path, content_type).await
    }

    async fn head_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
    ) -> StorageResult<ObjectHead> {
        self.inner.head_object(bucket, key).await
    }

    async fn delete_object(&self, bucket: &BucketName, key: &ObjectKey) -> StorageResult<()> {
        if self.poisoned_key.as_deref() == Some(key.as_str()) {
            return Err(StorageError::AccessDenied {
                bucket: bucket.to_string(),
                key: Some(key.to_string()),
                operation: "delete_object".to_string(),
            });
        }
        self.inner.delete_object(bucket, key).await
    }

    async fn presign_get(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        expires_in: Duration,
    ) -> StorageResult<String> {
        self.inner.presign_get(bucket, key, expires_in).await
    }
}

/// Bucket creation never answers. The existence check stalls too unless
/// `answers_exists` is set, in which case it reports the bucket missing.
struct StalledBackend {
    answers_exists: bool,
}

#[async_trait]
impl StoreBackend for StalledBackend {
    async fn bucket_exists(&self, _bucket: &BucketName) -> StorageResult<bool> {
        if self.answers_exists {
            return Ok(false);
        }
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(true)
    }

    async fn create_bucket(&self, _bucket: &BucketName) -> StorageResult<()> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }

    async fn put_object(
        &self,
        _bucket: &BucketName,
        _key: &ObjectKey,
        _data: Bytes,
        _content_type: &str,
    ) -> StorageResult<PutOutcome> {
        unimplemented!("not used by bucket tests")
    }

    async fn put_file(
        &self,
        _bucket: &BucketName,
        _key: &ObjectKey,
        _path: &Path,
        _content_type: &str,
    ) -> StorageResult<PutOutcome> {
        unimplemented!("not used by bucket tests")
    }

    async fn head_object(
        &self,
        _bucket: &BucketName,
        _key: &ObjectKey,
    ) -> StorageResult<ObjectHead> {
        unimplemented!("not used by bucket tests")
    }

    async fn delete_object(&self, _bucket: &BucketName, _key: &ObjectKey) -> StorageResult<()> {
        unimplemented!("not used by bucket tests")
    }

    async fn presign_get(
        &self,
        _bucket: &BucketName,
        _key: &ObjectKey,
        _expires_in: Duration,
    ) -> StorageResult<String> {
        unimplemented!("not used by bucket tests")
    }
}

async fn app_with_bucket(name: &str) -> (AppServices, BucketName) {
    let app = create_in_memory_app().unwrap();
    let bucket = BucketName::new(name).unwrap();
    app.bucket_service.ensure_bucket(&bucket).await.unwrap();
    (app, bucket)
}

#[tokio::test]
async fn ensure_bucket_twice_creates_once() {
    let backend = Arc::new(InstrumentedBackend::default());
    let app = AppBuilder::with_backend(backend.clone(), Duration::from_secs(10));
    let bucket = BucketName::new("media").unwrap();

    app.bucket_service.ensure_bucket(&bucket).await.unwrap();
    app.bucket_service.ensure_bucket(&bucket).await.unwrap();

    assert_eq!(backend.creates.load(Ordering::SeqCst), 1);
    assert!(app.bucket_service.bucket_exists(&bucket).await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn bucket_calls_time_out() {
    let backend = StalledBackend {
        answers_exists: false,
    };
    let app = AppBuilder::with_backend(Arc::new(backend), Duration::from_secs(10));
    let bucket = BucketName::new("slow").unwrap();

    let err = app.bucket_service.bucket_exists(&bucket).await.unwrap_err();
    assert_eq!(
        err,
        StorageError::Timeout {
            operation: "bucket_exists".to_string(),
            after: Duration::from_secs(10),
        }
    );

    let err = app.bucket_service.ensure_bucket(&bucket).await.unwrap_err();
    assert_eq!(
        err,
        StorageError::Timeout {
            operation: "bucket_exists".to_string(),
            after: Duration::from_secs(10),
        }
    );
}

#[tokio::test(start_paused = true)]
async fn hanging_create_times_out_after_fast_existence_check() {
    let backend = StalledBackend {
        answers_exists: true,
    };
    let app = AppBuilder::with_backend(Arc::new(backend), Duration::from_secs(4));
    let bucket = BucketName::new("slow").unwrap();

    let err = app.bucket_service.ensure_bucket(&bucket).await.unwrap_err();
    assert_eq!(
        err,
        StorageError::Timeout {
            operation: "create_bucket".to_string(),
            after: Duration::from_secs(4),
        }
    );
}

#[tokio::test]
async fn stat_of_missing_key_is_empty() {
    let (app, bucket) = app_with_bucket("inbox").await;
    let key = ObjectKey::new("never-written.bin").unwrap();

    let stat = app.object_service.stat_object(&bucket, &key).await.unwrap();
    assert!(stat.is_none());
}

#[tokio::test]
async fn buffer_upload_round_trip() {
    let (app, bucket) = app_with_bucket("inbox").await;
    let key = ObjectKey::new("reports/2024/q1.csv").unwrap();
    let data = Bytes::from_static(b"region,total\nnorth,10\nsouth,12\n");

    let receipt = app
        .object_service
        .upload_buffer(&bucket, &key, data.clone(), data.len() as u64, None)
        .await
        .unwrap();
    assert_eq!(receipt.size_bytes, data.len() as u64);
    assert_eq!(receipt.content_type, "text/csv");

    let stat = app
        .object_service
        .stat_object(&bucket, &key)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stat.size_bytes, data.len() as u64);
    assert_eq!(stat.key, "reports/2024/q1.csv");
    assert_eq!(stat.content_type, "text/csv");
}

#[tokio::test]
async fn notes_txt_resolves_to_text_plain() {
    let (app, bucket) = app_with_bucket("inbox").await;
    let key = ObjectKey::new("notes.txt").unwrap();
    let data = Bytes::from_static(b"remember to water the plants today!!\n");
    assert_eq!(data.len(), 37);

    let receipt = app
        .object_service
        .upload(&bucket, &key, UploadSource::buffer(data), None)
        .await
        .unwrap();
    assert_eq!(receipt.content_type, "text/plain");
    assert_eq!(receipt.size_bytes, 37);
}

#[tokio::test]
async fn extensionless_buffer_is_sniffed() {
    let (app, bucket) = app_with_bucket("inbox").await;
    let key = ObjectKey::new("avatars/42").unwrap();
    let png = Bytes::from_static(b"\x89PNG\x0D\x0A\x1A\x0A\x00\x00\x00\x0DIHDR");

    let receipt = app
        .object_service
        .upload(&bucket, &key, UploadSource::buffer(png), None)
        .await
        .unwrap();
    assert_eq!(receipt.content_type, "image/png");
}

#[tokio::test]
async fn declared_length_must_match() {
    let (app, bucket) = app_with_bucket("inbox").await;
    let key = ObjectKey::new("short.bin").unwrap();

    let err = app
        .object_service
        .upload(
            &bucket,
            &key,
            UploadSource::Buffer {
                data: Bytes::from_static(b"12345"),
                declared_length: 10,
            },
            None,
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        StorageError::LengthMismatch {
            declared: 10,
            actual: 5
        }
    );
}

#[tokio::test]
async fn file_upload_uses_file_name_for_content_type() {
    let (app, bucket) = app_with_bucket("inbox").await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("page.html");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(b"<html><body>hello</body></html>").unwrap();
    drop(file);

    // The key has no extension; the file path decides
    let key = ObjectKey::new("site/index").unwrap();
    let receipt = app
        .object_service
        .upload_file(&bucket, &path, &key, None)
        .await
        .unwrap();
    assert_eq!(receipt.content_type, "text/html");
    assert_eq!(receipt.size_bytes, 31);

    let stat = app
        .object_service
        .stat_object(&bucket, &key)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stat.size_bytes, 31);
    assert_eq!(stat.content_type, "text/html");
}

#[tokio::test]
async fn unreadable_file_fails_upload() {
    let (app, bucket) = app_with_bucket("inbox").await;
    let key = ObjectKey::new("ghost").unwrap();

    let err = app
        .object_service
        .upload(
            &bucket,
            &key,
            UploadSource::file("/no/such/dir/ghost"),
            ContentType::new("application/octet-stream"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::SourceUnreadable { .. }));
}

#[tokio::test]
async fn upload_overwrites_existing_key() {
    let (app, bucket) = app_with_bucket("inbox").await;
    let key = ObjectKey::new("draft.md").unwrap();

    for body in [&b"first draft"[..], &b"second, longer draft"[..]] {
        app.object_service
            .upload(&bucket, &key, UploadSource::buffer(body.to_vec()), None)
            .await
            .unwrap();
    }

    let stat = app
        .object_service
        .stat_object(&bucket, &key)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stat.size_bytes, 20);
}

#[tokio::test]
async fn delete_many_reports_every_key() {
    let backend = Arc::new(InstrumentedBackend::failing_deletes_of("locked.txt"));
    let app = AppBuilder::with_backend(backend.clone(), Duration::from_secs(10));
    let bucket = BucketName::new("archive").unwrap();
    app.bucket_service.ensure_bucket(&bucket).await.unwrap();

    let keys: Vec<String> = ["a.txt", "b.txt", "locked.txt", "c.txt", "d.txt"]
        .iter()
        .map(|k| k.to_string())
        .collect();
    for key in &keys {
        app.object_service
            .upload(
                &bucket,
                &ObjectKey::new(key.as_str()).unwrap(),
                UploadSource::buffer(&b"payload"[..]),
                None,
            )
            .await
            .unwrap();
    }

    let outcomes = app.deletion_service.delete_many(&bucket, keys.clone()).await;
    assert_eq!(outcomes.len(), keys.len());

    let returned: HashSet<&str> = outcomes.iter().map(|o| o.key()).collect();
    let expected: HashSet<&str> = keys.iter().map(String::as_str).collect();
    assert_eq!(returned, expected);

    let failures: Vec<_> = outcomes.iter().filter(|o| !o.is_deleted()).collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].key(), "locked.txt");
    assert!(matches!(
        failures[0].error(),
        Some(StorageError::AccessDenied { .. })
    ));

    // The failure did not stop the rest of the batch
    let gone = app
        .object_service
        .stat_object(&bucket, &ObjectKey::new("d.txt").unwrap())
        .await
        .unwrap();
    assert!(gone.is_none());
    let kept = app
        .object_service
        .stat_object(&bucket, &ObjectKey::new("locked.txt").unwrap())
        .await
        .unwrap();
    assert!(kept.is_some());
}

#[tokio::test]
async fn delete_many_handles_duplicate_keys() {
    let (app, bucket) = app_with_bucket("dupes").await;
    let key = ObjectKey::new("twice.txt").unwrap();
    app.object_service
        .upload(&bucket, &key, UploadSource::buffer(&b"x"[..]), None)
        .await
        .unwrap();

    let outcomes = app
        .deletion_service
        .delete_many(&bucket, vec!["twice.txt".into(), "twice.txt".into()])
        .await;
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| o.is_deleted()));
}

#[tokio::test]
async fn delete_one_of_missing_key_succeeds() {
    let (app, bucket) = app_with_bucket("inbox").await;
    let key = ObjectKey::new("not-there.txt").unwrap();

    app.deletion_service.delete_one(&bucket, &key).await.unwrap();
}

#[tokio::test]
async fn operations_on_missing_bucket_fail() {
    let app = create_in_memory_app().unwrap();
    let bucket = BucketName::new("nowhere").unwrap();
    let key = ObjectKey::new("a.txt").unwrap();

    let err = app
        .object_service
        .upload(&bucket, &key, UploadSource::buffer(&b"a"[..]), None)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::BucketNotFound { .. }));

    let err = app.object_service.stat_object(&bucket, &key).await.unwrap_err();
    assert!(matches!(err, StorageError::BucketNotFound { .. }));
}
