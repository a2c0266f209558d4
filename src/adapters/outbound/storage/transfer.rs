//! Object-level transfers shared by every backend built on `object_store`.

use bytes::Bytes;
use futures::StreamExt;
use object_store::{
    path::Path as ObjectPath, Attribute, Attributes, GetOptions, ObjectStore, PutMultipartOptions,
    PutOptions, PutPayload, WriteMultipart,
};
use tokio::io::AsyncReadExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use super::error::StoreError;
use crate::{
    domain::value_objects::ObjectKey,
    ports::storage::{ObjectHead, PutOutcome},
};

/// Files up to this size go out in a single PUT; larger ones are sent as
/// multipart uploads of this part size.
pub const MULTIPART_PART_SIZE: usize = 8 * 1024 * 1024;

/// Parts allowed in flight at once during a multipart upload
const MAX_IN_FLIGHT_PARTS: usize = 4;

const READ_BUFFER: usize = 256 * 1024;

/// Convert a validated key into a store path. Fails if the path would not
/// name the key exactly.
pub fn object_path(key: &ObjectKey) -> Result<ObjectPath, StoreError> {
    let path = ObjectPath::parse(key.as_str())?;
    if path.as_ref() != key.as_str() {
        return Err(StoreError::KeyRewritten {
            key: key.to_string(),
            stored: path.to_string(),
        });
    }
    Ok(path)
}

fn content_attributes(content_type: &str) -> Attributes {
    let mut attributes = Attributes::new();
    attributes.insert(Attribute::ContentType, content_type.to_string().into());
    attributes
}

pub async fn put_bytes(
    store: &dyn ObjectStore,
    path: &ObjectPath,
    data: Bytes,
    content_type: &str,
) -> Result<PutOutcome, StoreError> {
    let size = data.len() as u64;
    let options = PutOptions {
        attributes: content_attributes(content_type),
        ..Default::default()
    };

    let result = store.put_opts(path, PutPayload::from(data), options).await?;

    Ok(PutOutcome {
        size,
        etag: result.e_tag,
    })
}

pub async fn put_file(
    store: &dyn ObjectStore,
    path: &ObjectPath,
    file_path: &std::path::Path,
    content_type: &str,
) -> Result<PutOutcome, StoreError> {
    let source = |source| StoreError::Source {
        path: file_path.to_path_buf(),
        source,
    };

    let mut file = tokio::fs::File::open(file_path).await.map_err(source)?;
    let size = file.metadata().await.map_err(source)?.len();

    if size <= MULTIPART_PART_SIZE as u64 {
        let mut data = Vec::with_capacity(size as usize);
        file.read_to_end(&mut data).await.map_err(source)?;
        return put_bytes(store, path, Bytes::from(data), content_type).await;
    }

    debug!(%path, size, "streaming file as multipart upload");
    let options = PutMultipartOptions {
        attributes: content_attributes(content_type),
        ..Default::default()
    };
    let upload = store.put_multipart_opts(path, options).await?;
    let mut writer = WriteMultipart::new_with_chunk_size(upload, MULTIPART_PART_SIZE);

    match stream_parts(&mut writer, file, file_path).await {
        Ok(written) => {
            let result = writer.finish().await?;
            Ok(PutOutcome {
                size: written,
                etag: result.e_tag,
            })
        }
        Err(err) => {
            if let Err(abort_err) = writer.abort().await {
                warn!(%path, error = %abort_err, "failed to abort multipart upload");
            }
            Err(err)
        }
    }
}

async fn stream_parts(
    writer: &mut WriteMultipart,
    file: tokio::fs::File,
    file_path: &std::path::Path,
) -> Result<u64, StoreError> {
    let mut chunks = ReaderStream::with_capacity(file, READ_BUFFER);
    let mut written = 0u64;

    while let Some(chunk) = chunks.next().await {
        let chunk = chunk.map_err(|source| StoreError::Source {
            path: file_path.to_path_buf(),
            source,
        })?;
        writer.wait_for_capacity(MAX_IN_FLIGHT_PARTS).await?;
        written += chunk.len() as u64;
        writer.put(chunk);
    }

    Ok(written)
}

pub async fn head(store: &dyn ObjectStore, path: &ObjectPath) -> Result<ObjectHead, StoreError> {
    let options = GetOptions {
        head: true,
        ..Default::default()
    };
    let result = store.get_opts(path, options).await?;

    let content_type = result.attributes.get(&Attribute::ContentType).map(|value| {
        let value: &str = value.as_ref();
        value.to_string()
    });

    Ok(ObjectHead {
        size: result.meta.size as u64,
        content_type,
        last_modified: result.meta.last_modified,
        etag: result.meta.e_tag,
    })
}

pub async fn delete(store: &dyn ObjectStore, path: &ObjectPath) -> Result<(), StoreError> {
    store.delete(path).await?;
    Ok(())
}
