use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::{filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt};

use object_gateway::{
    domain::content_type,
    prelude::*,
    AppBuilder, DeletionRequest, StorageBackend,
};

#[derive(Parser, Debug)]
#[command(name = "object-gateway")]
#[command(about = "Work with buckets and objects on an S3-compatible store", long_about = None)]
struct Cli {
    #[command(flatten)]
    store: StoreArgs,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

/// How to reach the object store
#[derive(clap::Args, Debug)]
struct StoreArgs {
    /// Store endpoint, `host:port` or a full URL
    #[arg(long, env = "S3_ENDPOINT", default_value = "localhost:9000")]
    endpoint: String,

    /// Access key id
    #[arg(long, env = "S3_ACCESS_KEY", default_value = "")]
    access_key: String,

    /// Secret access key
    #[arg(long, env = "S3_SECRET_KEY", default_value = "", hide_env_values = true)]
    secret_key: String,

    /// Region used for request signing
    #[arg(long, env = "S3_REGION", default_value = "us-east-1")]
    region: String,

    /// Use https for a bare `host:port` endpoint
    #[arg(long, env = "MINIO_USE_SSL")]
    use_ssl: bool,

    /// Deadline for bucket existence and creation calls, in seconds
    #[arg(long, env = "BUCKET_TIMEOUT_SECS", default_value_t = 10)]
    bucket_timeout: u64,

    /// Use a throwaway in-process store instead of a remote one
    #[arg(long)]
    in_memory: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(flatten)]
    Store(StoreCommand),

    /// Show the content type a local file would be uploaded with
    ContentType {
        file: PathBuf,
    },
}

/// Commands that talk to the object store
#[derive(Subcommand, Debug)]
enum StoreCommand {
    /// Check whether a bucket exists
    BucketExists {
        bucket: String,
    },

    /// Create a bucket unless it already exists
    EnsureBucket {
        bucket: String,
    },

    /// Upload a local file
    Put {
        bucket: String,
        /// File to upload
        file: PathBuf,
        /// Object key (defaults to the file name)
        #[arg(short, long)]
        key: Option<String>,
        /// Content type (detected when omitted)
        #[arg(short, long)]
        content_type: Option<String>,
    },

    /// Print object metadata as JSON
    Stat {
        bucket: String,
        key: String,
    },

    /// Print a presigned GET URL
    Presign {
        bucket: String,
        key: String,
        /// Validity in seconds
        #[arg(short, long, default_value_t = 300)]
        expires: u64,
    },

    /// Delete one object
    Delete {
        bucket: String,
        key: String,
    },

    /// Delete many objects
    DeleteMany {
        bucket: String,
        /// Keys to delete
        keys: Vec<String>,
        /// Read newline-separated keys from a file, `-` for stdin
        #[arg(short, long)]
        from_file: Option<PathBuf>,
    },
}

fn setup_logging(log_level: &str) -> Result<()> {
    let level = Level::from_str(log_level)
        .with_context(|| format!("invalid log level '{}'", log_level))?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(LevelFilter::from_level(level))
        .init();

    Ok(())
}

impl StoreArgs {
    fn connection(&self) -> StoreConnection {
        StoreConnection::new(&self.endpoint, &self.access_key, &self.secret_key)
            .with_tls(self.use_ssl)
            .with_region(&self.region)
    }

    fn app(&self) -> Result<AppServices> {
        let backend = if self.in_memory {
            StorageBackend::InMemory
        } else {
            StorageBackend::S3(self.connection())
        };

        AppBuilder::new()
            .with_storage_backend(backend)
            .with_bucket_timeout(Duration::from_secs(self.bucket_timeout))
            .build()
            .context("failed to connect to the object store")
    }
}

fn read_keys(source: &Path) -> Result<Vec<String>> {
    let lines: Vec<String> = if source == Path::new("-") {
        std::io::stdin()
            .lock()
            .lines()
            .collect::<std::io::Result<_>>()
            .context("failed to read keys from stdin")?
    } else {
        let file = std::fs::File::open(source)
            .with_context(|| format!("failed to open {}", source.display()))?;
        std::io::BufReader::new(file)
            .lines()
            .collect::<std::io::Result<_>>()
            .with_context(|| format!("failed to read keys from {}", source.display()))?
    };

    Ok(lines
        .into_iter()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect())
}

fn default_key(file: &Path) -> Result<String> {
    file.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("cannot derive an object key from {}", file.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let Cli {
        store,
        log_level,
        command,
    } = Cli::parse();
    setup_logging(&log_level)?;

    match command {
        Commands::ContentType { file } => {
            println!("{}", content_type::resolve_file(&file).await);
            Ok(())
        }
        Commands::Store(command) => run(command, store.app()?).await,
    }
}

async fn run(command: StoreCommand, app: AppServices) -> Result<()> {
    match command {
        StoreCommand::BucketExists { bucket } => {
            let bucket = BucketName::new(bucket)?;
            let exists = app.bucket_service.bucket_exists(&bucket).await?;
            println!("{}", exists);
        }
        StoreCommand::EnsureBucket { bucket } => {
            let bucket = BucketName::new(bucket)?;
            app.bucket_service.ensure_bucket(&bucket).await?;
            info!(bucket = %bucket, "bucket ready");
        }
        StoreCommand::Put {
            bucket,
            file,
            key,
            content_type,
        } => {
            let bucket = BucketName::new(bucket)?;
            let key = ObjectKey::new(match key {
                Some(key) => key,
                None => default_key(&file)?,
            })?;
            let content_type = content_type.and_then(ContentType::new);

            let receipt = app
                .object_service
                .upload(&bucket, &key, UploadSource::file(file), content_type)
                .await?;
            println!("{}", serde_json::to_string_pretty(&receipt)?);
        }
        StoreCommand::Stat { bucket, key } => {
            let bucket = BucketName::new(bucket)?;
            let key = ObjectKey::new(key)?;
            match app.object_service.stat_object(&bucket, &key).await? {
                Some(descriptor) => println!("{}", serde_json::to_string_pretty(&descriptor)?),
                None => bail!("no object '{}' in bucket '{}'", key, bucket),
            }
        }
        StoreCommand::Presign {
            bucket,
            key,
            expires,
        } => {
            let bucket = BucketName::new(bucket)?;
            let key = ObjectKey::new(key)?;
            let url = app
                .object_service
                .presigned_url(&bucket, &key, Duration::from_secs(expires))
                .await?;
            println!("{}", url);
        }
        StoreCommand::Delete { bucket, key } => {
            let bucket = BucketName::new(bucket)?;
            let key = ObjectKey::new(key)?;
            app.deletion_service.delete_one(&bucket, &key).await?;
        }
        StoreCommand::DeleteMany {
            bucket,
            mut keys,
            from_file,
        } => {
            if let Some(source) = from_file {
                keys.extend(read_keys(&source)?);
            }
            let request = DeletionRequest {
                bucket: BucketName::new(bucket)?,
                keys,
            };
            let requested = request.keys.len();

            let outcomes = app.deletion_service.execute(request).await;
            let mut failed = 0;
            for outcome in &outcomes {
                match outcome.error() {
                    None => println!("deleted {}", outcome.key()),
                    Some(err) => {
                        failed += 1;
                        eprintln!("failed  {}: {}", outcome.key(), err);
                    }
                }
            }
            if failed > 0 {
                bail!("{} of {} deletions failed", failed, requested);
            }
        }
    }

    Ok(())
}
