//! Image Node Runner - run the pipeline nodes outside of a host
//!
//! Environment variables:
//! - AWS_ACCESS_KEY_ID / AWS_SECRET_ACCESS_KEY / AWS_REGION_NAME: S3 credentials
//! - S3_ENDPOINT: custom S3-compatible endpoint (optional)
//! - S3_FORCE_PATH_STYLE: path-style addressing (default: false)
//! - S3_UPLOAD_ACL: canned ACL for uploads (default: "public-read")

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use bytes::Bytes;
use clap::{Parser, Subcommand};
use image_s3_nodes::nodes::{
    ConvertToThumbnailNode, LoadImageNode, SaveImageNode, SaveThumbnailNode,
};
use image_s3_nodes::tensor::{batch_from_frame, encode_png, load_batch, tensor_to_image};
use image_s3_nodes::thumbnail::DEFAULT_THUMBNAIL_SIZE;
use image_s3_nodes::{ImageTensor, NodeOutput, NodeParams, NodeRegistry, NodesConfig, ParamValue};
use ndarray::Axis;
use s3_utils::{InMemoryObjectStore, ObjectStore, S3Client};
use tracing::info;

/// Run image pipeline nodes from the command line.
#[derive(Parser, Debug)]
#[command(name = "image-node")]
#[command(version, about, long_about = None)]
struct Args {
    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every node's input and output schema as JSON.
    Schema,

    /// Write a square WebP thumbnail of a local image.
    Thumbnail {
        #[arg(value_name = "INPUT")]
        input: PathBuf,
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,
        #[arg(long, default_value_t = i64::from(DEFAULT_THUMBNAIL_SIZE))]
        width: i64,
        #[arg(long, default_value_t = i64::from(DEFAULT_THUMBNAIL_SIZE))]
        height: i64,
    },

    /// Upload a local image to S3 as PNG.
    Upload {
        #[arg(value_name = "INPUT")]
        input: PathBuf,
        #[arg(long)]
        bucket: String,
        #[arg(long)]
        key: String,
    },

    /// Upload a square WebP thumbnail of a local image to S3.
    UploadThumbnail {
        #[arg(value_name = "INPUT")]
        input: PathBuf,
        #[arg(long)]
        bucket: String,
        #[arg(long)]
        key: String,
        #[arg(long, default_value_t = i64::from(DEFAULT_THUMBNAIL_SIZE))]
        width: i64,
        #[arg(long, default_value_t = i64::from(DEFAULT_THUMBNAIL_SIZE))]
        height: i64,
    },

    /// Download an object and write its frames as PNG.
    Download {
        #[arg(long)]
        bucket: String,
        #[arg(long)]
        key: String,
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,
    },
}

impl Command {
    fn needs_storage(&self) -> bool {
        !matches!(self, Command::Schema | Command::Thumbnail { .. })
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("image_node={log_level},image_s3_nodes={log_level},s3_utils={log_level}")
                    .into()
            }),
        )
        .with_target(false)
        .init();

    if let Err(err) = run(args.command).await {
        tracing::error!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn run(command: Command) -> Result<()> {
    let config = NodesConfig::from_env().context("Failed to load configuration")?;

    let store: Arc<dyn ObjectStore> = if command.needs_storage() {
        Arc::new(S3Client::new(config.s3.clone()).await)
    } else {
        Arc::new(InMemoryObjectStore::new())
    };
    let registry = NodeRegistry::new(store, &config.upload);

    match command {
        Command::Schema => {
            println!("{}", serde_json::to_string_pretty(&registry.describe())?);
        }
        Command::Thumbnail {
            input,
            output,
            width,
            height,
        } => {
            let params = NodeParams::new()
                .with("image", ParamValue::Bytes(read_input(&input)?))
                .with("resizing_width", ParamValue::Int(width))
                .with("resizing_height", ParamValue::Int(height));

            match execute(&registry, ConvertToThumbnailNode::NAME, params).await? {
                NodeOutput::Encoded(data) => {
                    std::fs::write(&output, &data)
                        .with_context(|| format!("Failed to write {}", output.display()))?;
                    info!(output = %output.display(), size = data.len(), "Thumbnail written");
                }
                other => bail!("unexpected node output: {}", other.kind()),
            }
        }
        Command::Upload { input, bucket, key } => {
            let image = first_frame(read_input(&input)?)?;
            let params = NodeParams::new()
                .with("image", ParamValue::Image(image))
                .with("s3_bucket", ParamValue::String(bucket))
                .with("object_key", ParamValue::String(key));

            report_saved(execute(&registry, SaveImageNode::NAME, params).await?)?;
        }
        Command::UploadThumbnail {
            input,
            bucket,
            key,
            width,
            height,
        } => {
            let params = NodeParams::new()
                .with("image", ParamValue::Bytes(read_input(&input)?))
                .with("s3_bucket", ParamValue::String(bucket))
                .with("object_key", ParamValue::String(key))
                .with("resizing_width", ParamValue::Int(width))
                .with("resizing_height", ParamValue::Int(height));

            report_saved(execute(&registry, SaveThumbnailNode::NAME, params).await?)?;
        }
        Command::Download {
            bucket,
            key,
            output,
        } => {
            let params = NodeParams::new()
                .with("s3_bucket", ParamValue::String(bucket))
                .with("object_key", ParamValue::String(key));

            match execute(&registry, LoadImageNode::NAME, params).await? {
                NodeOutput::Image(batch) => write_frames(&batch, &output)?,
                other => bail!("unexpected node output: {}", other.kind()),
            }
        }
    }

    Ok(())
}

async fn execute(registry: &NodeRegistry, name: &str, params: NodeParams) -> Result<NodeOutput> {
    let node = registry
        .get(name)
        .with_context(|| format!("Unknown node: {name}"))?;
    node.execute(params)
        .await
        .with_context(|| format!("{name} failed"))
}

fn read_input(path: &Path) -> Result<Bytes> {
    let data =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(Bytes::from(data))
}

fn first_frame(data: Bytes) -> Result<ImageTensor> {
    let batch = load_batch(Cursor::new(data)).context("Failed to decode input image")?;
    Ok(batch_from_frame(batch.index_axis(Axis(0), 0).to_owned()))
}

fn report_saved(output: NodeOutput) -> Result<()> {
    match output {
        NodeOutput::Saved(saved) => {
            println!(
                "Uploaded s3://{}/{} ({} bytes, {})",
                saved.bucket, saved.key, saved.size, saved.content_type
            );
            Ok(())
        }
        other => bail!("unexpected node output: {}", other.kind()),
    }
}

fn write_frames(batch: &ImageTensor, output: &Path) -> Result<()> {
    let frames = batch.len_of(Axis(0));

    for (index, frame) in batch.axis_iter(Axis(0)).enumerate() {
        let path = if frames == 1 {
            output.to_path_buf()
        } else {
            frame_path(output, index)
        };
        let png = encode_png(&tensor_to_image(frame)?)?;
        std::fs::write(&path, &png)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(output = %path.display(), "Frame written");
    }

    Ok(())
}

fn frame_path(output: &Path, index: usize) -> PathBuf {
    let stem = output
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("frame");
    output.with_file_name(format!("{stem}_{index:03}.png"))
}
