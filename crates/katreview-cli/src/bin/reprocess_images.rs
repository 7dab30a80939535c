use anyhow::{Context, Result};
use clap::Parser;
use katreview_cli::reprocess::{reprocess_one, ReprocessSummary, RowOutcome};
use katreview_core::constants::{IMAGE_JPEG_QUALITY, IMAGE_MAX_WIDTH};
use katreview_db::ArticleImageRepository;
use katreview_processing::ImageNormalizer;
use katreview_storage::{LocalStorage, Storage};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "reprocess_images")]
#[command(about = "Normalize article images uploaded before the image pipeline existed")]
struct Args {
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// Directory backing the public uploads path
    #[arg(long, env = "UPLOADS_DIR", default_value = "uploads")]
    uploads_dir: String,

    #[arg(long, env = "UPLOADS_BASE_URL", default_value = "/uploads")]
    uploads_base_url: String,

    #[arg(long, env = "IMAGE_MAX_WIDTH", default_value_t = IMAGE_MAX_WIDTH)]
    max_width: u32,

    #[arg(long, env = "IMAGE_JPEG_QUALITY", default_value_t = IMAGE_JPEG_QUALITY)]
    quality: u8,

    /// Report what would change without touching files or rows
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    katreview_cli::init_tracing();

    let args = Args::parse();

    let pool = katreview_cli::connect(&args.database_url).await?;
    let images = ArticleImageRepository::new(pool);

    let storage: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(&args.uploads_dir, args.uploads_base_url.clone())
            .await
            .with_context(|| format!("Failed to open uploads directory {}", args.uploads_dir))?,
    );
    let normalizer = ImageNormalizer::new(storage, args.max_width, args.quality);

    let rows = images.list_unprocessed().await?;
    println!(
        "{} image(s) to check{}",
        rows.len(),
        if args.dry_run { " (dry run)" } else { "" }
    );

    let mut summary = ReprocessSummary::default();
    for row in &rows {
        let repo = &images;
        let id = row.id;
        let outcome = reprocess_one(row, &normalizer, args.dry_run, move |url: String| async move {
            repo.update_url(id, &url).await
        })
        .await;

        match &outcome {
            RowOutcome::Processed { url } => println!("  [ok]   #{} {} -> {}", row.id, row.url, url),
            RowOutcome::Skipped { reason } => println!("  [skip] #{} {} ({})", row.id, row.url, reason),
            RowOutcome::Failed { reason } => eprintln!("  [err]  #{} {}: {}", row.id, row.url, reason),
        }
        summary.record(&outcome);
    }

    println!("{}", summary);

    if summary.errors > 0 {
        anyhow::bail!("{} image(s) failed", summary.errors);
    }
    Ok(())
}
