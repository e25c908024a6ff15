//! `upload-images` command: wires configuration, databases, and Azure storage
//! into the image uploader.

use anyhow::Context;
use kikichoice_core::{AppConfig, LocalDbConfig};
use kikichoice_images::{
    DbTarget, ImageUploader, ObjectBlobStore, Targets, UploadOptions, UploadResult,
};
use sqlx::postgres::PgConnectOptions;

use crate::UploadImagesArgs;

/// Azure account name and key, both required for any upload run.
pub(crate) fn azure_credentials(config: &AppConfig) -> anyhow::Result<(&str, &str)> {
    let account = config
        .azure_storage_account
        .as_deref()
        .context("AZURE_BLOB_STORAGE_ACCOUNT_NAME must be set to upload images")?;
    let key = config
        .azure_storage_key
        .as_deref()
        .context("AZURE_BLOB_STORAGE_KEY must be set to upload images")?;
    Ok((account, key))
}

pub(crate) fn upload_options(args: &UploadImagesArgs) -> UploadOptions {
    UploadOptions {
        dry_run: args.dry_run,
        clean_first: args.clean_first,
    }
}

/// Mirror settings, checked before any connection is opened.
fn local_mirror() -> anyhow::Result<(LocalDbConfig, PgConnectOptions)> {
    let local = kikichoice_core::load_local_db_config();
    let options = kikichoice_db::local_connect_options(&local).context(
        "--sync-local requires LOCAL_DB_ENABLED=true, LOCAL_DB_HOST and a valid LOCAL_DB_PORT",
    )?;
    Ok((local, options))
}

async fn connect_mirror(
    config: &AppConfig,
    local: &LocalDbConfig,
    options: PgConnectOptions,
) -> anyhow::Result<DbTarget> {
    let pool_config = kikichoice_db::PoolConfig::from_app_config(config);
    let pool = kikichoice_db::connect_pool_with(options, pool_config)
        .await
        .with_context(|| format!("failed to connect to local database {}", local.display_target()))?;
    tracing::info!(target = %local.display_target(), "local database sync enabled");
    Ok(DbTarget::new(local.display_target(), pool))
}

/// Runs one upload and returns its counters.
///
/// # Errors
///
/// Returns an error for setup failures: missing Azure credentials, invalid
/// local sync settings, database connection failures, an invalid source path,
/// or a failed variant lookup. Per-image failures are reported in the result.
pub(crate) async fn run_upload_images(
    config: &AppConfig,
    args: &UploadImagesArgs,
) -> anyhow::Result<UploadResult> {
    let (account, key) = azure_credentials(config)?;

    let mirror = if args.sync_local {
        Some(local_mirror()?)
    } else {
        None
    };

    let pool_config = kikichoice_db::PoolConfig::from_app_config(config);
    let primary = kikichoice_db::connect_pool(&config.database_url, pool_config)
        .await
        .context("failed to connect to the primary database")?;
    let mut targets = Targets::primary_only(DbTarget::new("primary", primary));

    if let Some((local, options)) = mirror {
        targets = targets.with_mirror(connect_mirror(config, &local, options).await?);
    }

    let blobs = ObjectBlobStore::azure(account, key).context("failed to build Azure blob client")?;

    let uploader = ImageUploader::new(&targets, &blobs, upload_options(args));
    let result = uploader
        .run(&args.source)
        .await
        .with_context(|| format!("upload from {} failed", args.source.display()))?;

    targets.primary.pool.close().await;
    for mirror in &targets.mirrors {
        mirror.pool.close().await;
    }

    Ok(result)
}
