//! OpenAPI document, served at `/api/openapi.json`.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "droply API",
        description = "Password-protected, expiring file transfers",
        version = "0.1.0"
    ),
    paths(
        crate::handlers::upload::create_upload,
        crate::handlers::upload::complete_upload,
        crate::handlers::transfer::create_transfer,
        crate::handlers::transfer::list_transfers,
        crate::handlers::transfer::transfer_stats,
        crate::handlers::transfer::delete_transfer,
        crate::handlers::notify::notify_recipients,
        crate::handlers::share::share_view,
        crate::handlers::share::download,
        crate::handlers::cleanup::admin_cleanup,
        crate::handlers::cleanup::cron_cleanup,
        crate::handlers::track::track_open,
        crate::handlers::track::track_click,
    ),
    components(schemas(
        crate::error::ErrorResponse,
        crate::handlers::upload::CreateUploadRequest,
        crate::handlers::upload::CreateUploadResponse,
        crate::handlers::upload::UploadPartInput,
        crate::handlers::upload::CompleteUploadRequest,
        crate::handlers::upload::CompleteUploadResponse,
        droply_core::models::transfer::TransferFileInput,
        droply_core::models::transfer::CreateTransferRequest,
        droply_core::models::transfer::CreateTransferResponse,
        droply_core::models::transfer::ShareFile,
        droply_core::models::transfer::ShareBranding,
        droply_core::models::transfer::ShareViewResponse,
        droply_core::models::transfer::DownloadResponse,
        droply_core::models::transfer::TransferSummary,
        droply_core::models::transfer::TransferStats,
        droply_core::models::transfer::CleanupReport,
        droply_core::models::recipient::NotifyRequest,
        droply_core::models::recipient::NotifyResponse,
        droply_core::models::recipient::RecipientOutcome,
    ))
)]
pub struct ApiDoc;
