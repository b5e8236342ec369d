use portfolio::{AssetListResponse, NewAsset};

pub mod api;
pub mod portfolio;
pub mod tui;

/// Events flowing from the network worker into the UI loop.
#[derive(Debug, Clone)]
pub enum AppEvent {
    Assets(AssetListResponse),
    LoadFailed(String),
    AssetCreated { message: String },
    CreateFailed { message: String },
    AssetDeleted { message: String },
    DeleteFailed { message: String },
}

/// Requests flowing from the UI loop to the network worker.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCommand {
    LoadAssets,
    CreateAsset(NewAsset),
    DeleteAsset(i64),
}
