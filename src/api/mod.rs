use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::portfolio::{AssetListResponse, NewAsset};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend returned {status}: {message:?}")]
    Backend {
        status: StatusCode,
        message: Option<String>,
    },
    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl ApiError {
    /// Banner text for a failed mutation. Backend errors carry the
    /// server-supplied text when there is one; everything else falls back to
    /// a generic line. `action` is the verb shown to the user ("add",
    /// "delete").
    pub fn mutation_message(&self, action: &str) -> String {
        match self {
            ApiError::Backend {
                message: Some(message),
                ..
            } => format!("Error: {message}"),
            ApiError::Backend { message: None, .. } | ApiError::Malformed(_) => {
                format!("Failed to {action} asset.")
            }
            ApiError::Transport(_) => {
                format!("Failed to {action} asset due to a network error.")
            }
        }
    }
}

/// `{ "message": ... }` body of a successful mutation.
#[derive(Deserialize, Debug)]
struct MessageBody {
    message: String,
}

/// `{ "error": ... }` body of a failed request. The field is optional.
#[derive(Deserialize, Debug)]
struct ErrorBody {
    error: Option<String>,
}

pub struct PortfolioApi {
    client: Client,
    base_url: String,
}

impl PortfolioApi {
    pub fn new(address: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: format!("http://{address}"),
        }
    }

    pub async fn list_assets(&self) -> Result<AssetListResponse, ApiError> {
        let res = self
            .client
            .get(format!("{}/api/assets", self.base_url))
            .send()
            .await?;
        let status = res.status();
        let body = res.text().await?;
        debug!("GET /api/assets -> {status}");
        parse_list_response(status, &body)
    }

    pub async fn create_asset(&self, asset: &NewAsset) -> Result<String, ApiError> {
        let res = self
            .client
            .post(format!("{}/api/assets", self.base_url))
            .json(asset)
            .send()
            .await?;
        let status = res.status();
        let body = res.text().await?;
        debug!("POST /api/assets -> {status}");
        parse_mutation_response(status, &body)
    }

    pub async fn delete_asset(&self, id: i64) -> Result<String, ApiError> {
        let res = self
            .client
            .delete(format!("{}/api/assets/{id}", self.base_url))
            .send()
            .await?;
        let status = res.status();
        let body = res.text().await?;
        debug!("DELETE /api/assets/{id} -> {status}");
        parse_mutation_response(status, &body)
    }
}

fn parse_list_response(status: StatusCode, body: &str) -> Result<AssetListResponse, ApiError> {
    if !status.is_success() {
        return Err(backend_error(status, body));
    }
    Ok(serde_json::from_str(body)?)
}

fn parse_mutation_response(status: StatusCode, body: &str) -> Result<String, ApiError> {
    if !status.is_success() {
        return Err(backend_error(status, body));
    }
    let body: MessageBody = serde_json::from_str(body)?;
    Ok(body.message)
}

fn backend_error(status: StatusCode, body: &str) -> ApiError {
    // Error bodies are parsed leniently: a missing or unparsable body just
    // means there is no server-supplied text.
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error);
    ApiError::Backend { status, message }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn list_body() -> String {
        json!({
            "assets": [],
            "total_portfolio_current_value": "$0.00",
            "total_portfolio_buying_value": "$0.00",
            "overall_profit_loss_usd": "$0.00",
            "overall_profit_loss_percentage": "0.00%"
        })
        .to_string()
    }

    #[test]
    fn test_list_ok() {
        let res = parse_list_response(StatusCode::OK, &list_body());
        assert!(res.is_ok());
        assert!(res.unwrap().assets.is_empty());
    }

    #[test]
    fn test_list_malformed_shape_is_rejected() {
        let res = parse_list_response(StatusCode::OK, r#"{"assets": "nope"}"#);
        assert!(matches!(res, Err(ApiError::Malformed(_))));
    }

    #[test]
    fn test_list_non_success_status() {
        let res = parse_list_response(StatusCode::INTERNAL_SERVER_ERROR, &list_body());
        assert!(matches!(
            res,
            Err(ApiError::Backend { message: None, .. })
        ));
    }

    #[test]
    fn test_mutation_ok() {
        let res =
            parse_mutation_response(StatusCode::CREATED, r#"{"message":"Asset added successfully!","id":3}"#);
        assert_eq!(res.unwrap(), "Asset added successfully!");
    }

    #[test]
    fn test_mutation_error_body() {
        let res = parse_mutation_response(
            StatusCode::BAD_REQUEST,
            r#"{"error":"Quantity and Buying Price must be numbers."}"#,
        );
        match res {
            Err(ApiError::Backend { status, message }) => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert_eq!(
                    message.as_deref(),
                    Some("Quantity and Buying Price must be numbers.")
                );
            }
            other => panic!("expected backend error, got {other:?}"),
        }
    }

    #[test]
    fn test_mutation_error_without_body_text() {
        let res = parse_mutation_response(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert!(matches!(
            res,
            Err(ApiError::Backend { message: None, .. })
        ));
    }

    #[test]
    fn test_mutation_success_with_malformed_body() {
        // A 2xx that cannot be parsed is not treated as a confirmed success.
        let res = parse_mutation_response(StatusCode::OK, "{}");
        assert!(matches!(res, Err(ApiError::Malformed(_))));
    }

    #[test]
    fn test_mutation_messages() {
        let backend = ApiError::Backend {
            status: StatusCode::BAD_REQUEST,
            message: Some("Name, Quantity, and Buying Price are required.".into()),
        };
        assert_eq!(
            backend.mutation_message("add"),
            "Error: Name, Quantity, and Buying Price are required."
        );

        let no_text = ApiError::Backend {
            status: StatusCode::BAD_GATEWAY,
            message: None,
        };
        assert_eq!(no_text.mutation_message("delete"), "Failed to delete asset.");
    }
}
