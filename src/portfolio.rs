use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One holding as returned by the backend. Every numeric field is a string
/// the backend has already formatted for display; the client never derives
/// financial values from them.
#[derive(Deserialize, Debug, Clone)]
pub struct Asset {
    pub id: i64,
    pub name: String,
    pub quantity: String,
    pub buying_price_per_unit: String,
    pub current_price_per_unit: String,
    pub buying_value_usd: String,
    pub current_value_usd: String,
    pub profit_loss_usd: String,
    pub profit_loss_percentage: String,
}

/// Aggregate totals across all assets, computed server-side.
#[derive(Deserialize, Debug, Clone)]
pub struct PortfolioSummary {
    pub total_portfolio_current_value: String,
    pub total_portfolio_buying_value: String,
    pub overall_profit_loss_usd: String,
    pub overall_profit_loss_percentage: String,
}

/// Body of `GET /api/assets`: the asset list with the summary fields inlined
/// at the top level.
#[derive(Deserialize, Debug, Clone)]
pub struct AssetListResponse {
    pub assets: Vec<Asset>,
    #[serde(flatten)]
    pub summary: PortfolioSummary,
}

/// Body of `POST /api/assets`. The fields stay strings exactly as the user
/// typed them; numeric validation belongs to the backend.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct NewAsset {
    pub name: String,
    pub quantity: String,
    pub buying_price_per_unit: String,
}

/// Sign of a pre-formatted profit/loss percentage, used only for styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PnlSign {
    Profit,
    Loss,
    Even,
}

impl PnlSign {
    /// Classifies by the leading numeral of a percentage string such as
    /// `"-2.50%"`. Parsing stops at the first character that cannot extend a
    /// plain decimal number, so thousands separators and the trailing `%`
    /// are ignored. A string with no numeric prefix (the backend emits
    /// `"inf%"` for a zero-cost position) classifies as `Even`.
    pub fn classify(percentage: &str) -> Self {
        let s = percentage.trim();
        let mut end = 0;
        let mut seen_dot = false;
        for (i, c) in s.char_indices() {
            match c {
                '-' if i == 0 => {}
                '0'..='9' => {}
                '.' if !seen_dot => seen_dot = true,
                _ => break,
            }
            end = i + c.len_utf8();
        }
        match Decimal::from_str(&s[..end]) {
            Ok(value) if value > Decimal::ZERO => PnlSign::Profit,
            Ok(value) if value < Decimal::ZERO => PnlSign::Loss,
            _ => PnlSign::Even,
        }
    }
}

/// Display-cases an asset name: first letter upper, rest lower.
pub fn display_cased(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_list_response_from_json() {
        let json = json!({
            "assets": [
                {
                    "id": 1,
                    "name": "Bitcoin",
                    "quantity": "0.5000",
                    "buying_price_per_unit": "$30,000.00",
                    "current_price_per_unit": "$60,000.00",
                    "buying_value_usd": "$15,000.00",
                    "current_value_usd": "$30,000.00",
                    "profit_loss_usd": "$15,000.00",
                    "profit_loss_percentage": "100.00%"
                },
                {
                    "id": 2,
                    "name": "Gold",
                    "quantity": "2.0000",
                    "buying_price_per_unit": "$2,400.00",
                    "current_price_per_unit": "$2,300.00",
                    "buying_value_usd": "$4,800.00",
                    "current_value_usd": "$4,600.00",
                    "profit_loss_usd": "$-200.00",
                    "profit_loss_percentage": "-4.17%"
                }
            ],
            "total_portfolio_current_value": "$34,600.00",
            "total_portfolio_buying_value": "$19,800.00",
            "overall_profit_loss_usd": "$14,800.00",
            "overall_profit_loss_percentage": "74.75%"
        });
        let res: Result<AssetListResponse, _> = serde_json::from_value(json);
        assert!(res.is_ok());
        let response = res.unwrap();
        assert_eq!(response.assets.len(), 2);
        assert_eq!(response.assets[0].id, 1);
        assert_eq!(response.assets[1].name, "Gold");
        assert_eq!(response.summary.overall_profit_loss_percentage, "74.75%");
    }

    #[test]
    fn test_list_response_missing_field_is_rejected() {
        let json = json!({
            "assets": [{ "id": 1, "name": "Bitcoin" }],
            "total_portfolio_current_value": "$0.00",
            "total_portfolio_buying_value": "$0.00",
            "overall_profit_loss_usd": "$0.00",
            "overall_profit_loss_percentage": "0.00%"
        });
        let res: Result<AssetListResponse, _> = serde_json::from_value(json);
        assert!(res.is_err());
    }

    #[test]
    fn test_classify_sign() {
        assert_eq!(PnlSign::classify("5.00%"), PnlSign::Profit);
        assert_eq!(PnlSign::classify("-2.50%"), PnlSign::Loss);
        assert_eq!(PnlSign::classify("0.00%"), PnlSign::Even);
    }

    #[test]
    fn test_classify_stops_at_thousands_separator() {
        // "1,234.56%" reads as 1 before the comma, still a profit
        assert_eq!(PnlSign::classify("1,234.56%"), PnlSign::Profit);
        assert_eq!(PnlSign::classify("-1,234.56%"), PnlSign::Loss);
    }

    #[test]
    fn test_classify_non_numeric_is_even() {
        assert_eq!(PnlSign::classify("inf%"), PnlSign::Even);
        assert_eq!(PnlSign::classify(""), PnlSign::Even);
        assert_eq!(PnlSign::classify("-"), PnlSign::Even);
    }

    #[test]
    fn test_display_cased() {
        assert_eq!(display_cased("bitcoin"), "Bitcoin");
        assert_eq!(display_cased("GOLD"), "Gold");
        assert_eq!(display_cased(""), "");
    }
}
