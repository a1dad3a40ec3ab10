use serde::{Deserialize, Serialize};

pub type ProductId = i64;

// ---------------------------------------------------------------------------
// Product
// ---------------------------------------------------------------------------

/// A tracked product with its latest price attached (None until the first pass writes one).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_price: Option<f64>,
    /// Nanosecond UTC epoch, assigned at insert.
    pub created_at: i64,
}

/// Insert payload. Identity and creation time are assigned by the store.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub url: String,
}

impl NewProduct {
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.name.trim().is_empty() {
            return Err(crate::error::AppError::Validation("name must not be empty".into()));
        }
        if self.url.trim().is_empty() {
            return Err(crate::error::AppError::Validation("url must not be empty".into()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Price history
// ---------------------------------------------------------------------------

/// One append-only price observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceRecord {
    pub id: i64,
    pub product_id: ProductId,
    pub price: f64,
    /// Nanosecond UTC epoch, assigned at insert.
    pub recorded_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fields_fail_validation() {
        let blank_name = NewProduct { name: "  ".into(), url: "https://shop/x".into() };
        assert!(blank_name.validate().is_err());

        let blank_url = NewProduct { name: "Kettle".into(), url: String::new() };
        assert!(blank_url.validate().is_err());

        let ok = NewProduct { name: "Kettle".into(), url: "https://shop/x".into() };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn missing_price_is_omitted_from_json() {
        let p = Product {
            id: 1,
            name: "Kettle".into(),
            url: "https://shop/x".into(),
            current_price: None,
            created_at: 0,
        };
        let json = serde_json::to_value(&p).unwrap();
        assert!(json.get("current_price").is_none());
    }
}
