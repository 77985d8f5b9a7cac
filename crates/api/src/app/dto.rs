use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

use storefront_auth::{Account, IssuedToken};
use storefront_core::{DomainError, DomainResult};
use storefront_inventory::{ItemSpec, Price, SearchFilter};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// A price as sent by the client: a JSON string (`"25.00"`) or number (`25`).
///
/// Kept textual until [`RawPrice::parse`] so a bad price is a validation
/// error rather than a body rejection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPrice(String);

impl RawPrice {
    pub fn parse(&self) -> DomainResult<Price> {
        Ok(self.0.parse::<Price>()?)
    }
}

impl<'de> Deserialize<'de> for RawPrice {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RawPriceVisitor;

        impl Visitor<'_> for RawPriceVisitor {
            type Value = RawPrice;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a decimal price as a string or number")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<RawPrice, E> {
                Ok(RawPrice(v.to_string()))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<RawPrice, E> {
                Ok(RawPrice(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<RawPrice, E> {
                Ok(RawPrice(v.to_string()))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<RawPrice, E> {
                Ok(RawPrice(v.to_string()))
            }
        }

        deserializer.deserialize_any(RawPriceVisitor)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ItemRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<RawPrice>,
    pub quantity: Option<i64>,
    #[serde(alias = "imageUrl")]
    pub image_url: Option<String>,
}

impl ItemRequest {
    pub fn into_spec(self) -> DomainResult<ItemSpec> {
        Ok(ItemSpec {
            name: self.name,
            category: self.category,
            price: self.price.as_ref().map(RawPrice::parse).transpose()?,
            quantity: self.quantity,
            image_url: self.image_url,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct QuantityRequest {
    pub quantity: Option<i64>,
}

impl QuantityRequest {
    pub fn positive_quantity(&self) -> DomainResult<u32> {
        match self.quantity {
            Some(q) if q > 0 => {
                u32::try_from(q).map_err(|_| DomainError::validation("quantity is too large"))
            }
            _ => Err(DomainError::validation("quantity must be a positive integer")),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    pub name: Option<String>,
    pub category: Option<String>,
    #[serde(alias = "minPrice")]
    pub min_price: Option<String>,
    #[serde(alias = "maxPrice")]
    pub max_price: Option<String>,
}

impl SearchParams {
    pub fn into_filter(self) -> DomainResult<SearchFilter> {
        let price = |raw: Option<String>| -> DomainResult<Option<Price>> {
            match raw.filter(|s| !s.trim().is_empty()) {
                Some(s) => Ok(Some(s.parse::<Price>()?)),
                None => Ok(None),
            }
        };

        Ok(SearchFilter {
            name: self.name,
            category: self.category,
            min_price: price(self.min_price)?,
            max_price: price(self.max_price)?,
        })
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

impl From<IssuedToken> for AuthResponse {
    fn from(issued: IssuedToken) -> Self {
        Self {
            token: issued.token,
            token_type: "Bearer",
            expires_at: issued.expires_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub username: String,
    pub email: String,
    pub roles: Vec<String>,
}

impl From<Account> for ProfileResponse {
    fn from(account: Account) -> Self {
        Self {
            username: account.username,
            email: account.email,
            roles: account.roles.iter().map(|r| r.as_str().to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(json: &str) -> ItemRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn price_accepts_strings_and_numbers() {
        let spec = item(r#"{"name":"Ladoo","price":"25.00"}"#).into_spec().unwrap();
        assert_eq!(spec.price, Some(Price::from_minor_units(2500)));

        let spec = item(r#"{"name":"Ladoo","price":19.99}"#).into_spec().unwrap();
        assert_eq!(spec.price, Some(Price::from_minor_units(1999)));

        let spec = item(r#"{"name":"Ladoo","price":3}"#).into_spec().unwrap();
        assert_eq!(spec.price, Some(Price::from_minor_units(300)));
    }

    #[test]
    fn negative_price_is_a_validation_error() {
        let err = item(r#"{"name":"Ladoo","price":-1}"#).into_spec().unwrap_err();
        assert_eq!(err, DomainError::validation("Price must be non-negative"));
    }

    #[test]
    fn quantity_must_be_positive() {
        let q = |json: &str| serde_json::from_str::<QuantityRequest>(json).unwrap();
        assert_eq!(q(r#"{"quantity":3}"#).positive_quantity(), Ok(3));
        assert!(q(r#"{"quantity":0}"#).positive_quantity().is_err());
        assert!(q(r#"{"quantity":-2}"#).positive_quantity().is_err());
        assert!(q("{}").positive_quantity().is_err());
    }

    #[test]
    fn search_params_parse_prices() {
        let filter = SearchParams {
            min_price: Some("1.50".into()),
            max_price: Some(" ".into()),
            ..SearchParams::default()
        }
        .into_filter()
        .unwrap();
        assert_eq!(filter.min_price, Some(Price::from_minor_units(150)));
        assert_eq!(filter.max_price, None);

        assert!(
            SearchParams {
                min_price: Some("cheap".into()),
                ..SearchParams::default()
            }
            .into_filter()
            .is_err()
        );
    }
}
