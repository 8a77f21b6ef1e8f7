//! Newtype keys for type-safe entity references.
//!
//! Every entity in the store is addressed by an externally visible string
//! (product id, username, admin userid). Database-internal serial keys never
//! leave the repository layer. Use the `define_key!` macro to create wrappers
//! that prevent accidentally mixing keys from different entity types.

use chrono::{DateTime, Utc};
use rand::seq::IndexedRandom;

/// Macro to define a type-safe string key wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Default`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>` and `Into<String>` implementations
/// - `sqlx` `Type`, `Encode`, and `Decode` implementations (with `postgres` feature)
///
/// # Example
///
/// ```rust
/// # use karthik_core::define_key;
/// define_key!(SkuCode);
/// define_key!(WarehouseCode);
///
/// let sku = SkuCode::new("hdd-1");
/// let warehouse = WarehouseCode::new("hdd-1");
///
/// // These are different types, so this won't compile:
/// // let _: SkuCode = warehouse;
/// assert_eq!(sku.as_str(), warehouse.as_str());
/// ```
#[macro_export]
macro_rules! define_key {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Default,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new key from anything string-like.
            #[must_use]
            pub fn new(key: impl Into<String>) -> Self {
                Self(key.into())
            }

            /// Borrow the key as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the key and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(key: String) -> Self {
                Self(key)
            }
        }

        impl From<&str> for $name {
            fn from(key: &str) -> Self {
                Self(key.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(key: $name) -> Self {
                key.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <String as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <String as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let key = <String as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(Self(key))
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <String as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

define_key!(ProductId);
define_key!(Username);
define_key!(AdminUserId);

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 9;

impl ProductId {
    /// Generate a fresh product id of the form `prod_<epoch-ms>_<9 base36 chars>`.
    ///
    /// Both the server and the offline client path mint ids this way, so a
    /// product created while the server is unreachable looks like any other.
    #[must_use]
    pub fn generate() -> Self {
        Self::generate_at(Utc::now())
    }

    /// Generate an id stamped with the given instant.
    #[must_use]
    pub fn generate_at(now: DateTime<Utc>) -> Self {
        let mut rng = rand::rng();
        let suffix: String = (0..SUFFIX_LEN)
            .filter_map(|_| BASE36.choose(&mut rng).copied().map(char::from))
            .collect();
        Self(format!("prod_{}_{suffix}", now.timestamp_millis()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_product_id_shape() {
        let now = DateTime::from_timestamp_millis(1_700_000_000_123).unwrap();
        let id = ProductId::generate_at(now);
        let parts: Vec<&str> = id.as_str().split('_').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts.first(), Some(&"prod"));
        assert_eq!(parts.get(1), Some(&"1700000000123"));
        let suffix = parts.get(2).unwrap();
        assert_eq!(suffix.len(), SUFFIX_LEN);
        assert!(suffix.bytes().all(|b| BASE36.contains(&b)));
    }

    #[test]
    fn test_generated_ids_differ() {
        assert_ne!(ProductId::generate(), ProductId::generate());
    }

    #[test]
    fn test_key_serializes_transparently() {
        let id = ProductId::new("prod_hdd_001");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"prod_hdd_001\"");

        let parsed: Username = serde_json::from_str("\"karthik\"").unwrap();
        assert_eq!(parsed.as_str(), "karthik");
    }

    #[test]
    fn test_key_display_matches_inner() {
        let admin = AdminUserId::from("admin");
        assert_eq!(admin.to_string(), "admin");
        assert_eq!(String::from(admin), "admin");
    }
}
