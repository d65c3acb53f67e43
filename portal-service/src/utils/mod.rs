pub mod numeric;
pub mod password;

use mongodb::bson::oid::ObjectId;
use service_core::error::AppError;

pub use numeric::{coerce_decimal, deserialize_lenient_decimal, deserialize_lenient_decimal_opt};

/// Parse a record id taken from a URL path.
pub fn parse_object_id(raw: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(raw)
        .map_err(|_| AppError::BadRequest(anyhow::anyhow!("Invalid record id: {}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_object_ids() {
        let id = ObjectId::new();
        assert_eq!(parse_object_id(&id.to_hex()).unwrap(), id);
    }

    #[test]
    fn rejects_malformed_ids() {
        let err = parse_object_id("1712345678901").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
