use serde::{Deserialize, Deserializer};

/// Keeps `null` distinct from an absent key. Pair with `#[serde(default)]`:
/// absent -> `None`, `null` -> `Some(None)`, value -> `Some(Some(v))`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Reads `null` as `T::default()`, so a required field sent as `null` fails
/// validation the same way as an absent one.
pub fn null_as_default<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: Deserialize<'de> + Default,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        phone: Option<Option<String>>,
    }

    #[test]
    fn distinguishes_absent_null_and_value() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        let null: Patch = serde_json::from_str(r#"{"phone":null}"#).unwrap();
        let value: Patch = serde_json::from_str(r#"{"phone":"555"}"#).unwrap();

        assert_eq!(absent.phone, None);
        assert_eq!(null.phone, Some(None));
        assert_eq!(value.phone, Some(Some("555".to_string())));
    }

    #[derive(Deserialize)]
    struct Required {
        #[serde(default, deserialize_with = "null_as_default")]
        email: String,
    }

    #[test]
    fn null_required_field_reads_as_empty() {
        let absent: Required = serde_json::from_str("{}").unwrap();
        let null: Required = serde_json::from_str(r#"{"email":null}"#).unwrap();
        let value: Required = serde_json::from_str(r#"{"email":"a@x.com"}"#).unwrap();

        assert_eq!(absent.email, "");
        assert_eq!(null.email, "");
        assert_eq!(value.email, "a@x.com");
    }
}
