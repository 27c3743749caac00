//! Encoding of cache values.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;

pub const MEDIA_JSON: &str = "application/json";
pub const MEDIA_TEXT: &str = "text/plain; charset=UTF-8";

/// Field the server reads to map JSON onto a protobuf message type
pub const TYPE_FIELD: &str = "_type";

/// A value that can be stored in a [`RemoteCache`](super::RemoteCache).
///
/// The default encoding is JSON. Types registered through a protobuf schema
/// set [`TYPE_NAME`](Self::TYPE_NAME) so their JSON carries a `_type` tag and
/// the server can convert and index them.
pub trait CacheValue: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Fully qualified protobuf message name, if any
    const TYPE_NAME: Option<&'static str> = None;

    /// Media type of the encoded payload
    const MEDIA_TYPE: &'static str = MEDIA_JSON;

    fn encode(&self) -> Result<String> {
        match Self::TYPE_NAME {
            Some(type_name) => Ok(serde_json::to_string(&Tagged {
                type_name,
                value: self,
            })?),
            None => Ok(serde_json::to_string(self)?),
        }
    }

    fn decode(payload: &str) -> Result<Self> {
        Ok(serde_json::from_str(payload.trim())?)
    }
}

/// A struct value with the `_type` tag in front of its own fields
#[derive(Serialize)]
struct Tagged<'a, T: ?Sized> {
    #[serde(rename = "_type")]
    type_name: &'static str,
    #[serde(flatten)]
    value: &'a T,
}

// Scalars travel as plain text so the server stores them without a schema.
macro_rules! scalar_cache_value {
    ($($ty:ty),*) => {
        $(
            impl CacheValue for $ty {
                const MEDIA_TYPE: &'static str = MEDIA_TEXT;

                fn encode(&self) -> Result<String> {
                    Ok(serde_json::to_string(self)?)
                }
            }
        )*
    };
}

scalar_cache_value!(f32, f64, i32, i64, u64, bool);

impl CacheValue for String {
    const MEDIA_TYPE: &'static str = MEDIA_TEXT;

    fn encode(&self) -> Result<String> {
        Ok(self.clone())
    }

    fn decode(payload: &str) -> Result<Self> {
        Ok(payload.to_string())
    }
}
