//! # Marshalling Context
//!
//! Protobuf schemas for structured cache values. The server needs the schema
//! of a value type before it can convert, index and query values of that
//! type, so the schema is registered on the connection before the query
//! cache is provisioned.

use weather_domain::LocationWeather;

use crate::cache::CacheValue;
use crate::error::Result;
use crate::manager::RemoteCacheManager;

/// A value type described by a protobuf schema file
pub trait ProtoSchema {
    /// Schema file name on the server, e.g. `weather.proto`
    const SCHEMA_NAME: &'static str;

    /// Fully qualified message name, e.g. `weather.LocationWeather`
    const TYPE_NAME: &'static str;

    /// Contents of the `.proto` file
    fn schema() -> String;
}

impl ProtoSchema for LocationWeather {
    const SCHEMA_NAME: &'static str = "weather.proto";
    const TYPE_NAME: &'static str = "weather.LocationWeather";

    fn schema() -> String {
        r#"// Weather readings per location
syntax = "proto2";

package weather;

/**
 * @Indexed
 */
message LocationWeather {
   /**
    * @Basic(sortable = true)
    */
   optional float temperature = 1;

   /**
    * @Basic
    */
   optional string condition = 2;

   /**
    * @Basic(sortable = true)
    */
   optional string city = 3;

   /**
    * @Basic
    */
   optional string country = 4;
}
"#
        .to_string()
    }
}

impl CacheValue for LocationWeather {
    const TYPE_NAME: Option<&'static str> = Some(<Self as ProtoSchema>::TYPE_NAME);
}

/// Registers value schemas with a connection
pub struct MarshallingContext;

impl MarshallingContext {
    /// Register the schema of `T` with the server behind `manager`
    pub async fn init_serialization_context<T: ProtoSchema>(manager: &RemoteCacheManager) -> Result<()> {
        tracing::info!(
            schema = T::SCHEMA_NAME,
            type_name = T::TYPE_NAME,
            "Registering protobuf schema"
        );
        manager.register_schema(T::SCHEMA_NAME, &T::schema()).await
    }
}
