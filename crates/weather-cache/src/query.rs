//! # Ickle Query Builder
//!
//! Renders the server's query language for simple filters over a protobuf
//! message type:
//!
//! ```rust,ignore
//! let query = IckleQuery::new("weather.LocationWeather")
//!     .where_eq("country", "Italy")
//!     .order_by("city", SortOrder::Asc);
//!
//! assert_eq!(
//!     query.to_string(),
//!     "FROM weather.LocationWeather w WHERE w.country = 'Italy' ORDER BY w.city ASC",
//! );
//! ```

use std::fmt;

const DEFAULT_ALIAS: &str = "w";

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Literal on the right-hand side of a predicate
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Text(String),
    Float(f32),
    Number(f64),
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f32> for QueryValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<f64> for QueryValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "'{}'", text.replace('\'', "''")),
            Self::Float(n) => write!(f, "{n}"),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Predicate {
    field: String,
    op: &'static str,
    value: QueryValue,
}

/// A `FROM ... WHERE ... ORDER BY ...` query
#[derive(Debug, Clone, PartialEq)]
pub struct IckleQuery {
    entity: String,
    alias: String,
    predicates: Vec<Predicate>,
    order: Vec<(String, SortOrder)>,
}

impl IckleQuery {
    /// Query over a fully qualified message type
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            alias: DEFAULT_ALIAS.to_string(),
            predicates: Vec::new(),
            order: Vec::new(),
        }
    }

    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    #[must_use]
    pub fn where_eq(self, field: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.predicate(field, "=", value)
    }

    #[must_use]
    pub fn where_gt(self, field: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.predicate(field, ">", value)
    }

    #[must_use]
    pub fn where_lt(self, field: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.predicate(field, "<", value)
    }

    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.order.push((field.into(), order));
        self
    }

    fn predicate(
        mut self,
        field: impl Into<String>,
        op: &'static str,
        value: impl Into<QueryValue>,
    ) -> Self {
        self.predicates.push(Predicate {
            field: field.into(),
            op,
            value: value.into(),
        });
        self
    }
}

impl fmt::Display for IckleQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FROM {} {}", self.entity, self.alias)?;

        for (i, p) in self.predicates.iter().enumerate() {
            let keyword = if i == 0 { "WHERE" } else { "AND" };
            write!(f, " {keyword} {}.{} {} {}", self.alias, p.field, p.op, p.value)?;
        }

        for (i, (field, order)) in self.order.iter().enumerate() {
            let sep = if i == 0 { " ORDER BY " } else { ", " };
            write!(f, "{sep}{}.{} {}", self.alias, field, order.as_str())?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_query() {
        let query = IckleQuery::new("weather.LocationWeather");
        assert_eq!(query.to_string(), "FROM weather.LocationWeather w");
    }

    #[test]
    fn test_filter_and_order() {
        let query = IckleQuery::new("weather.LocationWeather")
            .where_eq("country", "Italy")
            .order_by("city", SortOrder::Asc);
        assert_eq!(
            query.to_string(),
            "FROM weather.LocationWeather w WHERE w.country = 'Italy' ORDER BY w.city ASC"
        );
    }

    #[test]
    fn test_multiple_predicates() {
        let query = IckleQuery::new("weather.LocationWeather")
            .alias("lw")
            .where_eq("condition", "sunny")
            .where_gt("temperature", 25.5_f32)
            .order_by("temperature", SortOrder::Desc)
            .order_by("city", SortOrder::Asc);
        assert_eq!(
            query.to_string(),
            "FROM weather.LocationWeather lw WHERE lw.condition = 'sunny' \
             AND lw.temperature > 25.5 ORDER BY lw.temperature DESC, lw.city ASC"
        );
    }

    #[test]
    fn test_float_literal_keeps_precision() {
        let query = IckleQuery::new("weather.LocationWeather")
            .where_gt("temperature", 21.3_f32)
            .where_lt("temperature", 30.0_f64);
        assert_eq!(
            query.to_string(),
            "FROM weather.LocationWeather w WHERE w.temperature > 21.3 AND w.temperature < 30"
        );
    }

    #[test]
    fn test_text_literal_escaping() {
        let query = IckleQuery::new("weather.LocationWeather").where_eq("city", "L'Aquila");
        assert_eq!(
            query.to_string(),
            "FROM weather.LocationWeather w WHERE w.city = 'L''Aquila'"
        );
    }
}
