use chrono::NaiveDate;
use sqlx::Postgres;
use sqlx::postgres::PgArguments;
use sqlx::query::{Query, QueryAs};

/// A statement parameter that can be bound against any shard.
///
/// Every variant carries its own SQL type, so `None` binds a typed NULL and
/// `COALESCE($n, column)` resolves against the column type instead of text.
/// Parameters are cloned per shard during fan-out.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(Option<String>),
    Integer(Option<i32>),
    BigInt(Option<i64>),
    Float(Option<f64>),
    Boolean(Option<bool>),
    Date(Option<NaiveDate>),
}

impl SqlParam {
    pub fn is_null(&self) -> bool {
        match self {
            SqlParam::Text(v) => v.is_none(),
            SqlParam::Integer(v) => v.is_none(),
            SqlParam::BigInt(v) => v.is_none(),
            SqlParam::Float(v) => v.is_none(),
            SqlParam::Boolean(v) => v.is_none(),
            SqlParam::Date(v) => v.is_none(),
        }
    }

    pub(crate) fn bind_to<'q>(
        self,
        query: Query<'q, Postgres, PgArguments>,
    ) -> Query<'q, Postgres, PgArguments> {
        match self {
            SqlParam::Text(v) => query.bind(v),
            SqlParam::Integer(v) => query.bind(v),
            SqlParam::BigInt(v) => query.bind(v),
            SqlParam::Float(v) => query.bind(v),
            SqlParam::Boolean(v) => query.bind(v),
            SqlParam::Date(v) => query.bind(v),
        }
    }

    pub(crate) fn bind_to_as<'q, O>(
        self,
        query: QueryAs<'q, Postgres, O, PgArguments>,
    ) -> QueryAs<'q, Postgres, O, PgArguments> {
        match self {
            SqlParam::Text(v) => query.bind(v),
            SqlParam::Integer(v) => query.bind(v),
            SqlParam::BigInt(v) => query.bind(v),
            SqlParam::Float(v) => query.bind(v),
            SqlParam::Boolean(v) => query.bind(v),
            SqlParam::Date(v) => query.bind(v),
        }
    }
}

pub(crate) fn bind_params<'q>(
    query: Query<'q, Postgres, PgArguments>,
    params: &[SqlParam],
) -> Query<'q, Postgres, PgArguments> {
    params
        .iter()
        .cloned()
        .fold(query, |query, param| param.bind_to(query))
}

pub(crate) fn bind_params_as<'q, O>(
    query: QueryAs<'q, Postgres, O, PgArguments>,
    params: &[SqlParam],
) -> QueryAs<'q, Postgres, O, PgArguments> {
    params
        .iter()
        .cloned()
        .fold(query, |query, param| param.bind_to_as(query))
}

impl From<&str> for SqlParam {
    fn from(value: &str) -> Self {
        SqlParam::Text(Some(value.to_string()))
    }
}

impl From<String> for SqlParam {
    fn from(value: String) -> Self {
        SqlParam::Text(Some(value))
    }
}

impl From<Option<String>> for SqlParam {
    fn from(value: Option<String>) -> Self {
        SqlParam::Text(value)
    }
}

impl From<i32> for SqlParam {
    fn from(value: i32) -> Self {
        SqlParam::Integer(Some(value))
    }
}

impl From<Option<i32>> for SqlParam {
    fn from(value: Option<i32>) -> Self {
        SqlParam::Integer(value)
    }
}

impl From<i64> for SqlParam {
    fn from(value: i64) -> Self {
        SqlParam::BigInt(Some(value))
    }
}

impl From<Option<f64>> for SqlParam {
    fn from(value: Option<f64>) -> Self {
        SqlParam::Float(value)
    }
}

impl From<f64> for SqlParam {
    fn from(value: f64) -> Self {
        SqlParam::Float(Some(value))
    }
}

impl From<bool> for SqlParam {
    fn from(value: bool) -> Self {
        SqlParam::Boolean(Some(value))
    }
}

impl From<Option<bool>> for SqlParam {
    fn from(value: Option<bool>) -> Self {
        SqlParam::Boolean(value)
    }
}

impl From<Option<NaiveDate>> for SqlParam {
    fn from(value: Option<NaiveDate>) -> Self {
        SqlParam::Date(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_converts_to_typed_null() {
        let param = SqlParam::from(None::<f64>);
        assert!(param.is_null());
        assert_eq!(param, SqlParam::Float(None));
    }

    #[test]
    fn str_converts_to_owned_text() {
        assert_eq!(SqlParam::from("db_a"), SqlParam::Text(Some("db_a".into())));
        assert!(!SqlParam::from(3).is_null());
    }
}
