pub mod account;
pub mod health;
pub mod user;

use serde::de::DeserializeOwned;

use crate::error::UsersServiceError;

/// Parse a raw query string with `serde_qs`. Absent query yields `T::default()`.
pub(crate) fn parse_query<T>(raw_query: Option<&str>) -> Result<T, UsersServiceError>
where
    T: DeserializeOwned + Default,
{
    raw_query
        .map(serde_qs::from_str)
        .transpose()
        .map_err(|_| UsersServiceError::MissingData)
        .map(Option::unwrap_or_default)
}
