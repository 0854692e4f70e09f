use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize, Serializer};

use crate::{
    models::method::MethodSpec,
    pipeline::binding::{FieldBinding, bindings_for},
    requests::RequestError,
};

/// Sort direction of the returned rows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASC" => Ok(SortOrder::Asc),
            "DESC" => Ok(SortOrder::Desc),
            _ => Err(RequestError::InvalidOrder(s.to_string())),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        })
    }
}

/// Body of one batched request: the bar series plus indicator jobs over a
/// common date range.
///
/// Built by [`RequestBuilder`](crate::requests::builder::RequestBuilder); the
/// order of [`methods`](Self::methods) is the order of the response entries.
#[derive(Clone, Debug, Serialize)]
pub struct SeriesRequest {
    pub symbols: Vec<String>,
    pub intervals: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub order: SortOrder,
    /// Zone the API reports datetimes in; bar datetimes are read back in it.
    #[serde(serialize_with = "serialize_zone")]
    pub timezone: Tz,
    #[serde(rename = "outputsize", skip_serializing_if = "Option::is_none")]
    pub output_size: Option<u32>,
    pub methods: Vec<MethodSpec>,
}

impl SeriesRequest {
    /// Response-index → display-field bindings implied by `methods`.
    pub fn bindings(&self) -> Vec<FieldBinding> {
        bindings_for(&self.methods)
    }

    /// Number of response entries this request expects.
    pub fn expected_entries(&self) -> usize {
        self.methods.len()
    }
}

fn serialize_zone<S: Serializer>(tz: &Tz, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(tz.name())
}
