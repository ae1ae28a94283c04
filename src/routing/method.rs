//! HTTP methods a route can be registered for.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::routing::error::RoutingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl Method {
    /// Every concrete method, in the order `*` fans out to.
    pub const ALL: [Method; 7] = [
        Method::Get,
        Method::Post,
        Method::Put,
        Method::Patch,
        Method::Delete,
        Method::Head,
        Method::Options,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }

    /// Lower-case verb used to prefix restful controller actions.
    pub fn verb(&self) -> String {
        self.as_str().to_ascii_lowercase()
    }

    /// Parse a registration method: `*` means every method.
    pub fn parse_many(method: &str) -> Result<Vec<Method>, RoutingError> {
        if method.trim() == "*" {
            return Ok(Method::ALL.to_vec());
        }
        Ok(vec![method.parse()?])
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = RoutingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RoutingError::UnknownMethod(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("get".parse::<Method>().unwrap(), Method::Get);
        assert_eq!("OPTIONS".parse::<Method>().unwrap(), Method::Options);
        assert!("TRACE".parse::<Method>().is_err());
    }

    #[test]
    fn test_star_fans_out() {
        assert_eq!(Method::parse_many("*").unwrap().len(), 7);
        assert_eq!(Method::parse_many("post").unwrap(), vec![Method::Post]);
    }
}
