use std::convert::Infallible;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Canned access-control setting applied to uploaded objects.
///
/// The well-known S3 canned ACLs get their own variants; anything else a
/// provider accepts is carried through untouched as `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ObjectAcl {
    Private,
    PublicRead,
    PublicReadWrite,
    AuthenticatedRead,
    BucketOwnerRead,
    BucketOwnerFullControl,
    Custom(String),
}

impl ObjectAcl {
    pub fn as_str(&self) -> &str {
        match self {
            ObjectAcl::Private => "private",
            ObjectAcl::PublicRead => "public-read",
            ObjectAcl::PublicReadWrite => "public-read-write",
            ObjectAcl::AuthenticatedRead => "authenticated-read",
            ObjectAcl::BucketOwnerRead => "bucket-owner-read",
            ObjectAcl::BucketOwnerFullControl => "bucket-owner-full-control",
            ObjectAcl::Custom(value) => value,
        }
    }

    pub fn is_private(&self) -> bool {
        matches!(self, ObjectAcl::Private)
    }
}

impl FromStr for ObjectAcl {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "private" => ObjectAcl::Private,
            "public-read" => ObjectAcl::PublicRead,
            "public-read-write" => ObjectAcl::PublicReadWrite,
            "authenticated-read" => ObjectAcl::AuthenticatedRead,
            "bucket-owner-read" => ObjectAcl::BucketOwnerRead,
            "bucket-owner-full-control" => ObjectAcl::BucketOwnerFullControl,
            other => ObjectAcl::Custom(other.to_string()),
        })
    }
}

impl From<String> for ObjectAcl {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(acl) => acl,
            Err(never) => match never {},
        }
    }
}

impl From<ObjectAcl> for String {
    fn from(value: ObjectAcl) -> Self {
        value.as_str().to_string()
    }
}

impl Display for ObjectAcl {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canned_values_round_trip_through_strings() {
        for raw in ["private", "public-read", "bucket-owner-full-control"] {
            let acl: ObjectAcl = raw.parse().unwrap();
            assert_eq!(acl.to_string(), raw);
        }
    }

    #[test]
    fn only_private_is_private() {
        assert!(ObjectAcl::Private.is_private());
        assert!(!ObjectAcl::PublicRead.is_private());
        // ACL values are case-sensitive, "Private" is not the canned value
        assert!(!ObjectAcl::from("Private".to_string()).is_private());
    }

    #[test]
    fn unknown_values_are_kept_verbatim() {
        let acl = ObjectAcl::from("log-delivery-write-ish".to_string());
        assert_eq!(acl, ObjectAcl::Custom("log-delivery-write-ish".to_string()));
        assert_eq!(acl.as_str(), "log-delivery-write-ish");
    }

    #[test]
    fn deserializes_from_plain_string() {
        let acl: ObjectAcl = serde_json::from_str("\"public-read\"").unwrap();
        assert_eq!(acl, ObjectAcl::PublicRead);
    }
}
