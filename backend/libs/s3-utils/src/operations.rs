/// Object storage operations shared by every store implementation
use crate::error::{Result, StorageError};
use async_trait::async_trait;
use aws_sdk_s3::types::ObjectCannedAcl;
use bytes::Bytes;
use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

/// Canned ACL applied to an uploaded object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectAcl {
    Private,
    #[default]
    PublicRead,
    PublicReadWrite,
    AuthenticatedRead,
    BucketOwnerRead,
    BucketOwnerFullControl,
}

impl ObjectAcl {
    /// Wire name as used in the `x-amz-acl` header
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectAcl::Private => "private",
            ObjectAcl::PublicRead => "public-read",
            ObjectAcl::PublicReadWrite => "public-read-write",
            ObjectAcl::AuthenticatedRead => "authenticated-read",
            ObjectAcl::BucketOwnerRead => "bucket-owner-read",
            ObjectAcl::BucketOwnerFullControl => "bucket-owner-full-control",
        }
    }
}

impl fmt::Display for ObjectAcl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectAcl {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "private" => Ok(ObjectAcl::Private),
            "public-read" => Ok(ObjectAcl::PublicRead),
            "public-read-write" => Ok(ObjectAcl::PublicReadWrite),
            "authenticated-read" => Ok(ObjectAcl::AuthenticatedRead),
            "bucket-owner-read" => Ok(ObjectAcl::BucketOwnerRead),
            "bucket-owner-full-control" => Ok(ObjectAcl::BucketOwnerFullControl),
            other => Err(StorageError::InvalidAcl(other.to_string())),
        }
    }
}

impl From<ObjectAcl> for ObjectCannedAcl {
    fn from(acl: ObjectAcl) -> Self {
        match acl {
            ObjectAcl::Private => ObjectCannedAcl::Private,
            ObjectAcl::PublicRead => ObjectCannedAcl::PublicRead,
            ObjectAcl::PublicReadWrite => ObjectCannedAcl::PublicReadWrite,
            ObjectAcl::AuthenticatedRead => ObjectCannedAcl::AuthenticatedRead,
            ObjectAcl::BucketOwnerRead => ObjectCannedAcl::BucketOwnerRead,
            ObjectAcl::BucketOwnerFullControl => ObjectCannedAcl::BucketOwnerFullControl,
        }
    }
}

/// Upload/download contract for a bucket/key addressed object store.
///
/// Implementations never retry; whatever the transport reports is returned
/// to the caller.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload `data` as the body of `bucket/key`, creating or overwriting it.
    ///
    /// The object's content type is derived from `key` via
    /// [`crate::content_type_for`].
    async fn put(&self, bucket: &str, key: &str, data: Bytes, acl: ObjectAcl) -> Result<()>;

    /// Download the whole body of `bucket/key` into memory.
    ///
    /// The returned buffer is positioned at offset 0.
    async fn get(&self, bucket: &str, key: &str) -> Result<Cursor<Bytes>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_acl_is_public_read() {
        assert_eq!(ObjectAcl::default(), ObjectAcl::PublicRead);
        assert_eq!(ObjectAcl::default().to_string(), "public-read");
    }

    #[test]
    fn test_acl_parses_wire_names() {
        for acl in [
            ObjectAcl::Private,
            ObjectAcl::PublicRead,
            ObjectAcl::PublicReadWrite,
            ObjectAcl::AuthenticatedRead,
            ObjectAcl::BucketOwnerRead,
            ObjectAcl::BucketOwnerFullControl,
        ] {
            assert_eq!(acl.as_str().parse::<ObjectAcl>().unwrap(), acl);
        }
        assert_eq!(" Public-Read ".parse::<ObjectAcl>().unwrap(), ObjectAcl::PublicRead);
    }

    #[test]
    fn test_unknown_acl_is_rejected() {
        let err = "world-writable".parse::<ObjectAcl>().unwrap_err();
        assert!(matches!(err, StorageError::InvalidAcl(name) if name == "world-writable"));
    }

    #[test]
    fn test_acl_maps_to_sdk_canned_acl() {
        assert_eq!(
            ObjectCannedAcl::from(ObjectAcl::PublicRead),
            ObjectCannedAcl::PublicRead
        );
        assert_eq!(ObjectCannedAcl::from(ObjectAcl::Private).as_str(), "private");
    }
}
