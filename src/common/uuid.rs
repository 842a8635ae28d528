
use serde::{Deserialize, Serialize};

macro_rules! impl_uuid {
    ($struct_name:ty) => {
        impl $struct_name {
            pub fn now_v7() -> Self {
                Self { inner: uuid::Uuid::now_v7() }
            }

            pub fn is_nil(&self) -> bool {
                self.inner.is_nil()
            }
        }

        impl From<uuid::Uuid> for $struct_name {
            fn from(value: uuid::Uuid) -> Self {
                Self { inner: value }
            }
        }

        impl std::fmt::Display for $struct_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.inner.fmt(f)
            }
        }
    };
}

#[derive(Clone, Copy, Debug, Hash, PartialOrd, Ord, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementUuid {
    inner: uuid::Uuid,
}

impl_uuid!(ElementUuid);
