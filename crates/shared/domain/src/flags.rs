use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const FILLABLE: &str = "fillable";
pub const HIDDEN: &str = "hidden";
pub const PROTECTED: &str = "protected";
pub const READONLY: &str = "readonly";
pub const REQUIRED: &str = "required";

bitflags! {
    /// Policy flags a field can be declared with.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
    pub struct FieldFlags: u8 {
        const FILLABLE = 1 << 0;
        const HIDDEN = 1 << 1;
        const PROTECTED = 1 << 2;
        const READONLY = 1 << 3;
        const REQUIRED = 1 << 4;
    }
}

impl From<&str> for FieldFlags {
    fn from(s: &str) -> Self {
        match s {
            FILLABLE => Self::FILLABLE,
            HIDDEN => Self::HIDDEN,
            PROTECTED => Self::PROTECTED,
            READONLY => Self::READONLY,
            REQUIRED => Self::REQUIRED,
            _ => Self::empty(),
        }
    }
}

impl From<u8> for FieldFlags {
    fn from(bits: u8) -> Self {
        Self::from_bits_truncate(bits)
    }
}

impl Serialize for FieldFlags {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(self.bits())
    }
}

impl<'de> Deserialize<'de> for FieldFlags {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = u8::deserialize(deserializer)?;
        Ok(Self::from_bits_truncate(bits))
    }
}
