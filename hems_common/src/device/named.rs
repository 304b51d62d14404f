//! Declarative device configuration records.
//!
//! A [`Named`] record is the unit of device configuration: a unique name,
//! the implementation type and a free-form options bag. In TOML and JSON the
//! options are written inline next to `name` and `type`:
//!
//! ```toml
//! [[meters]]
//! name = "grid"
//! type = "demo"
//! power = 1200
//! ```

use serde::{Deserialize, Serialize};

/// Free-form options handed verbatim to a device factory.
pub type Options = serde_json::Map<String, serde_json::Value>;

/// Type sentinel for devices built from a user-supplied template options bag.
pub const TEMPLATE_TYPE: &str = "template";

/// Registry name of a device persisted in the device store.
pub fn name_for_id(id: u32) -> String {
    format!("db:{id}")
}

/// Device configuration without a name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Typed {
    /// Implementation type.
    #[serde(rename = "type", default)]
    pub typ: String,

    /// Remaining keys.
    #[serde(flatten)]
    pub other: Options,
}

impl Typed {
    /// Split a nameless request into type and options.
    ///
    /// `type` is removed from the bag; a request without a type is a
    /// template request.
    pub fn from_request(mut request: Options) -> Self {
        let typ = match request.remove("type") {
            Some(serde_json::Value::String(typ)) => typ,
            _ => TEMPLATE_TYPE.to_string(),
        };

        Self {
            typ,
            other: request,
        }
    }
}

/// Named device configuration record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Named {
    /// Unique name within the device class.
    #[serde(default)]
    pub name: String,

    /// Implementation type, or [`TEMPLATE_TYPE`].
    #[serde(rename = "type", default)]
    pub typ: String,

    /// Remaining keys.
    #[serde(flatten)]
    pub other: Options,
}

impl Named {
    /// Create a record with an empty options bag.
    pub fn new(name: impl Into<String>, typ: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            typ: typ.into(),
            other: Options::new(),
        }
    }

    /// Add an option, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.other.insert(key.into(), value.into());
        self
    }

    /// Split a device management request into a record.
    ///
    /// `name` is removed from the bag, the rest is split as a [`Typed`]
    /// request.
    pub fn from_request(mut request: Options) -> Self {
        let name = match request.remove("name") {
            Some(serde_json::Value::String(name)) => name,
            _ => String::new(),
        };
        let Typed { typ, other } = Typed::from_request(request);

        Self { name, typ, other }
    }

    /// Options with the resolved `type` injected, for redisplay.
    pub fn display_options(&self) -> Options {
        let mut res = self.other.clone();
        res.insert("type".to_string(), self.typ.clone().into());
        res
    }
}
