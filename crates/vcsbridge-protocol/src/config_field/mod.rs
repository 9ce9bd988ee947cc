//! Backend configuration fields.
//!
//! A backend declares its fields once; the engine owns the resulting
//! [`ConfigFields`] registry and only the configuration-set commands mutate
//! the current values.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::error::ProtocolError;
use crate::flags::{FlagSet, impl_flag};

/// Text shown in place of password values.
pub const REDACTED: &str = "********";

/// One flag a configuration field may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum FieldFlag {
    /// The host must supply a value before connecting.
    Required = 0,
    /// The value is a secret.
    Password = 1,
}

impl_flag!(FieldFlag);

/// Set of [`FieldFlag`]s; empty means a plain optional field.
pub type FieldFlags = FlagSet<FieldFlag>;

/// A named configuration value with a default.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigField {
    name: String,
    label: String,
    description: String,
    default_value: String,
    value: String,
    #[serde(default)]
    flags: FieldFlags,
}

impl ConfigField {
    /// Creates a field whose current value starts at `default`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        description: impl Into<String>,
        default: impl Into<String>,
        flags: impl Into<FieldFlags>,
    ) -> Self {
        let default_value = default.into();
        Self {
            name: name.into(),
            label: label.into(),
            description: description.into(),
            value: default_value.clone(),
            default_value,
            flags: flags.into(),
        }
    }

    /// Returns the identifying name.
    #[must_use]
    pub const fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the label shown by the host.
    #[must_use]
    pub const fn label(&self) -> &str {
        self.label.as_str()
    }

    /// Returns the long description.
    #[must_use]
    pub const fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Returns the declared default.
    #[must_use]
    pub const fn default_value(&self) -> &str {
        self.default_value.as_str()
    }

    /// Returns the current value.
    #[must_use]
    pub const fn value(&self) -> &str {
        self.value.as_str()
    }

    /// Replaces the current value.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    /// Returns the field flags.
    #[must_use]
    pub const fn flags(&self) -> FieldFlags {
        self.flags
    }

    /// Returns `true` for required fields.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.flags.contains(FieldFlag::Required)
    }

    /// Returns `true` for password fields.
    #[must_use]
    pub fn is_password(&self) -> bool {
        self.flags.contains(FieldFlag::Password)
    }

    /// Returns the value safe for logs.
    #[must_use]
    pub fn display_value(&self) -> &str {
        if self.is_password() && !self.value.is_empty() {
            REDACTED
        } else {
            self.value.as_str()
        }
    }
}

impl fmt::Debug for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigField")
            .field("name", &self.name)
            .field("label", &self.label)
            .field("value", &self.display_value())
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

/// Ordered registry of the fields a backend declared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigFields {
    fields: Vec<ConfigField>,
}

impl ConfigFields {
    /// Wraps the declared fields.
    #[must_use]
    pub const fn new(fields: Vec<ConfigField>) -> Self {
        Self { fields }
    }

    /// Returns the fields in declaration order.
    #[must_use]
    pub fn as_slice(&self) -> &[ConfigField] {
        &self.fields
    }

    /// Looks a field up by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ConfigField> {
        self.fields.iter().find(|field| field.name() == name)
    }

    /// Returns the current value of a field.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name).map(ConfigField::value)
    }

    /// Sets the current value of a declared field.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnknownField`] if no field has that name.
    pub fn set(
        &mut self,
        name: &str,
        value: impl Into<String>,
    ) -> Result<&ConfigField, ProtocolError> {
        let field = self
            .fields
            .iter_mut()
            .find(|field| field.name() == name)
            .ok_or_else(|| ProtocolError::unknown_field(name))?;
        field.set_value(value);
        Ok(&*field)
    }

    /// Lists required fields that still hold an empty value.
    #[must_use]
    pub fn missing_required(&self) -> Vec<&ConfigField> {
        self.fields
            .iter()
            .filter(|field| field.is_required() && field.value().trim().is_empty())
            .collect()
    }
}
