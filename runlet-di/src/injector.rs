//! Injection of configuration values into configurable fields.

use crate::coercion::{coerce, default_value, TypedValue};
use crate::config_source::ConfigurationStore;
use crate::error::{InjectionFailure, PropertyInjectionError};
use crate::marker::{ApplicationPropertyMarker, PropertyOrigin};
use crate::type_registry::{FieldAccessor, TypeDefinition};
use derivative::Derivative;
use std::any::{Any, TypeId};
use tracing::{debug, warn};

/// A configurable field of a given type, resolved once per discovery pass.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct ConfigurableFieldDescriptor {
    pub type_id: TypeId,
    pub type_name: &'static str,
    pub field_name: &'static str,
    pub marker: ApplicationPropertyMarker,
    #[derivative(Debug = "ignore")]
    pub accessor: FieldAccessor,
}

impl ConfigurableFieldDescriptor {
    /// Creates descriptors for all configurable fields of a type.
    pub fn from_definition(definition: &TypeDefinition) -> impl Iterator<Item = Self> + '_ {
        definition.fields.iter().map(|field| Self {
            type_id: definition.type_id,
            type_name: definition.type_name,
            field_name: field.field_name,
            marker: field.marker,
            accessor: field.accessor,
        })
    }
}

/// Writes configuration values into instances, according to field descriptors.
#[derive(Clone, Copy, Debug)]
pub struct FieldInjector<'a> {
    application_store: &'a ConfigurationStore,
    system_store: &'a ConfigurationStore,
    descriptors: &'a [ConfigurableFieldDescriptor],
}

impl<'a> FieldInjector<'a> {
    pub fn new(
        application_store: &'a ConfigurationStore,
        system_store: &'a ConfigurationStore,
        descriptors: &'a [ConfigurableFieldDescriptor],
    ) -> Self {
        Self {
            application_store,
            system_store,
            descriptors,
        }
    }

    /// Injects all configurable fields of `target_type` in the given instance. Fields are written
    /// as soon as they are resolved, so an error leaves previously handled fields injected.
    /// Returns if at least one field has been injected.
    pub fn inject(
        &self,
        instance: &mut dyn Any,
        target_type: TypeId,
    ) -> Result<bool, PropertyInjectionError> {
        let mut result = false;

        for descriptor in self
            .descriptors
            .iter()
            .filter(|descriptor| descriptor.type_id == target_type)
        {
            debug!(
                "Handling type '{}': field '{}'",
                descriptor.type_name, descriptor.field_name
            );

            result |= self.inject_field(instance, descriptor)?;
        }

        Ok(result)
    }

    fn store(&self, origin: PropertyOrigin) -> &ConfigurationStore {
        match origin {
            PropertyOrigin::Application => self.application_store,
            PropertyOrigin::System => self.system_store,
        }
    }

    fn inject_field(
        &self,
        instance: &mut dyn Any,
        descriptor: &ConfigurableFieldDescriptor,
    ) -> Result<bool, PropertyInjectionError> {
        let marker = &descriptor.marker;
        let raw = match self.store(marker.origin).get(marker.name) {
            Some(raw) => raw,
            None => {
                warn!(
                    field = descriptor.field_name,
                    "No {} property defined for field annotation: {}", marker.origin, marker.name
                );
                return Ok(false);
            }
        };

        let value = if raw.trim().is_empty() {
            if marker.optional {
                default_value(marker.kind)
            } else {
                warn!(
                    field = descriptor.field_name,
                    "Blank {} property value found: {}", marker.origin, marker.name
                );
                self.coerce(raw, descriptor)?
            }
        } else {
            self.coerce(raw, descriptor)?
        };

        (descriptor.accessor)(instance, value).map_err(|_| {
            Self::error(descriptor, raw, InjectionFailure::IncompatibleField)
        })?;

        Ok(true)
    }

    fn coerce(
        &self,
        raw: &str,
        descriptor: &ConfigurableFieldDescriptor,
    ) -> Result<TypedValue, PropertyInjectionError> {
        coerce(raw, descriptor.marker.kind)
            .map_err(|error| Self::error(descriptor, raw, InjectionFailure::Coercion(error.kind)))
    }

    fn error(
        descriptor: &ConfigurableFieldDescriptor,
        raw: &str,
        reason: InjectionFailure,
    ) -> PropertyInjectionError {
        PropertyInjectionError {
            field_name: descriptor.field_name.to_string(),
            property_name: descriptor.marker.name.to_string(),
            kind: descriptor.marker.kind,
            value: raw.to_string(),
            origin: descriptor.marker.origin,
            reason,
        }
    }
}
