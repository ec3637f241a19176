use syn::spanned::Spanned;
use syn::{Attribute, Error, LitStr};

#[derive(Default)]
pub struct ManagedAttributes {
    pub is_application: bool,
    pub config_file: Option<LitStr>,
}

impl TryFrom<&Attribute> for ManagedAttributes {
    type Error = Error;

    fn try_from(value: &Attribute) -> Result<Self, Self::Error> {
        let mut result = Self::default();
        value.parse_nested_meta(|meta| {
            if meta.path.is_ident("application") {
                result.is_application = true;
            } else if meta.path.is_ident("config_file") {
                if result.config_file.is_some() {
                    return Err(meta.error("Config file is already defined!"));
                }

                result.config_file = Some(meta.value().and_then(|value| value.parse())?);
            } else {
                return Err(meta.error("Unsupported managed attribute!"));
            }

            Ok(())
        })?;

        Ok(result)
    }
}

pub struct PropertyAttributes {
    pub name: LitStr,
    pub kind: Option<LitStr>,
    pub is_optional: bool,
    pub is_system: bool,
}

impl TryFrom<&Attribute> for PropertyAttributes {
    type Error = Error;

    fn try_from(value: &Attribute) -> Result<Self, Self::Error> {
        let mut name = None;
        let mut kind = None;
        let mut is_optional = false;
        let mut is_system = false;
        value.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                name = Some(meta.value().and_then(|value| value.parse())?);
            } else if meta.path.is_ident("kind") {
                kind = Some(meta.value().and_then(|value| value.parse())?);
            } else if meta.path.is_ident("optional") {
                is_optional = true;
            } else if meta.path.is_ident("system") {
                is_system = true;
            } else {
                return Err(meta.error("Unsupported property attribute!"));
            }

            Ok(())
        })?;

        let name = name.ok_or_else(|| Error::new(value.span(), "Missing property name!"))?;

        Ok(Self {
            name,
            kind,
            is_optional,
            is_system,
        })
    }
}
