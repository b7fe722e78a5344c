//! Shipping address and its validation.

use serde::{Deserialize, Serialize};

use crate::error::CheckoutError;

/// A required shipping address field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AddressField {
    FullName,
    Phone,
    Street,
    City,
    State,
    PostalCode,
}

impl AddressField {
    /// Every field, in the order errors report them.
    pub const ALL: [AddressField; 6] = [
        AddressField::FullName,
        AddressField::Phone,
        AddressField::Street,
        AddressField::City,
        AddressField::State,
        AddressField::PostalCode,
    ];

    /// Returns the field name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressField::FullName => "fullName",
            AddressField::Phone => "phone",
            AddressField::Street => "street",
            AddressField::City => "city",
            AddressField::State => "state",
            AddressField::PostalCode => "postalCode",
        }
    }

    pub(crate) fn join(fields: &[AddressField]) -> String {
        fields
            .iter()
            .map(AddressField::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for AddressField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where an order ships to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

impl ShippingAddress {
    /// Creates an address from all six fields.
    pub fn new(
        full_name: impl Into<String>,
        phone: impl Into<String>,
        street: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        postal_code: impl Into<String>,
    ) -> Self {
        Self {
            full_name: full_name.into(),
            phone: phone.into(),
            street: street.into(),
            city: city.into(),
            state: state.into(),
            postal_code: postal_code.into(),
        }
    }

    /// Returns the value of `field`.
    pub fn field(&self, field: AddressField) -> &str {
        match field {
            AddressField::FullName => &self.full_name,
            AddressField::Phone => &self.phone,
            AddressField::Street => &self.street,
            AddressField::City => &self.city,
            AddressField::State => &self.state,
            AddressField::PostalCode => &self.postal_code,
        }
    }

    /// Returns every field that is empty or whitespace only.
    pub fn missing_fields(&self) -> Vec<AddressField> {
        AddressField::ALL
            .into_iter()
            .filter(|f| self.field(*f).trim().is_empty())
            .collect()
    }

    /// Checks that every required field is filled in.
    pub fn validate(&self) -> Result<(), CheckoutError> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(CheckoutError::Validation { missing })
        }
    }

    /// Parses `fullName|phone|street|city|state|postalCode`.
    ///
    /// Missing trailing segments are left empty so validation can name them.
    pub fn parse_pipe_separated(input: &str) -> Self {
        let mut parts = input.split('|').map(|s| s.trim().to_string());
        let mut next = || parts.next().unwrap_or_default();
        Self {
            full_name: next(),
            phone: next(),
            street: next(),
            city: next(),
            state: next(),
            postal_code: next(),
        }
    }
}

impl std::fmt::Display for ShippingAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}), {}, {}, {} {}",
            self.full_name, self.phone, self.street, self.city, self.state, self.postal_code
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> ShippingAddress {
        ShippingAddress::new(
            "Asha Rao",
            "9876543210",
            "12 MG Road",
            "Bengaluru",
            "Karnataka",
            "560001",
        )
    }

    #[test]
    fn empty_address_misses_every_field_in_order() {
        assert_eq!(
            ShippingAddress::default().missing_fields(),
            AddressField::ALL.to_vec()
        );
    }

    #[test]
    fn whitespace_counts_as_missing() {
        let mut address = complete();
        address.city = "   ".to_string();
        assert_eq!(address.missing_fields(), vec![AddressField::City]);
    }

    #[test]
    fn complete_address_validates() {
        assert!(complete().validate().is_ok());
    }

    #[test]
    fn parse_pipe_separated_fills_in_order() {
        let parsed = ShippingAddress::parse_pipe_separated(
            "Asha Rao | 9876543210 | 12 MG Road | Bengaluru | Karnataka | 560001",
        );
        assert_eq!(parsed, complete());

        let partial = ShippingAddress::parse_pipe_separated("Asha Rao|9876543210");
        assert_eq!(
            partial.missing_fields(),
            vec![
                AddressField::Street,
                AddressField::City,
                AddressField::State,
                AddressField::PostalCode
            ]
        );
    }

    #[test]
    fn field_names_serialize_camel_case() {
        let json = serde_json::to_string(&AddressField::PostalCode).unwrap();
        assert_eq!(json, "\"postalCode\"");
    }
}
