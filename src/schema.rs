//! The structured invoice record and its validator.
//!
//! Every field is optional by design: absence means "not confidently
//! extracted", never zero, and the validator must never fail merely because
//! a field is missing. Validation fails only when a *present* value cannot
//! be coerced to its declared type, and the error names the offending field
//! path (`items[0].quantity`).
//!
//! Coercion is lax in one direction: float fields accept JSON numbers and
//! numeric strings (`"12.5"`); string fields accept strings only. Extra
//! keys in the input mapping are ignored.

use crate::error::ExtractError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A postal address, all parts optional. `country` is a 2-character ISO code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postcode: Option<String>,
    pub country: Option<String>,
}

/// Contact details for a buyer or seller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactDetails {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// One billable row of an invoice. `vat_rate` is a decimal fraction
/// (0.10 for 10%); `subtotal_price` is pre-VAT, `total_price` post-VAT.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub cost_center: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<f64>,
    pub unit_price: Option<f64>,
    pub subtotal_price: Option<f64>,
    pub total_price: Option<f64>,
    pub vat_rate: Option<f64>,
    pub vat_amount: Option<f64>,
    pub currency: Option<String>,
}

/// The validated output of one extraction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    pub invoice_id: Option<String>,
    pub invoice_date: Option<String>,
    pub invoice_total: Option<f64>,
    pub invoice_total_currency: Option<String>,
    pub invoice_vat_amount: Option<f64>,
    pub invoice_vat_rate: Option<f64>,
    pub buyer_name: Option<String>,
    #[serde(default)]
    pub buyer_address: Address,
    #[serde(default)]
    pub buyer_details: ContactDetails,
    pub buyer_contact_name: Option<String>,
    pub seller_name: Option<String>,
    #[serde(default)]
    pub seller_address: Address,
    #[serde(default)]
    pub seller_details: ContactDetails,
    pub seller_contact_name: Option<String>,
    #[serde(default)]
    pub items: Vec<LineItem>,
}

impl InvoiceRecord {
    /// Validate an arbitrary JSON value into an `InvoiceRecord`.
    ///
    /// Missing keys and explicit nulls both become `None`; nested
    /// address/contact objects default to all-null structs when absent;
    /// `items` defaults to an empty sequence. A present value of the
    /// wrong type fails with [`ExtractError::Validation`].
    pub fn validate(value: &Value) -> Result<Self, ExtractError> {
        let map = value.as_object().ok_or_else(|| ExtractError::Validation {
            field: "<root>".into(),
            reason: format!("expected an object, got {}", type_name(value)),
        })?;

        let mut record = InvoiceRecord {
            invoice_id: coerce_string(map.get("invoice_id"), "invoice_id")?,
            invoice_date: coerce_string(map.get("invoice_date"), "invoice_date")?,
            invoice_total: coerce_f64(map.get("invoice_total"), "invoice_total")?,
            invoice_total_currency: coerce_string(
                map.get("invoice_total_currency"),
                "invoice_total_currency",
            )?,
            invoice_vat_amount: coerce_f64(map.get("invoice_vat_amount"), "invoice_vat_amount")?,
            invoice_vat_rate: coerce_f64(map.get("invoice_vat_rate"), "invoice_vat_rate")?,
            buyer_name: coerce_string(map.get("buyer_name"), "buyer_name")?,
            buyer_address: validate_address(map.get("buyer_address"), "buyer_address")?,
            buyer_details: validate_contact(map.get("buyer_details"), "buyer_details")?,
            buyer_contact_name: coerce_string(map.get("buyer_contact_name"), "buyer_contact_name")?,
            seller_name: coerce_string(map.get("seller_name"), "seller_name")?,
            seller_address: validate_address(map.get("seller_address"), "seller_address")?,
            seller_details: validate_contact(map.get("seller_details"), "seller_details")?,
            seller_contact_name: coerce_string(
                map.get("seller_contact_name"),
                "seller_contact_name",
            )?,
            items: Vec::new(),
        };

        match map.get("items") {
            None | Some(Value::Null) => {}
            Some(Value::Array(arr)) => {
                record.items.reserve(arr.len());
                for (i, item) in arr.iter().enumerate() {
                    record.items.push(validate_item(item, i)?);
                }
            }
            Some(other) => {
                return Err(ExtractError::Validation {
                    field: "items".into(),
                    reason: format!("expected an array, got {}", type_name(other)),
                });
            }
        }

        Ok(record)
    }

    /// Serialize the record back to a plain nested mapping.
    ///
    /// Every field is present (nulls included), so
    /// `validate(&record.to_value())` reproduces the record exactly.
    pub fn to_value(&self) -> Value {
        // Serialization of this derive cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Field names of the top-level record, in declaration order.
    ///
    /// Used by tests to check the prompt's declared output schema and the
    /// validator do not drift apart.
    pub fn field_names() -> &'static [&'static str] {
        &[
            "invoice_id",
            "invoice_date",
            "invoice_total",
            "invoice_total_currency",
            "invoice_vat_amount",
            "invoice_vat_rate",
            "buyer_name",
            "buyer_address",
            "buyer_details",
            "buyer_contact_name",
            "seller_name",
            "seller_address",
            "seller_details",
            "seller_contact_name",
            "items",
        ]
    }
}

impl LineItem {
    /// Field names of a line item, in declaration order.
    pub fn field_names() -> &'static [&'static str] {
        &[
            "cost_center",
            "description",
            "quantity",
            "unit_price",
            "subtotal_price",
            "total_price",
            "vat_rate",
            "vat_amount",
            "currency",
        ]
    }
}

// ── Coercion helpers ─────────────────────────────────────────────────────

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn coerce_string(v: Option<&Value>, field: &str) -> Result<Option<String>, ExtractError> {
    match v {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(ExtractError::Validation {
            field: field.to_string(),
            reason: format!("expected a string, got {}", type_name(other)),
        }),
    }
}

fn coerce_f64(v: Option<&Value>, field: &str) -> Result<Option<f64>, ExtractError> {
    match v {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_f64().map(Some).ok_or_else(|| ExtractError::Validation {
            field: field.to_string(),
            reason: format!("number {n} is out of f64 range"),
        }),
        // Numeric strings are tolerated; models occasionally quote amounts.
        Some(Value::String(s)) => match s.trim().parse::<f64>() {
            Ok(n) => Ok(Some(n)),
            Err(_) => Err(ExtractError::Validation {
                field: field.to_string(),
                reason: format!("expected a number, got string {s:?}"),
            }),
        },
        Some(other) => Err(ExtractError::Validation {
            field: field.to_string(),
            reason: format!("expected a number, got {}", type_name(other)),
        }),
    }
}

fn validate_address(v: Option<&Value>, field: &str) -> Result<Address, ExtractError> {
    match v {
        None | Some(Value::Null) => Ok(Address::default()),
        Some(Value::Object(map)) => Ok(Address {
            street: coerce_string(map.get("street"), &format!("{field}.street"))?,
            city: coerce_string(map.get("city"), &format!("{field}.city"))?,
            state: coerce_string(map.get("state"), &format!("{field}.state"))?,
            postcode: coerce_string(map.get("postcode"), &format!("{field}.postcode"))?,
            country: coerce_string(map.get("country"), &format!("{field}.country"))?,
        }),
        Some(other) => Err(ExtractError::Validation {
            field: field.to_string(),
            reason: format!("expected an object, got {}", type_name(other)),
        }),
    }
}

fn validate_contact(v: Option<&Value>, field: &str) -> Result<ContactDetails, ExtractError> {
    match v {
        None | Some(Value::Null) => Ok(ContactDetails::default()),
        Some(Value::Object(map)) => Ok(ContactDetails {
            name: coerce_string(map.get("name"), &format!("{field}.name"))?,
            email: coerce_string(map.get("email"), &format!("{field}.email"))?,
            phone: coerce_string(map.get("phone"), &format!("{field}.phone"))?,
        }),
        Some(other) => Err(ExtractError::Validation {
            field: field.to_string(),
            reason: format!("expected an object, got {}", type_name(other)),
        }),
    }
}

fn validate_item(v: &Value, index: usize) -> Result<LineItem, ExtractError> {
    let prefix = format!("items[{index}]");
    let map = v.as_object().ok_or_else(|| ExtractError::Validation {
        field: prefix.clone(),
        reason: format!("expected an object, got {}", type_name(v)),
    })?;

    Ok(LineItem {
        cost_center: coerce_string(map.get("cost_center"), &format!("{prefix}.cost_center"))?,
        description: coerce_string(map.get("description"), &format!("{prefix}.description"))?,
        quantity: coerce_f64(map.get("quantity"), &format!("{prefix}.quantity"))?,
        unit_price: coerce_f64(map.get("unit_price"), &format!("{prefix}.unit_price"))?,
        subtotal_price: coerce_f64(
            map.get("subtotal_price"),
            &format!("{prefix}.subtotal_price"),
        )?,
        total_price: coerce_f64(map.get("total_price"), &format!("{prefix}.total_price"))?,
        vat_rate: coerce_f64(map.get("vat_rate"), &format!("{prefix}.vat_rate"))?,
        vat_amount: coerce_f64(map.get("vat_amount"), &format!("{prefix}.vat_amount"))?,
        currency: coerce_string(map.get("currency"), &format!("{prefix}.currency"))?,
    })
}

// ── Tests ────────────────────────────────────────────────────────────────
