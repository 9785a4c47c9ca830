//! Staff document normalizer.

use crate::models::{RawDocument, RawValue, StaffMember, StaffRole};

use super::RejectReason;

const NAME_FIELDS: &[&str] = &["name", "fullName"];
const EMAIL_FIELDS: &[&str] = &["email"];
const PHONE_FIELDS: &[&str] = &["phone", "phoneNumber"];
const SPECIALIZATION_FIELDS: &[&str] = &["specialization", "specialty", "department"];

/// Normalize a staff document fetched from a role collection.
pub fn normalize_staff(doc: &RawDocument, role: StaffRole) -> Result<StaffMember, RejectReason> {
    Ok(StaffMember {
        id: doc.id.clone(),
        name: required(doc, NAME_FIELDS, "name")?,
        email: required(doc, EMAIL_FIELDS, "email")?,
        role,
        phone: optional(doc, PHONE_FIELDS),
        specialization: optional(doc, SPECIALIZATION_FIELDS),
    })
}

fn required(doc: &RawDocument, keys: &[&str], field: &'static str) -> Result<String, RejectReason> {
    match doc.get_any(keys) {
        None => Err(RejectReason::MissingField(field)),
        Some(RawValue::String(s)) => Ok(s.clone()),
        Some(_) => Err(RejectReason::WrongType {
            field,
            expected: "string",
        }),
    }
}

fn optional(doc: &RawDocument, keys: &[&str]) -> Option<String> {
    doc.get_any(keys)
        .and_then(RawValue::as_str)
        .map(str::to_string)
}
