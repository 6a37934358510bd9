//! Order record model for the `Ventas` collection.
//!
//! Stored documents use the Spanish field names the dashboard has always
//! written (`persona`, `encargadoPor`, `pago`, ...). Every enum-valued
//! field is a closed variant set whose first member is the declared
//! default, assigned during normalization so downstream code never sees a
//! missing key.

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::status::{LegacyFlags, Status};
use crate::store::RawDocument;

// ---------------------------------------------------------------------------
// Closed field enums
// ---------------------------------------------------------------------------

macro_rules! closed_enum {
    ($(#[$doc:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $label)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            /// Parse a stored label; `None` for anything outside the set.
            pub fn parse(raw: &str) -> Option<$name> {
                $name::ALL.iter().copied().find(|v| v.as_str() == raw.trim())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::ALL[0]
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

closed_enum! {
    /// Worker the order is assigned to.
    Worker {
        Bernyss => "Bernyss",
        Brayan => "Brayan",
        Stephanie => "Stephanie",
    }
}

closed_enum! {
    /// Shift code the order was taken in.
    Shift {
        A => "A",
        B => "B",
        C => "C",
    }
}

closed_enum! {
    /// Garment brand.
    Brand {
        Okey => "Okey",
        Columbia => "Columbia",
        Unicreses => "Unicreses",
    }
}

closed_enum! {
    /// Garment size.
    Size {
        Xs => "XS",
        S => "S",
        M => "M",
        L => "L",
        Xl => "XL",
        Xl2 => "2XL",
        Xl3 => "3XL",
        Xl4 => "4XL",
    }
}

closed_enum! {
    /// Garment gender/category.
    Gender {
        Hombre => "Hombre",
        Mujer => "Mujer",
    }
}

// ---------------------------------------------------------------------------
// Order
// ---------------------------------------------------------------------------

/// One tracked embroidery job, fully normalized: every field populated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Store-assigned identifier; immutable once created.
    #[serde(default)]
    pub id: String,
    /// Requester name.
    #[serde(rename = "persona", default)]
    pub requester: String,
    #[serde(rename = "encargadoPor", default)]
    pub worker: Worker,
    /// Payment amount, carried as text the way the entry form stores it.
    #[serde(rename = "pago", default)]
    pub payment: String,
    /// Order date as a plain `YYYY-MM-DD` string.
    #[serde(rename = "fechaPedido", default)]
    pub order_date: String,
    #[serde(rename = "turno", default)]
    pub shift: Shift,
    #[serde(rename = "empresa", default)]
    pub company: String,
    #[serde(rename = "colores", default)]
    pub colors: String,
    #[serde(rename = "marca", default)]
    pub brand: Brand,
    #[serde(rename = "talla", default)]
    pub size: Size,
    #[serde(rename = "genero", default)]
    pub gender: Gender,
    #[serde(rename = "comentarios", default)]
    pub comments: String,
    #[serde(rename = "estado", default)]
    pub status: Status,
    /// Legacy boolean projection, recomputed on every status write.
    #[serde(flatten)]
    pub flags: LegacyFlags,
    /// Registration timestamp (RFC 3339), stamped at create time.
    #[serde(rename = "fechaRegistro", default)]
    pub registered_at: String,
}

impl Order {
    /// Serialize to the stored field map (everything except `id`).
    pub fn to_fields(&self) -> Value {
        // Every field is a string, bool, or unit enum, so serialization to
        // a JSON object cannot fail.
        let mut value =
            serde_json::to_value(self).expect("Order serializes to a JSON object");
        if let Some(map) = value.as_object_mut() {
            map.remove("id");
        }
        value
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Build a fully-populated [`Order`] from a raw stored document.
///
/// Absent or falsy fields get their declared defaults, timestamp-like
/// dates are coerced to `YYYY-MM-DD`, and `estado` is derived from the
/// legacy flags when the document predates the unified field. Historical
/// documents are never written back; the collapse happens in memory only.
pub fn normalize(doc: &RawDocument) -> Order {
    let f = &doc.fields;

    let flags = LegacyFlags {
        missing: value_bool(f, "faltantes"),
        purchased: value_bool(f, "compradas"),
        paid: value_bool(f, "pagadas"),
        embroidered: value_bool(f, "bordada"),
        delivered: value_bool(f, "entregada"),
    };
    let status = value_str(f, "estado")
        .and_then(|s| Status::parse(&s))
        .unwrap_or_else(|| flags.derive_status());

    Order {
        id: doc.id.clone(),
        requester: value_str(f, "persona").unwrap_or_default(),
        worker: parse_enum(f, "encargadoPor", Worker::parse),
        payment: payment_text(f.get("pago")),
        order_date: coerce_date(f.get("fechaPedido")),
        shift: parse_enum(f, "turno", Shift::parse),
        company: value_str(f, "empresa").unwrap_or_default(),
        colors: value_str(f, "colores").unwrap_or_default(),
        brand: parse_enum(f, "marca", Brand::parse),
        size: parse_enum(f, "talla", Size::parse),
        gender: parse_enum(f, "genero", Gender::parse),
        comments: value_str(f, "comentarios").unwrap_or_default(),
        status,
        flags,
        registered_at: coerce_timestamp(f.get("fechaRegistro")),
    }
}

fn parse_enum<T: Default>(fields: &Value, key: &str, parse: fn(&str) -> Option<T>) -> T {
    value_str(fields, key)
        .and_then(|s| parse(&s))
        .unwrap_or_default()
}

/// Read a non-empty trimmed string field.
pub(crate) fn value_str(fields: &Value, key: &str) -> Option<String> {
    let s = fields.get(key)?.as_str()?.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Read a boolean field; anything absent or non-boolean is `false`.
pub(crate) fn value_bool(fields: &Value, key: &str) -> bool {
    fields.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// The payment field was written as text by the entry form, but older
/// documents hold plain numbers. Carry both as text; a stored numeric
/// zero collapses to the empty-string default like any other falsy value.
fn payment_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => {
            if n.as_f64() == Some(0.0) {
                String::new()
            } else if let Some(i) = n.as_i64() {
                i.to_string()
            } else {
                n.to_string()
            }
        }
        _ => String::new(),
    }
}

/// Coerce a stored date into a plain `YYYY-MM-DD` string.
///
/// Plain strings pass through unchanged; store timestamps (a map with a
/// `seconds` field) and epoch-millisecond numbers are converted; anything
/// else becomes the empty string.
fn coerce_date(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => timestamp_of(other)
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        None => String::new(),
    }
}

/// Like [`coerce_date`], but keeps the full RFC 3339 instant.
fn coerce_timestamp(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => timestamp_of(other)
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_default(),
        None => String::new(),
    }
}

fn timestamp_of(value: &Value) -> Option<DateTime<chrono::Utc>> {
    if let Some(obj) = value.as_object() {
        let seconds = obj
            .get("seconds")
            .or_else(|| obj.get("_seconds"))
            .and_then(Value::as_i64)?;
        return DateTime::from_timestamp(seconds, 0);
    }
    if let Some(millis) = value.as_i64() {
        return DateTime::from_timestamp_millis(millis);
    }
    None
}

// ---------------------------------------------------------------------------
// Entry/edit form draft
// ---------------------------------------------------------------------------

/// The mutable field set captured by the entry and edit forms.
///
/// `Default` mirrors the blank form: enum fields start on their first
/// member, everything else empty, status pending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    pub requester: String,
    pub worker: Worker,
    pub payment: String,
    pub order_date: String,
    pub shift: Shift,
    pub company: String,
    pub colors: String,
    pub brand: Brand,
    pub size: Size,
    pub gender: Gender,
    pub comments: String,
    pub status: Status,
}

impl OrderDraft {
    /// Stored field map for this draft, including the legacy flag
    /// projection for the chosen status.
    pub fn to_fields(&self) -> Value {
        let flags = self.status.as_flags();
        serde_json::json!({
            "persona": self.requester,
            "encargadoPor": self.worker.as_str(),
            "pago": self.payment,
            "fechaPedido": self.order_date,
            "turno": self.shift.as_str(),
            "empresa": self.company,
            "colores": self.colors,
            "marca": self.brand.as_str(),
            "talla": self.size.as_str(),
            "genero": self.gender.as_str(),
            "comentarios": self.comments,
            "estado": self.status.as_str(),
            "faltantes": flags.missing,
            "compradas": flags.purchased,
            "pagadas": flags.paid,
            "bordada": flags.embroidered,
            "entregada": flags.delivered,
        })
    }

    /// Materialize the draft as an order with the given identity,
    /// preserving the registration stamp.
    pub fn into_order(self, id: &str, registered_at: &str) -> Order {
        let flags = self.status.as_flags();
        Order {
            id: id.to_string(),
            requester: self.requester,
            worker: self.worker,
            payment: self.payment,
            order_date: self.order_date,
            shift: self.shift,
            company: self.company,
            colors: self.colors,
            brand: self.brand,
            size: self.size,
            gender: self.gender,
            comments: self.comments,
            status: self.status,
            flags,
            registered_at: registered_at.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(fields: Value) -> RawDocument {
        RawDocument {
            id: "doc-1".into(),
            fields,
        }
    }

    #[test]
    fn normalize_fills_every_field_with_defaults() {
        let order = normalize(&doc(serde_json::json!({})));
        assert_eq!(order.id, "doc-1");
        assert_eq!(order.requester, "");
        assert_eq!(order.worker, Worker::Bernyss);
        assert_eq!(order.payment, "");
        assert_eq!(order.order_date, "");
        assert_eq!(order.shift, Shift::A);
        assert_eq!(order.brand, Brand::Okey);
        assert_eq!(order.size, Size::Xs);
        assert_eq!(order.gender, Gender::Hombre);
        assert_eq!(order.status, Status::Pending);
        assert_eq!(order.flags, LegacyFlags::default());
    }

    #[test]
    fn normalize_derives_status_from_legacy_flags() {
        let order = normalize(&doc(serde_json::json!({
            "entregada": true,
            "pagadas": true,
        })));
        assert_eq!(order.status, Status::Delivered);
        // Flags are preserved as stored, only the view is collapsed.
        assert!(order.flags.paid);
    }

    #[test]
    fn explicit_estado_wins_over_flags() {
        let order = normalize(&doc(serde_json::json!({
            "estado": "Comprada",
            "entregada": true,
        })));
        assert_eq!(order.status, Status::Purchased);
    }

    #[test]
    fn unknown_enum_labels_fall_back_to_defaults() {
        let order = normalize(&doc(serde_json::json!({
            "encargadoPor": "Nadie",
            "marca": "Adidas",
            "talla": "XXS",
            "turno": "D",
            "genero": "",
        })));
        assert_eq!(order.worker, Worker::Bernyss);
        assert_eq!(order.brand, Brand::Okey);
        assert_eq!(order.size, Size::Xs);
        assert_eq!(order.shift, Shift::A);
        assert_eq!(order.gender, Gender::Hombre);
    }

    #[test]
    fn date_strings_pass_through_and_timestamps_are_coerced() {
        let plain = normalize(&doc(serde_json::json!({ "fechaPedido": "2025-03-14" })));
        assert_eq!(plain.order_date, "2025-03-14");

        // Store timestamp map (2025-03-14T10:00:00Z).
        let stamped = normalize(&doc(serde_json::json!({
            "fechaPedido": { "seconds": 1_741_946_400, "nanoseconds": 0 }
        })));
        assert_eq!(stamped.order_date, "2025-03-14");

        let absent = normalize(&doc(serde_json::json!({})));
        assert_eq!(absent.order_date, "");
    }

    #[test]
    fn numeric_payment_is_carried_as_text() {
        let order = normalize(&doc(serde_json::json!({ "pago": 4500 })));
        assert_eq!(order.payment, "4500");

        let order = normalize(&doc(serde_json::json!({ "pago": "120.50" })));
        assert_eq!(order.payment, "120.50");
    }

    #[test]
    fn numeric_zero_payment_collapses_to_the_default() {
        let order = normalize(&doc(serde_json::json!({ "pago": 0 })));
        assert_eq!(order.payment, "");

        let order = normalize(&doc(serde_json::json!({ "pago": 0.0 })));
        assert_eq!(order.payment, "");
    }

    #[test]
    fn order_fields_round_trip_spanish_names() {
        let order = normalize(&doc(serde_json::json!({
            "persona": "Ana",
            "encargadoPor": "Brayan",
            "estado": "Pagada",
        })));
        let fields = order.to_fields();
        assert_eq!(fields["persona"], "Ana");
        assert_eq!(fields["encargadoPor"], "Brayan");
        assert_eq!(fields["estado"], "Pagada");
        assert_eq!(fields["pagadas"], false); // preserved as stored (unset)
        assert!(fields.get("id").is_none());
    }

    #[test]
    fn draft_fields_include_flag_projection() {
        let draft = OrderDraft {
            requester: "Luis".into(),
            status: Status::Paid,
            ..Default::default()
        };
        let fields = draft.to_fields();
        assert_eq!(fields["estado"], "Pagada");
        assert_eq!(fields["pagadas"], true);
        assert_eq!(fields["faltantes"], false);
        assert_eq!(fields["entregada"], false);
        assert_eq!(fields["encargadoPor"], "Bernyss");
    }
}
