//! Order fulfillment status (`estado`) and its legacy boolean projection.
//!
//! Older documents carry only the five flags; the unified `estado` field is
//! the single source of truth going forward. Every status write recomputes
//! the flag projection so old list views keep working.

use serde::{Deserialize, Serialize};

use crate::orders::Order;

/// Fulfillment stage of an order. Wire values are the Spanish labels the
/// `Ventas` collection has always stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Status {
    #[default]
    #[serde(rename = "Pendiente")]
    Pending,
    #[serde(rename = "Faltante")]
    Missing,
    #[serde(rename = "Comprada")]
    Purchased,
    #[serde(rename = "Pagada")]
    Paid,
    #[serde(rename = "Bordada")]
    Embroidered,
    #[serde(rename = "Entregada")]
    Delivered,
}

impl Status {
    pub const ALL: &'static [Status] = &[
        Status::Pending,
        Status::Missing,
        Status::Purchased,
        Status::Paid,
        Status::Embroidered,
        Status::Delivered,
    ];

    /// Stored (and displayed) label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "Pendiente",
            Status::Missing => "Faltante",
            Status::Purchased => "Comprada",
            Status::Paid => "Pagada",
            Status::Embroidered => "Bordada",
            Status::Delivered => "Entregada",
        }
    }

    /// Parse a stored label. Returns `None` for anything unknown.
    pub fn parse(raw: &str) -> Option<Status> {
        Status::ALL.iter().copied().find(|s| s.as_str() == raw.trim())
    }

    /// Projection of this status onto the legacy flag set: exactly the one
    /// matching flag is true.
    pub fn as_flags(&self) -> LegacyFlags {
        LegacyFlags {
            missing: *self == Status::Missing,
            purchased: *self == Status::Purchased,
            paid: *self == Status::Paid,
            embroidered: *self == Status::Embroidered,
            delivered: *self == Status::Delivered,
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The five independent booleans predating `estado`. Not mutually exclusive
/// in storage; normalization collapses them by precedence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyFlags {
    #[serde(rename = "faltantes", default)]
    pub missing: bool,
    #[serde(rename = "compradas", default)]
    pub purchased: bool,
    #[serde(rename = "pagadas", default)]
    pub paid: bool,
    #[serde(rename = "bordada", default)]
    pub embroidered: bool,
    #[serde(rename = "entregada", default)]
    pub delivered: bool,
}

impl LegacyFlags {
    /// Collapse the flags into a single status, first match wins:
    /// entregada > bordada > pagadas > compradas > faltantes > Pendiente.
    pub fn derive_status(&self) -> Status {
        if self.delivered {
            Status::Delivered
        } else if self.embroidered {
            Status::Embroidered
        } else if self.paid {
            Status::Paid
        } else if self.purchased {
            Status::Purchased
        } else if self.missing {
            Status::Missing
        } else {
            Status::Pending
        }
    }
}

/// Row presentation for a status: highlight class plus the blink/pulse
/// attention flag for stages that need someone to act.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusStyle {
    pub color_class: &'static str,
    pub urgent: bool,
}

/// Fixed presentation table.
pub fn style_for(status: Status) -> StatusStyle {
    let color_class = match status {
        Status::Pending => "",
        Status::Missing => "bg-red-200",
        Status::Purchased => "bg-yellow-200",
        Status::Paid => "bg-blue-200",
        Status::Embroidered => "bg-purple-200",
        Status::Delivered => "bg-green-200",
    };
    StatusStyle {
        color_class,
        urgent: matches!(status, Status::Pending | Status::Missing),
    }
}

/// Return a copy of `order` with the new status and the recomputed flag
/// projection. This is the only place legacy flags are written.
pub fn apply_status_edit(order: &Order, status: Status) -> Order {
    let mut next = order.clone();
    next.status = status;
    next.flags = status.as_flags();
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_status_follows_precedence() {
        let flags = LegacyFlags {
            delivered: true,
            paid: true,
            ..Default::default()
        };
        assert_eq!(flags.derive_status(), Status::Delivered);

        let flags = LegacyFlags {
            embroidered: true,
            purchased: true,
            missing: true,
            ..Default::default()
        };
        assert_eq!(flags.derive_status(), Status::Embroidered);

        let flags = LegacyFlags {
            missing: true,
            ..Default::default()
        };
        assert_eq!(flags.derive_status(), Status::Missing);

        assert_eq!(LegacyFlags::default().derive_status(), Status::Pending);
    }

    #[test]
    fn apply_status_edit_rewrites_all_flags() {
        let mut order = Order::default();
        order.flags = LegacyFlags {
            missing: true,
            paid: true,
            embroidered: true,
            delivered: true,
            ..Default::default()
        };

        let edited = apply_status_edit(&order, Status::Purchased);
        assert_eq!(edited.status, Status::Purchased);
        assert!(edited.flags.purchased);
        assert!(!edited.flags.missing);
        assert!(!edited.flags.paid);
        assert!(!edited.flags.embroidered);
        assert!(!edited.flags.delivered);
        // Input untouched.
        assert!(order.flags.missing);
    }

    #[test]
    fn style_table_matches_status_colors() {
        assert_eq!(style_for(Status::Missing).color_class, "bg-red-200");
        assert_eq!(style_for(Status::Purchased).color_class, "bg-yellow-200");
        assert_eq!(style_for(Status::Paid).color_class, "bg-blue-200");
        assert_eq!(style_for(Status::Embroidered).color_class, "bg-purple-200");
        assert_eq!(style_for(Status::Delivered).color_class, "bg-green-200");
        assert_eq!(style_for(Status::Pending).color_class, "");
    }

    #[test]
    fn only_pending_and_missing_are_urgent() {
        for status in Status::ALL {
            let urgent = style_for(*status).urgent;
            assert_eq!(
                urgent,
                matches!(status, Status::Pending | Status::Missing),
                "status {status}"
            );
        }
    }

    #[test]
    fn parse_round_trips_labels() {
        for status in Status::ALL {
            assert_eq!(Status::parse(status.as_str()), Some(*status));
        }
        assert_eq!(Status::parse("Enviada"), None);
    }
}
