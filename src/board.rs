//! The order board: the in-memory working set behind the tracking table.
//!
//! Holds the loaded order list plus the per-session view state (search
//! term, status filter, sort, selection) and coordinates every mutation
//! against the document store. Writes are confirm-then-apply: the store
//! call succeeds first, then the in-memory list is updated to match, so a
//! failed write leaves the board unchanged.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};

use crate::analytics::{sales_report, SalesReport};
use crate::auth::AuthState;
use crate::clipboard::Clipboard;
use crate::error::Result;
use crate::orders::{normalize, Order, OrderDraft};
use crate::query::{self, payment_amount, SortConfig, SortKey, StatusFilter};
use crate::selection::{export_selected, SelectionSet};
use crate::status::{apply_status_edit, Status};
use crate::store::DocumentStore;

/// Collection holding one document per tracked order.
pub const ORDERS_COLLECTION: &str = "Ventas";

pub struct OrderBoard {
    store: Arc<dyn DocumentStore>,
    auth: Arc<AuthState>,
    orders: Vec<Order>,
    search_term: String,
    status_filter: StatusFilter,
    sort: SortConfig,
    selection: SelectionSet,
    loaded: bool,
}

impl OrderBoard {
    pub fn new(store: Arc<dyn DocumentStore>, auth: Arc<AuthState>) -> Self {
        Self {
            store,
            auth,
            orders: Vec::new(),
            search_term: String::new(),
            status_filter: StatusFilter::All,
            sort: SortConfig::default(),
            selection: SelectionSet::new(),
            loaded: false,
        }
    }

    /// Fetch and normalize the full collection. Requires a signed-in
    /// session; the store itself has no per-user scoping.
    pub async fn load(&mut self) -> Result<()> {
        self.auth.require_session()?;
        let documents = self.store.list_all(ORDERS_COLLECTION).await?;
        self.orders = documents.iter().map(normalize).collect();
        self.loaded = true;
        info!(count = self.orders.len(), "loaded order board");
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// The full normalized list, unfiltered.
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// The list as the table shows it: search, status filter, and the
    /// current sort applied.
    pub fn visible(&self) -> Vec<Order> {
        query::visible(&self.orders, &self.search_term, self.status_filter, &self.sort)
    }

    // -- view state ---------------------------------------------------------

    pub fn set_search(&mut self, term: &str) {
        self.search_term = term.to_string();
    }

    pub fn set_status_filter(&mut self, filter: StatusFilter) {
        self.status_filter = filter;
    }

    pub fn toggle_sort(&mut self, key: SortKey) {
        self.sort.toggle(key);
    }

    /// Toggle sort from a displayed column label; unknown labels are
    /// ignored.
    pub fn toggle_sort_label(&mut self, label: &str) {
        if let Some(key) = SortKey::from_label(label) {
            self.sort.toggle(key);
        }
    }

    pub fn sort(&self) -> SortConfig {
        self.sort
    }

    // -- mutations ----------------------------------------------------------

    /// Register a new order from the entry form, stamping the
    /// registration instant.
    pub async fn register(&mut self, draft: OrderDraft) -> Result<String> {
        self.auth.require_session()?;
        let registered_at = Utc::now().to_rfc3339();
        let mut fields = draft.to_fields();
        if let Some(map) = fields.as_object_mut() {
            map.insert("fechaRegistro".into(), json!(registered_at));
        }
        let id = self.store.create(ORDERS_COLLECTION, fields).await?;
        info!(%id, "registered order");
        self.orders.push(draft.into_order(&id, &registered_at));
        Ok(id)
    }

    /// Replace every editable field of an existing order with the draft.
    /// The registration stamp is preserved.
    pub async fn save_edit(&mut self, id: &str, draft: OrderDraft) -> Result<()> {
        self.auth.require_session()?;
        self.store
            .update(ORDERS_COLLECTION, id, draft.to_fields())
            .await?;
        if let Some(existing) = self.orders.iter_mut().find(|o| o.id == id) {
            let registered_at = existing.registered_at.clone();
            *existing = draft.into_order(id, &registered_at);
        }
        info!(%id, "saved order edit");
        Ok(())
    }

    /// Set only the status, keeping the legacy flag projection in sync.
    pub async fn set_status(&mut self, id: &str, status: Status) -> Result<()> {
        self.auth.require_session()?;
        let flags = status.as_flags();
        self.store
            .update(
                ORDERS_COLLECTION,
                id,
                json!({
                    "estado": status.as_str(),
                    "faltantes": flags.missing,
                    "compradas": flags.purchased,
                    "pagadas": flags.paid,
                    "bordada": flags.embroidered,
                    "entregada": flags.delivered,
                }),
            )
            .await?;
        if let Some(existing) = self.orders.iter_mut().find(|o| o.id == id) {
            *existing = apply_status_edit(existing, status);
        }
        info!(%id, status = status.as_str(), "updated order status");
        Ok(())
    }

    /// Delete an order and drop it from the selection set.
    pub async fn remove(&mut self, id: &str) -> Result<()> {
        self.auth.require_session()?;
        self.store.delete(ORDERS_COLLECTION, id).await?;
        self.orders.retain(|o| o.id != id);
        self.selection.remove(id);
        info!(%id, "deleted order");
        Ok(())
    }

    // -- selection and copy -------------------------------------------------

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn toggle_selected(&mut self, id: &str) {
        self.selection.toggle(id);
    }

    /// Select-all over the currently visible rows only.
    pub fn toggle_select_all(&mut self) {
        let visible = self.visible();
        self.selection
            .toggle_all(visible.iter().map(|o| o.id.as_str()));
    }

    /// Build the copy block for the selected visible rows and push it to
    /// the clipboard. A clipboard failure is logged but does not fail the
    /// call; the text is returned either way.
    pub fn copy_selected(&self, clipboard: &dyn Clipboard) -> Result<String> {
        let visible = self.visible();
        let text = export_selected(&visible, &self.selection)?;
        if let Err(err) = clipboard.write_text(&text) {
            warn!(%err, "clipboard write failed");
        }
        Ok(text)
    }

    // -- aggregates ---------------------------------------------------------

    /// Sum of the payment field over every loaded order, regardless of
    /// status. This is the entry page's running total, not revenue.
    pub fn running_total(&self) -> f64 {
        self.orders.iter().map(payment_amount).sum()
    }

    /// Sales figures over an optional inclusive date range.
    pub fn report(&self, start: Option<&str>, end: Option<&str>) -> SalesReport {
        sales_report(&self.orders, start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Session;
    use crate::clipboard::CaptureClipboard;
    use crate::orders::Brand;
    use crate::store::{MemoryStore, RawDocument};
    use chrono::Duration;

    fn signed_in() -> Arc<AuthState> {
        let auth = Arc::new(AuthState::new());
        auth.restore_session(Session {
            user_id: "uid-1".into(),
            email: "ana@taller.cr".into(),
            id_token: "token".into(),
            expires_at: Utc::now() + Duration::hours(1),
        });
        auth
    }

    fn seeded_store() -> Arc<MemoryStore> {
        let store = MemoryStore::new();
        store.seed(
            ORDERS_COLLECTION,
            vec![
                RawDocument {
                    id: "a".into(),
                    fields: json!({
                        "persona": "Ana",
                        "empresa": "Coopenae",
                        "pago": "4500",
                        "fechaPedido": "2025-01-10",
                        "colores": "Rojo",
                        "estado": "Pagada",
                    }),
                },
                RawDocument {
                    id: "b".into(),
                    // Legacy document, no estado field.
                    fields: json!({
                        "persona": "Luis",
                        "pago": "1200",
                        "fechaPedido": "2025-01-20",
                        "colores": "Azul",
                        "marca": "Columbia",
                        "talla": "L",
                        "genero": "Mujer",
                        "bordada": true,
                        "pagadas": true,
                    }),
                },
            ],
        );
        Arc::new(store)
    }

    async fn loaded_board() -> OrderBoard {
        let mut board = OrderBoard::new(seeded_store(), signed_in());
        board.load().await.expect("load");
        board
    }

    #[tokio::test]
    async fn load_requires_a_session() {
        let mut board = OrderBoard::new(seeded_store(), Arc::new(AuthState::new()));
        assert!(board.load().await.is_err());
        assert!(!board.is_loaded());
    }

    #[tokio::test]
    async fn load_normalizes_legacy_documents() {
        let board = loaded_board().await;
        assert_eq!(board.orders().len(), 2);
        let luis = &board.orders()[1];
        assert_eq!(luis.status, Status::Embroidered);
        assert_eq!(luis.brand, Brand::Columbia);
    }

    #[tokio::test]
    async fn register_stamps_and_appends() {
        let store = seeded_store();
        let mut board = OrderBoard::new(store.clone(), signed_in());
        board.load().await.expect("load");

        let draft = OrderDraft {
            requester: "Marta".into(),
            payment: "800".into(),
            ..Default::default()
        };
        let id = board.register(draft).await.expect("register");

        assert_eq!(board.orders().len(), 3);
        let added = board.orders().iter().find(|o| o.id == id).expect("added");
        assert_eq!(added.requester, "Marta");
        assert!(!added.registered_at.is_empty());

        let docs = store.list_all(ORDERS_COLLECTION).await.expect("list");
        let stored = docs.iter().find(|d| d.id == id).expect("stored");
        assert_eq!(stored.fields["persona"], "Marta");
        assert!(stored.fields["fechaRegistro"].as_str().is_some());
    }

    #[tokio::test]
    async fn save_edit_replaces_fields_but_keeps_the_stamp() {
        let store = Arc::new(MemoryStore::new());
        store.seed(
            ORDERS_COLLECTION,
            vec![RawDocument {
                id: "a".into(),
                fields: json!({
                    "persona": "Ana",
                    "fechaRegistro": "2025-01-01T08:00:00+00:00",
                }),
            }],
        );
        let mut board = OrderBoard::new(store, signed_in());
        board.load().await.expect("load");

        let draft = OrderDraft {
            requester: "Ana Maria".into(),
            status: Status::Purchased,
            ..Default::default()
        };
        board.save_edit("a", draft).await.expect("edit");

        let edited = &board.orders()[0];
        assert_eq!(edited.requester, "Ana Maria");
        assert_eq!(edited.status, Status::Purchased);
        assert_eq!(edited.registered_at, "2025-01-01T08:00:00+00:00");
    }

    #[tokio::test]
    async fn set_status_rewrites_the_flag_projection() {
        let store = seeded_store();
        let mut board = OrderBoard::new(store.clone(), signed_in());
        board.load().await.expect("load");

        board
            .set_status("b", Status::Delivered)
            .await
            .expect("set status");

        let luis = &board.orders()[1];
        assert_eq!(luis.status, Status::Delivered);
        assert!(luis.flags.delivered);
        assert!(!luis.flags.paid);

        let docs = store.list_all(ORDERS_COLLECTION).await.expect("list");
        let stored = docs.iter().find(|d| d.id == "b").expect("stored");
        assert_eq!(stored.fields["estado"], "Entregada");
        assert_eq!(stored.fields["entregada"], true);
        assert_eq!(stored.fields["pagadas"], false);
        // Untouched fields survive the partial update.
        assert_eq!(stored.fields["persona"], "Luis");
    }

    #[tokio::test]
    async fn remove_deletes_everywhere() {
        let store = seeded_store();
        let mut board = OrderBoard::new(store.clone(), signed_in());
        board.load().await.expect("load");
        board.toggle_selected("a");

        board.remove("a").await.expect("remove");

        assert_eq!(board.orders().len(), 1);
        assert!(!board.selection().is_selected("a"));
        assert_eq!(store.list_all(ORDERS_COLLECTION).await.expect("list").len(), 1);
    }

    #[tokio::test]
    async fn select_all_follows_the_visible_set() {
        let mut board = loaded_board().await;
        board.set_search("ana");
        board.toggle_select_all();

        assert!(board.selection().is_selected("a"));
        assert!(!board.selection().is_selected("b"));
    }

    #[tokio::test]
    async fn copy_selected_writes_the_export_block() {
        let mut board = loaded_board().await;
        board.toggle_selected("a");
        board.toggle_selected("b");

        let clipboard = CaptureClipboard::new();
        let text = board.copy_selected(&clipboard).expect("copy");
        assert_eq!(text, "Rojo,Okey,XS,Hombre\nAzul,Columbia,L,Mujer");
        assert_eq!(clipboard.last().as_deref(), Some(text.as_str()));
    }

    #[tokio::test]
    async fn copy_with_empty_selection_fails() {
        let board = loaded_board().await;
        let clipboard = CaptureClipboard::new();
        assert!(board.copy_selected(&clipboard).is_err());
        assert_eq!(clipboard.last(), None);
    }

    #[tokio::test]
    async fn running_total_counts_every_status() {
        let board = loaded_board().await;
        // 4500 (Paid) + 1200 (Embroidered).
        assert_eq!(board.running_total(), 5700.0);
    }

    #[tokio::test]
    async fn report_reflects_the_loaded_orders() {
        let board = loaded_board().await;
        let report = board.report(Some("2025-01-01"), Some("2025-01-31"));
        // Only "a" is Paid.
        assert_eq!(report.total_paid, 4500.0);
        assert_eq!(report.sizes.len(), 2);

        let all_time = board.report(None, None);
        assert_eq!(all_time.total_paid, 4500.0);
    }

    #[tokio::test]
    async fn sort_and_filter_shape_the_visible_list() {
        let mut board = loaded_board().await;
        board.toggle_sort_label("Pago");
        let visible = board.visible();
        assert_eq!(visible[0].id, "b"); // 1200 before 4500

        board.toggle_sort(SortKey::Payment); // flip to descending
        assert_eq!(board.visible()[0].id, "a");

        board.set_status_filter(StatusFilter::Only(Status::Paid));
        let paid_only = board.visible();
        assert_eq!(paid_only.len(), 1);
        assert_eq!(paid_only[0].id, "a");
    }
}
