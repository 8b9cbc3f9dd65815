//! Invoice workflows: create, update, status changes, preview and statistics.
//!
//! Every write re-derives line amounts and totals from the submitted items
//! (`validate_for_save`) and persists the invoice in one document write, so
//! the stored totals always match the stored items.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::instrument;

use invoicefy_core::{AggregateId, AggregateRoot, ExpectedVersion, TenantId};
use invoicefy_invoicing::{
    INVOICE_NUMBER_SEQUENCE, Invoice, InvoiceDraft, InvoiceError, InvoiceId, InvoiceResult, InvoiceStats,
    LineItemDraft, PricedItems, format_invoice_number, price_items, validate_for_save,
};
use invoicefy_parties::Customer;
use invoicefy_products::Product;

use crate::store::{DocumentStore, Repository, StoreError};

#[derive(Clone)]
pub struct InvoiceService {
    store: Arc<dyn DocumentStore>,
    invoices: Repository<Invoice>,
    customers: Repository<Customer>,
    products: Repository<Product>,
}

/// Map a store failure; `Duplicate` is handled by the caller.
fn store_failure(err: StoreError) -> InvoiceError {
    match err {
        StoreError::NotFound => InvoiceError::NotFound,
        StoreError::Conflict(msg) => InvoiceError::ConflictingUpdate(msg),
        other => {
            tracing::error!(error = %other, "invoice storage failure");
            InvoiceError::storage(other.to_string())
        }
    }
}

/// Map a write failure; a unique-key clash means the number is taken.
fn write_failure(err: StoreError, invoice_number: &str) -> InvoiceError {
    match err {
        StoreError::Duplicate(_) => InvoiceError::DuplicateInvoiceNumber(invoice_number.to_string()),
        other => store_failure(other),
    }
}

fn rejected(err: InvoiceError) -> InvoiceError {
    tracing::debug!(error = %err, "invoice rejected");
    err
}

impl InvoiceService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            invoices: Repository::new(store.clone()),
            customers: Repository::new(store.clone()),
            products: Repository::new(store.clone()),
            store,
        }
    }

    /// Newest first.
    pub async fn list(&self, tenant_id: TenantId) -> InvoiceResult<Vec<Invoice>> {
        let mut invoices = self.invoices.list(tenant_id).await.map_err(store_failure)?;
        invoices.reverse();
        Ok(invoices)
    }

    pub async fn get(&self, tenant_id: TenantId, id: InvoiceId) -> InvoiceResult<Invoice> {
        self.invoices
            .get(tenant_id, id.0)
            .await
            .map_err(store_failure)?
            .ok_or(InvoiceError::NotFound)
    }

    /// Price a draft without saving it. No customer is required.
    pub async fn preview(
        &self,
        tenant_id: TenantId,
        mut items: Vec<LineItemDraft>,
        discount_percentage: Decimal,
        tax_percentage: Decimal,
    ) -> InvoiceResult<PricedItems> {
        self.populate_items(tenant_id, &mut items).await?;
        price_items(items, discount_percentage, tax_percentage).map_err(rejected)
    }

    #[instrument(skip(self, draft), fields(tenant_id = %tenant_id))]
    pub async fn create(&self, tenant_id: TenantId, mut draft: InvoiceDraft) -> InvoiceResult<Invoice> {
        self.populate_items(tenant_id, &mut draft.items).await?;
        let customer = self.find_customer(tenant_id, &draft).await?;
        let validated = validate_for_save(tenant_id, draft, customer.as_ref()).map_err(rejected)?;

        let invoice_number = match validated.invoice_number.clone() {
            Some(number) => number,
            None => {
                let next = self
                    .store
                    .next_sequence(tenant_id, INVOICE_NUMBER_SEQUENCE)
                    .await
                    .map_err(store_failure)?;
                format_invoice_number(next)
            }
        };

        let invoice = Invoice::create(
            tenant_id,
            InvoiceId::new(AggregateId::new()),
            invoice_number,
            validated,
            Utc::now(),
        );
        let stored = self
            .invoices
            .insert(&invoice)
            .await
            .map_err(|e| write_failure(e, invoice.invoice_number()))?;

        tracing::info!(
            invoice_id = %stored.id_typed(),
            invoice_number = stored.invoice_number(),
            total = %stored.total(),
            "invoice created"
        );
        Ok(stored)
    }

    /// Whole-record update. Status is kept; totals are recomputed.
    #[instrument(skip(self, draft), fields(tenant_id = %tenant_id, invoice_id = %id))]
    pub async fn update(
        &self,
        tenant_id: TenantId,
        id: InvoiceId,
        mut draft: InvoiceDraft,
        expected: ExpectedVersion,
    ) -> InvoiceResult<Invoice> {
        let mut invoice = self.get(tenant_id, id).await?;
        if !expected.matches(invoice.version()) {
            return Err(rejected(InvoiceError::ConflictingUpdate(format!(
                "expected {expected:?}, found version {}",
                invoice.version()
            ))));
        }

        self.populate_items(tenant_id, &mut draft.items).await?;
        let customer = self.find_customer(tenant_id, &draft).await?;
        let validated = validate_for_save(tenant_id, draft, customer.as_ref()).map_err(rejected)?;
        invoice.revise(validated, Utc::now());

        let stored = self
            .invoices
            .replace(&invoice, expected)
            .await
            .map_err(|e| write_failure(e, invoice.invoice_number()))?;
        tracing::info!(version = stored.version(), total = %stored.total(), "invoice updated");
        Ok(stored)
    }

    /// Narrow update of the status field. Monetary fields are not rewritten.
    #[instrument(skip(self), fields(tenant_id = %tenant_id, invoice_id = %id))]
    pub async fn set_status(
        &self,
        tenant_id: TenantId,
        id: InvoiceId,
        status: &str,
        expected: ExpectedVersion,
    ) -> InvoiceResult<Invoice> {
        let mut invoice = self.get(tenant_id, id).await?;
        let status = invoice.set_status(status, Utc::now()).map_err(rejected)?;

        let stored = self
            .invoices
            .patch(&invoice, &["status", "updated_at"], expected)
            .await
            .map_err(store_failure)?;
        tracing::info!(status = %status, version = stored.version(), "invoice status changed");
        Ok(stored)
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, invoice_id = %id))]
    pub async fn delete(&self, tenant_id: TenantId, id: InvoiceId) -> InvoiceResult<()> {
        if !self.invoices.delete(tenant_id, id.0).await.map_err(store_failure)? {
            return Err(InvoiceError::NotFound);
        }
        tracing::info!("invoice deleted");
        Ok(())
    }

    pub async fn stats(&self, tenant_id: TenantId) -> InvoiceResult<InvoiceStats> {
        let invoices = self.invoices.list(tenant_id).await.map_err(store_failure)?;
        InvoiceStats::from_invoices(&invoices).inspect_err(|e| {
            tracing::warn!(tenant_id = %tenant_id, error = %e, "dashboard stats out of range");
        })
    }

    async fn find_customer(&self, tenant_id: TenantId, draft: &InvoiceDraft) -> InvoiceResult<Option<Customer>> {
        let Some(customer_id) = draft.customer_id else {
            return Ok(None);
        };
        self.customers.get(tenant_id, customer_id.0).await.map_err(store_failure)
    }

    /// Copy catalog data into items that reference a product.
    async fn populate_items(&self, tenant_id: TenantId, items: &mut [LineItemDraft]) -> InvoiceResult<()> {
        for (index, item) in items.iter_mut().enumerate() {
            let Some(product_id) = item.product_id else {
                continue;
            };
            let product = self
                .products
                .get(tenant_id, product_id.0)
                .await
                .map_err(store_failure)?
                .ok_or_else(|| rejected(InvoiceError::invalid_item(index, "product not found")))?;
            item.populate_from(&product);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryDocumentStore;
    use chrono::NaiveDate;
    use invoicefy_invoicing::InvoiceStatus;
    use invoicefy_parties::{CustomerDetails, CustomerId};
    use invoicefy_products::{ProductDetails, ProductId};

    struct Fixture {
        service: InvoiceService,
        tenant: TenantId,
        customer: Customer,
        store: Arc<dyn DocumentStore>,
    }

    async fn fixture() -> Fixture {
        let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
        let tenant = TenantId::new();
        let customer = Customer::register(
            tenant,
            CustomerId::new(AggregateId::new()),
            CustomerDetails {
                name: "Globex".into(),
                ..CustomerDetails::default()
            },
            Utc::now(),
        )
        .unwrap();
        let customer = Repository::new(store.clone()).insert(&customer).await.unwrap();
        Fixture {
            service: InvoiceService::new(store.clone()),
            tenant,
            customer,
            store,
        }
    }

    fn item(quantity: i64, unit_price: Decimal) -> LineItemDraft {
        LineItemDraft {
            name: "Widget".into(),
            quantity: Decimal::from(quantity),
            unit_price: Some(unit_price),
            ..LineItemDraft::default()
        }
    }

    fn draft(customer: &Customer, items: Vec<LineItemDraft>) -> InvoiceDraft {
        InvoiceDraft {
            customer_id: Some(customer.id_typed()),
            invoice_number: None,
            invoice_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            items,
            discount_percentage: Decimal::from(10),
            tax_percentage: Decimal::from(10),
            notes: None,
        }
    }

    #[tokio::test]
    async fn create_assigns_sequential_numbers_and_totals() {
        let f = fixture().await;

        let first = f
            .service
            .create(f.tenant, draft(&f.customer, vec![item(1, Decimal::from(100))]))
            .await
            .unwrap();
        let second = f
            .service
            .create(f.tenant, draft(&f.customer, vec![item(2, Decimal::from(100))]))
            .await
            .unwrap();

        assert_eq!(first.invoice_number(), "INV-000001");
        assert_eq!(second.invoice_number(), "INV-000002");
        assert_eq!(first.status(), InvoiceStatus::Unpaid);
        assert_eq!(first.totals().discount_amount.to_string(), "10.00");
        assert_eq!(first.totals().tax_amount.to_string(), "9.00");
        assert_eq!(first.total().to_string(), "99.00");
        assert_eq!(first.customer().name, "Globex");

        let listed = f.service.list(f.tenant).await.unwrap();
        assert_eq!(listed[0].id_typed(), second.id_typed());
    }

    #[tokio::test]
    async fn empty_invoice_is_not_saved() {
        let f = fixture().await;
        let err = f.service.create(f.tenant, draft(&f.customer, vec![])).await.unwrap_err();
        assert_eq!(err, InvoiceError::EmptyItems);
        assert!(f.service.list(f.tenant).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn customer_of_another_tenant_is_missing() {
        let f = fixture().await;
        let err = f
            .service
            .create(TenantId::new(), draft(&f.customer, vec![item(1, Decimal::ONE)]))
            .await
            .unwrap_err();
        assert_eq!(err, InvoiceError::MissingCustomer);
    }

    #[tokio::test]
    async fn supplied_number_must_be_unique_per_tenant() {
        let f = fixture().await;
        let mut numbered = draft(&f.customer, vec![item(1, Decimal::ONE)]);
        numbered.invoice_number = Some(" 2024/001 ".into());

        let created = f.service.create(f.tenant, numbered.clone()).await.unwrap();
        assert_eq!(created.invoice_number(), "2024/001");

        let err = f.service.create(f.tenant, numbered).await.unwrap_err();
        assert_eq!(err, InvoiceError::DuplicateInvoiceNumber("2024/001".into()));
    }

    #[tokio::test]
    async fn items_are_populated_from_the_catalog() {
        let f = fixture().await;
        let product = Product::create(
            f.tenant,
            ProductId::new(AggregateId::new()),
            ProductDetails {
                name: "Consulting hour".into(),
                description: None,
                price: Decimal::new(2500, 2),
                unit: Some("hr".into()),
                sku: None,
            },
            Utc::now(),
        )
        .unwrap();
        Repository::new(f.store.clone()).insert(&product).await.unwrap();

        let from_catalog = LineItemDraft {
            product_id: Some(product.id_typed()),
            quantity: Decimal::from(2),
            ..LineItemDraft::default()
        };
        let invoice = f
            .service
            .create(f.tenant, draft(&f.customer, vec![from_catalog]))
            .await
            .unwrap();
        assert_eq!(invoice.items()[0].name(), "Consulting hour");
        assert_eq!(invoice.items()[0].unit(), "hr");
        assert_eq!(invoice.totals().subtotal.to_string(), "50.00");

        let unknown = LineItemDraft {
            product_id: Some(ProductId::new(AggregateId::new())),
            quantity: Decimal::ONE,
            ..LineItemDraft::default()
        };
        let err = f
            .service
            .create(f.tenant, draft(&f.customer, vec![unknown]))
            .await
            .unwrap_err();
        assert_eq!(err, InvoiceError::invalid_item(0, "product not found"));
    }

    #[tokio::test]
    async fn update_recomputes_totals_and_keeps_status() {
        let f = fixture().await;
        let created = f
            .service
            .create(f.tenant, draft(&f.customer, vec![item(1, Decimal::from(100))]))
            .await
            .unwrap();
        f.service
            .set_status(f.tenant, created.id_typed(), "paid", ExpectedVersion::Any)
            .await
            .unwrap();

        let updated = f
            .service
            .update(
                f.tenant,
                created.id_typed(),
                draft(&f.customer, vec![item(2, Decimal::from(50)), item(1, Decimal::new(25005, 3))]),
                ExpectedVersion::Exact(2),
            )
            .await
            .unwrap();

        assert_eq!(updated.status(), InvoiceStatus::Paid);
        assert_eq!(updated.totals().subtotal.to_string(), "125.01");
        assert_eq!(updated.invoice_number(), created.invoice_number());
        assert_eq!(updated.version(), 3);
    }

    #[tokio::test]
    async fn stale_update_conflicts() {
        let f = fixture().await;
        let created = f
            .service
            .create(f.tenant, draft(&f.customer, vec![item(1, Decimal::ONE)]))
            .await
            .unwrap();
        f.service
            .set_status(f.tenant, created.id_typed(), "paid", ExpectedVersion::Exact(1))
            .await
            .unwrap();

        let err = f
            .service
            .set_status(f.tenant, created.id_typed(), "overdue", ExpectedVersion::Exact(1))
            .await
            .unwrap_err();
        assert!(matches!(err, InvoiceError::ConflictingUpdate(_)));

        let err = f
            .service
            .update(
                f.tenant,
                created.id_typed(),
                draft(&f.customer, vec![item(1, Decimal::ONE)]),
                ExpectedVersion::Exact(1),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, InvoiceError::ConflictingUpdate(_)));
    }

    #[tokio::test]
    async fn unknown_status_leaves_invoice_unchanged() {
        let f = fixture().await;
        let created = f
            .service
            .create(f.tenant, draft(&f.customer, vec![item(1, Decimal::ONE)]))
            .await
            .unwrap();

        let err = f
            .service
            .set_status(f.tenant, created.id_typed(), "refunded", ExpectedVersion::Any)
            .await
            .unwrap_err();
        assert_eq!(err, InvoiceError::InvalidStatus("refunded".into()));

        let reloaded = f.service.get(f.tenant, created.id_typed()).await.unwrap();
        assert_eq!(reloaded.status(), InvoiceStatus::Unpaid);
        assert_eq!(reloaded.version(), 1);
    }

    #[tokio::test]
    async fn stats_and_delete() {
        let f = fixture().await;
        let paid = f
            .service
            .create(f.tenant, draft(&f.customer, vec![item(1, Decimal::from(100))]))
            .await
            .unwrap();
        f.service
            .create(f.tenant, draft(&f.customer, vec![item(2, Decimal::from(100))]))
            .await
            .unwrap();
        f.service
            .set_status(f.tenant, paid.id_typed(), "paid", ExpectedVersion::Any)
            .await
            .unwrap();

        let stats = f.service.stats(f.tenant).await.unwrap();
        assert_eq!(stats.total_invoices, 2);
        assert_eq!(stats.paid_revenue.to_string(), "99.00");
        assert_eq!(stats.unpaid_revenue.to_string(), "198.00");

        f.service.delete(f.tenant, paid.id_typed()).await.unwrap();
        assert_eq!(
            f.service.delete(f.tenant, paid.id_typed()).await.unwrap_err(),
            InvoiceError::NotFound
        );
    }

    #[tokio::test]
    async fn preview_needs_no_customer() {
        let f = fixture().await;
        let priced = f
            .service
            .preview(f.tenant, vec![item(1, Decimal::from(100))], Decimal::ZERO, Decimal::from(18))
            .await
            .unwrap();
        assert_eq!(priced.totals.total.to_string(), "118.00");
        assert!(f.service.list(f.tenant).await.unwrap().is_empty());
    }
}
