use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use invoicefy_core::{AggregateId, AggregateRoot, TenantId, ValueObject};
use invoicefy_parties::{Customer, CustomerId};

use crate::error::InvoiceResult;
use crate::line_item::{LineItem, LineItemDraft};
use crate::money::{Percentage, Totals};
use crate::status::InvoiceStatus;
use crate::validation::ValidatedInvoice;

/// Invoice identifier (tenant-scoped via the `tenant_id` field).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceId(pub AggregateId);

impl InvoiceId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Customer details copied onto the invoice at each save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerSnapshot {
    #[serde(rename = "customer_name")]
    pub name: String,
    #[serde(rename = "customer_email", default)]
    pub email: Option<String>,
    #[serde(rename = "customer_phone", default)]
    pub phone: Option<String>,
    #[serde(rename = "customer_address", default)]
    pub address: Option<String>,
}

impl ValueObject for CustomerSnapshot {}

impl From<&Customer> for CustomerSnapshot {
    fn from(customer: &Customer) -> Self {
        Self {
            name: customer.name().to_string(),
            email: customer.contact().email.clone(),
            phone: customer.contact().phone.clone(),
            address: customer.contact().postal_line(),
        }
    }
}

/// Create/update payload as submitted by a client.
///
/// Totals are not part of the draft: the client's values are display-only and
/// unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceDraft {
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
    #[serde(default)]
    pub invoice_number: Option<String>,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub items: Vec<LineItemDraft>,
    #[serde(default)]
    pub discount_percentage: Decimal,
    #[serde(default)]
    pub tax_percentage: Decimal,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Aggregate root: Invoice.
///
/// Totals are only ever set from a [`ValidatedInvoice`], so the stored tuple
/// always matches the stored items and percentages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    id: InvoiceId,
    tenant_id: TenantId,
    customer_id: CustomerId,
    #[serde(flatten)]
    customer: CustomerSnapshot,
    invoice_number: String,
    invoice_date: NaiveDate,
    due_date: NaiveDate,
    items: Vec<LineItem>,
    discount_percentage: Percentage,
    tax_percentage: Percentage,
    #[serde(flatten)]
    totals: Totals,
    status: InvoiceStatus,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Invoice {
    /// Build a new `unpaid` invoice.
    pub fn create(
        tenant_id: TenantId,
        id: InvoiceId,
        invoice_number: String,
        validated: ValidatedInvoice,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            tenant_id,
            customer_id: validated.customer_id,
            customer: validated.customer,
            invoice_number,
            invoice_date: validated.invoice_date,
            due_date: validated.due_date,
            items: validated.priced.items,
            discount_percentage: validated.priced.discount_percentage,
            tax_percentage: validated.priced.tax_percentage,
            totals: validated.priced.totals,
            status: InvoiceStatus::Unpaid,
            notes: validated.notes,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whole-record update. Status is untouched; the invoice number is only
    /// replaced when the update supplies one.
    pub fn revise(&mut self, validated: ValidatedInvoice, now: DateTime<Utc>) {
        self.customer_id = validated.customer_id;
        self.customer = validated.customer;
        if let Some(number) = validated.invoice_number {
            self.invoice_number = number;
        }
        self.invoice_date = validated.invoice_date;
        self.due_date = validated.due_date;
        self.items = validated.priced.items;
        self.discount_percentage = validated.priced.discount_percentage;
        self.tax_percentage = validated.priced.tax_percentage;
        self.totals = validated.priced.totals;
        self.notes = validated.notes;
        self.updated_at = now;
    }

    /// Explicit status change. Monetary fields are never recomputed here; an
    /// unknown status leaves the invoice unchanged.
    pub fn set_status(&mut self, status: &str, now: DateTime<Utc>) -> InvoiceResult<InvoiceStatus> {
        let status: InvoiceStatus = status.parse()?;
        self.status = status;
        self.updated_at = now;
        Ok(status)
    }

    pub fn id_typed(&self) -> InvoiceId {
        self.id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn customer(&self) -> &CustomerSnapshot {
        &self.customer
    }

    pub fn invoice_number(&self) -> &str {
        &self.invoice_number
    }

    pub fn invoice_date(&self) -> NaiveDate {
        self.invoice_date
    }

    pub fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn discount_percentage(&self) -> Percentage {
        self.discount_percentage
    }

    pub fn tax_percentage(&self) -> Percentage {
        self.tax_percentage
    }

    pub fn totals(&self) -> &Totals {
        &self.totals
    }

    pub fn total(&self) -> Decimal {
        self.totals.total
    }

    pub fn status(&self) -> InvoiceStatus {
        self.status
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Record the version assigned by the store.
    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

impl AggregateRoot for Invoice {
    type Id = InvoiceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InvoiceError;
    use crate::validation::validate_for_save;
    use invoicefy_parties::{ContactInfo, CustomerDetails};

    fn test_customer(tenant_id: TenantId) -> Customer {
        Customer::register(
            tenant_id,
            CustomerId::new(AggregateId::new()),
            CustomerDetails {
                name: "Acme Traders".to_string(),
                contact: ContactInfo {
                    email: Some("accounts@acme.test".to_string()),
                    address: Some("4 Harbour Rd".to_string()),
                    city: Some("Kochi".to_string()),
                    ..ContactInfo::default()
                },
            },
            Utc::now(),
        )
        .unwrap()
    }

    fn test_draft(customer: &Customer) -> InvoiceDraft {
        InvoiceDraft {
            customer_id: Some(customer.id_typed()),
            invoice_number: None,
            invoice_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            items: vec![
                LineItemDraft {
                    name: "Design".to_string(),
                    quantity: Decimal::from(2),
                    unit_price: Some(Decimal::new(5000, 2)),
                    ..LineItemDraft::default()
                },
                LineItemDraft {
                    name: "Hosting".to_string(),
                    quantity: Decimal::ONE,
                    unit: Some("month".to_string()),
                    unit_price: Some(Decimal::new(25005, 3)),
                    ..LineItemDraft::default()
                },
            ],
            discount_percentage: Decimal::from(10),
            tax_percentage: Decimal::from(18),
            notes: Some("Thanks for your business".to_string()),
        }
    }

    fn test_invoice() -> Invoice {
        let tenant_id = TenantId::new();
        let customer = test_customer(tenant_id);
        let validated = validate_for_save(tenant_id, test_draft(&customer), Some(&customer)).unwrap();
        Invoice::create(
            tenant_id,
            InvoiceId::new(AggregateId::new()),
            "INV-000001".to_string(),
            validated,
            Utc::now(),
        )
    }

    #[test]
    fn create_starts_unpaid_with_server_side_totals() {
        let invoice = test_invoice();

        assert_eq!(invoice.status(), InvoiceStatus::Unpaid);
        assert_eq!(invoice.customer().name, "Acme Traders");
        assert_eq!(invoice.customer().address.as_deref(), Some("4 Harbour Rd, Kochi"));
        assert_eq!(invoice.totals().subtotal.to_string(), "125.01");
        assert_eq!(invoice.totals().discount_amount.to_string(), "12.50");
        assert_eq!(invoice.totals().tax_amount.to_string(), "20.25");
        assert_eq!(invoice.total().to_string(), "132.76");
    }

    #[test]
    fn set_status_never_touches_money() {
        let mut invoice = test_invoice();
        let totals = *invoice.totals();

        assert_eq!(invoice.set_status("paid", Utc::now()).unwrap(), InvoiceStatus::Paid);
        assert_eq!(invoice.status(), InvoiceStatus::Paid);
        assert_eq!(*invoice.totals(), totals);

        // Manual revert is allowed.
        invoice.set_status("unpaid", Utc::now()).unwrap();
        assert_eq!(invoice.status(), InvoiceStatus::Unpaid);
    }

    #[test]
    fn unknown_status_leaves_invoice_unchanged() {
        let mut invoice = test_invoice();
        invoice.set_status("overdue", Utc::now()).unwrap();
        let before = invoice.clone();

        let err = invoice.set_status("refunded", Utc::now()).unwrap_err();
        assert_eq!(err, InvoiceError::InvalidStatus("refunded".to_string()));
        assert_eq!(invoice, before);
    }

    #[test]
    fn revise_keeps_status_and_number_unless_given() {
        let mut invoice = test_invoice();
        invoice.set_status("paid", Utc::now()).unwrap();

        let customer = test_customer(invoice.tenant_id());
        let mut draft = test_draft(&customer);
        draft.items.truncate(1);
        draft.discount_percentage = Decimal::ZERO;
        draft.tax_percentage = Decimal::ZERO;
        let validated = validate_for_save(invoice.tenant_id(), draft, Some(&customer)).unwrap();
        invoice.revise(validated, Utc::now());

        assert_eq!(invoice.status(), InvoiceStatus::Paid);
        assert_eq!(invoice.invoice_number(), "INV-000001");
        assert_eq!(invoice.items().len(), 1);
        assert_eq!(invoice.total().to_string(), "100.00");
    }

    #[test]
    fn json_round_trip_preserves_every_field() {
        let mut invoice = test_invoice();
        invoice.set_version(3);

        let json = serde_json::to_value(&invoice).unwrap();
        assert_eq!(json["subtotal"], "125.01");
        assert_eq!(json["total"], "132.76");
        assert_eq!(json["items"][0]["amount"], "100.00");
        assert_eq!(json["status"], "unpaid");
        assert_eq!(json["customer_name"], "Acme Traders");
        assert_eq!(json["invoice_date"], "2024-03-01");

        let back: Invoice = serde_json::from_value(json).unwrap();
        assert_eq!(back, invoice);
        assert_eq!(back.totals().tax_amount.to_string(), "20.25");
        assert_eq!(back.version(), 3);
    }
}
