//! Jurnal resource table
//!
//! Every stream this source can extract, in the order a run processes them.

use crate::connectors::metadata::{FieldKind, FieldSpec, ResourceDefinition};

use FieldKind::{Array, Boolean, Date, Decimal, Id, Integer, Object, String};

pub const ACTIVE_COMPANY: &str = "active_company";

static ACTIVE_COMPANY_FIELDS: &[FieldSpec] = &[FieldSpec::new("id", Id)];

static ACCOUNT_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("id", Id),
    FieldSpec::new("name", String),
    FieldSpec::new("number", String),
    FieldSpec::new("category", String),
    FieldSpec::new("category_id", Id),
    FieldSpec::new("balance_amount", Decimal),
    FieldSpec::new("is_parent", Boolean),
    FieldSpec::new("archive", Boolean),
];

static JOURNAL_ENTRY_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("id", Id),
    FieldSpec::new("transaction_no", String),
    FieldSpec::new("transaction_date", Date),
    FieldSpec::new("memo", String),
    FieldSpec::new("total_debit", Decimal),
    FieldSpec::new("total_credit", Decimal),
    FieldSpec::new("transaction_account_lines", Array),
];

static VENDOR_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("id", Id),
    FieldSpec::new("display_name", String),
    FieldSpec::new("email", String),
    FieldSpec::new("phone", String),
    FieldSpec::new("billing_address", String),
    FieldSpec::new("tax_no", String),
    FieldSpec::new("archive", Boolean),
];

static EXPENSE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("id", Id),
    FieldSpec::new("transaction_no", String),
    FieldSpec::new("transaction_date", Date),
    FieldSpec::new("due_date", Date),
    FieldSpec::new("person", Object),
    FieldSpec::new("memo", String),
    FieldSpec::new("transaction_status", Object),
    FieldSpec::new("original_amount", Decimal),
    FieldSpec::new("remaining", Decimal),
];

static INVOICE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("id", Id),
    FieldSpec::new("transaction_no", String),
    FieldSpec::new("transaction_date", Date),
    FieldSpec::new("due_date", Date),
    FieldSpec::new("person", Object),
    FieldSpec::new("memo", String),
    FieldSpec::new("transaction_status", Object),
    FieldSpec::new("subtotal", Decimal),
    FieldSpec::new("original_amount", Decimal),
    FieldSpec::new("remaining", Decimal),
    FieldSpec::new("currency_code", String),
    FieldSpec::new("term_id", Integer),
];

/// All resources, in declaration order.
pub static RESOURCES: &[ResourceDefinition] = &[
    ResourceDefinition {
        name: ACTIVE_COMPANY,
        path: "companies/active",
        records_key: Some("company"),
        primary_key: Some("id"),
        fields: ACTIVE_COMPANY_FIELDS,
    },
    ResourceDefinition {
        name: "accounts",
        path: "accounts",
        records_key: Some("accounts"),
        primary_key: Some("id"),
        fields: ACCOUNT_FIELDS,
    },
    ResourceDefinition {
        name: "journal_entries",
        path: "journal_entries",
        records_key: Some("journal_entries"),
        primary_key: Some("id"),
        fields: JOURNAL_ENTRY_FIELDS,
    },
    ResourceDefinition {
        name: "vendors",
        path: "vendors",
        records_key: Some("vendors"),
        primary_key: Some("id"),
        fields: VENDOR_FIELDS,
    },
    ResourceDefinition {
        name: "expenses",
        path: "expenses",
        records_key: Some("expenses"),
        primary_key: Some("id"),
        fields: EXPENSE_FIELDS,
    },
    ResourceDefinition {
        name: "purchase_invoices",
        path: "purchase_invoices",
        records_key: Some("purchase_invoices"),
        primary_key: Some("id"),
        fields: INVOICE_FIELDS,
    },
    ResourceDefinition {
        name: "sales_invoices",
        path: "sales_invoices",
        records_key: Some("sales_invoices"),
        primary_key: Some("id"),
        fields: INVOICE_FIELDS,
    },
];
