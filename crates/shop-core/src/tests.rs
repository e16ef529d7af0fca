use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use regex::Regex;
use shop_domain::{InvoiceItem, InvoiceNumber, InvoiceStatus, PartyRef, PaymentMethod};

use crate::{
    CompletedSale, CoreError, FixedClock, InMemoryInvoiceStore, InvoiceNumbering, InvoiceService,
    InvoiceStore, SaleLine,
};

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

fn service_at(now: DateTime<Utc>) -> (InvoiceService, Arc<InMemoryInvoiceStore>) {
    let store = Arc::new(InMemoryInvoiceStore::new());
    let service = InvoiceService::new(store.clone(), Arc::new(FixedClock(now)));
    (service, store)
}

fn haircut_sale() -> CompletedSale {
    let mut sale = CompletedSale::new(
        PartyRef::named("Marco"),
        PartyRef::named("Lucia"),
        vec![
            SaleLine::new("Haircut", 1, 18.0),
            SaleLine::new("Beard trim", 1, 9.5),
        ],
    );
    sale.tax = 2.5;
    sale.discount = 1.0;
    sale.payment_method = PaymentMethod::Cash;
    sale.completed_by = Some("marco".into());
    sale
}

#[test]
fn numbers_are_sequential_and_well_formed() {
    let (service, _) = service_at(at(2026, 5, 4));
    let pattern = Regex::new(r"^FAC-\d{4}-\d{5}$").unwrap();
    let numbers: Vec<String> = (0..3)
        .map(|_| {
            service
                .create_from_sale(haircut_sale())
                .unwrap()
                .invoice_number
                .to_string()
        })
        .collect();
    assert_eq!(
        numbers,
        vec!["FAC-2026-00001", "FAC-2026-00002", "FAC-2026-00003"]
    );
    assert!(numbers.iter().all(|n| pattern.is_match(n)));
}

#[test]
fn numbering_restarts_each_year() {
    let store = Arc::new(InMemoryInvoiceStore::new());
    let last_year = InvoiceService::new(store.clone(), Arc::new(FixedClock(at(2025, 12, 31))));
    last_year.create_from_sale(haircut_sale()).unwrap();
    last_year.create_from_sale(haircut_sale()).unwrap();

    let this_year = InvoiceService::new(store, Arc::new(FixedClock(at(2026, 1, 1))));
    let first = this_year.create_from_sale(haircut_sale()).unwrap();
    assert_eq!(first.invoice_number.to_string(), "FAC-2026-00001");
}

#[test]
fn created_invoice_carries_totals_and_sale_details() {
    let (service, store) = service_at(at(2026, 5, 4));
    let invoice = service.create_from_sale(haircut_sale()).unwrap();
    assert_eq!(invoice.subtotal, 27.5);
    assert_eq!(invoice.total, 29.0);
    assert_eq!(invoice.status, InvoiceStatus::Pending);
    assert_eq!(invoice.created_by.as_deref(), Some("marco"));
    assert_eq!(invoice.payment_method, PaymentMethod::Cash);
    let stored = store.get(invoice.id).unwrap().unwrap();
    assert_eq!(stored.invoice_number, invoice.invoice_number);
}

#[test]
fn rejected_sales_do_not_consume_numbers() {
    let (service, _) = service_at(at(2026, 5, 4));
    let empty = CompletedSale::new(PartyRef::named("Marco"), PartyRef::named("Lucia"), vec![]);
    let err = service.create_from_sale(empty).expect_err("no items");
    assert!(matches!(err, CoreError::Validation(_)));

    let invoice = service.create_from_sale(haircut_sale()).unwrap();
    assert_eq!(invoice.invoice_number.sequence(), 1);
}

#[test]
fn counter_seeds_from_existing_history() {
    let (seed, store) = service_at(at(2026, 2, 1));
    seed.create_from_sale(haircut_sale()).unwrap();
    let imported = {
        let mut invoice = seed.create_from_sale(haircut_sale()).unwrap();
        invoice.id = uuid::Uuid::new_v4();
        invoice.invoice_number = "FAC-2026-00040".parse().unwrap();
        invoice
    };
    let history = InMemoryInvoiceStore::with_invoices(vec![imported]);
    let service = InvoiceService::new(Arc::new(history), Arc::new(FixedClock(at(2026, 2, 2))));
    let next = service.create_from_sale(haircut_sale()).unwrap();
    assert_eq!(next.invoice_number.to_string(), "FAC-2026-00041");
    assert_eq!(store.list().unwrap().len(), 2);
}

#[test]
fn duplicate_numbers_are_rejected_by_the_store() {
    let (service, store) = service_at(at(2026, 5, 4));
    let invoice = service.create_from_sale(haircut_sale()).unwrap();
    let mut clash = invoice.clone();
    clash.id = uuid::Uuid::new_v4();
    let err = store.insert(&clash).expect_err("same number twice");
    match err {
        CoreError::DuplicateInvoiceNumber(number) => assert_eq!(number, "FAC-2026-00001"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn printing_n_times_counts_n() {
    let (service, _) = service_at(at(2026, 5, 4));
    let invoice = service.create_from_sale(haircut_sale()).unwrap();
    let mut last = invoice.clone();
    for _ in 0..4 {
        last = service.mark_as_printed(invoice.id, "reception").unwrap();
    }
    assert_eq!(last.print_info.print_count, 4);
    assert_eq!(last.status, InvoiceStatus::Printed);
    assert_eq!(last.print_info.last_printed_by.as_deref(), Some("reception"));
    assert!(last.print_info.first_printed_at.is_some());
}

#[test]
fn save_restores_totals_invariant() {
    let (service, store) = service_at(at(2026, 5, 4));
    let mut invoice = service.create_from_sale(haircut_sale()).unwrap();
    invoice.items.push(InvoiceItem::new("Shampoo", 2, 6.0));
    invoice.total = 0.0;
    service.save(&mut invoice).unwrap();

    let stored = store.get(invoice.id).unwrap().unwrap();
    let items_sum: f64 = stored.items.iter().map(|item| item.subtotal).sum();
    assert_eq!(stored.subtotal, items_sum);
    assert_eq!(stored.total, stored.subtotal + stored.tax - stored.discount);
    assert_eq!(stored.total, 41.0);
}

#[test]
fn printed_invoices_cannot_change_items() {
    let (service, _) = service_at(at(2026, 5, 4));
    let invoice = service.create_from_sale(haircut_sale()).unwrap();
    service.mark_as_printed(invoice.id, "reception").unwrap();
    let err = service
        .replace_items(invoice.id, vec![InvoiceItem::new("Haircut", 1, 1.0)])
        .expect_err("printed invoices are frozen");
    assert!(matches!(err, CoreError::InvalidOperation(_)));
}

#[test]
fn cancel_requires_reason_and_records_note() {
    let (service, _) = service_at(at(2026, 5, 4));
    let invoice = service.create_from_sale(haircut_sale()).unwrap();
    assert!(matches!(
        service.cancel(invoice.id, "   "),
        Err(CoreError::Validation(_))
    ));
    let cancelled = service.cancel(invoice.id, "client left").unwrap();
    assert_eq!(cancelled.status, InvoiceStatus::Cancelled);
    assert_eq!(cancelled.notes.len(), 1);
    assert_eq!(cancelled.notes[0].reason, "client left");

    let err = service.refund(invoice.id, "too late").expect_err("cancelled");
    assert!(matches!(err, CoreError::InvalidOperation(_)));
}

#[test]
fn lookups_by_number_and_status() {
    let (service, _) = service_at(at(2026, 5, 4));
    let first = service.create_from_sale(haircut_sale()).unwrap();
    let second = service.create_from_sale(haircut_sale()).unwrap();
    service.mark_as_printed(second.id, "reception").unwrap();

    let found = service.find_by_number("FAC-2026-00001").unwrap();
    assert_eq!(found.id, first.id);
    assert!(matches!(
        service.find_by_number("FAC-2026-00099"),
        Err(CoreError::InvoiceNotFound(_))
    ));
    assert!(matches!(
        service.find_by_number("not-a-number"),
        Err(CoreError::Validation(_))
    ));

    let printed = service.list_by_status(InvoiceStatus::Printed).unwrap();
    assert_eq!(printed.len(), 1);
    assert_eq!(printed[0].id, second.id);
    assert_eq!(service.list_for_year(2026).unwrap().len(), 2);
    assert!(service.list_for_year(2025).unwrap().is_empty());
}

#[test]
fn custom_numbering_policy_is_used() {
    let (service, _) = service_at(at(2026, 5, 4));
    let service = service.with_numbering(InvoiceNumbering::new("BAR", 3).unwrap());
    let invoice = service.create_from_sale(haircut_sale()).unwrap();
    assert_eq!(invoice.invoice_number, InvoiceNumber::new("BAR", 2026, 1).with_width(3));
    assert_eq!(invoice.invoice_number.to_string(), "BAR-2026-001");
}

#[test]
fn prefix_change_mid_year_keeps_earlier_series_listed() {
    let (service, store) = service_at(at(2026, 5, 4));
    let old = service.create_from_sale(haircut_sale()).unwrap();

    let service = InvoiceService::new(store, Arc::new(FixedClock(at(2026, 6, 1))))
        .with_numbering(InvoiceNumbering::new("BAR", 3).unwrap());
    let new = service.create_from_sale(haircut_sale()).unwrap();
    assert_eq!(new.invoice_number.to_string(), "BAR-2026-001");

    let numbers: Vec<String> = service
        .list_for_year(2026)
        .unwrap()
        .iter()
        .map(|invoice| invoice.invoice_number.to_string())
        .collect();
    assert_eq!(numbers, vec!["BAR-2026-001", "FAC-2026-00001"]);

    let fac = service.list_series("FAC", 2026).unwrap();
    assert_eq!(fac.len(), 1);
    assert_eq!(fac[0].id, old.id);
    assert!(service.list_series("BAR", 2025).unwrap().is_empty());
}

#[test]
fn invoices_serialize_with_string_numbers() {
    let (service, _) = service_at(at(2026, 5, 4));
    let invoice = service.create_from_sale(haircut_sale()).unwrap();
    let json = serde_json::to_value(&invoice).unwrap();
    assert_eq!(json["invoice_number"], "FAC-2026-00001");
    assert_eq!(json["status"], "Pending");
}
