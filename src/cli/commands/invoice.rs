use chrono::Datelike;
use shop_core::{CompletedSale, PrintableInvoice, PrintableInvoiceExt, SaleLine};
use shop_domain::{Invoice, InvoiceStatus, PartyRef, PaymentMethod};

use crate::cli::{
    output,
    registry::CommandDefinition,
    shell_context::{CommandError, CommandResult, ShellContext},
};

use super::{parse_amount, ParsedArgs};

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "invoice-new",
            "Issue an invoice for a completed sale",
            "invoice-new <barber> <client> <description:quantity:price>... [--tax N] [--discount N] [--pay cash|card|transfer] [--by user]",
            cmd_invoice_new,
        ),
        CommandDefinition::new(
            "invoice-print",
            "Print a receipt and record the print",
            "invoice-print <number> [--by user]",
            cmd_invoice_print,
        ),
        CommandDefinition::new(
            "invoice-show",
            "Show an invoice without recording a print",
            "invoice-show <number> [--format text|json]",
            cmd_invoice_show,
        ),
        CommandDefinition::new(
            "invoice-cancel",
            "Cancel an invoice with a reason",
            "invoice-cancel <number> <reason>",
            cmd_invoice_cancel,
        ),
        CommandDefinition::new(
            "invoice-refund",
            "Refund a pending or printed invoice",
            "invoice-refund <number> <reason>",
            cmd_invoice_refund,
        ),
        CommandDefinition::new(
            "invoice-list",
            "List invoices of a year",
            "invoice-list [year] [--prefix FAC] [--status pending|printed|cancelled|refunded]",
            cmd_invoice_list,
        ),
        CommandDefinition::new(
            "invoice-backup",
            "Back up the invoice file",
            "invoice-backup [note]",
            cmd_invoice_backup,
        ),
        CommandDefinition::new(
            "invoice-backups",
            "List invoice backups, newest first",
            "invoice-backups",
            cmd_invoice_backups,
        ),
    ]
}

fn cmd_invoice_new(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &["tax", "discount", "pay", "by"])?;
    let [barber, client, items @ ..] = parsed.positional.as_slice() else {
        return Err(usage("invoice-new"));
    };
    if items.is_empty() {
        return Err(CommandError::InvalidArguments(
            "at least one item `description:quantity:price` is required".into(),
        ));
    }
    let lines = items
        .iter()
        .map(|raw| parse_sale_line(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let mut sale = CompletedSale::new(PartyRef::named(*barber), PartyRef::named(*client), lines);
    sale.tax = parsed.f64_option("tax")?.unwrap_or(0.0);
    sale.discount = parsed.f64_option("discount")?.unwrap_or(0.0);
    if let Some(method) = parsed.option("pay") {
        sale.payment_method = PaymentMethod::parse(method);
    }
    sale.completed_by = Some(
        parsed
            .option("by")
            .map(str::to_string)
            .unwrap_or_else(|| context.operator.clone()),
    );

    let invoice = context.app.invoices.create_from_sale(sale)?;
    output::success(format!(
        "Created invoice {} for {}: total {}",
        invoice.invoice_number,
        invoice.client.name,
        money(context, invoice.total)
    ));
    Ok(())
}

/// Parses `description:quantity:price`; the description may itself contain `:`.
fn parse_sale_line(raw: &str) -> Result<SaleLine, CommandError> {
    let mut parts = raw.rsplitn(3, ':');
    let (Some(price), Some(quantity), Some(description)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(CommandError::InvalidArguments(format!(
            "item `{raw}` must look like description:quantity:price"
        )));
    };
    let quantity = quantity.trim().parse::<u32>().map_err(|_| {
        CommandError::InvalidArguments(format!("invalid quantity `{quantity}` in `{raw}`"))
    })?;
    let unit_price = parse_amount(price, "price")?;
    Ok(SaleLine::new(description.trim(), quantity, unit_price))
}

fn cmd_invoice_print(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &["by"])?;
    let [number] = parsed.positional.as_slice() else {
        return Err(usage("invoice-print"));
    };
    let invoice = context.app.invoices.find_by_number(number)?;
    // Rendered before recording, so only reprints carry the copy mark.
    let view = invoice.format_for_print(&context.app.print_context());
    let user = parsed
        .option("by")
        .map(str::to_string)
        .unwrap_or_else(|| context.operator.clone());
    let printed = context.app.invoices.mark_as_printed(invoice.id, &user)?;
    render_receipt(&view);
    output::success(format!(
        "Printed {} (print #{})",
        printed.invoice_number, printed.print_info.print_count
    ));
    Ok(())
}

fn cmd_invoice_show(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &["format"])?;
    let [number] = parsed.positional.as_slice() else {
        return Err(usage("invoice-show"));
    };
    let invoice = context.app.invoices.find_by_number(number)?;
    let view = invoice.format_for_print(&context.app.print_context());
    match parsed.option("format").unwrap_or("text") {
        "json" => output::info(serde_json::to_string_pretty(&view)?),
        "text" => render_receipt(&view),
        other => {
            return Err(CommandError::InvalidArguments(format!(
                "unknown format `{other}` (use text or json)"
            )))
        }
    }
    Ok(())
}

fn cmd_invoice_cancel(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (number, reason) = number_and_reason(args, "invoice-cancel")?;
    let invoice = context.app.invoices.find_by_number(number)?;
    let cancelled = context.app.invoices.cancel(invoice.id, &reason)?;
    output::success(format!("Cancelled {}.", cancelled.invoice_number));
    Ok(())
}

fn cmd_invoice_refund(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (number, reason) = number_and_reason(args, "invoice-refund")?;
    let invoice = context.app.invoices.find_by_number(number)?;
    let refunded = context.app.invoices.refund(invoice.id, &reason)?;
    output::success(format!(
        "Refunded {} ({}).",
        refunded.invoice_number,
        money(context, refunded.total)
    ));
    Ok(())
}

fn cmd_invoice_list(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let parsed = ParsedArgs::parse(args, &["status", "prefix"])?;
    let year = match parsed.positional.as_slice() {
        [] => context.app.invoices.clock().now().year(),
        [raw] => raw
            .parse::<i32>()
            .map_err(|_| CommandError::InvalidArguments(format!("invalid year `{raw}`")))?,
        _ => return Err(usage("invoice-list")),
    };
    let status = parsed.option("status").map(parse_status).transpose()?;

    let listed = match parsed.option("prefix") {
        Some(prefix) => context.app.invoices.list_series(prefix, year)?,
        None => context.app.invoices.list_for_year(year)?,
    };
    let invoices: Vec<Invoice> = listed
        .into_iter()
        .filter(|invoice| status.as_ref().map_or(true, |wanted| &invoice.status == wanted))
        .collect();
    if invoices.is_empty() {
        output::info(format!("No invoices for {year}."));
        return Ok(());
    }
    output::section(format!("Invoices {year}"));
    for invoice in &invoices {
        let prints = match invoice.print_info.print_count {
            0 => String::new(),
            count => format!(" x{count}"),
        };
        output::info(format!(
            "{}  {}  {:<16}  {:>14}  {}{}",
            invoice.invoice_number,
            invoice.issued_at.date_naive(),
            invoice.client.name,
            money(context, invoice.total),
            invoice.status,
            prints
        ));
    }
    Ok(())
}

fn cmd_invoice_backup(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let note = (!args.is_empty()).then(|| args.join(" "));
    let info = context.app.store.backup(note.as_deref())?;
    output::success(format!("Invoices backed up as {}.", info.name));
    Ok(())
}

fn cmd_invoice_backups(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let backups = context.app.store.list_backups()?;
    if backups.is_empty() {
        output::info("No invoice backups yet.");
        return Ok(());
    }
    for backup in backups {
        let stamp = backup
            .created_at
            .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "unknown time".into());
        output::info(format!("  {}  ({stamp})", backup.name));
    }
    Ok(())
}

fn parse_status(raw: &str) -> Result<InvoiceStatus, CommandError> {
    match raw.to_ascii_lowercase().as_str() {
        "pending" => Ok(InvoiceStatus::Pending),
        "printed" => Ok(InvoiceStatus::Printed),
        "cancelled" | "canceled" => Ok(InvoiceStatus::Cancelled),
        "refunded" => Ok(InvoiceStatus::Refunded),
        other => Err(CommandError::InvalidArguments(format!(
            "unknown status `{other}`"
        ))),
    }
}

fn number_and_reason<'a>(args: &[&'a str], command: &str) -> Result<(&'a str, String), CommandError> {
    match args {
        [number, reason @ ..] if !reason.is_empty() => Ok((*number, reason.join(" "))),
        _ => Err(usage(command)),
    }
}

fn usage(command: &str) -> CommandError {
    let usage = super::all_definitions()
        .into_iter()
        .find(|definition| definition.name == command)
        .map(|definition| definition.usage)
        .unwrap_or(command);
    CommandError::InvalidArguments(format!("usage: {usage}"))
}

fn money(context: &ShellContext, amount: f64) -> String {
    use shop_core::CurrencyFormatter;
    context
        .app
        .formatters
        .format_amount(amount, &context.app.config.currency)
}

fn render_receipt(view: &PrintableInvoice) {
    output::section(&view.header.name);
    for detail in [&view.header.address, &view.header.phone, &view.header.tax_id]
        .into_iter()
        .flatten()
    {
        output::info(detail);
    }
    output::info(format!("Invoice {}  {}", view.invoice_number, view.issued_on));
    if view.is_copy {
        output::info("COPY");
    }
    output::info(format!("Barber: {}", view.barber));
    output::info(format!("Client: {}", view.client));
    for line in &view.lines {
        output::info(format!(
            "  {} x{} @ {} = {}",
            line.description, line.quantity, line.unit_price, line.subtotal
        ));
    }
    output::info(format!("Subtotal: {}", view.subtotal));
    output::info(format!("Tax: {}", view.tax));
    if let Some(discount) = &view.discount {
        output::info(format!("Discount: -{discount}"));
    }
    output::info(format!("Total: {}", view.total));
    output::info(format!("Payment: {}", view.payment_method));
    output::info(format!("Status: {}", view.status));
    for note in &view.notes {
        output::info(note);
    }
}
