//! WAYBILL - Interactive Shell
//! Drives the record layer against a local journal.

use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use waybill::audit::AuditLog;
use waybill::config::Config;
use waybill::contract::{
    seed_orders, HistoryReconstructor, Order, PaymentTransaction, RangeScanner, Record,
    RecordStore, Shipment, TxContext,
};
use waybill::ledger::Journal;
use waybill::types::now_micros;

const FIELD_SEP: char = '|';

static TX_SEQ: AtomicU64 = AtomicU64::new(0);

fn next_tx(caller: &str) -> TxContext {
    let seq = TX_SEQ.fetch_add(1, Ordering::Relaxed);
    TxContext::new(format!("tx-{:x}-{}", now_micros(), seq), caller)
}

fn fields(rest: &str, expected: usize) -> Option<Vec<String>> {
    let parts: Vec<String> = rest.split(FIELD_SEP).map(|p| p.trim().to_string()).collect();
    (parts.len() == expected).then_some(parts)
}

fn parse_order(rest: &str) -> Option<Order> {
    let mut f = fields(rest, 7)?.into_iter();
    Some(Order {
        order_no: f.next()?,
        date: f.next()?,
        order_detail: f.next()?,
        invoice: f.next()?,
        packing_status: f.next()?,
        payment_method: f.next()?,
        order_track: f.next()?,
    })
}

/// Each record kind lives in its own journal under the data directory.
fn open_journal<R: Record>(config: &Config) -> Journal {
    match Journal::open(config.for_kind(R::KIND)) {
        Ok(j) => j,
        Err(err) => {
            eprintln!("[ERROR] Failed to open {} journal: {}", R::KIND, err);
            std::process::exit(1);
        }
    }
}

fn show<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            for line in json.lines() {
                println!("  {}", line);
            }
        }
        Err(e) => println!("  ERROR: {}", e),
    }
}

fn main() {
    env_logger::init();

    println!();
    println!("  ╔═══════════════════════════════════════════╗");
    println!("  ║              WAYBILL Records              ║");
    println!("  ║    Orders over a versioned ledger v1.0    ║");
    println!("  ╚═══════════════════════════════════════════╝");
    println!();
    println!("  Fields are separated by '{}'.", FIELD_SEP);
    println!("  Commands:");
    println!("    create <no>|<date>|<detail>|<invoice>|<packing>|<payment>|<track>");
    println!("    update <no>|<date>|<detail>|<invoice>|<packing>|<payment>|<track>");
    println!("    read <no>            - Show an order");
    println!("    exists <no>          - Check whether an order is live");
    println!("    delete <no>          - Delete an order (history is kept)");
    println!("    list                 - List all live orders");
    println!("    history <no>         - Show an order's history, newest first");
    println!("    seed                 - Load the sample orders");
    println!("    pay <id>|<ACH|CreditCard>|<amount>|<account>|<details>");
    println!("    ship <id>|<shipment id>|<tracking url>");
    println!("    info                 - Show journal statistics");
    println!("    exit                 - Shutdown");
    println!();

    let config = Config::from_env();
    let journal = open_journal::<Order>(&config);
    let payment_journal = open_journal::<PaymentTransaction>(&config);
    let shipment_journal = open_journal::<Shipment>(&config);
    let caller = std::env::var("WAYBILL_CALLER").unwrap_or_else(|_| "shell".to_string());

    let audit = AuditLog::global("waybill::orders");
    let orders: RecordStore<_> = RecordStore::new(&journal, audit.clone());
    let scanner: RangeScanner<_> = RangeScanner::new(&journal, audit.clone());
    let history: HistoryReconstructor<_> = HistoryReconstructor::new(&journal, audit.clone());
    let payments: RecordStore<_, PaymentTransaction> =
        RecordStore::new(&payment_journal, audit.scoped("waybill::payments"));
    let shipments: RecordStore<_, Shipment> =
        RecordStore::new(&shipment_journal, audit.scoped("waybill::shipments"));

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("waybill> ");
        if stdout.flush().is_err() {
            break;
        }

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break, // EOF
            Ok(_) => {}
        }

        let line = line.trim();
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };
        if command.is_empty() {
            continue;
        }
        let ctx = next_tx(&caller);

        match command.to_lowercase().as_str() {
            "create" | "update" => {
                let Some(order) = parse_order(rest) else {
                    println!("  Usage: {} <no>|<date>|<detail>|<invoice>|<packing>|<payment>|<track>", command);
                    continue;
                };
                let key = order.order_no.clone();
                let result = if command.eq_ignore_ascii_case("create") {
                    orders.create(&ctx, &key, &order)
                } else {
                    orders.update(&ctx, &key, &order)
                };
                match result {
                    Ok(()) => println!("  OK ({})", ctx.tx_id()),
                    Err(e) => println!("  ERROR: {}", e),
                }
            }
            "read" | "get" => match orders.read(&ctx, rest) {
                Ok(order) => show(&order),
                Err(e) => println!("  ERROR: {}", e),
            },
            "exists" => match orders.exists(&ctx, rest) {
                Ok(live) => println!("  {}", live),
                Err(e) => println!("  ERROR: {}", e),
            },
            "delete" | "del" => match orders.delete(&ctx, rest) {
                Ok(()) => println!("  OK (deleted)"),
                Err(e) => println!("  ERROR: {}", e),
            },
            "list" | "scan" => match scanner.collect_all(&ctx) {
                Ok(results) if results.is_empty() => println!("  (empty)"),
                Ok(results) => {
                    show(&results);
                    println!("  ({} orders)", results.len());
                }
                Err(e) => println!("  ERROR: {}", e),
            },
            "history" => match history.collect_history(&ctx, rest) {
                Ok(entries) if entries.is_empty() => println!("  (no history)"),
                Ok(entries) => show(&entries),
                Err(e) => println!("  ERROR: {}", e),
            },
            "seed" | "init" => match seed_orders(&orders, &ctx) {
                Ok(()) => println!("  OK (sample orders loaded)"),
                Err(e) => println!("  ERROR: {}", e),
            },
            "pay" => {
                let Some(f) = fields(rest, 5) else {
                    println!("  Usage: pay <id>|<ACH|CreditCard>|<amount>|<account>|<details>");
                    continue;
                };
                let amount = match f[2].parse::<f64>() {
                    Ok(amount) => amount,
                    Err(e) => {
                        println!("  ERROR: invalid amount {:?}: {}", f[2], e);
                        continue;
                    }
                };
                let tx = match PaymentTransaction::new(&f[0], &f[1], amount, &f[3], &f[4]) {
                    Ok(tx) => tx,
                    Err(e) => {
                        println!("  ERROR: {}", e);
                        continue;
                    }
                };
                match payments.create(&ctx, &f[0], &tx) {
                    Ok(()) => println!("  OK ({})", ctx.tx_id()),
                    Err(e) => println!("  ERROR: {}", e),
                }
            }
            "ship" => {
                let Some(f) = fields(rest, 3) else {
                    println!("  Usage: ship <id>|<shipment id>|<tracking url>");
                    continue;
                };
                let shipment = Shipment {
                    id: f[0].clone(),
                    shipment_id: f[1].clone(),
                    tracking_url: f[2].clone(),
                };
                match shipments.create(&ctx, &f[0], &shipment) {
                    Ok(()) => println!("  OK ({})", ctx.tx_id()),
                    Err(e) => println!("  ERROR: {}", e),
                }
            }
            "info" | "stats" => {
                for (kind, journal) in [
                    (Order::KIND, &journal),
                    (PaymentTransaction::KIND, &payment_journal),
                    (Shipment::KIND, &shipment_journal),
                ] {
                    match (journal.len(), journal.version_count()) {
                        (Ok(live), Ok(versions)) => {
                            println!("  [{}] live keys: {}, versions: {}", kind, live, versions);
                        }
                        (Err(e), _) | (_, Err(e)) => println!("  [{}] ERROR: {}", kind, e),
                    }
                }
                println!("{}", journal.metrics().report());
            }
            "exit" | "quit" | "q" => {
                println!("  Shutting down WAYBILL...");
                break;
            }
            _ => {
                println!("  Unknown command: '{}'. Type 'exit' to quit.", command);
            }
        }
    }
}
