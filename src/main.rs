use anyhow::Result;
use clap::Parser;
use matching_engine::engine::Engine;
use matching_engine::orders::{Order, Side};
use std::io::{self, BufRead, Write};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "engine-repl")]
#[command(
    version = "0.1",
    about = "Interactive demo of a limit-order matching engine with rollback"
)]
struct Cli {
    /// Maximum tracing level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: Level,
}

const HELP: &str = "\
commands:
  buy <price> <amount>    submit a buy limit order
  sell <price> <amount>   submit a sell limit order
  cancel <id>             cancel a resting order
  orders                  list resting orders
  book                    print a per-level snapshot of the book
  bookmark                save the current state
  rollback                rewind to the saved state
  quit";

fn describe(order: &Order) -> String {
    format!(
        "#{} {:?} {}x{} @ {} ({:?})",
        order.id,
        order.side,
        order.remaining(),
        order.amount,
        order.price,
        order.status
    )
}

fn handle_submit(engine: &mut Engine, side: Side, args: &[&str]) {
    let parsed: Vec<u64> = args.iter().filter_map(|a| a.parse().ok()).collect();
    let [price, amount] = parsed[..] else {
        println!("usage: {} <price> <amount>", format!("{side:?}").to_lowercase());
        return;
    };
    if price == 0 || amount == 0 {
        println!("price and amount must be > 0");
        return;
    }
    let order = engine.add_limit_order(side, price, amount);
    println!("{}", describe(&order));
}

fn handle_cancel(engine: &mut Engine, args: &[&str]) {
    let Some(id) = args.first().and_then(|a| a.parse().ok()) else {
        println!("usage: cancel <id>");
        return;
    };
    // only resting orders may be cancelled; everything else is either gone
    // already or must stay untouched
    match engine.order(id) {
        Some(order) if order.is_resting() => {
            engine.cancel_order(id);
            println!("order {id} cancelled");
        }
        Some(order) => println!("order {id} is {:?}, not resting", order.status),
        None => println!("no such order: {id}"),
    }
}

fn print_orders(engine: &Engine) {
    let bids = engine.bid_orders();
    let asks = engine.ask_orders();
    if bids.is_empty() && asks.is_empty() {
        println!("book is empty");
        return;
    }
    println!("bids:");
    for order in bids.iter().rev() {
        println!("  {}", describe(order));
    }
    println!("asks:");
    for order in &asks {
        println!("  {}", describe(order));
    }
}

fn dispatch(engine: &mut Engine, line: &str) -> Result<bool> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.as_slice() {
        [] => {}
        ["buy", args @ ..] => handle_submit(engine, Side::Buy, args),
        ["sell", args @ ..] => handle_submit(engine, Side::Sell, args),
        ["cancel", args @ ..] => handle_cancel(engine, args),
        ["orders"] => print_orders(engine),
        ["book"] => println!("{}", serde_json::to_string_pretty(&engine.snapshot())?),
        ["bookmark"] => {
            engine.bookmark();
            println!("bookmark saved");
        }
        ["rollback"] => match engine.rollback() {
            Ok(()) => println!("rolled back to bookmark"),
            Err(e) => println!("rollback failed: {e}"),
        },
        ["help"] => println!("{HELP}"),
        ["quit"] | ["exit"] => return Ok(false),
        _ => println!("unknown command, try `help`"),
    }
    Ok(true)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut engine = Engine::new();
    println!("{HELP}");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        if !dispatch(&mut engine, line?.trim())? {
            break;
        }
    }
    Ok(())
}
