//! Convert a small USD ledger to JPY and report exchange profit

use chrono::NaiveDate;
use ttm_ledger::utils::MemoryRateStorage;
use ttm_ledger::{write_transactions_csv, Converter};

const QUOTE_SHEET: &str = "\
日付,米ドル,ユーロ,英ポンド
2024/1/4,143.53,157.00,182.30
2024/1/5,144.90,158.00,183.55
2024/1/9,144.20,157.40,183.00
2024/2/1,146.95,159.10,186.75
";

const LEDGER: &str = "\
Transaction date,Transaction time,Description,Credit amount,Debit amount
01-04-2024,09:12:00,Payment from Acme Corp,\"1,200.00\",
01-06-2024,14:30:00,Payment from Globex,350.00,
01-09-2024,10:00:00,Transfer to JPY account,,500.00
02-01-2024,16:45:00,Payment from Acme Corp,800.00,
";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("💱 TTM Ledger - Conversion Example\n");

    // 1. Load rates from a downloaded quote sheet
    let mut converter = Converter::new(MemoryRateStorage::new());
    let refreshed_at = NaiveDate::from_ymd_opt(2024, 2, 1)
        .and_then(|d| d.and_hms_opt(9, 0, 0))
        .ok_or("invalid refresh time")?;
    let count = converter.refresh_rates(QUOTE_SHEET, refreshed_at).await?;
    println!("📊 Loaded {} TTM rates", count);

    // 2. Convert the ledger
    let result = converter.process_csv(LEDGER.as_bytes()).await?;

    println!("\n🧾 Transactions:");
    for t in &result.transactions {
        println!(
            "  {} {:<6} ${:>9} @ {:>7} = ¥{:>9}  {}",
            t.datetime,
            t.direction.as_str(),
            t.amount_usd,
            t.resolved_rate,
            t.amount_jpy,
            t.vendor
        );
        if let Some(profit) = &t.exchange_profit {
            println!(
                "      settled on {} at {}: exchange profit ¥{}",
                profit.next_debit_date, profit.next_debit_rate, profit.profit_jpy
            );
        }
    }

    // 3. Monthly and overall summary
    println!("\n📈 Monthly Summary:");
    for month in &result.monthly {
        println!(
            "  {}: ${} / ¥{} in {} transactions, exchange profit ¥{}",
            month.month,
            month.total_usd,
            month.total_jpy,
            month.transaction_count,
            month.total_exchange_profit
        );
    }

    let summary = &result.summary;
    println!("\n📋 Overall:");
    println!("  Net USD:            ${}", summary.net_usd);
    println!("  Net JPY:            ¥{}", summary.net_jpy);
    println!("  Average TTM rate:   {}", summary.average_ttm_rate);
    println!("  Exchange profit:    ¥{}", summary.total_exchange_profit);

    // 4. Export
    println!("\n📤 CSV export:");
    write_transactions_csv(std::io::stdout(), &result)?;

    Ok(())
}
