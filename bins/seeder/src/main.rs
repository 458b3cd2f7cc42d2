//! Demo data seeder.
//!
//! Seeds one tenant through the ledger engine: a small chart of accounts,
//! a fiscal year, a handful of vouchers driven through the full workflow,
//! and a closed January. The January trial balance is printed to stdout
//! as JSON; progress logs go to stderr.

use anyhow::Context;
use chrono::NaiveDate;
use ledgerline_core::account::{Account, AccountType, CreateAccountInput};
use ledgerline_core::fiscal::{PeriodRange, YearMonth};
use ledgerline_core::voucher::{
    CreateVoucherInput, EntryInput, UpdateVoucherInput, Voucher, VoucherType,
};
use ledgerline_engine::LedgerEngine;
use ledgerline_shared::types::{AccountId, Money, TenantId, UserId};
use ledgerline_shared::{AppConfig, LogFormat, LoggingConfig};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

struct Chart {
    cash: AccountId,
    bank: AccountId,
    equity: AccountId,
    revenue: AccountId,
    rent: AccountId,
    supplies: AccountId,
}

struct Seeder {
    engine: LedgerEngine,
    tenant: TenantId,
    clerk: UserId,
    approver: UserId,
    year: i32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config.logging);

    let seeder = Seeder {
        engine: LedgerEngine::from_config(&config),
        tenant: TenantId::new(),
        clerk: UserId::new(),
        approver: UserId::new(),
        year: config.seed.fiscal_year,
    };
    info!(
        tenant = %seeder.tenant,
        name = %config.seed.tenant_name,
        fiscal_year = seeder.year,
        "Seeding demo tenant"
    );

    let chart = seeder.seed_chart().await?;
    let periods = seeder
        .engine
        .fiscal
        .create_fiscal_year(seeder.tenant, seeder.year)
        .await?;
    info!(count = periods.len(), "Fiscal periods created");

    seeder.seed_vouchers(&chart).await?;

    seeder
        .engine
        .fiscal
        .close_period(seeder.tenant, seeder.approver, seeder.year, 1)
        .await?;
    info!("January closed");

    let january = YearMonth::new(seeder.year, 1)?;
    let trial_balance = seeder
        .engine
        .reports
        .get_trial_balance(seeder.tenant, PeriodRange::single(january))
        .await?;
    println!("{}", serde_json::to_string_pretty(&trial_balance)?);

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| logging.filter.as_str().into());
    let registry = tracing_subscriber::registry().with(filter);
    match logging.format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

impl Seeder {
    async fn account(&self, input: CreateAccountInput) -> anyhow::Result<Account> {
        let account = self
            .engine
            .accounts
            .create_account(self.tenant, self.clerk, input)
            .await?;
        Ok(account)
    }

    async fn seed_chart(&self) -> anyhow::Result<Chart> {
        let assets = self
            .account(CreateAccountInput::new("1", "Assets", AccountType::Asset).header())
            .await?;
        let cash = self
            .account(
                CreateAccountInput::new("101", "Cash on Hand", AccountType::Asset)
                    .with_parent(assets.id),
            )
            .await?;
        let bank = self
            .account(
                CreateAccountInput::new("102", "Bank", AccountType::Asset)
                    .with_parent(assets.id),
            )
            .await?;
        self.account(
            CreateAccountInput::new("103", "Accounts Receivable", AccountType::Asset)
                .with_parent(assets.id)
                .control(),
        )
        .await?;

        let liabilities = self
            .account(CreateAccountInput::new("2", "Liabilities", AccountType::Liability).header())
            .await?;
        self.account(
            CreateAccountInput::new("201", "Accounts Payable", AccountType::Liability)
                .with_parent(liabilities.id)
                .control(),
        )
        .await?;

        let equity = self
            .account(CreateAccountInput::new("301", "Share Capital", AccountType::Equity))
            .await?;
        let revenue = self
            .account(CreateAccountInput::new("401", "Sales Revenue", AccountType::Revenue))
            .await?;

        let expenses = self
            .account(CreateAccountInput::new("5", "Expenses", AccountType::Expense).header())
            .await?;
        let rent = self
            .account(
                CreateAccountInput::new("501", "Rent", AccountType::Expense)
                    .with_parent(expenses.id),
            )
            .await?;
        let supplies = self
            .account(
                CreateAccountInput::new("502", "Office Supplies", AccountType::Expense)
                    .with_parent(expenses.id),
            )
            .await?;

        info!("Chart of accounts seeded");
        Ok(Chart {
            cash: cash.id,
            bank: bank.id,
            equity: equity.id,
            revenue: revenue.id,
            rent: rent.id,
            supplies: supplies.id,
        })
    }

    fn day(&self, month: u32, day: u32) -> anyhow::Result<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, month, day)
            .with_context(|| format!("invalid seed date {}-{month}-{day}", self.year))
    }

    fn two_line(
        voucher_type: VoucherType,
        on: NaiveDate,
        memo: &str,
        debit: AccountId,
        credit: AccountId,
        amount: Decimal,
    ) -> CreateVoucherInput {
        CreateVoucherInput::new(voucher_type, on)
            .with_description(memo)
            .with_entry(EntryInput::debit(debit, Money::new(amount)))
            .with_entry(EntryInput::credit(credit, Money::new(amount)))
    }

    async fn approve_and_post(&self, voucher: &Voucher) -> anyhow::Result<Voucher> {
        let vouchers = &self.engine.vouchers;
        vouchers
            .approve(self.tenant, self.approver, voucher.id, None)
            .await?;
        let posted = vouchers.post(self.tenant, self.approver, voucher.id).await?;
        info!(voucher_no = %posted.voucher_no, "Voucher posted");
        Ok(posted)
    }

    async fn record(&self, input: CreateVoucherInput) -> anyhow::Result<Voucher> {
        let vouchers = &self.engine.vouchers;
        let draft = vouchers
            .create_voucher(self.tenant, self.clerk, input)
            .await?;
        let submitted = vouchers.submit(self.tenant, self.clerk, draft.id).await?;
        self.approve_and_post(&submitted).await
    }

    async fn seed_vouchers(&self, chart: &Chart) -> anyhow::Result<()> {
        let vouchers = &self.engine.vouchers;

        self.record(Self::two_line(
            VoucherType::Receipt,
            self.day(1, 2)?,
            "Opening capital injection",
            chart.bank,
            chart.equity,
            dec!(50000),
        ))
        .await?;
        self.record(Self::two_line(
            VoucherType::Sales,
            self.day(1, 10)?,
            "Counter sales",
            chart.cash,
            chart.revenue,
            dec!(1250.75),
        ))
        .await?;

        // Rent goes back to the clerk once before it is approved.
        let rent = vouchers
            .create_voucher(
                self.tenant,
                self.clerk,
                Self::two_line(
                    VoucherType::Payment,
                    self.day(1, 31)?,
                    "January rent",
                    chart.rent,
                    chart.bank,
                    dec!(2000),
                ),
            )
            .await?;
        vouchers.submit(self.tenant, self.clerk, rent.id).await?;
        let rejected = vouchers
            .reject(
                self.tenant,
                self.approver,
                rent.id,
                Some("Attach the lease reference".to_string()),
            )
            .await?;
        info!(voucher_no = %rejected.voucher_no, "Voucher rejected");
        vouchers
            .update_voucher(
                self.tenant,
                rent.id,
                UpdateVoucherInput {
                    source_reference: Some("LEASE-2024-07".to_string()),
                    ..UpdateVoucherInput::default()
                },
            )
            .await?;
        let resubmitted = vouchers.submit(self.tenant, self.clerk, rent.id).await?;
        self.approve_and_post(&resubmitted).await?;

        // Supplies booked against cash by mistake, then reversed and rebooked.
        let misposted = self
            .record(Self::two_line(
                VoucherType::Purchase,
                self.day(1, 15)?,
                "Printer paper",
                chart.supplies,
                chart.cash,
                dec!(84.20),
            ))
            .await?;
        let reversal = vouchers
            .reverse(self.tenant, self.clerk, misposted.id, None)
            .await?;
        let reversal = vouchers.submit(self.tenant, self.clerk, reversal.id).await?;
        self.approve_and_post(&reversal).await?;
        self.record(Self::two_line(
            VoucherType::Purchase,
            self.day(1, 15)?,
            "Printer paper",
            chart.supplies,
            chart.bank,
            dec!(84.20),
        ))
        .await?;

        // A February draft stays open after January closes.
        vouchers
            .create_voucher(
                self.tenant,
                self.clerk,
                Self::two_line(
                    VoucherType::Sales,
                    self.day(2, 3)?,
                    "Counter sales",
                    chart.cash,
                    chart.revenue,
                    dec!(310),
                ),
            )
            .await?;

        Ok(())
    }
}
