use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    download::DirectoryDownloads,
    session::FileSessionStore,
    sort_for_display,
    store::{HttpFileFetcher, HttpRemoteStore},
    BillsListController, DisplayBill, NewBillController, NewBillForm, Navigator, RemoteStore,
    SelectedFile, SessionContext, SubmitOutcome,
};
use shared::domain::Route;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod surfaces;

use config::{load_settings, Settings};
use surfaces::{describe_retrieve_error, render_bills, TerminalAlerts, TerminalPreview};

#[derive(Parser, Debug)]
#[command(name = "billed", about = "Submit expense bills and review past ones")]
struct Args {
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[arg(long, global = true)]
    session_file: Option<PathBuf>,
    #[arg(long, global = true)]
    download_dir: Option<PathBuf>,
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List submitted bills, newest first.
    List,
    /// Show the receipt of the bill at the given list position.
    Preview { position: usize },
    /// Download the receipt of the bill at the given list position.
    Download { position: usize },
    /// Upload a receipt and submit a new bill.
    New(NewBillArgs),
}

#[derive(clap::Args, Debug)]
struct NewBillArgs {
    /// Receipt image (.jpg, .jpeg or .png).
    #[arg(long)]
    file: PathBuf,
    #[arg(long = "type", default_value = "Transports")]
    expense_type: String,
    #[arg(long, default_value = "")]
    name: String,
    #[arg(long, default_value = "")]
    amount: String,
    #[arg(long, default_value = "")]
    date: String,
    #[arg(long, default_value = "")]
    vat: String,
    #[arg(long, default_value = "")]
    pct: String,
    #[arg(long, default_value = "")]
    commentary: String,
}

impl From<NewBillArgs> for NewBillForm {
    fn from(args: NewBillArgs) -> Self {
        Self {
            expense_type: args.expense_type,
            name: args.name,
            amount: args.amount,
            date: args.date,
            vat: args.vat,
            pct: args.pct,
            commentary: args.commentary,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut settings = load_settings();
    if let Some(v) = args.api_url {
        settings.api_url = v;
    }
    if let Some(v) = args.session_file {
        settings.session_file = v;
    }
    if let Some(v) = args.download_dir {
        settings.download_dir = v;
    }

    let session_store = FileSessionStore::open(&settings.session_file)?;
    let session =
        SessionContext::from_store(&session_store).context("no usable session; sign in first")?;
    session.require_employee()?;
    let store: Arc<dyn RemoteStore> = Arc::new(HttpRemoteStore::new(
        &settings.api_url,
        session.jwt().map(str::to_string),
    )?);
    let navigator: Arc<dyn Navigator> = Arc::new(|route: Route| info!(%route, "navigate"));

    match args.command {
        Command::List => {
            let controller = bills_controller(&settings, session, store, navigator);
            print!("{}", render_bills(&listed_bills(&controller).await?));
        }
        Command::Preview { position } => {
            let controller = bills_controller(&settings, session, store, navigator);
            let bills = listed_bills(&controller).await?;
            let icon = bill_at(&bills, position)?
                .icon()
                .ok_or_else(|| anyhow!("bill {position} has no receipt"))?;
            controller.handle_click_preview(&icon);
        }
        Command::Download { position } => {
            let controller = bills_controller(&settings, session, store, navigator);
            let bills = listed_bills(&controller).await?;
            let icon = bill_at(&bills, position)?
                .icon()
                .ok_or_else(|| anyhow!("bill {position} has no receipt"))?;
            if let Some(path) = controller.handle_click_download(&icon).await {
                println!("{}", path.display());
            }
        }
        Command::New(new_bill) => {
            let controller =
                NewBillController::new(session, Some(store), navigator, Arc::new(TerminalAlerts));
            let file = SelectedFile::read(&new_bill.file).await?;
            let outcome = controller.handle_change_file(file).await;
            info!(?outcome, "receipt selected");

            if let SubmitOutcome::Submitted { bill, update } =
                controller.handle_submit(&new_bill.into()).await
            {
                update.settle().await;
                println!("{} ({})", bill.name, bill.file_name);
            }
        }
    }

    Ok(())
}

fn bills_controller(
    settings: &Settings,
    session: SessionContext,
    store: Arc<dyn RemoteStore>,
    navigator: Arc<dyn Navigator>,
) -> BillsListController {
    BillsListController::new(
        session,
        Some(store),
        navigator,
        Arc::new(TerminalPreview::new(settings.preview_width)),
        Arc::new(HttpFileFetcher::new()),
        Arc::new(DirectoryDownloads::new(settings.download_dir.clone())),
    )
}

async fn listed_bills(controller: &BillsListController) -> Result<Vec<DisplayBill>> {
    let mut bills = controller
        .retrieve()
        .await
        .map_err(|err| anyhow!(describe_retrieve_error(&err)))?;
    sort_for_display(&mut bills);
    Ok(bills)
}

fn bill_at(bills: &[DisplayBill], position: usize) -> Result<&DisplayBill> {
    position
        .checked_sub(1)
        .and_then(|index| bills.get(index))
        .ok_or_else(|| anyhow!("no bill at position {position}; {} listed", bills.len()))
}
