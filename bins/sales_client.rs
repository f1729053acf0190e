use std::process::ExitCode;

use anyhow::{anyhow, bail, Context};
use dotenvy::dotenv;
use models::RestApiModel;
use service::{CollectionRequestParams, RequestOptions, SalesProjectService};
use tracing::{error, info};
use uuid::Uuid;

const USAGE: &str = "usage: sales-client \
    <list [page] [size] | get <id> | lead <number> | search <term> | delete <id>>";

fn init_logging() {
    dotenv().ok();
    common::utils::logging::init_logging_default();
    info!(service = "sales-client", event = "logger_init", "tracing subscriber initialized");
}

enum Command {
    List { page: u32, size: u32 },
    Get(String),
    Lead(i64),
    Search(String),
    Delete(String),
}

impl Command {
    fn parse(args: &[String]) -> anyhow::Result<Self> {
        let arg = |i: usize| args.get(i).map(String::as_str).ok_or_else(|| anyhow!(USAGE));
        let number = |i: usize, default: u32| -> anyhow::Result<u32> {
            match args.get(i) {
                Some(v) => v.parse().with_context(|| format!("invalid number: {v}")),
                None => Ok(default),
            }
        };

        Ok(match arg(0)? {
            "list" => Command::List { page: number(1, 0)?, size: number(2, 20)? },
            "get" => Command::Get(arg(1)?.to_string()),
            "lead" => Command::Lead(arg(1)?.parse().context("lead number must be an integer")?),
            "search" => Command::Search(args[1..].join(" ")),
            "delete" => Command::Delete(arg(1)?.to_string()),
            other => bail!("unknown command {other:?}\n{USAGE}"),
        })
    }
}

async fn run(command: Command) -> anyhow::Result<String> {
    let config = configs::AppConfig::load_and_validate()?;
    let service = SalesProjectService::from_config(&config)?;

    let output = match command {
        Command::List { page, size } => {
            let params = CollectionRequestParams::paged(page, size);
            service
                .get_sales_projects(&params, RequestOptions::cached())
                .await?
                .to_json_string(Some(2))
        }
        Command::Get(id) => service
            .get_sales_project_by_id(&id, RequestOptions::cached())
            .await?
            .to_json_string(Some(2)),
        Command::Lead(number) => service
            .get_sales_projects_by_lead_number(number, RequestOptions::cached())
            .await?
            .to_json_string(Some(2)),
        Command::Search(term) => service
            .search(&term, &CollectionRequestParams::default(), RequestOptions::live())
            .await?
            .to_json_string(Some(2)),
        Command::Delete(id) => {
            let deleted = service.delete_sales_project(&id).await?;
            serde_json::json!({ "deleted": deleted }).to_string()
        }
    };
    Ok(output)
}

fn main() -> ExitCode {
    init_logging();

    let service_id = Uuid::new_v4();
    let pid = std::process::id();

    std::panic::set_hook(Box::new(move |info| {
        error!(
            service = "sales-client",
            event = "panic",
            %service_id,
            pid,
            message = %info,
            "unhandled panic occurred"
        );
    }));

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match Command::parse(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(2);
        }
    };

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(
                service = "sales-client",
                event = "runtime_build_failed",
                error = %e,
                "failed to build tokio runtime"
            );
            return ExitCode::FAILURE;
        }
    };

    info!(
        service = "sales-client",
        event = "start",
        %service_id,
        pid,
        version = env!("CARGO_PKG_VERSION"),
        "sales client starting"
    );

    match rt.block_on(run(command)) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(service = "sales-client", event = "run_failed", error = %e, "request failed");
            ExitCode::FAILURE
        }
    }
}
