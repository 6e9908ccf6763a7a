use crate::cli::{Cli, Commands};
use crate::cninfo::CninfoClient;
use crate::domain::models::{Category, RunReport, Settings};
use crate::services::message::Formatter;
use crate::services::notifier::WebhookClient;
use crate::services::output::print_one;
use crate::services::pipeline::Pipeline;
use crate::services::recency::market_today;
use crate::services::settings::{resolve_webhook, validate_settings};
use crate::services::snapshot::SnapshotStore;
use chrono::Utc;
use tracing::info;

pub fn handle_run_command(cli: &Cli, settings: &Settings) -> anyhow::Result<bool> {
    let Commands::Run {
        categories,
        kind,
        window_days,
        as_of,
        webhook,
        base_url,
    } = &cli.command
    else {
        return Ok(false);
    };

    let mut settings = settings.clone();
    if let Some(kind) = kind {
        settings.notify.kind = *kind;
    }
    if let Some(days) = window_days {
        settings.filter.window_days = *days;
    }
    if let Some(url) = base_url {
        settings.fetch.base_url = url.clone();
    }
    validate_settings(&settings)?;
    let webhook = resolve_webhook(webhook.as_deref())?;

    let fetcher = CninfoClient::new(&settings.fetch)?;
    let notifier = WebhookClient::new(webhook, &settings.notify)?;
    let store = SnapshotStore::new(&settings.data_dir);
    let formatter = Formatter::from_settings(&settings);
    let selected = selected_categories(categories);
    let today = as_of.unwrap_or_else(|| market_today(Utc::now()));

    info!(
        categories = selected.len(),
        %today,
        data_dir = %store.dir().display(),
        "starting run"
    );
    let report = Pipeline {
        fetcher: &fetcher,
        notifier: &notifier,
        store: &store,
        formatter: &formatter,
        window_days: settings.filter.window_days,
    }
    .run(&selected, today);

    let ok = report.fetch_failures == 0 && report.notify_failures == 0;
    print_one(cli.json, ok, report, report_lines)?;
    Ok(true)
}

/// Requested categories in processing order; all of them when none given.
fn selected_categories(requested: &[Category]) -> Vec<Category> {
    if requested.is_empty() {
        return Category::ALL.to_vec();
    }
    Category::ALL
        .into_iter()
        .filter(|c| requested.contains(c))
        .collect()
}

fn report_lines(report: &RunReport) -> Vec<String> {
    let mut lines: Vec<String> = report
        .categories
        .iter()
        .map(|c| {
            let mut line = format!(
                "{}\t{}\tfetch={}\tfetched={}\trecent={}\tnew={}\tnotify={}",
                c.category,
                c.title,
                c.fetch_status.as_str(),
                c.fetched_rows,
                c.recent_rows,
                c.delta_rows,
                c.notify_status.as_str()
            );
            if !c.snapshot_saved {
                line.push_str("\tsnapshot=failed");
            }
            line
        })
        .collect();
    lines.push(format!(
        "run finished: {} new records ({} fetch failures, {} notify failures)",
        report.new_records, report.fetch_failures, report.notify_failures
    ));
    lines
}
