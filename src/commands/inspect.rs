use crate::cli::{Cli, Commands, SnapshotCommands};
use crate::domain::models::{Category, CategoryInfo, Settings};
use crate::services::message::Formatter;
use crate::services::output::{print_json, print_one, print_out};
use crate::services::settings::validate_settings;
use crate::services::snapshot::SnapshotStore;

pub fn handle_inspect_commands(cli: &Cli, settings: &Settings) -> anyhow::Result<bool> {
    let store = SnapshotStore::new(&settings.data_dir);
    match &cli.command {
        Commands::Categories => {
            let infos: Vec<CategoryInfo> = Category::ALL
                .into_iter()
                .map(|c| CategoryInfo {
                    id: c.id().to_string(),
                    title: c.title().to_string(),
                    endpoint: c.endpoint().to_string(),
                    api_type: c.api_type().to_string(),
                    snapshot_file: c.snapshot_file().to_string(),
                })
                .collect();
            print_out(cli.json, &infos, |i| {
                format!(
                    "{}\t{}\t{}?type={}\t{}",
                    i.id, i.title, i.endpoint, i.api_type, i.snapshot_file
                )
            })?;
        }
        Commands::Snapshot { command } => match command {
            SnapshotCommands::Show { category, limit } => {
                let summary = store.summary(*category, *limit)?;
                print_one(cli.json, summary.exists, summary, |s| {
                    if !s.exists {
                        return vec![format!("{}: no snapshot at {}", s.category, s.path)];
                    }
                    let mut lines = vec![
                        format!("{}: {} rows at {}", s.category, s.rows, s.path),
                        format!("columns: {}", s.columns.join(", ")),
                        format!("sha256: {}", s.sha256.as_deref().unwrap_or("n/a")),
                    ];
                    lines.extend(s.latest_keys.iter().map(|k| format!("  {}", k)));
                    lines
                })?;
            }
            SnapshotCommands::Clear { category } => {
                let targets = match category {
                    Some(c) => vec![*c],
                    None => Category::ALL.to_vec(),
                };
                let mut removed = Vec::new();
                for c in targets {
                    if store.clear(c)? {
                        removed.push(c);
                    }
                }
                print_one(cli.json, true, removed, |r| {
                    vec![format!("removed {} snapshots", r.len())]
                })?;
            }
        },
        Commands::Render { category, kind } => {
            let mut settings = settings.clone();
            if let Some(kind) = kind {
                settings.notify.kind = *kind;
            }
            validate_settings(&settings)?;
            let table = store.load(*category)?;
            if table.is_empty() {
                if cli.json {
                    print_json(false, serde_json::Value::Null)?;
                } else {
                    println!("{}: snapshot is empty, nothing to render", category);
                }
                return Ok(true);
            }
            let message = Formatter::from_settings(&settings).render(*category, &table);
            if cli.json {
                print_json(true, &message)?;
            } else {
                println!("{}", message.preview());
            }
        }
        Commands::Run { .. } => return Ok(false),
    }
    Ok(true)
}
