//! Command execution.

use std::io::Write;

use anyhow::{bail, Context};

use ideals_core::diff::{CollectionChange, ProfileTemplateDiff};
use ideals_core::flags::ProfileFlag;
use ideals_fetch::TemplateSource;
use ideals_session::{ImportOutcome, LoadOutcome, Tracker};

use crate::command::{import_resolution, sync_policy, Command};

/// Execute `command`, writing human-readable output to `out`.
pub async fn run<S: TemplateSource>(
    tracker: &mut Tracker<S>,
    command: Command,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    match command {
        Command::List => {
            let active = tracker.library().active_id();
            if tracker.library().profiles().is_empty() {
                writeln!(out, "No profiles.")?;
            }
            for summary in tracker.library().profiles() {
                let marker = if Some(summary.id.as_str()) == active { "*" } else { " " };
                writeln!(out, "{marker} {}  {}", summary.id, summary.name)?;
            }
        }
        Command::Create {
            name,
            template_url,
            template_id,
            count,
        } => {
            let flags = if count {
                vec![ProfileFlag::EnableCount]
            } else {
                Vec::new()
            };
            let (profile, outcome) = tracker
                .create_profile(&name, &template_id, &template_url, flags)
                .await?;
            writeln!(out, "Created profile {} ({})", profile.name, profile.id)?;
            report_load(tracker, outcome, out)?;
        }
        Command::Load { id, keep, cleanup } => {
            let policy = sync_policy(keep, cleanup);
            let outcome = tracker.switch_to(&id).await?;
            report_load(tracker, outcome, out)?;
            if outcome == LoadOutcome::NeedsConfirmation {
                match policy {
                    Some(policy) => {
                        tracker.session().confirm_sync(policy)?;
                        writeln!(out, "Applied {policy} sync.")?;
                    }
                    None => writeln!(
                        out,
                        "Re-run with --keep to keep removed items or --cleanup to drop them."
                    )?,
                }
            }
        }
        Command::Toggle {
            id,
            collection,
            item,
        } => {
            ensure_loaded(tracker, &id).await?;
            let done = tracker.session().toggle_item(&collection, &item)?;
            tracker.flush()?;
            writeln!(out, "{collection}/{item}: {}", if done { "done" } else { "not done" })?;
        }
        Command::Count {
            id,
            collection,
            item,
            count,
        } => {
            ensure_loaded(tracker, &id).await?;
            tracker.session().set_count(&collection, &item, count)?;
            tracker.flush()?;
            writeln!(out, "{collection}/{item}: {count}")?;
        }
        Command::Export { id, dir } => {
            let exported = tracker.library().export_profile(&id)?;
            let path = dir.unwrap_or_default().join(&exported.file_name);
            std::fs::write(&path, exported.contents)
                .with_context(|| format!("writing {}", path.display()))?;
            writeln!(out, "Exported to {}", path.display())?;
        }
        Command::Import {
            file,
            overwrite,
            duplicate,
        } => {
            let resolution = import_resolution(overwrite, duplicate);
            let json = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let (outcome, loaded) = tracker.import_profile(&json, resolution).await?;
            match outcome {
                ImportOutcome::Imported { id, replaced } => {
                    let verb = if replaced { "Replaced" } else { "Imported" };
                    writeln!(out, "{verb} profile {id}")?;
                    if let Some(loaded) = loaded {
                        report_load(tracker, loaded, out)?;
                    }
                }
                ImportOutcome::Conflict { id, existing_name } => bail!(
                    "profile {id} already exists as \"{existing_name}\"; \
                     re-run with --overwrite or --duplicate"
                ),
            }
        }
        Command::Delete { id } => {
            let next = tracker.delete_profile(&id).await?;
            writeln!(out, "Deleted profile {id}")?;
            if let Some(outcome) = next {
                report_load(tracker, outcome, out)?;
            }
        }
    }
    tracker.flush()?;
    Ok(())
}

/// Load `id` unless it is already the loaded profile.
async fn ensure_loaded<S: TemplateSource>(tracker: &mut Tracker<S>, id: &str) -> anyhow::Result<()> {
    if tracker.session().profile_id().as_deref() == Some(id) {
        return Ok(());
    }
    let outcome = tracker.switch_to(id).await?;
    if outcome == LoadOutcome::Failed && tracker.session().profile_id().is_none() {
        let error = tracker.session().snapshot().error;
        bail!(
            "unable to load profile {id}: {}",
            error.map(|e| e.to_string()).unwrap_or_default()
        );
    }
    Ok(())
}

fn report_load<S: TemplateSource>(
    tracker: &Tracker<S>,
    outcome: LoadOutcome,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let snapshot = tracker.session().snapshot();
    match outcome {
        LoadOutcome::Ready { synced } => {
            if let (Some(profile), Some(template)) = (&snapshot.profile, &snapshot.template) {
                write!(
                    out,
                    "Loaded {} against {} revision {}",
                    profile.name, template.name, template.revision
                )?;
                if snapshot.template_is_stale {
                    write!(out, " (cached, fetch failed)")?;
                }
                writeln!(out)?;
            }
            if synced {
                writeln!(out, "Synced with the latest template.")?;
            }
            if let Some(changes) = &snapshot.changes {
                print_diff(changes, out)?;
            }
        }
        LoadOutcome::NeedsConfirmation => {
            writeln!(out, "The template removed items this profile tracks:")?;
            if let Some(changes) = &snapshot.changes {
                print_diff(changes, out)?;
            }
        }
        LoadOutcome::Failed => {
            let error = snapshot.error.map(|e| e.to_string()).unwrap_or_default();
            writeln!(out, "Load failed: {error}")?;
        }
        LoadOutcome::Superseded => {}
    }
    Ok(())
}

fn print_diff(diff: &ProfileTemplateDiff, out: &mut impl Write) -> anyhow::Result<()> {
    print_changes("+", &diff.added, out)?;
    print_changes("-", &diff.removed, out)
}

fn print_changes(sign: &str, changes: &[CollectionChange], out: &mut impl Write) -> anyhow::Result<()> {
    for collection in changes {
        let label = collection.name.as_deref().unwrap_or(&collection.id);
        for item in &collection.items {
            let name = item.name.as_deref().unwrap_or(&item.id);
            writeln!(out, "  {sign} {label} / {name}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;

    use clap::Parser;
    use ideals_core::template::{Template, TemplateCollection, TemplateItem};
    use ideals_fetch::FetchError;
    use ideals_session::SessionConfig;
    use ideals_storage::MemoryStore;
    use tokio_util::sync::CancellationToken;

    struct FixedSource(Template);

    impl TemplateSource for FixedSource {
        async fn fetch_template(
            &self,
            _url: &str,
            _expected_id: Option<&str>,
            _cancel: &CancellationToken,
        ) -> Result<Template, FetchError> {
            Ok(self.0.clone())
        }
    }

    fn tracker() -> Tracker<FixedSource> {
        let template = Template::new(
            "photo-sets",
            "Photo sets",
            2,
            vec![TemplateCollection::new(
                "c1",
                "First",
                vec![TemplateItem::new("i1", "One", "m1")],
            )],
        );
        let config = SessionConfig {
            template_cache: false,
            ..SessionConfig::default()
        };
        Tracker::open(FixedSource(template), Arc::new(MemoryStore::new()), config).unwrap()
    }

    use crate::command::Cli;

    fn parse(args: &[&str]) -> Command {
        Cli::try_parse_from(std::iter::once("ideals").chain(args.iter().copied()))
            .unwrap()
            .command
    }

    async fn exec(tracker: &mut Tracker<FixedSource>, args: &[&str]) -> String {
        let mut out = Vec::new();
        run(tracker, parse(args), &mut out)
            .await
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn create_toggle_list() {
        let mut tracker = tracker();
        let out = exec(&mut tracker, &["create", "Mine", "https://example.com/t.json", "photo-sets"]).await;
        assert!(out.contains("Created profile Mine"));
        assert!(out.contains("Loaded Mine against Photo sets revision 2"));

        let id = tracker.library().active_id().unwrap().to_string();
        let out = exec(&mut tracker, &["toggle", &id, "c1", "i1"]).await;
        assert_eq!(out, "c1/i1: done\n");

        let out = exec(&mut tracker, &["list"]).await;
        assert_eq!(out, format!("* {id}  Mine\n"));
    }

    #[tokio::test]
    async fn export_then_import_duplicate() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path();
        let mut tracker = tracker();
        exec(&mut tracker, &["create", "Mine", "https://example.com/t.json", "photo-sets"]).await;
        let id = tracker.library().active_id().unwrap().to_string();

        let out = exec(&mut tracker, &["export", &id, dir.to_str().unwrap()]).await;
        let file: PathBuf = dir.join("my-ideals-profile-Mine.json");
        assert!(out.contains("Exported to"));
        assert!(file.exists());

        let conflict = run(
            &mut tracker,
            parse(&["import", file.to_str().unwrap()]),
            &mut Vec::new(),
        )
        .await;
        assert!(conflict.unwrap_err().to_string().contains("already exists"));

        let out = exec(&mut tracker, &["import", file.to_str().unwrap(), "--duplicate"]).await;
        assert!(out.starts_with("Imported profile"));
        assert_eq!(tracker.library().profiles().len(), 2);
    }
}
