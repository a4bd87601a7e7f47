//! Forward-only schema migrations over the embedded store.

use super::schema::{meta, task_tags, tags, tasks, time_events};
use diesel::prelude::*;
use diesel::sqlite::{Sqlite, SqliteConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, MigrationSource, embed_migrations};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::{info, warn};

/// Migrations compiled into the binary at build time.
///
/// This is the "compiled migration list" of §4.A: immutable process-wide
/// state, compared against the on-disk version on every open.
pub static MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Errors raised while bringing the store up to the compiled schema version.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// A pending migration failed to apply.
    #[error("failed to apply pending migrations: {0}")]
    ApplyFailed(String),

    /// The on-disk schema version is newer than this binary understands.
    #[error("on-disk schema version {on_disk} is newer than the {compiled} versions this binary knows about")]
    SchemaTooNew {
        /// Version found in the `meta` table.
        on_disk: i64,
        /// Number of migrations compiled into this binary.
        compiled: i64,
    },

    /// A query against the schema-version or mirror tables failed.
    #[error("failed to read or write schema version: {0}")]
    MetaAccess(#[from] diesel::result::Error),
}

/// Applies any pending migrations and reconciles `meta.schema_version`.
///
/// A missing or newer on-disk version than the compiled migration list is a
/// fatal initialization error, per §4.A.
pub fn run_pending_migrations(connection: &mut SqliteConnection) -> Result<(), MigrationError> {
    let compiled_count = count_compiled_migrations();

    let on_disk_version = read_schema_version(connection)?;
    if let Some(version) = on_disk_version {
        if version > compiled_count {
            return Err(MigrationError::SchemaTooNew {
                on_disk: version,
                compiled: compiled_count,
            });
        }
    }

    let applied = connection
        .run_pending_migrations(&MIGRATIONS)
        .map_err(|err| MigrationError::ApplyFailed(err.to_string()))?;
    if applied.is_empty() {
        info!("schema already at compiled version, no migrations applied");
    } else {
        info!(applied = applied.len(), "applied pending migrations");
    }

    write_schema_version(connection, compiled_count)?;
    Ok(())
}

/// Re-derives the `tasks`/`task_tags` mirror from the event log and compares
/// it against the persisted schema version, logging a recovery note if the
/// on-disk version diverges from what this binary expects.
///
/// Named `reconcile_mirror` per §10.6: implied by the crash-recovery note in
/// §5 but not given an explicit operation name in the distilled spec. Status
/// and tag membership are fully derivable by replaying `time_events`, since
/// every transition and every tag attach/detach that actually changes state
/// appends an event; a task's title and its parent at creation time are
/// written directly and never evented, so reconciliation leaves them alone.
pub fn reconcile_mirror(connection: &mut SqliteConnection) -> Result<(), MigrationError> {
    let compiled_count = count_compiled_migrations();
    match read_schema_version(connection)? {
        Some(version) if version == compiled_count => {}
        Some(version) => {
            warn!(
                on_disk = version,
                compiled = compiled_count,
                "schema version mismatch detected during reconciliation"
            );
            write_schema_version(connection, compiled_count)?;
        }
        None => write_schema_version(connection, compiled_count)?,
    }

    reconcile_task_status(connection)?;
    reconcile_task_tags(connection)?;
    Ok(())
}

/// Corrects `tasks.status` wherever it disagrees with the status derived
/// from the last start/pause/resume/stop event for that task. A task with no
/// such event is left at its persisted status (always `idle` for a task that
/// was never started).
fn reconcile_task_status(connection: &mut SqliteConnection) -> Result<(), MigrationError> {
    let events: Vec<(String, String)> = time_events::table
        .order(time_events::sequence.asc())
        .select((time_events::task_id, time_events::kind))
        .load(connection)?;

    let mut derived_status: HashMap<String, &'static str> = HashMap::new();
    for (task_id, kind) in events {
        let status = match kind.as_str() {
            "start" | "resume" => Some("running"),
            "pause" => Some("paused"),
            "stop" => Some("stopped"),
            _ => None,
        };
        if let Some(status) = status {
            derived_status.insert(task_id, status);
        }
    }

    let current: Vec<(String, String)> = tasks::table.select((tasks::id, tasks::status)).load(connection)?;
    for (task_id, persisted_status) in current {
        let Some(&expected) = derived_status.get(&task_id) else {
            continue;
        };
        if persisted_status != expected {
            warn!(
                task_id = %task_id,
                persisted = %persisted_status,
                expected = %expected,
                "correcting task status mirror from event replay"
            );
            diesel::update(tasks::table.filter(tasks::id.eq(task_id)))
                .set(tasks::status.eq(expected))
                .execute(connection)?;
        }
    }
    Ok(())
}

/// Corrects `task_tags` wherever it disagrees with the membership derived
/// from replaying `tag_add`/`tag_remove` events in sequence order.
fn reconcile_task_tags(connection: &mut SqliteConnection) -> Result<(), MigrationError> {
    let events: Vec<(String, String, Option<String>)> = time_events::table
        .order(time_events::sequence.asc())
        .select((time_events::task_id, time_events::kind, time_events::payload))
        .load(connection)?;

    let tag_ids_by_name: HashMap<String, String> = tags::table
        .select((tags::name, tags::id))
        .load::<(String, String)>(connection)?
        .into_iter()
        .collect();

    let mut derived: HashSet<(String, String)> = HashSet::new();
    for (task_id, kind, payload) in events {
        let Some(tag_name) = payload.as_deref().and_then(extract_tag_name) else {
            continue;
        };
        let Some(tag_id) = tag_ids_by_name.get(&tag_name) else {
            continue;
        };
        match kind.as_str() {
            "tag_add" => {
                derived.insert((task_id, tag_id.clone()));
            }
            "tag_remove" => {
                derived.remove(&(task_id, tag_id.clone()));
            }
            _ => {}
        }
    }

    let current: HashSet<(String, String)> = task_tags::table
        .select((task_tags::task_id, task_tags::tag_id))
        .load::<(String, String)>(connection)?
        .into_iter()
        .collect();

    for (task_id, tag_id) in derived.difference(&current) {
        warn!(task_id = %task_id, tag_id = %tag_id, "restoring missing tag assignment from event replay");
        diesel::insert_or_ignore_into(task_tags::table)
            .values((task_tags::task_id.eq(task_id.clone()), task_tags::tag_id.eq(tag_id.clone())))
            .execute(connection)?;
    }
    for (task_id, tag_id) in current.difference(&derived) {
        warn!(task_id = %task_id, tag_id = %tag_id, "removing stale tag assignment absent from event replay");
        diesel::delete(
            task_tags::table
                .filter(task_tags::task_id.eq(task_id.clone()))
                .filter(task_tags::tag_id.eq(tag_id.clone())),
        )
        .execute(connection)?;
    }
    Ok(())
}

/// Extracts the `tag` field from a `tag_add`/`tag_remove` event payload.
fn extract_tag_name(payload: &str) -> Option<String> {
    #[derive(serde::Deserialize)]
    struct TagEventPayload {
        tag: String,
    }
    serde_json::from_str::<TagEventPayload>(payload).ok().map(|parsed| parsed.tag)
}

fn count_compiled_migrations() -> i64 {
    // `migrations()` returns the statically embedded list in lexical order.
    let count = MigrationSource::<Sqlite>::migrations(&MIGRATIONS)
        .map(|list| list.len())
        .unwrap_or_default();
    i64::try_from(count).unwrap_or(i64::MAX)
}

fn read_schema_version(connection: &mut SqliteConnection) -> Result<Option<i64>, diesel::result::Error> {
    meta::table
        .select(meta::schema_version)
        .first::<i64>(connection)
        .optional()
}

fn write_schema_version(
    connection: &mut SqliteConnection,
    version: i64,
) -> Result<(), diesel::result::Error> {
    let existing = read_schema_version(connection)?;
    if existing.is_some() {
        diesel::update(meta::table)
            .set(meta::schema_version.eq(version))
            .execute(connection)?;
    } else {
        diesel::insert_into(meta::table)
            .values(meta::schema_version.eq(version))
            .execute(connection)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_migrated() -> SqliteConnection {
        let mut connection = SqliteConnection::establish(":memory:").expect("open in-memory db");
        run_pending_migrations(&mut connection).expect("run migrations");
        connection
    }

    fn insert_task(connection: &mut SqliteConnection, id: &str) {
        diesel::insert_into(tasks::table)
            .values((
                tasks::id.eq(id),
                tasks::parent_id.eq::<Option<String>>(None),
                tasks::title.eq("Draft"),
                tasks::status.eq("idle"),
                tasks::created_at.eq(0_i64),
                tasks::archived_at.eq::<Option<i64>>(None),
            ))
            .execute(connection)
            .expect("insert task");
    }

    #[test]
    fn reconcile_mirror_corrects_a_stale_status() {
        let mut connection = open_migrated();
        insert_task(&mut connection, "task-1");
        diesel::insert_into(time_events::table)
            .values((
                time_events::task_id.eq("task-1"),
                time_events::kind.eq("start"),
                time_events::at.eq(10_i64),
                time_events::payload.eq::<Option<String>>(None),
            ))
            .execute(&mut connection)
            .expect("insert event");

        reconcile_mirror(&mut connection).expect("reconcile");

        let status: String = tasks::table
            .filter(tasks::id.eq("task-1"))
            .select(tasks::status)
            .first(&mut connection)
            .expect("read status");
        assert_eq!(status, "running");
    }

    #[test]
    fn reconcile_mirror_leaves_a_never_started_task_idle() {
        let mut connection = open_migrated();
        insert_task(&mut connection, "task-1");

        reconcile_mirror(&mut connection).expect("reconcile");

        let status: String = tasks::table
            .filter(tasks::id.eq("task-1"))
            .select(tasks::status)
            .first(&mut connection)
            .expect("read status");
        assert_eq!(status, "idle");
    }

    #[test]
    fn reconcile_mirror_restores_a_missing_tag_assignment() {
        let mut connection = open_migrated();
        insert_task(&mut connection, "task-1");
        diesel::insert_into(tags::table)
            .values((tags::id.eq("tag-1"), tags::name.eq("deep-work"), tags::created_at.eq(0_i64)))
            .execute(&mut connection)
            .expect("insert tag");
        diesel::insert_into(time_events::table)
            .values((
                time_events::task_id.eq("task-1"),
                time_events::kind.eq("tag_add"),
                time_events::at.eq(0_i64),
                time_events::payload.eq(Some(r#"{"tag":"deep-work"}"#.to_owned())),
            ))
            .execute(&mut connection)
            .expect("insert event");

        reconcile_mirror(&mut connection).expect("reconcile");

        let count: i64 = task_tags::table
            .filter(task_tags::task_id.eq("task-1"))
            .filter(task_tags::tag_id.eq("tag-1"))
            .count()
            .get_result(&mut connection)
            .expect("count assignments");
        assert_eq!(count, 1);
    }

    #[test]
    fn reconcile_mirror_removes_a_stale_tag_assignment() {
        let mut connection = open_migrated();
        insert_task(&mut connection, "task-1");
        diesel::insert_into(tags::table)
            .values((tags::id.eq("tag-1"), tags::name.eq("deep-work"), tags::created_at.eq(0_i64)))
            .execute(&mut connection)
            .expect("insert tag");
        diesel::insert_into(task_tags::table)
            .values((task_tags::task_id.eq("task-1"), task_tags::tag_id.eq("tag-1")))
            .execute(&mut connection)
            .expect("insert stale assignment");

        reconcile_mirror(&mut connection).expect("reconcile");

        let count: i64 = task_tags::table
            .filter(task_tags::task_id.eq("task-1"))
            .filter(task_tags::tag_id.eq("tag-1"))
            .count()
            .get_result(&mut connection)
            .expect("count assignments");
        assert_eq!(count, 0);
    }
}
