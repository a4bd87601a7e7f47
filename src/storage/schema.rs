//! Diesel schema for the embedded store.

diesel::table! {
    /// Task records, the derived mirror of the latest status/parent per task.
    tasks (id) {
        /// Task identifier (stringified UUID).
        id -> Text,
        /// Parent task identifier, null for a root task.
        parent_id -> Nullable<Text>,
        /// Task title.
        title -> Text,
        /// Lifecycle status: idle, running, paused, or stopped.
        status -> Text,
        /// Creation timestamp, unix seconds.
        created_at -> BigInt,
        /// Soft-delete timestamp, unix seconds, null while active.
        archived_at -> Nullable<BigInt>,
    }
}

diesel::table! {
    /// Tag records, unique per name.
    tags (id) {
        /// Tag identifier (stringified UUID).
        id -> Text,
        /// Case-preserving tag name, unique.
        name -> Text,
        /// Creation timestamp, unix seconds.
        created_at -> BigInt,
    }
}

diesel::table! {
    /// Many-to-many association between tasks and tags.
    task_tags (task_id, tag_id) {
        /// Associated task identifier.
        task_id -> Text,
        /// Associated tag identifier.
        tag_id -> Text,
    }
}

diesel::table! {
    /// Append-only timing events, the sole source of truth for durations.
    time_events (sequence) {
        /// Monotonically increasing sequence number assigned by the store.
        sequence -> BigInt,
        /// Task the event pertains to.
        task_id -> Text,
        /// Event kind: start, pause, resume, stop, reparent, tag_add, tag_remove.
        kind -> Text,
        /// Event timestamp, unix seconds.
        at -> BigInt,
        /// Optional JSON payload, schema depends on kind.
        payload -> Nullable<Text>,
    }
}

diesel::table! {
    /// Rest suggestions produced by the rule engine.
    rest_suggestions (id) {
        /// Suggestion identifier (stringified UUID).
        id -> Text,
        /// Trigger that produced the suggestion: subtask_end or task_switch.
        trigger_type -> Text,
        /// Anchor task, if any.
        task_id -> Nullable<Text>,
        /// Continuous focus duration at trigger time, seconds.
        focus_seconds -> BigInt,
        /// Distinct task switches within the trailing 1800 seconds.
        switch_count_30m -> BigInt,
        /// Relative deviation from the task's historical median focus block.
        deviation_ratio -> Double,
        /// Suggested rest duration in minutes: 0, 3, 8, or 15.
        suggested_minutes -> BigInt,
        /// JSON array of rule identifiers that fired, in evaluation order.
        reasons -> Text,
        /// Suggestion status: pending, accepted, or ignored.
        status -> Text,
        /// Creation timestamp, unix seconds.
        created_at -> BigInt,
    }
}

diesel::table! {
    /// Single-row schema version marker.
    meta (schema_version) {
        /// Current schema version, matching the compiled migration count.
        schema_version -> BigInt,
    }
}

diesel::joinable!(task_tags -> tags (tag_id));
diesel::allow_tables_to_appear_in_same_query!(tasks, tags, task_tags, time_events, rest_suggestions, meta,);
