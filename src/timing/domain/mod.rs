//! Pure timing domain types: the immutable event and its payload schemas.

mod event;

pub use event::{
    EventKind, NewTimeEvent, ParseEventKindError, ReparentPayload, TagPayload, TimeEvent,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::domain::TaskId;
    use chrono::Utc;

    #[test]
    fn event_kind_round_trips_through_str() {
        for kind in [
            EventKind::Start,
            EventKind::Pause,
            EventKind::Resume,
            EventKind::Stop,
            EventKind::Reparent,
            EventKind::TagAdd,
            EventKind::TagRemove,
        ] {
            assert_eq!(EventKind::try_from(kind.as_str()), Ok(kind));
        }
    }

    #[test]
    fn reparent_payload_round_trips() {
        let from = Some(TaskId::new());
        let to = Some(TaskId::new());
        let event = NewTimeEvent::reparent(TaskId::new(), Utc::now(), from, to);
        let decoded: ReparentPayload = serde_json::from_str(event.payload.as_deref().unwrap()).unwrap();
        assert_eq!(decoded.from, from);
        assert_eq!(decoded.to, to);
    }
}
