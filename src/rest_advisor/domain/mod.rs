//! Pure rest-advisor domain types: the suggestion and its enumerations.

mod suggestion;

pub use suggestion::{
    ParseSuggestionStatusError, ParseTriggerTypeError, RestSuggestion, SuggestionId, SuggestionStatus,
    TriggerType,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_type_round_trips_through_str() {
        for trigger in [TriggerType::SubtaskEnd, TriggerType::TaskSwitch] {
            assert_eq!(TriggerType::try_from(trigger.as_str()), Ok(trigger));
        }
    }

    #[test]
    fn suggestion_status_round_trips_through_str() {
        for status in [
            SuggestionStatus::Pending,
            SuggestionStatus::Accepted,
            SuggestionStatus::Ignored,
        ] {
            assert_eq!(SuggestionStatus::try_from(status.as_str()), Ok(status));
        }
    }
}
