//! Translation from plain-language card settings to API configuration.
//!
//! # Design
//! Measures and dimensions are typed values that serialize to the exact JSON
//! shapes the card API expects. The phrase tables are immutable; a phrase
//! word missing from them is an `ApiError::UnknownVocabulary`.
//!
//! Dimension phrases never fail: anything that is not an activity, activity
//! type or time period groups by person (`Dimension::Person`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::ApiError;

/// How statement values are combined into one number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Aggregation {
    First,
    Last,
    Max,
    Min,
    Average,
    Sum,
    Count,
    DistinctCount,
}

/// xAPI statement properties (plus calculated ones) the API can aggregate or
/// group by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatementProperty {
    #[serde(rename = "result.score.scaled")]
    ScaledScore,
    #[serde(rename = "result.score.raw")]
    RawScore,
    #[serde(rename = "result.durationCentiseconds")]
    Duration,
    #[serde(rename = "id")]
    StatementId,
    #[serde(rename = "object.id")]
    ActivityId,
    #[serde(rename = "verb.id")]
    VerbId,
    #[serde(rename = "result.completion")]
    Completion,
    #[serde(rename = "result.success")]
    Success,
    #[serde(rename = "object.definition.type")]
    ActivityType,
    #[serde(rename = "actor.person.id")]
    PersonId,
}

const AGGREGATIONS: &[(&str, Aggregation)] = &[
    ("first", Aggregation::First),
    ("latest", Aggregation::Last),
    ("highest", Aggregation::Max),
    ("longest", Aggregation::Max),
    ("lowest", Aggregation::Min),
    ("shortest", Aggregation::Min),
    ("average", Aggregation::Average),
    ("total", Aggregation::Sum),
];

const PROPERTIES: &[(&str, StatementProperty)] = &[
    ("score", StatementProperty::ScaledScore),
    ("scaled", StatementProperty::ScaledScore),
    ("raw", StatementProperty::RawScore),
    ("time", StatementProperty::Duration),
    ("statement", StatementProperty::StatementId),
    ("activity", StatementProperty::ActivityId),
    ("verb", StatementProperty::VerbId),
    ("completion", StatementProperty::Completion),
    ("success", StatementProperty::Success),
];

fn lookup<T: Copy>(table: &[(&str, T)], word: &str) -> Result<T, ApiError> {
    table
        .iter()
        .find(|(key, _)| *key == word)
        .map(|(_, value)| *value)
        .ok_or_else(|| ApiError::UnknownVocabulary(word.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationSpec {
    #[serde(rename = "type")]
    pub kind: Aggregation,
}

/// Where a measure reads its value from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueProducer {
    StatementProperty {
        #[serde(rename = "statementProperty")]
        statement_property: StatementProperty,
    },
    /// 1 when the property equals `value`, 0 otherwise.
    SimpleIf {
        #[serde(rename = "statementProperty")]
        statement_property: StatementProperty,
        #[serde(rename = "match")]
        value: Value,
    },
}

/// A measure in card configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measure {
    pub name: String,
    pub aggregation: AggregationSpec,
    pub value_producer: ValueProducer,
}

impl Measure {
    pub fn aggregation(&self) -> Aggregation {
        self.aggregation.kind
    }

    pub fn property(&self) -> StatementProperty {
        match &self.value_producer {
            ValueProducer::StatementProperty { statement_property }
            | ValueProducer::SimpleIf {
                statement_property, ..
            } => *statement_property,
        }
    }

    pub fn match_value(&self) -> Option<&Value> {
        match &self.value_producer {
            ValueProducer::SimpleIf { value, .. } => Some(value),
            ValueProducer::StatementProperty { .. } => None,
        }
    }
}

/// Assemble a measure directly. A `match_value` turns the value producer
/// into an equality test (`SIMPLE_IF`).
pub fn build_measure(
    name: impl Into<String>,
    aggregation: Aggregation,
    property: StatementProperty,
    match_value: Option<Value>,
) -> Measure {
    let value_producer = match match_value {
        Some(value) => ValueProducer::SimpleIf {
            statement_property: property,
            value,
        },
        None => ValueProducer::StatementProperty {
            statement_property: property,
        },
    };
    Measure {
        name: name.into(),
        aggregation: AggregationSpec { kind: aggregation },
        value_producer,
    }
}

/// Translate a phrase such as `"highest score"`, `"verb count"` or
/// `"unique activity count"` into a measure.
///
/// `title` names the measure and defaults to the phrase itself. The match value
/// is accepted for call-site compatibility but always discarded: phrase
/// translation only produces plain `STATEMENT_PROPERTY` measures. Use
/// `build_measure` for equality matches.
pub fn measure_from_phrase(
    phrase: &str,
    _match_value: Option<Value>,
    title: Option<&str>,
) -> Result<Measure, ApiError> {
    let title = title.unwrap_or(phrase);

    let lower = phrase.to_lowercase();
    let words: Vec<&str> = lower.split(' ').collect();
    let word = |i: usize| {
        words
            .get(i)
            .copied()
            .ok_or_else(|| ApiError::UnknownVocabulary(phrase.to_string()))
    };

    let (aggregation, property) = if words.last() == Some(&"count") {
        if words[0] == "unique" {
            (Aggregation::DistinctCount, lookup(PROPERTIES, word(1)?)?)
        } else {
            (Aggregation::Count, lookup(PROPERTIES, word(0)?)?)
        }
    } else {
        (lookup(AGGREGATIONS, word(0)?)?, lookup(PROPERTIES, word(1)?)?)
    };

    Ok(build_measure(title, aggregation, property, None))
}

/// Bucket size for time dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimePeriod {
    Day,
    Week,
    Month,
    Year,
}

/// A grouping axis for card measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "DimensionWire")]
pub enum Dimension {
    Activity,
    ActivityType,
    Time(TimePeriod),
    /// Group by learner. Also the result for any unrecognized phrase.
    Person,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
enum DimensionWire {
    StatementProperty {
        #[serde(rename = "statementProperty")]
        statement_property: StatementProperty,
    },
    Time {
        #[serde(rename = "timePeriod")]
        time_period: TimePeriod,
    },
}

impl From<Dimension> for DimensionWire {
    fn from(dimension: Dimension) -> Self {
        let statement_property = match dimension {
            Dimension::Time(time_period) => return DimensionWire::Time { time_period },
            Dimension::Activity => StatementProperty::ActivityId,
            Dimension::ActivityType => StatementProperty::ActivityType,
            Dimension::Person => StatementProperty::PersonId,
        };
        DimensionWire::StatementProperty { statement_property }
    }
}

/// Translate `"activity"`, `"activity type"`, `"day"`, `"week"`, `"month"` or
/// `"year"` (any case) into a dimension. Everything else is `Person`.
pub fn dimension_from_phrase(phrase: &str) -> Dimension {
    match phrase.to_lowercase().as_str() {
        "activity" => Dimension::Activity,
        "activity type" => Dimension::ActivityType,
        "day" => Dimension::Time(TimePeriod::Day),
        "week" => Dimension::Time(TimePeriod::Week),
        "month" => Dimension::Time(TimePeriod::Month),
        "year" => Dimension::Time(TimePeriod::Year),
        _ => Dimension::Person,
    }
}

/// Card templates known to the API, with their server-side ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardTemplate {
    Accomplishment,
    ActivityDetail,
    ActivityStream,
    Correlation,
    Leaderboard,
    Skills,
    Group,
}

const TEMPLATES: &[(&str, CardTemplate)] = &[
    ("accomplishment", CardTemplate::Accomplishment),
    ("activity detail", CardTemplate::ActivityDetail),
    ("activity stream", CardTemplate::ActivityStream),
    ("correlation", CardTemplate::Correlation),
    ("leaderboard", CardTemplate::Leaderboard),
    ("skills", CardTemplate::Skills),
    ("group", CardTemplate::Group),
];

impl CardTemplate {
    pub fn id(self) -> u64 {
        match self {
            CardTemplate::Accomplishment => 311,
            CardTemplate::ActivityDetail => 161,
            CardTemplate::ActivityStream => 282,
            CardTemplate::Correlation => 261,
            CardTemplate::Leaderboard => 332,
            CardTemplate::Skills => 301,
            CardTemplate::Group => 281,
        }
    }

    pub fn name(self) -> &'static str {
        TEMPLATES
            .iter()
            .find(|(_, t)| *t == self)
            .map(|(name, _)| *name)
            .unwrap_or_default()
    }
}

impl FromStr for CardTemplate {
    type Err = ApiError;

    /// Case-insensitive lookup by template name, e.g. `"Activity Detail"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        TEMPLATES
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|(_, t)| *t)
            .ok_or_else(|| ApiError::UnknownTemplate(s.to_string()))
    }
}

impl fmt::Display for CardTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Join items as `"a, b and c"`. No comma precedes the final `and`.
pub fn build_list_string<S: AsRef<str>>(items: &[S]) -> String {
    let mut out = String::new();
    let count = items.len();
    for (i, item) in items.iter().enumerate() {
        out.push_str(item.as_ref());
        if i + 2 == count {
            out.push_str(" and ");
        } else if i + 1 < count {
            out.push_str(", ");
        }
    }
    out
}

/// A random version 4 UUID, hyphenated lowercase.
pub fn generate_uuid() -> String {
    Uuid::new_v4().to_string()
}

/// Format 16 random bytes as a version 4 UUID. The version nibble and the
/// RFC 4122 variant bits are forced regardless of input.
pub fn uuid_from_random_bytes(bytes: [u8; 16]) -> String {
    uuid::Builder::from_random_bytes(bytes).into_uuid().to_string()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn highest_score_is_max_scaled() {
        let m = measure_from_phrase("highest score", None, None).unwrap();
        assert_eq!(m.aggregation(), Aggregation::Max);
        assert_eq!(m.property(), StatementProperty::ScaledScore);
        assert!(m.match_value().is_none());
        assert_eq!(m.name, "highest score");
    }

    #[test]
    fn unique_verb_count_is_distinct_count() {
        let m = measure_from_phrase("Unique Verb Count", None, None).unwrap();
        assert_eq!(m.aggregation(), Aggregation::DistinctCount);
        assert_eq!(m.property(), StatementProperty::VerbId);
    }

    #[test]
    fn activity_count_is_count_of_object_id() {
        let m = measure_from_phrase("activity count", None, None).unwrap();
        assert_eq!(m.aggregation(), Aggregation::Count);
        assert_eq!(m.property(), StatementProperty::ActivityId);
    }

    #[test]
    fn match_is_discarded_on_phrase_path() {
        let m = measure_from_phrase("completion count", Some(json!(true)), None).unwrap();
        assert!(m.match_value().is_none());
        let m = measure_from_phrase("latest success", Some(json!(true)), None).unwrap();
        assert!(m.match_value().is_none());
    }

    #[test]
    fn title_overrides_name() {
        let m = measure_from_phrase("longest time", None, Some("Longest session")).unwrap();
        assert_eq!(m.name, "Longest session");
        assert_eq!(m.aggregation(), Aggregation::Max);
        assert_eq!(m.property(), StatementProperty::Duration);
    }

    #[test]
    fn unknown_aggregation_word_is_reported() {
        let err = measure_from_phrase("fastest score", None, None).unwrap_err();
        assert!(matches!(err, ApiError::UnknownVocabulary(ref w) if w == "fastest"));
    }

    #[test]
    fn unknown_property_word_is_reported() {
        let err = measure_from_phrase("unique badge count", None, None).unwrap_err();
        assert!(matches!(err, ApiError::UnknownVocabulary(ref w) if w == "badge"));
    }

    #[test]
    fn single_word_phrase_is_reported() {
        let err = measure_from_phrase("highest", None, None).unwrap_err();
        assert!(matches!(err, ApiError::UnknownVocabulary(ref w) if w == "highest"));
    }

    #[test]
    fn build_measure_with_match_is_simple_if() {
        let m = build_measure(
            "Passed",
            Aggregation::Count,
            StatementProperty::Success,
            Some(json!(true)),
        );
        assert_eq!(
            serde_json::to_value(&m).unwrap(),
            json!({
                "name": "Passed",
                "aggregation": {"type": "COUNT"},
                "valueProducer": {
                    "type": "SIMPLE_IF",
                    "statementProperty": "result.success",
                    "match": true
                }
            })
        );
    }

    #[test]
    fn dimensions_serialize_to_api_shape() {
        assert_eq!(
            serde_json::to_value(dimension_from_phrase("month")).unwrap(),
            json!({"type": "TIME", "timePeriod": "MONTH"})
        );
        assert_eq!(
            serde_json::to_value(dimension_from_phrase("Activity Type")).unwrap(),
            json!({"type": "STATEMENT_PROPERTY", "statementProperty": "object.definition.type"})
        );
    }

    #[test]
    fn unrecognized_dimension_falls_back_to_person() {
        assert_eq!(dimension_from_phrase("anything-unrecognized"), Dimension::Person);
        assert_eq!(dimension_from_phrase("learner"), Dimension::Person);
        assert_eq!(
            serde_json::to_value(Dimension::Person).unwrap(),
            json!({"type": "STATEMENT_PROPERTY", "statementProperty": "actor.person.id"})
        );
    }

    #[test]
    fn list_string_joins_like_prose() {
        let empty: [&str; 0] = [];
        assert_eq!(build_list_string(&empty), "");
        assert_eq!(build_list_string(&["a"]), "a");
        assert_eq!(build_list_string(&["a", "b"]), "a and b");
        assert_eq!(build_list_string(&["a", "b", "c"]), "a, b and c");
        assert_eq!(build_list_string(&["a", "b", "c", "d"]), "a, b, c and d");
    }

    #[test]
    fn template_names_resolve_case_insensitively() {
        assert_eq!("Activity Detail".parse::<CardTemplate>().unwrap().id(), 161);
        assert_eq!("leaderboard".parse::<CardTemplate>().unwrap().id(), 332);
        assert_eq!("GROUP".parse::<CardTemplate>().unwrap().id(), 281);
        assert!(matches!(
            "dashboard".parse::<CardTemplate>(),
            Err(ApiError::UnknownTemplate(_))
        ));
    }

    #[test]
    fn template_table_matches_ids() {
        let ids: Vec<(&str, u64)> = TEMPLATES.iter().map(|(n, t)| (*n, t.id())).collect();
        assert_eq!(
            ids,
            vec![
                ("accomplishment", 311),
                ("activity detail", 161),
                ("activity stream", 282),
                ("correlation", 261),
                ("leaderboard", 332),
                ("skills", 301),
                ("group", 281),
            ]
        );
        assert_eq!(CardTemplate::ActivityStream.to_string(), "activity stream");
    }

    #[test]
    fn uuid_bits_are_forced() {
        let all_ones = uuid_from_random_bytes([0xff; 16]);
        assert_eq!(all_ones, "ffffffff-ffff-4fff-bfff-ffffffffffff");
        let all_zeros = uuid_from_random_bytes([0x00; 16]);
        assert_eq!(all_zeros, "00000000-0000-4000-8000-000000000000");
    }
}
