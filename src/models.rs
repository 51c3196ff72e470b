use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

use crate::time_format::MatchStatus;

/// Applied when the source carries no confidence (absent or zero).
pub const DEFAULT_CONFIDENCE: u32 = 75;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub league: String,
    pub match_id: String,
    pub matchweek: i64,
    pub home_club_id: String,
    pub away_club_id: String,
    pub kickoff_time: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub predictions: Predictions,
    #[serde(default, deserialize_with = "null_as_default")]
    pub key_players: Vec<KeyPlayer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchweekPointer {
    pub league: String,
    pub matchweek_number: i64,
    pub is_current: bool,
}

/// Stored prediction payloads come in two shapes: a `code -> value` object
/// or a list of typed entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Predictions {
    Sequence(Vec<RawPrediction>),
    Mapping(Map<String, Value>),
}

impl Default for Predictions {
    fn default() -> Self {
        Self::Sequence(Vec::new())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPrediction {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub confidence: Option<Number>,
}

impl Predictions {
    /// Flattens either payload shape into typed entries, keeping source order.
    pub fn normalize(&self) -> Vec<Prediction> {
        match self {
            Self::Mapping(entries) => entries
                .iter()
                .map(|(code, value)| Prediction {
                    kind: code.clone(),
                    value: value_text(value),
                    confidence: Number::from(DEFAULT_CONFIDENCE),
                })
                .collect(),
            Self::Sequence(entries) => entries
                .iter()
                .map(|entry| Prediction {
                    kind: entry.kind.clone(),
                    value: value_text(&entry.value),
                    confidence: entry
                        .confidence
                        .clone()
                        .filter(|c| c.as_f64() != Some(0.0))
                        .unwrap_or_else(|| Number::from(DEFAULT_CONFIDENCE)),
                })
                .collect(),
        }
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    /// Passed through as stored; may be fractional or negative.
    pub confidence: Number,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPlayer {
    #[serde(default)]
    pub player_id: String,
    #[serde(default)]
    pub player_name: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolCallInput {
    pub league: String,
    pub matchweek: Option<i64>,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedMatch {
    pub match_id: String,
    pub home_team: String,
    pub away_team: String,
    pub kickoff_time: DateTime<Utc>,
    pub kickoff_formatted: String,
    pub countdown: String,
    pub status: MatchStatus,
    pub predictions: Vec<Prediction>,
    pub key_players: Vec<KeyPlayer>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictionsResult {
    pub league: String,
    pub matchweek: i64,
    pub matches: Vec<ResolvedMatch>,
    pub count: usize,
    pub app_link: String,
    pub note: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn match_json(predictions: Value) -> Value {
        json!({
            "league": "premier_league",
            "match_id": "m1",
            "matchweek": 9,
            "home_club_id": "chelsea",
            "away_club_id": "arsenal",
            "kickoff_time": "2025-10-18T14:00:00Z",
            "predictions": predictions,
        })
    }

    #[test]
    fn decodes_mapping_predictions_in_source_order() {
        let m: Match =
            serde_json::from_value(match_json(json!({"ht_result": "1-0", "corner_count": 9})))
                .unwrap();
        assert!(matches!(m.predictions, Predictions::Mapping(_)));
        assert!(m.key_players.is_empty());

        let normalized = m.predictions.normalize();
        assert_eq!(
            normalized,
            vec![
                Prediction {
                    kind: "ht_result".into(),
                    value: "1-0".into(),
                    confidence: Number::from(75)
                },
                Prediction {
                    kind: "corner_count".into(),
                    value: "9".into(),
                    confidence: Number::from(75)
                },
            ]
        );
    }

    #[test]
    fn decodes_sequence_predictions_with_confidence_defaults() {
        let m: Match = serde_json::from_value(match_json(json!([
            {"type": "corner_count", "value": "9", "confidence": 80},
            {"type": "next_goal", "value": "Saka", "confidence": 0},
            {"type": "ft_result", "value": "2-1"},
            {"type": "ht_result", "value": "1-0", "confidence": null},
        ])))
        .unwrap();

        let confidences: Vec<Value> = m
            .predictions
            .normalize()
            .into_iter()
            .map(|p| Value::Number(p.confidence))
            .collect();
        assert_eq!(confidences, vec![json!(80), json!(75), json!(75), json!(75)]);
    }

    #[test]
    fn fractional_and_negative_confidence_pass_through() {
        let m: Match = serde_json::from_value(match_json(json!([
            {"type": "ft_result", "value": "2-1", "confidence": 72.5},
            {"type": "next_goal", "value": "Saka", "confidence": -3},
            {"type": "corner_count", "value": "9", "confidence": 0.0},
        ])))
        .unwrap();
        assert!(matches!(m.predictions, Predictions::Sequence(_)));

        let normalized = m.predictions.normalize();
        assert_eq!(normalized[0].confidence.as_f64(), Some(72.5));
        assert_eq!(normalized[1].confidence.as_i64(), Some(-3));
        assert_eq!(normalized[2].confidence.as_u64(), Some(75));

        let rendered = serde_json::to_value(&normalized[0]).unwrap();
        assert_eq!(rendered["confidence"], json!(72.5));
    }

    #[test]
    fn null_payloads_default_to_empty() {
        let mut raw = match_json(Value::Null);
        raw["key_players"] = Value::Null;
        let m: Match = serde_json::from_value(raw).unwrap();
        assert!(m.predictions.normalize().is_empty());
        assert!(m.key_players.is_empty());
    }
}
