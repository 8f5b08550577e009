//! Typed builders for each card template.
//!
//! Every builder assembles a template specific configuration plus title and
//! description text, then goes through `WatershedClient::create_card`.

use serde::Serialize;
use serde_json::{json, Value};

use crate::client::WatershedClient;
use crate::error::ApiError;
use crate::http::Transport;
use crate::types::{
    ActivityIdFilter, ApiResponse, CardFilter, CardResult, MeasureCardConfig, MeasureSpec,
};
use crate::vocabulary::{build_list_string, dimension_from_phrase, measure_from_phrase, CardTemplate};

const SKILLS_TEXT: &str = "The Skills report card tells you how often learners practice.";
const ACTIVITY_STREAM_TEXT: &str = "The Activity Stream report card tells you what's happening now.";
const ACTIVITY_DETAIL_TEXT: &str =
    "The Activity Detail report card enables you to explore an activity in detail.";

fn to_config<C: Serialize>(config: &C) -> Result<Value, ApiError> {
    serde_json::to_value(config).map_err(|e| ApiError::Serialization(e.to_string()))
}

fn activity_filter(activity_id: String, reg_exp: bool) -> CardFilter {
    CardFilter {
        activity_ids: Some(ActivityIdFilter {
            ids: vec![activity_id],
            reg_exp,
        }),
        ..CardFilter::default()
    }
}

/// Configuration for a leaderboard or correlation card plus the titles of
/// its measures, in order.
pub fn measure_card_config(
    measures: &[MeasureSpec],
    dimension: &str,
    activity_id: &str,
) -> Result<(MeasureCardConfig, Vec<String>), ApiError> {
    let mut built = Vec::with_capacity(measures.len());
    let mut titles = Vec::with_capacity(measures.len());
    for spec in measures {
        built.push(measure_from_phrase(
            &spec.name,
            spec.match_value.clone(),
            Some(spec.title()),
        )?);
        titles.push(spec.title().to_string());
    }
    let config = MeasureCardConfig {
        filter: activity_filter(activity_id.to_string(), false),
        dimensions: vec![dimension_from_phrase(dimension)],
        measures: built,
    };
    Ok((config, titles))
}

#[derive(Serialize)]
struct FilterOnly {
    filter: CardFilter,
}

impl<T: Transport> WatershedClient<T> {
    /// Create a skill for the activity, then a skills card showing it.
    ///
    /// If the skill cannot be created its response is returned marked
    /// unsuccessful, with no card id.
    pub fn create_skill_card(
        &self,
        activity_name: &str,
        activity_id: &str,
        org_id: u64,
    ) -> Result<CardResult, ApiError> {
        let skill = self.create_skill(activity_name, activity_id, org_id)?;
        let skill_id = match skill.skill_id {
            Some(id) if skill.response.success => id,
            _ => {
                return Ok(CardResult {
                    response: ApiResponse {
                        success: false,
                        ..skill.response
                    },
                    card_id: None,
                    skill_id: skill.skill_id,
                })
            }
        };

        let config = FilterOnly {
            filter: CardFilter {
                skill_ids: Some(vec![skill_id]),
                ..CardFilter::default()
            },
        };
        let mut result = self.create_card(
            to_config(&config)?,
            CardTemplate::Skills,
            &format!("Practicing {activity_name}"),
            Some(SKILLS_TEXT),
            Some(SKILLS_TEXT),
            org_id,
        )?;
        result.skill_id = Some(skill_id);
        Ok(result)
    }

    /// Activity stream over every activity whose id starts with `activity_id`.
    pub fn create_activity_stream_card(
        &self,
        activity_name: &str,
        activity_id: &str,
        org_id: u64,
    ) -> Result<CardResult, ApiError> {
        let config = FilterOnly {
            filter: activity_filter(format!("{activity_id}.*"), true),
        };
        self.create_card(
            to_config(&config)?,
            CardTemplate::ActivityStream,
            &format!("{activity_name} Activity"),
            Some(ACTIVITY_STREAM_TEXT),
            Some(ACTIVITY_STREAM_TEXT),
            org_id,
        )
    }

    pub fn create_activity_detail_card(
        &self,
        activity_name: &str,
        activity_id: &str,
        org_id: u64,
    ) -> Result<CardResult, ApiError> {
        let config = FilterOnly {
            filter: activity_filter(activity_id.to_string(), false),
        };
        self.create_card(
            to_config(&config)?,
            CardTemplate::ActivityDetail,
            &format!("{activity_name} Detail"),
            Some(ACTIVITY_DETAIL_TEXT),
            Some(ACTIVITY_DETAIL_TEXT),
            org_id,
        )
    }

    /// Leaderboard of `measures` per `dimension` for one activity, e.g.
    /// "highest score" per "person".
    pub fn create_leaderboard_card(
        &self,
        measures: &[MeasureSpec],
        dimension: &str,
        activity_name: &str,
        activity_id: &str,
        org_id: u64,
    ) -> Result<CardResult, ApiError> {
        let (config, titles) = measure_card_config(measures, dimension, activity_id)?;
        let description = format!(
            "Use this Leaderboard to find the {} of each {dimension}.",
            build_list_string(&titles)
        );
        self.create_card(
            to_config(&config)?,
            CardTemplate::Leaderboard,
            &format!("{activity_name} Leaderboard"),
            Some(&description),
            Some(&description),
            org_id,
        )
    }

    pub fn create_correlation_card(
        &self,
        measures: &[MeasureSpec],
        dimension: &str,
        activity_name: &str,
        activity_id: &str,
        org_id: u64,
    ) -> Result<CardResult, ApiError> {
        let (config, titles) = measure_card_config(measures, dimension, activity_id)?;
        let description = format!(
            "Use this Correlation to explore relationships between the {} of each {dimension}.",
            build_list_string(&titles)
        );
        self.create_card(
            to_config(&config)?,
            CardTemplate::Correlation,
            &format!("{activity_name} Correlation"),
            Some(&description),
            Some(&description),
            org_id,
        )
    }

    /// A card that displays the cards of another card group.
    pub fn create_group_card(
        &self,
        group_id: u64,
        title: &str,
        org_id: u64,
    ) -> Result<CardResult, ApiError> {
        self.create_card(
            json!({ "cardGroupId": group_id }),
            CardTemplate::Group,
            title,
            None,
            None,
            org_id,
        )
    }
}
