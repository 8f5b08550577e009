//! In-memory stand-in for the parts of the Watershed API the client uses.
//!
//! Every route sits under `/api` and requires a `Basic` `Authorization`
//! header. Ids are assigned from one counter shared by all resources.
//! Creating an organization also creates its `ws-activity` card group, and
//! every card created afterwards is appended to it, as the real service does
//! for cards created by admins and owners.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;

pub const DEFAULT_GROUP: &str = "ws-activity";

/// Template ids the card endpoint accepts.
pub const TEMPLATE_IDS: [u64; 7] = [311, 161, 282, 261, 332, 301, 281];

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdRef {
    pub id: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Organization {
    pub id: u64,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityProvider {
    pub id: u64,
    pub name: String,
    pub key: String,
    pub secret: String,
    pub active: bool,
    pub root_access: bool,
    pub organization: IdRef,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Invitee {
    pub name: String,
    pub email: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub id: u64,
    pub user: Invitee,
    pub organization: IdRef,
    pub role: String,
    pub invitation_url_template: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SkillComponent {
    pub name: String,
    pub value: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Skill {
    pub id: u64,
    pub name: String,
    pub components: Vec<SkillComponent>,
    pub organization: IdRef,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Card {
    pub id: u64,
    pub configuration: Value,
    pub organization: IdRef,
    pub template: IdRef,
    pub title: String,
    pub description: Option<String>,
    pub summary: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CardGroup {
    pub id: u64,
    pub name: String,
    pub card_ids: Vec<u64>,
    pub organization: IdRef,
}

#[derive(Deserialize)]
pub struct CreateOrganization {
    pub name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateActivityProvider {
    pub name: String,
    pub key: String,
    pub secret: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub root_access: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMembership {
    pub user: Invitee,
    pub organization: IdRef,
    pub role: String,
    pub invitation_url_template: String,
}

#[derive(Deserialize)]
pub struct CreateSkill {
    pub name: String,
    pub components: Vec<SkillComponent>,
}

#[derive(Deserialize)]
pub struct CreateCard {
    pub configuration: Value,
    pub organization: IdRef,
    pub template: IdRef,
    pub title: String,
    pub description: Option<String>,
    pub summary: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardGroupInput {
    pub name: String,
    pub card_ids: Vec<u64>,
    pub organization: IdRef,
}

#[derive(Deserialize)]
pub struct GroupQuery {
    pub name: Option<String>,
}

#[derive(Default)]
pub struct Store {
    next_id: u64,
    pub organizations: HashMap<u64, Organization>,
    pub activity_providers: HashMap<u64, ActivityProvider>,
    pub memberships: Vec<Membership>,
    pub skills: HashMap<u64, Skill>,
    pub cards: HashMap<u64, Card>,
    pub card_groups: HashMap<u64, CardGroup>,
}

impl Store {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn require_org(&self, org_id: u64) -> Result<(), StatusCode> {
        if self.organizations.contains_key(&org_id) {
            Ok(())
        } else {
            Err(StatusCode::NOT_FOUND)
        }
    }

    fn group_named(&mut self, org_id: u64, name: &str) -> Option<&mut CardGroup> {
        self.card_groups
            .values_mut()
            .find(|g| g.organization.id == org_id && g.name == name)
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    router(Db::default())
}

/// Router over an existing store, for tests that inspect server state.
pub fn router(db: Db) -> Router {
    Router::new()
        .route("/api/organizations", post(create_organization))
        .route(
            "/api/organizations/{org_id}/activity-providers",
            post(create_activity_provider),
        )
        .route(
            "/api/organizations/{org_id}/activity-providers/{id}",
            axum::routing::delete(delete_activity_provider),
        )
        .route("/api/memberships", post(create_membership))
        .route("/api/organizations/{org_id}/skills", post(create_skill))
        .route("/api/cards", post(create_card))
        .route("/api/organizations/{org_id}/card-groups/", get(list_card_groups))
        .route("/api/card-groups", post(create_card_group))
        .route("/api/card-groups/{id}", put(update_card_group).get(get_card_group))
        .layer(middleware::from_fn(require_basic_auth))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn require_basic_auth(request: Request, next: Next) -> Response {
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Basic "));
    if !authorized {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    next.run(request).await
}

async fn create_organization(
    State(db): State<Db>,
    Json(input): Json<CreateOrganization>,
) -> Result<(StatusCode, Json<Organization>), StatusCode> {
    let mut store = db.write().await;
    if store.organizations.values().any(|o| o.name == input.name) {
        return Err(StatusCode::CONFLICT);
    }
    let org = Organization {
        id: store.next_id(),
        name: input.name,
    };
    let group = CardGroup {
        id: store.next_id(),
        name: DEFAULT_GROUP.to_string(),
        card_ids: Vec::new(),
        organization: IdRef { id: org.id },
    };
    store.card_groups.insert(group.id, group);
    store.organizations.insert(org.id, org.clone());
    info!(org_id = org.id, "organization created");
    Ok((StatusCode::CREATED, Json(org)))
}

async fn create_activity_provider(
    State(db): State<Db>,
    Path(org_id): Path<u64>,
    Json(input): Json<CreateActivityProvider>,
) -> Result<(StatusCode, Json<ActivityProvider>), StatusCode> {
    let mut store = db.write().await;
    store.require_org(org_id)?;
    let provider = ActivityProvider {
        id: store.next_id(),
        name: input.name,
        key: input.key,
        secret: input.secret,
        active: input.active,
        root_access: input.root_access,
        organization: IdRef { id: org_id },
    };
    store.activity_providers.insert(provider.id, provider.clone());
    Ok((StatusCode::CREATED, Json(provider)))
}

async fn delete_activity_provider(
    State(db): State<Db>,
    Path((org_id, id)): Path<(u64, u64)>,
) -> Result<Json<ActivityProvider>, StatusCode> {
    let mut store = db.write().await;
    match store.activity_providers.get(&id) {
        Some(p) if p.organization.id == org_id => {}
        _ => return Err(StatusCode::NOT_FOUND),
    }
    store
        .activity_providers
        .remove(&id)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn create_membership(
    State(db): State<Db>,
    Json(input): Json<CreateMembership>,
) -> Result<(StatusCode, Json<Membership>), StatusCode> {
    let mut store = db.write().await;
    store.require_org(input.organization.id)?;
    if !matches!(input.role.as_str(), "admin" | "owner" | "user") {
        return Err(StatusCode::BAD_REQUEST);
    }
    let membership = Membership {
        id: store.next_id(),
        user: input.user,
        organization: input.organization,
        role: input.role,
        invitation_url_template: input.invitation_url_template,
    };
    store.memberships.push(membership.clone());
    Ok((StatusCode::CREATED, Json(membership)))
}

async fn create_skill(
    State(db): State<Db>,
    Path(org_id): Path<u64>,
    Json(input): Json<CreateSkill>,
) -> Result<(StatusCode, Json<Skill>), StatusCode> {
    let mut store = db.write().await;
    store.require_org(org_id)?;
    let skill = Skill {
        id: store.next_id(),
        name: input.name,
        components: input.components,
        organization: IdRef { id: org_id },
    };
    store.skills.insert(skill.id, skill.clone());
    Ok((StatusCode::CREATED, Json(skill)))
}

async fn create_card(
    State(db): State<Db>,
    Json(input): Json<CreateCard>,
) -> Result<(StatusCode, Json<Card>), StatusCode> {
    let mut store = db.write().await;
    let org_id = input.organization.id;
    store.require_org(org_id)?;
    if !TEMPLATE_IDS.contains(&input.template.id) {
        return Err(StatusCode::BAD_REQUEST);
    }
    let card = Card {
        id: store.next_id(),
        configuration: input.configuration,
        organization: input.organization,
        template: input.template,
        title: input.title,
        description: input.description,
        summary: input.summary,
    };
    if let Some(group) = store.group_named(org_id, DEFAULT_GROUP) {
        group.card_ids.push(card.id);
    }
    store.cards.insert(card.id, card.clone());
    Ok((StatusCode::CREATED, Json(card)))
}

async fn list_card_groups(
    State(db): State<Db>,
    Path(org_id): Path<u64>,
    Query(query): Query<GroupQuery>,
) -> Result<Json<Value>, StatusCode> {
    let store = db.read().await;
    store.require_org(org_id)?;
    let mut results: Vec<&CardGroup> = store
        .card_groups
        .values()
        .filter(|g| g.organization.id == org_id)
        .filter(|g| query.name.as_deref().map_or(true, |name| g.name == name))
        .collect();
    results.sort_by_key(|g| g.id);
    Ok(Json(json!({ "results": results })))
}

async fn create_card_group(
    State(db): State<Db>,
    Json(input): Json<CardGroupInput>,
) -> Result<(StatusCode, Json<CardGroup>), StatusCode> {
    let mut store = db.write().await;
    let org_id = input.organization.id;
    store.require_org(org_id)?;
    if store.group_named(org_id, &input.name).is_some() {
        return Err(StatusCode::CONFLICT);
    }
    let group = CardGroup {
        id: store.next_id(),
        name: input.name,
        card_ids: input.card_ids,
        organization: input.organization,
    };
    store.card_groups.insert(group.id, group.clone());
    Ok((StatusCode::CREATED, Json(group)))
}

async fn get_card_group(
    State(db): State<Db>,
    Path(id): Path<u64>,
) -> Result<Json<CardGroup>, StatusCode> {
    let store = db.read().await;
    store.card_groups.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn update_card_group(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(input): Json<CardGroupInput>,
) -> Result<StatusCode, StatusCode> {
    let mut store = db.write().await;
    let group = store.card_groups.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    group.name = input.name;
    group.card_ids = input.card_ids;
    group.organization = input.organization;
    Ok(StatusCode::NO_CONTENT)
}
