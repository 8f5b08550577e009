//! Request builders, response parsers and single-request operations.
//!
//! # Design
//! Each resource operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`; the
//! operation method itself (`create_organization`, ...) runs one round trip
//! through the client's `Transport` in between. Builders never touch the
//! network, so request shapes are testable without a server.
//!
//! Parsers never fail on an unexpected status. The status is compared with
//! the one the operation expects and reported through `ApiResponse::success`.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::auth::AuthConfig;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::types::{
    ActivityProviderResult, ApiResponse, CardGroupList, CardGroupLookup, CardGroupPayload,
    CardGroupResult, CardResult, IdRef, Invitee, NewActivityProvider, NewCard, NewInvitation,
    NewOrganization, NewSkill, OrganizationResult, Role, SkillComponent, SkillResult,
};
use crate::vocabulary::{generate_uuid, CardTemplate};

/// Synchronous client for the Watershed API.
///
/// Holds only configuration and a transport; no state carries over between
/// calls. Clone it freely to use from several threads.
#[derive(Debug, Clone)]
pub struct WatershedClient<T = UreqTransport> {
    config: ClientConfig,
    transport: T,
}

impl WatershedClient<UreqTransport> {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, UreqTransport::new())
    }
}

impl<T> WatershedClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn set_endpoint(&mut self, endpoint: &str) -> &mut Self {
        self.config.set_endpoint(endpoint);
        self
    }

    pub fn set_auth(&mut self, auth: &AuthConfig) -> &mut Self {
        self.config.set_auth(auth);
        self
    }

    fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<String>,
    ) -> Result<HttpRequest, ApiError> {
        let mut headers = vec![(
            "authorization".to_string(),
            self.config.auth().authorization()?.to_string(),
        )];
        if let Some(body) = &body {
            if matches!(method, HttpMethod::Post | HttpMethod::Put) {
                headers.push(("content-length".to_string(), body.len().to_string()));
                headers.push(("content-type".to_string(), "application/json".to_string()));
            }
        }
        Ok(HttpRequest {
            method,
            url: self.config.api_url(path),
            headers,
            body,
        })
    }

    fn json_request<B: Serialize>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &B,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
        self.request(method, path, Some(body))
    }

    /// Where xAPI statements for an organization's LRS are sent.
    pub fn lrs_endpoint(&self, org_id: u64) -> String {
        self.config.api_url(&format!("organizations/{org_id}/lrs/"))
    }

    pub fn build_create_organization(&self, name: &str) -> Result<HttpRequest, ApiError> {
        let body = NewOrganization {
            name: name.to_string(),
        };
        self.json_request(HttpMethod::Post, "organizations", &body)
    }

    pub fn build_create_activity_provider(
        &self,
        name: &str,
        org_id: u64,
        key: &str,
        secret: &str,
    ) -> Result<HttpRequest, ApiError> {
        let body = NewActivityProvider {
            name: name.to_string(),
            key: key.to_string(),
            secret: secret.to_string(),
            active: true,
            root_access: true,
        };
        self.json_request(
            HttpMethod::Post,
            &format!("organizations/{org_id}/activity-providers"),
            &body,
        )
    }

    pub fn build_delete_activity_provider(&self, id: u64, org_id: u64) -> Result<HttpRequest, ApiError> {
        self.request(
            HttpMethod::Delete,
            &format!("organizations/{org_id}/activity-providers/{id}"),
            None,
        )
    }

    pub fn build_create_invitation(
        &self,
        name: &str,
        email: &str,
        role: Role,
        org_id: u64,
    ) -> Result<HttpRequest, ApiError> {
        let body = NewInvitation {
            user: Invitee {
                name: name.to_string(),
                email: email.to_string(),
            },
            organization: IdRef { id: org_id },
            role,
            invitation_url_template: format!(
                "{}app/outside.html#invitation-signup/{{token}}",
                self.config.endpoint()
            ),
        };
        self.json_request(HttpMethod::Post, "memberships", &body)
    }

    pub fn build_create_skill(
        &self,
        activity_name: &str,
        activity_id: &str,
        org_id: u64,
    ) -> Result<HttpRequest, ApiError> {
        let body = NewSkill {
            name: activity_name.to_string(),
            components: vec![SkillComponent {
                name: "object.id".to_string(),
                value: activity_id.to_string(),
            }],
        };
        self.json_request(HttpMethod::Post, &format!("organizations/{org_id}/skills"), &body)
    }

    pub fn build_create_card(&self, card: &NewCard) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "cards", card)
    }

    pub fn build_create_card_group(
        &self,
        name: &str,
        card_ids: &[u64],
        org_id: u64,
    ) -> Result<HttpRequest, ApiError> {
        let body = CardGroupPayload {
            name: name.to_string(),
            card_ids: card_ids.to_vec(),
            organization: IdRef { id: org_id },
        };
        self.json_request(HttpMethod::Post, "card-groups", &body)
    }

    pub fn build_find_card_group(&self, name: &str, org_id: u64) -> Result<HttpRequest, ApiError> {
        let name: String = url::form_urlencoded::byte_serialize(name.as_bytes()).collect();
        self.request(
            HttpMethod::Get,
            &format!("organizations/{org_id}/card-groups/?name={name}"),
            None,
        )
    }

    /// Replace a card group's name and full membership.
    pub fn build_edit_card_group(
        &self,
        id: u64,
        name: &str,
        card_ids: &[u64],
        org_id: u64,
    ) -> Result<HttpRequest, ApiError> {
        let body = CardGroupPayload {
            name: name.to_string(),
            card_ids: card_ids.to_vec(),
            organization: IdRef { id: org_id },
        };
        self.json_request(HttpMethod::Put, &format!("card-groups/{id}"), &body)
    }

    pub fn parse_create_organization(&self, response: HttpResponse) -> OrganizationResult {
        OrganizationResult {
            org_id: created_id(&response),
            response: api_response(response, 201),
        }
    }

    pub fn parse_create_activity_provider(
        &self,
        response: HttpResponse,
        org_id: u64,
        key: String,
        secret: String,
    ) -> ActivityProviderResult {
        ActivityProviderResult {
            response: api_response(response, 201),
            key,
            secret,
            lrs_endpoint: self.lrs_endpoint(org_id),
        }
    }

    pub fn parse_delete_activity_provider(&self, response: HttpResponse) -> ApiResponse {
        api_response(response, 200)
    }

    pub fn parse_create_invitation(&self, response: HttpResponse) -> ApiResponse {
        api_response(response, 201)
    }

    pub fn parse_create_skill(&self, response: HttpResponse) -> SkillResult {
        SkillResult {
            skill_id: created_id(&response),
            response: api_response(response, 201),
        }
    }

    pub fn parse_create_card(&self, response: HttpResponse) -> CardResult {
        CardResult {
            card_id: created_id(&response),
            response: api_response(response, 201),
            skill_id: None,
        }
    }

    pub fn parse_create_card_group(&self, response: HttpResponse) -> CardGroupResult {
        CardGroupResult {
            group_id: created_id(&response),
            response: api_response(response, 201),
        }
    }

    /// A 200 whose body is not a group listing is a `Deserialization` error;
    /// any other status is an unsuccessful lookup.
    pub fn parse_find_card_group(&self, response: HttpResponse) -> Result<CardGroupLookup, ApiError> {
        let group = if response.status == 200 {
            let list: CardGroupList = serde_json::from_str(&response.body)
                .map_err(|e| ApiError::Deserialization(e.to_string()))?;
            list.results.into_iter().next()
        } else {
            None
        };
        let mut response = api_response(response, 200);
        response.success &= group.is_some();
        Ok(CardGroupLookup { response, group })
    }

    pub fn parse_edit_card_group(&self, response: HttpResponse) -> ApiResponse {
        api_response(response, 204)
    }
}

impl<T: Transport> WatershedClient<T> {
    pub(crate) fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = request.method.as_str(), url = %request.url, "sending request");
        let response = self.transport.send(&request)?;
        debug!(status = response.status, "received response");
        Ok(response)
    }

    /// Create an organization. Names must be unique. Expects 201.
    pub fn create_organization(&self, name: &str) -> Result<OrganizationResult, ApiError> {
        let response = self.execute(self.build_create_organization(name)?)?;
        Ok(self.parse_create_organization(response))
    }

    /// Mint a key/secret pair and register it as an activity provider with
    /// root access. The credentials are returned whatever the status.
    pub fn create_activity_provider(
        &self,
        name: &str,
        org_id: u64,
    ) -> Result<ActivityProviderResult, ApiError> {
        let key = generate_uuid();
        let secret = generate_uuid();
        let request = self.build_create_activity_provider(name, org_id, &key, &secret)?;
        let response = self.execute(request)?;
        Ok(self.parse_create_activity_provider(response, org_id, key, secret))
    }

    /// Expects 200.
    pub fn delete_activity_provider(&self, id: u64, org_id: u64) -> Result<ApiResponse, ApiError> {
        let response = self.execute(self.build_delete_activity_provider(id, org_id)?)?;
        Ok(self.parse_delete_activity_provider(response))
    }

    /// Invite a person to an organization. Expects 201.
    pub fn create_invitation(
        &self,
        name: &str,
        email: &str,
        role: Role,
        org_id: u64,
    ) -> Result<ApiResponse, ApiError> {
        let response = self.execute(self.build_create_invitation(name, email, role, org_id)?)?;
        Ok(self.parse_create_invitation(response))
    }

    /// Create a skill tracking one xAPI activity. Expects 201.
    pub fn create_skill(
        &self,
        activity_name: &str,
        activity_id: &str,
        org_id: u64,
    ) -> Result<SkillResult, ApiError> {
        let response = self.execute(self.build_create_skill(activity_name, activity_id, org_id)?)?;
        Ok(self.parse_create_skill(response))
    }

    /// Create a card from a template specific configuration. Expects 201.
    ///
    /// The typed builders in `cards` are the usual entry point.
    pub fn create_card(
        &self,
        configuration: Value,
        template: CardTemplate,
        title: &str,
        description: Option<&str>,
        summary: Option<&str>,
        org_id: u64,
    ) -> Result<CardResult, ApiError> {
        let card = NewCard {
            configuration,
            organization: IdRef { id: org_id },
            template: IdRef { id: template.id() },
            title: title.to_string(),
            description: description.map(str::to_string),
            summary: summary.map(str::to_string),
        };
        let response = self.execute(self.build_create_card(&card)?)?;
        Ok(self.parse_create_card(response))
    }

    /// Expects 201.
    pub fn create_card_group(
        &self,
        name: &str,
        card_ids: &[u64],
        org_id: u64,
    ) -> Result<CardGroupResult, ApiError> {
        let response = self.execute(self.build_create_card_group(name, card_ids, org_id)?)?;
        Ok(self.parse_create_card_group(response))
    }

    /// Look a card group up by its unique name. Only the first page of
    /// results is read.
    pub fn find_card_group(&self, name: &str, org_id: u64) -> Result<CardGroupLookup, ApiError> {
        let response = self.execute(self.build_find_card_group(name, org_id)?)?;
        self.parse_find_card_group(response)
    }

    /// Expects 204.
    pub fn edit_card_group(
        &self,
        id: u64,
        name: &str,
        card_ids: &[u64],
        org_id: u64,
    ) -> Result<ApiResponse, ApiError> {
        let response = self.execute(self.build_edit_card_group(id, name, card_ids, org_id)?)?;
        Ok(self.parse_edit_card_group(response))
    }
}

fn api_response(response: HttpResponse, expected: u16) -> ApiResponse {
    ApiResponse {
        success: response.status == expected,
        status: response.status,
        content: response.body,
    }
}

/// The `id` field of a JSON body, if the body is JSON and has one.
fn created_id(response: &HttpResponse) -> Option<u64> {
    serde_json::from_str::<Value>(&response.body)
        .ok()?
        .get("id")?
        .as_u64()
}
