use std::collections::BTreeMap;

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::auth::{self, dtos as auth_dtos, model as auth_model};
use crate::features::choices::{dtos as choices_dtos, handlers as choices_handlers};
use crate::features::incident_files::{dtos as files_dtos, handlers as files_handlers};
use crate::features::incidents::{
    dtos as incidents_dtos, handlers as incidents_handlers, models as incidents_models,
};
use crate::features::offenses::{
    dtos as offenses_dtos, handlers as offenses_handlers, models as offenses_models,
};
use crate::features::officers::{dtos as officers_dtos, handlers as officers_handlers};
use crate::features::parties::{
    dtos as parties_dtos, handlers as parties_handlers, models as parties_models,
};
use crate::shared::dates::DateTimeInput;
use crate::shared::types::{ApiResponse, IdRef, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth
        auth::handlers::obtain_token,
        auth::handlers::refresh_token,
        auth::handlers::get_me,
        // Officers
        officers_handlers::list_officers,
        officers_handlers::create_officer,
        officers_handlers::get_officer,
        officers_handlers::update_officer,
        officers_handlers::delete_officer,
        // Offenses
        offenses_handlers::list_offenses,
        offenses_handlers::create_offense,
        offenses_handlers::get_offense,
        offenses_handlers::update_offense,
        offenses_handlers::delete_offense,
        // Incidents
        incidents_handlers::list_incidents,
        incidents_handlers::create_incident,
        incidents_handlers::search_incidents,
        incidents_handlers::create_incident_from_form,
        incidents_handlers::get_incident,
        incidents_handlers::get_incident_form,
        incidents_handlers::update_incident,
        incidents_handlers::delete_incident,
        incidents_handlers::print_incident,
        // Victims and suspects
        parties_handlers::list_parties,
        parties_handlers::create_party,
        parties_handlers::get_party,
        parties_handlers::update_party,
        parties_handlers::delete_party,
        // Files
        files_handlers::list_files,
        files_handlers::upload_files,
        files_handlers::get_file,
        files_handlers::download_file,
        files_handlers::delete_file,
        // Choices (public)
        choices_handlers::get_choices,
    ),
    components(
        schemas(
            // Shared
            Meta,
            IdRef,
            DateTimeInput,
            // Auth
            auth_model::AuthenticatedUser,
            auth_dtos::TokenRequestDto,
            auth_dtos::RefreshTokenRequestDto,
            auth_dtos::TokenResponseDto,
            auth_dtos::MeOfficerDto,
            auth_dtos::MeResponseDto,
            ApiResponse<auth_dtos::TokenResponseDto>,
            ApiResponse<auth_dtos::MeResponseDto>,
            // Officers
            officers_dtos::CreateOfficerUserDto,
            officers_dtos::CreateOfficerDto,
            officers_dtos::UpdateOfficerDto,
            officers_dtos::OfficerUserDto,
            officers_dtos::OfficerResponseDto,
            ApiResponse<officers_dtos::OfficerResponseDto>,
            ApiResponse<Vec<officers_dtos::OfficerResponseDto>>,
            // Offenses
            offenses_models::Offense,
            offenses_dtos::CreateOffenseDto,
            offenses_dtos::UpdateOffenseDto,
            ApiResponse<offenses_models::Offense>,
            ApiResponse<Vec<offenses_models::Offense>>,
            // Incidents
            incidents_models::Address,
            incidents_models::OfficerSummary,
            incidents_models::Shift,
            incidents_dtos::AddressInput,
            incidents_dtos::CreateIncidentDto,
            incidents_dtos::UpdateIncidentDto,
            incidents_dtos::IncidentSummaryDto,
            incidents_dtos::IncidentDetailDto,
            ApiResponse<incidents_dtos::IncidentDetailDto>,
            ApiResponse<Vec<incidents_dtos::IncidentSummaryDto>>,
            ApiResponse<BTreeMap<String, String>>,
            // Parties
            parties_models::PartyType,
            parties_models::Sex,
            parties_models::Race,
            parties_dtos::PartyInput,
            parties_dtos::UpdatePartyDto,
            parties_dtos::PartyResponseDto,
            ApiResponse<parties_dtos::PartyResponseDto>,
            ApiResponse<Vec<parties_dtos::PartyResponseDto>>,
            // Files
            files_dtos::UploadIncidentFilesDto,
            files_dtos::IncidentFileDto,
            ApiResponse<files_dtos::IncidentFileDto>,
            ApiResponse<Vec<files_dtos::IncidentFileDto>>,
            // Choices
            choices_dtos::Choice,
            choices_dtos::ChoicesResponseDto,
            ApiResponse<choices_dtos::ChoicesResponseDto>,
        )
    ),
    tags(
        (name = "auth", description = "Token login and refresh"),
        (name = "officers", description = "Officers and their user accounts"),
        (name = "offenses", description = "GCIC/UCR offense codes"),
        (name = "incidents", description = "Incident reports, search, forms and printing"),
        (name = "parties", description = "Victims and suspects of an incident"),
        (name = "files", description = "Files attached to an incident"),
        (name = "choices", description = "Choice lists (public)"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Incident Reports API",
        version = "0.1.0",
        description = "API documentation for police incident reports",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to the OpenAPI document
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_incident_paths() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        assert!(paths.contains_key("/api/incidents"));
        assert!(paths.contains_key("/api/incidents/search"));
        assert!(paths.contains_key("/api/incidents/print/{id}"));
        assert!(paths.contains_key("/api/incidents/{incident_id}/{parties}"));
        assert!(paths.contains_key("/api/choices"));

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
