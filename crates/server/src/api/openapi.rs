//! OpenAPI/Utoipa configuration.

use crate::api::{alerts::ALERTS_TAG, dispatch::SOS_TAG, health::MISC_TAG};
use utoipa::OpenApi;

/// OpenAPI documentation configuration.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "AquaLink SOS API",
        version = "1.0.0",
        description = "Emergency alert dispatch and lifecycle API for the AquaLink safety platform."
    ),
    tags(
        (name = MISC_TAG, description = "Miscellaneous endpoints"),
        (name = SOS_TAG, description = "Emergency dispatch endpoints"),
        (name = ALERTS_TAG, description = "Alert lifecycle endpoints")
    )
)]
pub struct ApiDoc;
