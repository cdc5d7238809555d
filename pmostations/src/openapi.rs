//! Documentation OpenAPI pour l'API stations.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::list_stations,
        crate::api::get_station,
        crate::api::create_station,
        crate::api::update_station,
        crate::api::delete_station,
    ),
    components(
        schemas(
            crate::model::Station,
            crate::model::NewStation,
            crate::model::StationPatch,
            crate::validation::FieldError,
            crate::api::ErrorResponse,
        )
    ),
    tags(
        (name = "stations", description = "Catalogue des stations de radio")
    ),
    info(
        title = "PMO Radio Stations API",
        version = "0.1.0",
        description = r#"
# Catalogue de stations

CRUD sur les stations de radio connues du lecteur.

- `name` et `url` sont obligatoires, `url` doit être une URL absolue
- `description` et `bitrate` vides sont stockés à `null`
- Les erreurs de validation retournent `400` avec la liste `errors` (champ + message)
        "#,
        license(
            name = "MIT",
        ),
    )
)]
pub struct ApiDoc;
