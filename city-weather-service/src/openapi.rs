use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use common::models::{City, MessageResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::index,
        handlers::health,
        handlers::list_cities,
        handlers::add_city,
        handlers::delete_city,
        handlers::update_weather,
    ),
    components(schemas(City, MessageResponse)),
    tags(
        (name = "cities", description = "City list management"),
        (name = "weather", description = "Cached temperature updates"),
    ),
)]
struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}
