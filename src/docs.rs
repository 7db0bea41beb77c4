use utoipa::OpenApi;
use crate::modules::compress::dto::{ToolStatus, ToolchainStatus};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::compress::handler::index,
        crate::modules::compress::handler::compress_video,
        crate::modules::compress::handler::health,
    ),
    components(
        schemas(ToolStatus, ToolchainStatus)
    ),
    tags(
        (name = "Compress", description = "Re-encode uploaded videos to a target size")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();

        assert!(paths.iter().any(|p| p.as_str() == "/"));
        assert!(paths.iter().any(|p| p.as_str() == "/compress"));
        assert!(paths.iter().any(|p| p.as_str() == "/health"));
    }
}
