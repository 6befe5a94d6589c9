//! MCP server exposing the documentation tools.

use crate::service::DocsService;
use crate::tools::{
    GetExamplesRequest, GetFullDocRequest, GetSectionDocsRequest, GetUtilityClassRequest,
    SearchByVariantRequest, SearchDocsRequest, handle_get_examples, handle_get_full_doc,
    handle_get_section_docs, handle_get_utility_class, handle_index_status, handle_list_sections,
    handle_refresh_docs, handle_search_by_variant, handle_search_docs,
};
use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    schemars::{self, JsonSchema, generate::SchemaSettings},
    tool, tool_handler, tool_router,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// MCP server for utility-first CSS documentation queries
#[derive(Clone)]
pub struct DocsServer {
    service: Arc<DocsService>,

    /// Cancels in-flight refreshes when the process shuts down
    shutdown: CancellationToken,

    /// Tool router for handling MCP tool calls
    tool_router: ToolRouter<Self>,
}

impl std::fmt::Debug for DocsServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocsServer")
            .field("service", &self.service)
            .finish()
    }
}

#[tool_router]
impl DocsServer {
    pub fn new(service: Arc<DocsService>, shutdown: CancellationToken) -> Self {
        Self {
            service,
            shutdown,
            tool_router: Self::tool_router(),
        }
    }

    pub fn service(&self) -> &Arc<DocsService> {
        &self.service
    }

    #[tool(
        description = "Search the documentation with BM25 full-text ranking over titles, sections, descriptions and content. Use for general questions such as 'how do I center elements' or 'responsive design'. Returns ranked documents with highlighted snippets and links.",
        input_schema = inline_schema_for_type::<SearchDocsRequest>()
    )]
    async fn search_docs(
        &self,
        Parameters(request): Parameters<SearchDocsRequest>,
    ) -> std::result::Result<String, String> {
        handle_search_docs(&self.service, request).await
    }

    #[tool(
        description = "Find the documents that use a specific utility class such as 'flex-1', 'text-center' or 'hover:bg-gray-100'. Matching is exact, falling back to case-insensitive. Also lists related classes of the same family.",
        input_schema = inline_schema_for_type::<GetUtilityClassRequest>()
    )]
    async fn get_utility_class(
        &self,
        Parameters(request): Parameters<GetUtilityClassRequest>,
    ) -> std::result::Result<String, String> {
        handle_get_utility_class(&self.service, request).await
    }

    #[tool(
        description = "List every documentation section (e.g. Layout, Typography, Backgrounds) in alphabetical order. Use get_section_docs to browse one."
    )]
    async fn list_sections(&self) -> std::result::Result<String, String> {
        handle_list_sections(&self.service).await
    }

    #[tool(
        description = "List all documents in a section, ordered by title. Section names are case-sensitive; unknown names get suggestions.",
        input_schema = inline_schema_for_type::<GetSectionDocsRequest>()
    )]
    async fn get_section_docs(
        &self,
        Parameters(request): Parameters<GetSectionDocsRequest>,
    ) -> std::result::Result<String, String> {
        handle_get_section_docs(&self.service, request).await
    }

    #[tool(
        description = "Get a complete documentation page: full text, every utility class and every code example. Accepts a filepath, a slug, or the final slug segment when it is unambiguous.",
        input_schema = inline_schema_for_type::<GetFullDocRequest>()
    )]
    async fn get_full_doc(
        &self,
        Parameters(request): Parameters<GetFullDocRequest>,
    ) -> std::result::Result<String, String> {
        handle_get_full_doc(&self.service, request).await
    }

    #[tool(
        description = "Search for working code examples. Ranks only documents that contain code blocks and returns their snippets.",
        input_schema = inline_schema_for_type::<GetExamplesRequest>()
    )]
    async fn get_examples(
        &self,
        Parameters(request): Parameters<GetExamplesRequest>,
    ) -> std::result::Result<String, String> {
        handle_get_examples(&self.service, request).await
    }

    #[tool(
        description = "Search documentation about a variant or modifier such as 'hover', 'focus', 'dark', 'md' or 'group'. Documents using classes prefixed with the variant rank higher.",
        input_schema = inline_schema_for_type::<SearchByVariantRequest>()
    )]
    async fn search_by_variant(
        &self,
        Parameters(request): Parameters<SearchByVariantRequest>,
    ) -> std::result::Result<String, String> {
        handle_search_by_variant(&self.service, request).await
    }

    #[tool(
        description = "Fetch the latest documentation from its source and rebuild the search index. Involves network and disk work and can take a while; the current index keeps serving until the new one is ready."
    )]
    async fn refresh_docs(&self) -> std::result::Result<String, String> {
        handle_refresh_docs(&self.service, &self.shutdown).await
    }

    #[tool(
        description = "Show the state of the search index: generation, document and section counts, last rebuild time and source."
    )]
    async fn index_status(&self) -> std::result::Result<String, String> {
        handle_index_status(&self.service).await
    }
}

#[tool_handler]
impl ServerHandler for DocsServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build())
            .with_protocol_version(ProtocolVersion::V_2024_11_05)
            .with_server_info(Implementation::from_build_env())
            .with_instructions(
                "utility-docs-mcp: Search and browse utility-first CSS documentation. \
                 Use search_docs for general questions, get_utility_class for a specific class, \
                 search_by_variant for modifiers like hover or dark, and get_full_doc for a whole page. \
                 The index builds in the background on first start; index_status shows its state."
                    .to_string(),
            )
    }
}

/// Generate an inline JSON schema for MCP tools
///
/// Unlike rmcp's default `schema_for_type()`, this sets `inline_subschemas = true`
/// so nested types are inlined instead of referenced through `$ref`.
pub fn inline_schema_for_type<T: JsonSchema>() -> Arc<JsonObject> {
    let mut settings = SchemaSettings::draft07();
    settings.transforms = vec![Box::new(schemars::transform::AddNullable::default())];
    settings.inline_subschemas = true;

    let generator = settings.into_generator();
    let schema = generator.into_root_schema_for::<T>();
    let object = serde_json::to_value(schema).expect("failed to serialize schema");

    let json_object = match object {
        serde_json::Value::Object(object) => object,
        _ => panic!("Schema serialization produced non-object value"),
    };

    Arc::new(json_object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;

    #[test]
    fn request_schemas_are_inline_objects() {
        let schema = inline_schema_for_type::<SearchDocsRequest>();
        check!(schema.get("type") == Some(&serde_json::json!("object")));
        let properties = schema.get("properties").and_then(|p| p.as_object()).unwrap();
        check!(properties.contains_key("query"));
        check!(properties.contains_key("limit"));
        check!(!schema.contains_key("$defs"));
    }
}
