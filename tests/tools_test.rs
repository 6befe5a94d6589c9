mod common;

use assert2::check;
use common::{DocsFixture, indexed_docs};
use rstest::rstest;
use tokio_util::sync::CancellationToken;
use utility_docs_mcp::tools::{
    GetExamplesRequest, GetFullDocRequest, GetSectionDocsRequest, GetUtilityClassRequest,
    SearchByVariantRequest, SearchDocsRequest, handle_get_examples, handle_get_full_doc,
    handle_get_section_docs, handle_get_utility_class, handle_index_status, handle_list_sections,
    handle_refresh_docs, handle_search_by_variant, handle_search_docs,
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn search_docs_formats_ranked_hits(#[future(awt)] indexed_docs: DocsFixture) {
    let request = SearchDocsRequest {
        query: "text alignment".to_string(),
        limit: Some(3),
    };
    let output = handle_search_docs(&indexed_docs.service, request).await.unwrap();
    check!(output.starts_with("Search results for 'text alignment':"));
    check!(output.contains("1. text-align [Typography] - relevance: 100%"));
    check!(output.contains("https://docs.example/docs/typography/text-align"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn search_docs_without_hits_gives_tips(#[future(awt)] indexed_docs: DocsFixture) {
    let request = SearchDocsRequest {
        query: "kubernetes".to_string(),
        limit: None,
    };
    let output = handle_search_docs(&indexed_docs.service, request).await.unwrap();
    check!(output.starts_with("No results found for 'kubernetes'."));
    check!(output.contains("get_utility_class"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn invalid_limit_is_a_tool_error(#[future(awt)] indexed_docs: DocsFixture) {
    let request = SearchDocsRequest {
        query: "flex".to_string(),
        limit: Some(500),
    };
    let error = handle_search_docs(&indexed_docs.service, request).await.unwrap_err();
    check!(error.contains("invalid limit"));
    check!(error.contains("between 1 and 50"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn utility_class_suggests_dropping_variant(#[future(awt)] indexed_docs: DocsFixture) {
    let request = GetUtilityClassRequest {
        class_name: "lg:text-right".to_string(),
    };
    let output = handle_get_utility_class(&indexed_docs.service, request).await.unwrap();
    check!(output.contains("No documentation found for utility class 'lg:text-right'."));
    check!(output.contains("look up 'text-right'"));

    let request = GetUtilityClassRequest {
        class_name: "text-center".to_string(),
    };
    let output = handle_get_utility_class(&indexed_docs.service, request).await.unwrap();
    check!(output.contains("## text-align [Typography]"));
    check!(output.contains("`text-left`"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn section_tools_list_and_suggest(#[future(awt)] indexed_docs: DocsFixture) {
    let output = handle_list_sections(&indexed_docs.service).await.unwrap();
    check!(output.starts_with("4 documentation sections:"));
    check!(output.contains("• Core Concepts\n"));

    let request = GetSectionDocsRequest {
        section: "Layuot".to_string(),
    };
    let output = handle_get_section_docs(&indexed_docs.service, request).await.unwrap();
    check!(output.contains("No documents found in section 'Layuot'."));
    check!(output.contains("Did you mean one of these?\n• Layout\n"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn full_doc_not_found_suggests_slugs(#[future(awt)] indexed_docs: DocsFixture) {
    let request = GetFullDocRequest {
        slug: "text-algin".to_string(),
    };
    let output = handle_get_full_doc(&indexed_docs.service, request).await.unwrap();
    check!(output.contains("No documentation found for 'text-algin'."));
    check!(output.contains("• `typography/text-align`"));

    let request = GetFullDocRequest {
        slug: "text-align".to_string(),
    };
    let output = handle_get_full_doc(&indexed_docs.service, request).await.unwrap();
    check!(output.starts_with("# text-align\n"));
    check!(output.contains("```html\n<p class=\"text-center\">"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn examples_and_variants_render(#[future(awt)] indexed_docs: DocsFixture) {
    let request = GetExamplesRequest {
        query: "flex".to_string(),
        limit: None,
    };
    let output = handle_get_examples(&indexed_docs.service, request).await.unwrap();
    check!(output.starts_with("Code examples for 'flex':"));
    check!(output.contains("```html\n"));

    let request = SearchByVariantRequest {
        variant: "hover".to_string(),
        limit: Some(5),
    };
    let output = handle_search_by_variant(&indexed_docs.service, request).await.unwrap();
    check!(output.contains("1. Hover, focus, and other states [Core Concepts]"));
    check!(output.contains("Usage: `hover:bg-sky-700`"));
}

#[tokio::test(flavor = "multi_thread")]
async fn refresh_and_status_tools() {
    let fixture = DocsFixture::new().await;
    let output = handle_index_status(&fixture.service).await.unwrap();
    check!(output.contains("• Generation: 0"));
    check!(output.contains("• Last rebuild: never"));

    fixture.write_doc("broken.md", "---\ntitle: oops\n");
    let output = handle_refresh_docs(&fixture.service, &CancellationToken::new())
        .await
        .unwrap();
    check!(output.starts_with("Documentation refreshed: generation 1 with 5 documents"));
    check!(output.contains("1 document(s) could not be parsed:\n• broken.md:"));

    let output = handle_index_status(&fixture.service).await.unwrap();
    check!(output.contains("• Generation: 1"));
    check!(output.contains("• Documents: 5"));
}
