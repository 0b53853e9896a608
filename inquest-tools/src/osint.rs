//! Mock OSINT retrieval sources.
//!
//! These tools generate plausible, generic findings that embed the queried
//! entity name. They keep the registry realistically populated in
//! deployments without credentials for the real upstream services, and give
//! the orchestrator genuinely distinct capabilities to choose between.

use async_trait::async_trait;
use inquest_core::error::ToolError;
use inquest_core::tools::RetrievalTool;
use inquest_core::types::RetrievedItem;

/// MOCK: searches social media platforms for an entity.
#[derive(Default)]
pub struct SocialMediaSearchTool;

#[async_trait]
impl RetrievalTool for SocialMediaSearchTool {
    fn name(&self) -> &str {
        "social_media_search"
    }

    fn description(&self) -> &str {
        "Search social media platforms for profiles and posts attributed to an entity."
    }

    async fn search(&self, query: &str) -> Result<Vec<RetrievedItem>, ToolError> {
        tracing::debug!(query = %query, "Mock social media search");
        let handle = query.replace(' ', "");
        Ok(vec![
            RetrievedItem::new(
                "social_media_search",
                format!(
                    "A public LinkedIn profile for an individual named {query} was found. \
                     The profile lists a position as 'Software Engineer' at 'TechCorp'."
                ),
            ),
            RetrievedItem::new(
                "social_media_search",
                format!(
                    "An account with the handle @{handle}_dev was found. \
                     It frequently posts about software development."
                ),
            ),
        ])
    }
}

/// MOCK: searches company registration databases.
#[derive(Default)]
pub struct CompanyDatabaseSearchTool;

#[async_trait]
impl RetrievalTool for CompanyDatabaseSearchTool {
    fn name(&self) -> &str {
        "company_database_search"
    }

    fn description(&self) -> &str {
        "Search company registries for directorships and officer records naming an entity."
    }

    async fn search(&self, query: &str) -> Result<Vec<RetrievedItem>, ToolError> {
        tracing::debug!(query = %query, "Mock company database search");
        Ok(vec![RetrievedItem::new(
            "company_database_search",
            format!(
                "No public records found listing {query} as a director or officer \
                 in major company registries."
            ),
        )])
    }
}

/// MOCK: searches academic publications and records.
#[derive(Default)]
pub struct AcademicSearchTool;

#[async_trait]
impl RetrievalTool for AcademicSearchTool {
    fn name(&self) -> &str {
        "academic_search"
    }

    fn description(&self) -> &str {
        "Search academic publication indexes and university records for an entity."
    }

    async fn search(&self, query: &str) -> Result<Vec<RetrievedItem>, ToolError> {
        tracing::debug!(query = %query, "Mock academic search");
        Ok(vec![
            RetrievedItem::new(
                "academic_search",
                format!(
                    "Found a publication on arXiv authored by someone named {query}, \
                     titled 'A Study on Abstract Systems'."
                ),
            ),
            RetrievedItem::new(
                "academic_search",
                format!(
                    "The University of Example's website lists a student named {query} \
                     in their computer science alumni directory."
                ),
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_social_media_embeds_entity() {
        let items = SocialMediaSearchTool.search("Jane Doe").await.unwrap();
        assert_eq!(items.len(), 2);
        assert!(items[0].content.contains("Jane Doe"));
        assert!(items[1].content.contains("@JaneDoe_dev"));
        assert!(items.iter().all(|i| i.source == "social_media_search"));
    }

    #[tokio::test]
    async fn test_company_database_reports_absence() {
        let items = CompanyDatabaseSearchTool.search("Jane Doe").await.unwrap();
        assert_eq!(items.len(), 1);
        assert!(items[0].content.contains("No public records"));
    }

    #[tokio::test]
    async fn test_academic_search_embeds_entity() {
        let items = AcademicSearchTool.search("Jane Doe").await.unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.content.contains("Jane Doe")));
    }
}
