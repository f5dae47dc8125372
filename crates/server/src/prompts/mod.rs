//! MCP prompt templates.
//!
//! Prompts are static string builders over sanitized arguments. MCP prompt
//! messages carry only `user` and `assistant` roles, so the persona that
//! opens a conversation is sent as the first user message.

pub mod sanitize;

use rmcp::{
    ErrorData as McpError,
    model::{GetPromptResult, JsonObject, Prompt, PromptArgument, PromptMessage, PromptMessageRole},
};
use serde_json::Value;

use self::sanitize::{clean_route, clean_url};

const INVALID_URL_MESSAGE: &str = "Error: Please provide a valid HTTP or HTTPS URL.";

struct ArgTemplate {
    name: &'static str,
    description: &'static str,
    required: bool,
}

struct PromptTemplate {
    name: &'static str,
    description: &'static str,
    arguments: &'static [ArgTemplate],
}

const URL_ARG: ArgTemplate = ArgTemplate { name: "url", description: "The URL of the website", required: true };

const PROMPTS: &[PromptTemplate] = &[
    PromptTemplate {
        name: "analyze_sitemap",
        description: "Analyze a website's sitemap structure and organization",
        arguments: &[
            URL_ARG,
            ArgTemplate {
                name: "include_stats",
                description: "Whether to include detailed statistics (true or false, default true)",
                required: false,
            },
        ],
    },
    PromptTemplate {
        name: "sitemap_health_check",
        description: "Check the health and SEO aspects of a website's sitemap",
        arguments: &[URL_ARG],
    },
    PromptTemplate {
        name: "extract_sitemap_urls",
        description: "Extract and filter specific URLs from a website's sitemap",
        arguments: &[
            URL_ARG,
            ArgTemplate {
                name: "sitemap_url",
                description: "Optional specific subsitemap URL to extract URLs from",
                required: false,
            },
            ArgTemplate { name: "route", description: "Optional route path to filter URLs by", required: false },
        ],
    },
    PromptTemplate {
        name: "sitemap_missing_analysis",
        description: "Analyze what content might be missing from a website's sitemap",
        arguments: &[URL_ARG],
    },
    PromptTemplate {
        name: "visualize_sitemap",
        description: "Visualize a sitemap as a Mermaid.js diagram",
        arguments: &[URL_ARG],
    },
];

/// Every prompt this server offers.
pub fn list() -> Vec<Prompt> {
    PROMPTS
        .iter()
        .map(|template| {
            let arguments = template
                .arguments
                .iter()
                .map(|arg| PromptArgument {
                    name: arg.name.into(),
                    title: None,
                    description: Some(arg.description.into()),
                    required: Some(arg.required),
                })
                .collect();
            Prompt::new(template.name, Some(template.description), Some(arguments))
        })
        .collect()
}

/// Render prompt `name` with `arguments`.
///
/// Unknown prompts, missing required arguments and malformed flags are
/// invalid-params errors. An unusable URL is not: it renders a prompt that
/// tells the model what went wrong.
pub fn get(name: &str, arguments: Option<&JsonObject>) -> Result<GetPromptResult, McpError> {
    let template = PROMPTS
        .iter()
        .find(|template| template.name == name)
        .ok_or_else(|| McpError::invalid_params(format!("unknown prompt: {name}"), None))?;
    let args = PromptArgs { values: arguments };

    for arg in template.arguments.iter().filter(|arg| arg.required) {
        if args.string(arg.name).is_none() {
            return Err(McpError::invalid_params(
                format!("missing required argument '{}' for prompt {name}", arg.name),
                None,
            ));
        }
    }

    let url = args.string("url").as_deref().and_then(clean_url);
    let messages = match (template.name, url) {
        (_, None) => vec![user(INVALID_URL_MESSAGE)],
        ("analyze_sitemap", Some(url)) => vec![user(analyze_sitemap(&url, args.flag("include_stats", true)?))],
        ("sitemap_health_check", Some(url)) => sitemap_health_check(&url),
        ("extract_sitemap_urls", Some(url)) => {
            let sitemap_url = args.string("sitemap_url").as_deref().and_then(clean_url);
            let route = args.string("route").as_deref().and_then(clean_route);
            vec![user(extract_sitemap_urls(&url, sitemap_url.as_deref(), route.as_deref()))]
        }
        ("sitemap_missing_analysis", Some(url)) => sitemap_missing_analysis(&url),
        ("visualize_sitemap", Some(url)) => visualize_sitemap(&url),
        (other, Some(_)) => return Err(McpError::invalid_params(format!("unknown prompt: {other}"), None)),
    };

    Ok(GetPromptResult { description: Some(template.description.into()), messages })
}

/// Prompt arguments as sent by the client. MCP sends strings; other JSON
/// scalars are accepted and stringified.
struct PromptArgs<'a> {
    values: Option<&'a JsonObject>,
}

impl PromptArgs<'_> {
    fn string(&self, key: &str) -> Option<String> {
        match self.values?.get(key)? {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    fn flag(&self, key: &str, default: bool) -> Result<bool, McpError> {
        let Some(raw) = self.string(key) else { return Ok(default) };
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(McpError::invalid_params(format!("argument '{key}' must be true or false, got '{raw}'"), None)),
        }
    }
}

fn user(text: impl Into<String>) -> PromptMessage {
    PromptMessage::new_text(PromptMessageRole::User, text)
}

fn assistant(text: impl Into<String>) -> PromptMessage {
    PromptMessage::new_text(PromptMessageRole::Assistant, text)
}

fn analyze_sitemap(url: &str, include_stats: bool) -> String {
    let stats = if include_stats {
        "\nInclude detailed statistics about the sitemap structure, such as page counts, depth distribution, and content types."
    } else {
        ""
    };
    format!(
        "Analyze the sitemap structure for {url}.\n\
         Please provide a comprehensive analysis of the sitemap hierarchy, page distribution, and content organization.{stats}\n\
         \n\
         If you need to examine specific subsitemaps, you can use the sitemap_url parameter in get_sitemap_pages to filter pages from a specific subsitemap.\n"
    )
}

fn sitemap_health_check(url: &str) -> Vec<PromptMessage> {
    vec![
        user("You are an SEO expert specializing in sitemap analysis."),
        user(format!("I need a health check for the sitemap at {url}")),
        assistant(
            "I'll analyze the sitemap structure and provide a health assessment. What specific aspects are you most concerned about?",
        ),
        user("I'm particularly interested in SEO optimization, crawlability, and any structural issues."),
    ]
}

fn extract_sitemap_urls(url: &str, sitemap_url: Option<&str>, route: Option<&str>) -> String {
    let mut filters = Vec::new();
    if let Some(sitemap_url) = sitemap_url {
        filters.push(format!("from the specific subsitemap '{sitemap_url}'"));
    }
    if let Some(route) = route {
        filters.push(format!("under the route path '{route}'"));
    }
    let filter_text = if filters.is_empty() { String::new() } else { format!(" {}", filters.join(", ")) };

    format!(
        "Extract all URLs{filter_text} from the sitemap at {url}.\n\
         Please provide the URLs in a clean, structured format suitable for further processing.\n\
         \n\
         You can use the get_sitemap_pages tool with the sitemap_url and/or route parameters to filter the results more precisely.\n"
    )
}

fn sitemap_missing_analysis(url: &str) -> Vec<PromptMessage> {
    vec![
        user("You are a content strategist and SEO expert."),
        user(format!("Analyze what content might be missing from the sitemap at {url}")),
        assistant(
            "I'll examine the sitemap structure and identify potential content gaps. What is the primary purpose of this website?",
        ),
        user("It's a business website focused on providing services and information to customers."),
    ]
}

fn visualize_sitemap(url: &str) -> Vec<PromptMessage> {
    let instructions = format!(
        "Analyze the sitemap for {url} and create a Mermaid.js diagram visualizing its structure in a columnar layout. Follow these steps:

1. First analyze the sitemap structure using these specific tools:
   - Use get_sitemap_tree to understand the overall structure and hierarchy
   - Use get_sitemap_pages to gather details about pages at different levels
   - Examine main sections, subsections, and content organization patterns
   - Identify any missing standard business website pages

2. Create a Mermaid diagram with these specifications:
   - Use flowchart LR (left to right) direction for columnar layout
   - Organize nodes in columns by hierarchy depth
   - Group related content using subgraphs
   - Use clear, descriptive node labels

3. Apply this styling:
   - Root/Home node: Cyan (#40E0D0)
   - Main sections (Level 1): Hot pink (#ff3d9a)
   - Subsections (Level 2): Yellow (#ffdd00)
   - Deep pages (Level 3): Green (#00cc66)
   - Missing standard pages: Gray (#cccccc) with dashed connections

4. Content organization guidance:
   - Look for standard business pages (About, Contact, Terms, etc.)
   - Show missing standard pages with dashed lines
   - Limit deep pages to representative samples for readability
   - Use clear subgraph labels for content grouping

Submit the visualization as a Mermaid diagram artifact."
    );

    vec![
        user("You are a sitemap analyst specializing in website structure visualization and information architecture."),
        user(instructions),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    use rmcp::model::PromptMessageContent;
    use serde_json::json;

    fn args(value: Value) -> JsonObject {
        value.as_object().unwrap().clone()
    }

    fn text(message: &PromptMessage) -> &str {
        match &message.content {
            PromptMessageContent::Text { text } => text,
            other => panic!("expected text content, got {other:?}"),
        }
    }

    #[test]
    fn test_list_prompts() {
        let prompts = list();
        let names: Vec<&str> = prompts.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "analyze_sitemap",
                "sitemap_health_check",
                "extract_sitemap_urls",
                "sitemap_missing_analysis",
                "visualize_sitemap"
            ]
        );
        let analyze = prompts[0].arguments.as_ref().unwrap();
        assert_eq!(analyze[0].required, Some(true));
        assert_eq!(analyze[1].required, Some(false));
    }

    #[test]
    fn test_analyze_sitemap() {
        let result = get("analyze_sitemap", Some(&args(json!({"url": "example.com"})))).unwrap();
        assert_eq!(result.messages.len(), 1);
        let body = text(&result.messages[0]);
        assert!(body.starts_with("Analyze the sitemap structure for https://example.com/."));
        assert!(body.contains("Include detailed statistics"));

        let result = get("analyze_sitemap", Some(&args(json!({"url": "example.com", "include_stats": "false"})))).unwrap();
        assert!(!text(&result.messages[0]).contains("Include detailed statistics"));

        let result = get("analyze_sitemap", Some(&args(json!({"url": "example.com", "include_stats": false})))).unwrap();
        assert!(!text(&result.messages[0]).contains("Include detailed statistics"));
    }

    #[test]
    fn test_bad_flag() {
        let err = get("analyze_sitemap", Some(&args(json!({"url": "example.com", "include_stats": "maybe"})))).unwrap_err();
        assert!(err.message.contains("include_stats"));
    }

    #[test]
    fn test_health_check_conversation() {
        let result = get("sitemap_health_check", Some(&args(json!({"url": "https://example.com"})))).unwrap();
        let roles: Vec<PromptMessageRole> = result.messages.iter().map(|m| m.role.clone()).collect();
        assert_eq!(
            roles,
            vec![
                PromptMessageRole::User,
                PromptMessageRole::User,
                PromptMessageRole::Assistant,
                PromptMessageRole::User
            ]
        );
        assert_eq!(text(&result.messages[1]), "I need a health check for the sitemap at https://example.com/");
    }

    #[test]
    fn test_extract_filters() {
        let result = get(
            "extract_sitemap_urls",
            Some(&args(json!({
                "url": "https://example.com",
                "sitemap_url": "https://example.com/posts.xml",
                "route": "blog?page=2"
            }))),
        )
        .unwrap();
        let body = text(&result.messages[0]);
        assert!(body.starts_with(
            "Extract all URLs from the specific subsitemap 'https://example.com/posts.xml', under the route path '/blog' from the sitemap at https://example.com/."
        ));
    }

    #[test]
    fn test_extract_drops_invalid_filters() {
        let result = get(
            "extract_sitemap_urls",
            Some(&args(json!({"url": "https://example.com", "route": "/bad route!"}))),
        )
        .unwrap();
        assert!(text(&result.messages[0]).starts_with("Extract all URLs from the sitemap at https://example.com/."));
    }

    #[test]
    fn test_invalid_url_renders_error_prompt() {
        for name in ["analyze_sitemap", "sitemap_missing_analysis", "visualize_sitemap"] {
            let result = get(name, Some(&args(json!({"url": "ftp://example.com"})))).unwrap();
            assert_eq!(result.messages.len(), 1);
            assert_eq!(text(&result.messages[0]), INVALID_URL_MESSAGE);
        }
    }

    #[test]
    fn test_visualize_sitemap() {
        let result = get("visualize_sitemap", Some(&args(json!({"url": "example.com"})))).unwrap();
        assert_eq!(result.messages.len(), 2);
        assert!(text(&result.messages[1]).contains("flowchart LR"));
        assert!(text(&result.messages[1]).contains("https://example.com/"));
    }

    #[test]
    fn test_missing_required_argument() {
        let err = get("sitemap_health_check", None).unwrap_err();
        assert!(err.message.contains("url"));
        let err = get("sitemap_health_check", Some(&args(json!({"url": "  "})))).unwrap_err();
        assert!(err.message.contains("url"));
    }

    #[test]
    fn test_unknown_prompt() {
        assert!(get("summarize_everything", None).is_err());
    }
}
