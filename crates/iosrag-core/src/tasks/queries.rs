//! Search query generation for discovery and the AI agent.

/// Upper bound on generated queries per run.
pub const MAX_QUERIES: usize = 8;

const DISCOVERY_TEMPLATES: [&str; 5] = [
    "{topic} cisco configuration guide",
    "{topic} cisco troubleshooting",
    "{topic} cisco best practices",
    "{topic} cisco implementation examples",
    "{topic} cisco security configuration",
];

const DISCOVERY_CERT_TEMPLATES: [&str; 3] = [
    "{topic} {cert} study guide",
    "{topic} {cert} configuration",
    "{topic} {cert} troubleshooting",
];

const AGENT_TEMPLATES: [&str; 5] = [
    "{topic} cisco configuration guide",
    "{topic} troubleshooting best practices",
    "{topic} implementation examples",
    "{topic} security considerations",
    "{topic} performance optimization",
];

const AGENT_CERT_TEMPLATES: [&str; 3] = [
    "{topic} {cert} study guide",
    "{topic} {cert} lab exercises",
    "{topic} {cert} exam preparation",
];

fn expand(templates: &[&str], cert_templates: &[&str], topic: &str, cert: &str) -> Vec<String> {
    let topic = topic.trim();
    let mut queries: Vec<String> = templates
        .iter()
        .map(|t| t.replace("{topic}", topic))
        .collect();
    if !cert.trim().is_empty() && !cert.eq_ignore_ascii_case("all") {
        queries.extend(
            cert_templates
                .iter()
                .map(|t| t.replace("{topic}", topic).replace("{cert}", cert.trim())),
        );
    }
    queries.truncate(MAX_QUERIES);
    queries
}

/// Queries for a discovery run on `topic`.
pub fn discovery_queries(topic: &str, certification_level: &str) -> Vec<String> {
    expand(
        &DISCOVERY_TEMPLATES,
        &DISCOVERY_CERT_TEMPLATES,
        topic,
        certification_level,
    )
}

/// Queries for an AI agent run on a free-text request.
pub fn agent_queries(query: &str, certification_level: &str) -> Vec<String> {
    expand(&AGENT_TEMPLATES, &AGENT_CERT_TEMPLATES, query, certification_level)
}
