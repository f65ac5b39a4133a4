//! Deterministic site and web search results.
//!
//! Scores come from [`stable_number`] so identical queries always produce
//! identical documents, across processes.

use iosrag_core::{DocumentRecord, stable_number};

struct TopicDoc {
    title: &'static str,
    slug: &'static str,
    summary: &'static str,
    size: &'static str,
}

const TOPICS: [(&str, &[TopicDoc]); 3] = [
    (
        "bgp",
        &[
            TopicDoc {
                title: "BGP Configuration Guide",
                slug: "bgp-configuration-guide",
                summary: "Comprehensive guide for BGP configuration and troubleshooting on Cisco devices.",
                size: "2.4 MB",
            },
            TopicDoc {
                title: "BGP Security Best Practices",
                slug: "bgp-security-best-practices",
                summary: "Advanced BGP security configurations and threat mitigation strategies.",
                size: "1.8 MB",
            },
        ],
    ),
    (
        "ospf",
        &[
            TopicDoc {
                title: "OSPF Implementation Guide",
                slug: "ospf-implementation-guide",
                summary: "Detailed OSPF implementation and design considerations for enterprise networks.",
                size: "3.1 MB",
            },
            TopicDoc {
                title: "OSPF Troubleshooting Handbook",
                slug: "ospf-troubleshooting",
                summary: "Common OSPF issues and systematic troubleshooting approaches.",
                size: "2.7 MB",
            },
        ],
    ),
    (
        "mpls",
        &[TopicDoc {
            title: "MPLS VPN Configuration",
            slug: "mpls-vpn-configuration",
            summary: "Advanced MPLS VPN configuration and troubleshooting techniques.",
            size: "4.2 MB",
        }],
    ),
];

/// Lower-case, dash-separated form of `query` for URLs.
pub fn slug(query: &str) -> String {
    query
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Capitalize the first letter of every word, lower-casing the rest.
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Score in `[base, base + spread)` derived from `seed`.
fn pseudo_score(seed: &str, base: f64, spread: u64) -> f64 {
    base + (stable_number(seed) % spread) as f64 / 100.0
}

/// Documents `site` holds for `query`.
///
/// Known topics named in the query yield their fixed documents; anything else
/// yields one generic configuration guide.
pub fn site_documents(query: &str, site: &str) -> Vec<DocumentRecord> {
    let lowered = query.to_lowercase();
    let mut docs: Vec<DocumentRecord> = TOPICS
        .iter()
        .filter(|(topic, _)| lowered.contains(topic))
        .flat_map(|(_, topic_docs)| topic_docs.iter())
        .map(|doc| {
            let title = format!("{} - {site}", doc.title);
            let relevance = pseudo_score(&title, 0.85, 15);
            DocumentRecord::new(title, site, format!("https://{site}/{}.pdf", doc.slug))
                .with_summary(doc.summary)
                .with_size(doc.size)
                .with_relevance(relevance)
        })
        .collect();

    if docs.is_empty() {
        let size = 2.0 + (stable_number(query) % 30) as f64 / 10.0;
        docs.push(
            DocumentRecord::new(
                format!("{} Configuration Guide - {site}", title_case(query)),
                site,
                format!("https://{site}/{}-guide.pdf", slug(query)),
            )
            .with_summary(format!(
                "Comprehensive documentation and configuration examples for {query}."
            ))
            .with_size(format!("{size:.1} MB"))
            .with_relevance(pseudo_score(query, 0.75, 20)),
        );
    }
    docs
}

/// Open web results for `query`: one guide and one troubleshooting manual.
pub fn web_documents(query: &str) -> Vec<DocumentRecord> {
    let title = title_case(query);
    let slug = slug(query);
    vec![
        DocumentRecord::new(
            format!("{title} - Comprehensive Guide"),
            "cisco.com",
            format!("https://cisco.com/{slug}-guide.pdf"),
        )
        .with_summary(format!(
            "Detailed guide covering {query} implementation and best practices."
        ))
        .with_size("2.5 MB")
        .with_relevance(pseudo_score(query, 0.85, 15)),
        DocumentRecord::new(
            format!("{title} - Troubleshooting Manual"),
            "ciscopress.com",
            format!("https://ciscopress.com/{slug}-troubleshooting.pdf"),
        )
        .with_summary(format!("Common issues and solutions for {query} configurations."))
        .with_size("1.8 MB")
        .with_relevance(pseudo_score(query, 0.78, 20)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_topic_yields_fixed_documents() {
        let docs = site_documents("bgp cisco configuration guide", "cisco.com");
        assert_eq!(docs.len(), 2);
        assert!(docs.iter().all(|d| d.location().contains("bgp")));
        assert!(docs.iter().all(|d| (0.85..1.0).contains(&d.relevance)));
        assert_eq!(docs[0].title, "BGP Configuration Guide - cisco.com");
    }

    #[test]
    fn test_unknown_topic_yields_generic_guide() {
        let docs = site_documents("eigrp stub routing", "ine.com");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].title, "Eigrp Stub Routing Configuration Guide - ine.com");
        assert_eq!(docs[0].location(), "https://ine.com/eigrp-stub-routing-guide.pdf");
        assert!(docs[0].size.ends_with(" MB"));
    }

    #[test]
    fn test_results_are_deterministic() {
        assert_eq!(site_documents("ospf", "cisco.com"), site_documents("ospf", "cisco.com"));
        assert_eq!(web_documents("qos"), web_documents("qos"));
    }

    #[test]
    fn test_web_documents_use_query_slug() {
        let docs = web_documents("BGP route reflectors");
        assert_eq!(docs[0].title, "Bgp Route Reflectors - Comprehensive Guide");
        assert_eq!(docs[1].location(), "https://ciscopress.com/bgp-route-reflectors-troubleshooting.pdf");
    }
}
